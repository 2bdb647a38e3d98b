use std::sync::Arc;

use chanpost_core::config::Config;

#[tokio::main]
async fn main() -> Result<(), chanpost_core::Error> {
    chanpost_core::logging::init("chanpost")?;

    let cfg = Arc::new(Config::load()?);

    chanpost_telegram::router::run_polling(cfg)
        .await
        .map_err(|e| chanpost_core::Error::Transport(format!("telegram bot failed: {e}")))?;

    Ok(())
}
