use std::{collections::HashMap, sync::Arc};

use teloxide::{dispatching::Dispatcher, dptree, prelude::*};

use tokio::sync::{Mutex, OwnedMutexGuard};

use chanpost_core::{
    audit::AuditLogger, config::Config, draft::DraftStore, limiter::PostQuota,
    messaging::port::MessagingPort, publisher::BroadcastPort,
};

use crate::handlers;
use crate::TelegramMessenger;

#[derive(Clone)]
pub struct AppState {
    pub cfg: Arc<Config>,
    pub drafts: Arc<DraftStore>,
    pub quota: Arc<Mutex<PostQuota>>,
    pub messenger: Arc<dyn MessagingPort>,
    pub broadcaster: Arc<dyn BroadcastPort>,
    pub audit: Arc<AuditLogger>,
    pub user_locks: Arc<UserLocks>,
}

/// Serializes all handling per operator: events for the same user are never
/// processed concurrently, while different operators proceed in parallel.
#[derive(Default)]
pub struct UserLocks {
    inner: Mutex<HashMap<i64, Arc<Mutex<()>>>>,
}

impl UserLocks {
    pub async fn lock_user(&self, user_id: i64) -> OwnedMutexGuard<()> {
        let lock = {
            let mut map = self.inner.lock().await;
            map.entry(user_id)
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }
}

pub async fn run_polling(cfg: Arc<Config>) -> anyhow::Result<()> {
    let bot = Bot::new(cfg.telegram_bot_token.clone());

    // Basic startup info.
    if let Ok(me) = bot.get_me().await {
        println!("chanpost started: @{}", me.username());
    }
    println!("Broadcast channel: {}", cfg.channel);
    println!("Authorized operators: {}", cfg.authorized_users.len());

    let tg = Arc::new(TelegramMessenger::new(bot.clone()));
    let messenger: Arc<dyn MessagingPort> = tg.clone();
    let broadcaster: Arc<dyn BroadcastPort> = tg;

    let state = Arc::new(AppState {
        cfg: cfg.clone(),
        drafts: Arc::new(DraftStore::new()),
        quota: Arc::new(Mutex::new(PostQuota::new(cfg.post_limit, cfg.post_window))),
        messenger,
        broadcaster,
        audit: Arc::new(AuditLogger::new(
            cfg.audit_log_path.clone(),
            cfg.audit_log_json,
        )),
        user_locks: Arc::new(UserLocks::default()),
    });

    let handler = dptree::entry()
        .branch(Update::filter_callback_query().endpoint(handlers::handle_callback))
        .branch(Update::filter_message().endpoint(handlers::handle_message));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .build()
        .dispatch()
        .await;

    Ok(())
}
