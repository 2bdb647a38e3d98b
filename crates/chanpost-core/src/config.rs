use std::{env, fs, path::Path, path::PathBuf, time::Duration};

use crate::{
    domain::ChannelTarget,
    errors::Error,
    Result,
};

/// Typed configuration for the bot.
#[derive(Clone, Debug)]
pub struct Config {
    // Core
    pub telegram_bot_token: String,
    pub channel: ChannelTarget,
    pub authorized_users: Vec<i64>,

    // Anti-spam quota
    pub post_limit: u32,
    pub post_window: Duration,

    // Batch publishing
    pub publish_delay: Duration,

    // Audit
    pub audit_log_path: PathBuf,
    pub audit_log_json: bool,
}

impl Config {
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));

        // Required env vars
        let telegram_bot_token = env_str("TELEGRAM_BOT_TOKEN").unwrap_or_default();
        if telegram_bot_token.trim().is_empty() {
            return Err(Error::Config(
                "TELEGRAM_BOT_TOKEN environment variable is required".to_string(),
            ));
        }

        let channel = env_str("CHANNEL_ID")
            .and_then(non_empty)
            .ok_or_else(|| {
                Error::Config("CHANNEL_ID environment variable is required".to_string())
            })?
            .parse::<ChannelTarget>()
            .map_err(Error::Config)?;

        let authorized_users = parse_csv_i64(env_str("AUTHORIZED_USERS"));
        if authorized_users.is_empty() {
            return Err(Error::Config(
                "AUTHORIZED_USERS environment variable is required".to_string(),
            ));
        }

        // Quota: 50 posts per 60s window unless overridden.
        let post_limit = env_u32("POST_LIMIT").unwrap_or(50);
        let post_window = Duration::from_secs(env_u64("POST_WINDOW_SECS").unwrap_or(60));

        // Pause between batch items, to respect channel-side rate limits.
        let publish_delay = Duration::from_millis(env_u64("PUBLISH_DELAY_MS").unwrap_or(500));

        // Audit logging
        let audit_log_path = PathBuf::from(
            env_str("AUDIT_LOG_PATH").unwrap_or("/tmp/chanpost-audit.log".to_string()),
        );
        let audit_log_json = env_bool("AUDIT_LOG_JSON").unwrap_or(false);

        Ok(Self {
            telegram_bot_token,
            channel,
            authorized_users,
            post_limit,
            post_window,
            publish_delay,
            audit_log_path,
            audit_log_json,
        })
    }
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim();
        if key.is_empty() {
            continue;
        }
        if env::var_os(key).is_some() {
            continue; // do not override existing env
        }

        let mut val = v.trim().to_string();
        // Strip optional surrounding quotes.
        if val.len() >= 2
            && ((val.starts_with('"') && val.ends_with('"'))
                || (val.starts_with('\'') && val.ends_with('\'')))
        {
            val = val[1..val.len() - 1].to_string();
        }

        env::set_var(key, val);
    }
}

fn env_str(key: &str) -> Option<String> {
    env::var(key).ok()
}

fn env_bool(key: &str) -> Option<bool> {
    env_str(key).map(|s| {
        matches!(
            s.trim().to_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        )
    })
}

fn env_u64(key: &str) -> Option<u64> {
    env_str(key).and_then(|s| s.trim().parse::<u64>().ok())
}

fn env_u32(key: &str) -> Option<u32> {
    env_str(key).and_then(|s| s.trim().parse::<u32>().ok())
}

fn parse_csv_i64(v: Option<String>) -> Vec<i64> {
    v.unwrap_or_default()
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .filter_map(|s| s.parse::<i64>().ok())
        .collect()
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}
