//! Test doubles and state wiring shared by handler tests.

use std::{
    path::PathBuf,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex as StdMutex,
    },
    time::Duration,
};

use async_trait::async_trait;
use tokio::sync::Mutex;

use chanpost_core::{
    audit::AuditLogger,
    config::Config,
    domain::{ChannelTarget, ChatId, FileId, MessageId, MessageRef},
    draft::{DraftStore, LinkButton, PostItem},
    limiter::PostQuota,
    messaging::{port::MessagingPort, types::InlineKeyboard},
    publisher::BroadcastPort,
    Error, Result,
};

use crate::router::{AppState, UserLocks};

#[derive(Default)]
pub(crate) struct FakeMessenger {
    pub fail_photos: bool,
    pub html: StdMutex<Vec<String>>,
    pub photos: StdMutex<Vec<(FileId, String)>>,
    pub menus: StdMutex<Vec<String>>,
}

impl FakeMessenger {
    pub fn html(&self) -> Vec<String> {
        self.html.lock().unwrap().clone()
    }

    pub fn photos(&self) -> Vec<(FileId, String)> {
        self.photos.lock().unwrap().clone()
    }

    pub fn menus(&self) -> Vec<String> {
        self.menus.lock().unwrap().clone()
    }
}

#[async_trait]
impl MessagingPort for FakeMessenger {
    async fn send_html(&self, chat_id: ChatId, html: &str) -> Result<MessageRef> {
        self.html.lock().unwrap().push(html.to_string());
        Ok(MessageRef {
            chat_id,
            message_id: MessageId(1),
        })
    }

    async fn send_photo(
        &self,
        chat_id: ChatId,
        media: &FileId,
        caption: &str,
        _buttons: &[LinkButton],
    ) -> Result<MessageRef> {
        if self.fail_photos {
            return Err(Error::Transport("photo rejected".to_string()));
        }
        self.photos
            .lock()
            .unwrap()
            .push((media.clone(), caption.to_string()));
        Ok(MessageRef {
            chat_id,
            message_id: MessageId(2),
        })
    }

    async fn send_menu(
        &self,
        chat_id: ChatId,
        text: &str,
        _keyboard: InlineKeyboard,
    ) -> Result<MessageRef> {
        self.menus.lock().unwrap().push(text.to_string());
        Ok(MessageRef {
            chat_id,
            message_id: MessageId(3),
        })
    }

    async fn answer_callback(&self, _callback_id: &str, _text: Option<&str>) -> Result<()> {
        Ok(())
    }
}

pub(crate) struct NullBroadcast;

#[async_trait]
impl BroadcastPort for NullBroadcast {
    async fn send_post(&self, _channel: &ChannelTarget, _item: &PostItem) -> Result<()> {
        Ok(())
    }
}

fn unique_audit_path() -> PathBuf {
    static SEQ: AtomicUsize = AtomicUsize::new(0);
    let pid = std::process::id();
    let n = SEQ.fetch_add(1, Ordering::Relaxed);
    PathBuf::from(format!("/tmp/chanpost-handler-test-{pid}-{n}.log"))
}

pub(crate) fn test_state(messenger: Arc<FakeMessenger>) -> Arc<AppState> {
    let audit_log_path = unique_audit_path();
    let cfg = Config {
        telegram_bot_token: "test-token".to_string(),
        channel: ChannelTarget::Username("@test".to_string()),
        authorized_users: vec![1],
        post_limit: 50,
        post_window: Duration::from_secs(60),
        publish_delay: Duration::ZERO,
        audit_log_path: audit_log_path.clone(),
        audit_log_json: true,
    };

    Arc::new(AppState {
        cfg: Arc::new(cfg),
        drafts: Arc::new(DraftStore::new()),
        quota: Arc::new(Mutex::new(PostQuota::new(50, Duration::from_secs(60)))),
        messenger: messenger as Arc<dyn MessagingPort>,
        broadcaster: Arc::new(NullBroadcast),
        audit: Arc::new(AuditLogger::new(audit_log_path, true)),
        user_locks: Arc::new(UserLocks::default()),
    })
}
