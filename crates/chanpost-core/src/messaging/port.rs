use async_trait::async_trait;

use crate::{
    domain::{ChatId, FileId, MessageRef},
    draft::LinkButton,
    messaging::types::InlineKeyboard,
    Result,
};

/// Operator-facing messaging port.
///
/// Telegram is the first implementation; the core never formats beyond
/// caption/status text and (label, url) pairs — visual rendering, delivery,
/// and retry-on-transport-error belong to the adapter.
#[async_trait]
pub trait MessagingPort: Send + Sync {
    async fn send_html(&self, chat_id: ChatId, html: &str) -> Result<MessageRef>;

    /// Render a post preview: the image with its caption and link buttons.
    async fn send_photo(
        &self,
        chat_id: ChatId,
        media: &FileId,
        caption: &str,
        buttons: &[LinkButton],
    ) -> Result<MessageRef>;

    /// Send a text message carrying a callback-button keyboard.
    async fn send_menu(
        &self,
        chat_id: ChatId,
        text: &str,
        keyboard: InlineKeyboard,
    ) -> Result<MessageRef>;

    async fn answer_callback(&self, callback_id: &str, text: Option<&str>) -> Result<()>;
}
