//! Telegram adapter (teloxide).
//!
//! This crate implements the `chanpost-core` messaging and broadcast ports
//! over the Telegram Bot API.

use async_trait::async_trait;

use teloxide::{
    prelude::*,
    types::{InlineKeyboardButton, InlineKeyboardMarkup, InputFile, ParseMode, Recipient},
};

use tokio::time::sleep;

pub mod handlers;
pub mod router;

use chanpost_core::{
    domain::{ChannelTarget, ChatId, FileId, MessageId, MessageRef},
    draft::{LinkButton, PostItem},
    errors::Error,
    messaging::{port::MessagingPort, types::InlineKeyboard},
    publisher::BroadcastPort,
    Result,
};

#[derive(Clone)]
pub struct TelegramMessenger {
    bot: Bot,
}

impl TelegramMessenger {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }

    pub fn bot(&self) -> Bot {
        self.bot.clone()
    }

    fn tg_chat(chat_id: ChatId) -> teloxide::types::ChatId {
        teloxide::types::ChatId(chat_id.0)
    }

    fn tg_recipient(channel: &ChannelTarget) -> Recipient {
        match channel {
            ChannelTarget::Id(id) => Recipient::Id(teloxide::types::ChatId(*id)),
            ChannelTarget::Username(name) => Recipient::ChannelUsername(name.clone()),
        }
    }

    fn map_err(e: teloxide::RequestError) -> Error {
        Error::Transport(format!("telegram error: {e}"))
    }

    /// URL buttons, one per row. The parser only guarantees an `http` prefix;
    /// a URL Telegram cannot take still fails here, surfaced per item.
    fn link_markup(buttons: &[LinkButton]) -> Result<InlineKeyboardMarkup> {
        let mut rows: Vec<Vec<InlineKeyboardButton>> = Vec::with_capacity(buttons.len());
        for b in buttons {
            let url = url::Url::parse(b.url())
                .map_err(|e| Error::Transport(format!("invalid button url {}: {e}", b.url())))?;
            rows.push(vec![InlineKeyboardButton::url(b.label().to_string(), url)]);
        }
        Ok(InlineKeyboardMarkup::new(rows))
    }

    fn callback_markup(keyboard: InlineKeyboard) -> InlineKeyboardMarkup {
        let rows: Vec<Vec<InlineKeyboardButton>> = keyboard
            .rows
            .into_iter()
            .map(|row| {
                row.into_iter()
                    .map(|b| InlineKeyboardButton::callback(b.label, b.callback_data))
                    .collect()
            })
            .collect();
        InlineKeyboardMarkup::new(rows)
    }

    async fn with_retry<T, Fut>(&self, mut op: impl FnMut() -> Fut) -> Result<T>
    where
        Fut: std::future::IntoFuture<Output = std::result::Result<T, teloxide::RequestError>>,
        Fut::IntoFuture: Send,
    {
        const MAX_RETRIES: usize = 1;
        let mut attempts = 0usize;
        loop {
            match op().await {
                Ok(v) => return Ok(v),
                Err(e) => match e {
                    teloxide::RequestError::RetryAfter(d) if attempts < MAX_RETRIES => {
                        attempts += 1;
                        sleep(d).await;
                        continue;
                    }
                    other => return Err(Self::map_err(other)),
                },
            }
        }
    }

    async fn emit_photo(
        &self,
        to: Recipient,
        media: &FileId,
        caption: &str,
        buttons: &[LinkButton],
    ) -> Result<teloxide::types::Message> {
        let markup = if buttons.is_empty() {
            None
        } else {
            Some(Self::link_markup(buttons)?)
        };

        self.with_retry(|| {
            let mut req = self
                .bot
                .send_photo(to.clone(), InputFile::file_id(media.0.clone()))
                .caption(caption.to_string());
            if let Some(m) = markup.clone() {
                req = req.reply_markup(m);
            }
            req
        })
        .await
    }
}

#[async_trait]
impl MessagingPort for TelegramMessenger {
    async fn send_html(&self, chat_id: ChatId, html: &str) -> Result<MessageRef> {
        let msg = self
            .with_retry(|| {
                self.bot
                    .send_message(Self::tg_chat(chat_id), html.to_string())
                    .parse_mode(ParseMode::Html)
            })
            .await?;

        Ok(MessageRef {
            chat_id,
            message_id: MessageId(msg.id.0),
        })
    }

    async fn send_photo(
        &self,
        chat_id: ChatId,
        media: &FileId,
        caption: &str,
        buttons: &[LinkButton],
    ) -> Result<MessageRef> {
        let msg = self
            .emit_photo(
                Recipient::Id(Self::tg_chat(chat_id)),
                media,
                caption,
                buttons,
            )
            .await?;

        Ok(MessageRef {
            chat_id,
            message_id: MessageId(msg.id.0),
        })
    }

    async fn send_menu(
        &self,
        chat_id: ChatId,
        text: &str,
        keyboard: InlineKeyboard,
    ) -> Result<MessageRef> {
        let markup = Self::callback_markup(keyboard);
        let msg = self
            .with_retry(|| {
                self.bot
                    .send_message(Self::tg_chat(chat_id), text.to_string())
                    .parse_mode(ParseMode::Html)
                    .reply_markup(markup.clone())
            })
            .await?;

        Ok(MessageRef {
            chat_id,
            message_id: MessageId(msg.id.0),
        })
    }

    async fn answer_callback(&self, callback_id: &str, text: Option<&str>) -> Result<()> {
        self.with_retry(|| {
            let mut req = self.bot.answer_callback_query(callback_id.to_string());
            if let Some(t) = text {
                req = req.text(t.to_string());
            }
            req
        })
        .await?;
        Ok(())
    }
}

#[async_trait]
impl BroadcastPort for TelegramMessenger {
    async fn send_post(&self, channel: &ChannelTarget, item: &PostItem) -> Result<()> {
        self.emit_photo(
            Self::tg_recipient(channel),
            &item.media,
            &item.caption,
            &item.buttons,
        )
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn link_markup_puts_one_url_button_per_row() {
        let buttons = vec![
            LinkButton::new("Buy", "https://example.com/buy"),
            LinkButton::new("Docs", "http://example.com/a-b"),
        ];
        let markup = TelegramMessenger::link_markup(&buttons).unwrap();
        assert_eq!(markup.inline_keyboard.len(), 2);
        assert_eq!(markup.inline_keyboard[0].len(), 1);
        assert_eq!(markup.inline_keyboard[0][0].text, "Buy");
    }

    #[test]
    fn link_markup_rejects_unparseable_urls() {
        // The parser only checks the `http` prefix; anything Telegram would
        // refuse must fail here instead of at send time.
        let buttons = vec![LinkButton::new("Bad", "http://")];
        assert!(TelegramMessenger::link_markup(&buttons).is_err());
    }

    #[test]
    fn recipient_maps_id_and_username() {
        assert!(matches!(
            TelegramMessenger::tg_recipient(&ChannelTarget::Id(-100123)),
            Recipient::Id(teloxide::types::ChatId(-100123))
        ));
        assert!(matches!(
            TelegramMessenger::tg_recipient(&ChannelTarget::Username("@chan".into())),
            Recipient::ChannelUsername(name) if name == "@chan"
        ));
    }
}
