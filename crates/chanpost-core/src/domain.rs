use std::str::FromStr;

/// Telegram user id (numeric). Sole key into the draft store.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct UserId(pub i64);

/// Telegram chat id (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ChatId(pub i64);

/// Telegram message id (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MessageId(pub i32);

/// A stable reference to a Telegram message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MessageRef {
    pub chat_id: ChatId,
    pub message_id: MessageId,
}

/// Opaque handle to an uploaded image (Telegram file id).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FileId(pub String);

/// Broadcast destination: either a numeric chat id or an `@username` channel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChannelTarget {
    Id(i64),
    Username(String),
}

impl FromStr for ChannelTarget {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err("channel id is empty".to_string());
        }
        if s.starts_with('@') {
            return Ok(ChannelTarget::Username(s.to_string()));
        }
        s.parse::<i64>()
            .map(ChannelTarget::Id)
            .map_err(|_| format!("channel id must be numeric or start with '@': {s}"))
    }
}

impl std::fmt::Display for ChannelTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChannelTarget::Id(id) => write!(f, "{id}"),
            ChannelTarget::Username(name) => write!(f, "{name}"),
        }
    }
}
