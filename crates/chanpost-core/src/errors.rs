/// Validation failures recovered locally: reported to the operator as
/// guidance text; the draft does not advance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("the image must include a caption")]
    MissingCaption,

    #[error("single-post drafts hold exactly one image")]
    SingleModeExceeded,

    #[error("there are no buttons to delete")]
    NothingToDelete,

    #[error("there is nothing to publish yet")]
    EmptyDraft,
}

/// Core error type.
///
/// The adapter crate maps its transport errors into `Transport` so the core
/// can handle failures consistently (user-facing guidance vs per-item record).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("no active draft; start a new post first")]
    SessionExpired,

    #[error("post limit of {limit} per minute reached")]
    QuotaExceeded { limit: u32 },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
