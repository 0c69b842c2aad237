/// Core error type for the bot.
///
/// Adapter crates map their SDK errors into this type so the core can
/// handle failures consistently (swallow at the tick boundary vs fatal).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("feed error: {0}")]
    Feed(String),

    #[error("chat error: {0}")]
    Chat(String),
}

pub type Result<T> = std::result::Result<T, Error>;
