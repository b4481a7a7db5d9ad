use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Missing corpus layer directory: {0}")]
    MissingLayer(String),

    #[error("Empty corpus: {0}")]
    EmptyCorpus(String),

    #[error("Index does not match its chunk metadata: {0}")]
    IndexMismatch(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
