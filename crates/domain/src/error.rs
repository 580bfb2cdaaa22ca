/// Shared error type used across all Museforge crates.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("IO: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("storage read: {0}")]
    StorageRead(String),

    #[error("storage write: {0}")]
    StorageWrite(String),

    #[error("store locked: {0}")]
    StoreLocked(String),

    #[error("config: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;
