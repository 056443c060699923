use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Scroll cursor exhausted")]
    EndOfScroll,

    #[error("Result transformation failed: {0}")]
    Transform(String),

    #[error("Page {page} is out of range (1..={pages})")]
    PageOutOfRange { page: usize, pages: usize },

    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Backend not connected")]
    NotConnected,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    SerdeJson(#[from] serde_json::Error),

    #[error(transparent)]
    SerdeYaml(#[from] serde_yaml::Error),
}
