use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid input: {0}")]
    Input(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Invalid date range: {0}")]
    InvalidDateRange(String),

    /// A failure raised while scores were being computed. Nothing was written.
    #[error("Scoring failed: {0}")]
    Scoring(#[source] Box<Error>),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Ingestion error: {0}")]
    Ingestion(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("External error: {0}")]
    External(#[from] anyhow::Error),
}

impl Error {
    /// Errors caused by the caller's input rather than by the system.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Error::Input(_) | Error::InvalidParameter(_) | Error::InvalidDateRange(_)
        )
    }

    /// Wrap a failure from the scoring phase, keeping the original cause.
    pub fn scoring(cause: Error) -> Self {
        Error::Scoring(Box::new(cause))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
