use thiserror::Error;

#[derive(Error, Debug)]
pub enum SpeedTestError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Server answered with status {0}")]
    Status(reqwest::StatusCode),

    #[error("Test cancelled")]
    Cancelled,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to parse connection info: {0}")]
    MetadataParse(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl SpeedTestError {
    /// Cancellation is an outcome, not a failure.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, SpeedTestError::Cancelled)
    }
}
