use thiserror::Error;

/// Errors raised at the fallible edges of a session: files, quiz loading and CSV import.
#[derive(Debug, Error)]
pub enum VigilError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid quiz: {0}")]
    InvalidQuiz(String),

    #[error("Unknown event type: {0}")]
    UnknownEventType(String),

    #[error("Malformed row {row}: {reason}")]
    MalformedRow { row: usize, reason: String },
}

pub type Result<T> = std::result::Result<T, VigilError>;
