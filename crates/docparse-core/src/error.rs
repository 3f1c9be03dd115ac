use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum DocParseError {
    #[error("PDF extraction failed: {0}")]
    Extraction(String),

    #[error("{tool} not found. Install poppler: brew install poppler (macOS) or apt install poppler-utils (Linux)")]
    PopplerNotFound { tool: &'static str },

    #[error("{tool} failed with exit code {code}: {stderr}")]
    PopplerFailed {
        tool: &'static str,
        code: i32,
        stderr: String,
    },

    #[error("invalid PDF file: {0}")]
    InvalidPdf(String),

    #[error("document is empty: no text could be extracted")]
    EmptyDocument,

    #[error("document is {size} bytes, which exceeds the limit of {limit} bytes")]
    DocumentTooLarge { size: usize, limit: usize },

    #[error("invalid field schema: {0}")]
    FieldSchema(String),

    #[error("failed to load fields from {path}: {reason}")]
    FieldsLoad { path: PathBuf, reason: String },

    #[error("model request failed: {0}")]
    ModelClient(#[from] ModelClientError),

    #[error("failed to parse model response: {0}")]
    ResponseParse(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl DocParseError {
    /// True for errors raised locally before any network call was made.
    pub fn is_local(&self) -> bool {
        !matches!(
            self,
            DocParseError::ModelClient(_) | DocParseError::ResponseParse(_)
        )
    }
}

/// Failure talking to the hosted model.
#[derive(Debug, thiserror::Error)]
pub enum ModelClientError {
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("rate limited by the model API: {message}")]
    RateLimited {
        retry_after: Option<Duration>,
        message: String,
    },

    #[error("model API server error ({status}): {message}")]
    Server { status: u16, message: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("authentication rejected ({status}): {message}")]
    Auth { status: u16, message: String },

    #[error("request rejected ({status}): {message}")]
    BadRequest { status: u16, message: String },

    #[error("unexpected reply from the model API: {0}")]
    InvalidReply(String),
}

impl ModelClientError {
    /// Rate limiting, 5xx, transport failures and timeouts are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ModelClientError::Timeout(_)
                | ModelClientError::RateLimited { .. }
                | ModelClientError::Server { .. }
                | ModelClientError::Transport(_)
        )
    }

    /// Delay requested by the server, if any.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            ModelClientError::RateLimited { retry_after, .. } => *retry_after,
            _ => None,
        }
    }

    /// Classify a non-success HTTP status from the model API.
    pub fn from_status(status: u16, retry_after: Option<Duration>, message: String) -> Self {
        match status {
            401 | 403 => ModelClientError::Auth { status, message },
            429 => ModelClientError::RateLimited {
                retry_after,
                message,
            },
            500..=599 => ModelClientError::Server { status, message },
            _ => ModelClientError::BadRequest { status, message },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        assert!(matches!(
            ModelClientError::from_status(401, None, String::new()),
            ModelClientError::Auth { status: 401, .. }
        ));
        assert!(matches!(
            ModelClientError::from_status(429, Some(Duration::from_secs(2)), String::new()),
            ModelClientError::RateLimited { .. }
        ));
        assert!(matches!(
            ModelClientError::from_status(503, None, String::new()),
            ModelClientError::Server { status: 503, .. }
        ));
        assert!(matches!(
            ModelClientError::from_status(400, None, String::new()),
            ModelClientError::BadRequest { status: 400, .. }
        ));
    }

    #[test]
    fn test_retryable() {
        assert!(ModelClientError::Timeout(Duration::from_secs(1)).is_retryable());
        assert!(ModelClientError::from_status(502, None, String::new()).is_retryable());
        assert!(ModelClientError::from_status(429, None, String::new()).is_retryable());
        assert!(!ModelClientError::from_status(401, None, String::new()).is_retryable());
        assert!(!ModelClientError::from_status(422, None, String::new()).is_retryable());
        assert!(!ModelClientError::InvalidReply("x".into()).is_retryable());
    }

    #[test]
    fn test_local_errors() {
        assert!(DocParseError::EmptyDocument.is_local());
        assert!(DocParseError::DocumentTooLarge { size: 2, limit: 1 }.is_local());
        assert!(!DocParseError::ResponseParse("bad".into()).is_local());
        assert!(!DocParseError::ModelClient(ModelClientError::Transport("x".into())).is_local());
    }
}
