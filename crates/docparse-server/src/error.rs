use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use docparse_core::error::{DocParseError, ModelClientError};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub details: String,
}

/// An error rendered as `{error, details}` JSON.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub error: &'static str,
    pub details: String,
}

impl ApiError {
    pub fn bad_request(details: impl Into<String>) -> Self {
        ApiError {
            status: StatusCode::BAD_REQUEST,
            error: "bad_request",
            details: details.into(),
        }
    }
}

impl From<DocParseError> for ApiError {
    fn from(err: DocParseError) -> Self {
        let (status, error) = match &err {
            DocParseError::InvalidPdf(_) => (StatusCode::BAD_REQUEST, "invalid_pdf"),
            DocParseError::FieldSchema(_) | DocParseError::FieldsLoad { .. } => {
                (StatusCode::BAD_REQUEST, "invalid_fields")
            }
            DocParseError::Json(_) => (StatusCode::BAD_REQUEST, "invalid_json"),
            DocParseError::DocumentTooLarge { .. } => {
                (StatusCode::PAYLOAD_TOO_LARGE, "document_too_large")
            }
            DocParseError::EmptyDocument => (StatusCode::UNPROCESSABLE_ENTITY, "empty_document"),
            DocParseError::Extraction(_) | DocParseError::PopplerFailed { .. } => {
                (StatusCode::UNPROCESSABLE_ENTITY, "extraction_failed")
            }
            DocParseError::ModelClient(ModelClientError::Timeout(_)) => {
                (StatusCode::GATEWAY_TIMEOUT, "model_timeout")
            }
            DocParseError::ModelClient(_) => (StatusCode::BAD_GATEWAY, "model_error"),
            DocParseError::ResponseParse(_) => (StatusCode::BAD_GATEWAY, "invalid_model_response"),
            DocParseError::PopplerNotFound { .. }
            | DocParseError::Config(_)
            | DocParseError::Io(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        };
        ApiError {
            status,
            error,
            details: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(status = %self.status, error = self.error, "{}", self.details);
        } else {
            tracing::warn!(status = %self.status, error = self.error, "{}", self.details);
        }
        let body = ErrorBody {
            error: self.error.to_string(),
            details: self.details,
        };
        (self.status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn status_of(err: DocParseError) -> StatusCode {
        ApiError::from(err).status
    }

    #[test]
    fn test_local_errors_map_to_client_statuses() {
        assert_eq!(
            status_of(DocParseError::InvalidPdf("missing header".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(DocParseError::FieldSchema("empty".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(DocParseError::DocumentTooLarge { size: 20, limit: 10 }),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(
            status_of(DocParseError::EmptyDocument),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    #[test]
    fn test_model_errors_map_to_gateway_statuses() {
        assert_eq!(
            status_of(DocParseError::ModelClient(ModelClientError::Timeout(
                Duration::from_secs(60)
            ))),
            StatusCode::GATEWAY_TIMEOUT
        );
        assert_eq!(
            status_of(DocParseError::ModelClient(ModelClientError::Server {
                status: 503,
                message: "overloaded".into()
            })),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            status_of(DocParseError::ResponseParse("not json".into())),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_missing_tool_is_internal() {
        assert_eq!(
            status_of(DocParseError::PopplerNotFound { tool: "pdftotext" }),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
