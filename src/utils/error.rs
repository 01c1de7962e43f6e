use axum::http::StatusCode;
use axum::response::Response;
use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::error;

use crate::media::MediaError;
use crate::repositories::RepoError;
use crate::utils::clock::RequestTime;
use crate::utils::response::error as error_response;

const VALIDATION_MESSAGE: &str = "Value in body missing the validation requirement";
const INTERNAL_MESSAGE: &str = "Internal server error";
const TOO_LARGE_MESSAGE: &str = "Request body exceeds the upload size limit";

/// One rejected input field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {} field(s) rejected", .0.len())]
    ValidationError(Vec<FieldError>),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Request body too large: {0}")]
    PayloadTooLarge(String),

    #[error("Image upload failed: {0}")]
    MediaUpload(#[source] MediaError),

    #[error("Image delete failed: {0}")]
    MediaDelete(#[source] MediaError),

    #[error("Persistence error: {0}")]
    Persistence(#[from] RepoError),

    #[error("Internal server error: {0}")]
    InternalServerError(String),
}

/// Flattens validator output into one entry per failed rule, ordered by field.
pub fn field_errors(errors: &validator::ValidationErrors) -> Vec<FieldError> {
    let mut fields: Vec<FieldError> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errs)| {
            let field = field.to_string();
            errs.iter().map(move |e| {
                let message = e
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("Invalid value ({})", e.code));
                FieldError::new(field.clone(), message)
            })
        })
        .collect();
    fields.sort_by(|a, b| a.field.cmp(&b.field));
    fields
}

impl AppError {
    pub fn event_not_found() -> Self {
        AppError::NotFound("Event not found!".to_string())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::MediaUpload(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::MediaDelete(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::ValidationError(_) => "VALIDATION_ERROR",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::PayloadTooLarge(_) => "PAYLOAD_TOO_LARGE",
            AppError::MediaUpload(_) => "MEDIA_UPLOAD_ERROR",
            AppError::MediaDelete(_) => "MEDIA_DELETE_ERROR",
            AppError::Persistence(_) => "PERSISTENCE_ERROR",
            AppError::InternalServerError(_) => "INTERNAL_SERVER_ERROR",
        }
    }

    fn log(&self) {
        match self {
            AppError::ValidationError(fields) => {
                error!(error = ?self, fields = fields.len(), "Validation error");
            }
            AppError::NotFound(msg)
            | AppError::PayloadTooLarge(msg)
            | AppError::InternalServerError(msg) => {
                error!(error = ?self, message = %msg, "Application error");
            }
            AppError::MediaUpload(e) | AppError::MediaDelete(e) => {
                error!(error = ?e, code = self.code(), "Media host error");
            }
            AppError::Persistence(e) => {
                error!(error = ?e, "Database error");
            }
        }
    }

    fn public_message(&self) -> String {
        match self {
            AppError::ValidationError(_) => VALIDATION_MESSAGE.to_string(),
            AppError::NotFound(msg) => msg.clone(),
            AppError::PayloadTooLarge(_) => TOO_LARGE_MESSAGE.to_string(),
            _ => INTERNAL_MESSAGE.to_string(),
        }
    }

    /// Itemized fields for validation failures, otherwise a code plus a
    /// description that carries no internal detail.
    fn detail(&self) -> Value {
        let description = match self {
            AppError::ValidationError(fields) => return json!(fields),
            AppError::NotFound(msg) => msg.as_str(),
            AppError::PayloadTooLarge(msg) => msg.as_str(),
            AppError::MediaUpload(_) => "Image upload failed",
            AppError::MediaDelete(_) => "Image delete failed",
            AppError::Persistence(_) => "A database error occurred",
            AppError::InternalServerError(_) => "An unexpected error occurred",
        };

        json!({ "code": self.code(), "description": description })
    }

    /// Logs the failure and renders it in the response envelope.
    pub fn into_envelope(self, requested_at: &RequestTime) -> Response {
        self.log();

        error_response(
            requested_at,
            self.public_message(),
            self.detail(),
            self.status_code(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::clock::ResponseClock;
    use validator::Validate;

    #[derive(Validate)]
    struct Form {
        #[validate(length(min = 1, message = "title is required"))]
        title: String,
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            AppError::ValidationError(vec![]).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(AppError::event_not_found().status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            AppError::PayloadTooLarge("length limit exceeded".into()).status_code(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(
            AppError::MediaDelete(MediaError::Transport("down".into())).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AppError::from(RepoError::database("find_all", "timeout")).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_validation_errors_are_itemized() {
        let form = Form {
            title: String::new(),
        };

        let fields = field_errors(&form.validate().unwrap_err());

        assert_eq!(fields, vec![FieldError::new("title", "title is required")]);
    }

    #[tokio::test]
    async fn test_internal_details_are_not_exposed() {
        let err = AppError::from(RepoError::database("insert", "password=hunter2"));

        let response = err.into_envelope(&ResponseClock::default().stamp());
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = String::from_utf8(bytes.to_vec()).unwrap();

        assert!(body.contains("Internal server error"));
        assert!(body.contains("PERSISTENCE_ERROR"));
        assert!(!body.contains("hunter2"));
    }
}
