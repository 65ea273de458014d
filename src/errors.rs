use std::fmt;

use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse
};
use derive_more::Display;
use serde::Serialize;
use validator::ValidationErrors;

/// Postgres SQLSTATE for `serialization_failure`.
pub const SERIALIZATION_FAILURE: &str = "40001";
/// Postgres SQLSTATE for `deadlock_detected`.
pub const DEADLOCK_DETECTED: &str = "40P01";

#[derive(Debug)]
pub enum AppError {
    ValidationError(Vec<FieldError>),
    InvalidInput(String),
    NotFound(String),
    DuplicateUrl(String),
    EmptyCollection,
    UnauthorizedAccess,
    StorageError(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::ValidationError(errors) => {
                let messages = errors.iter()
                    .map(|e| format!("{}:{}", e.field, e.message))
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "validation error: {}", messages)
            }
            AppError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::DuplicateUrl(url) => write!(f, "Duplicating URL: {}", url),
            AppError::EmptyCollection => write!(f, "No images in the gallery"),
            AppError::UnauthorizedAccess => write!(f, "Unauthorized access"),
            AppError::StorageError(msg) => write!(f, "Storage error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        let body = match self {
            AppError::ValidationError(errors) => {
                serde_json::json!({
                    "error": "Validation failed",
                    "details": errors
                })
            }
            AppError::DuplicateUrl(url) => {
                serde_json::json!({
                    "error": self.to_string(),
                    "url": url
                })
            }
            // Backend details stay in the logs.
            AppError::StorageError(_) => {
                serde_json::json!({"error": "Internal server error"})
            }
            _ => {
                serde_json::json!({"error": self.to_string()})
            }
        };
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .json(body)
    }

    fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::DuplicateUrl(_) => StatusCode::CONFLICT,
            AppError::EmptyCollection => StatusCode::NOT_FOUND,
            AppError::UnauthorizedAccess => StatusCode::UNAUTHORIZED,
            AppError::StorageError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        let field_errors = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(|e| FieldError {
                    field: field.to_string(),
                    message: e
                        .message
                        .as_ref()
                        .map(|s| s.to_string())
                        .unwrap_or_else(|| "Invalid value".to_string()),
                })
            })
            .collect();

        AppError::ValidationError(field_errors)
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => AppError::NotFound("Record not found".into()),
            _ => AppError::StorageError(format!("Database error: {}", err))
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::StorageError(err.to_string())
    }
}

/// True when the backend aborted a transaction because of a concurrent writer.
pub fn is_transaction_conflict(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(e) => matches!(
            e.code().as_deref(),
            Some(SERIALIZATION_FAILURE) | Some(DEADLOCK_DETECTED)
        ),
        _ => false,
    }
}

#[derive(Debug, Display)]
pub enum ConsoleAuthError {
    #[display("Missing credentials")]
    MissingCredentials,

    #[display("Malformed authorization header")]
    MalformedHeader,

    #[display("Wrong credentials")]
    WrongCredentials,

    #[display("Console credentials are not configured")]
    NotConfigured,
}

impl ResponseError for ConsoleAuthError {
    fn error_response(&self) -> HttpResponse {
        let mut builder = HttpResponse::build(self.status_code());
        if self.status_code() == StatusCode::UNAUTHORIZED {
            builder.insert_header(("WWW-Authenticate", r#"Basic realm="console""#));
        }
        builder.json(serde_json::json!({"error": self.to_string()}))
    }

    fn status_code(&self) -> StatusCode {
        match *self {
            ConsoleAuthError::MissingCredentials => StatusCode::UNAUTHORIZED,
            ConsoleAuthError::MalformedHeader => StatusCode::UNAUTHORIZED,
            ConsoleAuthError::WrongCredentials => StatusCode::UNAUTHORIZED,
            ConsoleAuthError::NotConfigured => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}
