//! HTTP-facing error taxonomy.
//!
//! Handlers return `Result<HttpResponse, ApiError>`; actix renders the error
//! through [`ResponseError`] with the matching status code.

use actix_web::http::{header, StatusCode};
use actix_web::{HttpResponse, ResponseError};
use std::collections::BTreeMap;

use crate::db::DbError;

/// Field name → list of messages for that field
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// Key used for errors that are not tied to one field (e.g. a malformed body)
pub const NON_FIELD_ERRORS: &str = "non_field_errors";

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Authentication credentials were not provided or are invalid")]
    Unauthenticated,
    #[error("You do not have permission to perform this action")]
    Forbidden,
    #[error("Not found")]
    NotFound,
    #[error("Validation failed")]
    ValidationFailed(FieldErrors),
    #[error("Internal server error")]
    Internal(String),
}

impl ApiError {
    /// Validation failure on a single field
    pub fn field(field: &str, message: impl Into<String>) -> Self {
        let mut errors = FieldErrors::new();
        errors.insert(field.to_string(), vec![message.into()]);
        ApiError::ValidationFailed(errors)
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Unauthenticated => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::ValidationFailed(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            ApiError::ValidationFailed(fields) => serde_json::json!({
                "error": self.to_string(),
                "fields": fields,
            }),
            _ => serde_json::json!({ "error": self.to_string() }),
        };
        let mut response = HttpResponse::build(self.status_code());
        if let ApiError::Unauthenticated = self {
            response.insert_header((header::WWW_AUTHENTICATE, "Bearer"));
        }
        response.json(body)
    }
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::Duplicate(field) => {
                ApiError::field(field, format!("A user with that {} already exists.", field))
            }
            other => {
                log::error!("Database error: {}", other);
                ApiError::Internal(other.to_string())
            }
        }
    }
}
