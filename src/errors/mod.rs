use std::io::Error as IoError;

use actix_web::{
    http::{header::RETRY_AFTER, StatusCode},
    HttpResponse, ResponseError,
};
use log::error;
use serde_json::json;
use thiserror::Error;

pub mod config;
pub mod service;
pub mod store;

pub use config::ConfigError;
pub use service::ServiceError;
pub use store::StoreError;

const GENERIC_SERVER_ERROR: &str = "Internal server error";

#[derive(Debug, Error)]
pub enum AppError {
    // Service-level domain errors
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    #[error("Not found error: {0}")]
    NotFound(String),
    #[error("Rate limited: retry after {retry_after}s")]
    RateLimited { retry_after: u64 },
    #[error("Storage exhausted: {0}")]
    StorageExhausted(String),
    #[error("Internal error: {0}")]
    Internal(String),
    // Infrastructure/system errors
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Server error: {0}")]
    Server(#[from] IoError),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Logger error: {0}")]
    Logger(String),
}

impl From<ConfigError> for AppError {
    fn from(e: ConfigError) -> Self {
        AppError::Config(e.to_string())
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        AppError::Storage(err.to_string())
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::InvalidPayload(msg) | ServiceError::InvalidCode(msg) => {
                AppError::Validation(msg)
            }
            ServiceError::NotFound(msg) => AppError::NotFound(msg),
            ServiceError::StorageExhausted(msg) => AppError::StorageExhausted(msg),
            ServiceError::Store(e) => AppError::from(e),
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        // Flatten field errors into a single string
        let message = errors
            .field_errors()
            .iter()
            .map(|(field, errs)| {
                let reasons = errs
                    .iter()
                    .map(|e| e.message.clone().unwrap_or_else(|| e.code.clone()))
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("{}: {}", field, reasons)
            })
            .collect::<Vec<_>>()
            .join("; ");
        AppError::Validation(message)
    }
}

impl AppError {
    fn error_type(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::Unauthorized(_) => "UNAUTHORIZED",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::RateLimited { .. } => "RATE_LIMITED",
            _ => "INTERNAL_ERROR",
        }
    }

    /// Message shown to the caller. Server-side failures are reduced to a
    /// generic string so store details never reach the response body.
    fn public_message(&self) -> String {
        match self {
            AppError::Validation(msg) | AppError::Unauthorized(msg) | AppError::NotFound(msg) => {
                msg.clone()
            }
            AppError::RateLimited { .. } => "Rate limit exceeded. Try again later.".to_string(),
            _ => GENERIC_SERVER_ERROR.to_string(),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            AppError::StorageExhausted(_)
            | AppError::Internal(_)
            | AppError::Storage(_)
            | AppError::Server(_)
            | AppError::Config(_)
            | AppError::Logger(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            error!("Request failed: {}", self);
        }

        let mut body = json!({
            "type": self.error_type(),
            "message": self.public_message(),
            "status_code": status.as_u16(),
        });

        let mut builder = HttpResponse::build(status);
        if let AppError::RateLimited { retry_after } = self {
            body["retryAfter"] = json!(retry_after);
            builder.insert_header((RETRY_AFTER, retry_after.to_string()));
        }

        builder.json(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    async fn body_json(err: AppError) -> serde_json::Value {
        let bytes = to_bytes(err.error_response().into_body()).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            AppError::Validation("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::Unauthorized("x".into()).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::NotFound("x".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::RateLimited { retry_after: 5 }.status_code(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            AppError::StorageExhausted("x".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[actix_web::test]
    async fn test_rate_limited_response_carries_retry_hint() {
        let response = AppError::RateLimited { retry_after: 42 }.error_response();
        assert_eq!(
            response.headers().get(RETRY_AFTER).unwrap().to_str().unwrap(),
            "42"
        );

        let body = body_json(AppError::RateLimited { retry_after: 42 }).await;
        assert_eq!(body["retryAfter"], 42);
        assert_eq!(body["status_code"], 429);
    }

    #[actix_web::test]
    async fn test_storage_errors_do_not_leak_details() {
        let body = body_json(AppError::Storage("redis://secret-host refused".into())).await;
        assert_eq!(body["message"], GENERIC_SERVER_ERROR);
        assert_eq!(body["type"], "INTERNAL_ERROR");
    }

    #[test]
    fn test_service_error_mapping() {
        let err = AppError::from(ServiceError::InvalidPayload("Missing payload".into()));
        assert!(matches!(err, AppError::Validation(_)));

        let err = AppError::from(ServiceError::Store(StoreError::Unavailable("down".into())));
        assert!(matches!(err, AppError::Storage(_)));
    }
}
