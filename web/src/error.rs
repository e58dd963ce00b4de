//! Error types for web handlers.
//!
//! Bridges the reservation error taxonomy to HTTP responses. Every error
//! leaves as a JSON body `{"code": "...", "message": "..."}`.
//!
//! | error                                                  | status |
//! |--------------------------------------------------------|--------|
//! | `ResourceNotFound`, `NotRegistered`                    | 404    |
//! | `RegistrationClosed`, `ResourceFull`, `AlreadyRegistered` | 409 |
//! | `Busy`, `Unavailable`                                  | 503    |
//! | resource validation, undecodable JSON body             | 422    |
//! | body without a JSON content type                       | 415    |
//! | malformed path id                                      | 400    |
//! | missing or malformed subject                           | 401    |

use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use reservations_core::{RegistrationError, ResourceValidationError, StoreError};
use serde::Serialize;
use std::fmt;

/// Application error type for web handlers.
///
/// Implements Axum's `IntoResponse`, so handlers return
/// `Result<_, AppError>` and use `?` on domain errors.
#[derive(Debug)]
pub struct AppError {
    /// HTTP status code
    status: StatusCode,
    /// Error message (user-facing)
    message: String,
    /// Error code (for client error handling)
    code: String,
    /// Internal error (for logging, not exposed to client)
    source: Option<anyhow::Error>,
}

impl AppError {
    /// Create a new application error.
    #[must_use]
    pub const fn new(status: StatusCode, message: String, code: String) -> Self {
        Self {
            status,
            message,
            code,
            source: None,
        }
    }

    /// Attach the underlying error. It is logged, never sent to the client.
    #[must_use]
    pub fn with_source(mut self, source: anyhow::Error) -> Self {
        self.source = Some(source);
        self
    }

    /// Create a 401 Unauthorized error.
    #[must_use]
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::UNAUTHORIZED,
            message.into(),
            "UNAUTHORIZED".to_string(),
        )
    }

    /// Create a 409 Conflict error.
    #[must_use]
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, message.into(), "CONFLICT".to_string())
    }

    /// Create a 422 Unprocessable Entity error.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::UNPROCESSABLE_ENTITY,
            message.into(),
            "VALIDATION_ERROR".to_string(),
        )
    }

    /// Create a 503 Service Unavailable error.
    #[must_use]
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::SERVICE_UNAVAILABLE,
            message.into(),
            "SERVICE_UNAVAILABLE".to_string(),
        )
    }

    /// HTTP status this error responds with.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Machine-readable error code.
    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Error response body (JSON).
#[derive(Debug, Serialize)]
struct ErrorResponse {
    /// Error code (for client error handling).
    code: String,
    /// Human-readable error message.
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            if let Some(source) = &self.source {
                tracing::error!(
                    status = %self.status,
                    code = %self.code,
                    message = %self.message,
                    error = %source,
                    "Request failed"
                );
            } else {
                tracing::error!(
                    status = %self.status,
                    code = %self.code,
                    message = %self.message,
                    "Request failed"
                );
            }
        }

        let body = ErrorResponse {
            code: self.code,
            message: self.message,
        };

        (self.status, Json(body)).into_response()
    }
}

impl From<RegistrationError> for AppError {
    fn from(err: RegistrationError) -> Self {
        let status = match &err {
            RegistrationError::ResourceNotFound(_) | RegistrationError::NotRegistered { .. } => {
                StatusCode::NOT_FOUND
            }
            RegistrationError::RegistrationClosed { .. }
            | RegistrationError::ResourceFull { .. }
            | RegistrationError::AlreadyRegistered { .. } => StatusCode::CONFLICT,
            RegistrationError::Busy { .. } | RegistrationError::Unavailable(_) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
        };
        let code = err.kind().to_ascii_uppercase();

        if err.is_unavailable() {
            Self::new(status, "Reservation backend unavailable".to_string(), code)
                .with_source(anyhow::Error::new(err))
        } else {
            Self::new(status, err.to_string(), code)
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict { .. } | StoreError::ResourceExists(_) => {
                Self::conflict(err.to_string())
            }
            StoreError::Unavailable(_) => Self::unavailable("Reservation backend unavailable")
                .with_source(anyhow::Error::new(err)),
        }
    }
}

impl From<ResourceValidationError> for AppError {
    fn from(err: ResourceValidationError) -> Self {
        Self::validation(err.to_string())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        Self::new(
            StatusCode::BAD_REQUEST,
            rejection.body_text(),
            "INVALID_PATH".to_string(),
        )
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        if matches!(rejection, JsonRejection::MissingJsonContentType(_)) {
            return Self::new(
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                rejection.body_text(),
                "UNSUPPORTED_MEDIA_TYPE".to_string(),
            );
        }
        Self::validation(rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reservations_core::{ResourceId, SubjectId};
    use std::time::Duration;

    #[test]
    fn test_error_display() {
        let err = AppError::unauthorized("Missing X-Subject-Id header");
        assert_eq!(
            err.to_string(),
            "[UNAUTHORIZED] Missing X-Subject-Id header"
        );
    }

    #[test]
    fn test_registration_outcomes_map_to_status() {
        let resource_id = ResourceId::new();
        let subject_id = SubjectId::new();
        let cases = [
            (
                RegistrationError::ResourceNotFound(resource_id),
                StatusCode::NOT_FOUND,
            ),
            (
                RegistrationError::NotRegistered {
                    resource_id,
                    subject_id,
                },
                StatusCode::NOT_FOUND,
            ),
            (
                RegistrationError::ResourceFull {
                    resource_id,
                    capacity: 1,
                },
                StatusCode::CONFLICT,
            ),
            (
                RegistrationError::AlreadyRegistered {
                    resource_id,
                    subject_id,
                },
                StatusCode::CONFLICT,
            ),
            (
                RegistrationError::Busy {
                    resource_id,
                    timeout: Duration::from_millis(10),
                },
                StatusCode::SERVICE_UNAVAILABLE,
            ),
        ];

        for (err, status) in cases {
            let kind = err.kind().to_ascii_uppercase();
            let app = AppError::from(err);
            assert_eq!(app.status(), status);
            assert_eq!(app.code(), kind);
        }
    }

    #[test]
    fn test_unavailable_hides_backend_detail() {
        let app = AppError::from(RegistrationError::Unavailable(
            "connection refused to 10.0.0.5".into(),
        ));
        assert_eq!(app.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert!(!app.to_string().contains("10.0.0.5"));
        assert!(std::error::Error::source(&app).is_some());
    }

    #[test]
    fn test_validation() {
        let app = AppError::from(ResourceValidationError::EmptyTitle);
        assert_eq!(app.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(app.code(), "VALIDATION_ERROR");
    }
}
