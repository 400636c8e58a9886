use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::fmt;

use super::ApiResponse;
use crate::models::validation::FieldError;
use crate::services::{AuthError, NewsletterError, SubscriberError};

#[derive(Debug)]
pub enum ApiError {
    ValidationError {
        message: String,
        errors: Vec<FieldError>,
    },

    Conflict(String),

    Unauthenticated(String),

    Forbidden(String),

    NotFound(String),

    DependencyUnavailable(String),

    DatabaseError(String),

    InternalError(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ValidationError { message, .. } => write!(f, "Validation error: {message}"),
            Self::Conflict(msg) => write!(f, "Conflict: {msg}"),
            Self::Unauthenticated(msg) => write!(f, "Unauthenticated: {msg}"),
            Self::Forbidden(msg) => write!(f, "Forbidden: {msg}"),
            Self::NotFound(msg) => write!(f, "Not found: {msg}"),
            Self::DependencyUnavailable(msg) => write!(f, "Dependency unavailable: {msg}"),
            Self::DatabaseError(msg) => write!(f, "Database error: {msg}"),
            Self::InternalError(msg) => write!(f, "Internal error: {msg}"),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            Self::ValidationError { message, errors } => (
                StatusCode::BAD_REQUEST,
                ApiResponse::invalid(message, errors),
            ),
            Self::Conflict(msg) => (StatusCode::BAD_REQUEST, ApiResponse::error(msg)),
            Self::Unauthenticated(msg) => (StatusCode::UNAUTHORIZED, ApiResponse::error(msg)),
            Self::Forbidden(msg) => (StatusCode::FORBIDDEN, ApiResponse::error(msg)),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, ApiResponse::error(msg)),
            Self::DependencyUnavailable(msg) => {
                tracing::warn!("Dependency unavailable: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, ApiResponse::error(msg))
            }
            Self::DatabaseError(msg) => {
                tracing::error!("Database error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiResponse::error("A database error occurred"),
                )
            }
            Self::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiResponse::error("An internal error occurred"),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        Self::InternalError(format!("{err:#}"))
    }
}

impl From<tower_sessions::session::Error> for ApiError {
    fn from(err: tower_sessions::session::Error) -> Self {
        Self::InternalError(format!("Session error: {err}"))
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => Self::Unauthenticated(err.to_string()),
            AuthError::UserNotFound => Self::NotFound(err.to_string()),
            AuthError::UsernameTaken => Self::Conflict(err.to_string()),
            AuthError::Validation(msg) => Self::validation(msg),
            AuthError::Database(msg) => Self::DatabaseError(msg),
            AuthError::Internal(msg) => Self::InternalError(msg),
        }
    }
}

impl From<SubscriberError> for ApiError {
    fn from(err: SubscriberError) -> Self {
        match err {
            SubscriberError::InvalidEmail => Self::ValidationError {
                message: err.to_string(),
                errors: vec![FieldError::new("email", "must be a valid email address")],
            },
            SubscriberError::AlreadySubscribed | SubscriberError::AlreadyUnsubscribed => {
                Self::Conflict(err.to_string())
            }
            SubscriberError::NotFound => Self::NotFound(err.to_string()),
            SubscriberError::Internal(msg) => Self::InternalError(msg),
        }
    }
}

impl From<NewsletterError> for ApiError {
    fn from(err: NewsletterError) -> Self {
        match err {
            NewsletterError::BadRequest(msg) => Self::validation(msg),
            NewsletterError::DependencyUnavailable => Self::DependencyUnavailable(err.to_string()),
            NewsletterError::Internal(msg) => Self::InternalError(msg),
        }
    }
}

impl ApiError {
    pub fn not_found(resource: &str, id: impl fmt::Display) -> Self {
        Self::NotFound(format!("{resource} {id} not found"))
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::ValidationError {
            message: msg.into(),
            errors: Vec::new(),
        }
    }

    pub fn unauthenticated() -> Self {
        Self::Unauthenticated("Not authenticated".to_string())
    }

    pub fn forbidden() -> Self {
        Self::Forbidden("Admin access required".to_string())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::InternalError(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (ApiError::validation("bad"), StatusCode::BAD_REQUEST),
            (
                ApiError::from(SubscriberError::AlreadySubscribed),
                StatusCode::BAD_REQUEST,
            ),
            (
                ApiError::from(AuthError::InvalidCredentials),
                StatusCode::UNAUTHORIZED,
            ),
            (ApiError::forbidden(), StatusCode::FORBIDDEN),
            (
                ApiError::from(SubscriberError::NotFound),
                StatusCode::NOT_FOUND,
            ),
            (
                ApiError::from(NewsletterError::DependencyUnavailable),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (error, status) in cases {
            assert_eq!(error.into_response().status(), status);
        }
    }
}
