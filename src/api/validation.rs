use axum::{
    Json,
    extract::{FromRequest, FromRequestParts, Path, Request, rejection::JsonRejection},
    http::request::Parts,
};
use serde::de::DeserializeOwned;

use super::ApiError;
use crate::models::validation::Validate;

/// JSON body extractor that reports malformed payloads through [`ApiError`].
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(json_rejection(&rejection)),
        }
    }
}

fn json_rejection(rejection: &JsonRejection) -> ApiError {
    ApiError::validation(format!("Invalid request body: {}", rejection.body_text()))
}

/// Path parameter extractor; a segment that fails to parse becomes a
/// JSON validation error instead of axum's plain-text rejection.
pub struct ApiPath<T>(pub T);

impl<S, T> FromRequestParts<S> for ApiPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Path::<T>::from_request_parts(parts, state).await {
            Ok(Path(value)) => Ok(Self(value)),
            Err(rejection) => Err(ApiError::validation(format!(
                "Invalid path parameter: {}",
                rejection.body_text()
            ))),
        }
    }
}

/// Runs the payload's field checks, collecting every failure.
pub fn validated<T: Validate>(payload: T) -> Result<T, ApiError> {
    let errors = payload.validate();
    if errors.is_empty() {
        Ok(payload)
    } else {
        Err(ApiError::ValidationError {
            message: "Validation failed".to_string(),
            errors,
        })
    }
}

pub fn validate_id(id: i32) -> Result<i32, ApiError> {
    if id <= 0 {
        return Err(ApiError::validation(format!(
            "Invalid ID: {id}. ID must be a positive integer"
        )));
    }
    Ok(id)
}
