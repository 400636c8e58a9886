use axum::{
    Json,
    extract::State,
    http::StatusCode,
};
use std::sync::Arc;

use super::validation::{ApiJson, ApiPath, validate_id, validated};
use super::{ApiError, ApiResponse, AppState};
use crate::entities::contact_messages;
use crate::models::content::NewContactMessage;

/// POST /contact
pub async fn submit_message(
    State(state): State<Arc<AppState>>,
    ApiJson(payload): ApiJson<NewContactMessage>,
) -> Result<(StatusCode, Json<ApiResponse<contact_messages::Model>>), ApiError> {
    let input = validated(payload)?;
    let message = state.store().contact_repo().create(input).await?;

    tracing::info!(message_id = message.id, category = %message.category, "Contact message received");
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message(message, "Message sent successfully")),
    ))
}

/// GET /admin/messages
pub async fn list_messages(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<contact_messages::Model>>>, ApiError> {
    let messages = state.store().contact_repo().list().await?;
    Ok(Json(ApiResponse::success(messages)))
}

/// PUT /admin/messages/{id}/read
pub async fn mark_message_read(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<i32>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let id = validate_id(id)?;
    if !state.store().contact_repo().mark_read(id).await? {
        return Err(ApiError::not_found("Message", id));
    }
    Ok(Json(ApiResponse::message("Message marked as read")))
}
