use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
};
use std::sync::Arc;

use super::validation::{ApiJson, ApiPath, validated};
use super::{ApiError, ApiResponse, AppState, SubscribeResponse};
use crate::models::subscriber::{SubscribeRequest, Subscriber};
use crate::models::user::User;
use crate::services::{DispatchReport, EmailKind, NewsletterRequest, SubscribeOutcome};

/// POST /subscribe
pub async fn subscribe(
    State(state): State<Arc<AppState>>,
    ApiJson(payload): ApiJson<SubscribeRequest>,
) -> Result<(StatusCode, Json<ApiResponse<SubscribeResponse>>), ApiError> {
    let SubscribeRequest { email, profile } = validated(payload)?;
    let name = profile.first_name.clone();

    let (subscriber, outcome) = state
        .subscriber_service()
        .subscribe(&email, profile)
        .await?;

    if let Some(outbox) = state.outbox() {
        outbox.enqueue(&EmailKind::Welcome { name }, &subscriber.email);
    }

    let (status, message) = match outcome {
        SubscribeOutcome::Created => (StatusCode::CREATED, "Subscribed successfully"),
        SubscribeOutcome::Reactivated => (StatusCode::OK, "Subscription reactivated successfully"),
    };

    Ok((
        status,
        Json(ApiResponse::with_message(
            SubscribeResponse {
                id: subscriber.id,
                outcome,
            },
            message,
        )),
    ))
}

/// GET /unsubscribe/{token}
pub async fn unsubscribe(
    State(state): State<Arc<AppState>>,
    ApiPath(token): ApiPath<String>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let subscriber = state.subscriber_service().unsubscribe(&token).await?;

    if let Some(outbox) = state.outbox() {
        outbox.enqueue(&EmailKind::UnsubscribeConfirmation, &subscriber.email);
    }

    Ok(Json(ApiResponse::message("Successfully unsubscribed")))
}

/// GET /admin/subscribers
pub async fn list_subscribers(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<Subscriber>>>, ApiError> {
    let subscribers = state.subscriber_service().list_all().await?;
    Ok(Json(ApiResponse::success(subscribers)))
}

/// POST /admin/send-newsletter
pub async fn send_newsletter(
    State(state): State<Arc<AppState>>,
    Extension(admin): Extension<User>,
    ApiJson(payload): ApiJson<NewsletterRequest>,
) -> Result<Json<ApiResponse<DispatchReport>>, ApiError> {
    tracing::info!(admin_id = admin.id, subject = %payload.subject, "Newsletter requested");

    let report = state.newsletter().send(&payload).await?;
    let message = format!("Newsletter sent to {} subscribers", report.sent);

    Ok(Json(ApiResponse::with_message(report, message)))
}
