use axum::{
    Extension, Json,
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use serde::Deserialize;
use std::sync::Arc;
use tower_sessions::Session;

use super::validation::ApiJson;
use super::{ApiError, ApiResponse, AppState};
use crate::models::user::User;

/// Session key holding the authenticated user's id.
pub const SESSION_USER_KEY: &str = "user_id";

#[derive(Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

// ============================================================================
// Middleware
// ============================================================================

/// Rehydrates the session user from the store. A session pointing at a
/// missing account counts as anonymous.
async fn session_user(state: &AppState, session: &Session) -> Result<Option<User>, ApiError> {
    let Some(user_id) = session.get::<i32>(SESSION_USER_KEY).await? else {
        return Ok(None);
    };

    Ok(state.auth_service().current_user(user_id).await?)
}

/// Rejects anonymous requests with 401 and exposes the [`User`] to handlers
/// as a request extension.
pub async fn require_authenticated(
    State(state): State<Arc<AppState>>,
    session: Session,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let user = session_user(&state, &session)
        .await?
        .ok_or_else(ApiError::unauthenticated)?;

    tracing::Span::current().record("user_id", user.id);
    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

/// 401 for anonymous requests, 403 for authenticated non-admins. The role is
/// read fresh on every request.
pub async fn require_admin(
    State(state): State<Arc<AppState>>,
    session: Session,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let user = session_user(&state, &session)
        .await?
        .ok_or_else(ApiError::unauthenticated)?;

    tracing::Span::current().record("user_id", user.id);

    if !user.is_admin() {
        tracing::info!(user_id = user.id, path = %request.uri().path(), "Admin route denied");
        return Err(ApiError::forbidden());
    }

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

// ============================================================================
// Handlers
// ============================================================================

async fn start_session(session: &Session, user: &User) -> Result<(), ApiError> {
    session.cycle_id().await?;
    session.insert(SESSION_USER_KEY, user.id).await?;
    Ok(())
}

fn require_credentials(payload: &Credentials) -> Result<(), ApiError> {
    if payload.username.trim().is_empty() {
        return Err(ApiError::validation("Username is required"));
    }
    if payload.password.is_empty() {
        return Err(ApiError::validation("Password is required"));
    }
    Ok(())
}

/// POST /register
pub async fn register(
    State(state): State<Arc<AppState>>,
    session: Session,
    ApiJson(payload): ApiJson<Credentials>,
) -> Result<(StatusCode, Json<ApiResponse<User>>), ApiError> {
    require_credentials(&payload)?;

    let user = state
        .auth_service()
        .register(&payload.username, &payload.password)
        .await?;
    start_session(&session, &user).await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::success(user))))
}

/// POST /login
pub async fn login(
    State(state): State<Arc<AppState>>,
    session: Session,
    ApiJson(payload): ApiJson<Credentials>,
) -> Result<Json<ApiResponse<User>>, ApiError> {
    require_credentials(&payload)?;

    let user = state
        .auth_service()
        .login(&payload.username, &payload.password)
        .await?;
    start_session(&session, &user).await?;

    Ok(Json(ApiResponse::success(user)))
}

/// POST /logout
pub async fn logout(session: Session) -> Result<Json<ApiResponse<()>>, ApiError> {
    session.flush().await?;
    Ok(Json(ApiResponse::message("Logged out")))
}

/// GET /user
pub async fn get_current_user(Extension(user): Extension<User>) -> Json<ApiResponse<User>> {
    Json(ApiResponse::success(user))
}
