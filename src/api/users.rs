//! Admin user management endpoints.

use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
};
use serde::Deserialize;
use std::collections::BTreeSet;
use std::sync::Arc;

use super::validation::{ApiJson, ApiPath, validate_id};
use super::{ApiError, ApiResponse, AppState};
use crate::models::user::{NewUser, Permission, User, UserUpdate};

#[derive(Deserialize)]
pub struct ResetPasswordRequest {
    #[serde(alias = "newPassword")]
    pub password: String,
}

#[derive(Deserialize)]
pub struct PermissionsRequest {
    pub permissions: BTreeSet<Permission>,
}

/// GET /admin/users
pub async fn list_users(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<User>>>, ApiError> {
    let users = state.auth_service().list_users().await?;
    Ok(Json(ApiResponse::success(users)))
}

/// POST /admin/users
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    Extension(admin): Extension<User>,
    ApiJson(payload): ApiJson<NewUser>,
) -> Result<(StatusCode, Json<ApiResponse<User>>), ApiError> {
    let user = state.auth_service().create_user(payload).await?;
    tracing::info!(admin_id = admin.id, user_id = user.id, "Admin created user");
    Ok((StatusCode::CREATED, Json(ApiResponse::success(user))))
}

/// PUT /admin/users/{id}
pub async fn update_user(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<i32>,
    ApiJson(payload): ApiJson<UserUpdate>,
) -> Result<Json<ApiResponse<User>>, ApiError> {
    let id = validate_id(id)?;
    let user = state.auth_service().update_user(id, payload).await?;
    Ok(Json(ApiResponse::success(user)))
}

/// POST /admin/users/{id}/reset-password
pub async fn reset_password(
    State(state): State<Arc<AppState>>,
    Extension(admin): Extension<User>,
    ApiPath(id): ApiPath<i32>,
    ApiJson(payload): ApiJson<ResetPasswordRequest>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let id = validate_id(id)?;
    state
        .auth_service()
        .reset_password(id, &payload.password)
        .await?;

    tracing::info!(admin_id = admin.id, user_id = id, "Admin reset password");
    Ok(Json(ApiResponse::message("Password reset successfully")))
}

/// PUT /admin/users/{id}/permissions
pub async fn set_permissions(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<i32>,
    ApiJson(payload): ApiJson<PermissionsRequest>,
) -> Result<Json<ApiResponse<User>>, ApiError> {
    let id = validate_id(id)?;
    let user = state
        .auth_service()
        .set_permissions(id, payload.permissions)
        .await?;
    Ok(Json(ApiResponse::success(user)))
}
