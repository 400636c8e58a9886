use axum::{Json, extract::State};
use serde::Deserialize;
use std::sync::Arc;

use super::validation::{ApiJson, validated};
use super::{ApiError, ApiResponse, AppState, LogoResponse};
use crate::db::repositories::settings::LOGO_URL_KEY;
use crate::models::validation::{Checks, FieldError, Validate};

#[derive(Deserialize)]
pub struct LogoRequest {
    #[serde(alias = "logoUrl")]
    pub logo_url: String,
}

impl Validate for LogoRequest {
    fn validate(&self) -> Vec<FieldError> {
        Checks::new()
            .required("logo_url", &self.logo_url)
            .max_len("logo_url", Some(&self.logo_url), 2048)
            .finish()
    }
}

/// GET /settings/logo
pub async fn get_logo(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<LogoResponse>>, ApiError> {
    let logo_url = state.store().settings_repo().get(LOGO_URL_KEY).await?;
    Ok(Json(ApiResponse::success(LogoResponse { logo_url })))
}

/// POST /admin/settings/logo
pub async fn set_logo(
    State(state): State<Arc<AppState>>,
    ApiJson(payload): ApiJson<LogoRequest>,
) -> Result<Json<ApiResponse<LogoResponse>>, ApiError> {
    let LogoRequest { logo_url } = validated(payload)?;
    let logo_url = logo_url.trim().to_string();

    state
        .store()
        .settings_repo()
        .set(LOGO_URL_KEY, &logo_url)
        .await?;

    Ok(Json(ApiResponse::with_message(
        LogoResponse {
            logo_url: Some(logo_url),
        },
        "Logo updated successfully",
    )))
}
