//! Public listings and admin writes for the site content kinds.
//!
//! Lists are public. Create and update sit behind the admin gate and
//! validate the payload before it reaches the repository.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
};
use std::sync::Arc;

use super::validation::{ApiJson, ApiPath, validate_id, validated};
use super::{ApiError, ApiResponse, AppState};
use crate::entities::{content_blocks, courses, departments, events, faqs, gallery_items};
use crate::models::content::{
    ContentBlockPatch, CoursePatch, DepartmentPatch, EventPatch, FaqPatch, GalleryItemPatch,
    NewContentBlock, NewCourse, NewDepartment, NewEvent, NewFaq, NewGalleryItem,
};

type ListResponse<T> = Result<Json<ApiResponse<Vec<T>>>, ApiError>;
type CreatedResponse<T> = Result<(StatusCode, Json<ApiResponse<T>>), ApiError>;
type ItemResponse<T> = Result<Json<ApiResponse<T>>, ApiError>;

fn listed<T>(items: Vec<T>) -> ListResponse<T> {
    Ok(Json(ApiResponse::success(items)))
}

fn created<T>(item: T) -> CreatedResponse<T> {
    Ok((StatusCode::CREATED, Json(ApiResponse::success(item))))
}

fn updated<T>(item: Option<T>, kind: &str, id: i32) -> ItemResponse<T> {
    item.map(|item| Json(ApiResponse::success(item)))
        .ok_or_else(|| ApiError::not_found(kind, id))
}

// ========== Content blocks ==========

pub async fn list_content(State(state): State<Arc<AppState>>) -> ListResponse<content_blocks::Model> {
    listed(state.store().content_repo().list_content().await?)
}

pub async fn list_content_by_section(
    State(state): State<Arc<AppState>>,
    ApiPath(section): ApiPath<String>,
) -> ListResponse<content_blocks::Model> {
    listed(
        state
            .store()
            .content_repo()
            .list_content_by_section(&section)
            .await?,
    )
}

pub async fn create_content(
    State(state): State<Arc<AppState>>,
    ApiJson(payload): ApiJson<NewContentBlock>,
) -> CreatedResponse<content_blocks::Model> {
    let input = validated(payload)?;
    created(state.store().content_repo().create_content(input).await?)
}

pub async fn update_content(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<i32>,
    ApiJson(payload): ApiJson<ContentBlockPatch>,
) -> ItemResponse<content_blocks::Model> {
    let id = validate_id(id)?;
    let patch = validated(payload)?;
    let row = state.store().content_repo().update_content(id, patch).await?;
    updated(row, "Content", id)
}

// ========== Courses ==========

pub async fn list_courses(State(state): State<Arc<AppState>>) -> ListResponse<courses::Model> {
    listed(state.store().content_repo().list_courses().await?)
}

pub async fn list_courses_by_category(
    State(state): State<Arc<AppState>>,
    ApiPath(category): ApiPath<String>,
) -> ListResponse<courses::Model> {
    listed(
        state
            .store()
            .content_repo()
            .list_courses_by_category(&category)
            .await?,
    )
}

pub async fn create_course(
    State(state): State<Arc<AppState>>,
    ApiJson(payload): ApiJson<NewCourse>,
) -> CreatedResponse<courses::Model> {
    let input = validated(payload)?;
    created(state.store().content_repo().create_course(input).await?)
}

pub async fn update_course(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<i32>,
    ApiJson(payload): ApiJson<CoursePatch>,
) -> ItemResponse<courses::Model> {
    let id = validate_id(id)?;
    let patch = validated(payload)?;
    let row = state.store().content_repo().update_course(id, patch).await?;
    updated(row, "Course", id)
}

// ========== Departments ==========

pub async fn list_departments(
    State(state): State<Arc<AppState>>,
) -> ListResponse<departments::Model> {
    listed(state.store().content_repo().list_departments().await?)
}

pub async fn create_department(
    State(state): State<Arc<AppState>>,
    ApiJson(payload): ApiJson<NewDepartment>,
) -> CreatedResponse<departments::Model> {
    let input = validated(payload)?;
    created(state.store().content_repo().create_department(input).await?)
}

pub async fn update_department(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<i32>,
    ApiJson(payload): ApiJson<DepartmentPatch>,
) -> ItemResponse<departments::Model> {
    let id = validate_id(id)?;
    let patch = validated(payload)?;
    let row = state
        .store()
        .content_repo()
        .update_department(id, patch)
        .await?;
    updated(row, "Department", id)
}

// ========== Gallery ==========

pub async fn list_gallery(State(state): State<Arc<AppState>>) -> ListResponse<gallery_items::Model> {
    listed(state.store().content_repo().list_gallery().await?)
}

pub async fn list_gallery_by_category(
    State(state): State<Arc<AppState>>,
    ApiPath(category): ApiPath<String>,
) -> ListResponse<gallery_items::Model> {
    listed(
        state
            .store()
            .content_repo()
            .list_gallery_by_category(&category)
            .await?,
    )
}

pub async fn create_gallery_item(
    State(state): State<Arc<AppState>>,
    ApiJson(payload): ApiJson<NewGalleryItem>,
) -> CreatedResponse<gallery_items::Model> {
    let input = validated(payload)?;
    created(state.store().content_repo().create_gallery_item(input).await?)
}

pub async fn update_gallery_item(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<i32>,
    ApiJson(payload): ApiJson<GalleryItemPatch>,
) -> ItemResponse<gallery_items::Model> {
    let id = validate_id(id)?;
    let patch = validated(payload)?;
    let row = state
        .store()
        .content_repo()
        .update_gallery_item(id, patch)
        .await?;
    updated(row, "Gallery item", id)
}

// ========== Events ==========

pub async fn list_events(State(state): State<Arc<AppState>>) -> ListResponse<events::Model> {
    listed(state.store().content_repo().list_events().await?)
}

pub async fn list_events_by_category(
    State(state): State<Arc<AppState>>,
    ApiPath(category): ApiPath<String>,
) -> ListResponse<events::Model> {
    listed(
        state
            .store()
            .content_repo()
            .list_events_by_category(&category)
            .await?,
    )
}

pub async fn list_upcoming_events(
    State(state): State<Arc<AppState>>,
) -> ListResponse<events::Model> {
    listed(state.store().content_repo().list_upcoming_events().await?)
}

pub async fn list_past_events(State(state): State<Arc<AppState>>) -> ListResponse<events::Model> {
    listed(state.store().content_repo().list_past_events().await?)
}

pub async fn create_event(
    State(state): State<Arc<AppState>>,
    ApiJson(payload): ApiJson<NewEvent>,
) -> CreatedResponse<events::Model> {
    let input = validated(payload)?;
    created(state.store().content_repo().create_event(input).await?)
}

pub async fn update_event(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<i32>,
    ApiJson(payload): ApiJson<EventPatch>,
) -> ItemResponse<events::Model> {
    let id = validate_id(id)?;
    let patch = validated(payload)?;
    let row = state.store().content_repo().update_event(id, patch).await?;
    updated(row, "Event", id)
}

// ========== FAQs ==========

pub async fn list_faqs(State(state): State<Arc<AppState>>) -> ListResponse<faqs::Model> {
    listed(state.store().content_repo().list_faqs().await?)
}

pub async fn list_faqs_by_category(
    State(state): State<Arc<AppState>>,
    ApiPath(category): ApiPath<String>,
) -> ListResponse<faqs::Model> {
    listed(
        state
            .store()
            .content_repo()
            .list_faqs_by_category(&category)
            .await?,
    )
}

pub async fn create_faq(
    State(state): State<Arc<AppState>>,
    ApiJson(payload): ApiJson<NewFaq>,
) -> CreatedResponse<faqs::Model> {
    let input = validated(payload)?;
    created(state.store().content_repo().create_faq(input).await?)
}

pub async fn update_faq(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<i32>,
    ApiJson(payload): ApiJson<FaqPatch>,
) -> ItemResponse<faqs::Model> {
    let id = validate_id(id)?;
    let patch = validated(payload)?;
    let row = state.store().content_repo().update_faq(id, patch).await?;
    updated(row, "FAQ", id)
}
