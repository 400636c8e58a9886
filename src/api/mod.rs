use axum::{
    Router,
    http::HeaderValue,
    middleware,
    routing::{get, post, put},
};
use sha2::{Digest, Sha512};
use std::sync::Arc;
use tower_http::cors::{AllowHeaders, AllowMethods, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tower_sessions::cookie::{Key, SameSite};
use tower_sessions::{Expiry, SessionManagerLayer};
use tower_sessions_sqlx_store::SqliteStore;

use metrics_exporter_prometheus::PrometheusHandle;

use crate::config::Config;
use crate::db::Store;
use crate::services::{AuthService, Mailer, NewsletterDispatcher, Outbox, SubscriberService};
use crate::state::SharedState;

pub mod auth;
mod contact;
mod content;
mod error;
mod observability;
mod settings;
mod subscribers;
mod system;
mod types;
mod users;
mod validation;

pub use error::ApiError;
pub use types::*;

const SESSION_COOKIE_NAME: &str = "collegecms.sid";

#[derive(Clone)]
pub struct AppState {
    pub shared: Arc<SharedState>,

    pub session_store: SqliteStore,

    pub start_time: std::time::Instant,

    pub prometheus_handle: Option<PrometheusHandle>,
}

impl AppState {
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.shared.config
    }

    #[must_use]
    pub fn store(&self) -> &Store {
        &self.shared.store
    }

    #[must_use]
    pub fn auth_service(&self) -> &Arc<dyn AuthService> {
        &self.shared.auth_service
    }

    #[must_use]
    pub fn subscriber_service(&self) -> &Arc<dyn SubscriberService> {
        &self.shared.subscriber_service
    }

    #[must_use]
    pub fn newsletter(&self) -> &Arc<NewsletterDispatcher> {
        &self.shared.newsletter
    }

    #[must_use]
    pub fn outbox(&self) -> Option<&Outbox> {
        self.shared.outbox.as_ref()
    }
}

/// Wraps the shared services and prepares the session table, which lives
/// in the application database.
pub async fn create_app_state(
    shared: Arc<SharedState>,
    prometheus_handle: Option<PrometheusHandle>,
) -> anyhow::Result<Arc<AppState>> {
    let pool = shared.store.conn.get_sqlite_connection_pool().clone();
    let session_store = SqliteStore::new(pool);
    session_store
        .migrate()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to prepare session table: {e}"))?;

    Ok(Arc::new(AppState {
        shared,
        session_store,
        start_time: std::time::Instant::now(),
        prometheus_handle,
    }))
}

pub async fn create_app_state_from_config(
    config: Config,
    prometheus_handle: Option<PrometheusHandle>,
) -> anyhow::Result<Arc<AppState>> {
    let shared = Arc::new(SharedState::new(config).await?);
    create_app_state(shared, prometheus_handle).await
}

/// Same as [`create_app_state_from_config`] with an explicit mailer in
/// place of the configured one.
pub async fn create_app_state_with_mailer(
    config: Config,
    mailer: Option<Arc<dyn Mailer>>,
    prometheus_handle: Option<PrometheusHandle>,
) -> anyhow::Result<Arc<AppState>> {
    let shared = Arc::new(SharedState::with_mailer(config, mailer).await?);
    create_app_state(shared, prometheus_handle).await
}

/// Signing key for the session cookie, stretched from the configured secret.
fn session_key(secret: &str) -> Key {
    let digest = Sha512::digest(secret.as_bytes());
    Key::from(digest.as_slice())
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    }

    let origins: Vec<HeaderValue> = origins.iter().filter_map(|s| s.parse().ok()).collect();
    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}

pub fn router(state: Arc<AppState>) -> Router {
    let config = state.config();

    let session_layer = SessionManagerLayer::new(state.session_store.clone())
        .with_name(SESSION_COOKIE_NAME)
        .with_secure(config.server.secure_cookies)
        .with_http_only(true)
        .with_same_site(SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(time::Duration::minutes(
            config.server.session_ttl_minutes,
        )))
        .with_signed(session_key(config.session_secret()));
    let cors = cors_layer(&config.server.cors_allowed_origins);

    let api_router = Router::new()
        .merge(create_public_router())
        .merge(create_authenticated_router(state.clone()))
        .nest("/admin", create_admin_router(state.clone()))
        .layer(session_layer)
        .with_state(state);

    Router::new()
        .nest("/api", api_router)
        .layer(cors)
        .layer(middleware::from_fn(observability::security_headers_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(observability::logging_middleware))
}

fn create_public_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/content", get(content::list_content))
        .route("/content/{section}", get(content::list_content_by_section))
        .route("/courses", get(content::list_courses))
        .route("/courses/{category}", get(content::list_courses_by_category))
        .route("/departments", get(content::list_departments))
        .route("/gallery", get(content::list_gallery))
        .route("/gallery/{category}", get(content::list_gallery_by_category))
        .route("/events", get(content::list_events))
        .route("/events/upcoming", get(content::list_upcoming_events))
        .route("/events/past", get(content::list_past_events))
        .route("/events/{category}", get(content::list_events_by_category))
        .route("/faqs", get(content::list_faqs))
        .route("/faqs/{category}", get(content::list_faqs_by_category))
        .route("/contact", post(contact::submit_message))
        .route("/subscribe", post(subscribers::subscribe))
        .route("/unsubscribe/{token}", get(subscribers::unsubscribe))
        .route("/settings/logo", get(settings::get_logo))
        .route("/health", get(system::health))
}

fn create_authenticated_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/user", get(auth::get_current_user))
        .route_layer(middleware::from_fn_with_state(
            state,
            auth::require_authenticated,
        ))
}

fn create_admin_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/subscribers", get(subscribers::list_subscribers))
        .route("/send-newsletter", post(subscribers::send_newsletter))
        .route("/content", post(content::create_content))
        .route("/content/{id}", put(content::update_content))
        .route("/courses", post(content::create_course))
        .route("/courses/{id}", put(content::update_course))
        .route("/departments", post(content::create_department))
        .route("/departments/{id}", put(content::update_department))
        .route("/gallery", post(content::create_gallery_item))
        .route("/gallery/{id}", put(content::update_gallery_item))
        .route("/events", post(content::create_event))
        .route("/events/{id}", put(content::update_event))
        .route("/faqs", post(content::create_faq))
        .route("/faqs/{id}", put(content::update_faq))
        .route("/users", get(users::list_users).post(users::create_user))
        .route("/users/{id}", put(users::update_user))
        .route("/users/{id}/reset-password", post(users::reset_password))
        .route("/users/{id}/permissions", put(users::set_permissions))
        .route("/messages", get(contact::list_messages))
        .route("/messages/{id}/read", put(contact::mark_message_read))
        .route("/settings/logo", post(settings::set_logo))
        .route("/metrics", get(observability::get_metrics))
        .route_layer(middleware::from_fn_with_state(state, auth::require_admin))
}
