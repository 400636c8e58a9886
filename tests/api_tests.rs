use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use collegecms::api::AppState;
use collegecms::config::{Config, RunMode};
use collegecms::models::user::{Role, UserUpdate};
use collegecms::services::{MailError, Mailer, OutboundEmail};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tower::ServiceExt;

#[derive(Default)]
struct RecordingMailer {
    sent: Mutex<Vec<OutboundEmail>>,
}

#[async_trait::async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, email: &OutboundEmail) -> Result<(), MailError> {
        self.sent.lock().unwrap().push(email.clone());
        Ok(())
    }
}

impl RecordingMailer {
    fn recipients(&self) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|e| e.to.clone())
            .collect()
    }
}

async fn spawn_app(
    mode: RunMode,
    mailer: Option<Arc<RecordingMailer>>,
) -> (Arc<AppState>, Router) {
    let mut config = Config::default();
    config.general.database_path = "sqlite::memory:".to_string();
    config.security.mode = mode;
    config.security.argon2_memory_cost_kib = 1024;
    config.security.argon2_time_cost = 1;
    config.server.secure_cookies = false;
    config.email.retry_base_delay_ms = 1;

    let mailer = mailer.map(|m| m as Arc<dyn Mailer>);
    let state = collegecms::api::create_app_state_with_mailer(config, mailer, None)
        .await
        .expect("Failed to create app state");
    let router = collegecms::api::router(state.clone());
    (state, router)
}

struct Reply {
    status: StatusCode,
    cookie: Option<String>,
    body: Value,
}

async fn call(
    app: &Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
    cookie: Option<&str>,
) -> Reply {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(ToString::to_string);

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };

    Reply {
        status,
        cookie,
        body,
    }
}

async fn login(app: &Router, username: &str, password: &str) -> Reply {
    call(
        app,
        "POST",
        "/api/login",
        Some(json!({ "username": username, "password": password })),
        None,
    )
    .await
}

async fn admin_cookie(app: &Router) -> String {
    let reply = login(app, "admin", "admin123").await;
    assert_eq!(reply.status, StatusCode::OK);
    reply.cookie.expect("login should set a session cookie")
}

/// The outbox delivers on a background task.
async fn wait_for_mail(mailer: &RecordingMailer, count: usize) {
    for _ in 0..100 {
        if mailer.sent.lock().unwrap().len() >= count {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("expected {count} emails, got {:?}", mailer.recipients());
}

#[tokio::test]
async fn test_bootstrap_admin_in_development() {
    let (_, app) = spawn_app(RunMode::Development, None).await;

    let reply = login(&app, "admin", "admin123").await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["data"]["id"], -1);
    assert_eq!(reply.body["data"]["role"], "admin");
    let cookie = reply.cookie.unwrap();

    let me = call(&app, "GET", "/api/user", None, Some(&cookie)).await;
    assert_eq!(me.status, StatusCode::OK);
    assert_eq!(me.body["data"]["username"], "admin");

    let subscribers = call(&app, "GET", "/api/admin/subscribers", None, Some(&cookie)).await;
    assert_eq!(subscribers.status, StatusCode::OK);

    let logout = call(&app, "POST", "/api/logout", None, Some(&cookie)).await;
    assert_eq!(logout.status, StatusCode::OK);
    let after = call(&app, "GET", "/api/user", None, Some(&cookie)).await;
    assert_eq!(after.status, StatusCode::UNAUTHORIZED);

    let again = call(&app, "POST", "/api/logout", None, Some(&cookie)).await;
    assert_eq!(again.status, StatusCode::OK);
    let without_session = call(&app, "POST", "/api/logout", None, None).await;
    assert_eq!(without_session.status, StatusCode::OK);
    assert_eq!(without_session.body["success"], true);
}

#[tokio::test]
async fn test_bootstrap_admin_rejected_in_production() {
    let (_, app) = spawn_app(RunMode::Production, None).await;

    let reply = login(&app, "admin", "admin123").await;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
    assert_eq!(reply.body["success"], false);
    assert!(reply.cookie.is_none());
}

#[tokio::test]
async fn test_admin_gate_follows_role_changes() {
    let (state, app) = spawn_app(RunMode::Production, None).await;

    let anonymous = call(&app, "GET", "/api/admin/users", None, None).await;
    assert_eq!(anonymous.status, StatusCode::UNAUTHORIZED);

    let registered = call(
        &app,
        "POST",
        "/api/register",
        Some(json!({ "username": "editor", "password": "long-enough" })),
        None,
    )
    .await;
    assert_eq!(registered.status, StatusCode::CREATED);
    assert_eq!(registered.body["data"]["role"], "user");
    let cookie = registered.cookie.unwrap();
    let user_id = i32::try_from(registered.body["data"]["id"].as_i64().unwrap()).unwrap();

    let denied = call(&app, "GET", "/api/admin/users", None, Some(&cookie)).await;
    assert_eq!(denied.status, StatusCode::FORBIDDEN);

    state
        .auth_service()
        .update_user(
            user_id,
            UserUpdate {
                username: None,
                role: Some(Role::Admin),
            },
        )
        .await
        .unwrap();

    let allowed = call(&app, "GET", "/api/admin/users", None, Some(&cookie)).await;
    assert_eq!(allowed.status, StatusCode::OK);
    assert_eq!(allowed.body["data"][0]["username"], "editor");
}

#[tokio::test]
async fn test_user_administration() {
    let (_, app) = spawn_app(RunMode::Development, None).await;
    let cookie = admin_cookie(&app).await;

    let created = call(
        &app,
        "POST",
        "/api/admin/users",
        Some(json!({
            "username": "gallery-editor",
            "password": "first-password",
            "permissions": ["gallery"]
        })),
        Some(&cookie),
    )
    .await;
    assert_eq!(created.status, StatusCode::CREATED);
    let id = created.body["data"]["id"].as_i64().unwrap();

    let duplicate = call(
        &app,
        "POST",
        "/api/admin/users",
        Some(json!({ "username": "gallery-editor", "password": "other-password" })),
        Some(&cookie),
    )
    .await;
    assert_eq!(duplicate.status, StatusCode::BAD_REQUEST);

    let permissions = call(
        &app,
        "PUT",
        &format!("/api/admin/users/{id}/permissions"),
        Some(json!({ "permissions": ["gallery", "events"] })),
        Some(&cookie),
    )
    .await;
    assert_eq!(permissions.status, StatusCode::OK);
    assert_eq!(permissions.body["data"]["permissions"], json!(["gallery", "events"]));

    let reset = call(
        &app,
        "POST",
        &format!("/api/admin/users/{id}/reset-password"),
        Some(json!({ "password": "second-password" })),
        Some(&cookie),
    )
    .await;
    assert_eq!(reset.status, StatusCode::OK);
    assert_eq!(login(&app, "gallery-editor", "second-password").await.status, StatusCode::OK);
    assert_eq!(
        login(&app, "gallery-editor", "first-password").await.status,
        StatusCode::UNAUTHORIZED
    );

    let missing = call(
        &app,
        "PUT",
        "/api/admin/users/999",
        Some(json!({ "role": "admin" })),
        Some(&cookie),
    )
    .await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_subscribe_unsubscribe_cycle() {
    let mailer = Arc::new(RecordingMailer::default());
    let (state, app) = spawn_app(RunMode::Production, Some(mailer.clone())).await;

    let subscribe = json!({ "email": " Reader@College.Example ", "first_name": "Ira" });

    let first = call(&app, "POST", "/api/subscribe", Some(subscribe.clone()), None).await;
    assert_eq!(first.status, StatusCode::CREATED);
    assert_eq!(first.body["message"], "Subscribed successfully");
    let id = first.body["data"]["id"].clone();
    wait_for_mail(&mailer, 1).await;

    let again = call(&app, "POST", "/api/subscribe", Some(subscribe.clone()), None).await;
    assert_eq!(again.status, StatusCode::BAD_REQUEST);

    let token = state
        .store()
        .subscriber_repo()
        .get_by_email("reader@college.example")
        .await
        .unwrap()
        .unwrap()
        .unsubscribe_token
        .unwrap();

    let unsubscribed = call(&app, "GET", &format!("/api/unsubscribe/{token}"), None, None).await;
    assert_eq!(unsubscribed.status, StatusCode::OK);
    wait_for_mail(&mailer, 2).await;

    let twice = call(&app, "GET", &format!("/api/unsubscribe/{token}"), None, None).await;
    assert_eq!(twice.status, StatusCode::BAD_REQUEST);
    assert_eq!(twice.body["message"], "Already unsubscribed");

    let unknown = call(&app, "GET", "/api/unsubscribe/not-a-token", None, None).await;
    assert_eq!(unknown.status, StatusCode::NOT_FOUND);

    let back = call(&app, "POST", "/api/subscribe", Some(subscribe), None).await;
    assert_eq!(back.status, StatusCode::OK);
    assert_eq!(back.body["data"]["outcome"], "reactivated");
    assert_eq!(back.body["data"]["id"], id);

    let invalid = call(
        &app,
        "POST",
        "/api/subscribe",
        Some(json!({ "email": "nope" })),
        None,
    )
    .await;
    assert_eq!(invalid.status, StatusCode::BAD_REQUEST);
    assert_eq!(invalid.body["errors"][0]["field"], "email");
}

#[tokio::test]
async fn test_newsletter_dispatch() {
    let mailer = Arc::new(RecordingMailer::default());
    let (_, app) = spawn_app(RunMode::Development, Some(mailer.clone())).await;
    let cookie = admin_cookie(&app).await;

    let empty = call(
        &app,
        "POST",
        "/api/admin/send-newsletter",
        Some(json!({ "subject": "Open Day", "content": "<p>Welcome</p>" })),
        Some(&cookie),
    )
    .await;
    assert_eq!(empty.status, StatusCode::BAD_REQUEST);

    for email in ["one@college.example", "two@college.example"] {
        let reply = call(
            &app,
            "POST",
            "/api/subscribe",
            Some(json!({ "email": email })),
            None,
        )
        .await;
        assert_eq!(reply.status, StatusCode::CREATED);
    }
    wait_for_mail(&mailer, 2).await;

    let sent = call(
        &app,
        "POST",
        "/api/admin/send-newsletter",
        Some(json!({ "subject": "Open Day", "content": "<p>Welcome</p>" })),
        Some(&cookie),
    )
    .await;
    assert_eq!(sent.status, StatusCode::OK);
    assert_eq!(sent.body["data"]["total"], 2);
    assert_eq!(sent.body["data"]["sent"], 2);
    assert_eq!(sent.body["data"]["failed"], 0);
    assert_eq!(sent.body["message"], "Newsletter sent to 2 subscribers");

    let newsletters = mailer
        .sent
        .lock()
        .unwrap()
        .iter()
        .filter(|e| e.subject == "Open Day")
        .count();
    assert_eq!(newsletters, 2);
}

#[tokio::test]
async fn test_newsletter_requires_mailer() {
    let (_, app) = spawn_app(RunMode::Development, None).await;
    let cookie = admin_cookie(&app).await;

    let reply = call(
        &app,
        "POST",
        "/api/admin/send-newsletter",
        Some(json!({ "subject": "Open Day", "content": "<p>Welcome</p>" })),
        Some(&cookie),
    )
    .await;
    assert_eq!(reply.status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_content_crud() {
    let (_, app) = spawn_app(RunMode::Development, None).await;
    let cookie = admin_cookie(&app).await;

    let course = json!({
        "title": "Bachelor of Fine Arts",
        "category": "undergraduate",
        "duration": "4 years",
        "description": "Studio practice and art history."
    });

    let anonymous = call(&app, "POST", "/api/admin/courses", Some(course.clone()), None).await;
    assert_eq!(anonymous.status, StatusCode::UNAUTHORIZED);

    let created = call(&app, "POST", "/api/admin/courses", Some(course), Some(&cookie)).await;
    assert_eq!(created.status, StatusCode::CREATED);
    let id = created.body["data"]["id"].as_i64().unwrap();

    let updated = call(
        &app,
        "PUT",
        &format!("/api/admin/courses/{id}"),
        Some(json!({ "is_featured": true })),
        Some(&cookie),
    )
    .await;
    assert_eq!(updated.status, StatusCode::OK);
    assert_eq!(updated.body["data"]["is_featured"], true);
    assert_eq!(updated.body["data"]["title"], "Bachelor of Fine Arts");

    let listed = call(&app, "GET", "/api/courses/undergraduate", None, None).await;
    assert_eq!(listed.status, StatusCode::OK);
    assert_eq!(listed.body["data"].as_array().unwrap().len(), 1);

    let missing = call(
        &app,
        "PUT",
        "/api/admin/courses/999",
        Some(json!({ "title": "Ghost" })),
        Some(&cookie),
    )
    .await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);

    let invalid = call(
        &app,
        "POST",
        "/api/admin/courses",
        Some(json!({ "title": "", "category": "x", "duration": "1 year", "description": "d" })),
        Some(&cookie),
    )
    .await;
    assert_eq!(invalid.status, StatusCode::BAD_REQUEST);
    assert_eq!(invalid.body["errors"][0]["field"], "title");

    let malformed = call(
        &app,
        "POST",
        "/api/admin/faqs",
        Some(json!({ "question": 5 })),
        Some(&cookie),
    )
    .await;
    assert_eq!(malformed.status, StatusCode::BAD_REQUEST);

    let bad_id = call(
        &app,
        "PUT",
        "/api/admin/courses/abc",
        Some(json!({ "title": "Ghost" })),
        Some(&cookie),
    )
    .await;
    assert_eq!(bad_id.status, StatusCode::BAD_REQUEST);
    assert_eq!(bad_id.body["success"], false);
    assert!(
        bad_id.body["message"]
            .as_str()
            .unwrap()
            .starts_with("Invalid path parameter")
    );

    let bad_message_id = call(&app, "PUT", "/api/admin/messages/x/read", None, Some(&cookie)).await;
    assert_eq!(bad_message_id.status, StatusCode::BAD_REQUEST);
    assert!(bad_message_id.body["message"].is_string());
}

#[tokio::test]
async fn test_update_null_clears_optional_field() {
    let (_, app) = spawn_app(RunMode::Development, None).await;
    let cookie = admin_cookie(&app).await;

    let created = call(
        &app,
        "POST",
        "/api/admin/courses",
        Some(json!({
            "title": "Photography",
            "category": "media",
            "duration": "2 years",
            "description": "Darkroom and digital.",
            "image_url": "/images/photography.jpg"
        })),
        Some(&cookie),
    )
    .await;
    assert_eq!(created.status, StatusCode::CREATED);
    let id = created.body["data"]["id"].as_i64().unwrap();
    let uri = format!("/api/admin/courses/{id}");

    let untouched = call(&app, "PUT", &uri, Some(json!({ "title": "Photography I" })), Some(&cookie)).await;
    assert_eq!(untouched.status, StatusCode::OK);
    assert_eq!(untouched.body["data"]["image_url"], "/images/photography.jpg");

    let cleared = call(&app, "PUT", &uri, Some(json!({ "image_url": null })), Some(&cookie)).await;
    assert_eq!(cleared.status, StatusCode::OK);
    assert!(cleared.body["data"]["image_url"].is_null());
    assert_eq!(cleared.body["data"]["title"], "Photography I");
}

#[tokio::test]
async fn test_events_split_by_date() {
    let (_, app) = spawn_app(RunMode::Development, None).await;
    let cookie = admin_cookie(&app).await;

    let now = chrono::Utc::now();
    for (title, date) in [
        ("Graduation Show", now + chrono::Duration::days(10)),
        ("Alumni Talk", now - chrono::Duration::days(10)),
    ] {
        let reply = call(
            &app,
            "POST",
            "/api/admin/events",
            Some(json!({
                "title": title,
                "description": "Campus event",
                "date": date,
                "location": "Main Hall"
            })),
            Some(&cookie),
        )
        .await;
        assert_eq!(reply.status, StatusCode::CREATED);
    }

    let upcoming = call(&app, "GET", "/api/events/upcoming", None, None).await;
    assert_eq!(upcoming.body["data"][0]["title"], "Graduation Show");
    assert_eq!(upcoming.body["data"].as_array().unwrap().len(), 1);

    let past = call(&app, "GET", "/api/events/past", None, None).await;
    assert_eq!(past.body["data"][0]["title"], "Alumni Talk");

    let general = call(&app, "GET", "/api/events/general", None, None).await;
    assert_eq!(general.body["data"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_contact_and_logo() {
    let (_, app) = spawn_app(RunMode::Development, None).await;
    let cookie = admin_cookie(&app).await;

    let sent = call(
        &app,
        "POST",
        "/api/contact",
        Some(json!({
            "name": "Sam",
            "email": "sam@college.example",
            "category": "admissions",
            "subject": "Portfolio",
            "message": "How large should my portfolio be?"
        })),
        None,
    )
    .await;
    assert_eq!(sent.status, StatusCode::CREATED);
    let id = sent.body["data"]["id"].as_i64().unwrap();

    let bad_email = call(
        &app,
        "POST",
        "/api/contact",
        Some(json!({
            "name": "Sam",
            "email": "sam",
            "category": "admissions",
            "subject": "Portfolio",
            "message": "Hello"
        })),
        None,
    )
    .await;
    assert_eq!(bad_email.status, StatusCode::BAD_REQUEST);

    let read = call(
        &app,
        "PUT",
        &format!("/api/admin/messages/{id}/read"),
        None,
        Some(&cookie),
    )
    .await;
    assert_eq!(read.status, StatusCode::OK);

    let messages = call(&app, "GET", "/api/admin/messages", None, Some(&cookie)).await;
    assert_eq!(messages.body["data"][0]["is_read"], true);

    let logo = call(&app, "GET", "/api/settings/logo", None, None).await;
    assert_eq!(logo.status, StatusCode::OK);
    assert_eq!(logo.body["data"]["logo_url"], Value::Null);

    let set = call(
        &app,
        "POST",
        "/api/admin/settings/logo",
        Some(json!({ "logo_url": "/images/logo.svg" })),
        Some(&cookie),
    )
    .await;
    assert_eq!(set.status, StatusCode::OK);

    let logo = call(&app, "GET", "/api/settings/logo", None, None).await;
    assert_eq!(logo.body["data"]["logo_url"], "/images/logo.svg");
}

#[tokio::test]
async fn test_request_metrics_use_route_template() {
    let recorder = metrics_exporter_prometheus::PrometheusBuilder::new().build_recorder();
    let handle = recorder.handle();
    let _guard = metrics::set_default_local_recorder(&recorder);

    let (_, app) = spawn_app(RunMode::Production, None).await;
    let reply = call(&app, "GET", "/api/courses/undergraduate", None, None).await;
    assert_eq!(reply.status, StatusCode::OK);

    let rendered = handle.render();
    assert!(
        rendered.contains(r#"path="/api/courses/{category}""#),
        "unexpected metrics output: {rendered}"
    );
    assert!(!rendered.contains("undergraduate"));
}

#[tokio::test]
async fn test_health() {
    let (_, app) = spawn_app(RunMode::Production, None).await;

    let reply = call(&app, "GET", "/api/health", None, None).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["data"]["status"], "ok");
}
