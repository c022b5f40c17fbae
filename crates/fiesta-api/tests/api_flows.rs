use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use fiesta_api::{api_router, AppState};
use fiesta_db::MemStorage;

fn app() -> Router {
    api_router(AppState {
        storage: Arc::new(MemStorage::new()),
        mailer: None,
        secure_cookies: false,
    })
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
    cookie: Option<&str>,
) -> (StatusCode, Option<String>, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }

    let request = match body {
        Some(value) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(value.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .map(|v| v.to_str().unwrap().to_string());

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };

    (status, set_cookie, body)
}

/// Strip a Set-Cookie header down to the `name=value` pair.
fn cookie_pair(set_cookie: &str) -> String {
    set_cookie.split(';').next().unwrap().to_string()
}

async fn bootstrap_admin(app: &Router) {
    let (status, _, body) = send(
        app,
        "POST",
        "/api/setup",
        Some(json!({"username": "admin", "password": "adminpass"})),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["isAdmin"], json!(true));
}

async fn login(app: &Router, username: &str, password: &str) -> String {
    let (status, set_cookie, _) = send(
        app,
        "POST",
        "/api/login",
        Some(json!({"username": username, "password": password})),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    cookie_pair(&set_cookie.expect("login must set a session cookie"))
}

#[tokio::test]
async fn setup_bootstraps_exactly_one_admin() {
    let app = app();

    let (_, _, before) = send(&app, "GET", "/api/setup/check", None, None).await;
    assert_eq!(before, json!(false));

    bootstrap_admin(&app).await;

    let (_, _, after) = send(&app, "GET", "/api/setup/check", None, None).await;
    assert_eq!(after, json!(true));

    // A second bootstrap is refused no matter the payload.
    let (status, _, body) = send(
        &app,
        "POST",
        "/api/setup",
        Some(json!({"username": "intruder", "password": "longenough"})),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], json!("Setup already completed"));
}

#[tokio::test]
async fn setup_validates_minimum_lengths() {
    let app = app();

    let (status, _, body) = send(
        &app,
        "POST",
        "/api/setup",
        Some(json!({"username": "ab", "password": "adminpass"})),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], json!("Username must be at least 3 characters"));

    let (status, _, body) = send(
        &app,
        "POST",
        "/api/setup",
        Some(json!({"username": "admin", "password": "short"})),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], json!("Password must be at least 8 characters"));
}

#[tokio::test]
async fn login_rejects_bad_credentials_with_one_generic_message() {
    let app = app();
    bootstrap_admin(&app).await;

    for payload in [
        json!({"username": "admin", "password": "wrong"}),
        json!({"username": "nobody", "password": "adminpass"}),
    ] {
        let (status, set_cookie, body) =
            send(&app, "POST", "/api/login", Some(payload), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], json!("Invalid username or password"));
        assert!(set_cookie.is_none());
    }
}

#[tokio::test]
async fn login_issues_a_session_cookie_that_resolves_the_user() {
    let app = app();
    bootstrap_admin(&app).await;

    let cookie = login(&app, "admin", "adminpass").await;
    assert!(cookie.starts_with("fiesta_session="));

    let (status, _, body) = send(&app, "GET", "/api/user", None, Some(&cookie)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], json!("admin"));
    assert_eq!(body["isAdmin"], json!(true));
    assert!(body.get("passwordHash").is_none());
    assert!(body.get("password").is_none());

    // Anonymous requests stay anonymous.
    let (status, _, _) = send(&app, "GET", "/api/user", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn logout_destroys_the_session_and_is_idempotent() {
    let app = app();
    bootstrap_admin(&app).await;
    let cookie = login(&app, "admin", "adminpass").await;

    let (status, _, _) = send(&app, "POST", "/api/logout", None, Some(&cookie)).await;
    assert_eq!(status, StatusCode::OK);

    // Logging out again with the same (now dead) cookie is still fine.
    let (status, _, _) = send(&app, "POST", "/api/logout", None, Some(&cookie)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _, _) = send(&app, "GET", "/api/user", None, Some(&cookie)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn sessions_for_different_accounts_are_independent() {
    let app = app();
    bootstrap_admin(&app).await;
    let admin_cookie = login(&app, "admin", "adminpass").await;

    let (status, _, _) = send(
        &app,
        "POST",
        "/api/users",
        Some(json!({"username": "judge", "password": "longenough"})),
        Some(&admin_cookie),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let judge_cookie = login(&app, "judge", "longenough").await;

    // Admin logs out; the judge's session must be untouched.
    let (status, _, _) = send(&app, "POST", "/api/logout", None, Some(&admin_cookie)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _, body) = send(&app, "GET", "/api/user", None, Some(&judge_cookie)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], json!("judge"));

    let (status, _, _) = send(&app, "GET", "/api/user", None, Some(&admin_cookie)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn admin_writes_are_gated_by_role() {
    let app = app();
    bootstrap_admin(&app).await;
    let admin_cookie = login(&app, "admin", "adminpass").await;

    let event = json!({
        "title": "Robotics Expo",
        "description": "Student-built robots in action",
        "date": "September 15",
        "time": "9:00 AM",
        "location": "Main hall",
        "category": "exhibition",
        "image": "/img/robots.jpg",
        "presenter": "Ms. Lee"
    });

    // Anonymous → 401
    let (status, _, _) = send(&app, "POST", "/api/events", Some(event.clone()), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Authenticated non-admin → 403
    let (status, _, _) = send(
        &app,
        "POST",
        "/api/users",
        Some(json!({"username": "judge", "password": "longenough"})),
        Some(&admin_cookie),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let judge_cookie = login(&app, "judge", "longenough").await;
    let (status, _, _) = send(
        &app,
        "POST",
        "/api/events",
        Some(event.clone()),
        Some(&judge_cookie),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Admin → 201, and the event is publicly readable.
    let (status, _, created) = send(
        &app,
        "POST",
        "/api/events",
        Some(event),
        Some(&admin_cookie),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _, listed) = send(&app, "GET", "/api/events", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed.as_array().unwrap().len(), 1);
    assert_eq!(listed[0]["id"], created["id"]);
}

#[tokio::test]
async fn event_crud_roundtrip() {
    let app = app();
    bootstrap_admin(&app).await;
    let cookie = login(&app, "admin", "adminpass").await;

    let (_, _, created) = send(
        &app,
        "POST",
        "/api/events",
        Some(json!({
            "title": "Chemistry Show",
            "description": "Live demonstrations",
            "date": "September 16",
            "time": "1:00 PM",
            "location": "Lab wing",
            "category": "show",
            "image": "/img/chem.jpg",
            "presenter": "Mr. Patel"
        })),
        Some(&cookie),
    )
    .await;
    let id = created["id"].as_i64().unwrap();

    // Partial update flips only the featured flag.
    let (status, _, updated) = send(
        &app,
        "PUT",
        &format!("/api/events/{id}"),
        Some(json!({"isFeatured": true})),
        Some(&cookie),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["title"], json!("Chemistry Show"));
    assert_eq!(updated["isFeatured"], json!(true));

    let (_, _, featured) = send(&app, "GET", "/api/events/featured", None, None).await;
    assert_eq!(featured.as_array().unwrap().len(), 1);

    let (status, _, _) = send(
        &app,
        "DELETE",
        &format!("/api/events/{id}"),
        None,
        Some(&cookie),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _, body) = send(&app, "GET", &format!("/api/events/{id}"), None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], json!("Event not found"));
}

#[tokio::test]
async fn wiki_articles_follow_the_same_lifecycle() {
    let app = app();
    bootstrap_admin(&app).await;
    let cookie = login(&app, "admin", "adminpass").await;

    let (status, _, created) = send(
        &app,
        "POST",
        "/api/wiki",
        Some(json!({
            "title": "Volcano Models",
            "content": "How to build a safe eruption",
            "category": "projects",
            "icon": "flask",
            "isFeatured": true
        })),
        Some(&cookie),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = created["id"].as_i64().unwrap();

    let (_, _, featured) = send(&app, "GET", "/api/wiki/featured", None, None).await;
    assert_eq!(featured.as_array().unwrap().len(), 1);

    let (status, _, body) = send(&app, "GET", "/api/wiki/999", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], json!("Wiki article not found"));

    let (status, _, _) = send(
        &app,
        "DELETE",
        &format!("/api/wiki/{id}"),
        None,
        Some(&cookie),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn settings_updates_are_idempotent_and_replace_sub_documents_wholesale() {
    let app = app();
    bootstrap_admin(&app).await;
    let cookie = login(&app, "admin", "adminpass").await;

    let patch = json!({
        "carnivalDate": "2026-09-15T00:00:00.000Z",
        "navbarSettings": {
            "logo": "/logo.png",
            "logoText": "SC",
            "siteTitle": "Science Week",
            "primaryColor": "#16a34a",
            "registrationLink": "https://school.edu/register",
            "displayMode": "logo-only"
        }
    });

    let (status, _, first) = send(
        &app,
        "PUT",
        "/api/settings",
        Some(patch.clone()),
        Some(&cookie),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _, second) = send(&app, "PUT", "/api/settings", Some(patch), Some(&cookie)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first, second);

    let (status, _, stored) = send(&app, "GET", "/api/settings", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stored, second);

    assert_eq!(stored["id"], json!(1));
    assert_eq!(stored["carnivalDate"], json!("2026-09-15T00:00:00.000Z"));
    assert_eq!(stored["navbarSettings"]["displayMode"], json!("logo-only"));
    // Untouched scalar fields keep their defaults.
    assert_eq!(stored["contactPhone"], json!("(123) 456-7890"));
}

#[tokio::test]
async fn settings_writes_require_admin() {
    let app = app();

    let (status, _, _) = send(
        &app,
        "PUT",
        "/api/settings",
        Some(json!({"carnivalDate": "2026-01-01T00:00:00.000Z"})),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Reads stay public.
    let (status, _, _) = send(&app, "GET", "/api/settings", None, None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn change_password_requires_the_current_one() {
    let app = app();
    bootstrap_admin(&app).await;
    let cookie = login(&app, "admin", "adminpass").await;

    let (status, _, _) = send(
        &app,
        "PUT",
        "/api/user/password",
        Some(json!({"currentPassword": "wrong", "newPassword": "brand-new-pass"})),
        Some(&cookie),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _, _) = send(
        &app,
        "PUT",
        "/api/user/password",
        Some(json!({"currentPassword": "adminpass", "newPassword": "brand-new-pass"})),
        Some(&cookie),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // Old password no longer works, the new one does.
    let (status, _, _) = send(
        &app,
        "POST",
        "/api/login",
        Some(json!({"username": "admin", "password": "adminpass"})),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    login(&app, "admin", "brand-new-pass").await;
}

#[tokio::test]
async fn contact_form_validates_and_requires_a_relay() {
    let app = app();

    let (status, _, body) = send(
        &app,
        "POST",
        "/api/contact",
        Some(json!({"name": "A", "email": "a@b.c", "subject": "Hello", "message": "Long enough message."})),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], json!("Name must be at least 2 characters"));

    // Valid payload, but this deployment has no SMTP relay configured.
    let (status, _, _) = send(
        &app,
        "POST",
        "/api/contact",
        Some(json!({
            "name": "Visitor",
            "email": "visitor@example.com",
            "subject": "Question about events",
            "message": "When does the fair open to the public?"
        })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn unknown_api_paths_return_json_404() {
    let app = app();
    let (status, _, body) = send(&app, "GET", "/api/definitely-not-a-route", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], json!("API endpoint not found"));
}

#[tokio::test]
async fn health_probe_reports_ok() {
    let app = app();
    let (status, _, body) = send(&app, "GET", "/api", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], json!("ok"));
}
