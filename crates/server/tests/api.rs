//! End-to-end API tests.
//!
//! These drive the full router in-process over an in-memory `SQLite`
//! database, including the session layer, so the auth flow is exercised
//! exactly as a browser would see it: signup, login, a signed session
//! cookie, and ownership-scoped sleep routes behind it.

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use chrono::{Duration, Utc};
use secrecy::SecretString;
use serde_json::{Value, json};
use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;
use tower::ServiceExt;

use somnolog_server::config::ServerConfig;
use somnolog_server::state::AppState;
use somnolog_server::{db, middleware, routes};

const USERNAME: &str = "night_owl";
const PASSWORD: &str = "Hunter2!Hunter2!";

fn test_config() -> ServerConfig {
    ServerConfig {
        database_url: SecretString::from("sqlite::memory:"),
        host: "127.0.0.1".parse().unwrap(),
        port: 0,
        base_url: "http://localhost:3000".to_owned(),
        session_secret: SecretString::from(
            "kXJ4mP9vQ2wR7tY1uE5oA8sD3fG6hL0zkXJ4mP9vQ2wR7tY1",
        ),
        sentry_dsn: None,
        sentry_environment: None,
    }
}

/// Build the application router over a fresh in-memory database.
///
/// A single connection keeps the in-memory database alive for the
/// lifetime of the pool; the returned handle lets tests mutate the
/// store behind the router's back.
async fn test_app() -> (Router, SqlitePool) {
    let pool: SqlitePool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    db::init_schema(&pool).await.unwrap();

    let config = test_config();
    let session_layer = middleware::create_session_layer(&pool, &config)
        .await
        .unwrap();
    let state = AppState::new(config, pool.clone());

    let app = routes::routes().layer(session_layer).with_state(state);
    (app, pool)
}

fn json_request(method: &str, uri: &str, cookie: Option<&str>, body: &Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie.to_owned());
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn get_request(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie.to_owned());
    }
    builder.body(Body::empty()).unwrap()
}

/// Extract the session cookie pair (`name=value`) from a response.
fn session_cookie(response: &axum::response::Response) -> String {
    let raw = response
        .headers()
        .get(header::SET_COOKIE)
        .expect("response should set a session cookie")
        .to_str()
        .unwrap();
    raw.split(';').next().unwrap().to_owned()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn signup(app: &Router, username: &str, password: &str) -> StatusCode {
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/auth/signup",
            None,
            &json!({"username": username, "password": password}),
        ))
        .await
        .unwrap();
    response.status()
}

/// Sign up and log in, returning the session cookie.
async fn login(app: &Router, username: &str, password: &str) -> String {
    assert_eq!(signup(app, username, password).await, StatusCode::CREATED);

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/auth/login",
            None,
            &json!({"username": username, "password": password}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    session_cookie(&response)
}

async fn create_entry(app: &Router, cookie: &str, body: &Value) -> Value {
    let response = app
        .clone()
        .oneshot(json_request("POST", "/sleep", Some(cookie), body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await
}

// ============================================================================
// Auth Flow
// ============================================================================

#[tokio::test]
async fn signup_login_profile_logout_flow() {
    let (app, _pool) = test_app().await;

    assert_eq!(signup(&app, USERNAME, PASSWORD).await, StatusCode::CREATED);

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/auth/login",
            None,
            &json!({"username": USERNAME, "password": PASSWORD}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let cookie = session_cookie(&response);
    let body = body_json(response).await;
    assert_eq!(body["user"]["username"], USERNAME);
    assert!(body["user"]["userId"].is_i64());

    // Profile is served from the live session
    let response = app
        .clone()
        .oneshot(get_request("/auth/profile", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let profile = body_json(response).await;
    assert_eq!(profile["username"], USERNAME);

    // Logout destroys the session
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/auth/logout",
            Some(&cookie),
            &json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // The old cookie no longer authenticates
    let response = app
        .clone()
        .oneshot(get_request("/auth/profile", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn duplicate_signup_is_rejected() {
    let (app, _pool) = test_app().await;

    assert_eq!(signup(&app, USERNAME, PASSWORD).await, StatusCode::CREATED);
    assert_eq!(
        signup(&app, USERNAME, PASSWORD).await,
        StatusCode::BAD_REQUEST
    );
}

#[tokio::test]
async fn login_with_wrong_password_is_unauthorized() {
    let (app, _pool) = test_app().await;
    assert_eq!(signup(&app, USERNAME, PASSWORD).await, StatusCode::CREATED);

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/auth/login",
            None,
            &json!({"username": USERNAME, "password": "Wrong2!Wrong2!Wrong"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn protected_routes_require_a_session() {
    let (app, _pool) = test_app().await;

    for uri in ["/auth/profile", "/sleep", "/sleep/1", "/sleep/stats/weekly"] {
        let response = app.clone().oneshot(get_request(uri, None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "GET {uri}");
    }
}

#[tokio::test]
async fn deleting_a_user_invalidates_their_live_session() {
    let (app, pool) = test_app().await;
    assert_eq!(signup(&app, USERNAME, PASSWORD).await, StatusCode::CREATED);

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/auth/login",
            None,
            &json!({"username": USERNAME, "password": PASSWORD}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let cookie = session_cookie(&response);
    let body = body_json(response).await;
    let user_id = body["user"]["userId"].as_i64().unwrap();

    // The session still resolves while the user row exists
    let response = app
        .clone()
        .oneshot(get_request("/auth/profile", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Delete the user out from under the live session
    sqlx::query("DELETE FROM users WHERE id = ?1")
        .bind(user_id)
        .execute(&pool)
        .await
        .unwrap();

    // The guard re-reads the user store per request, so the very next
    // guarded request is rejected even though the cookie is intact
    let response = app
        .clone()
        .oneshot(get_request("/auth/profile", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .clone()
        .oneshot(get_request("/sleep", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

// ============================================================================
// Sleep Ledger
// ============================================================================

#[tokio::test]
async fn sleep_entry_crud_flow() {
    let (app, _pool) = test_app().await;
    let cookie = login(&app, USERNAME, PASSWORD).await;

    let created = create_entry(
        &app,
        &cookie,
        &json!({
            "dateOfSleep": "2024-05-16",
            "sleepTime": "2024-05-16T22:00:00Z",
            "wakeUpTime": "2024-05-17T06:00:00Z",
        }),
    )
    .await;
    assert_eq!(created["durationInMinutes"], 480);
    assert_eq!(created["dateOfSleep"], "2024-05-16");
    let id = created["id"].as_i64().unwrap();

    // List contains it
    let response = app
        .clone()
        .oneshot(get_request("/sleep", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let list = body_json(response).await;
    assert_eq!(list.as_array().unwrap().len(), 1);

    // Patch the wake time; duration is recomputed
    let response = app
        .clone()
        .oneshot(json_request(
            "PATCH",
            &format!("/sleep/{id}"),
            Some(&cookie),
            &json!({"wakeUpTime": "2024-05-17T07:00:00Z"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let patched = body_json(response).await;
    assert_eq!(patched["durationInMinutes"], 540);

    // Delete, then it is gone
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/sleep/{id}"))
                .header(header::COOKIE, cookie.clone())
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .clone()
        .oneshot(get_request(&format!("/sleep/{id}"), Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn inverted_time_range_is_rejected() {
    let (app, _pool) = test_app().await;
    let cookie = login(&app, USERNAME, PASSWORD).await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/sleep",
            Some(&cookie),
            &json!({
                "dateOfSleep": "2024-05-16",
                "sleepTime": "2024-05-17T06:00:00Z",
                "wakeUpTime": "2024-05-16T22:00:00Z",
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn entries_are_invisible_across_users() {
    let (app, _pool) = test_app().await;

    let owner_cookie = login(&app, "owner_user", PASSWORD).await;
    let entry = create_entry(
        &app,
        &owner_cookie,
        &json!({
            "dateOfSleep": "2024-05-16",
            "sleepTime": "2024-05-16T22:00:00Z",
            "wakeUpTime": "2024-05-17T06:00:00Z",
        }),
    )
    .await;
    let id = entry["id"].as_i64().unwrap();

    let other_cookie = login(&app, "other_user", PASSWORD).await;

    // Reads, updates, and deletes by a non-owner all look like a missing entry
    let response = app
        .clone()
        .oneshot(get_request(&format!("/sleep/{id}"), Some(&other_cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .clone()
        .oneshot(json_request(
            "PATCH",
            &format!("/sleep/{id}"),
            Some(&other_cookie),
            &json!({"dateOfSleep": "2024-05-10"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .clone()
        .oneshot(get_request("/sleep", Some(&other_cookie)))
        .await
        .unwrap();
    let list = body_json(response).await;
    assert!(list.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn weekly_stats_cover_the_trailing_week() {
    let (app, _pool) = test_app().await;
    let cookie = login(&app, USERNAME, PASSWORD).await;

    // One night inside the window (yesterday) and one well outside it
    let last_night = Utc::now() - Duration::days(1);
    let date = last_night.date_naive();
    create_entry(
        &app,
        &cookie,
        &json!({
            "dateOfSleep": date.to_string(),
            "sleepTime": format!("{date}T22:00:00Z"),
            "wakeUpTime": format!("{}T06:00:00Z", date + Duration::days(1)),
        }),
    )
    .await;
    create_entry(
        &app,
        &cookie,
        &json!({
            "dateOfSleep": "2020-01-01",
            "sleepTime": "2020-01-01T23:00:00Z",
            "wakeUpTime": "2020-01-02T07:00:00Z",
        }),
    )
    .await;

    let response = app
        .clone()
        .oneshot(get_request("/sleep/stats/weekly", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let stats = body_json(response).await;

    assert_eq!(stats["totalEntriesConsidered"], 1);
    assert_eq!(stats["averageSleepDurationMinutes"], 480);
    assert_eq!(stats["averageSleepTime"], "22:00");
    assert_eq!(stats["averageWakeUpTime"], "06:00");
}

#[tokio::test]
async fn weekly_stats_with_no_entries_are_null() {
    let (app, _pool) = test_app().await;
    let cookie = login(&app, USERNAME, PASSWORD).await;

    let response = app
        .clone()
        .oneshot(get_request("/sleep/stats/weekly", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let stats = body_json(response).await;

    assert_eq!(stats["totalEntriesConsidered"], 0);
    assert!(stats["averageSleepDurationMinutes"].is_null());
    assert!(stats["averageSleepTime"].is_null());
    assert!(stats["averageWakeUpTime"].is_null());
}
