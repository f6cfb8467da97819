//! Router tests: the browser-facing flows over HTTP.

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use axum::middleware::from_fn_with_state;
use axum::response::Response;
use axum::routing::get;
use std::sync::Arc;
use tower::ServiceExt;

use super::harness::{FakeProvider, InMemoryAuthRepository, registry};
use crate::application::{AuthConfig, SessionStore};
use crate::presentation::middleware::{
    CurrentSession, CurrentUser, check_auth_session, require_auth_session,
};
use crate::presentation::router::auth_router_generic;

struct App {
    router: Router,
    repo: InMemoryAuthRepository,
    google: FakeProvider,
    config: AuthConfig,
}

fn app() -> App {
    app_with_config(AuthConfig::development())
}

fn app_with_config(config: AuthConfig) -> App {
    let repo = InMemoryAuthRepository::new();
    let google = FakeProvider::new();
    let router = auth_router_generic(repo.clone(), registry(&google), config.clone());

    App {
        router,
        repo,
        google,
        config,
    }
}

fn get_request(uri: &str, cookies: &[String]) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if !cookies.is_empty() {
        builder = builder.header(header::COOKIE, cookies.join("; "));
    }
    builder.body(Body::empty()).unwrap()
}

fn set_cookies(response: &Response) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|v| v.to_str().unwrap().to_string())
        .collect()
}

/// `name=value` pair of the Set-Cookie header for `name`
fn cookie_pair(response: &Response, name: &str) -> Option<String> {
    set_cookies(response)
        .into_iter()
        .map(|c| c.split(';').next().unwrap().to_string())
        .find(|pair| pair.starts_with(&format!("{name}=")))
}

fn location(response: &Response) -> String {
    response
        .headers()
        .get(header::LOCATION)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string()
}

async fn body_json(response: Response) -> serde_json::Value {
    let bytes = to_bytes(response.into_body(), 64 * 1024).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Drive initiate + callback and return the session cookie pair
async fn login(app: &App, email: &str, token: &str) -> String {
    app.google.assert_identity(email, token);

    let response = app
        .router
        .clone()
        .oneshot(get_request("/google", &[]))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FOUND);
    let handshake = cookie_pair(&response, "oauth_handshake").unwrap();
    let state = location(&response)
        .split_once("state=")
        .unwrap()
        .1
        .to_string();

    let response = app
        .router
        .clone()
        .oneshot(get_request(
            &format!("/google/callback?code=auth-code&state={state}"),
            &[handshake],
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response), "http://localhost/");

    cookie_pair(&response, &app.config.session_cookie_name).unwrap()
}

#[tokio::test]
async fn initiate_redirects_to_provider_with_handshake_cookie() {
    let app = app();

    let response = app
        .router
        .clone()
        .oneshot(get_request("/google", &[]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FOUND);
    assert!(location(&response).starts_with("https://idp.test/authorize"));

    let cookies = set_cookies(&response);
    assert_eq!(cookies.len(), 1);
    assert!(cookies[0].starts_with("oauth_handshake="));
    assert!(cookies[0].contains("HttpOnly"));
    assert!(cookies[0].contains("Path=/auth"));
}

#[tokio::test]
async fn unknown_provider_is_bad_request_with_empty_body() {
    let app = app();

    let response = app
        .router
        .clone()
        .oneshot(get_request("/myspace", &[]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(set_cookies(&response).is_empty());
    let body = to_bytes(response.into_body(), 1024).await.unwrap();
    assert!(body.is_empty());
}

#[tokio::test]
async fn full_login_sets_session_and_clears_handshake() {
    let app = app();
    let session = login(&app, "alice@example.com", "tok1").await;

    let response = app
        .router
        .clone()
        .oneshot(get_request("/session", &[session]))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["authenticated"], true);
    assert_eq!(json["userId"], app.repo.users()[0].user_id.to_string());
}

#[tokio::test]
async fn callback_response_expires_handshake_cookie() {
    let app = app();
    app.google.assert_identity("alice@example.com", "tok1");

    let response = app
        .router
        .clone()
        .oneshot(get_request("/google", &[]))
        .await
        .unwrap();
    let handshake = cookie_pair(&response, "oauth_handshake").unwrap();
    let state = location(&response).split_once("state=").unwrap().1.to_string();

    let response = app
        .router
        .clone()
        .oneshot(get_request(
            &format!("/google/callback?code=c&state={state}"),
            &[handshake],
        ))
        .await
        .unwrap();

    let cookies = set_cookies(&response);
    assert_eq!(cookies.len(), 2);
    assert!(cookies.iter().any(|c| c.starts_with("session.id=")));
    assert!(
        cookies
            .iter()
            .any(|c| c.starts_with("oauth_handshake=;") && c.contains("Max-Age=0"))
    );
}

#[tokio::test]
async fn authenticated_initiate_short_circuits_to_base_url() {
    let app = app();
    let session = login(&app, "alice@example.com", "tok1").await;
    let requests_before = app.google.authorization_requests();

    let response = app
        .router
        .clone()
        .oneshot(get_request("/google", &[session]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response), "http://localhost/");
    assert!(set_cookies(&response).is_empty());
    assert_eq!(app.google.authorization_requests(), requests_before);
}

#[tokio::test]
async fn callback_without_handshake_is_bad_gateway() {
    let app = app();
    app.google.assert_identity("alice@example.com", "tok1");

    let response = app
        .router
        .clone()
        .oneshot(get_request("/google/callback?code=c&state=s", &[]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert!(set_cookies(&response).is_empty());
    assert!(app.repo.users().is_empty());
}

#[tokio::test]
async fn provider_error_callback_is_bad_gateway() {
    let app = app();

    let response = app
        .router
        .clone()
        .oneshot(get_request("/google", &[]))
        .await
        .unwrap();
    let handshake = cookie_pair(&response, "oauth_handshake").unwrap();

    let response = app
        .router
        .clone()
        .oneshot(get_request(
            "/google/callback?error=access_denied&error_description=User+cancelled",
            &[handshake],
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(app.google.exchanges(), 0);
}

#[tokio::test]
async fn store_failure_on_callback_is_server_error_without_cookie() {
    let app = app();
    app.google.assert_identity("alice@example.com", "tok1");

    let response = app
        .router
        .clone()
        .oneshot(get_request("/google", &[]))
        .await
        .unwrap();
    let handshake = cookie_pair(&response, "oauth_handshake").unwrap();
    let state = location(&response).split_once("state=").unwrap().1.to_string();

    app.repo.set_unavailable(true);
    let response = app
        .router
        .clone()
        .oneshot(get_request(
            &format!("/google/callback?code=c&state={state}"),
            &[handshake],
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(set_cookies(&response).is_empty());
}

#[tokio::test]
async fn logout_clears_session() {
    let app = app();
    let session = login(&app, "alice@example.com", "tok1").await;

    let response = app
        .router
        .clone()
        .oneshot(get_request("/google/logout", &[session]))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response), "http://localhost/");
    assert_eq!(app.google.end_sessions(), 1);

    let cleared = cookie_pair(&response, &app.config.session_cookie_name).unwrap();
    let response = app
        .router
        .clone()
        .oneshot(get_request("/session", &[cleared]))
        .await
        .unwrap();

    let json = body_json(response).await;
    assert_eq!(json["authenticated"], false);
    assert!(json["userId"].is_null());
}

#[tokio::test]
async fn logout_succeeds_when_provider_cleanup_fails() {
    let app = app();
    app.google.set_fail_end_session(true);

    let response = app
        .router
        .clone()
        .oneshot(get_request("/google/logout", &[]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FOUND);
    assert!(cookie_pair(&response, &app.config.session_cookie_name).is_some());
}

#[tokio::test]
async fn logout_for_unknown_provider_clears_session() {
    let app = app();
    let session = login(&app, "alice@example.com", "tok1").await;

    let response = app
        .router
        .clone()
        .oneshot(get_request("/github/logout", &[session]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(app.google.end_sessions(), 0);

    let cleared = cookie_pair(&response, &app.config.session_cookie_name).unwrap();
    let response = app
        .router
        .clone()
        .oneshot(get_request("/session", &[cleared]))
        .await
        .unwrap();
    assert_eq!(body_json(response).await["authenticated"], false);
}

#[tokio::test]
async fn logout_persist_failure_still_clears_handshake_cookie() {
    let app = app_with_config(AuthConfig {
        session_cookie_name: "bad\nname".to_string(),
        ..AuthConfig::development()
    });

    let response = app
        .router
        .clone()
        .oneshot(get_request("/google/logout", &[]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(app.google.end_sessions(), 1);

    let cookies = set_cookies(&response);
    assert_eq!(cookies.len(), 1);
    assert!(cookies[0].starts_with(&format!("{}=;", app.config.handshake_cookie_name)));
    assert!(cookies[0].contains("Max-Age=0"));
}

#[tokio::test]
async fn tampered_session_cookie_reads_as_anonymous() {
    let app = app();

    let response = app
        .router
        .clone()
        .oneshot(get_request(
            "/session",
            &["session.id=eyJhdXRoZW50aWNhdGVkIjp0cnVlfQ.AAAA".to_string()],
        ))
        .await
        .unwrap();

    let json = body_json(response).await;
    assert_eq!(json["authenticated"], false);
}

#[tokio::test]
async fn require_auth_session_gates_protected_routes() {
    let app = app();
    let sessions = Arc::new(SessionStore::new(&app.config));
    let protected = Router::new()
        .route(
            "/restricted",
            get(|CurrentUser(user_id): CurrentUser| async move { user_id.to_string() }),
        )
        .route_layer(from_fn_with_state(sessions, require_auth_session));

    let response = protected
        .clone()
        .oneshot(get_request("/restricted", &[]))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let session = login(&app, "alice@example.com", "tok1").await;
    let response = protected
        .oneshot(get_request("/restricted", &[session]))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = to_bytes(response.into_body(), 1024).await.unwrap();
    assert_eq!(
        String::from_utf8(body.to_vec()).unwrap(),
        app.repo.users()[0].user_id.to_string()
    );
}

#[tokio::test]
async fn check_auth_session_exposes_session_without_gating() {
    let app = app();
    let sessions = Arc::new(SessionStore::new(&app.config));
    let page = Router::new()
        .route(
            "/",
            get(|CurrentSession(session): CurrentSession| async move {
                match session.user_id() {
                    Some(user_id) => format!("user {user_id}"),
                    None => "anonymous".to_string(),
                }
            }),
        )
        .layer(from_fn_with_state(sessions, check_auth_session));

    let response = page.clone().oneshot(get_request("/", &[])).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = to_bytes(response.into_body(), 1024).await.unwrap();
    assert_eq!(&body[..], b"anonymous");

    let session = login(&app, "alice@example.com", "tok1").await;
    let response = page.oneshot(get_request("/", &[session])).await.unwrap();
    let body = to_bytes(response.into_body(), 1024).await.unwrap();
    assert_eq!(
        String::from_utf8(body.to_vec()).unwrap(),
        format!("user {}", app.repo.users()[0].user_id)
    );
}
