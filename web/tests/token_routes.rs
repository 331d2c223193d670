//! End-to-end tests for the session middleware and token routes.

#![allow(clippy::unwrap_used)]

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    response::Response,
    routing::get,
    Json, Router,
};
use eq_session::{MemorySessionManager, SessionConfig, SessionData, SessionEnvironment, SessionManager};
use eq_session_testing::{init_tracing, ManualClock};
use eq_session_web::{
    token_router, CurrentSession, SessionLayer, SessionTicket, SharedSessionService, SESSION_HEADER,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

fn create_manager(config: SessionConfig) -> (Arc<MemorySessionManager<ManualClock>>, ManualClock) {
    let clock = ManualClock::default();
    let manager = SessionManager::new(SessionEnvironment::in_memory(clock.clone()), config).unwrap();
    (Arc::new(manager), clock)
}

fn app(service: SharedSessionService) -> Router {
    Router::new()
        .route(
            "/me",
            get(|CurrentSession(session): CurrentSession| async move { Json(session) }),
        )
        .route(
            "/whoami",
            get(|ticket: Option<SessionTicket>| async move {
                Json(json!({ "ticket": ticket.map(|SessionTicket(t)| t) }))
            }),
        )
        .merge(token_router(service.clone()))
        .layer(SessionLayer::new(service))
}

fn get_with_ticket(uri: &str, ticket: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(SESSION_HEADER, ticket)
        .body(Body::empty())
        .unwrap()
}

fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn json_body(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn data(value: Value) -> SessionData {
    value.as_object().cloned().unwrap_or_default()
}

#[tokio::test]
async fn test_resolved_ticket_attaches_session() {
    init_tracing();
    let (manager, _clock) = create_manager(SessionConfig::default());
    let ticket = manager.create_ticket("user-1").await.unwrap();
    manager
        .set_session("user-1", data(json!({ "name": "Ada", "role": "admin" })))
        .await
        .unwrap();

    let response = app(manager).oneshot(get_with_ticket("/me", &ticket)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        json_body(response).await,
        json!({ "name": "Ada", "role": "admin", "id": ticket })
    );
}

#[tokio::test]
async fn test_columns_limit_attached_fields() {
    let (manager, _clock) = create_manager(SessionConfig::default());
    let ticket = manager.create_ticket("user-1").await.unwrap();
    manager
        .set_session("user-1", data(json!({ "name": "Ada", "role": "admin" })))
        .await
        .unwrap();

    let service: SharedSessionService = manager;
    let app = Router::new()
        .route(
            "/me",
            get(|CurrentSession(session): CurrentSession| async move { Json(session) }),
        )
        .layer(SessionLayer::new(service).with_columns(["name"]));

    let response = app.oneshot(get_with_ticket("/me", &ticket)).await.unwrap();

    assert_eq!(json_body(response).await, json!({ "name": "Ada", "id": ticket }));
}

#[tokio::test]
async fn test_unresolved_ticket_passes_through() {
    let (manager, _clock) = create_manager(SessionConfig::default());

    let response = app(manager.clone())
        .oneshot(get_with_ticket("/whoami", "never-issued"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await, json!({ "ticket": null }));

    let response = app(manager)
        .oneshot(get_with_ticket("/me", "never-issued"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_expired_ticket_attaches_nothing() {
    let (manager, clock) = create_manager(SessionConfig::default());
    let ticket = manager.create_ticket("user-1").await.unwrap();

    clock.advance(chrono::Duration::days(31));

    let response = app(manager).oneshot(get_with_ticket("/me", &ticket)).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_token_hand_off() {
    init_tracing();
    let (manager, _clock) = create_manager(SessionConfig::default());
    let ticket = manager.create_ticket("user-1").await.unwrap();

    let request = Request::builder()
        .method(Method::POST)
        .uri("/token")
        .header(SESSION_HEADER, &ticket)
        .body(Body::empty())
        .unwrap();
    let response = app(manager.clone()).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let token = json_body(response).await["token"]
        .as_str()
        .unwrap()
        .to_string();
    assert_eq!(token.len(), 8);

    let response = app(manager)
        .oneshot(post_json("/token/exchange", &json!({ "token": token })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await, json!({ "ticket": ticket }));
}

#[tokio::test]
async fn test_token_requires_ticket() {
    let (manager, _clock) = create_manager(SessionConfig::default());

    let request = Request::builder()
        .method(Method::POST)
        .uri("/token")
        .body(Body::empty())
        .unwrap();
    let response = app(manager).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_unknown_token_is_not_found() {
    let (manager, _clock) = create_manager(SessionConfig::default());

    let response = app(manager)
        .oneshot(post_json("/token/exchange", &json!({ "token": "AAAAAAAA" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        json_body(response).await,
        json!({ "code": "INVALID_TOKEN", "message": "Wrong token" })
    );
}

#[tokio::test]
async fn test_expired_token_is_not_found() {
    let (manager, clock) = create_manager(SessionConfig::default());
    let ticket = manager.create_ticket("user-1").await.unwrap();
    let token = manager.create_token(&ticket).await.unwrap();

    clock.advance(chrono::Duration::seconds(301));

    let response = app(manager)
        .oneshot(post_json("/token/exchange", &json!({ "token": token })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_consumed_token_exchanges_once() {
    let (manager, _clock) =
        create_manager(SessionConfig::new().with_consume_token_on_exchange(true));
    let ticket = manager.create_ticket("user-1").await.unwrap();
    let token = manager.create_token(&ticket).await.unwrap();

    let first = app(manager.clone())
        .oneshot(post_json("/token/exchange", &json!({ "token": token })))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::OK);

    let second = app(manager)
        .oneshot(post_json("/token/exchange", &json!({ "token": token })))
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_malformed_exchange_body_is_bad_request() {
    let (manager, _clock) = create_manager(SessionConfig::default());

    let response = app(manager)
        .oneshot(post_json("/token/exchange", &json!({ "tok": "x" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["code"], "BAD_REQUEST");
}
