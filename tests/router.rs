mod common;

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use http_body_util::BodyExt;
use sea_orm::DatabaseConnection;
use tourism_api::{jobs::RetryPolicy, routes::create_api_router, state::AppState};
use tower::ServiceExt;

use common::{CannedCompletion, MemoryStorage, StubPayments, test_config};

// Token checks run before any query, so a disconnected pool is enough here.
fn app() -> Router {
    let state = AppState::with_collaborators(
        test_config("postgres://unused"),
        DatabaseConnection::Disconnected,
        Arc::new(CannedCompletion(None)),
        Arc::new(StubPayments),
        Arc::new(MemoryStorage::default()),
        RetryPolicy::immediate(1),
    );
    Router::new().nest("/api", create_api_router()).with_state(state)
}

async fn send(request: Request<Body>) -> anyhow::Result<(StatusCode, serde_json::Value)> {
    let response = app().oneshot(request).await?;
    let status = response.status();
    let bytes = response.into_body().collect().await?.to_bytes();
    Ok((status, serde_json::from_slice(&bytes)?))
}

#[tokio::test]
async fn protected_route_without_token_is_unauthorized() -> anyhow::Result<()> {
    let request = Request::builder().uri("/api/me").body(Body::empty())?;
    let (status, body) = send(request).await?;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["status"], "error");
    assert_eq!(body["message"], "Unauthorized");
    Ok(())
}

#[tokio::test]
async fn malformed_token_is_unauthorized() -> anyhow::Result<()> {
    let request = Request::builder()
        .method("POST")
        .uri("/api/activity/save")
        .header(header::AUTHORIZATION, "Bearer not-a-jwt")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"business_user_id":"00000000-0000-0000-0000-000000000000"}"#))?;
    let (status, body) = send(request).await?;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["data"].is_null());
    Ok(())
}
