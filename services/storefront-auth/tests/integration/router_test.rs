use std::sync::Arc;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use sea_orm::{DatabaseBackend, DatabaseConnection, DbErr, MockDatabase};
use tower::ServiceExt;

use rentdesk_core::clock::Clock;
use rentdesk_storefront_auth::domain::types::RateLimitPolicy;
use rentdesk_storefront_auth::infra::email::{AppEmailSender, LogEmailSender};
use rentdesk_storefront_auth::infra::rate_limit::{AppRateLimiter, InMemoryRateLimiter};
use rentdesk_storefront_auth::router::build_router;
use rentdesk_storefront_auth::state::AppState;
use rentdesk_storefront_auth_schema::stores;
use rentdesk_testing::clock::ManualClock;

use crate::helpers::TENANT_A;

/// Router over an empty mock database, for requests that never reach storage.
fn app() -> Router {
    app_with(MockDatabase::new(DatabaseBackend::Postgres).into_connection())
}

/// A database whose next `n` selects fail.
fn failing_queries(n: usize) -> DatabaseConnection {
    MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_errors((0..n).map(|_| DbErr::Custom("connection refused".to_owned())))
        .into_connection()
}

/// A database whose next write fails.
fn failing_exec() -> DatabaseConnection {
    MockDatabase::new(DatabaseBackend::Postgres)
        .append_exec_errors([DbErr::Custom("connection refused".to_owned())])
        .into_connection()
}

fn app_with(db: DatabaseConnection) -> Router {
    let clock: Arc<dyn Clock> = Arc::new(ManualClock::fixed());
    let limiter = |policy| {
        AppRateLimiter::Memory(Arc::new(InMemoryRateLimiter::new(policy, clock.clone())))
    };
    build_router(AppState {
        db,
        send_limiter: limiter(RateLimitPolicy::send_code()),
        verify_limiter: limiter(RateLimitPolicy::verify_code()),
        email: AppEmailSender::Log(LogEmailSender),
        clock: clock.clone(),
        cookie_secure: true,
        conceal_account_existence: false,
    })
}

fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(resp: axum::response::Response) -> serde_json::Value {
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn should_answer_liveness_with_request_id() {
    let resp = app()
        .oneshot(Request::get("/healthz").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn should_keep_caller_request_id() {
    let resp = app()
        .oneshot(
            Request::get("/healthz")
                .header("x-request-id", "req-123")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.headers()["x-request-id"], "req-123");
}

#[tokio::test]
async fn should_report_not_ready_without_database() {
    let resp = app_with(DatabaseConnection::Disconnected)
        .oneshot(Request::get("/readyz").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn should_reject_malformed_tenant_on_send() {
    let resp = app()
        .oneshot(json_request(
            "POST",
            "/storefront/auth/code",
            serde_json::json!({"tenant_id": "store-1", "email": "a@x.com"}),
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(resp).await["kind"], "INVALID_TENANT");
}

#[tokio::test]
async fn should_rate_limit_send_with_retry_after_header() {
    let app = app_with(failing_queries(3));
    let request = || {
        json_request(
            "POST",
            "/storefront/auth/code",
            serde_json::json!({"tenant_id": TENANT_A, "email": "a@x.com", "locale": "fr"}),
        )
    };

    for _ in 0..3 {
        let resp = app.clone().oneshot(request()).await.unwrap();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(resp).await["kind"], "SEND_ERROR");
    }

    let resp = app.oneshot(request()).await.unwrap();
    assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(resp.headers()[header::RETRY_AFTER], "1800");
    let json = body_json(resp).await;
    assert_eq!(json["kind"], "RATE_LIMITED");
    assert_eq!(json["retry_after"], 1800);
}

#[tokio::test]
async fn should_reject_malformed_code_on_verify() {
    let resp = app()
        .oneshot(json_request(
            "POST",
            "/storefront/auth/session",
            serde_json::json!({"tenant_id": TENANT_A, "email": "a@x.com", "code": "12ab56"}),
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(resp.headers().get(header::SET_COOKIE).is_none());
    assert_eq!(body_json(resp).await["kind"], "INVALID_CODE");
}

#[tokio::test]
async fn should_hide_storage_failure_on_verify() {
    let resp = app_with(failing_queries(1))
        .oneshot(json_request(
            "POST",
            "/storefront/auth/session",
            serde_json::json!({"tenant_id": TENANT_A, "email": "a@x.com", "code": "123456"}),
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = body_json(resp).await;
    assert_eq!(json["kind"], "VERIFICATION_ERROR");
    assert_eq!(json["message"], "verification failed");
}

#[tokio::test]
async fn should_return_null_session_without_cookie() {
    let resp = app()
        .oneshot(
            Request::get("/storefront/stores/velo-loc/session")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert!(body_json(resp).await.is_null());
}

#[tokio::test]
async fn should_return_null_session_when_lookup_fails() {
    let resp = app_with(failing_queries(1))
        .oneshot(
            Request::get("/storefront/stores/velo-loc/session")
                .header(header::COOKIE, "customer_session=abc")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert!(body_json(resp).await.is_null());
}

#[tokio::test]
async fn should_clear_cookie_on_logout_without_session() {
    let resp = app()
        .oneshot(
            Request::delete("/storefront/auth/session")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    let cookie = resp.headers()[header::SET_COOKIE].to_str().unwrap();
    assert!(cookie.starts_with("customer_session="), "{cookie}");
    assert!(cookie.contains("Max-Age=0"), "{cookie}");
}

#[tokio::test]
async fn should_surface_logout_failure() {
    let resp = app_with(failing_exec())
        .oneshot(
            Request::delete("/storefront/auth/session")
                .header(header::COOKIE, "customer_session=abc")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_json(resp).await["kind"], "LOGOUT_ERROR");
}

#[tokio::test]
async fn should_report_ready_when_database_answers() {
    let resp = app()
        .oneshot(Request::get("/readyz").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn should_resolve_session_for_store_slugged_auth() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([Vec::<stores::Model>::new()])
        .into_connection();

    let resp = app_with(db)
        .oneshot(
            Request::get("/storefront/stores/auth/session")
                .header(header::COOKIE, "customer_session=abc")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert!(body_json(resp).await.is_null());
}

#[tokio::test]
async fn should_keep_auth_routes_apart_from_store_lookup() {
    let resp = app()
        .oneshot(
            Request::get("/storefront/auth/session")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
}
