use axum::{
    Router,
    routing::{get, post},
};
use tower::ServiceBuilder;

use rentdesk_core::health::healthz;
use rentdesk_core::middleware::{propagate_request_id_layer, request_id_layer, trace_layer};

use crate::handlers::{
    code::{send_code, verify_code},
    health::readyz,
    session::{get_session, logout},
};
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Health
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        // Verification code
        .route("/storefront/auth/code", post(send_code))
        // Session
        .route(
            "/storefront/auth/session",
            post(verify_code).delete(logout),
        )
        .route("/storefront/stores/{slug}/session", get(get_session))
        .layer(
            ServiceBuilder::new()
                .layer(request_id_layer())
                .layer(trace_layer())
                .layer(propagate_request_id_layer()),
        )
        .with_state(state)
}
