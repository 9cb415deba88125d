use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use axum_extra::extract::CookieJar;
use chrono::{DateTime, Utc};
use serde::Serialize;

use rentdesk_auth_types::cookie::{clear_session_cookie, session_token};
use rentdesk_core::serde::to_rfc3339_ms;
use rentdesk_domain::id::CustomerId;

use crate::domain::types::Customer;
use crate::error::LogoutError;
use crate::state::AppState;
use crate::usecase::session::{GetCustomerSessionUseCase, LogoutUseCase, ResolvedSession};

// ── GET /storefront/stores/{slug}/session ─────────────────────────────────────

#[derive(Serialize)]
pub struct SessionResponse {
    pub customer_id: CustomerId,
    pub customer: Customer,
    #[serde(serialize_with = "to_rfc3339_ms")]
    pub expires_at: DateTime<Utc>,
}

impl From<ResolvedSession> for SessionResponse {
    fn from(resolved: ResolvedSession) -> Self {
        Self {
            customer_id: resolved.customer_id,
            customer: resolved.customer,
            expires_at: resolved.expires_at,
        }
    }
}

/// `null` when there is no usable session for this storefront.
pub async fn get_session(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    jar: CookieJar,
) -> Json<Option<SessionResponse>> {
    let usecase = GetCustomerSessionUseCase {
        tenants: state.tenant_repo(),
        sessions: state.session_repo(),
        customers: state.customer_repo(),
        clock: state.clock.clone(),
    };
    let token = session_token(&jar);
    let resolved = usecase.execute(&slug, token.as_deref()).await;
    Json(resolved.map(SessionResponse::from))
}

// ── DELETE /storefront/auth/session ───────────────────────────────────────────

pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<impl IntoResponse, LogoutError> {
    let usecase = LogoutUseCase {
        sessions: state.session_repo(),
    };
    usecase.execute(session_token(&jar).as_deref()).await?;
    let jar = clear_session_cookie(jar, state.cookie_secure);
    Ok((StatusCode::NO_CONTENT, jar))
}
