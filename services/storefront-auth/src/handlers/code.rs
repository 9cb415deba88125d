use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use axum_extra::extract::CookieJar;
use serde::{Deserialize, Serialize};

use rentdesk_auth_types::cookie::set_session_cookie;
use rentdesk_domain::id::CustomerId;

use crate::error::{SendCodeError, VerifyCodeError};
use crate::state::AppState;
use crate::usecase::code::{
    SendVerificationCodeInput, SendVerificationCodeUseCase, VerifyCodeInput, VerifyCodeUseCase,
};

// ── POST /storefront/auth/code ────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct SendCodeRequest {
    pub tenant_id: String,
    pub email: String,
    #[serde(default)]
    pub locale: Option<String>,
}

pub async fn send_code(
    State(state): State<AppState>,
    Json(body): Json<SendCodeRequest>,
) -> Result<StatusCode, SendCodeError> {
    let usecase = SendVerificationCodeUseCase {
        tenants: state.tenant_repo(),
        customers: state.customer_repo(),
        codes: state.verification_code_repo(),
        limiter: state.send_limiter.clone(),
        email: state.email.clone(),
        clock: state.clock.clone(),
        conceal_account_existence: state.conceal_account_existence,
    };
    usecase
        .execute(SendVerificationCodeInput {
            tenant_id: body.tenant_id,
            email: body.email,
            locale: body.locale,
        })
        .await?;
    Ok(StatusCode::CREATED)
}

// ── POST /storefront/auth/session ─────────────────────────────────────────────

#[derive(Deserialize)]
pub struct VerifyCodeRequest {
    pub tenant_id: String,
    pub email: String,
    pub code: String,
}

#[derive(Serialize)]
pub struct VerifyCodeResponse {
    pub customer_id: CustomerId,
}

pub async fn verify_code(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(body): Json<VerifyCodeRequest>,
) -> Result<impl IntoResponse, VerifyCodeError> {
    let usecase = VerifyCodeUseCase {
        customers: state.customer_repo(),
        codes: state.verification_code_repo(),
        sessions: state.session_repo(),
        limiter: state.verify_limiter.clone(),
        clock: state.clock.clone(),
    };

    let out = usecase
        .execute(VerifyCodeInput {
            tenant_id: body.tenant_id,
            email: body.email,
            code: body.code,
        })
        .await?;

    let jar = set_session_cookie(
        jar,
        out.session.token,
        out.session.expires_at,
        state.cookie_secure,
    );

    Ok((
        StatusCode::CREATED,
        jar,
        Json(VerifyCodeResponse {
            customer_id: out.customer_id,
        }),
    ))
}
