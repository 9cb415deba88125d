use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};

/// Failures of `sendVerificationCode`.
#[derive(Debug, thiserror::Error)]
pub enum SendCodeError {
    #[error("invalid tenant")]
    InvalidTenant,
    #[error("too many requests")]
    RateLimited { retry_after_secs: u64 },
    #[error("tenant not found")]
    TenantNotFound,
    #[error("no account for email")]
    NoAccountForEmail,
    #[error("failed to send code")]
    Send(#[from] anyhow::Error),
}

impl SendCodeError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidTenant => "INVALID_TENANT",
            Self::RateLimited { .. } => "RATE_LIMITED",
            Self::TenantNotFound => "TENANT_NOT_FOUND",
            Self::NoAccountForEmail => "NO_ACCOUNT_FOR_EMAIL",
            Self::Send(_) => "SEND_ERROR",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::InvalidTenant => StatusCode::BAD_REQUEST,
            Self::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::TenantNotFound | Self::NoAccountForEmail => StatusCode::NOT_FOUND,
            Self::Send(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for SendCodeError {
    fn into_response(self) -> Response {
        if let Self::Send(ref e) = self {
            tracing::error!(error = %e, kind = self.kind(), "send verification code failed");
        }
        let retry_after = match self {
            Self::RateLimited { retry_after_secs } => Some(retry_after_secs),
            _ => None,
        };
        error_response(self.status(), self.kind(), &self.to_string(), retry_after)
    }
}

/// Failures of `verifyCode`.
#[derive(Debug, thiserror::Error)]
pub enum VerifyCodeError {
    #[error("invalid tenant")]
    InvalidTenant,
    #[error("too many attempts")]
    RateLimited { retry_after_secs: u64 },
    #[error("invalid code")]
    InvalidCode,
    /// Wrong, expired and already-used codes all map here.
    #[error("invalid or expired code")]
    InvalidOrExpiredCode,
    #[error("customer not found")]
    CustomerNotFound,
    #[error("verification failed")]
    Verification(#[from] anyhow::Error),
}

impl VerifyCodeError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidTenant => "INVALID_TENANT",
            Self::RateLimited { .. } => "RATE_LIMITED",
            Self::InvalidCode => "INVALID_CODE",
            Self::InvalidOrExpiredCode => "INVALID_OR_EXPIRED_CODE",
            Self::CustomerNotFound => "CUSTOMER_NOT_FOUND",
            Self::Verification(_) => "VERIFICATION_ERROR",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::InvalidTenant | Self::InvalidCode => StatusCode::BAD_REQUEST,
            Self::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::InvalidOrExpiredCode => StatusCode::UNAUTHORIZED,
            Self::CustomerNotFound => StatusCode::NOT_FOUND,
            Self::Verification(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for VerifyCodeError {
    fn into_response(self) -> Response {
        if let Self::Verification(ref e) = self {
            tracing::error!(error = %e, kind = self.kind(), "verify code failed");
        }
        let retry_after = match self {
            Self::RateLimited { retry_after_secs } => Some(retry_after_secs),
            _ => None,
        };
        error_response(self.status(), self.kind(), &self.to_string(), retry_after)
    }
}

/// Failure of `logout`: only the session delete itself can fail.
#[derive(Debug, thiserror::Error)]
#[error("logout failed")]
pub struct LogoutError(#[from] pub anyhow::Error);

impl LogoutError {
    pub fn kind(&self) -> &'static str {
        "LOGOUT_ERROR"
    }
}

impl IntoResponse for LogoutError {
    fn into_response(self) -> Response {
        tracing::error!(error = %self.0, kind = self.kind(), "logout failed");
        error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            self.kind(),
            &self.to_string(),
            None,
        )
    }
}

/// JSON error body `{kind, message[, retry_after]}`, plus `Retry-After` when rate limited.
///
/// 4xx are expected client outcomes and are not logged here; tower-http's TraceLayer already
/// records method/uri/status for every request.
fn error_response(
    status: StatusCode,
    kind: &'static str,
    message: &str,
    retry_after: Option<u64>,
) -> Response {
    let mut body = serde_json::json!({
        "kind": kind,
        "message": message,
    });
    if let Some(secs) = retry_after {
        body["retry_after"] = secs.into();
    }
    let mut response = (status, axum::Json(body)).into_response();
    if let Some(secs) = retry_after {
        response
            .headers_mut()
            .insert(header::RETRY_AFTER, HeaderValue::from(secs));
    }
    response
}
