//! Email one-time-code issuance and verification.

use std::sync::Arc;

use chrono::Duration;
use rand::RngExt;
use tracing::{info, warn};
use uuid::Uuid;

use rentdesk_core::clock::Clock;
use rentdesk_domain::email::normalize_email;
use rentdesk_domain::id::{CustomerId, TenantId};
use rentdesk_domain::locale::Locale;

use crate::domain::repository::{
    CustomerRepository, EmailSender, RateLimiter, SessionRepository, TenantRepository,
    VerificationCodeRepository,
};
use crate::domain::types::{
    CustomerSession, RateLimitDecision, VERIFICATION_CODE_TTL_SECS, VerificationCode,
    is_well_formed_code, rate_limit_key,
};
use crate::error::{SendCodeError, VerifyCodeError};
use crate::usecase::session::new_session;

/// Uniform six-digit code in `100000..=999999`.
pub fn generate_code() -> String {
    let n: u32 = rand::rng().random_range(100_000..=999_999);
    n.to_string()
}

// ── sendVerificationCode ─────────────────────────────────────────────────────

pub struct SendVerificationCodeInput {
    pub tenant_id: String,
    pub email: String,
    pub locale: Option<String>,
}

pub struct SendVerificationCodeUseCase<T, C, V, L, E>
where
    T: TenantRepository,
    C: CustomerRepository,
    V: VerificationCodeRepository,
    L: RateLimiter,
    E: EmailSender,
{
    pub tenants: T,
    pub customers: C,
    pub codes: V,
    /// Send-code keyspace.
    pub limiter: L,
    pub email: E,
    pub clock: Arc<dyn Clock>,
    /// Report success instead of `NoAccountForEmail` so callers cannot discover which emails have accounts.
    pub conceal_account_existence: bool,
}

impl<T, C, V, L, E> SendVerificationCodeUseCase<T, C, V, L, E>
where
    T: TenantRepository,
    C: CustomerRepository,
    V: VerificationCodeRepository,
    L: RateLimiter,
    E: EmailSender,
{
    pub async fn execute(&self, input: SendVerificationCodeInput) -> Result<(), SendCodeError> {
        // 1. Reject malformed tenant ids before touching anything else
        let tenant_id: TenantId = input
            .tenant_id
            .parse()
            .map_err(|_| SendCodeError::InvalidTenant)?;
        let email = normalize_email(&input.email);
        let locale = Locale::from_optional(input.locale.as_deref());

        // 2. Rate limit per (tenant, email)
        let key = rate_limit_key(tenant_id, &email);
        if let RateLimitDecision::Limited { retry_after_secs } = self.limiter.check(&key).await? {
            return Err(SendCodeError::RateLimited { retry_after_secs });
        }

        // 3. Tenant and customer must exist
        let tenant = self
            .tenants
            .find_by_id(tenant_id)
            .await?
            .ok_or(SendCodeError::TenantNotFound)?;

        let Some(customer) = self.customers.find_by_email(tenant_id, &email).await? else {
            if self.conceal_account_existence {
                info!(%tenant_id, "verification code requested for unknown email");
                return Ok(());
            }
            return Err(SendCodeError::NoAccountForEmail);
        };

        // 4. Persist the code before attempting delivery
        let now = self.clock.now();
        let code = VerificationCode {
            id: Uuid::new_v4(),
            tenant_id,
            email,
            code: generate_code(),
            expires_at: now + Duration::seconds(VERIFICATION_CODE_TTL_SECS),
            used_at: None,
            created_at: now,
        };
        self.codes.create(&code).await?;

        // 5. Best-effort delivery: the stored code stays usable if the provider hiccups
        if let Err(e) = self
            .email
            .send_verification_code(&customer.email, &tenant.branding(), &code.code, locale)
            .await
        {
            warn!(
                error = %e,
                %tenant_id,
                code_id = %code.id,
                "verification email dispatch failed"
            );
        }
        Ok(())
    }
}

// ── verifyCode ───────────────────────────────────────────────────────────────

pub struct VerifyCodeInput {
    pub tenant_id: String,
    pub email: String,
    pub code: String,
}

#[derive(Debug)]
pub struct VerifyCodeOutput {
    pub customer_id: CustomerId,
    /// Freshly created session; the caller turns it into the session cookie.
    pub session: CustomerSession,
}

pub struct VerifyCodeUseCase<C, V, S, L>
where
    C: CustomerRepository,
    V: VerificationCodeRepository,
    S: SessionRepository,
    L: RateLimiter,
{
    pub customers: C,
    pub codes: V,
    pub sessions: S,
    /// Verify-code keyspace.
    pub limiter: L,
    pub clock: Arc<dyn Clock>,
}

impl<C, V, S, L> VerifyCodeUseCase<C, V, S, L>
where
    C: CustomerRepository,
    V: VerificationCodeRepository,
    S: SessionRepository,
    L: RateLimiter,
{
    pub async fn execute(&self, input: VerifyCodeInput) -> Result<VerifyCodeOutput, VerifyCodeError> {
        let tenant_id: TenantId = input
            .tenant_id
            .parse()
            .map_err(|_| VerifyCodeError::InvalidTenant)?;
        let email = normalize_email(&input.email);

        // Every attempt counts, including the one that finally succeeds.
        let key = rate_limit_key(tenant_id, &email);
        if let RateLimitDecision::Limited { retry_after_secs } = self.limiter.check(&key).await? {
            return Err(VerifyCodeError::RateLimited { retry_after_secs });
        }

        let code = input.code.trim();
        if !is_well_formed_code(code) {
            return Err(VerifyCodeError::InvalidCode);
        }

        let now = self.clock.now();
        self.codes
            .consume(tenant_id, &email, code, now)
            .await?
            .ok_or(VerifyCodeError::InvalidOrExpiredCode)?;

        if let Err(e) = self.limiter.reset(&key).await {
            warn!(error = %e, %tenant_id, "failed to reset verify rate limit");
        }

        let customer = self
            .customers
            .find_by_email(tenant_id, &email)
            .await?
            .ok_or(VerifyCodeError::CustomerNotFound)?;

        let session = new_session(customer.id, now);
        self.sessions.create(&session).await?;

        info!(%tenant_id, customer_id = %customer.id, "customer signed in");
        Ok(VerifyCodeOutput {
            customer_id: customer.id,
            session,
        })
    }
}
