use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use uuid::Uuid;

use rentdesk_domain::email::normalize_email;
use rentdesk_domain::id::{CustomerId, TenantId};

/// A rental store as seen by the login flow.
#[derive(Debug, Clone)]
pub struct Tenant {
    pub id: TenantId,
    pub slug: String,
    pub name: String,
    pub logo_url: Option<String>,
}

impl Tenant {
    pub fn branding(&self) -> TenantBranding {
        TenantBranding {
            name: self.name.clone(),
            logo_url: self.logo_url.clone(),
        }
    }
}

/// Store identity rendered into customer-facing emails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenantBranding {
    pub name: String,
    pub logo_url: Option<String>,
}

/// Storefront customer account.
#[derive(Debug, Clone, Serialize)]
pub struct Customer {
    pub id: CustomerId,
    pub tenant_id: TenantId,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

/// One-time login code. Valid only while unused and unexpired.
#[derive(Debug, Clone)]
pub struct VerificationCode {
    pub id: Uuid,
    pub tenant_id: TenantId,
    /// Normalized address the code was sent to.
    pub email: String,
    pub code: String,
    pub expires_at: DateTime<Utc>,
    pub used_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl VerificationCode {
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.used_at.is_none() && now < self.expires_at
    }
}

/// Logged-in storefront session.
#[derive(Debug, Clone)]
pub struct CustomerSession {
    pub id: Uuid,
    pub customer_id: CustomerId,
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl CustomerSession {
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

/// Thresholds for one rate-limit keyspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitPolicy {
    /// Attempts allowed per window; attempt `max_attempts + 1` triggers the block.
    pub max_attempts: u32,
    pub window: Duration,
    pub block: Duration,
}

impl RateLimitPolicy {
    /// Code-send requests: 3 per 15 minutes, then 30 minutes blocked.
    pub fn send_code() -> Self {
        Self {
            max_attempts: 3,
            window: Duration::minutes(15),
            block: Duration::minutes(30),
        }
    }

    /// Code-verify attempts: 5 per 15 minutes, then 30 minutes blocked.
    pub fn verify_code() -> Self {
        Self {
            max_attempts: 5,
            window: Duration::minutes(15),
            block: Duration::minutes(30),
        }
    }
}

/// Outcome of a rate-limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitDecision {
    Allowed,
    Limited { retry_after_secs: u64 },
}

impl RateLimitDecision {
    pub fn is_allowed(self) -> bool {
        matches!(self, Self::Allowed)
    }
}

/// Rate-limit key for one customer of one store.
pub fn rate_limit_key(tenant_id: TenantId, email: &str) -> String {
    format!("{}:{}", tenant_id, normalize_email(email))
}

/// True for exactly six ASCII digits.
pub fn is_well_formed_code(code: &str) -> bool {
    code.len() == VERIFICATION_CODE_LEN && code.bytes().all(|b| b.is_ascii_digit())
}

/// Verification code length in digits.
pub const VERIFICATION_CODE_LEN: usize = 6;

/// Value of the `type` column for emailed login codes.
pub const VERIFICATION_CODE_TYPE: &str = "code";

/// Verification code time-to-live in seconds (10 minutes).
pub const VERIFICATION_CODE_TTL_SECS: i64 = 600;

/// Customer session lifetime in days.
pub const SESSION_TTL_DAYS: i64 = 30;

/// Random bytes in a session token before encoding.
pub const SESSION_TOKEN_BYTES: usize = 32;
