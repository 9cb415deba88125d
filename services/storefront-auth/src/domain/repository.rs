#![allow(async_fn_in_trait)]

use chrono::{DateTime, Utc};

use rentdesk_domain::id::{CustomerId, TenantId};
use rentdesk_domain::locale::Locale;

use crate::domain::types::{
    Customer, CustomerSession, RateLimitDecision, Tenant, TenantBranding, VerificationCode,
};

/// Read access to stores (tenants).
pub trait TenantRepository: Send + Sync {
    async fn find_by_id(&self, id: TenantId) -> anyhow::Result<Option<Tenant>>;
    async fn find_by_slug(&self, slug: &str) -> anyhow::Result<Option<Tenant>>;
}

/// Read access to storefront customers.
pub trait CustomerRepository: Send + Sync {
    /// `email` must already be normalized.
    async fn find_by_email(
        &self,
        tenant_id: TenantId,
        email: &str,
    ) -> anyhow::Result<Option<Customer>>;

    async fn find_by_id(&self, id: CustomerId) -> anyhow::Result<Option<Customer>>;
}

/// Repository for one-time verification codes.
pub trait VerificationCodeRepository: Send + Sync {
    async fn create(&self, code: &VerificationCode) -> anyhow::Result<()>;

    /// Atomically mark a matching, unused, unexpired code as used at `now`.
    ///
    /// Returns the consumed code, or `None` when nothing matched or a concurrent caller
    /// consumed it first. At most one caller can ever get `Some` for a given row.
    async fn consume(
        &self,
        tenant_id: TenantId,
        email: &str,
        code: &str,
        now: DateTime<Utc>,
    ) -> anyhow::Result<Option<VerificationCode>>;
}

/// Repository for customer sessions.
pub trait SessionRepository: Send + Sync {
    async fn create(&self, session: &CustomerSession) -> anyhow::Result<()>;

    /// Find a session by token that is still valid at `now`.
    async fn find_active(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> anyhow::Result<Option<CustomerSession>>;

    /// Delete a session. Returns `true` if a row was deleted.
    async fn delete_by_token(&self, token: &str) -> anyhow::Result<bool>;
}

/// Attempt counter with window + block semantics for one keyspace.
pub trait RateLimiter: Send + Sync {
    /// Record an attempt for `key` and decide whether it may proceed.
    async fn check(&self, key: &str) -> anyhow::Result<RateLimitDecision>;

    /// Forget all state for `key` (window, count and block).
    async fn reset(&self, key: &str) -> anyhow::Result<()>;
}

/// Outbound customer email.
pub trait EmailSender: Send + Sync {
    async fn send_verification_code(
        &self,
        to: &str,
        branding: &TenantBranding,
        code: &str,
        locale: Locale,
    ) -> anyhow::Result<()>;
}
