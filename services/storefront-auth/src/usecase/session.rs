//! Customer session issuance, lookup and logout.

use std::sync::Arc;

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Duration, Utc};
use rand::RngExt;
use tracing::warn;
use uuid::Uuid;

use rentdesk_core::clock::Clock;
use rentdesk_domain::id::CustomerId;

use crate::domain::repository::{CustomerRepository, SessionRepository, TenantRepository};
use crate::domain::types::{Customer, CustomerSession, SESSION_TOKEN_BYTES, SESSION_TTL_DAYS};
use crate::error::LogoutError;

/// 256 bits from the thread-local CSPRNG, base64url without padding (43 chars).
pub fn generate_session_token() -> String {
    let bytes: [u8; SESSION_TOKEN_BYTES] = rand::rng().random();
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Build a session for `customer_id` starting at `now`.
pub fn new_session(customer_id: CustomerId, now: DateTime<Utc>) -> CustomerSession {
    CustomerSession {
        id: Uuid::new_v4(),
        customer_id,
        token: generate_session_token(),
        expires_at: now + Duration::days(SESSION_TTL_DAYS),
        created_at: now,
    }
}

// ── getCustomerSession ───────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct ResolvedSession {
    pub customer_id: CustomerId,
    pub customer: Customer,
    pub expires_at: DateTime<Utc>,
}

pub struct GetCustomerSessionUseCase<T, S, C>
where
    T: TenantRepository,
    S: SessionRepository,
    C: CustomerRepository,
{
    pub tenants: T,
    pub sessions: S,
    pub customers: C,
    pub clock: Arc<dyn Clock>,
}

impl<T, S, C> GetCustomerSessionUseCase<T, S, C>
where
    T: TenantRepository,
    S: SessionRepository,
    C: CustomerRepository,
{
    /// Resolve the signed-in customer for the storefront `slug`.
    ///
    /// Never errors: a missing cookie, unknown store, expired session, cross-tenant session or
    /// storage failure all come back as `None`.
    pub async fn execute(&self, slug: &str, token: Option<&str>) -> Option<ResolvedSession> {
        let token = token?;
        match self.resolve(slug, token).await {
            Ok(resolved) => resolved,
            Err(e) => {
                warn!(error = %e, slug, "session lookup failed; treating as signed out");
                None
            }
        }
    }

    async fn resolve(&self, slug: &str, token: &str) -> anyhow::Result<Option<ResolvedSession>> {
        let Some(tenant) = self.tenants.find_by_slug(slug).await? else {
            return Ok(None);
        };
        let Some(session) = self.sessions.find_active(token, self.clock.now()).await? else {
            return Ok(None);
        };
        let Some(customer) = self.customers.find_by_id(session.customer_id).await? else {
            return Ok(None);
        };
        if customer.tenant_id != tenant.id {
            warn!(
                slug,
                customer_id = %customer.id,
                "session presented to another store's storefront"
            );
            return Ok(None);
        }
        Ok(Some(ResolvedSession {
            customer_id: customer.id,
            customer,
            expires_at: session.expires_at,
        }))
    }
}

// ── logout ───────────────────────────────────────────────────────────────────

pub struct LogoutUseCase<S: SessionRepository> {
    pub sessions: S,
}

impl<S: SessionRepository> LogoutUseCase<S> {
    /// Delete the session behind `token`, if any. No token is still a successful logout.
    pub async fn execute(&self, token: Option<&str>) -> Result<(), LogoutError> {
        if let Some(token) = token {
            self.sessions.delete_by_token(token).await?;
        }
        Ok(())
    }
}
