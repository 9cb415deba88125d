use std::sync::Arc;

use sea_orm::DatabaseConnection;

use rentdesk_core::clock::Clock;

use crate::infra::db::{
    DbCustomerRepository, DbSessionRepository, DbTenantRepository, DbVerificationCodeRepository,
};
use crate::infra::email::AppEmailSender;
use crate::infra::rate_limit::AppRateLimiter;

/// Shared application state passed to every handler via axum `State`.
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    /// Limiter for code-send requests.
    pub send_limiter: AppRateLimiter,
    /// Limiter for code-verify attempts.
    pub verify_limiter: AppRateLimiter,
    pub email: AppEmailSender,
    pub clock: Arc<dyn Clock>,
    pub cookie_secure: bool,
    pub conceal_account_existence: bool,
}

impl AppState {
    pub fn tenant_repo(&self) -> DbTenantRepository {
        DbTenantRepository {
            db: self.db.clone(),
        }
    }

    pub fn customer_repo(&self) -> DbCustomerRepository {
        DbCustomerRepository {
            db: self.db.clone(),
        }
    }

    pub fn verification_code_repo(&self) -> DbVerificationCodeRepository {
        DbVerificationCodeRepository {
            db: self.db.clone(),
        }
    }

    pub fn session_repo(&self) -> DbSessionRepository {
        DbSessionRepository {
            db: self.db.clone(),
        }
    }
}
