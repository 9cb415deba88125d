use anyhow::{Context as _, bail};
use chrono::Duration;

use crate::domain::types::RateLimitPolicy;
use crate::infra::rate_limit::DEFAULT_CLEANUP_INTERVAL_SECS;

/// Where rate-limit counters live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RateLimitBackend {
    /// Per-process table. Exact for a single replica only.
    Memory,
    /// Shared counters in Redis.
    Redis { url: String },
}

/// Transactional-mail API settings. Absent means codes are only logged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailApiConfig {
    pub url: String,
    pub api_key: String,
}

/// Storefront auth service configuration loaded from environment variables.
#[derive(Debug)]
pub struct StorefrontAuthConfig {
    /// PostgreSQL connection URL.
    pub database_url: String,
    /// TCP port to listen on (default 3120). Env var: `STOREFRONT_AUTH_PORT`.
    pub port: u16,
    /// `Secure` attribute on the session cookie. Off only for plain-http local development.
    pub cookie_secure: bool,
    pub rate_limit_backend: RateLimitBackend,
    pub send_code_limit: RateLimitPolicy,
    pub verify_code_limit: RateLimitPolicy,
    /// Sweep interval of the in-memory limiter table.
    pub rate_limit_cleanup: Duration,
    pub email_api: Option<EmailApiConfig>,
    /// Sender address; the store name is used as display name.
    pub email_from: String,
    /// Answer `sendVerificationCode` identically whether or not the account exists.
    pub conceal_account_existence: bool,
}

const DEFAULT_EMAIL_API_URL: &str = "https://api.resend.com/emails";

impl StorefrontAuthConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let database_url = var("DATABASE_URL").context("DATABASE_URL is required")?;

        let rate_limit_backend = match var("RATE_LIMIT_BACKEND").as_deref() {
            None | Some("memory") => RateLimitBackend::Memory,
            Some("redis") => RateLimitBackend::Redis {
                url: var("REDIS_URL").context("REDIS_URL is required for the redis backend")?,
            },
            Some(other) => bail!("unknown RATE_LIMIT_BACKEND {other:?}"),
        };

        let window = parse_secs_or(&var, "RATE_LIMIT_WINDOW_SECS", 900)?;
        let block = parse_secs_or(&var, "RATE_LIMIT_BLOCK_SECS", 1800)?;
        let send_code_limit = RateLimitPolicy {
            max_attempts: parse_or(&var, "SEND_CODE_MAX_ATTEMPTS", 3)?,
            window,
            block,
        };
        let verify_code_limit = RateLimitPolicy {
            max_attempts: parse_or(&var, "VERIFY_CODE_MAX_ATTEMPTS", 5)?,
            window,
            block,
        };

        let email_api = var("EMAIL_API_KEY").map(|api_key| EmailApiConfig {
            url: var("EMAIL_API_URL").unwrap_or_else(|| DEFAULT_EMAIL_API_URL.to_owned()),
            api_key,
        });

        Ok(Self {
            database_url,
            port: parse_or(&var, "STOREFRONT_AUTH_PORT", 3120)?,
            cookie_secure: parse_bool_or(&var, "COOKIE_SECURE", true)?,
            rate_limit_backend,
            send_code_limit,
            verify_code_limit,
            rate_limit_cleanup: parse_secs_or(
                &var,
                "RATE_LIMIT_CLEANUP_SECS",
                DEFAULT_CLEANUP_INTERVAL_SECS,
            )?,
            email_api,
            email_from: var("EMAIL_FROM").unwrap_or_else(|| "no-reply@rentdesk.app".to_owned()),
            conceal_account_existence: parse_bool_or(&var, "CONCEAL_ACCOUNT_EXISTENCE", false)?,
        })
    }
}

fn parse_or<T>(var: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match var(key) {
        Some(raw) => raw.trim().parse().with_context(|| format!("invalid {key}")),
        None => Ok(default),
    }
}

/// A strictly positive number of seconds.
fn parse_secs_or(
    var: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: i64,
) -> anyhow::Result<Duration> {
    let secs: i64 = parse_or(var, key, default)?;
    if secs <= 0 {
        bail!("{key} must be positive, got {secs}");
    }
    Duration::try_seconds(secs).with_context(|| format!("{key} is out of range: {secs}"))
}

fn parse_bool_or(
    var: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: bool,
) -> anyhow::Result<bool> {
    match var(key).map(|v| v.trim().to_ascii_lowercase()).as_deref() {
        None => Ok(default),
        Some("1" | "true" | "yes") => Ok(true),
        Some("0" | "false" | "no") => Ok(false),
        Some(other) => bail!("invalid {key}: {other:?}"),
    }
}
