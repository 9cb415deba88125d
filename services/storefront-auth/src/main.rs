use std::sync::Arc;

use anyhow::Context as _;
use sea_orm::Database;
use tracing::info;

use rentdesk_core::clock::{Clock, SystemClock};
use rentdesk_core::tracing::init_tracing;
use rentdesk_storefront_auth::config::{RateLimitBackend, StorefrontAuthConfig};
use rentdesk_storefront_auth::infra::email::{AppEmailSender, HttpEmailSender, LogEmailSender};
use rentdesk_storefront_auth::infra::rate_limit::{
    AppRateLimiter, InMemoryRateLimiter, RedisRateLimiter,
};
use rentdesk_storefront_auth::router::build_router;
use rentdesk_storefront_auth::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing("info,sqlx=warn");

    let config = StorefrontAuthConfig::from_env()?;
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let db = Database::connect(&config.database_url)
        .await
        .context("failed to connect to database")?;

    let (send_limiter, verify_limiter) = match &config.rate_limit_backend {
        RateLimitBackend::Memory => {
            info!("rate limiting with the in-process table");
            (
                AppRateLimiter::Memory(Arc::new(InMemoryRateLimiter::with_cleanup_interval(
                    config.send_code_limit,
                    config.rate_limit_cleanup,
                    clock.clone(),
                ))),
                AppRateLimiter::Memory(Arc::new(InMemoryRateLimiter::with_cleanup_interval(
                    config.verify_code_limit,
                    config.rate_limit_cleanup,
                    clock.clone(),
                ))),
            )
        }
        RateLimitBackend::Redis { url } => {
            info!("rate limiting with redis");
            let pool = deadpool_redis::Config::from_url(url)
                .create_pool(Some(deadpool_redis::Runtime::Tokio1))
                .context("failed to create Redis pool")?;
            (
                AppRateLimiter::Redis(RedisRateLimiter::new(
                    pool.clone(),
                    config.send_code_limit,
                    "send",
                )),
                AppRateLimiter::Redis(RedisRateLimiter::new(
                    pool,
                    config.verify_code_limit,
                    "verify",
                )),
            )
        }
    };

    let email = match &config.email_api {
        Some(api) => AppEmailSender::Http(HttpEmailSender::new(
            api.url.clone(),
            api.api_key.clone(),
            config.email_from.clone(),
        )?),
        None => {
            info!("EMAIL_API_KEY not set; verification codes are logged instead of sent");
            AppEmailSender::Log(LogEmailSender)
        }
    };

    let state = AppState {
        db,
        send_limiter,
        verify_limiter,
        email,
        clock,
        cookie_secure: config.cookie_secure,
        conceal_account_existence: config.conceal_account_existence,
    };

    let router = build_router(state);
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    info!("storefront auth service listening on {addr}");
    axum::serve(listener, router).await.context("server error")?;
    Ok(())
}
