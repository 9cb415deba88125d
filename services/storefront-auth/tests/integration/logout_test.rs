use rentdesk_storefront_auth::error::LogoutError;
use rentdesk_storefront_auth::usecase::session::LogoutUseCase;

use crate::helpers::{CUSTOMER_EMAIL, FailingSessionRepo, Harness, TENANT_A, send_input, verify_input};

#[tokio::test]
async fn should_delete_session_on_logout() {
    let h = Harness::new();
    h.send_uc()
        .execute(send_input(TENANT_A, CUSTOMER_EMAIL))
        .await
        .unwrap();
    let code = h.codes.last_code();
    let token = h
        .verify_uc()
        .execute(verify_input(TENANT_A, CUSTOMER_EMAIL, &code))
        .await
        .unwrap()
        .session
        .token;

    h.logout_uc().execute(Some(&token)).await.unwrap();

    assert!(h.sessions.all().is_empty());
    assert!(h.session_uc().execute("velo-loc", Some(&token)).await.is_none());
}

#[tokio::test]
async fn should_succeed_without_cookie_or_with_unknown_token() {
    let h = Harness::new();

    h.logout_uc().execute(None).await.unwrap();
    h.logout_uc().execute(Some("already-gone")).await.unwrap();
}

#[tokio::test]
async fn should_surface_delete_failure() {
    let uc = LogoutUseCase {
        sessions: FailingSessionRepo,
    };

    let result = uc.execute(Some("token")).await;

    assert!(
        matches!(result, Err(LogoutError(_))),
        "expected LogoutError, got {result:?}"
    );
}
