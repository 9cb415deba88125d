use chrono::Duration;

use rentdesk_core::clock::Clock;
use rentdesk_storefront_auth::error::VerifyCodeError;

use crate::helpers::{CUSTOMER_EMAIL, Harness, TENANT_A, TENANT_B, send_input, verify_input};

/// A six-digit code guaranteed to differ from `code`.
fn wrong_code(code: &str) -> String {
    let wrong = if code == "123456" { "654321" } else { "123456" };
    wrong.to_owned()
}

async fn issue_code(h: &Harness, tenant: &str) -> String {
    h.send_uc()
        .execute(send_input(tenant, CUSTOMER_EMAIL))
        .await
        .unwrap();
    h.codes.last_code()
}

#[tokio::test]
async fn should_sign_in_with_correct_code_and_reject_reuse() {
    let h = Harness::new();
    let code = issue_code(&h, TENANT_A).await;
    h.clock.advance(Duration::minutes(9));

    let out = h
        .verify_uc()
        .execute(verify_input(TENANT_A, CUSTOMER_EMAIL, &code))
        .await
        .unwrap();

    let customer = h.customer(TENANT_A);
    assert_eq!(out.customer_id, customer.id);
    assert_eq!(out.session.customer_id, customer.id);
    assert_eq!(out.session.expires_at - h.clock.now(), Duration::days(30));

    let sessions = h.sessions.all();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].token, out.session.token);

    let stored = &h.codes.all()[0];
    assert_eq!(stored.used_at, Some(h.clock.now()));

    let again = h
        .verify_uc()
        .execute(verify_input(TENANT_A, CUSTOMER_EMAIL, &code))
        .await;
    assert!(
        matches!(again, Err(VerifyCodeError::InvalidOrExpiredCode)),
        "expected InvalidOrExpiredCode on reuse, got {again:?}"
    );
    assert_eq!(h.sessions.all().len(), 1);
}

#[tokio::test]
async fn should_block_sixth_wrong_attempt_for_thirty_minutes() {
    let h = Harness::new();
    let code = issue_code(&h, TENANT_A).await;
    let wrong = wrong_code(&code);
    let uc = h.verify_uc();

    for attempt in 1..=5 {
        let result = uc.execute(verify_input(TENANT_A, CUSTOMER_EMAIL, &wrong)).await;
        assert!(
            matches!(result, Err(VerifyCodeError::InvalidOrExpiredCode)),
            "attempt {attempt}: expected InvalidOrExpiredCode, got {result:?}"
        );
        h.clock.advance(Duration::minutes(1));
    }

    let sixth = uc.execute(verify_input(TENANT_A, CUSTOMER_EMAIL, &wrong)).await;
    match sixth {
        Err(VerifyCodeError::RateLimited { retry_after_secs }) => {
            assert_eq!(retry_after_secs, 1800)
        }
        other => panic!("expected RateLimited, got {other:?}"),
    }

    // The correct code is refused too while the key is blocked.
    h.clock.advance(Duration::minutes(1));
    let blocked = uc.execute(verify_input(TENANT_A, CUSTOMER_EMAIL, &code)).await;
    match blocked {
        Err(VerifyCodeError::RateLimited { retry_after_secs }) => {
            assert_eq!(retry_after_secs, 1740)
        }
        other => panic!("expected RateLimited, got {other:?}"),
    }
    assert!(h.codes.all()[0].used_at.is_none());
}

#[tokio::test]
async fn should_reject_expired_code() {
    let h = Harness::new();
    let code = issue_code(&h, TENANT_A).await;
    h.clock.advance(Duration::minutes(10) + Duration::seconds(1));

    let result = h
        .verify_uc()
        .execute(verify_input(TENANT_A, CUSTOMER_EMAIL, &code))
        .await;

    assert!(
        matches!(result, Err(VerifyCodeError::InvalidOrExpiredCode)),
        "expected InvalidOrExpiredCode, got {result:?}"
    );
    assert!(h.sessions.all().is_empty());
}

#[tokio::test]
async fn should_reject_code_exactly_at_expiry() {
    let h = Harness::new();
    let code = issue_code(&h, TENANT_A).await;
    h.clock.advance(Duration::minutes(10));

    let result = h
        .verify_uc()
        .execute(verify_input(TENANT_A, CUSTOMER_EMAIL, &code))
        .await;

    assert!(matches!(result, Err(VerifyCodeError::InvalidOrExpiredCode)));
}

#[tokio::test]
async fn should_not_accept_code_issued_for_another_tenant() {
    let h = Harness::new();
    let code = issue_code(&h, TENANT_A).await;

    let result = h
        .verify_uc()
        .execute(verify_input(TENANT_B, CUSTOMER_EMAIL, &code))
        .await;

    assert!(matches!(result, Err(VerifyCodeError::InvalidOrExpiredCode)));
    assert!(h.codes.all()[0].used_at.is_none());
}

#[tokio::test]
async fn should_reject_malformed_code_without_consuming() {
    let h = Harness::new();
    issue_code(&h, TENANT_A).await;

    for code in ["", "12345", "1234567", "12a456", "１２３４５６"] {
        let result = h
            .verify_uc()
            .execute(verify_input(TENANT_A, CUSTOMER_EMAIL, code))
            .await;
        assert!(
            matches!(result, Err(VerifyCodeError::InvalidCode)),
            "expected InvalidCode for {code:?}, got {result:?}"
        );
    }
    assert!(h.codes.all()[0].used_at.is_none());
}

#[tokio::test]
async fn should_accept_code_with_surrounding_whitespace() {
    let h = Harness::new();
    let code = issue_code(&h, TENANT_A).await;

    h.verify_uc()
        .execute(verify_input(TENANT_A, " A@x.com", &format!(" {code}\n")))
        .await
        .unwrap();
}

#[tokio::test]
async fn should_reject_malformed_tenant() {
    let h = Harness::new();

    let result = h
        .verify_uc()
        .execute(verify_input("not-a-tenant", CUSTOMER_EMAIL, "123456"))
        .await;

    assert!(matches!(result, Err(VerifyCodeError::InvalidTenant)));
}

#[tokio::test]
async fn should_clear_failure_count_after_success() {
    let h = Harness::new();
    let code = issue_code(&h, TENANT_A).await;
    let wrong = wrong_code(&code);
    let uc = h.verify_uc();

    for _ in 0..4 {
        let _ = uc.execute(verify_input(TENANT_A, CUSTOMER_EMAIL, &wrong)).await;
    }
    uc.execute(verify_input(TENANT_A, CUSTOMER_EMAIL, &code))
        .await
        .unwrap();

    // A fresh budget of five attempts: none of these may be rate limited.
    for _ in 0..5 {
        let result = uc.execute(verify_input(TENANT_A, CUSTOMER_EMAIL, &wrong)).await;
        assert!(
            matches!(result, Err(VerifyCodeError::InvalidOrExpiredCode)),
            "expected InvalidOrExpiredCode, got {result:?}"
        );
    }
}

#[tokio::test]
async fn should_keep_older_code_usable_after_newer_is_consumed() {
    let h = Harness::new();
    let first = issue_code(&h, TENANT_A).await;
    h.clock.advance(Duration::minutes(1));
    let second = issue_code(&h, TENANT_A).await;

    // Both are valid independently; consuming one leaves the other usable.
    h.verify_uc()
        .execute(verify_input(TENANT_A, CUSTOMER_EMAIL, &second))
        .await
        .unwrap();
    if first != second {
        h.verify_uc()
            .execute(verify_input(TENANT_A, CUSTOMER_EMAIL, &first))
            .await
            .unwrap();
    }
    assert_eq!(h.sessions.all().len(), if first != second { 2 } else { 1 });
}

#[tokio::test]
async fn should_return_customer_not_found_when_account_vanished() {
    let h = Harness::new();
    let code = issue_code(&h, TENANT_A).await;

    let mut uc = h.verify_uc();
    uc.customers.customers.clear();

    let result = uc
        .execute(verify_input(TENANT_A, CUSTOMER_EMAIL, &code))
        .await;

    assert!(
        matches!(result, Err(VerifyCodeError::CustomerNotFound)),
        "expected CustomerNotFound, got {result:?}"
    );
    assert!(h.sessions.all().is_empty());
}
