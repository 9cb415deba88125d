//! Cookie builders for the storefront customer session.

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::{DateTime, Utc};
use time::{Duration, OffsetDateTime};

/// Cookie name carrying the opaque customer-session token.
pub const CUSTOMER_SESSION_COOKIE: &str = "customer_session";

/// Set the customer-session cookie on the jar.
///
/// `expires` should be the session row's expiry so the browser drops the cookie when the
/// session stops being valid. `secure` is off only for plain-http local development.
///
/// ```
/// use axum_extra::extract::cookie::{CookieJar, SameSite};
/// use chrono::{TimeZone, Utc};
/// use rentdesk_auth_types::cookie::{set_session_cookie, CUSTOMER_SESSION_COOKIE};
///
/// let expires = Utc.with_ymd_and_hms(2026, 4, 1, 12, 0, 0).unwrap();
/// let jar = set_session_cookie(CookieJar::new(), "token_value".to_string(), expires, true);
/// let cookie = jar.get(CUSTOMER_SESSION_COOKIE).unwrap();
/// assert_eq!(cookie.value(), "token_value");
/// assert_eq!(cookie.path(), Some("/"));
/// assert_eq!(cookie.same_site(), Some(SameSite::Strict));
/// assert_eq!(cookie.expires_datetime().unwrap().unix_timestamp(), expires.timestamp());
/// assert!(cookie.http_only().unwrap_or(false));
/// assert!(cookie.secure().unwrap_or(false));
/// ```
pub fn set_session_cookie(
    jar: CookieJar,
    token: String,
    expires: DateTime<Utc>,
    secure: bool,
) -> CookieJar {
    let expires = OffsetDateTime::from_unix_timestamp(expires.timestamp())
        .unwrap_or(OffsetDateTime::UNIX_EPOCH);
    let cookie = Cookie::build((CUSTOMER_SESSION_COOKIE, token))
        .path("/")
        .expires(expires)
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Strict)
        .build();
    jar.add(cookie)
}

/// Clear the customer-session cookie by overwriting it with an empty value and Max-Age 0.
///
/// ```
/// use axum_extra::extract::cookie::CookieJar;
/// use chrono::Utc;
/// use rentdesk_auth_types::cookie::{clear_session_cookie, set_session_cookie, CUSTOMER_SESSION_COOKIE};
///
/// let jar = set_session_cookie(CookieJar::new(), "t".to_string(), Utc::now(), true);
/// let jar = clear_session_cookie(jar, true);
/// let cookie = jar.get(CUSTOMER_SESSION_COOKIE).unwrap();
/// assert_eq!(cookie.value(), "");
/// assert_eq!(cookie.max_age(), Some(time::Duration::ZERO));
/// ```
pub fn clear_session_cookie(jar: CookieJar, secure: bool) -> CookieJar {
    let cookie = Cookie::build((CUSTOMER_SESSION_COOKIE, ""))
        .path("/")
        .max_age(Duration::ZERO)
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Strict)
        .build();
    jar.add(cookie)
}

/// Read the session token from the request's cookies, ignoring empty values.
pub fn session_token(jar: &CookieJar) -> Option<String> {
    jar.get(CUSTOMER_SESSION_COOKIE)
        .map(|c| c.value().to_owned())
        .filter(|v| !v.is_empty())
}
