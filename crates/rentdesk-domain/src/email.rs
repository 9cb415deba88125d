//! Email address helpers.

/// Canonical form used for lookups and rate-limit keys: trimmed and lowercased.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
