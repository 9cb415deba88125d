use chrono::{DateTime, Utc};

/// Source of the current time.
///
/// Anything that compares against "now" (expiries, rate-limit windows) reads it from a `Clock`
/// so tests can drive time explicitly.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
