//! Service plumbing shared by Rentdesk HTTP services.

pub mod clock;
pub mod health;
pub mod middleware;
pub mod serde;
pub mod tracing;
