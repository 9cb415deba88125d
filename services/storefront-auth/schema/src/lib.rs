//! sea-orm entities for the storefront auth tables.

pub mod customer_sessions;
pub mod customers;
pub mod stores;
pub mod verification_codes;
