//! Domain types shared across all Rentdesk services.
//!
//! This crate contains only pure types with no framework dependencies.

pub mod email;
pub mod id;
pub mod locale;
