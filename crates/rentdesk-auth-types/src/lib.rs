//! Auth types shared across Rentdesk services.
//!
//! Provides the storefront customer-session cookie builders.

pub mod cookie;
