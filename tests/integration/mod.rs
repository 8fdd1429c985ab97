//! Integration tests for Vitrine
//!
//! Exercise the storefront and its HTTP surface against wiremock backends.

pub mod catalog;
pub mod fallback;
pub mod markers;
pub mod routes;
