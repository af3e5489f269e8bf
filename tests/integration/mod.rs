//! Integration tests

pub mod config_test;
#[cfg(feature = "ssr")]
pub mod coordinator_test;
#[cfg(feature = "ssr")]
pub mod router_test;
#[cfg(feature = "ssr")]
pub mod store_test;
