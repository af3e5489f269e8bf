//! Common test utilities and helpers
//!
//! This module provides shared utilities for all tests including:
//! - Session registry and router fixtures
//! - Custom assertion macros

pub mod assertions;
#[cfg(feature = "ssr")]
pub mod fixtures;

// Re-export commonly used utilities
pub use assertions::*;
#[cfg(feature = "ssr")]
pub use fixtures::*;
