//! Helper utilities for integration tests.

pub mod dataset;

pub use dataset::*;
