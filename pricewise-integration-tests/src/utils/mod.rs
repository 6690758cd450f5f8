//! Utilities for the integration tests.

pub mod test_tools;
