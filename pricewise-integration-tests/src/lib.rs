#![warn(missing_docs, clippy::missing_docs_in_private_items)]
// None of the tests are seen by the linter, so none of the utilities are marked
// as used. But docs don't generate for the below if they are `#[cfg(test)]`.
// This is a compromise.
#![allow(dead_code)]

//! Tests for Pricewise that work by reading from the external API only.
//!
//! Since the URL endpoints Pricewise exposes to the world are its public API,
//! and other systems depend on them, the paths used in tests here are
//! important details, and used to keep compatibility.
//!
//! This is structured as a separate crate so that it produces a single test
//! binary instead of one test per file like would happen if this were
//! `pricewise/tests/...`. This improves compilation and test times.
//!
//! The primary tool used by tests is [`pricewise_test`], which creates a mock
//! SerpApi server, sets up the application for testing, and then calls the
//! test function that is passed to it, providing a client for the running
//! server and the mock as an argument.
//!
//! ```
//! use pricewise_integration_tests::{pricewise_test, TestingTools};
//! use reqwest::StatusCode;
//!
//! #[actix_rt::test]
//! async fn lbheartbeat_works() {
//!     pricewise_test(
//!         |_| (),
//!         |TestingTools { test_client, .. }| async move {
//!             let response = test_client
//!                 .get("/__lbheartbeat__")
//!                 .send()
//!                 .await
//!                 .expect("failed to execute request");
//!
//!             assert_eq!(response.status(), StatusCode::OK);
//!         },
//!     )
//!     .await
//! }
//! ```

mod dockerflow;
mod general;
mod search;
mod utils;
mod validate;

pub use crate::utils::test_tools::{pricewise_test, TestReqwestClient, TestingTools};
