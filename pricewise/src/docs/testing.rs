//! # Testing strategies
//!
//! There are two major testing strategies used in this repository: unit tests,
//! and integration tests.
//!
//! Unit tests should appear close to the code they are testing, using standard
//! Rust unit tests. The ranking rules are checked with `proptest`, which
//! generates many random inputs and checks that every output obeys the price
//! and rating bounds and is ordered by value.
//!
//! Integration tests live in the `pricewise-integration-tests` crate. They
//! start a real server on a port chosen by the OS, point its SerpApi client at
//! an `httpmock` server, and make HTTP requests against the public API. See
//! [`pricewise_test`](../../pricewise_integration_tests/fn.pricewise_test.html)
//! for details.
//!
//! ```shell
//! $ cargo test --workspace
//! ```
