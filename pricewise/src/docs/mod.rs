//! Documentation for Pricewise that isn't specific to one crate.

pub mod api;
pub mod testing;
