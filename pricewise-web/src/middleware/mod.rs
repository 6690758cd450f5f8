//! Middlewares specific to Pricewise.

mod metrics;
mod sentry;

pub use self::metrics::Metrics;
pub use self::sentry::Sentry;
