#![warn(missing_docs, clippy::missing_docs_in_private_items)]

//! # Pricewise Settings
//!
//! Configuration is specified in several ways, with later methods overriding earlier ones.
//!
//! 1. A base configuration checked into the repository, in `config/base.yaml`.
//!    This provides the default values for most settings.
//! 2. Per-environment configuration files in the `config` directory. The
//!    environment is selected using the environment variable `PRICEWISE_ENV`.
//!    The settings for that environment are then loaded from
//!    `config/${env}.yaml`, if it exists. The default environment is
//!    "development". A "production" environment is also provided.
//! 3. A local configuration file not checked into the repository, at
//!    `config/local.yaml`. This file is in `.gitignore` and is safe to use for
//!    local configuration and secrets if desired.
//! 4. Environment variables that begin with `PRICEWISE_` and use `__` to
//!    separate levels. For example, `Settings::http::workers` can be controlled
//!    from the environment variable `PRICEWISE_HTTP__WORKERS`.
//! 5. If no SerpApi key was configured by any of the above, the environment
//!    variable `SERPAPI_KEY` is used.
//!
//! Tests should use `Settings::load_for_tests` which only reads from
//! `config/base.yaml`, `config/test.yaml`, and `config/local_test.yaml` (if it
//! exists). It does not read from environment variables.
//!
//! Configuration files are canonically YAML files.

mod logging;
mod serpapi;

pub use logging::{LogFormat, LogLevels, LoggingSettings};
pub use serpapi::{ApiKey, SerpApiSettings};

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

/// The environment variable older deployments use to provide the SerpApi key.
const LEGACY_API_KEY_VAR: &str = "SERPAPI_KEY";

/// Top level settings object for Pricewise.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[doc(inline)]
pub struct Settings {
    /// The environment Pricewise is running in. Should only be set with the
    /// `PRICEWISE_ENV` environment variable.
    pub env: String,

    /// Enable additional features to debug the application. This should not be
    /// set to true in production environments.
    pub debug: bool,

    /// Log the full search request, including the keyword the user searched
    /// for. This may include personally identifiable information, and so it is
    /// off by default.
    pub log_full_request: bool,

    /// URL to redirect to from the root of the service, if any.
    pub public_documentation: Option<String>,

    /// Settings for the HTTP server.
    pub http: HttpSettings,

    /// Settings for the upstream shopping search provider.
    pub serpapi: SerpApiSettings,

    /// Settings for the validation endpoint.
    pub validation: ValidationSettings,

    /// Logging settings.
    pub logging: LoggingSettings,

    /// Metrics settings.
    pub metrics: MetricsSettings,

    /// Sentry error reporting settings.
    pub sentry: SentrySettings,
}

/// Settings for the HTTP server.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HttpSettings {
    /// The host and port to listen on, such as "127.0.0.1:8080" or "0.0.0.0:80".
    pub listen: SocketAddr,

    /// The number of workers to use. Optional. If no value is provided, the
    /// number of logical cores will be used.
    pub workers: Option<usize>,
}

/// Settings for the validation endpoint.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ValidationSettings {
    /// The phone number reported by `/api/validate`.
    pub number: String,
}

/// Settings for the StatsD metrics sink.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MetricsSettings {
    /// The host to send metrics to.
    pub sink_host: String,

    /// The port to send metrics to.
    pub sink_port: u16,

    /// The maximum number of metrics to hold in memory before dropping new ones.
    pub max_queue_size: usize,
}

/// Settings for reporting errors to Sentry.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SentrySettings {
    /// The DSN to report errors to. If this is not set, Sentry is disabled.
    pub dsn: Option<String>,

    /// Log every event sent to Sentry.
    pub debug: bool,
}

impl Settings {
    /// Load settings from configuration files and environment variables.
    ///
    /// # Errors
    /// If any of the configured values are invalid, or if any of the required
    /// configuration files are missing.
    pub fn load() -> Result<Self, ConfigError> {
        let pricewise_env =
            std::env::var("PRICEWISE_ENV").unwrap_or_else(|_| "development".to_string());

        let config = Config::builder()
            // Start off with the base config.
            .add_source(File::with_name("./config/base"))
            // Merge in an environment specific config.
            .set_override("env", pricewise_env.as_str())?
            .add_source(File::with_name(&format!("config/{}", pricewise_env)).required(false))
            // Add a local configuration file that is `.gitignore`ed.
            .add_source(File::with_name("config/local").required(false))
            // Add environment variables that start with "PRICEWISE_" and have
            // "__" to separate levels. For example, `PRICEWISE_HTTP__LISTEN`
            // maps to `Settings::http::listen`.
            .add_source(
                Environment::with_prefix("PRICEWISE")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        let mut settings: Self = config.try_deserialize()?;
        if settings.serpapi.api_key.is_none() {
            settings.serpapi.api_key = std::env::var(LEGACY_API_KEY_VAR).ok().map(ApiKey::from);
        }
        settings.serpapi.discard_empty_api_key();
        Ok(settings)
    }

    /// Load settings from configuration files for tests.
    ///
    /// # Panics
    /// If the test configuration files can't be read or are invalid.
    #[must_use]
    pub fn load_for_tests() -> Self {
        let config_dir = concat!(env!("CARGO_MANIFEST_DIR"), "/../config");

        let config = Config::builder()
            // Start off with the base config.
            .add_source(File::with_name(&format!("{}/base", config_dir)))
            // Merge in test specific config.
            .set_override("env", "test")
            .expect("Could not set env for tests")
            .add_source(File::with_name(&format!("{}/test", config_dir)))
            // Add a local configuration file that is `.gitignore`ed.
            .add_source(File::with_name(&format!("{}/local_test", config_dir)).required(false))
            .build()
            .expect("Could not load settings for tests");

        let mut settings: Self = config
            .try_deserialize()
            .expect("Could not convert settings");
        settings.serpapi.discard_empty_api_key();
        settings
    }
}
