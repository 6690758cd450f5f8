//! Settings for the SerpApi shopping search integration.

use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DurationMilliSeconds};
use std::{fmt, time::Duration};

/// Settings for the SerpApi Google Shopping provider.
#[serde_as]
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SerpApiSettings {
    /// The URL of the SerpApi search endpoint.
    pub endpoint: String,

    /// The key to authenticate to SerpApi with. If this is not set, search
    /// requests are rejected, but the server still starts.
    pub api_key: Option<ApiKey>,

    /// How long to wait to establish a connection to SerpApi.
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    #[serde(rename = "connect_timeout_ms")]
    pub connect_timeout: Duration,

    /// How long to wait for SerpApi to respond to a search, in total.
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    #[serde(rename = "timeout_ms")]
    pub timeout: Duration,
}

impl SerpApiSettings {
    /// Treat a blank key as no key at all. Environment variables are often
    /// "unset" by setting them to an empty string.
    pub(crate) fn discard_empty_api_key(&mut self) {
        if self.api_key.as_ref().map_or(false, |key| key.0.is_empty()) {
            self.api_key = None;
        }
    }
}

impl Default for SerpApiSettings {
    fn default() -> Self {
        Self {
            endpoint: "https://serpapi.com/search.json".to_string(),
            api_key: None,
            connect_timeout: Duration::from_secs(2),
            timeout: Duration::from_secs(10),
        }
    }
}

/// A secret API key. Its value is hidden from `Debug` output so that it
/// doesn't leak into logs.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApiKey(String);

impl ApiKey {
    /// Access the secret value.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl From<String> for ApiKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}

impl From<&str> for ApiKey {
    fn from(key: &str) -> Self {
        Self(key.to_string())
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(**redacted**)")
    }
}
