#![warn(missing_docs, clippy::missing_docs_in_private_items)]

//! A client for the [SerpApi](https://serpapi.com/) Google Shopping engine.

use anyhow::Context;
use pricewise_ranker::RawResult;
use pricewise_settings::{ApiKey, SerpApiSettings};
use serde::Deserialize;
use thiserror::Error;

/// User-Agent sent to SerpApi.
const REQWEST_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// The SerpApi engine to query.
const ENGINE: &str = "google_shopping";

/// The interface language of the results.
const LANGUAGE: &str = "en";

/// The country to search from.
const COUNTRY: &str = "in";

/// Errors that can happen while searching for products.
#[derive(Debug, Error)]
pub enum SerpApiError {
    /// SerpApi could not be reached, or didn't respond in time.
    #[error("API request failed: {0}")]
    Network(#[source] reqwest::Error),

    /// SerpApi responded with a non-success status code.
    #[error("API request failed with status {0}")]
    Status(u16),

    /// The response body was not the expected shape. This includes JSON
    /// numbers too large for an `f64`, which the JSON parser rejects before
    /// any lenient field handling sees them.
    #[error("Malformed API response: {0}")]
    Malformed(#[from] serde_json::Error),

    /// The response had no results, but explained why.
    #[error("API responded with an error: {0}")]
    Upstream(String),

    /// The response had no results, and no explanation.
    #[error("API response did not include 'shopping_results'")]
    MissingResults,
}

impl SerpApiError {
    /// Wrap a transport error. The request URL carries the API key, so it is
    /// stripped from the error.
    fn network(error: reqwest::Error) -> Self {
        Self::Network(error.without_url())
    }
}

/// The parts of a SerpApi response that Pricewise uses.
#[derive(Debug, Deserialize)]
struct ShoppingResponse {
    /// The product results. SerpApi leaves this out entirely when there is
    /// nothing to show.
    #[serde(default)]
    shopping_results: Option<Vec<RawResult>>,

    /// A human readable explanation of a failed search.
    #[serde(default)]
    error: Option<String>,
}

/// Searches SerpApi's Google Shopping engine.
#[derive(Debug, Clone)]
pub struct ShoppingClient {
    /// The HTTP client to query SerpApi with.
    client: reqwest::Client,

    /// The URL of the search endpoint.
    endpoint: String,
}

impl ShoppingClient {
    /// Create a client from settings.
    ///
    /// # Errors
    /// If the underlying HTTP client can't be created.
    pub fn new(settings: &SerpApiSettings) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.timeout)
            .user_agent(REQWEST_USER_AGENT)
            .build()
            .context("Unable to create the Reqwest client")?;

        Ok(Self {
            client,
            endpoint: settings.endpoint.clone(),
        })
    }

    /// Search for products matching `keyword`.
    ///
    /// Results are returned in the order SerpApi provides them.
    ///
    /// # Errors
    /// If SerpApi can't be reached, responds with an error status, or responds
    /// with something other than a list of shopping results.
    pub async fn search(
        &self,
        api_key: &ApiKey,
        keyword: &str,
    ) -> Result<Vec<RawResult>, SerpApiError> {
        tracing::debug!(
            r#type = "serpapi.request",
            endpoint = %self.endpoint,
            engine = ENGINE,
            "Searching SerpApi"
        );

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("api_key", api_key.expose()),
                ("engine", ENGINE),
                ("q", keyword),
                ("hl", LANGUAGE),
                ("gl", COUNTRY),
            ])
            .send()
            .await
            .map_err(SerpApiError::network)?;

        let status = response.status();
        if !status.is_success() {
            return Err(SerpApiError::Status(status.as_u16()));
        }

        let body = response.bytes().await.map_err(SerpApiError::network)?;
        let parsed: ShoppingResponse = serde_json::from_slice(&body)?;

        match parsed {
            ShoppingResponse {
                shopping_results: Some(results),
                ..
            } => {
                tracing::debug!(
                    r#type = "serpapi.response",
                    result_count = results.len(),
                    "Received shopping results"
                );
                Ok(results)
            }
            ShoppingResponse {
                error: Some(message),
                ..
            } => Err(SerpApiError::Upstream(message)),
            _ => Err(SerpApiError::MissingResults),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{SerpApiError, ShoppingClient};
    use httpmock::{Method::GET, MockServer};
    use pretty_assertions::assert_eq;
    use pricewise_settings::{ApiKey, SerpApiSettings};
    use serde_json::json;
    use std::time::Duration;

    fn client_for(server: &MockServer) -> ShoppingClient {
        let settings = SerpApiSettings {
            endpoint: server.url("/search.json"),
            ..SerpApiSettings::default()
        };
        ShoppingClient::new(&settings).expect("client should build")
    }

    #[tokio::test]
    async fn sends_the_expected_query() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/search.json")
                    .query_param("api_key", "secret")
                    .query_param("engine", "google_shopping")
                    .query_param("q", "usb c cable")
                    .query_param("hl", "en")
                    .query_param("gl", "in");
                then.status(200).json_body(json!({
                    "shopping_results": [
                        { "title": "Cable", "extracted_price": 199, "rating": 4.2 }
                    ]
                }));
            })
            .await;

        let results = client_for(&server)
            .search(&ApiKey::from("secret"), "usb c cable")
            .await
            .expect("search should succeed");

        mock.assert_async().await;
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].title.as_deref(), Some("Cable"));
        assert_eq!(results[0].extracted_price.value(), 199.0);
    }

    #[tokio::test]
    async fn malformed_fields_do_not_fail_the_search() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/search.json");
                then.status(200).json_body(json!({
                    "shopping_results": [
                        { "title": "A", "extracted_price": "n/a", "rating": { "stars": 4 } },
                        { "title": "B" }
                    ]
                }));
            })
            .await;

        let results = client_for(&server)
            .search(&ApiKey::from("secret"), "anything")
            .await
            .expect("search should succeed");

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].extracted_price.value(), 0.0);
        assert_eq!(results[0].rating.value(), 0.0);
    }

    #[tokio::test]
    async fn error_statuses_are_reported() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/search.json");
                then.status(503);
            })
            .await;

        let error = client_for(&server)
            .search(&ApiKey::from("secret"), "anything")
            .await
            .expect_err("search should fail");

        assert!(matches!(error, SerpApiError::Status(503)));
        assert_eq!(error.to_string(), "API request failed with status 503");
    }

    #[tokio::test]
    async fn missing_results_are_an_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/search.json");
                then.status(200)
                    .json_body(json!({ "search_metadata": { "status": "Success" } }));
            })
            .await;

        let error = client_for(&server)
            .search(&ApiKey::from("secret"), "anything")
            .await
            .expect_err("search should fail");

        assert!(matches!(error, SerpApiError::MissingResults));
    }

    #[tokio::test]
    async fn upstream_explanations_are_surfaced() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/search.json");
                then.status(200).json_body(json!({
                    "error": "Google hasn't returned any results for this query."
                }));
            })
            .await;

        let error = client_for(&server)
            .search(&ApiKey::from("secret"), "anything")
            .await
            .expect_err("search should fail");

        assert_eq!(
            error.to_string(),
            "API responded with an error: Google hasn't returned any results for this query."
        );
    }

    #[tokio::test]
    async fn non_json_bodies_are_malformed() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/search.json");
                then.status(200).body("<html>not json</html>");
            })
            .await;

        let error = client_for(&server)
            .search(&ApiKey::from("secret"), "anything")
            .await
            .expect_err("search should fail");

        assert!(matches!(error, SerpApiError::Malformed(_)));
    }

    #[tokio::test]
    async fn results_that_are_not_a_list_are_malformed() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/search.json");
                then.status(200)
                    .json_body(json!({ "shopping_results": { "title": "A" } }));
            })
            .await;

        let error = client_for(&server)
            .search(&ApiKey::from("secret"), "anything")
            .await
            .expect_err("search should fail");

        assert!(matches!(error, SerpApiError::Malformed(_)));
    }

    #[tokio::test]
    async fn slow_responses_time_out() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/search.json");
                then.status(200)
                    .delay(Duration::from_secs(2))
                    .json_body(json!({ "shopping_results": [] }));
            })
            .await;
        let settings = SerpApiSettings {
            endpoint: server.url("/search.json"),
            timeout: Duration::from_millis(100),
            ..SerpApiSettings::default()
        };

        let error = ShoppingClient::new(&settings)
            .expect("client should build")
            .search(&ApiKey::from("secret"), "anything")
            .await
            .expect_err("search should time out");

        match error {
            SerpApiError::Network(error) => assert!(error.is_timeout()),
            other => panic!("expected a network error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn network_errors_do_not_reveal_the_api_key() {
        let settings = SerpApiSettings {
            endpoint: "http://127.0.0.1:1/search.json".to_string(),
            ..SerpApiSettings::default()
        };

        let error = ShoppingClient::new(&settings)
            .expect("client should build")
            .search(&ApiKey::from("very-secret"), "anything")
            .await
            .expect_err("search should fail");

        assert!(matches!(error, SerpApiError::Network(_)));
        assert!(error.to_string().starts_with("API request failed: "));
        assert!(!format!("{} {:?}", error, error).contains("very-secret"));
    }

    #[tokio::test]
    async fn numbers_too_large_for_a_float_are_malformed() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/search.json");
                then.status(200)
                    .header("content-type", "application/json")
                    .body(r#"{"shopping_results": [{"title": "A", "extracted_price": 1e400}]}"#);
            })
            .await;

        let error = client_for(&server)
            .search(&ApiKey::from("secret"), "anything")
            .await
            .expect_err("search should fail");

        assert!(matches!(error, SerpApiError::Malformed(_)));
    }
}
