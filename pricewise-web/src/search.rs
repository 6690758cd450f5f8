//! Web handlers for the shopping search API.

use crate::errors::{HandlerError, HandlerErrorKind};
use actix_web::{
    get,
    web::{self, Data, ServiceConfig},
    HttpResponse,
};
use cadence::{CountedExt, Histogrammed, StatsdClient};
use pricewise_ranker::{rank, FilterCriteria};
use pricewise_serpapi::ShoppingClient;
use pricewise_settings::Settings;

/// Configure a route to use the search service.
pub fn configure(config: &mut ServiceConfig) {
    config.service(search);
}

/// Search for products, and rank them by value for money.
#[get("/search")]
#[tracing::instrument(skip_all)]
async fn search(
    query_pairs: web::Query<Vec<(String, String)>>,
    shopping_client: Data<ShoppingClient>,
    metrics_client: Data<StatsdClient>,
    settings: Data<Settings>,
) -> Result<HttpResponse, HandlerError> {
    let query_parameters = SearchQueryParameters::from_pairs(query_pairs.into_inner());
    safe_log_request(settings.log_full_request, &query_parameters);

    let (keyword, max_price, api_key) = match (
        non_empty(query_parameters.keyword.as_deref()),
        non_empty(query_parameters.max_price.as_deref()),
        settings.serpapi.api_key.as_ref(),
    ) {
        (Some(keyword), Some(max_price), Some(api_key)) => (keyword, max_price, api_key),
        _ => return Err(HandlerErrorKind::MissingParameters.into()),
    };

    let criteria = FilterCriteria {
        min_price: parse_bound(query_parameters.min_price.as_deref())?,
        max_price: parse_number(max_price)?,
        min_rating: parse_bound(query_parameters.min_rating.as_deref())?,
    };

    let raw_results = shopping_client
        .search(api_key, keyword)
        .await
        .map_err(|error| {
            tracing::error!(%error, r#type = "web.search.upstream-error", "Error searching for products");
            metrics_client.incr("search.upstream-error").ok();
            HandlerError::from(error)
        })?;

    let upstream_count = raw_results.len();
    let ranked = rank(raw_results, &criteria);

    tracing::debug!(
        r#type = "web.search.ranked-count",
        upstream_count,
        ranked_count = ranked.len(),
        "Providing ranked results"
    );
    metrics_client
        .histogram("search.results-per-request", ranked.len() as u64)
        .ok();

    Ok(HttpResponse::Ok().json(ranked))
}

/// Query parameters for a search.
///
/// Everything is optional and kept as a string here, so that missing and
/// malformed values can be reported with the API's own error messages.
#[derive(Debug, Default, PartialEq)]
struct SearchQueryParameters {
    /// What to search for.
    keyword: Option<String>,
    /// The highest acceptable price.
    max_price: Option<String>,
    /// The lowest acceptable price. Defaults to 0.
    min_price: Option<String>,
    /// The lowest acceptable rating. Defaults to 0.
    min_rating: Option<String>,
}

impl SearchQueryParameters {
    /// Pick the search parameters out of a decoded query string. A repeated
    /// parameter keeps its first value, and unknown parameters are ignored.
    fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let mut parameters = Self::default();
        for (name, value) in pairs {
            let slot = match name.as_str() {
                "keyword" => &mut parameters.keyword,
                "max_price" => &mut parameters.max_price,
                "min_price" => &mut parameters.min_price,
                "min_rating" => &mut parameters.min_rating,
                _ => continue,
            };
            slot.get_or_insert(value);
        }
        parameters
    }
}

/// Treat empty parameters the same as missing ones.
fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

/// Parse an optional lower bound, defaulting to zero.
fn parse_bound(value: Option<&str>) -> Result<f64, HandlerError> {
    non_empty(value).map_or(Ok(0.0), parse_number)
}

/// Parse a numeric query parameter. Only finite numbers are accepted.
fn parse_number(value: &str) -> Result<f64, HandlerError> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| HandlerErrorKind::InvalidNumber.into())
}

/// Log a search request, respecting the `log_full_request` setting, and
/// formatting all fields in a way that is helpful to our downstream log
/// handlers.
fn safe_log_request(log_full_request: bool, query_params: &SearchQueryParameters) {
    let keyword = if log_full_request {
        query_params.keyword.as_deref().unwrap_or_default()
    } else {
        ""
    };

    tracing::info!(
        r#type = "web.search.request",
        sensitive = log_full_request,
        %keyword,
        has_keyword = query_params.keyword.is_some(),
        max_price = query_params.max_price.as_deref(),
        min_price = query_params.min_price.as_deref(),
        min_rating = query_params.min_rating.as_deref(),
        "handling search request"
    );
}

#[cfg(test)]
mod tests {
    use super::{parse_bound, parse_number, SearchQueryParameters};
    use parameterized::parameterized;

    #[parameterized(
        input = { "100", " 25.5 ", "0", "-1", "1e3" },
        expected = { 100.0, 25.5, 0.0, -1.0, 1000.0 },
    )]
    fn parses_numbers(input: &str, expected: f64) {
        assert_eq!(parse_number(input).ok(), Some(expected));
    }

    #[parameterized(input = { "abc", "10abc", "NaN", "inf", "" })]
    fn rejects_non_numbers(input: &str) {
        assert!(parse_number(input).is_err());
    }

    #[test]
    fn missing_bounds_default_to_zero() {
        assert_eq!(parse_bound(None).ok(), Some(0.0));
        assert_eq!(parse_bound(Some("")).ok(), Some(0.0));
        assert_eq!(parse_bound(Some("3.5")).ok(), Some(3.5));
        assert!(parse_bound(Some("three")).is_err());
    }

    #[test]
    fn repeated_parameters_keep_their_first_value() {
        let pairs = vec![
            ("keyword".to_string(), "first".to_string()),
            ("utm_source".to_string(), "mail".to_string()),
            ("max_price".to_string(), "100".to_string()),
            ("keyword".to_string(), "second".to_string()),
        ];

        assert_eq!(
            SearchQueryParameters::from_pairs(pairs),
            SearchQueryParameters {
                keyword: Some("first".to_string()),
                max_price: Some("100".to_string()),
                ..SearchQueryParameters::default()
            }
        );
    }
}
