//! Tests Pricewise's ability to search for and rank products.
#![cfg(test)]

use crate::{pricewise_test, TestingTools};
use anyhow::Result;
use httpmock::{Method::GET, Mock, MockServer};
use pretty_assertions::assert_eq;
use pricewise_ranker::RankedResult;
use reqwest::StatusCode;
use serde_json::{json, Value};

/// The message reported when required search input is missing.
const MISSING_MESSAGE: &str = "Missing 'keyword', 'max_price', or API key is not set.";

/// Make the mock SerpApi respond to every search with `results`.
async fn mock_shopping_results(server: &MockServer, results: Value) -> Mock<'_> {
    server
        .mock_async(move |when, then| {
            when.method(GET).path("/search.json");
            then.status(200)
                .json_body(json!({ "shopping_results": results }));
        })
        .await
}

#[actix_rt::test]
async fn search_ranks_results_by_value() -> Result<()> {
    pricewise_test(
        |_| (),
        |TestingTools {
             test_client,
             serpapi_mock,
             ..
         }| async move {
            mock_shopping_results(
                &serpapi_mock,
                json!([
                    { "title": "B", "extracted_price": "20", "rating": "5" },
                    { "title": "A", "extracted_price": "10", "rating": "4" },
                ]),
            )
            .await;

            let response = test_client
                .get("/api/search")
                .query(&[("keyword", "widget"), ("max_price", "100")])
                .send()
                .await?;

            assert_eq!(response.status(), StatusCode::OK);
            let body: Vec<RankedResult> = response.json().await?;
            let ranked: Vec<(&str, f64)> = body
                .iter()
                .map(|r| (r.name.as_deref().unwrap_or_default(), r.value_score))
                .collect();
            assert_eq!(ranked, vec![("A", 0.4), ("B", 0.25)]);

            Ok(())
        },
    )
    .await
}

#[actix_rt::test]
async fn search_reports_results_in_the_public_format() -> Result<()> {
    pricewise_test(
        |_| (),
        |TestingTools {
             test_client,
             serpapi_mock,
             ..
         }| async move {
            mock_shopping_results(
                &serpapi_mock,
                json!([{
                    "position": 1,
                    "title": "USB C cable",
                    "source": "Example Store",
                    "extracted_price": 250,
                    "rating": 4.5,
                    "reviews": 1200,
                    "product_link": "https://example.com/cable",
                    "thumbnail": "https://example.com/cable.png",
                }]),
            )
            .await;

            let response = test_client
                .get("/api/search?keyword=cable&max_price=1000")
                .send()
                .await?;

            assert_eq!(response.status(), StatusCode::OK);
            let body: Value = response.json().await?;
            assert_eq!(
                body,
                json!([{
                    "name": "USB C cable",
                    "source": "Example Store",
                    "price": 250.0,
                    "rating": 4.5,
                    "link": "https://example.com/cable",
                    "thumbnail": "https://example.com/cable.png",
                    "value_score": 0.018,
                }])
            );

            Ok(())
        },
    )
    .await
}

#[actix_rt::test]
async fn search_sends_the_expected_query_to_serpapi() -> Result<()> {
    pricewise_test(
        |_| (),
        |TestingTools {
             test_client,
             serpapi_mock,
             ..
         }| async move {
            let mock = serpapi_mock
                .mock_async(|when, then| {
                    when.method(GET)
                        .path("/search.json")
                        .query_param("api_key", "test-api-key")
                        .query_param("engine", "google_shopping")
                        .query_param("q", "usb c cable")
                        .query_param("hl", "en")
                        .query_param("gl", "in");
                    then.status(200).json_body(json!({ "shopping_results": [] }));
                })
                .await;

            let response = test_client
                .get("/api/search")
                .query(&[("keyword", "usb c cable"), ("max_price", "500")])
                .send()
                .await?;

            assert_eq!(response.status(), StatusCode::OK);
            mock.assert_async().await;

            Ok(())
        },
    )
    .await
}

#[actix_rt::test]
async fn search_applies_price_and_rating_bounds() -> Result<()> {
    pricewise_test(
        |_| (),
        |TestingTools {
             test_client,
             serpapi_mock,
             ..
         }| async move {
            mock_shopping_results(
                &serpapi_mock,
                json!([
                    { "title": "too cheap", "extracted_price": 5, "rating": 5 },
                    { "title": "poorly rated", "extracted_price": 50, "rating": 2.5 },
                    { "title": "just right", "extracted_price": 50, "rating": 4 },
                    { "title": "too expensive", "extracted_price": 500, "rating": 5 },
                    { "title": "no price", "rating": 5 },
                    { "title": "bad price", "extracted_price": "ask", "rating": 5 },
                ]),
            )
            .await;

            let response = test_client
                .get("/api/search")
                .query(&[
                    ("keyword", "widget"),
                    ("min_price", "10"),
                    ("max_price", "100"),
                    ("min_rating", "3"),
                ])
                .send()
                .await?;

            assert_eq!(response.status(), StatusCode::OK);
            let body: Vec<RankedResult> = response.json().await?;
            let names: Vec<_> = body.iter().filter_map(|r| r.name.as_deref()).collect();
            assert_eq!(names, vec!["just right"]);

            Ok(())
        },
    )
    .await
}

#[actix_rt::test]
async fn search_with_an_unreachable_rating_is_empty() -> Result<()> {
    pricewise_test(
        |_| (),
        |TestingTools {
             test_client,
             serpapi_mock,
             ..
         }| async move {
            mock_shopping_results(
                &serpapi_mock,
                json!([
                    { "title": "A", "extracted_price": 10, "rating": 4 },
                    { "title": "B", "extracted_price": 20, "rating": 5 },
                ]),
            )
            .await;

            let response = test_client
                .get("/api/search?keyword=widget&max_price=100&min_rating=5.5")
                .send()
                .await?;

            assert_eq!(response.status(), StatusCode::OK);
            let body: Value = response.json().await?;
            assert_eq!(body, json!([]));

            Ok(())
        },
    )
    .await
}

#[actix_rt::test]
async fn search_requires_a_keyword() -> Result<()> {
    pricewise_test(
        |_| (),
        |TestingTools {
             test_client,
             serpapi_mock,
             ..
         }| async move {
            let mock = mock_shopping_results(&serpapi_mock, json!([])).await;

            for path in ["/api/search?max_price=100", "/api/search?keyword=&max_price=100"] {
                let response = test_client.get(path).send().await?;

                assert_eq!(response.status(), StatusCode::BAD_REQUEST);
                let body: Value = response.json().await?;
                assert_eq!(body, json!({ "error": MISSING_MESSAGE }));
            }
            assert_eq!(mock.hits_async().await, 0);

            Ok(())
        },
    )
    .await
}

#[actix_rt::test]
async fn search_requires_a_max_price() -> Result<()> {
    pricewise_test(
        |_| (),
        |TestingTools { test_client, .. }| async move {
            let response = test_client
                .get("/api/search?keyword=widget&min_price=10")
                .send()
                .await?;

            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
            let body: Value = response.json().await?;
            assert_eq!(body, json!({ "error": MISSING_MESSAGE }));

            Ok(())
        },
    )
    .await
}

#[actix_rt::test]
async fn search_requires_an_api_key() -> Result<()> {
    pricewise_test(
        |settings| settings.serpapi.api_key = None,
        |TestingTools {
             test_client,
             serpapi_mock,
             ..
         }| async move {
            let mock = mock_shopping_results(&serpapi_mock, json!([])).await;

            let response = test_client
                .get("/api/search?keyword=widget&max_price=100")
                .send()
                .await?;

            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
            let body: Value = response.json().await?;
            assert_eq!(body, json!({ "error": MISSING_MESSAGE }));
            assert_eq!(mock.hits_async().await, 0);

            Ok(())
        },
    )
    .await
}

#[actix_rt::test]
async fn search_rejects_non_numeric_bounds() -> Result<()> {
    pricewise_test(
        |_| (),
        |TestingTools { test_client, .. }| async move {
            for query in [
                "keyword=widget&max_price=lots",
                "keyword=widget&max_price=100&min_price=cheap",
                "keyword=widget&max_price=100&min_rating=good",
            ] {
                let response = test_client
                    .get(&format!("/api/search?{}", query))
                    .send()
                    .await?;

                assert_eq!(response.status(), StatusCode::BAD_REQUEST, "for {}", query);
                let body: Value = response.json().await?;
                assert_eq!(
                    body,
                    json!({ "error": "Price and rating parameters must be valid numbers." })
                );
            }

            Ok(())
        },
    )
    .await
}

#[actix_rt::test]
async fn search_reports_upstream_error_statuses() -> Result<()> {
    pricewise_test(
        |_| (),
        |TestingTools {
             test_client,
             serpapi_mock,
             ..
         }| async move {
            serpapi_mock
                .mock_async(|when, then| {
                    when.method(GET).path("/search.json");
                    then.status(503);
                })
                .await;

            let response = test_client
                .get("/api/search?keyword=widget&max_price=100")
                .send()
                .await?;

            assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
            let body: Value = response.json().await?;
            assert_eq!(
                body,
                json!({ "error": "API request failed with status 503" })
            );

            Ok(())
        },
    )
    .await
}

#[actix_rt::test]
async fn search_reports_responses_without_results() -> Result<()> {
    pricewise_test(
        |_| (),
        |TestingTools {
             test_client,
             serpapi_mock,
             ..
         }| async move {
            serpapi_mock
                .mock_async(|when, then| {
                    when.method(GET).path("/search.json");
                    then.status(200)
                        .json_body(json!({ "search_metadata": { "status": "Success" } }));
                })
                .await;

            let response = test_client
                .get("/api/search?keyword=widget&max_price=100")
                .send()
                .await?;

            assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
            let body: Value = response.json().await?;
            assert_eq!(
                body,
                json!({ "error": "API response did not include 'shopping_results'" })
            );

            Ok(())
        },
    )
    .await
}

#[actix_rt::test]
async fn search_reports_unreachable_upstream() -> Result<()> {
    pricewise_test(
        |settings| settings.serpapi.endpoint = "http://127.0.0.1:1/search.json".to_string(),
        |TestingTools { test_client, .. }| async move {
            let response = test_client
                .get("/api/search?keyword=widget&max_price=100")
                .send()
                .await?;

            assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
            let body: Value = response.json().await?;
            let message = body["error"].as_str().unwrap_or_default();
            assert!(message.starts_with("API request failed: "), "{}", message);

            Ok(())
        },
    )
    .await
}

#[actix_rt::test]
async fn search_uses_the_first_of_repeated_parameters() -> Result<()> {
    pricewise_test(
        |_| (),
        |TestingTools {
             test_client,
             serpapi_mock,
             ..
         }| async move {
            let mock = serpapi_mock
                .mock_async(|when, then| {
                    when.method(GET)
                        .path("/search.json")
                        .query_param("q", "first");
                    then.status(200).json_body(json!({
                        "shopping_results": [
                            { "title": "A", "extracted_price": 50, "rating": 4 },
                            { "title": "B", "extracted_price": 150, "rating": 4 },
                        ]
                    }));
                })
                .await;

            let response = test_client
                .get("/api/search?keyword=first&keyword=second&max_price=100&max_price=500")
                .send()
                .await?;

            assert_eq!(response.status(), StatusCode::OK);
            let body: Vec<RankedResult> = response.json().await?;
            let names: Vec<_> = body.iter().filter_map(|r| r.name.as_deref()).collect();
            assert_eq!(names, vec!["A"]);
            mock.assert_async().await;

            Ok(())
        },
    )
    .await
}

#[actix_rt::test]
async fn search_tolerates_non_string_text_fields() -> Result<()> {
    pricewise_test(
        |_| (),
        |TestingTools {
             test_client,
             serpapi_mock,
             ..
         }| async move {
            mock_shopping_results(
                &serpapi_mock,
                json!([
                    { "title": 7, "source": ["a", "b"], "extracted_price": 10, "rating": 4 },
                ]),
            )
            .await;

            let response = test_client
                .get("/api/search?keyword=widget&max_price=100")
                .send()
                .await?;

            assert_eq!(response.status(), StatusCode::OK);
            let body: Value = response.json().await?;
            assert_eq!(
                body,
                json!([{ "name": "7", "price": 10.0, "rating": 4.0, "value_score": 0.4 }])
            );

            Ok(())
        },
    )
    .await
}
