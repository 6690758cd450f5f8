//! Tests the informational root of the service and CORS behavior.
#![cfg(test)]

use crate::{pricewise_test, TestingTools};
use anyhow::Result;
use reqwest::{header::HeaderValue, StatusCode};

#[actix_rt::test]
async fn root_of_services_provides_public_docs() -> Result<()> {
    pricewise_test(
        |settings| settings.public_documentation = Some("https://example.com/".to_string()),
        |TestingTools { test_client, .. }| async move {
            let response = test_client.get("/").send().await?;

            assert_eq!(response.status(), StatusCode::FOUND);
            assert_eq!(
                response.headers().get("location"),
                Some(&HeaderValue::from_static("https://example.com/"))
            );

            Ok(())
        },
    )
    .await
}

#[actix_rt::test]
async fn root_of_services_has_a_fallback_message() -> Result<()> {
    pricewise_test(
        |settings| settings.public_documentation = None,
        |TestingTools { test_client, .. }| async move {
            let response = test_client.get("/").send().await?;

            assert_eq!(response.status(), StatusCode::OK);
            assert_eq!(
                response.text().await?,
                "Pricewise searches online shops and ranks the results by value for money."
            );

            Ok(())
        },
    )
    .await
}

#[actix_rt::test]
async fn cross_origin_requests_are_allowed() -> Result<()> {
    pricewise_test(
        |_| (),
        |TestingTools { test_client, .. }| async move {
            let response = test_client
                .get("/api/validate")
                .header("origin", "https://shop.example.com")
                .send()
                .await?;

            assert_eq!(response.status(), StatusCode::OK);
            assert_eq!(
                response.headers().get("access-control-allow-origin"),
                Some(&HeaderValue::from_static("https://shop.example.com"))
            );

            Ok(())
        },
    )
    .await
}

#[actix_rt::test]
async fn unknown_paths_are_not_found() -> Result<()> {
    pricewise_test(
        |_| (),
        |TestingTools { test_client, .. }| async move {
            let response = test_client.get("/api/nothing-here").send().await?;
            assert_eq!(response.status(), StatusCode::NOT_FOUND);
            Ok(())
        },
    )
    .await
}
