//! Tests the endpoint that reports the operator's validation number.
#![cfg(test)]

use crate::{pricewise_test, TestingTools};
use anyhow::Result;
use pretty_assertions::assert_eq;
use reqwest::StatusCode;
use serde_json::{json, Value};

#[actix_rt::test]
async fn validate_reports_the_configured_number() -> Result<()> {
    pricewise_test(
        |_| (),
        |TestingTools { test_client, .. }| async move {
            let response = test_client.get("/api/validate").send().await?;

            assert_eq!(response.status(), StatusCode::OK);
            let body: Value = response.json().await?;
            assert_eq!(body, json!({ "number": "+919876543210" }));

            Ok(())
        },
    )
    .await
}

#[actix_rt::test]
async fn validate_ignores_the_query_string() -> Result<()> {
    pricewise_test(
        |_| (),
        |TestingTools { test_client, .. }| async move {
            let response = test_client
                .get("/api/validate?keyword=widget&anything=else")
                .send()
                .await?;

            assert_eq!(response.status(), StatusCode::OK);
            let body: Value = response.json().await?;
            assert_eq!(body, json!({ "number": "+919876543210" }));

            Ok(())
        },
    )
    .await
}

#[actix_rt::test]
async fn validate_number_is_configurable() -> Result<()> {
    pricewise_test(
        |settings| settings.validation.number = "+15555550100".to_string(),
        |TestingTools { test_client, .. }| async move {
            let response = test_client.get("/api/validate").send().await?;

            assert_eq!(response.status(), StatusCode::OK);
            let body: Value = response.json().await?;
            assert_eq!(body, json!({ "number": "+15555550100" }));

            Ok(())
        },
    )
    .await
}
