use crate::support::{assert_status, error_code, parse_json, to_json_body, with_test_app};
use axum::http::{Method, StatusCode};
use serde_json::json;

#[tokio::test]
async fn one_default_business_per_owner() -> anyhow::Result<()> {
    with_test_app(|app| {
        Box::pin(async move {
            let body = to_json_body(&json!({ "bk_biz_name": "resource pool" }))?;

            let (status, _headers, resp) = app
                .request(Method::POST, "/api/v3/biz/default", Some(body.clone()))
                .await?;
            assert_status(status, StatusCode::CREATED, "first default");
            assert_eq!(parse_json(&resp)?["default"], json!(1));

            let (status, _headers, resp) = app
                .request(Method::POST, "/api/v3/biz/default", Some(body.clone()))
                .await?;
            assert_status(status, StatusCode::CONFLICT, "second default");
            assert_eq!(error_code(&resp)?, "DEFAULT_BUSINESS_EXISTS");

            let (status, _headers, _resp) = app
                .request_as("tenant-b", Method::POST, "/api/v3/biz/default", Some(body))
                .await?;
            assert_status(status, StatusCode::CREATED, "other owner's default");
            Ok(())
        })
    })
    .await
}

#[tokio::test]
async fn search_default_returns_only_the_owners_default() -> anyhow::Result<()> {
    with_test_app(|app| {
        Box::pin(async move {
            app.create_business("0", "ordinary").await?;
            let (status, _headers, resp) = app
                .request(
                    Method::POST,
                    "/api/v3/biz/default",
                    Some(to_json_body(&json!({ "bk_biz_name": "resource pool" }))?),
                )
                .await?;
            assert_status(status, StatusCode::CREATED, "create default");
            let default_id = parse_json(&resp)?["bk_biz_id"].clone();

            let (status, _headers, resp) = app
                .request_as(
                    "tenant-b",
                    Method::POST,
                    "/api/v3/biz/default",
                    Some(to_json_body(&json!({ "bk_biz_name": "resource pool" }))?),
                )
                .await?;
            assert_status(status, StatusCode::CREATED, "other owner's default");

            // Scoping fields in the filter are overridden.
            let (status, _headers, resp) = app
                .request(
                    Method::POST,
                    "/api/v3/biz/default/search",
                    Some(to_json_body(&json!({
                        "default": 0,
                        "bk_supplier_account": "tenant-b",
                        "bk_data_status": { "$ne": "enabled" }
                    }))?),
                )
                .await?;
            assert_status(status, StatusCode::OK, "search default");
            let result = parse_json(&resp)?;
            assert_eq!(result["count"], json!(1));
            assert_eq!(result["info"][0]["bk_biz_id"], default_id);
            assert_eq!(result["info"][0]["bk_supplier_account"], json!("0"));
            Ok(())
        })
    })
    .await
}

#[tokio::test]
async fn search_default_finds_disabled_default() -> anyhow::Result<()> {
    with_test_app(|app| {
        Box::pin(async move {
            let (status, _headers, resp) = app
                .request(
                    Method::POST,
                    "/api/v3/biz/default",
                    Some(to_json_body(&json!({ "bk_biz_name": "resource pool" }))?),
                )
                .await?;
            assert_status(status, StatusCode::CREATED, "create default");
            let id = parse_json(&resp)?["bk_biz_id"]
                .as_i64()
                .ok_or_else(|| anyhow::anyhow!("missing id"))?;

            let (status, _headers, _resp) = app
                .request(Method::PUT, &format!("/api/v3/biz/status/disabled/{id}"), None)
                .await?;
            assert_status(status, StatusCode::NO_CONTENT, "disable default");

            let (status, _headers, resp) = app
                .request(
                    Method::POST,
                    "/api/v3/biz/default/search",
                    Some(to_json_body(&json!({}))?),
                )
                .await?;
            assert_status(status, StatusCode::OK, "search default");
            let result = parse_json(&resp)?;
            assert_eq!(result["count"], json!(1));
            assert_eq!(result["info"][0]["bk_data_status"], json!("disabled"));
            Ok(())
        })
    })
    .await
}

#[tokio::test]
async fn search_default_rejects_malformed_filters() -> anyhow::Result<()> {
    with_test_app(|app| {
        Box::pin(async move {
            let (status, _headers, resp) = app
                .request(
                    Method::POST,
                    "/api/v3/biz/default/search",
                    Some(to_json_body(&json!("bk_biz_name"))?),
                )
                .await?;
            assert_status(status, StatusCode::BAD_REQUEST, "string filter");
            assert_eq!(error_code(&resp)?, "MALFORMED_CONDITION");
            Ok(())
        })
    })
    .await
}
