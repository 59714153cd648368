use crate::support::{
    assert_status, error_code, parse_json, to_json_body, with_test_app, with_test_app_with_config,
};
use axum::http::{Method, StatusCode};
use serde_json::json;

#[tokio::test]
async fn create_returns_the_stored_record() -> anyhow::Result<()> {
    with_test_app(|app| {
        Box::pin(async move {
            let (status, _headers, body) = app
                .request(
                    Method::POST,
                    "/api/v3/biz",
                    Some(to_json_body(&json!({
                        "bk_biz_name": "payments",
                        "bk_biz_maintainer": "alice",
                        "bk_biz_id": 12345,
                        "bk_supplier_account": "intruder"
                    }))?),
                )
                .await?;
            assert_status(status, StatusCode::CREATED, "create");

            let created = parse_json(&body)?;
            assert_eq!(created["bk_biz_name"], json!("payments"));
            assert_eq!(created["bk_biz_maintainer"], json!("alice"));
            assert_eq!(created["bk_supplier_account"], json!("0"));
            assert_eq!(created["default"], json!(0));
            assert_eq!(created["bk_data_status"], json!("enabled"));
            assert_ne!(created["bk_biz_id"], json!(12345));
            assert!(created["create_time"].is_string());
            Ok(())
        })
    })
    .await
}

#[tokio::test]
async fn create_rejects_missing_name_and_non_object_bodies() -> anyhow::Result<()> {
    with_test_app(|app| {
        Box::pin(async move {
            let (status, _headers, body) = app
                .request(
                    Method::POST,
                    "/api/v3/biz",
                    Some(to_json_body(&json!({ "bk_biz_maintainer": "alice" }))?),
                )
                .await?;
            assert_status(status, StatusCode::BAD_REQUEST, "missing name");
            assert_eq!(error_code(&body)?, "INVALID_PARAMETER");

            let (status, _headers, body) = app
                .request(
                    Method::POST,
                    "/api/v3/biz",
                    Some(to_json_body(&json!(["bk_biz_name"]))?),
                )
                .await?;
            assert_status(status, StatusCode::BAD_REQUEST, "array body");
            assert_eq!(error_code(&body)?, "INVALID_PARAMETER");

            let (status, _headers, body) = app
                .request(
                    Method::POST,
                    "/api/v3/biz",
                    Some(to_json_body(&json!({ "bk_biz_name": "x", "bk_data_status": "gone" }))?),
                )
                .await?;
            assert_status(status, StatusCode::BAD_REQUEST, "bad status on create");
            assert_eq!(error_code(&body)?, "INVALID_STATUS_VALUE");
            Ok(())
        })
    })
    .await
}

#[tokio::test]
async fn update_merges_attributes() -> anyhow::Result<()> {
    with_test_app(|app| {
        Box::pin(async move {
            let id = app.create_business("0", "payments").await?;

            let (status, _headers, _body) = app
                .request(
                    Method::PUT,
                    &format!("/api/v3/biz/{id}"),
                    Some(to_json_body(&json!({ "bk_biz_maintainer": "bob" }))?),
                )
                .await?;
            assert_status(status, StatusCode::NO_CONTENT, "update");

            let stored = app.store().get(id)?.expect("business exists");
            assert_eq!(stored.attributes["bk_biz_maintainer"], json!("bob"));
            assert_eq!(stored.name(), Some("payments"));
            Ok(())
        })
    })
    .await
}

#[tokio::test]
async fn update_rejects_server_owned_fields() -> anyhow::Result<()> {
    with_test_app(|app| {
        Box::pin(async move {
            let id = app.create_business("0", "payments").await?;

            for patch in [
                json!({ "bk_biz_id": 99 }),
                json!({ "bk_supplier_account": "tenant-b" }),
                json!({ "bk_data_status": "disabled" }),
            ] {
                let (status, _headers, body) = app
                    .request(
                        Method::PUT,
                        &format!("/api/v3/biz/{id}"),
                        Some(to_json_body(&patch)?),
                    )
                    .await?;
                assert_status(status, StatusCode::BAD_REQUEST, "reserved field");
                assert_eq!(error_code(&body)?, "INVALID_PARAMETER");
            }
            Ok(())
        })
    })
    .await
}

#[tokio::test]
async fn delete_removes_the_business() -> anyhow::Result<()> {
    with_test_app(|app| {
        Box::pin(async move {
            let id = app.create_business("0", "payments").await?;

            let (status, _headers, _body) = app
                .request(Method::DELETE, &format!("/api/v3/biz/{id}"), None)
                .await?;
            assert_status(status, StatusCode::NO_CONTENT, "delete");
            assert!(app.store().get(id)?.is_none());

            let (status, _headers, body) = app
                .request(Method::DELETE, &format!("/api/v3/biz/{id}"), None)
                .await?;
            assert_status(status, StatusCode::NOT_FOUND, "second delete");
            assert_eq!(error_code(&body)?, "NOT_FOUND");
            Ok(())
        })
    })
    .await
}

#[tokio::test]
async fn delete_does_not_check_associations() -> anyhow::Result<()> {
    with_test_app(|app| {
        Box::pin(async move {
            let id = app.create_business("0", "payments").await?;
            app.associate("0", "host", 1, id);

            let (status, _headers, _body) = app
                .request(Method::DELETE, &format!("/api/v3/biz/{id}"), None)
                .await?;
            assert_status(status, StatusCode::NO_CONTENT, "delete referenced");
            Ok(())
        })
    })
    .await
}

#[tokio::test]
async fn malformed_ids_are_rejected_before_the_store() -> anyhow::Result<()> {
    with_test_app(|app| {
        Box::pin(async move {
            let calls = app.store().business_calls();

            for (method, uri, body) in [
                (Method::DELETE, "/api/v3/biz/abc", None),
                (
                    Method::PUT,
                    "/api/v3/biz/-4",
                    Some(to_json_body(&json!({ "bk_biz_name": "x" }))?),
                ),
                (Method::PUT, "/api/v3/biz/status/disabled/1.5", None),
                (Method::GET, "/api/v3/biz/0/internal-module", None),
            ] {
                let (status, _headers, resp) = app.request(method, uri, body).await?;
                assert_status(status, StatusCode::BAD_REQUEST, uri);
                assert_eq!(error_code(&resp)?, "INVALID_PARAMETER");
            }

            assert_eq!(app.store().business_calls(), calls);
            Ok(())
        })
    })
    .await
}

#[tokio::test]
async fn owners_cannot_touch_each_others_businesses() -> anyhow::Result<()> {
    with_test_app(|app| {
        Box::pin(async move {
            let id = app.create_business("tenant-a", "payments").await?;

            let (status, _headers, _body) = app
                .request_as(
                    "tenant-b",
                    Method::PUT,
                    &format!("/api/v3/biz/{id}"),
                    Some(to_json_body(&json!({ "bk_biz_maintainer": "mallory" }))?),
                )
                .await?;
            assert_status(status, StatusCode::NOT_FOUND, "foreign update");

            let (status, _headers, _body) = app
                .request_as("tenant-b", Method::DELETE, &format!("/api/v3/biz/{id}"), None)
                .await?;
            assert_status(status, StatusCode::NOT_FOUND, "foreign delete");

            let stored = app.store().get(id)?.expect("business still exists");
            assert!(!stored.attributes.contains_key("bk_biz_maintainer"));
            Ok(())
        })
    })
    .await
}

#[tokio::test]
async fn configured_default_owner_applies_without_header() -> anyhow::Result<()> {
    with_test_app_with_config(
        |config| {
            config.tenancy.default_owner = "supplier-7".to_string();
        },
        |app| {
            Box::pin(async move {
                let (status, headers, body) = app
                    .request(
                        Method::POST,
                        "/api/v3/biz",
                        Some(to_json_body(&json!({ "bk_biz_name": "payments" }))?),
                    )
                    .await?;
                assert_status(status, StatusCode::CREATED, "create");
                assert_eq!(parse_json(&body)?["bk_supplier_account"], json!("supplier-7"));
                assert!(headers.contains_key("x-request-id"));
                Ok(())
            })
        },
    )
    .await
}

#[tokio::test]
async fn request_id_is_echoed() -> anyhow::Result<()> {
    with_test_app(|app| {
        Box::pin(async move {
            let (status, headers, _body) = app
                .request_with_extra_headers(
                    Method::GET,
                    "/health",
                    None,
                    &[("x-request-id", "req-123")],
                )
                .await?;
            assert_status(status, StatusCode::OK, "health");
            assert_eq!(
                headers.get("x-request-id").and_then(|v| v.to_str().ok()),
                Some("req-123")
            );
            Ok(())
        })
    })
    .await
}
