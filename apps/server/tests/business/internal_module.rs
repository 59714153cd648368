use crate::support::{assert_status, error_code, parse_json, with_test_app};
use axum::http::{Method, StatusCode};
use serde_json::json;

#[tokio::test]
async fn every_business_gets_an_idle_pool() -> anyhow::Result<()> {
    with_test_app(|app| {
        Box::pin(async move {
            let id = app.create_business("0", "payments").await?;

            let (status, _headers, body) = app
                .request(Method::GET, &format!("/api/v3/biz/{id}/internal-module"), None)
                .await?;
            assert_status(status, StatusCode::OK, "internal module");

            let set = parse_json(&body)?;
            assert_eq!(set["bk_set_name"], json!("idle pool"));
            assert!(set["bk_set_id"].is_i64());
            assert_eq!(set["module"][0]["bk_module_name"], json!("idle host"));
            assert_eq!(set["module"][0]["default"], json!(1));
            assert_eq!(set["module"][1]["bk_module_name"], json!("fault host"));
            assert_eq!(set["module"][1]["default"], json!(2));
            Ok(())
        })
    })
    .await
}

#[tokio::test]
async fn internal_module_is_owner_scoped() -> anyhow::Result<()> {
    with_test_app(|app| {
        Box::pin(async move {
            let id = app.create_business("tenant-a", "payments").await?;

            let (status, _headers, body) = app
                .request_as(
                    "tenant-b",
                    Method::GET,
                    &format!("/api/v3/biz/{id}/internal-module"),
                    None,
                )
                .await?;
            assert_status(status, StatusCode::NOT_FOUND, "foreign business");
            assert_eq!(error_code(&body)?, "NOT_FOUND");
            Ok(())
        })
    })
    .await
}

#[tokio::test]
async fn internal_module_goes_with_the_business() -> anyhow::Result<()> {
    with_test_app(|app| {
        Box::pin(async move {
            let id = app.create_business("0", "payments").await?;
            let (status, _headers, _body) = app
                .request(Method::DELETE, &format!("/api/v3/biz/{id}"), None)
                .await?;
            assert_status(status, StatusCode::NO_CONTENT, "delete");

            let (status, _headers, _body) = app
                .request(Method::GET, &format!("/api/v3/biz/{id}/internal-module"), None)
                .await?;
            assert_status(status, StatusCode::NOT_FOUND, "after delete");
            Ok(())
        })
    })
    .await
}
