use crate::support::{assert_status, error_code, with_test_app};
use axum::http::{Method, StatusCode};
use cmdb_topo::models::DataStatus;

#[tokio::test]
async fn disable_then_enable_unreferenced_business() -> anyhow::Result<()> {
    with_test_app(|app| {
        Box::pin(async move {
            let id = app.create_business("0", "payments").await?;

            let (status, _headers, _body) = app
                .request(Method::PUT, &format!("/api/v3/biz/status/disabled/{id}"), None)
                .await?;
            assert_status(status, StatusCode::NO_CONTENT, "disable");
            assert_eq!(
                app.store().get(id)?.expect("exists").status,
                DataStatus::Disabled
            );

            let (status, _headers, _body) = app
                .request(Method::PUT, &format!("/api/v3/biz/status/enabled/{id}"), None)
                .await?;
            assert_status(status, StatusCode::NO_CONTENT, "enable");
            assert_eq!(
                app.store().get(id)?.expect("exists").status,
                DataStatus::Enabled
            );
            Ok(())
        })
    })
    .await
}

#[tokio::test]
async fn referenced_business_cannot_be_disabled() -> anyhow::Result<()> {
    with_test_app(|app| {
        Box::pin(async move {
            let id = app.create_business("0", "payments").await?;
            app.associate("0", "host", 101, id);

            let (status, _headers, body) = app
                .request(Method::PUT, &format!("/api/v3/biz/status/disabled/{id}"), None)
                .await?;
            assert_status(status, StatusCode::CONFLICT, "disable referenced");
            assert_eq!(error_code(&body)?, "STILL_REFERENCED");
            assert_eq!(
                app.store().get(id)?.expect("exists").status,
                DataStatus::Enabled
            );
            Ok(())
        })
    })
    .await
}

#[tokio::test]
async fn enabling_ignores_references() -> anyhow::Result<()> {
    with_test_app(|app| {
        Box::pin(async move {
            let id = app.create_business("0", "payments").await?;
            let (status, _headers, _body) = app
                .request(Method::PUT, &format!("/api/v3/biz/status/disabled/{id}"), None)
                .await?;
            assert_status(status, StatusCode::NO_CONTENT, "disable");

            app.associate("0", "host", 101, id);
            let (status, _headers, _body) = app
                .request(Method::PUT, &format!("/api/v3/biz/status/enabled/{id}"), None)
                .await?;
            assert_status(status, StatusCode::NO_CONTENT, "enable referenced");
            Ok(())
        })
    })
    .await
}

#[tokio::test]
async fn references_under_another_owner_do_not_block() -> anyhow::Result<()> {
    with_test_app(|app| {
        Box::pin(async move {
            let id = app.create_business("0", "payments").await?;
            app.associate("tenant-b", "host", 101, id);

            let (status, _headers, _body) = app
                .request(Method::PUT, &format!("/api/v3/biz/status/disabled/{id}"), None)
                .await?;
            assert_status(status, StatusCode::NO_CONTENT, "disable");
            Ok(())
        })
    })
    .await
}

#[tokio::test]
async fn unknown_status_flag_writes_nothing() -> anyhow::Result<()> {
    with_test_app(|app| {
        Box::pin(async move {
            let id = app.create_business("0", "payments").await?;
            let calls = app.store().business_calls();

            let (status, _headers, body) = app
                .request(Method::PUT, &format!("/api/v3/biz/status/archived/{id}"), None)
                .await?;
            assert_status(status, StatusCode::BAD_REQUEST, "unknown flag");
            assert_eq!(error_code(&body)?, "INVALID_STATUS_VALUE");
            assert_eq!(app.store().business_calls(), calls);
            assert_eq!(
                app.store().get(id)?.expect("exists").status,
                DataStatus::Enabled
            );
            Ok(())
        })
    })
    .await
}

#[tokio::test]
async fn status_change_of_missing_business_is_not_found() -> anyhow::Result<()> {
    with_test_app(|app| {
        Box::pin(async move {
            let (status, _headers, body) = app
                .request(Method::PUT, "/api/v3/biz/status/enabled/404", None)
                .await?;
            assert_status(status, StatusCode::NOT_FOUND, "missing");
            assert_eq!(error_code(&body)?, "NOT_FOUND");
            Ok(())
        })
    })
    .await
}
