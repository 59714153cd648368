use crate::support::{assert_status, with_test_app};
use axum::http::{Method, StatusCode};

#[tokio::test]
async fn business_operations_are_counted() -> anyhow::Result<()> {
    with_test_app(|app| {
        Box::pin(async move {
            app.create_business("0", "payments").await?;

            let (status, _headers, body) = app.request(Method::GET, "/metrics", None).await?;
            assert_status(status, StatusCode::OK, "metrics");
            let text = String::from_utf8(body.to_vec())?;
            assert!(text.contains("cmdb_business_operations_total"));
            assert!(text.contains(r#"operation="create""#));
            Ok(())
        })
    })
    .await
}
