//! Shared harness for the HTTP integration tests.
//!
//! Every test gets a fresh router over the in-memory backend and talks to it
//! in-process through `tower::ServiceExt::oneshot`.

use axum::{
    body::{Body, Bytes},
    http::{HeaderMap, Method, Request, StatusCode},
    Router,
};
use cmdb_topo::{
    api::create_router, config::Config, db::InMemoryTopoStore, models::AssociationRef,
    state::AppState,
};
use serde_json::{json, Value};
use std::{future::Future, pin::Pin, sync::Arc};
use tower::ServiceExt;

pub const OWNER_HEADER: &str = "x-bk-supplier-account";

pub struct TestApp {
    pub state: AppState,
    router: Router,
}

impl TestApp {
    fn new(config: Config) -> Self {
        let state = AppState::in_memory(config);
        let router = create_router(state.clone());
        Self { state, router }
    }

    pub fn store(&self) -> Arc<InMemoryTopoStore> {
        self.state
            .memory_store
            .clone()
            .expect("test app runs on the in-memory backend")
    }

    /// Seed an association from `(obj_id, inst_id)` to business `biz_id`.
    pub fn associate(&self, owner: &str, obj_id: &str, inst_id: i64, biz_id: i64) {
        self.store()
            .insert_association(AssociationRef::to_business(owner, obj_id, inst_id, biz_id))
            .expect("seed association");
    }

    /// Request under the configured default owner.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Bytes>,
    ) -> anyhow::Result<(StatusCode, HeaderMap, Bytes)> {
        self.request_with_extra_headers(method, uri, body, &[]).await
    }

    /// Request on behalf of `owner`.
    pub async fn request_as(
        &self,
        owner: &str,
        method: Method,
        uri: &str,
        body: Option<Bytes>,
    ) -> anyhow::Result<(StatusCode, HeaderMap, Bytes)> {
        self.request_with_extra_headers(method, uri, body, &[(OWNER_HEADER, owner)])
            .await
    }

    pub async fn request_with_extra_headers(
        &self,
        method: Method,
        uri: &str,
        body: Option<Bytes>,
        headers: &[(&str, &str)],
    ) -> anyhow::Result<(StatusCode, HeaderMap, Bytes)> {
        let mut builder = Request::builder().method(method).uri(uri);
        if body.is_some() {
            builder = builder.header("content-type", "application/json");
        }
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        let request = builder.body(body.map(Body::from).unwrap_or_else(Body::empty))?;

        let response = self.router.clone().oneshot(request).await?;
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
        Ok((status, headers, bytes))
    }

    /// Create an ordinary business and return its id.
    pub async fn create_business(&self, owner: &str, name: &str) -> anyhow::Result<i64> {
        let (status, _headers, body) = self
            .request_as(
                owner,
                Method::POST,
                "/api/v3/biz",
                Some(to_json_body(&json!({ "bk_biz_name": name }))?),
            )
            .await?;
        assert_status(status, StatusCode::CREATED, "create business");
        let created = parse_json(&body)?;
        created["bk_biz_id"]
            .as_i64()
            .ok_or_else(|| anyhow::anyhow!("created business has no bk_biz_id: {}", created))
    }
}

pub fn to_json_body(value: &Value) -> anyhow::Result<Bytes> {
    Ok(Bytes::from(serde_json::to_vec(value)?))
}

pub fn parse_json(body: &[u8]) -> anyhow::Result<Value> {
    Ok(serde_json::from_slice(body)?)
}

/// `error.code` of an error response body.
pub fn error_code(body: &[u8]) -> anyhow::Result<String> {
    let value = parse_json(body)?;
    value["error"]["code"]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| anyhow::anyhow!("not an error body: {}", value))
}

pub fn assert_status(actual: StatusCode, expected: StatusCode, context: &str) {
    assert_eq!(
        actual, expected,
        "{}: expected status {}, got {}",
        context, expected, actual
    );
}

pub type TestFuture<'a> = Pin<Box<dyn Future<Output = anyhow::Result<()>> + 'a>>;

pub async fn with_test_app<F>(test: F) -> anyhow::Result<()>
where
    F: for<'a> FnOnce(&'a TestApp) -> TestFuture<'a>,
{
    with_test_app_with_config(|_| {}, test).await
}

pub async fn with_test_app_with_config<C, F>(configure: C, test: F) -> anyhow::Result<()>
where
    C: FnOnce(&mut Config),
    F: for<'a> FnOnce(&'a TestApp) -> TestFuture<'a>,
{
    let mut config = Config::in_memory();
    configure(&mut config);
    let app = TestApp::new(config);
    test(&app).await
}
