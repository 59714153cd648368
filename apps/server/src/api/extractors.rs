//! Request extractors
//!
//! The caller identity comes from headers only; bodies never carry it.

use crate::{models::RequestContext, state::AppState, Error, Result};
use axum::{
    extract::{rejection::JsonRejection, FromRequestParts},
    http::{request::Parts, HeaderMap},
    Json,
};
use serde_json::{Map, Value as JsonValue};

pub const OWNER_HEADER: &str = "x-bk-supplier-account";
pub const USER_HEADER: &str = "x-bk-user";
pub const REQUEST_ID_HEADER: &str = "x-request-id";

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

#[axum::async_trait]
impl FromRequestParts<AppState> for RequestContext {
    type Rejection = Error;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> std::result::Result<Self, Self::Rejection> {
        let owner = header_str(&parts.headers, OWNER_HEADER)
            .unwrap_or(state.config.tenancy.default_owner.as_str());

        let mut ctx = RequestContext::new(owner);
        if let Some(user) = header_str(&parts.headers, USER_HEADER) {
            ctx = ctx.with_user(user);
        }
        if let Some(request_id) = header_str(&parts.headers, REQUEST_ID_HEADER) {
            ctx = ctx.with_request_id(request_id);
        }
        Ok(ctx)
    }
}

/// Unwrap a JSON body, mapping rejections to `InvalidParameter`.
///
/// Handlers take `Result<Json<JsonValue>, JsonRejection>` so that malformed
/// bodies answer with the API's own error shape.
pub fn json_body(result: std::result::Result<Json<JsonValue>, JsonRejection>) -> Result<JsonValue> {
    result
        .map(|Json(v)| v)
        .map_err(|e| Error::InvalidParameter(format!("invalid JSON body: {}", e.body_text())))
}

/// Like [`json_body`], additionally requiring a JSON object.
pub fn json_object(
    result: std::result::Result<Json<JsonValue>, JsonRejection>,
) -> Result<Map<String, JsonValue>> {
    match json_body(result)? {
        JsonValue::Object(map) => Ok(map),
        other => Err(Error::InvalidParameter(format!(
            "request body must be a JSON object, got {}",
            json_type(&other)
        ))),
    }
}

fn json_type(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "a boolean",
        JsonValue::Number(_) => "a number",
        JsonValue::String(_) => "a string",
        JsonValue::Array(_) => "an array",
        JsonValue::Object(_) => "an object",
    }
}
