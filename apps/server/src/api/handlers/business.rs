//! Business lifecycle handlers

use crate::{
    api::extractors::{json_body, json_object},
    models::{RequestContext, SearchRequest},
    state::AppState,
    Result,
};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::Value as JsonValue;

/// POST /api/v3/biz
pub async fn create_business(
    State(state): State<AppState>,
    ctx: RequestContext,
    body: std::result::Result<Json<JsonValue>, JsonRejection>,
) -> Result<Response> {
    let attributes = json_object(body)?;
    let business = state.business_service.create(&ctx, attributes).await?;
    Ok((StatusCode::CREATED, Json(business)).into_response())
}

/// POST /api/v3/biz/default
pub async fn create_default_business(
    State(state): State<AppState>,
    ctx: RequestContext,
    body: std::result::Result<Json<JsonValue>, JsonRejection>,
) -> Result<Response> {
    let attributes = json_object(body)?;
    let business = state
        .business_service
        .create_default(&ctx, attributes)
        .await?;
    Ok((StatusCode::CREATED, Json(business)).into_response())
}

/// DELETE /api/v3/biz/:bk_biz_id
pub async fn delete_business(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(biz_id): Path<String>,
) -> Result<StatusCode> {
    state.business_service.delete(&ctx, &biz_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// PUT /api/v3/biz/:bk_biz_id
pub async fn update_business(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(biz_id): Path<String>,
    body: std::result::Result<Json<JsonValue>, JsonRejection>,
) -> Result<StatusCode> {
    let attributes = json_object(body)?;
    state
        .business_service
        .update(&ctx, &biz_id, attributes)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// PUT /api/v3/biz/status/:flag/:bk_biz_id
pub async fn change_business_status(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path((flag, biz_id)): Path<(String, String)>,
) -> Result<StatusCode> {
    state
        .business_service
        .change_status(&ctx, &biz_id, &flag)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v3/biz/search
pub async fn search_businesses(
    State(state): State<AppState>,
    ctx: RequestContext,
    body: std::result::Result<Json<JsonValue>, JsonRejection>,
) -> Result<Response> {
    let request = SearchRequest::from_value(json_body(body)?)?;
    let result = state.business_service.search(&ctx, request).await?;
    Ok(Json(result).into_response())
}

/// POST /api/v3/biz/default/search
pub async fn search_default_business(
    State(state): State<AppState>,
    ctx: RequestContext,
    body: std::result::Result<Json<JsonValue>, JsonRejection>,
) -> Result<Response> {
    let filter = json_body(body)?;
    let result = state.business_service.search_default(&ctx, filter).await?;
    Ok(Json(result).into_response())
}

/// GET /api/v3/biz/:bk_biz_id/internal-module
pub async fn get_internal_module(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(biz_id): Path<String>,
) -> Result<Response> {
    let set = state
        .business_service
        .get_internal_module(&ctx, &biz_id)
        .await?;
    Ok(Json(set).into_response())
}
