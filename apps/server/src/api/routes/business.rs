use crate::api::handlers::business;
use crate::state::AppState;
use axum::{
    routing::{get, post, put},
    Router,
};

pub fn business_routes() -> Router<AppState> {
    Router::new()
        .route("/biz", post(business::create_business))
        .route("/biz/search", post(business::search_businesses))
        // Default business (one per owner)
        .route("/biz/default", post(business::create_default_business))
        .route(
            "/biz/default/search",
            post(business::search_default_business),
        )
        // Status transitions
        .route(
            "/biz/status/:flag/:bk_biz_id",
            put(business::change_business_status),
        )
        .route(
            "/biz/:bk_biz_id",
            put(business::update_business).delete(business::delete_business),
        )
        .route(
            "/biz/:bk_biz_id/internal-module",
            get(business::get_internal_module),
        )
}
