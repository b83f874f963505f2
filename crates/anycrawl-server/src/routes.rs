//! Router configuration for the web server.

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;

use crate::handlers;
use crate::openapi::openapi_spec;
use crate::state::AppState;

/// Create the main router with all routes.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/v1/health", get(handlers::health::health))
        .route("/v1/scrape", post(handlers::scrape::scrape))
        .route("/v1/crawl", post(handlers::crawl::create_crawl))
        .route("/v1/crawl/:id", get(handlers::crawl::get_crawl))
        .route(
            "/v1/crawl/:id/results",
            get(handlers::crawl::get_crawl_results),
        )
        .route("/v1/map", post(handlers::map::map))
        .route("/v1/search", post(handlers::search::search))
        .route(
            "/v1/webhooks",
            post(handlers::webhooks::create).get(handlers::webhooks::list),
        )
        .route(
            "/v1/webhooks/:id",
            get(handlers::webhooks::get)
                .patch(handlers::webhooks::patch)
                .delete(handlers::webhooks::delete),
        )
        .route(
            "/v1/webhooks/:id/activate",
            post(handlers::webhooks::activate),
        )
        .route(
            "/v1/webhooks/:id/deactivate",
            post(handlers::webhooks::deactivate),
        )
        .route("/v1/webhooks/:id/test", post(handlers::webhooks::test))
        .route(
            "/v1/webhooks/:id/deliveries",
            get(handlers::webhooks::deliveries),
        )
        .route(
            "/v1/webhooks/:id/deliveries/:delivery_id/replay",
            post(handlers::webhooks::replay_delivery),
        )
        .route("/api-docs/openapi.json", get(openapi_spec))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
