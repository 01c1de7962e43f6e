use axum::extract::DefaultBodyLimit;
use axum::{routing::get, routing::put, Router};
use tower_http::trace::TraceLayer;

use crate::config::{create_cors_layer, create_security_headers_layer, Config};
use crate::handlers::{
    create_event, delete_event, health_check, list_events, route_not_found, update_event,
};
use crate::state::AppState;

/// Layer settings taken from [`Config`].
pub struct RouteOptions {
    pub max_upload_bytes: usize,
    pub cors_allowed_origins: Vec<String>,
    pub production: bool,
}

impl From<&Config> for RouteOptions {
    fn from(config: &Config) -> Self {
        Self {
            max_upload_bytes: config.max_upload_bytes,
            cors_allowed_origins: config.cors_allowed_origins.clone(),
            production: config.production,
        }
    }
}

pub fn create_routes(state: AppState, options: RouteOptions) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/events", get(list_events).post(create_event))
        .route("/events/:id", put(update_event).delete(delete_event))
        .fallback(route_not_found)
        .layer(DefaultBodyLimit::max(options.max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(create_security_headers_layer(options.production))
        .layer(create_cors_layer(&options.cors_allowed_origins))
        .with_state(state)
}
