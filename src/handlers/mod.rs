use axum::response::Response;
use serde::Serialize;

use crate::utils::clock::RequestTime;
use crate::utils::error::AppError;
use crate::utils::response::success;

pub mod events;

pub use events::{create_event, delete_event, list_events, update_event};

#[derive(Serialize)]
struct HealthPayload {
    status: &'static str,
    service: &'static str,
}

pub async fn health_check(requested_at: RequestTime) -> Response {
    let payload = HealthPayload {
        status: "ok",
        service: "event-api",
    };

    success(&requested_at, "Health check successful", payload)
}

pub async fn route_not_found(requested_at: RequestTime) -> Response {
    AppError::NotFound("Route not found".to_string()).into_envelope(&requested_at)
}
