use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::Value;

use crate::utils::clock::RequestTime;

/// Body of every response, success or failure.
#[derive(Serialize)]
pub struct ApiResponse<T>
where
    T: Serialize,
{
    pub timestamp: String,
    pub message: String,
    pub data: Option<T>,
    pub error: Option<Value>,
}

pub fn envelope<T>(
    requested_at: &RequestTime,
    message: impl Into<String>,
    data: Option<T>,
    error: Option<Value>,
    status: StatusCode,
) -> Response
where
    T: Serialize,
{
    let body = ApiResponse {
        timestamp: requested_at.to_string(),
        message: message.into(),
        data,
        error,
    };

    (status, Json(body)).into_response()
}

pub fn success<T>(requested_at: &RequestTime, message: impl Into<String>, data: T) -> Response
where
    T: Serialize,
{
    envelope(requested_at, message, Some(data), None, StatusCode::OK)
}

pub fn error(
    requested_at: &RequestTime,
    message: impl Into<String>,
    detail: Value,
    status: StatusCode,
) -> Response {
    envelope::<()>(requested_at, message, None, Some(detail), status)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::clock::ResponseClock;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    async fn body_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn fixed_time() -> RequestTime {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
        ResponseClock::default().stamp_at(at)
    }

    #[tokio::test]
    async fn test_success_envelope_shape() {
        let response = success(&fixed_time(), "Get event success", vec![1, 2]);
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(
            body,
            json!({
                "timestamp": "2024-05-01 07:00:00",
                "message": "Get event success",
                "data": [1, 2],
                "error": null,
            })
        );
    }

    #[tokio::test]
    async fn test_error_envelope_shape() {
        let response = error(
            &fixed_time(),
            "Event not found!",
            json!({ "code": "NOT_FOUND" }),
            StatusCode::NOT_FOUND,
        );
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = body_json(response).await;
        assert!(body["data"].is_null());
        assert_eq!(body["error"]["code"], "NOT_FOUND");
        assert_eq!(body["message"], "Event not found!");
    }
}
