//! Health check endpoint for liveness probes.
//!
//! Does not touch the store, so it stays green while storage is unavailable.

use axum::Json;
use axum::http::StatusCode;
use serde::Serialize;

/// Static health status body.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct HealthStatus {
    pub status: &'static str,
    pub message: &'static str,
}

/// Health check handler.
///
/// ```ignore
/// GET /webhook/health HTTP/1.1
///
/// HTTP/1.1 200 OK
///
/// {"status": "ok", "message": "Webhook server is running"}
/// ```
pub async fn health_handler() -> (StatusCode, Json<HealthStatus>) {
    (
        StatusCode::OK,
        Json(HealthStatus {
            status: "ok",
            message: "Webhook server is running",
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn health_returns_200_ok() {
        let (status, Json(body)) = health_handler().await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.status, "ok");
    }
}
