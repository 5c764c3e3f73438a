use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::instrument;

use super::errors::{error_body, ApiError};
use crate::observability::{Metrics, MetricsError};

const PROMETHEUS_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Prometheus scrape of the HTTP, DynamoDB, menu and admin counters
#[instrument(name = "metrics_handler", skip(metrics))]
pub async fn metrics_handler(
    State(metrics): State<Arc<Metrics>>,
) -> Result<Response, ApiError> {
    scrape_response(metrics.encode())
}

fn scrape_response(encoded: Result<String, MetricsError>) -> Result<Response, ApiError> {
    match encoded {
        Ok(text) => Ok(([(header::CONTENT_TYPE, PROMETHEUS_CONTENT_TYPE)], text).into_response()),
        Err(e) => {
            crate::error_with_trace!(error = %e, "Metrics scrape failed");
            Err(error_body(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Metrics unavailable",
                e.to_string(),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request, routing::get, Router};
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_scrape_includes_menu_and_admin_families() {
        let metrics = Arc::new(Metrics::new().unwrap());
        metrics.record_menu_served("food", "mr", 42);
        metrics.record_admin_login(false);
        metrics.record_image_upload("drinks", true);

        let app = Router::new()
            .route("/metrics", get(metrics_handler))
            .with_state(metrics);
        let response = app
            .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            PROMETHEUS_CONTENT_TYPE
        );

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(text.contains("menu_items_served_count{kind=\"food\",language=\"mr\"} 1"));
        assert!(text.contains("admin_logins_total{status=\"rejected\"} 1"));
        assert!(text.contains("image_uploads_total{kind=\"drinks\",status=\"success\"} 1"));
    }

    #[test]
    fn test_encoding_failure_uses_error_body() {
        let (status, body) =
            scrape_response(Err(MetricsError::Encoding("invalid utf-8".to_string())))
                .unwrap_err();

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Metrics unavailable");
        assert!(body["message"]
            .as_str()
            .unwrap()
            .contains("invalid utf-8"));
        assert!(body.get("timestamp").is_some());
    }
}
