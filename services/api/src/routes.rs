use std::sync::atomic::Ordering;
use std::sync::Arc;

use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Extension, Json};
use serde_json::json;
use workline::workflows::bookings::{
    booking_router, BookingRepository, BookingService, NotificationPublisher,
};

use crate::infra::AppState;

/// Engine routes plus the operational endpoints every deployment expects.
pub(crate) fn with_booking_routes<R, N>(service: Arc<BookingService<R, N>>) -> axum::Router
where
    R: BookingRepository + 'static,
    N: NotificationPublisher + 'static,
{
    booking_router(service)
        .route("/health", get(health_endpoint))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
}

pub(crate) async fn health_endpoint() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    if state.readiness.load(Ordering::Relaxed) {
        (StatusCode::OK, Json(json!({ "status": "ready" })))
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": "initializing" })),
        )
    }
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicBool;

    use metrics_exporter_prometheus::PrometheusBuilder;

    use super::*;

    fn state_with(ready: bool) -> AppState {
        AppState {
            readiness: Arc::new(AtomicBool::new(ready)),
            metrics: Arc::new(PrometheusBuilder::new().build_recorder().handle()),
        }
    }

    #[tokio::test]
    async fn health_answers_ok() {
        let Json(body) = health_endpoint().await;
        assert_eq!(body, json!({ "status": "ok" }));
    }

    #[tokio::test]
    async fn readiness_flips_with_the_flag() {
        let state = state_with(false);

        let early = readiness_endpoint(Extension(state.clone()))
            .await
            .into_response();
        assert_eq!(early.status(), StatusCode::SERVICE_UNAVAILABLE);

        state.readiness.store(true, Ordering::Release);
        let ready = readiness_endpoint(Extension(state)).await.into_response();
        assert_eq!(ready.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn metrics_render_in_prometheus_exposition_format() {
        let response = metrics_endpoint(Extension(state_with(true)))
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response
                .headers()
                .get(header::CONTENT_TYPE)
                .expect("content type set"),
            "text/plain; version=0.0.4"
        );
    }
}
