use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use tokio::net::TcpListener;
use tracing::info;
use workline::config::AppConfig;
use workline::error::AppError;
use workline::telemetry;
use workline::workflows::bookings::BookingService;

use crate::cli::ServeArgs;
use crate::infra::{
    marketplace_policies, AppState, InMemoryBookingRepository, InMemoryNotificationPublisher,
};
use crate::routes::with_booking_routes;

pub(crate) async fn run(args: ServeArgs) -> Result<(), AppError> {
    let config = load_config(args)?;
    telemetry::init(&config.telemetry)?;

    let (metrics_layer, metrics_handle) = PrometheusMetricLayer::pair();
    let readiness = Arc::new(AtomicBool::new(false));

    let (pricing, cancellation) = marketplace_policies(&config.marketplace);
    let service = Arc::new(BookingService::with_policies(
        Arc::new(InMemoryBookingRepository::default()),
        Arc::new(InMemoryNotificationPublisher::default()),
        pricing,
        cancellation,
    ));

    let app = with_booking_routes(service)
        .layer(Extension(AppState {
            readiness: readiness.clone(),
            metrics: Arc::new(metrics_handle),
        }))
        .layer(metrics_layer);

    let bind_addr = config.server.socket_addr()?;
    let listener = TcpListener::bind(bind_addr).await?;
    readiness.store(true, Ordering::Release);

    info!(?config.environment, %bind_addr, "booking lifecycle engine ready");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Environment configuration with CLI flags folded in on top.
fn load_config(args: ServeArgs) -> Result<AppConfig, AppError> {
    let mut config = AppConfig::load()?;
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    Ok(config)
}
