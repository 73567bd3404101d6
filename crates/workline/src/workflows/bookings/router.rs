use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;

use super::domain::{BookingApplication, BookingId, BookingStatus, Money, Party, PaymentStatus};
use super::repository::{BookingRepository, NotificationPublisher, RepositoryError};
use super::service::{BookingService, BookingServiceError};

/// Router builder exposing the booking lifecycle over HTTP.
pub fn booking_router<R, N>(service: Arc<BookingService<R, N>>) -> Router
where
    R: BookingRepository + 'static,
    N: NotificationPublisher + 'static,
{
    Router::new()
        .route("/api/v1/bookings", post(open_handler::<R, N>))
        .route("/api/v1/bookings/stats", get(stats_handler::<R, N>))
        .route("/api/v1/bookings/:booking_id", get(get_handler::<R, N>))
        .route(
            "/api/v1/bookings/:booking_id/status",
            get(status_view_handler::<R, N>).post(update_status_handler::<R, N>),
        )
        .route(
            "/api/v1/bookings/:booking_id/payment-status",
            post(update_payment_handler::<R, N>),
        )
        .route(
            "/api/v1/bookings/:booking_id/schedule",
            post(schedule_handler::<R, N>),
        )
        .route(
            "/api/v1/bookings/:booking_id/actual-window",
            post(actual_window_handler::<R, N>),
        )
        .route(
            "/api/v1/bookings/:booking_id/final-amount",
            post(final_amount_handler::<R, N>),
        )
        .route(
            "/api/v1/bookings/:booking_id/satisfaction",
            post(satisfaction_handler::<R, N>),
        )
        .route(
            "/api/v1/bookings/:booking_id/timeline",
            get(timeline_handler::<R, N>),
        )
        .route(
            "/api/v1/bookings/:booking_id/cancellation",
            get(cancellation_handler::<R, N>),
        )
        .route(
            "/api/v1/bookings/:booking_id/duration",
            get(duration_handler::<R, N>),
        )
        .route("/api/v1/payouts/report", get(payout_report_handler::<R, N>))
        .with_state(service)
}

#[derive(Debug, Deserialize)]
pub struct StatusChangeRequest {
    pub status: BookingStatus,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PaymentChangeRequest {
    pub payment_status: PaymentStatus,
}

#[derive(Debug, Deserialize)]
pub struct WindowRequest {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct FinalAmountRequest {
    pub amount: Money,
}

#[derive(Debug, Deserialize)]
pub struct SatisfactionRequest {
    pub party: Party,
    pub rating: u8,
}

fn error_response(error: BookingServiceError) -> Response {
    let status = match &error {
        BookingServiceError::Validation(_) | BookingServiceError::Transition(_) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        BookingServiceError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
        BookingServiceError::Repository(RepositoryError::Conflict) => StatusCode::CONFLICT,
        BookingServiceError::Repository(RepositoryError::Unavailable(_))
        | BookingServiceError::Notify(_)
        | BookingServiceError::Export(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    let payload = json!({
        "error": error.to_string(),
    });
    (status, axum::Json(payload)).into_response()
}

pub(crate) async fn open_handler<R, N>(
    State(service): State<Arc<BookingService<R, N>>>,
    axum::Json(application): axum::Json<BookingApplication>,
) -> Response
where
    R: BookingRepository + 'static,
    N: NotificationPublisher + 'static,
{
    match service.open(application) {
        Ok(record) => (StatusCode::CREATED, axum::Json(record)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn get_handler<R, N>(
    State(service): State<Arc<BookingService<R, N>>>,
    Path(booking_id): Path<String>,
) -> Response
where
    R: BookingRepository + 'static,
    N: NotificationPublisher + 'static,
{
    match service.get(&BookingId(booking_id)) {
        Ok(record) => (StatusCode::OK, axum::Json(record)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn status_view_handler<R, N>(
    State(service): State<Arc<BookingService<R, N>>>,
    Path(booking_id): Path<String>,
) -> Response
where
    R: BookingRepository + 'static,
    N: NotificationPublisher + 'static,
{
    match service.get(&BookingId(booking_id)) {
        Ok(record) => (StatusCode::OK, axum::Json(record.status_view())).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn update_status_handler<R, N>(
    State(service): State<Arc<BookingService<R, N>>>,
    Path(booking_id): Path<String>,
    axum::Json(request): axum::Json<StatusChangeRequest>,
) -> Response
where
    R: BookingRepository + 'static,
    N: NotificationPublisher + 'static,
{
    match service.update_status(&BookingId(booking_id), request.status, request.notes) {
        Ok(record) => (StatusCode::OK, axum::Json(record)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn update_payment_handler<R, N>(
    State(service): State<Arc<BookingService<R, N>>>,
    Path(booking_id): Path<String>,
    axum::Json(request): axum::Json<PaymentChangeRequest>,
) -> Response
where
    R: BookingRepository + 'static,
    N: NotificationPublisher + 'static,
{
    match service.update_payment_status(&BookingId(booking_id), request.payment_status) {
        Ok(record) => (StatusCode::OK, axum::Json(record)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn schedule_handler<R, N>(
    State(service): State<Arc<BookingService<R, N>>>,
    Path(booking_id): Path<String>,
    axum::Json(request): axum::Json<WindowRequest>,
) -> Response
where
    R: BookingRepository + 'static,
    N: NotificationPublisher + 'static,
{
    match service.set_schedule(&BookingId(booking_id), request.start, request.end) {
        Ok(record) => (StatusCode::OK, axum::Json(record)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn actual_window_handler<R, N>(
    State(service): State<Arc<BookingService<R, N>>>,
    Path(booking_id): Path<String>,
    axum::Json(request): axum::Json<WindowRequest>,
) -> Response
where
    R: BookingRepository + 'static,
    N: NotificationPublisher + 'static,
{
    match service.record_actual_window(&BookingId(booking_id), request.start, request.end) {
        Ok(record) => (StatusCode::OK, axum::Json(record)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn final_amount_handler<R, N>(
    State(service): State<Arc<BookingService<R, N>>>,
    Path(booking_id): Path<String>,
    axum::Json(request): axum::Json<FinalAmountRequest>,
) -> Response
where
    R: BookingRepository + 'static,
    N: NotificationPublisher + 'static,
{
    match service.override_final_amount(&BookingId(booking_id), request.amount) {
        Ok(record) => (StatusCode::OK, axum::Json(record)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn satisfaction_handler<R, N>(
    State(service): State<Arc<BookingService<R, N>>>,
    Path(booking_id): Path<String>,
    axum::Json(request): axum::Json<SatisfactionRequest>,
) -> Response
where
    R: BookingRepository + 'static,
    N: NotificationPublisher + 'static,
{
    match service.record_satisfaction(&BookingId(booking_id), request.party, request.rating) {
        Ok(record) => (StatusCode::OK, axum::Json(record)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn timeline_handler<R, N>(
    State(service): State<Arc<BookingService<R, N>>>,
    Path(booking_id): Path<String>,
) -> Response
where
    R: BookingRepository + 'static,
    N: NotificationPublisher + 'static,
{
    match service.timeline(&BookingId(booking_id)) {
        Ok(timeline) => (StatusCode::OK, axum::Json(timeline)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn cancellation_handler<R, N>(
    State(service): State<Arc<BookingService<R, N>>>,
    Path(booking_id): Path<String>,
) -> Response
where
    R: BookingRepository + 'static,
    N: NotificationPublisher + 'static,
{
    match service.cancellation_eligibility(&BookingId(booking_id)) {
        Ok(eligibility) => (StatusCode::OK, axum::Json(eligibility)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn duration_handler<R, N>(
    State(service): State<Arc<BookingService<R, N>>>,
    Path(booking_id): Path<String>,
) -> Response
where
    R: BookingRepository + 'static,
    N: NotificationPublisher + 'static,
{
    match service.work_duration(&BookingId(booking_id)) {
        Ok(duration) => (StatusCode::OK, axum::Json(duration)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn stats_handler<R, N>(
    State(service): State<Arc<BookingService<R, N>>>,
) -> Response
where
    R: BookingRepository + 'static,
    N: NotificationPublisher + 'static,
{
    match service.statistics() {
        Ok(statistics) => (StatusCode::OK, axum::Json(statistics)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn payout_report_handler<R, N>(
    State(service): State<Arc<BookingService<R, N>>>,
) -> Response
where
    R: BookingRepository + 'static,
    N: NotificationPublisher + 'static,
{
    match service.payout_report_csv() {
        Ok(csv) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/csv")],
            csv,
        )
            .into_response(),
        Err(error) => error_response(error),
    }
}
