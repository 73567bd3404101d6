use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{Booking, BookingId, BookingStatus, ClientId, JobId, Money, WorkerId};
use super::lifecycle::StatusChange;

/// Repository record pairing a booking with its optimistic-lock version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingRecord {
    pub booking: Booking,
    pub version: u64,
}

impl BookingRecord {
    pub fn status_view(&self) -> BookingStatusView {
        let info = self.booking.status.info();
        BookingStatusView {
            booking_id: self.booking.id.clone(),
            status: self.booking.status.label(),
            payment_status: self.booking.payment_status.label(),
            description: info.description,
            next_actions: info.next_actions,
            can_edit: info.can_edit,
            color: info.color,
            final_amount: self.booking.final_amount,
            commission_amount: self.booking.commission_amount,
            worker_payout: self.booking.worker_payout,
            version: self.version,
        }
    }
}

/// Storage abstraction so the service module can be exercised in isolation.
///
/// Implementations back a relational store in production; the engine only
/// requires a locking read-modify-write cycle per booking.
pub trait BookingRepository: Send + Sync {
    fn insert(&self, record: BookingRecord) -> Result<BookingRecord, RepositoryError>;
    /// Compare-and-swap write: persists only when the stored version still
    /// equals `record.version`, returning the record with the version
    /// advanced. A lost race is a `Conflict`, and the caller is expected to
    /// reload and retry.
    fn update(&self, record: BookingRecord) -> Result<BookingRecord, RepositoryError>;
    fn fetch(&self, id: &BookingId) -> Result<Option<BookingRecord>, RepositoryError>;
    fn all(&self) -> Result<Vec<BookingRecord>, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("conflicting write detected")]
    Conflict,
    #[error("booking not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Trait describing the outbound notification hook (e-mail and SMS adapters
/// live outside the engine and consume these events).
pub trait NotificationPublisher: Send + Sync {
    fn publish(&self, notification: BookingNotification) -> Result<(), NotifyError>;
}

/// Status-change event payload handed to the notifier after a persist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingNotification {
    pub booking_id: BookingId,
    pub job_id: JobId,
    pub worker_id: WorkerId,
    pub client_id: ClientId,
    pub from: BookingStatus,
    pub to: BookingStatus,
    pub occurred_at: DateTime<Utc>,
}

impl BookingNotification {
    pub fn from_change(booking: &Booking, change: StatusChange) -> Self {
        Self {
            booking_id: booking.id.clone(),
            job_id: booking.job_id.clone(),
            worker_id: booking.worker_id.clone(),
            client_id: booking.client_id.clone(),
            from: change.from,
            to: change.to,
            occurred_at: change.occurred_at,
        }
    }
}

/// Notification dispatch error.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("notification transport unavailable: {0}")]
    Transport(String),
}

/// Presentation payload for a booking's current state.
#[derive(Debug, Clone, Serialize)]
pub struct BookingStatusView {
    pub booking_id: BookingId,
    pub status: &'static str,
    pub payment_status: &'static str,
    pub description: &'static str,
    pub next_actions: &'static [&'static str],
    pub can_edit: bool,
    pub color: &'static str,
    pub final_amount: Money,
    pub commission_amount: Money,
    pub worker_payout: Money,
    pub version: u64,
}
