use std::io::Write;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::info;

use super::domain::{
    Booking, BookingApplication, BookingId, BookingStatus, BookingValidationError, Money, Party,
    PaymentStatus,
};
use super::export::{self, ExportError};
use super::lifecycle::{self, TransitionError};
use super::payments::PricingConfig;
use super::policy::{CancellationEligibility, CancellationPolicy};
use super::repository::{
    BookingNotification, BookingRecord, BookingRepository, NotificationPublisher, NotifyError,
    RepositoryError,
};
use super::stats::{self, BookingStatistics};
use super::timeline::{TimelineEntry, WorkDuration};

/// Service composing the lifecycle rules, repository, and notifier.
///
/// Every mutation runs a fetch, an in-memory change, and a version-checked
/// write, so concurrent writers against one booking resolve to exactly one
/// winner.
pub struct BookingService<R, N> {
    repository: Arc<R>,
    notifier: Arc<N>,
    pricing: PricingConfig,
    cancellation: CancellationPolicy,
}

static BOOKING_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_booking_id() -> BookingId {
    let id = BOOKING_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    BookingId(format!("bk-{id:06}"))
}

impl<R, N> BookingService<R, N>
where
    R: BookingRepository + 'static,
    N: NotificationPublisher + 'static,
{
    pub fn new(repository: Arc<R>, notifier: Arc<N>) -> Self {
        Self::with_policies(
            repository,
            notifier,
            PricingConfig::default(),
            CancellationPolicy::default(),
        )
    }

    pub fn with_policies(
        repository: Arc<R>,
        notifier: Arc<N>,
        pricing: PricingConfig,
        cancellation: CancellationPolicy,
    ) -> Self {
        Self {
            repository,
            notifier,
            pricing,
            cancellation,
        }
    }

    pub fn pricing(&self) -> &PricingConfig {
        &self.pricing
    }

    pub fn cancellation_policy(&self) -> &CancellationPolicy {
        &self.cancellation
    }

    /// Open a booking from a worker's application, returning the stored
    /// record with its figures settled.
    pub fn open(
        &self,
        application: BookingApplication,
    ) -> Result<BookingRecord, BookingServiceError> {
        let booking = Booking::open(next_booking_id(), application, &self.pricing, Utc::now())?;
        let record = BookingRecord {
            booking,
            version: 1,
        };

        let stored = self.repository.insert(record)?;
        info!(
            booking_id = %stored.booking.id.0,
            job_id = %stored.booking.job_id.0,
            "booking opened"
        );
        Ok(stored)
    }

    /// Fetch a booking record for API responses.
    pub fn get(&self, booking_id: &BookingId) -> Result<BookingRecord, BookingServiceError> {
        self.load(booking_id)
    }

    /// Apply a status transition and persist it, then signal the notifier.
    ///
    /// The persist is a version-checked write: when another writer slips in
    /// between the read and the write this fails with a conflict and no
    /// notification goes out.
    pub fn update_status(
        &self,
        booking_id: &BookingId,
        to: BookingStatus,
        notes: Option<String>,
    ) -> Result<BookingRecord, BookingServiceError> {
        let mut record = self.load(booking_id)?;
        let change =
            lifecycle::apply_status_change(&mut record.booking, to, Utc::now(), notes.as_deref())?;

        let stored = self.repository.update(record)?;
        self.notifier
            .publish(BookingNotification::from_change(&stored.booking, change))?;

        info!(
            booking_id = %stored.booking.id.0,
            from = change.from.label(),
            to = change.to.label(),
            "booking status updated"
        );
        Ok(stored)
    }

    /// Apply an externally driven payment change (escrow webhooks and the
    /// like). Funds release is not accepted here; it rides the `paid` edge.
    pub fn update_payment_status(
        &self,
        booking_id: &BookingId,
        to: PaymentStatus,
    ) -> Result<BookingRecord, BookingServiceError> {
        let mut record = self.load(booking_id)?;
        lifecycle::apply_payment_change(&mut record.booking, to, Utc::now())?;

        let stored = self.repository.update(record)?;
        info!(
            booking_id = %stored.booking.id.0,
            payment_status = to.label(),
            "payment status updated"
        );
        Ok(stored)
    }

    /// Agree the planned execution window.
    pub fn set_schedule(
        &self,
        booking_id: &BookingId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<BookingRecord, BookingServiceError> {
        let mut record = self.load(booking_id)?;
        record.booking.set_schedule(start, end)?;
        Ok(self.repository.update(record)?)
    }

    /// Reconcile the actual execution window after the fact.
    pub fn record_actual_window(
        &self,
        booking_id: &BookingId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<BookingRecord, BookingServiceError> {
        let mut record = self.load(booking_id)?;
        record.booking.record_actual_window(start, end)?;
        Ok(self.repository.update(record)?)
    }

    /// Replace the final amount and recompute the commission split.
    pub fn override_final_amount(
        &self,
        booking_id: &BookingId,
        amount: Money,
    ) -> Result<BookingRecord, BookingServiceError> {
        let mut record = self.load(booking_id)?;
        record
            .booking
            .override_final_amount(amount, &self.pricing, Utc::now())?;

        let stored = self.repository.update(record)?;
        info!(
            booking_id = %stored.booking.id.0,
            final_amount = stored.booking.final_amount.minor_units(),
            "final amount overridden"
        );
        Ok(stored)
    }

    /// Record a satisfaction rating for one side of the booking.
    pub fn record_satisfaction(
        &self,
        booking_id: &BookingId,
        party: Party,
        rating: u8,
    ) -> Result<BookingRecord, BookingServiceError> {
        let mut record = self.load(booking_id)?;
        record.booking.record_satisfaction(party, rating)?;
        Ok(self.repository.update(record)?)
    }

    /// Advisory cancellation check against the configured policy.
    pub fn cancellation_eligibility(
        &self,
        booking_id: &BookingId,
    ) -> Result<CancellationEligibility, BookingServiceError> {
        let record = self.load(booking_id)?;
        Ok(self.cancellation.evaluate(&record.booking, Utc::now()))
    }

    /// Derived milestone timeline for a booking.
    pub fn timeline(&self, booking_id: &BookingId) -> Result<Vec<TimelineEntry>, BookingServiceError> {
        let record = self.load(booking_id)?;
        Ok(record.booking.timeline())
    }

    /// Estimated-versus-actual duration figures for a booking.
    pub fn work_duration(&self, booking_id: &BookingId) -> Result<WorkDuration, BookingServiceError> {
        let record = self.load(booking_id)?;
        Ok(record.booking.work_duration())
    }

    /// Portfolio statistics over every stored booking. Read-only; runs
    /// without locking.
    pub fn statistics(&self) -> Result<BookingStatistics, BookingServiceError> {
        let records = self.repository.all()?;
        Ok(stats::aggregate(records.iter().map(|record| &record.booking)))
    }

    /// Payout reconciliation report over settled bookings, rendered as CSV.
    pub fn payout_report_csv(&self) -> Result<String, BookingServiceError> {
        let records = self.repository.all()?;
        Ok(export::payout_report_csv(
            records.iter().map(|record| &record.booking),
        )?)
    }

    /// Stream the payout reconciliation report into `writer`, returning the
    /// row count.
    pub fn write_payout_report<W: Write>(&self, writer: W) -> Result<usize, BookingServiceError> {
        let records = self.repository.all()?;
        Ok(export::write_payout_report(
            records.iter().map(|record| &record.booking),
            writer,
        )?)
    }

    fn load(&self, booking_id: &BookingId) -> Result<BookingRecord, BookingServiceError> {
        let record = self
            .repository
            .fetch(booking_id)?
            .ok_or(RepositoryError::NotFound)?;
        Ok(record)
    }
}

/// Error raised by the booking service.
#[derive(Debug, thiserror::Error)]
pub enum BookingServiceError {
    #[error(transparent)]
    Validation(#[from] BookingValidationError),
    #[error(transparent)]
    Transition(#[from] TransitionError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Notify(#[from] NotifyError),
    #[error(transparent)]
    Export(#[from] ExportError),
}
