use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::Value;

use crate::workflows::bookings::domain::{
    Booking, BookingApplication, BookingId, BookingStatus, ClientId, JobId, Money, WorkerId,
};
use crate::workflows::bookings::lifecycle;
use crate::workflows::bookings::payments::PricingConfig;
use crate::workflows::bookings::policy::CancellationPolicy;
use crate::workflows::bookings::repository::{
    BookingNotification, BookingRecord, BookingRepository, NotificationPublisher, NotifyError,
    RepositoryError,
};
use crate::workflows::bookings::{booking_router, BookingService};

pub(super) fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 11, 3, 9, 0, 0)
        .single()
        .expect("valid timestamp")
}

pub(super) fn at(hours_after_base: i64) -> DateTime<Utc> {
    base_time() + Duration::hours(hours_after_base)
}

pub(super) fn application() -> BookingApplication {
    BookingApplication {
        job_id: JobId("job-204".to_string()),
        worker_id: WorkerId("wkr-88".to_string()),
        client_id: ClientId("cli-17".to_string()),
        proposed_rate: Money::from_minor(250),
        estimated_hours: 4,
        final_amount: None,
        message: Some("Available this week, bringing my own tools".to_string()),
        questions_responses: BTreeMap::from([(
            "has_ladder".to_string(),
            "yes".to_string(),
        )]),
    }
}

pub(super) fn booking() -> Booking {
    Booking::open(
        BookingId("bk-test-1".to_string()),
        application(),
        &PricingConfig::default(),
        base_time(),
    )
    .expect("valid application opens")
}

pub(super) fn booking_with_id(suffix: &str) -> Booking {
    let mut booking = booking();
    booking.id = BookingId(format!("bk-{suffix}"));
    booking
}

/// Walk a freshly opened booking along `path`, stepping an hour per edge.
pub(super) fn advance(booking: &mut Booking, path: &[BookingStatus]) {
    for (step, status) in path.iter().enumerate() {
        lifecycle::apply_status_change(booking, *status, at(step as i64 + 1), None)
            .expect("path edge applies");
    }
}

pub(super) fn booking_in(status: BookingStatus) -> Booking {
    let mut booking = booking();
    advance(&mut booking, &path_to(status));
    booking
}

pub(super) fn path_to(status: BookingStatus) -> Vec<BookingStatus> {
    use BookingStatus::*;

    match status {
        Pending => vec![],
        Accepted => vec![Accepted],
        Confirmed => vec![Accepted, Confirmed],
        InProgress => vec![Accepted, Confirmed, InProgress],
        Completed => vec![Accepted, Confirmed, InProgress, Completed],
        Approved => vec![Accepted, Confirmed, InProgress, Completed, Approved],
        Paid => vec![Accepted, Confirmed, InProgress, Completed, Approved, Paid],
        Cancelled => vec![Cancelled],
        Disputed => vec![Disputed],
        Rejected => vec![Rejected],
    }
}

pub(super) fn build_service() -> (
    BookingService<MemoryRepository, MemoryNotifier>,
    Arc<MemoryRepository>,
    Arc<MemoryNotifier>,
) {
    let repository = Arc::new(MemoryRepository::default());
    let notifier = Arc::new(MemoryNotifier::default());
    let service = BookingService::new(repository.clone(), notifier.clone());
    (service, repository, notifier)
}

pub(super) fn service_with_policies(
    pricing: PricingConfig,
    cancellation: CancellationPolicy,
) -> (
    BookingService<MemoryRepository, MemoryNotifier>,
    Arc<MemoryRepository>,
    Arc<MemoryNotifier>,
) {
    let repository = Arc::new(MemoryRepository::default());
    let notifier = Arc::new(MemoryNotifier::default());
    let service =
        BookingService::with_policies(repository.clone(), notifier.clone(), pricing, cancellation);
    (service, repository, notifier)
}

/// Put a hand-built booking into the repository at version 1.
pub(super) fn seed(repository: &MemoryRepository, booking: Booking) -> BookingRecord {
    repository
        .insert(BookingRecord {
            booking,
            version: 1,
        })
        .expect("seed insert succeeds")
}

#[derive(Default, Clone)]
pub(super) struct MemoryRepository {
    pub(super) records: Arc<Mutex<HashMap<BookingId, BookingRecord>>>,
}

impl BookingRepository for MemoryRepository {
    fn insert(&self, record: BookingRecord) -> Result<BookingRecord, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        if guard.contains_key(&record.booking.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(record.booking.id.clone(), record.clone());
        Ok(record)
    }

    fn update(&self, record: BookingRecord) -> Result<BookingRecord, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        let stored = guard
            .get_mut(&record.booking.id)
            .ok_or(RepositoryError::NotFound)?;
        if stored.version != record.version {
            return Err(RepositoryError::Conflict);
        }

        let next = BookingRecord {
            booking: record.booking,
            version: record.version + 1,
        };
        *stored = next.clone();
        Ok(next)
    }

    fn fetch(&self, id: &BookingId) -> Result<Option<BookingRecord>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn all(&self) -> Result<Vec<BookingRecord>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.values().cloned().collect())
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryNotifier {
    events: Arc<Mutex<Vec<BookingNotification>>>,
}

impl MemoryNotifier {
    pub(super) fn events(&self) -> Vec<BookingNotification> {
        self.events.lock().expect("notifier mutex poisoned").clone()
    }
}

impl NotificationPublisher for MemoryNotifier {
    fn publish(&self, notification: BookingNotification) -> Result<(), NotifyError> {
        self.events
            .lock()
            .expect("notifier mutex poisoned")
            .push(notification);
        Ok(())
    }
}

/// Serves one stored record but refuses every write with a conflict, so
/// service tests can exercise the lost-race path deterministically.
pub(super) struct ConflictingRepository {
    record: BookingRecord,
}

impl ConflictingRepository {
    pub(super) fn holding(booking: Booking) -> Self {
        Self {
            record: BookingRecord {
                booking,
                version: 1,
            },
        }
    }
}

impl BookingRepository for ConflictingRepository {
    fn insert(&self, _record: BookingRecord) -> Result<BookingRecord, RepositoryError> {
        Err(RepositoryError::Conflict)
    }

    fn update(&self, _record: BookingRecord) -> Result<BookingRecord, RepositoryError> {
        Err(RepositoryError::Conflict)
    }

    fn fetch(&self, _id: &BookingId) -> Result<Option<BookingRecord>, RepositoryError> {
        Ok(Some(self.record.clone()))
    }

    fn all(&self) -> Result<Vec<BookingRecord>, RepositoryError> {
        Ok(vec![self.record.clone()])
    }
}

pub(super) struct UnavailableRepository;

impl BookingRepository for UnavailableRepository {
    fn insert(&self, _record: BookingRecord) -> Result<BookingRecord, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn update(&self, _record: BookingRecord) -> Result<BookingRecord, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch(&self, _id: &BookingId) -> Result<Option<BookingRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn all(&self) -> Result<Vec<BookingRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

pub(super) fn booking_router_with_service(
    service: BookingService<MemoryRepository, MemoryNotifier>,
) -> axum::Router {
    booking_router(Arc::new(service))
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
