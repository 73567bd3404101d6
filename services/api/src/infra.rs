use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

use metrics_exporter_prometheus::PrometheusHandle;
use workline::config::MarketplaceConfig;
use workline::workflows::bookings::{
    BookingId, BookingNotification, BookingRecord, BookingRepository, CancellationPolicy,
    NotificationPublisher, NotifyError, PricingConfig, RepositoryError,
};

/// Handles shared with the operational endpoints via `Extension`.
#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Mutex-map store. Versions advance on every successful update, which is
/// all the engine asks of a backing store.
#[derive(Default, Clone)]
pub(crate) struct InMemoryBookingRepository {
    records: Arc<Mutex<HashMap<BookingId, BookingRecord>>>,
}

impl BookingRepository for InMemoryBookingRepository {
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

        let persisted = BookingRecord {
            booking: record.booking,
            version: record.version + 1,
        };
        *stored = persisted.clone();
        Ok(persisted)
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

/// Collects events in memory so the demo can print what would have gone out
/// to the e-mail and SMS adapters.
#[derive(Default, Clone)]
pub(crate) struct InMemoryNotificationPublisher {
    events: Arc<Mutex<Vec<BookingNotification>>>,
}

impl NotificationPublisher for InMemoryNotificationPublisher {
    fn publish(&self, notification: BookingNotification) -> Result<(), NotifyError> {
        let mut guard = self.events.lock().expect("notifier mutex poisoned");
        guard.push(notification);
        Ok(())
    }
}

impl InMemoryNotificationPublisher {
    pub(crate) fn events(&self) -> Vec<BookingNotification> {
        self.events.lock().expect("notifier mutex poisoned").clone()
    }
}

/// Engine policies derived from startup configuration.
pub(crate) fn marketplace_policies(
    config: &MarketplaceConfig,
) -> (PricingConfig, CancellationPolicy) {
    let pricing = PricingConfig {
        commission_rate: config.commission_rate,
    };
    let cancellation = CancellationPolicy::new(config.cancellation_lead_hours);
    (pricing, cancellation)
}
