//! Booking lifecycle engine for the services marketplace.
//!
//! A booking carries one job, one worker, and one client from application
//! through settlement. This module owns the status and payment state
//! machines, the commission split, the cancellation policy, the append-only
//! admin log, and the derived projections (timeline, duration, statistics,
//! payout export). Persistence and outbound messaging stay behind the
//! [`repository`] traits so callers plug in their own adapters.

pub mod domain;
pub mod export;
pub mod lifecycle;
pub mod payments;
pub mod policy;
pub mod repository;
pub mod router;
pub mod service;
pub mod stats;
pub mod timeline;

#[cfg(test)]
mod tests;

pub use domain::{
    AuditEntry, Booking, BookingApplication, BookingId, BookingStatus, BookingValidationError,
    ClientId, JobId, Money, Party, PaymentStatus, StatusInfo, WorkerId,
};
pub use export::ExportError;
pub use lifecycle::{StatusChange, TransitionError};
pub use payments::{PaymentBreakdown, PricingConfig, DEFAULT_COMMISSION_RATE};
pub use policy::{CancellationEligibility, CancellationPolicy, DEFAULT_CANCELLATION_LEAD_HOURS};
pub use repository::{
    BookingNotification, BookingRecord, BookingRepository, BookingStatusView,
    NotificationPublisher, NotifyError, RepositoryError,
};
pub use router::booking_router;
pub use service::{BookingService, BookingServiceError};
pub use stats::BookingStatistics;
pub use timeline::{Efficiency, TimelineEntry, TimelineStage, WorkDuration};
