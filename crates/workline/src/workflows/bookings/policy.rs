use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use super::domain::{Booking, BookingStatus};

pub const DEFAULT_CANCELLATION_LEAD_HOURS: i64 = 2;

/// Answer to "may this booking still be called off?".
///
/// Advisory only: the transition graph is what actually accepts or rejects a
/// cancellation, so a `true` here can still lose a race with another writer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CancellationEligibility {
    pub can_cancel: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl CancellationEligibility {
    fn allowed() -> Self {
        Self {
            can_cancel: true,
            reason: None,
        }
    }

    fn blocked(reason: String) -> Self {
        Self {
            can_cancel: false,
            reason: Some(reason),
        }
    }
}

/// Time-based rules governing when a cancellation is acceptable.
#[derive(Debug, Clone)]
pub struct CancellationPolicy {
    lead_hours: i64,
}

impl CancellationPolicy {
    pub fn new(lead_hours: i64) -> Self {
        let sanitized = if lead_hours >= 0 {
            lead_hours
        } else {
            DEFAULT_CANCELLATION_LEAD_HOURS
        };

        Self {
            lead_hours: sanitized,
        }
    }

    pub fn lead_hours(&self) -> i64 {
        self.lead_hours
    }

    pub fn min_lead(&self) -> Duration {
        Duration::hours(self.lead_hours)
    }

    /// Evaluate eligibility at `now`. Blocks once work has started, once the
    /// booking is closed, or when the scheduled start is nearer than the
    /// required notice (a start already in the past counts as too near).
    pub fn evaluate(&self, booking: &Booking, now: DateTime<Utc>) -> CancellationEligibility {
        if matches!(
            booking.status,
            BookingStatus::InProgress
                | BookingStatus::Completed
                | BookingStatus::Approved
                | BookingStatus::Paid
        ) {
            return CancellationEligibility::blocked("work already started".to_string());
        }

        if booking.status.is_terminal() {
            return CancellationEligibility::blocked("booking already closed".to_string());
        }

        if let Some(start) = booking.scheduled_start {
            if start - now < self.min_lead() {
                return CancellationEligibility::blocked(format!(
                    "too close to scheduled start (less than {} hours notice)",
                    self.lead_hours
                ));
            }
        }

        CancellationEligibility::allowed()
    }
}

impl Default for CancellationPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_CANCELLATION_LEAD_HOURS)
    }
}
