use std::collections::BTreeMap;
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, Sub};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::payments::{split, PricingConfig};

/// Identifier wrapper for bookings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BookingId(pub String);

/// Identifier of the job posting the booking fulfills.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobId(pub String);

/// Identifier of the worker who applied.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorkerId(pub String);

/// Identifier of the client who posted the job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClientId(pub String);

/// Monetary amount in the currency's minor unit.
///
/// All pricing math in the engine happens on integers; fractional currency
/// only appears when formatting for humans.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Self = Self(0);

    pub const fn from_minor(units: i64) -> Self {
        Self(units)
    }

    pub const fn minor_units(self) -> i64 {
        self.0
    }

    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }
}

impl Add for Money {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self(self.0 + other.0)
    }
}

impl Sub for Money {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Self(self.0 - other.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / 100, abs % 100)
    }
}

pub const MIN_HOURLY_RATE: Money = Money::from_minor(50);
pub const MAX_HOURLY_RATE: Money = Money::from_minor(50_000);
pub const MIN_ESTIMATED_HOURS: u32 = 1;
pub const MAX_ESTIMATED_HOURS: u32 = 2_000;
pub const MIN_SATISFACTION_RATING: u8 = 1;
pub const MAX_SATISFACTION_RATING: u8 = 5;

/// Work-progress status of a booking.
///
/// The forward pipeline runs `pending` through `paid`; `cancelled`,
/// `disputed`, and `rejected` are side exits. Legal edges live in
/// [`super::lifecycle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Pending,
    Accepted,
    Confirmed,
    InProgress,
    Completed,
    Approved,
    Paid,
    Cancelled,
    Disputed,
    Rejected,
}

impl BookingStatus {
    pub const fn ordered() -> [Self; 10] {
        [
            Self::Pending,
            Self::Accepted,
            Self::Confirmed,
            Self::InProgress,
            Self::Completed,
            Self::Approved,
            Self::Paid,
            Self::Cancelled,
            Self::Disputed,
            Self::Rejected,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Confirmed => "confirmed",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Approved => "approved",
            Self::Paid => "paid",
            Self::Cancelled => "cancelled",
            Self::Disputed => "disputed",
            Self::Rejected => "rejected",
        }
    }

    /// Terminal statuses have no outgoing edges; disputes are resolved
    /// outside the engine.
    pub const fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Paid | Self::Cancelled | Self::Disputed | Self::Rejected
        )
    }

    /// Presentation metadata for the status. Covers every status; a missing
    /// arm is a compile error, not a runtime fallback.
    pub const fn info(self) -> StatusInfo {
        match self {
            Self::Pending => StatusInfo {
                status: self,
                description: "Application received and awaiting the client's decision",
                next_actions: &["accept", "reject", "cancel"],
                can_edit: true,
                color: "#f59e0b",
            },
            Self::Accepted => StatusInfo {
                status: self,
                description: "Client accepted the application; schedule to be agreed",
                next_actions: &["confirm_schedule", "start_work", "cancel"],
                can_edit: true,
                color: "#3b82f6",
            },
            Self::Confirmed => StatusInfo {
                status: self,
                description: "Schedule agreed; waiting for the start time",
                next_actions: &["start_work", "cancel"],
                can_edit: true,
                color: "#6366f1",
            },
            Self::InProgress => StatusInfo {
                status: self,
                description: "Worker is on the job",
                next_actions: &["complete_work", "raise_dispute"],
                can_edit: false,
                color: "#8b5cf6",
            },
            Self::Completed => StatusInfo {
                status: self,
                description: "Work finished and awaiting client approval",
                next_actions: &["approve_work", "raise_dispute"],
                can_edit: false,
                color: "#10b981",
            },
            Self::Approved => StatusInfo {
                status: self,
                description: "Client signed off; payment release pending",
                next_actions: &["release_payment", "raise_dispute"],
                can_edit: false,
                color: "#14b8a6",
            },
            Self::Paid => StatusInfo {
                status: self,
                description: "Funds released to the worker; booking closed",
                next_actions: &[],
                can_edit: false,
                color: "#22c55e",
            },
            Self::Cancelled => StatusInfo {
                status: self,
                description: "Booking called off before completion",
                next_actions: &[],
                can_edit: false,
                color: "#6b7280",
            },
            Self::Disputed => StatusInfo {
                status: self,
                description: "A party reported an issue; under manual review",
                next_actions: &["await_resolution"],
                can_edit: false,
                color: "#ef4444",
            },
            Self::Rejected => StatusInfo {
                status: self,
                description: "Client declined the application",
                next_actions: &[],
                can_edit: false,
                color: "#9ca3af",
            },
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Custody of funds, tracked independently of work progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Held,
    Processing,
    Released,
    Refunded,
    Disputed,
}

impl PaymentStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Held => "held",
            Self::Processing => "processing",
            Self::Released => "released",
            Self::Refunded => "refunded",
            Self::Disputed => "disputed",
        }
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Released | Self::Refunded | Self::Disputed)
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Static presentation row for one status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusInfo {
    pub status: BookingStatus,
    pub description: &'static str,
    pub next_actions: &'static [&'static str],
    pub can_edit: bool,
    pub color: &'static str,
}

/// Which side of the booking is rating the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Party {
    Client,
    Worker,
}

/// One timestamped line in a booking's append-only admin log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub recorded_at: DateTime<Utc>,
    pub message: String,
}

impl AuditEntry {
    pub fn render(&self) -> String {
        format!("[{}] {}", self.recorded_at.to_rfc3339(), self.message)
    }
}

/// A worker's application to a job, as received from intake.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingApplication {
    pub job_id: JobId,
    pub worker_id: WorkerId,
    pub client_id: ClientId,
    pub proposed_rate: Money,
    pub estimated_hours: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_amount: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub questions_responses: BTreeMap<String, String>,
}

/// Validation errors raised while building or mutating a booking.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum BookingValidationError {
    #[error("hourly rate {rate} must be between {} and {}", MIN_HOURLY_RATE, MAX_HOURLY_RATE)]
    RateOutOfRange { rate: Money },
    #[error(
        "estimated hours {hours} must be between {} and {}",
        MIN_ESTIMATED_HOURS,
        MAX_ESTIMATED_HOURS
    )]
    HoursOutOfRange { hours: u32 },
    #[error("amount {amount} cannot be negative")]
    NegativeAmount { amount: Money },
    #[error("commission rate {rate} must be a finite value between 0 and 1")]
    InvalidCommissionRate { rate: f64 },
    #[error(
        "satisfaction rating {rating} must be between {} and {}",
        MIN_SATISFACTION_RATING,
        MAX_SATISFACTION_RATING
    )]
    RatingOutOfRange { rating: u8 },
    #[error("satisfaction can only be recorded once work is complete")]
    RatingBeforeCompletion,
    #[error("window end must come after its start")]
    EmptyWindow,
    #[error("schedule cannot change once work has started")]
    ScheduleLocked,
    #[error("actual hours cannot be recorded before work starts")]
    ActualWindowBeforeStart,
    #[error("final amount is locked once payment is processing")]
    FinalAmountLocked,
}

/// The contractual unit connecting one job, one worker, and one client.
///
/// Created through [`Booking::open`] and mutated through the operations in
/// [`super::lifecycle`] and [`super::service`]; handlers never edit fields
/// directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    pub id: BookingId,
    pub job_id: JobId,
    pub worker_id: WorkerId,
    pub client_id: ClientId,
    pub status: BookingStatus,
    pub payment_status: PaymentStatus,
    pub proposed_rate: Money,
    pub estimated_hours: u32,
    pub final_amount: Money,
    pub commission_amount: Money,
    pub worker_payout: Money,
    pub applied_at: Option<DateTime<Utc>>,
    pub accepted_at: Option<DateTime<Utc>>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub scheduled_start: Option<DateTime<Utc>>,
    pub scheduled_end: Option<DateTime<Utc>>,
    pub actual_start: Option<DateTime<Utc>>,
    pub actual_end: Option<DateTime<Utc>>,
    pub client_satisfaction: Option<u8>,
    pub worker_satisfaction: Option<u8>,
    pub issues_reported: bool,
    pub application_message: Option<String>,
    pub questions_responses: BTreeMap<String, String>,
    pub admin_notes: Vec<AuditEntry>,
}

impl Booking {
    /// Validate an application and open the booking it describes.
    ///
    /// The figures are settled immediately: the final amount defaults to
    /// rate times hours when the application does not carry one, and the
    /// commission split is computed and stored alongside it.
    pub fn open(
        id: BookingId,
        application: BookingApplication,
        pricing: &PricingConfig,
        now: DateTime<Utc>,
    ) -> Result<Self, BookingValidationError> {
        let BookingApplication {
            job_id,
            worker_id,
            client_id,
            proposed_rate,
            estimated_hours,
            final_amount,
            message,
            questions_responses,
        } = application;

        if proposed_rate < MIN_HOURLY_RATE || proposed_rate > MAX_HOURLY_RATE {
            return Err(BookingValidationError::RateOutOfRange {
                rate: proposed_rate,
            });
        }
        if !(MIN_ESTIMATED_HOURS..=MAX_ESTIMATED_HOURS).contains(&estimated_hours) {
            return Err(BookingValidationError::HoursOutOfRange {
                hours: estimated_hours,
            });
        }

        let final_amount = final_amount.unwrap_or_else(|| {
            Money::from_minor(proposed_rate.minor_units() * i64::from(estimated_hours))
        });
        let breakdown = split(final_amount, pricing.commission_rate)?;

        Ok(Self {
            id,
            job_id,
            worker_id,
            client_id,
            status: BookingStatus::Pending,
            payment_status: PaymentStatus::Pending,
            proposed_rate,
            estimated_hours,
            final_amount,
            commission_amount: breakdown.commission,
            worker_payout: breakdown.worker_payout,
            applied_at: Some(now),
            accepted_at: None,
            started_at: None,
            completed_at: None,
            reviewed_at: None,
            scheduled_start: None,
            scheduled_end: None,
            actual_start: None,
            actual_end: None,
            client_satisfaction: None,
            worker_satisfaction: None,
            issues_reported: false,
            application_message: message,
            questions_responses,
            admin_notes: Vec::new(),
        })
    }

    /// Append a line to the admin log. Entries are never edited or removed.
    pub fn audit(&mut self, at: DateTime<Utc>, message: String) {
        self.admin_notes.push(AuditEntry {
            recorded_at: at,
            message,
        });
    }

    /// The admin log rendered one entry per line, oldest first.
    pub fn admin_log(&self) -> String {
        self.admin_notes
            .iter()
            .map(AuditEntry::render)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Agree a planned execution window. Rejected once work has started;
    /// from then on only the actual window matters.
    pub fn set_schedule(
        &mut self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<(), BookingValidationError> {
        if self.started_at.is_some() {
            return Err(BookingValidationError::ScheduleLocked);
        }
        if end <= start {
            return Err(BookingValidationError::EmptyWindow);
        }

        self.scheduled_start = Some(start);
        self.scheduled_end = Some(end);
        Ok(())
    }

    /// Correct the recorded execution window after work has started. The
    /// lifecycle stamps a first approximation automatically; this overwrites
    /// it with the reconciled times.
    pub fn record_actual_window(
        &mut self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<(), BookingValidationError> {
        if self.started_at.is_none() {
            return Err(BookingValidationError::ActualWindowBeforeStart);
        }
        if end <= start {
            return Err(BookingValidationError::EmptyWindow);
        }

        self.actual_start = Some(start);
        self.actual_end = Some(end);
        Ok(())
    }

    /// Replace the final amount and recompute the commission split.
    ///
    /// Allowed until the payment reaches `processing`; once money is moving
    /// the figures are frozen.
    pub fn override_final_amount(
        &mut self,
        amount: Money,
        pricing: &PricingConfig,
        now: DateTime<Utc>,
    ) -> Result<(), BookingValidationError> {
        if matches!(
            self.payment_status,
            PaymentStatus::Processing | PaymentStatus::Released
        ) {
            return Err(BookingValidationError::FinalAmountLocked);
        }

        let breakdown = split(amount, pricing.commission_rate)?;
        self.final_amount = amount;
        self.commission_amount = breakdown.commission;
        self.worker_payout = breakdown.worker_payout;
        self.audit(
            now,
            format!(
                "Final amount set to {amount} (commission {}, worker payout {})",
                breakdown.commission, breakdown.worker_payout
            ),
        );
        Ok(())
    }

    /// Record a 1-5 satisfaction rating for one side of the booking.
    pub fn record_satisfaction(
        &mut self,
        party: Party,
        rating: u8,
    ) -> Result<(), BookingValidationError> {
        if !(MIN_SATISFACTION_RATING..=MAX_SATISFACTION_RATING).contains(&rating) {
            return Err(BookingValidationError::RatingOutOfRange { rating });
        }
        if self.completed_at.is_none() {
            return Err(BookingValidationError::RatingBeforeCompletion);
        }

        match party {
            Party::Client => self.client_satisfaction = Some(rating),
            Party::Worker => self.worker_satisfaction = Some(rating),
        }
        Ok(())
    }
}
