use chrono::{DateTime, Utc};

use super::domain::{Booking, BookingStatus, PaymentStatus};

/// Transition failures. The booking is left untouched whenever one of these
/// is returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    #[error("booking cannot move from {from} to {to}")]
    InvalidStatusChange {
        from: BookingStatus,
        to: BookingStatus,
    },
    #[error("payment cannot move from {from} to {to}")]
    InvalidPaymentChange {
        from: PaymentStatus,
        to: PaymentStatus,
    },
    #[error("payment release only happens by paying the booking")]
    ManualRelease,
}

/// A committed status change, suitable for notification fan-out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusChange {
    pub from: BookingStatus,
    pub to: BookingStatus,
    pub occurred_at: DateTime<Utc>,
}

/// Legal outgoing edges per status. The forward pipeline is strictly
/// monotonic; `cancelled` and `disputed` are reachable from every
/// non-terminal status, `rejected` only from `pending`.
pub fn allowed_transitions(from: BookingStatus) -> &'static [BookingStatus] {
    use BookingStatus::*;

    match from {
        Pending => &[Accepted, Rejected, Cancelled, Disputed],
        Accepted => &[Confirmed, InProgress, Cancelled, Disputed],
        Confirmed => &[InProgress, Cancelled, Disputed],
        InProgress => &[Completed, Cancelled, Disputed],
        Completed => &[Approved, Cancelled, Disputed],
        Approved => &[Paid, Cancelled, Disputed],
        Paid | Cancelled | Disputed | Rejected => &[],
    }
}

pub fn can_transition(from: BookingStatus, to: BookingStatus) -> bool {
    allowed_transitions(from).contains(&to)
}

/// Legal payment edges for externally requested changes. `released` is
/// absent on purpose: funds release rides the `approved -> paid` booking
/// edge and cannot be requested directly.
pub fn allowed_payment_transitions(from: PaymentStatus) -> &'static [PaymentStatus] {
    use PaymentStatus::*;

    match from {
        Pending => &[Held],
        Held => &[Processing, Refunded, Disputed],
        Processing => &[Refunded, Disputed],
        Released | Refunded | Disputed => &[],
    }
}

/// Apply a status change and its side effects in place.
///
/// Milestone timestamps are written the first time their status is reached
/// and never touched again. Every change appends an admin-log line; `notes`
/// becomes its suffix when supplied. The caller owns persistence, so a
/// returned error means nothing happened.
pub fn apply_status_change(
    booking: &mut Booking,
    to: BookingStatus,
    now: DateTime<Utc>,
    notes: Option<&str>,
) -> Result<StatusChange, TransitionError> {
    let from = booking.status;
    if !can_transition(from, to) {
        return Err(TransitionError::InvalidStatusChange { from, to });
    }

    match to {
        BookingStatus::Accepted => {
            booking.accepted_at.get_or_insert(now);
        }
        BookingStatus::InProgress => {
            booking.started_at.get_or_insert(now);
            booking.actual_start.get_or_insert(now);
        }
        BookingStatus::Completed => {
            booking.completed_at.get_or_insert(now);
            booking.actual_end.get_or_insert(now);
        }
        BookingStatus::Approved => {
            booking.reviewed_at.get_or_insert(now);
        }
        BookingStatus::Paid => {
            let previous = booking.payment_status;
            booking.payment_status = PaymentStatus::Released;
            booking.audit(
                now,
                format!("Payment status changed from {previous} to released"),
            );
        }
        BookingStatus::Disputed => {
            booking.issues_reported = true;
        }
        BookingStatus::Pending
        | BookingStatus::Confirmed
        | BookingStatus::Cancelled
        | BookingStatus::Rejected => {}
    }

    let message = match notes {
        Some(notes) => format!("Status changed from {from} to {to}: {notes}"),
        None => format!("Status changed from {from} to {to}"),
    };
    booking.audit(now, message);
    booking.status = to;

    Ok(StatusChange {
        from,
        to,
        occurred_at: now,
    })
}

/// Apply an externally requested payment change in place.
pub fn apply_payment_change(
    booking: &mut Booking,
    to: PaymentStatus,
    now: DateTime<Utc>,
) -> Result<(), TransitionError> {
    let from = booking.payment_status;
    if to == PaymentStatus::Released {
        return Err(TransitionError::ManualRelease);
    }
    if !allowed_payment_transitions(from).contains(&to) {
        return Err(TransitionError::InvalidPaymentChange { from, to });
    }

    booking.audit(now, format!("Payment status changed from {from} to {to}"));
    booking.payment_status = to;
    Ok(())
}
