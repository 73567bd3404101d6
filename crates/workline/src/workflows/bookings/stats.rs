use std::collections::HashMap;

use serde::Serialize;

use super::domain::{Booking, BookingStatus, Money};

/// Booking count for one status, with its presentation label.
#[derive(Debug, Clone, Serialize)]
pub struct StatusCountEntry {
    pub status: BookingStatus,
    pub status_label: &'static str,
    pub count: usize,
}

/// Portfolio-level aggregates across a set of bookings.
///
/// Read-only and lock-free: computed from a snapshot of records, safe to run
/// while writers are busy elsewhere.
#[derive(Debug, Clone, Serialize)]
pub struct BookingStatistics {
    pub total: usize,
    pub by_status: Vec<StatusCountEntry>,
    pub pipeline_value: Money,
    pub settled_value: Money,
    pub collected_commission: Money,
    pub worker_payouts: Money,
    pub completion_rate: f64,
    pub cancellation_rate: f64,
    pub bookings_with_issues: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_client_satisfaction: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_worker_satisfaction: Option<f64>,
}

/// Aggregate statistics over any collection of bookings.
///
/// Pipeline value sums the contracted amounts still in flight; the settled
/// figures only count bookings that reached `paid`.
pub fn aggregate<'a, I>(bookings: I) -> BookingStatistics
where
    I: IntoIterator<Item = &'a Booking>,
{
    let mut total = 0usize;
    let mut counts: HashMap<BookingStatus, usize> = HashMap::new();
    let mut pipeline_value = Money::ZERO;
    let mut settled_value = Money::ZERO;
    let mut collected_commission = Money::ZERO;
    let mut worker_payouts = Money::ZERO;
    let mut bookings_with_issues = 0usize;
    let mut client_ratings = RatingAccumulator::default();
    let mut worker_ratings = RatingAccumulator::default();

    for booking in bookings {
        total += 1;
        *counts.entry(booking.status).or_default() += 1;

        if !booking.status.is_terminal() {
            pipeline_value = pipeline_value + booking.final_amount;
        }
        if booking.status == BookingStatus::Paid {
            settled_value = settled_value + booking.final_amount;
            collected_commission = collected_commission + booking.commission_amount;
            worker_payouts = worker_payouts + booking.worker_payout;
        }
        if booking.issues_reported {
            bookings_with_issues += 1;
        }

        client_ratings.observe(booking.client_satisfaction);
        worker_ratings.observe(booking.worker_satisfaction);
    }

    let by_status = BookingStatus::ordered()
        .into_iter()
        .filter_map(|status| {
            counts.get(&status).map(|count| StatusCountEntry {
                status,
                status_label: status.label(),
                count: *count,
            })
        })
        .collect();

    let rate_of = |count: usize| {
        if total == 0 {
            0.0
        } else {
            count as f64 / total as f64
        }
    };
    let completion_rate = rate_of(counts.get(&BookingStatus::Paid).copied().unwrap_or(0));
    let cancellation_rate = rate_of(counts.get(&BookingStatus::Cancelled).copied().unwrap_or(0));

    BookingStatistics {
        total,
        by_status,
        pipeline_value,
        settled_value,
        collected_commission,
        worker_payouts,
        completion_rate,
        cancellation_rate,
        bookings_with_issues,
        average_client_satisfaction: client_ratings.average(),
        average_worker_satisfaction: worker_ratings.average(),
    }
}

#[derive(Debug, Default)]
struct RatingAccumulator {
    sum: u32,
    count: u32,
}

impl RatingAccumulator {
    fn observe(&mut self, rating: Option<u8>) {
        if let Some(rating) = rating {
            self.sum += u32::from(rating);
            self.count += 1;
        }
    }

    fn average(&self) -> Option<f64> {
        if self.count == 0 {
            None
        } else {
            Some(f64::from(self.sum) / f64::from(self.count))
        }
    }
}
