use std::io::Write;

use serde::Serialize;

use super::domain::{Booking, BookingStatus};

/// Failures while producing a payout export.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("failed to write payout report: {0}")]
    Csv(#[from] csv::Error),
    #[error("failed to flush payout report: {0}")]
    Io(#[from] std::io::Error),
    #[error("payout report produced invalid utf-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

#[derive(Debug, Serialize)]
struct PayoutRow<'a> {
    booking_id: &'a str,
    job_id: &'a str,
    worker_id: &'a str,
    final_amount: i64,
    commission: i64,
    worker_payout: i64,
    approved_at: String,
}

impl<'a> PayoutRow<'a> {
    fn from_booking(booking: &'a Booking) -> Self {
        Self {
            booking_id: &booking.id.0,
            job_id: &booking.job_id.0,
            worker_id: &booking.worker_id.0,
            final_amount: booking.final_amount.minor_units(),
            commission: booking.commission_amount.minor_units(),
            worker_payout: booking.worker_payout.minor_units(),
            approved_at: booking
                .reviewed_at
                .map(|at| at.to_rfc3339())
                .unwrap_or_default(),
        }
    }
}

/// Write the payout reconciliation report for settled bookings as CSV.
///
/// Only bookings that reached `paid` appear; amounts are in minor units so
/// finance tooling can sum them without parsing decimals. Returns the number
/// of rows written.
pub fn write_payout_report<'a, I, W>(bookings: I, writer: W) -> Result<usize, ExportError>
where
    I: IntoIterator<Item = &'a Booking>,
    W: Write,
{
    let mut csv_writer = csv::Writer::from_writer(writer);
    let mut rows = 0usize;

    for booking in bookings {
        if booking.status != BookingStatus::Paid {
            continue;
        }
        csv_writer.serialize(PayoutRow::from_booking(booking))?;
        rows += 1;
    }

    csv_writer.flush()?;
    Ok(rows)
}

/// Render the payout report to an in-memory CSV string.
pub fn payout_report_csv<'a, I>(bookings: I) -> Result<String, ExportError>
where
    I: IntoIterator<Item = &'a Booking>,
{
    let mut buffer = Vec::new();
    write_payout_report(bookings, &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}
