use crate::infra::{InMemoryBookingRepository, InMemoryNotificationPublisher};
use chrono::{Duration, Utc};
use clap::Args;
use std::collections::BTreeMap;
use std::fs::File;
use std::path::PathBuf;
use std::sync::Arc;
use workline::error::AppError;
use workline::workflows::bookings::{
    BookingApplication, BookingId, BookingRecord, BookingService, BookingStatistics, BookingStatus,
    ClientId, JobId, Money, Party, PaymentStatus, WorkerId,
};

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Hourly rate in minor currency units. Defaults to 250 (2.50/hour).
    #[arg(long)]
    pub(crate) rate: Option<i64>,
    /// Estimated hours of work. Defaults to 4.
    #[arg(long)]
    pub(crate) hours: Option<u32>,
    /// Walk the dispute path instead of settling the booking.
    #[arg(long)]
    pub(crate) raise_dispute: bool,
    /// Include the full admin log in the demo output.
    #[arg(long)]
    pub(crate) show_log: bool,
}

#[derive(Args, Debug)]
pub(crate) struct PayoutReportArgs {
    /// Number of settled bookings to seed into the demo portfolio.
    #[arg(long, default_value_t = 3)]
    pub(crate) settled: u32,
    /// Write the CSV to this path instead of stdout.
    #[arg(long)]
    pub(crate) out: Option<PathBuf>,
}

pub(crate) fn run_payout_report(args: PayoutReportArgs) -> Result<(), AppError> {
    let PayoutReportArgs { settled, out } = args;

    let repository = Arc::new(InMemoryBookingRepository::default());
    let notifier = Arc::new(InMemoryNotificationPublisher::default());
    let service = Arc::new(BookingService::new(repository, notifier));

    seed_settled_portfolio(&service, settled)?;

    let stats = service.statistics()?;
    render_portfolio_statistics(&stats);

    match out {
        Some(path) => {
            let file = File::create(&path)?;
            let rows = service.write_payout_report(file)?;
            println!("\nWrote {} payout rows to {}", rows, path.display());
        }
        None => {
            let csv = service.payout_report_csv()?;
            if csv.is_empty() {
                println!("\nPayout reconciliation: no settled bookings");
            } else {
                println!("\nPayout reconciliation CSV");
                print!("{}", csv);
            }
        }
    }

    Ok(())
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        rate,
        hours,
        raise_dispute,
        show_log,
    } = args;

    let rate = rate.unwrap_or(250);
    let hours = hours.unwrap_or(4);

    println!("Booking lifecycle demo");

    let repository = Arc::new(InMemoryBookingRepository::default());
    let notifier = Arc::new(InMemoryNotificationPublisher::default());
    let service = Arc::new(BookingService::new(repository, notifier.clone()));

    let record = match service.open(demo_application(rate, hours)) {
        Ok(record) => record,
        Err(err) => {
            println!("  Application rejected: {}", err);
            return Ok(());
        }
    };
    let booking_id = record.booking.id.clone();
    println!(
        "- Opened booking {} for job {} -> status {}",
        booking_id.0,
        record.booking.job_id.0,
        record.booking.status.label()
    );
    println!(
        "  Final amount {} (commission {}, worker payout {})",
        record.booking.final_amount, record.booking.commission_amount, record.booking.worker_payout
    );

    match service.cancellation_eligibility(&booking_id) {
        Ok(eligibility) if eligibility.can_cancel => println!("  Cancellation window: open"),
        Ok(eligibility) => println!(
            "  Cancellation window: closed ({})",
            eligibility
                .reason
                .unwrap_or_else(|| "no reason given".to_string())
        ),
        Err(err) => {
            println!("  Cancellation check unavailable: {}", err);
            return Ok(());
        }
    }

    advance(
        &service,
        &booking_id,
        BookingStatus::Accepted,
        Some("Assigned after phone screen"),
    )?;

    let scheduled_start = Utc::now() + Duration::hours(24);
    let scheduled_end = scheduled_start + Duration::hours(i64::from(hours));
    service.set_schedule(&booking_id, scheduled_start, scheduled_end)?;
    println!(
        "  Scheduled window: {} -> {}",
        scheduled_start.to_rfc3339(),
        scheduled_end.to_rfc3339()
    );

    let record = service.update_payment_status(&booking_id, PaymentStatus::Held)?;
    println!(
        "- Payment moved to {}",
        record.booking.payment_status.label()
    );

    advance(&service, &booking_id, BookingStatus::Confirmed, None)?;
    advance(&service, &booking_id, BookingStatus::InProgress, None)?;

    if raise_dispute {
        let disputed = advance(
            &service,
            &booking_id,
            BookingStatus::Disputed,
            Some("Client reports the job was left unfinished"),
        )?;
        println!(
            "  Issues flagged for review: {}",
            disputed.booking.issues_reported
        );

        let stats = service.statistics()?;
        render_portfolio_statistics(&stats);

        if show_log {
            println!("\nAdmin log");
            println!("{}", disputed.booking.admin_log());
        }
        return Ok(());
    }

    advance(&service, &booking_id, BookingStatus::Completed, None)?;

    let actual_end = scheduled_start + Duration::minutes(i64::from(hours) * 60 + 90);
    service.record_actual_window(&booking_id, scheduled_start, actual_end)?;
    println!(
        "  Actual window reconciled: {} -> {}",
        scheduled_start.to_rfc3339(),
        actual_end.to_rfc3339()
    );

    let record = service.update_payment_status(&booking_id, PaymentStatus::Processing)?;
    println!(
        "- Payment moved to {}",
        record.booking.payment_status.label()
    );

    advance(&service, &booking_id, BookingStatus::Approved, None)?;
    advance(&service, &booking_id, BookingStatus::Paid, None)?;

    service.record_satisfaction(&booking_id, Party::Client, 5)?;
    let settled = service.record_satisfaction(&booking_id, Party::Worker, 4)?;
    println!("- Satisfaction recorded: client 5/5, worker 4/5");

    println!("\nBooking timeline");
    for entry in service.timeline(&booking_id)? {
        println!(
            "  - {} at {}: {}",
            entry.stage_label,
            entry.timestamp.to_rfc3339(),
            entry.description
        );
    }

    println!("\nWork duration");
    let duration = service.work_duration(&booking_id)?;
    match (
        duration.actual_hours,
        duration.variance_hours,
        duration.efficiency,
    ) {
        (Some(actual), Some(variance), Some(efficiency)) => println!(
            "- Estimated {:.1}h | actual {:.1}h | variance {:+.1}h -> {}",
            duration.estimated_hours,
            actual,
            variance,
            efficiency.label()
        ),
        _ => println!(
            "- Estimated {:.1}h | execution window still open",
            duration.estimated_hours
        ),
    }

    let stats = service.statistics()?;
    render_portfolio_statistics(&stats);

    let events = notifier.events();
    if events.is_empty() {
        println!("\nNotifications: none dispatched");
    } else {
        println!("\nNotifications dispatched");
        for event in events {
            println!(
                "  - {} -> {} for {}",
                event.from.label(),
                event.to.label(),
                event.booking_id.0
            );
        }
    }

    match service.payout_report_csv() {
        Ok(csv) if csv.is_empty() => println!("\nPayout reconciliation: no settled bookings"),
        Ok(csv) => {
            println!("\nPayout reconciliation CSV");
            print!("{}", csv);
        }
        Err(err) => println!("\nPayout reconciliation unavailable: {}", err),
    }

    if show_log {
        println!("\nAdmin log");
        println!("{}", settled.booking.admin_log());
    }

    Ok(())
}

fn advance(
    service: &BookingService<InMemoryBookingRepository, InMemoryNotificationPublisher>,
    booking_id: &BookingId,
    to: BookingStatus,
    notes: Option<&str>,
) -> Result<BookingRecord, AppError> {
    let record = service.update_status(booking_id, to, notes.map(str::to_string))?;
    println!(
        "- Moved to {} (payment {}, version {})",
        record.booking.status.label(),
        record.booking.payment_status.label(),
        record.version
    );
    Ok(record)
}

fn demo_application(rate: i64, hours: u32) -> BookingApplication {
    let mut questions_responses = BTreeMap::new();
    questions_responses.insert("has_own_tools".to_string(), "yes".to_string());
    questions_responses.insert("years_experience".to_string(), "6".to_string());

    BookingApplication {
        job_id: JobId("job-1042".to_string()),
        worker_id: WorkerId("wkr-207".to_string()),
        client_id: ClientId("cli-88".to_string()),
        proposed_rate: Money::from_minor(rate),
        estimated_hours: hours,
        final_amount: None,
        message: Some("Can start this week and bring my own tools".to_string()),
        questions_responses,
    }
}

fn seed_settled_portfolio(
    service: &BookingService<InMemoryBookingRepository, InMemoryNotificationPublisher>,
    settled: u32,
) -> Result<(), AppError> {
    for index in 0..settled {
        let application = BookingApplication {
            job_id: JobId(format!("job-{}", 1100 + index)),
            worker_id: WorkerId(format!("wkr-{}", 300 + index)),
            client_id: ClientId(format!("cli-{}", 90 + index)),
            proposed_rate: Money::from_minor(200 + i64::from(index) * 50),
            estimated_hours: 3 + index,
            final_amount: None,
            message: None,
            questions_responses: BTreeMap::new(),
        };
        let record = service.open(application)?;
        for status in [
            BookingStatus::Accepted,
            BookingStatus::Confirmed,
            BookingStatus::InProgress,
            BookingStatus::Completed,
            BookingStatus::Approved,
            BookingStatus::Paid,
        ] {
            service.update_status(&record.booking.id, status, None)?;
        }
    }

    // one in-flight booking that stays out of the payout report
    let in_flight = BookingApplication {
        job_id: JobId("job-1200".to_string()),
        worker_id: WorkerId("wkr-400".to_string()),
        client_id: ClientId("cli-120".to_string()),
        proposed_rate: Money::from_minor(275),
        estimated_hours: 2,
        final_amount: None,
        message: None,
        questions_responses: BTreeMap::new(),
    };
    service.open(in_flight)?;

    Ok(())
}

fn render_portfolio_statistics(stats: &BookingStatistics) {
    println!("\nPortfolio statistics");
    println!(
        "- {} bookings | {:.0}% completed | {:.0}% cancelled | {} with issues",
        stats.total,
        stats.completion_rate * 100.0,
        stats.cancellation_rate * 100.0,
        stats.bookings_with_issues
    );
    println!(
        "- Pipeline {} | settled {} | commission {} | worker payouts {}",
        stats.pipeline_value, stats.settled_value, stats.collected_commission, stats.worker_payouts
    );
    for entry in &stats.by_status {
        println!("  - {}: {}", entry.status_label, entry.count);
    }
    if let Some(average) = stats.average_client_satisfaction {
        println!("- Client satisfaction {:.1}/5", average);
    }
    if let Some(average) = stats.average_worker_satisfaction {
        println!("- Worker satisfaction {:.1}/5", average);
    }
}
