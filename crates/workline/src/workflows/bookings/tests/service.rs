use std::sync::Arc;

use chrono::{Duration, Utc};

use super::common::*;
use crate::workflows::bookings::domain::{
    BookingId, BookingStatus, BookingValidationError, Money, Party, PaymentStatus,
};
use crate::workflows::bookings::lifecycle::TransitionError;
use crate::workflows::bookings::payments::PricingConfig;
use crate::workflows::bookings::policy::CancellationPolicy;
use crate::workflows::bookings::repository::{BookingRepository, RepositoryError};
use crate::workflows::bookings::{BookingService, BookingServiceError};

#[test]
fn open_persists_a_booking_with_settled_figures() {
    let (service, repository, _) = build_service();

    let record = service.open(application()).expect("application opens");

    assert!(record.booking.id.0.starts_with("bk-"));
    assert_eq!(record.version, 1);
    assert_eq!(record.booking.status, BookingStatus::Pending);
    assert_eq!(record.booking.payment_status, PaymentStatus::Pending);
    assert_eq!(record.booking.final_amount, Money::from_minor(1_000));
    assert_eq!(record.booking.commission_amount, Money::from_minor(150));
    assert_eq!(record.booking.worker_payout, Money::from_minor(850));
    assert!(record.booking.applied_at.is_some());
    assert!(record.booking.admin_notes.is_empty());

    let stored = repository
        .fetch(&record.booking.id)
        .expect("fetch succeeds")
        .expect("record present");
    assert_eq!(stored, record);
    assert_eq!(repository.records.lock().expect("lock").len(), 1);
}

#[test]
fn open_rejects_out_of_range_figures() {
    let (service, _, _) = build_service();

    let mut low_rate = application();
    low_rate.proposed_rate = Money::from_minor(10);
    match service.open(low_rate) {
        Err(BookingServiceError::Validation(BookingValidationError::RateOutOfRange { .. })) => {}
        other => panic!("expected rate rejection, got {other:?}"),
    }

    let mut no_hours = application();
    no_hours.estimated_hours = 0;
    match service.open(no_hours) {
        Err(BookingServiceError::Validation(BookingValidationError::HoursOutOfRange { .. })) => {}
        other => panic!("expected hours rejection, got {other:?}"),
    }

    let mut marathon = application();
    marathon.estimated_hours = 2_001;
    match service.open(marathon) {
        Err(BookingServiceError::Validation(BookingValidationError::HoursOutOfRange { .. })) => {}
        other => panic!("expected hours rejection, got {other:?}"),
    }
}

#[test]
fn open_honors_a_negotiated_final_amount() {
    let (service, _, _) = build_service();

    let mut negotiated = application();
    negotiated.final_amount = Some(Money::from_minor(2_000));
    let record = service.open(negotiated).expect("application opens");

    assert_eq!(record.booking.final_amount, Money::from_minor(2_000));
    assert_eq!(record.booking.commission_amount, Money::from_minor(300));
    assert_eq!(record.booking.worker_payout, Money::from_minor(1_700));
}

#[test]
fn update_status_persists_audits_and_notifies() {
    let (service, _, notifier) = build_service();
    let record = service.open(application()).expect("application opens");

    let stored = service
        .update_status(
            &record.booking.id,
            BookingStatus::Accepted,
            Some("client approved by phone".to_string()),
        )
        .expect("acceptance applies");

    assert_eq!(stored.version, 2);
    assert_eq!(stored.booking.status, BookingStatus::Accepted);
    assert!(stored.booking.accepted_at.is_some());
    assert!(stored
        .booking
        .admin_log()
        .contains("Status changed from pending to accepted: client approved by phone"));

    let events = notifier.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].booking_id, record.booking.id);
    assert_eq!(events[0].from, BookingStatus::Pending);
    assert_eq!(events[0].to, BookingStatus::Accepted);
}

#[test]
fn update_status_rejects_illegal_edges_without_notifying() {
    let (service, repository, notifier) = build_service();
    let record = service.open(application()).expect("application opens");

    match service.update_status(&record.booking.id, BookingStatus::Completed, None) {
        Err(BookingServiceError::Transition(TransitionError::InvalidStatusChange {
            from: BookingStatus::Pending,
            to: BookingStatus::Completed,
        })) => {}
        other => panic!("expected invalid transition, got {other:?}"),
    }

    let stored = repository
        .fetch(&record.booking.id)
        .expect("fetch succeeds")
        .expect("record present");
    assert_eq!(stored.version, 1);
    assert_eq!(stored.booking.status, BookingStatus::Pending);
    assert!(notifier.events().is_empty());
}

#[test]
fn update_status_surfaces_lost_write_races() {
    let repository = Arc::new(ConflictingRepository::holding(booking()));
    let notifier = Arc::new(MemoryNotifier::default());
    let service = BookingService::new(repository, notifier.clone());

    match service.update_status(
        &BookingId("bk-test-1".to_string()),
        BookingStatus::Accepted,
        None,
    ) {
        Err(BookingServiceError::Repository(RepositoryError::Conflict)) => {}
        other => panic!("expected conflict, got {other:?}"),
    }
    assert!(
        notifier.events().is_empty(),
        "lost races should not notify"
    );
}

#[test]
fn get_propagates_not_found() {
    let (service, _, _) = build_service();

    match service.get(&BookingId("bk-missing".to_string())) {
        Err(BookingServiceError::Repository(RepositoryError::NotFound)) => {}
        other => panic!("expected not found error, got {other:?}"),
    }
}

#[test]
fn repository_outages_are_surfaced() {
    let service = BookingService::new(
        Arc::new(UnavailableRepository),
        Arc::new(MemoryNotifier::default()),
    );

    match service.get(&BookingId("bk-any".to_string())) {
        Err(BookingServiceError::Repository(RepositoryError::Unavailable(_))) => {}
        other => panic!("expected unavailable error, got {other:?}"),
    }
}

#[test]
fn payment_updates_follow_the_escrow_graph() {
    let (service, _, _) = build_service();
    let record = service.open(application()).expect("application opens");

    let stored = service
        .update_payment_status(&record.booking.id, PaymentStatus::Held)
        .expect("hold applies");
    assert_eq!(stored.version, 2);
    assert_eq!(stored.booking.payment_status, PaymentStatus::Held);
    assert!(stored
        .booking
        .admin_log()
        .contains("Payment status changed from pending to held"));

    match service.update_payment_status(&record.booking.id, PaymentStatus::Released) {
        Err(BookingServiceError::Transition(TransitionError::ManualRelease)) => {}
        other => panic!("expected manual release rejection, got {other:?}"),
    }
}

#[test]
fn schedule_and_actual_window_guards_hold_at_the_service_edge() {
    let (service, _, _) = build_service();
    let record = service.open(application()).expect("application opens");
    let id = record.booking.id.clone();
    let start = Utc::now() + Duration::hours(24);

    match service.set_schedule(&id, start, start - Duration::hours(1)) {
        Err(BookingServiceError::Validation(BookingValidationError::EmptyWindow)) => {}
        other => panic!("expected empty window rejection, got {other:?}"),
    }

    let stored = service
        .set_schedule(&id, start, start + Duration::hours(4))
        .expect("schedule applies");
    assert_eq!(stored.booking.scheduled_start, Some(start));

    match service.record_actual_window(&id, start, start + Duration::hours(4)) {
        Err(BookingServiceError::Validation(
            BookingValidationError::ActualWindowBeforeStart,
        )) => {}
        other => panic!("expected pre-start rejection, got {other:?}"),
    }

    service
        .update_status(&id, BookingStatus::Accepted, None)
        .expect("acceptance applies");
    service
        .update_status(&id, BookingStatus::InProgress, None)
        .expect("start applies");

    let stored = service
        .record_actual_window(&id, start, start + Duration::hours(5))
        .expect("actual window applies");
    assert_eq!(stored.booking.actual_end, Some(start + Duration::hours(5)));

    match service.set_schedule(&id, start, start + Duration::hours(4)) {
        Err(BookingServiceError::Validation(BookingValidationError::ScheduleLocked)) => {}
        other => panic!("expected locked schedule rejection, got {other:?}"),
    }
}

#[test]
fn final_amount_override_recomputes_until_money_moves() {
    let (service, _, _) = build_service();
    let record = service.open(application()).expect("application opens");
    let id = record.booking.id.clone();

    let stored = service
        .override_final_amount(&id, Money::from_minor(1_500))
        .expect("override applies");
    assert_eq!(stored.booking.final_amount, Money::from_minor(1_500));
    assert_eq!(stored.booking.commission_amount, Money::from_minor(225));
    assert_eq!(stored.booking.worker_payout, Money::from_minor(1_275));
    assert!(stored
        .booking
        .admin_log()
        .contains("Final amount set to 15.00 (commission 2.25, worker payout 12.75)"));

    service
        .update_payment_status(&id, PaymentStatus::Held)
        .expect("hold applies");
    service
        .update_payment_status(&id, PaymentStatus::Processing)
        .expect("processing applies");

    match service.override_final_amount(&id, Money::from_minor(900)) {
        Err(BookingServiceError::Validation(BookingValidationError::FinalAmountLocked)) => {}
        other => panic!("expected locked amount rejection, got {other:?}"),
    }
}

#[test]
fn satisfaction_requires_completion_and_valid_bounds() {
    let (service, _, _) = build_service();
    let record = service.open(application()).expect("application opens");
    let id = record.booking.id.clone();

    match service.record_satisfaction(&id, Party::Client, 5) {
        Err(BookingServiceError::Validation(
            BookingValidationError::RatingBeforeCompletion,
        )) => {}
        other => panic!("expected pre-completion rejection, got {other:?}"),
    }

    for status in [
        BookingStatus::Accepted,
        BookingStatus::InProgress,
        BookingStatus::Completed,
    ] {
        service
            .update_status(&id, status, None)
            .expect("walk applies");
    }

    match service.record_satisfaction(&id, Party::Client, 6) {
        Err(BookingServiceError::Validation(BookingValidationError::RatingOutOfRange {
            rating: 6,
        })) => {}
        other => panic!("expected out of range rejection, got {other:?}"),
    }

    let stored = service
        .record_satisfaction(&id, Party::Client, 5)
        .expect("client rating applies");
    assert_eq!(stored.booking.client_satisfaction, Some(5));

    let stored = service
        .record_satisfaction(&id, Party::Worker, 4)
        .expect("worker rating applies");
    assert_eq!(stored.booking.worker_satisfaction, Some(4));
}

#[test]
fn cancellation_eligibility_reflects_the_configured_policy() {
    let (service, _, _) = service_with_policies(
        PricingConfig::default(),
        CancellationPolicy::new(24),
    );
    let record = service.open(application()).expect("application opens");
    let id = record.booking.id.clone();

    let eligibility = service
        .cancellation_eligibility(&id)
        .expect("eligibility evaluates");
    assert!(eligibility.can_cancel);

    service
        .set_schedule(
            &id,
            Utc::now() + Duration::hours(6),
            Utc::now() + Duration::hours(10),
        )
        .expect("schedule applies");

    let eligibility = service
        .cancellation_eligibility(&id)
        .expect("eligibility evaluates");
    assert!(!eligibility.can_cancel);
    assert_eq!(
        eligibility.reason.as_deref(),
        Some("too close to scheduled start (less than 24 hours notice)")
    );
}

#[test]
fn projections_come_from_the_stored_booking() {
    let (service, _, _) = build_service();
    let record = service.open(application()).expect("application opens");
    let id = record.booking.id.clone();

    service
        .update_status(&id, BookingStatus::Accepted, None)
        .expect("acceptance applies");

    let timeline = service.timeline(&id).expect("timeline projects");
    assert_eq!(timeline.len(), 2);

    let duration = service.work_duration(&id).expect("duration projects");
    assert_eq!(duration.estimated_hours, 4.0);
    assert!(duration.actual_hours.is_none());
}

#[test]
fn statistics_and_payouts_cover_the_stored_portfolio() {
    let (service, _, _) = build_service();

    let settled = service.open(application()).expect("application opens");
    for status in [
        BookingStatus::Accepted,
        BookingStatus::InProgress,
        BookingStatus::Completed,
        BookingStatus::Approved,
        BookingStatus::Paid,
    ] {
        service
            .update_status(&settled.booking.id, status, None)
            .expect("walk applies");
    }

    let cancelled = service.open(application()).expect("application opens");
    service
        .update_status(&cancelled.booking.id, BookingStatus::Cancelled, None)
        .expect("cancellation applies");

    service.open(application()).expect("application opens");

    let stats = service.statistics().expect("statistics aggregate");
    assert_eq!(stats.total, 3);
    assert_eq!(stats.settled_value, Money::from_minor(1_000));
    assert_eq!(stats.pipeline_value, Money::from_minor(1_000));

    let csv = service.payout_report_csv().expect("report renders");
    assert!(csv.contains(&settled.booking.id.0));
    assert!(!csv.contains(&cancelled.booking.id.0));

    let mut buffer = Vec::new();
    let rows = service
        .write_payout_report(&mut buffer)
        .expect("report writes");
    assert_eq!(rows, 1);
}
