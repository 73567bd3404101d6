use super::common::*;
use crate::workflows::bookings::domain::{BookingValidationError, Money};
use crate::workflows::bookings::payments::{split, PricingConfig, DEFAULT_COMMISSION_RATE};

#[test]
fn default_split_matches_the_contract_example() {
    // 2.50/hour for four hours at the platform's 15% rate.
    let booking = booking();

    assert_eq!(booking.final_amount, Money::from_minor(1_000));
    assert_eq!(booking.commission_amount, Money::from_minor(150));
    assert_eq!(booking.worker_payout, Money::from_minor(850));
}

#[test]
fn split_parts_always_sum_back_to_the_amount() {
    let amounts = [1, 3, 7, 33, 101, 999, 12_345, 1_000_001];
    let rates = [0.0, 0.1, DEFAULT_COMMISSION_RATE, 0.33, 0.999, 1.0];

    for minor in amounts {
        for rate in rates {
            let amount = Money::from_minor(minor);
            let breakdown = split(amount, rate).expect("valid inputs split");
            assert_eq!(breakdown.commission + breakdown.worker_payout, amount);
            assert!(!breakdown.commission.is_negative());
            assert!(!breakdown.worker_payout.is_negative());
        }
    }
}

#[test]
fn commission_rounds_to_the_nearest_minor_unit() {
    for (minor, rate) in [(1, 0.1), (999, 0.15), (12_345, 0.33), (7, 0.5)] {
        let breakdown = split(Money::from_minor(minor), rate).expect("valid inputs split");
        let exact = minor as f64 * rate;
        let drift = (breakdown.commission.minor_units() as f64 - exact).abs();
        assert!(drift <= 0.5, "commission drifted {drift} from {exact}");
    }
}

#[test]
fn rounding_goes_up_from_the_halfway_point() {
    // 999 * 0.15 = 149.85 rounds to 150; 7 * 0.5 = 3.5 rounds to 4.
    let breakdown = split(Money::from_minor(999), 0.15).expect("valid inputs split");
    assert_eq!(breakdown.commission, Money::from_minor(150));
    assert_eq!(breakdown.worker_payout, Money::from_minor(849));

    let breakdown = split(Money::from_minor(7), 0.5).expect("valid inputs split");
    assert_eq!(breakdown.commission, Money::from_minor(4));
    assert_eq!(breakdown.worker_payout, Money::from_minor(3));
}

#[test]
fn zero_amount_splits_to_zero() {
    let breakdown = split(Money::ZERO, DEFAULT_COMMISSION_RATE).expect("zero splits");
    assert_eq!(breakdown.commission, Money::ZERO);
    assert_eq!(breakdown.worker_payout, Money::ZERO);
}

#[test]
fn full_rate_routes_everything_to_the_platform() {
    let breakdown = split(Money::from_minor(1_000), 1.0).expect("unit rate splits");
    assert_eq!(breakdown.commission, Money::from_minor(1_000));
    assert_eq!(breakdown.worker_payout, Money::ZERO);
}

#[test]
fn negative_amount_is_rejected() {
    let result = split(Money::from_minor(-1), DEFAULT_COMMISSION_RATE);
    assert_eq!(
        result,
        Err(BookingValidationError::NegativeAmount {
            amount: Money::from_minor(-1),
        })
    );
}

#[test]
fn rates_outside_the_unit_interval_are_rejected() {
    for rate in [-0.01, 1.01, f64::NAN, f64::INFINITY] {
        match split(Money::from_minor(1_000), rate) {
            Err(BookingValidationError::InvalidCommissionRate { .. }) => {}
            other => panic!("expected invalid rate for {rate}, got {other:?}"),
        }
    }
}

#[test]
fn configured_rate_changes_the_split() {
    let pricing = PricingConfig {
        commission_rate: 0.2,
    };
    let breakdown = split(Money::from_minor(1_000), pricing.commission_rate)
        .expect("configured rate splits");
    assert_eq!(breakdown.commission, Money::from_minor(200));
    assert_eq!(breakdown.worker_payout, Money::from_minor(800));
}

#[test]
fn money_displays_major_units_with_two_decimals() {
    assert_eq!(Money::from_minor(1_000).to_string(), "10.00");
    assert_eq!(Money::from_minor(5).to_string(), "0.05");
    assert_eq!(Money::from_minor(-250).to_string(), "-2.50");
    assert_eq!(Money::ZERO.to_string(), "0.00");
}
