use serde::{Deserialize, Serialize};

use super::domain::{BookingValidationError, Money};

pub const DEFAULT_COMMISSION_RATE: f64 = 0.15;

/// Platform pricing dials applied to every financial event.
///
/// Resolved from configuration when a service is built and fixed for its
/// lifetime; the rate never varies per call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricingConfig {
    pub commission_rate: f64,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            commission_rate: DEFAULT_COMMISSION_RATE,
        }
    }
}

/// How a final amount divides between the platform and the worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentBreakdown {
    pub commission: Money,
    pub worker_payout: Money,
}

/// Split `final_amount` at `commission_rate`, rounding the commission to the
/// nearest minor unit. The payout absorbs the rounding so the two parts
/// always sum back to the input.
pub fn split(
    final_amount: Money,
    commission_rate: f64,
) -> Result<PaymentBreakdown, BookingValidationError> {
    if final_amount.is_negative() {
        return Err(BookingValidationError::NegativeAmount {
            amount: final_amount,
        });
    }
    if !commission_rate.is_finite() || !(0.0..=1.0).contains(&commission_rate) {
        return Err(BookingValidationError::InvalidCommissionRate {
            rate: commission_rate,
        });
    }

    let commission =
        Money::from_minor((final_amount.minor_units() as f64 * commission_rate).round() as i64);
    let worker_payout = final_amount - commission;

    Ok(PaymentBreakdown {
        commission,
        worker_payout,
    })
}
