//! Stay pricing.
//!
//! Prices are kept at the currency's minor-unit precision: two decimal places,
//! rounding half away from zero.

use std::num::NonZeroU32;

use rust_decimal::{Decimal, RoundingStrategy};

use crate::BookingError;

pub const PRICE_SCALE: u32 = 2;

/// `nights * nightly_rate`, rounded to the minor unit.
///
/// A zero-night stay cannot be expressed here; callers reject it as an
/// invalid date range before pricing. The rate must be positive.
pub fn total_price(nights: NonZeroU32, nightly_rate: Decimal) -> Result<Decimal, BookingError> {
    if nightly_rate <= Decimal::ZERO {
        return Err(BookingError::InvalidPrice(nightly_rate));
    }

    let total = Decimal::from(nights.get())
        .checked_mul(nightly_rate)
        .ok_or(BookingError::InvalidPrice(nightly_rate))?;

    Ok(total.round_dp_with_strategy(PRICE_SCALE, RoundingStrategy::MidpointAwayFromZero))
}
