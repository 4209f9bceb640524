mod booking;
mod booking_query;
mod booking_status;
mod room;
mod user;

use std::num::NonZeroU32;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub use booking::*;
pub use booking_query::*;
pub use booking_status::*;
pub use room::*;
pub use user::*;

use crate::BookingError;

/// A validated half-open stay `[check_in, check_out)`.
///
/// Check-out is always strictly after check-in, so every span covers at
/// least one night. The night of `check_out` itself is not part of the span,
/// which lets one guest check out on the day the next one checks in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawStay", into = "RawStay")]
pub struct StaySpan {
    check_in: NaiveDate,
    check_out: NaiveDate,
    nights: NonZeroU32,
}

#[derive(Serialize, Deserialize)]
struct RawStay {
    check_in: NaiveDate,
    check_out: NaiveDate,
}

impl StaySpan {
    pub fn new(check_in: NaiveDate, check_out: NaiveDate) -> Result<Self, BookingError> {
        let invalid = || BookingError::InvalidDateRange {
            check_in,
            check_out,
        };

        let days = (check_out - check_in).num_days();
        let nights = u32::try_from(days)
            .ok()
            .and_then(NonZeroU32::new)
            .ok_or_else(invalid)?;

        Ok(Self {
            check_in,
            check_out,
            nights,
        })
    }

    pub fn check_in(&self) -> NaiveDate {
        self.check_in
    }

    pub fn check_out(&self) -> NaiveDate {
        self.check_out
    }

    pub fn nights(&self) -> NonZeroU32 {
        self.nights
    }

    /// `[a, b)` and `[c, d)` overlap iff `a < d && c < b`
    pub fn overlaps(&self, other: &StaySpan) -> bool {
        self.check_in < other.check_out && other.check_in < self.check_out
    }
}

impl TryFrom<RawStay> for StaySpan {
    type Error = BookingError;

    fn try_from(raw: RawStay) -> Result<Self, Self::Error> {
        Self::new(raw.check_in, raw.check_out)
    }
}

impl From<StaySpan> for RawStay {
    fn from(span: StaySpan) -> Self {
        Self {
            check_in: span.check_in,
            check_out: span.check_out,
        }
    }
}
