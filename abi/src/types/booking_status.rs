use core::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::BookingError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    CheckedIn,
    CheckedOut,
    Cancelled,
}

impl BookingStatus {
    pub const ALL: [BookingStatus; 5] = [
        BookingStatus::Pending,
        BookingStatus::Confirmed,
        BookingStatus::CheckedIn,
        BookingStatus::CheckedOut,
        BookingStatus::Cancelled,
    ];

    /// live bookings hold their room for the stay
    pub const fn is_live(self) -> bool {
        !self.is_terminal()
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, BookingStatus::Cancelled | BookingStatus::CheckedOut)
    }

    /// dates, guests and special request can only change before check-in
    pub const fn is_modifiable(self) -> bool {
        matches!(self, BookingStatus::Pending | BookingStatus::Confirmed)
    }

    pub const fn can_transition_to(self, next: BookingStatus) -> bool {
        use BookingStatus::*;

        matches!(
            (self, next),
            (Pending, Confirmed)
                | (Pending, Cancelled)
                | (Confirmed, CheckedIn)
                | (Confirmed, Cancelled)
                | (CheckedIn, CheckedOut)
        )
    }

    /// apply a lifecycle operation, yielding the status it leads to
    pub fn apply(self, transition: Transition) -> Result<BookingStatus, BookingError> {
        let next = transition.target();
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(BookingError::InvalidStateTransition {
                from: self,
                operation: transition.as_str(),
            })
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::CheckedIn => "checked_in",
            BookingStatus::CheckedOut => "checked_out",
            BookingStatus::Cancelled => "cancelled",
        }
    }
}

/// Lifecycle operations a caller can request on an existing booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Transition {
    Confirm,
    CheckIn,
    CheckOut,
    Cancel,
}

impl Transition {
    pub const ALL: [Transition; 4] = [
        Transition::Confirm,
        Transition::CheckIn,
        Transition::CheckOut,
        Transition::Cancel,
    ];

    pub const fn target(self) -> BookingStatus {
        match self {
            Transition::Confirm => BookingStatus::Confirmed,
            Transition::CheckIn => BookingStatus::CheckedIn,
            Transition::CheckOut => BookingStatus::CheckedOut,
            Transition::Cancel => BookingStatus::Cancelled,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Transition::Confirm => "confirm",
            Transition::CheckIn => "check in",
            Transition::CheckOut => "check out",
            Transition::Cancel => "cancel",
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = BookingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BookingStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| BookingError::InvalidStatus(s.to_string()))
    }
}
