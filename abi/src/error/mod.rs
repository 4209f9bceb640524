mod conflict;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::postgres::PgDatabaseError;
use thiserror::Error;

pub use conflict::*;

use crate::{BookingId, BookingStatus, RoomId, UserId};

#[derive(Error, Debug)]
pub enum BookingError {
    #[error("invalid date range: check-out {check_out} must be after check-in {check_in}")]
    InvalidDateRange {
        check_in: NaiveDate,
        check_out: NaiveDate,
    },

    #[error("{guests} guests exceed the room capacity of {capacity}")]
    CapacityExceeded { guests: u32, capacity: u32 },

    #[error("a booking needs at least one guest")]
    InvalidGuestCount,

    #[error("invalid nightly rate: {0}")]
    InvalidPrice(Decimal),

    #[error("special request is longer than {max} characters")]
    SpecialRequestTooLong { max: usize },

    #[error("invalid booking status: {0}")]
    InvalidStatus(String),

    #[error("room not found: {0}")]
    RoomNotFound(RoomId),

    #[error("user not found: {0}")]
    UserNotFound(UserId),

    #[error("room is not available for the selected dates")]
    RoomNotAvailable(ConflictInfo),

    #[error("cannot {operation} a {from} booking")]
    InvalidStateTransition {
        from: BookingStatus,
        operation: &'static str,
    },

    #[error("booking not found: {0}")]
    BookingNotFound(BookingId),

    #[error("concurrent update lost: {0}")]
    Conflict(String),

    #[error("db error: {0}")]
    DbError(sqlx::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl BookingError {
    /// only lost races are worth retrying as-is
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }

    /// HTTP-equivalent outcome for callers that need one
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidDateRange { .. }
            | Self::CapacityExceeded { .. }
            | Self::InvalidGuestCount
            | Self::InvalidPrice(_)
            | Self::SpecialRequestTooLong { .. }
            | Self::InvalidStatus(_) => 400,
            Self::RoomNotFound(_) | Self::UserNotFound(_) | Self::BookingNotFound(_) => 404,
            Self::RoomNotAvailable(_) | Self::InvalidStateTransition { .. } | Self::Conflict(_) => {
                409
            }
            Self::DbError(_) | Self::Internal(_) => 500,
        }
    }
}

impl PartialEq for BookingError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            // sqlx errors carry no equality; any two count as the same failure
            (Self::DbError(_), Self::DbError(_)) => true,
            (
                Self::InvalidDateRange {
                    check_in: a1,
                    check_out: b1,
                },
                Self::InvalidDateRange {
                    check_in: a2,
                    check_out: b2,
                },
            ) => a1 == a2 && b1 == b2,
            (
                Self::CapacityExceeded {
                    guests: g1,
                    capacity: c1,
                },
                Self::CapacityExceeded {
                    guests: g2,
                    capacity: c2,
                },
            ) => g1 == g2 && c1 == c2,
            (Self::InvalidGuestCount, Self::InvalidGuestCount) => true,
            (Self::InvalidPrice(v1), Self::InvalidPrice(v2)) => v1 == v2,
            (Self::SpecialRequestTooLong { max: m1 }, Self::SpecialRequestTooLong { max: m2 }) => {
                m1 == m2
            }
            (Self::InvalidStatus(v1), Self::InvalidStatus(v2)) => v1 == v2,
            (Self::RoomNotFound(v1), Self::RoomNotFound(v2)) => v1 == v2,
            (Self::UserNotFound(v1), Self::UserNotFound(v2)) => v1 == v2,
            (Self::RoomNotAvailable(v1), Self::RoomNotAvailable(v2)) => v1 == v2,
            (
                Self::InvalidStateTransition {
                    from: f1,
                    operation: o1,
                },
                Self::InvalidStateTransition {
                    from: f2,
                    operation: o2,
                },
            ) => f1 == f2 && o1 == o2,
            (Self::BookingNotFound(v1), Self::BookingNotFound(v2)) => v1 == v2,
            (Self::Conflict(v1), Self::Conflict(v2)) => v1 == v2,
            (Self::Internal(v1), Self::Internal(v2)) => v1 == v2,
            _ => false,
        }
    }
}

/// SQLSTATEs raised when a concurrent transaction wins the race
const CONTENTION_CODES: [&str; 4] = [
    "40001", // serialization_failure
    "40P01", // deadlock_detected
    "55P03", // lock_not_available
    "57014", // query_canceled (statement timeout)
];

impl From<sqlx::Error> for BookingError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::Database(db) => {
                if let Some(err) = db.try_downcast_ref::<PgDatabaseError>() {
                    match (err.code(), err.schema(), err.table()) {
                        ("23P01", Some("rsvp"), Some("bookings")) => {
                            let info = match err.detail() {
                                Some(detail) => ConflictInfo::from_detail(detail),
                                None => ConflictInfo::Unparsed(err.message().to_string()),
                            };
                            return Self::RoomNotAvailable(info);
                        }
                        (code, _, _) if CONTENTION_CODES.contains(&code) => {
                            return Self::Conflict(err.message().to_string());
                        }
                        _ => {}
                    }
                }
                Self::DbError(sqlx::Error::Database(db))
            }
            sqlx::Error::PoolTimedOut => {
                Self::Conflict("timed out waiting for a database connection".to_string())
            }
            _ => Self::DbError(e),
        }
    }
}
