use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{postgres::PgRow, FromRow, Row};

use crate::{BookingId, BookingStatus, RoomId, StaySpan, UserId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    pub id: BookingId,
    pub user_id: UserId,
    pub room_id: RoomId,
    #[serde(flatten)]
    pub stay: StaySpan,
    pub guest_count: u32,
    pub status: BookingStatus,
    pub total_price: Decimal,
    pub special_request: Option<String>,
    /// bumped by the store on every write; an update must carry the version it read
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    pub fn is_live(&self) -> bool {
        self.status.is_live()
    }
}

/// A booking that passed admission checks but has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBooking {
    pub user_id: UserId,
    pub room_id: RoomId,
    pub stay: StaySpan,
    pub guest_count: u32,
    pub status: BookingStatus,
    pub total_price: Decimal,
    pub special_request: Option<String>,
}

impl NewBooking {
    pub fn new_pending(
        uid: UserId,
        rid: RoomId,
        stay: StaySpan,
        guest_count: u32,
        total_price: Decimal,
        special_request: Option<String>,
    ) -> Self {
        Self {
            user_id: uid,
            room_id: rid,
            stay,
            guest_count,
            status: BookingStatus::Pending,
            total_price,
            special_request,
        }
    }

    /// assign the identity and timestamps a store gives on insert
    pub fn into_booking(self, id: BookingId, now: DateTime<Utc>) -> Booking {
        Booking {
            id,
            user_id: self.user_id,
            room_id: self.room_id,
            stay: self.stay,
            guest_count: self.guest_count,
            status: self.status,
            total_price: self.total_price,
            special_request: self.special_request,
            version: 1,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Caller input for admitting a new booking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateBooking {
    pub user_id: UserId,
    pub room_id: RoomId,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub guest_count: u32,
    #[serde(default)]
    pub special_request: Option<String>,
}

/// Fields of an existing booking to change; `None` keeps the current value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BookingUpdate {
    pub check_in: Option<NaiveDate>,
    pub check_out: Option<NaiveDate>,
    pub guest_count: Option<u32>,
    pub special_request: Option<String>,
}

impl BookingUpdate {
    pub fn changes_dates(&self) -> bool {
        self.check_in.is_some() || self.check_out.is_some()
    }
}

impl<'r> FromRow<'r, PgRow> for Booking {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        let check_in: NaiveDate = row.try_get("check_in")?;
        let check_out: NaiveDate = row.try_get("check_out")?;
        let stay = StaySpan::new(check_in, check_out).map_err(|e| decode_error("check_out", e))?;

        let guest_count: i32 = row.try_get("guest_count")?;
        let guest_count =
            u32::try_from(guest_count).map_err(|e| decode_error("guest_count", e))?;

        let status: String = row.try_get("status")?;
        let status = status
            .parse::<BookingStatus>()
            .map_err(|e| decode_error("status", e))?;

        Ok(Self {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            room_id: row.try_get("room_id")?,
            stay,
            guest_count,
            status,
            total_price: row.try_get("total_price")?,
            special_request: row.try_get("special_request")?,
            version: row.try_get("version")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

fn decode_error(
    column: &str,
    source: impl std::error::Error + Send + Sync + 'static,
) -> sqlx::Error {
    sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: Box::new(source),
    }
}
