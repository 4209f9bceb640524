use abi::{
    Booking, BookingError, BookingId, BookingQuery, DbConfig, NewBooking, Page, RoomId, StaySpan,
};
use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, PgPool, Postgres, QueryBuilder};
use tracing::debug;

use crate::{stale_version, BookingStore, ReservationManager};

const RETURNING: &str = "id, user_id, room_id, check_in, check_out, guest_count, status::text AS status, total_price, special_request, version, created_at, updated_at";

#[async_trait]
impl BookingStore for ReservationManager {
    async fn find_overlap(
        &self,
        room_id: RoomId,
        stay: StaySpan,
        exclude: Option<BookingId>,
    ) -> Result<Option<Booking>, BookingError> {
        let sql = format!(
            "SELECT {RETURNING} FROM rsvp.bookings \
             WHERE room_id = $1 AND check_in < $3 AND $2 < check_out \
             AND status NOT IN ('cancelled', 'checked_out') \
             AND ($4::BIGINT IS NULL OR id <> $4) \
             ORDER BY check_in LIMIT 1"
        );

        let booking = sqlx::query_as::<_, Booking>(&sql)
            .bind(room_id)
            .bind(stay.check_in())
            .bind(stay.check_out())
            .bind(exclude)
            .fetch_optional(&self.pool)
            .await?;

        Ok(booking)
    }

    async fn insert(&self, booking: NewBooking) -> Result<Booking, BookingError> {
        let sql = format!(
            "INSERT INTO rsvp.bookings \
             (user_id, room_id, check_in, check_out, guest_count, status, total_price, special_request) \
             VALUES ($1, $2, $3, $4, $5, $6::rsvp.booking_status, $7, $8) \
             RETURNING {RETURNING}"
        );

        // the exclusion constraint rejects an overlapping live stay at commit
        let booking = sqlx::query_as::<_, Booking>(&sql)
            .bind(booking.user_id)
            .bind(booking.room_id)
            .bind(booking.stay.check_in())
            .bind(booking.stay.check_out())
            .bind(to_db_guests(booking.guest_count)?)
            .bind(booking.status.as_str())
            .bind(booking.total_price)
            .bind(booking.special_request)
            .fetch_one(&self.pool)
            .await?;

        debug!(booking_id = booking.id, room_id = booking.room_id, "booking row inserted");
        Ok(booking)
    }

    async fn update(&self, booking: Booking) -> Result<Booking, BookingError> {
        let sql = format!(
            "UPDATE rsvp.bookings SET \
             check_in = $3, check_out = $4, guest_count = $5, status = $6::rsvp.booking_status, \
             total_price = $7, special_request = $8, version = version + 1, updated_at = now() \
             WHERE id = $1 AND version = $2 RETURNING {RETURNING}"
        );

        let updated = sqlx::query_as::<_, Booking>(&sql)
            .bind(booking.id)
            .bind(booking.version)
            .bind(booking.stay.check_in())
            .bind(booking.stay.check_out())
            .bind(to_db_guests(booking.guest_count)?)
            .bind(booking.status.as_str())
            .bind(booking.total_price)
            .bind(booking.special_request)
            .fetch_optional(&self.pool)
            .await?;

        if let Some(updated) = updated {
            return Ok(updated);
        }

        // nothing matched: either the row is gone or someone else wrote first
        let found: Option<i64> =
            sqlx::query_scalar("SELECT version FROM rsvp.bookings WHERE id = $1")
                .bind(booking.id)
                .fetch_optional(&self.pool)
                .await?;

        match found {
            Some(found) => Err(stale_version(booking.id, booking.version, found)),
            None => Err(BookingError::BookingNotFound(booking.id)),
        }
    }

    async fn get(&self, id: BookingId) -> Result<Booking, BookingError> {
        let sql = format!("SELECT {RETURNING} FROM rsvp.bookings WHERE id = $1");

        sqlx::query_as::<_, Booking>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(BookingError::BookingNotFound(id))
    }

    async fn query(&self, query: BookingQuery) -> Result<Page<Booking>, BookingError> {
        let size = query.page_size.max(1);

        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM rsvp.bookings");
        push_filters(&mut count, &query);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut select = QueryBuilder::<Postgres>::new(format!("SELECT {RETURNING} FROM rsvp.bookings"));
        push_filters(&mut select, &query);
        select
            .push(" ORDER BY id LIMIT ")
            .push_bind(i64::from(size))
            .push(" OFFSET ")
            .push_bind(i64::try_from(query.offset()).unwrap_or(i64::MAX));

        let content = select
            .build_query_as::<Booking>()
            .fetch_all(&self.pool)
            .await?;

        Ok(Page::new(
            content,
            query.page,
            size,
            u64::try_from(total).unwrap_or_default(),
        ))
    }

    async fn delete(&self, id: BookingId) -> Result<Booking, BookingError> {
        let sql = format!("DELETE FROM rsvp.bookings WHERE id = $1 RETURNING {RETURNING}");

        sqlx::query_as::<_, Booking>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(BookingError::BookingNotFound(id))
    }
}

impl ReservationManager {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn from_config(config: &DbConfig) -> Result<Self, BookingError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&config.to_url())
            .await?;

        Ok(Self::new(pool))
    }

    /// apply the schema in `migrations/`
    pub async fn migrate(&self) -> Result<(), BookingError> {
        sqlx::migrate!("../migrations")
            .run(&self.pool)
            .await
            .map_err(|e| BookingError::DbError(e.into()))
    }
}

fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, query: &BookingQuery) {
    builder.push(" WHERE TRUE");
    if let Some(status) = query.status {
        builder
            .push(" AND status = ")
            .push_bind(status.as_str())
            .push("::rsvp.booking_status");
    }
    if let Some(room_id) = query.room_id {
        builder.push(" AND room_id = ").push_bind(room_id);
    }
    if let Some(user_id) = query.user_id {
        builder.push(" AND user_id = ").push_bind(user_id);
    }
}

fn to_db_guests(guests: u32) -> Result<i32, BookingError> {
    i32::try_from(guests).map_err(|_| BookingError::InvalidGuestCount)
}
