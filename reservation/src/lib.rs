mod manager;
mod memory;

use abi::{
    Booking, BookingError, BookingId, BookingQuery, NewBooking, Page, RoomId, StaySpan,
};
use async_trait::async_trait;
use sqlx::PgPool;

pub use memory::MemoryStore;

/// Bookings stored in postgres; the `rsvp.bookings` exclusion constraint
/// keeps live stays of a room from overlapping.
#[derive(Debug, Clone)]
pub struct ReservationManager {
    pool: PgPool,
}

/// Durable home of bookings.
///
/// Implementations must make the overlap check and the write of [`insert`]
/// and [`update`] one atomic unit per room, so that two racing requests can
/// never both store overlapping live stays. [`find_overlap`] on its own is
/// only a read and may be stale by the time the caller acts on it.
///
/// [`insert`]: BookingStore::insert
/// [`update`]: BookingStore::update
/// [`find_overlap`]: BookingStore::find_overlap
#[async_trait]
pub trait BookingStore: Send + Sync {
    /// first live booking on the room whose stay intersects `stay`, skipping `exclude`
    async fn find_overlap(
        &self,
        room_id: RoomId,
        stay: StaySpan,
        exclude: Option<BookingId>,
    ) -> Result<Option<Booking>, BookingError>;

    /// whether any live booking on the room intersects `stay`
    async fn has_overlap(
        &self,
        room_id: RoomId,
        stay: StaySpan,
        exclude: Option<BookingId>,
    ) -> Result<bool, BookingError> {
        Ok(self.find_overlap(room_id, stay, exclude).await?.is_some())
    }

    /// store a new booking, failing with `RoomNotAvailable` if it overlaps a live one
    async fn insert(&self, booking: NewBooking) -> Result<Booking, BookingError>;

    /// replace a booking whose stored version still equals `booking.version`
    ///
    /// Fails with `Conflict` if any write landed since the caller read the
    /// booking, and with `RoomNotAvailable` if the new stay overlaps another
    /// live booking. A successful write bumps the version. The room, owner
    /// and creation time of a booking never change.
    async fn update(&self, booking: Booking) -> Result<Booking, BookingError>;

    /// get booking by id
    async fn get(&self, id: BookingId) -> Result<Booking, BookingError>;

    /// query bookings, ordered by id
    async fn query(&self, query: BookingQuery) -> Result<Page<Booking>, BookingError>;

    /// delete booking, returning the removed record
    async fn delete(&self, id: BookingId) -> Result<Booking, BookingError>;
}

fn stale_version(id: BookingId, expected: i64, found: i64) -> BookingError {
    BookingError::Conflict(format!(
        "booking {id} changed concurrently: read version {expected}, stored version is {found}"
    ))
}
