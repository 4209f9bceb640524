use std::{
    collections::{BTreeMap, HashMap},
    sync::{
        atomic::{AtomicI64, Ordering},
        Arc,
    },
};

use abi::{
    Booking, BookingError, BookingId, BookingQuery, ConflictInfo, NewBooking, Page, RoomId,
    StaySpan,
};
use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

use crate::{stale_version, BookingStore};

/// In-process booking store.
///
/// Writers for a room serialize on that room's entry in a lock table and hold
/// it across the overlap check and the write. Each write replaces a whole
/// booking under the map's write lock, so readers never see a half-applied
/// change and never wait on room locks.
#[derive(Debug, Default)]
pub struct MemoryStore {
    next_id: AtomicI64,
    bookings: RwLock<BTreeMap<BookingId, Booking>>,
    room_locks: Mutex<HashMap<RoomId, Arc<Mutex<()>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn room_lock(&self, room_id: RoomId) -> Arc<Mutex<()>> {
        let mut locks = self.room_locks.lock().await;
        Arc::clone(locks.entry(room_id).or_default())
    }

    async fn overlapping(
        &self,
        room_id: RoomId,
        stay: StaySpan,
        exclude: Option<BookingId>,
    ) -> Option<Booking> {
        self.bookings
            .read()
            .await
            .values()
            .filter(|b| b.room_id == room_id && b.is_live() && Some(b.id) != exclude)
            .find(|b| b.stay.overlaps(&stay))
            .cloned()
    }

    async fn lookup(&self, id: BookingId) -> Result<Booking, BookingError> {
        self.bookings
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(BookingError::BookingNotFound(id))
    }
}

#[async_trait]
impl BookingStore for MemoryStore {
    async fn find_overlap(
        &self,
        room_id: RoomId,
        stay: StaySpan,
        exclude: Option<BookingId>,
    ) -> Result<Option<Booking>, BookingError> {
        Ok(self.overlapping(room_id, stay, exclude).await)
    }

    async fn insert(&self, booking: NewBooking) -> Result<Booking, BookingError> {
        let lock = self.room_lock(booking.room_id).await;
        let _guard = lock.lock().await;

        if booking.status.is_live() {
            if let Some(existing) = self.overlapping(booking.room_id, booking.stay, None).await {
                return Err(BookingError::RoomNotAvailable(ConflictInfo::between(
                    booking.room_id,
                    booking.stay,
                    &existing,
                )));
            }
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let booking = booking.into_booking(id, Utc::now());
        self.bookings.write().await.insert(id, booking.clone());

        debug!(booking_id = id, room_id = booking.room_id, "booking stored");
        Ok(booking)
    }

    async fn update(&self, mut booking: Booking) -> Result<Booking, BookingError> {
        let room_id = self.lookup(booking.id).await?.room_id;
        let lock = self.room_lock(room_id).await;
        let _guard = lock.lock().await;

        // re-read under the room lock, the booking may have moved on meanwhile
        let current = self.lookup(booking.id).await?;
        if current.version != booking.version {
            return Err(stale_version(booking.id, booking.version, current.version));
        }

        if booking.status.is_live() {
            if let Some(existing) = self
                .overlapping(room_id, booking.stay, Some(booking.id))
                .await
            {
                return Err(BookingError::RoomNotAvailable(ConflictInfo::between(
                    room_id,
                    booking.stay,
                    &existing,
                )));
            }
        }

        booking.room_id = current.room_id;
        booking.user_id = current.user_id;
        booking.created_at = current.created_at;
        booking.version = current.version + 1;
        booking.updated_at = Utc::now();
        self.bookings.write().await.insert(booking.id, booking.clone());

        Ok(booking)
    }

    async fn get(&self, id: BookingId) -> Result<Booking, BookingError> {
        self.lookup(id).await
    }

    async fn query(&self, query: BookingQuery) -> Result<Page<Booking>, BookingError> {
        let size = query.page_size.max(1);
        let offset = usize::try_from(query.offset()).unwrap_or(usize::MAX);

        let bookings = self.bookings.read().await;
        let matching: Vec<&Booking> = bookings
            .values()
            .filter(|b| query.matches(b.status, b.room_id, b.user_id))
            .collect();

        let total = matching.len() as u64;
        let content = matching
            .into_iter()
            .skip(offset)
            .take(size as usize)
            .cloned()
            .collect();

        Ok(Page::new(content, query.page, size, total))
    }

    async fn delete(&self, id: BookingId) -> Result<Booking, BookingError> {
        let room_id = self.lookup(id).await?.room_id;
        let lock = self.room_lock(room_id).await;
        let _guard = lock.lock().await;

        self.bookings
            .write()
            .await
            .remove(&id)
            .ok_or(BookingError::BookingNotFound(id))
    }
}
