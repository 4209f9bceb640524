use std::sync::Arc;

use abi::{
    pricing, validate_special_request, Booking, BookingConfig, BookingError, BookingId,
    BookingQuery, BookingUpdate, Config, ConflictInfo, CreateBooking, NewBooking, Page, Room,
    RoomId, RoomStatus, StaySpan, Transition, User, UserId,
};
use chrono::NaiveDate;
use reservation::{BookingStore, ReservationManager};
use tracing::{debug, info, warn};

use crate::{BookingService, Notifier, RoomCatalog, TracingNotifier, UserDirectory};

#[derive(Debug, Clone, Copy)]
enum Notification {
    Confirmed,
    Cancelled,
}

impl BookingService {
    pub fn new(
        store: Arc<dyn BookingStore>,
        rooms: Arc<dyn RoomCatalog>,
        users: Arc<dyn UserDirectory>,
        config: BookingConfig,
    ) -> Self {
        Self {
            store,
            rooms,
            users,
            notifier: Arc::new(TracingNotifier),
            config,
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    /// connect to the configured postgres store
    pub async fn from_config(
        config: &Config,
        rooms: Arc<dyn RoomCatalog>,
        users: Arc<dyn UserDirectory>,
    ) -> Result<Self, BookingError> {
        let manager = ReservationManager::from_config(&config.db).await?;
        info!(host = %config.db.host, dbname = %config.db.dbname, "connected to booking store");

        Ok(Self::new(
            Arc::new(manager),
            rooms,
            users,
            config.booking.clone(),
        ))
    }

    /// admit a new booking in `Pending` state
    pub async fn create_booking(&self, request: CreateBooking) -> Result<Booking, BookingError> {
        let stay = StaySpan::new(request.check_in, request.check_out)?;
        validate_special_request(request.special_request.as_deref())?;

        let room = self.find_room(request.room_id).await?;
        check_capacity(request.guest_count, &room)?;

        // fast path only: the store re-checks atomically on insert
        if let Some(existing) = self.store.find_overlap(room.id, stay, None).await? {
            warn!(
                room_id = room.id,
                check_in = %stay.check_in(),
                check_out = %stay.check_out(),
                conflicting_booking = existing.id,
                "room not available"
            );
            return Err(BookingError::RoomNotAvailable(ConflictInfo::between(
                room.id, stay, &existing,
            )));
        }

        let user = self.find_user(request.user_id).await?;
        let total_price = pricing::total_price(stay.nights(), room.nightly_rate)?;

        let booking = NewBooking::new_pending(
            user.id,
            room.id,
            stay,
            request.guest_count,
            total_price,
            request.special_request,
        );
        let booking = self.store.insert(booking).await.map_err(|e| {
            warn!(room_id = room.id, error = %e, "booking admission failed");
            e
        })?;

        info!(
            booking_id = booking.id,
            room_id = booking.room_id,
            user_id = booking.user_id,
            nights = stay.nights().get(),
            total_price = %booking.total_price,
            "booking created"
        );
        Ok(booking)
    }

    pub async fn get_booking(&self, id: BookingId) -> Result<Booking, BookingError> {
        let booking = self.store.get(id).await?;
        debug!(booking_id = id, status = %booking.status, "booking fetched");
        Ok(booking)
    }

    pub async fn list_bookings(&self, query: BookingQuery) -> Result<Page<Booking>, BookingError> {
        let query = query.normalize(self.config.default_page_size, self.config.max_page_size);
        let page = self.store.query(query).await?;

        debug!(
            page = page.page,
            size = page.size,
            returned = page.content.len(),
            total = page.total_elements,
            "bookings listed"
        );
        Ok(page)
    }

    /// change dates, guests or special request of a booking that has not started
    pub async fn update_booking(
        &self,
        id: BookingId,
        update: BookingUpdate,
    ) -> Result<Booking, BookingError> {
        let current = self.store.get(id).await?;
        if !current.status.is_modifiable() {
            return Err(BookingError::InvalidStateTransition {
                from: current.status,
                operation: "update",
            });
        }
        validate_special_request(update.special_request.as_deref())?;

        let stay = StaySpan::new(
            update.check_in.unwrap_or(current.stay.check_in()),
            update.check_out.unwrap_or(current.stay.check_out()),
        )?;
        let dates_changed = stay != current.stay;

        let mut next = current.clone();
        if dates_changed || update.guest_count.is_some() {
            let room = self.find_room(current.room_id).await?;

            if let Some(guests) = update.guest_count {
                check_capacity(guests, &room)?;
                next.guest_count = guests;
            }

            if dates_changed {
                if let Some(existing) = self.store.find_overlap(room.id, stay, Some(id)).await? {
                    warn!(
                        booking_id = id,
                        conflicting_booking = existing.id,
                        "new dates collide with another booking"
                    );
                    return Err(BookingError::RoomNotAvailable(ConflictInfo::between(
                        room.id, stay, &existing,
                    )));
                }
                next.stay = stay;
                next.total_price = pricing::total_price(stay.nights(), room.nightly_rate)?;
            }
        }
        if let Some(special_request) = update.special_request {
            next.special_request = Some(special_request);
        }

        let booking = self.store.update(next).await?;
        info!(booking_id = id, dates_changed, "booking updated");
        Ok(booking)
    }

    pub async fn confirm_booking(&self, id: BookingId) -> Result<Booking, BookingError> {
        let booking = self.transition(id, Transition::Confirm).await?;
        self.notify(Notification::Confirmed, &booking);
        Ok(booking)
    }

    pub async fn cancel_booking(&self, id: BookingId) -> Result<Booking, BookingError> {
        let booking = self.transition(id, Transition::Cancel).await?;
        self.notify(Notification::Cancelled, &booking);
        Ok(booking)
    }

    pub async fn check_in(&self, id: BookingId) -> Result<Booking, BookingError> {
        let booking = self.transition(id, Transition::CheckIn).await?;
        self.mark_room(booking.room_id, RoomStatus::Occupied).await;
        Ok(booking)
    }

    pub async fn check_out(&self, id: BookingId) -> Result<Booking, BookingError> {
        let booking = self.transition(id, Transition::CheckOut).await?;
        self.mark_room(booking.room_id, RoomStatus::Available).await;
        Ok(booking)
    }

    /// remove a finished or cancelled booking from history
    pub async fn delete_booking(&self, id: BookingId) -> Result<Booking, BookingError> {
        let current = self.store.get(id).await?;
        if !current.status.is_terminal() {
            return Err(BookingError::InvalidStateTransition {
                from: current.status,
                operation: "delete",
            });
        }

        let booking = self.store.delete(id).await?;
        info!(booking_id = id, status = %booking.status, "booking deleted");
        Ok(booking)
    }

    /// whether no live booking holds the room on any night of the stay
    pub async fn is_room_available(
        &self,
        room_id: RoomId,
        check_in: NaiveDate,
        check_out: NaiveDate,
    ) -> Result<bool, BookingError> {
        let stay = StaySpan::new(check_in, check_out)?;
        let room = self.find_room(room_id).await?;
        Ok(!self.store.has_overlap(room.id, stay, None).await?)
    }

    /// the write only lands if nothing changed the booking since it was read
    async fn transition(&self, id: BookingId, op: Transition) -> Result<Booking, BookingError> {
        let current = self.store.get(id).await?;
        let mut next = current.clone();
        next.status = current.status.apply(op)?;

        let booking = self.store.update(next).await?;
        info!(
            booking_id = id,
            from = %current.status,
            to = %booking.status,
            "booking status changed"
        );
        Ok(booking)
    }

    async fn find_room(&self, id: RoomId) -> Result<Room, BookingError> {
        self.rooms
            .find_room_by_id(id)
            .await
            .map_err(|e| BookingError::Internal(format!("room catalog: {e:#}")))?
            .ok_or(BookingError::RoomNotFound(id))
    }

    async fn find_user(&self, id: UserId) -> Result<User, BookingError> {
        let user = self
            .users
            .find_user_by_id(id)
            .await
            .map_err(|e| BookingError::Internal(format!("user directory: {e:#}")))?
            .ok_or(BookingError::UserNotFound(id))?;

        if self.config.reject_inactive_users && !self.users.user_is_active(&user) {
            warn!(user_id = id, "inactive user refused");
            return Err(BookingError::UserNotFound(id));
        }
        Ok(user)
    }

    async fn mark_room(&self, room_id: RoomId, status: RoomStatus) {
        if let Err(e) = self.rooms.set_room_status(room_id, status).await {
            warn!(room_id, %status, error = %e, "failed to update room status");
        }
    }

    fn notify(&self, kind: Notification, booking: &Booking) {
        let notifier = Arc::clone(&self.notifier);
        let booking = booking.clone();

        tokio::spawn(async move {
            let result = match kind {
                Notification::Confirmed => notifier.booking_confirmed(&booking).await,
                Notification::Cancelled => notifier.booking_cancelled(&booking).await,
            };
            if let Err(e) = result {
                warn!(booking_id = booking.id, ?kind, error = %e, "booking notification failed");
            }
        });
    }
}

fn check_capacity(guests: u32, room: &Room) -> Result<(), BookingError> {
    if guests == 0 {
        return Err(BookingError::InvalidGuestCount);
    }
    if !room.fits(guests) {
        return Err(BookingError::CapacityExceeded {
            guests,
            capacity: room.capacity,
        });
    }
    Ok(())
}
