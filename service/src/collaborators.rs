//! Systems the booking engine talks to but does not own.

use std::collections::HashMap;

use abi::{Booking, Room, RoomId, RoomStatus, User, UserId};
use anyhow::{bail, Result};
use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::info;

#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn find_user_by_id(&self, id: UserId) -> Result<Option<User>>;

    fn user_is_active(&self, user: &User) -> bool {
        user.is_active()
    }
}

#[async_trait]
pub trait RoomCatalog: Send + Sync {
    async fn find_room_by_id(&self, id: RoomId) -> Result<Option<Room>>;

    /// reflect a check-in or check-out on the room
    async fn set_room_status(&self, id: RoomId, status: RoomStatus) -> Result<()>;
}

/// Fire-and-forget delivery of booking events. Failures never undo a booking.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn booking_confirmed(&self, booking: &Booking) -> Result<()>;

    async fn booking_cancelled(&self, booking: &Booking) -> Result<()>;
}

/// Notifier that only writes a log line.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

#[async_trait]
impl Notifier for TracingNotifier {
    async fn booking_confirmed(&self, booking: &Booking) -> Result<()> {
        info!(booking_id = booking.id, user_id = booking.user_id, "booking confirmed");
        Ok(())
    }

    async fn booking_cancelled(&self, booking: &Booking) -> Result<()> {
        info!(booking_id = booking.id, user_id = booking.user_id, "booking cancelled");
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct InMemoryRooms {
    rooms: RwLock<HashMap<RoomId, Room>>,
}

impl InMemoryRooms {
    pub fn new(rooms: impl IntoIterator<Item = Room>) -> Self {
        Self {
            rooms: RwLock::new(rooms.into_iter().map(|r| (r.id, r)).collect()),
        }
    }

    pub async fn insert(&self, room: Room) {
        self.rooms.write().await.insert(room.id, room);
    }
}

#[async_trait]
impl RoomCatalog for InMemoryRooms {
    async fn find_room_by_id(&self, id: RoomId) -> Result<Option<Room>> {
        Ok(self.rooms.read().await.get(&id).cloned())
    }

    async fn set_room_status(&self, id: RoomId, status: RoomStatus) -> Result<()> {
        match self.rooms.write().await.get_mut(&id) {
            Some(room) => {
                room.status = status;
                Ok(())
            }
            None => bail!("room {id} is not in the catalog"),
        }
    }
}

#[derive(Debug, Default)]
pub struct InMemoryUsers {
    users: RwLock<HashMap<UserId, User>>,
}

impl InMemoryUsers {
    pub fn new(users: impl IntoIterator<Item = User>) -> Self {
        Self {
            users: RwLock::new(users.into_iter().map(|u| (u.id, u)).collect()),
        }
    }

    pub async fn insert(&self, user: User) {
        self.users.write().await.insert(user.id, user);
    }
}

#[async_trait]
impl UserDirectory for InMemoryUsers {
    async fn find_user_by_id(&self, id: UserId) -> Result<Option<User>> {
        Ok(self.users.read().await.get(&id).cloned())
    }
}
