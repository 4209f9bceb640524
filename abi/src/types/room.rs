use core::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::RoomId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoomStatus {
    #[default]
    Available,
    Occupied,
    Maintenance,
    OutOfService,
}

impl fmt::Display for RoomStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoomStatus::Available => write!(f, "available"),
            RoomStatus::Occupied => write!(f, "occupied"),
            RoomStatus::Maintenance => write!(f, "maintenance"),
            RoomStatus::OutOfService => write!(f, "out_of_service"),
        }
    }
}

/// The slice of a catalog room the booking engine reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    pub id: RoomId,
    pub number: String,
    pub capacity: u32,
    pub nightly_rate: Decimal,
    #[serde(default)]
    pub status: RoomStatus,
}

impl Room {
    pub fn new(id: RoomId, number: impl Into<String>, capacity: u32, nightly_rate: Decimal) -> Self {
        Self {
            id,
            number: number.into(),
            capacity,
            nightly_rate,
            status: RoomStatus::Available,
        }
    }

    pub fn fits(&self, guests: u32) -> bool {
        guests <= self.capacity
    }
}
