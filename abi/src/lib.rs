mod config;
mod error;
pub mod pricing;
mod types;

pub use config::*;
pub use error::*;
pub use types::*;

pub type BookingId = i64;
pub type RoomId = i64;
pub type UserId = i64;

/// longest special request a booking may carry, in characters
pub const MAX_SPECIAL_REQUEST_LEN: usize = 500;

pub fn validate_special_request(request: Option<&str>) -> Result<(), BookingError> {
    match request {
        Some(s) if s.chars().count() > MAX_SPECIAL_REQUEST_LEN => {
            Err(BookingError::SpecialRequestTooLong {
                max: MAX_SPECIAL_REQUEST_LEN,
            })
        }
        _ => Ok(()),
    }
}
