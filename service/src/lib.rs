mod collaborators;
mod service;
mod telemetry;

use std::sync::Arc;

use abi::BookingConfig;
use reservation::BookingStore;

pub use collaborators::*;
pub use telemetry::init_tracing;

/// Admits, prices and moves bookings through their lifecycle.
///
/// All collaborators are shared handles; clones of the service are cheap and
/// may be used from any number of request handlers at once.
#[derive(Clone)]
pub struct BookingService {
    store: Arc<dyn BookingStore>,
    rooms: Arc<dyn RoomCatalog>,
    users: Arc<dyn UserDirectory>,
    notifier: Arc<dyn Notifier>,
    config: BookingConfig,
}
