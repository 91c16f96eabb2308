// Adapters layer: concrete BookingRepository implementations.

pub mod memory;

#[cfg(feature = "sqlite")]
pub mod sqlite;
