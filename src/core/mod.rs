pub mod guard;
pub mod lifecycle;

pub use crate::domain::model::{Booking, BookingId, BookingStatus, StatusChange, WriteOutcome};
pub use crate::domain::ports::{BookingRepository, ConfigProvider};
pub use crate::utils::error::Result;
