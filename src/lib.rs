pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use adapters::memory::InMemoryBookingRepository;
#[cfg(feature = "sqlite")]
pub use adapters::sqlite::SqliteBookingRepository;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::TomlConfig;

pub use crate::core::{guard::ConcurrencyGuard, lifecycle::BookingLifecycleService};
pub use domain::model::{Booking, BookingId, BookingStatus, StatusChange, WriteOutcome};
pub use domain::policy::TransitionPolicy;
pub use domain::ports::{BookingRepository, ConfigProvider};
pub use utils::error::{LifecycleError, Result};
