use crate::utils::error::LifecycleError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BookingId(pub i64);

impl fmt::Display for BookingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<i64> for BookingId {
    fn from(id: i64) -> Self {
        BookingId(id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    InProgress,
    Completed,
    Cancelled,
    Declined,
}

impl BookingStatus {
    pub const ALL: [BookingStatus; 6] = [
        BookingStatus::Pending,
        BookingStatus::Confirmed,
        BookingStatus::InProgress,
        BookingStatus::Completed,
        BookingStatus::Cancelled,
        BookingStatus::Declined,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::InProgress => "in_progress",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::Declined => "declined",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            BookingStatus::Completed | BookingStatus::Cancelled | BookingStatus::Declined
        )
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = LifecycleError;

    /// Accepts `in_progress`, `in-progress` and `InProgress` alike.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .flat_map(char::to_lowercase)
            .collect();

        match normalized.as_str() {
            "pending" => Ok(BookingStatus::Pending),
            "confirmed" => Ok(BookingStatus::Confirmed),
            "inprogress" => Ok(BookingStatus::InProgress),
            "completed" => Ok(BookingStatus::Completed),
            "cancelled" | "canceled" => Ok(BookingStatus::Cancelled),
            "declined" => Ok(BookingStatus::Declined),
            _ => Err(LifecycleError::UnknownStatus {
                value: s.to_string(),
            }),
        }
    }
}

/// A booking as persisted by the storage collaborator. Only `status`,
/// `version` and `updated_at` ever change after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    pub id: BookingId,
    pub customer_id: i64,
    pub worker_id: i64,
    pub service_id: i64,
    pub status: BookingStatus,
    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    /// A freshly created booking: `Pending` at version 0.
    pub fn new(id: BookingId, customer_id: i64, worker_id: i64, service_id: i64) -> Self {
        let now = Utc::now();
        Self {
            id,
            customer_id,
            worker_id,
            service_id,
            status: BookingStatus::Pending,
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Result of a single compare-and-swap against the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Committed { version: u64 },
    Conflict,
}

/// Success value of a status change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChange {
    pub booking_id: BookingId,
    pub from: BookingStatus,
    pub to: BookingStatus,
    pub version: u64,
    pub attempts: u32,
    /// False for a self-transition, which is accepted without a write.
    pub applied: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parsing_accepts_common_spellings() {
        assert_eq!("in_progress".parse::<BookingStatus>().unwrap(), BookingStatus::InProgress);
        assert_eq!("In-Progress".parse::<BookingStatus>().unwrap(), BookingStatus::InProgress);
        assert_eq!("InProgress".parse::<BookingStatus>().unwrap(), BookingStatus::InProgress);
        assert_eq!(" CONFIRMED ".parse::<BookingStatus>().unwrap(), BookingStatus::Confirmed);
        assert_eq!("canceled".parse::<BookingStatus>().unwrap(), BookingStatus::Cancelled);
        assert!("archived".parse::<BookingStatus>().is_err());
    }

    #[test]
    fn test_status_display_parses_back() {
        for status in BookingStatus::ALL {
            assert_eq!(status.to_string().parse::<BookingStatus>().unwrap(), status);
        }
    }

    #[test]
    fn test_status_serializes_snake_case() {
        let json = serde_json::to_string(&BookingStatus::InProgress).unwrap();
        assert_eq!(json, "\"in_progress\"");
    }

    #[test]
    fn test_new_booking_is_pending_at_version_zero() {
        let booking = Booking::new(BookingId(1), 10, 20, 30);
        assert_eq!(booking.status, BookingStatus::Pending);
        assert_eq!(booking.version, 0);
        assert_eq!(booking.created_at, booking.updated_at);
    }
}
