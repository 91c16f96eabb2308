use crate::domain::model::{BookingId, BookingStatus};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LifecycleError {
    #[error("Booking {booking_id} not found")]
    NotFound { booking_id: BookingId },

    #[error("Invalid status transition: {from} -> {to}")]
    InvalidTransition {
        from: BookingStatus,
        to: BookingStatus,
    },

    #[error("Concurrent update conflict on booking {booking_id} after {attempts} attempts")]
    ConcurrencyConflict { booking_id: BookingId, attempts: u32 },

    #[error("Persistence error: {message}")]
    Persistence { message: String },

    #[cfg(feature = "sqlite")]
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Unknown booking status: {value}")]
    UnknownStatus { value: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Invalid configuration value for '{field}': '{value}' ({reason})")]
    InvalidConfigValue {
        field: String,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    NotFound,
    Workflow,
    Concurrency,
    Persistence,
    Configuration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl LifecycleError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            LifecycleError::NotFound { .. } => ErrorCategory::NotFound,
            LifecycleError::InvalidTransition { .. } | LifecycleError::UnknownStatus { .. } => {
                ErrorCategory::Workflow
            }
            LifecycleError::ConcurrencyConflict { .. } => ErrorCategory::Concurrency,
            LifecycleError::Persistence { .. }
            | LifecycleError::Io(_)
            | LifecycleError::Serialization(_) => ErrorCategory::Persistence,
            #[cfg(feature = "sqlite")]
            LifecycleError::Database(_) => ErrorCategory::Persistence,
            LifecycleError::Config { .. } | LifecycleError::InvalidConfigValue { .. } => {
                ErrorCategory::Configuration
            }
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Concurrency => ErrorSeverity::Medium,
            ErrorCategory::NotFound | ErrorCategory::Workflow => ErrorSeverity::High,
            ErrorCategory::Configuration | ErrorCategory::Persistence => ErrorSeverity::Critical,
        }
    }

    /// Only a lost race is worth retrying; the whole `change_status` call is
    /// re-issued by the caller, never a bare write.
    pub fn is_retryable(&self) -> bool {
        matches!(self, LifecycleError::ConcurrencyConflict { .. })
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            LifecycleError::NotFound { booking_id } => {
                format!("Check that booking {} exists", booking_id)
            }
            LifecycleError::InvalidTransition { from, .. } => {
                let allowed = from
                    .allowed_targets()
                    .iter()
                    .map(|s| s.to_string())
                    .collect::<Vec<_>>();
                if allowed.is_empty() {
                    format!("'{}' is a terminal status; no further changes are possible", from)
                } else {
                    format!("From '{}' the booking may move to: {}", from, allowed.join(", "))
                }
            }
            LifecycleError::ConcurrencyConflict { .. } => {
                "Another update won the race; reload the booking and try again".to_string()
            }
            LifecycleError::UnknownStatus { .. } => format!(
                "Use one of: {}",
                BookingStatus::ALL
                    .iter()
                    .map(|s| s.to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
            LifecycleError::Config { .. } | LifecycleError::InvalidConfigValue { .. } => {
                "Review the configuration file and command line flags".to_string()
            }
            _ => "Check that the booking store is reachable and writable".to_string(),
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::NotFound => format!("Booking not found: {}", self),
            ErrorCategory::Workflow => format!("Status change rejected: {}", self),
            ErrorCategory::Concurrency => format!("Booking is busy: {}", self),
            ErrorCategory::Persistence => format!("Storage failure: {}", self),
            ErrorCategory::Configuration => format!("Bad configuration: {}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, LifecycleError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_conflicts_are_retryable() {
        let conflict = LifecycleError::ConcurrencyConflict {
            booking_id: BookingId(7),
            attempts: 3,
        };
        let invalid = LifecycleError::InvalidTransition {
            from: BookingStatus::Completed,
            to: BookingStatus::Cancelled,
        };
        let missing = LifecycleError::NotFound {
            booking_id: BookingId(7),
        };

        assert!(conflict.is_retryable());
        assert!(!invalid.is_retryable());
        assert!(!missing.is_retryable());
        assert_eq!(conflict.severity(), ErrorSeverity::Medium);
    }

    #[test]
    fn test_terminal_suggestion_mentions_terminal() {
        let err = LifecycleError::InvalidTransition {
            from: BookingStatus::Declined,
            to: BookingStatus::Confirmed,
        };
        assert!(err.recovery_suggestion().contains("terminal"));

        let err = LifecycleError::InvalidTransition {
            from: BookingStatus::Confirmed,
            to: BookingStatus::Pending,
        };
        let suggestion = err.recovery_suggestion();
        assert!(suggestion.contains("in_progress"));
        assert!(suggestion.contains("cancelled"));
    }
}
