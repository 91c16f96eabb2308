//! Booking status transition rules.
//!
//! The graph is a static table; every terminal status maps to an empty slice.
//! A self-transition is always legal and never appears in the table.

use crate::domain::model::BookingStatus;
use crate::utils::error::{LifecycleError, Result};

use BookingStatus::*;

static TRANSITIONS: [(BookingStatus, &[BookingStatus]); 6] = [
    (Pending, &[Confirmed, Declined, Cancelled]),
    (Confirmed, &[InProgress, Cancelled]),
    (InProgress, &[Completed, Cancelled]),
    (Completed, &[]),
    (Cancelled, &[]),
    (Declined, &[]),
];

impl BookingStatus {
    /// Statuses reachable in one non-self step.
    pub fn allowed_targets(&self) -> &'static [BookingStatus] {
        TRANSITIONS
            .iter()
            .find(|(from, _)| from == self)
            .map(|(_, targets)| *targets)
            .unwrap_or(&[])
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TransitionPolicy;

impl TransitionPolicy {
    pub fn can_transition(from: BookingStatus, to: BookingStatus) -> bool {
        from == to || from.allowed_targets().contains(&to)
    }

    pub fn ensure_transition(from: BookingStatus, to: BookingStatus) -> Result<()> {
        if Self::can_transition(from, to) {
            Ok(())
        } else {
            Err(LifecycleError::InvalidTransition { from, to })
        }
    }

    pub fn transition(from: BookingStatus, to: BookingStatus) -> Result<BookingStatus> {
        Self::ensure_transition(from, to)?;
        Ok(to)
    }
}
