//! Optimistic concurrency around booking status writes.
//!
//! The guard never locks anything itself. It hands the compare-and-swap to the
//! repository and, on conflict, re-runs the caller's whole read-check-write
//! attempt from a fresh read, up to `max_attempts` times.

use crate::domain::model::{BookingId, BookingStatus, WriteOutcome};
use crate::domain::ports::BookingRepository;
use crate::utils::error::{LifecycleError, Result};
use std::future::Future;

/// What one read-check-write attempt produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attempt<T> {
    Done(T),
    Conflict,
}

#[derive(Debug, Clone, Copy)]
pub struct ConcurrencyGuard {
    max_attempts: u32,
}

impl ConcurrencyGuard {
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

    /// A bound of zero is raised to one; every call gets at least one attempt.
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// One compare-and-swap of `new_status` against `expected_version`.
    pub async fn try_write<R: BookingRepository + ?Sized>(
        &self,
        repository: &R,
        booking_id: BookingId,
        expected_version: u64,
        new_status: BookingStatus,
    ) -> Result<WriteOutcome> {
        let outcome = repository
            .try_update_status(booking_id, expected_version, new_status)
            .await?;

        match outcome {
            WriteOutcome::Committed { version } if version != expected_version + 1 => {
                // The store broke its version contract; never report this as a clean commit.
                tracing::warn!(
                    "Booking {} committed at version {} but expected {}; treating as conflict",
                    booking_id,
                    version,
                    expected_version + 1
                );
                Ok(WriteOutcome::Conflict)
            }
            other => Ok(other),
        }
    }

    /// Runs `attempt` until it finishes, fails, or the attempt bound runs out.
    ///
    /// `attempt` receives the 1-based attempt number. Errors from an attempt
    /// are returned as-is and never retried.
    pub async fn run<T, F, Fut>(&self, booking_id: BookingId, mut attempt: F) -> Result<T>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<Attempt<T>>>,
    {
        for n in 1..=self.max_attempts {
            match attempt(n).await? {
                Attempt::Done(value) => return Ok(value),
                Attempt::Conflict => {
                    tracing::debug!(
                        "Version conflict on booking {} (attempt {}/{})",
                        booking_id,
                        n,
                        self.max_attempts
                    );
                }
            }
        }

        tracing::warn!(
            "Giving up on booking {} after {} conflicting attempts",
            booking_id,
            self.max_attempts
        );
        Err(LifecycleError::ConcurrencyConflict {
            booking_id,
            attempts: self.max_attempts,
        })
    }
}

impl Default for ConcurrencyGuard {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MAX_ATTEMPTS)
    }
}
