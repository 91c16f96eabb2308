use crate::core::guard::{Attempt, ConcurrencyGuard};
use crate::domain::model::{BookingId, BookingStatus, StatusChange, WriteOutcome};
use crate::domain::policy::TransitionPolicy;
use crate::domain::ports::{BookingRepository, ConfigProvider};
use crate::utils::error::{LifecycleError, Result};

/// The single entry point for moving a booking through its workflow.
pub struct BookingLifecycleService<R: BookingRepository> {
    repository: R,
    guard: ConcurrencyGuard,
}

impl<R: BookingRepository> BookingLifecycleService<R> {
    pub fn new(repository: R) -> Self {
        Self::with_guard(repository, ConcurrencyGuard::default())
    }

    pub fn with_guard(repository: R, guard: ConcurrencyGuard) -> Self {
        Self { repository, guard }
    }

    pub fn from_config<C: ConfigProvider + ?Sized>(repository: R, config: &C) -> Self {
        Self::with_guard(repository, ConcurrencyGuard::new(config.max_attempts()))
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    pub async fn current_status(&self, booking_id: BookingId) -> Result<BookingStatus> {
        self.repository
            .get_by_id(booking_id)
            .await?
            .map(|booking| booking.status)
            .ok_or(LifecycleError::NotFound { booking_id })
    }

    /// Moves `booking_id` to `new_status`.
    ///
    /// Each attempt reads the booking afresh, checks the transition against
    /// the status it just read and writes with the version it just read. A
    /// lost race re-runs the whole attempt; an illegal transition, a missing
    /// booking or a storage failure ends the call with nothing written.
    ///
    /// A self-transition succeeds without touching the store (`applied` is
    /// false and the version is unchanged).
    pub async fn change_status(
        &self,
        booking_id: BookingId,
        new_status: BookingStatus,
    ) -> Result<StatusChange> {
        tracing::debug!("Changing booking {} to '{}'", booking_id, new_status);

        let result = self
            .guard
            .run(booking_id, move |attempt| {
                self.attempt_change(booking_id, new_status, attempt)
            })
            .await;

        match &result {
            Ok(change) if change.applied => tracing::info!(
                "Booking {} moved {} -> {} (version {}, attempt {})",
                change.booking_id,
                change.from,
                change.to,
                change.version,
                change.attempts
            ),
            Ok(change) => tracing::debug!(
                "Booking {} already '{}'; nothing written",
                change.booking_id,
                change.to
            ),
            Err(e) => tracing::warn!("Status change on booking {} failed: {}", booking_id, e),
        }

        result
    }

    async fn attempt_change(
        &self,
        booking_id: BookingId,
        new_status: BookingStatus,
        attempt: u32,
    ) -> Result<Attempt<StatusChange>> {
        let booking = self
            .repository
            .get_by_id(booking_id)
            .await?
            .ok_or(LifecycleError::NotFound { booking_id })?;

        let from = booking.status;
        TransitionPolicy::ensure_transition(from, new_status)?;

        if from == new_status {
            return Ok(Attempt::Done(StatusChange {
                booking_id,
                from,
                to: new_status,
                version: booking.version,
                attempts: attempt,
                applied: false,
            }));
        }

        let outcome = self
            .guard
            .try_write(&self.repository, booking_id, booking.version, new_status)
            .await?;

        Ok(match outcome {
            WriteOutcome::Committed { version } => Attempt::Done(StatusChange {
                booking_id,
                from,
                to: new_status,
                version,
                attempts: attempt,
                applied: true,
            }),
            WriteOutcome::Conflict => Attempt::Conflict,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::Booking;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    #[derive(Clone, Default)]
    struct MockRepository {
        bookings: Arc<Mutex<HashMap<BookingId, Booking>>>,
        writes: Arc<Mutex<u32>>,
        /// Number of upcoming writes that a competing writer steals by
        /// bumping the version first.
        stolen_writes: Arc<Mutex<u32>>,
    }

    impl MockRepository {
        async fn with_booking(status: BookingStatus) -> Self {
            let repository = Self::default();
            let mut booking = Booking::new(BookingId(1), 1, 2, 3);
            booking.status = status;
            repository.bookings.lock().await.insert(booking.id, booking);
            repository
        }

        async fn steal_next(&self, n: u32) {
            *self.stolen_writes.lock().await = n;
        }

        async fn booking(&self) -> Booking {
            self.bookings.lock().await[&BookingId(1)].clone()
        }

        async fn writes(&self) -> u32 {
            *self.writes.lock().await
        }
    }

    #[async_trait]
    impl BookingRepository for MockRepository {
        async fn get_by_id(&self, id: BookingId) -> Result<Option<Booking>> {
            Ok(self.bookings.lock().await.get(&id).cloned())
        }

        async fn try_update_status(
            &self,
            id: BookingId,
            expected_version: u64,
            new_status: BookingStatus,
        ) -> Result<WriteOutcome> {
            let mut bookings = self.bookings.lock().await;
            let booking = bookings
                .get_mut(&id)
                .ok_or(LifecycleError::NotFound { booking_id: id })?;

            let mut stolen = self.stolen_writes.lock().await;
            if *stolen > 0 {
                *stolen -= 1;
                booking.version += 1;
            }

            if booking.version != expected_version {
                return Ok(WriteOutcome::Conflict);
            }

            booking.status = new_status;
            booking.version += 1;
            *self.writes.lock().await += 1;
            Ok(WriteOutcome::Committed {
                version: booking.version,
            })
        }
    }

    #[tokio::test]
    async fn test_legal_change_commits_once() {
        let repository = MockRepository::with_booking(BookingStatus::Pending).await;
        let service = BookingLifecycleService::new(repository.clone());

        let change = service
            .change_status(BookingId(1), BookingStatus::Confirmed)
            .await
            .unwrap();

        assert!(change.applied);
        assert_eq!(change.from, BookingStatus::Pending);
        assert_eq!(change.to, BookingStatus::Confirmed);
        assert_eq!(change.version, 1);
        assert_eq!(change.attempts, 1);
        assert_eq!(repository.writes().await, 1);
        assert_eq!(repository.booking().await.status, BookingStatus::Confirmed);
    }

    #[tokio::test]
    async fn test_missing_booking_is_not_found() {
        let repository = MockRepository::default();
        let service = BookingLifecycleService::new(repository.clone());

        let result = service
            .change_status(BookingId(42), BookingStatus::Confirmed)
            .await;

        assert!(matches!(
            result,
            Err(LifecycleError::NotFound { booking_id: BookingId(42) })
        ));
        assert_eq!(repository.writes().await, 0);
    }

    #[tokio::test]
    async fn test_illegal_change_writes_nothing() {
        let repository = MockRepository::with_booking(BookingStatus::Completed).await;
        let service = BookingLifecycleService::new(repository.clone());

        let result = service
            .change_status(BookingId(1), BookingStatus::Cancelled)
            .await;

        assert!(matches!(
            result,
            Err(LifecycleError::InvalidTransition {
                from: BookingStatus::Completed,
                to: BookingStatus::Cancelled
            })
        ));
        assert_eq!(repository.writes().await, 0);
        assert_eq!(repository.booking().await.version, 0);
    }

    #[tokio::test]
    async fn test_self_transition_is_a_no_op() {
        let repository = MockRepository::with_booking(BookingStatus::Pending).await;
        let service = BookingLifecycleService::new(repository.clone());

        let change = service
            .change_status(BookingId(1), BookingStatus::Pending)
            .await
            .unwrap();

        assert!(!change.applied);
        assert_eq!(change.version, 0);
        assert_eq!(repository.writes().await, 0);
    }

    #[tokio::test]
    async fn test_conflict_is_retried_from_fresh_read() {
        let repository = MockRepository::with_booking(BookingStatus::Pending).await;
        repository.steal_next(2).await;
        let service = BookingLifecycleService::new(repository.clone());

        let change = service
            .change_status(BookingId(1), BookingStatus::Confirmed)
            .await
            .unwrap();

        assert_eq!(change.attempts, 3);
        assert_eq!(change.version, 3);
        assert_eq!(repository.writes().await, 1);
    }

    #[tokio::test]
    async fn test_exhausted_retries_report_conflict() {
        let repository = MockRepository::with_booking(BookingStatus::Pending).await;
        repository.steal_next(10).await;
        let service =
            BookingLifecycleService::with_guard(repository.clone(), ConcurrencyGuard::new(2));

        let result = service
            .change_status(BookingId(1), BookingStatus::Confirmed)
            .await;

        assert!(matches!(
            result,
            Err(LifecycleError::ConcurrencyConflict { attempts: 2, .. })
        ));
        assert_eq!(repository.writes().await, 0);
        assert_eq!(repository.booking().await.status, BookingStatus::Pending);
    }

    #[tokio::test]
    async fn test_service_over_shared_trait_object() {
        let repository = MockRepository::with_booking(BookingStatus::Confirmed).await;
        let shared: Arc<dyn BookingRepository> = Arc::new(repository.clone());
        let service = BookingLifecycleService::new(shared);

        let change = service
            .change_status(BookingId(1), BookingStatus::InProgress)
            .await
            .unwrap();

        assert_eq!(change.version, 1);
        assert_eq!(repository.booking().await.status, BookingStatus::InProgress);
    }

    #[tokio::test]
    async fn test_current_status() {
        let repository = MockRepository::with_booking(BookingStatus::InProgress).await;
        let service = BookingLifecycleService::new(repository);

        assert_eq!(
            service.current_status(BookingId(1)).await.unwrap(),
            BookingStatus::InProgress
        );
        assert!(service.current_status(BookingId(2)).await.is_err());
    }
}
