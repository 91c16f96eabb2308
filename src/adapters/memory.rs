use crate::domain::model::{Booking, BookingId, BookingStatus, WriteOutcome};
use crate::domain::ports::BookingRepository;
use crate::utils::error::{LifecycleError, Result};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Process-local booking store. The version check and the write happen under
/// one write lock, which is what makes `try_update_status` a compare-and-swap.
#[derive(Debug, Clone, Default)]
pub struct InMemoryBookingRepository {
    bookings: Arc<RwLock<HashMap<BookingId, Booking>>>,
    next_id: Arc<AtomicI64>,
}

impl InMemoryBookingRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a new `Pending` booking at version 0.
    pub async fn create(&self, customer_id: i64, worker_id: i64, service_id: i64) -> Booking {
        let id = BookingId(self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        let booking = Booking::new(id, customer_id, worker_id, service_id);
        self.bookings.write().await.insert(id, booking.clone());
        booking
    }

    /// Stores `booking` as-is, replacing any booking with the same id.
    pub async fn insert(&self, booking: Booking) {
        self.next_id.fetch_max(booking.id.0, Ordering::SeqCst);
        self.bookings.write().await.insert(booking.id, booking);
    }

    pub async fn len(&self) -> usize {
        self.bookings.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.bookings.read().await.is_empty()
    }
}

#[async_trait]
impl BookingRepository for InMemoryBookingRepository {
    async fn get_by_id(&self, id: BookingId) -> Result<Option<Booking>> {
        Ok(self.bookings.read().await.get(&id).cloned())
    }

    async fn try_update_status(
        &self,
        id: BookingId,
        expected_version: u64,
        new_status: BookingStatus,
    ) -> Result<WriteOutcome> {
        let mut bookings = self.bookings.write().await;
        let booking = bookings
            .get_mut(&id)
            .ok_or(LifecycleError::NotFound { booking_id: id })?;

        if booking.version != expected_version {
            return Ok(WriteOutcome::Conflict);
        }

        booking.status = new_status;
        booking.version += 1;
        booking.updated_at = Utc::now();

        Ok(WriteOutcome::Committed {
            version: booking.version,
        })
    }
}
