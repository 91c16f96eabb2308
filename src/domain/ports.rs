use crate::domain::model::{Booking, BookingId, BookingStatus, WriteOutcome};
use crate::utils::error::Result;
use async_trait::async_trait;

/// Storage collaborator for booking status.
///
/// `try_update_status` must be atomic with respect to the version check: it
/// commits only when the stored version equals `expected_version`, bumping the
/// version by one, and otherwise reports `WriteOutcome::Conflict`. A missing
/// booking is `LifecycleError::NotFound`.
#[async_trait]
pub trait BookingRepository: Send + Sync {
    async fn get_by_id(&self, id: BookingId) -> Result<Option<Booking>>;

    async fn try_update_status(
        &self,
        id: BookingId,
        expected_version: u64,
        new_status: BookingStatus,
    ) -> Result<WriteOutcome>;
}

#[async_trait]
impl<R: BookingRepository + ?Sized> BookingRepository for std::sync::Arc<R> {
    async fn get_by_id(&self, id: BookingId) -> Result<Option<Booking>> {
        (**self).get_by_id(id).await
    }

    async fn try_update_status(
        &self,
        id: BookingId,
        expected_version: u64,
        new_status: BookingStatus,
    ) -> Result<WriteOutcome> {
        (**self)
            .try_update_status(id, expected_version, new_status)
            .await
    }
}

pub trait ConfigProvider: Send + Sync {
    fn max_attempts(&self) -> u32;
    fn database_path(&self) -> &str;
}
