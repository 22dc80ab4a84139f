use async_trait::async_trait;

use crate::devices::reading::Reading;
use crate::utils::error::ReaderError;

/// A durable, append-only sink for batches of readings.
#[async_trait]
pub trait OutputDevice: Send + Sync {
    fn name(&self) -> &str;

    /// Appends every reading of `batch` as one record, in order. An empty
    /// batch is a no-op.
    async fn write(&self, batch: &[Reading]) -> Result<(), ReaderError>;
}
