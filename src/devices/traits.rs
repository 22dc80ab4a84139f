use async_trait::async_trait;

use super::reading::Reading;
use crate::utils::error::ReaderError;

/// A physical source that can be opened and polled.
#[async_trait]
pub trait InputDevice: Send + Sync {
    fn name(&self) -> &str;

    /// Opens the transport. The returned connection owns it and closes it
    /// when dropped.
    async fn connect(&self) -> Result<Box<dyn Connection>, ReaderError>;
}

/// An open transport, owned by exactly one reader session.
#[async_trait]
pub trait Connection: Send {
    /// Performs exactly one logical poll. Failures are not retried here.
    async fn readline(&mut self) -> Result<Reading, ReaderError>;
}
