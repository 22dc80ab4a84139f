use log::{error, warn};
use std::num::NonZeroUsize;

use crate::devices::reading::Reading;
use crate::output::OutputDevice;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushOutcome {
    Written(usize),
    /// The sink failed and the batch was dropped.
    Discarded(usize),
}

/// In-memory buffer of readings, flushed to its output device every
/// `write_interval` readings.
///
/// The trigger counts readings, it is not a time interval. A failed flush
/// still empties the buffer: durability is best effort, at most once.
pub struct ReadingsStore {
    write_interval: NonZeroUsize,
    writer: Box<dyn OutputDevice>,
    readings: Vec<Reading>,
}

impl ReadingsStore {
    pub fn new(write_interval: NonZeroUsize, writer: Box<dyn OutputDevice>) -> Self {
        Self {
            write_interval,
            writer,
            readings: Vec::with_capacity(write_interval.get()),
        }
    }

    /// Buffers `reading`, flushing when the buffer length reaches a multiple
    /// of the write interval.
    pub async fn add(&mut self, reading: Reading) -> Option<FlushOutcome> {
        self.readings.push(reading);
        if self.readings.len() % self.write_interval.get() == 0 {
            Some(self.write().await)
        } else {
            None
        }
    }

    /// Hands the whole buffer to the output device. The buffer is swapped out
    /// before the write, so it is empty afterwards whatever the outcome.
    pub async fn write(&mut self) -> FlushOutcome {
        let batch = std::mem::take(&mut self.readings);
        match self.writer.write(&batch).await {
            Ok(()) => FlushOutcome::Written(batch.len()),
            Err(e) => {
                error!("❌ Output '{}' failed: {}", self.writer.name(), e);
                warn!("Discarding {} buffered readings", batch.len());
                FlushOutcome::Discarded(batch.len())
            }
        }
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    pub fn write_interval(&self) -> NonZeroUsize {
        self.write_interval
    }
}
