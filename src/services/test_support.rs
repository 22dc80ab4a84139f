//! Scripted devices for exercising the reader and supervisor without hardware.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use tokio::time::Instant;

use super::shutdown::CancellationFlag;
use crate::devices::reading::Reading;
use crate::devices::traits::{Connection, InputDevice};
use crate::output::OutputDevice;
use crate::utils::error::ReaderError;

/// Output device that remembers every batch it was handed.
#[derive(Clone, Default)]
pub struct RecordingSink {
    batches: Arc<Mutex<Vec<Vec<Reading>>>>,
    fail: bool,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self { fail: true, ..Self::default() }
    }

    pub fn batches(&self) -> Vec<Vec<Reading>> {
        self.batches.lock().unwrap().clone()
    }

    pub fn readings(&self) -> Vec<Reading> {
        self.batches().into_iter().flatten().collect()
    }
}

#[async_trait]
impl OutputDevice for RecordingSink {
    fn name(&self) -> &str {
        "recording"
    }

    async fn write(&self, batch: &[Reading]) -> Result<(), ReaderError> {
        self.batches.lock().unwrap().push(batch.to_vec());
        if self.fail {
            Err(ReaderError::WriteError("disk full".to_string()))
        } else {
            Ok(())
        }
    }
}

#[derive(Default)]
pub struct InputLog {
    pub connect_attempts: Vec<Instant>,
    pub polls: usize,
    pub closes: usize,
}

/// Input device whose behaviour is scripted per test.
#[derive(Clone, Default)]
pub struct ScriptedInput {
    log: Arc<Mutex<InputLog>>,
    failed_connects: usize,
    reads_per_session: Option<usize>,
    cancel_after: Option<(usize, CancellationFlag)>,
    failure: Option<fn() -> ReaderError>,
}

impl ScriptedInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// The first `n` connect attempts fail.
    pub fn failing_connects(mut self, n: usize) -> Self {
        self.failed_connects = n;
        self
    }

    /// Each session's transport fails after `k` successful reads.
    pub fn transport_fails_after(mut self, k: usize) -> Self {
        self.reads_per_session = Some(k);
        self
    }

    /// Error raised once the session's reads run out.
    pub fn failing_with(mut self, failure: fn() -> ReaderError) -> Self {
        self.failure = Some(failure);
        self
    }

    /// Sets `flag` during the `n`th poll of the process.
    pub fn cancel_after(mut self, n: usize, flag: &CancellationFlag) -> Self {
        self.cancel_after = Some((n, flag.clone()));
        self
    }

    pub fn connect_attempts(&self) -> Vec<Instant> {
        self.log.lock().unwrap().connect_attempts.clone()
    }

    pub fn polls(&self) -> usize {
        self.log.lock().unwrap().polls
    }

    pub fn closes(&self) -> usize {
        self.log.lock().unwrap().closes
    }
}

#[async_trait]
impl InputDevice for ScriptedInput {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn connect(&self) -> Result<Box<dyn Connection>, ReaderError> {
        let attempt = {
            let mut log = self.log.lock().unwrap();
            log.connect_attempts.push(Instant::now());
            log.connect_attempts.len()
        };
        if attempt <= self.failed_connects {
            return Err(ReaderError::ConnectionError("no such port".to_string()));
        }
        Ok(Box::new(ScriptedConnection {
            input: self.clone(),
            remaining: self.reads_per_session,
        }))
    }
}

struct ScriptedConnection {
    input: ScriptedInput,
    remaining: Option<usize>,
}

#[async_trait]
impl Connection for ScriptedConnection {
    async fn readline(&mut self) -> Result<Reading, ReaderError> {
        if self.remaining == Some(0) {
            return Err(match self.input.failure {
                Some(failure) => failure(),
                None => ReaderError::TransportError("cable pulled".to_string()),
            });
        }
        if let Some(remaining) = self.remaining.as_mut() {
            *remaining -= 1;
        }

        let poll = {
            let mut log = self.input.log.lock().unwrap();
            log.polls += 1;
            log.polls
        };
        if let Some((n, flag)) = &self.input.cancel_after {
            if poll == *n {
                flag.cancel();
            }
        }
        Ok(Reading::from_registers(vec![poll as u16]))
    }
}

impl Drop for ScriptedConnection {
    fn drop(&mut self) {
        self.input.log.lock().unwrap().closes += 1;
    }
}
