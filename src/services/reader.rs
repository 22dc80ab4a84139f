use log::{debug, error, info, warn};
use std::num::NonZeroUsize;
use std::time::Duration;

use super::readings_store::ReadingsStore;
use super::shutdown::{sleep_unless_cancelled, CancellationFlag};
use crate::devices::reading::unix_millis_now;
use crate::devices::registry::{InputRegistry, OutputRegistry};
use crate::devices::traits::InputDevice;
use crate::utils::error::ReaderError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReaderState {
    Connecting,
    Reading,
    Draining,
    Stopped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    ConnectFailed,
    TransportFailed,
    /// The device raised an error that is not a transport fault.
    DeviceFailed,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSummary {
    pub states: Vec<ReaderState>,
    pub polls: usize,
    pub reason: StopReason,
}

#[derive(Debug, Clone, Copy)]
pub struct ReaderSettings {
    /// Pause between two polls.
    pub read_interval: Duration,
    /// Number of readings per flush.
    pub write_interval: NonZeroUsize,
}

/// Looks up both devices by name and runs one session.
pub async fn read_from_device(
    inputs: &InputRegistry,
    outputs: &OutputRegistry,
    input_name: &str,
    output_name: &str,
    settings: &ReaderSettings,
    flag: &CancellationFlag,
) -> Result<SessionSummary, ReaderError> {
    let input = inputs.get(input_name)?;
    let output = outputs.get(output_name)?;
    let store = ReadingsStore::new(settings.write_interval, output);
    Ok(ReaderLoop::new(input.as_ref(), store, settings.read_interval, flag)
        .run()
        .await)
}

/// One connect → poll → drain session against a single input device.
pub struct ReaderLoop<'a> {
    input: &'a dyn InputDevice,
    store: ReadingsStore,
    read_interval: Duration,
    flag: &'a CancellationFlag,
    states: Vec<ReaderState>,
}

impl<'a> ReaderLoop<'a> {
    pub fn new(
        input: &'a dyn InputDevice,
        store: ReadingsStore,
        read_interval: Duration,
        flag: &'a CancellationFlag,
    ) -> Self {
        Self {
            input,
            store,
            read_interval,
            flag,
            states: Vec::new(),
        }
    }

    pub async fn run(mut self) -> SessionSummary {
        self.enter(ReaderState::Connecting);
        let mut connection = match self.input.connect().await {
            Ok(connection) => connection,
            Err(e) => {
                warn!("Did not manage to obtain a connection with {}: {}", self.input.name(), e);
                self.enter(ReaderState::Stopped);
                return self.summary(0, StopReason::ConnectFailed);
            }
        };

        self.enter(ReaderState::Reading);
        let mut polls = 0;
        let reason = loop {
            if self.flag.is_cancelled() {
                warn!("Killed by external source. Write readings buffer and stop.");
                break StopReason::Cancelled;
            }

            match connection.readline().await {
                Ok(reading) => {
                    polls += 1;
                    self.store.add(reading.with_timestamp(unix_millis_now())).await;
                    sleep_unless_cancelled(self.flag, self.read_interval).await;
                }
                Err(e) if e.is_transport() => {
                    warn!("Lost {}: {}", self.input.name(), e);
                    warn!("Something went wrong, writing readings one last time.");
                    break StopReason::TransportFailed;
                }
                Err(e) => {
                    error!("Unexpected error from {}: {}", self.input.name(), e);
                    warn!("Something went wrong, writing readings one last time.");
                    break StopReason::DeviceFailed;
                }
            }
        };

        self.enter(ReaderState::Draining);
        self.store.write().await;
        info!("Finished writing final results.");

        self.enter(ReaderState::Stopped);
        drop(connection);
        self.summary(polls, reason)
    }

    fn enter(&mut self, state: ReaderState) {
        debug!("Reader state -> {:?}", state);
        self.states.push(state);
    }

    fn summary(self, polls: usize, reason: StopReason) -> SessionSummary {
        SessionSummary {
            states: self.states,
            polls,
            reason,
        }
    }
}
