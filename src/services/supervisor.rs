use log::{info, warn};
use std::time::Duration;

use super::instance_lock::InstanceLock;
use super::reader::{read_from_device, ReaderSettings, StopReason};
use super::shutdown::{install_signal_handlers, sleep_unless_cancelled, CancellationFlag};
use crate::devices::registry::{InputRegistry, OutputRegistry};
use crate::utils::error::ReaderError;

#[derive(Debug, Clone)]
pub struct SupervisorSettings {
    pub input: String,
    pub output: String,
    pub reader: ReaderSettings,
    /// Fixed pause before every reconnect attempt. There is no backoff.
    pub reconnect_wait: Duration,
    pub lock_name: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub sessions: usize,
    pub failed_connects: usize,
    pub polls: usize,
}

/// Keeps a reader session running until the process is asked to stop.
pub struct Supervisor {
    inputs: InputRegistry,
    outputs: OutputRegistry,
    settings: SupervisorSettings,
    flag: CancellationFlag,
}

impl Supervisor {
    /// Fails fast when either device name is unknown.
    pub fn new(
        inputs: InputRegistry,
        outputs: OutputRegistry,
        settings: SupervisorSettings,
        flag: CancellationFlag,
    ) -> Result<Self, ReaderError> {
        inputs.ensure(&settings.input)?;
        outputs.ensure(&settings.output)?;
        Ok(Self {
            inputs,
            outputs,
            settings,
            flag,
        })
    }

    /// Takes the instance lock, hooks up SIGINT/SIGTERM and runs until one
    /// of them arrives.
    pub async fn start(self) -> Result<RunSummary, ReaderError> {
        let _lock = InstanceLock::acquire(&self.settings.lock_name)?;
        let signals = install_signal_handlers(self.flag.clone())?;
        let summary = self.run().await;
        signals.abort();
        summary
    }

    pub async fn run(&self) -> Result<RunSummary, ReaderError> {
        let mut summary = RunSummary::default();
        loop {
            let session = read_from_device(
                &self.inputs,
                &self.outputs,
                &self.settings.input,
                &self.settings.output,
                &self.settings.reader,
                &self.flag,
            )
            .await?;

            summary.sessions += 1;
            summary.polls += session.polls;
            if session.reason == StopReason::ConnectFailed {
                summary.failed_connects += 1;
            }

            if self.flag.is_cancelled() {
                warn!("Killed by external source. Gracefully exited.");
                return Ok(summary);
            }

            info!(
                "Trying to reconnect to the {} in {} seconds.",
                self.settings.input,
                self.settings.reconnect_wait.as_secs()
            );
            if !sleep_unless_cancelled(&self.flag, self.settings.reconnect_wait).await {
                warn!("Killed by external source while waiting to reconnect. Gracefully exited.");
                return Ok(summary);
            }
            info!("Trying to reconnect to the {}...", self.settings.input);
        }
    }
}
