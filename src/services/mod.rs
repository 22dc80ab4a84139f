pub mod readings_store;
pub mod reader;
pub mod supervisor;
pub mod shutdown;
pub mod instance_lock;
#[cfg(test)]
pub(crate) mod test_support;

pub use readings_store::{FlushOutcome, ReadingsStore};
pub use reader::{read_from_device, ReaderLoop, ReaderSettings, ReaderState, SessionSummary, StopReason};
pub use supervisor::{RunSummary, Supervisor, SupervisorSettings};
pub use shutdown::{install_signal_handlers, sleep_unless_cancelled, CancellationFlag};
pub use instance_lock::InstanceLock;
