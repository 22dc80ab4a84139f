//! Timeseries Reader
//!
//! Polls one measurement device over a serial line (a Growatt inverter via
//! Modbus RTU, or a smart meter's P1 port), buffers the readings in memory
//! and appends them to a CSV file in batches. A supervisor keeps the reader
//! alive across disconnects until SIGINT/SIGTERM.
//!
//! Input and output devices are looked up by name in typed registries, so a
//! new device only needs an [`InputDevice`] or [`OutputDevice`] impl and a
//! registration.

pub mod config;
pub mod modbus;
pub mod devices;
pub mod services;
pub mod output;
pub mod utils;
pub mod cli;

// Re-export commonly used types
pub use config::Config;
pub use devices::{Connection, DeviceRegistry, Field, InputDevice, Reading};
pub use output::{CsvWriter, OutputDevice};
pub use services::{CancellationFlag, ReaderLoop, ReadingsStore, Supervisor};
pub use utils::error::ReaderError;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
