pub mod args;
pub mod commands;

pub use args::Cli;
pub use commands::{list_serial_ports, load_config, run, supervisor_settings};
