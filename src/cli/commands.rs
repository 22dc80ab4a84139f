use log::info;
use std::num::NonZeroUsize;
use std::time::Duration;

use super::args::Cli;
use crate::config::Config;
use crate::devices::builtin_inputs;
use crate::output::builtin_outputs;
use crate::services::{CancellationFlag, ReaderSettings, RunSummary, Supervisor, SupervisorSettings};
use crate::utils::error::ReaderError;

pub fn load_config(cli: &Cli) -> Result<Config, ReaderError> {
    let mut config = Config::load(&cli.config)?;
    if let Some(port) = &cli.port {
        config.override_port(&cli.input, port);
        config.validate()?;
    }
    Ok(config)
}

pub fn supervisor_settings(cli: &Cli) -> Result<SupervisorSettings, ReaderError> {
    let write_interval = usize::try_from(cli.write_interval)
        .ok()
        .and_then(NonZeroUsize::new)
        .ok_or_else(|| {
            ReaderError::ConfigError(format!("invalid write interval {}", cli.write_interval))
        })?;

    Ok(SupervisorSettings {
        input: cli.input.clone(),
        output: cli.output.clone(),
        reader: ReaderSettings {
            read_interval: Duration::from_secs(cli.read_interval),
            write_interval,
        },
        reconnect_wait: Duration::from_secs(cli.reconnect_wait),
        lock_name: cli.lock_name.clone(),
    })
}

/// Validates the device names, then supervises reader sessions until a
/// shutdown signal arrives.
pub async fn run(cli: &Cli) -> Result<RunSummary, ReaderError> {
    let config = load_config(cli)?;
    let settings = supervisor_settings(cli)?;

    info!(
        "📡 Reading '{}' every {} s, writing to '{}' every {} readings",
        settings.input, cli.read_interval, settings.output, settings.reader.write_interval
    );

    let supervisor = Supervisor::new(
        builtin_inputs(&config),
        builtin_outputs(&config),
        settings,
        CancellationFlag::new(),
    )?;
    supervisor.start().await
}

pub fn list_serial_ports() -> Result<(), ReaderError> {
    println!("📡 Available Serial Ports:");

    let ports = serialport::available_ports()
        .map_err(|e| ReaderError::ConnectionError(format!("Cannot enumerate ports: {}", e)))?;
    if ports.is_empty() {
        println!("   ⚠️  No serial ports found");
        return Ok(());
    }

    for (index, port) in ports.iter().enumerate() {
        println!("   {}. {}", index + 1, port.port_name);
        if let serialport::SerialPortType::UsbPort(usb_info) = &port.port_type {
            if let Some(manufacturer) = &usb_info.manufacturer {
                println!("      📱 Manufacturer: {}", manufacturer);
            }
            if let Some(serial_number) = &usb_info.serial_number {
                println!("      🔢 Serial Number: {}", serial_number);
            }
        }
    }

    Ok(())
}
