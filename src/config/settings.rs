use log::{info, warn};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::utils::error::ReaderError;

/// Largest block a single Modbus read may request.
pub const MAX_REGISTER_COUNT: u16 = 125;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub input: InputConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    #[serde(rename = "growatt-inverter")]
    pub growatt_inverter: ModbusSerialConfig,
    #[serde(rename = "p1-port")]
    pub p1_port: P1SerialConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub csv: CsvOutputConfig,
}

/// Transport settings of the register-block reader.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ModbusSerialConfig {
    pub port: String,
    pub baud_rate: u32,
    pub parity: ParityConfig,
    pub stop_bits: u8,
    pub byte_size: u8,
    pub timeout_ms: u64,
    pub slave_id: u8,
    pub start_register: u16,
    pub register_count: u16,
}

impl Default for ModbusSerialConfig {
    fn default() -> Self {
        Self {
            port: "/dev/ttyUSB0".to_string(),
            baud_rate: 9600,
            parity: ParityConfig::None,
            stop_bits: 1,
            byte_size: 8,
            timeout_ms: 1000,
            slave_id: 1,
            start_register: 0,
            register_count: 45,
        }
    }
}

impl ModbusSerialConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn data_bits(&self) -> serialport::DataBits {
        match self.byte_size {
            5 => serialport::DataBits::Five,
            6 => serialport::DataBits::Six,
            7 => serialport::DataBits::Seven,
            _ => serialport::DataBits::Eight,
        }
    }

    pub fn serial_stop_bits(&self) -> serialport::StopBits {
        match self.stop_bits {
            2 => serialport::StopBits::Two,
            _ => serialport::StopBits::One,
        }
    }
}

/// Transport settings of the line-telegram reader.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct P1SerialConfig {
    pub port: String,
    pub baud_rate: u32,
    pub timeout_ms: u64,
}

impl Default for P1SerialConfig {
    fn default() -> Self {
        Self {
            port: "/dev/ttyUSB0".to_string(),
            baud_rate: 115200,
            timeout_ms: 20_000,
        }
    }
}

impl P1SerialConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CsvOutputConfig {
    pub path: String,
}

impl Default for CsvOutputConfig {
    fn default() -> Self {
        Self {
            path: "/home/pi/growatt/results/readings.csv".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum ParityConfig {
    #[default]
    None,
    Even,
    Odd,
}

impl From<ParityConfig> for serialport::Parity {
    fn from(parity: ParityConfig) -> Self {
        match parity {
            ParityConfig::None => serialport::Parity::None,
            ParityConfig::Even => serialport::Parity::Even,
            ParityConfig::Odd => serialport::Parity::Odd,
        }
    }
}

impl Config {
    /// Loads the configuration, falling back to defaults when the file is absent.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ReaderError> {
        let path = path.as_ref();
        if !path.exists() {
            warn!("⚠️  Config file {} not found, using defaults", path.display());
            return Ok(Self::default());
        }
        Self::from_file(path)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ReaderError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            ReaderError::ConfigError(format!("Cannot read {}: {}", path.display(), e))
        })?;
        let config = Self::from_toml(&content)?;
        info!("📋 Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self, ReaderError> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ReaderError> {
        let inverter = &self.input.growatt_inverter;
        if inverter.port.is_empty() {
            return Err(ReaderError::ConfigError("growatt-inverter: port is empty".into()));
        }
        if inverter.baud_rate == 0 {
            return Err(ReaderError::ConfigError("growatt-inverter: baud_rate must be > 0".into()));
        }
        if !(5..=8).contains(&inverter.byte_size) {
            return Err(ReaderError::ConfigError(format!(
                "growatt-inverter: byte_size {} not in 5..=8",
                inverter.byte_size
            )));
        }
        if !(1..=2).contains(&inverter.stop_bits) {
            return Err(ReaderError::ConfigError(format!(
                "growatt-inverter: stop_bits {} must be 1 or 2",
                inverter.stop_bits
            )));
        }
        if inverter.register_count == 0 || inverter.register_count > MAX_REGISTER_COUNT {
            return Err(ReaderError::ConfigError(format!(
                "growatt-inverter: register_count {} not in 1..={}",
                inverter.register_count, MAX_REGISTER_COUNT
            )));
        }

        let p1 = &self.input.p1_port;
        if p1.port.is_empty() {
            return Err(ReaderError::ConfigError("p1-port: port is empty".into()));
        }
        if p1.baud_rate == 0 {
            return Err(ReaderError::ConfigError("p1-port: baud_rate must be > 0".into()));
        }

        if self.output.csv.path.is_empty() {
            return Err(ReaderError::ConfigError("csv: path is empty".into()));
        }
        Ok(())
    }

    /// Points the named input device at another serial port.
    pub fn override_port(&mut self, input_name: &str, port: &str) {
        match input_name {
            "growatt-inverter" => self.input.growatt_inverter.port = port.to_string(),
            "p1-port" => self.input.p1_port.port = port.to_string(),
            other => warn!("⚠️  --port ignored, input '{}' has no serial port setting", other),
        }
    }
}
