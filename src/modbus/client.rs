use async_trait::async_trait;
use log::{error, info};
use serialport::{ClearBuffer, SerialPort};
use std::sync::{Arc, Mutex};

use super::protocol::{transact, ReadRequest};
use crate::config::settings::ModbusSerialConfig;
use crate::utils::error::ReaderError;

#[async_trait]
pub trait ModbusClientTrait: Send + Sync {
    async fn read_input_registers(
        &self,
        slave_id: u8,
        start_addr: u16,
        count: u16,
    ) -> Result<Vec<u16>, ReaderError>;
}

/// Modbus RTU master on a serial line. The port closes when the client drops.
pub struct ModbusClient {
    port_name: String,
    port: Arc<Mutex<Box<dyn SerialPort>>>,
}

impl ModbusClient {
    pub fn open(config: &ModbusSerialConfig) -> Result<Self, ReaderError> {
        info!("🔌 Connecting to Modbus RTU port: {}", config.port);
        info!(
            "⚙️  Configuration: {} baud, {:?} parity, {} data bits, {} stop bit(s), {} ms timeout",
            config.baud_rate, config.parity, config.byte_size, config.stop_bits, config.timeout_ms
        );

        let port = serialport::new(&config.port, config.baud_rate)
            .timeout(config.timeout())
            .data_bits(config.data_bits())
            .stop_bits(config.serial_stop_bits())
            .parity(config.parity.into())
            .open()
            .map_err(|e| {
                error!("❌ Failed to open serial port {}: {}", config.port, e);
                ReaderError::ConnectionError(format!("Failed to open port {}: {}", config.port, e))
            })?;

        info!("✅ Modbus RTU connection established on {}", config.port);
        Ok(Self {
            port_name: config.port.clone(),
            port: Arc::new(Mutex::new(port)),
        })
    }

    pub fn port_name(&self) -> &str {
        &self.port_name
    }

    async fn read(&self, request: ReadRequest) -> Result<Vec<u16>, ReaderError> {
        let port = Arc::clone(&self.port);
        tokio::task::spawn_blocking(move || {
            let mut port = port.lock().map_err(|_| ReaderError::LockError)?;
            // Drop stale bytes from an earlier timed-out exchange
            port.clear(ClearBuffer::Input)
                .map_err(|e| ReaderError::TransportError(format!("Clear failed: {}", e)))?;
            transact(&mut **port, &request)
        })
        .await?
    }
}

#[async_trait]
impl ModbusClientTrait for ModbusClient {
    async fn read_input_registers(
        &self,
        slave_id: u8,
        start_addr: u16,
        count: u16,
    ) -> Result<Vec<u16>, ReaderError> {
        self.read(ReadRequest::input_registers(slave_id, start_addr, count)).await
    }
}

impl Drop for ModbusClient {
    fn drop(&mut self) {
        info!("🔌 Closing Modbus RTU port {}", self.port_name);
    }
}
