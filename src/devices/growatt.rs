use async_trait::async_trait;
use log::{error, info};

use super::reading::Reading;
use super::traits::{Connection, InputDevice};
use crate::config::settings::ModbusSerialConfig;
use crate::modbus::client::{ModbusClient, ModbusClientTrait};
use crate::utils::error::ReaderError;

pub const DEVICE_NAME: &str = "growatt-inverter";

/// Growatt inverter on Modbus RTU. Each poll reads one fixed block of input
/// registers.
#[derive(Debug, Clone)]
pub struct GrowattInverter {
    config: ModbusSerialConfig,
}

impl GrowattInverter {
    pub fn new(config: ModbusSerialConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl InputDevice for GrowattInverter {
    fn name(&self) -> &str {
        DEVICE_NAME
    }

    async fn connect(&self) -> Result<Box<dyn Connection>, ReaderError> {
        let client = ModbusClient::open(&self.config)?;
        info!("Connected, start reading from {}...", DEVICE_NAME);
        Ok(Box::new(RegisterBlockConnection::new(
            Box::new(client),
            self.config.slave_id,
            self.config.start_register,
            self.config.register_count,
        )))
    }
}

pub struct RegisterBlockConnection {
    client: Box<dyn ModbusClientTrait>,
    slave_id: u8,
    start_register: u16,
    register_count: u16,
}

impl RegisterBlockConnection {
    pub fn new(
        client: Box<dyn ModbusClientTrait>,
        slave_id: u8,
        start_register: u16,
        register_count: u16,
    ) -> Self {
        Self { client, slave_id, start_register, register_count }
    }
}

#[async_trait]
impl Connection for RegisterBlockConnection {
    async fn readline(&mut self) -> Result<Reading, ReaderError> {
        let registers = self
            .client
            .read_input_registers(self.slave_id, self.start_register, self.register_count)
            .await
            .map_err(|e| {
                error!("❌ Lost connection with inverter: {}", e);
                e
            })?;

        if registers.len() != self.register_count as usize {
            return Err(ReaderError::InvalidResponse(format!(
                "expected {} registers, got {}",
                self.register_count,
                registers.len()
            )));
        }
        Ok(Reading::from_registers(registers))
    }
}

impl Drop for RegisterBlockConnection {
    fn drop(&mut self) {
        info!("Closed connection with {}", DEVICE_NAME);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::devices::reading::Field;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    struct ScriptedClient {
        replies: Mutex<VecDeque<Result<Vec<u16>, ReaderError>>>,
        requests: Arc<Mutex<Vec<(u8, u16, u16)>>>,
        drops: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl ModbusClientTrait for ScriptedClient {
        async fn read_input_registers(
            &self,
            slave_id: u8,
            start_addr: u16,
            count: u16,
        ) -> Result<Vec<u16>, ReaderError> {
            self.requests.lock().unwrap().push((slave_id, start_addr, count));
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(ReaderError::Timeout))
        }
    }

    impl Drop for ScriptedClient {
        fn drop(&mut self) {
            self.drops.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn connection(
        replies: Vec<Result<Vec<u16>, ReaderError>>,
    ) -> (RegisterBlockConnection, Arc<Mutex<Vec<(u8, u16, u16)>>>, Arc<AtomicUsize>) {
        let requests = Arc::new(Mutex::new(Vec::new()));
        let drops = Arc::new(AtomicUsize::new(0));
        let client = ScriptedClient {
            replies: Mutex::new(replies.into()),
            requests: Arc::clone(&requests),
            drops: Arc::clone(&drops),
        };
        (RegisterBlockConnection::new(Box::new(client), 1, 0, 3), requests, drops)
    }

    #[tokio::test]
    async fn test_readline_returns_register_block() {
        let (mut conn, requests, _) = connection(vec![Ok(vec![1, 2, 3])]);

        let reading = conn.readline().await.unwrap();

        assert_eq!(
            reading.fields(),
            &[Field::Register(1), Field::Register(2), Field::Register(3)]
        );
        assert_eq!(*requests.lock().unwrap(), vec![(1, 0, 3)]);
    }

    #[tokio::test]
    async fn test_exception_reply_is_an_error() {
        let (mut conn, _, _) = connection(vec![Err(ReaderError::ModbusException {
            slave: 1,
            function: 0x04,
            code: 0x0B,
        })]);

        let err = conn.readline().await.unwrap_err();
        assert!(err.is_transport());
    }

    #[tokio::test]
    async fn test_short_block_rejected() {
        let (mut conn, _, _) = connection(vec![Ok(vec![1, 2])]);
        assert!(matches!(conn.readline().await, Err(ReaderError::InvalidResponse(_))));
    }

    #[tokio::test]
    async fn test_drop_closes_client_once() {
        let (conn, _, drops) = connection(vec![]);
        drop(conn);
        assert_eq!(drops.load(Ordering::SeqCst), 1);
    }
}
