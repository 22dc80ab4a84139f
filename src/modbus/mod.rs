pub mod client;
pub mod protocol;
pub mod crc;

pub use client::{ModbusClient, ModbusClientTrait};
pub use protocol::{ReadRequest, READ_INPUT_REGISTERS};
pub use crc::crc16_modbus;
