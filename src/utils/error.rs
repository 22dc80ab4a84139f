use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReaderError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Unknown device: {0}")]
    UnknownDevice(String),

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Transport error: {0}")]
    TransportError(String),

    #[error("Write error: {0}")]
    WriteError(String),

    #[error("CRC checksum mismatch")]
    CrcError,

    #[error("Invalid response from device: {0}")]
    InvalidResponse(String),

    #[error("Modbus exception 0x{code:02x} from slave {slave} (function 0x{function:02x})")]
    ModbusException { slave: u8, function: u8, code: u8 },

    #[error("Timeout occurred")]
    Timeout,

    #[error("Lock acquisition failed")]
    LockError,

    #[error("Another instance already holds the lock '{0}'")]
    InstanceLocked(String),
}

impl ReaderError {
    /// Errors a device can raise in the middle of a session. They end the
    /// session gracefully instead of crashing the process.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            ReaderError::TransportError(_)
                | ReaderError::CrcError
                | ReaderError::InvalidResponse(_)
                | ReaderError::ModbusException { .. }
                | ReaderError::Timeout
                | ReaderError::LockError
        )
    }
}

impl From<std::io::Error> for ReaderError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::TimedOut => ReaderError::Timeout,
            _ => ReaderError::TransportError(format!("IO error: {}", err)),
        }
    }
}

impl From<csv::Error> for ReaderError {
    fn from(err: csv::Error) -> Self {
        ReaderError::WriteError(format!("CSV error: {}", err))
    }
}

impl From<toml::de::Error> for ReaderError {
    fn from(err: toml::de::Error) -> Self {
        ReaderError::ConfigError(format!("TOML error: {}", err))
    }
}

impl From<tokio::task::JoinError> for ReaderError {
    fn from(err: tokio::task::JoinError) -> Self {
        ReaderError::TransportError(format!("Blocking task failed: {}", err))
    }
}
