pub mod settings;

pub use settings::{
    Config,
    InputConfig,
    OutputConfig,
    ModbusSerialConfig,
    P1SerialConfig,
    CsvOutputConfig,
    ParityConfig,
    MAX_REGISTER_COUNT,
};
