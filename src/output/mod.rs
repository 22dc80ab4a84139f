pub mod writer;
pub mod csv_writer;
pub mod console_writer;

pub use writer::OutputDevice;
pub use csv_writer::CsvWriter;
pub use console_writer::ConsoleWriter;

use crate::config::Config;
use crate::devices::registry::OutputRegistry;

/// Output devices shipped with the reader.
pub fn builtin_outputs(config: &Config) -> OutputRegistry {
    let mut registry = OutputRegistry::new("output");

    let csv_path = config.output.csv.path.clone();
    registry.register(csv_writer::DEVICE_NAME, move || {
        Ok(Box::new(CsvWriter::new(&csv_path)) as Box<dyn OutputDevice>)
    });
    registry.register(console_writer::DEVICE_NAME, || {
        Ok(Box::new(ConsoleWriter) as Box<dyn OutputDevice>)
    });

    registry
}
