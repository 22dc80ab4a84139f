use async_trait::async_trait;

use super::writer::OutputDevice;
use crate::devices::reading::Reading;
use crate::utils::error::ReaderError;

pub const DEVICE_NAME: &str = "console";

/// Prints readings as CSV rows on stdout, for commissioning a device.
pub struct ConsoleWriter;

#[async_trait]
impl OutputDevice for ConsoleWriter {
    fn name(&self) -> &str {
        DEVICE_NAME
    }

    async fn write(&self, batch: &[Reading]) -> Result<(), ReaderError> {
        if batch.is_empty() {
            return Ok(());
        }
        let stdout = std::io::stdout();
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_writer(stdout.lock());
        for reading in batch {
            writer.write_record(reading.to_record())?;
        }
        writer
            .flush()
            .map_err(|e| ReaderError::WriteError(format!("Flush failed: {}", e)))?;
        Ok(())
    }
}
