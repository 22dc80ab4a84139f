use async_trait::async_trait;
use log::{error, info};
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::time::Instant;

use super::writer::OutputDevice;
use crate::devices::reading::Reading;
use crate::utils::error::ReaderError;

pub const DEVICE_NAME: &str = "csv";

/// Appends readings to a header-less CSV file.
pub struct CsvWriter {
    path: PathBuf,
}

impl CsvWriter {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn append(&self, batch: &[Reading]) -> Result<(), ReaderError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                ReaderError::WriteError(format!("Cannot create {}: {}", parent.display(), e))
            })?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| {
                ReaderError::WriteError(format!("Cannot open {}: {}", self.path.display(), e))
            })?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_writer(file);
        for reading in batch {
            writer.write_record(reading.to_record())?;
        }
        writer
            .flush()
            .map_err(|e| ReaderError::WriteError(format!("Flush failed: {}", e)))?;
        Ok(())
    }
}

#[async_trait]
impl OutputDevice for CsvWriter {
    fn name(&self) -> &str {
        DEVICE_NAME
    }

    async fn write(&self, batch: &[Reading]) -> Result<(), ReaderError> {
        if batch.is_empty() {
            info!("There are currently no readings in memory. Skip writing readings to CSV.");
            return Ok(());
        }

        info!("📝 Writing {} readings to {}", batch.len(), self.path.display());
        let started = Instant::now();

        self.append(batch).map_err(|e| {
            error!("❌ Could not write to CSV {}: {}", self.path.display(), e);
            e
        })?;

        info!(
            "Writing readings to file took: {:.3} ms",
            started.elapsed().as_secs_f64() * 1000.0
        );
        Ok(())
    }
}
