use async_trait::async_trait;
use log::{debug, error, info, warn};
use std::io::{BufRead, BufReader};
use std::sync::{Arc, Mutex};

use super::reading::Reading;
use super::traits::{Connection, InputDevice};
use crate::config::settings::P1SerialConfig;
use crate::utils::error::ReaderError;

pub const DEVICE_NAME: &str = "p1-port";

/// First byte of the identification line that opens a telegram.
pub const HEADER_MARKER: u8 = b'/';

/// First byte of the line carrying the telegram checksum.
pub const CHECKSUM_MARKER: u8 = b'!';

/// Smart meter P1 port. Each poll returns one complete telegram.
#[derive(Debug, Clone)]
pub struct P1Port {
    config: P1SerialConfig,
}

impl P1Port {
    pub fn new(config: P1SerialConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl InputDevice for P1Port {
    fn name(&self) -> &str {
        DEVICE_NAME
    }

    async fn connect(&self) -> Result<Box<dyn Connection>, ReaderError> {
        info!("🔌 Opening P1 port {} at {} baud", self.config.port, self.config.baud_rate);

        let port = serialport::new(&self.config.port, self.config.baud_rate)
            .timeout(self.config.timeout())
            .open()
            .map_err(|e| {
                error!("❌ Failed to open P1 port {}: {}", self.config.port, e);
                ReaderError::ConnectionError(format!(
                    "Failed to open port {}: {}",
                    self.config.port, e
                ))
            })?;

        info!("Connected, start reading from {}...", DEVICE_NAME);
        Ok(Box::new(TelegramConnection::new(BufReader::new(port))))
    }
}

pub struct TelegramConnection<R> {
    reader: Arc<Mutex<R>>,
}

impl<R: BufRead + Send + 'static> TelegramConnection<R> {
    pub fn new(reader: R) -> Self {
        Self { reader: Arc::new(Mutex::new(reader)) }
    }
}

#[async_trait]
impl<R: BufRead + Send + 'static> Connection for TelegramConnection<R> {
    async fn readline(&mut self) -> Result<Reading, ReaderError> {
        let reader = Arc::clone(&self.reader);
        let telegram = tokio::task::spawn_blocking(move || {
            let mut reader = reader.lock().map_err(|_| ReaderError::LockError)?;
            read_telegram(&mut *reader)
        })
        .await?
        .map_err(|e| {
            error!("Could not read from P1 port, error: {}.", e);
            e
        })?;

        Ok(Reading::text(telegram))
    }
}

impl<R> Drop for TelegramConnection<R> {
    fn drop(&mut self) {
        info!("Closed connection with {}", DEVICE_NAME);
    }
}

/// Reads one telegram from its header line up to the checksum line and
/// joins the lines with commas. Lines before the first header are the tail
/// of a telegram already in flight and are skipped. A telegram is returned
/// whole or not at all.
pub fn read_telegram<R: BufRead + ?Sized>(reader: &mut R) -> Result<String, ReaderError> {
    let mut telegram: Vec<String> = Vec::new();
    let mut skipped = 0usize;
    loop {
        let mut line = Vec::new();
        if reader.read_until(b'\n', &mut line)? == 0 {
            return Err(ReaderError::TransportError(
                "P1 port closed before checksum line".to_string(),
            ));
        }

        let header_line = line.first() == Some(&HEADER_MARKER);
        if header_line {
            if skipped > 0 {
                debug!("Skipped {} line(s) before P1 telegram header", skipped);
                skipped = 0;
            }
            if !telegram.is_empty() {
                warn!(
                    "⚠️  P1 telegram restarted before its checksum line, dropping {} line(s)",
                    telegram.len()
                );
                telegram.clear();
            }
        } else if telegram.is_empty() {
            skipped += 1;
            continue;
        }

        if !line.is_ascii() {
            return Err(ReaderError::TransportError(
                "Non-ASCII bytes in P1 telegram".to_string(),
            ));
        }

        let checksum_line = line.first() == Some(&CHECKSUM_MARKER);
        telegram.push(String::from_utf8_lossy(&line).trim().to_string());
        if checksum_line {
            return Ok(telegram.join(","));
        }
    }
}
