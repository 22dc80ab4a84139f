use clap::Parser;
use std::path::PathBuf;

/// Periodically read an inverter or smart meter and append the readings to a
/// sink. Reconnects on its own when the serial line drops.
#[derive(Parser, Debug, Clone)]
#[command(name = "timeseries-reader", version, about)]
pub struct Cli {
    /// Serial port of the input device, overriding the config file
    #[arg(short = 'p', long)]
    pub port: Option<String>,

    /// Input device name (growatt-inverter or p1-port)
    #[arg(short = 'i', long, default_value = "growatt-inverter")]
    pub input: String,

    /// Output device name (csv or console)
    #[arg(short = 'o', long, default_value = "csv")]
    pub output: String,

    /// Seconds between two polls
    #[arg(
        short = 'r',
        long = "read-interval",
        default_value_t = 1,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub read_interval: u64,

    /// Number of buffered readings that triggers a write (a count, not seconds)
    #[arg(
        short = 'w',
        long = "write-interval",
        default_value_t = 600,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub write_interval: u64,

    /// Seconds to wait before reconnecting to the input device
    #[arg(short = 'c', long = "reconnect-wait", default_value_t = 60)]
    pub reconnect_wait: u64,

    /// Device settings file
    #[arg(long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Append log lines to this file instead of stderr
    #[arg(long = "log-file")]
    pub log_file: Option<PathBuf>,

    /// Name of the single-instance lock
    #[arg(long = "lock-name", default_value = "reading_device")]
    pub lock_name: String,

    /// List the serial ports on this host and exit
    #[arg(long = "list-ports")]
    pub list_ports: bool,
}
