use anyhow::Result;
use clap::Parser;
use log::{error, info};

use timeseries_reader::cli::{self, Cli};
use timeseries_reader::utils::init_logging;
use timeseries_reader::VERSION;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();
    init_logging(args.log_file.as_deref());
    info!("Enter Timeseries Reader v{}", VERSION);

    if args.list_ports {
        cli::list_serial_ports()?;
        return Ok(());
    }

    let summary = cli::run(&args).await.map_err(|e| {
        error!("❌ {}", e);
        e
    })?;

    info!(
        "👋 Stopped after {} session(s), {} reading(s), {} failed connect(s)",
        summary.sessions, summary.polls, summary.failed_connects
    );
    Ok(())
}
