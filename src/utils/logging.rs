use env_logger::{Builder, Env, Target};
use log::warn;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

/// Installs the global logger: `info` unless `RUST_LOG` says otherwise,
/// appended to `log_file` when it can be opened, stderr otherwise.
pub fn init_logging(log_file: Option<&Path>) {
    let mut builder = Builder::from_env(Env::default().default_filter_or("info"));
    builder.format(|buf, record| {
        writeln!(
            buf,
            "{} {}:{}",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S,%3f"),
            record.level(),
            record.args()
        )
    });

    let mut fallback = None;
    if let Some(path) = log_file {
        match OpenOptions::new().create(true).append(true).open(path) {
            Ok(file) => {
                builder.target(Target::Pipe(Box::new(file)));
            }
            Err(e) => fallback = Some((path, e)),
        }
    }

    // A logger may already be installed, e.g. by a test harness
    let _ = builder.try_init();

    if let Some((path, e)) = fallback {
        warn!("Cannot open log file {} ({}), logging to stderr", path.display(), e);
    }
}
