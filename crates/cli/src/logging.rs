//! Tracing setup: console output plus an optional plain-text log file.

use std::fs::{self, File, OpenOptions};
use std::path::Path;
use std::sync::Arc;
use reckon_config::LoggingConfig;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

/// Install the global subscriber.
///
/// `RUST_LOG` wins over everything; otherwise `-v` means `debug` and the
/// configured level (or `info`) applies. A log file that cannot be opened
/// is reported back and the console layer is installed alone.
pub fn init(verbose: bool, config: &LoggingConfig) -> std::io::Result<()> {
    let level = if verbose {
        "debug".to_string()
    } else {
        config.level.clone().unwrap_or_else(|| "info".into())
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&level));
    let console = fmt::layer().with_target(false).with_writer(std::io::stderr);

    let (file, result) = match config.log_path.as_deref().map(open_log_file) {
        Some(Ok(file)) => (Some(file), Ok(())),
        Some(Err(e)) => (None, Err(e)),
        None => (None, Ok(())),
    };

    let file_layer = file.map(|f| fmt::layer().with_ansi(false).with_writer(Arc::new(f)));
    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file_layer)
        .init();
    result
}

fn open_log_file(path: &Path) -> std::io::Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_file_parents_are_created() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("nested").join("reckon.log");
        open_log_file(&path).unwrap();
        assert!(path.exists());
    }
}
