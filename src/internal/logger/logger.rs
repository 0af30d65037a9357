// src/internal/logger/logger.rs

use std::any::Any;
use std::fs::{self, OpenOptions};
use std::io;
use std::panic;
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};
use tracing_subscriber::{
    fmt::{self},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

use crate::internal::config::LoggingConfig;

/// Initialize the global logger with the given configuration.
///
/// `RUST_LOG` wins over `cfg.level` when it is set.
pub fn init_logger(cfg: &LoggingConfig) -> anyhow::Result<()> {
    let filter = build_filter(cfg);

    if cfg.format == "json" {
        eprintln!("Warning: JSON log format is not available, using compact output.");
    }

    let console = (!cfg.disable_console).then(|| {
        fmt::layer()
            .with_ansi(cfg.color)
            .with_level(true)
            .with_target(true)
            .with_thread_ids(false)
            .with_thread_names(false)
    });

    let file = match &cfg.output_path {
        Some(output_path) => {
            let log_file = create_log_file(output_path, cfg.append_to_file)?;
            Some(
                fmt::layer()
                    .with_writer(SharedFileWriter::new(log_file))
                    .with_ansi(false)
                    .with_level(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_thread_names(false),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file)
        .try_init()?;

    install_panic_hook();
    Ok(())
}

/// Report panics through `tracing` instead of the default stderr hook.
///
/// Handler panics caught by the dispatcher land in the configured log
/// outputs, with their location, rather than on a bare stderr line.
pub fn install_panic_hook() {
    panic::set_hook(Box::new(|info| {
        let location = info
            .location()
            .map(|location| format!("{}:{}", location.file(), location.line()))
            .unwrap_or_default();
        tracing::error!(target: "panic", %location, "{}", panic_message(info.payload()));
    }));
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "non-string panic payload"
    }
}

fn build_filter(cfg: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cfg.level.clone()))
}

/// Create or open log file based on configuration
fn create_log_file(path: &str, append: bool) -> anyhow::Result<fs::File> {
    let path = Path::new(path);

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let file = OpenOptions::new()
        .create(true)
        .write(true)
        .append(append)
        .truncate(!append)
        .open(path)?;

    Ok(file)
}

/// File writer shared between the subscriber's per-event writers.
#[derive(Clone)]
struct SharedFileWriter {
    file: Arc<Mutex<fs::File>>,
}

impl SharedFileWriter {
    fn new(file: fs::File) -> Self {
        Self {
            file: Arc::new(Mutex::new(file)),
        }
    }
}

impl io::Write for SharedFileWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.file
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .flush()
    }
}

impl<'a> fmt::MakeWriter<'a> for SharedFileWriter {
    type Writer = Self;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn log_file_is_truncated_unless_appending() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/backend.log");
        let path_str = path.to_str().unwrap();

        let mut file = create_log_file(path_str, false).unwrap();
        file.write_all(b"first\n").unwrap();

        let mut file = create_log_file(path_str, true).unwrap();
        file.write_all(b"second\n").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "first\nsecond\n");

        let mut file = create_log_file(path_str, false).unwrap();
        file.write_all(b"third\n").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "third\n");
    }

    #[test]
    fn shared_writer_clones_write_to_the_same_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shared.log");
        let writer = SharedFileWriter::new(create_log_file(path.to_str().unwrap(), false).unwrap());

        let mut a = writer.clone();
        let mut b = writer;
        a.write_all(b"a").unwrap();
        b.write_all(b"b").unwrap();
        b.flush().unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "ab");
    }

    #[test]
    fn panics_are_reported_through_tracing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("panic.log");
        let writer = SharedFileWriter::new(create_log_file(path.to_str().unwrap(), false).unwrap());
        let subscriber = fmt::Subscriber::builder()
            .with_writer(writer)
            .with_ansi(false)
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            install_panic_hook();
            let caught = panic::catch_unwind(|| panic!("handler exploded"));
            let _ = panic::take_hook();
            assert!(caught.is_err());
        });

        let logged = fs::read_to_string(&path).unwrap();
        assert!(logged.contains("ERROR"), "unexpected log: {logged}");
        assert!(logged.contains("handler exploded"), "unexpected log: {logged}");
        assert!(logged.contains("logger.rs"), "unexpected log: {logged}");
    }
}
