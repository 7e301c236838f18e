//! Process logging built on the standard `log` crate
//!
//! Install the logger once at startup, then use the usual macros anywhere:
//!
//! ```rust,no_run
//! use trendgate_core::logging::{LogFormat, LogSettings};
//!
//! # fn main() -> anyhow::Result<()> {
//! let settings = LogSettings::default()
//!     .with_format(LogFormat::Json)
//!     .with_context_field("service", "trendgate");
//!
//! trendgate_core::logging::init_logging(&settings)?;
//!
//! log::info!("Server starting on port {}", 8080);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod destinations;
pub mod formatter;

pub use config::{LogLevel, LogSettings};
pub use destinations::{ConsoleWriter, LogEntry, LogOutput, LogWriter};
pub use formatter::LogFormat;

use std::sync::{Arc, Once};

static INIT: Once = Once::new();

/// Install the process-wide logger
///
/// Safe to call more than once; only the first call has any effect. Fails
/// only if some other logger was installed first.
pub fn init_logging(settings: &LogSettings) -> anyhow::Result<()> {
    let mut result = Ok(());
    INIT.call_once(|| {
        let logger = TrendGateLogger::new(settings.clone());
        result = log::set_boxed_logger(Box::new(logger))
            .map(|()| log::set_max_level(settings.level.to_filter()))
            .map_err(|err| anyhow::anyhow!("Failed to install logger: {}", err));
    });
    result
}

/// `log::Log` implementation writing formatted entries to one writer
pub struct TrendGateLogger {
    settings: LogSettings,
    writer: Arc<dyn LogWriter>,
}

impl TrendGateLogger {
    pub fn new(settings: LogSettings) -> Self {
        let writer = Arc::new(ConsoleWriter::new(settings.output, settings.format));
        Self { settings, writer }
    }

    /// Write through a custom sink instead of the console
    pub fn with_writer(settings: LogSettings, writer: Arc<dyn LogWriter>) -> Self {
        Self { settings, writer }
    }
}

impl log::Log for TrendGateLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= self.settings.level.to_filter()
    }

    fn log(&self, record: &log::Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let entry = LogEntry::from_log_record(record, &self.settings);
        let _ = self.writer.write_log(&entry);
    }

    fn flush(&self) {
        let _ = self.writer.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use log::Log;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MemoryWriter {
        lines: Mutex<Vec<String>>,
    }

    impl LogWriter for MemoryWriter {
        fn write_log(&self, entry: &LogEntry) -> std::io::Result<()> {
            self.lines.lock().unwrap().push(LogFormat::Logfmt.format_entry(entry));
            Ok(())
        }

        fn flush(&self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_init_is_idempotent() {
        let settings = LogSettings::default().with_level(LogLevel::Warn);
        assert!(init_logging(&settings).is_ok());
        assert!(init_logging(&LogSettings::default()).is_ok());
        assert_eq!(log::max_level(), log::LevelFilter::Warn);
    }

    #[test]
    fn test_level_filtering() {
        let writer = Arc::new(MemoryWriter::default());
        let logger = TrendGateLogger::with_writer(
            LogSettings::default().with_level(LogLevel::Warn).with_context_field("service", "trendgate"),
            writer.clone(),
        );

        logger.log(
            &log::Record::builder()
                .args(format_args!("cache hit"))
                .level(log::Level::Debug)
                .target("trendgate_core::fetch")
                .build(),
        );
        logger.log(
            &log::Record::builder()
                .args(format_args!("provider throttling"))
                .level(log::Level::Warn)
                .target("trendgate_core::fetch")
                .build(),
        );

        let lines = writer.lines.lock().unwrap();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains(r#"message="provider throttling""#));
        assert!(lines[0].contains(r#"service="trendgate""#));
    }

    #[test]
    fn test_off_disables_everything() {
        let writer = Arc::new(MemoryWriter::default());
        let logger =
            TrendGateLogger::with_writer(LogSettings::default().with_level(LogLevel::Off), writer.clone());

        let metadata = log::Metadata::builder().level(log::Level::Error).build();
        assert!(!logger.enabled(&metadata));
    }
}
