//! Log entries and where they are written

use crate::logging::{LogFormat, LogLevel, LogSettings};
use std::collections::BTreeMap;
use std::io::{self, Write};

/// Console stream the logger writes to
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogOutput {
    Stdout,
    Stderr,
}

/// Sink for formatted entries
pub trait LogWriter: Send + Sync {
    fn write_log(&self, entry: &LogEntry) -> io::Result<()>;
    fn flush(&self) -> io::Result<()>;
}

/// Writes formatted lines to stdout or stderr
pub struct ConsoleWriter {
    output: LogOutput,
    format: LogFormat,
}

impl ConsoleWriter {
    pub fn new(output: LogOutput, format: LogFormat) -> Self {
        Self { output, format }
    }
}

impl LogWriter for ConsoleWriter {
    fn write_log(&self, entry: &LogEntry) -> io::Result<()> {
        let line = self.format.format_entry(entry);
        // Locked writes keep lines from interleaving across threads
        match self.output {
            LogOutput::Stdout => writeln!(io::stdout().lock(), "{}", line),
            LogOutput::Stderr => writeln!(io::stderr().lock(), "{}", line),
        }
    }

    fn flush(&self) -> io::Result<()> {
        match self.output {
            LogOutput::Stdout => io::stdout().flush(),
            LogOutput::Stderr => io::stderr().flush(),
        }
    }
}

/// A structured log entry
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub level: LogLevel,
    pub message: String,
    /// Usually the module path
    pub target: String,
    /// Context fields, sorted by key
    pub fields: BTreeMap<String, serde_json::Value>,
}

impl LogEntry {
    pub fn new(level: LogLevel, message: String, target: String) -> Self {
        Self { timestamp: chrono::Utc::now(), level, message, target, fields: BTreeMap::new() }
    }

    /// Create a LogEntry from a standard log::Record
    pub fn from_log_record(record: &log::Record, settings: &LogSettings) -> Self {
        let mut entry = Self::new(
            record.level().into(),
            record.args().to_string(),
            record.target().to_string(),
        );

        for (key, value) in &settings.context_fields {
            entry.fields.insert(key.clone(), serde_json::Value::String(value.clone()));
        }

        entry
    }

    pub fn with_field(mut self, key: &str, value: serde_json::Value) -> Self {
        self.fields.insert(key.to_string(), value);
        self
    }
}
