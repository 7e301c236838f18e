//! Log formatting options for different output styles

use crate::logging::destinations::LogEntry;
use anyhow::anyhow;
use std::str::FromStr;

/// How log lines are rendered
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogFormat {
    /// One JSON object per line
    /// Example: {"level":"INFO","message":"Listening on 0.0.0.0:8080","service":"trendgate",...}
    Json,

    /// Example: 2024-01-15 10:30:00.123 INFO  [trendgate_core::http] Listening on 0.0.0.0:8080 service=trendgate
    Human,

    /// Example: timestamp=2024-01-15T10:30:00Z level=INFO target=trendgate_core::http message="Listening" service="trendgate"
    Logfmt,
}

impl LogFormat {
    pub fn format_entry(&self, entry: &LogEntry) -> String {
        match self {
            LogFormat::Json => format_json(entry),
            LogFormat::Human => format_human(entry),
            LogFormat::Logfmt => format_logfmt(entry),
        }
    }
}

impl FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "human" | "text" => Ok(LogFormat::Human),
            "logfmt" => Ok(LogFormat::Logfmt),
            other => Err(anyhow!("unknown log format '{}'", other)),
        }
    }
}

fn format_json(entry: &LogEntry) -> String {
    let mut json = serde_json::Map::new();

    json.insert("timestamp".to_string(), entry.timestamp.to_rfc3339().into());
    json.insert("level".to_string(), entry.level.as_str().into());
    json.insert("message".to_string(), entry.message.clone().into());
    json.insert("target".to_string(), entry.target.clone().into());

    for (key, value) in &entry.fields {
        json.insert(key.clone(), value.clone());
    }

    serde_json::to_string(&json).unwrap_or_else(|_| "Failed to serialize log entry".to_string())
}

/// Field value without JSON quoting for strings
fn plain_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn format_human(entry: &LogEntry) -> String {
    let timestamp = entry.timestamp.format("%Y-%m-%d %H:%M:%S%.3f");
    let mut line =
        format!("{} {:5} [{}] {}", timestamp, entry.level.as_str(), entry.target, entry.message);

    for (key, value) in &entry.fields {
        line.push_str(&format!(" {}={}", key, plain_value(value)));
    }

    line
}

fn logfmt_quote(s: &str) -> String {
    format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
}

fn format_logfmt(entry: &LogEntry) -> String {
    let mut parts = vec![
        format!("timestamp={}", entry.timestamp.to_rfc3339()),
        format!("level={}", entry.level.as_str()),
        format!("target={}", entry.target),
        format!("message={}", logfmt_quote(&entry.message)),
    ];

    for (key, value) in &entry.fields {
        let rendered = match value {
            serde_json::Value::Number(_) | serde_json::Value::Bool(_) => value.to_string(),
            other => logfmt_quote(&plain_value(other)),
        };
        parts.push(format!("{}={}", key, rendered));
    }

    parts.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::LogLevel;

    fn entry(level: LogLevel, message: &str) -> LogEntry {
        LogEntry::new(level, message.to_string(), "trendgate_core::fetch".to_string())
            .with_field("service", serde_json::json!("trendgate"))
    }

    #[test]
    fn test_json_format() {
        let formatted = LogFormat::Json.format_entry(&entry(LogLevel::Info, "Fetched hvac"));

        let parsed: serde_json::Value = serde_json::from_str(&formatted).unwrap();
        assert_eq!(parsed["message"], "Fetched hvac");
        assert_eq!(parsed["level"], "INFO");
        assert_eq!(parsed["target"], "trendgate_core::fetch");
        assert_eq!(parsed["service"], "trendgate");
    }

    #[test]
    fn test_human_format() {
        let formatted = LogFormat::Human.format_entry(&entry(LogLevel::Error, "Provider down"));

        assert!(formatted.contains("ERROR"));
        assert!(formatted.contains("[trendgate_core::fetch] Provider down"));
        assert!(formatted.ends_with("service=trendgate"));
    }

    #[test]
    fn test_logfmt_escapes_quotes() {
        let formatted =
            LogFormat::Logfmt.format_entry(&entry(LogLevel::Warn, "No data for \"zzz\""));

        assert!(formatted.contains("level=WARN"));
        assert!(formatted.contains(r#"message="No data for \"zzz\"""#));
        assert!(formatted.contains(r#"service="trendgate""#));
    }

    #[test]
    fn test_parse_format_names() {
        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("text".parse::<LogFormat>().unwrap(), LogFormat::Human);
        assert!("xml".parse::<LogFormat>().is_err());
    }
}
