use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Coarse classification of a log's shape.
///
/// The first five labels come from the line-sample detector; the last four are
/// assigned by the line parser from extraction statistics and supersede them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LogFormat {
    CustomServer,
    Json,
    Apache,
    Timestamped,
    ServerLogs,
    HttpLogs,
    ApplicationLogs,
    TimestampedLogs,
    #[default]
    Generic,
}

impl LogFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            LogFormat::CustomServer => "custom-server",
            LogFormat::Json => "json",
            LogFormat::Apache => "apache",
            LogFormat::Timestamped => "timestamped",
            LogFormat::ServerLogs => "server-logs",
            LogFormat::HttpLogs => "http-logs",
            LogFormat::ApplicationLogs => "application-logs",
            LogFormat::TimestampedLogs => "timestamped-logs",
            LogFormat::Generic => "generic",
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Number of leading lines inspected by [`detect_format`].
pub const FORMAT_SAMPLE: usize = 10;

// [26/Feb/2025:08:48:45 +0100] lims.wsse.local to: 127.0.0.1:8891 - 10.138.100.157 - - {GET /iapi/LangRes HTTP/1.1} - 200 - 0.302 - 21141
static RE_CUSTOM_START: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\[[0-9]{2}/[A-Za-z]{3}/[0-9]{4}:[0-9]{2}:[0-9]{2}:[0-9]{2}").unwrap()
});

static RE_CUSTOM_METHOD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{(?:GET|POST|PUT|DELETE|PATCH|HEAD|OPTIONS)\b").unwrap()
});

// status - time - id
static RE_CUSTOM_TAIL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[0-9]+\s+-\s+[0-9.]+\s+-\s+[0-9]+$").unwrap()
});

static RE_ISO_PREFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[0-9]{4}[-/][0-9]{2}[-/][0-9]{2}[ T][0-9]{2}:[0-9]{2}:[0-9]{2}").unwrap()
});

/// Classifies a log from its first non-blank line.
///
/// Only the first [`FORMAT_SAMPLE`] entries of `sample_lines` are considered.
/// Best effort: callers must tolerate a wrong answer.
pub fn detect_format<S: AsRef<str>>(sample_lines: &[S]) -> LogFormat {
    let first = sample_lines
        .iter()
        .take(FORMAT_SAMPLE)
        .map(|l| -> &str { l.as_ref() })
        .find(|l| !l.trim().is_empty());
    match first {
        Some(line) => classify_line(line),
        None => LogFormat::Generic,
    }
}

/// Same as [`detect_format`] over the leading lines of a text blob.
pub fn detect_format_in_text(text: &str) -> LogFormat {
    let sample: Vec<&str> = text.trim().split('\n').take(FORMAT_SAMPLE).collect();
    detect_format(&sample)
}

fn classify_line(line: &str) -> LogFormat {
    let line = line.trim_end_matches('\r');
    if is_custom_server(line) {
        return LogFormat::CustomServer;
    }
    let trimmed = line.trim();
    if trimmed.starts_with('{') && trimmed.ends_with('}') {
        return LogFormat::Json;
    }
    if line.contains('[') && ["GET", "POST", "PUT"].iter().any(|m| line.contains(m)) {
        return LogFormat::Apache;
    }
    if RE_ISO_PREFIX.is_match(line) {
        return LogFormat::Timestamped;
    }
    LogFormat::Generic
}

fn is_custom_server(line: &str) -> bool {
    RE_CUSTOM_START.is_match(line)
        && line.contains("to:")
        && RE_CUSTOM_METHOD.is_match(line)
        && RE_CUSTOM_TAIL.is_match(line)
}
