use crate::format::LogFormat;
use crate::patterns::{self, Field};
use crate::record::{LogRecord, RecordBuilder};
use serde_json::Value;

/// Retained-record ceiling outside full-analysis mode.
pub const LINE_CAP: usize = 15_000;

/// Records inspected when labelling a batch.
pub const CLASSIFY_SAMPLE: usize = 10;

/// Number of records the parser may retain for an input of `total_lines`.
pub fn line_cap(total_lines: usize, full_analysis: bool) -> usize {
    if full_analysis { total_lines } else { LINE_CAP }
}

/// Applies every field's rule list to `line`.
///
/// Returns `None` for blank lines and for lines where nothing could be
/// extracted.
pub fn parse_line(line: &str, line_number: usize) -> Option<LogRecord> {
    if line.trim().is_empty() {
        return None;
    }
    let mut b = RecordBuilder::new(line, line_number);
    for field in Field::ALL {
        b = match field {
            Field::IpAddress => {
                let mut ips = patterns::ip_addresses(line);
                match ips.next() {
                    Some(client) => {
                        let b = b.client_ip(client);
                        match ips.find(|ip| *ip != client) {
                            Some(server) => b.server_ip(server),
                            None => b,
                        }
                    }
                    None => b,
                }
            }
            _ => match patterns::extract(field, line) {
                Some(c) => match field {
                    Field::Timestamp => b.timestamp(c.value),
                    Field::Level => b.level(c.value),
                    Field::HttpMethod => b.http_method(c.value),
                    Field::Path => b.path(c.value),
                    Field::StatusCode => match c.value.parse::<u16>() {
                        Ok(code) if code >= 100 => b.status_code(code),
                        _ => b,
                    },
                    Field::ResponseTime => match c.as_f64() {
                        Some(secs) => b.response_time(secs),
                        None => b,
                    },
                    Field::UserId => b.user_id(c.value),
                    Field::ErrorMessage => b.error_message(c.value),
                    Field::IpAddress => b,
                },
                None => b,
            },
        };
    }
    apply_json_fields(b, line).build()
}

// JSON object lines may carry their message and level as plain keys.
fn apply_json_fields(mut b: RecordBuilder, line: &str) -> RecordBuilder {
    let trimmed = line.trim();
    if !(trimmed.starts_with('{') && trimmed.ends_with('}')) {
        return b;
    }
    let Ok(Value::Object(map)) = serde_json::from_str::<Value>(trimmed) else {
        return b;
    };
    let text = |keys: &[&str]| {
        keys.iter()
            .find_map(|k| map.get(*k).and_then(Value::as_str))
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };
    if let Some(msg) = text(&["message", "msg"]) {
        b = b.message(msg);
    }
    if !b.has_level() {
        if let Some(level) = text(&["level", "severity"]) {
            b = b.level(level.to_ascii_uppercase());
        }
    }
    b
}

/// Parses `lines` in order, keeping at most `budget` records.
///
/// `offset` is the input index of `lines[0]`; line numbers stay relative to the
/// whole input so a batch parsed in pieces numbers its records identically.
pub fn extract_records(lines: &[&str], offset: usize, budget: usize) -> Vec<LogRecord> {
    let mut out = Vec::new();
    for (i, line) in lines.iter().enumerate() {
        if out.len() >= budget {
            break;
        }
        if let Some(rec) = parse_line(line, offset + i + 1) {
            out.push(rec);
        }
    }
    out
}

/// Labels a batch from the fields found in its first records.
pub fn classify_records(records: &[LogRecord]) -> LogFormat {
    let sample = &records[..records.len().min(CLASSIFY_SAMPLE)];
    let Some(first) = sample.first() else {
        return LogFormat::Generic;
    };
    let majority = |n: usize| (n as f64) > sample.len() as f64 * 0.5;

    let http = sample.iter().filter(|r| r.has_http_fields()).count();
    let levels = sample.iter().filter(|r| r.level.is_some()).count();
    let stamped = sample.iter().filter(|r| r.timestamp.is_some()).count();

    if majority(http) {
        if first.server_ip.is_some() && first.response_time.is_some() {
            LogFormat::ServerLogs
        } else {
            LogFormat::HttpLogs
        }
    } else if majority(levels) {
        LogFormat::ApplicationLogs
    } else if majority(stamped) {
        LogFormat::TimestampedLogs
    } else {
        LogFormat::Generic
    }
}

pub fn tag_format(records: &mut [LogRecord], format: LogFormat) {
    for rec in records {
        rec.format = format;
    }
}

/// Extracts, labels and tags every line, honouring the retention cap.
pub fn parse_lines(lines: &[&str], full_analysis: bool) -> Vec<LogRecord> {
    let mut records = extract_records(lines, 0, line_cap(lines.len(), full_analysis));
    let format = classify_records(&records);
    tag_format(&mut records, format);
    tracing::debug!(retained = records.len(), lines = lines.len(), %format, "parsed log lines");
    records
}
