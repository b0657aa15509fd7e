//! Distributions and statistics over parsed records, and the final
//! [`AnalysisResult`].

use crate::format::LogFormat;
use crate::masking;
use crate::record::{AnomalyAnnotation, AnomalyKind, LogRecord};
use crate::sampler::SamplingInfo;
use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Entries kept in the truncated distributions.
pub const TOP_N: usize = 10;
/// Examples kept per anomaly type in the summary.
pub const SUMMARY_EXAMPLES: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub total_logs: usize,
    pub format: LogFormat,
    pub full_analysis: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sample_log: Option<LogRecord>,
    pub aggregations: Aggregations,
    #[serde(flatten)]
    pub sampling: Option<SamplingInfo>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Aggregations {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_distribution: Option<Vec<TimeCount>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level_distribution: Option<Vec<LevelCount>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method_distribution: Option<Vec<MethodCount>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_distribution: Option<Vec<StatusCount>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_category_distribution: Option<Vec<CategoryCount>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path_distribution: Option<Vec<PathCount>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_ip_distribution: Option<Vec<IpCount>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server_distribution: Option<Vec<ServerCount>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_response_time: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_response_time: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_response_time: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_time_distribution: Option<Vec<RangeCount>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pattern_distribution: Vec<PatternCount>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anomalies: Option<Vec<AnomalyEntry>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anomaly_summary: Option<Vec<AnomalyGroup>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeCount {
    pub time: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelCount {
    pub level: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodCount {
    pub method: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCount {
    pub status: u16,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCount {
    pub category: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathCount {
    pub path: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpCount {
    pub ip: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerCount {
    pub server: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeCount {
    pub range: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternCount {
    pub pattern: String,
    pub count: usize,
}

/// A record that carries at least one annotation, with the fields a reader
/// needs to judge it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnomalyEntry {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    pub line_number: usize,
    pub anomalies: Vec<AnomalyAnnotation>,
    pub details: AnomalyDetails,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnomalyDetails {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_time: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnomalyExample {
    #[serde(flatten)]
    pub entry: AnomalyEntry,
    pub anomaly_details: AnomalyAnnotation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyGroup {
    #[serde(rename = "type")]
    pub kind: AnomalyKind,
    pub count: usize,
    pub examples: Vec<AnomalyExample>,
}

// Minute stamp not starting inside a longer digit run ("2025:08:48" yields "08:48").
static RE_MINUTE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:^|[^0-9])([0-9]{2}:[0-9]{2})").unwrap());

static RE_DATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[0-9]{4}-[0-9]{2}-[0-9]{2}|[0-9]{2}/[0-9]{2}/[0-9]{4}|[0-9]{2}/[A-Za-z]{3}/[0-9]{4}").unwrap()
});

const RESPONSE_BUCKETS: [(f64, f64, &str); 7] = [
    (0.0, 0.1, "0-100ms"),
    (0.1, 0.5, "100-500ms"),
    (0.5, 1.0, "500ms-1s"),
    (1.0, 2.0, "1-2s"),
    (2.0, 5.0, "2-5s"),
    (5.0, 10.0, "5-10s"),
    (10.0, f64::INFINITY, "10s+"),
];

/// Summarises `records` into an [`AnalysisResult`].
///
/// Anomaly listings are included only when `full_analysis` is set; the records
/// are expected to be annotated already.
pub fn analyze(records: &[LogRecord], full_analysis: bool) -> AnalysisResult {
    let Some(first) = records.first() else {
        return AnalysisResult {
            total_logs: 0,
            format: LogFormat::Generic,
            full_analysis,
            sample_log: None,
            aggregations: Aggregations::default(),
            sampling: None,
        };
    };

    let mut agg = Aggregations {
        time_distribution: time_distribution(records),
        ..Aggregations::default()
    };

    let levels = by_count_desc(count_values(records.iter().filter_map(|r| r.level.clone())));
    agg.level_distribution = non_empty(
        levels
            .into_iter()
            .map(|(level, count)| LevelCount { level, count })
            .collect(),
    );

    let methods = by_count_desc(count_values(records.iter().filter_map(|r| r.http_method.clone())));
    agg.method_distribution = non_empty(
        methods
            .into_iter()
            .map(|(method, count)| MethodCount { method, count })
            .collect(),
    );

    let statuses: Vec<u16> = records.iter().filter_map(|r| r.status_code).collect();
    let status_counts = by_count_desc(count_values(statuses.iter().copied()));
    agg.status_distribution = non_empty(
        status_counts
            .into_iter()
            .map(|(status, count)| StatusCount { status, count })
            .collect(),
    );
    // BTreeMap keeps categories ascending
    let categories = count_values(statuses.iter().map(|s| status_category(*s)));
    agg.status_category_distribution = non_empty(
        categories
            .into_iter()
            .map(|(category, count)| CategoryCount { category, count })
            .collect(),
    );

    let paths = by_count_desc(count_values(records.iter().filter_map(|r| r.path.clone())));
    agg.path_distribution = non_empty(
        paths
            .into_iter()
            .take(TOP_N)
            .map(|(path, count)| PathCount { path, count })
            .collect(),
    );

    let ips = by_count_desc(count_values(records.iter().filter_map(|r| r.client_ip.clone())));
    agg.client_ip_distribution = non_empty(
        ips.into_iter()
            .take(TOP_N)
            .map(|(ip, count)| IpCount { ip, count })
            .collect(),
    );

    let servers = by_count_desc(count_values(records.iter().filter_map(|r| r.server_ip.clone())));
    agg.server_distribution = non_empty(
        servers
            .into_iter()
            .map(|(server, count)| ServerCount { server, count })
            .collect(),
    );

    let times: Vec<f64> = records.iter().filter_map(|r| r.response_time).collect();
    if let Some((lo, hi)) = times.iter().copied().minmax().into_option() {
        agg.min_response_time = Some(lo);
        agg.max_response_time = Some(hi);
        agg.avg_response_time = Some(times.iter().sum::<f64>() / times.len() as f64);
        agg.response_time_distribution = non_empty(response_buckets(&times));
    }

    agg.pattern_distribution = pattern_distribution(records);

    if full_analysis {
        let entries = anomaly_entries(records);
        agg.anomaly_summary = Some(anomaly_summary(&entries));
        agg.anomalies = Some(entries);
    }

    AnalysisResult {
        total_logs: records.len(),
        format: first.format,
        full_analysis,
        sample_log: Some(first.clone()),
        aggregations: agg,
        sampling: None,
    }
}

fn count_values<K: Ord>(values: impl Iterator<Item = K>) -> BTreeMap<K, usize> {
    let mut map = BTreeMap::new();
    for v in values {
        *map.entry(v).or_insert(0) += 1;
    }
    map
}

// Stable: equal counts keep key order.
fn by_count_desc<K: Ord>(counts: BTreeMap<K, usize>) -> Vec<(K, usize)> {
    counts
        .into_iter()
        .sorted_by(|a, b| b.1.cmp(&a.1))
        .collect()
}

fn non_empty<T>(v: Vec<T>) -> Option<Vec<T>> {
    if v.is_empty() {
        None
    } else {
        Some(v)
    }
}

pub fn status_category(status: u16) -> String {
    format!("{}xx", status / 100)
}

/// Minute stamp of a timestamp, falling back to its date token.
pub fn time_bucket(timestamp: &str) -> String {
    if let Some(caps) = RE_MINUTE.captures(timestamp) {
        return caps[1].to_string();
    }
    match RE_DATE.find(timestamp) {
        Some(m) => m.as_str().to_string(),
        None => "unknown".to_string(),
    }
}

fn time_distribution(records: &[LogRecord]) -> Option<Vec<TimeCount>> {
    let counts = count_values(
        records
            .iter()
            .filter_map(|r| r.timestamp.as_deref())
            .map(time_bucket),
    );
    non_empty(
        counts
            .into_iter()
            .map(|(time, count)| TimeCount { time, count })
            .collect(),
    )
}

fn response_buckets(times: &[f64]) -> Vec<RangeCount> {
    let mut counts = [0usize; RESPONSE_BUCKETS.len()];
    for &t in times {
        if let Some(i) = RESPONSE_BUCKETS.iter().position(|(lo, hi, _)| t >= *lo && t < *hi) {
            counts[i] += 1;
        }
    }
    RESPONSE_BUCKETS
        .iter()
        .zip(counts)
        .filter(|(_, count)| *count > 0)
        .map(|((_, _, label), count)| RangeCount { range: label.to_string(), count })
        .collect()
}

fn pattern_distribution(records: &[LogRecord]) -> Vec<PatternCount> {
    let keys = records.iter().filter_map(|r| {
        let message = match &r.message {
            Some(m) => m.clone(),
            None => masking::redact_line(&r.raw),
        };
        masking::pattern_key(&message)
    });
    by_count_desc(count_values(keys))
        .into_iter()
        .take(TOP_N)
        .map(|(pattern, count)| PatternCount { pattern, count })
        .collect()
}

fn anomaly_entries(records: &[LogRecord]) -> Vec<AnomalyEntry> {
    records
        .iter()
        .filter(|r| !r.anomalies.is_empty())
        .map(|r| AnomalyEntry {
            timestamp: r.timestamp.clone(),
            line_number: r.line_number,
            anomalies: r.anomalies.clone(),
            details: AnomalyDetails {
                method: r.http_method.clone(),
                path: r.path.clone(),
                status_code: r.status_code,
                response_time: r.response_time,
                level: r.level.clone(),
                message: r.message.clone().unwrap_or_else(|| r.raw.clone()),
            },
        })
        .collect()
}

fn anomaly_summary(entries: &[AnomalyEntry]) -> Vec<AnomalyGroup> {
    let mut by_kind: BTreeMap<AnomalyKind, (usize, Vec<AnomalyExample>)> = BTreeMap::new();
    for entry in entries {
        for a in &entry.anomalies {
            let (count, examples) = by_kind.entry(a.kind).or_default();
            *count += 1;
            if examples.len() < SUMMARY_EXAMPLES {
                examples.push(AnomalyExample {
                    entry: entry.clone(),
                    anomaly_details: a.clone(),
                });
            }
        }
    }
    by_kind
        .into_iter()
        .map(|(kind, (count, examples))| AnomalyGroup { kind, count, examples })
        .collect()
}
