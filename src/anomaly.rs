//! Statistical and rule-based anomaly passes over parsed records.
//!
//! Each pass only appends annotations; none removes or rewrites what another
//! pass attached. A pass without enough data to work with does nothing.

use crate::record::{AnomalyAnnotation, LogRecord};
use itertools::Itertools;
use std::cmp::Ordering;

pub const MIN_RESPONSE_SAMPLES: usize = 10;
pub const MIN_ERROR_RECORDS: usize = 3;
pub const MIN_CLUSTER_SIZE: usize = 3;
/// Error records closer than this many lines belong to the same cluster.
pub const CLUSTER_LINE_GAP: i64 = 10;
pub const MIN_STATUS_SAMPLES: usize = 10;
/// Share (percent) of all status-coded records above which a 5xx code is flagged.
pub const SERVER_ERROR_SHARE: f64 = 5.0;
/// Share (percent) of all status-coded records above which a 4xx code is flagged.
pub const CLIENT_ERROR_SHARE: f64 = 20.0;

/// Runs all three passes in order.
pub fn detect_anomalies(records: &mut [LogRecord]) {
    if records.is_empty() {
        return;
    }
    detect_response_time_anomalies(records);
    detect_error_clusters(records);
    detect_status_code_anomalies(records);

    let flagged = records.iter().filter(|r| !r.anomalies.is_empty()).count();
    tracing::debug!(flagged, total = records.len(), "anomaly detection finished");
}

/// Flags records slower than `min(mean + 3 * stddev, p99)`.
///
/// Returns the number of flagged records.
pub fn detect_response_time_anomalies(records: &mut [LogRecord]) -> usize {
    let timed: Vec<(usize, f64)> = records
        .iter()
        .enumerate()
        .filter_map(|(i, r)| r.response_time.filter(|t| !t.is_nan()).map(|t| (i, t)))
        .collect();
    if timed.len() < MIN_RESPONSE_SAMPLES {
        return 0;
    }

    let n = timed.len() as f64;
    let mean = timed.iter().map(|(_, t)| t).sum::<f64>() / n;
    let var = timed.iter().map(|(_, t)| (t - mean) * (t - mean)).sum::<f64>() / n;
    let std_dev = var.sqrt();

    let mut sorted: Vec<f64> = timed.iter().map(|(_, t)| *t).collect();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let p99 = sorted[((n * 0.99).floor() as usize).min(sorted.len() - 1)];
    let threshold = (mean + 3.0 * std_dev).min(p99);
    tracing::debug!(mean, std_dev, threshold, "response time anomaly threshold");

    let mut flagged = 0;
    for (i, t) in timed {
        if t > threshold {
            records[i].annotate(AnomalyAnnotation::slow_response(t, threshold));
            flagged += 1;
        }
    }
    flagged
}

/// Groups error records that sit close together in the input.
///
/// Errors are ordered by timestamp, then walked in that order; consecutive
/// entries fewer than [`CLUSTER_LINE_GAP`] lines apart share a cluster. Skipped
/// entirely when the first error record carries no timestamp.
///
/// Returns the number of clusters found.
pub fn detect_error_clusters(records: &mut [LogRecord]) -> usize {
    let mut errors: Vec<usize> = records
        .iter()
        .enumerate()
        .filter(|(_, r)| r.is_error())
        .map(|(i, _)| i)
        .collect();
    if errors.len() < MIN_ERROR_RECORDS {
        return 0;
    }
    if records[errors[0]].timestamp.is_none() {
        tracing::debug!("first error record has no timestamp, skipping cluster detection");
        return 0;
    }
    errors.sort_by(|&a, &b| by_timestamp(&records[a], &records[b]));

    let mut clusters: Vec<Vec<usize>> = Vec::new();
    let mut current = vec![errors[0]];
    for (prev, cur) in errors.iter().copied().tuple_windows() {
        let gap = records[cur].line_number as i64 - records[prev].line_number as i64;
        if gap < CLUSTER_LINE_GAP {
            current.push(cur);
        } else {
            if current.len() >= MIN_CLUSTER_SIZE {
                clusters.push(std::mem::take(&mut current));
            }
            current = vec![cur];
        }
    }
    if current.len() >= MIN_CLUSTER_SIZE {
        clusters.push(current);
    }

    for (n, cluster) in clusters.iter().enumerate() {
        for &i in cluster {
            records[i].annotate(AnomalyAnnotation::error_cluster(n + 1, cluster.len()));
        }
    }
    clusters.len()
}

// Records without a timestamp sort last.
fn by_timestamp(a: &LogRecord, b: &LogRecord) -> Ordering {
    match (&a.timestamp, &b.timestamp) {
        (Some(x), Some(y)) => x.cmp(y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Flags every record of a status code whose share of all status-coded
/// records is unusually high.
///
/// Returns the number of flagged status codes.
pub fn detect_status_code_anomalies(records: &mut [LogRecord]) -> usize {
    let groups = records
        .iter()
        .enumerate()
        .filter_map(|(i, r)| r.status_code.map(|s| (s, i)))
        .into_group_map();
    let total: usize = groups.values().map(Vec::len).sum();
    if total < MIN_STATUS_SAMPLES {
        return 0;
    }

    let mut flagged = 0;
    for (status, members) in groups.into_iter().sorted_by_key(|(s, _)| *s) {
        let percentage = members.len() as f64 / total as f64 * 100.0;
        let annotation = if (500..600).contains(&status) && percentage > SERVER_ERROR_SHARE {
            AnomalyAnnotation::high_error_rate(status, percentage)
        } else if (400..500).contains(&status) && percentage > CLIENT_ERROR_SHARE {
            AnomalyAnnotation::high_client_error_rate(status, percentage)
        } else {
            continue;
        };
        for i in members {
            records[i].annotate(annotation.clone());
        }
        flagged += 1;
    }
    flagged
}
