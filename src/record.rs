use crate::format::LogFormat;
use serde::{Deserialize, Serialize};

/// One parsed log line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogRecord {
    pub raw: String,
    /// 1-based position in the input.
    pub line_number: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    /// Seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_time: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_ip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server_ip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default)]
    pub format: LogFormat,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub anomalies: Vec<AnomalyAnnotation>,
}

impl LogRecord {
    pub fn is_error(&self) -> bool {
        let bad_level = self
            .level
            .as_deref()
            .map(|l| matches!(l.to_ascii_uppercase().as_str(), "ERROR" | "FATAL" | "CRITICAL"))
            .unwrap_or(false);
        bad_level
            || self.status_code.map(|s| s >= 500).unwrap_or(false)
            || self.error_message.as_deref().map(|m| !m.is_empty()).unwrap_or(false)
    }

    pub fn has_http_fields(&self) -> bool {
        self.http_method.is_some() || self.status_code.is_some() || self.path.is_some()
    }

    pub fn annotate(&mut self, annotation: AnomalyAnnotation) {
        self.anomalies.push(annotation);
    }
}

/// Field-by-field construction of a [`LogRecord`].
///
/// [`RecordBuilder::build`] refuses to produce a record when nothing beyond the
/// raw text and line number was set.
#[derive(Debug, Clone)]
pub struct RecordBuilder {
    rec: LogRecord,
}

impl RecordBuilder {
    pub fn new(raw: impl Into<String>, line_number: usize) -> Self {
        RecordBuilder {
            rec: LogRecord {
                raw: raw.into(),
                line_number,
                timestamp: None,
                level: None,
                http_method: None,
                full_path: None,
                path: None,
                status_code: None,
                response_time: None,
                client_ip: None,
                server_ip: None,
                user_id: None,
                error_message: None,
                message: None,
                format: LogFormat::Generic,
                anomalies: Vec::new(),
            },
        }
    }

    pub fn timestamp(mut self, v: impl Into<String>) -> Self {
        self.rec.timestamp = Some(v.into());
        self
    }

    pub fn level(mut self, v: impl Into<String>) -> Self {
        self.rec.level = Some(v.into());
        self
    }

    pub fn http_method(mut self, v: impl Into<String>) -> Self {
        self.rec.http_method = Some(v.into());
        self
    }

    /// Stores the full path and the path with any query string removed.
    pub fn path(mut self, full: impl Into<String>) -> Self {
        let full = full.into();
        let base = match full.find('?') {
            Some(i) if i > 0 => full[..i].to_string(),
            _ => full.clone(),
        };
        self.rec.full_path = Some(full);
        self.rec.path = Some(base);
        self
    }

    pub fn status_code(mut self, v: u16) -> Self {
        self.rec.status_code = Some(v);
        self
    }

    pub fn response_time(mut self, seconds: f64) -> Self {
        self.rec.response_time = Some(seconds);
        self
    }

    pub fn client_ip(mut self, v: impl Into<String>) -> Self {
        self.rec.client_ip = Some(v.into());
        self
    }

    pub fn server_ip(mut self, v: impl Into<String>) -> Self {
        self.rec.server_ip = Some(v.into());
        self
    }

    pub fn user_id(mut self, v: impl Into<String>) -> Self {
        self.rec.user_id = Some(v.into());
        self
    }

    pub fn error_message(mut self, v: impl Into<String>) -> Self {
        self.rec.error_message = Some(v.into());
        self
    }

    pub fn message(mut self, v: impl Into<String>) -> Self {
        self.rec.message = Some(v.into());
        self
    }

    pub fn has_level(&self) -> bool {
        self.rec.level.is_some()
    }

    pub fn has_fields(&self) -> bool {
        let r = &self.rec;
        r.timestamp.is_some()
            || r.level.is_some()
            || r.http_method.is_some()
            || r.path.is_some()
            || r.status_code.is_some()
            || r.response_time.is_some()
            || r.client_ip.is_some()
            || r.server_ip.is_some()
            || r.user_id.is_some()
            || r.error_message.is_some()
            || r.message.is_some()
    }

    pub fn build(self) -> Option<LogRecord> {
        if self.has_fields() {
            Some(self.rec)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyKind {
    SlowResponse,
    ErrorCluster,
    HighErrorRate,
    HighClientErrorRate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    High,
    Medium,
    Low,
}

/// A deviation flagged on a record by one of the anomaly detectors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnomalyAnnotation {
    #[serde(rename = "type")]
    pub kind: AnomalyKind,
    pub message: String,
    pub severity: Severity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cluster: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cluster_size: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub percentage: Option<f64>,
}

impl AnomalyAnnotation {
    fn bare(kind: AnomalyKind, severity: Severity, message: String) -> Self {
        AnomalyAnnotation {
            kind,
            message,
            severity,
            value: None,
            threshold: None,
            cluster: None,
            cluster_size: None,
            status: None,
            percentage: None,
        }
    }

    pub fn slow_response(value: f64, threshold: f64) -> Self {
        let message = format!(
            "Slow response time ({value:.3}s) exceeds threshold of {threshold:.3}s"
        );
        AnomalyAnnotation {
            value: Some(value),
            threshold: Some(threshold),
            ..Self::bare(AnomalyKind::SlowResponse, Severity::High, message)
        }
    }

    /// `cluster` is the 1-based sequence index of the cluster.
    pub fn error_cluster(cluster: usize, size: usize) -> Self {
        let message = format!("Part of error cluster #{cluster} with {size} errors");
        AnomalyAnnotation {
            cluster: Some(cluster),
            cluster_size: Some(size),
            ..Self::bare(AnomalyKind::ErrorCluster, Severity::High, message)
        }
    }

    pub fn high_error_rate(status: u16, percentage: f64) -> Self {
        Self::status_rate(AnomalyKind::HighErrorRate, Severity::High, status, percentage)
    }

    pub fn high_client_error_rate(status: u16, percentage: f64) -> Self {
        Self::status_rate(AnomalyKind::HighClientErrorRate, Severity::Medium, status, percentage)
    }

    fn status_rate(kind: AnomalyKind, severity: Severity, status: u16, percentage: f64) -> Self {
        let message = format!("High rate of {status} errors ({percentage:.1}% of requests)");
        AnomalyAnnotation {
            status: Some(status),
            percentage: Some(percentage),
            ..Self::bare(kind, severity, message)
        }
    }
}
