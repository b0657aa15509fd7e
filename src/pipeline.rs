use crate::aggregate::{self, AnalysisResult};
use crate::record::LogRecord;
use crate::sampler::{self, InputLines};
use crate::{anomaly, format, parser};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AnalyzeOpts {
    /// Disables sampling and the retention cap, enables anomaly detection.
    pub full_analysis: bool,
}

impl AnalyzeOpts {
    pub fn full() -> Self {
        AnalyzeOpts { full_analysis: true }
    }
}

/// Analyzes one text blob.
pub fn parse(text: &str, full_analysis: bool) -> AnalysisResult {
    run(sampler::reduce_input(text, full_analysis), full_analysis)
}

/// Analyzes pre-split lines. No size-based reduction is applied.
pub fn parse_lines<S: AsRef<str>>(lines: &[S], full_analysis: bool) -> AnalysisResult {
    let lines: Vec<&str> = lines.iter().map(|l| -> &str { l.as_ref() }).collect();
    run(InputLines::from_lines(lines), full_analysis)
}

fn run(input: InputLines<'_>, full_analysis: bool) -> AnalysisResult {
    tracing::debug!(format = %format::detect_format(&input.lines), "line-sample format");
    let records = parser::parse_lines(&input.lines, full_analysis);
    finish(records, &input, full_analysis)
}

/// Anomaly passes, aggregation and sampling metadata for a fully parsed batch.
pub(crate) fn finish(
    mut records: Vec<LogRecord>,
    input: &InputLines<'_>,
    full_analysis: bool,
) -> AnalysisResult {
    if full_analysis {
        anomaly::detect_anomalies(&mut records);
    }
    let mut result = aggregate::analyze(&records, full_analysis);
    result.sampling = sampler::sampling_info(input, records.len(), full_analysis);
    result
}
