//! Input reduction for very large texts.
//!
//! Above [`EXTREME_INPUT_BYTES`] (and outside full-analysis mode) the text is not
//! split as a whole. Instead a fixed number of evenly spaced windows are cut out
//! of it, each starting on a line boundary, and only their leading lines are
//! parsed. This is a positional stride sample, not a random one.

use serde::{Deserialize, Serialize};

pub const EXTREME_INPUT_BYTES: usize = 100 * 1024 * 1024;
pub const SAMPLE_WINDOWS: usize = 10;
pub const WINDOW_BYTES: usize = 500_000;
pub const LINES_PER_WINDOW: usize = 300;
/// Raw line count above which a non-full result is reported as a sample.
pub const SAMPLING_LINE_THRESHOLD: usize = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SamplingPlan {
    pub threshold_bytes: usize,
    pub windows: usize,
    pub window_bytes: usize,
    pub lines_per_window: usize,
}

impl Default for SamplingPlan {
    fn default() -> Self {
        SamplingPlan {
            threshold_bytes: EXTREME_INPUT_BYTES,
            windows: SAMPLE_WINDOWS,
            window_bytes: WINDOW_BYTES,
            lines_per_window: LINES_PER_WINDOW,
        }
    }
}

/// Lines selected for parsing plus what is known about the whole input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputLines<'a> {
    pub lines: Vec<&'a str>,
    /// Line count of the complete input, sampled or not.
    pub raw_line_count: usize,
    pub reduced: bool,
}

impl<'a> InputLines<'a> {
    pub fn from_lines(lines: Vec<&'a str>) -> Self {
        let raw_line_count = lines.len();
        InputLines { lines, raw_line_count, reduced: false }
    }
}

/// Splits trimmed `text` on `\n`, dropping a trailing `\r` from each line.
pub fn split_lines(text: &str) -> Vec<&str> {
    let text = text.trim();
    if text.is_empty() {
        return Vec::new();
    }
    text.split('\n').map(strip_cr).collect()
}

fn strip_cr(line: &str) -> &str {
    line.strip_suffix('\r').unwrap_or(line)
}

pub fn reduce_input(text: &str, full_analysis: bool) -> InputLines<'_> {
    reduce_input_with(text, full_analysis, &SamplingPlan::default())
}

pub fn reduce_input_with<'a>(
    text: &'a str,
    full_analysis: bool,
    plan: &SamplingPlan,
) -> InputLines<'a> {
    let text = text.trim();
    if full_analysis || text.len() <= plan.threshold_bytes {
        return InputLines::from_lines(split_lines(text));
    }
    tracing::info!(
        bytes = text.len(),
        windows = plan.windows,
        "extremely large log, sampling windows"
    );

    let mut lines = Vec::with_capacity(plan.windows * plan.lines_per_window);
    for i in 0..plan.windows {
        let position = i * text.len() / plan.windows;
        let start = window_start(text, position);
        let end = floor_char_boundary(text, (start + plan.window_bytes).min(text.len()));
        if start >= end {
            continue;
        }
        lines.extend(
            text[start..end]
                .split('\n')
                .take(plan.lines_per_window)
                .map(strip_cr),
        );
    }
    InputLines {
        lines,
        raw_line_count: count_lines(text),
        reduced: true,
    }
}

// Start of the first full line at or after `position`.
fn window_start(text: &str, position: usize) -> usize {
    if position == 0 {
        return 0;
    }
    match text.as_bytes()[position..].iter().position(|&b| b == b'\n') {
        Some(i) => position + i + 1,
        None => text.len(),
    }
}

fn floor_char_boundary(text: &str, mut idx: usize) -> usize {
    while idx > 0 && !text.is_char_boundary(idx) {
        idx -= 1;
    }
    idx
}

fn count_lines(text: &str) -> usize {
    if text.is_empty() {
        return 0;
    }
    text.as_bytes().iter().filter(|&&b| b == b'\n').count() + 1
}

/// Extrapolation metadata attached to results built from part of the input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SamplingInfo {
    pub is_sample: bool,
    /// Retained parsed records.
    pub sample_size: usize,
    /// Raw lines in the input.
    pub full_size: usize,
    pub sampling_ratio: f64,
}

pub fn sampling_info(
    input: &InputLines<'_>,
    retained: usize,
    full_analysis: bool,
) -> Option<SamplingInfo> {
    if full_analysis || !(input.reduced || input.raw_line_count > SAMPLING_LINE_THRESHOLD) {
        return None;
    }
    let ratio = input.raw_line_count as f64 / retained.max(1) as f64;
    Some(SamplingInfo {
        is_sample: true,
        sample_size: retained,
        full_size: input.raw_line_count,
        sampling_ratio: (ratio * 100.0).round() / 100.0,
    })
}
