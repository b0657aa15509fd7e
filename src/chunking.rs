//! Resumable, cancellable execution of the pipeline for progress reporting.
//!
//! [`AnalysisTask`] parses its input one chunk per [`AnalysisTask::step`] call
//! and produces the same [`AnalysisResult`] as [`crate::pipeline::parse`]. How
//! often steps run, and what happens between them, is up to the driver: either
//! the host's own loop or [`Scheduler::run`].

use crate::aggregate::AnalysisResult;
use crate::error::{AnalysisError, Result};
use crate::parser;
use crate::pipeline::{self, AnalyzeOpts};
use crate::record::LogRecord;
use crate::sampler::{self, InputLines};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

pub const BASE_CHUNK_LINES: usize = 5_000;
pub const VERY_LARGE_LINES: usize = 100_000;
pub const VERY_LARGE_CHUNK_LINES: usize = 2_000;
pub const EXTREME_LINES: usize = 1_000_000;
pub const EXTREME_CHUNK_LINES: usize = 1_000;

/// Chunk sizing: the more lines, the smaller each chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkPolicy {
    pub base: usize,
    pub very_large_threshold: usize,
    pub very_large_chunk: usize,
    pub extreme_threshold: usize,
    pub extreme_chunk: usize,
}

impl Default for ChunkPolicy {
    fn default() -> Self {
        ChunkPolicy {
            base: BASE_CHUNK_LINES,
            very_large_threshold: VERY_LARGE_LINES,
            very_large_chunk: VERY_LARGE_CHUNK_LINES,
            extreme_threshold: EXTREME_LINES,
            extreme_chunk: EXTREME_CHUNK_LINES,
        }
    }
}

impl ChunkPolicy {
    pub fn chunk_size(&self, total_lines: usize) -> usize {
        let size = if total_lines > self.extreme_threshold {
            self.extreme_chunk
        } else if total_lines > self.very_large_threshold {
            self.very_large_chunk
        } else {
            self.base
        };
        size.max(1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub chunks_processed: usize,
    pub total_chunks: usize,
    pub lines_processed: usize,
    pub total_lines: usize,
    pub records_retained: usize,
}

#[derive(Debug)]
pub enum Step {
    Continue(Progress),
    Done(Box<AnalysisResult>),
}

pub struct AnalysisTask<'a> {
    input: InputLines<'a>,
    full_analysis: bool,
    chunk_size: usize,
    budget: usize,
    cursor: usize,
    chunks_processed: usize,
    records: Vec<LogRecord>,
    finished: bool,
}

impl<'a> AnalysisTask<'a> {
    pub fn new(text: &'a str, opts: AnalyzeOpts) -> Self {
        Self::with_policy(text, opts, &ChunkPolicy::default())
    }

    pub fn with_policy(text: &'a str, opts: AnalyzeOpts, policy: &ChunkPolicy) -> Self {
        Self::from_input(sampler::reduce_input(text, opts.full_analysis), opts, policy)
    }

    pub fn from_input(input: InputLines<'a>, opts: AnalyzeOpts, policy: &ChunkPolicy) -> Self {
        let total = input.lines.len();
        AnalysisTask {
            chunk_size: policy.chunk_size(total),
            budget: parser::line_cap(total, opts.full_analysis),
            full_analysis: opts.full_analysis,
            input,
            cursor: 0,
            chunks_processed: 0,
            records: Vec::new(),
            finished: false,
        }
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn total_chunks(&self) -> usize {
        self.input.lines.len().div_ceil(self.chunk_size)
    }

    pub fn chunks_processed(&self) -> usize {
        self.chunks_processed
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn progress(&self) -> Progress {
        Progress {
            chunks_processed: self.chunks_processed,
            total_chunks: self.total_chunks(),
            lines_processed: self.cursor,
            total_lines: self.input.lines.len(),
            records_retained: self.records.len(),
        }
    }

    /// Parses the next chunk, or finishes the analysis once every line has been
    /// seen or the retention cap is reached.
    pub fn step(&mut self) -> Result<Step> {
        if self.finished {
            return Err(AnalysisError::TaskFinished);
        }
        let total = self.input.lines.len();
        if self.cursor < total && self.records.len() < self.budget {
            let end = (self.cursor + self.chunk_size).min(total);
            let remaining = self.budget - self.records.len();
            let chunk = &self.input.lines[self.cursor..end];
            let batch = parser::extract_records(chunk, self.cursor, remaining);
            self.records.extend(batch);
            self.cursor = end;
            self.chunks_processed += 1;
            tracing::debug!(
                chunk = self.chunks_processed,
                lines = self.cursor,
                retained = self.records.len(),
                "chunk parsed"
            );
            return Ok(Step::Continue(self.progress()));
        }

        self.finished = true;
        let mut records = std::mem::take(&mut self.records);
        let format = parser::classify_records(&records);
        parser::tag_format(&mut records, format);
        let result = pipeline::finish(records, &self.input, self.full_analysis);
        Ok(Step::Done(Box::new(result)))
    }
}

/// What a host sees between chunks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressReport {
    pub progress: Progress,
    pub elapsed: Duration,
    pub estimated_remaining: Option<Duration>,
}

fn estimate_remaining(progress: &Progress, elapsed: Duration) -> Option<Duration> {
    if progress.lines_processed == 0 {
        return None;
    }
    let per_line = elapsed.as_secs_f64() / progress.lines_processed as f64;
    let left = progress.total_lines.saturating_sub(progress.lines_processed) as f64;
    Some(Duration::from_secs_f64(per_line * left))
}

/// Drives a task to completion, checking a cancellation flag before every step.
#[derive(Debug, Clone, Default)]
pub struct Scheduler {
    cancel: Arc<AtomicBool>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cancel_flag(cancel: Arc<AtomicBool>) -> Self {
        Scheduler { cancel }
    }

    /// Shared flag; storing `true` stops the scheduler at the next chunk boundary.
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        self.cancel.clone()
    }

    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::SeqCst);
    }

    pub fn run<F>(&self, task: &mut AnalysisTask<'_>, mut on_progress: F) -> Result<AnalysisResult>
    where
        F: FnMut(&ProgressReport),
    {
        let started = Instant::now();
        loop {
            if self.cancel.load(Ordering::SeqCst) {
                tracing::debug!(chunks = task.chunks_processed(), "analysis cancelled");
                return Err(AnalysisError::Cancelled {
                    chunks_processed: task.chunks_processed(),
                });
            }
            match task.step()? {
                Step::Continue(progress) => {
                    let elapsed = started.elapsed();
                    on_progress(&ProgressReport {
                        progress,
                        elapsed,
                        estimated_remaining: estimate_remaining(&progress, elapsed),
                    });
                }
                Step::Done(result) => return Ok(*result),
            }
        }
    }
}
