pub mod error;
pub mod patterns;
pub mod format;
pub mod record;
pub mod parser;
pub mod masking;
pub mod sampler;
pub mod anomaly;
pub mod aggregate;
pub mod pipeline;
pub mod chunking;

pub use aggregate::{analyze, AnalysisResult, Aggregations};
pub use chunking::{AnalysisTask, ChunkPolicy, Progress, ProgressReport, Scheduler, Step};
pub use error::{validate_input, AnalysisError};
pub use format::{detect_format, LogFormat};
pub use pipeline::{parse, parse_lines, AnalyzeOpts};
pub use record::{AnomalyAnnotation, AnomalyKind, LogRecord, Severity};
pub use sampler::SamplingInfo;

#[cfg(test)]
mod patterns_tests;
