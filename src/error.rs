use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AnalysisError {
    #[error("no log data to analyze")]
    EmptyInput,
    #[error("analysis cancelled after {chunks_processed} chunks")]
    Cancelled { chunks_processed: usize },
    #[error("analysis task already produced its result")]
    TaskFinished,
}

pub type Result<T> = std::result::Result<T, AnalysisError>;

/// Rejects blank input before any pipeline work starts.
pub fn validate_input(text: &str) -> Result<&str> {
    if text.trim().is_empty() {
        return Err(AnalysisError::EmptyInput);
    }
    Ok(text)
}
