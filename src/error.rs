//! Error types for deseq_report

use thiserror::Error;

/// Main error type for differential expression reporting
///
/// Unmatched annotation rows are not an error: they surface as null
/// display name / biotype on the joined result.
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Schema error: {reason}")]
    Schema { reason: String },

    #[error("Ambiguous row key '{key}': maps to {candidates:?}")]
    IdentifierAmbiguity { key: String, candidates: Vec<String> },

    #[error("Group '{group}' has no samples after assignment")]
    EmptyGroup { group: String },

    #[error("Invalid parameter: {reason}")]
    InvalidParameter { reason: String },

    #[error("Dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: String, got: String },

    #[error("Empty data: {reason}")]
    EmptyData { reason: String },

    #[error("Invalid input: {reason}")]
    InvalidInput { reason: String },

    #[error("Size factor estimation failed: {reason}")]
    SizeFactorFailed { reason: String },

    #[error("Failed to write {} artifact(s): {}", .failed.len(), format_failures(.failed))]
    ArtifactWrite { failed: Vec<(String, String)> },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("CSV parsing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),
}

fn format_failures(failed: &[(String, String)]) -> String {
    failed
        .iter()
        .map(|(artifact, reason)| format!("{} ({})", artifact, reason))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Result type alias for reporting operations
pub type Result<T> = std::result::Result<T, ReportError>;
