//! Structured error types for birthorder-core.
//!
//! Library errors are `thiserror` enums so the HTTP layer can map each
//! category to a status code. Binary crates wrap them in `anyhow`.

use thiserror::Error;

/// Submission rejected before anything was stored.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// One or more required fields were absent or falsy
    #[error("Missing required fields: {}", .fields.join(", "))]
    Missing { fields: Vec<&'static str> },

    /// Fields were present but violated a type, range or enum constraint
    #[error("Validation error: {}", .violations.join("; "))]
    Invalid { violations: Vec<String> },
}

impl ValidationError {
    /// Short summary suitable for an `error` field.
    pub fn summary(&self) -> String {
        match self {
            Self::Missing { .. } => self.to_string(),
            Self::Invalid { .. } => "Validation error".to_string(),
        }
    }

    /// Every individual problem, one entry per missing field or violation.
    pub fn details(&self) -> Vec<String> {
        match self {
            Self::Missing { fields } => fields.iter().map(|f| f.to_string()).collect(),
            Self::Invalid { violations } => violations.clone(),
        }
    }
}

/// CSV export could not produce output.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExportError {
    #[error("No data to export")]
    NoData,
}
