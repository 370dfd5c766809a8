//! Error types for multi-mapper rescue.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for rescue operations
pub type Result<T> = std::result::Result<T, RescueError>;

/// Errors raised while loading records or weighting candidates.
///
/// Every variant is fatal: the run stops and the binary exits non-zero.
#[derive(Debug, Error)]
pub enum RescueError {
    /// Invalid option value, detected before any record is read
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// Input file missing or unreadable
    #[error("Cannot read input '{}': {source}", path.display())]
    InputAccess {
        /// Path that failed to open
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// A row that cannot be turned into a record
    #[error("Malformed record at line {line}: {reason}")]
    MalformedRecord {
        /// 1-based line number in the input
        line: usize,
        /// What was wrong with the row
        reason: String,
    },

    /// IO error while reading records or writing rows
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl RescueError {
    pub(crate) fn malformed(line: usize, reason: impl Into<String>) -> Self {
        RescueError::MalformedRecord {
            line,
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_message() {
        let error = RescueError::malformed(7, "unrecognised strand 'x'");
        let msg = format!("{error}");
        assert!(msg.contains("line 7"));
        assert!(msg.contains("unrecognised strand 'x'"));
    }

    #[test]
    fn test_input_access_message() {
        let error = RescueError::InputAccess {
            path: PathBuf::from("/no/such/file.tsv"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        };
        let msg = format!("{error}");
        assert!(msg.contains("/no/such/file.tsv"));
        assert!(msg.contains("not found"));
    }
}
