use thiserror::Error;

#[derive(Error, Debug)]
pub enum TermsyncError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Translation service error: {0}")]
    Service(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Operation cancelled")]
    Cancelled,

    /// Failure of a public operation. The message names the operation only;
    /// the underlying fault is kept as the source.
    #[error("{operation} failed")]
    Operation {
        operation: &'static str,
        #[source]
        source: Box<TermsyncError>,
    },
}

impl TermsyncError {
    /// Wrap a fault as the failure of `operation`, recording the cause to the log.
    ///
    /// Validation and cancellation pass through untouched so callers can still
    /// tell bad input apart from a failed call.
    pub fn operation(operation: &'static str, source: TermsyncError) -> Self {
        match source {
            TermsyncError::Validation(_) | TermsyncError::Cancelled => source,
            TermsyncError::Operation { .. } => source,
            other => {
                tracing::error!(operation, error = %other, "operation failed");
                TermsyncError::Operation {
                    operation,
                    source: Box::new(other),
                }
            }
        }
    }

    /// Innermost error, unwrapping any operation layers.
    pub fn root_cause(&self) -> &TermsyncError {
        match self {
            TermsyncError::Operation { source, .. } => source.root_cause(),
            other => other,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self.root_cause(), TermsyncError::NotFound(_))
    }
}

pub type Result<T> = std::result::Result<T, TermsyncError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_operation_error_hides_detail_in_message() {
        let err = TermsyncError::operation(
            "save dictionary",
            TermsyncError::Storage("access denied for bucket".to_string()),
        );

        assert_eq!(err.to_string(), "save dictionary failed");
        assert!(matches!(err.root_cause(), TermsyncError::Storage(_)));
        assert!(err.source().is_some());
    }

    #[test]
    fn test_validation_passes_through() {
        let err = TermsyncError::operation(
            "translate text",
            TermsyncError::Validation("text must not be empty".to_string()),
        );

        assert!(matches!(err, TermsyncError::Validation(_)));
    }

    #[test]
    fn test_nested_operation_is_not_rewrapped() {
        let inner = TermsyncError::operation(
            "load dictionary",
            TermsyncError::NotFound("s3://bucket/key".to_string()),
        );
        let outer = TermsyncError::operation("sync terminology", inner);

        assert_eq!(outer.to_string(), "load dictionary failed");
        assert!(outer.is_not_found());
    }
}
