use thiserror::Error;

/// Unified error type for all spelunker operations
#[derive(Error, Debug)]
pub enum SpelunkerError {
    /// Record, document or scheme absent
    #[error("Not found: {0}")]
    NotFound(String),

    /// Operation not supported by this backend
    #[error("Not implemented: {0}")]
    NotImplemented(String),

    /// Scroll context lapsed, pagination must restart from the first page
    #[error("Query cursor has expired: {0}")]
    CursorExpired(String),

    /// Unsupported filter or facet, malformed pagination token, bad parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Invalid or incomplete backend configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Wrapped driver, network or I/O failure
    #[error("Backend error: {0}")]
    Backend(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl SpelunkerError {
    /// Create a "not found" error with custom message
    pub fn not_found(msg: impl Into<String>) -> Self {
        SpelunkerError::NotFound(msg.into())
    }

    /// Create a "not implemented" error naming the unsupported operation
    pub fn not_implemented(msg: impl Into<String>) -> Self {
        SpelunkerError::NotImplemented(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        SpelunkerError::InvalidInput(msg.into())
    }

    /// Create an invalid configuration error
    pub fn invalid_configuration(msg: impl Into<String>) -> Self {
        SpelunkerError::InvalidConfiguration(msg.into())
    }

    /// Wrap a lower level error, e.g. `SpelunkerError::backend("Failed to count descendants", e)`
    pub fn backend(context: &str, err: impl std::fmt::Display) -> Self {
        SpelunkerError::Backend(format!("{}: {}", context, err))
    }

    /// Prefix the message with operation context. The error kind is preserved.
    pub fn with_context(self, context: impl std::fmt::Display) -> Self {
        match self {
            SpelunkerError::NotFound(m) => SpelunkerError::NotFound(format!("{}: {}", context, m)),
            SpelunkerError::NotImplemented(m) => {
                SpelunkerError::NotImplemented(format!("{}: {}", context, m))
            }
            SpelunkerError::CursorExpired(m) => {
                SpelunkerError::CursorExpired(format!("{}: {}", context, m))
            }
            SpelunkerError::InvalidInput(m) => {
                SpelunkerError::InvalidInput(format!("{}: {}", context, m))
            }
            SpelunkerError::InvalidConfiguration(m) => {
                SpelunkerError::InvalidConfiguration(format!("{}: {}", context, m))
            }
            SpelunkerError::Backend(m) => SpelunkerError::Backend(format!("{}: {}", context, m)),
            SpelunkerError::Serialization(m) => {
                SpelunkerError::Serialization(format!("{}: {}", context, m))
            }
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, SpelunkerError::NotFound(_))
    }

    pub fn is_not_implemented(&self) -> bool {
        matches!(self, SpelunkerError::NotImplemented(_))
    }

    pub fn is_cursor_expired(&self) -> bool {
        matches!(self, SpelunkerError::CursorExpired(_))
    }
}

impl From<serde_json::Error> for SpelunkerError {
    fn from(err: serde_json::Error) -> Self {
        SpelunkerError::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, SpelunkerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_context_preserves_kind() {
        let err = SpelunkerError::CursorExpired("scroll abc".to_string())
            .with_context("Failed to get descendants of 85633793");

        assert!(err.is_cursor_expired());
        assert_eq!(
            err.to_string(),
            "Query cursor has expired: Failed to get descendants of 85633793: scroll abc"
        );
    }

    #[test]
    fn test_backend_wraps_message() {
        let err = SpelunkerError::backend("Failed to count rows", "connection reset");
        assert_eq!(err.to_string(), "Backend error: Failed to count rows: connection reset");
    }
}
