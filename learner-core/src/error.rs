//! Error types for learner storage and request handling

use thiserror::Error;

/// Result type for learner operations
pub type LearnerResult<T> = Result<T, LearnerError>;

/// Error code carried by [`LearnerError::InvalidConfiguration`]
pub const INVALID_CONFIGURATION_CODE: &str = "INVALID_CONFIGURATION";

/// Error types for learner operations
#[derive(Error, Debug)]
pub enum LearnerError {
    /// Declared connection parameters exist but none of them are usable
    #[error("Invalid configuration [{code}]: {message}")]
    InvalidConfiguration { code: &'static str, message: String },

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("User directory error: {0}")]
    UserDirectory(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl LearnerError {
    /// Create the fatal error raised when every declared endpoint failed
    pub fn invalid_configuration<S: Into<String>>(message: S) -> Self {
        Self::InvalidConfiguration {
            code: INVALID_CONFIGURATION_CODE,
            message: message.into(),
        }
    }

    /// Create a new configuration error
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration(message.into())
    }

    /// Create a new connection error
    pub fn connection<S: Into<String>>(message: S) -> Self {
        Self::Connection(message.into())
    }

    /// Create a new user directory error
    pub fn user_directory<S: Into<String>>(message: S) -> Self {
        Self::UserDirectory(message.into())
    }

    /// Check if this is a retriable error
    pub fn is_retriable(&self) -> bool {
        matches!(self, LearnerError::Connection(_) | LearnerError::Io(_))
    }

    /// Fixed error code surfaced to API callers
    pub fn error_code(&self) -> &'static str {
        match self {
            LearnerError::InvalidConfiguration { code, .. } => *code,
            LearnerError::Configuration(_) | LearnerError::Yaml(_) => "CONFIGURATION_ERROR",
            LearnerError::Connection(_) => "DB_CONNECTION_ERROR",
            LearnerError::UserDirectory(_) => "USER_DIRECTORY_ERROR",
            LearnerError::Io(_) => "SERVER_ERROR",
        }
    }

    /// Get the error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            LearnerError::InvalidConfiguration { .. } => "invalid_configuration",
            LearnerError::Configuration(_) => "configuration",
            LearnerError::Connection(_) => "connection",
            LearnerError::UserDirectory(_) => "user_directory",
            LearnerError::Io(_) => "io",
            LearnerError::Yaml(_) => "yaml",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_configuration_carries_fixed_code() {
        let err = LearnerError::invalid_configuration("no endpoint reachable");
        assert_eq!(err.error_code(), INVALID_CONFIGURATION_CODE);
        assert_eq!(err.category(), "invalid_configuration");
        assert!(!err.is_retriable());
        assert!(err.to_string().contains("no endpoint reachable"));
    }

    #[test]
    fn test_connection_errors_are_retriable() {
        assert!(LearnerError::connection("refused").is_retriable());
        assert!(!LearnerError::configuration("bad mode").is_retriable());
        assert_eq!(LearnerError::connection("refused").category(), "connection");
    }

    #[test]
    fn test_io_errors_convert() {
        fn read(path: &str) -> LearnerResult<String> {
            Ok(std::fs::read_to_string(path)?)
        }

        let err = read("/nonexistent/dbconfig.yaml").unwrap_err();
        assert!(matches!(err, LearnerError::Io(_)));
        assert_eq!(err.category(), "io");
        assert_eq!(err.error_code(), "SERVER_ERROR");
        assert!(err.is_retriable());
    }
}
