use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MarketError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("CSV processing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Listing store error during {operation}: {message}")]
    Store { operation: String, message: String },

    #[error("Listing store rejected {operation} with HTTP {status}")]
    StoreRejected { operation: String, status: u16 },

    #[error("Listing store call {operation} timed out after {after:?}")]
    StoreTimeout { operation: String, after: Duration },

    #[error("Invalid coefficient table: {reason}")]
    InvalidTable { reason: String },

    #[error("Validation error on {field}: {message}")]
    Validation { field: String, message: String },

    #[error("Invalid configuration value for {field} ('{value}'): {reason}")]
    InvalidConfigValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing configuration field: {field}")]
    MissingConfig { field: String },

    #[error("Configuration parse error: {message}")]
    ConfigParse { message: String },
}

pub type Result<T> = std::result::Result<T, MarketError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Input,
    Configuration,
    Data,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl MarketError {
    pub fn store(operation: impl Into<String>, message: impl Into<String>) -> Self {
        MarketError::Store {
            operation: operation.into(),
            message: message.into(),
        }
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        MarketError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            MarketError::Http(_)
            | MarketError::Store { .. }
            | MarketError::StoreRejected { .. }
            | MarketError::StoreTimeout { .. } => ErrorCategory::Network,
            MarketError::Validation { .. } => ErrorCategory::Input,
            MarketError::InvalidConfigValue { .. }
            | MarketError::MissingConfig { .. }
            | MarketError::ConfigParse { .. }
            | MarketError::InvalidTable { .. } => ErrorCategory::Configuration,
            MarketError::Serialization(_) | MarketError::Csv(_) => ErrorCategory::Data,
            MarketError::Io(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Network => ErrorSeverity::Medium,
            ErrorCategory::Input | ErrorCategory::Data => ErrorSeverity::High,
            ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    /// Transient failures may succeed on retry; a "not found" is never one.
    pub fn is_transient(&self) -> bool {
        match self {
            MarketError::StoreTimeout { .. } | MarketError::Store { .. } => true,
            MarketError::Http(err) => {
                err.is_timeout() || err.is_connect() || err.status().is_some_and(|s| s.is_server_error())
            }
            _ => false,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Network => "Check that the listing service is reachable and retry",
            ErrorCategory::Input => "Check the request values: value must be positive, age between 20 and 100",
            ErrorCategory::Configuration => "Review the configuration file and command-line overrides",
            ErrorCategory::Data => "Check the input file format and encoding",
            ErrorCategory::System => "Check file permissions and available disk space",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            MarketError::Store { .. } | MarketError::StoreTimeout { .. } | MarketError::Http(_) => {
                format!("Listing service unavailable: {}", self)
            }
            MarketError::StoreRejected { status, .. } => {
                format!("Listing service refused the request (HTTP {})", status)
            }
            MarketError::Validation { field, message } => {
                format!("Invalid input '{}': {}", field, message)
            }
            MarketError::MissingConfig { field } => {
                format!("Configuration is missing '{}'", field)
            }
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_errors_are_transient_network_failures() {
        let err = MarketError::store("get_listing", "503 Service Unavailable");
        assert!(err.is_transient());
        assert_eq!(err.category(), ErrorCategory::Network);
        assert_eq!(err.severity(), ErrorSeverity::Medium);
    }

    #[test]
    fn rejected_requests_are_not_retried() {
        let err = MarketError::StoreRejected {
            operation: "listing".to_string(),
            status: 400,
        };
        assert!(!err.is_transient());
        assert_eq!(err.category(), ErrorCategory::Network);
    }

    #[test]
    fn validation_errors_are_not_transient() {
        let err = MarketError::validation("beneficiaryAge", "expected an integer");
        assert!(!err.is_transient());
        assert_eq!(err.severity(), ErrorSeverity::High);
        assert!(err.user_friendly_message().contains("beneficiaryAge"));
    }
}
