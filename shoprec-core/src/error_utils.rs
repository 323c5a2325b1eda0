use crate::error::*;
use std::fmt::Display;
use std::time::Duration;
use tracing::{error, warn};

/// Reporting metadata shared by the error enums.
///
/// `is_retryable` and `retry_after` are hints for callers. Nothing in the
/// workspace retries on its own.
pub trait ErrorExt: Display {
    /// Stable machine-readable code, e.g. `"TIMEOUT"`.
    fn error_code(&self) -> &'static str;

    fn user_friendly_message(&self) -> String;

    fn is_retryable(&self) -> bool {
        false
    }

    fn retry_after(&self) -> Option<Duration> {
        None
    }

    fn log_error(&self) -> &Self
    where
        Self: Sized,
    {
        error!(code = self.error_code(), "{}", self);
        self
    }

    fn log_warn(&self) -> &Self
    where
        Self: Sized,
    {
        warn!(code = self.error_code(), "{}", self);
        self
    }
}

impl ErrorExt for CoreError {
    fn error_code(&self) -> &'static str {
        match self {
            CoreError::Config(_) => "CONFIG",
            CoreError::Upstream(_) => "UPSTREAM",
            CoreError::Io(_) => "IO",
            CoreError::Serialization(_) => "SERIALIZATION",
            CoreError::InvalidInput { .. } => "INVALID_INPUT",
            CoreError::Timeout { .. } => "TIMEOUT",
            CoreError::NotFound { .. } => "NOT_FOUND",
        }
    }

    fn user_friendly_message(&self) -> String {
        match self {
            CoreError::Config(e) => e.user_friendly_message(),
            CoreError::Upstream(e) => e.user_friendly_message(),
            CoreError::Io(e) => format!("Could not read data: {e}"),
            CoreError::Serialization(_) => "Data file is not valid JSON.".to_string(),
            CoreError::InvalidInput { message } => format!("Invalid input: {message}"),
            CoreError::Timeout { seconds } => format!(
                "The re-ranking service did not answer within {seconds} seconds. Try again later."
            ),
            CoreError::NotFound { resource } => format!("Could not find {resource}."),
        }
    }

    fn is_retryable(&self) -> bool {
        match self {
            CoreError::Upstream(e) => e.is_retryable(),
            CoreError::Timeout { .. } | CoreError::Io(_) => true,
            _ => false,
        }
    }

    fn retry_after(&self) -> Option<Duration> {
        match self {
            CoreError::Timeout { seconds } => Some(Duration::from_secs(*seconds)),
            CoreError::Upstream(e) => e.retry_after(),
            CoreError::Io(_) => Some(Duration::from_secs(5)),
            _ => None,
        }
    }
}

impl ErrorExt for UpstreamError {
    fn error_code(&self) -> &'static str {
        match self {
            UpstreamError::HttpStatus { .. } => "UPSTREAM_HTTP_STATUS",
            UpstreamError::Network { .. } => "UPSTREAM_NETWORK",
            UpstreamError::InvalidResponse { .. } => "UPSTREAM_INVALID_RESPONSE",
            UpstreamError::Cancelled => "UPSTREAM_CANCELLED",
        }
    }

    fn user_friendly_message(&self) -> String {
        match self {
            UpstreamError::HttpStatus { status, .. } => {
                format!("The re-ranking service failed with HTTP status {status}.")
            }
            UpstreamError::Network { .. } => {
                "Could not reach the re-ranking service. Is it running?".to_string()
            }
            UpstreamError::InvalidResponse { .. } => {
                "The re-ranking service returned an unusable answer.".to_string()
            }
            UpstreamError::Cancelled => "The request was cancelled.".to_string(),
        }
    }

    /// Connection problems, 5xx and 429 may clear up on their own.
    fn is_retryable(&self) -> bool {
        match self {
            UpstreamError::Network { .. } => true,
            UpstreamError::HttpStatus { status, .. } => *status == 429 || *status >= 500,
            UpstreamError::InvalidResponse { .. } | UpstreamError::Cancelled => false,
        }
    }

    fn retry_after(&self) -> Option<Duration> {
        self.is_retryable().then(|| Duration::from_secs(10))
    }
}

impl ErrorExt for ConfigError {
    fn error_code(&self) -> &'static str {
        match self {
            ConfigError::EmptyCatalog => "CONFIG_EMPTY_CATALOG",
            ConfigError::FileNotFound { .. } => "CONFIG_FILE_NOT_FOUND",
            ConfigError::MissingField { .. } => "CONFIG_MISSING_FIELD",
            ConfigError::InvalidValue { .. } => "CONFIG_INVALID_VALUE",
            ConfigError::ValidationFailed { .. } => "CONFIG_VALIDATION_FAILED",
            ConfigError::Parse(_) => "CONFIG_PARSE_ERROR",
        }
    }

    fn user_friendly_message(&self) -> String {
        match self {
            ConfigError::EmptyCatalog => {
                "The product catalog is empty. Load at least one product.".to_string()
            }
            ConfigError::FileNotFound { path } => format!("Configuration file '{path}' not found."),
            ConfigError::MissingField { field } => {
                format!("Configuration is missing required field '{field}'.")
            }
            ConfigError::InvalidValue { field, value } => {
                format!("'{value}' is not a valid value for '{field}'.")
            }
            ConfigError::ValidationFailed { reason } => format!("Configuration is invalid: {reason}"),
            ConfigError::Parse(e) => format!("Configuration file is not valid TOML: {e}"),
        }
    }
}

/// Logs errors for the command-line user: the error itself, its code, the
/// friendly message and a retry hint when there is one.
#[derive(Debug, Clone, Copy)]
pub struct ErrorReporter {
    report_errors: bool,
    report_warnings: bool,
}

impl ErrorReporter {
    pub fn new() -> Self {
        Self {
            report_errors: true,
            report_warnings: true,
        }
    }

    pub fn with_error_reporting(mut self, enabled: bool) -> Self {
        self.report_errors = enabled;
        self
    }

    pub fn with_warning_reporting(mut self, enabled: bool) -> Self {
        self.report_warnings = enabled;
        self
    }

    pub fn report_error(&self, error: &CoreError) {
        if !self.report_errors {
            return;
        }
        error.log_error();
        match error.retry_after() {
            Some(delay) if error.is_retryable() => error!(
                code = error.error_code(),
                "{} (retry in {:?})",
                error.user_friendly_message(),
                delay
            ),
            _ => error!(code = error.error_code(), "{}", error.user_friendly_message()),
        }
    }

    pub fn report_warning(&self, error: &CoreError) {
        if self.report_warnings {
            error.log_warn();
        }
    }
}

impl Default for ErrorReporter {
    fn default() -> Self {
        Self::new()
    }
}
