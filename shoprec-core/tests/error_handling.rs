use shoprec_core::{ConfigError, CoreError, ErrorExt, ErrorReporter, UpstreamError};
use std::time::Duration;

fn upstream(error: UpstreamError) -> CoreError {
    CoreError::Upstream(error)
}

#[test]
fn test_codes_follow_the_taxonomy() {
    let cases = [
        (CoreError::Config(ConfigError::EmptyCatalog), "CONFIG"),
        (
            upstream(UpstreamError::InvalidResponse {
                details: "not json".to_string(),
            }),
            "UPSTREAM",
        ),
        (CoreError::product_not_found("p42"), "NOT_FOUND"),
        (CoreError::Timeout { seconds: 60 }, "TIMEOUT"),
        (CoreError::invalid_input("k must be at least 1"), "INVALID_INPUT"),
    ];
    for (error, code) in cases {
        assert_eq!(error.error_code(), code, "{error}");
    }

    assert_eq!(UpstreamError::Cancelled.error_code(), "UPSTREAM_CANCELLED");
    assert_eq!(ConfigError::EmptyCatalog.error_code(), "CONFIG_EMPTY_CATALOG");
}

#[test]
fn test_timeout_is_not_an_upstream_error() {
    let timeout = CoreError::Timeout { seconds: 60 };
    assert!(!matches!(timeout, CoreError::Upstream(_)));
    assert!(timeout.is_retryable());
    assert_eq!(timeout.retry_after(), Some(Duration::from_secs(60)));
    assert!(timeout.to_string().contains("60 seconds"));
}

#[test]
fn test_retry_hints() {
    let network = upstream(UpstreamError::Network {
        details: "connection refused".to_string(),
    });
    assert!(network.is_retryable());
    assert_eq!(network.retry_after(), Some(Duration::from_secs(10)));

    for status in [429, 502, 503] {
        let error = upstream(UpstreamError::HttpStatus {
            status,
            body: String::new(),
        });
        assert!(error.is_retryable(), "status {status}");
    }

    let bad_request = upstream(UpstreamError::HttpStatus {
        status: 400,
        body: "unknown model".to_string(),
    });
    assert!(!bad_request.is_retryable());

    let malformed = upstream(UpstreamError::InvalidResponse {
        details: "missing recommendations".to_string(),
    });
    assert!(!malformed.is_retryable());
    assert_eq!(malformed.retry_after(), None);

    assert!(!upstream(UpstreamError::Cancelled).is_retryable());
    assert!(!CoreError::Config(ConfigError::EmptyCatalog).is_retryable());
}

#[test]
fn test_user_friendly_messages() {
    assert!(CoreError::product_not_found("p42")
        .user_friendly_message()
        .contains("p42"));

    let missing = CoreError::Config(ConfigError::MissingField {
        field: "reranker.model".to_string(),
    });
    assert!(missing.user_friendly_message().contains("reranker.model"));

    let empty = CoreError::Config(ConfigError::EmptyCatalog);
    assert!(empty.user_friendly_message().contains("catalog is empty"));

    let status = upstream(UpstreamError::HttpStatus {
        status: 500,
        body: String::new(),
    });
    assert!(status.user_friendly_message().contains("500"));
}

#[test]
fn test_error_reporter() {
    let error = CoreError::Timeout { seconds: 60 };

    // only checks that reporting never panics, enabled or not
    let reporter = ErrorReporter::default();
    reporter.report_error(&error);
    reporter.report_warning(&error);

    let silent = ErrorReporter::new()
        .with_error_reporting(false)
        .with_warning_reporting(false);
    silent.report_error(&error);
    silent.report_warning(&error);
}
