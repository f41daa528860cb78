//! Tests for error handling

use pipwatch_foundation::error::{PipwatchError, PipwatchResult};
use std::io;

#[test]
fn test_error_chain() {
    fn inner_function() -> Result<(), io::Error> {
        Err(io::Error::new(
            io::ErrorKind::PermissionDenied,
            "Access denied",
        ))
    }

    fn outer_function() -> PipwatchResult<()> {
        inner_function()?;
        Ok(())
    }

    let error = outer_function().unwrap_err();
    match error {
        PipwatchError::Io {
            source: Some(io_error),
            path: None,
            ..
        } => {
            assert_eq!(io_error.kind(), io::ErrorKind::PermissionDenied);
        }
        other => panic!("Expected IO error, got {other:?}"),
    }
}

#[test]
fn test_io_at_records_path() {
    let err = PipwatchError::io_at(
        "/tmp/missing.py",
        io::Error::new(io::ErrorKind::NotFound, "gone"),
    );
    let message = err.to_string();
    assert!(message.contains("/tmp/missing.py"));
    assert!(message.contains("gone"));
}

#[test]
fn test_error_helpers() {
    match PipwatchError::not_found("requirements.txt") {
        PipwatchError::NotFound { resource } => assert_eq!(resource, "requirements.txt"),
        _ => panic!("Expected not found error"),
    }

    match PipwatchError::install("pillow", "exit status 1") {
        PipwatchError::Install { package, message } => {
            assert_eq!(package, "pillow");
            assert_eq!(message, "exit status 1");
        }
        _ => panic!("Expected install error"),
    }

    let config = PipwatchError::config("Invalid timeout");
    assert_eq!(config.to_string(), "Configuration error: Invalid timeout");
}

#[test]
fn test_error_implements_std_error() {
    use std::error::Error;

    let error = PipwatchError::internal("test");
    assert!(error.source().is_none());

    let json_error = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
    let error: PipwatchError = json_error.into();
    assert!(error.source().is_some());
    assert!(error.to_string().starts_with("JSON serialization"));
}
