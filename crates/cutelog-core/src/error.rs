//! Application error types with rich context

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Application error types organized by layer/domain
#[derive(Debug, Error)]
pub enum Error {
    // ─────────────────────────────────────────────────────────────
    // Common/Infrastructure Errors
    // ─────────────────────────────────────────────────────────────
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    // ─────────────────────────────────────────────────────────────
    // Wire Protocol Errors
    // ─────────────────────────────────────────────────────────────
    #[error("Failed to decode record: {message}")]
    Decode { message: String },

    #[error("Control command error: {message}")]
    Control { message: String },

    #[error("Serialization format not supported: {name}")]
    UnsupportedFormat { name: String },

    #[error("Frame of {size} bytes exceeds the {limit} byte limit")]
    FrameTooLarge { size: usize, limit: usize },

    // ─────────────────────────────────────────────────────────────
    // Server Errors
    // ─────────────────────────────────────────────────────────────
    #[error("Could not bind {addr}: {message}")]
    Bind { addr: String, message: String },

    // ─────────────────────────────────────────────────────────────
    // Records / Search Errors
    // ─────────────────────────────────────────────────────────────
    #[error("Records file error ({path}): {message}")]
    RecordsFile { path: PathBuf, message: String },

    #[error("Invalid search pattern: {message}")]
    InvalidPattern { message: String },

    #[error("No such tab: {name}")]
    TabNotFound { name: String },

    #[error("A tab named \"{name}\" already exists")]
    TabNameTaken { name: String },

    // ─────────────────────────────────────────────────────────────
    // Configuration Errors
    // ─────────────────────────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },
}

// ─────────────────────────────────────────────────────────────────
// Convenience Constructors
// ─────────────────────────────────────────────────────────────────

impl Error {
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    pub fn control(message: impl Into<String>) -> Self {
        Self::Control {
            message: message.into(),
        }
    }

    pub fn unsupported_format(name: impl Into<String>) -> Self {
        Self::UnsupportedFormat { name: name.into() }
    }

    pub fn bind(addr: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Bind {
            addr: addr.into(),
            message: message.into(),
        }
    }

    pub fn records_file(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::RecordsFile {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn invalid_pattern(message: impl Into<String>) -> Self {
        Self::InvalidPattern {
            message: message.into(),
        }
    }

    pub fn frame_too_large(size: usize, limit: usize) -> Self {
        Self::FrameTooLarge { size, limit }
    }

    pub fn tab_not_found(name: impl Into<String>) -> Self {
        Self::TabNotFound { name: name.into() }
    }

    pub fn tab_name_taken(name: impl Into<String>) -> Self {
        Self::TabNameTaken { name: name.into() }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Check if this is a recoverable error
    ///
    /// Per-frame and per-command failures never tear down a connection.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::Decode { .. }
                | Error::Control { .. }
                | Error::UnsupportedFormat { .. }
                | Error::FrameTooLarge { .. }
                | Error::InvalidPattern { .. }
                | Error::TabNotFound { .. }
                | Error::TabNameTaken { .. }
        )
    }

    /// Check if this error should abort the operation that raised it
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::Bind { .. } | Error::RecordsFile { .. })
    }
}

// ─────────────────────────────────────────────────────────────────
// Error Context Extensions
// ─────────────────────────────────────────────────────────────────

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context with a closure (lazy evaluation)
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let err = e.into();
            tracing::error!("{}: {:?}", context.into(), err);
            err
        })
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| {
            let err = e.into();
            tracing::error!("{}: {:?}", f(), err);
            err
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_messages() {
        let err = Error::unsupported_format("yaml");
        assert_eq!(err.to_string(), "Serialization format not supported: yaml");

        let err = Error::bind("0.0.0.0:19996", "address in use");
        assert!(err.to_string().contains("0.0.0.0:19996"));
        assert!(err.to_string().contains("address in use"));
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_error_is_fatal() {
        assert!(Error::bind("127.0.0.1:1", "denied").is_fatal());
        assert!(Error::records_file("/tmp/x.json", "denied").is_fatal());
        assert!(!Error::decode("bad pickle").is_fatal());
        assert!(!Error::frame_too_large(100, 10).is_fatal());
    }

    #[test]
    fn test_error_is_recoverable() {
        assert!(Error::decode("truncated").is_recoverable());
        assert!(Error::control("No such command").is_recoverable());
        assert!(Error::unsupported_format("xml").is_recoverable());
        assert!(Error::frame_too_large(100, 10).is_recoverable());
        assert!(!Error::config("unwritable").is_recoverable());
    }

    #[test]
    fn test_records_file_error_mentions_path() {
        let err = Error::records_file("/tmp/out.json", "permission denied");
        assert!(err.to_string().contains("/tmp/out.json"));
        assert!(err.to_string().contains("permission denied"));
    }

    #[test]
    fn test_result_ext_keeps_error() {
        let res: std::result::Result<(), std::io::Error> = Err(std::io::Error::new(
            std::io::ErrorKind::Other,
            "boom",
        ));
        let err = res.context("reading records").unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
