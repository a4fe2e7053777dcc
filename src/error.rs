//! Error types for Parlor.

use thiserror::Error;

/// Common error type for Parlor.
#[derive(Error, Debug)]
pub enum ParlorError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Fatal listener setup failure (bind/listen).
    #[error("failed to bind listener: {0}")]
    Bind(String),

    /// Configuration parse or validation error.
    #[error("configuration error: {0}")]
    Config(String),

    /// A non-fatal protocol anomaly, retained for diagnostics.
    ///
    /// The parser and negotiation engine never return this as a control-flow
    /// error; they log and reset instead. This variant exists for callers
    /// (tests, demo apps) that want to observe an anomaly as a value rather
    /// than a log line.
    #[error("protocol anomaly: {0}")]
    Protocol(String),
}

/// Result type alias for Parlor operations.
pub type Result<T> = std::result::Result<T, ParlorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bind_error_display() {
        let err = ParlorError::Bind("address in use".to_string());
        assert_eq!(err.to_string(), "failed to bind listener: address in use");
    }

    #[test]
    fn test_config_error_display() {
        let err = ParlorError::Config("bad toml".to_string());
        assert_eq!(err.to_string(), "configuration error: bad toml");
    }

    #[test]
    fn test_protocol_error_display() {
        let err = ParlorError::Protocol("bad NAWS length".to_string());
        assert_eq!(err.to_string(), "protocol anomaly: bad NAWS length");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: ParlorError = io_err.into();
        assert!(matches!(err, ParlorError::Io(_)));
        assert!(err.to_string().contains("gone"));
    }
}
