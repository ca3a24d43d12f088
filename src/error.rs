//! Spegil error types

/// Spegil error types.
///
/// Every variant carries owned string/status payloads so the enum is
/// `Clone`: a single-flight fetch shares its failure with all waiters,
/// and each waiter receives its own copy of the same error.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    /// Request path is malformed or attempts to escape the cache root.
    /// Rejected before any disk or network I/O.
    #[error("invalid cache path: {0}")]
    InvalidPath(String),

    /// The origin answered with a non-success status.
    #[error("origin returned {status}: {message}")]
    UpstreamStatus { status: u16, message: String },

    /// The origin could not be reached (connect, transport, timeout).
    #[error("origin unreachable: {0}")]
    Upstream(String),

    /// Local cache read or write failed. Reported, never fatal; a failed
    /// fill leaves no file behind, so later requests retry from scratch.
    #[error("cache storage error: {0}")]
    Storage(String),

    // Startup-only errors
    #[error("configuration error: {0}")]
    Configuration(String),
}

/// Result type alias for Spegil operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_are_cloneable_for_flight_fanout() {
        let err = Error::UpstreamStatus {
            status: 503,
            message: "origin down".to_string(),
        };
        let copy = err.clone();
        assert_eq!(err.to_string(), copy.to_string());
    }

    #[test]
    fn display_includes_detail() {
        let err = Error::InvalidPath("../secret".to_string());
        assert!(err.to_string().contains("../secret"));

        let err = Error::Storage("disk full".to_string());
        assert!(err.to_string().contains("disk full"));
    }
}
