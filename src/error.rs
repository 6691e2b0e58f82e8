//! Error types for the reconciliation service.

use loc_suggest::ReconcileError;

/// Top-level error type for the service process.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Configuration file could not be parsed or failed validation.
    #[error("config error: {0}")]
    Config(String),

    /// HTTP listener error (bind, serve).
    #[error("server error: {0}")]
    Server(String),

    /// Error from the matching core.
    #[error(transparent)]
    Reconcile(#[from] ReconcileError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_config() {
        let err = ServiceError::Config("expected a table".into());
        assert_eq!(err.to_string(), "config error: expected a table");
    }

    #[test]
    fn reconcile_errors_pass_through() {
        let err: ServiceError = ReconcileError::Config("max_candidates must be greater than 0".into()).into();
        assert_eq!(err.to_string(), "config error: max_candidates must be greater than 0");
    }

    #[test]
    fn io_errors_convert() {
        let err: ServiceError = std::io::Error::new(std::io::ErrorKind::AddrInUse, "port taken").into();
        assert!(err.to_string().starts_with("I/O error"));
    }
}
