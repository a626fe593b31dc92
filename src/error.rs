use std::fmt;

use thiserror::Error;

/// Error categories of the native call-level interface, re-exposed so
/// callers can match on them without knowing which driver produced them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Error,
    Warning,
    Interface,
    Database,
    Data,
    Operational,
    Integrity,
    Internal,
    Programming,
    NotSupported,
}

impl ErrorKind {
    /// Classifies a SQLSTATE by its two-character class.
    pub fn from_sqlstate(state: &str) -> Self {
        if state == "HYC00" || state == "IM001" {
            return ErrorKind::NotSupported;
        }
        match state.get(..2) {
            Some("01") => ErrorKind::Warning,
            Some("08") => ErrorKind::Operational,
            Some("22") => ErrorKind::Data,
            Some("23") => ErrorKind::Integrity,
            Some("40") => ErrorKind::Operational,
            Some("42") => ErrorKind::Programming,
            Some("HY") | Some("IM") => ErrorKind::Interface,
            Some("XX") => ErrorKind::Internal,
            _ => ErrorKind::Database,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Error => "Error",
            ErrorKind::Warning => "Warning",
            ErrorKind::Interface => "InterfaceError",
            ErrorKind::Database => "DatabaseError",
            ErrorKind::Data => "DataError",
            ErrorKind::Operational => "OperationalError",
            ErrorKind::Integrity => "IntegrityError",
            ErrorKind::Internal => "InternalError",
            ErrorKind::Programming => "ProgrammingError",
            ErrorKind::NotSupported => "NotSupportedError",
        };
        f.write_str(name)
    }
}

/// Error type for ibmi-dbal operations
#[derive(Debug, Error)]
pub enum DbalError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// A failure reported by the native driver, passed through as-is.
    #[error("{kind}: {message}")]
    Database { kind: ErrorKind, message: String },

    #[error("Statement has {placeholders} placeholder(s) but {params} parameter(s)")]
    ParameterMismatch { placeholders: usize, params: usize },

    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    #[error("'{name}' is not registered; available: {}", .available.join(", "))]
    NotRegistered { name: String, available: Vec<String> },

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl DbalError {
    pub fn database(kind: ErrorKind, message: impl Into<String>) -> Self {
        DbalError::Database {
            kind,
            message: message.into(),
        }
    }

    /// The native category of this error, if it came from the driver.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            DbalError::Database { kind, .. } => Some(*kind),
            DbalError::ConnectionFailed(_) => Some(ErrorKind::Operational),
            DbalError::ParameterMismatch { .. } => Some(ErrorKind::Programming),
            _ => None,
        }
    }

    /// The bare driver message without the category prefix.
    pub fn message(&self) -> String {
        match self {
            DbalError::Database { message, .. } => message.clone(),
            DbalError::ConnectionFailed(message) => message.clone(),
            other => other.to_string(),
        }
    }
}

/// Result type alias for ibmi-dbal operations
pub type Result<T> = std::result::Result<T, DbalError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sqlstate_classes() {
        assert_eq!(ErrorKind::from_sqlstate("23505"), ErrorKind::Integrity);
        assert_eq!(ErrorKind::from_sqlstate("42704"), ErrorKind::Programming);
        assert_eq!(ErrorKind::from_sqlstate("22001"), ErrorKind::Data);
        assert_eq!(ErrorKind::from_sqlstate("08001"), ErrorKind::Operational);
        assert_eq!(ErrorKind::from_sqlstate("HYC00"), ErrorKind::NotSupported);
        assert_eq!(ErrorKind::from_sqlstate("57011"), ErrorKind::Database);
    }

    #[test]
    fn test_not_registered_lists_keys() {
        let err = DbalError::NotRegistered {
            name: "oracle".to_string(),
            available: vec!["ibmi".to_string(), "memory".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "'oracle' is not registered; available: ibmi, memory"
        );
    }

    #[test]
    fn test_database_error_message() {
        let err = DbalError::database(ErrorKind::Integrity, "duplicate key");
        assert_eq!(err.to_string(), "IntegrityError: duplicate key");
        assert_eq!(err.message(), "duplicate key");
        assert_eq!(err.kind(), Some(ErrorKind::Integrity));
    }
}
