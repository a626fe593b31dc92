use crate::error::Result;
use crate::traits::NativeConnection;

/// Trait for native call-level driver implementations.
/// Drivers are responsible for:
/// - Opening a physical session from a connection string
/// - Applying the transport-level autocommit flag
pub trait NativeDriver: Send + Sync {
    /// Open a session. `connection_string` is in ODBC attribute form
    /// (`DSN=...;UID=...;`).
    fn connect(&self, connection_string: &str, autocommit: bool)
        -> Result<Box<dyn NativeConnection>>;
}
