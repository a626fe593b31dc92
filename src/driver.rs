use std::sync::Arc;

use tracing::{debug, info};

use crate::config::ConnectionParams;
use crate::connection::Connection;
use crate::drivers::NullConnection;
use crate::error::{DbalError, Result};
use crate::traits::NativeDriver;

/// How a connection should be produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectMode {
    /// Open a real session through the native driver.
    #[default]
    Live,
    /// Hand out a session whose operations do nothing, for environments
    /// without database access.
    TestOnly,
}

/// Factory producing [`Connection`]s for DB2 for IBM i.
#[derive(Clone)]
pub struct IbmiDriver {
    native: Arc<dyn NativeDriver>,
}

impl IbmiDriver {
    /// Create a driver over a custom native driver.
    /// Useful for testing or alternative call-level interfaces.
    pub fn with_native(native: Arc<dyn NativeDriver>) -> Self {
        Self { native }
    }

    /// Create a driver over the system ODBC driver manager.
    #[cfg(feature = "odbc")]
    pub fn odbc() -> Self {
        Self::with_native(Arc::new(crate::drivers::OdbcDriver))
    }

    /// Open a connection.
    ///
    /// Live sessions have autocommit enabled at the transport; transaction
    /// boundaries are managed above. Any native failure is reported as
    /// [`DbalError::ConnectionFailed`] carrying only the driver's message.
    pub fn connect(&self, params: &ConnectionParams, mode: ConnectMode) -> Result<Connection> {
        if mode == ConnectMode::TestOnly {
            debug!(dsn = params.dsn(), "Handing out test-only connection");
            return Ok(Connection::new(Box::new(NullConnection)));
        }

        let native = self
            .native
            .connect(&params.connection_string(), true)
            .map_err(|e| DbalError::ConnectionFailed(e.message()))?;
        info!(dsn = params.dsn(), "Connected to IBM i");
        Ok(Connection::new(native))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::InMemoryTestDriver;

    #[test]
    fn test_live_connect_enables_autocommit() {
        let native = InMemoryTestDriver::new();
        let driver = IbmiDriver::with_native(Arc::new(native.clone()));

        let conn = driver
            .connect(&ConnectionParams::new("DEV"), ConnectMode::Live)
            .unwrap();

        assert!(!conn.is_closed());
        assert_eq!(native.connection_strings(), vec!["DSN=DEV;".to_string()]);
        assert_eq!(native.autocommit(), Some(true));
    }

    #[test]
    fn test_failed_connect_is_wrapped() {
        let native = InMemoryTestDriver::new()
            .with_connect_error("[IBM][System i Access ODBC Driver] Communication link failure");
        let driver = IbmiDriver::with_native(Arc::new(native));

        let err = driver
            .connect(&ConnectionParams::new("PROD"), ConnectMode::Live)
            .err()
            .unwrap();

        match err {
            DbalError::ConnectionFailed(message) => assert_eq!(
                message,
                "[IBM][System i Access ODBC Driver] Communication link failure"
            ),
            other => panic!("Expected ConnectionFailed, got {:?}", other),
        }
    }

    #[test]
    fn test_test_only_mode_never_touches_native_driver() {
        let native = InMemoryTestDriver::new().with_connect_error("unreachable");
        let driver = IbmiDriver::with_native(Arc::new(native.clone()));

        let mut conn = driver
            .connect(&ConnectionParams::new("PROD"), ConnectMode::TestOnly)
            .unwrap();
        let mut cursor = conn.cursor().unwrap();
        cursor.execute("SELECT * FROM FORM", &[]).unwrap();

        assert!(cursor.fetchall().unwrap().is_empty());
        assert!(native.connection_strings().is_empty());
    }
}
