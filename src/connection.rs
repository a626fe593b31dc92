use tracing::info;

use crate::error::{DbalError, ErrorKind, Result};
use crate::traits::{NativeConnection, NativeCursor};

/// Exclusive owner of one native session.
///
/// Errors from the driver are returned unchanged; there is no retry or
/// reconnect. After [`Connection::close`] every operation fails with an
/// `Interface` error.
pub struct Connection {
    native: Option<Box<dyn NativeConnection>>,
}

impl Connection {
    pub fn new(native: Box<dyn NativeConnection>) -> Self {
        Self {
            native: Some(native),
        }
    }

    fn native(&mut self) -> Result<&mut Box<dyn NativeConnection>> {
        self.native
            .as_mut()
            .ok_or_else(|| DbalError::database(ErrorKind::Interface, "connection is closed"))
    }

    /// Allocate a native cursor on this session.
    pub fn cursor(&mut self) -> Result<Box<dyn NativeCursor>> {
        self.native()?.cursor()
    }

    pub fn commit(&mut self) -> Result<()> {
        self.native()?.commit()
    }

    pub fn rollback(&mut self) -> Result<()> {
        self.native()?.rollback()
    }

    pub fn set_autocommit(&mut self, autocommit: bool) -> Result<()> {
        self.native()?.set_autocommit(autocommit)
    }

    /// Close the session. Closing twice is a no-op.
    pub fn close(&mut self) -> Result<()> {
        match self.native.take() {
            Some(mut native) => {
                native.close()?;
                info!("Connection closed");
                Ok(())
            }
            None => Ok(()),
        }
    }

    pub fn is_closed(&self) -> bool {
        self.native.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::InMemoryTestDriver;

    #[test]
    fn test_operations_reach_native_session() {
        let driver = InMemoryTestDriver::new();
        let mut conn = Connection::new(Box::new(driver.connection()));

        conn.commit().unwrap();
        conn.rollback().unwrap();
        conn.set_autocommit(false).unwrap();
        conn.cursor().unwrap().execute("SELECT 1 FROM SYSIBM.SYSDUMMY1", &[]).unwrap();

        assert_eq!(driver.commit_count(), 1);
        assert_eq!(driver.rollback_count(), 1);
        assert_eq!(driver.autocommit(), Some(false));
        driver.assert_query_count(1);
    }

    #[test]
    fn test_closed_connection_rejects_operations() {
        let driver = InMemoryTestDriver::new();
        let mut conn = Connection::new(Box::new(driver.connection()));

        conn.close().unwrap();
        conn.close().unwrap();
        assert!(conn.is_closed());
        assert_eq!(driver.close_count(), 1);

        let err = conn.commit().unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::Interface));
        assert!(conn.cursor().is_err());
    }
}
