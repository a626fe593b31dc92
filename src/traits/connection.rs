use crate::error::Result;
use crate::traits::NativeCursor;

/// A physical database session owned by a native driver.
pub trait NativeConnection {
    /// Allocate a new statement handle on this session.
    fn cursor(&self) -> Result<Box<dyn NativeCursor>>;

    fn commit(&mut self) -> Result<()>;

    fn rollback(&mut self) -> Result<()>;

    /// Release the session. Further calls may fail.
    fn close(&mut self) -> Result<()>;

    fn set_autocommit(&mut self, autocommit: bool) -> Result<()>;
}
