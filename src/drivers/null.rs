use crate::error::Result;
use crate::traits::{NativeConnection, NativeCursor};
use crate::types::{Row, SqlValue};

/// Stand-in session for environments without database access.
/// Every operation succeeds and every fetch is empty.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullConnection;

impl NativeConnection for NullConnection {
    fn cursor(&self) -> Result<Box<dyn NativeCursor>> {
        Ok(Box::new(NullCursor))
    }

    fn commit(&mut self) -> Result<()> {
        Ok(())
    }

    fn rollback(&mut self) -> Result<()> {
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        Ok(())
    }

    fn set_autocommit(&mut self, _autocommit: bool) -> Result<()> {
        Ok(())
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NullCursor;

impl NativeCursor for NullCursor {
    fn execute(&mut self, _sql: &str, _params: &[SqlValue]) -> Result<()> {
        Ok(())
    }

    fn executemany(&mut self, _sql: &str, _param_sets: &[Vec<SqlValue>]) -> Result<()> {
        Ok(())
    }

    fn fetchone(&mut self) -> Result<Option<Row>> {
        Ok(None)
    }

    fn fetchall(&mut self) -> Result<Vec<Row>> {
        Ok(Vec::new())
    }

    fn description(&self) -> &[String] {
        &[]
    }

    fn rowcount(&self) -> Option<u64> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_everything_is_empty() {
        let mut conn = NullConnection;
        let mut cursor = conn.cursor().unwrap();
        cursor.execute("SELECT 1 FROM SYSIBM.SYSDUMMY1", &[]).unwrap();
        assert!(cursor.fetchone().unwrap().is_none());
        assert!(cursor.fetchall().unwrap().is_empty());
        assert!(cursor.description().is_empty());
        conn.commit().unwrap();
        conn.rollback().unwrap();
        conn.close().unwrap();
    }
}
