use crate::error::Result;
use crate::types::{Row, SqlValue};

/// A native statement handle.
/// Statements use positional `?` placeholders; an empty parameter slice
/// means the statement is executed without binding anything.
pub trait NativeCursor {
    fn execute(&mut self, sql: &str, params: &[SqlValue]) -> Result<()>;

    /// Execute one statement once per parameter set.
    fn executemany(&mut self, sql: &str, param_sets: &[Vec<SqlValue>]) -> Result<()>;

    fn fetchone(&mut self) -> Result<Option<Row>>;

    fn fetchall(&mut self) -> Result<Vec<Row>>;

    fn fetchmany(&mut self, size: usize) -> Result<Vec<Row>> {
        let mut rows = Vec::with_capacity(size);
        while rows.len() < size {
            match self.fetchone()? {
                Some(row) => rows.push(row),
                None => break,
            }
        }
        Ok(rows)
    }

    /// Column names of the current result set, empty if there is none.
    fn description(&self) -> &[String];

    /// Rows affected by the last statement, when the driver reports it.
    fn rowcount(&self) -> Option<u64>;
}
