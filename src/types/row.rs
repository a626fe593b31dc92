use std::sync::Arc;

use crate::error::{DbalError, Result};

/// Driver-agnostic raw result set.
/// All values are converted to text by the driver; `None` is SQL NULL.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawQueryResult {
    /// Column names in order
    pub columns: Vec<String>,
    /// Rows, where each row is a vector of values in column order
    pub rows: Vec<Vec<Option<String>>>,
}

impl RawQueryResult {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Option<String>>>) -> Self {
        Self { columns, rows }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Splits the result into rows sharing one column list.
    pub fn into_rows(self) -> Vec<Row> {
        let columns: Arc<[String]> = self.columns.into();
        self.rows
            .into_iter()
            .map(|values| Row::new(Arc::clone(&columns), values))
            .collect()
    }
}

/// A single fetched row.
/// Values are positional and kept as text, exactly as the driver produced them.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    columns: Arc<[String]>,
    values: Vec<Option<String>>,
}

impl Row {
    pub fn new(columns: Arc<[String]>, values: Vec<Option<String>>) -> Self {
        Self { columns, values }
    }

    /// Gets a value by position. Returns `None` both for NULL and for an
    /// out-of-range index.
    pub fn get(&self, index: usize) -> Option<&str> {
        self.values.get(index).and_then(|v| v.as_deref())
    }

    /// Gets a value by column name (case-insensitive, as DB2 folds names).
    pub fn get_by_name(&self, name: &str) -> Result<Option<&str>> {
        let index = self
            .columns
            .iter()
            .position(|c| c.eq_ignore_ascii_case(name))
            .ok_or_else(|| DbalError::ColumnNotFound(name.to_string()))?;
        Ok(self.get(index))
    }

    /// Parses an integer column, tolerating the trailing decimal point
    /// DB2 renders for DECIMAL(n, 0) values.
    pub fn get_i64(&self, index: usize) -> Option<i64> {
        let raw = self.get(index)?.trim();
        let digits = match raw.split_once('.') {
            Some((whole, frac)) if frac.chars().all(|c| c == '0') => whole,
            Some(_) => return None,
            None => raw,
        };
        digits.parse().ok()
    }

    /// Returns the column names of this row.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Returns the raw values of this row.
    pub fn values(&self) -> &[Option<String>] {
        &self.values
    }

    /// Returns the number of columns in this row.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if this row has no columns.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Row {
        let raw = RawQueryResult::new(
            vec!["ID".to_string(), "NAME".to_string()],
            vec![vec![Some("1".to_string()), None]],
        );
        raw.into_rows().remove(0)
    }

    #[test]
    fn test_row_get() {
        let row = sample();
        assert_eq!(row.get(0), Some("1"));
        assert_eq!(row.get(1), None);
        assert_eq!(row.get(5), None);
        assert_eq!(row.len(), 2);
    }

    #[test]
    fn test_row_get_by_name() {
        let row = sample();
        assert_eq!(row.get_by_name("id").unwrap(), Some("1"));
        assert_eq!(row.get_by_name("NAME").unwrap(), None);
        match row.get_by_name("missing").unwrap_err() {
            DbalError::ColumnNotFound(name) => assert_eq!(name, "missing"),
            other => panic!("Expected ColumnNotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_get_i64_accepts_decimal_rendering() {
        let columns: Arc<[String]> = vec!["ID".to_string()].into();
        let row = Row::new(Arc::clone(&columns), vec![Some(" 42. ".to_string())]);
        assert_eq!(row.get_i64(0), Some(42));
        let row = Row::new(Arc::clone(&columns), vec![Some("17.00".to_string())]);
        assert_eq!(row.get_i64(0), Some(17));
        let row = Row::new(Arc::clone(&columns), vec![Some("1.5".to_string())]);
        assert_eq!(row.get_i64(0), None);
        let row = Row::new(columns, vec![None]);
        assert_eq!(row.get_i64(0), None);
    }
}
