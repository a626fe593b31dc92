//! ODBC sessions through the system driver manager.
//!
//! **Requirements:**
//! - The `odbc` feature must be enabled
//! - A driver manager (unixODBC on Linux/macOS) and the IBM i Access ODBC
//!   driver must be installed, with a DSN configured in `odbc.ini`

use std::collections::VecDeque;
use std::sync::{Arc, OnceLock};

use odbc_api::buffers::TextRowSet;
use odbc_api::parameter::InputParameter;
use odbc_api::{ConnectionOptions, Cursor, Environment, IntoParameter, ResultSetMetadata};
use tracing::{debug, info};

use crate::error::{DbalError, ErrorKind, Result};
use crate::operations::DatabaseOperations;
use crate::traits::{NativeConnection, NativeCursor, NativeDriver};
use crate::types::{RawQueryResult, Row, SqlValue};

/// Rows fetched per round trip.
const FETCH_BATCH: usize = 500;
/// Upper bound for a single text cell. Longer values fail the fetch with a
/// `Data` error instead of being cut short.
const MAX_TEXT_LEN: usize = 32 * 1024;

static ENVIRONMENT: OnceLock<Environment> = OnceLock::new();

/// The process-wide ODBC environment. Sessions borrow it for `'static`.
fn environment() -> Result<&'static Environment> {
    if let Some(env) = ENVIRONMENT.get() {
        return Ok(env);
    }
    let env = Environment::new()?;
    Ok(ENVIRONMENT.get_or_init(|| env))
}

impl From<odbc_api::Error> for DbalError {
    fn from(err: odbc_api::Error) -> Self {
        let kind = match &err {
            odbc_api::Error::Diagnostics { record, .. } => {
                ErrorKind::from_sqlstate(record.state.as_str())
            }
            odbc_api::Error::TooLargeValueForBuffer { indicator, .. } => {
                return truncated(*indicator);
            }
            _ => ErrorKind::Interface,
        };
        DbalError::database(kind, err.to_string())
    }
}

fn truncated(indicator: Option<usize>) -> DbalError {
    let size = indicator.map_or_else(|| "unknown".to_string(), |n| format!("{} bytes", n));
    DbalError::database(
        ErrorKind::Data,
        format!(
            "text value of {} exceeds the {} byte fetch buffer",
            size, MAX_TEXT_LEN
        ),
    )
}

fn closed() -> DbalError {
    DbalError::database(ErrorKind::Interface, "ODBC connection is closed")
}

/// Native driver backed by `odbc-api`.
#[derive(Debug, Default, Clone, Copy)]
pub struct OdbcDriver;

impl NativeDriver for OdbcDriver {
    fn connect(
        &self,
        connection_string: &str,
        autocommit: bool,
    ) -> Result<Box<dyn NativeConnection>> {
        let env = environment()?;
        let conn = env.connect_with_connection_string(connection_string, ConnectionOptions::default())?;
        conn.set_autocommit(autocommit)?;
        info!(autocommit, "Opened ODBC session");
        Ok(Box::new(OdbcConnection {
            conn: Some(Arc::new(conn)),
        }))
    }
}

/// An open ODBC session.
///
/// Cursors hold their own handle to the session, so closing the connection
/// only releases it once every cursor created from it is dropped as well.
pub struct OdbcConnection {
    conn: Option<Arc<odbc_api::Connection<'static>>>,
}

impl OdbcConnection {
    fn handle(&self) -> Result<&Arc<odbc_api::Connection<'static>>> {
        self.conn.as_ref().ok_or_else(closed)
    }
}

impl NativeConnection for OdbcConnection {
    fn cursor(&self) -> Result<Box<dyn NativeCursor>> {
        Ok(Box::new(OdbcCursor {
            conn: Arc::clone(self.handle()?),
            columns: Vec::new(),
            pending: VecDeque::new(),
            rowcount: None,
        }))
    }

    fn commit(&mut self) -> Result<()> {
        self.handle()?.commit()?;
        Ok(())
    }

    fn rollback(&mut self) -> Result<()> {
        self.handle()?.rollback()?;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        if self.conn.take().is_some() {
            info!("Closed ODBC session");
        }
        Ok(())
    }

    fn set_autocommit(&mut self, autocommit: bool) -> Result<()> {
        self.handle()?.set_autocommit(autocommit)?;
        Ok(())
    }
}

/// A statement handle. Result sets are read eagerly on execute and then
/// served row by row.
pub struct OdbcCursor {
    conn: Arc<odbc_api::Connection<'static>>,
    columns: Vec<String>,
    pending: VecDeque<Row>,
    rowcount: Option<u64>,
}

impl OdbcCursor {
    fn reset(&mut self) {
        self.columns.clear();
        self.pending.clear();
        self.rowcount = None;
    }

    fn load(&mut self, result: RawQueryResult) {
        self.columns = result.columns.clone();
        self.pending = result.into_rows().into();
    }
}

impl NativeCursor for OdbcCursor {
    fn execute(&mut self, sql: &str, params: &[SqlValue]) -> Result<()> {
        self.reset();
        let conn = Arc::clone(&self.conn);
        let mut statement = conn.preallocate()?;
        let fetched = {
            let executed = if params.is_empty() {
                statement.execute(sql, ())?
            } else {
                let bound = to_parameters(params);
                statement.execute(sql, bound.as_slice())?
            };
            executed.map(read_result_set).transpose()?
        };
        match fetched {
            Some(result) => self.load(result),
            None => self.rowcount = statement.row_count()?.map(|n| n as u64),
        }
        Ok(())
    }

    fn executemany(&mut self, sql: &str, param_sets: &[Vec<SqlValue>]) -> Result<()> {
        self.reset();
        let conn = Arc::clone(&self.conn);
        let mut prepared = conn.prepare(sql)?;
        for params in param_sets {
            let bound = to_parameters(params);
            prepared.execute(bound.as_slice())?;
        }
        debug!(rows = param_sets.len(), "Executed ODBC batch");
        self.rowcount = Some(param_sets.len() as u64);
        Ok(())
    }

    fn fetchone(&mut self) -> Result<Option<Row>> {
        Ok(self.pending.pop_front())
    }

    fn fetchall(&mut self) -> Result<Vec<Row>> {
        Ok(self.pending.drain(..).collect())
    }

    fn description(&self) -> &[String] {
        &self.columns
    }

    fn rowcount(&self) -> Option<u64> {
        self.rowcount
    }
}

/// Read a whole result set as text.
fn read_result_set(mut cursor: impl Cursor) -> Result<RawQueryResult> {
    let num_cols = cursor.num_result_cols()?;
    let mut columns = Vec::with_capacity(num_cols.max(0) as usize);
    for i in 1..=num_cols {
        columns.push(cursor.col_name(i as u16)?);
    }

    let mut buffers = TextRowSet::for_cursor(FETCH_BATCH, &mut cursor, Some(MAX_TEXT_LEN))?;
    let mut row_cursor = cursor.bind_buffer(&mut buffers)?;

    let mut rows = Vec::new();
    while let Some(batch) = row_cursor.fetch_with_truncation_check(true)? {
        for row in 0..batch.num_rows() {
            let mut values = Vec::with_capacity(batch.num_cols());
            for col in 0..batch.num_cols() {
                let name = columns.get(col).map_or("", String::as_str);
                let value = batch
                    .at(col, row)
                    .map(|bytes| decode_text(bytes, name))
                    .transpose()?;
                values.push(value);
            }
            rows.push(values);
        }
    }

    Ok(RawQueryResult::new(columns, rows))
}

/// Cell text must be UTF-8; other client code pages are a configuration error.
fn decode_text(bytes: &[u8], column: &str) -> Result<String> {
    String::from_utf8(bytes.to_vec()).map_err(|err| {
        debug!(column, valid_up_to = err.utf8_error().valid_up_to(), "non UTF-8 cell");
        DbalError::database(
            ErrorKind::Data,
            format!("column {} holds text that is not valid UTF-8", column),
        )
    })
}

/// Convert SqlValue params to ODBC input parameters.
/// Temporal values are bound as text in the dialect's literal formats.
fn to_parameters(params: &[SqlValue]) -> Vec<Box<dyn InputParameter>> {
    let ops = DatabaseOperations;
    params
        .iter()
        .map(|value| -> Box<dyn InputParameter> {
            match value {
                SqlValue::Null => Box::new(None::<String>.into_parameter()),
                SqlValue::Text(s) => Box::new(s.clone().into_parameter()),
                SqlValue::Int32(i) => Box::new(*i),
                SqlValue::Int64(i) => Box::new(*i),
                SqlValue::Float64(f) => Box::new(*f),
                SqlValue::Bool(b) => Box::new(ops.adapt_boolean_value(*b)),
                SqlValue::Date(d) => Box::new(ops.adapt_date_value(d).into_parameter()),
                SqlValue::Time(t) => Box::new(ops.adapt_time_value(t).into_parameter()),
                SqlValue::DateTime(dt) => Box::new(ops.adapt_datetime_value(dt).into_parameter()),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_text_accepts_utf8() {
        assert_eq!(decode_text("Zoë".as_bytes(), "NAME").unwrap(), "Zoë");
    }

    #[test]
    fn test_decode_text_rejects_invalid_bytes() {
        let err = decode_text(&[b'A', 0xC1, b'B'], "DATA").unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::Data));
        assert!(err.message().contains("DATA"));
    }

    #[test]
    fn test_truncation_is_a_data_error() {
        let err = truncated(Some(40_960));
        assert_eq!(err.kind(), Some(ErrorKind::Data));
        assert!(err.message().contains("40960 bytes"));
        assert_eq!(truncated(None).kind(), Some(ErrorKind::Data));
    }
}
