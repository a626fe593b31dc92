use tracing::debug;

use crate::error::{DbalError, Result};
use crate::traits::NativeCursor;
use crate::types::{Row, SqlValue};

/// Returns the identity generated by the last INSERT on this session.
pub const IDENTITY_QUERY: &str = "SELECT IDENTITY_VAL_LOCAL() FROM SYSIBM.SYSDUMMY1";

/// Outcome of identity capture after a write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LastRowId {
    Generated(i64),
    #[default]
    Unavailable,
}

impl LastRowId {
    pub fn value(self) -> Option<i64> {
        match self {
            LastRowId::Generated(id) => Some(id),
            LastRowId::Unavailable => None,
        }
    }
}

/// A statement ready for the native driver: `?` placeholders and coerced
/// parameters of matching arity.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedStatement {
    pub sql: String,
    pub params: Vec<SqlValue>,
}

/// Rewrite a percent-style statement for the native driver.
///
/// `%s` becomes `?` and `%%` becomes a literal `%`. Booleans are bound as
/// `1`/`0`. Without parameters the statement is passed through untouched.
pub fn prepare_sql(sql: &str, params: &[SqlValue]) -> Result<PreparedStatement> {
    if params.is_empty() {
        return Ok(PreparedStatement {
            sql: sql.to_string(),
            params: Vec::new(),
        });
    }

    let (sql, placeholders) = rewrite_placeholders(sql);
    check_arity(placeholders, params)?;
    Ok(PreparedStatement {
        sql,
        params: coerce_params(params),
    })
}

/// `%s` -> `?`, `%%` -> `%`. Returns the rewritten text and the placeholder count.
fn rewrite_placeholders(sql: &str) -> (String, usize) {
    let mut rewritten = String::with_capacity(sql.len());
    let mut placeholders = 0;
    let mut chars = sql.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '%' {
            match chars.peek() {
                Some('s') => {
                    chars.next();
                    rewritten.push('?');
                    placeholders += 1;
                    continue;
                }
                Some('%') => {
                    chars.next();
                }
                _ => {}
            }
        }
        rewritten.push(c);
    }
    (rewritten, placeholders)
}

fn check_arity(placeholders: usize, params: &[SqlValue]) -> Result<()> {
    if placeholders != params.len() {
        return Err(DbalError::ParameterMismatch {
            placeholders,
            params: params.len(),
        });
    }
    Ok(())
}

fn coerce_params(params: &[SqlValue]) -> Vec<SqlValue> {
    params
        .iter()
        .map(|p| match p {
            SqlValue::Bool(b) => SqlValue::Int32(i32::from(*b)),
            other => other.clone(),
        })
        .collect()
}

fn is_insert(sql: &str) -> bool {
    sql.trim_start()
        .get(..6)
        .is_some_and(|head| head.eq_ignore_ascii_case("INSERT"))
}

/// Cursor handed to the layer above.
///
/// Statements arrive in percent style and are rewritten before they reach
/// the native cursor. After each INSERT the generated identity is read back
/// on the same session, so a backend must not be shared between threads.
pub struct CursorAdapter {
    cursor: Box<dyn NativeCursor>,
    last_row_id: LastRowId,
}

impl CursorAdapter {
    pub fn new(cursor: Box<dyn NativeCursor>) -> Self {
        Self {
            cursor,
            last_row_id: LastRowId::Unavailable,
        }
    }

    /// Execute one statement.
    pub fn execute(&mut self, sql: &str, params: &[SqlValue]) -> Result<()> {
        let prepared = prepare_sql(sql, params)?;
        debug!(sql = %prepared.sql, params = prepared.params.len(), "execute");
        self.cursor.execute(&prepared.sql, &prepared.params)?;

        if is_insert(sql) {
            self.last_row_id = self.fetch_identity();
        }
        Ok(())
    }

    /// Execute one statement once per parameter set.
    ///
    /// The statement text is shared, so every set must match its placeholder
    /// count. A batch of only empty sets runs the text untouched, as `execute`
    /// does. A batch has no single identity, so `lastrowid` is cleared.
    pub fn executemany(&mut self, sql: &str, param_list: &[Vec<SqlValue>]) -> Result<()> {
        let translated_sql = if param_list.iter().all(Vec::is_empty) {
            sql.to_string()
        } else {
            let (rewritten, placeholders) = rewrite_placeholders(sql);
            for params in param_list {
                check_arity(placeholders, params)?;
            }
            rewritten
        };
        let param_sets: Vec<Vec<SqlValue>> =
            param_list.iter().map(|params| coerce_params(params)).collect();

        debug!(sql = %translated_sql, batch = param_sets.len(), "executemany");
        let result = self.cursor.executemany(&translated_sql, &param_sets);
        self.last_row_id = LastRowId::Unavailable;
        result
    }

    fn fetch_identity(&mut self) -> LastRowId {
        let fetched = self
            .cursor
            .execute(IDENTITY_QUERY, &[])
            .and_then(|_| self.cursor.fetchone());
        match fetched {
            Ok(Some(row)) => match row.get_i64(0) {
                Some(id) => LastRowId::Generated(id),
                None => {
                    debug!(value = ?row.get(0), "no identity generated by insert");
                    LastRowId::Unavailable
                }
            },
            Ok(None) => LastRowId::Unavailable,
            Err(err) => {
                debug!(error = %err, "identity lookup failed");
                LastRowId::Unavailable
            }
        }
    }

    /// Identity generated by the most recent INSERT, if any.
    pub fn lastrowid(&self) -> Option<i64> {
        self.last_row_id.value()
    }

    pub fn last_row_id(&self) -> LastRowId {
        self.last_row_id
    }

    pub fn fetchone(&mut self) -> Result<Option<Row>> {
        self.cursor.fetchone()
    }

    pub fn fetchmany(&mut self, size: usize) -> Result<Vec<Row>> {
        self.cursor.fetchmany(size)
    }

    pub fn fetchall(&mut self) -> Result<Vec<Row>> {
        self.cursor.fetchall()
    }

    pub fn description(&self) -> &[String] {
        self.cursor.description()
    }

    pub fn rowcount(&self) -> Option<u64> {
        self.cursor.rowcount()
    }

    /// The underlying native cursor, for operations this adapter doesn't cover.
    /// Statements issued here bypass placeholder rewriting and identity capture.
    pub fn native_mut(&mut self) -> &mut dyn NativeCursor {
        self.cursor.as_mut()
    }
}

impl Iterator for CursorAdapter {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        self.cursor.fetchone().transpose()
    }
}
