//! DB2 for IBM i SQL dialect rules.
//!
//! Everything here is pure string translation used by the statement compiler
//! of the layer above; nothing touches a connection.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use crate::types::SqlValue;

const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M:%S";

/// Templates for field lookups, keyed by lookup name.
const OPERATORS: &[(&str, &str)] = &[
    ("exact", "= %s"),
    ("iexact", "LIKE %s"),
    ("contains", "LIKE %s"),
    ("icontains", "LIKE %s"),
    ("gt", "> %s"),
    ("gte", ">= %s"),
    ("lt", "< %s"),
    ("lte", "<= %s"),
    ("startswith", "LIKE %s"),
    ("istartswith", "LIKE %s"),
    ("endswith", "LIKE %s"),
    ("iendswith", "LIKE %s"),
    ("range", "BETWEEN %s AND %s"),
    ("isnull", "IS NULL"),
];

/// Stateless dialect operations for DB2 for IBM i.
#[derive(Debug, Default, Clone, Copy)]
pub struct DatabaseOperations;

impl DatabaseOperations {
    /// Placeholder style expected by the native driver.
    pub const PARAMSTYLE: &'static str = "qmark";

    /// Wrap an identifier in double quotes so case is preserved and keywords
    /// don't collide. Already-quoted names are returned as-is.
    pub fn quote_name(&self, name: &str) -> String {
        if name.len() >= 2 && name.starts_with('"') && name.ends_with('"') {
            return name.to_string();
        }
        format!("\"{}\"", name.replace('"', "\"\""))
    }

    /// Translate a zero-based `[low, high)` slice into DB2 row limiting.
    pub fn limit_offset_sql(&self, low: u64, high: Option<u64>) -> String {
        match high {
            Some(high) if low > 0 => format!(
                " OFFSET {} ROWS FETCH NEXT {} ROWS ONLY",
                low,
                high.saturating_sub(low)
            ),
            Some(high) => format!(" FETCH FIRST {} ROWS ONLY", high),
            None if low > 0 => format!(" OFFSET {} ROWS", low),
            None => String::new(),
        }
    }

    /// Value meaning "no upper bound" for slicing.
    pub fn no_limit_value(&self) -> Option<u64> {
        None
    }

    pub fn adapt_datetime_value(&self, value: &NaiveDateTime) -> String {
        value.format(DATETIME_FORMAT).to_string()
    }

    pub fn adapt_date_value(&self, value: &NaiveDate) -> String {
        value.format(DATE_FORMAT).to_string()
    }

    pub fn adapt_time_value(&self, value: &NaiveTime) -> String {
        value.format(TIME_FORMAT).to_string()
    }

    /// DB2 for i has no boolean literal.
    pub fn adapt_boolean_value(&self, value: bool) -> i32 {
        i32::from(value)
    }

    /// Render a value as an inline SQL literal. DB2 has no literal for NaN
    /// or infinity, so non-finite floats render as `NULL`.
    pub fn adapt_value(&self, value: &SqlValue) -> String {
        match value {
            SqlValue::Null => "NULL".to_string(),
            SqlValue::Bool(b) => self.adapt_boolean_value(*b).to_string(),
            SqlValue::Int32(i) => i.to_string(),
            SqlValue::Int64(i) => i.to_string(),
            SqlValue::Float64(f) if f.is_finite() => f.to_string(),
            SqlValue::Float64(_) => "NULL".to_string(),
            SqlValue::Text(s) => quote_string(s),
            SqlValue::Date(d) => quote_string(&self.adapt_date_value(d)),
            SqlValue::Time(t) => quote_string(&self.adapt_time_value(t)),
            SqlValue::DateTime(dt) => quote_string(&self.adapt_datetime_value(dt)),
        }
    }

    /// Join sub-expressions with a connector such as `AND` or `+`.
    pub fn combine_expression<S: AsRef<str>>(&self, connector: &str, sub_expressions: &[S]) -> String {
        let separator = format!(" {} ", connector);
        sub_expressions
            .iter()
            .map(|s| s.as_ref())
            .collect::<Vec<_>>()
            .join(&separator)
    }

    pub fn savepoint_create_sql(&self, sid: &str) -> String {
        format!("SAVEPOINT {} ON ROLLBACK RETAIN CURSORS", self.quote_name(sid))
    }

    pub fn savepoint_rollback_sql(&self, sid: &str) -> String {
        format!("ROLLBACK TO SAVEPOINT {}", self.quote_name(sid))
    }

    pub fn savepoint_commit_sql(&self, sid: &str) -> String {
        format!("RELEASE SAVEPOINT {}", self.quote_name(sid))
    }

    /// Statements that empty the given tables.
    /// TRUNCATE on DB2 for i needs exclusive locks and is not journaled the
    /// same way, so plain DELETEs are issued.
    pub fn sql_flush<S: AsRef<str>>(&self, tables: &[S]) -> Vec<String> {
        tables
            .iter()
            .map(|table| format!("DELETE FROM {}", self.quote_name(table.as_ref())))
            .collect()
    }

    /// Escape LIKE wildcards. Backslash goes first so the escapes added for
    /// `%` and `_` are not escaped again.
    pub fn prep_for_like_query(&self, value: &str) -> String {
        value
            .replace('\\', "\\\\")
            .replace('%', "\\%")
            .replace('_', "\\_")
    }

    /// A bare boolean expression can't be a WHERE predicate on DB2 for i;
    /// the compiler must emit an explicit comparison.
    pub fn conditional_expression_supported_in_where_clause(&self) -> bool {
        false
    }

    /// SQL template for a field lookup, e.g. `gte` -> `>= %s`.
    pub fn operator(&self, lookup: &str) -> Option<&'static str> {
        OPERATORS
            .iter()
            .find(|(name, _)| *name == lookup)
            .map(|(_, template)| *template)
    }

    pub fn operators(&self) -> impl Iterator<Item = (&'static str, &'static str)> {
        OPERATORS.iter().copied()
    }

    pub fn random_function_sql(&self) -> &'static str {
        "RAND()"
    }

    /// DB2 for i has no tablespaces.
    pub fn tablespace_sql(&self, _tablespace: &str, _inline: bool) -> String {
        String::new()
    }
}

fn quote_string(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}
