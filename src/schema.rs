use tracing::debug;

use crate::cursor::CursorAdapter;
use crate::error::Result;
use crate::operations::DatabaseOperations;
use crate::types::SqlValue;

/// A column as it appears in CREATE TABLE / ADD COLUMN.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDefinition {
    pub name: String,
    pub data_type: String,
    pub nullable: bool,
    pub default: Option<SqlValue>,
    pub primary_key: bool,
    pub identity: bool,
}

impl ColumnDefinition {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            nullable: true,
            default: None,
            primary_key: false,
            identity: false,
        }
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    pub fn default_value(mut self, value: impl Into<SqlValue>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self.nullable = false;
        self
    }

    /// Values are generated by the database; read back through `lastrowid`.
    pub fn identity(mut self) -> Self {
        self.identity = true;
        self.nullable = false;
        self
    }
}

enum Target<'a> {
    Collect(Vec<String>),
    Execute(&'a mut CursorAdapter),
}

/// Emits DDL for DB2 for IBM i.
///
/// In collect mode statements are only recorded; otherwise each one is
/// executed immediately through the given cursor.
pub struct DatabaseSchemaEditor<'a> {
    ops: DatabaseOperations,
    target: Target<'a>,
}

impl DatabaseSchemaEditor<'static> {
    /// An editor that records SQL without running it.
    pub fn collect() -> Self {
        Self {
            ops: DatabaseOperations,
            target: Target::Collect(Vec::new()),
        }
    }
}

impl<'a> DatabaseSchemaEditor<'a> {
    pub fn new(cursor: &'a mut CursorAdapter) -> Self {
        Self {
            ops: DatabaseOperations,
            target: Target::Execute(cursor),
        }
    }

    /// Statements recorded so far in collect mode.
    pub fn collected_sql(&self) -> &[String] {
        match &self.target {
            Target::Collect(statements) => statements,
            Target::Execute(_) => &[],
        }
    }

    pub fn execute(&mut self, sql: String) -> Result<()> {
        debug!(%sql, "schema");
        match &mut self.target {
            Target::Collect(statements) => {
                statements.push(sql);
                Ok(())
            }
            Target::Execute(cursor) => cursor.execute(&sql, &[]),
        }
    }

    /// Render a value as a DDL literal.
    pub fn quote_value(&self, value: &SqlValue) -> String {
        self.ops.adapt_value(value)
    }

    fn q(&self, name: &str) -> String {
        self.ops.quote_name(name)
    }

    fn q_list(&self, names: &[&str]) -> String {
        names.iter().map(|n| self.q(n)).collect::<Vec<_>>().join(", ")
    }

    pub fn column_sql(&self, column: &ColumnDefinition) -> String {
        let mut sql = format!("{} {}", self.q(&column.name), column.data_type);
        if column.identity {
            sql.push_str(" GENERATED BY DEFAULT AS IDENTITY");
        }
        if !column.nullable {
            sql.push_str(" NOT NULL");
        }
        if let Some(default) = &column.default {
            sql.push_str(" DEFAULT ");
            sql.push_str(&self.quote_value(default));
        }
        if column.primary_key {
            sql.push_str(" PRIMARY KEY");
        }
        sql
    }

    pub fn create_table(&mut self, table: &str, columns: &[ColumnDefinition]) -> Result<()> {
        let definition = columns
            .iter()
            .map(|c| self.column_sql(c))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!("CREATE TABLE {} ({})", self.q(table), definition);
        self.execute(sql)
    }

    pub fn delete_table(&mut self, table: &str) -> Result<()> {
        let sql = format!("DROP TABLE {}", self.q(table));
        self.execute(sql)
    }

    pub fn rename_table(&mut self, old_table: &str, new_table: &str) -> Result<()> {
        let sql = format!("RENAME TABLE {} TO {}", self.q(old_table), self.q(new_table));
        self.execute(sql)
    }

    pub fn add_column(&mut self, table: &str, column: &ColumnDefinition) -> Result<()> {
        let sql = format!(
            "ALTER TABLE {} ADD COLUMN {}",
            self.q(table),
            self.column_sql(column)
        );
        self.execute(sql)
    }

    pub fn alter_column_type(&mut self, table: &str, column: &str, data_type: &str) -> Result<()> {
        let sql = format!(
            "ALTER TABLE {} ALTER COLUMN {} SET DATA TYPE {}",
            self.q(table),
            self.q(column),
            data_type
        );
        self.execute(sql)
    }

    pub fn alter_column_null(&mut self, table: &str, column: &str, nullable: bool) -> Result<()> {
        let null = if nullable { "DROP NOT NULL" } else { "SET NOT NULL" };
        let sql = format!(
            "ALTER TABLE {} ALTER COLUMN {} {}",
            self.q(table),
            self.q(column),
            null
        );
        self.execute(sql)
    }

    /// Set the column default, or drop it when `default` is `None`.
    pub fn alter_column_default(
        &mut self,
        table: &str,
        column: &str,
        default: Option<&SqlValue>,
    ) -> Result<()> {
        let action = match default {
            Some(value) => format!("SET DEFAULT {}", self.quote_value(value)),
            None => "DROP DEFAULT".to_string(),
        };
        let sql = format!(
            "ALTER TABLE {} ALTER COLUMN {} {}",
            self.q(table),
            self.q(column),
            action
        );
        self.execute(sql)
    }

    pub fn remove_column(&mut self, table: &str, column: &str) -> Result<()> {
        let sql = format!("ALTER TABLE {} DROP COLUMN {}", self.q(table), self.q(column));
        self.execute(sql)
    }

    pub fn create_index(&mut self, name: &str, table: &str, columns: &[&str]) -> Result<()> {
        let sql = format!(
            "CREATE INDEX {} ON {} ({})",
            self.q(name),
            self.q(table),
            self.q_list(columns)
        );
        self.execute(sql)
    }

    pub fn delete_index(&mut self, name: &str) -> Result<()> {
        let sql = format!("DROP INDEX {}", self.q(name));
        self.execute(sql)
    }

    pub fn add_unique(&mut self, table: &str, name: &str, columns: &[&str]) -> Result<()> {
        let sql = format!(
            "ALTER TABLE {} ADD CONSTRAINT {} UNIQUE ({})",
            self.q(table),
            self.q(name),
            self.q_list(columns)
        );
        self.execute(sql)
    }

    pub fn delete_unique(&mut self, table: &str, name: &str) -> Result<()> {
        let sql = format!("ALTER TABLE {} DROP CONSTRAINT {}", self.q(table), self.q(name));
        self.execute(sql)
    }

    pub fn add_foreign_key(
        &mut self,
        table: &str,
        name: &str,
        column: &str,
        to_table: &str,
        to_column: &str,
    ) -> Result<()> {
        let sql = format!(
            "ALTER TABLE {} ADD CONSTRAINT {} FOREIGN KEY ({}) REFERENCES {} ({})",
            self.q(table),
            self.q(name),
            self.q(column),
            self.q(to_table),
            self.q(to_column)
        );
        self.execute(sql)
    }

    pub fn delete_foreign_key(&mut self, table: &str, name: &str) -> Result<()> {
        let sql = format!("ALTER TABLE {} DROP CONSTRAINT {}", self.q(table), self.q(name));
        self.execute(sql)
    }
}
