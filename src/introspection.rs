use std::collections::BTreeMap;

use crate::cursor::CursorAdapter;
use crate::error::Result;

const TABLE_LIST_QUERY: &str = "SELECT TABLE_NAME, TABLE_TYPE FROM QSYS2.SYSTABLES";

const TABLE_DESCRIPTION_QUERY: &str = "SELECT COLUMN_NAME, SYSTEM_COLUMN_NAME, DATA_TYPE, LENGTH, NUMERIC_SCALE, IS_NULLABLE \
     FROM QSYS2.SYSCOLUMNS WHERE TABLE_NAME = %s ORDER BY ORDINAL_POSITION";

/// Native DB2 types and the abstract field type each maps to.
const DATA_TYPES_REVERSE: &[(&str, &str)] = &[
    ("CHAR", "CharField"),
    ("VARCHAR", "CharField"),
    ("CLOB", "TextField"),
    ("GRAPHIC", "CharField"),
    ("VARGRAPHIC", "CharField"),
    ("BLOB", "BinaryField"),
    ("DECIMAL", "DecimalField"),
    ("NUMERIC", "DecimalField"),
    ("INTEGER", "IntegerField"),
    ("SMALLINT", "SmallIntegerField"),
    ("BIGINT", "BigIntegerField"),
    ("DATE", "DateField"),
    ("TIME", "TimeField"),
    ("TIMESTAMP", "DateTimeField"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableType {
    Table,
    View,
}

impl TableType {
    /// Map a `QSYS2.SYSTABLES.TABLE_TYPE` code. Physical (`T`), logical (`L`)
    /// and materialized query (`P`) tables are tables, `V` is a view, and
    /// anything unknown is still reported as a table rather than hidden.
    pub fn from_catalog_code(code: &str) -> Self {
        match code.trim() {
            "V" => TableType::View,
            _ => TableType::Table,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableInfo {
    pub name: String,
    pub table_type: TableType,
}

/// One column as described by the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldInfo {
    pub name: String,
    pub type_code: String,
    pub display_size: Option<i64>,
    pub internal_size: Option<i64>,
    pub precision: Option<i64>,
    pub scale: i64,
    pub null_ok: bool,
    pub default: Option<String>,
}

/// A constraint as reported by [`DatabaseIntrospection::get_constraints`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstraintInfo {
    pub columns: Vec<String>,
    pub primary_key: bool,
    pub unique: bool,
    pub foreign_key: Option<(String, String)>,
    pub index: bool,
}

/// A sequence backing a column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceInfo {
    pub table: String,
    pub column: String,
}

/// Catalog reader. Nothing is cached; every call queries the catalog.
#[derive(Debug, Default, Clone, Copy)]
pub struct DatabaseIntrospection;

impl DatabaseIntrospection {
    pub fn get_table_list(&self, cursor: &mut CursorAdapter) -> Result<Vec<TableInfo>> {
        cursor.execute(TABLE_LIST_QUERY, &[])?;
        let tables = cursor
            .fetchall()?
            .into_iter()
            .map(|row| TableInfo {
                name: row.get(0).unwrap_or_default().trim_end().to_string(),
                table_type: TableType::from_catalog_code(row.get(1).unwrap_or_default()),
            })
            .collect();
        Ok(tables)
    }

    pub fn get_table_description(
        &self,
        cursor: &mut CursorAdapter,
        table: &str,
    ) -> Result<Vec<FieldInfo>> {
        cursor.execute(TABLE_DESCRIPTION_QUERY, &[table.into()])?;
        let fields = cursor
            .fetchall()?
            .into_iter()
            .map(|row| {
                let length = row.get_i64(3);
                FieldInfo {
                    name: row.get(0).unwrap_or_default().trim().to_string(),
                    type_code: row.get(2).unwrap_or_default().trim().to_string(),
                    display_size: length,
                    internal_size: length,
                    precision: length,
                    scale: row.get_i64(4).unwrap_or(0),
                    null_ok: row.get(5).map(str::trim) == Some("YES"),
                    default: None,
                }
            })
            .collect();
        Ok(fields)
    }

    /// Abstract field type for a native type name, e.g. `VARCHAR` -> `CharField`.
    pub fn get_field_type(&self, data_type: &str) -> Option<&'static str> {
        let data_type = data_type.trim();
        DATA_TYPES_REVERSE
            .iter()
            .find(|(native, _)| native.eq_ignore_ascii_case(data_type))
            .map(|(_, field)| *field)
    }

    /// Constraint introspection is not supported; always empty.
    pub fn get_constraints(
        &self,
        _cursor: &mut CursorAdapter,
        _table: &str,
    ) -> Result<BTreeMap<String, ConstraintInfo>> {
        Ok(BTreeMap::new())
    }

    /// Identity columns take the place of sequences on IBM i; always empty.
    pub fn get_sequences(&self, _cursor: &mut CursorAdapter, _table: &str) -> Result<Vec<SequenceInfo>> {
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::{InMemoryTestDriver, InMemoryTestResponseBuilder};
    use crate::traits::NativeConnection;
    use crate::types::SqlValue;

    fn adapter(driver: &InMemoryTestDriver) -> CursorAdapter {
        CursorAdapter::new(driver.connection().cursor().unwrap())
    }

    #[test]
    fn test_table_list_type_mapping() {
        let driver = InMemoryTestDriver::new().with_response(
            InMemoryTestResponseBuilder::new()
                .columns(&["TABLE_NAME", "TABLE_TYPE"])
                .row(&["FORM", "T"])
                .row(&["FORM_BY_SLUG", "L"])
                .row(&["FORM_STATS", "P"])
                .row(&["ACTIVE_FORMS", "V"])
                .row(&["ALIAS_FORM", "A"])
                .build(),
        );
        let mut cursor = adapter(&driver);

        let tables = DatabaseIntrospection.get_table_list(&mut cursor).unwrap();

        driver.assert_last_query(TABLE_LIST_QUERY, &[]);
        let kinds: Vec<_> = tables.iter().map(|t| (t.name.as_str(), t.table_type)).collect();
        assert_eq!(
            kinds,
            vec![
                ("FORM", TableType::Table),
                ("FORM_BY_SLUG", TableType::Table),
                ("FORM_STATS", TableType::Table),
                ("ACTIVE_FORMS", TableType::View),
                ("ALIAS_FORM", TableType::Table),
            ]
        );
    }

    #[test]
    fn test_table_description() {
        let driver = InMemoryTestDriver::new().with_response(
            InMemoryTestResponseBuilder::new()
                .columns(&[
                    "COLUMN_NAME",
                    "SYSTEM_COLUMN_NAME",
                    "DATA_TYPE",
                    "LENGTH",
                    "NUMERIC_SCALE",
                    "IS_NULLABLE",
                ])
                .nullable_row(&[Some("ID        "), Some("ID"), Some("INTEGER"), Some("4"), Some("0"), Some("N")])
                .nullable_row(&[Some("LABEL     "), Some("LABEL"), Some("VARCHAR"), Some("200"), None, Some("YES")])
                .build(),
        );
        let mut cursor = adapter(&driver);

        let fields = DatabaseIntrospection
            .get_table_description(&mut cursor, "FORMFIELD")
            .unwrap();

        let last = driver.last_query().unwrap();
        assert!(last.sql.contains("FROM QSYS2.SYSCOLUMNS WHERE TABLE_NAME = ? ORDER BY ORDINAL_POSITION"));
        assert_eq!(last.params, vec![SqlValue::Text("FORMFIELD".to_string())]);

        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0].name, "ID");
        assert_eq!(fields[0].type_code, "INTEGER");
        assert_eq!(fields[0].internal_size, Some(4));
        assert!(!fields[0].null_ok);
        assert_eq!(fields[1].name, "LABEL");
        assert_eq!(fields[1].scale, 0);
        assert!(fields[1].null_ok);
        assert_eq!(fields[1].default, None);
    }

    #[test]
    fn test_field_type_mapping() {
        let introspection = DatabaseIntrospection;
        assert_eq!(introspection.get_field_type("VARCHAR"), Some("CharField"));
        assert_eq!(introspection.get_field_type("timestamp"), Some("DateTimeField"));
        assert_eq!(introspection.get_field_type("DECIMAL"), Some("DecimalField"));
        assert_eq!(introspection.get_field_type("XML"), None);
    }

    #[test]
    fn test_constraints_and_sequences_are_empty() {
        let driver = InMemoryTestDriver::new();
        let mut cursor = adapter(&driver);
        let introspection = DatabaseIntrospection;

        assert!(introspection.get_constraints(&mut cursor, "FORM").unwrap().is_empty());
        assert!(introspection.get_sequences(&mut cursor, "FORM").unwrap().is_empty());
        driver.assert_query_count(0);
    }
}
