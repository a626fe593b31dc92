//! ibmi-dbal - DB2 for IBM i database adapter for ORM-style callers
//!
//! Statements arrive with percent-style placeholders and leave as `?`-style
//! SQL for DB2 for i, executed through a native call-level interface (ODBC
//! with the `odbc` feature).
//!
//! # Example
//! ```ignore
//! use ibmi_dbal::{Backend, DatabaseSettings, IbmiDriver};
//!
//! let mut backend = Backend::new(DatabaseSettings::new("PROD"), IbmiDriver::odbc());
//! let mut cursor = backend.create_cursor()?;
//!
//! cursor.execute(
//!     "INSERT INTO \"FORMSUBMISSION\" (\"FORM_ID\", \"PROCESSED\") VALUES (%s, %s)",
//!     &[12.into(), false.into()],
//! )?;
//! let id = cursor.lastrowid();
//!
//! let ops = backend.ops();
//! let sql = format!(
//!     "SELECT * FROM {}{}",
//!     ops.quote_name("FORMSUBMISSION"),
//!     ops.limit_offset_sql(20, Some(40)),
//! );
//! cursor.execute(&sql, &[])?;
//! for row in cursor {
//!     let row = row?;
//!     println!("{:?}", row.get(0));
//! }
//! ```

pub mod config;
pub mod connection;
pub mod cursor;
pub mod driver;
pub mod drivers;
pub mod error;
pub mod introspection;
pub mod operations;
pub mod registry;
pub mod schema;
pub mod traits;
pub mod types;

mod backend;

// Re-export main types for convenient access
pub use backend::{Backend, CommitHook};
pub use config::{ConnectionParams, DatabaseSettings};
pub use connection::Connection;
pub use cursor::{prepare_sql, CursorAdapter, LastRowId, PreparedStatement};
pub use driver::{ConnectMode, IbmiDriver};
pub use error::{DbalError, ErrorKind, Result};
pub use introspection::{DatabaseIntrospection, FieldInfo, TableInfo, TableType};
pub use operations::DatabaseOperations;
pub use registry::{DriverRegistry, Registry};
pub use schema::{ColumnDefinition, DatabaseSchemaEditor};
pub use traits::{NativeConnection, NativeCursor, NativeDriver};
pub use types::{RawQueryResult, Row, SqlValue};
