mod null;
#[cfg(feature = "odbc")]
mod odbc;

pub use self::in_memory_test::{
    InMemoryTestConnection, InMemoryTestCursor, InMemoryTestDriver, InMemoryTestResponseBuilder,
    RecordedBatch, RecordedQuery,
};
pub use self::null::{NullConnection, NullCursor};
#[cfg(feature = "odbc")]
pub use self::odbc::{OdbcConnection, OdbcCursor, OdbcDriver};
