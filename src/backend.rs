use tracing::{debug, info};

use crate::config::{ConnectionParams, DatabaseSettings};
use crate::connection::Connection;
use crate::cursor::CursorAdapter;
use crate::driver::{ConnectMode, IbmiDriver};
use crate::error::Result;
use crate::introspection::DatabaseIntrospection;
use crate::operations::DatabaseOperations;
use crate::registry::DriverRegistry;
use crate::schema::DatabaseSchemaEditor;

/// Callback run after a successful commit.
pub type CommitHook = Box<dyn FnOnce() + Send>;

/// Per-request database handle for the ORM layer.
///
/// The connection is opened on first use and kept until [`Backend::close`].
/// A backend is meant to be owned by one request or thread at a time.
pub struct Backend {
    settings: DatabaseSettings,
    driver: IbmiDriver,
    mode: ConnectMode,
    connection: Option<Connection>,
    autocommit: bool,
    savepoint_counter: usize,
    commit_hooks: Vec<CommitHook>,
    ops: DatabaseOperations,
    introspection: DatabaseIntrospection,
}

impl Backend {
    pub const VENDOR: &'static str = "ibmi";
    pub const DISPLAY_NAME: &'static str = "IBM i Access";

    pub fn new(settings: DatabaseSettings, driver: IbmiDriver) -> Self {
        let autocommit = settings.autocommit;
        Self {
            settings,
            driver,
            mode: ConnectMode::Live,
            connection: None,
            autocommit,
            savepoint_counter: 0,
            commit_hooks: Vec::new(),
            ops: DatabaseOperations,
            introspection: DatabaseIntrospection,
        }
    }

    /// Build a backend whose native driver is chosen by `settings.engine`.
    pub fn from_registry(settings: DatabaseSettings, registry: &DriverRegistry) -> Result<Self> {
        settings.validate()?;
        let native = registry.get(&settings.engine)?.clone();
        Ok(Self::new(settings, IbmiDriver::with_native(native)))
    }

    /// Hand out no-op connections instead of real sessions.
    pub fn test_only(mut self) -> Self {
        self.mode = ConnectMode::TestOnly;
        self
    }

    pub fn vendor(&self) -> &'static str {
        Self::VENDOR
    }

    pub fn display_name(&self) -> &'static str {
        Self::DISPLAY_NAME
    }

    pub fn settings(&self) -> &DatabaseSettings {
        &self.settings
    }

    pub fn ops(&self) -> DatabaseOperations {
        self.ops
    }

    pub fn introspection(&self) -> DatabaseIntrospection {
        self.introspection
    }

    pub fn get_connection_params(&self) -> ConnectionParams {
        self.settings.connection_params()
    }

    /// Open a fresh connection without memoizing it.
    pub fn get_new_connection(&self, params: &ConnectionParams) -> Result<Connection> {
        self.settings.validate()?;
        let mut connection = self.driver.connect(params, self.mode)?;
        if !self.autocommit {
            connection.set_autocommit(false)?;
        }
        Ok(connection)
    }

    /// The memoized connection, opened on first call.
    pub fn ensure_connection(&mut self) -> Result<&mut Connection> {
        let connection = match self.connection.take() {
            Some(connection) => connection,
            None => {
                let params = self.get_connection_params();
                self.get_new_connection(&params)?
            }
        };
        Ok(self.connection.insert(connection))
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    pub fn create_cursor(&mut self) -> Result<CursorAdapter> {
        let native = self.ensure_connection()?.cursor()?;
        Ok(CursorAdapter::new(native))
    }

    pub fn get_autocommit(&self) -> bool {
        self.autocommit
    }

    /// Switch transport autocommit. Applied now if connected and to every
    /// later connection.
    ///
    /// Turning autocommit back on commits the open transaction at the
    /// transport, so pending commit hooks run once the switch succeeds.
    pub fn set_autocommit(&mut self, autocommit: bool) -> Result<()> {
        if let Some(connection) = self.connection.as_mut() {
            connection.set_autocommit(autocommit)?;
        }
        let enabling = autocommit && !self.autocommit;
        self.autocommit = autocommit;
        if enabling {
            self.run_commit_hooks();
        }
        Ok(())
    }

    /// Commit, then run the pending commit hooks in registration order.
    pub fn commit(&mut self) -> Result<()> {
        if let Some(connection) = self.connection.as_mut() {
            connection.commit()?;
        }
        self.run_commit_hooks();
        Ok(())
    }

    /// Roll back and discard pending commit hooks.
    pub fn rollback(&mut self) -> Result<()> {
        self.commit_hooks.clear();
        if let Some(connection) = self.connection.as_mut() {
            connection.rollback()?;
        }
        Ok(())
    }

    /// Close the memoized connection; the next use reconnects.
    pub fn close(&mut self) -> Result<()> {
        self.commit_hooks.clear();
        if let Some(mut connection) = self.connection.take() {
            connection.close()?;
            info!("Backend connection released");
        }
        Ok(())
    }

    /// Run `hook` once the current transaction commits. In autocommit mode
    /// every statement is already committed, so it runs immediately.
    pub fn on_commit(&mut self, hook: impl FnOnce() + Send + 'static) {
        if self.autocommit {
            hook();
        } else {
            self.commit_hooks.push(Box::new(hook));
        }
    }

    fn run_commit_hooks(&mut self) {
        let hooks = std::mem::take(&mut self.commit_hooks);
        if !hooks.is_empty() {
            debug!(count = hooks.len(), "Running commit hooks");
        }
        for hook in hooks {
            hook();
        }
    }

    /// Create a savepoint and return its id.
    pub fn savepoint(&mut self) -> Result<String> {
        self.savepoint_counter += 1;
        let sid = format!("s{}", self.savepoint_counter);
        let sql = self.ops.savepoint_create_sql(&sid);
        self.create_cursor()?.execute(&sql, &[])?;
        Ok(sid)
    }

    pub fn savepoint_rollback(&mut self, sid: &str) -> Result<()> {
        debug!(sid, "Rolling back to savepoint");
        let sql = self.ops.savepoint_rollback_sql(sid);
        self.create_cursor()?.execute(&sql, &[])
    }

    pub fn savepoint_commit(&mut self, sid: &str) -> Result<()> {
        let sql = self.ops.savepoint_commit_sql(sid);
        self.create_cursor()?.execute(&sql, &[])
    }

    /// Delete every row of the given tables.
    pub fn flush<S: AsRef<str>>(&mut self, tables: &[S]) -> Result<()> {
        let statements = self.ops.sql_flush(tables);
        let mut cursor = self.create_cursor()?;
        for sql in statements {
            cursor.execute(&sql, &[])?;
        }
        Ok(())
    }

    /// Run DDL through a schema editor bound to a fresh cursor.
    pub fn with_schema_editor<R>(
        &mut self,
        f: impl FnOnce(&mut DatabaseSchemaEditor<'_>) -> Result<R>,
    ) -> Result<R> {
        let mut cursor = self.create_cursor()?;
        let mut editor = DatabaseSchemaEditor::new(&mut cursor);
        f(&mut editor)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::drivers::InMemoryTestDriver;
    use crate::error::DbalError;

    fn backend(native: &InMemoryTestDriver) -> Backend {
        Backend::new(
            DatabaseSettings::new("DEV"),
            IbmiDriver::with_native(Arc::new(native.clone())),
        )
    }

    #[test]
    fn test_connection_is_lazy_and_memoized() {
        let native = InMemoryTestDriver::new();
        let mut backend = backend(&native);
        assert!(!backend.is_connected());

        backend.create_cursor().unwrap();
        backend.create_cursor().unwrap();

        assert!(backend.is_connected());
        assert_eq!(native.connection_strings(), vec!["DSN=DEV;".to_string()]);
    }

    #[test]
    fn test_transaction_calls_without_connection_are_noops() {
        let native = InMemoryTestDriver::new();
        let mut backend = backend(&native);

        backend.commit().unwrap();
        backend.rollback().unwrap();
        backend.close().unwrap();

        assert!(native.connection_strings().is_empty());
        assert_eq!(native.commit_count(), 0);
    }

    #[test]
    fn test_autocommit_off_applies_to_new_connection() {
        let native = InMemoryTestDriver::new();
        let mut backend = backend(&native);

        backend.set_autocommit(false).unwrap();
        backend.ensure_connection().unwrap();

        assert!(!backend.get_autocommit());
        assert_eq!(native.autocommit(), Some(false));
    }

    #[test]
    fn test_commit_hooks_run_in_order_after_commit() {
        let native = InMemoryTestDriver::new();
        let mut backend = backend(&native);
        backend.set_autocommit(false).unwrap();
        backend.ensure_connection().unwrap();

        let log = Arc::new(Mutex::new(Vec::new()));
        for n in 1..=3 {
            let log = Arc::clone(&log);
            backend.on_commit(move || log.lock().unwrap().push(n));
        }
        assert!(log.lock().unwrap().is_empty());

        backend.commit().unwrap();
        assert_eq!(*log.lock().unwrap(), vec![1, 2, 3]);
        assert_eq!(native.commit_count(), 1);

        backend.commit().unwrap();
        assert_eq!(log.lock().unwrap().len(), 3);
    }

    #[test]
    fn test_rollback_discards_hooks() {
        let native = InMemoryTestDriver::new();
        let mut backend = backend(&native);
        backend.set_autocommit(false).unwrap();

        let log = Arc::new(Mutex::new(Vec::new()));
        let hook_log = Arc::clone(&log);
        backend.on_commit(move || hook_log.lock().unwrap().push("sent"));
        backend.rollback().unwrap();
        backend.commit().unwrap();

        assert!(log.lock().unwrap().is_empty());
    }

    #[test]
    fn test_enabling_autocommit_runs_pending_hooks() {
        let native = InMemoryTestDriver::new();
        let mut backend = backend(&native);
        backend.set_autocommit(false).unwrap();
        backend.ensure_connection().unwrap();

        let log = Arc::new(Mutex::new(Vec::new()));
        let hook_log = Arc::clone(&log);
        backend.on_commit(move || hook_log.lock().unwrap().push("sent"));
        backend.set_autocommit(false).unwrap();
        assert!(log.lock().unwrap().is_empty());

        backend.set_autocommit(true).unwrap();
        assert_eq!(*log.lock().unwrap(), vec!["sent"]);
        assert_eq!(native.autocommit(), Some(true));

        backend.commit().unwrap();
        assert_eq!(log.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_unvalidated_settings_never_reach_driver() {
        let native = InMemoryTestDriver::new();
        let mut backend = Backend::new(
            DatabaseSettings::new("DEV;DRIVER=x"),
            IbmiDriver::with_native(Arc::new(native.clone())),
        );

        let err = backend.create_cursor().err().unwrap();
        assert!(matches!(err, DbalError::Config(_)));
        assert!(native.connection_strings().is_empty());
        assert!(!backend.is_connected());
    }

    #[test]
    fn test_on_commit_in_autocommit_runs_immediately() {
        let native = InMemoryTestDriver::new();
        let mut backend = backend(&native);

        let log = Arc::new(Mutex::new(0));
        let hook_log = Arc::clone(&log);
        backend.on_commit(move || *hook_log.lock().unwrap() += 1);

        assert_eq!(*log.lock().unwrap(), 1);
    }

    #[test]
    fn test_savepoints() {
        let native = InMemoryTestDriver::new();
        let mut backend = backend(&native);

        let first = backend.savepoint().unwrap();
        let second = backend.savepoint().unwrap();
        backend.savepoint_rollback(&second).unwrap();
        backend.savepoint_commit(&first).unwrap();

        let sql: Vec<String> = native.recorded_queries().into_iter().map(|q| q.sql).collect();
        assert_eq!(
            sql,
            vec![
                "SAVEPOINT \"s1\" ON ROLLBACK RETAIN CURSORS",
                "SAVEPOINT \"s2\" ON ROLLBACK RETAIN CURSORS",
                "ROLLBACK TO SAVEPOINT \"s2\"",
                "RELEASE SAVEPOINT \"s1\"",
            ]
        );
    }

    #[test]
    fn test_close_then_reconnect() {
        let native = InMemoryTestDriver::new();
        let mut backend = backend(&native);

        backend.ensure_connection().unwrap();
        backend.close().unwrap();
        assert!(!backend.is_connected());
        assert_eq!(native.close_count(), 1);

        backend.ensure_connection().unwrap();
        assert_eq!(native.connection_strings().len(), 2);
    }

    #[test]
    fn test_vendor() {
        let backend = backend(&InMemoryTestDriver::new());
        assert_eq!(backend.vendor(), "ibmi");
        assert_eq!(backend.display_name(), "IBM i Access");
    }
}
