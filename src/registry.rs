use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::{DbalError, Result};
use crate::traits::NativeDriver;

/// Name-keyed registration table, filled explicitly at startup.
#[derive(Debug, Clone)]
pub struct Registry<T> {
    entries: BTreeMap<String, T>,
}

impl<T> Default for Registry<T> {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }
}

impl<T> Registry<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `value` under `name`, replacing any previous entry.
    pub fn register(&mut self, name: impl Into<String>, value: T) -> &mut Self {
        self.entries.insert(name.into(), value);
        self
    }

    pub fn get(&self, name: &str) -> Result<&T> {
        self.entries.get(name).ok_or_else(|| DbalError::NotRegistered {
            name: name.to_string(),
            available: self.names(),
        })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }
}

/// Native drivers selectable through `DatabaseSettings::engine`.
pub type DriverRegistry = Registry<Arc<dyn NativeDriver>>;

impl DriverRegistry {
    /// The drivers compiled into this build: `ibmi` when the `odbc` feature
    /// is on, nothing otherwise.
    pub fn with_defaults() -> Self {
        #[allow(unused_mut)]
        let mut registry = Self::new();
        #[cfg(feature = "odbc")]
        registry.register(
            crate::config::DEFAULT_ENGINE,
            Arc::new(crate::drivers::OdbcDriver),
        );
        registry
    }
}
