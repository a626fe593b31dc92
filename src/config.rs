use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{DbalError, Result};

/// Data source used when the settings don't name one.
pub const DEFAULT_DSN: &str = "PROD";

/// Engine name of the ODBC-backed backend.
pub const DEFAULT_ENGINE: &str = "ibmi";

fn default_engine() -> String {
    DEFAULT_ENGINE.to_string()
}

fn default_autocommit() -> bool {
    true
}

/// Database settings as supplied by the embedding application.
///
/// # Example
/// ```
/// use ibmi_dbal::config::DatabaseSettings;
///
/// let settings = DatabaseSettings::new("DEV").with_credentials("APPUSER", "secret");
/// assert_eq!(settings.connection_params().dsn(), "DEV");
/// ```
#[derive(Clone, Serialize, Deserialize, PartialEq)]
pub struct DatabaseSettings {
    /// Registry key of the native driver.
    #[serde(default = "default_engine")]
    pub engine: String,
    /// ODBC data source name.
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    /// Extra connection-string attributes, e.g. `NAM=1` or `DBQ=FORMS`.
    #[serde(default)]
    pub options: BTreeMap<String, String>,
    /// Transport autocommit for new sessions.
    #[serde(default = "default_autocommit")]
    pub autocommit: bool,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            engine: default_engine(),
            name: None,
            user: None,
            password: None,
            options: BTreeMap::new(),
            autocommit: default_autocommit(),
        }
    }
}

impl DatabaseSettings {
    pub fn new(dsn: impl Into<String>) -> Self {
        Self {
            name: Some(dsn.into()),
            ..Self::default()
        }
    }

    pub fn with_engine(mut self, engine: impl Into<String>) -> Self {
        self.engine = engine.into();
        self
    }

    pub fn with_credentials(mut self, user: impl Into<String>, password: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self.password = Some(password.into());
        self
    }

    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    /// Project the settings onto the parameters a driver needs to connect.
    pub fn connection_params(&self) -> ConnectionParams {
        ConnectionParams {
            dsn: self.name.clone().unwrap_or_else(|| DEFAULT_DSN.to_string()),
            user: self.user.clone(),
            password: self.password.clone(),
            attributes: self.options.clone(),
        }
    }

    /// Reject settings that would produce a malformed connection string.
    pub fn validate(&self) -> Result<()> {
        if self.engine.trim().is_empty() {
            return Err(DbalError::Config("engine must not be empty".to_string()));
        }
        let values = self
            .name
            .iter()
            .chain(self.user.iter())
            .chain(self.password.iter())
            .chain(self.options.keys())
            .chain(self.options.values());
        for value in values {
            if value.contains(';') {
                return Err(DbalError::Config(
                    "connection attributes must not contain ';'".to_string(),
                ));
            }
        }
        Ok(())
    }
}

impl fmt::Debug for DatabaseSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseSettings")
            .field("engine", &self.engine)
            .field("name", &self.name)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("options", &self.options)
            .field("autocommit", &self.autocommit)
            .finish()
    }
}

/// Parameters for opening one session. Immutable once built.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct ConnectionParams {
    #[serde(rename = "DSN", default = "default_dsn")]
    dsn: String,
    #[serde(rename = "UID", default)]
    user: Option<String>,
    #[serde(rename = "PWD", default)]
    password: Option<String>,
    #[serde(flatten)]
    attributes: BTreeMap<String, String>,
}

fn default_dsn() -> String {
    DEFAULT_DSN.to_string()
}

impl ConnectionParams {
    pub fn new(dsn: impl Into<String>) -> Self {
        Self {
            dsn: dsn.into(),
            user: None,
            password: None,
            attributes: BTreeMap::new(),
        }
    }

    pub fn dsn(&self) -> &str {
        &self.dsn
    }

    pub fn user(&self) -> Option<&str> {
        self.user.as_deref()
    }

    /// Render the ODBC connection string. Values holding `;`, braces or
    /// edge whitespace are brace-quoted so they cannot add attributes.
    pub fn connection_string(&self) -> String {
        let mut out = format!("DSN={};", attribute_value(&self.dsn));
        if let Some(user) = &self.user {
            out.push_str(&format!("UID={};", attribute_value(user)));
        }
        if let Some(password) = &self.password {
            out.push_str(&format!("PWD={};", attribute_value(password)));
        }
        for (key, value) in &self.attributes {
            out.push_str(&format!("{}={};", key, attribute_value(value)));
        }
        out
    }
}

fn attribute_value(value: &str) -> Cow<'_, str> {
    let needs_braces = value.contains([';', '{', '}']) || value.trim() != value;
    if needs_braces {
        Cow::Owned(format!("{{{}}}", value.replace('}', "}}")))
    } else {
        Cow::Borrowed(value)
    }
}

impl fmt::Debug for ConnectionParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionParams")
            .field("dsn", &self.dsn)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("attributes", &self.attributes)
            .finish()
    }
}
