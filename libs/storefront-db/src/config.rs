//! Storefront configuration.
//!
//! Layered the same way for every binary: built-in defaults, then an optional
//! YAML file, then `STOREFRONT__*` environment variables (`__` separates nesting
//! levels, e.g. `STOREFRONT__DB__MAIN__DSN`).

use crate::vuln::VulnSettings;
use crate::{DbError, Result};
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Yaml};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Environment variable prefix for configuration overrides.
pub const ENV_PREFIX: &str = "STOREFRONT__";

/// Connection name used when none is given.
pub const DEFAULT_CONNECTION: &str = "default";

/// One named database connection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DbConnConfig {
    /// Scheme-prefixed DSN, e.g. `mysql://host/db` or `sqlite:shop.db`.
    /// May contain `${VAR}` references.
    #[serde(default, alias = "connection", skip_serializing_if = "Option::is_none")]
    pub dsn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    /// Literal password or a `${VAR}` reference.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebugConfig {
    /// Initial value of the request-scoped error display.
    #[serde(default = "default_display_errors")]
    pub display_errors: bool,
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            display_errors: default_display_errors(),
        }
    }
}

fn default_display_errors() -> bool {
    true
}

/// Top-level configuration document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StorefrontConfig {
    #[serde(default)]
    pub db: BTreeMap<String, DbConnConfig>,
    #[serde(default)]
    pub debug: DebugConfig,
    #[serde(default)]
    pub vulnerabilities: VulnSettings,
}

impl StorefrontConfig {
    /// Extract configuration from a prepared figment.
    ///
    /// # Errors
    /// Returns `DbError::Figment` if the merged document does not match the schema.
    pub fn from_figment(figment: &Figment) -> Result<Self> {
        figment.extract().map_err(|e| DbError::Figment(Box::new(e)))
    }

    /// Load defaults, then `path` (if any), then `STOREFRONT__*` environment overrides.
    ///
    /// # Errors
    /// Returns an error if the file is missing or any layer fails to parse.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::new().merge(Serialized::defaults(Self::default()));
        if let Some(path) = path {
            if !path.is_file() {
                return Err(DbError::InvalidConfig(format!(
                    "config file does not exist: {}",
                    path.display()
                )));
            }
            figment = figment.merge(Yaml::file(path));
        }
        figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));

        let config = Self::from_figment(&figment)?;
        tracing::debug!(
            connections = config.db.len(),
            display_errors = config.debug.display_errors,
            "Configuration loaded"
        );
        Ok(config)
    }

    /// Look up a named connection.
    ///
    /// # Errors
    /// Returns `DbError::UnknownConnection` if no entry has that name.
    pub fn connection(&self, name: &str) -> Result<&DbConnConfig> {
        self.db
            .get(name)
            .ok_or_else(|| DbError::UnknownConnection(name.to_owned()))
    }
}
