#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Storefront database connection adapter.
//!
//! This crate wraps one native SQL client handle (`SQLite`, `PostgreSQL` or `MySQL`
//! through `SQLx`) and exposes a small uniform surface to the storefront's query
//! builders: statement execution with positional binds, last-insert-id lookup and
//! column introspection.
//!
//! It also carries the "vulnerability blindness" toggle used by the security
//! training scenarios: when a request field is flagged as blind SQL-vulnerable, the
//! request-scoped error display is switched off for the duration of the statement
//! and restored afterwards, while the failure itself is still returned as a typed
//! [`SqlError`].
//!
//! # Example
//! ```rust,no_run
//! use storefront_db::{Connection, DbConnConfig, DebugDisplay, Params};
//!
//! # async fn run() -> storefront_db::Result<()> {
//! let cfg = DbConnConfig {
//!     dsn: Some("sqlite::memory:".to_owned()),
//!     ..Default::default()
//! };
//! let mut conn = Connection::connect(&cfg, DebugDisplay::new(true)).await?;
//! conn.execute("CREATE TABLE t (id INTEGER PRIMARY KEY, name TEXT)", Params::new())
//!     .await?;
//! let columns = conn.list_columns("t").await?;
//! assert_eq!(columns, ["id", "name"]);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod connection;
pub mod debug;
pub mod error;
pub mod options;
pub mod params;
pub mod query;
pub mod value;
pub mod vuln;

mod blindness;

pub use client::{NativeClient, RawOutcome, SqlxClient};
pub use config::{DEFAULT_CONNECTION, DbConnConfig, DebugConfig, ENV_PREFIX, StorefrontConfig};
pub use connection::Connection;
pub use debug::{DebugDisplay, GENERIC_ERROR_MESSAGE};
pub use error::SqlError;
pub use options::{
    DbConnectOptions, build_connect_options, build_connection, redact_credentials_in_dsn,
};
pub use params::{Params, VULN_FIELDS_KEY};
pub use query::{Order, Query, QueryKind};
pub use value::{ResultSet, Row, Value};
pub use vuln::{SQL, VulnFields, VulnSettings, VulnerableField, Vulnerability};

use thiserror::Error;

/// Library-local result type.
pub type Result<T> = std::result::Result<T, DbError>;

/// Typed error for configuration, connection setup and query building.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("Unknown DSN: {0}")]
    UnknownDsn(String),

    #[error("Unknown connection '{0}'")]
    UnknownConnection(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid connection parameter: {0}")]
    InvalidParameter(String),

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    #[error("Configuration error: {0}")]
    Figment(#[from] Box<figment::Error>),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),

    #[error(transparent)]
    Sql(#[from] SqlError),
}

/// Supported SQL dialects.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Dialect {
    MySql,
    Postgres,
    Sqlite,
}

impl Dialect {
    /// Detect the dialect from a DSN scheme.
    ///
    /// Note: we only check scheme prefixes and don't look at the tail (credentials etc.).
    ///
    /// # Errors
    /// Returns `DbError::UnknownDsn` if the DSN scheme is not recognized.
    pub fn detect(dsn: &str) -> Result<Self> {
        // Trim only leading spaces/newlines to be forgiving with env files.
        let s = dsn.trim_start();

        if s.starts_with("postgres://") || s.starts_with("postgresql://") {
            Ok(Self::Postgres)
        } else if s.starts_with("mysql://") || s.starts_with("mariadb://") {
            Ok(Self::MySql)
        } else if s.starts_with("sqlite:") {
            Ok(Self::Sqlite)
        } else {
            Err(DbError::UnknownDsn(dsn.to_owned()))
        }
    }

    /// Short driver name, as used in logs and configuration.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MySql => "mysql",
            Self::Postgres => "pgsql",
            Self::Sqlite => "sqlite",
        }
    }

    /// Quote an identifier for this dialect, doubling any embedded quote character.
    ///
    /// Dotted names (`table.column`) are quoted per segment and `*` is left as is.
    #[must_use]
    pub fn quote_ident(self, ident: &str) -> String {
        let quote = match self {
            Self::MySql => '`',
            Self::Postgres | Self::Sqlite => '"',
        };
        ident
            .split('.')
            .map(|part| {
                if part == "*" {
                    part.to_owned()
                } else {
                    let escaped = part.replace(quote, &format!("{quote}{quote}"));
                    format!("{quote}{escaped}{quote}")
                }
            })
            .collect::<Vec<_>>()
            .join(".")
    }

    /// Positional placeholder for the `n`-th (1-based) bind value.
    #[must_use]
    pub fn placeholder(self, n: usize) -> String {
        match self {
            Self::Postgres => format!("${n}"),
            Self::MySql | Self::Sqlite => "?".to_owned(),
        }
    }
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ===================== tests =====================
