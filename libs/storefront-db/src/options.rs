//! Connection building from configuration.

use crate::client::SqlxClient;
use crate::config::DbConnConfig;
use crate::connection::Connection;
use crate::debug::DebugDisplay;
use crate::{DbError, Dialect, Result};
use sqlx::mysql::MySqlConnectOptions;
use sqlx::postgres::PgConnectOptions;
use sqlx::sqlite::SqliteConnectOptions;
use std::str::FromStr;

/// Typed `SQLx` connect options for one dialect.
#[derive(Debug, Clone)]
pub enum DbConnectOptions {
    Sqlite(SqliteConnectOptions),
    Postgres(PgConnectOptions),
    MySql(MySqlConnectOptions),
}

impl DbConnectOptions {
    #[must_use]
    pub fn dialect(&self) -> Dialect {
        match self {
            Self::Sqlite(_) => Dialect::Sqlite,
            Self::Postgres(_) => Dialect::Postgres,
            Self::MySql(_) => Dialect::MySql,
        }
    }

    /// Open the native client.
    ///
    /// # Errors
    /// Returns an error if the database connection fails.
    pub async fn connect(&self) -> Result<SqlxClient> {
        let client = match self {
            Self::Sqlite(opts) => SqlxClient::connect_sqlite(opts).await?,
            Self::Postgres(opts) => SqlxClient::connect_postgres(opts).await?,
            Self::MySql(opts) => SqlxClient::connect_mysql(opts).await?,
        };
        Ok(client)
    }
}

impl std::fmt::Display for DbConnectOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(opts) => {
                let filename = opts.get_filename().display().to_string();
                if filename.is_empty() || filename == ":memory:" {
                    write!(f, "sqlite::memory:")
                } else {
                    write!(f, "sqlite://{filename}")
                }
            }
            Self::Postgres(opts) => write!(
                f,
                "postgresql://<redacted>@{}:{}/{}",
                opts.get_host(),
                opts.get_port(),
                opts.get_database().unwrap_or("")
            ),
            Self::MySql(_) => write!(f, "mysql://<redacted>@..."),
        }
    }
}

/// Build a connection from a configuration entry.
///
/// `${VAR}` references in the DSN and password are expanded from the environment,
/// then `user`/`password` override whatever the DSN carries. The session is then
/// prepared with [`Connection::init_session`].
///
/// # Errors
/// Returns an error if the configuration is invalid, a referenced environment
/// variable is missing, or the database is unreachable.
pub async fn build_connection(cfg: &DbConnConfig, debug: DebugDisplay) -> Result<Connection> {
    let opts = build_connect_options(cfg)?;
    let dialect = opts.dialect();

    let log_dsn = redact_credentials_in_dsn(cfg.dsn.as_deref());
    tracing::debug!(dsn = log_dsn, %dialect, endpoint = %opts, "Opening database connection");

    let client = opts.connect().await?;
    let mut conn = Connection::from_client(client, debug);
    conn.init_session().await?;

    tracing::info!(%dialect, "Database connection established");
    Ok(conn)
}

/// Resolve a configuration entry into typed connect options without connecting.
///
/// # Errors
/// Returns an error if the DSN is missing or unparseable, or a referenced
/// environment variable is unset.
pub fn build_connect_options(cfg: &DbConnConfig) -> Result<DbConnectOptions> {
    let dsn = cfg
        .dsn
        .as_deref()
        .ok_or_else(|| DbError::InvalidConfig("missing 'dsn'".to_owned()))?;
    let dsn = expand_env_vars(dsn)?;
    let password = cfg.password.as_deref().map(resolve_password).transpose()?;
    let user = cfg.user.as_deref();

    let opts = match Dialect::detect(&dsn)? {
        Dialect::Sqlite => {
            if user.is_some() || password.is_some() {
                tracing::debug!("user/password ignored for SQLite");
            }
            let opts = SqliteConnectOptions::from_str(&dsn)
                .map_err(|e| DbError::InvalidParameter(e.to_string()))?
                .create_if_missing(true);
            DbConnectOptions::Sqlite(opts)
        }
        Dialect::Postgres => {
            let mut opts = PgConnectOptions::from_str(&dsn)
                .map_err(|e| DbError::InvalidParameter(e.to_string()))?;
            if let Some(user) = user {
                opts = opts.username(user);
            }
            if let Some(password) = &password {
                opts = opts.password(password);
            }
            DbConnectOptions::Postgres(opts)
        }
        Dialect::MySql => {
            let dsn = normalize_mysql_scheme(&dsn);
            let mut opts = MySqlConnectOptions::from_str(&dsn)
                .map_err(|e| DbError::InvalidParameter(e.to_string()))?;
            if let Some(user) = user {
                opts = opts.username(user);
            }
            if let Some(password) = &password {
                opts = opts.password(password);
            }
            DbConnectOptions::MySql(opts)
        }
    };

    Ok(opts)
}

/// `SQLx` only understands the `mysql://` scheme.
fn normalize_mysql_scheme(dsn: &str) -> String {
    let dsn = dsn.trim_start();
    match dsn.strip_prefix("mariadb://") {
        Some(rest) => format!("mysql://{rest}"),
        None => dsn.to_owned(),
    }
}

/// Expand environment variables in a string.
fn expand_env_vars(input: &str) -> Result<String> {
    let re = regex::Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}")
        .map_err(|e| DbError::InvalidParameter(e.to_string()))?;
    let mut result = input.to_owned();

    for caps in re.captures_iter(input) {
        let full_match = &caps[0];
        let var_name = &caps[1];
        let value = std::env::var(var_name)?;
        result = result.replace(full_match, &value);
    }

    Ok(result)
}

/// Resolve password from environment variable if it is exactly `${VAR}`.
fn resolve_password(password: &str) -> Result<String> {
    if password.starts_with("${") && password.ends_with('}') {
        let var_name = &password[2..password.len() - 1];
        Ok(std::env::var(var_name)?)
    } else {
        Ok(password.to_owned())
    }
}

/// Redact credentials from DSN for logging.
#[must_use]
pub fn redact_credentials_in_dsn(dsn: Option<&str>) -> String {
    match dsn {
        Some(dsn) if dsn.contains('@') => {
            if let Ok(mut parsed) = url::Url::parse(dsn) {
                if parsed.password().is_some() && parsed.set_password(Some("***")).is_err() {
                    return "***".to_owned();
                }
                parsed.to_string()
            } else {
                "***".to_owned()
            }
        }
        Some(dsn) => dsn.to_owned(),
        None => "none".to_owned(),
    }
}
