//! The database connection adapter.

use crate::blindness::Blindness;
use crate::client::NativeClient;
use crate::config::DbConnConfig;
use crate::debug::DebugDisplay;
use crate::error::SqlError;
use crate::params::Params;
use crate::query::{Query, QueryKind};
use crate::value::{ResultSet, Value};
use crate::vuln::{VulnFields, VulnSettings};
use crate::{Dialect, Result};

/// One request-scoped database connection.
///
/// Statements run strictly one after another: every operation that touches the
/// native handle takes `&mut self`.
pub struct Connection {
    client: Box<dyn NativeClient>,
    dialect: Dialect,
    debug: DebugDisplay,
    settings: VulnSettings,
    blindness: Blindness,
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("dialect", &self.dialect)
            .field("debug", &self.debug)
            .field("settings", &self.settings)
            .field("blindness", &self.blindness)
            .finish_non_exhaustive()
    }
}

impl Connection {
    /// Connect using a per-connection configuration entry.
    ///
    /// # Errors
    /// Returns an error if the configuration is invalid or the database is unreachable.
    pub async fn connect(cfg: &DbConnConfig, debug: DebugDisplay) -> Result<Self> {
        crate::options::build_connection(cfg, debug).await
    }

    /// Wrap an already-open native client.
    #[must_use]
    pub fn from_client<C>(client: C, debug: DebugDisplay) -> Self
    where
        C: NativeClient + 'static,
    {
        Self::from_boxed(Box::new(client), debug)
    }

    #[must_use]
    pub fn from_boxed(client: Box<dyn NativeClient>, debug: DebugDisplay) -> Self {
        Self {
            dialect: client.dialect(),
            client,
            debug,
            settings: VulnSettings::default(),
            blindness: Blindness::default(),
        }
    }

    #[must_use]
    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// The request-scoped error display this connection toggles.
    #[must_use]
    pub fn debug(&self) -> &DebugDisplay {
        &self.debug
    }

    /// Start a query builder carrying the current vulnerability settings.
    #[must_use]
    pub fn query(&self, kind: QueryKind) -> Query {
        Query::new(kind, self.dialect).with_settings(self.settings.clone())
    }

    /// Get the vulnerability settings, replacing them first when `val` is given.
    pub fn settings(&mut self, val: Option<VulnSettings>) -> &VulnSettings {
        if let Some(val) = val {
            self.settings = val;
        }
        &self.settings
    }

    /// Session setup run once after connecting: `SET NAMES utf8` on `MySQL` and
    /// `PostgreSQL`, nothing on `SQLite`.
    ///
    /// # Errors
    /// Returns [`SqlError`] if the server rejects the statement.
    pub async fn init_session(&mut self) -> std::result::Result<(), SqlError> {
        if self.dialect != Dialect::Sqlite {
            self.execute("SET NAMES utf8", Params::new()).await?;
        }
        Ok(())
    }

    /// Id of the last inserted row.
    ///
    /// `PostgreSQL` has no native accessor, so this runs `SELECT lastval()`;
    /// other dialects report the id the driver recorded for the latest insert.
    ///
    /// # Errors
    /// Returns [`SqlError`] if the `lastval()` round-trip fails (e.g. no sequence
    /// was used in this session).
    pub async fn insert_id(&mut self) -> std::result::Result<Option<i64>, SqlError> {
        if self.dialect == Dialect::Postgres {
            let rs = self.execute("SELECT lastval() as id", Params::new()).await?;
            return Ok(rs
                .current()
                .and_then(|row| row.get("id"))
                .and_then(Value::as_i64));
        }
        Ok(self.client.last_insert_id())
    }

    /// Column names of `table`, in the order the database reports them.
    ///
    /// # Errors
    /// Returns [`SqlError`] if the introspection statement fails.
    pub async fn list_columns(&mut self, table: &str) -> std::result::Result<Vec<String>, SqlError> {
        let (sql, params, column) = match self.dialect {
            Dialect::MySql => (
                format!("DESCRIBE {}", self.dialect.quote_ident(table)),
                Params::new(),
                "Field",
            ),
            Dialect::Postgres => (
                "SELECT column_name::text AS column_name FROM information_schema.columns \
                 WHERE table_name = $1 AND table_catalog = current_database() \
                 ORDER BY ordinal_position"
                    .to_owned(),
                Params::new().bind(table),
                "column_name",
            ),
            Dialect::Sqlite => (
                format!("PRAGMA table_info('{}')", table.replace('\'', "''")),
                Params::new(),
                "name",
            ),
        };

        let rs = self.execute(&sql, params).await?;
        Ok(rs.column_strings(column))
    }

    /// Run one prepared statement.
    ///
    /// A `vuln_fields` entry in `params` is stripped before binding; when present,
    /// blindness is evaluated for the duration of the statement and always ended
    /// before this returns.
    ///
    /// # Errors
    /// Returns [`SqlError`] carrying the driver error, the statement text and the
    /// vulnerability flags active when it failed.
    pub async fn execute(
        &mut self,
        query: &str,
        mut params: Params,
    ) -> std::result::Result<ResultSet, SqlError> {
        let Some(fields) = params.take_vuln_fields() else {
            return self.run(query, params.binds()).await;
        };

        let mut scope = BlindnessScope::enter(self, fields);
        let result = scope.conn.run(query, params.binds()).await;
        drop(scope);
        result
    }

    /// Begin blindness evaluation for `fields`.
    ///
    /// No-op when no field is given or a vulnerable evaluation is already active.
    /// A blind SQL-vulnerable field switches error display off until
    /// [`Connection::stop_blindness`].
    pub fn start_blindness(&mut self, fields: impl Into<VulnFields>) {
        self.blindness.start(&fields.into(), &self.debug);
    }

    /// End blindness evaluation, restoring error display if it was suppressed.
    pub fn stop_blindness(&mut self) {
        self.blindness.stop(&self.debug);
    }

    /// `None` outside of an evaluation.
    #[must_use]
    pub fn is_vulnerable(&self) -> Option<bool> {
        self.blindness.vulnerable()
    }

    /// `None` outside of an evaluation.
    #[must_use]
    pub fn is_blinded(&self) -> Option<bool> {
        self.blindness.blinded()
    }

    /// Close the native handle.
    ///
    /// # Errors
    /// Returns the driver error if the handle does not shut down cleanly.
    pub async fn close(self) -> Result<()> {
        self.client.close().await?;
        Ok(())
    }

    async fn run(&mut self, query: &str, binds: &[Value]) -> std::result::Result<ResultSet, SqlError> {
        tracing::debug!(
            dialect = %self.dialect,
            sql = query,
            binds = binds.len(),
            "executing statement"
        );

        match self.client.execute(query, binds).await {
            Ok(raw) => Ok(ResultSet::new(raw.columns, raw.rows, raw.rows_affected)),
            Err(source) => {
                let err = SqlError::new(
                    query,
                    source,
                    self.blindness.vulnerable(),
                    self.blindness.blinded(),
                );
                tracing::warn!(
                    dialect = %self.dialect,
                    vulnerable = ?err.is_vulnerable(),
                    blind = ?err.is_blind(),
                    error = err.message(),
                    "statement failed"
                );
                Err(err)
            }
        }
    }
}

/// Ends blindness evaluation when dropped, so an error return or a cancelled
/// statement cannot leave error display switched off.
struct BlindnessScope<'c> {
    conn: &'c mut Connection,
}

impl<'c> BlindnessScope<'c> {
    fn enter(conn: &'c mut Connection, fields: VulnFields) -> Self {
        conn.start_blindness(fields);
        Self { conn }
    }
}

impl Drop for BlindnessScope<'_> {
    fn drop(&mut self) {
        self.conn.stop_blindness();
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::client::SqlxClient;
    use crate::vuln::{SQL, Vulnerability, VulnerableField};
    use sqlx::sqlite::SqliteConnectOptions;
    use std::str::FromStr;

    async fn sqlite(display: bool) -> Connection {
        let opts = SqliteConnectOptions::from_str("sqlite::memory:").unwrap();
        let client = SqlxClient::connect_sqlite(&opts).await.unwrap();
        Connection::from_client(client, DebugDisplay::new(display))
    }

    #[tokio::test]
    async fn execute_wraps_rows() {
        let mut conn = sqlite(true).await;
        conn.execute("CREATE TABLE t (id INTEGER PRIMARY KEY, name TEXT)", Params::new())
            .await
            .unwrap();
        conn.execute(
            "INSERT INTO t (name) VALUES (?), (?)",
            Params::new().bind("a").bind("b"),
        )
        .await
        .unwrap();

        let rs = conn
            .execute("SELECT id, name FROM t ORDER BY id", Params::new())
            .await
            .unwrap();
        assert_eq!(rs.columns(), ["id", "name"]);
        assert_eq!(rs.len(), 2);
        assert_eq!(rs.current().unwrap().get("name"), Some(&Value::from("a")));
    }

    #[tokio::test]
    async fn failure_without_vuln_fields_has_unset_flags() {
        let mut conn = sqlite(true).await;
        let err = conn
            .execute("SELECT * FROM missing_table", Params::new())
            .await
            .unwrap_err();
        assert!(err.message().contains("missing_table"));
        assert_eq!(err.query(), "SELECT * FROM missing_table");
        assert_eq!(err.is_vulnerable(), None);
        assert_eq!(err.is_blind(), None);
    }

    #[tokio::test]
    async fn blind_failure_reports_flags_and_restores_display() {
        let mut conn = sqlite(true).await;
        let field = VulnerableField::new("id").with(SQL, Vulnerability::blind());

        let err = conn
            .execute(
                "SELECT * FROM missing_table WHERE id = ?",
                Params::new().bind(1).with_vuln_fields(field),
            )
            .await
            .unwrap_err();

        assert_eq!(err.is_vulnerable(), Some(true));
        assert_eq!(err.is_blind(), Some(true));
        assert!(conn.debug().display_errors());
        assert_eq!(conn.is_vulnerable(), None);
        assert_eq!(conn.is_blinded(), None);
    }

    #[tokio::test]
    async fn settings_getter_keeps_value_on_none() {
        let mut conn = sqlite(true).await;
        assert!(conn.settings(None).is_empty());

        let settings = VulnSettings::new()
            .with_field(VulnerableField::new("id").with(SQL, Vulnerability::visible()));
        conn.settings(Some(settings.clone()));
        assert_eq!(conn.settings(None), &settings);
    }
}
