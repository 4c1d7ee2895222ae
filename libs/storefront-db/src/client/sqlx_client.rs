//! `SQLx`-backed native client: one live connection, no pool.

use async_trait::async_trait;
use sqlx::mysql::{MySqlConnectOptions, MySqlConnection, MySqlQueryResult};
use sqlx::postgres::{PgConnectOptions, PgConnection, PgQueryResult};
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection, SqliteQueryResult, SqliteRow};
use sqlx::{ConnectOptions, Connection as _, Executor as _};

use super::codec::{bind_values, collect, decode_mysql, decode_postgres};
use super::{NativeClient, RawOutcome};
use crate::Dialect;
use crate::value::Value;

enum DriverConn {
    Postgres(PgConnection),
    MySql(MySqlConnection),
    Sqlite(SqliteConnection),
}

/// A live `SQLx` connection for one of the supported dialects.
pub struct SqlxClient {
    conn: DriverConn,
    last_insert_id: Option<i64>,
}

impl std::fmt::Debug for SqlxClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqlxClient")
            .field("dialect", &self.dialect())
            .field("last_insert_id", &self.last_insert_id)
            .finish_non_exhaustive()
    }
}

impl SqlxClient {
    /// Open a `PostgreSQL` connection.
    ///
    /// # Errors
    /// Returns the driver error if the connection cannot be established.
    pub async fn connect_postgres(opts: &PgConnectOptions) -> Result<Self, sqlx::Error> {
        let conn = opts.connect().await?;
        Ok(Self::from_conn(DriverConn::Postgres(conn)))
    }

    /// Open a `MySQL` connection.
    ///
    /// # Errors
    /// Returns the driver error if the connection cannot be established.
    pub async fn connect_mysql(opts: &MySqlConnectOptions) -> Result<Self, sqlx::Error> {
        let conn = opts.connect().await?;
        Ok(Self::from_conn(DriverConn::MySql(conn)))
    }

    /// Open a `SQLite` connection.
    ///
    /// # Errors
    /// Returns the driver error if the database cannot be opened.
    pub async fn connect_sqlite(opts: &SqliteConnectOptions) -> Result<Self, sqlx::Error> {
        let conn = opts.connect().await?;
        Ok(Self::from_conn(DriverConn::Sqlite(conn)))
    }

    fn from_conn(conn: DriverConn) -> Self {
        Self {
            conn,
            last_insert_id: None,
        }
    }
}

#[async_trait]
impl NativeClient for SqlxClient {
    fn dialect(&self) -> Dialect {
        match self.conn {
            DriverConn::Postgres(_) => Dialect::Postgres,
            DriverConn::MySql(_) => Dialect::MySql,
            DriverConn::Sqlite(_) => Dialect::Sqlite,
        }
    }

    async fn execute(&mut self, sql: &str, binds: &[Value]) -> Result<RawOutcome, sqlx::Error> {
        let Self {
            conn,
            last_insert_id,
        } = self;

        match conn {
            DriverConn::Postgres(conn) => {
                let query = bind_values(sqlx::query(sql), binds);
                collect::<sqlx::Postgres, _, _, _>(
                    conn.fetch_many(query),
                    |done: &PgQueryResult| done.rows_affected(),
                    decode_postgres,
                )
                .await
            }
            DriverConn::MySql(conn) => {
                let query = bind_values(sqlx::query(sql), binds);
                collect::<sqlx::MySql, _, _, _>(
                    conn.fetch_many(query),
                    |done: &MySqlQueryResult| {
                        // 0 means the statement generated no id
                        if let Ok(id) = i64::try_from(done.last_insert_id()) {
                            if id != 0 {
                                *last_insert_id = Some(id);
                            }
                        }
                        done.rows_affected()
                    },
                    decode_mysql,
                )
                .await
            }
            DriverConn::Sqlite(conn) => {
                let query = bind_values(sqlx::query(sql), binds);
                // SQLite storage classes all map onto the primitives
                collect::<sqlx::Sqlite, _, _, _>(
                    conn.fetch_many(query),
                    |done: &SqliteQueryResult| {
                        let id = done.last_insert_rowid();
                        if id != 0 {
                            *last_insert_id = Some(id);
                        }
                        done.rows_affected()
                    },
                    |_: &SqliteRow, _| None,
                )
                .await
            }
        }
    }

    fn last_insert_id(&self) -> Option<i64> {
        self.last_insert_id
    }

    async fn close(self: Box<Self>) -> Result<(), sqlx::Error> {
        match self.conn {
            DriverConn::Postgres(c) => c.close().await,
            DriverConn::MySql(c) => c.close().await,
            DriverConn::Sqlite(c) => c.close().await,
        }
    }
}
