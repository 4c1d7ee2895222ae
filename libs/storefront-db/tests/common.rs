#![allow(clippy::unwrap_used, clippy::expect_used)]
#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use storefront_db::{
    Connection, DbConnConfig, DebugDisplay, Dialect, NativeClient, RawOutcome, Value,
};

/// One statement seen by [`FakeClient`].
#[derive(Debug, Clone, PartialEq)]
pub struct Recorded {
    pub sql: String,
    pub binds: Vec<Value>,
    /// Error display value observed while the statement ran.
    pub display_errors: bool,
}

/// Scripted stand-in for a `MySQL`/`PostgreSQL` driver.
///
/// Responses are consumed in order; once the script is empty every statement
/// succeeds with no rows.
pub struct FakeClient {
    dialect: Dialect,
    observed: DebugDisplay,
    log: Arc<Mutex<Vec<Recorded>>>,
    script: VecDeque<Result<RawOutcome, sqlx::Error>>,
    last_insert_id: Option<i64>,
}

impl FakeClient {
    pub fn new(dialect: Dialect, observed: DebugDisplay) -> Self {
        Self {
            dialect,
            observed,
            log: Arc::default(),
            script: VecDeque::new(),
            last_insert_id: None,
        }
    }

    #[must_use]
    pub fn then_rows(mut self, columns: &[&str], rows: Vec<Vec<Value>>) -> Self {
        self.script.push_back(Ok(RawOutcome {
            columns: columns.iter().map(|c| (*c).to_owned()).collect(),
            rows,
            rows_affected: 0,
        }));
        self
    }

    #[must_use]
    pub fn then_fail(mut self, message: &str) -> Self {
        self.script
            .push_back(Err(sqlx::Error::Protocol(message.to_owned())));
        self
    }

    #[must_use]
    pub fn with_last_insert_id(mut self, id: i64) -> Self {
        self.last_insert_id = Some(id);
        self
    }

    pub fn log(&self) -> Arc<Mutex<Vec<Recorded>>> {
        Arc::clone(&self.log)
    }
}

#[async_trait]
impl NativeClient for FakeClient {
    fn dialect(&self) -> Dialect {
        self.dialect
    }

    async fn execute(&mut self, sql: &str, binds: &[Value]) -> Result<RawOutcome, sqlx::Error> {
        self.log.lock().unwrap().push(Recorded {
            sql: sql.to_owned(),
            binds: binds.to_vec(),
            display_errors: self.observed.display_errors(),
        });
        self.script
            .pop_front()
            .unwrap_or_else(|| Ok(RawOutcome::default()))
    }

    fn last_insert_id(&self) -> Option<i64> {
        self.last_insert_id
    }

    async fn close(self: Box<Self>) -> Result<(), sqlx::Error> {
        Ok(())
    }
}

/// Connection over a [`FakeClient`], plus the statement log.
pub fn fake_connection(
    client: FakeClient,
    debug: DebugDisplay,
) -> (Connection, Arc<Mutex<Vec<Recorded>>>) {
    let log = client.log();
    (Connection::from_client(client, debug), log)
}

pub async fn sqlite_memory(debug: DebugDisplay) -> Connection {
    let cfg = DbConnConfig {
        dsn: Some("sqlite::memory:".to_owned()),
        ..Default::default()
    };
    Connection::connect(&cfg, debug).await.unwrap()
}
