//! Native SQL clients.
//!
//! [`NativeClient`] is the seam between the [`crate::Connection`] adapter and a
//! concrete driver. The production implementation is [`SqlxClient`], which holds
//! one `SQLx` connection per dialect.

mod codec;
mod sqlx_client;

pub use sqlx_client::SqlxClient;

use async_trait::async_trait;

use crate::Dialect;
use crate::value::Value;

/// Raw driver output for one statement, before wrapping into a [`crate::ResultSet`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawOutcome {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
    pub rows_affected: u64,
}

/// A single native database handle.
#[async_trait]
pub trait NativeClient: Send {
    fn dialect(&self) -> Dialect;

    /// Prepare and run one statement with positional binds.
    async fn execute(&mut self, sql: &str, binds: &[Value]) -> Result<RawOutcome, sqlx::Error>;

    /// Id generated by the most recent insert, as reported by the driver itself.
    ///
    /// Drivers without such an accessor (`PostgreSQL`) return `None`.
    fn last_insert_id(&self) -> Option<i64>;

    async fn close(self: Box<Self>) -> Result<(), sqlx::Error>;
}
