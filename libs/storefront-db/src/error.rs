//! Domain error raised by statement execution.

use thiserror::Error;

/// A failed statement.
///
/// Carries the driver message, the statement text and the vulnerability flags
/// that were active when the statement failed. The driver error stays reachable
/// through [`std::error::Error::source`].
#[derive(Debug, Error)]
#[error("Database error:\n{message} \n in query:\n{query}")]
pub struct SqlError {
    message: String,
    query: String,
    vulnerable: Option<bool>,
    blind: Option<bool>,
    #[source]
    source: sqlx::Error,
}

impl SqlError {
    #[must_use]
    pub fn new(
        query: impl Into<String>,
        source: sqlx::Error,
        vulnerable: Option<bool>,
        blind: Option<bool>,
    ) -> Self {
        Self {
            message: driver_message(&source),
            query: query.into(),
            vulnerable,
            blind,
            source,
        }
    }

    /// Driver-reported message, without the statement text.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    #[must_use]
    pub fn query(&self) -> &str {
        &self.query
    }

    /// Whether a field of the failing statement was flagged SQL-vulnerable.
    /// `None` when no vulnerability evaluation took place.
    #[must_use]
    pub fn is_vulnerable(&self) -> Option<bool> {
        self.vulnerable
    }

    /// Whether the statement ran in blind mode.
    /// `None` when no vulnerability evaluation took place.
    #[must_use]
    pub fn is_blind(&self) -> Option<bool> {
        self.blind
    }

    /// `SQLSTATE` (or driver-specific) code, when the database reported one.
    #[must_use]
    pub fn code(&self) -> Option<String> {
        let db = self.source.as_database_error()?;
        db.code().map(std::borrow::Cow::into_owned)
    }

    #[must_use]
    pub fn driver_error(&self) -> &sqlx::Error {
        &self.source
    }
}

/// Prefer the bare database message over sqlx's decorated `Display`.
fn driver_message(err: &sqlx::Error) -> String {
    match err.as_database_error() {
        Some(db) => db.message().to_owned(),
        None => err.to_string(),
    }
}
