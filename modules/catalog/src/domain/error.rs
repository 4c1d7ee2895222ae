use storefront_db::{DbError, SqlError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Special offer row has no usable '{0}' column")]
    MissingField(&'static str),

    #[error(transparent)]
    Db(#[from] DbError),
}

impl From<SqlError> for CatalogError {
    fn from(err: SqlError) -> Self {
        Self::Db(DbError::Sql(err))
    }
}
