use qbank_common::{PersistenceError, ValidationError};
use thiserror::Error;

/// Everything the repository can fail with. The orchestrator maps this onto
/// the outcome's `catalog_error` string rather than propagating it raw.
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

impl From<sqlx::Error> for CatalogError {
    fn from(e: sqlx::Error) -> Self {
        CatalogError::Persistence(PersistenceError::Database(e))
    }
}

pub type Result<T> = std::result::Result<T, CatalogError>;
