pub mod error;
pub mod repository;
mod rows;
#[cfg(feature = "test-utils")]
pub mod testutil;

pub use error::{CatalogError, Result};
pub use repository::Repository;
