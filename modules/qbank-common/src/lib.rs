pub mod config;
pub mod error;
pub mod grouping;
pub mod naming;
pub mod types;

pub use config::Config;
pub use error::{ArchiveError, ConfigError, IngestError, PersistenceError, SupervisorError, ValidationError};
pub use types::*;
