pub mod grouping;
pub mod orchestrator;
pub mod payload;

pub use grouping::group;
pub use orchestrator::Orchestrator;
pub use payload::{ExtractionPayload, IngestionOutcome};
