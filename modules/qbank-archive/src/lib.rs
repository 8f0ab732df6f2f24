pub mod archive;
pub mod relocate;

pub use archive::{ArchiveWriter, ArchivedFiles};
pub use relocate::MediaRelocator;
