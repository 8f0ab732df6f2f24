pub mod supervisor;

pub use supervisor::{NoteServerSupervisor, SupervisorState};
