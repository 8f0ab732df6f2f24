pub mod app;
pub mod dto;
pub mod handlers;
pub mod log_sink;
pub mod state;

pub use app::build_router;
pub use log_sink::PersistentLogLayer;
pub use state::AppState;
