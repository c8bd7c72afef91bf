pub mod client;
pub mod notify;
pub mod orchestrator;
pub mod query;
pub mod realtime;
pub mod state;

pub use orchestrator::DashboardOrchestrator;
pub use realtime::dispatcher::RealtimeDispatcher;
pub use state::{AppState, Viewer};
