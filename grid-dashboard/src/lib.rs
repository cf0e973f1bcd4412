pub mod api;
pub mod collaborators;
pub mod config;
pub mod loader;
pub mod observability;
pub mod prometheus;
pub mod report;
pub mod session;

pub use api::{router, AppState};
pub use session::{DashboardSession, SessionParams};
