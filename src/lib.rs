pub mod api;
pub mod app;
pub mod config;
pub mod error;
pub mod events;
pub mod logging;
pub mod metrics;
pub mod seed;
pub mod server;

pub use app::TrackerService;
pub use server::{create_server, AppState};
