pub mod config;
pub mod cors;
pub mod error;
pub mod logging;
pub mod routes;

pub use config::Settings;
pub use routes::{app_from_settings, build_app, AppState, API_VERSION};
