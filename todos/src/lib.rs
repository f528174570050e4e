//! todos library
//!
//! The binary is a thin wrapper, the router and app state are exposed here
//! so integration tests can drive the full request pipeline.

pub mod api;
pub mod app_state;
pub mod db;
pub mod http;
pub mod init_telemetry;
pub mod scheduler;
pub mod services;
pub mod settings;
pub mod stop_flag;

pub use app_state::AppState;
