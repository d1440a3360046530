pub mod api;
pub mod auth;
pub mod cli;
pub mod commands;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod logging;
pub mod models;
pub mod session;
pub mod sync;
pub mod ui;

pub use dashboard::Dashboard;
pub use error::{Result, UserdeskError};
