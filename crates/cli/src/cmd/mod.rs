//! CLI command implementations

pub mod config;
pub mod setup;
pub mod start;
pub mod status;
pub mod stop;
