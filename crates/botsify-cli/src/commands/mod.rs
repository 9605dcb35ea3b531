//! CLI command handlers

pub mod navigate;
pub mod params;
