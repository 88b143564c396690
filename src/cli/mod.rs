//! CLI command handlers

pub mod commands;

pub use commands::{edit, inspect, show};
