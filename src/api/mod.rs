//! csvgrid session server module
//!
//! HTTP REST API over the grid store: upload a CSV, edit it, download it.
//! Run with `csvgrid-server`.

pub mod handlers;
pub mod server;
pub mod session;

pub use server::run_api_server;
