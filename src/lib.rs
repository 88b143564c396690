//! csvgrid - load a CSV file as an editable grid and export it back
//!
//! This library parses CSV text into a header and data rows, keeps them in a
//! [`GridStore`](core::GridStore) that enforces a fixed row width, applies
//! cell and row edits, and serializes the result back to CSV.
//!
//! # Features
//!
//! - Standard CSV dialect: comma separator, `"` quoting with `""` escapes
//! - Parse errors carry the line and column of the malformed quote
//! - Rows are padded or truncated to the header width on load
//! - Every edit is atomic: a failed edit leaves the grid unchanged
//! - CLI (`csvgrid`) and HTTP session server (`csvgrid-server`) hosts
//!
//! # Example
//!
//! ```
//! use csvgrid::core::GridStore;
//!
//! let mut store = GridStore::new();
//! store.load_text("name,age\nAlice,30\nBob,25\n")?;
//!
//! store.set_cell(1, 1, "26")?;
//! store.add_row();
//! store.remove_row(0)?;
//!
//! assert_eq!(store.export_csv()?, "name,age\nBob,26\n,\n");
//! # Ok::<(), csvgrid::error::GridError>(())
//! ```

pub mod api;
pub mod cli;
pub mod core;
pub mod error;
pub mod parser;
pub mod types;
pub mod writer;

// Re-export commonly used types
pub use error::{GridError, GridResult};
pub use types::{Row, Table};
