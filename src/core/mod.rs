//! Grid store and the edit operations it accepts

pub mod edit_op;
pub mod grid_store;

pub use edit_op::EditOp;
pub use grid_store::GridStore;
