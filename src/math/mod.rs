//! Small ndarray-like matrix type used at the model boundary.
//!
//! Kept intentionally minimal and dependency-free: the pipeline only needs
//! row-major storage, row slicing for time-ordered folds, and element access.
pub mod matrix;

pub use matrix::{Array2, ShapeError};
