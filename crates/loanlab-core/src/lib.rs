//! Core data structures for the loanlab workbench: the tabular [`Frame`]
//! the experiments ingest, the dense [`Matrix`] the models consume, and the
//! shared [`LabError`] type.

pub mod error;
pub mod frame;
pub mod matrix;

pub use error::{LabError, LabResult};
pub use frame::{Column, Frame};
pub use matrix::Matrix;
