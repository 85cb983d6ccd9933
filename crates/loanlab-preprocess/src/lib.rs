//! Preprocessing for the loan table: numeric imputation, categorical
//! encoding, the [`TablePreprocessor`] column transformer, and
//! importance-threshold feature selection.

pub mod encoder;
pub mod imputer;
pub mod select;
pub mod table;

pub use encoder::{CategoricalEncoder, EncodeStrategy};
pub use imputer::{ImputeStrategy, NumericImputer};
pub use select::ImportanceSelector;
pub use table::TablePreprocessor;
