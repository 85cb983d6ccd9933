//! Binary classification metrics: ROC AUC, precision/recall/F1 and the
//! geometric mean of class recalls used for threshold selection.

pub mod classification;

pub use classification::*;
