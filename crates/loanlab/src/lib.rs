//! # loanlab
//!
//! An experimentation workbench for loan-approval classifiers.
//!
//! ## Modules
//!
//! - **core** — Tabular `Frame` (numeric + categorical, missing-aware), dense `Matrix`, shared errors
//! - **metrics** — Binary classification metrics: ROC AUC, precision, recall, F1, G-mean
//! - **models** — Classifiers: logistic regression, probability trees, random forest, gradient boosting, (balanced) bagging
//! - **preprocess** — Numeric imputers, categorical encoders, the table column transformer, importance-based selection
//! - **select** — Stratified k-fold, parallel cross-validation, grid and randomized search
//! - **io** — Loan CSV ingestion, result-table CSVs, JSON search artifacts
//! - **experiments** — The harness: rosters, preprocessing comparisons, searches, threshold curves, summaries
//! - **report** — Terminal tables, bar charts, histograms, threshold plots

/// Frames, matrices and shared errors.
pub use loanlab_core as core;

/// Binary classification metrics.
pub use loanlab_metrics as metrics;

/// Classifiers.
pub use loanlab_models as models;

/// Imputation, encoding and feature selection.
pub use loanlab_preprocess as preprocess;

/// Cross-validation and hyperparameter search.
pub use loanlab_select as select;

/// CSV and artifact I/O.
pub use loanlab_io as io;

/// The experiment harness.
pub use loanlab_experiments as experiments;

/// Terminal rendering.
pub use loanlab_report as report;
