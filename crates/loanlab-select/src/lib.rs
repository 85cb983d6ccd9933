//! Model selection: stratified k-fold splitting, parallel cross-validation
//! and grid/randomized hyperparameter search.

pub mod cross_validate;
pub mod kfold;
pub mod search;

pub use cross_validate::{collect_fold_probabilities, cross_validate, CvScores, Probabilistic};
pub use kfold::StratifiedKFold;
pub use search::{grid_search, randomized_search, CandidateResult, ParamGrid, SearchOutcome};
