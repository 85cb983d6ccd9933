//! The experimentation harness: roster construction, preprocessing
//! comparisons, hyperparameter searches, threshold evaluation and
//! result aggregation for the loan-approval dataset.

pub mod config;
pub mod pipeline;
pub mod records;
pub mod roster;
pub mod runner;
pub mod search_runner;
pub mod summary;
pub mod thresholds;

pub use config::ExperimentConfig;
pub use pipeline::ModelPipeline;
pub use records::{
    save_records, CvRecord, EncodingRecord, ImputationRecord, SearchRecord, SelectionRecord,
};
pub use roster::{create_models, default_roster, prepare_models_info, ModelInfo};
pub use runner::{cat_encoding_test, cv_scores, feature_selection_test, imputation_test};
pub use search_runner::{grid_search_model, randomized_search_roster, SearchArtifact};
pub use summary::{load_results_from_folder, summarize_results, ScoreRow, SummaryRow};
pub use thresholds::{
    default_thresholds, evaluate_discrimination_thresholds, ThresholdCurve,
};
