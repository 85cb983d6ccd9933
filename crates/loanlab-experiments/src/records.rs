use std::path::Path;

use loanlab_core::LabResult;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Round a CV score the way the result tables show it.
pub fn round_score(v: f64) -> f64 {
    (v * 10_000.0).round() / 10_000.0
}

/// Round a timing figure to hundredths of a second.
pub fn round_time(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// Baseline cross-validation row: one pipeline, its shown parameters,
/// mean ROC AUC and mean fit+score time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CvRecord {
    #[serde(rename = "Model")]
    pub model: String,
    #[serde(rename = "Parameters")]
    pub parameters: String,
    #[serde(rename = "ROC_AUC")]
    pub roc_auc: f64,
    #[serde(rename = "Time")]
    pub time: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImputationRecord {
    #[serde(rename = "Model")]
    pub model: String,
    #[serde(rename = "Parameters")]
    pub parameters: String,
    #[serde(rename = "Imputer")]
    pub imputer: String,
    #[serde(rename = "ROC_AUC")]
    pub roc_auc: f64,
    #[serde(rename = "Time")]
    pub time: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncodingRecord {
    #[serde(rename = "Model")]
    pub model: String,
    #[serde(rename = "Parameters")]
    pub parameters: String,
    #[serde(rename = "Encoder")]
    pub encoder: String,
    #[serde(rename = "ROC_AUC")]
    pub roc_auc: f64,
    #[serde(rename = "Time")]
    pub time: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectionRecord {
    #[serde(rename = "Model")]
    pub model: String,
    #[serde(rename = "Parameters")]
    pub parameters: String,
    #[serde(rename = "Threshold")]
    pub threshold: f64,
    /// Share of features kept, in whole percent.
    #[serde(rename = "Selected_Pct")]
    pub selected_pct: f64,
    /// Space-separated indices of the dropped features.
    #[serde(rename = "Rejected")]
    pub rejected: String,
    #[serde(rename = "ROC_AUC")]
    pub roc_auc: f64,
    #[serde(rename = "Time")]
    pub time: f64,
}

/// Per-model outcome of a hyperparameter search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRecord {
    #[serde(rename = "Model")]
    pub model: String,
    #[serde(rename = "Best_Params")]
    pub best_params: String,
    #[serde(rename = "ROC_AUC")]
    pub roc_auc: f64,
    #[serde(rename = "Time")]
    pub time: f64,
}

/// Persist a result table as CSV. A missing path is not an error: the
/// records are still returned to the caller, we just warn and move on.
pub fn save_records<T: Serialize>(records: &[T], path: Option<&Path>) -> LabResult<()> {
    match path {
        Some(path) => {
            loanlab_io::write_records(path, records)?;
            tracing::info!(path = %path.display(), rows = records.len(), "saved results");
            Ok(())
        }
        None => {
            warn!("no save path configured, result table not persisted");
            Ok(())
        }
    }
}
