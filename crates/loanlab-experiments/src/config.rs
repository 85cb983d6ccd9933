use std::fs;
use std::path::{Path, PathBuf};

use loanlab_core::{LabError, LabResult};
use loanlab_select::StratifiedKFold;
use serde::{Deserialize, Serialize};

/// Settings shared by every experiment run.
///
/// The seed and fold count are fixed across experiments so scores from
/// different runs stay comparable.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentConfig {
    pub seed: u64,
    pub n_splits: usize,
    /// Hyperparameters worth showing in result tables.
    pub params_to_save: Vec<String>,
    /// Where result CSVs and search artifacts land. `None` disables saving.
    pub output_dir: Option<PathBuf>,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        ExperimentConfig {
            seed: 42,
            n_splits: 5,
            params_to_save: [
                "n_estimators",
                "class_weight",
                "min_samples_leaf",
                "max_samples",
                "max_features",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            output_dir: None,
        }
    }
}

impl ExperimentConfig {
    pub fn load(path: impl AsRef<Path>) -> LabResult<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        toml::from_str(&text).map_err(|e| LabError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// The splitter every experiment scores with.
    pub fn cv(&self) -> StratifiedKFold {
        StratifiedKFold::new(self.n_splits, true, self.seed)
    }
}
