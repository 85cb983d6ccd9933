//! Classifiers for the loan-approval experiments.
//!
//! Every model implements [`Classifier`]: fit on a dense [`Matrix`],
//! predict positive-class probabilities, and expose hyperparameters
//! through typed [`ParamValue`] assignments so the search wrappers can
//! reconfigure clones of a base model.

use std::fmt;

use loanlab_core::{LabError, LabResult, Matrix};
use serde::{Deserialize, Serialize};

pub mod bagging;
pub mod forest;
pub mod gboost;
pub mod logistic;
pub mod tree;

pub use bagging::{BaggingClassifier, SamplingMode};
pub use forest::{FeatureSubset, RandomForestClassifier};
pub use gboost::GradientBoostingClassifier;
pub use logistic::LogisticRegression;

/// Typed hyperparameter value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),
}

impl ParamValue {
    pub fn as_f64(&self, name: &str) -> LabResult<f64> {
        match self {
            ParamValue::Int(v) => Ok(*v as f64),
            ParamValue::Float(v) => Ok(*v),
            other => Err(LabError::InvalidParam {
                name: name.to_string(),
                reason: format!("expected a number, got {other}"),
            }),
        }
    }

    pub fn as_usize(&self, name: &str) -> LabResult<usize> {
        match self {
            ParamValue::Int(v) if *v >= 0 => Ok(*v as usize),
            other => Err(LabError::InvalidParam {
                name: name.to_string(),
                reason: format!("expected a non-negative integer, got {other}"),
            }),
        }
    }

    pub fn as_str(&self, name: &str) -> LabResult<&str> {
        match self {
            ParamValue::Str(v) => Ok(v),
            other => Err(LabError::InvalidParam {
                name: name.to_string(),
                reason: format!("expected a string, got {other}"),
            }),
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Int(v) => write!(f, "{v}"),
            ParamValue::Float(v) => write!(f, "{v}"),
            ParamValue::Str(v) => write!(f, "{v}"),
            ParamValue::Bool(v) => write!(f, "{v}"),
        }
    }
}

/// One named hyperparameter assignment.
pub type ParamSet = Vec<(String, ParamValue)>;

/// Supervised binary classifier over dense feature matrices.
///
/// Labels are 0.0 / 1.0; probabilities refer to the positive class.
pub trait Classifier: Send + Sync {
    /// Display name used in result tables.
    fn name(&self) -> String;

    fn fit(&mut self, x: &Matrix, y: &[f64]) -> LabResult<()>;

    fn predict_proba(&self, x: &Matrix) -> LabResult<Vec<f64>>;

    /// Hard labels at the conventional 0.5 cutoff.
    fn predict(&self, x: &Matrix) -> LabResult<Vec<f64>> {
        Ok(self
            .predict_proba(x)?
            .into_iter()
            .map(|p| if p >= 0.5 { 1.0 } else { 0.0 })
            .collect())
    }

    /// Assign a hyperparameter by name. Unknown names are an error.
    fn set_param(&mut self, name: &str, value: &ParamValue) -> LabResult<()>;

    /// Read a hyperparameter back, `None` when the model has no such knob.
    fn get_param(&self, name: &str) -> Option<ParamValue>;

    /// Fresh unfitted copy with identical hyperparameters.
    fn clone_unfitted(&self) -> Box<dyn Classifier>;

    /// Impurity-based importances, available after fit for tree ensembles.
    fn feature_importances(&self) -> Option<&[f64]> {
        None
    }

    /// Whether the model accepts NaN feature values without imputation.
    fn handles_missing(&self) -> bool {
        false
    }

    /// Reseed the model's RNG. No-op for deterministic models.
    fn set_seed(&mut self, _seed: u64) {}
}

/// Apply a whole parameter set to a model.
pub fn apply_params(model: &mut dyn Classifier, params: &ParamSet) -> LabResult<()> {
    for (name, value) in params {
        model.set_param(name, value)?;
    }
    Ok(())
}
