use loanlab_core::{LabError, LabResult, Matrix};

use crate::tree::RegressionTree;
use crate::{Classifier, ParamValue};

/// Gradient boosted trees for binary classification.
///
/// Log-loss objective: shallow regression trees are fitted sequentially to
/// the pseudo-residuals `y - sigmoid(raw)`, and raw log-odds predictions
/// accumulate with shrinkage. Trees route NaN cells themselves, so this
/// model runs on unimputed data.
#[derive(Debug, Clone)]
pub struct GradientBoostingClassifier {
    pub n_estimators: usize,
    pub learning_rate: f64,
    pub max_depth: usize,
    pub min_samples_leaf: usize,
    trees: Vec<RegressionTree>,
    initial_log_odds: f64,
    importances: Vec<f64>,
}

impl GradientBoostingClassifier {
    pub fn new() -> Self {
        GradientBoostingClassifier {
            n_estimators: 100,
            learning_rate: 0.1,
            max_depth: 3,
            min_samples_leaf: 1,
            trees: Vec::new(),
            initial_log_odds: 0.0,
            importances: Vec::new(),
        }
    }

    fn sigmoid(z: f64) -> f64 {
        1.0 / (1.0 + (-z).exp())
    }

    fn raw_predictions(&self, x: &Matrix) -> LabResult<Vec<f64>> {
        let mut raw = vec![self.initial_log_odds; x.n_rows()];
        for tree in &self.trees {
            for (i, v) in tree.predict(x)?.into_iter().enumerate() {
                raw[i] += self.learning_rate * v;
            }
        }
        Ok(raw)
    }
}

impl Default for GradientBoostingClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Classifier for GradientBoostingClassifier {
    fn name(&self) -> String {
        "GradientBoostingClassifier".to_string()
    }

    fn fit(&mut self, x: &Matrix, y: &[f64]) -> LabResult<()> {
        let n = x.n_rows();
        if n == 0 {
            return Err(LabError::EmptyFrame);
        }
        if n != y.len() {
            return Err(LabError::ShapeMismatch {
                expected: vec![n],
                got: vec![y.len()],
            });
        }

        // Initial log-odds from class proportions
        let pos: f64 = y.iter().filter(|&&v| v > 0.5).count() as f64;
        let neg = n as f64 - pos;
        self.initial_log_odds = if pos > 0.0 && neg > 0.0 {
            (pos / neg).ln()
        } else {
            0.0
        };

        let mut raw = vec![self.initial_log_odds; n];
        self.trees.clear();

        for _iter in 0..self.n_estimators {
            let residuals: Vec<f64> = y
                .iter()
                .zip(&raw)
                .map(|(&yi, &ri)| yi - Self::sigmoid(ri))
                .collect();

            let mut tree = RegressionTree::new(self.max_depth, 2, self.min_samples_leaf);
            tree.fit(x, &residuals)?;

            for (i, v) in tree.predict(x)?.into_iter().enumerate() {
                raw[i] += self.learning_rate * v;
            }
            self.trees.push(tree);
        }

        let mut importances = vec![0.0; x.n_cols()];
        for tree in &self.trees {
            for (j, v) in tree.importances().iter().enumerate() {
                importances[j] += v;
            }
        }
        let sum: f64 = importances.iter().sum();
        if sum > 0.0 {
            for v in &mut importances {
                *v /= sum;
            }
        }
        self.importances = importances;
        Ok(())
    }

    fn predict_proba(&self, x: &Matrix) -> LabResult<Vec<f64>> {
        if self.trees.is_empty() {
            return Err(LabError::NotFitted("predict_proba"));
        }
        Ok(self
            .raw_predictions(x)?
            .into_iter()
            .map(Self::sigmoid)
            .collect())
    }

    fn set_param(&mut self, name: &str, value: &ParamValue) -> LabResult<()> {
        match name {
            "n_estimators" => self.n_estimators = value.as_usize(name)?,
            "learning_rate" => self.learning_rate = value.as_f64(name)?,
            "max_depth" => self.max_depth = value.as_usize(name)?,
            "min_samples_leaf" => self.min_samples_leaf = value.as_usize(name)?,
            _ => {
                return Err(LabError::UnknownParam {
                    target: "GradientBoostingClassifier",
                    name: name.to_string(),
                })
            }
        }
        Ok(())
    }

    fn get_param(&self, name: &str) -> Option<ParamValue> {
        match name {
            "n_estimators" => Some(ParamValue::Int(self.n_estimators as i64)),
            "learning_rate" => Some(ParamValue::Float(self.learning_rate)),
            "max_depth" => Some(ParamValue::Int(self.max_depth as i64)),
            "min_samples_leaf" => Some(ParamValue::Int(self.min_samples_leaf as i64)),
            _ => None,
        }
    }

    fn clone_unfitted(&self) -> Box<dyn Classifier> {
        let mut copy = self.clone();
        copy.trees.clear();
        copy.initial_log_odds = 0.0;
        copy.importances.clear();
        Box::new(copy)
    }

    fn feature_importances(&self) -> Option<&[f64]> {
        if self.importances.is_empty() {
            None
        } else {
            Some(&self.importances)
        }
    }

    fn handles_missing(&self) -> bool {
        true
    }
}
