use loanlab_core::{LabError, LabResult, Matrix};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

use crate::tree::ProbaTree;
use crate::{Classifier, ParamValue};

/// Resampling scheme used to draw each estimator's training set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamplingMode {
    /// Plain bootstrap over all rows.
    Bootstrap,
    /// Undersample the majority class to the minority count, then bootstrap.
    BalancedUnder,
    /// Oversample the minority class to the majority count, then bootstrap.
    BalancedOver,
}

impl SamplingMode {
    fn as_str(&self) -> &'static str {
        match self {
            SamplingMode::Bootstrap => "bootstrap",
            SamplingMode::BalancedUnder => "under",
            SamplingMode::BalancedOver => "over",
        }
    }
}

/// Bagging over deep probability trees, optionally rebalancing each
/// bootstrap sample for the skewed approval classes.
#[derive(Debug, Clone)]
pub struct BaggingClassifier {
    pub n_estimators: usize,
    pub max_samples: f64,
    pub max_depth: usize,
    pub min_samples_leaf: usize,
    pub sampling: SamplingMode,
    pub seed: u64,
    trees: Vec<ProbaTree>,
    importances: Vec<f64>,
}

impl BaggingClassifier {
    pub fn new(sampling: SamplingMode) -> Self {
        BaggingClassifier {
            n_estimators: 10,
            max_samples: 1.0,
            max_depth: 24,
            min_samples_leaf: 1,
            sampling,
            seed: 42,
            trees: Vec::new(),
            importances: Vec::new(),
        }
    }

    /// Row pool one estimator draws its bootstrap sample from.
    fn resample_pool(&self, y: &[f64], rng: &mut StdRng) -> Vec<usize> {
        let pos: Vec<usize> = (0..y.len()).filter(|&i| y[i] > 0.5).collect();
        let neg: Vec<usize> = (0..y.len()).filter(|&i| y[i] <= 0.5).collect();

        match self.sampling {
            SamplingMode::Bootstrap => (0..y.len()).collect(),
            SamplingMode::BalancedUnder => {
                let (minority, majority) = if pos.len() <= neg.len() {
                    (&pos, &neg)
                } else {
                    (&neg, &pos)
                };
                let mut shrunk = majority.clone();
                shrunk.shuffle(rng);
                shrunk.truncate(minority.len());
                let mut pool = minority.clone();
                pool.extend(shrunk);
                pool
            }
            SamplingMode::BalancedOver => {
                let (minority, majority) = if pos.len() <= neg.len() {
                    (&pos, &neg)
                } else {
                    (&neg, &pos)
                };
                let mut pool = majority.clone();
                for _ in 0..majority.len() {
                    pool.push(minority[rng.gen_range(0..minority.len())]);
                }
                pool
            }
        }
    }
}

impl Classifier for BaggingClassifier {
    fn name(&self) -> String {
        match self.sampling {
            SamplingMode::Bootstrap => "BaggingClassifier".to_string(),
            SamplingMode::BalancedUnder => "BalancedBagging_UnderSampling".to_string(),
            SamplingMode::BalancedOver => "BalancedBagging_OverSampling".to_string(),
        }
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
        let has_both = y.iter().any(|&v| v > 0.5) && y.iter().any(|&v| v <= 0.5);
        if !has_both && self.sampling != SamplingMode::Bootstrap {
            return Err(LabError::InvalidOperation(
                "balanced bagging needs both classes present".to_string(),
            ));
        }

        let trees: LabResult<Vec<ProbaTree>> = (0..self.n_estimators)
            .into_par_iter()
            .map(|t| {
                let mut rng = StdRng::seed_from_u64(self.seed.wrapping_add(t as u64));
                let pool = self.resample_pool(y, &mut rng);
                let n_boot =
                    ((pool.len() as f64 * self.max_samples).round() as usize).clamp(1, pool.len());
                let sample: Vec<usize> = (0..n_boot)
                    .map(|_| pool[rng.gen_range(0..pool.len())])
                    .collect();

                let x_sub = x.take_rows(&sample);
                let y_sub: Vec<f64> = sample.iter().map(|&i| y[i]).collect();

                let mut tree = ProbaTree::new(self.max_depth, 2, self.min_samples_leaf);
                tree.fit(&x_sub, &y_sub)?;
                Ok(tree)
            })
            .collect();
        self.trees = trees?;

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
        let mut acc = vec![0.0; x.n_rows()];
        for tree in &self.trees {
            for (i, p) in tree.predict_proba(x)?.into_iter().enumerate() {
                acc[i] += p;
            }
        }
        let k = self.trees.len() as f64;
        Ok(acc.into_iter().map(|v| v / k).collect())
    }

    fn set_param(&mut self, name: &str, value: &ParamValue) -> LabResult<()> {
        match name {
            "n_estimators" => self.n_estimators = value.as_usize(name)?,
            "max_samples" => self.max_samples = value.as_f64(name)?,
            "max_depth" => self.max_depth = value.as_usize(name)?,
            "min_samples_leaf" => self.min_samples_leaf = value.as_usize(name)?,
            "sampling" => {
                self.sampling = match value.as_str(name)? {
                    "bootstrap" => SamplingMode::Bootstrap,
                    "under" => SamplingMode::BalancedUnder,
                    "over" => SamplingMode::BalancedOver,
                    other => {
                        return Err(LabError::InvalidParam {
                            name: name.to_string(),
                            reason: format!("unknown sampling mode '{other}'"),
                        })
                    }
                }
            }
            _ => {
                return Err(LabError::UnknownParam {
                    target: "BaggingClassifier",
                    name: name.to_string(),
                })
            }
        }
        Ok(())
    }

    fn get_param(&self, name: &str) -> Option<ParamValue> {
        match name {
            "n_estimators" => Some(ParamValue::Int(self.n_estimators as i64)),
            "max_samples" => Some(ParamValue::Float(self.max_samples)),
            "max_depth" => Some(ParamValue::Int(self.max_depth as i64)),
            "min_samples_leaf" => Some(ParamValue::Int(self.min_samples_leaf as i64)),
            "sampling" => Some(ParamValue::Str(self.sampling.as_str().into())),
            _ => None,
        }
    }

    fn clone_unfitted(&self) -> Box<dyn Classifier> {
        let mut copy = self.clone();
        copy.trees.clear();
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

    fn set_seed(&mut self, seed: u64) {
        self.seed = seed;
    }
}
