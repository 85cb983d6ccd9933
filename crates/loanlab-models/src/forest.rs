use loanlab_core::{LabError, LabResult, Matrix};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

use crate::tree::ProbaTree;
use crate::{Classifier, ParamValue};

/// How many features each tree sees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FeatureSubset {
    All,
    Sqrt,
    Frac(f64),
}

impl FeatureSubset {
    fn count(&self, n_features: usize) -> usize {
        let k = match self {
            FeatureSubset::All => n_features,
            FeatureSubset::Sqrt => (n_features as f64).sqrt().round() as usize,
            FeatureSubset::Frac(f) => (n_features as f64 * f).ceil() as usize,
        };
        k.clamp(1, n_features)
    }
}

/// Random forest: bagged probability trees with per-tree feature subsets.
#[derive(Debug, Clone)]
pub struct RandomForestClassifier {
    pub n_estimators: usize,
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub max_features: FeatureSubset,
    /// Fraction of rows bootstrapped per tree.
    pub max_samples: f64,
    /// Reweight samples inversely to class frequency.
    pub balanced: bool,
    pub seed: u64,
    trees: Vec<(ProbaTree, Vec<usize>)>,
    importances: Vec<f64>,
}

impl RandomForestClassifier {
    pub fn new() -> Self {
        RandomForestClassifier {
            n_estimators: 100,
            max_depth: 16,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: FeatureSubset::Sqrt,
            max_samples: 1.0,
            balanced: false,
            seed: 42,
            trees: Vec::new(),
            importances: Vec::new(),
        }
    }

    fn sample_weights(y: &[f64]) -> Vec<f64> {
        let n = y.len() as f64;
        let pos = y.iter().filter(|&&v| v > 0.5).count() as f64;
        let neg = n - pos;
        let (wp, wn) = if pos > 0.0 && neg > 0.0 {
            (n / (2.0 * pos), n / (2.0 * neg))
        } else {
            (1.0, 1.0)
        };
        y.iter().map(|&v| if v > 0.5 { wp } else { wn }).collect()
    }
}

impl Default for RandomForestClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Classifier for RandomForestClassifier {
    fn name(&self) -> String {
        "RandomForestClassifier".to_string()
    }

    fn fit(&mut self, x: &Matrix, y: &[f64]) -> LabResult<()> {
        let n = x.n_rows();
        let p = x.n_cols();
        if n == 0 || p == 0 {
            return Err(LabError::EmptyFrame);
        }
        if n != y.len() {
            return Err(LabError::ShapeMismatch {
                expected: vec![n],
                got: vec![y.len()],
            });
        }

        let weights = if self.balanced {
            Self::sample_weights(y)
        } else {
            vec![1.0; n]
        };
        let n_boot = ((n as f64 * self.max_samples).round() as usize).clamp(1, n);
        let n_feat = self.max_features.count(p);

        let trees: LabResult<Vec<(ProbaTree, Vec<usize>)>> = (0..self.n_estimators)
            .into_par_iter()
            .map(|t| {
                let mut rng = StdRng::seed_from_u64(self.seed.wrapping_add(t as u64));

                let sample: Vec<usize> =
                    (0..n_boot).map(|_| rng.gen_range(0..n)).collect();

                let mut feature_pool: Vec<usize> = (0..p).collect();
                feature_pool.shuffle(&mut rng);
                let mut features: Vec<usize> = feature_pool[..n_feat].to_vec();
                features.sort_unstable();

                let x_sub = x.take_rows(&sample).select_columns(&features);
                let y_sub: Vec<f64> = sample.iter().map(|&i| y[i]).collect();
                let w_sub: Vec<f64> = sample.iter().map(|&i| weights[i]).collect();
                let idx: Vec<usize> = (0..y_sub.len()).collect();

                let mut tree = ProbaTree::new(
                    self.max_depth,
                    self.min_samples_split,
                    self.min_samples_leaf,
                );
                tree.fit_weighted(&x_sub, &y_sub, &w_sub, &idx)?;
                Ok((tree, features))
            })
            .collect();
        self.trees = trees?;

        // Aggregate per-tree importances back onto the full feature set.
        let mut importances = vec![0.0; p];
        for (tree, features) in &self.trees {
            for (local, &global) in features.iter().enumerate() {
                importances[global] += tree.importances()[local];
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
        for (tree, features) in &self.trees {
            let x_sub = x.select_columns(features);
            for (i, p) in tree.predict_proba(&x_sub)?.into_iter().enumerate() {
                acc[i] += p;
            }
        }
        let k = self.trees.len() as f64;
        Ok(acc.into_iter().map(|v| v / k).collect())
    }

    fn set_param(&mut self, name: &str, value: &ParamValue) -> LabResult<()> {
        match name {
            "n_estimators" => self.n_estimators = value.as_usize(name)?,
            "max_depth" => self.max_depth = value.as_usize(name)?,
            "min_samples_split" => self.min_samples_split = value.as_usize(name)?,
            "min_samples_leaf" => self.min_samples_leaf = value.as_usize(name)?,
            "max_samples" => self.max_samples = value.as_f64(name)?,
            "max_features" => {
                self.max_features = match value {
                    ParamValue::Str(s) if s == "sqrt" => FeatureSubset::Sqrt,
                    ParamValue::Str(s) if s == "all" => FeatureSubset::All,
                    other => FeatureSubset::Frac(other.as_f64(name)?),
                }
            }
            "class_weight" => {
                self.balanced = match value.as_str(name)? {
                    "balanced" => true,
                    "none" => false,
                    other => {
                        return Err(LabError::InvalidParam {
                            name: name.to_string(),
                            reason: format!("unknown class_weight '{other}'"),
                        })
                    }
                }
            }
            _ => {
                return Err(LabError::UnknownParam {
                    target: "RandomForestClassifier",
                    name: name.to_string(),
                })
            }
        }
        Ok(())
    }

    fn get_param(&self, name: &str) -> Option<ParamValue> {
        match name {
            "n_estimators" => Some(ParamValue::Int(self.n_estimators as i64)),
            "max_depth" => Some(ParamValue::Int(self.max_depth as i64)),
            "min_samples_split" => Some(ParamValue::Int(self.min_samples_split as i64)),
            "min_samples_leaf" => Some(ParamValue::Int(self.min_samples_leaf as i64)),
            "max_samples" => Some(ParamValue::Float(self.max_samples)),
            "max_features" => Some(match self.max_features {
                FeatureSubset::All => ParamValue::Str("all".into()),
                FeatureSubset::Sqrt => ParamValue::Str("sqrt".into()),
                FeatureSubset::Frac(f) => ParamValue::Float(f),
            }),
            "class_weight" => Some(ParamValue::Str(
                if self.balanced { "balanced" } else { "none" }.into(),
            )),
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

    fn set_seed(&mut self, seed: u64) {
        self.seed = seed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blobs() -> (Matrix, Vec<f64>) {
        let x = Matrix::from_rows(&[
            vec![0.0, 0.0],
            vec![0.5, 0.5],
            vec![1.0, 1.0],
            vec![5.0, 5.0],
            vec![5.5, 5.5],
            vec![6.0, 6.0],
        ])
        .unwrap();
        let y = vec![0.0, 0.0, 0.0, 1.0, 1.0, 1.0];
        (x, y)
    }

    #[test]
    fn test_forest_separates_blobs() {
        let (x, y) = blobs();
        let mut rf = RandomForestClassifier::new();
        rf.n_estimators = 20;
        rf.max_features = FeatureSubset::All;
        rf.fit(&x, &y).unwrap();
        let pred = rf.predict(&x).unwrap();
        assert_eq!(pred, y);
    }

    #[test]
    fn test_importances_normalized() {
        let (x, y) = blobs();
        let mut rf = RandomForestClassifier::new();
        rf.n_estimators = 10;
        rf.fit(&x, &y).unwrap();
        let imp = rf.feature_importances().unwrap();
        assert_eq!(imp.len(), 2);
        assert!((imp.iter().sum::<f64>() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_deterministic_given_seed() {
        let (x, y) = blobs();
        let mut a = RandomForestClassifier::new();
        a.n_estimators = 5;
        let mut b = a.clone();
        a.fit(&x, &y).unwrap();
        b.fit(&x, &y).unwrap();
        assert_eq!(a.predict_proba(&x).unwrap(), b.predict_proba(&x).unwrap());
    }

    #[test]
    fn test_max_features_param_forms() {
        let mut rf = RandomForestClassifier::new();
        rf.set_param("max_features", &ParamValue::Str("all".into()))
            .unwrap();
        assert_eq!(rf.max_features, FeatureSubset::All);
        rf.set_param("max_features", &ParamValue::Float(0.5)).unwrap();
        assert_eq!(rf.max_features, FeatureSubset::Frac(0.5));
        assert!(rf
            .set_param("class_weight", &ParamValue::Str("bogus".into()))
            .is_err());
    }
}
