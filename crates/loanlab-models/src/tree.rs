//! CART trees shared by the ensembles.
//!
//! Two variants: [`ProbaTree`] (Gini splits, leaves hold the weighted
//! positive-class fraction) and [`RegressionTree`] (variance splits, leaves
//! hold the weighted target mean) used by gradient boosting.
//!
//! Missing values (NaN) always route to the left child, both during split
//! search and at prediction time, so tree models work on unimputed data.

use loanlab_core::{LabError, LabResult, Matrix};

#[derive(Debug, Clone)]
enum TreeNode {
    Split {
        feature: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
    },
    Leaf {
        value: f64,
    },
}

#[inline]
fn goes_left(value: f64, threshold: f64) -> bool {
    value.is_nan() || value <= threshold
}

fn traverse(node: &TreeNode, row: &[f64]) -> f64 {
    match node {
        TreeNode::Leaf { value } => *value,
        TreeNode::Split {
            feature,
            threshold,
            left,
            right,
        } => {
            if goes_left(row[*feature], *threshold) {
                traverse(left, row)
            } else {
                traverse(right, row)
            }
        }
    }
}

/// Candidate thresholds for one feature: midpoints between consecutive
/// distinct observed values. NaN cells contribute no threshold.
fn split_candidates(x: &Matrix, feature: usize, indices: &[usize]) -> Vec<f64> {
    let mut values: Vec<f64> = indices
        .iter()
        .map(|&i| x.get(i, feature))
        .filter(|v| !v.is_nan())
        .collect();
    values.sort_by(|a, b| a.partial_cmp(b).unwrap());
    values.dedup();
    values.windows(2).map(|w| (w[0] + w[1]) / 2.0).collect()
}

/// Classification tree with probability leaves.
#[derive(Debug, Clone)]
pub struct ProbaTree {
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    root: Option<TreeNode>,
    importances: Vec<f64>,
}

impl ProbaTree {
    pub fn new(max_depth: usize, min_samples_split: usize, min_samples_leaf: usize) -> Self {
        ProbaTree {
            max_depth,
            min_samples_split: min_samples_split.max(2),
            min_samples_leaf: min_samples_leaf.max(1),
            root: None,
            importances: Vec::new(),
        }
    }

    /// Fit on the given rows; `weights` scales each sample's contribution
    /// to impurities and leaf fractions (class weighting hooks in here).
    pub fn fit_weighted(
        &mut self,
        x: &Matrix,
        y: &[f64],
        weights: &[f64],
        indices: &[usize],
    ) -> LabResult<()> {
        if indices.is_empty() {
            return Err(LabError::EmptyFrame);
        }
        self.importances = vec![0.0; x.n_cols()];
        let total_weight: f64 = indices.iter().map(|&i| weights[i]).sum();
        let root = self.build(x, y, weights, indices, total_weight, 0);
        self.root = Some(root);
        let sum: f64 = self.importances.iter().sum();
        if sum > 0.0 {
            for v in &mut self.importances {
                *v /= sum;
            }
        }
        Ok(())
    }

    pub fn fit(&mut self, x: &Matrix, y: &[f64]) -> LabResult<()> {
        let weights = vec![1.0; y.len()];
        let indices: Vec<usize> = (0..y.len()).collect();
        self.fit_weighted(x, y, &weights, &indices)
    }

    fn build(
        &mut self,
        x: &Matrix,
        y: &[f64],
        weights: &[f64],
        indices: &[usize],
        total_weight: f64,
        depth: usize,
    ) -> TreeNode {
        let parent_gini = gini(y, weights, indices);

        if depth >= self.max_depth
            || indices.len() < self.min_samples_split
            || parent_gini == 0.0
        {
            return TreeNode::Leaf {
                value: positive_fraction(y, weights, indices),
            };
        }

        let mut best: Option<(usize, f64, f64, Vec<usize>, Vec<usize>)> = None;

        for feature in 0..x.n_cols() {
            for threshold in split_candidates(x, feature, indices) {
                let mut left = Vec::new();
                let mut right = Vec::new();
                for &i in indices {
                    if goes_left(x.get(i, feature), threshold) {
                        left.push(i);
                    } else {
                        right.push(i);
                    }
                }
                if left.len() < self.min_samples_leaf || right.len() < self.min_samples_leaf {
                    continue;
                }

                let lw: f64 = left.iter().map(|&i| weights[i]).sum();
                let rw: f64 = right.iter().map(|&i| weights[i]).sum();
                let pw = lw + rw;
                let score = (lw / pw) * gini(y, weights, &left)
                    + (rw / pw) * gini(y, weights, &right);

                if best.as_ref().map_or(true, |(_, _, s, _, _)| score < *s) {
                    best = Some((feature, threshold, score, left, right));
                }
            }
        }

        let Some((feature, threshold, child_gini, left, right)) = best else {
            return TreeNode::Leaf {
                value: positive_fraction(y, weights, indices),
            };
        };

        let node_weight: f64 = indices.iter().map(|&i| weights[i]).sum();
        self.importances[feature] +=
            node_weight / total_weight * (parent_gini - child_gini);

        let left_node = self.build(x, y, weights, &left, total_weight, depth + 1);
        let right_node = self.build(x, y, weights, &right, total_weight, depth + 1);

        TreeNode::Split {
            feature,
            threshold,
            left: Box::new(left_node),
            right: Box::new(right_node),
        }
    }

    pub fn predict_proba_row(&self, row: &[f64]) -> LabResult<f64> {
        let root = self
            .root
            .as_ref()
            .ok_or(LabError::NotFitted("predict_proba"))?;
        Ok(traverse(root, row))
    }

    pub fn predict_proba(&self, x: &Matrix) -> LabResult<Vec<f64>> {
        (0..x.n_rows())
            .map(|i| self.predict_proba_row(x.row(i)))
            .collect()
    }

    /// Normalized impurity-decrease importances (sum to 1 when any split
    /// was made).
    pub fn importances(&self) -> &[f64] {
        &self.importances
    }

    pub fn is_fitted(&self) -> bool {
        self.root.is_some()
    }
}

fn gini(y: &[f64], weights: &[f64], indices: &[usize]) -> f64 {
    let mut pos = 0.0;
    let mut total = 0.0;
    for &i in indices {
        total += weights[i];
        if y[i] > 0.5 {
            pos += weights[i];
        }
    }
    if total == 0.0 {
        return 0.0;
    }
    let p = pos / total;
    2.0 * p * (1.0 - p)
}

fn positive_fraction(y: &[f64], weights: &[f64], indices: &[usize]) -> f64 {
    let mut pos = 0.0;
    let mut total = 0.0;
    for &i in indices {
        total += weights[i];
        if y[i] > 0.5 {
            pos += weights[i];
        }
    }
    if total == 0.0 {
        0.0
    } else {
        pos / total
    }
}

/// Regression tree on squared error, fitted to boosting residuals.
#[derive(Debug, Clone)]
pub struct RegressionTree {
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    root: Option<TreeNode>,
    importances: Vec<f64>,
}

impl RegressionTree {
    pub fn new(max_depth: usize, min_samples_split: usize, min_samples_leaf: usize) -> Self {
        RegressionTree {
            max_depth,
            min_samples_split: min_samples_split.max(2),
            min_samples_leaf: min_samples_leaf.max(1),
            root: None,
            importances: Vec::new(),
        }
    }

    pub fn fit(&mut self, x: &Matrix, y: &[f64]) -> LabResult<()> {
        if y.is_empty() {
            return Err(LabError::EmptyFrame);
        }
        self.importances = vec![0.0; x.n_cols()];
        let indices: Vec<usize> = (0..y.len()).collect();
        let root = self.build(x, y, &indices, y.len() as f64, 0);
        self.root = Some(root);
        Ok(())
    }

    fn build(
        &mut self,
        x: &Matrix,
        y: &[f64],
        indices: &[usize],
        total: f64,
        depth: usize,
    ) -> TreeNode {
        if depth >= self.max_depth || indices.len() < self.min_samples_split {
            return TreeNode::Leaf {
                value: mean(y, indices),
            };
        }

        let parent_mse = mse(y, indices);
        let mut best: Option<(usize, f64, f64, Vec<usize>, Vec<usize>)> = None;

        for feature in 0..x.n_cols() {
            for threshold in split_candidates(x, feature, indices) {
                let mut left = Vec::new();
                let mut right = Vec::new();
                for &i in indices {
                    if goes_left(x.get(i, feature), threshold) {
                        left.push(i);
                    } else {
                        right.push(i);
                    }
                }
                if left.len() < self.min_samples_leaf || right.len() < self.min_samples_leaf {
                    continue;
                }

                let lw = left.len() as f64;
                let rw = right.len() as f64;
                let score = (lw * mse(y, &left) + rw * mse(y, &right)) / (lw + rw);

                if best.as_ref().map_or(true, |(_, _, s, _, _)| score < *s) {
                    best = Some((feature, threshold, score, left, right));
                }
            }
        }

        let Some((feature, threshold, child_mse, left, right)) = best else {
            return TreeNode::Leaf {
                value: mean(y, indices),
            };
        };

        self.importances[feature] +=
            indices.len() as f64 / total * (parent_mse - child_mse).max(0.0);

        let left_node = self.build(x, y, &left, total, depth + 1);
        let right_node = self.build(x, y, &right, total, depth + 1);

        TreeNode::Split {
            feature,
            threshold,
            left: Box::new(left_node),
            right: Box::new(right_node),
        }
    }

    pub fn predict_row(&self, row: &[f64]) -> LabResult<f64> {
        let root = self.root.as_ref().ok_or(LabError::NotFitted("predict"))?;
        Ok(traverse(root, row))
    }

    pub fn predict(&self, x: &Matrix) -> LabResult<Vec<f64>> {
        (0..x.n_rows()).map(|i| self.predict_row(x.row(i))).collect()
    }

    pub fn importances(&self) -> &[f64] {
        &self.importances
    }
}

fn mean(y: &[f64], indices: &[usize]) -> f64 {
    if indices.is_empty() {
        return 0.0;
    }
    indices.iter().map(|&i| y[i]).sum::<f64>() / indices.len() as f64
}

fn mse(y: &[f64], indices: &[usize]) -> f64 {
    if indices.is_empty() {
        return 0.0;
    }
    let m = mean(y, indices);
    indices.iter().map(|&i| (y[i] - m).powi(2)).sum::<f64>() / indices.len() as f64
}
