use loanlab_core::{LabError, LabResult, Matrix};

use crate::{Classifier, ParamValue};

/// Logistic regression trained by full-batch gradient descent with an
/// optional L2 penalty. Features are standardized internally so the fixed
/// learning rate behaves across the wildly scaled loan columns.
#[derive(Debug, Clone)]
pub struct LogisticRegression {
    pub learning_rate: f64,
    pub max_iter: usize,
    pub l2: f64,
    pub tol: f64,
    weights: Option<Vec<f64>>,
    bias: f64,
    feature_mean: Vec<f64>,
    feature_std: Vec<f64>,
}

impl LogisticRegression {
    pub fn new() -> Self {
        LogisticRegression {
            learning_rate: 0.1,
            max_iter: 500,
            l2: 0.0,
            tol: 1e-6,
            weights: None,
            bias: 0.0,
            feature_mean: Vec::new(),
            feature_std: Vec::new(),
        }
    }

    fn sigmoid(z: f64) -> f64 {
        1.0 / (1.0 + (-z).exp())
    }

    #[inline]
    fn scaled(&self, value: f64, j: usize) -> f64 {
        (value - self.feature_mean[j]) / self.feature_std[j]
    }
}

impl Default for LogisticRegression {
    fn default() -> Self {
        Self::new()
    }
}

impl Classifier for LogisticRegression {
    fn name(&self) -> String {
        "LogisticRegression".to_string()
    }

    fn fit(&mut self, x: &Matrix, y: &[f64]) -> LabResult<()> {
        let n = x.n_rows();
        let p = x.n_cols();
        if n != y.len() {
            return Err(LabError::ShapeMismatch {
                expected: vec![n],
                got: vec![y.len()],
            });
        }
        if n == 0 {
            return Err(LabError::EmptyFrame);
        }

        self.feature_mean = (0..p)
            .map(|j| x.column_mean(j).unwrap_or(0.0))
            .collect();
        self.feature_std = (0..p)
            .map(|j| {
                let m = self.feature_mean[j];
                let var = (0..n)
                    .map(|i| (x.get(i, j) - m).powi(2))
                    .sum::<f64>()
                    / n as f64;
                let s = var.sqrt();
                if s > 0.0 {
                    s
                } else {
                    1.0
                }
            })
            .collect();

        let n_f = n as f64;
        let mut w = vec![0.0; p];
        let mut b = 0.0;

        for _iter in 0..self.max_iter {
            let mut dw = vec![0.0; p];
            let mut db = 0.0;

            for i in 0..n {
                let mut z = b;
                for j in 0..p {
                    z += w[j] * self.scaled(x.get(i, j), j);
                }
                let error = Self::sigmoid(z) - y[i];
                for j in 0..p {
                    dw[j] += error * self.scaled(x.get(i, j), j);
                }
                db += error;
            }

            let mut max_grad: f64 = 0.0;
            for j in 0..p {
                let grad = dw[j] / n_f + self.l2 * w[j];
                w[j] -= self.learning_rate * grad;
                max_grad = max_grad.max(grad.abs());
            }
            b -= self.learning_rate * (db / n_f);

            if max_grad < self.tol {
                break;
            }
        }

        self.weights = Some(w);
        self.bias = b;
        Ok(())
    }

    fn predict_proba(&self, x: &Matrix) -> LabResult<Vec<f64>> {
        let w = self
            .weights
            .as_ref()
            .ok_or(LabError::NotFitted("predict_proba"))?;
        let mut proba = Vec::with_capacity(x.n_rows());
        for i in 0..x.n_rows() {
            let mut z = self.bias;
            for (j, wj) in w.iter().enumerate() {
                z += wj * self.scaled(x.get(i, j), j);
            }
            proba.push(Self::sigmoid(z));
        }
        Ok(proba)
    }

    fn set_param(&mut self, name: &str, value: &ParamValue) -> LabResult<()> {
        match name {
            "learning_rate" => self.learning_rate = value.as_f64(name)?,
            "max_iter" => self.max_iter = value.as_usize(name)?,
            "l2" => self.l2 = value.as_f64(name)?,
            _ => {
                return Err(LabError::UnknownParam {
                    target: "LogisticRegression",
                    name: name.to_string(),
                })
            }
        }
        Ok(())
    }

    fn get_param(&self, name: &str) -> Option<ParamValue> {
        match name {
            "learning_rate" => Some(ParamValue::Float(self.learning_rate)),
            "max_iter" => Some(ParamValue::Int(self.max_iter as i64)),
            "l2" => Some(ParamValue::Float(self.l2)),
            _ => None,
        }
    }

    fn clone_unfitted(&self) -> Box<dyn Classifier> {
        let mut copy = self.clone();
        copy.weights = None;
        copy.bias = 0.0;
        copy.feature_mean.clear();
        copy.feature_std.clear();
        Box::new(copy)
    }
}
