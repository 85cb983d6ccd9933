use loanlab_core::{LabError, LabResult, Matrix};

/// How missing numeric cells get filled.
#[derive(Debug, Clone, PartialEq)]
pub enum ImputeStrategy {
    /// Fill with a fixed value (-1 marks "absent" in the loan data).
    Constant(f64),
    Mean,
    Median,
    /// Average the k nearest complete training rows.
    Knn { k: usize },
    /// Leave NaN in place, for models that route missing values natively.
    Passthrough,
}

impl ImputeStrategy {
    /// Label used in result tables.
    pub fn label(&self) -> String {
        match self {
            ImputeStrategy::Constant(_) => "constant".to_string(),
            ImputeStrategy::Mean => "mean".to_string(),
            ImputeStrategy::Median => "median".to_string(),
            ImputeStrategy::Knn { .. } => "knn".to_string(),
            ImputeStrategy::Passthrough => "none".to_string(),
        }
    }
}

/// Column-wise imputer over a numeric matrix.
#[derive(Debug, Clone)]
pub struct NumericImputer {
    pub strategy: ImputeStrategy,
    fill: Vec<f64>,
    /// Complete training rows kept for k-NN lookups.
    reference_rows: Vec<Vec<f64>>,
    fitted: bool,
}

impl NumericImputer {
    pub fn new(strategy: ImputeStrategy) -> Self {
        NumericImputer {
            strategy,
            fill: Vec::new(),
            reference_rows: Vec::new(),
            fitted: false,
        }
    }

    pub fn fit(&mut self, x: &Matrix) -> LabResult<()> {
        let p = x.n_cols();
        self.fill = match &self.strategy {
            ImputeStrategy::Constant(v) => vec![*v; p],
            ImputeStrategy::Mean | ImputeStrategy::Knn { .. } => {
                (0..p).map(|j| x.column_mean(j).unwrap_or(0.0)).collect()
            }
            ImputeStrategy::Median => {
                (0..p).map(|j| x.column_median(j).unwrap_or(0.0)).collect()
            }
            ImputeStrategy::Passthrough => vec![f64::NAN; p],
        };

        if let ImputeStrategy::Knn { .. } = self.strategy {
            self.reference_rows = (0..x.n_rows())
                .map(|i| x.row(i).to_vec())
                .filter(|row| row.iter().all(|v| !v.is_nan()))
                .collect();
        }
        self.fitted = true;
        Ok(())
    }

    pub fn transform(&self, x: &Matrix) -> LabResult<Matrix> {
        if !self.fitted {
            return Err(LabError::NotFitted("transform"));
        }
        match &self.strategy {
            ImputeStrategy::Passthrough => Ok(x.clone()),
            ImputeStrategy::Knn { k } => self.knn_transform(x, *k),
            _ => {
                let mut out = x.clone();
                for i in 0..out.n_rows() {
                    for j in 0..out.n_cols() {
                        if out.get(i, j).is_nan() {
                            out.set(i, j, self.fill[j]);
                        }
                    }
                }
                Ok(out)
            }
        }
    }

    pub fn fit_transform(&mut self, x: &Matrix) -> LabResult<Matrix> {
        self.fit(x)?;
        self.transform(x)
    }

    fn knn_transform(&self, x: &Matrix, k: usize) -> LabResult<Matrix> {
        let mut out = x.clone();
        for i in 0..x.n_rows() {
            let row = x.row(i);
            if row.iter().all(|v| !v.is_nan()) {
                continue;
            }
            // Distance over the cells observed in the query row.
            let mut neighbors: Vec<(f64, &Vec<f64>)> = self
                .reference_rows
                .iter()
                .map(|r| {
                    let d: f64 = row
                        .iter()
                        .zip(r)
                        .filter(|(q, _)| !q.is_nan())
                        .map(|(q, v)| (q - v).powi(2))
                        .sum();
                    (d, r)
                })
                .collect();
            neighbors.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap());
            neighbors.truncate(k.max(1));

            for j in 0..x.n_cols() {
                if out.get(i, j).is_nan() {
                    let filled = if neighbors.is_empty() {
                        self.fill[j]
                    } else {
                        neighbors.iter().map(|(_, r)| r[j]).sum::<f64>()
                            / neighbors.len() as f64
                    };
                    out.set(i, j, filled);
                }
            }
        }
        Ok(out)
    }
}
