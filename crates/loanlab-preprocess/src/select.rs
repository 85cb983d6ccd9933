use loanlab_core::{LabError, LabResult, Matrix};

/// Keep the features whose reference-model importance clears a threshold.
///
/// Fit from the importances of an already-trained estimator (the
/// experiments use a tuned random forest), then applied inside pipelines
/// to shrink the feature matrix.
#[derive(Debug, Clone)]
pub struct ImportanceSelector {
    pub threshold: f64,
    support: Vec<bool>,
}

impl ImportanceSelector {
    pub fn new(threshold: f64) -> Self {
        ImportanceSelector {
            threshold,
            support: Vec::new(),
        }
    }

    pub fn fit_from_importances(&mut self, importances: &[f64]) -> LabResult<()> {
        let support: Vec<bool> = importances.iter().map(|&v| v > self.threshold).collect();
        if !support.iter().any(|&s| s) {
            return Err(LabError::InvalidOperation(format!(
                "no feature importance exceeds threshold {}",
                self.threshold
            )));
        }
        self.support = support;
        Ok(())
    }

    pub fn transform(&self, x: &Matrix) -> LabResult<Matrix> {
        if self.support.is_empty() {
            return Err(LabError::NotFitted("transform"));
        }
        if x.n_cols() != self.support.len() {
            return Err(LabError::ShapeMismatch {
                expected: vec![self.support.len()],
                got: vec![x.n_cols()],
            });
        }
        Ok(x.select_columns(&self.selected_indices()))
    }

    pub fn selected_indices(&self) -> Vec<usize> {
        self.support
            .iter()
            .enumerate()
            .filter(|(_, &s)| s)
            .map(|(i, _)| i)
            .collect()
    }

    /// Indices dropped by the threshold, for the experiment records.
    pub fn rejected_indices(&self) -> Vec<usize> {
        self.support
            .iter()
            .enumerate()
            .filter(|(_, &s)| !s)
            .map(|(i, _)| i)
            .collect()
    }

    /// Percentage of features kept, rounded to whole percent.
    pub fn selected_share(&self) -> f64 {
        if self.support.is_empty() {
            return 0.0;
        }
        let kept = self.support.iter().filter(|&&s| s).count();
        (kept as f64 / self.support.len() as f64 * 100.0).round()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_filters_features() {
        let mut sel = ImportanceSelector::new(0.1);
        sel.fit_from_importances(&[0.5, 0.05, 0.3, 0.15]).unwrap();
        assert_eq!(sel.selected_indices(), vec![0, 2, 3]);
        assert_eq!(sel.rejected_indices(), vec![1]);
        assert_eq!(sel.selected_share(), 75.0);

        let x = Matrix::from_rows(&[vec![1.0, 2.0, 3.0, 4.0]]).unwrap();
        let out = sel.transform(&x).unwrap();
        assert_eq!(out.row(0), &[1.0, 3.0, 4.0]);
    }

    #[test]
    fn test_all_rejected_is_error() {
        let mut sel = ImportanceSelector::new(0.9);
        assert!(sel.fit_from_importances(&[0.5, 0.5]).is_err());
    }

    #[test]
    fn test_width_mismatch_is_error() {
        let mut sel = ImportanceSelector::new(0.1);
        sel.fit_from_importances(&[0.9, 0.1]).unwrap();
        let x = Matrix::from_rows(&[vec![1.0, 2.0, 3.0]]).unwrap();
        assert!(sel.transform(&x).is_err());
    }
}
