use std::time::Instant;

use loanlab_core::{Frame, LabResult};
use rayon::prelude::*;

use crate::kfold::StratifiedKFold;

/// Anything that can be fitted on a frame and score probabilities, in
/// practice the experiment pipelines (preprocessor + model).
pub trait Probabilistic: Send {
    fn fit(&mut self, x: &Frame, y: &[f64]) -> LabResult<()>;
    fn predict_proba(&self, x: &Frame) -> LabResult<Vec<f64>>;
}

/// Per-fold cross-validation output.
#[derive(Debug, Clone, Default)]
pub struct CvScores {
    pub test_scores: Vec<f64>,
    pub fit_times: Vec<f64>,
    pub score_times: Vec<f64>,
}

impl CvScores {
    pub fn mean_score(&self) -> f64 {
        mean(&self.test_scores)
    }

    pub fn std_score(&self) -> f64 {
        let m = self.mean_score();
        let var = self
            .test_scores
            .iter()
            .map(|s| (s - m).powi(2))
            .sum::<f64>()
            / self.test_scores.len().max(1) as f64;
        var.sqrt()
    }

    /// Mean of fit time + score time per fold, the cost figure the result
    /// tables report.
    pub fn mean_total_time(&self) -> f64 {
        self.fit_times
            .iter()
            .zip(&self.score_times)
            .map(|(f, s)| f + s)
            .sum::<f64>()
            / self.fit_times.len().max(1) as f64
    }
}

/// Cross-validate a pipeline: each fold gets a fresh pipeline from
/// `factory`, fits on the train rows and is scored on the test rows.
/// Folds run on the rayon pool; nothing is shared between workers.
pub fn cross_validate<P, F, S>(
    factory: F,
    x: &Frame,
    y: &[f64],
    cv: &StratifiedKFold,
    scorer: S,
) -> LabResult<CvScores>
where
    P: Probabilistic,
    F: Fn() -> LabResult<P> + Sync,
    S: Fn(&[f64], &[f64]) -> f64 + Sync,
{
    let folds = cv.split(y)?;

    let per_fold: LabResult<Vec<(f64, f64, f64)>> = folds
        .par_iter()
        .map(|(train_idx, test_idx)| {
            let x_train = x.take_rows(train_idx);
            let x_test = x.take_rows(test_idx);
            let y_train: Vec<f64> = train_idx.iter().map(|&i| y[i]).collect();
            let y_test: Vec<f64> = test_idx.iter().map(|&i| y[i]).collect();

            let mut pipeline = factory()?;

            let fit_start = Instant::now();
            pipeline.fit(&x_train, &y_train)?;
            let fit_time = fit_start.elapsed().as_secs_f64();

            let score_start = Instant::now();
            let proba = pipeline.predict_proba(&x_test)?;
            let score = scorer(&y_test, &proba);
            let score_time = score_start.elapsed().as_secs_f64();

            Ok((score, fit_time, score_time))
        })
        .collect();

    let mut scores = CvScores::default();
    for (score, fit_time, score_time) in per_fold? {
        scores.test_scores.push(score);
        scores.fit_times.push(fit_time);
        scores.score_times.push(score_time);
    }
    Ok(scores)
}

/// Fit one pipeline per fold and return the held-out labels with their
/// predicted probabilities. The threshold evaluator sweeps cutoffs over
/// these without refitting anything.
pub fn collect_fold_probabilities<P, F>(
    factory: F,
    x: &Frame,
    y: &[f64],
    cv: &StratifiedKFold,
) -> LabResult<Vec<(Vec<f64>, Vec<f64>)>>
where
    P: Probabilistic,
    F: Fn() -> LabResult<P> + Sync,
{
    let folds = cv.split(y)?;

    folds
        .par_iter()
        .map(|(train_idx, test_idx)| {
            let x_train = x.take_rows(train_idx);
            let x_test = x.take_rows(test_idx);
            let y_train: Vec<f64> = train_idx.iter().map(|&i| y[i]).collect();
            let y_test: Vec<f64> = test_idx.iter().map(|&i| y[i]).collect();

            let mut pipeline = factory()?;
            pipeline.fit(&x_train, &y_train)?;
            let proba = pipeline.predict_proba(&x_test)?;
            Ok((y_test, proba))
        })
        .collect()
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use loanlab_core::Column;
    use loanlab_metrics::roc_auc;

    /// Predicts the mean of its training labels for every row.
    struct MeanModel {
        mean: f64,
        fitted: bool,
    }

    impl MeanModel {
        fn new() -> Self {
            MeanModel {
                mean: 0.0,
                fitted: false,
            }
        }
    }

    impl Probabilistic for MeanModel {
        fn fit(&mut self, _x: &Frame, y: &[f64]) -> LabResult<()> {
            self.mean = y.iter().sum::<f64>() / y.len() as f64;
            self.fitted = true;
            Ok(())
        }

        fn predict_proba(&self, x: &Frame) -> LabResult<Vec<f64>> {
            assert!(self.fitted);
            Ok(vec![self.mean; x.n_rows()])
        }
    }

    fn toy_data(n: usize) -> (Frame, Vec<f64>) {
        let mut frame = Frame::new();
        frame
            .push_column("f", Column::Numeric((0..n).map(|i| i as f64).collect()))
            .unwrap();
        let y: Vec<f64> = (0..n).map(|i| if i % 3 == 0 { 1.0 } else { 0.0 }).collect();
        (frame, y)
    }

    #[test]
    fn test_cross_validate_runs_all_folds() {
        let (x, y) = toy_data(30);
        let cv = StratifiedKFold::new(5, true, 42);
        let scores =
            cross_validate(|| Ok(MeanModel::new()), &x, &y, &cv, |t, p| roc_auc(t, p)).unwrap();
        assert_eq!(scores.test_scores.len(), 5);
        assert_eq!(scores.fit_times.len(), 5);
        // Constant prediction gives a chance-level AUC on every fold
        for s in &scores.test_scores {
            assert!((s - 0.5).abs() < 1e-12);
        }
        assert!(scores.mean_total_time() >= 0.0);
    }

    #[test]
    fn test_factory_errors_surface_as_results() {
        let (x, y) = toy_data(30);
        let cv = StratifiedKFold::new(5, true, 42);
        let result = cross_validate(
            || -> LabResult<MeanModel> {
                Err(loanlab_core::LabError::InvalidOperation(
                    "bad pipeline".to_string(),
                ))
            },
            &x,
            &y,
            &cv,
            |t, p| roc_auc(t, p),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_collect_fold_probabilities_covers_dataset() {
        let (x, y) = toy_data(30);
        let cv = StratifiedKFold::new(5, true, 42);
        let folds = collect_fold_probabilities(|| Ok(MeanModel::new()), &x, &y, &cv).unwrap();
        assert_eq!(folds.len(), 5);
        let total: usize = folds.iter().map(|(t, _)| t.len()).sum();
        assert_eq!(total, 30);
        for (y_test, proba) in &folds {
            assert_eq!(y_test.len(), proba.len());
        }
    }
}
