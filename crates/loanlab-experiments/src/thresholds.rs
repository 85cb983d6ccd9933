use loanlab_core::{Frame, LabResult};
use loanlab_metrics::{f1_score, geometric_mean, precision, recall, to_labels};
use loanlab_models::Classifier;
use loanlab_select::collect_fold_probabilities;
use tracing::info;

use crate::config::ExperimentConfig;
use crate::pipeline::ModelPipeline;

/// Metric curves over candidate probability cutoffs, averaged across CV
/// folds for one estimator.
#[derive(Debug, Clone)]
pub struct ThresholdCurve {
    pub model: String,
    pub thresholds: Vec<f64>,
    pub f1: Vec<f64>,
    pub precision: Vec<f64>,
    pub recall: Vec<f64>,
    pub g_mean: Vec<f64>,
}

impl ThresholdCurve {
    /// Cutoff with the best mean G-mean, balancing sensitivity against
    /// specificity. `None` on an empty curve.
    pub fn optimal_threshold(&self) -> Option<f64> {
        argmax(&self.g_mean).map(|i| self.thresholds[i])
    }

    /// (threshold, score) at the F1 peak, `None` on an empty curve.
    pub fn max_f1(&self) -> Option<(f64, f64)> {
        argmax(&self.f1).map(|i| (self.thresholds[i], self.f1[i]))
    }
}

fn argmax(values: &[f64]) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (i, &v) in values.iter().enumerate() {
        if best.map_or(true, |b| v > values[b]) {
            best = Some(i);
        }
    }
    best
}

/// Cutoffs swept by default: every hundredth from 0.01 to 0.99.
pub fn default_thresholds() -> Vec<f64> {
    (1..100).map(|i| i as f64 / 100.0).collect()
}

/// For every model, fit one pipeline per fold, pool the held-out
/// probabilities, then score each cutoff by averaging F1, precision,
/// recall and G-mean across folds.
pub fn evaluate_discrimination_thresholds(
    models: &[Box<dyn Classifier>],
    x: &Frame,
    y: &[f64],
    thresholds: &[f64],
    config: &ExperimentConfig,
) -> LabResult<Vec<ThresholdCurve>> {
    if thresholds.is_empty() {
        return Err(loanlab_core::LabError::InvalidParam {
            name: "thresholds".to_string(),
            reason: "need at least one cutoff to sweep".to_string(),
        });
    }
    let cv = config.cv();
    let mut curves = Vec::with_capacity(models.len());

    for model in models {
        let folds = collect_fold_probabilities(
            || Ok(ModelPipeline::general(model.clone_unfitted())),
            x,
            y,
            &cv,
        )?;

        let mut curve = ThresholdCurve {
            model: model.name(),
            thresholds: thresholds.to_vec(),
            f1: Vec::with_capacity(thresholds.len()),
            precision: Vec::with_capacity(thresholds.len()),
            recall: Vec::with_capacity(thresholds.len()),
            g_mean: Vec::with_capacity(thresholds.len()),
        };

        for &threshold in thresholds {
            let mut sums = [0.0f64; 4];
            for (y_test, proba) in &folds {
                let labels = to_labels(proba, threshold);
                sums[0] += f1_score(y_test, &labels);
                sums[1] += precision(y_test, &labels);
                sums[2] += recall(y_test, &labels);
                sums[3] += geometric_mean(y_test, &labels);
            }
            let n = folds.len() as f64;
            curve.f1.push(sums[0] / n);
            curve.precision.push(sums[1] / n);
            curve.recall.push(sums[2] / n);
            curve.g_mean.push(sums[3] / n);
        }

        if let Some(optimal) = curve.optimal_threshold() {
            info!(model = %curve.model, optimal, "threshold curve computed");
        }
        curves.push(curve);
    }
    Ok(curves)
}

#[cfg(test)]
mod tests {
    use super::*;
    use loanlab_core::Column;
    use loanlab_models::LogisticRegression;

    fn loan_frame(n: usize) -> (Frame, Vec<f64>) {
        let mut frame = Frame::new();
        frame
            .push_column(
                "income",
                Column::Numeric((0..n).map(|i| i as f64 * 25.0).collect()),
            )
            .unwrap();
        let y: Vec<f64> = (0..n).map(|i| if i >= n / 2 { 1.0 } else { 0.0 }).collect();
        (frame, y)
    }

    #[test]
    fn test_curve_shapes_and_optimum() {
        let (x, y) = loan_frame(40);
        let config = ExperimentConfig {
            n_splits: 2,
            ..ExperimentConfig::default()
        };
        let models: Vec<Box<dyn Classifier>> = vec![Box::new(LogisticRegression::new())];
        let thresholds = default_thresholds();
        let curves =
            evaluate_discrimination_thresholds(&models, &x, &y, &thresholds, &config).unwrap();

        assert_eq!(curves.len(), 1);
        let curve = &curves[0];
        assert_eq!(curve.f1.len(), thresholds.len());
        assert_eq!(curve.g_mean.len(), thresholds.len());

        let optimal = curve.optimal_threshold().unwrap();
        assert!(thresholds.contains(&optimal));
        let (f1_thr, f1_peak) = curve.max_f1().unwrap();
        assert!(thresholds.contains(&f1_thr));
        assert!(f1_peak > 0.5, "separable data should yield a strong F1 peak");
    }

    #[test]
    fn test_empty_sweep_is_rejected() {
        let (x, y) = loan_frame(40);
        let config = ExperimentConfig {
            n_splits: 2,
            ..ExperimentConfig::default()
        };
        let models: Vec<Box<dyn Classifier>> = vec![Box::new(LogisticRegression::new())];
        assert!(evaluate_discrimination_thresholds(&models, &x, &y, &[], &config).is_err());

        let empty = ThresholdCurve {
            model: "LogisticRegression".to_string(),
            thresholds: Vec::new(),
            f1: Vec::new(),
            precision: Vec::new(),
            recall: Vec::new(),
            g_mean: Vec::new(),
        };
        assert_eq!(empty.optimal_threshold(), None);
        assert_eq!(empty.max_f1(), None);
    }

    #[test]
    fn test_recall_is_monotone_down() {
        let (x, y) = loan_frame(40);
        let config = ExperimentConfig {
            n_splits: 2,
            ..ExperimentConfig::default()
        };
        let models: Vec<Box<dyn Classifier>> = vec![Box::new(LogisticRegression::new())];
        let curves = evaluate_discrimination_thresholds(
            &models,
            &x,
            &y,
            &default_thresholds(),
            &config,
        )
        .unwrap();
        let recall = &curves[0].recall;
        for pair in recall.windows(2) {
            assert!(pair[1] <= pair[0] + 1e-12, "recall never rises with the cutoff");
        }
    }
}
