/// Confusion counts for binary labels (positive class = 1).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConfusionCounts {
    pub tp: usize,
    pub fp: usize,
    pub tn: usize,
    pub fn_: usize,
}

impl ConfusionCounts {
    pub fn from_labels(y_true: &[f64], y_pred: &[f64]) -> Self {
        assert_eq!(y_true.len(), y_pred.len(), "Length mismatch");
        let mut counts = ConfusionCounts::default();
        for (&t, &p) in y_true.iter().zip(y_pred) {
            match (t > 0.5, p > 0.5) {
                (true, true) => counts.tp += 1,
                (false, true) => counts.fp += 1,
                (false, false) => counts.tn += 1,
                (true, false) => counts.fn_ += 1,
            }
        }
        counts
    }
}

/// Convert positive-class probabilities to hard labels at a threshold.
pub fn to_labels(proba: &[f64], threshold: f64) -> Vec<f64> {
    proba
        .iter()
        .map(|&p| if p >= threshold { 1.0 } else { 0.0 })
        .collect()
}

/// Precision of the positive class. Zero when nothing was predicted positive.
pub fn precision(y_true: &[f64], y_pred: &[f64]) -> f64 {
    let c = ConfusionCounts::from_labels(y_true, y_pred);
    if c.tp + c.fp == 0 {
        0.0
    } else {
        c.tp as f64 / (c.tp + c.fp) as f64
    }
}

/// Recall (sensitivity) of the positive class.
pub fn recall(y_true: &[f64], y_pred: &[f64]) -> f64 {
    let c = ConfusionCounts::from_labels(y_true, y_pred);
    if c.tp + c.fn_ == 0 {
        0.0
    } else {
        c.tp as f64 / (c.tp + c.fn_) as f64
    }
}

/// F1 score: harmonic mean of precision and recall.
pub fn f1_score(y_true: &[f64], y_pred: &[f64]) -> f64 {
    let p = precision(y_true, y_pred);
    let r = recall(y_true, y_pred);
    if p + r == 0.0 {
        0.0
    } else {
        2.0 * p * r / (p + r)
    }
}

/// Geometric mean of the per-class recalls. The balanced-performance
/// metric used to pick discrimination thresholds on the skewed loan data.
pub fn geometric_mean(y_true: &[f64], y_pred: &[f64]) -> f64 {
    let c = ConfusionCounts::from_labels(y_true, y_pred);
    let sensitivity = if c.tp + c.fn_ == 0 {
        0.0
    } else {
        c.tp as f64 / (c.tp + c.fn_) as f64
    };
    let specificity = if c.tn + c.fp == 0 {
        0.0
    } else {
        c.tn as f64 / (c.tn + c.fp) as f64
    };
    (sensitivity * specificity).sqrt()
}

/// ROC-AUC for binary classification.
///
/// Computes the Area Under the Receiver Operating Characteristic Curve
/// using the trapezoidal rule over all thresholds.
pub fn roc_auc(y_true: &[f64], y_score: &[f64]) -> f64 {
    assert_eq!(y_true.len(), y_score.len(), "Length mismatch");
    let n = y_true.len();

    // Sort (score, label) pairs by score descending
    let mut pairs: Vec<(f64, bool)> = y_score
        .iter()
        .zip(y_true)
        .map(|(&s, &t)| (s, t > 0.5))
        .collect();
    pairs.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap());

    let total_pos = pairs.iter().filter(|(_, t)| *t).count() as f64;
    let total_neg = n as f64 - total_pos;

    if total_pos == 0.0 || total_neg == 0.0 {
        return 0.5; // undefined, return random
    }

    let mut auc = 0.0;
    let mut tp = 0.0;
    let mut fp = 0.0;
    let mut prev_tpr = 0.0;
    let mut prev_fpr = 0.0;
    let mut i = 0;

    while i < pairs.len() {
        // Advance over ties so equal scores contribute a single ROC point.
        let score = pairs[i].0;
        while i < pairs.len() && pairs[i].0 == score {
            if pairs[i].1 {
                tp += 1.0;
            } else {
                fp += 1.0;
            }
            i += 1;
        }
        let tpr = tp / total_pos;
        let fpr = fp / total_neg;
        auc += (fpr - prev_fpr) * (tpr + prev_tpr) / 2.0; // trapezoidal rule
        prev_tpr = tpr;
        prev_fpr = fpr;
    }
    auc
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_confusion_counts() {
        let y_true = [0.0, 0.0, 1.0, 1.0];
        let y_pred = [0.0, 1.0, 0.0, 1.0];
        let c = ConfusionCounts::from_labels(&y_true, &y_pred);
        assert_eq!(
            c,
            ConfusionCounts {
                tp: 1,
                fp: 1,
                tn: 1,
                fn_: 1
            }
        );
    }

    #[test]
    fn test_precision_recall_f1() {
        let y_true = [1.0, 1.0, 0.0, 0.0, 1.0];
        let y_pred = [1.0, 0.0, 0.0, 1.0, 1.0];
        // TP=2, FP=1, FN=1 → P=2/3, R=2/3
        assert_relative_eq!(precision(&y_true, &y_pred), 2.0 / 3.0);
        assert_relative_eq!(recall(&y_true, &y_pred), 2.0 / 3.0);
        assert_relative_eq!(f1_score(&y_true, &y_pred), 2.0 / 3.0);
    }

    #[test]
    fn test_geometric_mean() {
        let y_true = [1.0, 1.0, 0.0, 0.0];
        let y_pred = [1.0, 0.0, 0.0, 0.0];
        // sensitivity = 0.5, specificity = 1.0
        assert_relative_eq!(geometric_mean(&y_true, &y_pred), 0.5f64.sqrt());
    }

    #[test]
    fn test_roc_auc_perfect_and_random() {
        let y_true = [0.0, 0.0, 1.0, 1.0];
        let perfect = [0.1, 0.2, 0.8, 0.9];
        assert_relative_eq!(roc_auc(&y_true, &perfect), 1.0);

        let inverted = [0.9, 0.8, 0.2, 0.1];
        assert_relative_eq!(roc_auc(&y_true, &inverted), 0.0);

        // Single-class input is undefined; falls back to 0.5
        assert_relative_eq!(roc_auc(&[1.0, 1.0], &[0.3, 0.7]), 0.5);
    }

    #[test]
    fn test_roc_auc_handles_ties() {
        let y_true = [0.0, 1.0, 0.0, 1.0];
        let tied = [0.5, 0.5, 0.5, 0.5];
        assert_relative_eq!(roc_auc(&y_true, &tied), 0.5);
    }

    #[test]
    fn test_to_labels() {
        let proba = [0.2, 0.5, 0.9];
        assert_eq!(to_labels(&proba, 0.5), vec![0.0, 1.0, 1.0]);
        assert_eq!(to_labels(&proba, 0.95), vec![0.0, 0.0, 0.0]);
    }
}
