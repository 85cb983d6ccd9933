use std::collections::BTreeMap;
use std::path::Path;

use loanlab_core::LabResult;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::records::{round_score, round_time};

/// The columns every experiment table shares, read back from disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreRow {
    #[serde(rename = "Model")]
    pub model: String,
    #[serde(rename = "ROC_AUC")]
    pub roc_auc: f64,
    #[serde(rename = "Time")]
    pub time: f64,
}

/// Aggregated view of one model across every loaded experiment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryRow {
    #[serde(rename = "Model")]
    pub model: String,
    #[serde(rename = "Count")]
    pub count: usize,
    #[serde(rename = "Max_ROC_AUC")]
    pub max_score: f64,
    #[serde(rename = "Mean_ROC_AUC")]
    pub mean_score: f64,
    #[serde(rename = "Min_ROC_AUC")]
    pub min_score: f64,
    #[serde(rename = "Mean_Time")]
    pub mean_time: f64,
    #[serde(rename = "Min_Time")]
    pub min_time: f64,
    #[serde(rename = "Max_Time")]
    pub max_time: f64,
}

/// Read the shared columns out of every CSV in a results directory.
/// Extra per-experiment columns are ignored.
pub fn load_results_from_folder(dir: impl AsRef<Path>) -> LabResult<Vec<ScoreRow>> {
    let dir = dir.as_ref();
    let mut rows = Vec::new();
    let mut paths: Vec<_> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.extension().is_some_and(|ext| ext == "csv"))
        .collect();
    paths.sort();

    for path in paths {
        let mut batch: Vec<ScoreRow> = loanlab_io::read_records(&path)?;
        info!(path = %path.display(), rows = batch.len(), "loaded results");
        rows.append(&mut batch);
    }
    Ok(rows)
}

/// Group rows by model and aggregate scores and timings, best models
/// first (by max score, then mean).
pub fn summarize_results(rows: &[ScoreRow]) -> Vec<SummaryRow> {
    let mut groups: BTreeMap<&str, Vec<&ScoreRow>> = BTreeMap::new();
    for row in rows {
        groups.entry(&row.model).or_default().push(row);
    }

    let mut summary: Vec<SummaryRow> = groups
        .into_iter()
        .map(|(model, rows)| {
            let n = rows.len() as f64;
            let scores: Vec<f64> = rows.iter().map(|r| r.roc_auc).collect();
            let times: Vec<f64> = rows.iter().map(|r| r.time).collect();
            SummaryRow {
                model: model.to_string(),
                count: rows.len(),
                max_score: round_score(fold_max(&scores)),
                mean_score: round_score(scores.iter().sum::<f64>() / n),
                min_score: round_score(fold_min(&scores)),
                mean_time: round_time(times.iter().sum::<f64>() / n),
                min_time: round_time(fold_min(&times)),
                max_time: round_time(fold_max(&times)),
            }
        })
        .collect();

    summary.sort_by(|a, b| {
        (b.max_score, b.mean_score)
            .partial_cmp(&(a.max_score, a.mean_score))
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    summary
}

fn fold_max(values: &[f64]) -> f64 {
    values.iter().copied().fold(f64::NEG_INFINITY, f64::max)
}

fn fold_min(values: &[f64]) -> f64 {
    values.iter().copied().fold(f64::INFINITY, f64::min)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{save_records, ImputationRecord};

    fn row(model: &str, score: f64, time: f64) -> ScoreRow {
        ScoreRow {
            model: model.to_string(),
            roc_auc: score,
            time,
        }
    }

    #[test]
    fn test_summary_groups_and_sorts() {
        let rows = vec![
            row("forest", 0.84, 1.0),
            row("forest", 0.80, 3.0),
            row("gboost", 0.86, 2.0),
            row("logit", 0.70, 0.1),
        ];
        let summary = summarize_results(&rows);
        assert_eq!(summary.len(), 3);
        assert_eq!(summary[0].model, "gboost");
        assert_eq!(summary[1].model, "forest");
        assert_eq!(summary[1].count, 2);
        assert_eq!(summary[1].max_score, 0.84);
        assert_eq!(summary[1].mean_score, 0.82);
        assert_eq!(summary[1].min_score, 0.8);
        assert_eq!(summary[1].mean_time, 2.0);
        assert_eq!(summary[2].model, "logit");
    }

    #[test]
    fn test_max_score_ties_break_on_mean() {
        let rows = vec![
            row("a", 0.85, 1.0),
            row("a", 0.60, 1.0),
            row("b", 0.85, 1.0),
            row("b", 0.80, 1.0),
        ];
        let summary = summarize_results(&rows);
        assert_eq!(summary[0].model, "b");
    }

    #[test]
    fn test_load_results_reads_every_csv() {
        let dir = tempfile::tempdir().unwrap();
        save_records(
            &[ImputationRecord {
                model: "forest".to_string(),
                parameters: String::new(),
                imputer: "mean".to_string(),
                roc_auc: 0.81,
                time: 1.5,
            }],
            Some(&dir.path().join("imputation.csv")),
        )
        .unwrap();
        save_records(
            &[row("gboost", 0.86, 2.0)],
            Some(&dir.path().join("cv.csv")),
        )
        .unwrap();
        // Non-CSV files are skipped
        std::fs::write(dir.path().join("notes.txt"), "ignore me").unwrap();

        let rows = load_results_from_folder(dir.path()).unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().any(|r| r.model == "forest"));
        assert!(rows.iter().any(|r| r.model == "gboost"));
    }
}
