use std::path::Path;

use loanlab_core::{Frame, LabResult};
use loanlab_metrics::roc_auc;
use loanlab_models::{apply_params, Classifier, ParamSet};
use loanlab_select::{grid_search, randomized_search, ParamGrid, SearchOutcome};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::ExperimentConfig;
use crate::pipeline::ModelPipeline;
use crate::records::{round_score, round_time, SearchRecord};

/// What a finished search leaves on disk: the winning configuration and
/// the per-candidate mean test scores, best first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchArtifact {
    pub model: String,
    pub best_params: ParamSet,
    pub best_score: f64,
    pub mean_test_scores: Vec<f64>,
}

impl SearchArtifact {
    fn from_outcome(model: String, outcome: &SearchOutcome) -> Self {
        let best = outcome.best();
        SearchArtifact {
            model,
            best_params: best.params.clone(),
            best_score: round_score(best.mean_test_score),
            mean_test_scores: outcome.mean_test_scores(),
        }
    }
}

fn render_params(params: &ParamSet) -> String {
    params
        .iter()
        .map(|(name, value)| format!("{name}={value}"))
        .collect::<Vec<_>>()
        .join(", ")
}

fn save_artifact(artifact: &SearchArtifact, path: Option<&Path>) -> LabResult<()> {
    match path {
        Some(path) => {
            loanlab_io::save_json(path, artifact)?;
            info!(model = %artifact.model, path = %path.display(), "saved search artifact");
            Ok(())
        }
        None => {
            warn!(model = %artifact.model, "no save path configured, search artifact not persisted");
            Ok(())
        }
    }
}

/// Exhaustive grid search for one model over the general preprocessing
/// pipeline. Returns the best mean CV ROC AUC.
pub fn grid_search_model(
    model: &dyn Classifier,
    grid: &ParamGrid,
    x: &Frame,
    y: &[f64],
    config: &ExperimentConfig,
    artifact_path: Option<&Path>,
) -> LabResult<f64> {
    let cv = config.cv();
    let seed = config.seed;
    info!(model = %model.name(), candidates = grid.len(), "grid search");

    let outcome = grid_search(
        |params: &ParamSet| {
            let mut candidate = model.clone_unfitted();
            apply_params(candidate.as_mut(), params)?;
            candidate.set_seed(seed);
            Ok(ModelPipeline::general(candidate))
        },
        grid,
        x,
        y,
        &cv,
        |t, p| roc_auc(t, p),
    )?;

    let artifact = SearchArtifact::from_outcome(model.name(), &outcome);
    save_artifact(&artifact, artifact_path)?;
    Ok(artifact.best_score)
}

/// Randomized search across a roster: `n_iter` seeded samples from each
/// model's grid. One artifact per model, one ranking record per model,
/// best score first.
pub fn randomized_search_roster(
    entries: &[(Box<dyn Classifier>, ParamGrid)],
    n_iter: usize,
    x: &Frame,
    y: &[f64],
    config: &ExperimentConfig,
) -> LabResult<Vec<SearchRecord>> {
    let cv = config.cv();
    let seed = config.seed;
    let mut records = Vec::with_capacity(entries.len());

    for (model, grid) in entries {
        info!(model = %model.name(), candidates = grid.len().min(n_iter), "randomized search");
        let outcome = randomized_search(
            |params: &ParamSet| {
                let mut candidate = model.clone_unfitted();
                apply_params(candidate.as_mut(), params)?;
                candidate.set_seed(seed);
                Ok(ModelPipeline::general(candidate))
            },
            grid,
            x,
            y,
            &cv,
            |t, p| roc_auc(t, p),
            n_iter,
            seed,
        )?;

        let artifact = SearchArtifact::from_outcome(model.name(), &outcome);
        let artifact_path = config
            .output_dir
            .as_ref()
            .map(|dir| dir.join(format!("{}_search.json", artifact.model)));
        save_artifact(&artifact, artifact_path.as_deref())?;

        let best = outcome.best();
        records.push(SearchRecord {
            model: artifact.model,
            best_params: render_params(&best.params),
            roc_auc: round_score(best.mean_test_score),
            time: round_time(best.mean_fit_time + best.mean_score_time),
        });
    }

    records.sort_by(|a, b| {
        b.roc_auc
            .partial_cmp(&a.roc_auc)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use loanlab_core::Column;
    use loanlab_models::{LogisticRegression, ParamValue};

    fn loan_frame(n: usize) -> (Frame, Vec<f64>) {
        let mut frame = Frame::new();
        frame
            .push_column(
                "income",
                Column::Numeric((0..n).map(|i| i as f64 * 50.0).collect()),
            )
            .unwrap();
        let y: Vec<f64> = (0..n).map(|i| if i >= n / 2 { 1.0 } else { 0.0 }).collect();
        (frame, y)
    }

    fn small_config() -> ExperimentConfig {
        ExperimentConfig {
            n_splits: 2,
            ..ExperimentConfig::default()
        }
    }

    #[test]
    fn test_grid_search_saves_artifact_and_scores() {
        let (x, y) = loan_frame(30);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logit_search.json");
        let grid = ParamGrid::new().with(
            "max_iter",
            vec![ParamValue::Int(50), ParamValue::Int(200)],
        );

        let best = grid_search_model(
            &LogisticRegression::new(),
            &grid,
            &x,
            &y,
            &small_config(),
            Some(&path),
        )
        .unwrap();
        assert!(best > 0.5);

        let artifact: SearchArtifact = loanlab_io::load_json(&path).unwrap();
        assert_eq!(artifact.model, "LogisticRegression");
        assert_eq!(artifact.best_score, best);
        assert_eq!(artifact.mean_test_scores.len(), 2);
    }

    #[test]
    fn test_grid_search_without_path_still_returns_score() {
        let (x, y) = loan_frame(30);
        let grid = ParamGrid::new().with("max_iter", vec![ParamValue::Int(50)]);
        let best = grid_search_model(
            &LogisticRegression::new(),
            &grid,
            &x,
            &y,
            &small_config(),
            None,
        )
        .unwrap();
        assert!(best > 0.0);
    }

    #[test]
    fn test_randomized_roster_ranks_models() {
        let (x, y) = loan_frame(30);
        let grid = ParamGrid::new().with(
            "learning_rate",
            vec![
                ParamValue::Float(0.01),
                ParamValue::Float(0.1),
                ParamValue::Float(0.5),
            ],
        );
        let entries: Vec<(Box<dyn Classifier>, ParamGrid)> = vec![
            (Box::new(LogisticRegression::new()), grid.clone()),
            (Box::new(LogisticRegression::new()), grid),
        ];
        let records =
            randomized_search_roster(&entries, 2, &x, &y, &small_config()).unwrap();
        assert_eq!(records.len(), 2);
        assert!(records[0].roc_auc >= records[1].roc_auc);
        assert!(records[0].best_params.contains("learning_rate="));
    }
}
