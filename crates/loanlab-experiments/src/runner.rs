use loanlab_core::{Frame, LabResult};
use loanlab_metrics::roc_auc;
use loanlab_models::Classifier;
use loanlab_preprocess::{EncodeStrategy, ImportanceSelector, ImputeStrategy, TablePreprocessor};
use loanlab_select::cross_validate;
use tracing::info;

use crate::config::ExperimentConfig;
use crate::pipeline::ModelPipeline;
use crate::records::{
    round_score, round_time, CvRecord, EncodingRecord, ImputationRecord, SelectionRecord,
};
use crate::roster::prepare_models_info;

/// Baseline comparison: every model on the general preprocessor.
pub fn cv_scores(
    models: &[Box<dyn Classifier>],
    x: &Frame,
    y: &[f64],
    config: &ExperimentConfig,
) -> LabResult<Vec<CvRecord>> {
    let cv = config.cv();
    let info_rows = prepare_models_info(models, &config.params_to_save);
    let mut records = Vec::with_capacity(models.len());

    for (model, model_info) in models.iter().zip(info_rows) {
        let scores = cross_validate(
            || Ok(ModelPipeline::general(model.clone_unfitted())),
            x,
            y,
            &cv,
            |t, p| roc_auc(t, p),
        )?;
        let record = CvRecord {
            model: model_info.name,
            parameters: model_info.params,
            roc_auc: round_score(scores.mean_score()),
            time: round_time(scores.mean_total_time()),
        };
        info!(model = %record.model, score = record.roc_auc, "cv scored");
        records.push(record);
    }
    Ok(records)
}

fn imputer_lineup() -> Vec<ImputeStrategy> {
    vec![
        ImputeStrategy::Constant(-1.0),
        ImputeStrategy::Mean,
        ImputeStrategy::Median,
        ImputeStrategy::Knn { k: 5 },
        ImputeStrategy::Passthrough,
    ]
}

/// Models x imputers grid. Categoricals are one-hot encoded so the
/// comparison isolates the numeric imputation. The passthrough imputer
/// leaves NaN in place, so it is only paired with models that accept
/// missing values natively.
pub fn imputation_test(
    models: &[Box<dyn Classifier>],
    x: &Frame,
    y: &[f64],
    config: &ExperimentConfig,
) -> LabResult<Vec<ImputationRecord>> {
    let cv = config.cv();
    let info_rows = prepare_models_info(models, &config.params_to_save);
    let mut records = Vec::new();

    for (model, model_info) in models.iter().zip(info_rows) {
        for strategy in imputer_lineup() {
            if matches!(strategy, ImputeStrategy::Passthrough) && !model.handles_missing() {
                continue;
            }
            let scores = cross_validate(
                || {
                    Ok(ModelPipeline::new(
                        TablePreprocessor::new(strategy.clone(), EncodeStrategy::OneHot),
                        model.clone_unfitted(),
                    ))
                },
                x,
                y,
                &cv,
                |t, p| roc_auc(t, p),
            )?;
            records.push(ImputationRecord {
                model: model_info.name.clone(),
                parameters: model_info.params.clone(),
                imputer: strategy.label(),
                roc_auc: round_score(scores.mean_score()),
                time: round_time(scores.mean_total_time()),
            });
        }
        info!(model = %model_info.name, "imputation grid done");
    }
    Ok(records)
}

/// Models x categorical encoders, with constant -1 numeric imputation
/// held fixed.
pub fn cat_encoding_test(
    models: &[Box<dyn Classifier>],
    x: &Frame,
    y: &[f64],
    config: &ExperimentConfig,
) -> LabResult<Vec<EncodingRecord>> {
    let cv = config.cv();
    let encoders = [
        EncodeStrategy::OneHot,
        EncodeStrategy::Ordinal,
        EncodeStrategy::Target,
    ];
    let info_rows = prepare_models_info(models, &config.params_to_save);
    let mut records = Vec::new();

    for (model, model_info) in models.iter().zip(info_rows) {
        for encoder in &encoders {
            let scores = cross_validate(
                || {
                    Ok(ModelPipeline::new(
                        TablePreprocessor::new(ImputeStrategy::Constant(-1.0), *encoder),
                        model.clone_unfitted(),
                    ))
                },
                x,
                y,
                &cv,
                |t, p| roc_auc(t, p),
            )?;
            records.push(EncodingRecord {
                model: model_info.name.clone(),
                parameters: model_info.params.clone(),
                encoder: encoder.label(),
                roc_auc: round_score(scores.mean_score()),
                time: round_time(scores.mean_total_time()),
            });
        }
        info!(model = %model_info.name, "encoding grid done");
    }
    Ok(records)
}

/// Sweep importance thresholds. The reported selected-share and
/// rejected indices come from fitting the reference estimator on the
/// full preprocessed table; inside cross-validation each fold's
/// pipeline refits the reference on its own training rows so the
/// held-out rows never shape the selection they are scored under.
pub fn feature_selection_test(
    models: &[Box<dyn Classifier>],
    reference: &mut dyn Classifier,
    thresholds: &[f64],
    x: &Frame,
    y: &[f64],
    config: &ExperimentConfig,
) -> LabResult<Vec<SelectionRecord>> {
    let cv = config.cv();
    let info_rows = prepare_models_info(models, &config.params_to_save);

    let mut prep = TablePreprocessor::general();
    let features = prep.fit_transform(x, y)?;
    reference.fit(&features, y)?;
    let importances = reference
        .feature_importances()
        .ok_or_else(|| {
            loanlab_core::LabError::InvalidOperation(
                "reference estimator reports no feature importances".to_string(),
            )
        })?
        .to_vec();
    let reference_proto = reference.clone_unfitted();

    let mut records = Vec::new();
    for &threshold in thresholds {
        let mut selector = ImportanceSelector::new(threshold);
        selector.fit_from_importances(&importances)?;
        let selected_pct = selector.selected_share();
        let rejected = selector
            .rejected_indices()
            .iter()
            .map(|i| i.to_string())
            .collect::<Vec<_>>()
            .join(" ");
        info!(threshold, selected_pct, "selector fitted");

        for (model, model_info) in models.iter().zip(&info_rows) {
            let scores = cross_validate(
                || {
                    Ok(ModelPipeline::general(model.clone_unfitted())
                        .with_selection(threshold, reference_proto.clone_unfitted()))
                },
                x,
                y,
                &cv,
                |t, p| roc_auc(t, p),
            )?;
            records.push(SelectionRecord {
                model: model_info.name.clone(),
                parameters: model_info.params.clone(),
                threshold,
                selected_pct,
                rejected: rejected.clone(),
                roc_auc: round_score(scores.mean_score()),
                time: round_time(scores.mean_total_time()),
            });
        }
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use loanlab_core::Column;
    use loanlab_models::{LogisticRegression, RandomForestClassifier};

    fn loan_frame(n: usize) -> (Frame, Vec<f64>) {
        let mut frame = Frame::new();
        frame
            .push_column(
                "income",
                Column::Numeric(
                    (0..n)
                        .map(|i| if i % 7 == 0 { f64::NAN } else { i as f64 * 50.0 })
                        .collect(),
                ),
            )
            .unwrap();
        frame
            .push_column(
                "balance",
                Column::Numeric((0..n).map(|i| (i % 13) as f64).collect()),
            )
            .unwrap();
        frame
            .push_column(
                "grade",
                Column::Categorical(
                    (0..n)
                        .map(|i| Some(["A", "B", "C"][i % 3].to_string()))
                        .collect(),
                ),
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

    fn logistic_only() -> Vec<Box<dyn Classifier>> {
        vec![Box::new(LogisticRegression::new())]
    }

    #[test]
    fn test_cv_scores_one_record_per_model() {
        let (x, y) = loan_frame(30);
        let records = cv_scores(&logistic_only(), &x, &y, &small_config()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].model, "LogisticRegression");
        assert!(records[0].roc_auc > 0.5, "income should separate classes");
        // Scores come out rounded
        assert_eq!(records[0].roc_auc, round_score(records[0].roc_auc));
    }

    #[test]
    fn test_imputation_skips_none_for_imputing_models() {
        let (x, y) = loan_frame(30);
        let records = imputation_test(&logistic_only(), &x, &y, &small_config()).unwrap();
        // Logistic regression cannot take NaN, so "none" is skipped
        assert_eq!(records.len(), 4);
        assert!(records.iter().all(|r| r.imputer != "none"));
    }

    #[test]
    fn test_imputation_includes_none_for_missing_handlers() {
        let (x, y) = loan_frame(30);
        let models: Vec<Box<dyn Classifier>> =
            vec![Box::new(loanlab_models::GradientBoostingClassifier::new())];
        let records = imputation_test(&models, &x, &y, &small_config()).unwrap();
        assert_eq!(records.len(), 5);
        assert!(records.iter().any(|r| r.imputer == "none"));
    }

    #[test]
    fn test_encoding_covers_all_encoders() {
        let (x, y) = loan_frame(30);
        let records = cat_encoding_test(&logistic_only(), &x, &y, &small_config()).unwrap();
        let encoders: Vec<&str> = records.iter().map(|r| r.encoder.as_str()).collect();
        assert_eq!(encoders, vec!["onehot", "ordinal", "target"]);
    }

    #[test]
    fn test_comparison_records_carry_model_parameters() {
        let (x, y) = loan_frame(30);
        let mut forest = RandomForestClassifier::new();
        forest.n_estimators = 10;
        let models: Vec<Box<dyn Classifier>> = vec![Box::new(forest)];

        let records = cat_encoding_test(&models, &x, &y, &small_config()).unwrap();
        assert!(records
            .iter()
            .all(|r| r.parameters.contains("n_estimators=10")));

        let records = imputation_test(&models, &x, &y, &small_config()).unwrap();
        assert!(records
            .iter()
            .all(|r| r.parameters.contains("n_estimators=10")));
    }

    #[test]
    fn test_feature_selection_sweep() {
        let (x, y) = loan_frame(40);
        let mut reference = RandomForestClassifier::new();
        reference.n_estimators = 10;
        let records = feature_selection_test(
            &logistic_only(),
            &mut reference,
            &[0.0],
            &x,
            &y,
            &small_config(),
        )
        .unwrap();
        assert_eq!(records.len(), 1);
        // Threshold zero keeps everything
        assert_eq!(records[0].selected_pct, 100.0);
        assert!(records[0].rejected.is_empty());
    }
}
