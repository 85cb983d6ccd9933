use loanlab_core::{Frame, LabError, LabResult};
use loanlab_models::Classifier;
use loanlab_preprocess::{ImportanceSelector, TablePreprocessor};
use loanlab_select::Probabilistic;

/// Importance-based selection refitted on every training set: the
/// reference estimator is trained on the fold's preprocessed features
/// and its importances decide which columns the model sees.
struct SelectionStage {
    threshold: f64,
    reference: Box<dyn Classifier>,
    selector: Option<ImportanceSelector>,
}

/// Preprocessor, optional feature selection and classifier, fitted as
/// one unit. Each CV fold gets its own pipeline so nothing leaks
/// between train and test rows.
pub struct ModelPipeline {
    preprocessor: TablePreprocessor,
    selection: Option<SelectionStage>,
    model: Box<dyn Classifier>,
}

impl ModelPipeline {
    pub fn new(preprocessor: TablePreprocessor, model: Box<dyn Classifier>) -> Self {
        ModelPipeline {
            preprocessor,
            selection: None,
            model,
        }
    }

    /// Default preprocessing in front of the model.
    pub fn general(model: Box<dyn Classifier>) -> Self {
        ModelPipeline::new(TablePreprocessor::general(), model)
    }

    /// Select features whose reference-estimator importance clears
    /// `threshold`. The reference is refitted on whatever training rows
    /// this pipeline is fitted on.
    pub fn with_selection(mut self, threshold: f64, reference: Box<dyn Classifier>) -> Self {
        self.selection = Some(SelectionStage {
            threshold,
            reference,
            selector: None,
        });
        self
    }
}

impl Probabilistic for ModelPipeline {
    fn fit(&mut self, x: &Frame, y: &[f64]) -> LabResult<()> {
        let mut features = self.preprocessor.fit_transform(x, y)?;
        if let Some(stage) = &mut self.selection {
            let mut reference = stage.reference.clone_unfitted();
            reference.fit(&features, y)?;
            let importances = reference.feature_importances().ok_or_else(|| {
                LabError::InvalidOperation(
                    "reference estimator reports no feature importances".to_string(),
                )
            })?;
            let mut selector = ImportanceSelector::new(stage.threshold);
            selector.fit_from_importances(importances)?;
            features = selector.transform(&features)?;
            stage.selector = Some(selector);
        }
        self.model.fit(&features, y)
    }

    fn predict_proba(&self, x: &Frame) -> LabResult<Vec<f64>> {
        let mut features = self.preprocessor.transform(x)?;
        if let Some(stage) = &self.selection {
            let selector = stage
                .selector
                .as_ref()
                .ok_or(LabError::NotFitted("predict_proba"))?;
            features = selector.transform(&features)?;
        }
        self.model.predict_proba(&features)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use loanlab_core::Column;
    use loanlab_models::{LogisticRegression, RandomForestClassifier};

    fn toy_frame(n: usize) -> (Frame, Vec<f64>) {
        let mut frame = Frame::new();
        frame
            .push_column(
                "income",
                Column::Numeric((0..n).map(|i| i as f64 * 100.0).collect()),
            )
            .unwrap();
        frame
            .push_column(
                "grade",
                Column::Categorical(
                    (0..n)
                        .map(|i| Some(if i % 2 == 0 { "A" } else { "B" }.to_string()))
                        .collect(),
                ),
            )
            .unwrap();
        let y: Vec<f64> = (0..n).map(|i| if i >= n / 2 { 1.0 } else { 0.0 }).collect();
        (frame, y)
    }

    fn small_forest() -> Box<dyn Classifier> {
        let mut forest = RandomForestClassifier::new();
        forest.n_estimators = 10;
        Box::new(forest)
    }

    #[test]
    fn test_pipeline_fits_and_scores() {
        let (frame, y) = toy_frame(40);
        let mut pipeline = ModelPipeline::general(Box::new(LogisticRegression::new()));
        pipeline.fit(&frame, &y).unwrap();
        let proba = pipeline.predict_proba(&frame).unwrap();
        assert_eq!(proba.len(), 40);
        assert!(proba.iter().all(|p| (0.0..=1.0).contains(p)));
        // Income separates the classes cleanly
        assert!(proba[39] > proba[0]);
    }

    #[test]
    fn test_selection_is_fitted_from_training_rows() {
        let (frame, y) = toy_frame(40);
        let mut pipeline = ModelPipeline::general(Box::new(LogisticRegression::new()))
            .with_selection(0.0, small_forest());
        // Before fit there is no selector, so scoring must refuse
        assert!(pipeline.predict_proba(&frame).is_err());

        pipeline.fit(&frame, &y).unwrap();
        assert_eq!(pipeline.predict_proba(&frame).unwrap().len(), 40);
    }

    #[test]
    fn test_selection_threshold_applies_per_fit() {
        let (frame, y) = toy_frame(40);
        // Importances are normalized to sum 1, so no feature can clear
        // a threshold above it; the failure at fit time shows the
        // selector is derived from the rows being fitted on.
        let mut pipeline = ModelPipeline::general(Box::new(LogisticRegression::new()))
            .with_selection(1.5, small_forest());
        assert!(pipeline.fit(&frame, &y).is_err());
    }

    #[test]
    fn test_selection_needs_importance_reporting_reference() {
        let (frame, y) = toy_frame(40);
        // Logistic regression exposes no importances and cannot anchor
        // the selection stage
        let mut pipeline = ModelPipeline::general(Box::new(LogisticRegression::new()))
            .with_selection(0.0, Box::new(LogisticRegression::new()));
        assert!(pipeline.fit(&frame, &y).is_err());
    }

    #[test]
    fn test_predict_before_fit_is_error() {
        let (frame, _) = toy_frame(10);
        let pipeline = ModelPipeline::general(Box::new(LogisticRegression::new()));
        assert!(pipeline.predict_proba(&frame).is_err());
    }
}
