use loanlab_core::{Frame, LabError, LabResult, Matrix};

use crate::encoder::{CategoricalEncoder, EncodeStrategy};
use crate::imputer::{ImputeStrategy, NumericImputer};

/// Column transformer: imputes the numeric columns and encodes the
/// categorical ones, concatenating both blocks into one feature matrix.
///
/// Column roles are captured at fit time; transform applies the same
/// split to new frames.
#[derive(Debug, Clone)]
pub struct TablePreprocessor {
    pub imputer: NumericImputer,
    pub encoder: CategoricalEncoder,
    numeric_cols: Vec<String>,
    categorical_cols: Vec<String>,
    feature_names: Vec<String>,
    fitted: bool,
}

impl TablePreprocessor {
    pub fn new(impute: ImputeStrategy, encode: EncodeStrategy) -> Self {
        TablePreprocessor {
            imputer: NumericImputer::new(impute),
            encoder: CategoricalEncoder::new(encode),
            numeric_cols: Vec::new(),
            categorical_cols: Vec::new(),
            feature_names: Vec::new(),
            fitted: false,
        }
    }

    /// The default experiment preprocessor: constant -1 for numerics,
    /// target encoding for categoricals.
    pub fn general() -> Self {
        TablePreprocessor::new(ImputeStrategy::Constant(-1.0), EncodeStrategy::Target)
    }

    fn numeric_block(&self, frame: &Frame) -> LabResult<Matrix> {
        let columns: Vec<Vec<f64>> = self
            .numeric_cols
            .iter()
            .map(|name| frame.numeric(name).map(<[f64]>::to_vec))
            .collect::<LabResult<_>>()?;
        Matrix::from_columns(&columns)
    }

    pub fn fit(&mut self, frame: &Frame, y: &[f64]) -> LabResult<()> {
        if frame.is_empty() {
            return Err(LabError::EmptyFrame);
        }
        self.numeric_cols = frame.numeric_names();
        self.categorical_cols = frame.categorical_names();

        let numeric = self.numeric_block(frame)?;
        self.imputer.fit(&numeric)?;
        self.encoder.fit(frame, &self.categorical_cols, y)?;

        // Feature names come out once, from the training frame.
        let (_, encoded_names) = self.encoder.transform(frame)?;
        self.feature_names = self
            .numeric_cols
            .iter()
            .cloned()
            .chain(encoded_names)
            .collect();
        self.fitted = true;
        Ok(())
    }

    pub fn transform(&self, frame: &Frame) -> LabResult<Matrix> {
        if !self.fitted {
            return Err(LabError::NotFitted("transform"));
        }
        let numeric = self.imputer.transform(&self.numeric_block(frame)?)?;
        let (encoded, _) = self.encoder.transform(frame)?;
        Matrix::hconcat(&[numeric, encoded])
    }

    pub fn fit_transform(&mut self, frame: &Frame, y: &[f64]) -> LabResult<Matrix> {
        self.fit(frame, y)?;
        self.transform(frame)
    }

    /// Output feature names, numeric block first.
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use loanlab_core::Column;

    fn loan_frame() -> (Frame, Vec<f64>) {
        let mut frame = Frame::new();
        frame
            .push_column(
                "income",
                Column::Numeric(vec![1000.0, f64::NAN, 3000.0, 4000.0]),
            )
            .unwrap();
        frame
            .push_column(
                "employer",
                Column::Categorical(vec![
                    Some("acme".into()),
                    Some("acme".into()),
                    None,
                    Some("globex".into()),
                ]),
            )
            .unwrap();
        (frame, vec![1.0, 0.0, 1.0, 0.0])
    }

    #[test]
    fn test_general_preprocessor_shapes() {
        let (frame, y) = loan_frame();
        let mut prep = TablePreprocessor::general();
        let m = prep.fit_transform(&frame, &y).unwrap();
        // 1 numeric + 1 target-encoded categorical
        assert_eq!(m.n_cols(), 2);
        assert_eq!(m.n_rows(), 4);
        assert_relative_eq!(m.get(1, 0), -1.0); // constant imputation
        assert_eq!(prep.feature_names(), &["income", "employer"]);
    }

    #[test]
    fn test_one_hot_expands_names() {
        let (frame, y) = loan_frame();
        let mut prep =
            TablePreprocessor::new(ImputeStrategy::Mean, EncodeStrategy::OneHot);
        let m = prep.fit_transform(&frame, &y).unwrap();
        // 1 numeric + 3 employer levels (acme, globex, missing)
        assert_eq!(m.n_cols(), 4);
        assert!(prep
            .feature_names()
            .iter()
            .any(|n| n == "employer=acme"));
    }

    #[test]
    fn test_transform_applies_training_roles() {
        let (frame, y) = loan_frame();
        let mut prep = TablePreprocessor::general();
        prep.fit(&frame, &y).unwrap();

        let test = frame.take_rows(&[0, 1]);
        let m = prep.transform(&test).unwrap();
        assert_eq!(m.n_rows(), 2);
        assert_eq!(m.n_cols(), 2);
    }

    #[test]
    fn test_empty_frame_rejected() {
        let mut prep = TablePreprocessor::general();
        assert!(prep.fit(&Frame::new(), &[]).is_err());
    }
}
