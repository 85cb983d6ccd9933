use std::collections::HashMap;

use loanlab_core::{Frame, LabError, LabResult, Matrix};

/// Sentinel category standing in for missing values, so encoders treat
/// "absent" as information rather than erroring.
const MISSING: &str = "__missing__";

/// How categorical columns become numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodeStrategy {
    /// One indicator column per category; unknown categories map to all
    /// zeros.
    OneHot,
    /// Category index as a float; unknown categories map to -1.
    Ordinal,
    /// Smoothed mean of the target per category; unknown categories map to
    /// the global target mean.
    Target,
}

impl EncodeStrategy {
    pub fn label(&self) -> String {
        match self {
            EncodeStrategy::OneHot => "onehot".to_string(),
            EncodeStrategy::Ordinal => "ordinal".to_string(),
            EncodeStrategy::Target => "target".to_string(),
        }
    }
}

/// Encoder over the categorical columns of a [`Frame`].
#[derive(Debug, Clone)]
pub struct CategoricalEncoder {
    pub strategy: EncodeStrategy,
    /// Shrinkage toward the global mean for target encoding.
    pub smoothing: f64,
    columns: Vec<String>,
    categories: Vec<Vec<String>>,
    category_index: Vec<HashMap<String, usize>>,
    target_means: Vec<HashMap<String, f64>>,
    global_mean: f64,
    fitted: bool,
}

impl CategoricalEncoder {
    pub fn new(strategy: EncodeStrategy) -> Self {
        CategoricalEncoder {
            strategy,
            smoothing: 10.0,
            columns: Vec::new(),
            categories: Vec::new(),
            category_index: Vec::new(),
            target_means: Vec::new(),
            global_mean: 0.0,
            fitted: false,
        }
    }

    fn level(value: &Option<String>) -> &str {
        value.as_deref().unwrap_or(MISSING)
    }

    /// Learn category sets (and target statistics) for the given columns.
    pub fn fit(&mut self, frame: &Frame, columns: &[String], y: &[f64]) -> LabResult<()> {
        if matches!(self.strategy, EncodeStrategy::Target) && frame.n_rows() != y.len() {
            return Err(LabError::ShapeMismatch {
                expected: vec![frame.n_rows()],
                got: vec![y.len()],
            });
        }

        self.columns = columns.to_vec();
        self.categories.clear();
        self.category_index.clear();
        self.target_means.clear();
        self.global_mean = if y.is_empty() {
            0.0
        } else {
            y.iter().sum::<f64>() / y.len() as f64
        };

        for name in columns {
            let values = frame.categorical(name)?;

            let mut cats: Vec<String> =
                values.iter().map(|v| Self::level(v).to_string()).collect();
            cats.sort();
            cats.dedup();

            let index: HashMap<String, usize> = cats
                .iter()
                .enumerate()
                .map(|(i, c)| (c.clone(), i))
                .collect();

            if matches!(self.strategy, EncodeStrategy::Target) {
                let mut sums: HashMap<&str, (f64, f64)> = HashMap::new();
                for (v, &target) in values.iter().zip(y) {
                    let entry = sums.entry(Self::level(v)).or_insert((0.0, 0.0));
                    entry.0 += target;
                    entry.1 += 1.0;
                }
                let means: HashMap<String, f64> = sums
                    .into_iter()
                    .map(|(cat, (sum, count))| {
                        let smoothed = (sum + self.smoothing * self.global_mean)
                            / (count + self.smoothing);
                        (cat.to_string(), smoothed)
                    })
                    .collect();
                self.target_means.push(means);
            } else {
                self.target_means.push(HashMap::new());
            }

            self.categories.push(cats);
            self.category_index.push(index);
        }
        self.fitted = true;
        Ok(())
    }

    /// Encode the fitted columns into a matrix plus output feature names.
    pub fn transform(&self, frame: &Frame) -> LabResult<(Matrix, Vec<String>)> {
        if !self.fitted {
            return Err(LabError::NotFitted("transform"));
        }
        let n = frame.n_rows();
        let mut parts: Vec<Vec<f64>> = Vec::new();
        let mut names: Vec<String> = Vec::new();

        for (c, name) in self.columns.iter().enumerate() {
            let values = frame.categorical(name)?;
            match self.strategy {
                EncodeStrategy::OneHot => {
                    for (k, cat) in self.categories[c].iter().enumerate() {
                        let mut col = vec![0.0; n];
                        for (i, v) in values.iter().enumerate() {
                            if self.category_index[c].get(Self::level(v)) == Some(&k) {
                                col[i] = 1.0;
                            }
                        }
                        parts.push(col);
                        names.push(format!("{name}={cat}"));
                    }
                }
                EncodeStrategy::Ordinal => {
                    let col: Vec<f64> = values
                        .iter()
                        .map(|v| {
                            self.category_index[c]
                                .get(Self::level(v))
                                .map_or(-1.0, |&i| i as f64)
                        })
                        .collect();
                    parts.push(col);
                    names.push(name.clone());
                }
                EncodeStrategy::Target => {
                    let col: Vec<f64> = values
                        .iter()
                        .map(|v| {
                            self.target_means[c]
                                .get(Self::level(v))
                                .copied()
                                .unwrap_or(self.global_mean)
                        })
                        .collect();
                    parts.push(col);
                    names.push(name.clone());
                }
            }
        }

        Ok((Matrix::from_columns(&parts)?, names))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use loanlab_core::Column;

    fn city_frame() -> Frame {
        let mut frame = Frame::new();
        frame
            .push_column(
                "city",
                Column::Categorical(vec![
                    Some("a".into()),
                    Some("b".into()),
                    Some("a".into()),
                    None,
                ]),
            )
            .unwrap();
        frame
    }

    #[test]
    fn test_one_hot_with_missing_level() {
        let frame = city_frame();
        let mut enc = CategoricalEncoder::new(EncodeStrategy::OneHot);
        enc.fit(&frame, &["city".to_string()], &[]).unwrap();
        let (m, names) = enc.transform(&frame).unwrap();
        assert_eq!(m.n_cols(), 3); // a, b, __missing__
        assert_eq!(names.len(), 3);
        // Each row is a single indicator
        for i in 0..4 {
            assert_relative_eq!(m.row(i).iter().sum::<f64>(), 1.0);
        }
    }

    #[test]
    fn test_one_hot_unknown_is_zero_row() {
        let train = city_frame();
        let mut enc = CategoricalEncoder::new(EncodeStrategy::OneHot);
        enc.fit(&train, &["city".to_string()], &[]).unwrap();

        let mut test = Frame::new();
        test.push_column("city", Column::Categorical(vec![Some("z".into())]))
            .unwrap();
        let (m, _) = enc.transform(&test).unwrap();
        assert_relative_eq!(m.row(0).iter().sum::<f64>(), 0.0);
    }

    #[test]
    fn test_ordinal_unknown_is_negative_one() {
        let train = city_frame();
        let mut enc = CategoricalEncoder::new(EncodeStrategy::Ordinal);
        enc.fit(&train, &["city".to_string()], &[]).unwrap();

        let mut test = Frame::new();
        test.push_column(
            "city",
            Column::Categorical(vec![Some("a".into()), Some("z".into())]),
        )
        .unwrap();
        let (m, _) = enc.transform(&test).unwrap();
        assert!(m.get(0, 0) >= 0.0);
        assert_relative_eq!(m.get(1, 0), -1.0);
    }

    #[test]
    fn test_target_encoding_shrinks_toward_global_mean() {
        let frame = city_frame();
        let y = vec![1.0, 0.0, 1.0, 0.0];
        let mut enc = CategoricalEncoder::new(EncodeStrategy::Target);
        enc.smoothing = 1.0;
        enc.fit(&frame, &["city".to_string()], &y).unwrap();
        let (m, _) = enc.transform(&frame).unwrap();

        // Category "a" has mean 1.0 over two rows, global mean 0.5:
        // (2*1 + 1*0.5) / (2 + 1)
        assert_relative_eq!(m.get(0, 0), 2.5 / 3.0);
        // Encoded values stay inside the observed target range
        for i in 0..4 {
            assert!(m.get(i, 0) > 0.0 && m.get(i, 0) < 1.0);
        }
    }
}
