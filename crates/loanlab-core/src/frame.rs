use crate::error::{LabError, LabResult};

/// A single dataset column: numeric (NaN = missing) or categorical
/// (`None` = missing).
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    Numeric(Vec<f64>),
    Categorical(Vec<Option<String>>),
}

impl Column {
    pub fn len(&self) -> usize {
        match self {
            Column::Numeric(v) => v.len(),
            Column::Categorical(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Column::Numeric(_))
    }

    pub fn missing_count(&self) -> usize {
        match self {
            Column::Numeric(v) => v.iter().filter(|x| x.is_nan()).count(),
            Column::Categorical(v) => v.iter().filter(|x| x.is_none()).count(),
        }
    }
}

/// Tabular dataset: ordered, named columns of equal length.
///
/// This is the loosely-typed record the experiments shuttle around: a
/// feature table with missing values, split into numeric and categorical
/// roles by the preprocessors.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frame {
    names: Vec<String>,
    columns: Vec<Column>,
}

impl Frame {
    pub fn new() -> Self {
        Frame::default()
    }

    /// Append a column. Fails on duplicate names or mismatched lengths.
    pub fn push_column(&mut self, name: impl Into<String>, column: Column) -> LabResult<()> {
        let name = name.into();
        if self.names.iter().any(|n| *n == name) {
            return Err(LabError::InvalidOperation(format!(
                "duplicate column name '{name}'"
            )));
        }
        if let Some(first) = self.columns.first() {
            if first.len() != column.len() {
                return Err(LabError::ShapeMismatch {
                    expected: vec![first.len()],
                    got: vec![column.len()],
                });
            }
        }
        self.names.push(name);
        self.columns.push(column);
        Ok(())
    }

    pub fn n_rows(&self) -> usize {
        self.columns.first().map_or(0, Column::len)
    }

    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.n_rows() == 0
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn column(&self, name: &str) -> LabResult<&Column> {
        let idx = self
            .names
            .iter()
            .position(|n| n == name)
            .ok_or_else(|| LabError::ColumnNotFound(name.to_string()))?;
        Ok(&self.columns[idx])
    }

    /// Numeric column values, erroring on categorical columns.
    pub fn numeric(&self, name: &str) -> LabResult<&[f64]> {
        match self.column(name)? {
            Column::Numeric(v) => Ok(v),
            Column::Categorical(_) => Err(LabError::ColumnType {
                column: name.to_string(),
                expected: "numeric",
            }),
        }
    }

    /// Categorical column values, erroring on numeric columns.
    pub fn categorical(&self, name: &str) -> LabResult<&[Option<String>]> {
        match self.column(name)? {
            Column::Categorical(v) => Ok(v),
            Column::Numeric(_) => Err(LabError::ColumnType {
                column: name.to_string(),
                expected: "categorical",
            }),
        }
    }

    /// Names of numeric columns, in frame order.
    pub fn numeric_names(&self) -> Vec<String> {
        self.names
            .iter()
            .zip(&self.columns)
            .filter(|(_, c)| c.is_numeric())
            .map(|(n, _)| n.clone())
            .collect()
    }

    /// Names of categorical columns, in frame order.
    pub fn categorical_names(&self) -> Vec<String> {
        self.names
            .iter()
            .zip(&self.columns)
            .filter(|(_, c)| !c.is_numeric())
            .map(|(n, _)| n.clone())
            .collect()
    }

    /// New frame containing the given rows, in the given order.
    pub fn take_rows(&self, indices: &[usize]) -> Frame {
        let columns = self
            .columns
            .iter()
            .map(|col| match col {
                Column::Numeric(v) => {
                    Column::Numeric(indices.iter().map(|&i| v[i]).collect())
                }
                Column::Categorical(v) => {
                    Column::Categorical(indices.iter().map(|&i| v[i].clone()).collect())
                }
            })
            .collect();
        Frame {
            names: self.names.clone(),
            columns,
        }
    }

    /// New frame without the named column, returning the removed column too.
    /// Used to split the target off the feature table.
    pub fn split_off_column(&self, name: &str) -> LabResult<(Frame, Column)> {
        let idx = self
            .names
            .iter()
            .position(|n| n == name)
            .ok_or_else(|| LabError::ColumnNotFound(name.to_string()))?;
        let mut names = self.names.clone();
        let mut columns = self.columns.clone();
        names.remove(idx);
        let removed = columns.remove(idx);
        Ok((Frame { names, columns }, removed))
    }

    /// Per-column missing-value counts, in frame order.
    pub fn missing_counts(&self) -> Vec<(String, usize)> {
        self.names
            .iter()
            .zip(&self.columns)
            .map(|(n, c)| (n.clone(), c.missing_count()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_frame() -> Frame {
        let mut frame = Frame::new();
        frame
            .push_column(
                "income",
                Column::Numeric(vec![1000.0, f64::NAN, 3000.0]),
            )
            .unwrap();
        frame
            .push_column(
                "city",
                Column::Categorical(vec![
                    Some("Pune".into()),
                    Some("Delhi".into()),
                    None,
                ]),
            )
            .unwrap();
        frame
    }

    #[test]
    fn test_roles_and_missing() {
        let frame = sample_frame();
        assert_eq!(frame.numeric_names(), vec!["income".to_string()]);
        assert_eq!(frame.categorical_names(), vec!["city".to_string()]);
        assert_eq!(
            frame.missing_counts(),
            vec![("income".to_string(), 1), ("city".to_string(), 1)]
        );
    }

    #[test]
    fn test_push_column_rejects_mismatch() {
        let mut frame = sample_frame();
        let err = frame.push_column("bad", Column::Numeric(vec![1.0]));
        assert!(err.is_err());
        let dup = frame.push_column("income", Column::Numeric(vec![0.0; 3]));
        assert!(dup.is_err());
    }

    #[test]
    fn test_take_rows_reorders() {
        let frame = sample_frame();
        let sub = frame.take_rows(&[2, 0]);
        assert_eq!(sub.n_rows(), 2);
        assert_eq!(sub.numeric("income").unwrap()[1], 1000.0);
        assert_eq!(sub.categorical("city").unwrap()[0], None);
    }

    #[test]
    fn test_split_off_column() {
        let frame = sample_frame();
        let (rest, target) = frame.split_off_column("income").unwrap();
        assert_eq!(rest.n_cols(), 1);
        assert!(matches!(target, Column::Numeric(_)));
        assert!(rest.column("income").is_err());
    }
}
