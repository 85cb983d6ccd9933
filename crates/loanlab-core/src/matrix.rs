use crate::error::{LabError, LabResult};

use serde::{Deserialize, Serialize};

/// Dense 2-D feature matrix with row-major layout.
///
/// Cells are `f64`; a `NaN` cell encodes a missing value that an imputer
/// has not (or deliberately not) filled in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Matrix {
    data: Vec<f64>,
    rows: usize,
    cols: usize,
}

impl Matrix {
    /// Create a matrix from raw row-major data.
    pub fn new(data: Vec<f64>, rows: usize, cols: usize) -> LabResult<Self> {
        if data.len() != rows * cols {
            return Err(LabError::ShapeMismatch {
                expected: vec![rows, cols],
                got: vec![data.len()],
            });
        }
        Ok(Matrix { data, rows, cols })
    }

    /// Matrix filled with zeros.
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Matrix {
            data: vec![0.0; rows * cols],
            rows,
            cols,
        }
    }

    /// Build from a slice of equally sized rows.
    pub fn from_rows(rows: &[Vec<f64>]) -> LabResult<Self> {
        if rows.is_empty() {
            return Ok(Matrix::zeros(0, 0));
        }
        let cols = rows[0].len();
        for row in rows {
            if row.len() != cols {
                return Err(LabError::ShapeMismatch {
                    expected: vec![rows.len(), cols],
                    got: vec![row.len()],
                });
            }
        }
        let data: Vec<f64> = rows.iter().flat_map(|r| r.iter().copied()).collect();
        Matrix::new(data, rows.len(), cols)
    }

    /// Build column-wise: every column must have the same length.
    pub fn from_columns(columns: &[Vec<f64>]) -> LabResult<Self> {
        if columns.is_empty() {
            return Ok(Matrix::zeros(0, 0));
        }
        let rows = columns[0].len();
        for col in columns {
            if col.len() != rows {
                return Err(LabError::ShapeMismatch {
                    expected: vec![rows, columns.len()],
                    got: vec![col.len()],
                });
            }
        }
        let mut data = Vec::with_capacity(rows * columns.len());
        for i in 0..rows {
            for col in columns {
                data.push(col[i]);
            }
        }
        Matrix::new(data, rows, columns.len())
    }

    pub fn n_rows(&self) -> usize {
        self.rows
    }

    pub fn n_cols(&self) -> usize {
        self.cols
    }

    pub fn data(&self) -> &[f64] {
        &self.data
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        debug_assert!(i < self.rows && j < self.cols);
        self.data[i * self.cols + j]
    }

    #[inline]
    pub fn set(&mut self, i: usize, j: usize, value: f64) {
        debug_assert!(i < self.rows && j < self.cols);
        self.data[i * self.cols + j] = value;
    }

    /// Borrow a single row.
    pub fn row(&self, i: usize) -> &[f64] {
        &self.data[i * self.cols..(i + 1) * self.cols]
    }

    /// Copy out a single column.
    pub fn column(&self, j: usize) -> Vec<f64> {
        (0..self.rows).map(|i| self.get(i, j)).collect()
    }

    /// New matrix containing the given rows, in the given order.
    pub fn take_rows(&self, indices: &[usize]) -> Matrix {
        let mut data = Vec::with_capacity(indices.len() * self.cols);
        for &i in indices {
            data.extend_from_slice(self.row(i));
        }
        Matrix {
            data,
            rows: indices.len(),
            cols: self.cols,
        }
    }

    /// New matrix containing the given columns, in the given order.
    pub fn select_columns(&self, indices: &[usize]) -> Matrix {
        let mut data = Vec::with_capacity(self.rows * indices.len());
        for i in 0..self.rows {
            for &j in indices {
                data.push(self.get(i, j));
            }
        }
        Matrix {
            data,
            rows: self.rows,
            cols: indices.len(),
        }
    }

    /// Stack matrices side by side. All parts must have the same row count.
    pub fn hconcat(parts: &[Matrix]) -> LabResult<Matrix> {
        if parts.is_empty() {
            return Ok(Matrix::zeros(0, 0));
        }
        let rows = parts[0].rows;
        for p in parts {
            if p.rows != rows {
                return Err(LabError::ShapeMismatch {
                    expected: vec![rows],
                    got: vec![p.rows],
                });
            }
        }
        let cols: usize = parts.iter().map(|p| p.cols).sum();
        let mut data = Vec::with_capacity(rows * cols);
        for i in 0..rows {
            for p in parts {
                data.extend_from_slice(p.row(i));
            }
        }
        Matrix::new(data, rows, cols)
    }

    /// Mean of the non-missing values in a column, `None` if all missing.
    pub fn column_mean(&self, j: usize) -> Option<f64> {
        let mut sum = 0.0;
        let mut count = 0usize;
        for i in 0..self.rows {
            let v = self.get(i, j);
            if !v.is_nan() {
                sum += v;
                count += 1;
            }
        }
        if count == 0 {
            None
        } else {
            Some(sum / count as f64)
        }
    }

    /// Median of the non-missing values in a column, `None` if all missing.
    pub fn column_median(&self, j: usize) -> Option<f64> {
        let mut values: Vec<f64> = (0..self.rows)
            .map(|i| self.get(i, j))
            .filter(|v| !v.is_nan())
            .collect();
        if values.is_empty() {
            return None;
        }
        values.sort_by(|a, b| a.partial_cmp(b).unwrap());
        let mid = values.len() / 2;
        if values.len() % 2 == 0 {
            Some((values[mid - 1] + values[mid]) / 2.0)
        } else {
            Some(values[mid])
        }
    }
}
