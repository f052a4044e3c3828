//! Contiguous matrix and dataset containers.
//!
//! Data preparation works on [`Matrix`] (`f64`, row-major). Training works on
//! [`Dataset`] (`f32`, row-major) so the per-sample hot path can take slices
//! without allocating.

use crate::{Error, Result};

/// A dense `rows x cols` matrix of `f64`, stored row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    data: Vec<f64>,
    rows: usize,
    cols: usize,
}

impl Matrix {
    /// Build a matrix from a flat buffer with shape `(len / cols, cols)`.
    pub fn from_flat(data: Vec<f64>, cols: usize) -> Result<Self> {
        if cols == 0 {
            return Err(Error::InvalidData("cols must be > 0".to_owned()));
        }
        if !data.len().is_multiple_of(cols) {
            return Err(Error::InvalidData(format!(
                "buffer length {} is not divisible by cols {}",
                data.len(),
                cols
            )));
        }

        let rows = data.len() / cols;
        Ok(Self { data, rows, cols })
    }

    /// Build a matrix from equal-length rows.
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self> {
        let cols = rows.first().map(|r| r.len()).unwrap_or(0);
        if cols == 0 {
            return Err(Error::InvalidData(
                "matrix must have at least one row and one column".to_owned(),
            ));
        }
        for (i, row) in rows.iter().enumerate() {
            if row.len() != cols {
                return Err(Error::InvalidData(format!(
                    "row {i} has len {}, expected {cols}",
                    row.len()
                )));
            }
        }

        let mut data = Vec::with_capacity(rows.len() * cols);
        for row in rows {
            data.extend_from_slice(row);
        }
        Ok(Self {
            data,
            rows: rows.len(),
            cols,
        })
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[row * self.cols + col]
    }

    #[inline]
    /// Returns the `idx`-th row.
    ///
    /// Panics if `idx >= rows`.
    pub fn row(&self, idx: usize) -> &[f64] {
        let start = idx * self.cols;
        &self.data[start..start + self.cols]
    }

    /// Iterate over the values of column `col`, top to bottom.
    pub fn column(&self, col: usize) -> impl Iterator<Item = f64> + '_ {
        assert!(col < self.cols, "column {col} out of range ({})", self.cols);
        self.data.iter().skip(col).step_by(self.cols).copied()
    }

    /// Returns the transpose as a new matrix.
    pub fn transpose(&self) -> Matrix {
        let mut data = Vec::with_capacity(self.data.len());
        for c in 0..self.cols {
            data.extend(self.column(c));
        }
        Matrix {
            data,
            rows: self.cols,
            cols: self.rows,
        }
    }

    /// Materialize a new matrix holding only the columns in `indices`, in that order.
    pub fn select_columns(&self, indices: &[usize]) -> Matrix {
        let mut data = Vec::with_capacity(self.rows * indices.len());
        for r in 0..self.rows {
            let row = self.row(r);
            data.extend(indices.iter().map(|&c| row[c]));
        }
        Matrix {
            data,
            rows: self.rows,
            cols: indices.len(),
        }
    }

    /// Apply `f` to every element, producing a matrix of the same shape.
    pub fn map(&self, f: impl Fn(f64) -> f64) -> Matrix {
        Matrix {
            data: self.data.iter().map(|&v| f(v)).collect(),
            rows: self.rows,
            cols: self.cols,
        }
    }

    pub(crate) fn to_f32(&self) -> Vec<f32> {
        self.data.iter().map(|&v| v as f32).collect()
    }
}

/// Network inputs, one `input_dim`-long sample per row.
#[derive(Debug, Clone)]
pub struct Inputs {
    values: Vec<f32>,
    input_dim: usize,
}

impl Inputs {
    pub fn from_flat(values: Vec<f32>, input_dim: usize) -> Result<Self> {
        if input_dim == 0 {
            return Err(Error::InvalidData("input_dim must be > 0".to_owned()));
        }
        if !values.len().is_multiple_of(input_dim) {
            return Err(Error::InvalidData(format!(
                "{} input values do not form rows of {input_dim}",
                values.len()
            )));
        }
        Ok(Self { values, input_dim })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.values.len() / self.input_dim
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[inline]
    pub fn input_dim(&self) -> usize {
        self.input_dim
    }

    /// Sample `idx`. Panics if out of range.
    #[inline]
    pub fn input(&self, idx: usize) -> &[f32] {
        &self.values[idx * self.input_dim..(idx + 1) * self.input_dim]
    }

    fn split_at(&self, samples: usize) -> (Vec<f32>, Vec<f32>) {
        let (head, tail) = self.values.split_at(samples * self.input_dim);
        (head.to_vec(), tail.to_vec())
    }
}

/// Paired inputs and targets; row `i` of each belongs to the same sample.
#[derive(Debug, Clone)]
pub struct Dataset {
    inputs: Inputs,
    targets: Vec<f32>,
    target_dim: usize,
}

impl Dataset {
    /// `inputs` is `(len, input_dim)` and `targets` is `(len, target_dim)`, both row-major.
    pub fn from_flat(
        inputs: Vec<f32>,
        targets: Vec<f32>,
        input_dim: usize,
        target_dim: usize,
    ) -> Result<Self> {
        let inputs = Inputs::from_flat(inputs, input_dim)?;
        if target_dim == 0 {
            return Err(Error::InvalidData("target_dim must be > 0".to_owned()));
        }
        if targets.len() != inputs.len() * target_dim {
            return Err(Error::InvalidData(format!(
                "{} samples need {} target values, got {}",
                inputs.len(),
                inputs.len() * target_dim,
                targets.len()
            )));
        }
        Ok(Self {
            inputs,
            targets,
            target_dim,
        })
    }

    /// Narrow prepared `f64` matrices to a training set, one sample per row.
    pub fn from_matrices(inputs: &Matrix, targets: &Matrix) -> Result<Self> {
        if inputs.rows() != targets.rows() {
            return Err(Error::InvalidData(format!(
                "{} input rows but {} target rows",
                inputs.rows(),
                targets.rows()
            )));
        }
        Self::from_flat(
            inputs.to_f32(),
            targets.to_f32(),
            inputs.cols(),
            targets.cols(),
        )
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.inputs.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty()
    }

    #[inline]
    pub fn input_dim(&self) -> usize {
        self.inputs.input_dim()
    }

    #[inline]
    pub fn target_dim(&self) -> usize {
        self.target_dim
    }

    #[inline]
    pub fn inputs(&self) -> &Inputs {
        &self.inputs
    }

    /// Flat `(len, target_dim)` target buffer.
    #[inline]
    pub fn targets(&self) -> &[f32] {
        &self.targets
    }

    #[inline]
    pub fn input(&self, idx: usize) -> &[f32] {
        self.inputs.input(idx)
    }

    #[inline]
    pub fn target(&self, idx: usize) -> &[f32] {
        &self.targets[idx * self.target_dim..(idx + 1) * self.target_dim]
    }

    /// Hold out the trailing `fraction` of samples for validation.
    ///
    /// The split is taken in stored order, before any shuffling: the first
    /// `floor(len * (1 - fraction))` samples train, the rest validate.
    /// Both halves must be non-empty.
    pub fn split_validation(&self, fraction: f64) -> Result<(Dataset, Dataset)> {
        if !(fraction.is_finite() && fraction > 0.0 && fraction < 1.0) {
            return Err(Error::InvalidConfig(format!(
                "validation fraction must be in (0, 1), got {fraction}"
            )));
        }

        let split_at = (self.len() as f64 * (1.0 - fraction)) as usize;
        if split_at == 0 || split_at == self.len() {
            return Err(Error::InvalidData(format!(
                "validation split {fraction} of {} samples leaves an empty partition",
                self.len()
            )));
        }

        let (x_train, x_val) = self.inputs.split_at(split_at);
        let (y_train, y_val) = self.targets.split_at(split_at * self.target_dim);
        let train = Self::from_flat(x_train, y_train.to_vec(), self.input_dim(), self.target_dim)?;
        let val = Self::from_flat(x_val, y_val.to_vec(), self.input_dim(), self.target_dim)?;
        Ok((train, val))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dataset_from_flat_validates_shapes() {
        let ok = Dataset::from_flat(vec![0.0, 1.0, 2.0, 3.0], vec![0.0, 1.0], 2, 1);
        assert!(ok.is_ok());

        let err = Dataset::from_flat(vec![0.0, 1.0, 2.0], vec![0.0], 2, 1);
        assert!(err.is_err());
    }

    #[test]
    fn matrix_transpose_and_select() {
        let m = Matrix::from_rows(&[vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]]).unwrap();
        let t = m.transpose();
        assert_eq!((t.rows(), t.cols()), (3, 2));
        assert_eq!(t.row(0), &[1.0, 4.0]);
        assert_eq!(t.row(2), &[3.0, 6.0]);

        let s = m.select_columns(&[0, 2]);
        assert_eq!(s.row(0), &[1.0, 3.0]);
        assert_eq!(s.row(1), &[4.0, 6.0]);
        assert_eq!(m.column(1).collect::<Vec<_>>(), vec![2.0, 5.0]);
    }

    #[test]
    fn matrix_from_rows_rejects_ragged() {
        assert!(Matrix::from_rows(&[vec![1.0, 2.0], vec![3.0]]).is_err());
        assert!(Matrix::from_rows(&[]).is_err());
    }

    #[test]
    fn split_validation_holds_out_trailing_samples() {
        let xs: Vec<f32> = (0..10).map(|v| v as f32).collect();
        let ys: Vec<f32> = (0..10).map(|v| v as f32 * 10.0).collect();
        let data = Dataset::from_flat(xs, ys, 1, 1).unwrap();

        let (train, val) = data.split_validation(0.2).unwrap();
        assert_eq!(train.len(), 8);
        assert_eq!(val.len(), 2);
        assert_eq!(val.input(0), &[8.0]);
        assert_eq!(val.target(1), &[90.0]);
    }

    #[test]
    fn split_validation_rejects_empty_partition() {
        let data = Dataset::from_flat(vec![1.0, 2.0], vec![0.0, 0.0], 1, 1).unwrap();
        assert!(data.split_validation(0.6).is_err());
        assert!(data.split_validation(0.0).is_err());
        assert!(data.split_validation(1.0).is_err());
    }
}
