//! Dense real-valued matrix with shape-checked operations.
//!
//! Thin wrapper over [`nalgebra::DMatrix`] that reports shape and
//! invertibility problems as [`MatrixError`] instead of panicking or
//! returning NaN entries.

use std::ops::{Index, IndexMut};

use nalgebra::DMatrix;

use crate::error::{MatrixError, Shape};

/// Dense matrix of `f64` with fixed row/column counts.
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    data: DMatrix<f64>,
}

impl Matrix {
    /// `rows x cols` matrix of zeros.
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            data: DMatrix::zeros(rows, cols),
        }
    }

    /// `n x n` identity.
    pub fn identity(n: usize) -> Self {
        Self {
            data: DMatrix::identity(n, n),
        }
    }

    /// Build from row-major values.
    ///
    /// # Panics
    ///
    /// Panics if `values.len() != rows * cols`.
    pub fn from_row_slice(rows: usize, cols: usize, values: &[f64]) -> Self {
        Self {
            data: DMatrix::from_row_slice(rows, cols, values),
        }
    }

    pub fn rows(&self) -> usize {
        self.data.nrows()
    }

    pub fn cols(&self) -> usize {
        self.data.ncols()
    }

    pub fn shape(&self) -> Shape {
        Shape {
            rows: self.rows(),
            cols: self.cols(),
        }
    }

    pub fn is_square(&self) -> bool {
        self.rows() == self.cols()
    }

    pub fn as_dmatrix(&self) -> &DMatrix<f64> {
        &self.data
    }

    /// Mutable access for in-place nalgebra solves; the shape must not change.
    pub fn as_dmatrix_mut(&mut self) -> &mut DMatrix<f64> {
        &mut self.data
    }

    pub fn into_dmatrix(self) -> DMatrix<f64> {
        self.data
    }

    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        self.data.get((row, col)).copied()
    }

    /// Accumulate `value` into cell `(row, col)`.
    pub fn add_at(&mut self, row: usize, col: usize, value: f64) {
        self.data[(row, col)] += value;
    }

    /// Accumulate `value` onto every diagonal entry.
    pub fn add_diagonal(&mut self, value: f64) {
        let n = self.rows().min(self.cols());
        for i in 0..n {
            self.add_at(i, i, value);
        }
    }

    pub fn is_finite(&self) -> bool {
        self.data.iter().all(|v| v.is_finite())
    }

    /// `self * rhs`, failing if the inner dimensions disagree.
    pub fn multiply(&self, rhs: &Self) -> Result<Self, MatrixError> {
        let mut out = Self::zeros(self.rows(), rhs.cols());
        self.multiply_into(rhs, &mut out)?;
        Ok(out)
    }

    /// `out = self * rhs` without allocating.
    pub fn multiply_into(&self, rhs: &Self, out: &mut Self) -> Result<(), MatrixError> {
        if self.cols() != rhs.rows() {
            return Err(MatrixError::DimensionMismatch {
                op: "multiply",
                lhs: self.shape(),
                rhs: rhs.shape(),
            });
        }
        if out.rows() != self.rows() || out.cols() != rhs.cols() {
            return Err(MatrixError::DimensionMismatch {
                op: "multiply output",
                lhs: Shape {
                    rows: self.rows(),
                    cols: rhs.cols(),
                },
                rhs: out.shape(),
            });
        }
        self.data.mul_to(&rhs.data, &mut out.data);
        Ok(())
    }

    /// New `cols x rows` matrix; `self` is untouched.
    pub fn transpose(&self) -> Self {
        Self {
            data: self.data.transpose(),
        }
    }

    /// `out = selfᵗ` without allocating.
    pub fn transpose_into(&self, out: &mut Self) -> Result<(), MatrixError> {
        if out.rows() != self.cols() || out.cols() != self.rows() {
            return Err(MatrixError::DimensionMismatch {
                op: "transpose output",
                lhs: Shape {
                    rows: self.cols(),
                    cols: self.rows(),
                },
                rhs: out.shape(),
            });
        }
        self.data.transpose_to(&mut out.data);
        Ok(())
    }

    /// Inverse of a square matrix via nalgebra's LU decomposition.
    ///
    /// Fails with [`MatrixError::Singular`] when the decomposition hits a
    /// zero pivot, or when the input or result holds non-finite values.
    pub fn inverse(&self) -> Result<Self, MatrixError> {
        if !self.is_square() {
            return Err(MatrixError::NotSquare(self.shape()));
        }
        if self.rows() == 0 {
            return Ok(Self::zeros(0, 0));
        }
        if !self.is_finite() {
            return Err(MatrixError::Singular);
        }
        let inverse = self
            .data
            .clone()
            .try_inverse()
            .ok_or(MatrixError::Singular)?;
        if !inverse.iter().all(|v| v.is_finite()) {
            return Err(MatrixError::Singular);
        }
        Ok(Self { data: inverse })
    }
}

impl Index<(usize, usize)> for Matrix {
    type Output = f64;

    fn index(&self, index: (usize, usize)) -> &f64 {
        &self.data[index]
    }
}

impl IndexMut<(usize, usize)> for Matrix {
    fn index_mut(&mut self, index: (usize, usize)) -> &mut f64 {
        &mut self.data[index]
    }
}

impl From<DMatrix<f64>> for Matrix {
    fn from(data: DMatrix<f64>) -> Self {
        Self { data }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn assert_matrix_eq(a: &Matrix, b: &Matrix, eps: f64) {
        assert_eq!(a.shape(), b.shape());
        for r in 0..a.rows() {
            for c in 0..a.cols() {
                assert_relative_eq!(a[(r, c)], b[(r, c)], epsilon = eps);
            }
        }
    }

    fn sample_jacobian() -> Matrix {
        Matrix::from_row_slice(
            3,
            6,
            &[
                1.0, 0.5, -0.2, 0.0, 0.3, 0.9, //
                0.0, 1.0, 0.4, -0.7, 0.2, 0.1, //
                0.6, -0.3, 1.0, 0.2, 0.0, -0.5,
            ],
        )
    }

    #[test]
    fn multiply_shapes() {
        let a = Matrix::from_row_slice(2, 3, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let b = Matrix::from_row_slice(3, 1, &[1.0, 0.0, -1.0]);
        let c = a.multiply(&b).unwrap();
        assert_eq!(c.shape(), Shape { rows: 2, cols: 1 });
        assert_relative_eq!(c[(0, 0)], -2.0);
        assert_relative_eq!(c[(1, 0)], -2.0);
    }

    #[test]
    fn multiply_dimension_mismatch() {
        let a = Matrix::zeros(3, 6);
        let b = Matrix::zeros(3, 1);
        let err = a.multiply(&b).unwrap_err();
        assert_eq!(
            err,
            MatrixError::DimensionMismatch {
                op: "multiply",
                lhs: Shape { rows: 3, cols: 6 },
                rhs: Shape { rows: 3, cols: 1 },
            }
        );
    }

    #[test]
    fn multiply_into_checks_output_shape() {
        let a = Matrix::zeros(2, 2);
        let mut out = Matrix::zeros(3, 2);
        assert!(matches!(
            a.multiply_into(&a, &mut out),
            Err(MatrixError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn transpose_is_pure() {
        let a = Matrix::from_row_slice(2, 3, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let t = a.transpose();
        assert_eq!(t.shape(), Shape { rows: 3, cols: 2 });
        assert_relative_eq!(t[(2, 0)], 3.0);
        assert_relative_eq!(t[(0, 1)], 4.0);
        // Source untouched.
        assert_relative_eq!(a[(0, 2)], 3.0);
    }

    #[test]
    fn transpose_into_reuses_buffer() {
        let a = Matrix::from_row_slice(1, 3, &[1.0, 2.0, 3.0]);
        let mut out = Matrix::zeros(3, 1);
        a.transpose_into(&mut out).unwrap();
        assert_relative_eq!(out[(1, 0)], 2.0);
        let mut wrong = Matrix::zeros(1, 3);
        assert!(a.transpose_into(&mut wrong).is_err());
    }

    #[test]
    fn inverse_of_known_matrix() {
        let a = Matrix::from_row_slice(2, 2, &[4.0, 7.0, 2.0, 6.0]);
        let inv = a.inverse().unwrap();
        let expected = Matrix::from_row_slice(2, 2, &[0.6, -0.7, -0.2, 0.4]);
        assert_matrix_eq(&inv, &expected, 1e-12);
    }

    #[test]
    fn inverse_needs_pivoting() {
        // Zero on the leading diagonal.
        let a = Matrix::from_row_slice(3, 3, &[0.0, 1.0, 2.0, 1.0, 0.0, 3.0, 4.0, -3.0, 8.0]);
        let inv = a.inverse().unwrap();
        let product = a.multiply(&inv).unwrap();
        assert_matrix_eq(&product, &Matrix::identity(3), 1e-12);
    }

    #[test]
    fn inverse_rejects_non_square() {
        let a = Matrix::zeros(2, 3);
        assert_eq!(
            a.inverse().unwrap_err(),
            MatrixError::NotSquare(Shape { rows: 2, cols: 3 })
        );
    }

    #[test]
    fn inverse_rejects_singular() {
        let a = Matrix::from_row_slice(2, 2, &[1.0, 2.0, 2.0, 4.0]);
        assert_eq!(a.inverse().unwrap_err(), MatrixError::Singular);
        assert_eq!(Matrix::zeros(3, 3).inverse().unwrap_err(), MatrixError::Singular);
    }

    #[test]
    fn inverse_rejects_dependent_rows() {
        // Second row is twice the first.
        let a = Matrix::from_row_slice(3, 3, &[1.0, 2.0, 3.0, 2.0, 4.0, 6.0, 0.0, 1.0, 1.0]);
        assert_eq!(a.inverse().unwrap_err(), MatrixError::Singular);
    }

    #[test]
    fn lightly_damped_gram_matrix_inverts() {
        let j = sample_jacobian();
        let mut jtj = j.transpose().multiply(&j).unwrap();
        jtj.add_diagonal(1e-10);
        let inv = jtj.inverse().unwrap();
        assert!(inv.is_finite());
    }

    #[test]
    fn damped_gram_matrix_inverts() {
        let j = sample_jacobian();
        let mut jtj = j.transpose().multiply(&j).unwrap();
        jtj.add_diagonal(0.1 * 0.1);
        let inv = jtj.inverse().unwrap();
        let product = jtj.multiply(&inv).unwrap();
        assert_matrix_eq(&product, &Matrix::identity(6), 1e-9);
    }

    #[test]
    fn inverse_rejects_nan() {
        let a = Matrix::from_row_slice(2, 2, &[1.0, f64::NAN, 0.0, 1.0]);
        assert_eq!(a.inverse().unwrap_err(), MatrixError::Singular);
    }

    #[test]
    fn inverse_of_empty_is_empty() {
        let inv = Matrix::zeros(0, 0).inverse().unwrap();
        assert_eq!(inv.shape(), Shape { rows: 0, cols: 0 });
    }

    #[test]
    fn add_at_accumulates() {
        let mut m = Matrix::identity(2);
        m.add_at(0, 0, 0.5);
        m.add_at(0, 0, 0.5);
        m.add_diagonal(1.0);
        assert_relative_eq!(m[(0, 0)], 3.0);
        assert_relative_eq!(m[(1, 1)], 2.0);
        assert_relative_eq!(m[(0, 1)], 0.0);
    }

    #[test]
    fn get_out_of_bounds_is_none() {
        let m = Matrix::zeros(2, 2);
        assert!(m.get(2, 0).is_none());
        assert_eq!(m.get(1, 1), Some(0.0));
    }
}
