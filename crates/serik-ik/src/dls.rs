//! Damped least-squares pseudo-inverse.
//!
//! `D = (JᵗJ + λ²I)⁻¹ Jᵗ` maps a 3-D position error to a parameter update.
//! The λ² diagonal keeps `JᵗJ` invertible when `J` is rank-deficient, e.g.
//! a fully stretched chain. `JᵗJ + λ²I` is symmetric positive definite for
//! λ > 0, so it is factored with Cholesky and solved against `Jᵗ` in place.

use std::mem;

use serik_core::{Matrix, MatrixError};

use crate::jacobian::POSITION_ROWS;

/// Reusable intermediates for one chain size.
#[derive(Debug, Clone)]
pub struct DlsBuffers {
    transpose: Matrix,
    /// `JᵗJ + λ²I`, overwritten by its Cholesky factor.
    gram: Matrix,
    pseudo_inverse: Matrix,
}

impl DlsBuffers {
    /// Buffers for a Jacobian with `dof` columns.
    pub fn new(dof: usize) -> Self {
        Self {
            transpose: Matrix::zeros(dof, POSITION_ROWS),
            gram: Matrix::zeros(dof, dof),
            pseudo_inverse: Matrix::zeros(dof, POSITION_ROWS),
        }
    }

    pub fn dof(&self) -> usize {
        self.pseudo_inverse.rows()
    }

    /// Result of the last successful [`damped_pseudo_inverse_into`].
    pub fn pseudo_inverse(&self) -> &Matrix {
        &self.pseudo_inverse
    }
}

/// Compute `(JᵗJ + λ²I)⁻¹ Jᵗ` into `buffers` without allocating.
///
/// Fails with [`MatrixError::Singular`] if the damped matrix cannot be
/// factored. With λ = 0 and more than three columns `JᵗJ` has rank at most
/// three and is always rejected. The previous pseudo-inverse in `buffers`
/// must then be treated as stale.
pub fn damped_pseudo_inverse_into(
    jacobian: &Matrix,
    damping: f64,
    buffers: &mut DlsBuffers,
) -> Result<(), MatrixError> {
    jacobian.transpose_into(&mut buffers.transpose)?;
    buffers.transpose.multiply_into(jacobian, &mut buffers.gram)?;
    if buffers.pseudo_inverse.shape() != buffers.transpose.shape() {
        return Err(MatrixError::DimensionMismatch {
            op: "pseudo-inverse output",
            lhs: buffers.transpose.shape(),
            rhs: buffers.pseudo_inverse.shape(),
        });
    }

    let dof = jacobian.cols();
    if damping == 0.0 && dof > POSITION_ROWS {
        return Err(MatrixError::Singular);
    }
    buffers.gram.add_diagonal(damping * damping);
    if !buffers.gram.is_finite() {
        return Err(MatrixError::Singular);
    }

    let storage = mem::replace(&mut buffers.gram, Matrix::zeros(0, 0)).into_dmatrix();
    let Some(factor) = storage.cholesky() else {
        buffers.gram = Matrix::zeros(dof, dof);
        return Err(MatrixError::Singular);
    };

    let out = buffers.pseudo_inverse.as_dmatrix_mut();
    out.copy_from(buffers.transpose.as_dmatrix());
    factor.solve_mut(out);
    buffers.gram = Matrix::from(factor.unpack_dirty());
    Ok(())
}

/// Allocating form of [`damped_pseudo_inverse_into`].
pub fn damped_pseudo_inverse(jacobian: &Matrix, damping: f64) -> Result<Matrix, MatrixError> {
    let mut buffers = DlsBuffers::new(jacobian.cols());
    damped_pseudo_inverse_into(jacobian, damping, &mut buffers)?;
    Ok(buffers.pseudo_inverse)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
