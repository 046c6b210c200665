//! Finite-difference Jacobian of effector position w.r.t. rotation parameters.

use serik_core::{Matrix, MatrixError, Position, RigidPose, Shape};

use crate::fk;

/// Rows of the positional Jacobian (x, y, z).
pub const POSITION_ROWS: usize = 3;

/// Fill `jacobian` (3 x parameters.len()) by forward differences and return
/// the baseline effector position.
///
/// Each column perturbs one parameter by `differential` from the same
/// baseline; the parameter is restored before the next column, so
/// `parameters` is unchanged on return.
pub fn build_jacobian(
    sequence: &[RigidPose],
    parameters: &mut [f64],
    differential: f64,
    jacobian: &mut Matrix,
) -> Result<Position, MatrixError> {
    let expected = Shape {
        rows: POSITION_ROWS,
        cols: parameters.len(),
    };
    if jacobian.shape() != expected {
        return Err(MatrixError::DimensionMismatch {
            op: "jacobian",
            lhs: expected,
            rhs: jacobian.shape(),
        });
    }

    let baseline = fk::effector_position(sequence, parameters);

    for col in 0..parameters.len() {
        let original = parameters[col];
        parameters[col] = original + differential;
        let perturbed = fk::effector_position(sequence, parameters);
        parameters[col] = original;

        let derivative = (perturbed - baseline) / differential;
        for row in 0..POSITION_ROWS {
            jacobian[(row, col)] = derivative[row];
        }
    }

    Ok(baseline)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::{Translation3, UnitQuaternion, Vector3};
    use serik_core::ChainPoses;

    const DIFFERENTIAL: f64 = 1e-3;

    fn offset(x: f64, y: f64, z: f64) -> RigidPose {
        RigidPose::from_parts(Translation3::new(x, y, z), UnitQuaternion::identity())
    }

    #[test]
    fn two_joint_columns() {
        let seq = vec![RigidPose::identity(), offset(0.0, 0.0, 1.0)];
        let mut params = vec![0.0; 6];
        let mut jacobian = Matrix::zeros(3, 6);
        let tip = build_jacobian(&seq, &mut params, DIFFERENTIAL, &mut jacobian).unwrap();
        assert_relative_eq!(tip, Position::new(0.0, 0.0, 1.0), epsilon = 1e-12);

        // Root forward axis: no motion.
        for row in 0..3 {
            assert_relative_eq!(jacobian[(row, 0)], 0.0, epsilon = 1e-9);
        }
        // Root right axis: tip moves toward -Y.
        assert_relative_eq!(jacobian[(1, 1)], -1.0, epsilon = 1e-3);
        // Root up axis: tip moves toward +X.
        assert_relative_eq!(jacobian[(0, 2)], 1.0, epsilon = 1e-3);
        // Effector rotations never move the effector.
        for col in 3..6 {
            for row in 0..3 {
                assert_relative_eq!(jacobian[(row, col)], 0.0);
            }
        }
    }

    #[test]
    fn matches_geometric_jacobian_at_zero() {
        // At zero parameters every joint's three axes are its world z, x, y,
        // so column = axis x (tip - joint origin).
        let root = RigidPose::from_parts(
            Translation3::new(0.5, -0.2, 0.1),
            UnitQuaternion::from_euler_angles(0.3, -0.1, 0.6),
        );
        let locals = [
            RigidPose::from_parts(
                Translation3::new(0.0, 0.0, 1.0),
                UnitQuaternion::from_euler_angles(0.0, 0.4, 0.0),
            ),
            offset(0.0, 0.3, 0.8),
            offset(0.2, 0.0, 1.0),
        ];
        let poses = ChainPoses::new(root, locals);
        let seq = poses.poses();
        let world = poses.world_poses();
        let tip = world.last().unwrap().translation.vector;

        let mut params = vec![0.0; 12];
        let mut jacobian = Matrix::zeros(3, 12);
        build_jacobian(&seq, &mut params, DIFFERENTIAL, &mut jacobian).unwrap();

        for (i, frame) in world.iter().enumerate() {
            let origin = frame.translation.vector;
            let axes = [Vector3::z(), Vector3::x(), Vector3::y()];
            for (k, axis) in axes.iter().enumerate() {
                let expected = (frame.rotation * axis).cross(&(tip - origin));
                for row in 0..3 {
                    assert_relative_eq!(jacobian[(row, i * 3 + k)], expected[row], epsilon = 5e-3);
                }
            }
        }
    }

    #[test]
    fn parameters_restored_exactly() {
        let seq = vec![RigidPose::identity(), offset(0.0, 0.0, 1.0), offset(0.0, 1.0, 0.0)];
        let mut params = vec![0.1, -0.25, 0.3, 0.7, 1e-7, -2.0, 0.0, 0.5, 3.1];
        let before = params.clone();
        let mut jacobian = Matrix::zeros(3, 9);
        build_jacobian(&seq, &mut params, DIFFERENTIAL, &mut jacobian).unwrap();
        assert_eq!(params, before);
    }

    #[test]
    fn rejects_wrong_jacobian_shape() {
        let seq = vec![RigidPose::identity(), offset(0.0, 0.0, 1.0)];
        let mut params = vec![0.0; 6];
        let mut jacobian = Matrix::zeros(3, 5);
        let err = build_jacobian(&seq, &mut params, DIFFERENTIAL, &mut jacobian).unwrap_err();
        assert!(matches!(err, MatrixError::DimensionMismatch { op: "jacobian", .. }));
    }
}
