//! Forward kinematics over a pose snapshot plus per-joint angle corrections.
//!
//! Every joint carries three parameters: rotations about its local
//! forward (+Z), right (+X), and up (+Y) axes, composed in that order.
//! The correction has no translation, so segment lengths never change.

use nalgebra::{Translation3, UnitQuaternion, Vector3};

use serik_core::types::compose;
use serik_core::{ChainPoses, Position, RigidPose};

/// Rotation parameters per joint.
pub const PARAMS_PER_JOINT: usize = 3;

/// Build the rotational correction for one joint from its three angles
/// (radians): `R(forward, a0) * R(right, a1) * R(up, a2)`.
pub fn joint_update(angles: &[f64]) -> RigidPose {
    debug_assert_eq!(angles.len(), PARAMS_PER_JOINT);
    let rotation = UnitQuaternion::from_axis_angle(&Vector3::z_axis(), angles[0])
        * UnitQuaternion::from_axis_angle(&Vector3::x_axis(), angles[1])
        * UnitQuaternion::from_axis_angle(&Vector3::y_axis(), angles[2]);
    RigidPose::from_parts(Translation3::identity(), rotation)
}

/// Compose the chain into the end-effector world pose.
///
/// `sequence[0]` is the root world pose, `sequence[1..]` are
/// parent-relative. Returns identity for an empty sequence.
///
/// # Panics
///
/// Panics if `parameters.len() != 3 * sequence.len()`.
pub fn forward_kinematics(sequence: &[RigidPose], parameters: &[f64]) -> RigidPose {
    assert_eq!(
        parameters.len(),
        sequence.len() * PARAMS_PER_JOINT,
        "parameters.len() must equal 3 * chain length"
    );

    let mut result = RigidPose::identity();
    for (i, (base, angles)) in sequence
        .iter()
        .zip(parameters.chunks_exact(PARAMS_PER_JOINT))
        .enumerate()
    {
        let update = joint_update(angles);
        result = if i == 0 {
            compose(base, &update)
        } else {
            compose(&compose(&result, base), &update)
        };
    }
    result
}

/// End-effector world position for the given parameters.
pub fn effector_position(sequence: &[RigidPose], parameters: &[f64]) -> Position {
    Position::from(forward_kinematics(sequence, parameters).translation.vector)
}

/// Apply each joint's correction to its own snapshot pose.
///
/// Produces the committed output: joint 0 as a world pose, the rest
/// parent-relative, matching the snapshot's frames.
pub fn corrected_poses(sequence: &[RigidPose], parameters: &[f64]) -> ChainPoses {
    assert_eq!(parameters.len(), sequence.len() * PARAMS_PER_JOINT);
    ChainPoses::from_poses(
        sequence
            .iter()
            .zip(parameters.chunks_exact(PARAMS_PER_JOINT))
            .map(|(base, angles)| compose(base, &joint_update(angles))),
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_PI_2;

    fn offset(x: f64, y: f64, z: f64) -> RigidPose {
        RigidPose::from_parts(Translation3::new(x, y, z), UnitQuaternion::identity())
    }

    fn two_joint() -> Vec<RigidPose> {
        vec![RigidPose::identity(), offset(0.0, 0.0, 1.0)]
    }

    #[test]
    fn zero_parameters_match_snapshot() {
        let seq = vec![offset(1.0, 0.0, 0.0), offset(0.0, 0.0, 1.0), offset(0.0, 2.0, 0.0)];
        let tip = effector_position(&seq, &[0.0; 9]);
        assert_relative_eq!(tip, Position::new(1.0, 2.0, 1.0), epsilon = 1e-12);
    }

    #[test]
    fn empty_sequence_is_identity() {
        let pose = forward_kinematics(&[], &[]);
        assert_relative_eq!(pose.translation.vector.norm(), 0.0);
        assert_relative_eq!(pose.rotation.angle(), 0.0);
    }

    #[test]
    fn forward_axis_spins_in_place() {
        // Rotating the root about +Z leaves a +Z child where it is.
        let tip = effector_position(&two_joint(), &[FRAC_PI_2, 0.0, 0.0, 0.0, 0.0, 0.0]);
        assert_relative_eq!(tip, Position::new(0.0, 0.0, 1.0), epsilon = 1e-12);
    }

    #[test]
    fn right_axis_tilts_toward_minus_y() {
        let tip = effector_position(&two_joint(), &[0.0, FRAC_PI_2, 0.0, 0.0, 0.0, 0.0]);
        assert_relative_eq!(tip, Position::new(0.0, -1.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn up_axis_swings_toward_plus_x() {
        let tip = effector_position(&two_joint(), &[0.0, 0.0, FRAC_PI_2, 0.0, 0.0, 0.0]);
        assert_relative_eq!(tip, Position::new(1.0, 0.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn axes_compose_forward_then_right() {
        // Rz(90) * Rx(90) maps +Z to +X; the reverse order would give -Y.
        let tip = effector_position(&two_joint(), &[FRAC_PI_2, FRAC_PI_2, 0.0, 0.0, 0.0, 0.0]);
        assert_relative_eq!(tip, Position::new(1.0, 0.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn last_joint_parameters_do_not_move_effector() {
        let tip = effector_position(&two_joint(), &[0.0, 0.0, 0.0, 0.4, -0.3, 1.2]);
        assert_relative_eq!(tip, Position::new(0.0, 0.0, 1.0), epsilon = 1e-12);
    }

    #[test]
    fn corrections_preserve_segment_lengths() {
        let seq = vec![
            RigidPose::identity(),
            offset(0.0, 0.0, 1.0),
            offset(0.0, 0.5, 0.5),
            offset(2.0, 0.0, 0.0),
        ];
        let params: Vec<f64> = (0..12).map(|i| f64::from(i) * 0.37 - 2.0).collect();
        let before = ChainPoses::from_poses(seq.clone()).segment_lengths();
        let after = corrected_poses(&seq, &params).segment_lengths();
        for (b, a) in before.iter().zip(&after) {
            assert_relative_eq!(*a, *b, epsilon = 1e-12);
        }
    }

    #[test]
    fn corrected_poses_reproduce_fk() {
        let seq = vec![offset(0.0, 1.0, 0.0), offset(0.0, 0.0, 1.0), offset(0.0, 0.0, 1.0)];
        let params = [0.1, 0.2, -0.3, 0.5, -0.1, 0.05, 0.0, 0.7, 0.2];
        let fk = forward_kinematics(&seq, &params);
        let committed = corrected_poses(&seq, &params).effector().unwrap();
        assert_relative_eq!(fk.translation.vector, committed.translation.vector, epsilon = 1e-12);
        assert_relative_eq!(fk.rotation.angle_to(&committed.rotation), 0.0, epsilon = 1e-6);
    }

    #[test]
    #[should_panic(expected = "3 * chain length")]
    fn fk_rejects_wrong_parameter_count() {
        let _ = forward_kinematics(&two_joint(), &[0.0; 5]);
    }
}
