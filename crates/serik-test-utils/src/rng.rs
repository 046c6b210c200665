//! Deterministic RNG utilities for reproducible tests.

use nalgebra::{Translation3, UnitQuaternion, Vector3};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serik_core::{Position, RigidPose};
use serik_ik::KinematicChain;

/// Create a deterministic `ChaCha8Rng` from a seed.
///
/// All test randomization should go through this to ensure reproducibility.
pub fn seeded_rng(seed: u64) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(seed)
}

/// Random chain of `links` segments after a random root.
///
/// Segment lengths are in `[0.5, 1.5)`; every local pose carries a small
/// random rotation so the chain is never degenerate.
pub fn random_chain(rng: &mut impl Rng, links: usize) -> KinematicChain {
    let root = random_pose(rng, 1.0);
    let locals: Vec<RigidPose> = (0..links)
        .map(|_| {
            let direction = random_unit(rng);
            let length = rng.gen_range(0.5..1.5);
            let rotation = UnitQuaternion::from_euler_angles(
                rng.gen_range(-0.3..0.3),
                rng.gen_range(-0.3..0.3),
                rng.gen_range(-0.3..0.3),
            );
            RigidPose::from_parts(Translation3::from(direction * length), rotation)
        })
        .collect();
    KinematicChain::new(root, locals)
}

/// Random goal within `radius` of `center`.
pub fn random_goal(rng: &mut impl Rng, center: &Position, radius: f64) -> Position {
    *center + random_unit(rng) * rng.gen_range(0.0..radius)
}

fn random_pose(rng: &mut impl Rng, extent: f64) -> RigidPose {
    let translation = Vector3::new(
        rng.gen_range(-extent..extent),
        rng.gen_range(-extent..extent),
        rng.gen_range(-extent..extent),
    );
    let rotation = UnitQuaternion::from_euler_angles(
        rng.gen_range(-1.0..1.0),
        rng.gen_range(-1.0..1.0),
        rng.gen_range(-1.0..1.0),
    );
    RigidPose::from_parts(Translation3::from(translation), rotation)
}

fn random_unit(rng: &mut impl Rng) -> Vector3<f64> {
    loop {
        let v = Vector3::new(
            rng.gen_range(-1.0..1.0),
            rng.gen_range(-1.0..1.0),
            rng.gen_range(-1.0..1.0),
        );
        let norm = v.norm();
        if norm > 1e-3 && norm <= 1.0 {
            return v / norm;
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_rng_is_deterministic() {
        let mut rng1 = seeded_rng(42);
        let mut rng2 = seeded_rng(42);
        let v1: f64 = rng1.gen();
        let v2: f64 = rng2.gen();
        assert!((v1 - v2).abs() < f64::EPSILON);
    }

    #[test]
    fn random_chain_reproducible() {
        let a = random_chain(&mut seeded_rng(7), 4);
        let b = random_chain(&mut seeded_rng(7), 4);
        assert_eq!(a, b);
        assert_eq!(a.len(), 5);
    }

    #[test]
    fn random_chain_segment_lengths_in_range() {
        let chain = random_chain(&mut seeded_rng(3), 6);
        for length in chain.segment_lengths() {
            assert!(length > 0.5 - 1e-9 && length < 1.5 + 1e-9, "length={length}");
        }
    }

    #[test]
    fn random_goal_within_radius() {
        let mut rng = seeded_rng(11);
        let center = Position::new(1.0, -2.0, 0.5);
        for _ in 0..20 {
            let goal = random_goal(&mut rng, &center, 0.75);
            assert!((goal - center).norm() < 0.75);
        }
    }
}
