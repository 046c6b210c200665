//! Chain builders for tests.

use nalgebra::{Translation3, UnitQuaternion};
use serik_core::{Position, RigidPose};
use serik_ik::KinematicChain;

/// Pure translation with no rotation.
pub fn offset(x: f64, y: f64, z: f64) -> RigidPose {
    RigidPose::from_parts(Translation3::new(x, y, z), UnitQuaternion::identity())
}

/// Root at `root`, followed by `links` segments of `length` along +Z.
pub fn straight_chain(root: RigidPose, links: usize, length: f64) -> KinematicChain {
    KinematicChain::new(root, std::iter::repeat(offset(0.0, 0.0, length)).take(links))
}

/// Root at the origin plus three unit links along +Z. Reach is 3.
pub fn three_link_chain() -> KinematicChain {
    straight_chain(RigidPose::identity(), 3, 1.0)
}

/// Distance from the chain's current effector to `goal`.
///
/// # Panics
///
/// Panics on an empty chain.
pub fn goal_distance(chain: &KinematicChain, goal: &Position) -> f64 {
    let tip = chain.refresh_goal().expect("chain has no joints");
    (*goal - tip).norm()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn three_link_reach() {
        let chain = three_link_chain();
        assert_eq!(chain.len(), 4);
        assert_relative_eq!(chain.reach(), 3.0);
    }

    #[test]
    fn straight_chain_tip() {
        let chain = straight_chain(offset(1.0, 0.0, 0.0), 2, 0.5);
        assert_relative_eq!(goal_distance(&chain, &Position::new(1.0, 0.0, 1.0)), 0.0);
    }
}
