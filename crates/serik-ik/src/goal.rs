//! Host-supplied goal adjustment, applied before a solve starts.
//!
//! The solver itself never queries the environment. A host that needs to
//! snap the goal to terrain (or anything else) hands in a [`GoalResolver`];
//! its result is treated as a plain input.

use serik_core::{Position, RigidPose};

/// Turns a raw goal into the final position the solver should chase.
pub trait GoalResolver {
    /// `root` is the chain's world-space root pose.
    fn resolve(&self, raw: &Position, root: &RigidPose) -> Position;
}

/// Passes the goal through unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct RawGoal;

impl GoalResolver for RawGoal {
    fn resolve(&self, raw: &Position, _root: &RigidPose) -> Position {
        *raw
    }
}

impl<F> GoalResolver for F
where
    F: Fn(&Position, &RigidPose) -> Position,
{
    fn resolve(&self, raw: &Position, root: &RigidPose) -> Position {
        self(raw, root)
    }
}

/// Re-bases the goal's height onto the ground below it.
///
/// The goal's height above the chain root is preserved, but measured from
/// the ground height at the goal's horizontal position instead:
/// `y = ground(x, z) + (goal.y - root.y)`. Y is up.
#[derive(Debug, Clone, Copy)]
pub struct GroundRelative<H> {
    height_at: H,
}

impl<H> GroundRelative<H>
where
    H: Fn(f64, f64) -> f64,
{
    /// `height_at(x, z)` returns the ground height below a point.
    pub const fn new(height_at: H) -> Self {
        Self { height_at }
    }
}

impl<H> GoalResolver for GroundRelative<H>
where
    H: Fn(f64, f64) -> f64,
{
    fn resolve(&self, raw: &Position, root: &RigidPose) -> Position {
        let ground = (self.height_at)(raw.x, raw.z);
        Position::new(raw.x, ground + (raw.y - root.translation.y), raw.z)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
