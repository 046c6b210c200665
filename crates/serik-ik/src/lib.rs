//! Damped-least-squares inverse kinematics for serial joint chains.
//!
//! Moves the end effector of an open chain toward a goal position by
//! layering a three-angle rotational correction onto every joint. The
//! Jacobian is re-estimated every iteration by forward finite differences
//! of forward kinematics, then inverted with Tikhonov damping.
//!
//! # Architecture
//!
//! ```text
//! KinematicChain ──► pose snapshot ──► DlsSolver ──► ChainPoses
//!                                        │
//!                     fk ◄── jacobian ◄──┤
//!                                        └──► dls (Matrix)
//! ```
//!
//! A [`KinematicChain`] holds the stored joint poses. Each solve snapshots
//! them, iterates a fixed number of times on a solve-local parameter
//! vector, and emits one frame-tagged pose per joint. The chain is only
//! mutated when the host commits that output.

pub mod chain;
pub mod dls;
pub mod fk;
pub mod goal;
pub mod jacobian;
pub mod solver;

pub use chain::{ChainJoint, KinematicChain};
pub use goal::{GoalResolver, GroundRelative, RawGoal};
pub use solver::{solve, DlsSolver, IkSolution, SolverState};

pub use serik_core::{ChainPoses, Frame, IkError, JointPose, Position, RigidPose, SolverConfig};
