//! Serial kinematic chain: an ordered list of joints with stored poses.
//!
//! Joint 0's base pose is in world space; every later joint's base pose is
//! relative to its immediate predecessor. Solves read a snapshot of these
//! poses and never touch the chain until the host commits the result.

use serik_core::{ChainConfig, ChainPoses, ConfigError, Frame, IkError, Position, RigidPose};

use crate::fk::{self, PARAMS_PER_JOINT};

/// A single joint in the chain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChainJoint {
    /// Position in the chain, 0 = root.
    pub index: usize,
    /// Stored pose: world space for the root, parent-relative otherwise.
    pub base: RigidPose,
}

impl ChainJoint {
    pub const fn frame(&self) -> Frame {
        if self.index == 0 {
            Frame::World
        } else {
            Frame::Local
        }
    }
}

/// An ordered serial chain from root to end effector.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KinematicChain {
    joints: Vec<ChainJoint>,
}

impl KinematicChain {
    /// Build from a world-space root and parent-relative followers.
    pub fn new(root: RigidPose, locals: impl IntoIterator<Item = RigidPose>) -> Self {
        Self::from_poses(&ChainPoses::new(root, locals))
    }

    /// A chain with no joints.
    pub const fn empty() -> Self {
        Self { joints: Vec::new() }
    }

    pub fn from_poses(poses: &ChainPoses) -> Self {
        let joints = poses
            .iter()
            .enumerate()
            .map(|(index, entry)| ChainJoint {
                index,
                base: entry.pose,
            })
            .collect();
        Self { joints }
    }

    pub fn from_config(config: &ChainConfig) -> Result<Self, ConfigError> {
        Ok(Self::from_poses(&config.to_poses()?))
    }

    /// Number of joints.
    pub fn len(&self) -> usize {
        self.joints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.joints.is_empty()
    }

    /// Number of rotation parameters a solve works on.
    pub fn dof(&self) -> usize {
        self.joints.len() * PARAMS_PER_JOINT
    }

    /// Access the joint definitions.
    pub fn joints(&self) -> &[ChainJoint] {
        &self.joints
    }

    /// World pose of the root joint.
    pub fn root(&self) -> Option<&RigidPose> {
        self.joints.first().map(|j| &j.base)
    }

    /// Snapshot of the stored poses for one solve.
    ///
    /// Root in world space, the rest parent-relative, copied so later
    /// perturbations never reach the chain.
    pub fn pose_sequence(&self) -> Vec<RigidPose> {
        self.joints.iter().map(|j| j.base).collect()
    }

    /// Stored poses as a frame-tagged set.
    pub fn to_poses(&self) -> ChainPoses {
        ChainPoses::from_poses(self.joints.iter().map(|j| j.base))
    }

    /// Compute forward kinematics: rotation corrections -> end-effector pose.
    ///
    /// # Panics
    ///
    /// Panics if `parameters.len() != self.dof()`.
    pub fn forward_kinematics(&self, parameters: &[f64]) -> RigidPose {
        fk::forward_kinematics(&self.pose_sequence(), parameters)
    }

    /// Current end-effector world position, to be used as the new goal when
    /// nothing external drives the chain. `None` for an empty chain.
    pub fn refresh_goal(&self) -> Option<Position> {
        if self.is_empty() {
            return None;
        }
        Some(fk::effector_position(
            &self.pose_sequence(),
            &vec![0.0; self.dof()],
        ))
    }

    /// Write solved poses back as the new stored poses.
    ///
    /// The only mutation point of a chain. [`ChainPoses`] guarantees entry 0
    /// is the world pose and the rest are parent-relative.
    pub fn commit(&mut self, poses: &ChainPoses) -> Result<(), IkError> {
        if poses.len() != self.joints.len() {
            return Err(IkError::ChainLengthMismatch {
                expected: self.joints.len(),
                got: poses.len(),
            });
        }
        for (joint, entry) in self.joints.iter_mut().zip(poses.iter()) {
            joint.base = entry.pose;
        }
        Ok(())
    }

    /// Distance from each joint to its predecessor.
    pub fn segment_lengths(&self) -> Vec<f64> {
        self.joints
            .iter()
            .skip(1)
            .map(|j| j.base.translation.vector.norm())
            .collect()
    }

    /// Maximum distance the effector can reach from the root.
    pub fn reach(&self) -> f64 {
        self.segment_lengths().iter().sum()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
