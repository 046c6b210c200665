use std::fmt;

use nalgebra::{Isometry3, Point3};
use serde::{Deserialize, Serialize};

use crate::error::IkError;

/// Rigid transform: translation plus unit-quaternion orientation.
pub type RigidPose = Isometry3<f64>;

/// A point in world space.
pub type Position = Point3<f64>;

/// Compose two poses, `a ∘ b`, keeping the orientation a valid rotation.
///
/// Repeated quaternion products drift off unit norm; the result is
/// renormalized so long chains stay rigid.
pub fn compose(a: &RigidPose, b: &RigidPose) -> RigidPose {
    let mut out = a * b;
    out.rotation.renormalize();
    out
}

// ---------------------------------------------------------------------------
// Frame
// ---------------------------------------------------------------------------

/// Frame of reference a joint pose is expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frame {
    /// Pose is in world space (chain root only).
    World,
    /// Pose is relative to the preceding joint.
    Local,
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::World => f.write_str("world"),
            Self::Local => f.write_str("local"),
        }
    }
}

// ---------------------------------------------------------------------------
// JointPose
// ---------------------------------------------------------------------------

/// One joint's pose tagged with the frame it is expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct JointPose {
    pub frame: Frame,
    pub pose: RigidPose,
}

impl JointPose {
    pub const fn world(pose: RigidPose) -> Self {
        Self {
            frame: Frame::World,
            pose,
        }
    }

    pub const fn local(pose: RigidPose) -> Self {
        Self {
            frame: Frame::Local,
            pose,
        }
    }
}

// ---------------------------------------------------------------------------
// ChainPoses
// ---------------------------------------------------------------------------

/// Ordered, frame-tagged poses of a serial chain.
///
/// Entry 0 is always [`Frame::World`]; every later entry is [`Frame::Local`]
/// (relative to its predecessor). This is both the input snapshot format and
/// the committed output of a solve.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<JointPose>", into = "Vec<JointPose>")]
pub struct ChainPoses {
    entries: Vec<JointPose>,
}

impl ChainPoses {
    /// Build from a world-space root and parent-relative followers.
    pub fn new(root: RigidPose, locals: impl IntoIterator<Item = RigidPose>) -> Self {
        let mut entries = vec![JointPose::world(root)];
        entries.extend(locals.into_iter().map(JointPose::local));
        Self { entries }
    }

    /// A chain with no joints.
    pub const fn empty() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Build from pre-tagged entries, checking the world/local layout.
    pub fn from_entries(entries: Vec<JointPose>) -> Result<Self, IkError> {
        for (index, entry) in entries.iter().enumerate() {
            let expected = if index == 0 { Frame::World } else { Frame::Local };
            if entry.frame != expected {
                return Err(IkError::FrameMismatch { index, expected });
            }
        }
        Ok(Self { entries })
    }

    /// Build from raw poses where the first is world-space.
    pub fn from_poses(poses: impl IntoIterator<Item = RigidPose>) -> Self {
        let entries = poses
            .into_iter()
            .enumerate()
            .map(|(i, pose)| {
                if i == 0 {
                    JointPose::world(pose)
                } else {
                    JointPose::local(pose)
                }
            })
            .collect();
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[JointPose] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, JointPose> {
        self.entries.iter()
    }

    /// Pose of joint `index` in its own frame.
    pub fn pose(&self, index: usize) -> Option<&RigidPose> {
        self.entries.get(index).map(|e| &e.pose)
    }

    /// Raw poses in chain order (root world, others local).
    pub fn poses(&self) -> Vec<RigidPose> {
        self.entries.iter().map(|e| e.pose).collect()
    }

    /// Accumulated world pose of every joint.
    pub fn world_poses(&self) -> Vec<RigidPose> {
        let mut out: Vec<RigidPose> = Vec::with_capacity(self.entries.len());
        for entry in &self.entries {
            let world = match out.last() {
                Some(parent) => compose(parent, &entry.pose),
                None => entry.pose,
            };
            out.push(world);
        }
        out
    }

    /// World pose of the last joint.
    pub fn effector(&self) -> Option<RigidPose> {
        self.world_poses().pop()
    }

    /// World position of the last joint.
    pub fn effector_position(&self) -> Option<Position> {
        self.effector().map(|pose| Position::from(pose.translation.vector))
    }

    /// Distance from each joint to its predecessor (`len() - 1` entries).
    pub fn segment_lengths(&self) -> Vec<f64> {
        self.entries
            .iter()
            .skip(1)
            .map(|e| e.pose.translation.vector.norm())
            .collect()
    }
}

impl TryFrom<Vec<JointPose>> for ChainPoses {
    type Error = IkError;

    fn try_from(entries: Vec<JointPose>) -> Result<Self, Self::Error> {
        Self::from_entries(entries)
    }
}

impl From<ChainPoses> for Vec<JointPose> {
    fn from(poses: ChainPoses) -> Self {
        poses.entries
    }
}

impl<'a> IntoIterator for &'a ChainPoses {
    type Item = &'a JointPose;
    type IntoIter = std::slice::Iter<'a, JointPose>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
