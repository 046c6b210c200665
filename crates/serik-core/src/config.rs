use std::path::Path;

use nalgebra::{Quaternion, Translation3, UnitQuaternion};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::types::{ChainPoses, Position, RigidPose};

// ---------------------------------------------------------------------------
// Serde default functions
// ---------------------------------------------------------------------------

const fn default_iterations() -> u32 {
    10
}
const fn default_step() -> f64 {
    1.0
}
const fn default_damping() -> f64 {
    0.1
}
const fn default_differential() -> f64 {
    1e-3
}
const fn default_rotation() -> [f64; 4] {
    [0.0, 0.0, 0.0, 1.0]
}

// ---------------------------------------------------------------------------
// SolverConfig
// ---------------------------------------------------------------------------

/// Tunables for the damped-least-squares solver.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SolverConfig {
    /// Fixed number of gradient steps per solve (default: 10).
    #[serde(default = "default_iterations")]
    pub iterations: u32,

    /// Fraction of the positional error applied per iteration (default: 1.0).
    /// Expected in `[0, 1]`.
    #[serde(default = "default_step")]
    pub step: f64,

    /// Tikhonov damping λ; `λ²` is added to the diagonal of `JᵗJ`
    /// (default: 0.1). Expected in `[0, 1]`. Zero is accepted but every
    /// iteration at a rank-deficient Jacobian is then skipped.
    #[serde(default = "default_damping")]
    pub damping: f64,

    /// Forward-difference step in radians for Jacobian estimation
    /// (default: 1e-3).
    #[serde(default = "default_differential")]
    pub differential: f64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            iterations: default_iterations(),
            step: default_step(),
            damping: default_damping(),
            differential: default_differential(),
        }
    }
}

impl SolverConfig {
    /// Validate configuration. Returns Err on invalid values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.differential.is_finite() || self.differential <= 0.0 {
            return Err(ConfigError::InvalidDifferential(self.differential));
        }
        check_non_negative("step", self.step)?;
        check_non_negative("damping", self.damping)?;
        Ok(())
    }

    /// Parse from a TOML string and validate.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }
}

fn check_non_negative(field: &str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidValue {
            field: field.into(),
            message: format!("{value} must be finite and >= 0"),
        })
    }
}

// ---------------------------------------------------------------------------
// PoseConfig
// ---------------------------------------------------------------------------

/// Serializable rigid pose: translation plus `[x, y, z, w]` quaternion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PoseConfig {
    #[serde(default)]
    pub translation: [f64; 3],

    /// Quaternion as `[x, y, z, w]`; normalized on conversion.
    #[serde(default = "default_rotation")]
    pub rotation: [f64; 4],
}

impl Default for PoseConfig {
    fn default() -> Self {
        Self {
            translation: [0.0; 3],
            rotation: default_rotation(),
        }
    }
}

impl PoseConfig {
    /// Pure translation with identity rotation.
    pub const fn offset(x: f64, y: f64, z: f64) -> Self {
        Self {
            translation: [x, y, z],
            rotation: default_rotation(),
        }
    }

    pub fn to_pose(&self) -> Result<RigidPose, ConfigError> {
        let [x, y, z, w] = self.rotation;
        let quaternion = Quaternion::new(w, x, y, z);
        let norm = quaternion.norm();
        if !norm.is_finite() || norm < f64::EPSILON {
            return Err(ConfigError::InvalidValue {
                field: "rotation".into(),
                message: "quaternion must be finite and non-zero".into(),
            });
        }
        if self.translation.iter().any(|v| !v.is_finite()) {
            return Err(ConfigError::InvalidValue {
                field: "translation".into(),
                message: "components must be finite".into(),
            });
        }
        let [tx, ty, tz] = self.translation;
        Ok(RigidPose::from_parts(
            Translation3::new(tx, ty, tz),
            UnitQuaternion::from_quaternion(quaternion),
        ))
    }
}

impl From<&RigidPose> for PoseConfig {
    fn from(pose: &RigidPose) -> Self {
        let t = pose.translation.vector;
        let q = pose.rotation.quaternion();
        Self {
            translation: [t.x, t.y, t.z],
            rotation: [q.i, q.j, q.k, q.w],
        }
    }
}

// ---------------------------------------------------------------------------
// ChainConfig
// ---------------------------------------------------------------------------

/// Serial chain description.
///
/// The first joint is in world space; every later joint is relative to the
/// one before it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChainConfig {
    #[serde(default)]
    pub joints: Vec<PoseConfig>,
}

impl ChainConfig {
    pub fn to_poses(&self) -> Result<ChainPoses, ConfigError> {
        let poses = self
            .joints
            .iter()
            .map(PoseConfig::to_pose)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ChainPoses::from_poses(poses))
    }
}

impl From<&ChainPoses> for ChainConfig {
    fn from(poses: &ChainPoses) -> Self {
        Self {
            joints: poses.iter().map(|e| PoseConfig::from(&e.pose)).collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// ScenarioConfig
// ---------------------------------------------------------------------------

/// A chain, a goal, and solver settings: one complete solve request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScenarioConfig {
    #[serde(default)]
    pub chain: ChainConfig,

    #[serde(default)]
    pub goal: [f64; 3],

    #[serde(default)]
    pub solver: SolverConfig,
}

impl ScenarioConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.solver.validate()?;
        if self.goal.iter().any(|v| !v.is_finite()) {
            return Err(ConfigError::InvalidValue {
                field: "goal".into(),
                message: "components must be finite".into(),
            });
        }
        // Surfaces malformed quaternions at load time.
        self.chain.to_poses()?;
        Ok(())
    }

    pub fn goal_position(&self) -> Position {
        let [x, y, z] = self.goal;
        Position::new(x, y, z)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
