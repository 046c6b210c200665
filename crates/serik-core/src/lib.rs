// serik-core: Pose types, config, errors, and matrix math for serik.

pub mod config;
pub mod error;
pub mod matrix;
pub mod types;

pub use config::{ChainConfig, PoseConfig, ScenarioConfig, SolverConfig};
pub use error::{ConfigError, IkError, MatrixError, Shape};
pub use matrix::Matrix;
pub use types::{ChainPoses, Frame, JointPose, Position, RigidPose};
