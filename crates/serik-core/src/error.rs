use std::fmt;

use thiserror::Error;

use crate::types::Frame;

/// Top-level error type for serik.
#[derive(Debug, Error)]
pub enum IkError {
    #[error("Matrix error: {0}")]
    Matrix(#[from] MatrixError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Chain length mismatch: expected {expected} joints, got {got}")]
    ChainLengthMismatch { expected: usize, got: usize },

    #[error("Joint {index} must be expressed in the {expected} frame")]
    FrameMismatch { index: usize, expected: Frame },

    #[error("Goal position is not finite")]
    InvalidGoal,
}

/// Row/column count of a matrix, used in error reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shape {
    pub rows: usize,
    pub cols: usize,
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.rows, self.cols)
    }
}

/// Dense matrix errors.
///
/// Copy + static messages so the solver loop can match on them cheaply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MatrixError {
    #[error("Dimension mismatch in {op}: {lhs} vs {rhs}")]
    DimensionMismatch {
        op: &'static str,
        lhs: Shape,
        rhs: Shape,
    },

    #[error("Matrix is not square: {0}")]
    NotSquare(Shape),

    #[error("Matrix is singular")]
    Singular,
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid differential: {0} (must be finite and > 0)")]
    InvalidDifferential(f64),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}
