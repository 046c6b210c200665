//! Damped Least Squares iteration driver.
//!
//! Runs a fixed number of gradient steps on a solve-local parameter vector,
//! then applies the final parameters to the pose snapshot and emits one
//! frame-tagged pose per joint.

use tracing::{debug, trace, warn};

use serik_core::{
    ChainPoses, IkError, Matrix, MatrixError, Position, RigidPose, SolverConfig,
};

use crate::chain::KinematicChain;
use crate::dls::{self, DlsBuffers};
use crate::fk::{self, PARAMS_PER_JOINT};
use crate::goal::GoalResolver;
use crate::jacobian::{self, POSITION_ROWS};

/// Lifecycle of a solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SolverState {
    /// No solve in progress, and the last one (if any) failed.
    #[default]
    Idle,
    /// Iterating on the parameter vector.
    Solving,
    /// The last solve succeeded and its poses were handed out. The next
    /// solve passes back through `Idle`.
    Committed,
}

/// Result of an IK solve.
#[derive(Debug, Clone)]
pub struct IkSolution {
    /// Solved poses: joint 0 in world space, the rest parent-relative.
    pub poses: ChainPoses,
    /// Final rotation parameters, three per joint.
    pub parameters: Vec<f64>,
    /// Iterations run.
    pub iterations: u32,
    /// Iterations whose update was discarded (singular or non-finite).
    pub skipped_iterations: u32,
    /// Effector-to-goal distance before the first iteration.
    pub initial_error: f64,
    /// Effector-to-goal distance of the committed poses.
    pub final_error: f64,
}

impl IkSolution {
    /// Solution for an empty chain: nothing to move.
    fn unchanged(poses: ChainPoses) -> Self {
        Self {
            poses,
            parameters: Vec::new(),
            iterations: 0,
            skipped_iterations: 0,
            initial_error: 0.0,
            final_error: 0.0,
        }
    }

    /// World position of the solved effector.
    pub fn effector_position(&self) -> Option<Position> {
        self.poses.effector_position()
    }

    /// Whether the final error is within `tolerance`.
    pub fn converged(&self, tolerance: f64) -> bool {
        self.final_error <= tolerance
    }
}

/// Scratch state sized for one chain length, reused across solves.
#[derive(Debug, Clone)]
struct Workspace {
    joints: usize,
    parameters: Vec<f64>,
    jacobian: Matrix,
    gradient: Matrix,
    update: Matrix,
    dls: DlsBuffers,
}

impl Workspace {
    fn new(joints: usize) -> Self {
        let dof = joints * PARAMS_PER_JOINT;
        Self {
            joints,
            parameters: vec![0.0; dof],
            jacobian: Matrix::zeros(POSITION_ROWS, dof),
            gradient: Matrix::zeros(POSITION_ROWS, 1),
            update: Matrix::zeros(dof, 1),
            dls: DlsBuffers::new(dof),
        }
    }
}

/// Damped Least Squares IK solver.
///
/// Owns its scratch buffers, so a solver per chain (or per thread) avoids
/// reallocating every frame. Solves on different solvers share nothing.
#[derive(Debug, Clone)]
pub struct DlsSolver {
    config: SolverConfig,
    workspace: Option<Workspace>,
    state: SolverState,
}

impl DlsSolver {
    /// Create a new solver with the given configuration.
    pub fn new(config: SolverConfig) -> Result<Self, IkError> {
        config.validate()?;
        if config.damping == 0.0 {
            warn!("DLS solver configured with zero damping; singular iterations will be skipped");
        }
        Ok(Self {
            config,
            workspace: None,
            state: SolverState::Idle,
        })
    }

    /// Create a solver with default configuration.
    pub fn with_defaults() -> Self {
        Self {
            config: SolverConfig::default(),
            workspace: None,
            state: SolverState::Idle,
        }
    }

    pub const fn config(&self) -> &SolverConfig {
        &self.config
    }

    pub const fn state(&self) -> SolverState {
        self.state
    }

    /// Chain length the scratch buffers are currently sized for.
    pub fn workspace_joints(&self) -> Option<usize> {
        self.workspace.as_ref().map(|ws| ws.joints)
    }

    /// Solve IK for `chain` toward `goal` without mutating the chain.
    ///
    /// An empty chain returns an empty pose set immediately and allocates
    /// nothing.
    pub fn solve(&mut self, goal: &Position, chain: &KinematicChain) -> Result<IkSolution, IkError> {
        if chain.is_empty() {
            return Ok(IkSolution::unchanged(ChainPoses::empty()));
        }
        self.solve_sequence(goal, &chain.pose_sequence())
    }

    /// Resolve `raw_goal` against the chain root, then solve.
    pub fn solve_with<R>(
        &mut self,
        raw_goal: &Position,
        chain: &KinematicChain,
        resolver: &R,
    ) -> Result<IkSolution, IkError>
    where
        R: GoalResolver + ?Sized,
    {
        let Some(root) = chain.root() else {
            return Ok(IkSolution::unchanged(ChainPoses::empty()));
        };
        let goal = resolver.resolve(raw_goal, root);
        self.solve(&goal, chain)
    }

    /// Solve and commit the result back onto `chain`.
    pub fn solve_in_place(
        &mut self,
        goal: &Position,
        chain: &mut KinematicChain,
    ) -> Result<IkSolution, IkError> {
        let solution = self.solve(goal, chain)?;
        if !chain.is_empty() {
            chain.commit(&solution.poses)?;
        }
        Ok(solution)
    }

    /// Solve on a raw pose snapshot (root world, the rest parent-relative).
    pub fn solve_sequence(
        &mut self,
        goal: &Position,
        sequence: &[RigidPose],
    ) -> Result<IkSolution, IkError> {
        if sequence.is_empty() {
            return Ok(IkSolution::unchanged(ChainPoses::empty()));
        }
        self.state = SolverState::Idle;
        if !goal.coords.iter().all(|v| v.is_finite()) {
            return Err(IkError::InvalidGoal);
        }

        self.state = SolverState::Solving;
        let result = self.iterate(goal, sequence);
        self.state = match result {
            Ok(_) => SolverState::Committed,
            Err(_) => SolverState::Idle,
        };
        result
    }

    fn iterate(&mut self, goal: &Position, sequence: &[RigidPose]) -> Result<IkSolution, IkError> {
        let config = self.config;
        let ws = self.workspace_for(sequence.len());
        ws.parameters.fill(0.0);

        let initial_error = (*goal - fk::effector_position(sequence, &ws.parameters)).norm();
        let mut skipped_iterations = 0;

        for iteration in 0..config.iterations {
            let tip = jacobian::build_jacobian(
                sequence,
                &mut ws.parameters,
                config.differential,
                &mut ws.jacobian,
            )?;

            let error = *goal - tip;
            trace!(iteration, error = error.norm(), "DLS iteration");
            for row in 0..POSITION_ROWS {
                ws.gradient[(row, 0)] = config.step * error[row];
            }

            match dls::damped_pseudo_inverse_into(&ws.jacobian, config.damping, &mut ws.dls) {
                Ok(()) => {}
                Err(MatrixError::Singular) => {
                    warn!(iteration, "damped JᵗJ is singular; skipping update");
                    skipped_iterations += 1;
                    continue;
                }
                Err(err) => return Err(err.into()),
            }

            ws.dls
                .pseudo_inverse()
                .multiply_into(&ws.gradient, &mut ws.update)?;
            if !ws.update.is_finite() {
                warn!(iteration, "non-finite parameter update; skipping");
                skipped_iterations += 1;
                continue;
            }

            for (m, parameter) in ws.parameters.iter_mut().enumerate() {
                *parameter += ws.update[(m, 0)];
            }
        }

        let poses = fk::corrected_poses(sequence, &ws.parameters);
        let final_error = poses
            .effector_position()
            .map_or(0.0, |tip| (*goal - tip).norm());

        debug!(
            joints = sequence.len(),
            iterations = config.iterations,
            skipped_iterations,
            initial_error,
            final_error,
            "DLS solve finished"
        );

        Ok(IkSolution {
            poses,
            parameters: ws.parameters.clone(),
            iterations: config.iterations,
            skipped_iterations,
            initial_error,
            final_error,
        })
    }

    /// Scratch buffers for `joints`, reallocated only when the size changes.
    fn workspace_for(&mut self, joints: usize) -> &mut Workspace {
        if self.workspace.as_ref().map_or(true, |ws| ws.joints != joints) {
            self.workspace = Some(Workspace::new(joints));
        }
        self.workspace.get_or_insert_with(|| Workspace::new(joints))
    }
}

impl Default for DlsSolver {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// One-shot solve on frame-tagged poses.
///
/// Returns the updated pose of every joint, or the input unchanged if the
/// chain is empty.
pub fn solve(
    goal: &Position,
    chain: &ChainPoses,
    iterations: u32,
    step: f64,
    damping: f64,
) -> Result<ChainPoses, IkError> {
    if chain.is_empty() {
        return Ok(chain.clone());
    }
    let mut solver = DlsSolver::new(SolverConfig {
        iterations,
        step,
        damping,
        ..SolverConfig::default()
    })?;
    Ok(solver.solve_sequence(goal, &chain.poses())?.poses)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
