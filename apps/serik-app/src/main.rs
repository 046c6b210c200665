//! serik inverse-kinematics CLI.
//!
//! Provides three modes of operation:
//! - `solve`: Load a scenario TOML, solve it, and print the joint poses
//! - `demo`: Track a moving goal with a three-link chain
//! - `info`: Print crate versions and default solver settings

use std::error::Error;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use serik_core::{ChainConfig, ChainPoses, PoseConfig, ScenarioConfig, SolverConfig};
use serik_ik::{DlsSolver, GroundRelative, IkSolution, KinematicChain, Position};

// ---------------------------------------------------------------------------
// CLI
// ---------------------------------------------------------------------------

/// Damped-least-squares inverse kinematics for serial chains.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Solve a scenario file and print the resulting joint poses.
    Solve {
        /// Scenario TOML: chain joints, goal, and solver settings.
        #[arg(short, long)]
        scenario: PathBuf,

        /// Override the iteration count.
        #[arg(short, long)]
        iterations: Option<u32>,

        /// Override the step size.
        #[arg(long)]
        step: Option<f64>,

        /// Override the damping factor.
        #[arg(short, long)]
        damping: Option<f64>,

        /// Print the solved chain as TOML instead of a table.
        #[arg(long)]
        toml: bool,
    },

    /// Track a goal sliding over uneven ground with a three-link chain.
    Demo {
        /// Number of frames to simulate.
        #[arg(short, long, default_value_t = 20)]
        frames: u32,
    },

    /// Print crate information.
    Info,
}

type AppResult = Result<(), Box<dyn Error>>;

// ---------------------------------------------------------------------------
// Mode implementations
// ---------------------------------------------------------------------------

fn run_solve(
    path: &Path,
    iterations: Option<u32>,
    step: Option<f64>,
    damping: Option<f64>,
    as_toml: bool,
) -> AppResult {
    let scenario = ScenarioConfig::from_file(path)?;
    let mut config = scenario.solver;
    if let Some(iterations) = iterations {
        config.iterations = iterations;
    }
    if let Some(step) = step {
        config.step = step;
    }
    if let Some(damping) = damping {
        config.damping = damping;
    }

    let chain = KinematicChain::from_config(&scenario.chain)?;
    let goal = scenario.goal_position();
    info!(joints = chain.len(), reach = chain.reach(), "loaded {}", path.display());

    let mut solver = DlsSolver::new(config)?;
    let solution = solver.solve(&goal, &chain)?;

    if as_toml {
        let output = ChainConfig::from(&solution.poses);
        print!("{}", toml::to_string(&output)?);
    } else {
        print_solution(&goal, &solution);
    }
    Ok(())
}

fn run_demo(frames: u32) -> AppResult {
    let mut chain = KinematicChain::from_config(&ChainConfig {
        joints: vec![
            PoseConfig::offset(0.0, 0.0, 0.0),
            PoseConfig::offset(0.0, 0.0, 1.0),
            PoseConfig::offset(0.0, 0.0, 1.0),
            PoseConfig::offset(0.0, 0.0, 1.0),
        ],
    })?;
    let ground = GroundRelative::new(|x: f64, z: f64| 0.2 * (1.5 * x).sin() + 0.1 * z);
    let mut solver = DlsSolver::with_defaults();

    println!("frame       goal                      error");
    for frame in 0..frames {
        let t = f64::from(frame) / f64::from(frames.max(1));
        let raw = Position::new(2.0 * t - 1.0, 0.5, 1.5);
        let solution = solver.solve_with(&raw, &chain, &ground)?;
        chain.commit(&solution.poses)?;

        let tip = solution.effector_position().unwrap_or_else(Position::origin);
        println!(
            "{frame:5}  ({:+.3}, {:+.3}, {:+.3})  {:.2e}",
            tip.x, tip.y, tip.z, solution.final_error
        );
    }
    Ok(())
}

fn run_info() {
    let defaults = SolverConfig::default();
    println!("serik v{}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("crates:");
    println!("  serik-core  {}", env!("CARGO_PKG_VERSION"));
    println!("  serik-ik    {}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("solver defaults:");
    println!("  iterations   {}", defaults.iterations);
    println!("  step         {}", defaults.step);
    println!("  damping      {}", defaults.damping);
    println!("  differential {}", defaults.differential);
}

fn print_solution(goal: &Position, solution: &IkSolution) {
    println!("goal: ({:.4}, {:.4}, {:.4})", goal.x, goal.y, goal.z);
    print_poses(&solution.poses);
    println!(
        "error: {:.6e} -> {:.6e} ({} iterations, {} skipped)",
        solution.initial_error,
        solution.final_error,
        solution.iterations,
        solution.skipped_iterations
    );
}

fn print_poses(poses: &ChainPoses) {
    for (i, entry) in poses.iter().enumerate() {
        let t = entry.pose.translation.vector;
        let (roll, pitch, yaw) = entry.pose.rotation.euler_angles();
        println!(
            "  joint {i} [{}]  t=({:+.4}, {:+.4}, {:+.4})  rpy=({:+.4}, {:+.4}, {:+.4})",
            entry.frame, t.x, t.y, t.z, roll, pitch, yaw
        );
    }
}

// ---------------------------------------------------------------------------
// main
// ---------------------------------------------------------------------------

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Some(Commands::Solve {
            scenario,
            iterations,
            step,
            damping,
            toml,
        }) => run_solve(&scenario, iterations, step, damping, toml),
        Some(Commands::Demo { frames }) => run_demo(frames),
        Some(Commands::Info) => {
            run_info();
            Ok(())
        }
        None => run_demo(20),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}
