//! Reactive control loop.
//!
//! Each tick reads the joint state and a snapshot of all obstacles once, computes the servo
//! velocity toward the target, assembles and solves the QP and applies the joint velocities
//! before advancing the simulation by one tick. The controller holds no state across ticks
//! other than its tick counter and state machine:
//!
//! ```text
//!   Tracking --(e < threshold)--> Arrived
//!   Tracking --(max ticks)------> TimedOut
//! ```
//!
//! A tick where the solver finds nothing, or the QP or its solution is not finite, commands zero
//! velocity and carries the fault in its [`TickReport`]. Only configuration and dimension errors
//! are returned as `Err`.

use tracing::{debug, info, warn};
use crate::collisions::ClosestPointRecord;
use crate::config::ControllerConfig;
use crate::control_error::{ControlError, ControlResult};
use crate::kinematic_traits::{Joints, Pose};
use crate::kinematics_with_shape::KinematicsWithShape;
use crate::obstacles::snapshot_all;
use crate::qp::{Assembled, QpAssembler};
use crate::servo::p_servo;
use crate::simulation::Simulation;
use crate::solver::QpSolver;
use crate::utils::is_valid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlState {
    Tracking,
    /// Target reached. Terminal.
    Arrived,
    /// Tick budget used up before arrival. Terminal.
    TimedOut,
}

impl ControlState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ControlState::Tracking)
    }
}

/// What happened during one tick.
#[derive(Debug)]
pub struct TickReport {
    /// Zero based index of the tick.
    pub tick: usize,
    /// State after the tick.
    pub state: ControlState,
    /// Scalar pose error at the start of the tick.
    pub error: f64,
    /// Joint velocities applied during the tick, zero on a fault or after arrival.
    pub command: Joints,
    pub joint_rows: usize,
    pub collision_rows: usize,
    pub closest: Option<ClosestPointRecord>,
    /// Recovered fault of this tick, if any.
    pub fault: Option<ControlError>,
}

/// Outcome of [`Controller::run`].
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub state: ControlState,
    pub ticks: usize,
    pub faulted_ticks: usize,
    pub final_error: f64,
    /// Smallest link to obstacle distance seen over the run, `None` without obstacles.
    pub min_distance: Option<f64>,
}

pub struct Controller {
    robot: KinematicsWithShape,
    config: ControllerConfig,
    assembler: QpAssembler,
    solver: Box<dyn QpSolver>,
    state: ControlState,
    ticks: usize,
}

impl Controller {
    /// Validates the configuration, so that invalid margins fail before any tick runs.
    pub fn new(robot: KinematicsWithShape, config: ControllerConfig, solver: Box<dyn QpSolver>)
               -> ControlResult<Self> {
        let assembler = QpAssembler::new(&config)?;
        Ok(Controller { robot, config, assembler, solver, state: ControlState::Tracking, ticks: 0 })
    }

    pub fn state(&self) -> ControlState {
        self.state
    }

    pub fn ticks(&self) -> usize {
        self.ticks
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    pub fn robot(&self) -> &KinematicsWithShape {
        &self.robot
    }

    /// Back to `Tracking` with a fresh tick budget, e.g. for a new target.
    pub fn reset(&mut self) {
        self.state = ControlState::Tracking;
        self.ticks = 0;
    }

    /// Runs one tick. In a terminal state the joints are only read to report the pose error:
    /// nothing is solved, no velocity is set and the simulation does not step.
    pub fn tick(&mut self, sim: &mut dyn Simulation, target: &Pose) -> ControlResult<TickReport> {
        let n = self.robot.dof();
        let qs = sim.joint_positions().clone();
        if qs.len() != n {
            return Err(ControlError::DimensionMismatch { what: "joint positions", expected: n, found: qs.len() });
        }
        let zero = Joints::zeros(n);

        let kinematics = self.robot.kinematics.as_ref();
        let servo = p_servo(&kinematics.forward(&qs), target, self.config.servo_gain,
                            self.config.arrival_threshold);
        let mut report = TickReport {
            tick: self.ticks,
            state: self.state,
            error: servo.error,
            command: zero.clone(),
            joint_rows: 0,
            collision_rows: 0,
            closest: None,
            fault: None,
        };
        if self.state.is_terminal() {
            return Ok(report);
        }

        if servo.arrived {
            sim.set_joint_velocities(&zero)?;
            self.state = ControlState::Arrived;
            report.state = self.state;
            info!(tick = self.ticks, error = servo.error, "ARRIVED");
            self.ticks += 1;
            return Ok(report);
        }

        // Each obstacle is read exactly once per tick
        let obstacles = snapshot_all(sim.obstacles());

        match self.assembler.assemble(&self.robot, &qs, &servo, &obstacles) {
            Ok(Assembled { problem, closest }) => {
                report.joint_rows = problem.joint_limit_rows();
                report.collision_rows = problem.collision_rows();
                report.closest = closest;
                match self.solver.solve(&problem) {
                    Some(x) => {
                        let command = x.rows(0, n).into_owned();
                        if is_valid(&command) {
                            report.command = command;
                        } else {
                            warn!(tick = self.ticks, "non-finite joint velocities, holding");
                            report.fault = Some(ControlError::NumericDegeneracy(
                                "solution contains non-finite joint velocities".into()));
                        }
                    }
                    None => {
                        warn!(tick = self.ticks, "QP infeasible, holding");
                        report.fault = Some(ControlError::InfeasibleSolve { tick: self.ticks });
                    }
                }
            }
            Err(e) if e.is_per_tick() => {
                warn!(tick = self.ticks, "{}, holding", e);
                report.fault = Some(e);
            }
            Err(e) => return Err(e),
        }

        sim.set_joint_velocities(&report.command)?;
        sim.step(self.config.tick);

        debug!(tick = self.ticks, error = servo.error, collisions = report.collision_rows,
            closest = ?report.closest.map(|c| c.distance), "tick");

        self.ticks += 1;
        if self.ticks >= self.config.max_ticks {
            self.state = ControlState::TimedOut;
            info!(ticks = self.ticks, error = servo.error, "TIMED_OUT");
        }
        report.state = self.state;
        Ok(report)
    }

    /// Ticks until the state is terminal.
    pub fn run(&mut self, sim: &mut dyn Simulation, target: &Pose) -> ControlResult<RunSummary> {
        self.run_with(sim, target, |_| {})
    }

    /// Like `run`, passing every tick report to `observer`.
    pub fn run_with<F>(&mut self, sim: &mut dyn Simulation, target: &Pose, mut observer: F)
                       -> ControlResult<RunSummary>
    where
        F: FnMut(&TickReport),
    {
        let mut faulted_ticks = 0;
        let mut min_distance: Option<f64> = None;
        loop {
            let report = self.tick(sim, target)?;
            observer(&report);
            if report.fault.is_some() {
                faulted_ticks += 1;
            }
            if let Some(closest) = report.closest {
                min_distance = Some(min_distance.map_or(closest.distance, |d| d.min(closest.distance)));
            }
            if report.state.is_terminal() {
                return Ok(RunSummary {
                    state: report.state,
                    ticks: self.ticks,
                    faulted_ticks,
                    final_error: report.error,
                    min_distance,
                });
            }
        }
    }
}
