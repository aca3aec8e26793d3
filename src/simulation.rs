//! Simulation collaborator: owns the robot joint state and the obstacles, and advances time.

use std::time::Duration;
use crate::control_error::{ControlError, ControlResult};
use crate::kinematic_traits::Joints;
use crate::obstacles::Obstacle;

/// The controller reads the state through this trait and writes only joint velocities.
/// Obstacles must not change between `step` calls.
pub trait Simulation {
    fn add(&mut self, obstacle: Box<dyn Obstacle>);

    /// Advance the simulated clock, integrating joints and obstacles.
    fn step(&mut self, duration: Duration);

    fn joint_positions(&self) -> &Joints;

    /// Velocities applied by the following `step` calls.
    fn set_joint_velocities(&mut self, qd: &Joints) -> ControlResult<()>;

    fn obstacles(&self) -> Vec<&dyn Obstacle>;

    /// Simulated time elapsed so far.
    fn time(&self) -> Duration;
}

/// Pure kinematic simulation, `q += q̇ dt` per step, obstacles moving under their own velocity.
pub struct KinematicSimulation {
    positions: Joints,
    velocities: Joints,
    obstacles: Vec<Box<dyn Obstacle>>,
    clock: Duration,
}

impl KinematicSimulation {
    pub fn new(positions: Joints) -> Self {
        let velocities = Joints::zeros(positions.len());
        KinematicSimulation { positions, velocities, obstacles: Vec::new(), clock: Duration::ZERO }
    }

    pub fn joint_velocities(&self) -> &Joints {
        &self.velocities
    }
}

impl Simulation for KinematicSimulation {
    fn add(&mut self, obstacle: Box<dyn Obstacle>) {
        self.obstacles.push(obstacle);
    }

    fn step(&mut self, duration: Duration) {
        let dt = duration.as_secs_f64();
        self.positions += &self.velocities * dt;
        for obstacle in self.obstacles.iter_mut() {
            obstacle.advance(dt);
        }
        self.clock += duration;
    }

    fn joint_positions(&self) -> &Joints {
        &self.positions
    }

    fn set_joint_velocities(&mut self, qd: &Joints) -> ControlResult<()> {
        if qd.len() != self.positions.len() {
            return Err(ControlError::DimensionMismatch {
                what: "joint velocities", expected: self.positions.len(), found: qd.len(),
            });
        }
        self.velocities.copy_from(qd);
        Ok(())
    }

    fn obstacles(&self) -> Vec<&dyn Obstacle> {
        self.obstacles.iter().map(|o| o.as_ref()).collect()
    }

    fn time(&self) -> Duration {
        self.clock
    }
}
