//! Reactive whole-arm motion control for serial manipulators.
//!
//! Every control tick a small quadratic program is built and solved for the joint velocities
//! that move the end effector toward a target pose while staying away from moving spherical
//! obstacles and from the joint limits:
//!
//! ```text
//!   min  ½ xᵀQx + cᵀx                 x = [q̇; δ], joint velocities and 6 slack variables
//!   s.t. [J_e | I₆] x = v             resolved-rate tracking, slack keeps it satisfiable
//!        Ain x <= bin                 joint limit and collision velocity dampers
//!        lb <= x <= ub                joint speed limits, bounded slack
//! ```
//!
//! `Q = diag(γ I, I₆ / e)` so that slack gets more expensive as the pose error `e` shrinks, and
//! `c = [-λ N ∇m; 0]` nudges the arm toward configurations of higher manipulability, only within
//! the null space `N` of the Jacobian so that it never slows down tracking.
//!
//! # Features
//!
//! - Velocity dampers shared by joint limits and collision avoidance, with safety and influence
//!   margins validated up front.
//! - Link proximity to obstacles computed with `parry3d` on capsule, sphere and cuboid link
//!   geometry, including the velocity of the obstacle itself.
//! - Constraint rows keep their provenance (joint limit or link/obstacle pair).
//! - Obstacles are read once per tick into immutable snapshots.
//! - The loop is an explicit state machine with a tick budget; infeasible or non-finite solutions
//!   hold the robot for that tick and are reported, never applied.
//! - QP solved with `clarabel` behind the [`solver::QpSolver`] trait.
//! - Modified Denavit-Hartenberg serial chains, with a Franka Emika Panda preset.
//! - Controller configuration from YAML (feature `allow_filesystem`).
//!
//! ## Example
//!
//! ```no_run
//! use nalgebra::{DVector, Point3, Translation3, Vector3};
//! use rs_reactive_arm::config::ControllerConfig;
//! use rs_reactive_arm::controller::Controller;
//! use rs_reactive_arm::kinematics_with_shape::KinematicsWithShape;
//! use rs_reactive_arm::obstacles::SphereObstacle;
//! use rs_reactive_arm::parameters_robots::mdh_kinematics::PANDA_READY;
//! use rs_reactive_arm::simulation::{KinematicSimulation, Simulation};
//! use rs_reactive_arm::solver::ClarabelSolver;
//!
//! let robot = KinematicsWithShape::panda().unwrap();
//! let mut sim = KinematicSimulation::new(DVector::from_row_slice(&PANDA_READY));
//! sim.add(Box::new(SphereObstacle::new(0, Point3::new(0.5, 0.4, 0.4), 0.05)
//!     .moving(Vector3::new(0.0, -0.1, 0.0))));
//!
//! let target = Translation3::new(0.0, 0.3, 0.0) * robot.kinematics.forward(sim.joint_positions());
//! let mut controller = Controller::new(robot, ControllerConfig::default(),
//!                                      Box::new(ClarabelSolver::default())).unwrap();
//! let summary = controller.run(&mut sim, &target).unwrap();
//! println!("{:?} after {} ticks", summary.state, summary.ticks);
//! ```

pub mod control_error;

pub mod parameters;
pub mod parameters_robots;

#[path = "utils/utils.rs"]
pub mod utils;
pub mod kinematic_traits;
pub mod kinematics_impl;

pub mod constraints;

pub mod jacobian;

pub mod velocity_damper;

pub mod obstacles;

pub mod joint_body;

pub mod collisions;

pub mod kinematics_with_shape;

pub mod servo;

pub mod qp;

pub mod solver;

pub mod config;

pub mod simulation;

pub mod controller;

#[cfg(test)]
mod tests;
