use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use nalgebra::{DVector, Point3, Translation3, UnitQuaternion, Vector3};

use rs_reactive_arm::config::ControllerConfig;
use rs_reactive_arm::controller::Controller;
use rs_reactive_arm::kinematics_with_shape::KinematicsWithShape;
use rs_reactive_arm::obstacles::SphereObstacle;
use rs_reactive_arm::parameters_robots::mdh_kinematics::PANDA_READY;
use rs_reactive_arm::simulation::{KinematicSimulation, Simulation};
use rs_reactive_arm::solver::ClarabelSolver;
use rs_reactive_arm::utils::{dump_joints, dump_pose};

/// Panda reaching past two moving spheres.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Controller configuration (YAML). Defaults are used if not given.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Overrides the tick budget of the configuration.
    #[arg(long)]
    max_ticks: Option<usize>,

    /// Only print the summary.
    #[arg(long, default_value_t = false)]
    quiet: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => ControllerConfig::from_yaml_file(path)
            .with_context(|| format!("reading controller configuration {}", path.display()))?,
        None => ControllerConfig::default(),
    };
    if let Some(max_ticks) = args.max_ticks {
        config.max_ticks = max_ticks;
    }

    let robot = KinematicsWithShape::panda().context("building the Panda model")?;
    let mut sim = KinematicSimulation::new(DVector::from_row_slice(&PANDA_READY));
    sim.add(Box::new(SphereObstacle::new(0, Point3::new(0.45, 0.4, 0.3), 0.05)
        .moving(Vector3::new(0.01, -0.25, 0.0))));
    sim.add(Box::new(SphereObstacle::new(1, Point3::new(0.1, 0.35, 0.65), 0.05)
        .moving(Vector3::new(0.0, -0.35, 0.0))));

    let start = robot.kinematics.forward(sim.joint_positions());
    let target = Translation3::new(0.2, 0.2, 0.1) * start
        * UnitQuaternion::from_axis_angle(&Vector3::z_axis(), 0.5);

    if !args.quiet {
        println!("Start:");
        dump_pose(&start);
        dump_joints(sim.joint_positions());
        println!("Target:");
        dump_pose(&target);
    }

    let mut controller = Controller::new(robot, config, Box::new(ClarabelSolver::default()))
        .context("invalid controller configuration")?;
    let quiet = args.quiet;
    let summary = controller.run_with(&mut sim, &target, |report| {
        if quiet {
            return;
        }
        let closest = report.closest
            .map(|c| format!("{:.3} m (link {}, obstacle {})", c.distance, c.link, c.obstacle))
            .unwrap_or_else(|| "-".to_string());
        print!("tick {:4}  e = {:.4}  collision rows {}  closest {}",
               report.tick, report.error, report.collision_rows, closest);
        match &report.fault {
            Some(fault) => println!("  HOLD: {}", fault),
            None => println!(),
        }
    }).context("control loop failed")?;

    println!("{:?} after {} ticks ({:.2} s simulated), final error {:.4}, {} faulted ticks",
             summary.state, summary.ticks, sim.time().as_secs_f64(), summary.final_error,
             summary.faulted_ticks);
    if let Some(distance) = summary.min_distance {
        println!("Closest approach to an obstacle: {:.3} m", distance);
    }
    dump_joints(sim.joint_positions());
    Ok(())
}
