#[cfg(test)]
mod tests {
    use nalgebra::{Point3, Vector3};
    use crate::config::ControllerConfig;
    use crate::controller::Controller;
    use crate::obstacles::{snapshot_all, ObstacleSnapshot, SphereObstacle};
    use crate::qp::{QpAssembler, RowOrigin};
    use crate::servo::p_servo;
    use crate::simulation::{KinematicSimulation, Simulation};
    use crate::kinematic_traits::Pose;
    use crate::tests::test_utils::{controller, midpoint, offset_pose, panda, ready_simulation, tool_pose};

    /// Runs to a terminal state, returning the smallest true distance between the arm and the
    /// first obstacle over the whole trajectory and the number of ticks with collision rows.
    fn run_measuring(controller: &mut Controller, sim: &mut KinematicSimulation, target: &Pose) -> (f64, usize) {
        let robot = panda();
        let mut min_distance = f64::INFINITY;
        let mut ticks_with_rows = 0;
        loop {
            let report = controller.tick(&mut *sim, target).unwrap();
            assert!(report.fault.is_none(), "tick {} faulted: {:?}", report.tick, report.fault);
            if report.collision_rows > 0 {
                ticks_with_rows += 1;
                let closest = report.closest.unwrap();
                assert_eq!(closest.obstacle, 1);
            }
            let obstacle = ObstacleSnapshot::of(sim.obstacles()[0]);
            let distance = robot.body.min_distance(robot.kinematics.as_ref(), sim.joint_positions(), &obstacle);
            min_distance = min_distance.min(distance);
            if report.state.is_terminal() {
                return (min_distance, ticks_with_rows);
            }
        }
    }

    #[test]
    fn test_static_sphere_on_straight_path() {
        let mut sim = ready_simulation();
        let mut config = ControllerConfig::default();
        config.max_ticks = 200;
        let safety = config.collision_damper.safety;
        let mut controller = controller(config);

        let start = tool_pose(controller.robot(), &sim);
        let target = offset_pose(&start, Vector3::new(0.0, 0.5, 0.0), 0.0);
        sim.add(Box::new(SphereObstacle::new(1, midpoint(&start, &target), 0.05)));

        // Collision rows of the first QP have a positive bound, the sphere is beyond safety
        let config = controller.config();
        let servo = p_servo(&start, &target, config.servo_gain, config.arrival_threshold);
        let assembler = QpAssembler::new(config).unwrap();
        let problem = assembler.assemble(controller.robot(), sim.joint_positions(),
                                         &servo, &snapshot_all(sim.obstacles())).unwrap().problem;
        let collision_bounds: Vec<f64> = problem.origins.iter().zip(problem.b_in.iter())
            .filter(|(origin, _)| matches!(origin, RowOrigin::Collision { obstacle: 1, .. }))
            .map(|(_, bound)| *bound)
            .collect();
        assert!(!collision_bounds.is_empty());
        for bound in &collision_bounds {
            assert!(*bound > 0.0 && *bound <= 1.0, "bound {}", bound);
        }

        // The first tick already sees the sphere within influence, with a positive allowance
        let first = controller.tick(&mut sim, &target).unwrap();
        assert!(first.collision_rows >= 1);
        let closest = first.closest.unwrap();
        assert!(closest.distance > safety && closest.distance < 0.3);

        let (min_distance, ticks_with_rows) = run_measuring(&mut controller, &mut sim, &target);
        assert!(ticks_with_rows > 0);
        assert!(min_distance >= safety - 0.01, "came as close as {}", min_distance);
    }

    #[test]
    fn test_sphere_passing_by() {
        let mut sim = ready_simulation();
        let mut config = ControllerConfig::default();
        config.max_ticks = 80;
        config.arrival_threshold = 0.001;
        let safety = config.collision_damper.safety;
        let mut controller = controller(config);

        // Tool rises slightly while a sphere crosses in front of it, 2 cm from the tool surface
        // on a straight pass
        let start = tool_pose(controller.robot(), &sim);
        let target = offset_pose(&start, Vector3::new(0.0, 0.0, 0.05), 0.0);
        let tcp = start.translation.vector;
        let pass = Point3::new(tcp.x + 0.06 + 0.05 + 0.02, 0.25, tcp.z + 0.1);
        sim.add(Box::new(SphereObstacle::new(1, pass, 0.05)
            .moving(Vector3::new(0.0, -0.15, 0.0))));

        let (min_distance, ticks_with_rows) = run_measuring(&mut controller, &mut sim, &target);
        assert!(ticks_with_rows > 0);
        assert!(min_distance >= safety - 0.01, "came as close as {}", min_distance);
    }

    #[test]
    fn test_far_sphere_is_ignored() {
        let mut sim = ready_simulation();
        let mut controller = controller(ControllerConfig::default());
        let start = tool_pose(controller.robot(), &sim);
        let target = offset_pose(&start, Vector3::new(0.0, 0.1, 0.0), 0.0);
        sim.add(Box::new(SphereObstacle::new(1, Point3::new(-1.0, -1.0, 0.2), 0.05)));

        let mut rows = 0;
        let summary = controller.run_with(&mut sim, &target, |report| rows += report.collision_rows).unwrap();
        assert_eq!(rows, 0);
        assert_eq!(summary.faulted_ticks, 0);
        // Still measured, only without rows
        let min_distance = summary.min_distance.unwrap();
        assert!(min_distance > 0.3, "closest {}", min_distance);
    }
}
