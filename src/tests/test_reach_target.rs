#[cfg(test)]
mod tests {
    use nalgebra::Vector3;
    use crate::config::ControllerConfig;
    use crate::controller::ControlState;
    use crate::servo::pose_error;
    use crate::simulation::Simulation;
    use crate::tests::test_utils::{controller, offset_pose, ready_simulation, tool_pose};

    #[test]
    fn test_reaches_target_without_obstacles() {
        let mut sim = ready_simulation();
        let mut controller = controller(ControllerConfig::default());
        let start = tool_pose(controller.robot(), &sim);
        let target = offset_pose(&start, Vector3::new(0.0, 0.3, 0.0), 0.5);

        let mut arrivals = 0;
        let mut faults = 0;
        let summary = controller.run_with(&mut sim, &target, |report| {
            if report.state == ControlState::Arrived {
                arrivals += 1;
            }
            if report.fault.is_some() {
                faults += 1;
            }
            assert_eq!(report.joint_rows, 7);
            assert_eq!(report.collision_rows, 0);
            assert!(report.command.iter().all(|v| v.is_finite()));
        }).unwrap();

        assert_eq!(summary.state, ControlState::Arrived, "final error {}", summary.final_error);
        assert_eq!(arrivals, 1);
        assert_eq!(faults, 0);
        assert!(summary.ticks < 1000);
        assert!(summary.min_distance.is_none());

        let reached = tool_pose(controller.robot(), &sim);
        let remaining = pose_error(&reached, &target);
        assert!(remaining.iter().map(|e| e.abs()).sum::<f64>() < 0.01);
        let limits = controller.robot().kinematics.joint_limits();
        assert!(limits.compliant(sim.joint_positions()));
    }

    #[test]
    fn test_reaches_demo_target() {
        // The target of the demo scene: 0.3 m away and turned by 0.5 rad
        let mut sim = ready_simulation();
        let mut controller = controller(ControllerConfig::default());
        let start = tool_pose(controller.robot(), &sim);
        let target = offset_pose(&start, Vector3::new(0.2, 0.2, 0.1), 0.5);

        let mut stalled = 0;
        let summary = controller.run_with(&mut sim, &target, |report| {
            if report.state == ControlState::Tracking && report.command.norm() < 1e-4 {
                stalled += 1;
            }
        }).unwrap();

        assert_eq!(summary.state, ControlState::Arrived, "final error {}", summary.final_error);
        assert_eq!(summary.faulted_ticks, 0);
        assert_eq!(stalled, 0);
        assert!(summary.final_error < controller.config().arrival_threshold);
    }

    #[test]
    fn test_commands_respect_velocity_limits() {
        let mut sim = ready_simulation();
        let mut config = ControllerConfig::default();
        config.max_ticks = 40;
        let mut controller = controller(config);
        let start = tool_pose(controller.robot(), &sim);
        let target = offset_pose(&start, Vector3::new(0.0, -0.3, -0.1), -0.5);
        let limits = controller.robot().kinematics.joint_velocity_limits();

        controller.run_with(&mut sim, &target, |report| {
            for (qd, limit) in report.command.iter().zip(limits.iter()) {
                assert!(qd.abs() <= limit + 1e-6, "{} exceeds {}", qd, limit);
            }
        }).unwrap();
    }

    #[test]
    fn test_error_decreases_early_on() {
        let mut sim = ready_simulation();
        let mut config = ControllerConfig::default();
        config.max_ticks = 20;
        let mut controller = controller(config);
        let start = tool_pose(controller.robot(), &sim);
        let target = offset_pose(&start, Vector3::new(0.1, 0.1, 0.0), 0.0);

        let mut errors = Vec::new();
        controller.run_with(&mut sim, &target, |report| errors.push(report.error)).unwrap();
        assert_eq!(errors.len(), 20);
        assert!(errors[19] < errors[0] * 0.7);
        assert_eq!(sim.time(), controller.config().tick * 20);
    }
}
