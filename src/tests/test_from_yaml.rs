#[cfg(test)]
mod tests {
    use std::time::Duration;
    use crate::config::ControllerConfig;
    use crate::control_error::ControlError;

    const READ_ERROR: &'static str = "Failed to load configuration from file";

    #[test]
    fn test_config_from_yaml_file() {
        let filename = "src/tests/data/controller.yaml";
        let loaded = ControllerConfig::from_yaml_file(filename).expect(READ_ERROR);
        let defaults = ControllerConfig::default();

        assert_eq!(loaded.servo_gain, 0.5);
        assert_eq!(loaded.manipulability_gain, 0.5);
        assert_eq!(loaded.arrival_threshold, 0.02);
        assert_eq!(loaded.tick, Duration::from_millis(20));
        assert_eq!(loaded.max_ticks, 2500);
        assert!((loaded.joint_damper.safety - 5.0_f64.to_radians()).abs() < 1e-12);
        assert!((loaded.joint_damper.influence - 45.0_f64.to_radians()).abs() < 1e-12);
        assert_eq!(loaded.joint_damper.gain, defaults.joint_damper.gain);
        assert_eq!(loaded.collision_damper.safety, 0.08);
        assert_eq!(loaded.collision_damper.influence, 0.4);
        assert_eq!(loaded.collision_damper.gain, 0.5);

        // Not in the file
        assert_eq!(loaded.joint_velocity_gain, defaults.joint_velocity_gain);
        assert_eq!(loaded.slack_bound, defaults.slack_bound);
        assert_eq!(loaded.error_floor, defaults.error_floor);
    }

    #[test]
    fn test_empty_yaml_gives_defaults() {
        let loaded = ControllerConfig::from_yaml_str("").unwrap();
        assert_eq!(loaded, ControllerConfig::default());
    }

    #[test]
    fn test_integers_accepted_as_numbers() {
        let loaded = ControllerConfig::from_yaml_str("controller:\n  servo_gain: 2\n").unwrap();
        assert_eq!(loaded.servo_gain, 2.0);
    }

    #[test]
    fn test_invalid_margins_in_yaml() {
        let yaml = "collision_damper:\n  safety: 0.3\n  influence: 0.1\n";
        assert!(matches!(ControllerConfig::from_yaml_str(yaml),
            Err(ControlError::InvalidDamperMargins { .. })));
    }

    #[test]
    fn test_bad_values_in_yaml() {
        assert!(matches!(ControllerConfig::from_yaml_str("controller:\n  servo_gain: fast\n"),
            Err(ControlError::ParseError(_))));
        assert!(matches!(ControllerConfig::from_yaml_str("joint_damper:\n  safety: grad(5)\n"),
            Err(ControlError::WrongAngle(_))));
        assert!(matches!(ControllerConfig::from_yaml_str("controller:\n  max_ticks: -1\n"),
            Err(ControlError::ParseError(_))));
        assert!(matches!(ControllerConfig::from_yaml_str("controller:\n  manipulability_gain: -0.5\n"),
            Err(ControlError::Configuration(_))));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(ControllerConfig::from_yaml_file("src/tests/data/no_such_file.yaml"),
            Err(ControlError::IoError(_))));
    }
}
