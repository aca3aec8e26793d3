//! Controller configuration, its validation and (optionally) loading from YAML.
//!
//! ```yaml
//! controller:
//!   joint_velocity_gain: 0.01
//!   manipulability_gain: 0.01
//!   servo_gain: 1.0
//!   arrival_threshold: 0.01
//!   slack_bound: 10.0
//!   error_floor: 0.000001
//!   tick_ms: 50
//!   max_ticks: 1000
//! joint_damper:
//!   safety: deg(2.8648)
//!   influence: 0.9
//!   gain: 1.0
//! collision_damper:
//!   safety: 0.05
//!   influence: 0.3
//!   gain: 1.0
//! ```
//!
//! All keys are optional, missing ones keep their defaults. Joint damper margins are angles and
//! may be written as `deg(x)`.

use std::time::Duration;
use crate::control_error::{ControlError, ControlResult};
use crate::velocity_damper::VelocityDamper;

/// Margins and gain of one velocity damper, unvalidated.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DamperConfig {
    pub safety: f64,
    pub influence: f64,
    pub gain: f64,
}

impl DamperConfig {
    pub fn build(&self) -> ControlResult<VelocityDamper> {
        VelocityDamper::new(self.safety, self.influence, self.gain)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ControllerConfig {
    /// Weight γ of the joint velocities in the objective.
    pub joint_velocity_gain: f64,
    /// Weight λ of the manipulability gradient, projected into the null space of the Jacobian.
    /// Zero disables it.
    pub manipulability_gain: f64,
    /// Proportional gain of the servo law.
    pub servo_gain: f64,
    /// Scalar pose error below which the target counts as reached.
    pub arrival_threshold: f64,
    /// Joint limit damper, margins in radians.
    pub joint_damper: DamperConfig,
    /// Collision damper, margins in meters.
    pub collision_damper: DamperConfig,
    /// Symmetric bound on each slack variable.
    pub slack_bound: f64,
    /// Smallest pose error used for the slack weight `1 / e`.
    pub error_floor: f64,
    /// Simulated time per tick.
    pub tick: Duration,
    /// Ticks after which the controller gives up.
    pub max_ticks: usize,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        ControllerConfig {
            joint_velocity_gain: 0.01,
            // Equal to γ: the null space velocity is the projected gradient itself
            manipulability_gain: 0.01,
            servo_gain: 1.0,
            arrival_threshold: 0.01,
            joint_damper: DamperConfig { safety: 0.05, influence: 0.9, gain: 1.0 },
            collision_damper: DamperConfig { safety: 0.05, influence: 0.3, gain: 1.0 },
            slack_bound: 10.0,
            error_floor: 1e-6,
            tick: Duration::from_millis(50),
            max_ticks: 1000,
        }
    }
}

fn positive(name: &str, value: f64) -> ControlResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ControlError::Configuration(format!("{} must be positive and finite (got {})", name, value)))
    }
}

impl ControllerConfig {
    /// Rejects invalid damper margins, non-positive or non-finite gains and an empty tick budget.
    pub fn validate(&self) -> ControlResult<()> {
        self.joint_damper.build()?;
        self.collision_damper.build()?;
        positive("joint_velocity_gain", self.joint_velocity_gain)?;
        if !(self.manipulability_gain.is_finite() && self.manipulability_gain >= 0.0) {
            return Err(ControlError::Configuration(format!(
                "manipulability_gain must be non-negative and finite (got {})", self.manipulability_gain)));
        }
        positive("servo_gain", self.servo_gain)?;
        positive("arrival_threshold", self.arrival_threshold)?;
        positive("slack_bound", self.slack_bound)?;
        positive("error_floor", self.error_floor)?;
        if self.tick.is_zero() {
            return Err(ControlError::Configuration("tick duration must not be zero".into()));
        }
        if self.max_ticks == 0 {
            return Err(ControlError::Configuration("max_ticks must not be zero".into()));
        }
        Ok(())
    }

    /// Tick duration in seconds.
    pub fn dt(&self) -> f64 {
        self.tick.as_secs_f64()
    }
}

#[cfg(feature = "allow_filesystem")]
mod from_file {
    use std::path::Path;
    use std::time::Duration;
    use regex::Regex;
    use yaml_rust2::{Yaml, YamlLoader};
    use crate::control_error::{ControlError, ControlResult};
    use super::{ControllerConfig, DamperConfig};

    /// Parses `deg(x)` (degrees) or a plain number (radians).
    pub(crate) fn parse_angle(value: &str) -> ControlResult<f64> {
        let re = Regex::new(r"^deg\(\s*(-?\d+(\.\d+)?)\s*\)$")
            .map_err(|_| ControlError::ParseError("Invalid regex pattern".to_string()))?;

        if let Some(caps) = re.captures(value.trim()) {
            let degrees_str = caps.get(1)
                .ok_or(ControlError::WrongAngle(format!("Bad representation: {}", value)))?
                .as_str();
            let degrees: f64 = degrees_str.parse()
                .map_err(|_| ControlError::WrongAngle(value.to_string()))?;
            Ok(degrees.to_radians())
        } else {
            value.trim().parse()
                .map_err(|_| ControlError::WrongAngle(value.to_string()))
        }
    }

    fn number(node: &Yaml, key: &str) -> ControlResult<Option<f64>> {
        match &node[key] {
            Yaml::BadValue | Yaml::Null => Ok(None),
            Yaml::Integer(i) => Ok(Some(*i as f64)),
            Yaml::Real(_) => node[key].as_f64().map(Some)
                .ok_or_else(|| ControlError::ParseError(format!("{} is not a number", key))),
            other => Err(ControlError::ParseError(format!("{} is not a number: {:?}", key, other))),
        }
    }

    fn angle(node: &Yaml, key: &str) -> ControlResult<Option<f64>> {
        match &node[key] {
            Yaml::String(s) => parse_angle(s).map(Some),
            _ => number(node, key),
        }
    }

    fn count(node: &Yaml, key: &str) -> ControlResult<Option<u64>> {
        match &node[key] {
            Yaml::BadValue | Yaml::Null => Ok(None),
            Yaml::Integer(i) if *i >= 0 => Ok(Some(*i as u64)),
            other => Err(ControlError::ParseError(
                format!("{} must be a non-negative integer: {:?}", key, other))),
        }
    }

    fn damper(node: &Yaml, defaults: DamperConfig, angular: bool) -> ControlResult<DamperConfig> {
        let margin = |key: &str| if angular { angle(node, key) } else { number(node, key) };
        Ok(DamperConfig {
            safety: margin("safety")?.unwrap_or(defaults.safety),
            influence: margin("influence")?.unwrap_or(defaults.influence),
            gain: number(node, "gain")?.unwrap_or(defaults.gain),
        })
    }

    impl ControllerConfig {
        /// Reads the configuration from a YAML string and validates it.
        pub fn from_yaml_str(contents: &str) -> ControlResult<Self> {
            let docs = YamlLoader::load_from_str(contents)
                .map_err(|e| ControlError::ParseError(e.to_string()))?;
            let defaults = ControllerConfig::default();
            let Some(doc) = docs.first() else {
                return Ok(defaults);
            };

            let controller = &doc["controller"];
            let config = ControllerConfig {
                joint_velocity_gain: number(controller, "joint_velocity_gain")?
                    .unwrap_or(defaults.joint_velocity_gain),
                manipulability_gain: number(controller, "manipulability_gain")?
                    .unwrap_or(defaults.manipulability_gain),
                servo_gain: number(controller, "servo_gain")?.unwrap_or(defaults.servo_gain),
                arrival_threshold: number(controller, "arrival_threshold")?
                    .unwrap_or(defaults.arrival_threshold),
                slack_bound: number(controller, "slack_bound")?.unwrap_or(defaults.slack_bound),
                error_floor: number(controller, "error_floor")?.unwrap_or(defaults.error_floor),
                tick: count(controller, "tick_ms")?.map(Duration::from_millis).unwrap_or(defaults.tick),
                max_ticks: count(controller, "max_ticks")?.map(|t| t as usize).unwrap_or(defaults.max_ticks),
                joint_damper: damper(&doc["joint_damper"], defaults.joint_damper, true)?,
                collision_damper: damper(&doc["collision_damper"], defaults.collision_damper, false)?,
            };
            config.validate()?;
            Ok(config)
        }

        /// Read the controller configuration from YAML file. See the module documentation
        /// for the layout.
        pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> ControlResult<Self> {
            let contents = std::fs::read_to_string(path)?;
            Self::from_yaml_str(&contents)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = ControllerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.dt(), 0.05);
        assert_eq!(config.collision_damper.influence, 0.3);
    }

    #[test]
    fn test_inverted_margins_rejected() {
        let mut config = ControllerConfig::default();
        config.joint_damper.influence = 0.01;
        assert!(matches!(config.validate(), Err(ControlError::InvalidDamperMargins { .. })));
    }

    #[test]
    fn test_bad_values_rejected() {
        let mut config = ControllerConfig::default();
        config.servo_gain = f64::NAN;
        assert!(matches!(config.validate(), Err(ControlError::Configuration(_))));

        let mut config = ControllerConfig::default();
        config.manipulability_gain = -1.0;
        assert!(matches!(config.validate(), Err(ControlError::Configuration(_))));

        let mut config = ControllerConfig::default();
        config.manipulability_gain = 0.0;
        assert!(config.validate().is_ok());

        let mut config = ControllerConfig::default();
        config.max_ticks = 0;
        assert!(config.validate().is_err());

        let mut config = ControllerConfig::default();
        config.tick = Duration::ZERO;
        assert!(config.validate().is_err());
    }

    #[cfg(feature = "allow_filesystem")]
    #[test]
    fn test_parse_angle() {
        use super::from_file::parse_angle;
        assert!((parse_angle("deg(90)").unwrap() - std::f64::consts::FRAC_PI_2).abs() < 1e-12);
        assert!((parse_angle("deg( -45.5 )").unwrap() + 45.5_f64.to_radians()).abs() < 1e-12);
        assert_eq!(parse_angle("0.25").unwrap(), 0.25);
        assert!(matches!(parse_angle("rad(1)"), Err(ControlError::WrongAngle(_))));
    }
}
