//! Joint position limits and their velocity damper rows

use nalgebra::{DMatrix, DVector};
use crate::control_error::{ControlError, ControlResult};
use crate::kinematic_traits::Joints;
use crate::velocity_damper::VelocityDamper;

#[derive(Debug, Clone)]
pub struct JointLimits {
    /// Lower limit per joint, radians
    pub from: DVector<f64>,

    /// Upper limit per joint, radians. Must be above the lower limit.
    pub to: DVector<f64>,
}

impl JointLimits {
    pub fn new(from: Vec<f64>, to: Vec<f64>) -> ControlResult<Self> {
        if from.len() != to.len() {
            return Err(ControlError::DimensionMismatch {
                what: "joint limits", expected: from.len(), found: to.len(),
            });
        }
        for (i, (lower, upper)) in from.iter().zip(to.iter()).enumerate() {
            if !lower.is_finite() || !upper.is_finite() || lower >= upper {
                return Err(ControlError::Configuration(format!(
                    "joint {} limits [{}, {}] are not a valid range", i, lower, upper
                )));
            }
        }
        Ok(JointLimits {
            from: DVector::from_vec(from),
            to: DVector::from_vec(to),
        })
    }

    pub fn len(&self) -> usize {
        self.from.len()
    }

    pub fn is_empty(&self) -> bool {
        self.from.is_empty()
    }

    pub fn compliant(&self, angles: &Joints) -> bool {
        angles.len() == self.len()
            && angles.iter().enumerate()
            .all(|(i, &q)| q >= self.from[i] && q <= self.to[i])
    }

    /// Distance from the joint value to the lower and upper limit. Negative if already outside.
    pub fn distances(&self, angles: &Joints, joint: usize) -> (f64, f64) {
        (angles[joint] - self.from[joint], self.to[joint] - angles[joint])
    }

    /// One damper row per joint over `width` decision variables. A joint within the influence
    /// zone of a limit gets `-q̇ <= bound` (lower limit) or `q̇ <= bound` (upper limit), the
    /// nearer limit wins if both are close. Joints outside the influence zone get a zero row
    /// with zero bound, so the block always has exactly `n` rows.
    pub fn damper_rows(&self, angles: &Joints, damper: &VelocityDamper, width: usize)
                       -> ControlResult<(DMatrix<f64>, DVector<f64>)> {
        let n = self.len();
        if angles.len() != n {
            return Err(ControlError::DimensionMismatch {
                what: "joint positions", expected: n, found: angles.len(),
            });
        }
        if width < n {
            return Err(ControlError::DimensionMismatch {
                what: "joint damper width", expected: n, found: width,
            });
        }

        let mut rows = DMatrix::zeros(n, width);
        let mut bounds = DVector::zeros(n);
        for joint in 0..n {
            let (to_lower, to_upper) = self.distances(angles, joint);
            let (distance, direction) = if to_lower <= to_upper {
                (to_lower, -1.0)
            } else {
                (to_upper, 1.0)
            };
            if let Some(bound) = damper.bound(distance) {
                rows[(joint, joint)] = direction;
                bounds[joint] = bound;
            }
        }
        Ok((rows, bounds))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn limits() -> JointLimits {
        JointLimits::new(vec![-PI, -1.0, 0.0], vec![PI, 1.0, 2.0]).unwrap()
    }

    #[test]
    fn test_rejects_bad_ranges() {
        assert!(JointLimits::new(vec![0.0, 1.0], vec![1.0, 0.5]).is_err());
        assert!(JointLimits::new(vec![0.0], vec![1.0, 2.0]).is_err());
        assert!(JointLimits::new(vec![f64::NAN], vec![1.0]).is_err());
    }

    #[test]
    fn test_compliant() {
        let limits = limits();
        assert!(limits.compliant(&DVector::from_vec(vec![0.0, 0.5, 1.0])));
        assert!(!limits.compliant(&DVector::from_vec(vec![0.0, 1.5, 1.0])));
        assert!(!limits.compliant(&DVector::from_vec(vec![0.0, 0.5])));
    }

    #[test]
    fn test_far_from_limits_gives_zero_rows() {
        let damper = VelocityDamper::new(0.05, 0.2, 1.0).unwrap();
        let (rows, bounds) = limits()
            .damper_rows(&DVector::from_vec(vec![0.0, 0.0, 1.0]), &damper, 9).unwrap();
        assert_eq!(rows.shape(), (3, 9));
        assert!(rows.iter().all(|&v| v == 0.0));
        assert!(bounds.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_near_upper_limit() {
        let damper = VelocityDamper::new(0.05, 0.2, 1.0).unwrap();
        let (rows, bounds) = limits()
            .damper_rows(&DVector::from_vec(vec![0.0, 0.9, 1.0]), &damper, 9).unwrap();
        assert_eq!(rows[(1, 1)], 1.0);
        // (0.1 - 0.05) / (0.2 - 0.05)
        assert!((bounds[1] - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_near_lower_limit() {
        let damper = VelocityDamper::new(0.05, 0.2, 1.0).unwrap();
        let (rows, bounds) = limits()
            .damper_rows(&DVector::from_vec(vec![0.0, 0.0, 0.05]), &damper, 9).unwrap();
        assert_eq!(rows[(2, 2)], -1.0);
        assert!(bounds[2].abs() < 1e-12);
    }

    #[test]
    fn test_outside_limit_forces_return() {
        let damper = VelocityDamper::new(0.05, 0.9, 1.0).unwrap();
        let (rows, bounds) = limits()
            .damper_rows(&DVector::from_vec(vec![0.0, 0.0, -0.3]), &damper, 9).unwrap();
        // -q̇ <= negative, i.e. the joint must move up
        assert_eq!(rows[(2, 2)], -1.0);
        assert!(bounds[2] < 0.0);
    }

    #[test]
    fn test_wrong_dimensions() {
        let damper = VelocityDamper::new(0.05, 0.2, 1.0).unwrap();
        assert!(limits().damper_rows(&DVector::from_vec(vec![0.0, 0.0]), &damper, 9).is_err());
        assert!(limits().damper_rows(&DVector::from_vec(vec![0.0, 0.0, 0.0]), &damper, 2).is_err());
    }
}
