//! Proportional servo law toward a target pose

use nalgebra::Vector6;
use crate::kinematic_traits::Pose;

/// Output of the servo law for one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ServoOutput {
    /// Desired spatial velocity of the end effector, in the end effector frame, linear first.
    pub velocity: Vector6<f64>,
    /// Pose error in the end effector frame: translation, then rotation as scaled axis.
    pub error_vector: Vector6<f64>,
    /// Scalar error e, sum of absolute values of the error vector (meters plus radians).
    pub error: f64,
    pub arrived: bool,
}

/// Pose error of `target` seen from `current`, expressed in the `current` frame.
pub fn pose_error(current: &Pose, target: &Pose) -> Vector6<f64> {
    let relative = current.inverse() * target;
    let t = relative.translation.vector;
    let r = relative.rotation.scaled_axis();
    Vector6::new(t.x, t.y, t.z, r.x, r.y, r.z)
}

/// Proportional servo: `v = gain * e`. Arrival is declared once the scalar error drops below
/// the threshold.
pub fn p_servo(current: &Pose, target: &Pose, gain: f64, threshold: f64) -> ServoOutput {
    let error_vector = pose_error(current, target);
    let error = error_vector.iter().map(|e| e.abs()).sum::<f64>();
    ServoOutput {
        velocity: error_vector * gain,
        error_vector,
        error,
        arrived: error < threshold,
    }
}
