//! Velocity damper, the inequality row shared by joint limit and collision avoidance.
//!
//! For a monitored distance `d` with safety margin `ps` and influence margin `pi` the damper
//! produces the constraint
//!
//! ```text
//!   a · x <= gain * (d - ps) / (pi - ps)
//! ```
//!
//! where `a · x` is the velocity closing the gap. The cap is zero at `d = ps`, negative when the
//! safety margin is already violated (the gap must open) and no row is produced at all once
//! `d >= pi`.

use nalgebra::{DVectorView, RowDVector};
use crate::control_error::{ControlError, ControlResult};

/// Smallest accepted span between the influence and safety margins.
pub const DAMPER_EPSILON: f64 = 1e-9;

/// One row of the `Ain x <= bin` system.
#[derive(Debug, Clone, PartialEq)]
pub struct DamperRow {
    /// Coefficients over the whole decision variable (joint velocities followed by slack).
    pub coefficients: RowDVector<f64>,
    pub bound: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VelocityDamper {
    /// Minimal distance the monitored gap may shrink to (ps).
    safety: f64,
    /// Distance at which damping begins (pi).
    influence: f64,
    /// Gain on the allowed closing velocity (xi).
    gain: f64,
}

impl VelocityDamper {
    /// Validates the margins. `influence <= safety` is a configuration error.
    pub fn new(safety: f64, influence: f64, gain: f64) -> ControlResult<Self> {
        if !safety.is_finite() || !influence.is_finite() || influence - safety < DAMPER_EPSILON {
            return Err(ControlError::InvalidDamperMargins { safety, influence });
        }
        if !gain.is_finite() || gain <= 0.0 {
            return Err(ControlError::Configuration(format!(
                "damper gain must be positive and finite (got {})", gain
            )));
        }
        Ok(VelocityDamper { safety, influence, gain })
    }

    pub fn safety(&self) -> f64 {
        self.safety
    }

    pub fn influence(&self) -> f64 {
        self.influence
    }

    pub fn gain(&self) -> f64 {
        self.gain
    }

    /// Allowed closing velocity at the given distance, `None` outside the influence zone.
    /// A NaN distance is treated as touching the safety margin (closing velocity zero).
    pub fn bound(&self, distance: f64) -> Option<f64> {
        if distance.is_nan() {
            return Some(0.0);
        }
        if distance >= self.influence {
            return None;
        }
        let span = (self.influence - self.safety).max(DAMPER_EPSILON);
        Some(self.gain * (distance - self.safety) / span)
    }

    /// Builds the damper row. `approach` maps joint velocities to the closing velocity
    /// (its length is the number of joints); `width` is the total number of decision variables,
    /// the columns past the joints (slack) are left zero. `offset` is added to the bound and
    /// accounts for the velocity of the other side (moving obstacle).
    pub fn row(&self, distance: f64, approach: DVectorView<f64>, offset: f64, width: usize) -> Option<DamperRow> {
        let bound = self.bound(distance)?;
        let mut coefficients = RowDVector::zeros(width);
        let joints = approach.len().min(width);
        for j in 0..joints {
            coefficients[j] = approach[j];
        }
        Some(DamperRow { coefficients, bound: bound + offset })
    }
}
