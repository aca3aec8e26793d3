//! Assembly of the per-tick quadratic program
//!
//! Decision variable `x = [q̇ (n); δ (6)]`, joint velocities followed by slack.
//!
//! ```text
//!   min  ½ xᵀ Q x + cᵀ x
//!   s.t. Aeq x  = beq        [J_e | I₆] x = v
//!        Ain x <= bin        n joint limit dampers, then one row per close link/obstacle pair
//!        lb <= x <= ub
//! ```
//!
//! The linear term is `c = [-λ N ∇m; 0]`, with `N = I - J_e⁺ J_e` the null space projector of the
//! body Jacobian, so maximizing manipulability never competes with tracking.

use nalgebra::{DMatrix, DVector};
use tracing::debug;
use crate::collisions::ClosestPointRecord;
use crate::config::ControllerConfig;
use crate::control_error::{ControlError, ControlResult};
use crate::kinematic_traits::Joints;
use crate::kinematics_with_shape::KinematicsWithShape;
use crate::obstacles::{ObstacleId, ObstacleSnapshot};
use crate::servo::ServoOutput;
use crate::velocity_damper::{DamperRow, VelocityDamper};

/// Number of slack variables, one per spatial velocity component.
pub const SLACK: usize = 6;

/// Where an inequality row comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowOrigin {
    JointLimit { joint: usize },
    Collision { link: usize, shape: usize, obstacle: ObstacleId },
}

/// Inequality rows stacked into a pre-sized buffer, trimmed on `finish`.
#[derive(Debug, Clone)]
pub struct ConstraintStack {
    rows: DMatrix<f64>,
    bounds: DVector<f64>,
    origins: Vec<RowOrigin>,
}

impl ConstraintStack {
    pub fn with_capacity(capacity: usize, width: usize) -> Self {
        ConstraintStack {
            rows: DMatrix::zeros(capacity, width),
            bounds: DVector::zeros(capacity),
            origins: Vec::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.origins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.origins.is_empty()
    }

    pub fn width(&self) -> usize {
        self.rows.ncols()
    }

    pub fn push(&mut self, origin: RowOrigin, row: &DamperRow) -> ControlResult<()> {
        if row.coefficients.len() != self.width() {
            return Err(ControlError::DimensionMismatch {
                what: "inequality row", expected: self.width(), found: row.coefficients.len(),
            });
        }
        let index = self.origins.len();
        if index == self.rows.nrows() {
            // Capacity estimate was too small, grow rather than lose the row
            let grown = (index * 2).max(1);
            self.rows.resize_vertically_mut(grown, 0.0);
            self.bounds.resize_vertically_mut(grown, 0.0);
        }
        self.rows.row_mut(index).copy_from(&row.coefficients);
        self.bounds[index] = row.bound;
        self.origins.push(origin);
        Ok(())
    }

    pub fn finish(self) -> (DMatrix<f64>, DVector<f64>, Vec<RowOrigin>) {
        let used = self.origins.len();
        (
            self.rows.resize_vertically(used, 0.0),
            self.bounds.resize_vertically(used, 0.0),
            self.origins,
        )
    }
}

/// Complete QP of one tick, handed to the solver unchanged.
#[derive(Debug, Clone)]
pub struct QpProblem {
    pub q: DMatrix<f64>,
    pub c: DVector<f64>,
    pub a_in: DMatrix<f64>,
    pub b_in: DVector<f64>,
    pub a_eq: DMatrix<f64>,
    pub b_eq: DVector<f64>,
    pub lb: DVector<f64>,
    pub ub: DVector<f64>,
    /// Provenance of every `a_in` row.
    pub origins: Vec<RowOrigin>,
    /// Number of joints n, the decision variable has n + 6 entries.
    pub joints: usize,
}

impl QpProblem {
    pub fn width(&self) -> usize {
        self.joints + SLACK
    }

    pub fn joint_limit_rows(&self) -> usize {
        self.origins.iter().filter(|o| matches!(o, RowOrigin::JointLimit { .. })).count()
    }

    pub fn collision_rows(&self) -> usize {
        self.origins.iter().filter(|o| matches!(o, RowOrigin::Collision { .. })).count()
    }

    /// Checks that all shapes agree with each other.
    pub fn validate(&self) -> ControlResult<()> {
        let width = self.width();
        let check = |what: &'static str, expected: usize, found: usize| {
            if expected == found {
                Ok(())
            } else {
                Err(ControlError::DimensionMismatch { what, expected, found })
            }
        };
        check("Q rows", width, self.q.nrows())?;
        check("Q columns", width, self.q.ncols())?;
        check("c", width, self.c.len())?;
        check("Ain columns", width, self.a_in.ncols())?;
        check("bin", self.a_in.nrows(), self.b_in.len())?;
        check("Ain provenance", self.a_in.nrows(), self.origins.len())?;
        check("Aeq rows", SLACK, self.a_eq.nrows())?;
        check("Aeq columns", width, self.a_eq.ncols())?;
        check("beq", SLACK, self.b_eq.len())?;
        check("lb", width, self.lb.len())?;
        check("ub", width, self.ub.len())?;
        Ok(())
    }

    /// True if no entry is NaN or infinite.
    pub fn is_finite(&self) -> bool {
        let finite = |m: &[f64]| m.iter().all(|v| v.is_finite());
        finite(self.q.as_slice()) && finite(self.c.as_slice())
            && finite(self.a_in.as_slice()) && finite(self.b_in.as_slice())
            && finite(self.a_eq.as_slice()) && finite(self.b_eq.as_slice())
            && finite(self.lb.as_slice()) && finite(self.ub.as_slice())
    }
}

/// Singular values below this are treated as zero when projecting into the null space.
const PINV_EPSILON: f64 = 1e-6;

/// Projector `I - J⁺J` onto the null space of `jacobian`.
pub fn null_space_projector(jacobian: &DMatrix<f64>) -> ControlResult<DMatrix<f64>> {
    let n = jacobian.ncols();
    let pseudo_inverse = jacobian.clone().pseudo_inverse(PINV_EPSILON)
        .map_err(|e| ControlError::NumericDegeneracy(format!("Jacobian pseudo-inverse: {}", e)))?;
    Ok(DMatrix::identity(n, n) - pseudo_inverse * jacobian)
}

/// QP together with the diagnostics gathered while building it.
#[derive(Debug, Clone)]
pub struct Assembled {
    pub problem: QpProblem,
    pub closest: Option<ClosestPointRecord>,
}

/// Builds the QP of each tick from the robot state, the servo output and the obstacle snapshot.
#[derive(Debug, Clone)]
pub struct QpAssembler {
    joint_damper: VelocityDamper,
    collision_damper: VelocityDamper,
    joint_velocity_gain: f64,
    manipulability_gain: f64,
    slack_bound: f64,
    error_floor: f64,
}

impl QpAssembler {
    /// Fails with a configuration error for invalid damper margins or gains.
    pub fn new(config: &ControllerConfig) -> ControlResult<Self> {
        config.validate()?;
        Ok(QpAssembler {
            joint_damper: config.joint_damper.build()?,
            collision_damper: config.collision_damper.build()?,
            joint_velocity_gain: config.joint_velocity_gain,
            manipulability_gain: config.manipulability_gain,
            slack_bound: config.slack_bound,
            error_floor: config.error_floor,
        })
    }

    /// Slack weight `1 / e`, with `e` floored to stay finite.
    pub fn slack_weight(&self, error: f64) -> ControlResult<f64> {
        if !error.is_finite() {
            return Err(ControlError::NumericDegeneracy(format!("pose error is {}", error)));
        }
        Ok(1.0 / error.max(self.error_floor))
    }

    pub fn assemble(
        &self,
        robot: &KinematicsWithShape,
        qs: &Joints,
        servo: &ServoOutput,
        obstacles: &[ObstacleSnapshot],
    ) -> ControlResult<Assembled> {
        let kinematics = robot.kinematics.as_ref();
        let n = kinematics.dof();
        let width = n + SLACK;
        if qs.len() != n {
            return Err(ControlError::DimensionMismatch { what: "joint positions", expected: n, found: qs.len() });
        }

        // Objective
        let mut q = DMatrix::identity(width, width);
        q.view_mut((0, 0), (n, n)).scale_mut(self.joint_velocity_gain);
        q.view_mut((n, n), (SLACK, SLACK)).fill_diagonal(self.slack_weight(servo.error)?);

        let jacobian = kinematics.jacobian_body(qs);
        if jacobian.shape() != (SLACK, n) {
            return Err(ControlError::DimensionMismatch {
                what: "body Jacobian columns", expected: n, found: jacobian.ncols(),
            });
        }

        // Manipulability only acts in the null space of J_e and cannot trade off tracking
        let manipulability = kinematics.jacobian_manipulability(qs);
        if manipulability.len() != n {
            return Err(ControlError::DimensionMismatch {
                what: "manipulability Jacobian", expected: n, found: manipulability.len(),
            });
        }
        let gradient = null_space_projector(&jacobian)? * manipulability;
        let mut c = DVector::zeros(width);
        c.rows_mut(0, n).copy_from(&(gradient * -self.manipulability_gain));

        // Equality: [J_e | I] x = v
        let mut a_eq = DMatrix::zeros(SLACK, width);
        a_eq.view_mut((0, 0), (SLACK, n)).copy_from(&jacobian);
        a_eq.view_mut((0, n), (SLACK, SLACK)).fill_with_identity();
        let b_eq = DVector::from_column_slice(servo.velocity.as_slice());

        // Inequalities: joint limits first, then collisions
        let capacity = n + robot.body.colliding_links() * obstacles.len();
        let mut stack = ConstraintStack::with_capacity(capacity, width);
        let (joint_rows, joint_bounds) = kinematics.joint_limits()
            .damper_rows(qs, &self.joint_damper, width)?;
        for joint in 0..n {
            stack.push(RowOrigin::JointLimit { joint }, &DamperRow {
                coefficients: joint_rows.row(joint).into_owned(),
                bound: joint_bounds[joint],
            })?;
        }

        let mut closest = None;
        for proximity in robot.body.proximities(kinematics, qs, obstacles, &self.collision_damper, width) {
            ClosestPointRecord::update(&mut closest, &proximity);
            if let Some(row) = &proximity.row {
                stack.push(RowOrigin::Collision {
                    link: proximity.link,
                    shape: proximity.shape,
                    obstacle: proximity.obstacle,
                }, row)?;
            }
        }
        let (a_in, b_in, origins) = stack.finish();

        // Bounds
        let limits = kinematics.joint_velocity_limits();
        if limits.len() != n {
            return Err(ControlError::DimensionMismatch { what: "velocity limits", expected: n, found: limits.len() });
        }
        let mut ub = DVector::from_element(width, self.slack_bound);
        ub.rows_mut(0, n).copy_from(&limits);
        let lb = -&ub;

        let problem = QpProblem { q, c, a_in, b_in, a_eq, b_eq, lb, ub, origins, joints: n };
        problem.validate()?;
        if !problem.is_finite() {
            return Err(ControlError::NumericDegeneracy("non-finite entry in the QP".into()));
        }
        debug!(rows = problem.a_in.nrows(), collisions = problem.collision_rows(),
            error = servo.error, "QP assembled");
        Ok(Assembled { problem, closest })
    }
}
