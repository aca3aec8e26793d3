//! Forward kinematics and Jacobians of a serial chain of revolute joints

use nalgebra::{DMatrix, DVector, Isometry3, Point3, Translation3, UnitQuaternion, Vector3};
use crate::constraints::JointLimits;
use crate::control_error::{ControlError, ControlResult};
use crate::jacobian::compute_manipulability_jacobian;
use crate::kinematic_traits::{Joints, Kinematics, Pose};
use crate::parameters::mdh_kinematics::{MdhLink, Parameters};

/// Step used for the numerical manipulability gradient.
const MANIPULABILITY_EPSILON: f64 = 1e-6;

#[derive(Debug, Clone)]
pub struct SerialChain {
    links: Vec<MdhLink>,
    tool: Pose,
    base: Pose,
    limits: JointLimits,
    velocity_limits: DVector<f64>,
}

impl SerialChain {
    /// Creates a new `SerialChain` with the given parameters, placed at the world origin.
    pub fn new(parameters: Parameters) -> ControlResult<Self> {
        let n = parameters.dof();
        if n == 0 {
            return Err(ControlError::Configuration("serial chain without joints".into()));
        }
        if parameters.velocity_limits.len() != n {
            return Err(ControlError::DimensionMismatch {
                what: "velocity limits", expected: n, found: parameters.velocity_limits.len(),
            });
        }
        if parameters.from.len() != n {
            return Err(ControlError::DimensionMismatch {
                what: "joint limits", expected: n, found: parameters.from.len(),
            });
        }
        for (i, &limit) in parameters.velocity_limits.iter().enumerate() {
            if !limit.is_finite() || limit <= 0.0 {
                return Err(ControlError::Configuration(format!(
                    "velocity limit of joint {} must be positive (got {})", i, limit
                )));
            }
        }
        let limits = JointLimits::new(parameters.from, parameters.to)?;
        Ok(SerialChain {
            links: parameters.links,
            tool: parameters.tool,
            base: Isometry3::identity(),
            limits,
            velocity_limits: DVector::from_vec(parameters.velocity_limits),
        })
    }

    /// Places the robot at the given location in the world.
    pub fn with_base(mut self, base: Pose) -> Self {
        self.base = base;
        self
    }

    pub fn links(&self) -> &[MdhLink] {
        &self.links
    }

    pub fn tool(&self) -> &Pose {
        &self.tool
    }

    /// Joint frames followed by the tool center point, all in the world frame.
    fn frames(&self, qs: &Joints) -> (Vec<Pose>, Pose) {
        let mut frames = Vec::with_capacity(self.links.len());
        let mut pose = self.base;
        for (link, &q) in self.links.iter().zip(qs.iter()) {
            pose *= link_transform(link, q);
            frames.push(pose);
        }
        (frames, pose * self.tool)
    }
}

/// `Rx(alpha) * Tx(a) * Rz(q + offset) * Tz(d)`
fn link_transform(link: &MdhLink, q: f64) -> Pose {
    Isometry3::from_parts(Translation3::identity(), UnitQuaternion::from_euler_angles(link.alpha, 0.0, 0.0))
        * Isometry3::from_parts(Translation3::new(link.a, 0.0, 0.0), UnitQuaternion::identity())
        * Isometry3::from_parts(Translation3::identity(), UnitQuaternion::from_euler_angles(0.0, 0.0, q + link.offset))
        * Isometry3::from_parts(Translation3::new(0.0, 0.0, link.d), UnitQuaternion::identity())
}

/// Axis and origin of the joint rotating with the given frame.
fn axis_and_origin(frame: &Pose) -> (Vector3<f64>, Vector3<f64>) {
    (frame.rotation * Vector3::z(), frame.translation.vector)
}

impl Kinematics for SerialChain {
    fn dof(&self) -> usize {
        self.links.len()
    }

    fn forward(&self, qs: &Joints) -> Pose {
        self.frames(qs).1
    }

    fn link_poses(&self, qs: &Joints) -> Vec<Pose> {
        self.frames(qs).0
    }

    fn jacobian_world(&self, qs: &Joints) -> DMatrix<f64> {
        let (frames, tcp) = self.frames(qs);
        let p = tcp.translation.vector;
        let mut jacobian = DMatrix::zeros(6, self.dof());
        for (i, frame) in frames.iter().enumerate() {
            let (z, o) = axis_and_origin(frame);
            jacobian.fixed_view_mut::<3, 1>(0, i).copy_from(&z.cross(&(p - o)));
            jacobian.fixed_view_mut::<3, 1>(3, i).copy_from(&z);
        }
        jacobian
    }

    fn jacobian_point(&self, qs: &Joints, link: usize, point: &Point3<f64>) -> DMatrix<f64> {
        let frames = self.link_poses(qs);
        let mut jacobian = DMatrix::zeros(3, self.dof());
        for (i, frame) in frames.iter().enumerate().take(link + 1) {
            let (z, o) = axis_and_origin(frame);
            jacobian.fixed_view_mut::<3, 1>(0, i).copy_from(&z.cross(&(point.coords - o)));
        }
        jacobian
    }

    fn jacobian_manipulability(&self, qs: &Joints) -> DVector<f64> {
        compute_manipulability_jacobian(self, qs, MANIPULABILITY_EPSILON)
    }

    fn joint_velocity_limits(&self) -> DVector<f64> {
        self.velocity_limits.clone()
    }

    fn joint_limits(&self) -> &JointLimits {
        &self.limits
    }
}
