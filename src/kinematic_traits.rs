//! Kinematics provider interface used by the controller

extern crate nalgebra as na;

use na::{DMatrix, DVector, Isometry3, Matrix3, Point3};
use crate::constraints::JointLimits;

/// Pose is used a pose of the robot flange or any of its links. It contains both
/// Cartesian position and rotation quaternion.
/// ```
/// extern crate nalgebra as na;
/// use na::{Isometry3, Translation3, UnitQuaternion, Vector3};
///
/// type Pose = Isometry3<f64>;
///
/// let translation = Translation3::new(1.0, 0.0, 0.0);
/// // The quaternion should be normalized to represent a valid rotation.
/// let rotation = UnitQuaternion::from_quaternion(na::Quaternion::new(1.0, 0.0, 0.0, 1.0).normalize());
/// let transform = Pose::from_parts(translation, rotation);
/// ```
pub type Pose = Isometry3<f64>;

/// Joint positions (or velocities) of a manipulator with any number of joints.
pub type Joints = DVector<f64>;

/// Kinematic model of a serial manipulator. Everything here is a pure function of the joint
/// configuration passed in; the robot state itself lives in the simulation.
pub trait Kinematics: Send + Sync {
    /// Number of controlled joints (n).
    fn dof(&self) -> usize;

    /// Pose of the end effector (tool center point) in the world frame.
    fn forward(&self, qs: &Joints) -> Pose;

    /// World frame of every joint, index i is the frame rotating with joint i.
    /// The returned vector has `dof()` entries.
    fn link_poses(&self, qs: &Joints) -> Vec<Pose>;

    /// 6×n Jacobian in the world frame, linear rows first.
    fn jacobian_world(&self, qs: &Joints) -> DMatrix<f64>;

    /// 3×n Jacobian of the linear velocity of a world point rigidly attached to `link`.
    /// Only joints up to and including `link` move the point; later columns are zero.
    fn jacobian_point(&self, qs: &Joints, link: usize, point: &Point3<f64>) -> DMatrix<f64>;

    /// Manipulability gradient (1×n, returned as a column vector).
    fn jacobian_manipulability(&self, qs: &Joints) -> DVector<f64>;

    /// Maximal joint speed per joint (symmetric).
    fn joint_velocity_limits(&self) -> DVector<f64>;

    /// Position limits per joint.
    fn joint_limits(&self) -> &JointLimits;

    /// 6×n Jacobian expressed in the end effector frame.
    fn jacobian_body(&self, qs: &Joints) -> DMatrix<f64> {
        let rotation = self.forward(qs).rotation.to_rotation_matrix();
        to_body_frame(&self.jacobian_world(qs), rotation.matrix())
    }
}

/// Rotate the world Jacobian into the frame with the given world orientation.
pub fn to_body_frame(world: &DMatrix<f64>, rotation: &Matrix3<f64>) -> DMatrix<f64> {
    let inverse = rotation.transpose();
    let mut body = DMatrix::zeros(6, world.ncols());
    body.rows_mut(0, 3).copy_from(&(inverse * world.fixed_rows::<3>(0)));
    body.rows_mut(3, 3).copy_from(&(inverse * world.fixed_rows::<3>(3)));
    body
}
