//! Numerical Jacobians and the manipulability measure

extern crate nalgebra as na;
use na::{DMatrix, DVector};
use rayon::prelude::*;
use crate::kinematic_traits::{Joints, Kinematics};

/// Yoshikawa manipulability `sqrt(det(J Jᵀ))` of the given Jacobian. Zero in a singularity.
pub fn manipulability(jacobian: &DMatrix<f64>) -> f64 {
    let jjt = jacobian * jacobian.transpose();
    jjt.determinant().max(0.0).sqrt()
}

/// Gradient of the manipulability with respect to the joint positions, by central differences.
///
/// # Arguments
///
/// * `robot` - A reference to the robot implementing the Kinematics trait
/// * `qs` - A reference to the joint configuration
/// * `epsilon` - A small value used for numerical differentiation
///
/// # Returns
///
/// n-vector, the transposed 1×n manipulability Jacobian
pub fn compute_manipulability_jacobian(robot: &(impl Kinematics + ?Sized), qs: &Joints, epsilon: f64) -> DVector<f64> {
    // Parallelize the loop using rayon
    let columns: Vec<f64> = (0..robot.dof()).into_par_iter().map(|i| {
        let mut ahead = qs.clone();
        let mut behind = qs.clone();
        ahead[i] += epsilon;
        behind[i] -= epsilon;
        let m_ahead = manipulability(&robot.jacobian_world(&ahead));
        let m_behind = manipulability(&robot.jacobian_world(&behind));
        (m_ahead - m_behind) / (2.0 * epsilon)
    }).collect();

    DVector::from_vec(columns)
}

/// Function to compute the world Jacobian matrix for a given robot and joint configuration
/// by perturbing each joint in turn.
///
/// # Returns
///
/// A 6×n matrix, linear velocity rows first, then angular velocity.
pub fn compute_jacobian(robot: &(impl Kinematics + ?Sized), joints: &Joints, epsilon: f64) -> DMatrix<f64> {
    let n = robot.dof();
    let mut jacobian = DMatrix::zeros(6, n);
    let current_pose = robot.forward(joints);
    let current_position = current_pose.translation.vector;
    let current_orientation = current_pose.rotation;

    // Parallelize the loop using rayon
    let jacobian_columns: Vec<_> = (0..n).into_par_iter().map(|i| {
        let mut perturbed_qs = joints.clone();
        perturbed_qs[i] += epsilon;
        let perturbed_pose = robot.forward(&perturbed_qs);
        let perturbed_position = perturbed_pose.translation.vector;
        let perturbed_orientation = perturbed_pose.rotation;

        let delta_position = (perturbed_position - current_position) / epsilon;
        let delta_orientation = (perturbed_orientation * current_orientation.inverse()).scaled_axis() / epsilon;

        (delta_position, delta_orientation)
    }).collect();

    for (i, (delta_position, delta_orientation)) in jacobian_columns.into_iter().enumerate() {
        jacobian.fixed_view_mut::<3, 1>(0, i).copy_from(&delta_position);
        jacobian.fixed_view_mut::<3, 1>(3, i).copy_from(&delta_orientation);
    }

    jacobian
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kinematics_impl::SerialChain;
    use crate::parameters::mdh_kinematics::Parameters;
    use crate::parameters_robots::mdh_kinematics::PANDA_READY;

    const EPSILON: f64 = 1e-6;

    #[test]
    fn test_manipulability_of_identity() {
        let jacobian = DMatrix::<f64>::identity(6, 7);
        assert!((manipulability(&jacobian) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_manipulability_singular() {
        // Two identical columns in a 2-dof planar case, rank deficient
        let jacobian = DMatrix::from_row_slice(2, 2, &[1.0, 1.0, 0.0, 0.0]);
        assert!(manipulability(&jacobian).abs() < 1e-12);
    }

    #[test]
    fn test_manipulability_gradient_points_uphill() {
        let robot = SerialChain::new(Parameters::panda()).unwrap();
        let qs = DVector::from_row_slice(&PANDA_READY);
        let gradient = compute_manipulability_jacobian(&robot, &qs, EPSILON);
        assert_eq!(gradient.len(), 7);
        assert!(gradient.iter().all(|g| g.is_finite()));

        // A small step along the gradient must not decrease manipulability
        let before = manipulability(&robot.jacobian_world(&qs));
        let step = 1e-3 / gradient.norm().max(1e-12);
        let after = manipulability(&robot.jacobian_world(&(&qs + &gradient * step)));
        assert!(after >= before, "{} < {}", after, before);
    }

    #[test]
    fn test_first_joint_does_not_change_manipulability() {
        // Rotating the whole arm about the base axis keeps the shape of the arm
        let robot = SerialChain::new(Parameters::panda()).unwrap();
        let qs = DVector::from_row_slice(&PANDA_READY);
        let gradient = compute_manipulability_jacobian(&robot, &qs, EPSILON);
        assert!(gradient[0].abs() < 1e-6);
    }
}
