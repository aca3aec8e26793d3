//! Helper functions

use nalgebra::Isometry3;
use crate::kinematic_traits::Joints;

/// Checks if all elements are finite. Commands are only applied to the robot if they are.
pub fn is_valid(qs: &Joints) -> bool {
    qs.iter().all(|&q| q.is_finite())
}

/// Allows to specify joint values in degrees (converts to radians)
pub fn as_radians(degrees: &[f64]) -> Joints {
    Joints::from_iterator(degrees.len(), degrees.iter().map(|d| d.to_radians()))
}

/// Format joint values, converting radians to degrees.
pub fn format_joints(joints: &Joints) -> String {
    let row: Vec<String> = joints.iter()
        .map(|q| format!("{:5.2}", q.to_degrees()))
        .collect();
    format!("[{}]", row.join(" "))
}

/// Print joint values, converting radians to degrees.
pub fn dump_joints(joints: &Joints) {
    println!("{}", format_joints(joints));
}

pub fn dump_pose(isometry: &Isometry3<f64>) {
    let translation = isometry.translation.vector;
    let rotation = isometry.rotation;
    println!(
        "x: {:.5}, y: {:.5}, z: {:.5},  quat: {:.5},{:.5},{:.5},{:.5}",
        translation.x, translation.y, translation.z, rotation.i, rotation.j, rotation.k, rotation.w
    );
}
