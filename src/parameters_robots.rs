//! Hardcoded kinematic parameters for a few robots

pub mod mdh_kinematics {
    use std::f64::consts::PI;
    use nalgebra::{Translation3, UnitQuaternion};
    use crate::kinematic_traits::Pose;
    use crate::parameters::mdh_kinematics::{MdhLink, Parameters};

    /// Ready configuration of the Panda, away from singularities and joint limits.
    pub const PANDA_READY: [f64; 7] = [0.0, -0.3, 0.0, -2.2, 0.0, 2.0, PI / 4.0];

    #[allow(dead_code)]
    impl Parameters {
        /// Franka Emika Panda, 7 joints, with the flange and the standard hand.
        pub fn panda() -> Self {
            Parameters {
                links: vec![
                    MdhLink::new(0.0, 0.333, 0.0),
                    MdhLink::new(0.0, 0.0, -PI / 2.0),
                    MdhLink::new(0.0, 0.316, PI / 2.0),
                    MdhLink::new(0.0825, 0.0, PI / 2.0),
                    MdhLink::new(-0.0825, 0.384, -PI / 2.0),
                    MdhLink::new(0.0, 0.0, PI / 2.0),
                    MdhLink::new(0.088, 0.0, PI / 2.0),
                ],
                // Flange at 0.107, hand center point 0.1034 further, hand rotated -45°
                tool: Pose::from_parts(
                    Translation3::new(0.0, 0.0, 0.107 + 0.1034),
                    UnitQuaternion::from_euler_angles(0.0, 0.0, -PI / 4.0),
                ),
                from: vec![-2.8973, -1.7628, -2.8973, -3.0718, -2.8973, -0.0175, -2.8973],
                to: vec![2.8973, 1.7628, 2.8973, -0.0698, 2.8973, 3.7525, 2.8973],
                velocity_limits: vec![2.1750, 2.1750, 2.1750, 2.1750, 2.6100, 2.6100, 2.6100],
            }
        }

        /// Planar arm with three joints rotating about the world z axis, links of 1 meter.
        /// Handy for checking the math by hand.
        pub fn planar_3r() -> Self {
            Parameters {
                links: vec![
                    MdhLink::new(0.0, 0.0, 0.0),
                    MdhLink::new(1.0, 0.0, 0.0),
                    MdhLink::new(1.0, 0.0, 0.0),
                ],
                tool: Pose::from_parts(Translation3::new(1.0, 0.0, 0.0), UnitQuaternion::identity()),
                from: vec![-PI; 3],
                to: vec![PI; 3],
                velocity_limits: vec![1.0; 3],
            }
        }
    }
}
