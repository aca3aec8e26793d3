//! Defines the modified Denavit-Hartenberg parameter data structure

pub mod mdh_kinematics {
    use crate::kinematic_traits::Pose;

    /// One revolute joint in modified (Craig) Denavit-Hartenberg convention. The transform from
    /// the previous frame is `Rx(alpha) * Tx(a) * Rz(q + offset) * Tz(d)`.
    #[derive(Debug, Clone, Copy, PartialEq)]
    pub struct MdhLink {
        /// Distance between the previous and this joint axis, along the previous x axis.
        pub a: f64,

        /// Offset along this joint axis.
        pub d: f64,

        /// Twist between the previous and this joint axis, about the previous x axis.
        pub alpha: f64,

        /// Joint angle added to the commanded value, defines the zero position.
        pub offset: f64,
    }

    impl MdhLink {
        pub const fn new(a: f64, d: f64, alpha: f64) -> Self {
            MdhLink { a, d, alpha, offset: 0.0 }
        }
    }

    /// Parameters for the kinematic model of a serial manipulator with revolute joints.
    /// See [parameters_robots.rs](parameters_robots.rs) for a concrete robot model.
    #[derive(Debug, Clone)]
    pub struct Parameters {
        /// One entry per joint, from the base outwards.
        pub links: Vec<MdhLink>,

        /// Fixed transform from the last joint frame to the tool center point.
        pub tool: Pose,

        /// Lower joint limits, radians.
        pub from: Vec<f64>,

        /// Upper joint limits, radians.
        pub to: Vec<f64>,

        /// Maximal joint speeds, radians per second.
        pub velocity_limits: Vec<f64>,
    }

    impl Parameters {
        pub fn dof(&self) -> usize {
            self.links.len()
        }
    }
}
