use std::sync::Arc;
use crate::collisions::RobotBody;
use crate::control_error::{ControlError, ControlResult};
use crate::kinematic_traits::Kinematics;
use crate::kinematics_impl::SerialChain;
use crate::parameters::mdh_kinematics::Parameters;

/// Radius of the capsules approximating the Panda links.
pub const PANDA_LINK_RADIUS: f64 = 0.06;

/// Struct that combines the kinematic model of a robot with its geometrical shape.
/// This struct provides both the kinematic functionality (poses and Jacobians) and
/// the collision geometry used to keep the links away from obstacles.
#[derive(Clone)]
pub struct KinematicsWithShape {
    /// The kinematic model of the robot. This is an abstract trait (`Kinematics`),
    /// allowing for different implementations of kinematic models.
    pub kinematics: Arc<dyn Kinematics>,

    /// The physical structure of the robot, one link body per joint. Links without shapes
    /// do not take part in collision avoidance.
    pub body: RobotBody,
}

impl KinematicsWithShape {
    /// Constructs a new `KinematicsWithShape`. The body may not describe more links than
    /// the robot has joints.
    pub fn new(kinematics: Arc<dyn Kinematics>, body: RobotBody) -> ControlResult<Self> {
        if body.links.len() > kinematics.dof() {
            return Err(ControlError::DimensionMismatch {
                what: "link bodies", expected: kinematics.dof(), found: body.links.len(),
            });
        }
        Ok(KinematicsWithShape { kinematics, body })
    }

    /// Panda with capsule links.
    pub fn panda() -> ControlResult<Self> {
        let chain = SerialChain::new(Parameters::panda())?;
        let body = RobotBody::skeleton(&chain, PANDA_LINK_RADIUS);
        KinematicsWithShape::new(Arc::new(chain), body)
    }

    pub fn dof(&self) -> usize {
        self.kinematics.dof()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::joint_body::LinkBody;

    #[test]
    fn test_panda_has_seven_colliding_links() {
        let robot = KinematicsWithShape::panda().unwrap();
        assert_eq!(robot.dof(), 7);
        assert_eq!(robot.body.colliding_links(), 7);
    }

    #[test]
    fn test_too_many_links_rejected() {
        let chain = SerialChain::new(Parameters::planar_3r()).unwrap();
        let body = RobotBody::new(vec![LinkBody::empty(); 4]);
        assert!(KinematicsWithShape::new(Arc::new(chain), body).is_err());
    }
}
