//! Moving spherical obstacles and their per-tick snapshots

use nalgebra::{Isometry3, Point3, Translation3, UnitQuaternion, Vector3, Vector6};
use crate::kinematic_traits::Pose;

/// Identifies an obstacle inside the simulation.
pub type ObstacleId = usize;

/// Tracked obstacle as exposed by the simulation. Only pose, velocity and radius are used.
pub trait Obstacle: Send + Sync {
    fn id(&self) -> ObstacleId;

    fn pose(&self) -> Pose;

    /// Spatial velocity in the world frame, linear part first. The angular part rotates the
    /// obstacle about its own center.
    fn velocity(&self) -> Vector6<f64>;

    fn radius(&self) -> f64;

    /// Advance the obstacle under its own velocity.
    fn advance(&mut self, dt: f64);
}

/// Sphere moving with constant spatial velocity.
#[derive(Debug, Clone)]
pub struct SphereObstacle {
    pub id: ObstacleId,
    pub pose: Pose,
    pub velocity: Vector6<f64>,
    pub radius: f64,
}

impl SphereObstacle {
    pub fn new(id: ObstacleId, center: Point3<f64>, radius: f64) -> Self {
        SphereObstacle {
            id,
            pose: Isometry3::from_parts(Translation3::from(center.coords), UnitQuaternion::identity()),
            velocity: Vector6::zeros(),
            radius,
        }
    }

    /// Builder style, set linear velocity (angular stays zero).
    pub fn moving(mut self, linear: Vector3<f64>) -> Self {
        self.velocity.fixed_rows_mut::<3>(0).copy_from(&linear);
        self
    }
}

impl Obstacle for SphereObstacle {
    fn id(&self) -> ObstacleId {
        self.id
    }

    fn pose(&self) -> Pose {
        self.pose
    }

    fn velocity(&self) -> Vector6<f64> {
        self.velocity
    }

    fn radius(&self) -> f64 {
        self.radius
    }

    fn advance(&mut self, dt: f64) {
        let linear: Vector3<f64> = self.velocity.fixed_rows::<3>(0).clone_owned();
        let angular: Vector3<f64> = self.velocity.fixed_rows::<3>(3).clone_owned();
        self.pose.translation.vector += linear * dt;
        self.pose.rotation = UnitQuaternion::from_scaled_axis(angular * dt) * self.pose.rotation;
    }
}

/// Immutable copy of an obstacle's state, taken once at the start of a tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObstacleSnapshot {
    pub id: ObstacleId,
    pub pose: Pose,
    pub velocity: Vector6<f64>,
    pub radius: f64,
}

impl ObstacleSnapshot {
    pub fn of(obstacle: &dyn Obstacle) -> Self {
        ObstacleSnapshot {
            id: obstacle.id(),
            pose: obstacle.pose(),
            velocity: obstacle.velocity(),
            radius: obstacle.radius(),
        }
    }

    pub fn center(&self) -> Point3<f64> {
        Point3::from(self.pose.translation.vector)
    }

    /// Velocity of the material point of the obstacle currently at `point`.
    pub fn point_velocity(&self, point: &Point3<f64>) -> Vector3<f64> {
        let linear: Vector3<f64> = self.velocity.fixed_rows::<3>(0).clone_owned();
        let angular: Vector3<f64> = self.velocity.fixed_rows::<3>(3).clone_owned();
        linear + angular.cross(&(point - self.center()))
    }
}

/// Reads every obstacle exactly once.
pub fn snapshot_all<'a, I>(obstacles: I) -> Vec<ObstacleSnapshot>
where
    I: IntoIterator<Item = &'a dyn Obstacle>,
{
    obstacles.into_iter().map(ObstacleSnapshot::of).collect()
}
