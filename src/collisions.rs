//! Link proximity evaluation: distances between the robot links and moving obstacles,
//! and the collision velocity damper rows derived from them.

use nalgebra::{DVector, Isometry3, Point3, Vector3};
use parry3d::query::{self, ClosestPoints};
use parry3d::shape::Ball;
use tracing::warn;
use crate::joint_body::{CollisionShape, LinkBody};
use crate::kinematic_traits::{Joints, Kinematics, Pose};
use crate::kinematics_impl::SerialChain;
use crate::obstacles::{ObstacleId, ObstacleSnapshot};
use crate::velocity_damper::{DamperRow, VelocityDamper};

/// Shorter segments are represented as a sphere.
const SEGMENT_EPSILON: f64 = 1e-6;

/// Result of evaluating one link primitive against one obstacle.
#[derive(Debug, Clone)]
pub struct Proximity {
    pub link: usize,
    pub shape: usize,
    pub obstacle: ObstacleId,
    /// Signed surface distance, negative when penetrating.
    pub distance: f64,
    /// Point on the link surface closest to the obstacle, world frame.
    pub link_point: Point3<f64>,
    /// Point on the obstacle surface closest to the link, world frame.
    pub obstacle_point: Point3<f64>,
    /// Unit direction from the link towards the obstacle.
    pub normal: Vector3<f64>,
    /// Collision damper row, `None` if the pair is outside the influence margin.
    pub row: Option<DamperRow>,
}

/// Closest link/obstacle pair seen during one tick. Diagnostics only, not used for control.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClosestPointRecord {
    pub distance: f64,
    pub obstacle: ObstacleId,
    pub link: usize,
    /// Point on the link closest to the obstacle, world frame.
    pub point: Point3<f64>,
}

impl ClosestPointRecord {
    /// Keep the closer of the current record and the new proximity.
    pub fn update(record: &mut Option<ClosestPointRecord>, proximity: &Proximity) {
        let closer = match record {
            Some(current) => proximity.distance < current.distance,
            None => true,
        };
        if closer {
            *record = Some(ClosestPointRecord {
                distance: proximity.distance,
                obstacle: proximity.obstacle,
                link: proximity.link,
                point: proximity.link_point,
            });
        }
    }
}

/// Evaluates one collision primitive of one link against one obstacle.
///
/// Within the influence margin of the damper the result carries the row
///
/// ```text
///   nᵀ J_p q̇ <= gain * (d - ps) / (pi - ps) + nᵀ v_obstacle
/// ```
///
/// where `n` is the unit vector from the link to the obstacle and `J_p` the linear Jacobian of
/// the closest point on the link. `J_p` only involves joints up to and including `link`.
/// Farther pairs are measured by [`link_clearance`] and have no row. `None` only if the shape
/// pair is not supported by the distance queries.
pub fn link_proximity(
    kinematics: &dyn Kinematics,
    qs: &Joints,
    link: usize,
    link_pose: &Pose,
    shape_index: usize,
    shape: &CollisionShape,
    obstacle: &ObstacleSnapshot,
    damper: &VelocityDamper,
    width: usize,
) -> Option<Proximity> {
    let shape_pose = link_pose.cast::<f32>() * shape.local_transform;
    let obstacle_pose = obstacle.pose.cast::<f32>();
    let ball = Ball::new(obstacle.radius as f32);

    let contact = match query::contact(
        &shape_pose, &*shape.shape, &obstacle_pose, &ball, damper.influence() as f32) {
        Ok(Some(contact)) => contact,
        Ok(None) => return link_clearance(link, link_pose, shape_index, shape, obstacle),
        Err(_) => {
            warn!(link, shape = %shape.name, "distance query not supported for this shape");
            return None;
        }
    };

    let distance = contact.dist as f64;
    let link_point: Point3<f64> = contact.point1.cast::<f64>();
    let obstacle_point: Point3<f64> = contact.point2.cast::<f64>();
    let normal: Vector3<f64> = contact.normal1.into_inner().cast::<f64>();

    let point_jacobian = kinematics.jacobian_point(qs, link, &link_point);
    let approach: DVector<f64> = point_jacobian.transpose() * normal;
    let obstacle_approach = normal.dot(&obstacle.point_velocity(&obstacle_point));
    let row = damper.row(distance, approach.as_view(), obstacle_approach, width);

    Some(Proximity {
        link,
        shape: shape_index,
        obstacle: obstacle.id,
        distance,
        link_point,
        obstacle_point,
        normal,
        row,
    })
}

/// Distance and closest points of a link primitive and an obstacle that do not touch, without
/// any damper row. Used for diagnostics of pairs outside the influence margin.
pub fn link_clearance(
    link: usize,
    link_pose: &Pose,
    shape_index: usize,
    shape: &CollisionShape,
    obstacle: &ObstacleSnapshot,
) -> Option<Proximity> {
    let shape_pose = link_pose.cast::<f32>() * shape.local_transform;
    let obstacle_pose = obstacle.pose.cast::<f32>();
    let ball = Ball::new(obstacle.radius as f32);

    let distance = query::distance(&shape_pose, &*shape.shape, &obstacle_pose, &ball).ok()?;
    let points = query::closest_points(
        &shape_pose, &*shape.shape, &obstacle_pose, &ball, distance + 1.0).ok()?;
    let (link_point, obstacle_point) = match points {
        ClosestPoints::WithinMargin(p1, p2) => (p1.cast::<f64>(), p2.cast::<f64>()),
        // Touching or penetrating pairs are always within influence
        ClosestPoints::Intersecting | ClosestPoints::Disjoint => return None,
    };
    let normal = (obstacle_point - link_point).try_normalize(SEGMENT_EPSILON).unwrap_or_else(Vector3::zeros);

    Some(Proximity {
        link,
        shape: shape_index,
        obstacle: obstacle.id,
        distance: distance as f64,
        link_point,
        obstacle_point,
        normal,
        row: None,
    })
}

/// Collision geometry of the robot, one `LinkBody` per joint.
#[derive(Clone)]
pub struct RobotBody {
    pub links: Vec<LinkBody>,
}

impl RobotBody {
    pub fn new(links: Vec<LinkBody>) -> Self {
        RobotBody { links }
    }

    /// Approximates every link by a capsule of the given radius from its joint frame to the
    /// next joint frame, the last link reaching to the tool center point. Links where both
    /// frames coincide get a sphere.
    pub fn skeleton(chain: &SerialChain, radius: f64) -> Self {
        let links = chain.links();
        let links = (0..links.len()).map(|i| {
            let end = match links.get(i + 1) {
                Some(next) => Point3::new(next.a, -next.alpha.sin() * next.d, next.alpha.cos() * next.d),
                None => Point3::from(chain.tool().translation.vector),
            };
            let name = format!("link{}", i + 1);
            let shape = if end.coords.norm() < SEGMENT_EPSILON {
                CollisionShape::sphere(&name, Point3::origin(), radius)
            } else {
                CollisionShape::capsule(&name, Point3::origin(), end, radius)
            };
            LinkBody::new(vec![shape])
        }).collect();
        RobotBody { links }
    }

    /// Number of links that carry collision geometry.
    pub fn colliding_links(&self) -> usize {
        self.links.iter().filter(|l| !l.is_empty()).count()
    }

    /// Evaluates every link against every obstacle, one entry per pair from the nearest
    /// primitive of the link. Only pairs within the influence margin carry a damper row. Pairs
    /// whose link bounds are out of reach skip the contact query and the Jacobian.
    pub fn proximities(
        &self,
        kinematics: &dyn Kinematics,
        qs: &Joints,
        obstacles: &[ObstacleSnapshot],
        damper: &VelocityDamper,
        width: usize,
    ) -> Vec<Proximity> {
        let link_poses = kinematics.link_poses(qs);
        let mut found = Vec::with_capacity(self.links.len() * obstacles.len());
        for (link, (body, link_pose)) in self.links.iter().zip(link_poses.iter()).enumerate() {
            if body.is_empty() {
                continue;
            }
            let link_pose_f32: Isometry3<f32> = link_pose.cast::<f32>();
            for obstacle in obstacles {
                let center = obstacle.center().cast::<f32>();
                let reach = (damper.influence() + obstacle.radius) as f32;
                let in_reach = body.bounds_distance(&link_pose_f32, &center) <= reach;
                let nearest = body.shapes.iter().enumerate()
                    .filter_map(|(shape_index, shape)| if in_reach {
                        link_proximity(kinematics, qs, link, link_pose, shape_index, shape, obstacle, damper, width)
                    } else {
                        link_clearance(link, link_pose, shape_index, shape, obstacle)
                    })
                    .min_by(|a, b| a.distance.total_cmp(&b.distance));
                if let Some(proximity) = nearest {
                    found.push(proximity);
                }
            }
        }
        found
    }

    /// Minimal surface distance between the robot and the obstacle, zero when touching or
    /// penetrating. Independent of any margin.
    pub fn min_distance(&self, kinematics: &dyn Kinematics, qs: &Joints, obstacle: &ObstacleSnapshot) -> f64 {
        let link_poses = kinematics.link_poses(qs);
        let obstacle_pose = obstacle.pose.cast::<f32>();
        let ball = Ball::new(obstacle.radius as f32);
        let mut min = f64::INFINITY;
        for (body, link_pose) in self.links.iter().zip(link_poses.iter()) {
            for shape in &body.shapes {
                let shape_pose = link_pose.cast::<f32>() * shape.local_transform;
                if let Ok(distance) = query::distance(&shape_pose, &*shape.shape, &obstacle_pose, &ball) {
                    min = min.min(distance as f64);
                }
            }
        }
        min
    }
}
