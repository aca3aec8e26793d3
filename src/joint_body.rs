use nalgebra::{Isometry3, Point3, Translation3, UnitQuaternion, Vector3};
use parry3d::bounding_volume::{Aabb, BoundingVolume};
use parry3d::shape::SharedShape;

/// Collision primitive attached to a link, placed by its transform in the link frame.
#[derive(Clone)]
pub struct CollisionShape {
    pub name: String,
    pub local_transform: Isometry3<f32>,
    pub shape: SharedShape,
}

impl CollisionShape {
    pub fn sphere(name: &str, center: Point3<f64>, radius: f64) -> Self {
        CollisionShape {
            name: name.to_string(),
            local_transform: Isometry3::from_parts(
                Translation3::from(center.coords.cast::<f32>()), UnitQuaternion::identity()),
            shape: SharedShape::ball(radius as f32),
        }
    }

    /// Capsule around the segment between `a` and `b`, both in the link frame.
    pub fn capsule(name: &str, a: Point3<f64>, b: Point3<f64>, radius: f64) -> Self {
        CollisionShape {
            name: name.to_string(),
            local_transform: Isometry3::identity(),
            shape: SharedShape::capsule(a.cast::<f32>(), b.cast::<f32>(), radius as f32),
        }
    }

    pub fn cuboid(name: &str, local_transform: Isometry3<f64>, half_extents: Vector3<f64>) -> Self {
        CollisionShape {
            name: name.to_string(),
            local_transform: local_transform.cast::<f32>(),
            shape: SharedShape::cuboid(half_extents.x as f32, half_extents.y as f32, half_extents.z as f32),
        }
    }
}

/// Struct representing a link, which contains multiple shapes and a box around all of them
/// (as an AABB in the link frame) used to skip far obstacles cheaply.
#[derive(Clone)]
pub struct LinkBody {
    pub shapes: Vec<CollisionShape>,
    pub bounds: Aabb,
}

impl LinkBody {
    /// Constructor to initialize a link with a given list of collision shapes.
    /// The constructor also computes an AABB around all the shapes.
    pub fn new(shapes: Vec<CollisionShape>) -> Self {
        let bounds = Self::compute_aabb(&shapes);
        LinkBody { shapes, bounds }
    }

    /// Link without collision geometry.
    pub fn empty() -> Self {
        LinkBody::new(Vec::new())
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    /// Compute the AABB (Axis-Aligned Bounding Box) that surrounds all the shapes in the link.
    fn compute_aabb(shapes: &[CollisionShape]) -> Aabb {
        let mut overall_aabb = Aabb::new_invalid();

        // Loop over each shape and expand the AABB to include its local bounding box
        for shape in shapes {
            let local_aabb = shape.shape.compute_aabb(&shape.local_transform);
            overall_aabb.merge(&local_aabb);
        }

        overall_aabb
    }

    /// Distance from the link bounds, placed at `link_pose`, to the given world point.
    /// Zero if inside. Never larger than the distance from any shape of the link.
    pub fn bounds_distance(&self, link_pose: &Isometry3<f32>, point: &Point3<f32>) -> f32 {
        if self.is_empty() {
            return f32::INFINITY;
        }
        let world = self.bounds.transform_by(link_pose);
        let mut squared = 0.0;
        for axis in 0..3 {
            let outside = (world.mins[axis] - point[axis]).max(point[axis] - world.maxs[axis]).max(0.0);
            squared += outside * outside;
        }
        f32::sqrt(squared)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_cover_all_shapes() {
        let body = LinkBody::new(vec![
            CollisionShape::sphere("ball", Point3::new(0.0, 0.0, 1.0), 0.1),
            CollisionShape::capsule("arm", Point3::origin(), Point3::new(0.5, 0.0, 0.0), 0.05),
        ]);
        assert!((body.bounds.maxs.z - 1.1).abs() < 1e-6);
        assert!((body.bounds.maxs.x - 0.55).abs() < 1e-6);
        assert!((body.bounds.mins.z + 0.05).abs() < 1e-6);
    }

    #[test]
    fn test_cuboid_bounds() {
        let body = LinkBody::new(vec![CollisionShape::cuboid(
            "box", Isometry3::translation(0.5, 0.0, 0.0), Vector3::new(0.5, 0.1, 0.2))]);
        assert!((body.bounds.maxs.x - 1.0).abs() < 1e-6);
        assert!(body.bounds.mins.x.abs() < 1e-6);
        assert!((body.bounds.mins.z + 0.2).abs() < 1e-6);
        assert!(body.shapes[0].shape.as_cuboid().is_some());
    }

    #[test]
    fn test_bounds_distance() {
        let body = LinkBody::new(vec![CollisionShape::sphere("ball", Point3::origin(), 0.5)]);
        let pose = Isometry3::translation(1.0, 0.0, 0.0);
        assert_eq!(body.bounds_distance(&pose, &Point3::new(1.2, 0.0, 0.0)), 0.0);
        assert!((body.bounds_distance(&pose, &Point3::new(3.0, 0.0, 0.0)) - 1.5).abs() < 1e-6);
    }

    #[test]
    fn test_empty_link_is_infinitely_far() {
        let body = LinkBody::empty();
        assert!(body.is_empty());
        assert_eq!(body.bounds_distance(&Isometry3::identity(), &Point3::origin()), f32::INFINITY);
    }
}
