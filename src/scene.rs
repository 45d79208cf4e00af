
use camera::Camera;
use kdtree::KdTree;
use primitive::{Intersection, Primitive};
use ray::Ray;

/// Owns the primitives and the spatial index over them, plus the camera
/// the loader found in the scene file. Immutable once built; shared by
/// reference across all workers.
pub struct Scene {
    primitives: Vec<Primitive>,
    tree: KdTree,
    pub camera: Camera,
}

impl Scene {
    pub fn new(primitives: Vec<Primitive>, camera: Camera) -> Scene {
        let mut kept = Vec::with_capacity(primitives.len());
        for (index, primitive) in primitives.into_iter().enumerate() {
            if primitive.is_degenerate() {
                warn!("dropping degenerate primitive {} ({})",
                      index,
                      primitive.name().unwrap_or("unnamed"));
                continue;
            }
            kept.push(primitive);
        }
        let tree = KdTree::build(&kept);
        Scene {
            primitives: kept,
            tree: tree,
            camera: camera,
        }
    }

    /// Nearest intersection in the scene, if any.
    pub fn intersect(&self, ray: &Ray) -> Option<Intersection> {
        self.tree.traverse(ray, &self.primitives)
    }

    pub fn primitives(&self) -> &[Primitive] {
        &self.primitives
    }

    pub fn tree(&self) -> &KdTree {
        &self.tree
    }
}

impl ::std::fmt::Debug for Scene {
    fn fmt(&self, f: &mut ::std::fmt::Formatter) -> ::std::fmt::Result {
        f.debug_struct("Scene")
            .field("primitives", &self.primitives.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use camera::Camera;
    use material::{DiffuseMaterial, Material};
    use primitive::{Primitive, Triangle};
    use ray::Ray;
    use vec::Vec3;
    use super::*;

    fn test_camera() -> Camera {
        Camera::new(Vec3::zero(),
                    Vec3::new(0.0, 0.0, -1.0),
                    Vec3::new(0.0, 1.0, 0.0),
                    1.0,
                    0.0,
                    0.0,
                    2.0,
                    2.0)
    }

    #[test]
    fn test_empty_scene_has_no_hits() {
        let scene = Scene::new(Vec::new(), test_camera());
        let ray = Ray::new(Vec3::zero(), Vec3::new(0.0, 0.0, -1.0));
        assert!(scene.intersect(&ray).is_none());
    }

    #[test]
    fn test_degenerate_primitives_are_dropped() {
        let material: Arc<Material + Send + Sync> =
            Arc::new(DiffuseMaterial::new(vec![0.5], None));
        let good = Primitive::Triangle(Triangle::new(Vec3::new(-1.0, -1.0, -2.0),
                                                     Vec3::new(1.0, -1.0, -2.0),
                                                     Vec3::new(0.0, 1.0, -2.0),
                                                     material.clone()));
        let sliver = Primitive::Triangle(Triangle::new(Vec3::zero(),
                                                       Vec3::new(1.0, 0.0, 0.0),
                                                       Vec3::new(2.0, 0.0, 0.0),
                                                       material.clone()));
        let scene = Scene::new(vec![good, sliver], test_camera());
        assert_eq!(scene.primitives().len(), 1);

        let ray = Ray::new(Vec3::zero(), Vec3::new(0.0, 0.0, -1.0));
        let hit = scene.intersect(&ray).expect("remaining triangle is ahead");
        assert_relative_eq!(hit.distance, 2.0, epsilon = 1e-5);
    }
}
