
use std::sync::Arc;

use bbox::BBox;
use material::Material;
use ray::Ray;
use vec::{Vec3, EPS};

/// Relative slack for the barycentric area containment test; f32 area
/// sums on unit-scale geometry round past an absolute epsilon.
const AREA_SLACK: f32 = 1e-4;

/// A hit on a primitive. Value type, copied out of the traversal.
pub struct Intersection<'a> {
    pub point: Vec3,
    pub distance: f32,
    pub normal: Vec3,
    pub primitive: &'a Primitive,
}

/// The surfaces the tracer knows how to intersect. A closed sum type
/// rather than a trait object: the per-leaf intersection loop is the
/// hottest dispatch site in the tracer.
pub enum Primitive {
    Triangle(Triangle),
    PlanarMesh(PlanarMesh),
}

impl Primitive {
    pub fn intersect<'a>(&'a self, ray: &Ray) -> Option<Intersection<'a>> {
        match *self {
            Primitive::Triangle(ref t) => {
                intersect_triangle(ray, t.vertices[0], t.vertices[1], t.vertices[2], t.normal)
                    .map(|(point, distance)| {
                        Intersection {
                            point: point,
                            distance: distance,
                            normal: t.normal,
                            primitive: self,
                        }
                    })
            }
            Primitive::PlanarMesh(ref m) => m.intersect(ray).map(|(point, distance, normal)| {
                Intersection {
                    point: point,
                    distance: distance,
                    normal: normal,
                    primitive: self,
                }
            }),
        }
    }

    pub fn bbox(&self) -> BBox {
        let mut bounds = BBox::empty();
        match *self {
            Primitive::Triangle(ref t) => {
                for &v in t.vertices.iter() {
                    bounds.extend(v);
                }
            }
            Primitive::PlanarMesh(ref m) => {
                for &v in m.outline.iter() {
                    bounds.extend(v);
                }
            }
        }
        bounds
    }

    /// Tight bounding box of the part of the primitive inside `bounds`;
    /// empty when they do not touch.
    pub fn clip(&self, bounds: &BBox) -> BBox {
        match *self {
            Primitive::Triangle(ref t) => clip_polygon(&t.vertices, bounds),
            Primitive::PlanarMesh(ref m) => {
                let mut clipped = BBox::empty();
                let v1 = m.outline[0];
                for i in 0..m.outline.len() - 2 {
                    let fan = [v1, m.outline[i + 1], m.outline[i + 2]];
                    clipped = clipped.union(&clip_polygon(&fan, bounds));
                }
                clipped
            }
        }
    }

    pub fn material(&self) -> &(Material + Send + Sync) {
        match *self {
            Primitive::Triangle(ref t) => &*t.material,
            Primitive::PlanarMesh(ref m) => &*m.material,
        }
    }

    /// Zero-area surfaces contribute nothing and poison the kd-tree's
    /// cost sweep; the scene drops them before indexing.
    pub fn is_degenerate(&self) -> bool {
        match *self {
            Primitive::Triangle(ref t) => {
                triangle_area(t.vertices[0], t.vertices[1], t.vertices[2]) < EPS
            }
            Primitive::PlanarMesh(ref m) => {
                let v1 = m.outline[0];
                (0..m.outline.len() - 2)
                    .all(|i| triangle_area(v1, m.outline[i + 1], m.outline[i + 2]) < EPS)
            }
        }
    }

    pub fn name(&self) -> Option<&str> {
        match *self {
            Primitive::Triangle(_) => None,
            Primitive::PlanarMesh(ref m) => Some(&m.name),
        }
    }
}

pub struct Triangle {
    vertices: [Vec3; 3],
    normal: Vec3,
    material: Arc<Material + Send + Sync>,
}

impl Triangle {
    pub fn new(v1: Vec3, v2: Vec3, v3: Vec3, material: Arc<Material + Send + Sync>) -> Triangle {
        Triangle {
            vertices: [v1, v2, v3],
            normal: compute_normal(v1, v2, v3),
            material: material,
        }
    }
}

/// A planar polygon given as a triangle fan, with optional hole polygons.
/// Scene files wind holes opposite to the outline, so hole fans swap
/// their 2nd and 3rd vertices to keep all normals on the same side.
pub struct PlanarMesh {
    name: String,
    outline: Vec<Vec3>,
    holes: Vec<Vec<Vec3>>,
    outline_normals: Vec<Vec3>,
    hole_normals: Vec<Vec<Vec3>>,
    material: Arc<Material + Send + Sync>,
}

impl PlanarMesh {
    pub fn new(name: String,
               outline: Vec<Vec3>,
               holes: Vec<Vec<Vec3>>,
               material: Arc<Material + Send + Sync>)
               -> PlanarMesh {
        assert!(outline.len() >= 3);
        let outline_normals = fan_normals(&outline, false);
        let hole_normals = holes.iter().map(|hole| fan_normals(hole, true)).collect();
        PlanarMesh {
            name: name,
            outline: outline,
            holes: holes,
            outline_normals: outline_normals,
            hole_normals: hole_normals,
            material: material,
        }
    }

    /// A hole hit occludes the outline: the primitive reports no hit and
    /// whatever lies behind shows through.
    fn intersect(&self, ray: &Ray) -> Option<(Vec3, f32, Vec3)> {
        for (hole, normals) in self.holes.iter().zip(self.hole_normals.iter()) {
            let v1 = hole[0];
            for i in 0..hole.len() - 2 {
                if intersect_triangle(ray, v1, hole[i + 2], hole[i + 1], normals[i]).is_some() {
                    return None;
                }
            }
        }

        let v1 = self.outline[0];
        for i in 0..self.outline.len() - 2 {
            let hit = intersect_triangle(ray,
                                         v1,
                                         self.outline[i + 1],
                                         self.outline[i + 2],
                                         self.outline_normals[i]);
            if let Some((point, distance)) = hit {
                return Some((point, distance, self.outline_normals[i]));
            }
        }
        None
    }
}

pub fn compute_normal(v1: Vec3, v2: Vec3, v3: Vec3) -> Vec3 {
    (v2 - v1).cross(v3 - v1).normalized()
}

fn triangle_area(v1: Vec3, v2: Vec3, v3: Vec3) -> f32 {
    (v2 - v1).cross(v3 - v1).norm() / 2.0
}

fn fan_normals(polygon: &[Vec3], swap_winding: bool) -> Vec<Vec3> {
    assert!(polygon.len() >= 3);
    let v1 = polygon[0];
    (0..polygon.len() - 2)
        .map(|i| {
            if swap_winding {
                compute_normal(v1, polygon[i + 2], polygon[i + 1])
            } else {
                compute_normal(v1, polygon[i + 1], polygon[i + 2])
            }
        })
        .collect()
}

/// Plane evaluation plus barycentric area containment. Rays parallel to
/// the plane (|n.d| below epsilon) and slivers report no intersection.
fn intersect_triangle(ray: &Ray, v1: Vec3, v2: Vec3, v3: Vec3, normal: Vec3)
                      -> Option<(Vec3, f32)> {
    let area = triangle_area(v1, v2, v3);
    if area < EPS {
        return None;
    }

    let b = normal.dot(ray.direction);
    if b.abs() < EPS {
        return None;
    }

    let d = normal.dot(v1);
    let t = (d - normal.dot(ray.origin)) / b;
    if t < 0.0 {
        return None;
    }

    let p = ray.origin + ray.direction * t;
    let a1 = triangle_area(v1, v2, p);
    let a2 = triangle_area(v2, v3, p);
    let a3 = triangle_area(v3, v1, p);
    if a1 + a2 + a3 > area * (1.0 + AREA_SLACK) {
        return None;
    }

    Some((p, t))
}

/// Sutherland-Hodgman clip of a polygon against the six faces of a box,
/// reduced to the bounding box of the surviving vertices.
fn clip_polygon(polygon: &[Vec3], bounds: &BBox) -> BBox {
    let mut vertices: Vec<Vec3> = polygon.to_vec();
    for dim in 0..3 {
        vertices = clip_against_plane(&vertices, dim, bounds.min[dim], false);
        vertices = clip_against_plane(&vertices, dim, bounds.max[dim], true);
        if vertices.is_empty() {
            return BBox::empty();
        }
    }
    let mut clipped = BBox::empty();
    for v in vertices {
        clipped.extend(v);
    }
    // clamp numerical drift so the result stays inside the box
    clipped.intersection(bounds)
}

fn clip_against_plane(vertices: &[Vec3], dim: usize, plane: f32, keep_below: bool) -> Vec<Vec3> {
    let inside = |v: &Vec3| {
        if keep_below {
            v[dim] <= plane
        } else {
            v[dim] >= plane
        }
    };
    let mut out = Vec::with_capacity(vertices.len() + 1);
    for i in 0..vertices.len() {
        let a = vertices[i];
        let b = vertices[(i + 1) % vertices.len()];
        let a_in = inside(&a);
        if a_in {
            out.push(a);
        }
        if a_in != inside(&b) {
            let t = (plane - a[dim]) / (b[dim] - a[dim]);
            out.push(a + (b - a) * t);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use material::{DiffuseMaterial, Material};
    use ray::Ray;
    use vec::Vec3;
    use super::*;

    fn white() -> Arc<Material + Send + Sync> {
        Arc::new(DiffuseMaterial::new(vec![0.7], None))
    }

    fn unit_triangle() -> Primitive {
        // right triangle in the z = 0 plane
        Primitive::Triangle(Triangle::new(Vec3::zero(),
                                          Vec3::new(1.0, 0.0, 0.0),
                                          Vec3::new(0.0, 1.0, 0.0),
                                          white()))
    }

    #[test]
    fn test_triangle_hit() {
        let tri = unit_triangle();
        let ray = Ray::new(Vec3::new(0.25, 0.25, 1.0), Vec3::new(0.0, 0.0, -1.0));
        let hit = tri.intersect(&ray).expect("ray aims at the triangle");
        assert_relative_eq!(hit.distance, 1.0, epsilon = 1e-5);
        assert_relative_eq!(hit.point.z, 0.0, epsilon = 1e-5);
        assert!(hit.distance >= 0.0);
    }

    #[test]
    fn test_triangle_miss_outside() {
        let tri = unit_triangle();
        let ray = Ray::new(Vec3::new(0.9, 0.9, 1.0), Vec3::new(0.0, 0.0, -1.0));
        assert!(tri.intersect(&ray).is_none());
    }

    #[test]
    fn test_parallel_ray_misses() {
        let tri = unit_triangle();
        let ray = Ray::new(Vec3::new(-1.0, 0.25, 0.0), Vec3::new(1.0, 0.0, 0.0));
        assert!(tri.intersect(&ray).is_none());
    }

    #[test]
    fn test_behind_origin_misses() {
        let tri = unit_triangle();
        let ray = Ray::new(Vec3::new(0.25, 0.25, -1.0), Vec3::new(0.0, 0.0, -1.0));
        assert!(tri.intersect(&ray).is_none());
    }

    #[test]
    fn test_clip_is_contained() {
        let tri = unit_triangle();
        let bounds = BBox::new(Vec3::new(-0.1, -0.1, -0.1), Vec3::new(0.4, 0.4, 0.1));
        let clipped = tri.clip(&bounds);
        assert!(!clipped.is_empty());
        for dim in 0..3 {
            assert!(clipped.min[dim] >= bounds.min[dim] - 1e-6);
            assert!(clipped.max[dim] <= bounds.max[dim] + 1e-6);
        }
        // planar in z
        assert!(clipped.is_planar(2));
    }

    #[test]
    fn test_clip_disjoint_is_empty() {
        let tri = unit_triangle();
        let bounds = BBox::new(Vec3::new(2.0, 2.0, 2.0), Vec3::new(3.0, 3.0, 3.0));
        assert!(tri.clip(&bounds).is_empty());
    }

    #[test]
    fn test_degenerate_triangle() {
        let sliver = Primitive::Triangle(Triangle::new(Vec3::zero(),
                                                       Vec3::new(1.0, 0.0, 0.0),
                                                       Vec3::new(2.0, 0.0, 0.0),
                                                       white()));
        assert!(sliver.is_degenerate());
        assert!(!unit_triangle().is_degenerate());
    }

    fn quad_with_hole() -> Primitive {
        // unit-ish quad in z = 0 with a smaller quad hole in the middle;
        // the hole is wound clockwise where the outline is anticlockwise
        let outline = vec![Vec3::new(-2.0, -2.0, 0.0),
                           Vec3::new(2.0, -2.0, 0.0),
                           Vec3::new(2.0, 2.0, 0.0),
                           Vec3::new(-2.0, 2.0, 0.0)];
        let hole = vec![Vec3::new(-0.5, -0.5, 0.0),
                        Vec3::new(-0.5, 0.5, 0.0),
                        Vec3::new(0.5, 0.5, 0.0),
                        Vec3::new(0.5, -0.5, 0.0)];
        Primitive::PlanarMesh(PlanarMesh::new("wall".to_string(),
                                              outline,
                                              vec![hole],
                                              white()))
    }

    #[test]
    fn test_mesh_outline_hit() {
        let mesh = quad_with_hole();
        let ray = Ray::new(Vec3::new(1.5, 1.5, 1.0), Vec3::new(0.0, 0.0, -1.0));
        let hit = mesh.intersect(&ray).expect("outline is solid away from the hole");
        assert_relative_eq!(hit.distance, 1.0, epsilon = 1e-5);
    }

    #[test]
    fn test_mesh_hole_occludes() {
        let mesh = quad_with_hole();
        let ray = Ray::new(Vec3::new(0.0, 0.0, 1.0), Vec3::new(0.0, 0.0, -1.0));
        assert!(mesh.intersect(&ray).is_none());
    }

    #[test]
    fn test_mesh_name_and_bbox() {
        let mesh = quad_with_hole();
        assert_eq!(mesh.name(), Some("wall"));
        let bounds = mesh.bbox();
        assert_relative_eq!(bounds.min.x, -2.0);
        assert_relative_eq!(bounds.max.y, 2.0);
        assert!(bounds.is_planar(2));
    }
}
