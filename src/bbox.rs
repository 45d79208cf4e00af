
use std::f32;

use ray::Ray;
use vec::{Vec3, EPS};

/// Axis-aligned bounding box. The empty box has `min > max` in every
/// dimension so that extending it by any point yields that point.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BBox {
    pub min: Vec3,
    pub max: Vec3,
}

impl BBox {
    pub fn new(min: Vec3, max: Vec3) -> BBox {
        BBox { min: min, max: max }
    }

    pub fn empty() -> BBox {
        BBox {
            min: Vec3::new(f32::INFINITY, f32::INFINITY, f32::INFINITY),
            max: Vec3::new(f32::NEG_INFINITY, f32::NEG_INFINITY, f32::NEG_INFINITY),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    pub fn extend(&mut self, p: Vec3) {
        self.min = self.min.min(p);
        self.max = self.max.max(p);
    }

    pub fn union(&self, rhs: &BBox) -> BBox {
        BBox {
            min: self.min.min(rhs.min),
            max: self.max.max(rhs.max),
        }
    }

    /// The overlap of two boxes; empty when they do not touch.
    pub fn intersection(&self, rhs: &BBox) -> BBox {
        BBox {
            min: self.min.max(rhs.min),
            max: self.max.min(rhs.max),
        }
    }

    pub fn surface_area(&self) -> f32 {
        if self.is_empty() {
            return 0.0;
        }
        let w = self.max - self.min;
        2.0 * (w.x * w.y + w.y * w.z + w.z * w.x)
    }

    /// A box is planar in a dimension when it has no extent there.
    pub fn is_planar(&self, dim: usize) -> bool {
        !self.is_empty() && self.max[dim] - self.min[dim] < EPS
    }

    /// Split into two boxes sharing the plane `position` in `dim`.
    pub fn split(&self, dim: usize, position: f32) -> (BBox, BBox) {
        let mut left = *self;
        let mut right = *self;
        left.max[dim] = position;
        right.min[dim] = position;
        (left, right)
    }

    /// Slab test: the parametric range the ray spends inside the box,
    /// clamped below at zero. `None` when the ray misses entirely.
    pub fn clip_ray(&self, ray: &Ray) -> Option<(f32, f32)> {
        let mut t_in = f32::NEG_INFINITY;
        let mut t_out = f32::INFINITY;
        for dim in 0..3 {
            let origin = ray.origin[dim];
            let dir = ray.direction[dim];
            if dir == 0.0 {
                if origin < self.min[dim] || origin > self.max[dim] {
                    return None;
                }
            } else {
                let inv = 1.0 / dir;
                let mut t0 = (self.min[dim] - origin) * inv;
                let mut t1 = (self.max[dim] - origin) * inv;
                if t0 > t1 {
                    let tmp = t0;
                    t0 = t1;
                    t1 = tmp;
                }
                t_in = t_in.max(t0);
                t_out = t_out.min(t1);
                if t_in > t_out {
                    return None;
                }
            }
        }
        if t_out < 0.0 {
            return None;
        }
        Some((t_in.max(0.0), t_out))
    }
}

#[test]
fn test_surface_area() {
    let b = BBox::new(Vec3::zero(), Vec3::new(1.0, 2.0, 3.0));
    assert_relative_eq!(b.surface_area(), 22.0);
    assert_relative_eq!(BBox::empty().surface_area(), 0.0);
}

#[test]
fn test_extend_and_union() {
    let mut b = BBox::empty();
    b.extend(Vec3::new(1.0, -1.0, 0.0));
    b.extend(Vec3::new(-1.0, 2.0, 3.0));
    assert_eq!(b.min, Vec3::new(-1.0, -1.0, 0.0));
    assert_eq!(b.max, Vec3::new(1.0, 2.0, 3.0));

    let other = BBox::new(Vec3::new(0.0, 0.0, -5.0), Vec3::new(4.0, 0.0, 0.0));
    let joined = b.union(&other);
    assert_eq!(joined.min, Vec3::new(-1.0, -1.0, -5.0));
    assert_eq!(joined.max, Vec3::new(4.0, 2.0, 3.0));
}

#[test]
fn test_planar() {
    let b = BBox::new(Vec3::zero(), Vec3::new(1.0, 0.0, 1.0));
    assert!(!b.is_planar(0));
    assert!(b.is_planar(1));
    assert!(!BBox::empty().is_planar(0));
}

#[test]
fn test_split_shares_plane() {
    let b = BBox::new(Vec3::zero(), Vec3::new(2.0, 2.0, 2.0));
    let (left, right) = b.split(0, 0.5);
    assert_eq!(left.max.x, 0.5);
    assert_eq!(right.min.x, 0.5);
    assert_eq!(left.union(&right), b);
}

#[test]
fn test_clip_ray() {
    let b = BBox::new(Vec3::zero(), Vec3::new(1.0, 1.0, 1.0));
    let hit = Ray::new(Vec3::new(-1.0, 0.5, 0.5), Vec3::new(1.0, 0.0, 0.0));
    let (t_in, t_out) = b.clip_ray(&hit).expect("ray aims at the box");
    assert_relative_eq!(t_in, 1.0, epsilon = 1e-6);
    assert_relative_eq!(t_out, 2.0, epsilon = 1e-6);

    let miss = Ray::new(Vec3::new(-1.0, 2.0, 0.5), Vec3::new(1.0, 0.0, 0.0));
    assert!(b.clip_ray(&miss).is_none());

    // box behind the origin
    let behind = Ray::new(Vec3::new(2.0, 0.5, 0.5), Vec3::new(1.0, 0.0, 0.0));
    assert!(b.clip_ray(&behind).is_none());

    // origin inside clamps the entry to zero
    let inside = Ray::new(Vec3::new(0.5, 0.5, 0.5), Vec3::new(0.0, 0.0, 1.0));
    let (t_in, t_out) = b.clip_ray(&inside).expect("origin is inside");
    assert_relative_eq!(t_in, 0.0);
    assert_relative_eq!(t_out, 0.5, epsilon = 1e-6);

    assert!(BBox::empty().clip_ray(&hit).is_none());
}
