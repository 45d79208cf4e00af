
use std::f32::consts;
use std::ops::{Add, AddAssign, Div, DivAssign, Index, IndexMut, Mul, MulAssign, Neg, Sub,
               SubAssign};

use math::coordinate_system;

/// Tolerance for plane-equality and degeneracy tests throughout the tracer.
pub const EPS: f32 = 1e-6;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    #[inline]
    pub fn new(x: f32, y: f32, z: f32) -> Vec3 {
        Vec3 { x: x, y: y, z: z }
    }

    #[inline]
    pub fn zero() -> Vec3 {
        Vec3::new(0.0, 0.0, 0.0)
    }

    /// Unit vector from spherical angles: phi is the azimuth in the
    /// xy plane, theta the inclination from the z axis.
    pub fn from_phi_theta(phi: f32, theta: f32) -> Vec3 {
        let sin_theta = theta.sin();
        Vec3::new(sin_theta * phi.cos(), sin_theta * phi.sin(), theta.cos())
    }

    #[inline]
    pub fn dot(&self, rhs: Vec3) -> f32 {
        self.x * rhs.x + self.y * rhs.y + self.z * rhs.z
    }

    #[inline]
    pub fn cross(&self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.y * rhs.z - self.z * rhs.y,
                  self.z * rhs.x - self.x * rhs.z,
                  self.x * rhs.y - self.y * rhs.x)
    }

    #[inline]
    pub fn norm(&self) -> f32 {
        self.dot(*self).sqrt()
    }

    pub fn normalize(&mut self) {
        let norm = self.norm();
        if norm > 0.0 {
            *self /= norm;
        }
    }

    pub fn normalized(self) -> Vec3 {
        let mut v = self;
        v.normalize();
        v
    }

    /// Component-wise minimum.
    #[inline]
    pub fn min(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x.min(rhs.x), self.y.min(rhs.y), self.z.min(rhs.z))
    }

    /// Component-wise maximum.
    #[inline]
    pub fn max(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x.max(rhs.x), self.y.max(rhs.y), self.z.max(rhs.z))
    }

    /// Rodrigues rotation of this vector about a unit axis.
    pub fn rotate_about_axis(self, axis: Vec3, theta: f32) -> Vec3 {
        let (sin, cos) = theta.sin_cos();
        self * cos + axis.cross(self) * sin + axis * (axis.dot(self) * (1.0 - cos))
    }

    /// Rotate this vector by the rotation that takes the unit vector `from`
    /// onto the unit vector `to`.
    pub fn rotate_from_to(self, from: Vec3, to: Vec3) -> Vec3 {
        let axis = from.cross(to);
        let sin = axis.norm();
        let cos = from.dot(to);
        if sin < EPS {
            if cos > 0.0 {
                // directions already coincide
                return self;
            }
            // opposite directions: half turn about any axis orthogonal to `from`
            let (ortho, _) = coordinate_system(&from);
            return self.rotate_about_axis(ortho, consts::PI);
        }
        self.rotate_about_axis(axis / sin, sin.atan2(cos))
    }

    /// Rotate this vector by the rotation about `axis` that takes the
    /// projection of `from` onto the projection of `to` in the plane
    /// orthogonal to `axis`. Degenerate projections leave the vector as is.
    pub fn rotate_from_to_about(self, from: Vec3, to: Vec3, axis: Vec3) -> Vec3 {
        let f = from - axis * from.dot(axis);
        let t = to - axis * to.dot(axis);
        if f.norm() < EPS || t.norm() < EPS {
            return self;
        }
        let f = f.normalized();
        let t = t.normalized();
        let theta = f.cross(t).dot(axis).atan2(f.dot(t));
        self.rotate_about_axis(axis, theta)
    }
}

impl Add for Vec3 {
    type Output = Vec3;

    #[inline]
    fn add(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl AddAssign for Vec3 {
    #[inline]
    fn add_assign(&mut self, rhs: Vec3) {
        self.x += rhs.x;
        self.y += rhs.y;
        self.z += rhs.z;
    }
}

impl Sub for Vec3 {
    type Output = Vec3;

    #[inline]
    fn sub(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl SubAssign for Vec3 {
    #[inline]
    fn sub_assign(&mut self, rhs: Vec3) {
        self.x -= rhs.x;
        self.y -= rhs.y;
        self.z -= rhs.z;
    }
}

impl Neg for Vec3 {
    type Output = Vec3;

    #[inline]
    fn neg(self) -> Vec3 {
        Vec3::new(-self.x, -self.y, -self.z)
    }
}

impl Mul<f32> for Vec3 {
    type Output = Vec3;

    #[inline]
    fn mul(self, rhs: f32) -> Vec3 {
        Vec3::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl MulAssign<f32> for Vec3 {
    #[inline]
    fn mul_assign(&mut self, rhs: f32) {
        self.x *= rhs;
        self.y *= rhs;
        self.z *= rhs;
    }
}

impl Div<f32> for Vec3 {
    type Output = Vec3;

    #[inline]
    fn div(self, rhs: f32) -> Vec3 {
        Vec3::new(self.x / rhs, self.y / rhs, self.z / rhs)
    }
}

impl DivAssign<f32> for Vec3 {
    #[inline]
    fn div_assign(&mut self, rhs: f32) {
        self.x /= rhs;
        self.y /= rhs;
        self.z /= rhs;
    }
}

impl Index<usize> for Vec3 {
    type Output = f32;

    #[inline]
    fn index(&self, dim: usize) -> &f32 {
        match dim {
            0 => &self.x,
            1 => &self.y,
            2 => &self.z,
            _ => panic!("Vec3 index out of range: {}", dim),
        }
    }
}

impl IndexMut<usize> for Vec3 {
    #[inline]
    fn index_mut(&mut self, dim: usize) -> &mut f32 {
        match dim {
            0 => &mut self.x,
            1 => &mut self.y,
            2 => &mut self.z,
            _ => panic!("Vec3 index out of range: {}", dim),
        }
    }
}

#[test]
fn test_normalize() {
    let mut v = Vec3::new(3.0, -4.0, 12.0);
    v.normalize();
    assert_relative_eq!(v.norm(), 1.0, epsilon = 1e-6);
    // idempotent under repeated application
    let again = v.normalized();
    assert_relative_eq!(again.x, v.x, epsilon = 1e-6);
    assert_relative_eq!(again.y, v.y, epsilon = 1e-6);
    assert_relative_eq!(again.z, v.z, epsilon = 1e-6);
}

#[test]
fn test_dot_cross() {
    let x = Vec3::new(1.0, 0.0, 0.0);
    let y = Vec3::new(0.0, 1.0, 0.0);
    assert_relative_eq!(x.dot(y), 0.0);
    let z = x.cross(y);
    assert_relative_eq!(z.z, 1.0);
    assert_relative_eq!(z.x, 0.0);
}

#[test]
fn test_rotate_from_to_moves_from_onto_to() {
    let from = Vec3::new(1.0, 2.0, -0.5).normalized();
    let to = Vec3::new(-0.3, 0.4, 1.0).normalized();
    let rotated = from.rotate_from_to(from, to);
    assert_relative_eq!(rotated.x, to.x, epsilon = 1e-5);
    assert_relative_eq!(rotated.y, to.y, epsilon = 1e-5);
    assert_relative_eq!(rotated.z, to.z, epsilon = 1e-5);
}

#[test]
fn test_rotate_from_to_opposite() {
    let from = Vec3::new(0.0, 0.0, 1.0);
    let to = Vec3::new(0.0, 0.0, -1.0);
    let rotated = from.rotate_from_to(from, to);
    assert_relative_eq!(rotated.x, to.x, epsilon = 1e-5);
    assert_relative_eq!(rotated.y, to.y, epsilon = 1e-5);
    assert_relative_eq!(rotated.z, to.z, epsilon = 1e-5);
}

#[test]
fn test_rotate_about_axis_preserves_norm() {
    let v = Vec3::new(1.0, 2.0, 3.0);
    let axis = Vec3::new(0.0, 1.0, 0.0);
    let rotated = v.rotate_about_axis(axis, 1.234);
    assert_relative_eq!(rotated.norm(), v.norm(), epsilon = 1e-5);
}

#[test]
fn test_rotate_from_to_about_axis() {
    // rotating -z onto x about the y axis is a quarter turn
    let v = Vec3::new(0.0, 0.0, -1.0);
    let rotated = v.rotate_from_to_about(Vec3::new(0.0, 0.0, -1.0),
                                         Vec3::new(1.0, 0.0, 0.0),
                                         Vec3::new(0.0, 1.0, 0.0));
    assert_relative_eq!(rotated.x, 1.0, epsilon = 1e-5);
    assert_relative_eq!(rotated.y, 0.0, epsilon = 1e-5);
    assert_relative_eq!(rotated.z, 0.0, epsilon = 1e-5);
}

#[test]
fn test_from_phi_theta() {
    let v = Vec3::from_phi_theta(0.0, 0.0);
    assert_relative_eq!(v.z, 1.0, epsilon = 1e-6);
    let v = Vec3::from_phi_theta(0.0, consts::FRAC_PI_2);
    assert_relative_eq!(v.x, 1.0, epsilon = 1e-6);
    assert_relative_eq!(v.norm(), 1.0, epsilon = 1e-6);
}
