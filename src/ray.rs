
use vec::Vec3;

/// Offset applied along a scattered ray's direction so the new ray does
/// not immediately re-hit the surface it just left.
pub const RAY_OFFSET: f32 = 1e-4;

/// A ray either carries the whole spectrum (`wave_index` is `None`) or,
/// after a dispersive event, a single wavelength bin.
#[derive(Clone, Copy, Debug)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
    pub refracted: bool,
    pub wave_index: Option<usize>,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Ray {
        Ray {
            origin: origin,
            direction: direction,
            refracted: false,
            wave_index: None,
        }
    }
}
