
use vec::Vec3;

/// Pinhole camera: position `p`, view direction `n`, up direction `up`,
/// focal distance `f`, and the image plane it projects through, given by
/// its center `(icx, icy)` and size `(iw, ih)` in camera space.
#[derive(Clone, Copy, Debug)]
pub struct Camera {
    pub p: Vec3,
    pub n: Vec3,
    pub up: Vec3,
    pub f: f32,
    pub icx: f32,
    pub icy: f32,
    pub iw: f32,
    pub ih: f32,
}

impl Camera {
    pub fn new(p: Vec3, n: Vec3, up: Vec3, f: f32, icx: f32, icy: f32, iw: f32, ih: f32)
               -> Camera {
        Camera {
            p: p,
            n: n.normalized(),
            up: up.normalized(),
            f: f,
            icx: icx,
            icy: icy,
            iw: iw,
            ih: ih,
        }
    }
}
