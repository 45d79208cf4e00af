
use std::f32::consts;

use vec::Vec3;

#[inline]
pub fn concentric_sample_disc(u1: f32, u2: f32) -> (f32, f32) {
    // remap into [-1, 1]
    let sx = 2.0 * u1 - 1.0;
    let sy = 2.0 * u2 - 1.0;

    // map the square to (r, theta)

    // handle degeneracy at the origin
    if sx == 0.0 && sy == 0.0 {
        return (0.0, 0.0);
    }

    let (r, theta) = if sx >= -sy {
        if sx > sy {
            // first region of disc
            if sy > 0.0 {
                (sx, sy / sx)
            } else {
                (sx, 8.0 + sy / sx)
            }
        } else {
            // second region
            (sy, 2.0 - sx / sy)
        }
    } else {
        if sx <= sy {
            // third region of disc
            (-sx, 4.0 - sy / -sx)
        } else {
            // fourth region of disc
            (-sy, 6.0 + sx / -sy)
        }
    };

    let theta = theta * consts::FRAC_PI_4;
    let dx = r * theta.cos();
    let dy = r * theta.sin();
    (dx, dy)
}

#[inline]
pub fn cosine_sample_hemisphere(u1: f32, u2: f32) -> Vec3 {
    let (x, y) = concentric_sample_disc(u1, u2);
    let z = f32::max(0.0, 1.0 - x * x - y * y).sqrt();
    Vec3::new(x, y, z)
}

#[test]
fn test_disc_stays_in_unit_circle() {
    let mut u1 = 0.05;
    while u1 < 1.0 {
        let mut u2 = 0.05;
        while u2 < 1.0 {
            let (x, y) = concentric_sample_disc(u1, u2);
            assert!(x * x + y * y <= 1.0 + 1e-6);
            u2 += 0.1;
        }
        u1 += 0.1;
    }
}

#[test]
fn test_hemisphere_is_upper() {
    let v = cosine_sample_hemisphere(0.3, 0.8);
    assert!(v.z >= 0.0);
    assert_relative_eq!(v.norm(), 1.0, epsilon = 1e-5);
}
