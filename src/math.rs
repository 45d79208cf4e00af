
use vec::Vec3;

/// Build an orthonormal basis around a unit vector.
pub fn coordinate_system(v1: &Vec3) -> (Vec3, Vec3) {
    let v2 = {
        if v1.x.abs() > v1.y.abs() {
            let invlen = 1.0 / (v1.x * v1.x + v1.z * v1.z).sqrt();
            Vec3::new(-v1.z * invlen, 0.0, v1.x * invlen)
        } else {
            let invlen = 1.0 / (v1.y * v1.y + v1.z * v1.z).sqrt();
            Vec3::new(0.0, v1.z * invlen, -v1.y * invlen)
        }
    };
    let v3 = v1.cross(v2);
    (v2, v3)
}

#[test]
fn test_unit_y() {
    let vy = Vec3::new(0.0, 1.0, 0.0);
    let (vz, vx) = coordinate_system(&vy);
    assert_relative_eq!(vx.x, -1.0);
    assert_relative_eq!(vz.z, -1.0);
    assert_relative_eq!(vy.dot(vz), 0.0);
    assert_relative_eq!(vy.dot(vx), 0.0);
}
