
use vec::Vec3;

/// Maps a wavelength to its CIE tristimulus response.
pub trait XYZConverter {
    fn xyz(&self, wave_length: f32) -> Vec3;
    fn wave_length_min(&self) -> f32;
    fn wave_length_max(&self) -> f32;
}

/// CIE 1931 2-degree standard observer, evaluated with the multi-lobe
/// piecewise-Gaussian fit of the color matching functions (Wyman, Sloan
/// and Shirley, JCGT 2013). Accurate to about a percent over 380-780 nm,
/// which is well below the noise floor of a Monte-Carlo estimate.
pub struct CIE1931;

fn lobe(wave_length: f32, center: f32, sigma_lo: f32, sigma_hi: f32) -> f32 {
    let sigma = if wave_length < center { sigma_lo } else { sigma_hi };
    let t = (wave_length - center) / sigma;
    (-0.5 * t * t).exp()
}

impl XYZConverter for CIE1931 {
    fn xyz(&self, wave_length: f32) -> Vec3 {
        let w = wave_length;
        let x = 1.056 * lobe(w, 599.8, 37.9, 31.0) + 0.362 * lobe(w, 442.0, 16.0, 26.7)
            - 0.065 * lobe(w, 501.1, 20.4, 26.2);
        let y = 0.821 * lobe(w, 568.8, 46.9, 40.5) + 0.286 * lobe(w, 530.9, 16.3, 31.1);
        let z = 1.217 * lobe(w, 437.0, 11.8, 36.0) + 0.681 * lobe(w, 459.0, 26.0, 13.8);
        Vec3::new(x, y, z)
    }

    fn wave_length_min(&self) -> f32 {
        380.0
    }

    fn wave_length_max(&self) -> f32 {
        780.0
    }
}

#[test]
fn test_luminance_peaks_in_the_green() {
    let c = CIE1931;
    let y555 = c.xyz(555.0).y;
    assert!(y555 > c.xyz(450.0).y);
    assert!(y555 > c.xyz(650.0).y);
    assert!(y555 > 0.9 && y555 <= 1.05);
}

#[test]
fn test_blue_response() {
    let c = CIE1931;
    let blue = c.xyz(445.0);
    assert!(blue.z > blue.x && blue.z > blue.y);
}

#[test]
fn test_red_response() {
    let c = CIE1931;
    let red = c.xyz(610.0);
    assert!(red.x > red.z);
    assert!(red.x > 0.5);
}

#[test]
fn test_tails_vanish() {
    let c = CIE1931;
    let lo = c.xyz(380.0);
    let hi = c.xyz(780.0);
    assert!(lo.y < 0.05 && hi.y < 0.05);
    assert!(hi.z < 0.01);
}
