
/// The wavelength discretization shared by every ray in flight: `count`
/// bins with their wavelengths in nanometers, in ascending order.
/// Immutable once the scene is loaded.
#[derive(Clone, Debug, PartialEq)]
pub struct Spectrum {
    pub count: usize,
    pub values: Vec<f32>,
}

impl Spectrum {
    pub fn new(values: Vec<f32>) -> Spectrum {
        Spectrum {
            count: values.len(),
            values: values,
        }
    }

    /// `count` evenly spaced wavelengths covering [min, max].
    pub fn even(min: f32, max: f32, count: usize) -> Spectrum {
        let mut values = Vec::with_capacity(count);
        if count == 1 {
            values.push((min + max) / 2.0);
        } else {
            let step = (max - min) / (count - 1) as f32;
            for i in 0..count {
                values.push(min + step * i as f32);
            }
        }
        Spectrum::new(values)
    }

    /// Resample a piecewise-linear curve given as sorted
    /// (wavelength, value) control points onto this spectrum's bins.
    /// Wavelengths outside the control range clamp to the end values.
    pub fn resample(&self, points: &[(f32, f32)]) -> Vec<f32> {
        assert!(!points.is_empty());
        self.values
            .iter()
            .map(|&wave_length| {
                if wave_length <= points[0].0 {
                    return points[0].1;
                }
                let last = points[points.len() - 1];
                if wave_length >= last.0 {
                    return last.1;
                }
                let mut i = 1;
                while points[i].0 < wave_length {
                    i += 1;
                }
                let (w0, v0) = points[i - 1];
                let (w1, v1) = points[i];
                let t = (wave_length - w0) / (w1 - w0);
                v0 + (v1 - v0) * t
            })
            .collect()
    }
}

#[test]
fn test_even_spacing() {
    let s = Spectrum::even(400.0, 700.0, 4);
    assert_eq!(s.count, 4);
    assert_relative_eq!(s.values[0], 400.0);
    assert_relative_eq!(s.values[1], 500.0);
    assert_relative_eq!(s.values[3], 700.0);
}

#[test]
fn test_resample_interpolates_and_clamps() {
    let s = Spectrum::even(400.0, 700.0, 4);
    let curve = s.resample(&[(450.0, 0.0), (650.0, 1.0)]);
    assert_relative_eq!(curve[0], 0.0); // clamped below
    assert_relative_eq!(curve[1], 0.25, epsilon = 1e-6);
    assert_relative_eq!(curve[2], 0.75, epsilon = 1e-6);
    assert_relative_eq!(curve[3], 1.0); // clamped above
}

#[test]
fn test_resample_flat() {
    let s = Spectrum::even(400.0, 700.0, 3);
    let curve = s.resample(&[(550.0, 0.5)]);
    assert_eq!(curve, vec![0.5, 0.5, 0.5]);
}
