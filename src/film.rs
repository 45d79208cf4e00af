
use std::sync::Mutex;

use vec::Vec3;

/// Accumulated XYZ sums with per-pixel sample counts. The mutex makes the
/// commit the single serialization point between workers; everything else
/// in a render pass is thread-local.
pub struct Film {
    width: u32,
    height: u32,
    inner: Mutex<Buffers>,
}

struct Buffers {
    xyz: Vec<Vec3>,
    samples: Vec<u32>,
}

impl Film {
    pub fn new(width: u32, height: u32) -> Film {
        let pixels = (width * height) as usize;
        Film {
            width: width,
            height: height,
            inner: Mutex::new(Buffers {
                xyz: vec![Vec3::zero(); pixels],
                samples: vec![0; pixels],
            }),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Commit one full-frame pass: one more sample for every pixel.
    pub fn add_samples(&self, color: &[Vec3]) {
        let mut inner = self.inner.lock().unwrap();
        assert_eq!(color.len(), inner.xyz.len());
        for (i, c) in color.iter().enumerate() {
            inner.xyz[i] += *c;
            inner.samples[i] += 1;
        }
    }

    /// Sums and counts as of a single consistent point in time.
    pub fn snapshot(&self) -> (Vec<Vec3>, Vec<u32>) {
        let inner = self.inner.lock().unwrap();
        (inner.xyz.clone(), inner.samples.clone())
    }

    /// The smallest per-pixel sample count; zero before the first commit.
    pub fn min_samples(&self) -> u32 {
        let inner = self.inner.lock().unwrap();
        inner.samples.iter().cloned().min().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use vec::Vec3;
    use super::*;

    #[test]
    fn test_commit_accumulates() {
        let film = Film::new(2, 1);
        film.add_samples(&[Vec3::new(1.0, 0.0, 0.0), Vec3::new(0.0, 2.0, 0.0)]);
        film.add_samples(&[Vec3::new(1.0, 0.0, 0.0), Vec3::zero()]);
        let (xyz, samples) = film.snapshot();
        assert_relative_eq!(xyz[0].x, 2.0);
        assert_relative_eq!(xyz[1].y, 2.0);
        assert_eq!(samples, vec![2, 2]);
        assert_eq!(film.min_samples(), 2);
    }

    #[test]
    fn test_concurrent_commits_are_linearizable() {
        let film = Arc::new(Film::new(4, 4));
        let threads = 4u32;
        let commits = 25u32;
        let mut handles = Vec::new();
        for _ in 0..threads {
            let film = film.clone();
            handles.push(thread::spawn(move || {
                let batch = vec![Vec3::new(1.0, 1.0, 1.0); 16];
                for _ in 0..commits {
                    film.add_samples(&batch);
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }
        let (xyz, samples) = film.snapshot();
        for count in samples {
            assert_eq!(count, threads * commits);
        }
        for c in xyz {
            assert_relative_eq!(c.x, (threads * commits) as f32);
        }
    }
}
