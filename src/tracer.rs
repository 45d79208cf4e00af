
use std::sync::Arc;

use rand::{Rng, StdRng};

use color::XYZConverter;
use ray::Ray;
use scene::Scene;
use spectrum::Spectrum;
use vec::Vec3;

/// Per-worker scratch buffers, reused across passes so the hot path never
/// allocates. The tracer itself is stateless; workers own their scratch
/// and pass it down.
pub struct Scratch {
    pub weight: Vec<f32>,
    pub reflectance: Vec<f32>,
    pub radiance: Vec<f32>,
    pub color: Vec<Vec3>,
}

impl Scratch {
    fn new(bins: usize, pixels: usize) -> Scratch {
        Scratch {
            weight: vec![0.0; bins],
            reflectance: vec![0.0; bins],
            radiance: vec![0.0; bins],
            color: vec![Vec3::zero(); pixels],
        }
    }
}

/// One-sample-per-pixel spectral path estimator. Emission probabilities
/// and reflection probabilities act as Russian roulette; dividing the
/// carried weight by them keeps the estimator unbiased.
pub struct PathTracer {
    scene: Arc<Scene>,
    spectrum: Arc<Spectrum>,
    converter: Arc<XYZConverter + Send + Sync>,
    width: u32,
    height: u32,
}

impl PathTracer {
    pub fn new(scene: Arc<Scene>,
               spectrum: Arc<Spectrum>,
               converter: Arc<XYZConverter + Send + Sync>,
               width: u32,
               height: u32)
               -> PathTracer {
        PathTracer {
            scene: scene,
            spectrum: spectrum,
            converter: converter,
            width: width,
            height: height,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn scratch(&self) -> Scratch {
        Scratch::new(self.spectrum.count, (self.width * self.height) as usize)
    }

    /// Trace one jittered sample through every pixel into `scratch.color`.
    pub fn trace_pass(&self, scratch: &mut Scratch, rng: &mut StdRng) {
        for c in scratch.color.iter_mut() {
            *c = Vec3::zero();
        }
        for i in 0..self.height {
            for j in 0..self.width {
                let sample = self.sample_pixel(i, j, scratch, rng);
                scratch.color[(i * self.width + j) as usize] += sample;
            }
        }
    }

    /// Primary ray through pixel (i, j) with a uniform sub-pixel jitter:
    /// image-plane point, then two constrained rotations aligning the
    /// canonical frame with the camera's view and up directions.
    fn primary_ray(&self, i: u32, j: u32, rng: &mut StdRng) -> Ray {
        let camera = &self.scene.camera;
        let pixel_width = camera.iw / self.width as f32;
        let pixel_height = camera.ih / self.height as f32;
        let left = camera.icx - camera.iw / 2.0;
        let top = camera.icy + camera.ih / 2.0;

        let u = left + (j as f32 + rng.next_f32()) * pixel_width;
        let v = top - (i as f32 + rng.next_f32()) * pixel_height;

        let mut direction = Vec3::new(u, v, -camera.f);
        direction.normalize();
        let direction = direction
            .rotate_from_to_about(Vec3::new(0.0, 0.0, -1.0), camera.n, camera.up)
            .rotate_from_to_about(Vec3::new(0.0, 1.0, 0.0), camera.up, camera.n);

        Ray::new(camera.p, direction)
    }

    /// One XYZ sample for pixel (i, j): follow the path until it escapes,
    /// is absorbed, or deposits radiance.
    pub fn sample_pixel(&self, i: u32, j: u32, scratch: &mut Scratch, rng: &mut StdRng)
                        -> Vec3 {
        let spectrum = &*self.spectrum;
        let count = spectrum.count;
        let mut color = Vec3::zero();

        let mut ray = self.primary_ray(i, j, rng);
        for weight in scratch.weight.iter_mut() {
            *weight = 1.0;
        }

        loop {
            let intersection = match self.scene.intersect(&ray) {
                Some(intersection) => intersection,
                None => break,
            };
            let material = intersection.primitive.material();

            let mut reflection_probability = 1.0;
            if material.is_emissive() {
                let reflective = material.is_reflective();
                // roulette between emitting here and reflecting onwards
                let emission_probability = if reflective { 0.9 } else { 1.0 };
                if !reflective || rng.next_f32() < emission_probability {
                    material.radiance(&ray, &intersection, &mut scratch.radiance);
                    match ray.wave_index {
                        None => {
                            for t in 0..count {
                                let r = scratch.radiance[t] * scratch.weight[t]
                                    / emission_probability;
                                color += self.converter.xyz(spectrum.values[t])
                                    * (r / count as f32);
                            }
                        }
                        Some(w) => {
                            let r =
                                scratch.radiance[w] * scratch.weight[w] / emission_probability;
                            color += self.converter.xyz(spectrum.values[w]) * r;
                        }
                    }
                    break;
                }
                reflection_probability = 1.0 - emission_probability;
            }

            let diffuse_probability = material.diffuse_reflection_probability(ray.wave_index);
            let specular_probability =
                material.specular_reflection_probability(ray.wave_index);

            let next = rng.next_f32();
            let scattered = if next < diffuse_probability {
                reflection_probability *= diffuse_probability;
                material.sample_diffuse(&ray, &intersection, &mut scratch.reflectance, rng)
            } else if next < diffuse_probability + specular_probability {
                match material.sample_specular(&ray,
                                               &intersection,
                                               &mut scratch.reflectance,
                                               rng) {
                    Some(scattered) => {
                        reflection_probability *= specular_probability;
                        scattered
                    }
                    // the sampled specular ray points into the surface
                    None => break,
                }
            } else {
                // absorbed
                break;
            };

            match ray.wave_index {
                None => {
                    for t in 0..count {
                        scratch.weight[t] *= scratch.reflectance[t] / reflection_probability;
                    }
                }
                Some(w) => {
                    scratch.weight[w] *= scratch.reflectance[w] / reflection_probability;
                }
            }

            // the scatter sample chose origin and direction; the path's
            // monochromaticity and refraction state carry over
            ray = Ray {
                origin: scattered.origin,
                direction: scattered.direction,
                refracted: ray.refracted,
                wave_index: ray.wave_index,
            };
        }

        color
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rand::{SeedableRng, StdRng};

    use camera::Camera;
    use color::{CIE1931, XYZConverter};
    use material::{DiffuseMaterial, Material, MaterialType};
    use primitive::{Intersection, Primitive, Triangle};
    use ray::Ray;
    use scene::Scene;
    use spectrum::Spectrum;
    use vec::Vec3;
    use super::*;

    fn test_rng(seed: usize) -> StdRng {
        SeedableRng::from_seed(&[seed][..])
    }

    fn front_camera() -> Camera {
        Camera::new(Vec3::zero(),
                    Vec3::new(0.0, 0.0, -1.0),
                    Vec3::new(0.0, 1.0, 0.0),
                    1.0,
                    0.0,
                    0.0,
                    2.0,
                    2.0)
    }

    fn quad(z: f32, half: f32, material: &Arc<Material + Send + Sync>) -> Vec<Primitive> {
        vec![Primitive::Triangle(Triangle::new(Vec3::new(-half, -half, z),
                                               Vec3::new(half, -half, z),
                                               Vec3::new(half, half, z),
                                               material.clone())),
             Primitive::Triangle(Triangle::new(Vec3::new(-half, -half, z),
                                               Vec3::new(half, half, z),
                                               Vec3::new(-half, half, z),
                                               material.clone()))]
    }

    fn tracer_over(primitives: Vec<Primitive>,
                   spectrum: Spectrum,
                   width: u32,
                   height: u32)
                   -> PathTracer {
        let scene = Arc::new(Scene::new(primitives, front_camera()));
        PathTracer::new(scene,
                        Arc::new(spectrum),
                        Arc::new(CIE1931),
                        width,
                        height)
    }

    #[test]
    fn test_empty_scene_contributes_zero() {
        let tracer = tracer_over(Vec::new(), Spectrum::even(400.0, 700.0, 4), 2, 2);
        let mut scratch = tracer.scratch();
        let mut rng = test_rng(3);
        let sample = tracer.sample_pixel(0, 0, &mut scratch, &mut rng);
        assert_eq!(sample, Vec3::zero());
    }

    #[test]
    fn test_emissive_plane_matches_the_analytic_value() {
        // a purely emissive wall filling the view: every sample is exactly
        // the mean of the color matching samples, no variance at all
        let spectrum = Spectrum::even(400.0, 700.0, 4);
        let lamp: Arc<Material + Send + Sync> =
            Arc::new(DiffuseMaterial::new(vec![0.0; 4], Some(vec![1.0; 4])));
        let tracer = tracer_over(quad(-1.0, 4.0, &lamp), spectrum.clone(), 2, 2);

        let mut expected = Vec3::zero();
        let converter = CIE1931;
        for &wave_length in &spectrum.values {
            expected += converter.xyz(wave_length) / spectrum.count as f32;
        }

        let mut scratch = tracer.scratch();
        let mut rng = test_rng(11);
        for i in 0..2 {
            for j in 0..2 {
                let sample = tracer.sample_pixel(i, j, &mut scratch, &mut rng);
                assert_relative_eq!(sample.x, expected.x, epsilon = 1e-4);
                assert_relative_eq!(sample.y, expected.y, epsilon = 1e-4);
                assert_relative_eq!(sample.z, expected.z, epsilon = 1e-4);
            }
        }
    }

    /// A surface whose specular sampler always reports a direction into
    /// the surface; paths hitting it must die instead of looping.
    struct DeadEndMaterial;

    impl Material for DeadEndMaterial {
        fn material_type(&self) -> MaterialType {
            MaterialType::SPECULAR
        }

        fn diffuse_reflection_probability(&self, _: Option<usize>) -> f32 {
            0.0
        }

        fn specular_reflection_probability(&self, _: Option<usize>) -> f32 {
            1.0
        }

        fn radiance(&self, _: &Ray, _: &Intersection, out: &mut [f32]) {
            for value in out.iter_mut() {
                *value = 0.0;
            }
        }

        fn sample_diffuse(&self,
                          ray: &Ray,
                          intersection: &Intersection,
                          _: &mut [f32],
                          _: &mut StdRng)
                          -> Ray {
            Ray::new(intersection.point, -ray.direction)
        }

        fn sample_specular(&self,
                           _: &Ray,
                           _: &Intersection,
                           _: &mut [f32],
                           _: &mut StdRng)
                           -> Option<Ray> {
            None
        }
    }

    #[test]
    fn test_specular_dead_end_terminates() {
        let material: Arc<Material + Send + Sync> = Arc::new(DeadEndMaterial);
        let tracer = tracer_over(quad(-1.0, 4.0, &material),
                                 Spectrum::even(400.0, 700.0, 4),
                                 2,
                                 2);
        let mut scratch = tracer.scratch();
        let mut rng = test_rng(17);
        // would spin forever if the dead end did not terminate the path
        let sample = tracer.sample_pixel(1, 1, &mut scratch, &mut rng);
        assert_eq!(sample, Vec3::zero());
    }

    #[test]
    fn test_colored_walls_tint_their_side() {
        // an open box: red wall on the left, green on the right, white
        // floor and back, emissive ceiling; red must dominate the X mean
        // of the left columns
        let spectrum = Spectrum::even(400.0, 700.0, 4);
        let red: Arc<Material + Send + Sync> =
            Arc::new(DiffuseMaterial::new(vec![0.05, 0.05, 0.9, 0.9], None));
        let green: Arc<Material + Send + Sync> =
            Arc::new(DiffuseMaterial::new(vec![0.05, 0.7, 0.2, 0.05], None));
        let white: Arc<Material + Send + Sync> =
            Arc::new(DiffuseMaterial::new(vec![0.6; 4], None));
        let lamp: Arc<Material + Send + Sync> =
            Arc::new(DiffuseMaterial::new(vec![0.0; 4], Some(vec![1.0; 4])));

        let mut primitives = Vec::new();
        // left wall x = -1
        primitives.push(Primitive::Triangle(Triangle::new(Vec3::new(-1.0, -1.0, 0.5),
                                                          Vec3::new(-1.0, -1.0, -2.0),
                                                          Vec3::new(-1.0, 1.0, -2.0),
                                                          red.clone())));
        primitives.push(Primitive::Triangle(Triangle::new(Vec3::new(-1.0, -1.0, 0.5),
                                                          Vec3::new(-1.0, 1.0, -2.0),
                                                          Vec3::new(-1.0, 1.0, 0.5),
                                                          red.clone())));
        // right wall x = 1
        primitives.push(Primitive::Triangle(Triangle::new(Vec3::new(1.0, -1.0, 0.5),
                                                          Vec3::new(1.0, -1.0, -2.0),
                                                          Vec3::new(1.0, 1.0, -2.0),
                                                          green.clone())));
        primitives.push(Primitive::Triangle(Triangle::new(Vec3::new(1.0, -1.0, 0.5),
                                                          Vec3::new(1.0, 1.0, -2.0),
                                                          Vec3::new(1.0, 1.0, 0.5),
                                                          green.clone())));
        // back wall z = -2
        primitives.push(Primitive::Triangle(Triangle::new(Vec3::new(-1.0, -1.0, -2.0),
                                                          Vec3::new(1.0, -1.0, -2.0),
                                                          Vec3::new(1.0, 1.0, -2.0),
                                                          white.clone())));
        primitives.push(Primitive::Triangle(Triangle::new(Vec3::new(-1.0, -1.0, -2.0),
                                                          Vec3::new(1.0, 1.0, -2.0),
                                                          Vec3::new(-1.0, 1.0, -2.0),
                                                          white.clone())));
        // floor y = -1
        primitives.push(Primitive::Triangle(Triangle::new(Vec3::new(-1.0, -1.0, 0.5),
                                                          Vec3::new(1.0, -1.0, 0.5),
                                                          Vec3::new(1.0, -1.0, -2.0),
                                                          white.clone())));
        primitives.push(Primitive::Triangle(Triangle::new(Vec3::new(-1.0, -1.0, 0.5),
                                                          Vec3::new(1.0, -1.0, -2.0),
                                                          Vec3::new(-1.0, -1.0, -2.0),
                                                          white.clone())));
        // emissive ceiling y = 1
        primitives.push(Primitive::Triangle(Triangle::new(Vec3::new(-1.0, 1.0, 0.5),
                                                          Vec3::new(1.0, 1.0, 0.5),
                                                          Vec3::new(1.0, 1.0, -2.0),
                                                          lamp.clone())));
        primitives.push(Primitive::Triangle(Triangle::new(Vec3::new(-1.0, 1.0, 0.5),
                                                          Vec3::new(1.0, 1.0, -2.0),
                                                          Vec3::new(-1.0, 1.0, -2.0),
                                                          lamp.clone())));

        let width = 8;
        let height = 8;
        let tracer = tracer_over(primitives, spectrum, width, height);
        let mut scratch = tracer.scratch();
        let mut rng = test_rng(23);

        let passes = 400;
        let mut sums = vec![Vec3::zero(); (width * height) as usize];
        for _ in 0..passes {
            tracer.trace_pass(&mut scratch, &mut rng);
            for (sum, c) in sums.iter_mut().zip(scratch.color.iter()) {
                *sum += *c;
            }
        }

        let mut left_x = 0.0;
        let mut right_x = 0.0;
        for i in 0..height {
            for j in 0..2 {
                left_x += sums[(i * width + j) as usize].x;
                right_x += sums[(i * width + (width - 1 - j)) as usize].x;
            }
        }
        assert!(left_x > right_x,
                "left (red) X sum {} should exceed right (green) X sum {}",
                left_x,
                right_x);
    }
}
