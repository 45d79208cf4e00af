
use rand::{Rng, StdRng};

use math::coordinate_system;
use montecarlo::cosine_sample_hemisphere;
use primitive::Intersection;
use ray::{Ray, RAY_OFFSET};
use vec::Vec3;

bitflags! {
    pub struct MaterialType: u32 {
        const EMISSIVE = 0b001;
        const DIFFUSE  = 0b010;
        const SPECULAR = 0b100;
    }
}

/// A surface's scattering capabilities. Probabilities are Russian-roulette
/// survival probabilities: `diffuse + specular <= 1` for every wave index,
/// the remainder being absorption. The sampling operations write the
/// reflectance spectrum into the caller's scratch buffer and return a ray
/// whose origin is already offset off the surface; monochromaticity and
/// refraction state of the path are the tracer's to carry over.
pub trait Material {
    fn material_type(&self) -> MaterialType;

    fn is_emissive(&self) -> bool {
        self.material_type().contains(MaterialType::EMISSIVE)
    }

    fn is_reflective(&self) -> bool {
        self.material_type()
            .intersects(MaterialType::DIFFUSE | MaterialType::SPECULAR)
    }

    fn diffuse_reflection_probability(&self, wave_index: Option<usize>) -> f32;

    fn specular_reflection_probability(&self, wave_index: Option<usize>) -> f32;

    /// Emitted radiance along the incoming ray, per wavelength bin.
    fn radiance(&self, ray: &Ray, intersection: &Intersection, out: &mut [f32]);

    fn sample_diffuse(&self,
                      ray: &Ray,
                      intersection: &Intersection,
                      reflectance: &mut [f32],
                      rng: &mut StdRng)
                      -> Ray;

    /// `None` when the sampled specular direction points into the surface.
    fn sample_specular(&self,
                       ray: &Ray,
                       intersection: &Intersection,
                       reflectance: &mut [f32],
                       rng: &mut StdRng)
                       -> Option<Ray>;
}

/// Surface normal flipped, if needed, to face the incoming ray.
fn oriented_normal(normal: Vec3, incoming: Vec3) -> Vec3 {
    if normal.dot(incoming) > 0.0 {
        -normal
    } else {
        normal
    }
}

/// Lambertian surface with an optional emission spectrum. The survival
/// probability of a full-spectrum ray is the reflectance maximum, so that
/// no per-bin weight ever grows past one.
pub struct DiffuseMaterial {
    reflectance: Vec<f32>,
    emission: Option<Vec<f32>>,
    survival: f32,
}

impl DiffuseMaterial {
    pub fn new(reflectance: Vec<f32>, emission: Option<Vec<f32>>) -> DiffuseMaterial {
        let survival = reflectance.iter().cloned().fold(0.0f32, f32::max);
        DiffuseMaterial {
            reflectance: reflectance,
            emission: emission,
            survival: survival,
        }
    }
}

impl Material for DiffuseMaterial {
    fn material_type(&self) -> MaterialType {
        let mut t = MaterialType::empty();
        if self.emission.is_some() {
            t.insert(MaterialType::EMISSIVE);
        }
        if self.survival > 0.0 {
            t.insert(MaterialType::DIFFUSE);
        }
        t
    }

    fn diffuse_reflection_probability(&self, wave_index: Option<usize>) -> f32 {
        match wave_index {
            None => self.survival,
            Some(t) => self.reflectance[t],
        }
    }

    fn specular_reflection_probability(&self, _: Option<usize>) -> f32 {
        0.0
    }

    fn radiance(&self, _: &Ray, _: &Intersection, out: &mut [f32]) {
        match self.emission {
            Some(ref emission) => out.copy_from_slice(emission),
            None => {
                for value in out.iter_mut() {
                    *value = 0.0;
                }
            }
        }
    }

    fn sample_diffuse(&self,
                      ray: &Ray,
                      intersection: &Intersection,
                      reflectance: &mut [f32],
                      rng: &mut StdRng)
                      -> Ray {
        let normal = oriented_normal(intersection.normal, ray.direction);
        let local = cosine_sample_hemisphere(rng.next_f32(), rng.next_f32());
        let (tangent, binormal) = coordinate_system(&normal);
        let direction =
            (tangent * local.x + binormal * local.y + normal * local.z).normalized();
        reflectance.copy_from_slice(&self.reflectance);
        Ray::new(intersection.point + direction * RAY_OFFSET, direction)
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

/// Ideal mirror.
pub struct MirrorMaterial {
    reflectance: Vec<f32>,
    survival: f32,
}

impl MirrorMaterial {
    pub fn new(reflectance: Vec<f32>) -> MirrorMaterial {
        let survival = reflectance.iter().cloned().fold(0.0f32, f32::max);
        MirrorMaterial {
            reflectance: reflectance,
            survival: survival,
        }
    }
}

impl Material for MirrorMaterial {
    fn material_type(&self) -> MaterialType {
        MaterialType::SPECULAR
    }

    fn diffuse_reflection_probability(&self, _: Option<usize>) -> f32 {
        0.0
    }

    fn specular_reflection_probability(&self, wave_index: Option<usize>) -> f32 {
        match wave_index {
            None => self.survival,
            Some(t) => self.reflectance[t],
        }
    }

    fn radiance(&self, _: &Ray, _: &Intersection, out: &mut [f32]) {
        for value in out.iter_mut() {
            *value = 0.0;
        }
    }

    fn sample_diffuse(&self,
                      ray: &Ray,
                      intersection: &Intersection,
                      reflectance: &mut [f32],
                      _: &mut StdRng)
                      -> Ray {
        // never selected (diffuse probability is zero); bounce straight back
        reflectance.copy_from_slice(&self.reflectance);
        Ray::new(intersection.point - ray.direction * RAY_OFFSET, -ray.direction)
    }

    fn sample_specular(&self,
                       ray: &Ray,
                       intersection: &Intersection,
                       reflectance: &mut [f32],
                       _: &mut StdRng)
                       -> Option<Ray> {
        let normal = oriented_normal(intersection.normal, ray.direction);
        let direction =
            (ray.direction - normal * (2.0 * ray.direction.dot(normal))).normalized();
        if direction.dot(normal) <= 0.0 {
            return None;
        }
        reflectance.copy_from_slice(&self.reflectance);
        Some(Ray::new(intersection.point + direction * RAY_OFFSET, direction))
    }
}
