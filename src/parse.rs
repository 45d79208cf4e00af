
use std::error;
use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::collections::HashMap;
use std::sync::Arc;

use serde_json;
use serde_json::{Map, Value};

use camera::Camera;
use material::{DiffuseMaterial, Material, MirrorMaterial};
use primitive::{PlanarMesh, Primitive, Triangle};
use scene::Scene;
use spectrum::Spectrum;
use vec::Vec3;

/// Anything that can go wrong while loading a scene file. Fatal for the
/// process: main reports it and exits with status 1.
#[derive(Debug)]
pub enum SceneError {
    Io(io::Error),
    Json(serde_json::Error),
    Format(String),
}

impl fmt::Display for SceneError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            SceneError::Io(ref e) => write!(f, "could not read scene file: {}", e),
            SceneError::Json(ref e) => write!(f, "scene file is not valid JSON: {}", e),
            SceneError::Format(ref what) => write!(f, "malformed scene: {}", what),
        }
    }
}

impl error::Error for SceneError {}

impl From<io::Error> for SceneError {
    fn from(e: io::Error) -> SceneError {
        SceneError::Io(e)
    }
}

impl From<serde_json::Error> for SceneError {
    fn from(e: serde_json::Error) -> SceneError {
        SceneError::Json(e)
    }
}

fn format_err<T>(what: String) -> Result<T, SceneError> {
    Err(SceneError::Format(what))
}

pub fn load_scene(path: &str) -> Result<(Scene, Spectrum), SceneError> {
    let mut file = File::open(path)?;
    let mut contents = String::new();
    file.read_to_string(&mut contents)?;
    parse_scene(&contents)
}

/// Parse the scene description from a JSON formatted string.
pub fn parse_scene(json: &str) -> Result<(Scene, Spectrum), SceneError> {
    let data: Value = serde_json::from_str(json)?;
    let root = as_object(&data, "scene root")?;

    let spectrum = parse_spectrum(get(root, "spectrum", "scene root")?)?;
    let camera = parse_camera(get(root, "camera", "scene root")?)?;
    let materials = parse_materials(get(root, "materials", "scene root")?, &spectrum)?;
    let primitives = parse_objects(get(root, "objects", "scene root")?, &materials)?;

    Ok((Scene::new(primitives, camera), spectrum))
}

fn get<'a>(data: &'a Map<String, Value>, key: &str, what: &str)
           -> Result<&'a Value, SceneError> {
    match data.get(key) {
        Some(value) => Ok(value),
        None => format_err(format!("{} is missing key '{}'", what, key)),
    }
}

fn as_object<'a>(value: &'a Value, what: &str)
                 -> Result<&'a Map<String, Value>, SceneError> {
    match value.as_object() {
        Some(object) => Ok(object),
        None => format_err(format!("{} should be a JSON object", what)),
    }
}

fn as_array<'a>(value: &'a Value, what: &str) -> Result<&'a Vec<Value>, SceneError> {
    match value.as_array() {
        Some(array) => Ok(array),
        None => format_err(format!("{} should be a JSON array", what)),
    }
}

fn as_number(value: &Value, what: &str) -> Result<f32, SceneError> {
    match value.as_f64() {
        Some(number) => Ok(number as f32),
        None => format_err(format!("{} should be a number", what)),
    }
}

fn as_string<'a>(value: &'a Value, what: &str) -> Result<&'a str, SceneError> {
    match value.as_str() {
        Some(s) => Ok(s),
        None => format_err(format!("{} should be a JSON string", what)),
    }
}

fn parse_vec3(value: &Value, what: &str) -> Result<Vec3, SceneError> {
    let data = as_array(value, what)?;
    if data.len() != 3 {
        return format_err(format!("{} should be an array of three numbers", what));
    }
    Ok(Vec3::new(as_number(&data[0], what)?,
                 as_number(&data[1], what)?,
                 as_number(&data[2], what)?))
}

fn parse_spectrum(value: &Value) -> Result<Spectrum, SceneError> {
    let data = as_object(value, "spectrum")?;
    let min = as_number(get(data, "min", "spectrum")?, "spectrum min")?;
    let max = as_number(get(data, "max", "spectrum")?, "spectrum max")?;
    let count = as_number(get(data, "count", "spectrum")?, "spectrum count")? as usize;
    if count == 0 || max < min {
        return format_err("spectrum needs count > 0 and max >= min".to_string());
    }
    Ok(Spectrum::even(min, max, count))
}

fn parse_camera(value: &Value) -> Result<Camera, SceneError> {
    let data = as_object(value, "camera")?;
    Ok(Camera::new(parse_vec3(get(data, "p", "camera")?, "camera p")?,
                   parse_vec3(get(data, "n", "camera")?, "camera n")?,
                   parse_vec3(get(data, "up", "camera")?, "camera up")?,
                   as_number(get(data, "f", "camera")?, "camera f")?,
                   as_number(get(data, "icx", "camera")?, "camera icx")?,
                   as_number(get(data, "icy", "camera")?, "camera icy")?,
                   as_number(get(data, "iw", "camera")?, "camera iw")?,
                   as_number(get(data, "ih", "camera")?, "camera ih")?))
}

/// A spectral quantity is either one number (flat across all wavelengths)
/// or [wavelength, value] control points resampled onto the scene bins.
fn parse_spectral(value: &Value, spectrum: &Spectrum, what: &str)
                  -> Result<Vec<f32>, SceneError> {
    if let Some(flat) = value.as_f64() {
        return Ok(vec![flat as f32; spectrum.count]);
    }
    let data = as_array(value, what)?;
    if data.is_empty() {
        return format_err(format!("{} needs at least one control point", what));
    }
    let mut points = Vec::with_capacity(data.len());
    for point in data {
        let pair = as_array(point, what)?;
        if pair.len() != 2 {
            return format_err(format!("{} control points are [wavelength, value] pairs",
                                      what));
        }
        points.push((as_number(&pair[0], what)?, as_number(&pair[1], what)?));
    }
    points.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap());
    Ok(spectrum.resample(&points))
}

fn parse_materials(value: &Value, spectrum: &Spectrum)
                   -> Result<HashMap<String, Arc<Material + Send + Sync>>, SceneError> {
    let data = as_object(value, "materials")?;
    let mut materials = HashMap::new();
    for (name, value) in data.iter() {
        let material = parse_material(value, spectrum, name)?;
        materials.insert(name.clone(), material);
    }
    Ok(materials)
}

fn parse_material(value: &Value, spectrum: &Spectrum, name: &str)
                  -> Result<Arc<Material + Send + Sync>, SceneError> {
    let data = as_object(value, "material")?;
    let kind = as_string(get(data, "type", "material")?, "material type")?;
    match kind {
        "diffuse" => {
            let reflectance = match data.get("reflectance") {
                Some(value) => parse_spectral(value, spectrum, "reflectance")?,
                None => vec![0.0; spectrum.count],
            };
            let emission = match data.get("emission") {
                Some(value) => Some(parse_spectral(value, spectrum, "emission")?),
                None => None,
            };
            Ok(Arc::new(DiffuseMaterial::new(reflectance, emission))
               as Arc<Material + Send + Sync>)
        }
        "mirror" => {
            let reflectance =
                parse_spectral(get(data, "reflectance", "material")?, spectrum,
                               "reflectance")?;
            Ok(Arc::new(MirrorMaterial::new(reflectance)) as Arc<Material + Send + Sync>)
        }
        other => format_err(format!("unrecognised material type '{}' for '{}'",
                                    other,
                                    name)),
    }
}

fn parse_objects(value: &Value,
                 materials: &HashMap<String, Arc<Material + Send + Sync>>)
                 -> Result<Vec<Primitive>, SceneError> {
    let data = as_array(value, "objects")?;
    let mut primitives = Vec::with_capacity(data.len());
    for object in data {
        primitives.push(parse_object(object, materials)?);
    }
    Ok(primitives)
}

fn parse_object(value: &Value,
                materials: &HashMap<String, Arc<Material + Send + Sync>>)
                -> Result<Primitive, SceneError> {
    let data = as_object(value, "object")?;
    let name = as_string(get(data, "name", "object")?, "object name")?;
    let material_name = as_string(get(data, "material", "object")?, "object material")?;
    let material = match materials.get(material_name) {
        Some(material) => material.clone(),
        None => {
            return format_err(format!("object '{}' uses unknown material '{}'",
                                      name,
                                      material_name));
        }
    };

    let outline = parse_polygon(get(data, "outline", "object")?, "outline")?;
    let holes = match data.get("holes") {
        Some(value) => {
            let mut holes = Vec::new();
            for hole in as_array(value, "holes")? {
                holes.push(parse_polygon(hole, "hole")?);
            }
            holes
        }
        None => Vec::new(),
    };

    // a bare triangle does not need the planar-mesh machinery
    if outline.len() == 3 && holes.is_empty() {
        return Ok(Primitive::Triangle(Triangle::new(outline[0],
                                                    outline[1],
                                                    outline[2],
                                                    material)));
    }
    Ok(Primitive::PlanarMesh(PlanarMesh::new(name.to_string(), outline, holes, material)))
}

fn parse_polygon(value: &Value, what: &str) -> Result<Vec<Vec3>, SceneError> {
    let data = as_array(value, what)?;
    if data.len() < 3 {
        return format_err(format!("{} needs at least three vertices", what));
    }
    let mut vertices = Vec::with_capacity(data.len());
    for vertex in data {
        vertices.push(parse_vec3(vertex, what)?);
    }
    Ok(vertices)
}
