use crate::camera::Camera;
use crate::geometry::{Pentagon, Sphere, Triangle};
use crate::material::Material;
use glam::Vec3;
use rtdemo_uniforms::{FieldType, StructDef, UniformBlock, UniformLayout, UniformType};
use serde::{Deserialize, Serialize};

/// Capacities of the shader-side arrays.
pub const MAX_TRIANGLES: usize = 64;
pub const MAX_SPHERES: usize = 16;
pub const MAX_PENTAGONS: usize = 16;
pub const MAX_MATERIALS: usize = 16;

/// Errors from scene validation and scene files.
#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    #[error("too many {kind}: {count} exceeds the shader limit of {max}")]
    Capacity {
        kind: &'static str,
        count: usize,
        max: usize,
    },
    #[error("{kind}[{index}] references missing material {material_id}")]
    MissingMaterial {
        kind: &'static str,
        index: usize,
        material_id: u32,
    },
    #[error("spheres[{index}] has non-positive radius {radius}")]
    BadRadius { index: usize, radius: f32 },
    #[error("materials[{index}]: {reason}")]
    InvalidMaterial { index: usize, reason: &'static str },
    #[error("camera: {reason}")]
    InvalidCamera { reason: &'static str },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported scene file extension: {0:?}")]
    UnsupportedFormat(String),
}

/// Point light.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Light {
    pub position: Vec3,
}

/// Everything the tracing shader needs to draw one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    pub name: String,
    #[serde(default)]
    pub camera: Camera,
    pub light: Light,
    pub materials: Vec<Material>,
    #[serde(default)]
    pub triangles: Vec<Triangle>,
    #[serde(default)]
    pub spheres: Vec<Sphere>,
    #[serde(default)]
    pub pentagons: Vec<Pentagon>,
}

impl Scene {
    /// Check capacities, material references and value ranges.
    pub fn validate(&self) -> Result<(), SceneError> {
        let capacity = |kind, count, max| {
            if count > max {
                Err(SceneError::Capacity { kind, count, max })
            } else {
                Ok(())
            }
        };
        capacity("triangles", self.triangles.len(), MAX_TRIANGLES)?;
        capacity("spheres", self.spheres.len(), MAX_SPHERES)?;
        capacity("pentagons", self.pentagons.len(), MAX_PENTAGONS)?;
        capacity("materials", self.materials.len(), MAX_MATERIALS)?;

        self.camera
            .check()
            .map_err(|reason| SceneError::InvalidCamera { reason })?;

        for (index, material) in self.materials.iter().enumerate() {
            material
                .check()
                .map_err(|reason| SceneError::InvalidMaterial { index, reason })?;
        }

        let known = self.materials.len();
        let check_ref = |kind, index, material_id: u32| {
            if material_id as usize >= known {
                Err(SceneError::MissingMaterial {
                    kind,
                    index,
                    material_id,
                })
            } else {
                Ok(())
            }
        };
        for (i, t) in self.triangles.iter().enumerate() {
            check_ref("triangles", i, t.material_id)?;
        }
        for (i, s) in self.spheres.iter().enumerate() {
            check_ref("spheres", i, s.material_id)?;
            if s.radius <= 0.0 || s.radius.is_nan() {
                return Err(SceneError::BadRadius {
                    index: i,
                    radius: s.radius,
                });
            }
        }
        for (i, p) in self.pentagons.iter().enumerate() {
            check_ref("pentagons", i, p.material_id)?;
        }
        Ok(())
    }

    /// Write the whole scene into `block`, slot by slot.
    ///
    /// Entries past the limits have no slot and are skipped by the block.
    pub fn upload(&self, block: &mut UniformBlock) {
        self.camera.upload(block);
        block.set_vec3("uLight.position", self.light.position);

        block.set_i32("triangles_used", self.triangles.len().min(MAX_TRIANGLES) as i32);
        block.set_i32("spheres_used", self.spheres.len().min(MAX_SPHERES) as i32);
        block.set_i32("pentagons_used", self.pentagons.len().min(MAX_PENTAGONS) as i32);

        for (i, t) in self.triangles.iter().enumerate() {
            block.set_vec3(&format!("triangles[{i}].v1"), t.v1);
            block.set_vec3(&format!("triangles[{i}].v2"), t.v2);
            block.set_vec3(&format!("triangles[{i}].v3"), t.v3);
            block.set_i32(&format!("triangles[{i}].MaterialId"), t.material_id as i32);
        }

        for (i, s) in self.spheres.iter().enumerate() {
            block.set_vec3(&format!("spheres[{i}].center"), s.center);
            block.set_f32(&format!("spheres[{i}].radius"), s.radius);
            block.set_i32(&format!("spheres[{i}].MaterialId"), s.material_id as i32);
        }

        for (i, p) in self.pentagons.iter().enumerate() {
            for (k, v) in p.vertices.iter().enumerate() {
                block.set_vec3(&format!("pentagons[{i}].v{}", k + 1), *v);
            }
            block.set_i32(&format!("pentagons[{i}].MaterialId"), p.material_id as i32);
        }

        for (i, m) in self.materials.iter().enumerate() {
            block.set_vec3(&format!("materials[{i}].color"), m.color);
            block.set_vec4(&format!("materials[{i}].lightCoeffs"), m.light_coeffs);
            block.set_f32(&format!("materials[{i}].reflectionCoef"), m.reflection_coef);
            block.set_f32(&format!("materials[{i}].refractionCoef"), m.refraction_coef);
            block.set_f32(&format!("materials[{i}].refractionIndex"), m.refraction_index);
            block.set_i32(&format!("materials[{i}].MaterialType"), m.kind.wire());
        }

        tracing::debug!(
            scene = %self.name,
            triangles = self.triangles.len(),
            spheres = self.spheres.len(),
            pentagons = self.pentagons.len(),
            materials = self.materials.len(),
            "scene uploaded"
        );
    }
}

/// Layout of the uniform block the tracing shader declares.
pub fn shader_layout() -> UniformLayout {
    let camera = StructDef::new("Camera")
        .field("position", UniformType::Vec3)
        .field("view", UniformType::Vec3)
        .field("up", UniformType::Vec3)
        .field("right", UniformType::Vec3)
        .field("scale", UniformType::Vec2);
    let light = StructDef::new("Light").field("position", UniformType::Vec3);
    let triangle = StructDef::new("Triangle")
        .field("v1", UniformType::Vec3)
        .field("v2", UniformType::Vec3)
        .field("v3", UniformType::Vec3)
        .field("MaterialId", UniformType::Int);
    let sphere = StructDef::new("Sphere")
        .field("center", UniformType::Vec3)
        .field("radius", UniformType::Float)
        .field("MaterialId", UniformType::Int);
    let pentagon = StructDef::new("Pentagon")
        .field("v1", UniformType::Vec3)
        .field("v2", UniformType::Vec3)
        .field("v3", UniformType::Vec3)
        .field("v4", UniformType::Vec3)
        .field("v5", UniformType::Vec3)
        .field("MaterialId", UniformType::Int);
    let material = StructDef::new("Material")
        .field("color", UniformType::Vec3)
        .field("lightCoeffs", UniformType::Vec4)
        .field("reflectionCoef", UniformType::Float)
        .field("refractionCoef", UniformType::Float)
        .field("refractionIndex", UniformType::Float)
        .field("MaterialType", UniformType::Int);

    UniformLayout::new(
        StructDef::new("SceneUniforms")
            .field("uCamera", camera)
            .field("uLight", light)
            .field("triangles_used", UniformType::Int)
            .field("spheres_used", UniformType::Int)
            .field("pentagons_used", UniformType::Int)
            .field("triangles", FieldType::array(triangle, MAX_TRIANGLES))
            .field("spheres", FieldType::array(sphere, MAX_SPHERES))
            .field("pentagons", FieldType::array(pentagon, MAX_PENTAGONS))
            .field("materials", FieldType::array(material, MAX_MATERIALS)),
    )
}
