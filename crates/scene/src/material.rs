use glam::{Vec3, Vec4};
use serde::{Deserialize, Serialize};

/// Shading model selector; the discriminant is what the shader receives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(i32)]
pub enum MaterialType {
    /// Phong-lit surface, optionally mirror-like through `reflection_coef`.
    Default = 1,
    /// Emitter: shaded with its own color only.
    Light = 2,
    /// Dielectric: refracts with `refraction_index`, reflects with Fresnel.
    Glass = 3,
}

impl MaterialType {
    pub fn wire(self) -> i32 {
        self as i32
    }
}

/// Phong coefficients used by the default wall materials.
const WALL_COEFFS: Vec4 = Vec4::new(0.4, 0.9, 0.6, 10.0);

/// Surface description stored in `materials[i]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub color: Vec3,
    /// Ambient, diffuse, specular weights and the specular exponent.
    pub light_coeffs: Vec4,
    pub reflection_coef: f32,
    pub refraction_coef: f32,
    pub refraction_index: f32,
    pub kind: MaterialType,
}

impl Material {
    pub fn diffuse(color: Vec3, reflection_coef: f32) -> Self {
        Self {
            color,
            light_coeffs: WALL_COEFFS,
            reflection_coef,
            refraction_coef: 0.0,
            refraction_index: 0.0,
            kind: MaterialType::Default,
        }
    }

    pub fn light(color: Vec3) -> Self {
        Self {
            color,
            light_coeffs: Vec4::ZERO,
            reflection_coef: 0.0,
            refraction_coef: 0.0,
            refraction_index: 0.0,
            kind: MaterialType::Light,
        }
    }

    pub fn glass(refraction_index: f32) -> Self {
        Self {
            color: Vec3::ONE,
            light_coeffs: Vec4::new(0.0, 0.0, 0.6, 10.0),
            reflection_coef: 0.02,
            refraction_coef: 0.98,
            refraction_index,
            kind: MaterialType::Glass,
        }
    }

    /// Check the ranges the shader relies on. Returns the first violation.
    pub fn check(&self) -> Result<(), &'static str> {
        let unit = 0.0..=1.0;
        if !unit.contains(&self.reflection_coef) {
            return Err("reflection coefficient outside [0, 1]");
        }
        if !unit.contains(&self.refraction_coef) {
            return Err("refraction coefficient outside [0, 1]");
        }
        if self.light_coeffs.x < 0.0 || self.light_coeffs.y < 0.0 || self.light_coeffs.z < 0.0 {
            return Err("negative lighting coefficient");
        }
        if self.color.min_element() < 0.0 {
            return Err("negative color component");
        }
        if self.kind == MaterialType::Glass && self.refraction_index < 1.0 {
            return Err("glass refraction index below 1");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_values_match_shader_constants() {
        assert_eq!(MaterialType::Default.wire(), 1);
        assert_eq!(MaterialType::Light.wire(), 2);
        assert_eq!(MaterialType::Glass.wire(), 3);
    }

    #[test]
    fn constructors_are_valid() {
        assert!(Material::diffuse(Vec3::new(0.5, 0.5, 0.5), 0.5).check().is_ok());
        assert!(Material::light(Vec3::splat(10.0)).check().is_ok());
        assert!(Material::glass(1.47).check().is_ok());
    }

    #[test]
    fn out_of_range_coefficients_fail() {
        let mut m = Material::diffuse(Vec3::ONE, 1.5);
        assert!(m.check().is_err());
        m.reflection_coef = 0.5;
        m.refraction_coef = -0.1;
        assert!(m.check().is_err());
        assert!(Material::glass(0.8).check().is_err());
    }
}
