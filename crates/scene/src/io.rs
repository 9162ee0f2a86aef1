//! Scene files: YAML or JSON, picked by extension.

use crate::scene::{Scene, SceneError};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Yaml,
    Json,
}

impl Format {
    pub fn from_path(path: &Path) -> Result<Self, SceneError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        match ext.as_str() {
            "yaml" | "yml" => Ok(Self::Yaml),
            "json" => Ok(Self::Json),
            _ => Err(SceneError::UnsupportedFormat(ext)),
        }
    }
}

pub fn from_str(text: &str, format: Format) -> Result<Scene, SceneError> {
    let scene: Scene = match format {
        Format::Yaml => serde_yaml::from_str(text)?,
        Format::Json => serde_json::from_str(text)?,
    };
    scene.validate()?;
    Ok(scene)
}

pub fn to_string(scene: &Scene, format: Format) -> Result<String, SceneError> {
    Ok(match format {
        Format::Yaml => serde_yaml::to_string(scene)?,
        Format::Json => serde_json::to_string_pretty(scene)?,
    })
}

/// Read and validate a scene file.
pub fn load(path: impl AsRef<Path>) -> Result<Scene, SceneError> {
    let path = path.as_ref();
    let format = Format::from_path(path)?;
    let text = std::fs::read_to_string(path)?;
    let scene = from_str(&text, format)?;
    tracing::info!("loaded scene {:?} from {}", scene.name, path.display());
    Ok(scene)
}

pub fn save(scene: &Scene, path: impl AsRef<Path>) -> Result<(), SceneError> {
    let path = path.as_ref();
    let text = to_string(scene, Format::from_path(path)?)?;
    std::fs::write(path, text)?;
    tracing::info!("saved scene {:?} to {}", scene.name, path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presets::SceneKind;

    #[test]
    fn format_from_extension() {
        assert_eq!(Format::from_path(Path::new("a.yaml")).unwrap(), Format::Yaml);
        assert_eq!(Format::from_path(Path::new("a.YML")).unwrap(), Format::Yaml);
        assert_eq!(Format::from_path(Path::new("a.json")).unwrap(), Format::Json);
        assert!(matches!(
            Format::from_path(Path::new("a.toml")),
            Err(SceneError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn save_then_load_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("room.yaml");
        let scene = SceneKind::Room.build();
        save(&scene, &path).unwrap();
        assert_eq!(load(&path).unwrap(), scene);
    }

    #[test]
    fn save_then_load_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dodeca.json");
        let scene = SceneKind::Dodecahedron.build();
        save(&scene, &path).unwrap();
        assert_eq!(load(&path).unwrap(), scene);
    }

    #[test]
    fn minimal_yaml_uses_default_camera() {
        let text = r#"
name: tiny
light:
  position: [0.0, 4.0, 0.0]
materials:
  - color: [1.0, 1.0, 1.0]
    light_coeffs: [0.4, 0.9, 0.6, 10.0]
    reflection_coef: 0.0
    refraction_coef: 0.0
    refraction_index: 0.0
    kind: default
spheres:
  - center: [0.0, 0.0, 0.0]
    radius: 1.0
    material_id: 0
"#;
        let scene = from_str(text, Format::Yaml).unwrap();
        assert_eq!(scene.camera, crate::Camera::default());
        assert_eq!(scene.spheres.len(), 1);
        assert!(scene.triangles.is_empty());
    }

    #[test]
    fn camera_with_zero_view_is_rejected() {
        let text = r#"
name: blind
camera:
  position: [0.0, 0.0, -5.0]
  view: [0.0, 0.0, 0.0]
  up: [0.0, 1.0, 0.0]
  right: [1.0, 0.0, 0.0]
  scale: [1.0, 1.0]
light:
  position: [0.0, 4.0, 0.0]
materials: []
"#;
        assert_eq!(
            from_str(text, Format::Yaml).unwrap_err().to_string(),
            "camera: view has zero length"
        );
    }

    #[test]
    fn invalid_scene_file_is_rejected() {
        let text = r#"{"name": "bad", "light": {"position": [0, 0, 0]}, "materials": [],
            "spheres": [{"center": [0, 0, 0], "radius": 1.0, "material_id": 0}]}"#;
        assert!(matches!(
            from_str(text, Format::Json),
            Err(SceneError::MissingMaterial { .. })
        ));
    }
}
