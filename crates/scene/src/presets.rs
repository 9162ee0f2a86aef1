use crate::camera::Camera;
use crate::geometry::{Facing, Sphere, cube_faces, dodecahedron};
use crate::material::Material;
use crate::scene::{Light, Scene};
use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const GRAY: u32 = 0;
const RED: u32 = 1;
const CYAN: u32 = 2;
const GREEN: u32 = 3;
const BLUE: u32 = 4;
const LIGHT: u32 = 5;
const GLASS: u32 = 6;

const LIGHT_POSITION: Vec3 = Vec3::new(0.0, 2.0, -4.0);

/// Built-in scenes, selectable at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SceneKind {
    /// Colored room with a blue sphere, a glass sphere and a light bulb.
    Room,
    /// The same room around a glass dodecahedron.
    Dodecahedron,
}

impl SceneKind {
    pub const ALL: [SceneKind; 2] = [SceneKind::Room, SceneKind::Dodecahedron];

    pub fn name(self) -> &'static str {
        match self {
            Self::Room => "room",
            Self::Dodecahedron => "dodecahedron",
        }
    }

    pub fn build(self) -> Scene {
        match self {
            Self::Room => room(),
            Self::Dodecahedron => dodecahedron_room(),
        }
    }
}

impl fmt::Display for SceneKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SceneKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown scene {s:?}, expected one of: room, dodecahedron"))
    }
}

fn materials() -> Vec<Material> {
    vec![
        Material::diffuse(Vec3::splat(0.5), 0.0),
        Material::diffuse(Vec3::new(1.0, 0.0, 0.0), 0.5),
        Material::diffuse(Vec3::new(0.0, 1.0, 1.0), 0.0),
        Material::diffuse(Vec3::new(0.0, 1.0, 0.0), 0.5),
        Material::diffuse(Vec3::new(0.0, 0.0, 1.0), 0.1),
        Material::light(Vec3::splat(10.0)),
        Material::glass(1.47),
    ]
}

/// Ten-unit room; walls left, right, down, up, back, front.
fn walls() -> Vec<crate::geometry::Triangle> {
    cube_faces(
        Vec3::ZERO,
        5.0,
        [RED, GREEN, GRAY, GRAY, CYAN, GRAY],
        Facing::Inward,
    )
}

fn bulb() -> Sphere {
    Sphere::new(LIGHT_POSITION, 0.2, LIGHT)
}

fn room() -> Scene {
    Scene {
        name: SceneKind::Room.name().into(),
        camera: Camera::default(),
        light: Light {
            position: LIGHT_POSITION,
        },
        materials: materials(),
        triangles: walls(),
        spheres: vec![
            Sphere::new(Vec3::new(-1.0, -1.0, -2.0), 2.0, BLUE),
            Sphere::new(Vec3::new(2.0, 1.0, 2.0), 1.0, GLASS),
            bulb(),
        ],
        pentagons: Vec::new(),
    }
}

fn dodecahedron_room() -> Scene {
    Scene {
        name: SceneKind::Dodecahedron.name().into(),
        camera: Camera::default(),
        light: Light {
            position: LIGHT_POSITION,
        },
        materials: materials(),
        triangles: walls(),
        spheres: vec![bulb()],
        pentagons: dodecahedron(Vec3::new(0.0, -1.0, 0.0), 2.5, GLASS),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::MaterialType;

    #[test]
    fn parse_round_trips_names() {
        for kind in SceneKind::ALL {
            assert_eq!(kind.name().parse::<SceneKind>(), Ok(kind));
        }
        assert_eq!("ROOM".parse::<SceneKind>(), Ok(SceneKind::Room));
        assert!("cornell".parse::<SceneKind>().is_err());
    }

    #[test]
    fn room_contents() {
        let scene = SceneKind::Room.build();
        assert_eq!(scene.triangles.len(), 12);
        assert_eq!(scene.spheres.len(), 3);
        assert_eq!(scene.materials.len(), 7);
        assert_eq!(scene.materials[LIGHT as usize].kind, MaterialType::Light);
        assert_eq!(scene.spheres[2].center, scene.light.position);
    }

    #[test]
    fn dodecahedron_scene_is_glass() {
        let scene = SceneKind::Dodecahedron.build();
        assert_eq!(scene.pentagons.len(), 12);
        assert!(scene.pentagons.iter().all(|p| p.material_id == GLASS));
        assert_eq!(scene.materials[GLASS as usize].kind, MaterialType::Glass);
    }

    #[test]
    fn dodecahedron_stays_inside_room() {
        let scene = SceneKind::Dodecahedron.build();
        for p in &scene.pentagons {
            for v in p.vertices {
                assert!(v.abs().max_element() < 5.0);
            }
        }
    }
}
