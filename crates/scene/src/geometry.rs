use glam::Vec3;
use serde::{Deserialize, Serialize};

/// A triangle; its front side is the one `(v2-v1)×(v3-v1)` points to.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Triangle {
    pub v1: Vec3,
    pub v2: Vec3,
    pub v3: Vec3,
    pub material_id: u32,
}

impl Triangle {
    pub fn new(v1: Vec3, v2: Vec3, v3: Vec3, material_id: u32) -> Self {
        Self {
            v1,
            v2,
            v3,
            material_id,
        }
    }

    /// Unit normal on the front side.
    pub fn normal(&self) -> Vec3 {
        (self.v2 - self.v1).cross(self.v3 - self.v1).normalize()
    }

    pub fn centroid(&self) -> Vec3 {
        (self.v1 + self.v2 + self.v3) / 3.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sphere {
    pub center: Vec3,
    pub radius: f32,
    pub material_id: u32,
}

impl Sphere {
    pub fn new(center: Vec3, radius: f32, material_id: u32) -> Self {
        Self {
            center,
            radius,
            material_id,
        }
    }
}

/// Planar convex pentagon, wound like [`Triangle`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pentagon {
    pub vertices: [Vec3; 5],
    pub material_id: u32,
}

impl Pentagon {
    pub fn normal(&self) -> Vec3 {
        let [a, b, c, ..] = self.vertices;
        (b - a).cross(c - a).normalize()
    }

    pub fn centroid(&self) -> Vec3 {
        self.vertices.iter().copied().sum::<Vec3>() / 5.0
    }
}

/// Which way the front sides of generated faces point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Facing {
    /// Towards the center, for rooms seen from inside.
    Inward,
    /// Away from the center, for solids seen from outside.
    Outward,
}

/// Face frames as (outward normal, u, v) with `u × v == normal`.
/// Order: left, right, down, up, back, front.
const CUBE_FACES: [(Vec3, Vec3, Vec3); 6] = [
    (Vec3::NEG_X, Vec3::Z, Vec3::Y),
    (Vec3::X, Vec3::Y, Vec3::Z),
    (Vec3::NEG_Y, Vec3::X, Vec3::Z),
    (Vec3::Y, Vec3::Z, Vec3::X),
    (Vec3::Z, Vec3::X, Vec3::Y),
    (Vec3::NEG_Z, Vec3::Y, Vec3::X),
];

/// Twelve triangles covering an axis-aligned cube, two per face.
///
/// Faces come out in the order left, right, down, up, back, front and use the
/// matching entry of `face_materials`.
pub fn cube_faces(
    center: Vec3,
    half_extent: f32,
    face_materials: [u32; 6],
    facing: Facing,
) -> Vec<Triangle> {
    let mut tris = Vec::with_capacity(12);
    for ((n, u, v), material_id) in CUBE_FACES.into_iter().zip(face_materials) {
        let p = center + n * half_extent;
        let (u, v) = (u * half_extent, v * half_extent);
        let c0 = p - u - v;
        let c1 = p - u + v;
        let c2 = p + u + v;
        let c3 = p + u - v;
        match facing {
            Facing::Inward => {
                tris.push(Triangle::new(c0, c1, c2, material_id));
                tris.push(Triangle::new(c0, c2, c3, material_id));
            }
            Facing::Outward => {
                tris.push(Triangle::new(c0, c2, c1, material_id));
                tris.push(Triangle::new(c0, c3, c2, material_id));
            }
        }
    }
    tris
}

/// The twelve faces of a regular dodecahedron, front sides facing outward.
pub fn dodecahedron(center: Vec3, circumradius: f32, material_id: u32) -> Vec<Pentagon> {
    let phi = (1.0 + 5.0_f32.sqrt()) / 2.0;
    let inv = 1.0 / phi;

    let mut corners: Vec<Vec3> = Vec::with_capacity(20);
    for x in [-1.0, 1.0] {
        for y in [-1.0, 1.0] {
            for z in [-1.0, 1.0] {
                corners.push(Vec3::new(x, y, z));
            }
        }
    }
    for a in [-1.0, 1.0] {
        for b in [-1.0, 1.0] {
            corners.push(Vec3::new(0.0, a * inv, b * phi));
            corners.push(Vec3::new(a * inv, b * phi, 0.0));
            corners.push(Vec3::new(a * phi, 0.0, b * inv));
        }
    }

    // Face directions are the cyclic permutations of (0, ±phi, ±1).
    let mut normals = Vec::with_capacity(12);
    for a in [-1.0, 1.0] {
        for b in [-1.0, 1.0] {
            normals.push(Vec3::new(0.0, a * phi, b).normalize());
            normals.push(Vec3::new(b, 0.0, a * phi).normalize());
            normals.push(Vec3::new(a * phi, b, 0.0).normalize());
        }
    }

    let scale = circumradius / 3.0_f32.sqrt();
    normals
        .into_iter()
        .map(|n| {
            let mut ranked: Vec<(f32, Vec3)> = corners.iter().map(|&c| (c.dot(n), c)).collect();
            ranked.sort_by(|a, b| b.0.total_cmp(&a.0));
            let mut face: Vec<Vec3> = ranked[..5].iter().map(|&(_, c)| c).collect();

            // Counter-clockwise about n, so the winding normal points outward.
            let mid = face.iter().copied().sum::<Vec3>() / 5.0;
            let axis_a = (face[0] - mid).normalize();
            let axis_b = n.cross(axis_a);
            face.sort_by(|p, q| {
                let ang = |v: &Vec3| (*v - mid).dot(axis_b).atan2((*v - mid).dot(axis_a));
                ang(p).total_cmp(&ang(q))
            });

            let mut vertices = [Vec3::ZERO; 5];
            for (slot, v) in vertices.iter_mut().zip(face) {
                *slot = center + v * scale;
            }
            Pentagon {
                vertices,
                material_id,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-4;

    #[test]
    fn room_walls_face_the_center() {
        let tris = cube_faces(Vec3::ZERO, 5.0, [0; 6], Facing::Inward);
        assert_eq!(tris.len(), 12);
        for t in &tris {
            assert!(t.normal().dot(-t.centroid()) > 0.0, "{t:?}");
        }
    }

    #[test]
    fn solid_box_faces_outward() {
        let center = Vec3::new(1.0, 2.0, 3.0);
        for t in cube_faces(center, 0.5, [0; 6], Facing::Outward) {
            assert!(t.normal().dot(t.centroid() - center) > 0.0);
        }
    }

    #[test]
    fn left_wall_matches_classic_winding() {
        let tris = cube_faces(Vec3::ZERO, 5.0, [1, 3, 0, 0, 2, 0], Facing::Inward);
        assert_eq!(tris[0].v1, Vec3::new(-5.0, -5.0, -5.0));
        assert_eq!(tris[0].v2, Vec3::new(-5.0, 5.0, -5.0));
        assert_eq!(tris[0].v3, Vec3::new(-5.0, 5.0, 5.0));
        assert_eq!(tris[1].v3, Vec3::new(-5.0, -5.0, 5.0));
        assert_eq!(tris[0].material_id, 1);
        assert_eq!(tris[2].material_id, 3);
        assert_eq!(tris[8].material_id, 2);
    }

    #[test]
    fn dodecahedron_has_twelve_regular_faces() {
        let center = Vec3::new(0.0, -1.0, 0.0);
        let faces = dodecahedron(center, 2.5, 6);
        assert_eq!(faces.len(), 12);

        let edge = faces[0].vertices[0].distance(faces[0].vertices[1]);
        for face in &faces {
            assert_eq!(face.material_id, 6);
            for i in 0..5 {
                let a = face.vertices[i];
                let b = face.vertices[(i + 1) % 5];
                assert!((a.distance(b) - edge).abs() < EPS);
                assert!((a.distance(center) - 2.5).abs() < EPS);
            }
        }
    }

    #[test]
    fn dodecahedron_faces_are_planar_and_outward() {
        let center = Vec3::new(2.0, 0.0, -1.0);
        for face in dodecahedron(center, 1.0, 0) {
            let n = face.normal();
            let c = face.centroid();
            assert!(n.dot(c - center) > 0.0);
            for v in face.vertices {
                assert!(n.dot(v - c).abs() < EPS);
            }
        }
    }
}
