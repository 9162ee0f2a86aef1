//! Scene description for the tracing shader: camera, light, materials and
//! geometry, plus the uniform contract they are written through.
//!
//! # Invariants
//! - The camera axes stay mutually orthogonal under orbit and fly controls.
//! - A validated scene fits the shader arrays and only references existing materials.
//! - Every uniform name written by [`Scene::upload`] exists in [`shader_layout`].

mod camera;
mod geometry;
pub mod io;
mod material;
mod presets;
mod scene;

pub use camera::Camera;
pub use geometry::{Facing, Pentagon, Sphere, Triangle, cube_faces, dodecahedron};
pub use material::{Material, MaterialType};
pub use presets::SceneKind;
pub use scene::{
    Light, MAX_MATERIALS, MAX_PENTAGONS, MAX_SPHERES, MAX_TRIANGLES, Scene, SceneError,
    shader_layout,
};
