//! Name-keyed uniform blocks shared between the host and the tracing shader.
//!
//! The host addresses uniforms by GLSL-style paths such as `uCamera.position`
//! or `triangles[3].v1`. A [`UniformLayout`] resolves every path to a byte
//! offset once; a [`UniformBlock`] owns the byte image that gets uploaded.
//!
//! # Invariants
//! - Offsets follow the uniform address-space layout rules, so the image can
//!   be copied into a uniform buffer verbatim.
//! - A write never touches bytes outside its own slot.
//! - Unknown names and mistyped values are reported and skipped, never written.

mod block;
mod layout;
mod value;

pub use block::{UniformBlock, UniformError};
pub use layout::{FieldType, Slot, StructDef, UniformLayout};
pub use value::{UniformType, UniformValue};
