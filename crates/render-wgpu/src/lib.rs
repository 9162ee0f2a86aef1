//! wgpu render backend for the ray-tracing demo.
//!
//! Draws one full-screen quad whose fragment shader traces the scene held in
//! a single uniform block.
//!
//! # Invariants
//! - The renderer never edits the uniform block; it only uploads it when dirty.
//! - Shader uniform declarations are generated from the host layout.
//! - A shader that fails to compile or link never replaces a working one.

mod gpu;
mod program;
mod shaders;

pub use gpu::{RaytraceRenderer, RenderError};
pub use program::{
    ShaderError, ShaderProgram, ShaderSource, UNIFORM_BINDING, UNIFORM_GROUP, UNIFORM_VAR,
    module_source,
};
pub use shaders::TRACER_WGSL;
