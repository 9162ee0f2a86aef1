use crate::program::{ShaderError, ShaderProgram, ShaderSource, UNIFORM_BINDING};
use rtdemo_uniforms::{UniformBlock, UniformLayout};
use std::sync::Arc;
use wgpu::util::DeviceExt;

/// Full-screen quad corners in clip space.
#[rustfmt::skip]
const QUAD_VERTICES: [[f32; 2]; 4] = [
    [-1.0, -1.0],
    [-1.0,  1.0],
    [ 1.0,  1.0],
    [ 1.0, -1.0],
];

/// Two triangles fanning out from the first corner.
const QUAD_INDICES: [u16; 6] = [0, 1, 2, 0, 2, 3];

/// Errors from setting up the renderer.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error(transparent)]
    Shader(#[from] ShaderError),
    #[error("uniform block of {size} bytes exceeds the device limit of {limit}")]
    UniformTooLarge { size: usize, limit: u32 },
}

/// Draws the tracer over the whole target, fed by one uniform block.
pub struct RaytraceRenderer {
    program: ShaderProgram,
    pipeline_layout: wgpu::PipelineLayout,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    layout: Arc<UniformLayout>,
    surface_format: wgpu::TextureFormat,
}

impl RaytraceRenderer {
    /// Build the renderer. A file shader that fails to load or compile is
    /// logged and replaced by the built-in tracer.
    pub fn new(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        layout: Arc<UniformLayout>,
        source: &ShaderSource,
    ) -> Result<Self, RenderError> {
        let limit = device.limits().max_uniform_buffer_binding_size;
        if layout.size() > limit as usize {
            return Err(RenderError::UniformTooLarge {
                size: layout.size(),
                limit,
            });
        }

        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("scene_uniforms"),
            size: layout.size() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("scene_uniforms_layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: UNIFORM_BINDING,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("scene_uniforms_bind_group"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: UNIFORM_BINDING,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("tracer_pipeline_layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let program = match ShaderProgram::build(
            device,
            &pipeline_layout,
            surface_format,
            &layout,
            source,
        ) {
            Ok(program) => program,
            Err(e) if *source != ShaderSource::Builtin => {
                tracing::warn!("falling back to builtin tracer: {e}");
                ShaderProgram::build(
                    device,
                    &pipeline_layout,
                    surface_format,
                    &layout,
                    &ShaderSource::Builtin,
                )?
            }
            Err(e) => return Err(e.into()),
        };

        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("quad_vertex_buffer"),
            contents: bytemuck::cast_slice(&QUAD_VERTICES),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("quad_index_buffer"),
            contents: bytemuck::cast_slice(&QUAD_INDICES),
            usage: wgpu::BufferUsages::INDEX,
        });

        Ok(Self {
            program,
            pipeline_layout,
            uniform_buffer,
            uniform_bind_group,
            vertex_buffer,
            index_buffer,
            layout,
            surface_format,
        })
    }

    /// Swap in another shader. On failure the current program stays active.
    pub fn set_shader(
        &mut self,
        device: &wgpu::Device,
        source: &ShaderSource,
    ) -> Result<(), ShaderError> {
        let program = ShaderProgram::build(
            device,
            &self.pipeline_layout,
            self.surface_format,
            &self.layout,
            source,
        )?;
        self.program = program;
        Ok(())
    }

    pub fn shader_label(&self) -> &str {
        self.program.label()
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.surface_format
    }

    /// Upload `block` if it changed, then trace one frame into `view`.
    pub fn render(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        view: &wgpu::TextureView,
        block: &mut UniformBlock,
    ) {
        if block.take_dirty() {
            queue.write_buffer(&self.uniform_buffer, 0, block.bytes());
        }

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("trace_encoder"),
        });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("trace_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                ..Default::default()
            });

            pass.set_pipeline(self.program.pipeline());
            pass.set_bind_group(0, &self.uniform_bind_group, &[]);
            pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
            pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint16);
            pass.draw_indexed(0..QUAD_INDICES.len() as u32, 0, 0..1);
        }

        queue.submit(std::iter::once(encoder.finish()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corner(i: u16) -> [f32; 2] {
        QUAD_VERTICES[i as usize]
    }

    #[test]
    fn quad_covers_clip_space() {
        let xs: Vec<f32> = QUAD_VERTICES.iter().map(|v| v[0]).collect();
        let ys: Vec<f32> = QUAD_VERTICES.iter().map(|v| v[1]).collect();
        assert_eq!(xs.iter().cloned().fold(f32::MAX, f32::min), -1.0);
        assert_eq!(xs.iter().cloned().fold(f32::MIN, f32::max), 1.0);
        assert_eq!(ys.iter().cloned().fold(f32::MAX, f32::min), -1.0);
        assert_eq!(ys.iter().cloned().fold(f32::MIN, f32::max), 1.0);
    }

    #[test]
    fn quad_triangles_share_winding() {
        let signed_area = |tri: &[u16]| {
            let (a, b, c) = (corner(tri[0]), corner(tri[1]), corner(tri[2]));
            (b[0] - a[0]) * (c[1] - a[1]) - (b[1] - a[1]) * (c[0] - a[0])
        };
        let first = signed_area(&QUAD_INDICES[..3]);
        let second = signed_area(&QUAD_INDICES[3..]);
        assert!(first != 0.0 && second != 0.0);
        assert_eq!(first.signum(), second.signum());
        assert_eq!(first.abs() + second.abs(), 8.0);
    }
}
