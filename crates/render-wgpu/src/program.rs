use crate::shaders::TRACER_WGSL;
use rtdemo_uniforms::UniformLayout;
use std::borrow::Cow;
use std::path::{Path, PathBuf};

/// Bind group and binding of the scene uniform block.
pub const UNIFORM_GROUP: u32 = 0;
pub const UNIFORM_BINDING: u32 = 0;
/// Name of the uniform variable shader bodies refer to.
pub const UNIFORM_VAR: &str = "u";

/// Errors from building a shader program.
#[derive(Debug, thiserror::Error)]
pub enum ShaderError {
    #[error("failed to read shader {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("shader {label} failed to compile:\n{log}")]
    Compile { label: String, log: String },
    #[error("shader program {label} failed to link:\n{log}")]
    Link { label: String, log: String },
}

/// Where the tracer body comes from.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ShaderSource {
    #[default]
    Builtin,
    /// A WGSL body on disk, compiled against the same generated uniform prelude.
    File(PathBuf),
}

impl ShaderSource {
    pub fn label(&self) -> String {
        match self {
            Self::Builtin => "builtin tracer".to_string(),
            Self::File(path) => path.display().to_string(),
        }
    }

    /// Shader body without the uniform declarations.
    pub fn body(&self) -> Result<Cow<'static, str>, ShaderError> {
        match self {
            Self::Builtin => Ok(Cow::Borrowed(TRACER_WGSL)),
            Self::File(path) => read_body(path).map(Cow::Owned),
        }
    }
}

fn read_body(path: &Path) -> Result<String, ShaderError> {
    std::fs::read_to_string(path).map_err(|source| ShaderError::Read {
        path: path.to_path_buf(),
        source,
    })
}

/// Complete WGSL module: generated uniform prelude followed by `body`.
pub fn module_source(layout: &UniformLayout, body: &str) -> String {
    format!(
        "{}\n{body}",
        layout.wgsl_declarations(UNIFORM_GROUP, UNIFORM_BINDING, UNIFORM_VAR)
    )
}

/// A compiled and linked tracer: shader module plus render pipeline.
pub struct ShaderProgram {
    pipeline: wgpu::RenderPipeline,
    label: String,
}

impl ShaderProgram {
    /// Compile `source`'s body against `layout` and link it into a pipeline.
    pub fn build(
        device: &wgpu::Device,
        pipeline_layout: &wgpu::PipelineLayout,
        surface_format: wgpu::TextureFormat,
        layout: &UniformLayout,
        source: &ShaderSource,
    ) -> Result<Self, ShaderError> {
        let label = source.label();
        let body = source.body()?;
        let module = compile(device, &module_source(layout, &body), &label)?;
        let pipeline = link(device, pipeline_layout, surface_format, &module, &label)?;
        tracing::info!("shader program {label} linked");
        Ok(Self { pipeline, label })
    }

    pub fn pipeline(&self) -> &wgpu::RenderPipeline {
        &self.pipeline
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

fn compile(
    device: &wgpu::Device,
    source: &str,
    label: &str,
) -> Result<wgpu::ShaderModule, ShaderError> {
    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(label),
        source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(source)),
    });
    let info = pollster::block_on(module.get_compilation_info());
    let scope_error = pollster::block_on(device.pop_error_scope());

    let mut log = String::new();
    for msg in &info.messages {
        let at = msg
            .location
            .as_ref()
            .map(|l| format!("{}:{}: ", l.line_number, l.line_position))
            .unwrap_or_default();
        match msg.message_type {
            wgpu::CompilationMessageType::Error => {
                log.push_str(&format!("{at}{}\n", msg.message));
            }
            wgpu::CompilationMessageType::Warning => {
                tracing::warn!("shader {label}: {at}{}", msg.message);
            }
            wgpu::CompilationMessageType::Info => {
                tracing::debug!("shader {label}: {at}{}", msg.message);
            }
        }
    }
    if log.is_empty() {
        if let Some(e) = scope_error {
            log = e.to_string();
        }
    }

    if !log.is_empty() {
        tracing::error!("shader {label} failed to compile:\n{log}");
        return Err(ShaderError::Compile {
            label: label.to_string(),
            log,
        });
    }
    tracing::info!("shader {label} compiled");
    Ok(module)
}

fn link(
    device: &wgpu::Device,
    pipeline_layout: &wgpu::PipelineLayout,
    surface_format: wgpu::TextureFormat,
    module: &wgpu::ShaderModule,
    label: &str,
) -> Result<wgpu::RenderPipeline, ShaderError> {
    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(pipeline_layout),
        vertex: wgpu::VertexState {
            module,
            entry_point: Some("vs_main"),
            compilation_options: Default::default(),
            buffers: &[wgpu::VertexBufferLayout {
                array_stride: std::mem::size_of::<[f32; 2]>() as u64,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: &wgpu::vertex_attr_array![0 => Float32x2],
            }],
        },
        fragment: Some(wgpu::FragmentState {
            module,
            entry_point: Some("fs_main"),
            compilation_options: Default::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format: surface_format,
                blend: Some(wgpu::BlendState::REPLACE),
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            ..Default::default()
        },
        depth_stencil: None,
        multisample: Default::default(),
        multiview: None,
        cache: None,
    });

    if let Some(e) = pollster::block_on(device.pop_error_scope()) {
        let log = e.to_string();
        tracing::error!("shader program {label} failed to link:\n{log}");
        return Err(ShaderError::Link {
            label: label.to_string(),
            log,
        });
    }
    Ok(pipeline)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rtdemo_scene::shader_layout;

    #[test]
    fn module_source_prepends_generated_structs() {
        let src = module_source(&shader_layout(), TRACER_WGSL);
        let decl = src.find("var<uniform> u: SceneUniforms;").unwrap();
        let body = src.find("fn fs_main(").unwrap();
        assert!(decl < body);
        for name in ["Camera", "Light", "Triangle", "Sphere", "Pentagon", "Material"] {
            assert!(src.contains(&format!("struct {name} {{")), "{name}");
        }
    }

    #[test]
    fn missing_file_reports_path() {
        let src = ShaderSource::File(PathBuf::from("/definitely/not/here.wgsl"));
        match src.body() {
            Err(ShaderError::Read { path, .. }) => {
                assert_eq!(path, PathBuf::from("/definitely/not/here.wgsl"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn file_body_is_read_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("flat.wgsl");
        std::fs::write(&path, "// flat shading\n").unwrap();
        let body = ShaderSource::File(path.clone()).body().unwrap();
        assert_eq!(body, "// flat shading\n");
        assert_eq!(ShaderSource::File(path.clone()).label(), path.display().to_string());
    }

    /// Leaf paths and byte offsets of `ty` as naga lays it out.
    fn naga_offsets(
        module: &naga::Module,
        ty: naga::Handle<naga::Type>,
        path: &str,
        offset: u32,
        out: &mut Vec<(String, u32)>,
    ) {
        let padded = module.types[ty]
            .name
            .as_deref()
            .is_some_and(|n| n.starts_with("Padded"));
        match &module.types[ty].inner {
            naga::TypeInner::Struct { members, .. } => {
                for m in members {
                    let name = m.name.as_deref().unwrap();
                    let path = match (padded, path.is_empty()) {
                        (true, _) => path.to_string(),
                        (false, true) => name.to_string(),
                        (false, false) => format!("{path}.{name}"),
                    };
                    naga_offsets(module, m.ty, &path, offset + m.offset, out);
                }
            }
            naga::TypeInner::Array {
                base,
                size: naga::ArraySize::Constant(len),
                stride,
            } => {
                for i in 0..len.get() {
                    naga_offsets(module, *base, &format!("{path}[{i}]"), offset + i * stride, out);
                }
            }
            _ => out.push((path.to_string(), offset)),
        }
    }

    #[test]
    fn tracer_module_agrees_with_host_layout() {
        let layout = shader_layout();
        let src = module_source(&layout, TRACER_WGSL);
        let module = naga::front::wgsl::parse_str(&src)
            .unwrap_or_else(|e| panic!("{}", e.emit_to_string(&src)));
        naga::valid::Validator::new(
            naga::valid::ValidationFlags::all(),
            naga::valid::Capabilities::all(),
        )
        .validate(&module)
        .unwrap_or_else(|e| panic!("{e:?}"));

        let (_, var) = module
            .global_variables
            .iter()
            .find(|(_, v)| v.name.as_deref() == Some(UNIFORM_VAR))
            .unwrap();
        assert_eq!(var.space, naga::AddressSpace::Uniform);
        let binding = var.binding.as_ref().unwrap();
        assert_eq!((binding.group, binding.binding), (UNIFORM_GROUP, UNIFORM_BINDING));

        match &module.types[var.ty].inner {
            naga::TypeInner::Struct { span, .. } => assert_eq!(*span as usize, layout.size()),
            other => panic!("uniform is not a struct: {other:?}"),
        }

        let mut leaves = Vec::new();
        naga_offsets(&module, var.ty, "", 0, &mut leaves);
        assert_eq!(leaves.len(), layout.len());
        for (path, offset) in leaves {
            let slot = layout.slot(&path).unwrap_or_else(|| panic!("{path} has no slot"));
            assert_eq!(slot.offset, offset as usize, "{path}");
        }
    }

    #[test]
    fn builtin_is_default() {
        assert_eq!(ShaderSource::default(), ShaderSource::Builtin);
        assert!(ShaderSource::Builtin.body().unwrap().contains("fn trace("));
    }
}
