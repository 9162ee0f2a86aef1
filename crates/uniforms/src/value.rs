use glam::{Vec2, Vec3, Vec4};
use std::fmt;

/// Primitive uniform types understood by the tracing shader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UniformType {
    Int,
    Float,
    Vec2,
    Vec3,
    Vec4,
}

impl UniformType {
    /// Size in bytes.
    pub const fn size(self) -> usize {
        match self {
            Self::Int | Self::Float => 4,
            Self::Vec2 => 8,
            Self::Vec3 => 12,
            Self::Vec4 => 16,
        }
    }

    /// Required alignment in the uniform address space.
    pub const fn align(self) -> usize {
        match self {
            Self::Int | Self::Float => 4,
            Self::Vec2 => 8,
            Self::Vec3 | Self::Vec4 => 16,
        }
    }

    pub const fn wgsl_name(self) -> &'static str {
        match self {
            Self::Int => "i32",
            Self::Float => "f32",
            Self::Vec2 => "vec2<f32>",
            Self::Vec3 => "vec3<f32>",
            Self::Vec4 => "vec4<f32>",
        }
    }
}

impl fmt::Display for UniformType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wgsl_name())
    }
}

/// A value tagged with its uniform type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    Int(i32),
    Float(f32),
    Vec2(Vec2),
    Vec3(Vec3),
    Vec4(Vec4),
}

impl UniformValue {
    pub fn ty(&self) -> UniformType {
        match self {
            Self::Int(_) => UniformType::Int,
            Self::Float(_) => UniformType::Float,
            Self::Vec2(_) => UniformType::Vec2,
            Self::Vec3(_) => UniformType::Vec3,
            Self::Vec4(_) => UniformType::Vec4,
        }
    }

    /// Encode into `out`, which must be exactly `self.ty().size()` bytes.
    pub(crate) fn encode(&self, out: &mut [u8]) {
        match *self {
            Self::Int(v) => out.copy_from_slice(bytemuck::bytes_of(&v)),
            Self::Float(v) => out.copy_from_slice(bytemuck::bytes_of(&v)),
            Self::Vec2(v) => out.copy_from_slice(bytemuck::bytes_of(&v.to_array())),
            Self::Vec3(v) => out.copy_from_slice(bytemuck::bytes_of(&v.to_array())),
            Self::Vec4(v) => out.copy_from_slice(bytemuck::bytes_of(&v.to_array())),
        }
    }

    pub(crate) fn decode(ty: UniformType, bytes: &[u8]) -> Self {
        match ty {
            UniformType::Int => Self::Int(bytemuck::pod_read_unaligned(bytes)),
            UniformType::Float => Self::Float(bytemuck::pod_read_unaligned(bytes)),
            UniformType::Vec2 => {
                Self::Vec2(Vec2::from_array(bytemuck::pod_read_unaligned(bytes)))
            }
            UniformType::Vec3 => {
                Self::Vec3(Vec3::from_array(bytemuck::pod_read_unaligned(bytes)))
            }
            UniformType::Vec4 => {
                Self::Vec4(Vec4::from_array(bytemuck::pod_read_unaligned(bytes)))
            }
        }
    }
}

impl fmt::Display for UniformValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v:.4}"),
            Self::Vec2(v) => write!(f, "({:.4}, {:.4})", v.x, v.y),
            Self::Vec3(v) => write!(f, "({:.4}, {:.4}, {:.4})", v.x, v.y, v.z),
            Self::Vec4(v) => write!(f, "({:.4}, {:.4}, {:.4}, {:.4})", v.x, v.y, v.z, v.w),
        }
    }
}

impl From<i32> for UniformValue {
    fn from(v: i32) -> Self {
        Self::Int(v)
    }
}

impl From<f32> for UniformValue {
    fn from(v: f32) -> Self {
        Self::Float(v)
    }
}

impl From<Vec2> for UniformValue {
    fn from(v: Vec2) -> Self {
        Self::Vec2(v)
    }
}

impl From<Vec3> for UniformValue {
    fn from(v: Vec3) -> Self {
        Self::Vec3(v)
    }
}

impl From<Vec4> for UniformValue {
    fn from(v: Vec4) -> Self {
        Self::Vec4(v)
    }
}
