use crate::value::UniformType;
use std::collections::HashMap;
use std::fmt::Write as _;

/// Minimum alignment of structs and array strides in the uniform address space.
const UNIFORM_ALIGN: usize = 16;

fn round_up(align: usize, n: usize) -> usize {
    n.div_ceil(align) * align
}

/// Type of a struct member: a primitive, a nested struct, or a fixed array.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldType {
    Prim(UniformType),
    Struct(StructDef),
    Array(Box<FieldType>, usize),
}

impl FieldType {
    pub fn array(elem: impl Into<FieldType>, len: usize) -> Self {
        Self::Array(Box::new(elem.into()), len)
    }

    fn align(&self) -> usize {
        match self {
            Self::Prim(ty) => ty.align(),
            Self::Struct(def) => def.align(),
            Self::Array(elem, _) => round_up(UNIFORM_ALIGN, elem.align()),
        }
    }

    fn size(&self) -> usize {
        match self {
            Self::Prim(ty) => ty.size(),
            Self::Struct(def) => def.size(),
            Self::Array(elem, len) => elem.stride() * len,
        }
    }

    fn stride(&self) -> usize {
        round_up(UNIFORM_ALIGN, round_up(self.align(), self.size()))
    }

    fn wgsl_name(&self) -> String {
        match self {
            Self::Prim(ty) => ty.wgsl_name().to_string(),
            Self::Struct(def) => def.name.clone(),
            Self::Array(elem, len) => {
                let elem_name = match **elem {
                    Self::Prim(ty) => padded_name(ty)
                        .map(str::to_string)
                        .unwrap_or_else(|| elem.wgsl_name()),
                    _ => elem.wgsl_name(),
                };
                format!("array<{elem_name}, {len}>")
            }
        }
    }
}

/// Wrapper struct for primitives whose natural WGSL array stride is below 16.
///
/// The host path stays `name[i]`; shaders read the element as `name[i].value`.
fn padded_name(ty: UniformType) -> Option<&'static str> {
    match ty {
        UniformType::Int => Some("PaddedI32"),
        UniformType::Float => Some("PaddedF32"),
        UniformType::Vec2 => Some("PaddedVec2"),
        UniformType::Vec3 | UniformType::Vec4 => None,
    }
}

impl From<UniformType> for FieldType {
    fn from(ty: UniformType) -> Self {
        Self::Prim(ty)
    }
}

impl From<StructDef> for FieldType {
    fn from(def: StructDef) -> Self {
        Self::Struct(def)
    }
}

/// A named struct declaration, built member by member.
#[derive(Debug, Clone, PartialEq)]
pub struct StructDef {
    name: String,
    fields: Vec<(String, FieldType)>,
}

impl StructDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    pub fn field(mut self, name: impl Into<String>, ty: impl Into<FieldType>) -> Self {
        self.fields.push((name.into(), ty.into()));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[(String, FieldType)] {
        &self.fields
    }

    fn align(&self) -> usize {
        let widest = self.fields.iter().map(|(_, f)| f.align()).max().unwrap_or(1);
        round_up(UNIFORM_ALIGN, widest)
    }

    /// Member offsets relative to the struct start.
    fn offsets(&self) -> Vec<usize> {
        let mut cursor = 0;
        self.fields
            .iter()
            .map(|(_, f)| {
                let offset = round_up(f.align(), cursor);
                cursor = offset + f.size();
                offset
            })
            .collect()
    }

    fn size(&self) -> usize {
        let end = self
            .offsets()
            .last()
            .zip(self.fields.last())
            .map(|(offset, (_, f))| offset + f.size())
            .unwrap_or(0);
        round_up(self.align(), end)
    }
}

/// Location of one leaf uniform inside the block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot {
    pub offset: usize,
    pub ty: UniformType,
}

/// Flattened layout of a uniform struct: every leaf path resolved to a slot.
///
/// This is the location cache: paths are resolved once at construction and
/// every later lookup is a single hash lookup.
#[derive(Debug, Clone)]
pub struct UniformLayout {
    root: StructDef,
    size: usize,
    entries: Vec<(String, Slot)>,
    index: HashMap<String, usize>,
}

impl UniformLayout {
    pub fn new(root: StructDef) -> Self {
        let mut entries = Vec::new();
        for ((name, field), offset) in root.fields.iter().zip(root.offsets()) {
            flatten(name, field, offset, &mut entries);
        }
        let index = entries
            .iter()
            .enumerate()
            .map(|(i, (name, _))| (name.clone(), i))
            .collect();
        let size = root.size();
        tracing::debug!(
            root = root.name(),
            size,
            slots = entries.len(),
            "uniform layout built"
        );
        Self {
            root,
            size,
            entries,
            index,
        }
    }

    /// Total size of the block in bytes.
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn root(&self) -> &StructDef {
        &self.root
    }

    pub fn slot(&self, name: &str) -> Option<Slot> {
        self.index.get(name).map(|&i| self.entries[i].1)
    }

    /// All leaf slots in declaration (and therefore offset) order.
    pub fn slots(&self) -> impl Iterator<Item = (&str, Slot)> {
        self.entries.iter().map(|(n, s)| (n.as_str(), *s))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// WGSL declarations for every struct in the layout plus the uniform binding.
    ///
    /// Nested struct and array members carry explicit `@align`/`@size`
    /// attributes so the shader sees exactly the offsets computed here.
    /// Arrays of narrow primitives use padded wrapper structs.
    pub fn wgsl_declarations(&self, group: u32, binding: u32, var_name: &str) -> String {
        let mut structs: Vec<&StructDef> = Vec::new();
        collect_structs(&self.root, &mut structs);

        let mut padded = Vec::new();
        for def in &structs {
            for (_, field) in &def.fields {
                collect_padded(field, &mut padded);
            }
        }

        let mut out = String::new();
        for ty in padded {
            if let Some(name) = padded_name(ty) {
                let _ = writeln!(
                    out,
                    "struct {name} {{\n    @align(16) @size(16) value: {},\n}}\n",
                    ty.wgsl_name()
                );
            }
        }
        for def in structs {
            // WGSL would align a struct of scalars below 16; the host never does.
            let natural = def.fields.iter().map(|(_, f)| f.align()).max().unwrap_or(1);
            let _ = writeln!(out, "struct {} {{", def.name);
            for (i, (name, field)) in def.fields.iter().enumerate() {
                let attrs = match field {
                    FieldType::Prim(_) if i == 0 && natural < UNIFORM_ALIGN => {
                        format!("@align({UNIFORM_ALIGN}) ")
                    }
                    FieldType::Prim(_) => String::new(),
                    _ => format!("@align({}) @size({}) ", field.align(), field.size()),
                };
                let _ = writeln!(out, "    {attrs}{name}: {},", field.wgsl_name());
            }
            out.push_str("}\n\n");
        }
        let _ = writeln!(
            out,
            "@group({group}) @binding({binding})\nvar<uniform> {var_name}: {};",
            self.root.name
        );
        out
    }
}

fn flatten(path: &str, field: &FieldType, offset: usize, out: &mut Vec<(String, Slot)>) {
    match field {
        FieldType::Prim(ty) => out.push((path.to_string(), Slot { offset, ty: *ty })),
        FieldType::Struct(def) => {
            for ((name, member), rel) in def.fields.iter().zip(def.offsets()) {
                flatten(&format!("{path}.{name}"), member, offset + rel, out);
            }
        }
        FieldType::Array(elem, len) => {
            let stride = elem.stride();
            for i in 0..*len {
                flatten(&format!("{path}[{i}]"), elem, offset + i * stride, out);
            }
        }
    }
}

/// Primitive array element types that need a padded wrapper, each once.
fn collect_padded(field: &FieldType, out: &mut Vec<UniformType>) {
    if let FieldType::Array(elem, _) = field {
        match **elem {
            FieldType::Prim(ty) if padded_name(ty).is_some() && !out.contains(&ty) => {
                out.push(ty)
            }
            _ => collect_padded(elem, out),
        }
    }
}

/// Depth-first, dependencies before dependents, each struct once.
fn collect_structs<'a>(def: &'a StructDef, out: &mut Vec<&'a StructDef>) {
    for (_, field) in &def.fields {
        let mut ty = field;
        while let FieldType::Array(elem, _) = ty {
            ty = elem;
        }
        if let FieldType::Struct(inner) = ty {
            collect_structs(inner, out);
        }
    }
    if !out.iter().any(|d| d.name == def.name) {
        out.push(def);
    }
}
