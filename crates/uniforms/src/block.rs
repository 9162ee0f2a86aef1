use crate::layout::UniformLayout;
use crate::value::{UniformType, UniformValue};
use glam::{Vec2, Vec3, Vec4};
use std::collections::HashSet;
use std::sync::Arc;

/// Errors from strict uniform writes.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum UniformError {
    #[error("unknown uniform: {0}")]
    Unknown(String),
    #[error("uniform {name} is {expected}, got {found}")]
    TypeMismatch {
        name: String,
        expected: UniformType,
        found: UniformType,
    },
}

/// CPU-side image of a uniform block, addressed by uniform path.
///
/// Every write goes through the layout's location cache. The image is
/// uploaded as-is; `take_dirty` tells the uploader whether anything changed.
#[derive(Debug, Clone)]
pub struct UniformBlock {
    layout: Arc<UniformLayout>,
    data: Vec<u8>,
    dirty: bool,
    reported: HashSet<String>,
    written: HashSet<usize>,
}

impl UniformBlock {
    pub fn new(layout: Arc<UniformLayout>) -> Self {
        let data = vec![0u8; layout.size()];
        Self {
            layout,
            data,
            dirty: true,
            reported: HashSet::new(),
            written: HashSet::new(),
        }
    }

    pub fn layout(&self) -> &Arc<UniformLayout> {
        &self.layout
    }

    /// Write `value` to `name`, failing on unknown names or mistyped values.
    pub fn try_set(
        &mut self,
        name: &str,
        value: impl Into<UniformValue>,
    ) -> Result<(), UniformError> {
        let value = value.into();
        let slot = self
            .layout
            .slot(name)
            .ok_or_else(|| UniformError::Unknown(name.to_string()))?;
        if slot.ty != value.ty() {
            return Err(UniformError::TypeMismatch {
                name: name.to_string(),
                expected: slot.ty,
                found: value.ty(),
            });
        }

        let mut encoded = [0u8; 16];
        let bytes = &mut encoded[..slot.ty.size()];
        value.encode(bytes);
        let target = &mut self.data[slot.offset..slot.offset + slot.ty.size()];
        if target != bytes {
            target.copy_from_slice(bytes);
            self.dirty = true;
        }
        self.written.insert(slot.offset);
        Ok(())
    }

    /// Write `value` to `name`; failures are logged once per name and skipped.
    pub fn set(&mut self, name: &str, value: impl Into<UniformValue>) {
        if let Err(e) = self.try_set(name, value) {
            if self.reported.insert(name.to_string()) {
                tracing::warn!("skipping uniform write: {e}");
            }
        }
    }

    pub fn set_i32(&mut self, name: &str, v: i32) {
        self.set(name, v);
    }

    pub fn set_f32(&mut self, name: &str, v: f32) {
        self.set(name, v);
    }

    pub fn set_vec2(&mut self, name: &str, v: Vec2) {
        self.set(name, v);
    }

    pub fn set_vec3(&mut self, name: &str, v: Vec3) {
        self.set(name, v);
    }

    pub fn set_vec4(&mut self, name: &str, v: Vec4) {
        self.set(name, v);
    }

    /// Read back the current value of `name`.
    pub fn get(&self, name: &str) -> Option<UniformValue> {
        let slot = self.layout.slot(name)?;
        let bytes = &self.data[slot.offset..slot.offset + slot.ty.size()];
        Some(UniformValue::decode(slot.ty, bytes))
    }

    /// Whether `name` has been written since creation or the last `clear`,
    /// including writes of zero.
    pub fn was_written(&self, name: &str) -> bool {
        self.layout
            .slot(name)
            .is_some_and(|slot| self.written.contains(&slot.offset))
    }

    /// Zero the whole image.
    pub fn clear(&mut self) {
        self.data.fill(0);
        self.written.clear();
        self.dirty = true;
    }

    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Returns whether the image changed since the last call, and resets the flag.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    /// Names that failed to resolve or type-check so far.
    pub fn reported(&self) -> impl Iterator<Item = &str> {
        self.reported.iter().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{FieldType, StructDef};

    fn block() -> UniformBlock {
        let light = StructDef::new("Light").field("position", UniformType::Vec3);
        let tri = StructDef::new("Triangle")
            .field("v1", UniformType::Vec3)
            .field("v2", UniformType::Vec3)
            .field("v3", UniformType::Vec3)
            .field("MaterialId", UniformType::Int);
        let root = StructDef::new("Scene")
            .field("uLight", light)
            .field("triangles_used", UniformType::Int)
            .field("triangles", FieldType::array(tri, 2));
        UniformBlock::new(Arc::new(UniformLayout::new(root)))
    }

    #[test]
    fn new_block_is_zeroed_and_dirty() {
        let b = block();
        assert!(b.bytes().iter().all(|&x| x == 0));
        assert!(b.is_dirty());
    }

    #[test]
    fn set_then_get() {
        let mut b = block();
        b.set_vec3("triangles[1].v2", Vec3::new(1.0, 2.0, 3.0));
        b.set_i32("triangles[1].MaterialId", 4);
        assert_eq!(
            b.get("triangles[1].v2"),
            Some(UniformValue::Vec3(Vec3::new(1.0, 2.0, 3.0)))
        );
        assert_eq!(b.get("triangles[1].MaterialId"), Some(UniformValue::Int(4)));
        assert_eq!(b.get("triangles[0].MaterialId"), Some(UniformValue::Int(0)));
    }

    #[test]
    fn unknown_name_is_skipped() {
        let mut b = block();
        let before = b.bytes().to_vec();
        assert_eq!(
            b.try_set("triangles[2].v1", Vec3::ONE),
            Err(UniformError::Unknown("triangles[2].v1".into()))
        );
        b.set("uCamera.position", Vec3::ONE);
        assert_eq!(b.bytes(), &before[..]);
        assert_eq!(b.reported().collect::<Vec<_>>(), vec!["uCamera.position"]);
    }

    #[test]
    fn type_mismatch_is_rejected() {
        let mut b = block();
        let err = b.try_set("triangles_used", 3.0f32).unwrap_err();
        assert_eq!(
            err,
            UniformError::TypeMismatch {
                name: "triangles_used".into(),
                expected: UniformType::Int,
                found: UniformType::Float,
            }
        );
        assert_eq!(b.get("triangles_used"), Some(UniformValue::Int(0)));
    }

    #[test]
    fn writes_stay_inside_their_slot() {
        let mut b = block();
        b.set_vec3("uLight.position", Vec3::splat(9.0));
        b.set_i32("triangles_used", -1);
        assert_eq!(b.get("uLight.position"), Some(UniformValue::Vec3(Vec3::splat(9.0))));
        let slot = b.layout().slot("triangles[0].v1").unwrap();
        assert!(b.bytes()[slot.offset..].iter().all(|&x| x == 0));
    }

    #[test]
    fn dirty_only_on_change() {
        let mut b = block();
        assert!(b.take_dirty());
        b.set_i32("triangles_used", 0);
        assert!(!b.is_dirty());
        b.set_i32("triangles_used", 2);
        assert!(b.take_dirty());
        assert!(!b.is_dirty());
    }

    #[test]
    fn clear_zeroes_and_marks_dirty() {
        let mut b = block();
        b.set_i32("triangles_used", 2);
        b.take_dirty();
        b.clear();
        assert!(b.is_dirty());
        assert_eq!(b.get("triangles_used"), Some(UniformValue::Int(0)));
        assert!(!b.was_written("triangles_used"));
    }

    #[test]
    fn zero_writes_count_as_written() {
        let mut b = block();
        assert!(!b.was_written("triangles[0].MaterialId"));
        b.set_i32("triangles[0].MaterialId", 0);
        b.set_f32("triangles[1].MaterialId", 0.0);
        assert!(b.was_written("triangles[0].MaterialId"));
        assert!(!b.was_written("triangles[1].MaterialId"));
        assert!(!b.was_written("triangles[0].v1"));
        assert!(!b.was_written("no.such.name"));
    }
}
