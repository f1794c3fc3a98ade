use std::fmt;

use crate::effect::TransformUniforms;
use crate::vertex::AttributeDesc;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BufferId(pub u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct VertexArrayId(pub u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IndexFormat {
    U8,
}

impl IndexFormat {
    pub fn size(self) -> usize {
        match self {
            IndexFormat::U8 => 1,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BufferKind {
    Vertex,
    Index(IndexFormat),
}

/// Which binding point a buffer is attached to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BufferTarget {
    Array,
    ElementArray,
}

impl BufferKind {
    pub fn target(self) -> BufferTarget {
        match self {
            BufferKind::Vertex => BufferTarget::Array,
            BufferKind::Index(_) => BufferTarget::ElementArray,
        }
    }
}

/// Hint describing how often the uploaded data changes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BufferUsage {
    Static,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Primitive {
    Triangles,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceError {
    ContextUnavailable,
    ShaderCompilation(String),
    ContextReleased,
}

impl fmt::Display for DeviceError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DeviceError::ContextUnavailable => write!(f, "rendering context is unavailable"),
            DeviceError::ShaderCompilation(msg) => write!(f, "shader compilation failed: {}", msg),
            DeviceError::ContextReleased => write!(f, "rendering context was already released"),
        }
    }
}

impl std::error::Error for DeviceError {}

/// The graphics primitives a scene drives.
///
/// Binding follows GL rules: index buffers and attribute pointers are
/// recorded into whichever vertex array is bound when they are set, and an
/// attribute pointer captures the vertex buffer bound to
/// [`BufferTarget::Array`] at that moment. Deleting a handle that is
/// unknown or already deleted must be a no-op.
pub trait RenderDevice {
    fn acquire_context(&mut self) -> Result<(), DeviceError>;
    fn make_current(&mut self);
    fn release_context(&mut self);

    fn create_vertex_array(&mut self) -> VertexArrayId;
    fn bind_vertex_array(&mut self, vertex_array: Option<VertexArrayId>);

    /// Creates a buffer, binds it to `kind.target()` and uploads `data`.
    fn create_buffer(&mut self, kind: BufferKind, usage: BufferUsage, data: &[u8]) -> BufferId;
    fn bind_buffer(&mut self, target: BufferTarget, buffer: Option<BufferId>);
    fn vertex_attrib_pointer(&mut self, slot: usize, attribute: &AttributeDesc, stride: usize);

    fn clear(&mut self, color: [f32; 4]);
    fn apply_transform(&mut self, uniforms: &TransformUniforms);
    fn draw_elements(&mut self, primitive: Primitive, count: usize, format: IndexFormat, offset: usize);
    fn present(&mut self);

    fn delete_buffer(&mut self, buffer: BufferId);
    fn delete_vertex_array(&mut self, vertex_array: VertexArrayId);
}
