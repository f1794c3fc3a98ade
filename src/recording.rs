//! A `RenderDevice` that records every call instead of talking to a GPU.

use std::collections::{HashMap, HashSet};

use crate::device::{
    BufferId, BufferKind, BufferTarget, BufferUsage, DeviceError, IndexFormat, Primitive,
    RenderDevice, VertexArrayId,
};
use crate::effect::TransformUniforms;
use crate::vertex::AttributeDesc;

#[derive(Clone, Debug, PartialEq)]
pub enum Call {
    AcquireContext,
    MakeCurrent,
    ReleaseContext,
    CreateVertexArray(VertexArrayId),
    BindVertexArray(Option<VertexArrayId>),
    CreateBuffer {
        id: BufferId,
        kind: BufferKind,
        usage: BufferUsage,
        len: usize,
    },
    BindBuffer(BufferTarget, Option<BufferId>),
    VertexAttribPointer {
        slot: usize,
        attribute: AttributeDesc,
        stride: usize,
        buffer: Option<BufferId>,
    },
    Clear([f32; 4]),
    ApplyTransform(TransformUniforms),
    DrawElements {
        primitive: Primitive,
        count: usize,
        format: IndexFormat,
        offset: usize,
    },
    Present,
    DeleteBuffer(BufferId),
    DeleteVertexArray(VertexArrayId),
}

#[derive(Debug, Default)]
pub struct RecordingDevice {
    pub calls: Vec<Call>,
    pub fail_context: bool,
    pub buffers: HashMap<BufferId, Vec<u8>>,
    pub vertex_arrays: HashSet<VertexArrayId>,
    pub bound_vertex_array: Option<VertexArrayId>,
    pub bound_array_buffer: Option<BufferId>,
    pub bound_element_buffer: Option<BufferId>,
    next_id: u32,
}

impl RecordingDevice {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail_context: true,
            ..Self::default()
        }
    }

    pub fn draw_calls(&self) -> Vec<&Call> {
        self.calls
            .iter()
            .filter(|call| matches!(call, Call::DrawElements { .. }))
            .collect()
    }

    pub fn live_handles(&self) -> usize {
        self.buffers.len() + self.vertex_arrays.len()
    }

    fn next(&mut self) -> u32 {
        // GL never hands out 0
        self.next_id += 1;
        self.next_id
    }
}

impl RenderDevice for RecordingDevice {
    fn acquire_context(&mut self) -> Result<(), DeviceError> {
        self.calls.push(Call::AcquireContext);
        if self.fail_context {
            return Err(DeviceError::ContextUnavailable);
        }
        Ok(())
    }

    fn make_current(&mut self) {
        self.calls.push(Call::MakeCurrent);
    }

    fn release_context(&mut self) {
        self.calls.push(Call::ReleaseContext);
    }

    fn create_vertex_array(&mut self) -> VertexArrayId {
        let id = VertexArrayId(self.next());
        self.vertex_arrays.insert(id);
        self.calls.push(Call::CreateVertexArray(id));
        id
    }

    fn bind_vertex_array(&mut self, vertex_array: Option<VertexArrayId>) {
        self.bound_vertex_array = vertex_array;
        self.calls.push(Call::BindVertexArray(vertex_array));
    }

    fn create_buffer(&mut self, kind: BufferKind, usage: BufferUsage, data: &[u8]) -> BufferId {
        let id = BufferId(self.next());
        self.buffers.insert(id, data.to_vec());
        match kind.target() {
            BufferTarget::Array => self.bound_array_buffer = Some(id),
            BufferTarget::ElementArray => self.bound_element_buffer = Some(id),
        }
        self.calls.push(Call::CreateBuffer {
            id,
            kind,
            usage,
            len: data.len(),
        });
        id
    }

    fn bind_buffer(&mut self, target: BufferTarget, buffer: Option<BufferId>) {
        match target {
            BufferTarget::Array => self.bound_array_buffer = buffer,
            BufferTarget::ElementArray => self.bound_element_buffer = buffer,
        }
        self.calls.push(Call::BindBuffer(target, buffer));
    }

    fn vertex_attrib_pointer(&mut self, slot: usize, attribute: &AttributeDesc, stride: usize) {
        self.calls.push(Call::VertexAttribPointer {
            slot,
            attribute: *attribute,
            stride,
            buffer: self.bound_array_buffer,
        });
    }

    fn clear(&mut self, color: [f32; 4]) {
        self.calls.push(Call::Clear(color));
    }

    fn apply_transform(&mut self, uniforms: &TransformUniforms) {
        self.calls.push(Call::ApplyTransform(*uniforms));
    }

    fn draw_elements(&mut self, primitive: Primitive, count: usize, format: IndexFormat, offset: usize) {
        self.calls.push(Call::DrawElements {
            primitive,
            count,
            format,
            offset,
        });
    }

    fn present(&mut self) {
        self.calls.push(Call::Present);
    }

    fn delete_buffer(&mut self, buffer: BufferId) {
        self.buffers.remove(&buffer);
        self.calls.push(Call::DeleteBuffer(buffer));
    }

    fn delete_vertex_array(&mut self, vertex_array: VertexArrayId) {
        self.vertex_arrays.remove(&vertex_array);
        self.calls.push(Call::DeleteVertexArray(vertex_array));
    }
}
