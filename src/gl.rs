//! `RenderDevice` on top of miniquad.
//!
//! miniquad has no vertex array objects, so the GL binding model is
//! emulated here: each vertex array remembers its attribute pointers and
//! index buffer, and a pipeline is built from them the first time the
//! vertex array is drawn.

use std::collections::HashMap;

use log::{error, trace, warn};
use miniquad::{
    Bindings, Buffer, BufferLayout, BufferType, Context, PassAction, Pipeline, PipelineParams,
    PrimitiveType, Shader, VertexAttribute, VertexFormat,
};

use crate::device::{
    BufferId, BufferKind, BufferTarget, BufferUsage, DeviceError, IndexFormat, Primitive,
    RenderDevice, VertexArrayId,
};
use crate::effect::TransformUniforms;
use crate::shader;
use crate::vertex::{AttributeDesc, ElementType, VertexLayout};

struct AttribPointer {
    slot: usize,
    attribute: AttributeDesc,
    stride: usize,
    buffer: BufferId,
}

#[derive(Default)]
struct VertexArray {
    pointers: Vec<AttribPointer>,
    index_buffer: Option<BufferId>,
    pipeline: Option<Pipeline>,
}

/// Vertex input of one vertex array, grouped per vertex buffer.
#[derive(Debug, Default, PartialEq)]
pub struct PipelineLayout {
    pub buffers: Vec<BufferId>,
    pub strides: Vec<usize>,
    /// Attributes in slot order, each with the index of its buffer.
    pub attributes: Vec<(AttributeDesc, usize)>,
}

/// GPU objects and binding state that outlive a single callback.
#[derive(Default)]
pub struct GlStore {
    shader: Option<Shader>,
    released: bool,
    next_id: u32,
    buffers: HashMap<BufferId, BufferKind>,
    gpu_buffers: HashMap<BufferId, Buffer>,
    vertex_arrays: HashMap<VertexArrayId, VertexArray>,
    bound_vertex_array: Option<VertexArrayId>,
    bound_array: Option<BufferId>,
    bound_element: Option<BufferId>,
    uniforms: Option<TransformUniforms>,
    in_pass: bool,
}

impl GlStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_id(&mut self) -> u32 {
        // GL never hands out 0
        self.next_id += 1;
        self.next_id
    }

    pub fn create_vertex_array(&mut self) -> VertexArrayId {
        let id = VertexArrayId(self.next_id());
        self.vertex_arrays.insert(id, VertexArray::default());
        id
    }

    /// Binding a vertex array also restores its element buffer binding.
    pub fn bind_vertex_array(&mut self, vertex_array: Option<VertexArrayId>) {
        self.bound_vertex_array = vertex_array;
        self.bound_element = vertex_array
            .and_then(|id| self.vertex_arrays.get(&id))
            .and_then(|vao| vao.index_buffer);
    }

    /// Records a new buffer and binds it to its target.
    pub fn register_buffer(&mut self, kind: BufferKind) -> BufferId {
        let id = BufferId(self.next_id());
        self.buffers.insert(id, kind);
        self.bind_buffer(kind.target(), Some(id));
        id
    }

    pub fn bind_buffer(&mut self, target: BufferTarget, buffer: Option<BufferId>) {
        match target {
            BufferTarget::Array => self.bound_array = buffer,
            BufferTarget::ElementArray => {
                self.bound_element = buffer;
                // the element binding belongs to the bound vertex array
                if let Some(vao) = self
                    .bound_vertex_array
                    .and_then(|id| self.vertex_arrays.get_mut(&id))
                {
                    vao.index_buffer = buffer;
                }
            }
        }
    }

    /// Captures the bound vertex buffer into the bound vertex array.
    pub fn vertex_attrib_pointer(&mut self, slot: usize, attribute: &AttributeDesc, stride: usize) -> bool {
        let buffer = match self.bound_array {
            Some(buffer) => buffer,
            None => {
                warn!("attribute {} set with no vertex buffer bound", attribute.name);
                return false;
            }
        };
        let vao = match self
            .bound_vertex_array
            .and_then(|id| self.vertex_arrays.get_mut(&id))
        {
            Some(vao) => vao,
            None => {
                warn!("attribute {} set with no vertex array bound", attribute.name);
                return false;
            }
        };

        vao.pointers.retain(|p| p.slot != slot);
        vao.pointers.push(AttribPointer {
            slot,
            attribute: *attribute,
            stride,
            buffer,
        });
        vao.pipeline = None;
        true
    }

    /// The vertex input of `id`, or `None` when it has no attributes or a
    /// buffer's attributes do not sit back to back. miniquad derives
    /// attribute offsets from their order, so gaps cannot be expressed.
    pub fn pipeline_layout(&mut self, id: VertexArrayId) -> Option<PipelineLayout> {
        let vao = self.vertex_arrays.get_mut(&id)?;
        if vao.pointers.is_empty() {
            return None;
        }
        vao.pointers.sort_by_key(|p| p.slot);

        let mut layout = PipelineLayout::default();
        let mut groups: Vec<Vec<AttributeDesc>> = vec![];
        for pointer in &vao.pointers {
            let index = match layout.buffers.iter().position(|b| *b == pointer.buffer) {
                Some(index) => index,
                None => {
                    layout.buffers.push(pointer.buffer);
                    layout.strides.push(pointer.stride);
                    groups.push(vec![]);
                    layout.buffers.len() - 1
                }
            };
            groups[index].push(pointer.attribute);
            layout.attributes.push((pointer.attribute, index));
        }

        for (index, attributes) in groups.iter().enumerate() {
            let packed = VertexLayout {
                stride: layout.strides[index],
                attributes: &attributes[..],
            }
            .is_packed();
            if !packed {
                error!(
                    "attributes of {:?} are not packed back to back, {:?} cannot be drawn",
                    layout.buffers[index], id
                );
                return None;
            }
        }
        Some(layout)
    }

    fn bindings(&self, layout: &PipelineLayout, index_buffer: BufferId) -> Option<Bindings> {
        let vertex_buffers = layout
            .buffers
            .iter()
            .map(|id| self.gpu_buffers.get(id).copied())
            .collect::<Option<Vec<Buffer>>>()?;
        let index_buffer = *self.gpu_buffers.get(&index_buffer)?;

        Some(Bindings {
            vertex_buffers,
            index_buffer,
            images: vec![],
        })
    }

    /// Forgets `buffer` and hands back its GPU object, if any, for deletion.
    pub fn delete_buffer(&mut self, buffer: BufferId) -> Option<Buffer> {
        self.buffers.remove(&buffer);
        if self.bound_array == Some(buffer) {
            self.bound_array = None;
        }
        if self.bound_element == Some(buffer) {
            self.bound_element = None;
        }
        self.gpu_buffers.remove(&buffer)
    }

    pub fn delete_vertex_array(&mut self, vertex_array: VertexArrayId) -> bool {
        if self.bound_vertex_array == Some(vertex_array) {
            self.bind_vertex_array(None);
        }
        self.vertex_arrays.remove(&vertex_array).is_some()
    }

    pub fn release(&mut self) {
        self.shader = None;
        self.uniforms = None;
        self.in_pass = false;
        self.released = true;
    }
}

/// Borrows the miniquad context for the length of one callback.
pub struct GlDevice<'a> {
    ctx: Option<&'a mut Context>,
    store: &'a mut GlStore,
}

impl<'a> GlDevice<'a> {
    pub fn new(ctx: &'a mut Context, store: &'a mut GlStore) -> Self {
        Self {
            ctx: Some(ctx),
            store,
        }
    }

    /// A device with no context at hand, enough to release resources.
    pub fn detached(store: &'a mut GlStore) -> Self {
        Self { ctx: None, store }
    }

    fn usable(&self, op: &str) -> bool {
        if self.store.released {
            warn!("{} after the context was released", op);
            return false;
        }
        true
    }

    fn pipeline(&mut self, id: VertexArrayId, primitive: Primitive, layout: &PipelineLayout) -> Option<Pipeline> {
        if let Some(pipeline) = self.store.vertex_arrays.get(&id).and_then(|vao| vao.pipeline) {
            return Some(pipeline);
        }
        let shader = self.store.shader?;
        let ctx = self.ctx.as_deref_mut()?;

        let buffer_layouts: Vec<BufferLayout> = layout
            .strides
            .iter()
            .map(|&stride| BufferLayout {
                stride: stride as i32,
                ..Default::default()
            })
            .collect();
        let attributes = layout
            .attributes
            .iter()
            .map(|(attribute, index)| {
                vertex_format(attribute)
                    .map(|format| VertexAttribute::with_buffer(attribute.name, format, *index))
            })
            .collect::<Option<Vec<_>>>()?;

        let pipeline = Pipeline::with_params(
            ctx,
            &buffer_layouts,
            &attributes,
            shader,
            PipelineParams {
                primitive_type: match primitive {
                    Primitive::Triangles => PrimitiveType::Triangles,
                },
                ..Default::default()
            },
        );
        if let Some(vao) = self.store.vertex_arrays.get_mut(&id) {
            vao.pipeline = Some(pipeline);
        }
        Some(pipeline)
    }
}

fn vertex_format(attribute: &AttributeDesc) -> Option<VertexFormat> {
    match (attribute.element_type, attribute.components) {
        (ElementType::Float, 1) => Some(VertexFormat::Float1),
        (ElementType::Float, 2) => Some(VertexFormat::Float2),
        (ElementType::Float, 3) => Some(VertexFormat::Float3),
        (ElementType::Float, 4) => Some(VertexFormat::Float4),
        (_, n) => {
            error!("unsupported component count {} for {}", n, attribute.name);
            None
        }
    }
}

fn upload(ctx: &mut Context, kind: BufferKind, usage: BufferUsage, data: &[u8]) -> Buffer {
    match (kind, usage) {
        (BufferKind::Vertex, BufferUsage::Static) => {
            Buffer::immutable(ctx, BufferType::VertexBuffer, data)
        }
        // miniquad picks the index type from the element size
        (BufferKind::Index(IndexFormat::U8), BufferUsage::Static) => {
            Buffer::immutable(ctx, BufferType::IndexBuffer, data)
        }
    }
}

impl<'a> RenderDevice for GlDevice<'a> {
    fn acquire_context(&mut self) -> Result<(), DeviceError> {
        if self.store.released {
            return Err(DeviceError::ContextReleased);
        }
        if self.store.shader.is_some() {
            return Ok(());
        }
        let ctx = match self.ctx.as_deref_mut() {
            Some(ctx) => ctx,
            None => return Err(DeviceError::ContextUnavailable),
        };

        let shader = Shader::new(ctx, shader::VERTEX, shader::FRAGMENT, shader::meta())
            .map_err(|err| DeviceError::ShaderCompilation(format!("{:?}", err)))?;
        self.store.shader = Some(shader);
        trace!("context acquired");
        Ok(())
    }

    fn make_current(&mut self) {
        // miniquad keeps its context current on the event loop thread
        trace!("make current");
    }

    fn release_context(&mut self) {
        self.store.release();
        trace!("context released");
    }

    fn create_vertex_array(&mut self) -> VertexArrayId {
        let id = self.store.create_vertex_array();
        trace!("created {:?}", id);
        id
    }

    fn bind_vertex_array(&mut self, vertex_array: Option<VertexArrayId>) {
        self.store.bind_vertex_array(vertex_array);
    }

    fn create_buffer(&mut self, kind: BufferKind, usage: BufferUsage, data: &[u8]) -> BufferId {
        let id = self.store.register_buffer(kind);
        if self.usable("create_buffer") {
            match self.ctx.as_deref_mut() {
                Some(ctx) => {
                    let buffer = upload(ctx, kind, usage, data);
                    self.store.gpu_buffers.insert(id, buffer);
                }
                None => warn!("{:?} has no context to upload into", id),
            }
        }
        trace!("created {:?} ({:?}, {} bytes)", id, kind, data.len());
        id
    }

    fn bind_buffer(&mut self, target: BufferTarget, buffer: Option<BufferId>) {
        self.store.bind_buffer(target, buffer);
    }

    fn vertex_attrib_pointer(&mut self, slot: usize, attribute: &AttributeDesc, stride: usize) {
        self.store.vertex_attrib_pointer(slot, attribute, stride);
    }

    fn clear(&mut self, color: [f32; 4]) {
        if !self.usable("clear") || self.store.in_pass {
            return;
        }
        if let Some(ctx) = self.ctx.as_deref_mut() {
            let [r, g, b, a] = color;
            ctx.begin_default_pass(PassAction::clear_color(r, g, b, a));
            self.store.in_pass = true;
        }
    }

    fn apply_transform(&mut self, uniforms: &TransformUniforms) {
        self.store.uniforms = Some(*uniforms);
    }

    fn draw_elements(&mut self, primitive: Primitive, count: usize, format: IndexFormat, offset: usize) {
        if !self.usable("draw_elements") {
            return;
        }
        if !self.store.in_pass {
            warn!("draw_elements outside of a frame");
            return;
        }
        let id = match self.store.bound_vertex_array {
            Some(id) => id,
            None => {
                warn!("draw_elements with no vertex array bound");
                return;
            }
        };
        let index_buffer = match self.store.bound_element {
            Some(index_buffer) => index_buffer,
            None => {
                warn!("draw_elements with no index buffer bound to {:?}", id);
                return;
            }
        };
        if self.store.buffers.get(&index_buffer) != Some(&BufferKind::Index(format)) {
            warn!("draw_elements as {:?} but {:?} is not such an index buffer", format, index_buffer);
            return;
        }

        let layout = match self.store.pipeline_layout(id) {
            Some(layout) => layout,
            None => return,
        };
        let bindings = match self.store.bindings(&layout, index_buffer) {
            Some(bindings) => bindings,
            None => {
                warn!("{:?} is missing buffers, draw skipped", id);
                return;
            }
        };
        let pipeline = match self.pipeline(id, primitive, &layout) {
            Some(pipeline) => pipeline,
            None => return,
        };

        if let Some(ctx) = self.ctx.as_deref_mut() {
            ctx.apply_pipeline(&pipeline);
            ctx.apply_bindings(&bindings);
            if let Some(uniforms) = self.store.uniforms {
                ctx.apply_uniforms(&uniforms);
            }
            ctx.draw((offset / format.size()) as i32, count as i32, 1);
        }
    }

    fn present(&mut self) {
        if !self.store.in_pass {
            return;
        }
        if let Some(ctx) = self.ctx.as_deref_mut() {
            ctx.end_render_pass();
            ctx.commit_frame();
        }
        self.store.in_pass = false;
    }

    fn delete_buffer(&mut self, buffer: BufferId) {
        if let Some(gpu) = self.store.delete_buffer(buffer) {
            gpu.delete();
            trace!("deleted {:?}", buffer);
        }
    }

    fn delete_vertex_array(&mut self, vertex_array: VertexArrayId) {
        if self.store.delete_vertex_array(vertex_array) {
            trace!("deleted {:?}", vertex_array);
        }
    }
}
