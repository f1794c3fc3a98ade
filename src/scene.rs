use std::fmt;

use anyhow::{Context as _, Result};
use log::{debug, info, warn};

use crate::device::{
    BufferId, BufferKind, BufferTarget, BufferUsage, IndexFormat, Primitive, RenderDevice,
    VertexArrayId,
};
use crate::effect::BaseEffect;
use crate::transform::{Transform, Viewport};
use crate::vertex::{byte_size, Vertex, QUAD_INDICES, QUAD_VERTICES};

pub const CLEAR_COLOR: [f32; 4] = [0.85, 0.85, 0.85, 1.0];

/// Entry points a host loop drives.
///
/// `init` once when the surface is ready, `update` then `draw` every frame,
/// `teardown` when the surface goes away.
pub trait Scene {
    fn init<D: RenderDevice>(&mut self, device: &mut D) -> Result<()>;
    fn update(&mut self, dt: f32, viewport: Viewport);
    fn draw<D: RenderDevice>(&mut self, device: &mut D);
    fn teardown<D: RenderDevice>(&mut self, device: &mut D);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneError {
    AlreadyInitialized,
    Destroyed,
}

impl fmt::Display for SceneError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SceneError::AlreadyInitialized => write!(f, "scene is already initialized"),
            SceneError::Destroyed => write!(f, "scene was torn down"),
        }
    }
}

impl std::error::Error for SceneError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeshHandles {
    pub vertex_array: VertexArrayId,
    pub vertex_buffer: BufferId,
    pub index_buffer: BufferId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Uninitialized,
    Initialized(MeshHandles),
    Destroyed,
}

/// One colored quad spinning about Z.
#[derive(Debug)]
pub struct QuadScene {
    state: State,
    transform: Transform,
    effect: BaseEffect,
}

impl Default for QuadScene {
    fn default() -> Self {
        Self::new()
    }
}

impl QuadScene {
    pub fn new() -> Self {
        let transform = Transform::new();
        let mut effect = BaseEffect::new();
        effect.set_transform(transform.projection(), transform.model_view());
        Self {
            state: State::Uninitialized,
            transform,
            effect,
        }
    }

    pub fn rotation(&self) -> f32 {
        self.transform.rotation()
    }

    #[cfg(test)]
    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    #[cfg(test)]
    pub fn effect(&self) -> &BaseEffect {
        &self.effect
    }

    #[cfg(test)]
    pub fn handles(&self) -> Option<MeshHandles> {
        match self.state {
            State::Initialized(handles) => Some(handles),
            _ => None,
        }
    }

    #[cfg(test)]
    pub fn is_destroyed(&self) -> bool {
        self.state == State::Destroyed
    }

    fn upload_mesh<D: RenderDevice>(device: &mut D) -> MeshHandles {
        let vertex_array = device.create_vertex_array();
        device.bind_vertex_array(Some(vertex_array));

        let vertex_bytes: &[u8] = bytemuck::cast_slice(&QUAD_VERTICES[..]);
        debug_assert_eq!(vertex_bytes.len(), byte_size(&QUAD_VERTICES));
        let vertex_buffer = device.create_buffer(BufferKind::Vertex, BufferUsage::Static, vertex_bytes);

        let layout = Vertex::LAYOUT;
        for (slot, attribute) in layout.attributes.iter().enumerate() {
            device.vertex_attrib_pointer(slot, attribute, layout.stride);
        }

        let index_buffer = device.create_buffer(
            BufferKind::Index(IndexFormat::U8),
            BufferUsage::Static,
            &QUAD_INDICES,
        );

        device.bind_vertex_array(None);
        device.bind_buffer(BufferTarget::Array, None);
        device.bind_buffer(BufferTarget::ElementArray, None);

        MeshHandles {
            vertex_array,
            vertex_buffer,
            index_buffer,
        }
    }
}

impl Scene for QuadScene {
    fn init<D: RenderDevice>(&mut self, device: &mut D) -> Result<()> {
        match self.state {
            State::Uninitialized => (),
            State::Initialized(_) => return Err(SceneError::AlreadyInitialized.into()),
            State::Destroyed => return Err(SceneError::Destroyed.into()),
        }

        device
            .acquire_context()
            .context("failed to acquire a rendering context")?;

        let handles = Self::upload_mesh(device);
        info!(
            "uploaded quad: {} vertices ({} bytes), {} indices",
            QUAD_VERTICES.len(),
            byte_size(&QUAD_VERTICES),
            QUAD_INDICES.len()
        );
        self.state = State::Initialized(handles);
        Ok(())
    }

    fn update(&mut self, dt: f32, viewport: Viewport) {
        self.transform.advance(dt, viewport);
        self.effect
            .set_transform(self.transform.projection(), self.transform.model_view());
    }

    fn draw<D: RenderDevice>(&mut self, device: &mut D) {
        let handles = match self.state {
            State::Initialized(handles) => handles,
            state => {
                warn!("draw skipped, scene is {:?}", state);
                return;
            }
        };

        device.clear(CLEAR_COLOR);
        self.effect.prepare_frame(device);

        device.bind_vertex_array(Some(handles.vertex_array));
        device.draw_elements(Primitive::Triangles, QUAD_INDICES.len(), IndexFormat::U8, 0);
        device.bind_vertex_array(None);

        device.present();
    }

    fn teardown<D: RenderDevice>(&mut self, device: &mut D) {
        let handles = match self.state {
            State::Initialized(handles) => handles,
            state => {
                debug!("teardown ignored, scene is {:?}", state);
                return;
            }
        };

        device.make_current();
        device.delete_buffer(handles.vertex_buffer);
        device.delete_buffer(handles.index_buffer);
        device.delete_vertex_array(handles.vertex_array);
        device.release_context();

        self.state = State::Destroyed;
        info!("scene torn down");
    }
}
