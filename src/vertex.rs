use std::mem::{offset_of, size_of};

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub color: [f32; 4],
}

// color must start right after the three position floats
const _: () = assert!(offset_of!(Vertex, color) == 3 * size_of::<f32>());
const _: () = assert!(size_of::<Vertex>() == 7 * size_of::<f32>());

pub const QUAD_VERTICES: [Vertex; 4] = [
    Vertex {
        position: [1.0, -1.0, 0.0],
        color: [1.0, 0.0, 0.0, 1.0],
    },
    Vertex {
        position: [1.0, 1.0, 0.0],
        color: [0.0, 1.0, 0.0, 1.0],
    },
    Vertex {
        position: [-1.0, 1.0, 0.0],
        color: [0.0, 0.0, 1.0, 1.0],
    },
    Vertex {
        position: [-1.0, -1.0, 0.0],
        color: [0.0, 0.0, 0.0, 1.0],
    },
];

/// Two triangles, (0, 1, 2) and (2, 3, 0).
pub const QUAD_INDICES: [u8; 6] = [0, 1, 2, 2, 3, 0];

/// Bytes needed to upload `records` as a tightly packed array.
///
/// Uses the array stride of `T`, so alignment padding is counted.
pub fn byte_size<T>(records: &[T]) -> usize {
    records.len() * size_of::<T>()
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ElementType {
    Float,
}

impl ElementType {
    pub fn size(self) -> usize {
        match self {
            ElementType::Float => size_of::<f32>(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AttributeDesc {
    pub name: &'static str,
    pub components: usize,
    pub element_type: ElementType,
    pub offset: usize,
}

impl AttributeDesc {
    pub fn byte_len(&self) -> usize {
        self.components * self.element_type.size()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VertexLayout<'a> {
    pub stride: usize,
    pub attributes: &'a [AttributeDesc],
}

impl VertexLayout<'_> {
    /// True when every attribute starts where the previous one ended.
    pub fn is_packed(&self) -> bool {
        let mut next = 0;
        for attr in self.attributes {
            if attr.offset != next {
                return false;
            }
            next += attr.byte_len();
        }
        next <= self.stride
    }
}

impl Vertex {
    pub const LAYOUT: VertexLayout<'static> = VertexLayout {
        stride: size_of::<Vertex>(),
        attributes: &[
            AttributeDesc {
                name: "position",
                components: 3,
                element_type: ElementType::Float,
                offset: offset_of!(Vertex, position),
            },
            AttributeDesc {
                name: "color",
                components: 4,
                element_type: ElementType::Float,
                offset: offset_of!(Vertex, color),
            },
        ],
    };
}
