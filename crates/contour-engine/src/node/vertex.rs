use bytemuck::{Pod, Zeroable};

use crate::paint::PackedColor;

/// Vertex formats understood by the node renderer.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum VertexLayout {
    Color,
    ColorMask,
    ShadowColor,
    Frame,
}

/// A vertex type with a fixed GPU layout.
pub trait Vertex: Pod + Default + PartialEq {
    const LAYOUT: VertexLayout;

    fn buffer_layout() -> wgpu::VertexBufferLayout<'static>;
}

macro_rules! buffer_layout {
    ($ty:ty, $attrs:expr) => {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<$ty>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: $attrs,
        }
    };
}

/// Flat colored vertex (fill center, frame edges).
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Pod, Zeroable)]
pub struct ColorVertex {
    pub pos: [f32; 2],
    pub color: PackedColor,
}

impl ColorVertex {
    const ATTRS: [wgpu::VertexAttribute; 2] =
        wgpu::vertex_attr_array![0 => Float32x2, 1 => Unorm8x4];

    #[inline]
    pub fn new(x: f32, y: f32, color: PackedColor) -> Self {
        Self { pos: [x, y], color }
    }
}

impl Vertex for ColorVertex {
    const LAYOUT: VertexLayout = VertexLayout::Color;

    fn buffer_layout() -> wgpu::VertexBufferLayout<'static> {
        buffer_layout!(ColorVertex, &Self::ATTRS)
    }
}

/// Colored vertex modulated by one texture channel (corners, drop shadow).
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Pod, Zeroable)]
pub struct ColorMaskVertex {
    pub pos: [f32; 2],
    pub mask: [f32; 2],
    pub color: PackedColor,
}

impl ColorMaskVertex {
    const ATTRS: [wgpu::VertexAttribute; 3] =
        wgpu::vertex_attr_array![0 => Float32x2, 1 => Float32x2, 2 => Unorm8x4];

    #[inline]
    pub fn new(x: f32, y: f32, s: f32, t: f32, color: PackedColor) -> Self {
        Self { pos: [x, y], mask: [s, t], color }
    }
}

impl Vertex for ColorMaskVertex {
    const LAYOUT: VertexLayout = VertexLayout::ColorMask;

    fn buffer_layout() -> wgpu::VertexBufferLayout<'static> {
        buffer_layout!(ColorMaskVertex, &Self::ATTRS)
    }
}

/// Fill vertex blended with an inner shadow.
///
/// `mid_shadow` is the texture coordinate of the item center; the shader
/// mirrors `shadow` around it so one corner quadrant covers the whole item.
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Pod, Zeroable)]
pub struct ShadowColorVertex {
    pub pos: [f32; 2],
    pub shadow: [f32; 2],
    pub mid_shadow: [f32; 2],
    pub color: PackedColor,
    pub shadow_color: PackedColor,
}

impl ShadowColorVertex {
    const ATTRS: [wgpu::VertexAttribute; 5] = wgpu::vertex_attr_array![
        0 => Float32x2,
        1 => Float32x2,
        2 => Float32x2,
        3 => Unorm8x4,
        4 => Unorm8x4,
    ];
}

impl Vertex for ShadowColorVertex {
    const LAYOUT: VertexLayout = VertexLayout::ShadowColor;

    fn buffer_layout() -> wgpu::VertexBufferLayout<'static> {
        buffer_layout!(ShadowColorVertex, &Self::ATTRS)
    }
}

/// Frame corner vertex: coverage is `outer * (1 - inner)`.
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Pod, Zeroable)]
pub struct FrameVertex {
    pub pos: [f32; 2],
    pub outer: [f32; 2],
    pub inner: [f32; 2],
    pub color: PackedColor,
}

impl FrameVertex {
    const ATTRS: [wgpu::VertexAttribute; 4] = wgpu::vertex_attr_array![
        0 => Float32x2,
        1 => Float32x2,
        2 => Float32x2,
        3 => Unorm8x4,
    ];
}

impl Vertex for FrameVertex {
    const LAYOUT: VertexLayout = VertexLayout::Frame;

    fn buffer_layout() -> wgpu::VertexBufferLayout<'static> {
        buffer_layout!(FrameVertex, &Self::ATTRS)
    }
}

impl VertexLayout {
    pub fn buffer_layout(self) -> wgpu::VertexBufferLayout<'static> {
        match self {
            VertexLayout::Color => ColorVertex::buffer_layout(),
            VertexLayout::ColorMask => ColorMaskVertex::buffer_layout(),
            VertexLayout::ShadowColor => ShadowColorVertex::buffer_layout(),
            VertexLayout::Frame => FrameVertex::buffer_layout(),
        }
    }

    pub fn stride(self) -> usize {
        self.buffer_layout().array_stride as usize
    }
}
