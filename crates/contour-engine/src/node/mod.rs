//! Geometry nodes: fixed-topology vertex buffers plus the material each one
//! draws with.
//!
//! Every node follows the same two-phase protocol:
//! - `update(..)` rewrites the vertex buffer synchronously and records the
//!   texture parameters it needs (in device pixels)
//! - `preprocess()` runs once per frame before drawing and acquires those
//!   textures from the context cache when they changed
//!
//! Texture coordinates are computed from the layout the pending texture
//! will have, so geometry never waits on preprocessing.

mod drop_shadow;
mod fill_center;
mod fill_corners;
mod frame_corners;
mod frame_edges;
mod geometry;
mod material;
mod state;
mod vertex;

pub use drop_shadow::DropShadowNode;
pub use fill_center::FillCenterNode;
pub use fill_corners::FillCornersNode;
pub use frame_corners::FrameCornersNode;
pub use frame_edges::FrameEdgesNode;
pub use geometry::{
    device_value, key_limited, rounded_size, Extent, Geometry, ShadowMapping,
};
pub use material::{ColorMaterial, MaterialKey, MaterialKind, TextureMaterial};
pub use state::{DirtyState, NodeParams, NodeState, ShadowParams, TextureParams};
pub use vertex::{
    ColorMaskVertex, ColorVertex, FrameVertex, ShadowColorVertex, Vertex, VertexLayout,
};

use crate::error::ShapeError;

/// The five node kinds of a shape item, in paint order.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NodeKind {
    DropShadow,
    FillCenter,
    FillCorners,
    FrameEdges,
    FrameCorners,
}

/// What the renderer needs to draw one node.
#[derive(Debug, Clone, Copy)]
pub struct DrawData<'a> {
    pub layout: VertexLayout,
    pub vertices: &'a [u8],
    pub indices: &'static [u16],
    pub vertex_count: usize,
    pub material: MaterialKey,
}

impl<'a> DrawData<'a> {
    pub(crate) fn new<V: Vertex, const C: usize>(
        geometry: &'a Geometry<V, C>,
        material: MaterialKey,
    ) -> Self {
        Self {
            layout: geometry.layout(),
            vertices: geometry.vertex_bytes(),
            indices: geometry.indices(),
            vertex_count: C,
            material,
        }
    }
}

/// Interface the frame pass drives.
pub trait ShapeNode {
    fn kind(&self) -> NodeKind;

    fn set_visible(&mut self, visible: bool) -> bool;

    /// `true` when neither this node nor its subtree should be traversed.
    fn is_subtree_blocked(&self) -> bool;

    /// `true` when [`preprocess`](Self::preprocess) has work to do at all.
    fn uses_preprocess(&self) -> bool;

    fn preprocess(&mut self) -> Result<(), ShapeError>;

    /// Flags raised since the last call.
    fn take_dirty(&mut self) -> DirtyState;

    /// `None` renders nothing this frame.
    fn draw_data(&self) -> Option<DrawData<'_>>;
}
