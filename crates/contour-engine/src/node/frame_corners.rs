use super::frame_edges::FrameMetrics;
use super::geometry::{device_value, rounded_size, Extent, Geometry};
use super::material::{MaterialKind, TextureMaterial};
use super::state::{DirtyState, NodeParams, NodeState, TextureParams};
use super::vertex::FrameVertex;
use super::{DrawData, NodeKind, ShapeNode};
use crate::coords::Size;
use crate::error::ShapeError;
use crate::paint::Rgba;
use crate::raster::ShapeType;
use crate::texture::ContextRegistry;

static INDICES: [u16; 26] = [
    0, 6, 1, 8, 4, 4, 5, 5, 9, 2, 7, 3, 3, 16, 16, 12, 17, 10, 14, 14, 15, 15, 11, 18, 13, 19,
];

pub const OUTER_SLOT: usize = 0;
pub const INNER_SLOT: usize = 1;

/// Texture coordinates along one axis of a corner mask: `base` at the
/// content origin, one texel in from the near side.
#[derive(Debug, Copy, Clone)]
struct MaskAxis {
    base: f32,
    factor: f32,
}

impl MaskAxis {
    fn new(device_radius: f32) -> Self {
        let rounded = rounded_size(device_radius + 2.0);
        Self { base: rounded - device_radius - 1.0, factor: 1.0 / rounded }
    }

    #[inline]
    fn at(&self, device_offset: f32) -> f32 {
        self.factor * (self.base + device_offset)
    }
}

/// The four corners of a frame: the outer corner mask knocked out by the
/// inner one, `outer * (1 - inner)`.
pub struct FrameCornersNode {
    geometry: Geometry<FrameVertex, 20>,
    material: TextureMaterial<2>,
    state: NodeState<2>,
    params: NodeParams,
    blocked: bool,
}

impl FrameCornersNode {
    pub fn new(registry: &ContextRegistry, params: NodeParams) -> Self {
        log::debug!("frame corners node created");
        Self {
            geometry: Geometry::new(&INDICES),
            material: TextureMaterial::new(MaterialKind::Frame, registry.cache()),
            state: NodeState::new(),
            params,
            blocked: true,
        }
    }

    pub fn update(
        &mut self,
        size: Size,
        shape: ShapeType,
        radius: f32,
        thickness: f32,
        color: Rgba,
    ) {
        // Sub-pixel frames show seams at the corners.
        let radius = if thickness < 1.0 { 0.0 } else { radius };
        let e = Extent::of(size);
        let dpr = self.params.device_pixel_ratio;
        let FrameMetrics { thickness: t, radius: r, inner_radius: ri } =
            FrameMetrics::new(&e, radius, thickness, dpr);
        let (w, h) = (e.w, e.h);

        self.blocked = t <= 0.0 || device_value(r, dpr) == 0;
        if self.blocked {
            self.state.set_pending(OUTER_SLOT, None);
            self.state.set_pending(INNER_SLOT, None);
        } else {
            let slot =
                |radius: f32| TextureParams { shape, radius: device_value(radius, dpr), shadow: 0 };
            self.state.set_pending(OUTER_SLOT, Some(slot(r)));
            self.state.set_pending(INNER_SLOT, Some(slot(ri)));
        }

        let (dt, dro, dri) = (t * dpr, r * dpr, ri * dpr);
        let outer = MaskAxis::new(dro);
        let inner = MaskAxis::new(dri);
        let o = [outer.at(0.0), outer.at(dro), outer.at(dt), outer.at(dt + dri)];
        let i = [inner.at(0.0), inner.at(dri), inner.at(-dt), inner.at(-dt + dro)];

        let c = color.pack_premul();
        let v = |x: f32, y: f32, os: usize, ot: usize, is: usize, it: usize| FrameVertex {
            pos: [x, y],
            outer: [o[os], o[ot]],
            inner: [i[is], i[it]],
            color: c,
        };
        let edge = t + ri;
        let vertices = [
            v(0.0, 0.0, 0, 0, 2, 2),
            v(r, 0.0, 1, 0, 3, 2),
            v(w - r, 0.0, 1, 0, 3, 2),
            v(w, 0.0, 0, 0, 2, 2),
            v(edge, t, 3, 2, 1, 0),
            v(w - edge, t, 3, 2, 1, 0),
            v(0.0, r, 0, 1, 2, 3),
            v(w, r, 0, 1, 2, 3),
            v(t, edge, 2, 3, 0, 1),
            v(w - t, edge, 2, 3, 0, 1),
            v(t, h - edge, 2, 3, 0, 1),
            v(w - t, h - edge, 2, 3, 0, 1),
            v(0.0, h - r, 0, 1, 2, 3),
            v(w, h - r, 0, 1, 2, 3),
            v(edge, h - t, 3, 2, 1, 0),
            v(w - edge, h - t, 3, 2, 1, 0),
            v(0.0, h, 0, 0, 2, 2),
            v(r, h, 1, 0, 3, 2),
            v(w - r, h, 1, 0, 3, 2),
            v(w, h, 0, 0, 2, 2),
        ];
        if *self.geometry.vertices() != vertices {
            self.geometry.set_vertices(vertices);
            self.state.mark(DirtyState::GEOMETRY);
        }
    }

    #[inline]
    pub fn state(&self) -> &NodeState<2> {
        &self.state
    }

    #[inline]
    pub fn geometry(&self) -> &Geometry<FrameVertex, 20> {
        &self.geometry
    }
}

impl ShapeNode for FrameCornersNode {
    fn kind(&self) -> NodeKind {
        NodeKind::FrameCorners
    }

    fn set_visible(&mut self, visible: bool) -> bool {
        self.state.set_visible(visible)
    }

    fn is_subtree_blocked(&self) -> bool {
        self.blocked || !self.state.is_visible()
    }

    fn uses_preprocess(&self) -> bool {
        true
    }

    fn preprocess(&mut self) -> Result<(), ShapeError> {
        if !self.state.is_texture_stale() {
            return Ok(());
        }
        self.material.reconcile(&mut self.state)
    }

    fn take_dirty(&mut self) -> DirtyState {
        self.state.take_dirty()
    }

    fn draw_data(&self) -> Option<DrawData<'_>> {
        let key = self.material.key();
        if self.is_subtree_blocked() || !key.is_complete() {
            return None;
        }
        Some(DrawData::new(&self.geometry, key))
    }
}

impl Drop for FrameCornersNode {
    fn drop(&mut self) {
        log::debug!("frame corners node destroyed");
    }
}
