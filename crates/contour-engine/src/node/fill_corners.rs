use super::geometry::{device_value, key_limited, rounded_size, Extent, Geometry};
use super::material::{MaterialKind, TextureMaterial};
use super::state::{DirtyState, NodeParams, NodeState, TextureParams};
use super::vertex::ColorMaskVertex;
use super::{DrawData, NodeKind, ShapeNode};
use crate::coords::Size;
use crate::error::ShapeError;
use crate::paint::Rgba;
use crate::raster::ShapeType;
use crate::texture::ContextRegistry;

// Four corner triangles stitched by degenerate ones.
static INDICES: [u16; 12] = [1, 0, 4, 6, 8, 9, 10, 11, 7, 5, 3, 2];

/// The four antialiased corners of a filled shape, masked by one corner
/// texture. The octagon between them is drawn by the fill center.
pub struct FillCornersNode {
    geometry: Geometry<ColorMaskVertex, 12>,
    material: TextureMaterial<1>,
    state: NodeState<1>,
    params: NodeParams,
    blocked: bool,
}

impl FillCornersNode {
    pub fn new(registry: &ContextRegistry, params: NodeParams) -> Self {
        log::debug!("fill corners node created");
        Self {
            geometry: Geometry::new(&INDICES),
            material: TextureMaterial::new(MaterialKind::ColorMask, registry.cache()),
            state: NodeState::new(),
            params,
            blocked: true,
        }
    }

    pub fn update(&mut self, size: Size, shape: ShapeType, radius: f32, color: Rgba) {
        let e = Extent::of(size);
        let dpr = self.params.device_pixel_ratio;
        let r = key_limited(e.clamp(radius), dpr);
        let (w, h) = (e.w, e.h);
        let device_radius = device_value(r, dpr);

        self.blocked = device_radius == 0;
        self.state.set_pending(
            0,
            (!self.blocked).then_some(TextureParams { shape, radius: device_radius, shadow: 0 }),
        );

        let texture_size = r * dpr + 2.0;
        let rounded = rounded_size(texture_size);
        let s = (rounded - texture_size + 1.0) / rounded;
        let t = (rounded - 1.0) / rounded;
        let c = color.pack_premul();

        let v = |x: f32, y: f32, ms: f32, mt: f32| ColorMaskVertex::new(x, y, ms, mt, c);
        let vertices = [
            v(0.0, 0.0, s, s),
            v(r, 0.0, t, s),
            v(w - r, 0.0, t, s),
            v(w, 0.0, s, s),
            v(0.0, r, s, t),
            v(w, r, s, t),
            v(0.0, h - r, s, t),
            v(w, h - r, s, t),
            v(0.0, h, s, s),
            v(r, h, t, s),
            v(w - r, h, t, s),
            v(w, h, s, s),
        ];
        if *self.geometry.vertices() != vertices {
            self.geometry.set_vertices(vertices);
            self.state.mark(DirtyState::GEOMETRY);
        }
    }

    #[inline]
    pub fn state(&self) -> &NodeState<1> {
        &self.state
    }

    #[inline]
    pub fn geometry(&self) -> &Geometry<ColorMaskVertex, 12> {
        &self.geometry
    }
}

impl ShapeNode for FillCornersNode {
    fn kind(&self) -> NodeKind {
        NodeKind::FillCorners
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

impl Drop for FillCornersNode {
    fn drop(&mut self) {
        log::debug!("fill corners node destroyed");
    }
}
