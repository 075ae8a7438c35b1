use super::geometry::{device_value, key_limited, Extent, Geometry, ShadowMapping};
use super::material::{MaterialKind, TextureMaterial};
use super::state::{DirtyState, NodeParams, NodeState, ShadowParams, TextureParams};
use super::vertex::ColorMaskVertex;
use super::{DrawData, NodeKind, ShapeNode};
use crate::coords::{Size, Vec2};
use crate::error::ShapeError;
use crate::raster::ShapeType;
use crate::texture::ContextRegistry;

static INDICES: [u16; 14] = [0, 3, 1, 4, 2, 5, 5, 3, 3, 6, 4, 7, 5, 8];

/// Blurred shadow behind a shape, drawn from the outer channel of a shadow
/// texture on a 3×3 grid mirrored around the item center.
pub struct DropShadowNode {
    geometry: Geometry<ColorMaskVertex, 9>,
    material: TextureMaterial<1>,
    state: NodeState<1>,
    params: NodeParams,
    blocked: bool,
}

impl DropShadowNode {
    pub fn new(registry: &ContextRegistry, params: NodeParams) -> Self {
        log::debug!("drop shadow node created");
        Self {
            geometry: Geometry::new(&INDICES),
            material: TextureMaterial::new(MaterialKind::DropShadow, registry.cache()),
            state: NodeState::new(),
            params,
            blocked: true,
        }
    }

    pub fn update(&mut self, size: Size, shape: ShapeType, radius: f32, shadow: &ShadowParams) {
        let e = Extent::of(size);
        let dpr = self.params.device_pixel_ratio;
        let r = key_limited(e.clamp(radius), dpr);
        let s = key_limited(e.clamp(shadow.size), dpr);
        let (w, h) = (e.w, e.h);
        let device_shadow = device_value(s, dpr);

        self.blocked = device_shadow == 0;
        self.state.set_pending(
            0,
            (!self.blocked).then_some(TextureParams {
                shape,
                radius: device_value(r, dpr),
                shadow: device_shadow,
            }),
        );

        // The shadow falls away from the light.
        let offset = Vec2::shadow_offset(shadow.angle + 180.0, shadow.distance);
        let mapping = ShadowMapping::new(2.0 * s + r, dpr);
        let edge = mapping.coord(0.0);
        let (mid_w, mid_h) = (w * 0.5, h * 0.5);
        let mid_s = mapping.coord(s + mid_w);
        let mid_t = mapping.coord(s + mid_h);

        let xs = [(-s, edge), (mid_w, mid_s), (w + s, edge)];
        let ys = [(-s, edge), (mid_h, mid_t), (h + s, edge)];
        let c = shadow.color.pack_premul();
        let vertices: [ColorMaskVertex; 9] = std::array::from_fn(|i| {
            let (x, ms) = xs[i % 3];
            let (y, mt) = ys[i / 3];
            ColorMaskVertex::new(x + offset.x, y + offset.y, ms, mt, c)
        });
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
    pub fn geometry(&self) -> &Geometry<ColorMaskVertex, 9> {
        &self.geometry
    }
}

impl ShapeNode for DropShadowNode {
    fn kind(&self) -> NodeKind {
        NodeKind::DropShadow
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

impl Drop for DropShadowNode {
    fn drop(&mut self) {
        log::debug!("drop shadow node destroyed");
    }
}
