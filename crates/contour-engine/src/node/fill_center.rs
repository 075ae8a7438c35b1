use std::rc::Rc;

use super::geometry::{device_value, key_limited, Extent, Geometry, ShadowMapping};
use super::material::{ColorMaterial, MaterialKind, TextureMaterial};
use super::state::{DirtyState, NodeParams, NodeState, ShadowParams, TextureParams};
use super::vertex::{ColorVertex, ShadowColorVertex, Vertex};
use super::{DrawData, NodeKind, ShapeNode};
use crate::coords::{Size, Vec2};
use crate::error::ShapeError;
use crate::paint::Rgba;
use crate::raster::ShapeType;
use crate::texture::{ContextRegistry, TextureCache};

// Octagon as a single strip.
static INDICES: [u16; 8] = [2, 4, 0, 6, 1, 7, 3, 5];

enum Style {
    Color {
        geometry: Geometry<ColorVertex, 8>,
        material: ColorMaterial,
    },
    InnerShadow {
        geometry: Geometry<ShadowColorVertex, 8>,
        material: TextureMaterial<1>,
    },
}

impl Style {
    fn color() -> Self {
        Style::Color { geometry: Geometry::new(&INDICES), material: ColorMaterial::new() }
    }
}

/// The octagon inside the four corners of a filled shape.
///
/// Flat colored by default. With a visible inner shadow it samples the inner
/// channel of a shadow texture, mirrored around the item center so a single
/// corner quadrant covers all four sides.
pub struct FillCenterNode {
    style: Style,
    state: NodeState<1>,
    params: NodeParams,
    cache: Rc<TextureCache>,
}

/// Octagon corner positions, `v0..v7`.
fn octagon(w: f32, h: f32, r: f32) -> [(f32, f32); 8] {
    [
        (r, 0.0),
        (w - r, 0.0),
        (0.0, r),
        (w, r),
        (0.0, h - r),
        (w, h - r),
        (r, h),
        (w - r, h),
    ]
}

impl FillCenterNode {
    pub fn new(registry: &ContextRegistry, params: NodeParams) -> Self {
        log::debug!("fill center node created");
        Self {
            style: Style::color(),
            state: NodeState::new(),
            params,
            cache: registry.cache(),
        }
    }

    pub fn update(
        &mut self,
        size: Size,
        shape: ShapeType,
        radius: f32,
        color: Rgba,
        inner_shadow: &ShadowParams,
    ) {
        let e = Extent::of(size);
        let dpr = self.params.device_pixel_ratio;
        let r = key_limited(e.clamp(radius), dpr);
        let shadow = key_limited(e.clamp(inner_shadow.size), dpr);
        let device_shadow = device_value(shadow, dpr);
        let packed = color.pack_premul();
        let points = octagon(e.w, e.h, r);

        if !(inner_shadow.color.is_visible() && device_shadow > 0) {
            self.state.set_pending(0, None);
            self.state.set_current(0, None);
            if !matches!(self.style, Style::Color { .. }) {
                self.style = Style::color();
                self.state.mark(DirtyState::MATERIAL);
            }
            let Style::Color { geometry, material } = &mut self.style else {
                return;
            };
            let vertices = points.map(|(x, y)| ColorVertex::new(x, y, packed));
            if material.set_blending(!color.is_opaque()) {
                self.state.mark(DirtyState::MATERIAL);
            }
            apply(geometry, vertices, &mut self.state);
            return;
        }

        self.state.set_pending(
            0,
            Some(TextureParams {
                shape,
                radius: device_value(r, dpr),
                shadow: device_shadow,
            }),
        );
        if !matches!(self.style, Style::InnerShadow { .. }) {
            self.style = Style::InnerShadow {
                geometry: Geometry::new(&INDICES),
                material: TextureMaterial::new(MaterialKind::InnerShadow, self.cache.clone()),
            };
            self.state.mark(DirtyState::MATERIAL);
        }
        let Style::InnerShadow { geometry, material } = &mut self.style else {
            return;
        };

        let offset = Vec2::shadow_offset(inner_shadow.angle, inner_shadow.distance);
        let mapping = ShadowMapping::new(2.0 * shadow + r, dpr);
        let mid = [
            mapping.coord(shadow + (e.w * 0.5).floor()),
            mapping.coord(shadow + (e.h * 0.5).floor()),
        ];
        let shadow_color = inner_shadow.color.pack_premul();
        let vertices = points.map(|(x, y)| ShadowColorVertex {
            pos: [x, y],
            shadow: [
                mapping.coord(offset.x + shadow + x),
                mapping.coord(offset.y + shadow + y),
            ],
            mid_shadow: mid,
            color: packed,
            shadow_color,
        });
        if material.set_blending(!(color.is_opaque() && inner_shadow.color.is_opaque())) {
            self.state.mark(DirtyState::MATERIAL);
        }
        apply(geometry, vertices, &mut self.state);
    }

    /// `true` while the inner shadow style is active.
    pub fn has_inner_shadow(&self) -> bool {
        matches!(self.style, Style::InnerShadow { .. })
    }

    #[inline]
    pub fn state(&self) -> &NodeState<1> {
        &self.state
    }

    /// Vertex bytes of the active style.
    pub fn vertex_bytes(&self) -> &[u8] {
        match &self.style {
            Style::Color { geometry, .. } => geometry.vertex_bytes(),
            Style::InnerShadow { geometry, .. } => geometry.vertex_bytes(),
        }
    }
}

fn apply<V: Vertex, const C: usize>(
    geometry: &mut Geometry<V, C>,
    vertices: [V; C],
    state: &mut NodeState<1>,
) {
    if *geometry.vertices() != vertices {
        geometry.set_vertices(vertices);
        state.mark(DirtyState::GEOMETRY);
    }
}

impl ShapeNode for FillCenterNode {
    fn kind(&self) -> NodeKind {
        NodeKind::FillCenter
    }

    fn set_visible(&mut self, visible: bool) -> bool {
        self.state.set_visible(visible)
    }

    fn is_subtree_blocked(&self) -> bool {
        !self.state.is_visible()
    }

    fn uses_preprocess(&self) -> bool {
        self.has_inner_shadow()
    }

    fn preprocess(&mut self) -> Result<(), ShapeError> {
        match &mut self.style {
            Style::InnerShadow { material, .. } if self.state.is_texture_stale() => {
                material.reconcile(&mut self.state)
            }
            _ => Ok(()),
        }
    }

    fn take_dirty(&mut self) -> DirtyState {
        self.state.take_dirty()
    }

    fn draw_data(&self) -> Option<DrawData<'_>> {
        if self.is_subtree_blocked() {
            return None;
        }
        match &self.style {
            Style::Color { geometry, material } => Some(DrawData::new(geometry, material.key())),
            Style::InnerShadow { geometry, material } => {
                let key = material.key();
                key.is_complete().then(|| DrawData::new(geometry, key))
            }
        }
    }
}

impl Drop for FillCenterNode {
    fn drop(&mut self) {
        log::debug!("fill center node destroyed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::vertex::VertexLayout;
    use crate::raster::shadow_texture_size;
    use crate::texture::{MemoryBackend, TextureKey};

    fn registry() -> (Rc<MemoryBackend>, ContextRegistry) {
        let backend = Rc::new(MemoryBackend::new());
        let registry = ContextRegistry::new(backend.clone());
        (backend, registry)
    }

    fn inner(size: f32) -> ShadowParams {
        ShadowParams { size, angle: 0.0, distance: 0.0, color: Rgba::BLACK }
    }

    // ── color style ───────────────────────────────────────────────────────

    #[test]
    fn octagon_positions() {
        let (_b, registry) = registry();
        let mut node = FillCenterNode::new(&registry, NodeParams::default());
        node.update(Size::new(100.0, 50.0), ShapeType::Squircle, 10.0, Rgba::WHITE, &inner(0.0));
        let data = node.draw_data().unwrap();
        assert_eq!(data.layout, VertexLayout::Color);
        assert_eq!(data.indices, &INDICES);
        assert_eq!(data.material.kind, MaterialKind::Color);
        assert!(!data.material.blending);

        let v: &[ColorVertex] = bytemuck::cast_slice(data.vertices);
        assert_eq!(v[0].pos, [10.0, 0.0]);
        assert_eq!(v[3].pos, [100.0, 10.0]);
        assert_eq!(v[4].pos, [0.0, 40.0]);
        assert_eq!(v[7].pos, [90.0, 50.0]);
        assert_eq!(v[2].color, Rgba::WHITE.pack_premul());
    }

    #[test]
    fn translucent_color_enables_blending() {
        let (_b, registry) = registry();
        let mut node = FillCenterNode::new(&registry, NodeParams::default());
        let red = Rgba::new(255, 0, 0, 128);
        node.update(Size::new(40.0, 40.0), ShapeType::Squircle, 4.0, red, &inner(0.0));
        assert!(node.draw_data().unwrap().material.blending);
        assert!(!node.uses_preprocess());
    }

    #[test]
    fn update_is_idempotent() {
        let (_b, registry) = registry();
        let mut node = FillCenterNode::new(&registry, NodeParams::default());
        let shadow = ShadowParams { size: 6.0, angle: 30.0, distance: 3.0, color: Rgba::BLACK };
        node.update(Size::new(90.0, 70.0), ShapeType::Circle, 12.0, Rgba::WHITE, &shadow);
        let first = node.vertex_bytes().to_vec();
        node.take_dirty();
        node.update(Size::new(90.0, 70.0), ShapeType::Circle, 12.0, Rgba::WHITE, &shadow);
        assert_eq!(node.vertex_bytes(), &first[..]);
        assert!(node.take_dirty().is_empty());
    }

    // ── inner shadow style ────────────────────────────────────────────────

    #[test]
    fn inner_shadow_switches_style_and_acquires_texture() {
        let (backend, registry) = registry();
        let mut node = FillCenterNode::new(&registry, NodeParams::default());
        node.update(Size::new(100.0, 60.0), ShapeType::Squircle, 10.0, Rgba::WHITE, &inner(5.0));
        assert!(node.has_inner_shadow());
        assert!(node.uses_preprocess());
        assert!(node.draw_data().is_none());

        node.preprocess().unwrap();
        let data = node.draw_data().unwrap();
        assert_eq!(data.layout, VertexLayout::ShadowColor);
        assert_eq!(data.material.kind, MaterialKind::InnerShadow);
        let key = TextureKey::shadow(ShapeType::Squircle, 10, 5).unwrap();
        assert_eq!(registry.cache().texture_id(key), data.material.textures[0]);
        assert_eq!(backend.live_textures(), 1);

        // Back to flat color drops the texture.
        node.update(Size::new(100.0, 60.0), ShapeType::Squircle, 10.0, Rgba::WHITE, &inner(0.0));
        assert!(!node.has_inner_shadow());
        assert_eq!(backend.live_textures(), 0);
        assert!(node.take_dirty().contains(DirtyState::MATERIAL));
    }

    #[test]
    fn inner_shadow_coordinates_follow_the_texture_layout() {
        let (_b, registry) = registry();
        let mut node = FillCenterNode::new(&registry, NodeParams::default());
        let (r, s) = (10u32, 5u32);
        let size = Size::new(100.0, 60.0);
        node.update(size, ShapeType::Squircle, r as f32, Rgba::WHITE, &inner(s as f32));
        node.preprocess().unwrap();
        let data = node.draw_data().unwrap();
        let v: &[ShadowColorVertex] = bytemuck::cast_slice(data.vertices);

        // v2 sits on the left edge, one radius down: texel (origin + s, origin + s + r).
        let side = shadow_texture_size(r, s) as f32;
        let origin = side - (2 * s + r) as f32 - 1.0;
        let expected = [(origin + s as f32) / side, (origin + (s + r) as f32) / side];
        assert!((v[2].shadow[0] - expected[0]).abs() < 1e-6);
        assert!((v[2].shadow[1] - expected[1]).abs() < 1e-6);

        let mid = [(origin + s as f32 + 50.0) / side, (origin + s as f32 + 30.0) / side];
        assert!((v[5].mid_shadow[0] - mid[0]).abs() < 1e-6);
        assert!((v[5].mid_shadow[1] - mid[1]).abs() < 1e-6);
        assert_eq!(v[0].shadow_color, Rgba::BLACK.pack_premul());
    }

    #[test]
    fn offset_shifts_shadow_coordinates() {
        let (_b, registry) = registry();
        let mut a = FillCenterNode::new(&registry, NodeParams::default());
        let mut b = FillCenterNode::new(&registry, NodeParams::default());
        let size = Size::new(80.0, 80.0);
        a.update(size, ShapeType::Circle, 8.0, Rgba::WHITE, &inner(4.0));
        let shifted = ShadowParams { distance: 2.0, ..inner(4.0) };
        b.update(size, ShapeType::Circle, 8.0, Rgba::WHITE, &shifted);

        let va: &[ShadowColorVertex] = bytemuck::cast_slice(a.vertex_bytes());
        let vb: &[ShadowColorVertex] = bytemuck::cast_slice(b.vertex_bytes());
        assert!(vb[0].shadow[0] > va[0].shadow[0]);
        assert_eq!(vb[0].shadow[1], va[0].shadow[1]);
        assert_eq!(vb[0].mid_shadow, va[0].mid_shadow);
    }

    #[test]
    fn shadow_clamped_to_zero_stays_flat() {
        let (_b, registry) = registry();
        let mut node = FillCenterNode::new(&registry, NodeParams::default());
        node.update(Size::new(1.0, 1.0), ShapeType::Squircle, 0.0, Rgba::WHITE, &inner(8.0));
        assert!(!node.has_inner_shadow());
    }
}
