use super::geometry::{key_limited, Extent, Geometry};
use super::material::ColorMaterial;
use super::state::{DirtyState, NodeParams, NodeState};
use super::vertex::ColorVertex;
use super::{DrawData, NodeKind, ShapeNode};
use crate::coords::Size;
use crate::error::ShapeError;
use crate::paint::Rgba;

static INDICES: [u16; 22] =
    [0, 2, 1, 3, 3, 4, 4, 10, 6, 8, 8, 7, 7, 9, 5, 11, 11, 12, 12, 14, 13, 15];

/// Frame thickness and radii, whole pixels.
#[derive(Debug, Copy, Clone, PartialEq)]
pub(crate) struct FrameMetrics {
    pub thickness: f32,
    pub radius: f32,
    pub inner_radius: f32,
}

impl FrameMetrics {
    /// The inner radius shrinks with the thickness so the frame keeps a
    /// uniform look; it reaches 0 once the frame fills the item.
    pub(crate) fn new(e: &Extent, radius: f32, thickness: f32, device_pixel_ratio: f32) -> Self {
        let thickness = e.clamp(thickness);
        let radius = key_limited(e.clamp(radius), device_pixel_ratio);
        let inner_radius = if e.max > 0.0 {
            (radius * ((e.max - thickness) / e.max)).floor()
        } else {
            0.0
        };
        Self { thickness, radius, inner_radius }
    }
}

/// The four straight bands of a frame, between its corners.
pub struct FrameEdgesNode {
    geometry: Geometry<ColorVertex, 16>,
    material: ColorMaterial,
    state: NodeState<0>,
    params: NodeParams,
    blocked: bool,
}

impl FrameEdgesNode {
    /// The device pixel ratio keeps the edges aligned with the corner
    /// textures, whose radius is limited to the texture key range.
    pub fn new(params: NodeParams) -> Self {
        log::debug!("frame edges node created");
        Self {
            geometry: Geometry::new(&INDICES),
            material: ColorMaterial::new(),
            state: NodeState::new(),
            params,
            blocked: true,
        }
    }

    pub fn update(&mut self, size: Size, radius: f32, thickness: f32, color: Rgba) {
        let e = Extent::of(size);
        let FrameMetrics { thickness: t, radius: r, inner_radius: ri } =
            FrameMetrics::new(&e, radius, thickness, self.params.device_pixel_ratio);
        let (w, h) = (e.w, e.h);
        self.blocked = t <= 0.0;

        let c = color.pack_premul();
        let v = |x: f32, y: f32| ColorVertex::new(x, y, c);
        let vertices = [
            v(r, 0.0),
            v(w - r, 0.0),
            v(t + ri, t),
            v(w - t - ri, t),
            v(0.0, r),
            v(w, r),
            v(t, t + ri),
            v(w - t, t + ri),
            v(t, h - t - ri),
            v(w - t, h - t - ri),
            v(0.0, h - r),
            v(w, h - r),
            v(t + ri, h - t),
            v(w - t - ri, h - t),
            v(r, h),
            v(w - r, h),
        ];
        if self.material.set_blending(!color.is_opaque()) {
            self.state.mark(DirtyState::MATERIAL);
        }
        if *self.geometry.vertices() != vertices {
            self.geometry.set_vertices(vertices);
            self.state.mark(DirtyState::GEOMETRY);
        }
    }

    #[inline]
    pub fn geometry(&self) -> &Geometry<ColorVertex, 16> {
        &self.geometry
    }
}

impl Default for FrameEdgesNode {
    fn default() -> Self {
        Self::new(NodeParams::default())
    }
}

impl ShapeNode for FrameEdgesNode {
    fn kind(&self) -> NodeKind {
        NodeKind::FrameEdges
    }

    fn set_visible(&mut self, visible: bool) -> bool {
        self.state.set_visible(visible)
    }

    fn is_subtree_blocked(&self) -> bool {
        self.blocked || !self.state.is_visible()
    }

    fn uses_preprocess(&self) -> bool {
        false
    }

    fn preprocess(&mut self) -> Result<(), ShapeError> {
        Ok(())
    }

    fn take_dirty(&mut self) -> DirtyState {
        self.state.take_dirty()
    }

    fn draw_data(&self) -> Option<DrawData<'_>> {
        if self.is_subtree_blocked() {
            return None;
        }
        Some(DrawData::new(&self.geometry, self.material.key()))
    }
}

impl Drop for FrameEdgesNode {
    fn drop(&mut self) {
        log::debug!("frame edges node destroyed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inner_radius_shrinks_with_thickness() {
        let e = Extent::of(Size::new(100.0, 100.0));
        let m = FrameMetrics::new(&e, 20.0, 10.0, 1.0);
        assert_eq!((m.thickness, m.radius, m.inner_radius), (10.0, 20.0, 16.0));
        let full = FrameMetrics::new(&e, 20.0, 80.0, 1.0);
        assert_eq!((full.thickness, full.inner_radius), (50.0, 0.0));
    }

    #[test]
    fn empty_extent_has_no_inner_radius() {
        let e = Extent::of(Size::new(1.0, 1.0));
        assert_eq!(FrameMetrics::new(&e, 4.0, 4.0, 1.0).inner_radius, 0.0);
    }

    #[test]
    fn radius_is_limited_to_the_key_range() {
        let e = Extent::of(Size::new(10_000.0, 10_000.0));
        let m = FrameMetrics::new(&e, 4500.0, 100.0, 2.0);
        assert_eq!(m.radius, 2047.0);
        assert_eq!(m.inner_radius, (2047.0f32 * (4900.0 / 5000.0)).floor());
    }

    #[test]
    fn band_positions() {
        let mut node = FrameEdgesNode::new(NodeParams::default());
        node.update(Size::new(100.5, 60.7), 20.0, 10.0, Rgba::WHITE);
        let v = node.geometry().vertices();
        // max 30, inner radius floor(20 * 20 / 30) = 13.
        assert_eq!(v[0].pos, [20.0, 0.0]);
        assert_eq!(v[2].pos, [23.0, 10.0]);
        assert_eq!(v[9].pos, [90.0, 37.0]);
        assert_eq!(v[15].pos, [80.0, 60.0]);
        assert_eq!(node.draw_data().unwrap().indices.len(), 22);
    }

    #[test]
    fn zero_thickness_blocks() {
        let mut node = FrameEdgesNode::new(NodeParams::default());
        node.update(Size::new(50.0, 50.0), 10.0, 0.4, Rgba::WHITE);
        assert!(node.is_subtree_blocked());
        assert!(node.draw_data().is_none());
    }

    #[test]
    fn update_is_idempotent() {
        let mut node = FrameEdgesNode::new(NodeParams::default());
        node.update(Size::new(70.0, 40.0), 8.0, 3.0, Rgba::new(0, 0, 255, 200));
        let first = node.geometry().vertex_bytes().to_vec();
        assert!(node.draw_data().unwrap().material.blending);
        node.take_dirty();
        node.update(Size::new(70.0, 40.0), 8.0, 3.0, Rgba::new(0, 0, 255, 200));
        assert_eq!(node.geometry().vertex_bytes(), &first[..]);
        assert!(node.take_dirty().is_empty());
    }
}
