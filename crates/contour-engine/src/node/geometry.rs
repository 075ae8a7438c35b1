use super::vertex::{Vertex, VertexLayout};
use crate::coords::Size;
use crate::util::{round_up, MAX_KEY_VALUE, TEXTURE_ROUNDING};

/// Fixed-topology triangle strip: `C` vertices, static indices.
#[derive(Debug, Clone)]
pub struct Geometry<V: Vertex, const C: usize> {
    vertices: [V; C],
    indices: &'static [u16],
    dirty: bool,
}

impl<V: Vertex, const C: usize> Geometry<V, C> {
    pub fn new(indices: &'static [u16]) -> Self {
        debug_assert!(indices.iter().all(|&i| (i as usize) < C));
        Self { vertices: [V::default(); C], indices, dirty: true }
    }

    #[inline]
    pub fn vertices(&self) -> &[V; C] {
        &self.vertices
    }

    /// Replaces every vertex and marks the geometry for upload.
    pub fn set_vertices(&mut self, vertices: [V; C]) {
        self.vertices = vertices;
        self.dirty = true;
    }

    #[inline]
    pub fn indices(&self) -> &'static [u16] {
        self.indices
    }

    #[inline]
    pub fn layout(&self) -> VertexLayout {
        V::LAYOUT
    }

    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn clear_dirty(&mut self) {
        self.dirty = false;
    }
}

/// Item dimensions as every node uses them: whole pixels, and the largest
/// radius (or shadow) that still fits both axes.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Extent {
    pub w: f32,
    pub h: f32,
    pub max: f32,
}

impl Extent {
    pub fn of(size: Size) -> Self {
        let floored = size.floored();
        Self { w: floored.width, h: floored.height, max: floored.max_corner_size() }
    }

    /// `floor(value)` limited to [`max`](Self::max).
    #[inline]
    pub fn clamp(&self, value: f32) -> f32 {
        value.max(0.0).floor().min(self.max)
    }
}

/// `logical` limited to the largest whole value whose device-pixel size fits
/// a texture key.
///
/// Nodes derive geometry and texture coordinates from the limited value so
/// that they never reach past the texture the key describes.
pub fn key_limited(logical: f32, device_pixel_ratio: f32) -> f32 {
    let max = (MAX_KEY_VALUE as f32 / device_pixel_ratio).floor();
    if logical > max {
        log::debug!(
            "{logical} px exceeds the texture key range at ratio {device_pixel_ratio}, using {max}"
        );
        max
    } else {
        logical
    }
}

/// Device-pixel value used in texture keys.
#[inline]
pub fn device_value(logical: f32, device_pixel_ratio: f32) -> u32 {
    ((logical * device_pixel_ratio).max(0.0) as u32).min(MAX_KEY_VALUE)
}

/// `size` rounded up to the texture rounding, as the rasterizer allocates it.
#[inline]
pub fn rounded_size(size: f32) -> f32 {
    round_up(size as u32, TEXTURE_ROUNDING) as f32
}

/// Mapping from logical content coordinates to the texture coordinates of a
/// shadow texture of content side `content` (logical pixels, border
/// excluded).
///
/// Content starts one texel in from the near offset, see the shadow
/// rasterizer.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ShadowMapping {
    pub offset: f32,
    pub factor: f32,
}

impl ShadowMapping {
    pub fn new(content: f32, device_pixel_ratio: f32) -> Self {
        let size = (content + 2.0) * device_pixel_ratio;
        let rounded = rounded_size(size);
        let offset = (rounded - size) / rounded;
        let factor = (1.0 - offset) * device_pixel_ratio / size;
        Self { offset, factor }
    }

    /// Texture coordinate of logical content position `u`.
    #[inline]
    pub fn coord(&self, u: f32) -> f32 {
        (1.0 + u) * self.factor + self.offset
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::vertex::ColorVertex;
    use crate::raster::shadow_texture_size;

    #[test]
    fn extent_floors_and_clamps() {
        let e = Extent::of(Size::new(101.7, 40.2));
        assert_eq!((e.w, e.h, e.max), (101.0, 40.0, 20.0));
        assert_eq!(e.clamp(12.9), 12.0);
        assert_eq!(e.clamp(35.0), 20.0);
        assert_eq!(e.clamp(-3.0), 0.0);
    }

    #[test]
    fn device_values_saturate() {
        assert_eq!(device_value(10.5, 2.0), 21);
        assert_eq!(device_value(3000.0, 2.0), MAX_KEY_VALUE);
        assert_eq!(device_value(-1.0, 1.0), 0);
    }

    #[test]
    fn key_limit_keeps_device_values_in_range() {
        assert_eq!(key_limited(100.0, 2.0), 100.0);
        assert_eq!(key_limited(3000.0, 2.0), 2047.0);
        assert_eq!(key_limited(5000.0, 1.0), 4095.0);
        assert_eq!(key_limited(4000.0, 3.0), 1365.0);
        for dpr in [1.0, 1.5, 2.0, 3.0] {
            let limited = key_limited(10_000.0, dpr);
            assert!(limited * dpr <= MAX_KEY_VALUE as f32, "ratio {dpr}");
            assert_eq!(device_value(limited, dpr) as f32, (limited * dpr).floor());
        }
    }

    #[test]
    fn shadow_mapping_hits_content_texels() {
        // dpr 1: content position u maps to texel (origin + u) / side.
        let (r, s) = (12u32, 6u32);
        let side = shadow_texture_size(r, s) as f32;
        let content = (2 * s + r) as f32;
        let origin = side - content - 1.0;
        let m = ShadowMapping::new(content, 1.0);
        for u in [0.0, 3.0, content] {
            let expected = (origin + u) / side;
            assert!((m.coord(u) - expected).abs() < 1e-6, "u = {u}");
        }
    }

    #[test]
    fn geometry_starts_dirty_and_exposes_bytes() {
        static INDICES: [u16; 3] = [0, 1, 2];
        let mut g: Geometry<ColorVertex, 3> = Geometry::new(&INDICES);
        assert!(g.is_dirty());
        g.clear_dirty();
        g.set_vertices([ColorVertex::default(); 3]);
        assert!(g.is_dirty());
        assert_eq!(g.vertex_bytes().len(), 36);
        assert_eq!(g.layout(), VertexLayout::Color);
    }
}
