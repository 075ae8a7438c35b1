use super::Color;

/// Straight-alpha 8-bit RGBA color, as set on item properties.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const TRANSPARENT: Rgba = Rgba::new(0, 0, 0, 0);
    pub const BLACK: Rgba = Rgba::new(0, 0, 0, 255);
    pub const WHITE: Rgba = Rgba::new(255, 255, 255, 255);

    #[inline]
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    #[inline]
    pub const fn is_visible(self) -> bool {
        self.a > 0
    }

    #[inline]
    pub const fn is_opaque(self) -> bool {
        self.a == 255
    }

    /// Packs into premultiplied ABGR32 (`a << 24 | b << 16 | g << 8 | r`).
    ///
    /// Each color channel is premultiplied as `(c * a + 0xff) >> 8`, which
    /// keeps 255 at full alpha and 0 at zero alpha.
    #[inline]
    pub const fn pack_premul(self) -> PackedColor {
        let a = self.a as u32;
        let r = ((self.r as u32 * a + 0xff) >> 8) & 0xff;
        let g = ((self.g as u32 * a + 0xff) >> 8) & 0xff;
        let b = ((self.b as u32 * a + 0xff) >> 8) & 0xff;
        PackedColor((a << 24) | (b << 16) | (g << 8) | r)
    }
}

/// Premultiplied ABGR32 color, the per-vertex color format of every node.
///
/// Byte order in memory (little endian) is `r, g, b, a`, so the vertex
/// attribute reads it as `Unorm8x4`.
#[repr(transparent)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, bytemuck::Pod, bytemuck::Zeroable)]
pub struct PackedColor(pub u32);

impl PackedColor {
    #[inline]
    pub const fn alpha(self) -> u8 {
        (self.0 >> 24) as u8
    }

    /// Unpacks to `f32` premultiplied channels.
    #[inline]
    pub fn unpack(self) -> Color {
        let c = self.0;
        Color::from_premul(
            (c & 0xff) as f32 / 255.0,
            ((c >> 8) & 0xff) as f32 / 255.0,
            ((c >> 16) & 0xff) as f32 / 255.0,
            ((c >> 24) & 0xff) as f32 / 255.0,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── packing ───────────────────────────────────────────────────────────

    #[test]
    fn opaque_colors_pack_unchanged() {
        let p = Rgba::new(0x12, 0x34, 0x56, 0xff).pack_premul();
        assert_eq!(p.0, 0xff56_3412);
    }

    #[test]
    fn fully_transparent_packs_to_zero() {
        assert_eq!(Rgba::new(255, 128, 7, 0).pack_premul().0, 0);
    }

    #[test]
    fn packed_alpha_is_straight_alpha() {
        assert_eq!(Rgba::new(10, 20, 30, 77).pack_premul().alpha(), 77);
    }

    // ── round trip ────────────────────────────────────────────────────────

    #[test]
    fn unpack_recovers_premultiplied_channels() {
        let tolerance = 1.0 / 255.0 + 1e-6;
        for &(r, g, b, a) in &[
            (255u8, 255u8, 255u8, 255u8),
            (255, 0, 0, 128),
            (12, 200, 99, 64),
            (1, 2, 3, 1),
            (250, 249, 248, 254),
        ] {
            let expected = Color::from_straight(
                r as f32 / 255.0,
                g as f32 / 255.0,
                b as f32 / 255.0,
                a as f32 / 255.0,
            );
            let got = Rgba::new(r, g, b, a).pack_premul().unpack();
            let delta = got.max_channel_delta(expected);
            assert!(delta <= tolerance, "({r},{g},{b},{a}): delta {delta}");
            got.debug_assert_premul();
        }
    }
}
