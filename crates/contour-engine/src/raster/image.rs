/// Texel layout of a shape texture.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum TextureFormat {
    /// One 8-bit coverage channel (mask textures).
    R8,
    /// Two 8-bit channels (shadow textures): byte 0 is the outer shadow with
    /// the shape knocked out, byte 1 the shape with the shadow knocked out.
    Rg8,
}

impl TextureFormat {
    #[inline]
    pub const fn bytes_per_texel(self) -> usize {
        match self {
            TextureFormat::R8 => 1,
            TextureFormat::Rg8 => 2,
        }
    }
}

/// Channel index of the outer shadow in an `Rg8` texel.
pub const OUTER_CHANNEL: usize = 0;
/// Channel index of the inner (shape) coverage in an `Rg8` texel.
pub const INNER_CHANNEL: usize = 1;

/// Square CPU-side texture ready for upload.
///
/// Rows are tightly packed: the side is always a multiple of the texture
/// rounding so each row already satisfies the upload alignment.
#[derive(Debug, Clone, PartialEq)]
pub struct TextureImage {
    format: TextureFormat,
    size: u32,
    data: Vec<u8>,
}

impl TextureImage {
    pub fn zeroed(format: TextureFormat, size: u32) -> Self {
        let len = size as usize * size as usize * format.bytes_per_texel();
        Self { format, size, data: vec![0; len] }
    }

    #[inline]
    pub fn format(&self) -> TextureFormat {
        self.format
    }

    /// Side length in texels.
    #[inline]
    pub fn size(&self) -> u32 {
        self.size
    }

    #[inline]
    pub fn row_bytes(&self) -> usize {
        self.size as usize * self.format.bytes_per_texel()
    }

    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    #[inline]
    pub(crate) fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Mutable bytes of row `y`.
    #[inline]
    pub(crate) fn row_mut(&mut self, y: usize) -> &mut [u8] {
        let row = self.row_bytes();
        &mut self.data[y * row..(y + 1) * row]
    }

    #[inline]
    pub fn row(&self, y: usize) -> &[u8] {
        let row = self.row_bytes();
        &self.data[y * row..(y + 1) * row]
    }

    /// Byte of `channel` at texel `(x, y)`.
    #[inline]
    pub fn channel_at(&self, x: u32, y: u32, channel: usize) -> u8 {
        let bpp = self.format.bytes_per_texel();
        debug_assert!(channel < bpp);
        self.data[(y as usize * self.size as usize + x as usize) * bpp + channel]
    }

    /// Whole texel packed the way the GPU sees it (`byte0 | byte1 << 8`).
    #[inline]
    pub fn texel(&self, x: u32, y: u32) -> u16 {
        match self.format {
            TextureFormat::R8 => self.channel_at(x, y, 0) as u16,
            TextureFormat::Rg8 => {
                self.channel_at(x, y, 0) as u16 | (self.channel_at(x, y, 1) as u16) << 8
            }
        }
    }

    /// Extracts one channel as a tightly packed 8-bit plane.
    pub fn channel(&self, channel: usize) -> Vec<u8> {
        let bpp = self.format.bytes_per_texel();
        assert!(channel < bpp, "channel {channel} out of range for {:?}", self.format);
        self.data.iter().skip(channel).step_by(bpp).copied().collect()
    }

    /// Copy mirrored across the main diagonal (`(x, y)` becomes `(y, x)`).
    pub fn transposed(&self) -> Self {
        let bpp = self.format.bytes_per_texel();
        let n = self.size as usize;
        let mut out = Self::zeroed(self.format, self.size);
        for y in 0..n {
            for x in 0..n {
                let src = (y * n + x) * bpp;
                let dst = (x * n + y) * bpp;
                out.data[dst..dst + bpp].copy_from_slice(&self.data[src..src + bpp]);
            }
        }
        out
    }
}
