use std::fmt;

use crate::error::ShapeError;
use crate::raster::{mask_texture_size, shadow_texture_size, ShapeType, TextureFormat};
use crate::util::MAX_KEY_VALUE;

/// What a texture contains.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum TextureKind {
    Mask,
    Shadow,
}

impl TextureKind {
    #[inline]
    pub const fn format(self) -> TextureFormat {
        match self {
            TextureKind::Mask => TextureFormat::R8,
            TextureKind::Shadow => TextureFormat::Rg8,
        }
    }
}

const KIND_BIT: u32 = 1 << 31;
const SHAPE_SHIFT: u32 = 30;
const RADIUS_SHIFT: u32 = 12;
const VALUE_MASK: u32 = 0xfff;

/// Packed cache key.
///
/// ```text
///  31  30  29..24  23........12  11.........0
/// [K] [S]  unused     radius     shadow size
/// ```
///
/// `K` is 1 for shadow textures, so mask and shadow keys never collide.
/// Mask keys always carry a zero shadow field.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureKey(u32);

impl TextureKey {
    fn check(what: &'static str, value: u32) -> Result<(), ShapeError> {
        if value > MAX_KEY_VALUE {
            return Err(ShapeError::invalid(what, value, MAX_KEY_VALUE));
        }
        Ok(())
    }

    pub fn mask(shape: ShapeType, radius: u32) -> Result<Self, ShapeError> {
        Self::check("radius", radius)?;
        Ok(Self(shape.bit() << SHAPE_SHIFT | radius << RADIUS_SHIFT))
    }

    pub fn shadow(shape: ShapeType, radius: u32, shadow: u32) -> Result<Self, ShapeError> {
        Self::check("radius", radius)?;
        Self::check("shadow", shadow)?;
        Ok(Self(KIND_BIT | shape.bit() << SHAPE_SHIFT | radius << RADIUS_SHIFT | shadow))
    }

    #[inline]
    pub const fn bits(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn kind(self) -> TextureKind {
        if self.0 & KIND_BIT != 0 { TextureKind::Shadow } else { TextureKind::Mask }
    }

    #[inline]
    pub const fn shape(self) -> ShapeType {
        ShapeType::from_bit(self.0 >> SHAPE_SHIFT)
    }

    #[inline]
    pub const fn radius(self) -> u32 {
        (self.0 >> RADIUS_SHIFT) & VALUE_MASK
    }

    #[inline]
    pub const fn shadow_size(self) -> u32 {
        self.0 & VALUE_MASK
    }

    #[inline]
    pub const fn format(self) -> TextureFormat {
        self.kind().format()
    }

    /// Side length of the texture this key rasterizes to.
    pub fn texture_size(self) -> u32 {
        match self.kind() {
            TextureKind::Mask => mask_texture_size(self.radius()),
            TextureKind::Shadow => shadow_texture_size(self.radius(), self.shadow_size()),
        }
    }
}

impl fmt::Debug for TextureKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind() {
            TextureKind::Mask => write!(f, "Mask({:?}, r={})", self.shape(), self.radius()),
            TextureKind::Shadow => write!(
                f,
                "Shadow({:?}, r={}, s={})",
                self.shape(),
                self.radius(),
                self.shadow_size()
            ),
        }
    }
}
