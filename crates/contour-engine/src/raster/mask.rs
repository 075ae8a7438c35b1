use super::image::{TextureFormat, TextureImage};
use super::shape::{render_shape, ShapeType};
use crate::error::ShapeError;
use crate::util::{round_up, MAX_KEY_VALUE, TEXTURE_ROUNDING};

/// One texel border kept around the shape for clamped sampling.
const BORDER: u32 = 1;

/// Side length of the mask texture for `radius`.
#[inline]
pub fn mask_texture_size(radius: u32) -> u32 {
    round_up(radius + 2 * BORDER, TEXTURE_ROUNDING)
}

/// Renders the single-channel corner mask for `(shape, radius)`.
///
/// ```text
///  ┌────────────────┐
///  │ offset         │
///  │   ┌──────────┬─┤
///  │   │ radius   │f│
///  │   │ quadrant │f│
///  │   ├──────────┘f│
///  └───┴─ffffffffff─┘
/// ```
///
/// Everything up and left of the quadrant is 0; the last column and row are
/// 0xff from the quadrant's offset on, so clamped sampling past the corner
/// reads full coverage.
pub fn render_mask_texture(shape: ShapeType, radius: u32) -> Result<TextureImage, ShapeError> {
    if radius > MAX_KEY_VALUE {
        return Err(ShapeError::invalid("radius", radius, MAX_KEY_VALUE));
    }

    let size = mask_texture_size(radius);
    let mut image = TextureImage::zeroed(TextureFormat::R8, size);
    if radius == 0 {
        return Ok(image);
    }

    let r = radius as usize;
    let side = size as usize;
    let offset = side - r - BORDER as usize;

    let mut coverage = vec![0u8; r * r];
    render_shape(&mut coverage, shape, radius, r)?;

    for (i, src) in coverage.chunks_exact(r).enumerate() {
        let row = image.row_mut(offset + i);
        row[offset..offset + r].copy_from_slice(src);
        row[side - 1] = 0xff;
    }
    image.row_mut(side - 1)[offset..].fill(0xff);

    Ok(image)
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── layout ────────────────────────────────────────────────────────────

    #[test]
    fn size_rounds_radius_plus_borders() {
        assert_eq!(mask_texture_size(0), 32);
        assert_eq!(mask_texture_size(30), 32);
        assert_eq!(mask_texture_size(31), 64);
        assert_eq!(mask_texture_size(50), 64);
    }

    #[test]
    fn zero_radius_is_all_zero() {
        let img = render_mask_texture(ShapeType::Squircle, 0).unwrap();
        assert_eq!(img.size(), 32);
        assert_eq!(img.format(), TextureFormat::R8);
        assert!(img.data().iter().all(|&b| b == 0));
    }

    #[test]
    fn borders_and_offset() {
        let r = 50u32;
        let img = render_mask_texture(ShapeType::Circle, r).unwrap();
        let side = img.size();
        assert_eq!(side, 64);
        let offset = side - r - 1;
        assert_eq!(offset, 13);

        // Near area is empty.
        for y in 0..offset {
            assert!(img.row(y as usize).iter().all(|&b| b == 0), "row {y}");
        }
        for y in offset..side {
            assert!(img.row(y as usize)[..offset as usize].iter().all(|&b| b == 0));
        }
        // Far column and row are full from the offset on.
        for i in offset..side {
            assert_eq!(img.texel(side - 1, i), 0xff);
            assert_eq!(img.texel(i, side - 1), 0xff);
        }
        // Corner of the quadrant is outside, its interior end is inside.
        assert_eq!(img.texel(offset, offset), 0);
        assert!(img.texel(offset + r - 1, offset + r - 1) >= 250);
    }

    #[test]
    fn rejects_radius_out_of_key_range() {
        let err = render_mask_texture(ShapeType::Squircle, MAX_KEY_VALUE + 1).unwrap_err();
        assert!(matches!(err, ShapeError::InvalidParameter { what: "radius", .. }));
    }
}
