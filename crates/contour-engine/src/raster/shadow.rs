use super::blur::{shadow_sigma, BlurBuffer};
use super::image::{TextureFormat, TextureImage, INNER_CHANNEL, OUTER_CHANNEL};
use super::shape::{render_shape, ShapeType};
use crate::error::ShapeError;
use crate::util::{round_up, MAX_KEY_VALUE, TEXTURE_ROUNDING};

const BORDER: u32 = 1;

/// Side of the blurred content area: the shape quadrant plus a shadow band
/// on each side.
#[inline]
pub fn shadow_content_size(radius: u32, shadow: u32) -> u32 {
    2 * shadow + radius
}

/// Side length of the shadow texture for `(radius, shadow)`.
#[inline]
pub fn shadow_texture_size(radius: u32, shadow: u32) -> u32 {
    round_up(shadow_content_size(radius, shadow) + 2 * BORDER, TEXTURE_ROUNDING)
}

#[inline]
fn quantize(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0 + 0.5) as u8
}

/// Shape coverage in the blur working buffer.
///
/// ```text
/// ┌───────────────────┐
/// │ 0 0 0 0 0 0 0 0 0 │  shadow band
/// │ 0 0 ┌─────────┬───┤
/// │ 0 0 │ quadrant│ 1 │
/// │ 0 0 ├─────────┘ 1 │
/// │ 0 0 │ 1 1 1 1 1 1 │
/// └─────┴─────────────┘
/// ```
fn shape_buffer(shape: ShapeType, radius: u32, shadow: u32) -> Result<BlurBuffer, ShapeError> {
    let s = shadow as usize;
    let r = radius as usize;
    let w = shadow_content_size(radius, shadow) as usize;
    let mut buf = BlurBuffer::new(w);

    for y in s..s + r {
        buf.row_mut(y)[s + r..].fill(1.0);
    }
    for y in s + r..w {
        buf.row_mut(y)[s..].fill(1.0);
    }

    if r > 0 {
        let mut coverage = vec![0u8; r * r];
        render_shape(&mut coverage, shape, radius, r)?;
        for (i, src) in coverage.chunks_exact(r).enumerate() {
            let row = buf.row_mut(s + i);
            for (d, &c) in row[s..s + r].iter_mut().zip(src) {
                *d = c as f32 / 255.0;
            }
        }
    }
    Ok(buf)
}

/// Renders the dual-channel shadow texture for `(shape, radius, shadow)`.
///
/// Channel [`OUTER_CHANNEL`] holds the blurred shape with the shape itself
/// knocked out (drop shadows); [`INNER_CHANNEL`] holds the shape with the
/// blur knocked out (inner shadows). With `shadow == 0` nothing is blurred:
/// the outer channel is empty and the inner one is the plain shape.
///
/// The content sits against the far corner of the texture behind a one texel
/// border: the near border is 0, the far border repeats the last content
/// texel, and the far corner texel is full on both channels.
pub fn render_shadow_texture(
    shape: ShapeType,
    radius: u32,
    shadow: u32,
) -> Result<TextureImage, ShapeError> {
    if radius > MAX_KEY_VALUE {
        return Err(ShapeError::invalid("radius", radius, MAX_KEY_VALUE));
    }
    if shadow > MAX_KEY_VALUE {
        return Err(ShapeError::invalid("shadow", shadow, MAX_KEY_VALUE));
    }

    let size = shadow_texture_size(radius, shadow);
    let w = shadow_content_size(radius, shadow) as usize;
    let side = size as usize;
    let origin = side - (w + 2 * BORDER as usize) + BORDER as usize;
    let mut image = TextureImage::zeroed(TextureFormat::Rg8, size);
    if w == 0 {
        image.row_mut(side - 1)[2 * (side - 1)..].fill(0xff);
        return Ok(image);
    }

    let shape_buf = shape_buffer(shape, radius, shadow)?;
    let blurred = (shadow > 0).then(|| shape_buf.blur(shadow_sigma(shadow)));

    for y in 0..w {
        let shape_row = shape_buf.row(y);
        let blur_row = blurred.as_ref().map(|b| b.row(y));
        let row = image.row_mut(origin + y);
        for x in 0..w {
            let coverage = shape_row[x];
            let (outer, inner) = match blur_row {
                Some(blur) => (blur[x] * (1.0 - coverage), coverage * (1.0 - blur[x])),
                None => (0.0, coverage),
            };
            let t = 2 * (origin + x);
            row[t + OUTER_CHANNEL] = quantize(outer);
            row[t + INNER_CHANNEL] = quantize(inner);
        }
        let last = 2 * (origin + w - 1);
        let far = 2 * (side - 1);
        row.copy_within(last..last + 2, far);
    }

    let row_bytes = image.row_bytes();
    let data = image.data_mut();
    let far_row = (side - 1) * row_bytes;
    let prev_row = (side - 2) * row_bytes;
    let start = 2 * origin;
    data.copy_within(prev_row + start..prev_row + 2 * (side - 1), far_row + start);
    data[far_row + 2 * (side - 1)..far_row + 2 * side].fill(0xff);

    Ok(image)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn content_origin(radius: u32, shadow: u32) -> u32 {
        shadow_texture_size(radius, shadow) - shadow_content_size(radius, shadow) - 1
    }

    // ── sizing ────────────────────────────────────────────────────────────

    #[test]
    fn size_covers_content_and_borders() {
        assert_eq!(shadow_texture_size(10, 5), 32);
        assert_eq!(shadow_texture_size(10, 10), 64);
        assert_eq!(shadow_texture_size(0, 15), 32);
        assert_eq!(shadow_texture_size(0, 0), 32);
    }

    #[test]
    fn rejects_out_of_range() {
        assert!(matches!(
            render_shadow_texture(ShapeType::Circle, 4096, 1),
            Err(ShapeError::InvalidParameter { what: "radius", .. })
        ));
        assert!(matches!(
            render_shadow_texture(ShapeType::Circle, 8, 5000),
            Err(ShapeError::InvalidParameter { what: "shadow", value: 5000, .. })
        ));
    }

    // ── borders ───────────────────────────────────────────────────────────

    #[test]
    fn near_borders_are_zero_and_far_corner_full() {
        let (r, s) = (12u32, 6u32);
        let img = render_shadow_texture(ShapeType::Squircle, r, s).unwrap();
        let side = img.size();
        let origin = content_origin(r, s);
        for y in 0..side {
            for x in 0..side {
                if x < origin || y < origin {
                    assert_eq!(img.texel(x, y), 0, "near texel ({x},{y})");
                }
            }
        }
        assert_eq!(img.texel(side - 1, side - 1), 0xffff);
    }

    #[test]
    fn far_borders_replicate_content() {
        let (r, s) = (20u32, 8u32);
        let img = render_shadow_texture(ShapeType::Circle, r, s).unwrap();
        let side = img.size();
        let origin = content_origin(r, s);
        for i in origin..side - 1 {
            assert_eq!(img.texel(side - 1, i), img.texel(side - 2, i), "far column at {i}");
            assert_eq!(img.texel(i, side - 1), img.texel(i, side - 2), "far row at {i}");
        }
    }

    // ── knockout ──────────────────────────────────────────────────────────

    #[test]
    fn no_shadow_is_plain_shape() {
        let r = 16u32;
        let img = render_shadow_texture(ShapeType::Circle, r, 0).unwrap();
        let side = img.size();
        let origin = content_origin(r, 0);
        assert_eq!(origin, side - r - 1);
        for y in origin..side - 1 {
            for x in origin..side - 1 {
                assert_eq!(img.channel_at(x, y, OUTER_CHANNEL), 0);
            }
        }
        assert!(img.channel_at(side - 2, side - 2, INNER_CHANNEL) >= 250);
        assert_eq!(img.channel_at(origin, origin, INNER_CHANNEL), 0);
    }

    #[test]
    fn channels_knock_each_other_out() {
        let (r, s) = (24u32, 10u32);
        let img = render_shadow_texture(ShapeType::Squircle, r, s).unwrap();
        let side = img.size();
        // Deep inside the shape: no outer shadow, inner nearly gone too.
        let deep = side - 2;
        assert!(img.channel_at(deep, deep, OUTER_CHANNEL) <= 2);
        // In the shadow band next to the shape edge: outer shadow present,
        // inner channel empty.
        let origin = content_origin(r, s);
        let band_y = origin + s - 1;
        let band_x = deep;
        assert!(img.channel_at(band_x, band_y, OUTER_CHANNEL) > 0);
        assert_eq!(img.channel_at(band_x, band_y, INNER_CHANNEL), 0);
        // Just inside the shape edge the inner shadow shows.
        assert!(img.channel_at(band_x, origin + s + 1, INNER_CHANNEL) > 0);
    }

    #[test]
    fn outer_shadow_fades_toward_the_near_edge() {
        let (r, s) = (8u32, 12u32);
        let img = render_shadow_texture(ShapeType::Circle, r, s).unwrap();
        let side = img.size();
        let origin = content_origin(r, s);
        let x = side - 2;
        let mut prev = 0u8;
        for y in origin..origin + s {
            let v = img.channel_at(x, y, OUTER_CHANNEL);
            assert!(v >= prev, "outer shadow not increasing at row {y}");
            prev = v;
        }
    }

    // ── symmetry ──────────────────────────────────────────────────────────

    /// Largest per-texel difference between `img` and its transpose.
    fn transpose_delta(img: &TextureImage) -> u32 {
        let t = img.transposed();
        img.data()
            .iter()
            .zip(t.data())
            .map(|(a, b)| (*a as i32 - *b as i32).unsigned_abs())
            .max()
            .unwrap_or(0)
    }

    #[test]
    fn circle_shadow_is_transpose_symmetric() {
        for (r, s) in [(30u32, 9u32), (8, 20), (64, 3)] {
            let img = render_shadow_texture(ShapeType::Circle, r, s).unwrap();
            let d = transpose_delta(&img);
            assert!(d <= 1, "circle r={r} s={s}: transpose delta {d}");
        }
    }

    #[test]
    fn squircle_shadow_is_transpose_symmetric() {
        for (r, s) in [(30u32, 9u32), (8, 20), (64, 3)] {
            let img = render_shadow_texture(ShapeType::Squircle, r, s).unwrap();
            let d = transpose_delta(&img);
            assert!(d <= 1, "squircle r={r} s={s}: transpose delta {d}");
        }
    }

    #[test]
    fn unblurred_shadow_is_exactly_symmetric() {
        for shape in [ShapeType::Squircle, ShapeType::Circle] {
            let img = render_shadow_texture(shape, 21, 0).unwrap();
            assert_eq!(transpose_delta(&img), 0, "{shape:?}");
        }
    }
}
