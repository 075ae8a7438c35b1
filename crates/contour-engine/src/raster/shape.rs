use tiny_skia::{FillRule, Paint, Path, PathBuilder, Pixmap, Rect, Transform};

use crate::error::ShapeError;
use crate::util::MAX_KEY_VALUE;

/// Corner style of a shape.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub enum ShapeType {
    #[default]
    Squircle = 0,
    Circle = 1,
}

impl ShapeType {
    #[inline]
    pub const fn bit(self) -> u32 {
        self as u32
    }

    #[inline]
    pub const fn from_bit(bit: u32) -> Self {
        if bit & 1 == 0 { ShapeType::Squircle } else { ShapeType::Circle }
    }

    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "squircle" => Some(ShapeType::Squircle),
            "circle" => Some(ShapeType::Circle),
            _ => None,
        }
    }
}

/// Side of the design space the squircle outline is drawn in.
const SQUIRCLE_DESIGN_SIZE: f32 = 36.0;

/// Top-left quadrant of the squircle, filled toward the bottom-right.
fn squircle_path() -> Option<Path> {
    let mut pb = PathBuilder::new();
    pb.move_to(35.999_805_5, 36.000_343_3);
    pb.line_to(0.0, 36.000_344);
    pb.cubic_to(0.0, 3.372_032, 3.345_315, 0.0, 35.999_805, 0.0);
    pb.close();
    pb.finish()
}

/// Ellipse whose top-left quadrant covers the `radius × radius` buffer.
///
/// The half-pixel offset gives the best looking antialiasing.
fn circle_path(radius: f32) -> Option<Path> {
    let rect = Rect::from_xywh(-0.5, -0.5, radius * 2.0 + 0.5, radius * 2.0 + 0.5)?;
    PathBuilder::from_oval(rect)
}

/// Rasterizes the antialiased corner quadrant of `shape` into `buffer`.
///
/// `buffer` holds `radius` rows of `stride` bytes; each of the first `radius`
/// bytes of a row receives 8-bit coverage (0 outside, 255 inside). The
/// interior of the shape lies toward the bottom-right corner.
pub fn render_shape(
    buffer: &mut [u8],
    shape: ShapeType,
    radius: u32,
    stride: usize,
) -> Result<(), ShapeError> {
    assert!(radius > 0, "render_shape needs a radius > 0");
    assert!(stride >= radius as usize, "stride {stride} shorter than radius {radius}");
    assert!(
        buffer.len() >= (radius as usize - 1) * stride + radius as usize,
        "coverage buffer too small for radius {radius}"
    );

    let fail = || ShapeError::invalid("radius", radius, MAX_KEY_VALUE);
    let mut pixmap = Pixmap::new(radius, radius).ok_or_else(fail)?;

    let (path, transform) = match shape {
        ShapeType::Squircle => {
            let scale = radius as f32 / SQUIRCLE_DESIGN_SIZE;
            (squircle_path(), Transform::from_scale(scale, scale))
        }
        ShapeType::Circle => (circle_path(radius as f32), Transform::identity()),
    };
    let path = path.ok_or_else(fail)?;

    let mut paint = Paint::default();
    paint.set_color_rgba8(255, 255, 255, 255);
    paint.anti_alias = true;
    pixmap.fill_path(&path, &paint, FillRule::Winding, transform, None);

    let r = radius as usize;
    for (y, src) in pixmap.data().chunks_exact(r * 4).enumerate() {
        let dst = &mut buffer[y * stride..y * stride + r];
        for (d, px) in dst.iter_mut().zip(src.chunks_exact(4)) {
            *d = px[3];
        }
    }
    fold_diagonal(buffer, r, stride);
    Ok(())
}

/// Averages each texel with its mirror across the main diagonal.
///
/// Both outlines are symmetric about the diagonal but supersampled
/// antialiasing is not, and shadows must not lean toward one axis.
fn fold_diagonal(buffer: &mut [u8], size: usize, stride: usize) {
    for y in 0..size {
        for x in y + 1..size {
            let (a, b) = (buffer[y * stride + x], buffer[x * stride + y]);
            let mean = ((a as u16 + b as u16 + 1) >> 1) as u8;
            buffer[y * stride + x] = mean;
            buffer[x * stride + y] = mean;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coverage(shape: ShapeType, radius: u32) -> Vec<u8> {
        let mut buf = vec![0u8; (radius * radius) as usize];
        render_shape(&mut buf, shape, radius, radius as usize).unwrap();
        buf
    }

    // ── orientation ───────────────────────────────────────────────────────

    #[test]
    fn interior_is_bottom_right() {
        for shape in [ShapeType::Squircle, ShapeType::Circle] {
            let r = 24u32;
            let buf = coverage(shape, r);
            assert_eq!(buf[0], 0, "{shape:?}: top-left should be outside");
            let inside = buf[(r * r - 1) as usize];
            assert!(inside >= 250, "{shape:?}: bottom-right should be inside, got {inside}");
        }
    }

    #[test]
    fn coverage_grows_toward_the_interior() {
        let r = 32u32;
        let buf = coverage(ShapeType::Circle, r);
        let diag: Vec<u8> = (0..r).map(|i| buf[(i * r + i) as usize]).collect();
        assert!(diag.windows(2).all(|w| w[0] <= w[1]), "diagonal not monotonic: {diag:?}");
    }

    #[test]
    fn quadrants_are_transpose_symmetric() {
        for shape in [ShapeType::Squircle, ShapeType::Circle] {
            for r in [1u32, 7, 40] {
                let buf = coverage(shape, r);
                for y in 0..r {
                    for x in 0..r {
                        assert_eq!(
                            buf[(y * r + x) as usize],
                            buf[(x * r + y) as usize],
                            "{shape:?} r={r} at ({x},{y})"
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn fold_diagonal_rounds_up_and_skips_padding() {
        // 2x2 quadrant in rows of 3.
        let mut buf = [0, 10, 0xaa, 3, 50, 0xaa];
        fold_diagonal(&mut buf, 2, 3);
        assert_eq!(buf, [0, 7, 0xaa, 7, 50, 0xaa]);
    }

    // ── stride ────────────────────────────────────────────────────────────

    #[test]
    fn honours_stride_padding() {
        let r = 5u32;
        let stride = 8usize;
        let mut buf = vec![0xaau8; stride * r as usize];
        render_shape(&mut buf, ShapeType::Squircle, r, stride).unwrap();
        for y in 0..r as usize {
            assert_eq!(&buf[y * stride + 5..y * stride + 8], &[0xaa, 0xaa, 0xaa]);
        }
    }

    #[test]
    #[should_panic]
    fn zero_radius_is_rejected() {
        let mut buf = [0u8; 4];
        let _ = render_shape(&mut buf, ShapeType::Circle, 0, 4);
    }

    #[test]
    fn parse_names() {
        assert_eq!(ShapeType::parse("circle"), Some(ShapeType::Circle));
        assert_eq!(ShapeType::parse("squircle"), Some(ShapeType::Squircle));
        assert_eq!(ShapeType::parse("blob"), None);
        assert_eq!(ShapeType::from_bit(ShapeType::Circle.bit()), ShapeType::Circle);
    }
}
