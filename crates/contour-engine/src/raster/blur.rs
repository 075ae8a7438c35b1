//! Gaussian blur approximated by repeated running-sum box filters.

use crate::util::cache_aligned_stride;

/// Number of box passes per axis.
pub const BLUR_PASSES: usize = 3;

/// Standard deviation of the Gaussian approximated for a shadow of `shadow`
/// pixels.
#[inline]
pub fn shadow_sigma(shadow: u32) -> f32 {
    0.23 * (2 * shadow + 1) as f32
}

/// Box radii whose successive application approximates a Gaussian of
/// standard deviation `sigma`.
pub fn box_radii(sigma: f32) -> [usize; BLUR_PASSES] {
    let n = BLUR_PASSES as f32;
    let w_ideal = (12.0 * sigma * sigma / n + 1.0).sqrt();
    let mut wl = w_ideal.floor() as i32;
    if wl % 2 == 0 {
        wl -= 1;
    }
    let wl = wl.max(1);
    let wu = wl + 2;

    let wlf = wl as f32;
    let m_ideal =
        (12.0 * sigma * sigma - n * wlf * wlf - 4.0 * n * wlf - 3.0 * n) / (-4.0 * wlf - 4.0);
    let m = m_ideal.round().clamp(0.0, n) as usize;

    let mut radii = [0; BLUR_PASSES];
    for (i, r) in radii.iter_mut().enumerate() {
        let width = if i < m { wl } else { wu };
        *r = ((width - 1) / 2) as usize;
    }
    radii
}

/// One running-sum box pass over a line, edges clamped.
fn box_line(src: &[f32], dst: &mut [f32], radius: usize) {
    debug_assert_eq!(src.len(), dst.len());
    let n = src.len();
    if n == 0 {
        return;
    }
    if radius == 0 {
        dst.copy_from_slice(src);
        return;
    }

    let last = n as isize - 1;
    let at = |i: isize| src[i.clamp(0, last) as usize];
    let r = radius as isize;
    let norm = 1.0 / (2 * radius + 1) as f32;

    let mut sum: f32 = (-r..=r).map(at).sum();
    dst[0] = sum * norm;
    for i in 1..n as isize {
        sum += at(i + r) - at(i - r - 1);
        dst[i as usize] = sum * norm;
    }
}

/// Square float working buffer with cache-line padded rows.
#[derive(Debug, Clone)]
pub struct BlurBuffer {
    size: usize,
    stride: usize,
    data: Vec<f32>,
}

impl BlurBuffer {
    pub fn new(size: usize) -> Self {
        let stride = cache_aligned_stride(size.max(1), std::mem::size_of::<f32>());
        Self { size, stride, data: vec![0.0; stride * size] }
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    #[inline]
    pub fn row(&self, y: usize) -> &[f32] {
        &self.data[y * self.stride..y * self.stride + self.size]
    }

    #[inline]
    pub fn row_mut(&mut self, y: usize) -> &mut [f32] {
        &mut self.data[y * self.stride..y * self.stride + self.size]
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> f32 {
        self.data[y * self.stride + x]
    }

    fn transpose_into(&self, out: &mut BlurBuffer) {
        debug_assert_eq!(self.size, out.size);
        for y in 0..self.size {
            for x in 0..self.size {
                out.data[x * out.stride + y] = self.data[y * self.stride + x];
            }
        }
    }

    fn blur_rows(&mut self, radii: &[usize], line: &mut [f32]) {
        for y in 0..self.size {
            let row = self.row_mut(y);
            for &r in radii {
                box_line(row, line, r);
                row.copy_from_slice(line);
            }
        }
    }

    /// Separable blur: all horizontal passes, then all vertical passes.
    ///
    /// The vertical passes run on a transposed copy so every pass walks
    /// contiguous memory.
    pub fn blur(&self, sigma: f32) -> BlurBuffer {
        let radii = box_radii(sigma);
        let mut line = vec![0.0; self.size];

        let mut horizontal = self.clone();
        horizontal.blur_rows(&radii, &mut line);

        let mut transposed = BlurBuffer::new(self.size);
        horizontal.transpose_into(&mut transposed);
        transposed.blur_rows(&radii, &mut line);

        transposed.transpose_into(&mut horizontal);
        horizontal
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── box radii ─────────────────────────────────────────────────────────

    #[test]
    fn radii_grow_with_sigma() {
        let small = box_radii(shadow_sigma(2));
        let large = box_radii(shadow_sigma(40));
        assert!(small.iter().sum::<usize>() < large.iter().sum::<usize>());
    }

    #[test]
    fn radii_are_nondecreasing() {
        for s in [1, 3, 8, 20, 100] {
            let r = box_radii(shadow_sigma(s));
            assert!(r.windows(2).all(|w| w[0] <= w[1]), "shadow {s}: {r:?}");
        }
    }

    #[test]
    fn box_sequence_variance_matches_sigma() {
        // Variance of a box of width w is (w^2 - 1) / 12.
        for s in [5u32, 12, 30] {
            let sigma = shadow_sigma(s);
            let var: f32 = box_radii(sigma)
                .iter()
                .map(|&r| {
                    let w = (2 * r + 1) as f32;
                    (w * w - 1.0) / 12.0
                })
                .sum();
            let got = var.sqrt();
            assert!((got - sigma).abs() / sigma < 0.2, "shadow {s}: sigma {sigma}, boxes {got}");
        }
    }

    // ── line pass ─────────────────────────────────────────────────────────

    #[test]
    fn box_line_preserves_constant() {
        let src = vec![0.75f32; 17];
        let mut dst = vec![0.0; 17];
        box_line(&src, &mut dst, 4);
        assert!(dst.iter().all(|&v| (v - 0.75).abs() < 1e-6));
    }

    #[test]
    fn box_line_matches_direct_sum() {
        let src: Vec<f32> = (0..23).map(|i| ((i * 7) % 5) as f32 / 4.0).collect();
        let mut dst = vec![0.0; src.len()];
        let r = 3usize;
        box_line(&src, &mut dst, r);
        for i in 0..src.len() as isize {
            let direct: f32 = (-(r as isize)..=r as isize)
                .map(|k| src[(i + k).clamp(0, src.len() as isize - 1) as usize])
                .sum::<f32>()
                / (2 * r + 1) as f32;
            assert!((dst[i as usize] - direct).abs() < 1e-5, "at {i}");
        }
    }

    #[test]
    fn box_line_radius_wider_than_line() {
        let src = [0.0f32, 1.0];
        let mut dst = [0.0f32; 2];
        box_line(&src, &mut dst, 5);
        // 6 clamped copies of src[0] and 5 of src[1] for dst[0].
        assert!((dst[0] - 5.0 / 11.0).abs() < 1e-6);
        assert!((dst[1] - 6.0 / 11.0).abs() < 1e-6);
    }

    // ── 2d ────────────────────────────────────────────────────────────────

    #[test]
    fn blur_spreads_an_impulse_symmetrically() {
        let mut buf = BlurBuffer::new(21);
        buf.row_mut(10)[10] = 1.0;
        let out = buf.blur(2.0);
        assert!(out.get(10, 10) < 1.0);
        assert!(out.get(12, 10) > 0.0);
        assert!((out.get(12, 10) - out.get(10, 12)).abs() < 1e-6);
        assert!((out.get(7, 10) - out.get(13, 10)).abs() < 1e-6);
    }

    #[test]
    fn rows_are_cache_line_padded() {
        let buf = BlurBuffer::new(20);
        assert_eq!(buf.row(0).len(), 20);
        assert_eq!((buf.stride * 4) % crate::util::CACHE_LINE_SIZE, 0);
    }
}
