/// Item size in logical pixels.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    #[inline]
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// `true` when either side is zero, negative or NaN.
    #[inline]
    pub fn is_empty(self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }

    /// Both sides rounded down to whole pixels.
    ///
    /// Corner textures have no sub-pixel support, so geometry is built on a
    /// whole-pixel grid.
    #[inline]
    pub fn floored(self) -> Self {
        Self::new(self.width.floor(), self.height.floor())
    }

    /// Largest corner radius (or shadow size) that fits: half the shorter
    /// side, rounded down.
    #[inline]
    pub fn max_corner_size(self) -> f32 {
        (self.width.min(self.height) * 0.5).floor().max(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_sizes() {
        assert!(Size::new(0.0, 10.0).is_empty());
        assert!(Size::new(10.0, -1.0).is_empty());
        assert!(Size::new(f32::NAN, 10.0).is_empty());
        assert!(!Size::new(0.5, 0.5).is_empty());
    }

    #[test]
    fn max_corner_size_uses_shorter_side() {
        assert_eq!(Size::new(100.0, 41.0).max_corner_size(), 20.0);
        assert_eq!(Size::new(1.0, 1.0).max_corner_size(), 0.0);
    }

    #[test]
    fn floored_drops_fractions() {
        assert_eq!(Size::new(10.9, 3.2).floored(), Size::new(10.0, 3.0));
    }
}
