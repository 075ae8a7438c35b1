use core::ops::{Add, Sub};

/// 2D vector in logical pixels.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    #[inline]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    #[inline]
    pub const fn zero() -> Self {
        Self { x: 0.0, y: 0.0 }
    }

    /// Shadow offset for an angle in degrees (counter-clockwise, y down) and
    /// a distance, rounded to whole pixels.
    ///
    /// Angle 0 points right, 90 points up.
    #[inline]
    pub fn shadow_offset(angle_degrees: f32, distance: f32) -> Self {
        let (s, c) = (angle_degrees * -(core::f32::consts::PI / 180.0)).sin_cos();
        Self::new((c * distance).round(), (s * distance).round())
    }
}

impl Add for Vec2 {
    type Output = Vec2;
    #[inline]
    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Vec2 {
    type Output = Vec2;
    #[inline]
    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}
