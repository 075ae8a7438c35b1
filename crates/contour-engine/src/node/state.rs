use core::ops::{BitOr, BitOrAssign};

use crate::paint::Rgba;
use crate::raster::ShapeType;

/// Change flags a node reports to the frame pass.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub struct DirtyState(u8);

impl DirtyState {
    pub const NONE: DirtyState = DirtyState(0);
    /// Vertex buffer rewritten.
    pub const GEOMETRY: DirtyState = DirtyState(1 << 0);
    /// Material key changed (texture ids or blending).
    pub const MATERIAL: DirtyState = DirtyState(1 << 1);
    /// Visibility of the subtree flipped.
    pub const SUBTREE_BLOCKED: DirtyState = DirtyState(1 << 2);

    #[inline]
    pub const fn bits(self) -> u8 {
        self.0
    }

    #[inline]
    pub const fn contains(self, other: DirtyState) -> bool {
        self.0 & other.0 == other.0
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for DirtyState {
    type Output = DirtyState;
    #[inline]
    fn bitor(self, rhs: DirtyState) -> DirtyState {
        DirtyState(self.0 | rhs.0)
    }
}

impl BitOrAssign for DirtyState {
    #[inline]
    fn bitor_assign(&mut self, rhs: DirtyState) {
        self.0 |= rhs.0;
    }
}

/// Per-node construction parameters.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct NodeParams {
    /// Logical to device pixel scale used for texture keys.
    pub device_pixel_ratio: f32,
}

impl Default for NodeParams {
    fn default() -> Self {
        Self { device_pixel_ratio: 1.0 }
    }
}

/// Shadow description shared by the drop and inner shadow.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ShadowParams {
    pub size: f32,
    /// Degrees, counter-clockwise, 0 pointing right.
    pub angle: f32,
    pub distance: f32,
    pub color: Rgba,
}

impl ShadowParams {
    pub const NONE: ShadowParams =
        ShadowParams { size: 0.0, angle: 0.0, distance: 0.0, color: Rgba::BLACK };

    /// `true` when the shadow produces any coverage.
    #[inline]
    pub fn is_visible(&self) -> bool {
        self.size > 0.0 && self.color.is_visible()
    }
}

impl Default for ShadowParams {
    fn default() -> Self {
        Self::NONE
    }
}

/// Device-pixel texture parameters of one slot.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct TextureParams {
    pub shape: ShapeType,
    pub radius: u32,
    /// 0 for mask textures.
    pub shadow: u32,
}

/// Visibility and texture reconciliation shared by every node.
///
/// `pending` is what the last `update` asked for, `current` what the slots
/// actually hold. The node is stale while they differ; `preprocess` moves
/// `pending` into `current`, or clears `current` on failure so the next
/// frame retries.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeState<const N: usize> {
    visible: bool,
    dirty: DirtyState,
    pending: [Option<TextureParams>; N],
    current: [Option<TextureParams>; N],
}

impl<const N: usize> NodeState<N> {
    pub fn new() -> Self {
        Self { visible: true, dirty: DirtyState::NONE, pending: [None; N], current: [None; N] }
    }

    #[inline]
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Returns `true` when visibility changed.
    pub fn set_visible(&mut self, visible: bool) -> bool {
        if self.visible == visible {
            return false;
        }
        self.visible = visible;
        self.dirty |= DirtyState::SUBTREE_BLOCKED;
        true
    }

    pub fn mark(&mut self, flags: DirtyState) {
        self.dirty |= flags;
    }

    /// Flags set since the last call.
    pub fn take_dirty(&mut self) -> DirtyState {
        std::mem::take(&mut self.dirty)
    }

    pub fn set_pending(&mut self, slot: usize, params: Option<TextureParams>) {
        self.pending[slot] = params;
    }

    #[inline]
    pub fn pending(&self, slot: usize) -> Option<TextureParams> {
        self.pending[slot]
    }

    #[inline]
    pub fn current(&self, slot: usize) -> Option<TextureParams> {
        self.current[slot]
    }

    /// `true` when any slot needs a texture acquisition.
    pub fn is_texture_stale(&self) -> bool {
        self.pending != self.current
    }

    pub fn set_current(&mut self, slot: usize, params: Option<TextureParams>) {
        self.current[slot] = params;
    }
}

impl<const N: usize> Default for NodeState<N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dirty_flags_accumulate_and_drain() {
        let mut s = NodeState::<1>::new();
        s.mark(DirtyState::GEOMETRY);
        s.mark(DirtyState::MATERIAL);
        let d = s.take_dirty();
        assert!(d.contains(DirtyState::GEOMETRY | DirtyState::MATERIAL));
        assert!(!d.contains(DirtyState::SUBTREE_BLOCKED));
        assert!(s.take_dirty().is_empty());
    }

    #[test]
    fn visibility_change_marks_subtree() {
        let mut s = NodeState::<1>::new();
        assert!(!s.set_visible(true));
        assert!(s.set_visible(false));
        assert!(s.take_dirty().contains(DirtyState::SUBTREE_BLOCKED));
    }

    #[test]
    fn stale_until_current_matches_pending() {
        let mut s = NodeState::<2>::new();
        assert!(!s.is_texture_stale());
        let p = TextureParams { shape: ShapeType::Circle, radius: 8, shadow: 0 };
        s.set_pending(1, Some(p));
        assert!(s.is_texture_stale());
        s.set_current(1, Some(p));
        assert!(!s.is_texture_stale());
    }

    #[test]
    fn shadow_visibility_needs_size_and_alpha() {
        let mut p = ShadowParams { size: 4.0, ..ShadowParams::NONE };
        assert!(p.is_visible());
        p.color = Rgba::TRANSPARENT;
        assert!(!p.is_visible());
        assert!(!ShadowParams::NONE.is_visible());
    }
}
