use std::cmp::Ordering;
use std::rc::Rc;

use super::state::{DirtyState, NodeState};
use crate::error::ShapeError;
use crate::raster::ShapeType;
use crate::texture::{TextureCache, TextureFactory, TextureId};

/// Shader family of a material.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MaterialKind {
    /// Flat vertex color.
    Color,
    /// Vertex color times a mask texture.
    ColorMask,
    /// Vertex color times the outer channel of a shadow texture.
    DropShadow,
    /// Vertex color blended with an inner shadow (inner channel, mirrored).
    InnerShadow,
    /// Vertex color times `outer * (1 - inner)` of two mask textures.
    Frame,
}

impl MaterialKind {
    /// Number of textures the shader samples.
    pub const fn texture_count(self) -> usize {
        match self {
            MaterialKind::Color => 0,
            MaterialKind::ColorMask | MaterialKind::DropShadow | MaterialKind::InnerShadow => 1,
            MaterialKind::Frame => 2,
        }
    }
}

/// Everything the renderer needs to tell two materials apart.
///
/// Ordering is kind, then texture ids (outer before inner), then blending,
/// so draws sharing a texture sort next to each other. Equal keys mean the
/// draws can be batched.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MaterialKey {
    pub kind: MaterialKind,
    pub textures: [Option<TextureId>; 2],
    pub blending: bool,
}

impl MaterialKey {
    #[inline]
    pub fn compare(&self, other: &MaterialKey) -> Ordering {
        self.cmp(other)
    }

    /// `true` when every texture the kind samples is bound.
    pub fn is_complete(&self) -> bool {
        self.textures[..self.kind.texture_count()].iter().all(Option::is_some)
    }
}

/// Untextured material.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorMaterial {
    blending: bool,
}

impl ColorMaterial {
    pub fn new() -> Self {
        Self { blending: false }
    }

    pub fn key(&self) -> MaterialKey {
        MaterialKey { kind: MaterialKind::Color, textures: [None; 2], blending: self.blending }
    }

    /// Returns `true` when the flag changed.
    pub fn set_blending(&mut self, blending: bool) -> bool {
        std::mem::replace(&mut self.blending, blending) != blending
    }
}

impl Default for ColorMaterial {
    fn default() -> Self {
        Self::new()
    }
}

/// Material sampling `N` shape textures from the context cache.
#[derive(Debug)]
pub struct TextureMaterial<const N: usize> {
    kind: MaterialKind,
    factory: TextureFactory<N>,
    blending: bool,
}

impl<const N: usize> TextureMaterial<N> {
    pub fn new(kind: MaterialKind, cache: Rc<TextureCache>) -> Self {
        debug_assert_eq!(kind.texture_count(), N);
        Self { kind, factory: TextureFactory::with_cache(cache), blending: true }
    }

    #[inline]
    pub fn kind(&self) -> MaterialKind {
        self.kind
    }

    pub fn key(&self) -> MaterialKey {
        let mut textures = [None; 2];
        for (slot, t) in textures.iter_mut().enumerate().take(N) {
            *t = self.factory.texture_id(slot);
        }
        MaterialKey { kind: self.kind, textures, blending: self.blending }
    }

    pub fn set_blending(&mut self, blending: bool) -> bool {
        std::mem::replace(&mut self.blending, blending) != blending
    }

    pub fn update_mask(
        &mut self,
        slot: usize,
        shape: ShapeType,
        radius: u32,
    ) -> Result<TextureId, ShapeError> {
        self.factory.mask_texture(slot, shape, radius)
    }

    pub fn update_shadow(
        &mut self,
        slot: usize,
        shape: ShapeType,
        radius: u32,
        shadow: u32,
    ) -> Result<TextureId, ShapeError> {
        self.factory.shadow_texture(slot, shape, radius, shadow)
    }

    pub fn release(&mut self, slot: usize) {
        self.factory.release(slot);
    }

    #[inline]
    pub fn factory(&self) -> &TextureFactory<N> {
        &self.factory
    }

    /// Brings every slot in line with the pending parameters of `state`.
    ///
    /// A failed slot is left empty with no current parameters, so the next
    /// frame tries again. The first error is returned after all slots ran.
    pub fn reconcile(&mut self, state: &mut NodeState<N>) -> Result<(), ShapeError> {
        let before = self.key();
        let mut result = Ok(());
        for slot in 0..N {
            let pending = state.pending(slot);
            let held = self.factory.texture_id(slot).is_some();
            if pending == state.current(slot) && held == pending.is_some() {
                continue;
            }
            let Some(p) = pending else {
                self.release(slot);
                state.set_current(slot, None);
                continue;
            };
            let acquired = match self.kind {
                MaterialKind::DropShadow | MaterialKind::InnerShadow => {
                    self.update_shadow(slot, p.shape, p.radius, p.shadow)
                }
                _ => self.update_mask(slot, p.shape, p.radius),
            };
            match acquired {
                Ok(_) => state.set_current(slot, Some(p)),
                Err(e) => {
                    state.set_current(slot, None);
                    if result.is_ok() {
                        result = Err(e);
                    }
                }
            }
        }
        if self.key() != before {
            state.mark(DirtyState::MATERIAL);
        }
        result
    }
}
