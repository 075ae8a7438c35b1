use std::rc::Rc;

use super::backend::TextureId;
use super::cache::{ShapeTexture, TextureCache};
use super::key::TextureKey;
use super::registry::ContextRegistry;
use crate::error::ShapeError;
use crate::raster::ShapeType;

/// `N` independent texture slots of one material, backed by the shared
/// per-context cache.
#[derive(Debug)]
pub struct TextureFactory<const N: usize> {
    // Field order matters: slots release their textures before the cache
    // reference goes away.
    slots: [Option<Rc<ShapeTexture>>; N],
    cache: Rc<TextureCache>,
}

impl<const N: usize> TextureFactory<N> {
    pub fn new(registry: &ContextRegistry) -> Self {
        Self::with_cache(registry.cache())
    }

    pub fn with_cache(cache: Rc<TextureCache>) -> Self {
        Self { slots: std::array::from_fn(|_| None), cache }
    }

    #[inline]
    pub fn cache(&self) -> &Rc<TextureCache> {
        &self.cache
    }

    fn acquire(
        &mut self,
        slot: usize,
        key: Result<TextureKey, ShapeError>,
    ) -> Result<TextureId, ShapeError> {
        assert!(slot < N, "texture slot {slot} out of range (0..{N})");
        match key {
            Ok(key) => self.cache.acquire(&mut self.slots[slot], key),
            Err(e) => {
                self.slots[slot] = None;
                Err(e)
            }
        }
    }

    /// Mask texture of `(shape, radius)` held in `slot`.
    pub fn mask_texture(
        &mut self,
        slot: usize,
        shape: ShapeType,
        radius: u32,
    ) -> Result<TextureId, ShapeError> {
        self.acquire(slot, TextureKey::mask(shape, radius))
    }

    /// Shadow texture of `(shape, radius, shadow)` held in `slot`.
    pub fn shadow_texture(
        &mut self,
        slot: usize,
        shape: ShapeType,
        radius: u32,
        shadow: u32,
    ) -> Result<TextureId, ShapeError> {
        self.acquire(slot, TextureKey::shadow(shape, radius, shadow))
    }

    pub fn texture_id(&self, slot: usize) -> Option<TextureId> {
        self.slots[slot].as_ref().map(|t| t.id())
    }

    pub fn key(&self, slot: usize) -> Option<TextureKey> {
        self.slots[slot].as_ref().map(|t| t.key())
    }

    pub fn release(&mut self, slot: usize) {
        self.slots[slot] = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::texture::{MemoryBackend, TextureBackend};

    fn registry() -> (Rc<MemoryBackend>, ContextRegistry) {
        let backend = Rc::new(MemoryBackend::new());
        let registry = ContextRegistry::new(backend.clone());
        (backend, registry)
    }

    // ── scenarios ─────────────────────────────────────────────────────────

    #[test]
    fn radius_50_twice_on_a_fresh_context() {
        let (_backend, registry) = registry();
        let mut a = TextureFactory::<1>::new(&registry);
        let mut b = TextureFactory::<1>::new(&registry);

        let t = a.mask_texture(0, ShapeType::Squircle, 50).unwrap();
        assert_eq!(a.cache().stats().rasterizations, 1);
        assert_eq!(b.mask_texture(0, ShapeType::Squircle, 50).unwrap(), t);
        assert_eq!(a.cache().stats().rasterizations, 1);

        let key = TextureKey::mask(ShapeType::Squircle, 50).unwrap();
        assert_eq!(a.cache().ref_count(key), 2);
    }

    #[test]
    fn same_slot_moves_from_a_to_b() {
        let (backend, registry) = registry();
        let mut f = TextureFactory::<1>::new(&registry);
        let key_a = TextureKey::mask(ShapeType::Squircle, 20).unwrap();
        let key_b = TextureKey::mask(ShapeType::Squircle, 30).unwrap();

        f.mask_texture(0, ShapeType::Squircle, 20).unwrap();
        assert_eq!(f.cache().ref_count(key_a), 1);
        f.mask_texture(0, ShapeType::Squircle, 30).unwrap();
        assert_eq!(f.cache().ref_count(key_a), 0);
        assert_eq!(f.cache().ref_count(key_b), 1);
        assert_eq!(f.key(0), Some(key_b));
        assert_eq!(backend.live_textures(), 1);
    }

    // ── slots ─────────────────────────────────────────────────────────────

    #[test]
    fn slots_are_independent_holders() {
        let (backend, registry) = registry();
        let mut f = TextureFactory::<2>::new(&registry);
        let outer = f.mask_texture(0, ShapeType::Circle, 12).unwrap();
        let inner = f.mask_texture(1, ShapeType::Circle, 6).unwrap();
        assert_ne!(outer, inner);
        assert_eq!(f.texture_id(0), Some(outer));
        assert_eq!(f.texture_id(1), Some(inner));
        assert_eq!(backend.live_textures(), 2);

        f.release(1);
        assert_eq!(f.texture_id(1), None);
        assert_eq!(backend.live_textures(), 1);
    }

    #[test]
    fn both_slots_on_one_key_count_twice() {
        let (_backend, registry) = registry();
        let mut f = TextureFactory::<2>::new(&registry);
        f.mask_texture(0, ShapeType::Circle, 12).unwrap();
        f.mask_texture(1, ShapeType::Circle, 12).unwrap();
        let key = TextureKey::mask(ShapeType::Circle, 12).unwrap();
        assert_eq!(f.cache().ref_count(key), 2);
    }

    #[test]
    fn invalid_parameters_empty_the_slot() {
        let (_backend, registry) = registry();
        let mut f = TextureFactory::<1>::new(&registry);
        f.shadow_texture(0, ShapeType::Squircle, 10, 5).unwrap();
        let err = f.shadow_texture(0, ShapeType::Squircle, 10, 9000).unwrap_err();
        assert!(matches!(err, ShapeError::InvalidParameter { what: "shadow", .. }));
        assert_eq!(f.texture_id(0), None);
    }

    #[test]
    #[should_panic]
    fn slot_out_of_range_panics() {
        let (_backend, registry) = registry();
        let mut f = TextureFactory::<1>::new(&registry);
        let _ = f.mask_texture(1, ShapeType::Circle, 4);
    }

    // ── lifecycle ─────────────────────────────────────────────────────────

    #[test]
    fn last_factory_frees_the_cache() {
        let (backend, registry) = registry();
        let mut a = TextureFactory::<1>::new(&registry);
        let mut b = TextureFactory::<2>::new(&registry);
        a.mask_texture(0, ShapeType::Squircle, 4).unwrap();
        b.shadow_texture(1, ShapeType::Squircle, 4, 3).unwrap();
        drop(a);
        assert!(registry.live_cache().is_some());
        assert_eq!(backend.live_textures(), 1);
        drop(b);
        assert!(registry.live_cache().is_none());
        assert_eq!(backend.live_textures(), 0);
        assert!(backend.max_texture_size() > 0);
    }

    #[test]
    fn factories_survive_context_destruction() {
        let (backend, registry) = registry();
        let mut f = TextureFactory::<1>::new(&registry);
        f.mask_texture(0, ShapeType::Squircle, 4).unwrap();
        registry.context_destroyed();
        assert_eq!(backend.live_textures(), 0);
        assert_eq!(
            f.mask_texture(0, ShapeType::Squircle, 5),
            Err(ShapeError::ContextDestroyed)
        );
        drop(f);
    }
}
