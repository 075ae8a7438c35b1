use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use super::backend::{TextureBackend, TextureId};
use super::key::{TextureKey, TextureKind};
use crate::error::ShapeError;
use crate::raster::{render_mask_texture, render_shadow_texture, TextureImage};

/// Counters for the work done by a cache since its creation.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub allocations: u64,
    pub rasterizations: u64,
    pub uploads: u64,
    pub deletions: u64,
}

/// A rasterized texture shared by every slot holding its key.
///
/// Dropping the last handle deletes the GPU texture through the cache.
#[derive(Debug)]
pub struct ShapeTexture {
    id: TextureId,
    key: Cell<TextureKey>,
    size: Cell<u32>,
    cache: Weak<TextureCache>,
}

impl ShapeTexture {
    #[inline]
    pub fn id(&self) -> TextureId {
        self.id
    }

    #[inline]
    pub fn key(&self) -> TextureKey {
        self.key.get()
    }

    /// Side length of the allocated texture.
    #[inline]
    pub fn size(&self) -> u32 {
        self.size.get()
    }
}

impl Drop for ShapeTexture {
    fn drop(&mut self) {
        if let Some(cache) = self.cache.upgrade() {
            cache.release(self.key.get(), self.id);
        }
    }
}

#[derive(Debug)]
struct Entry {
    id: TextureId,
    texture: Weak<ShapeTexture>,
}

/// Per-context map from [`TextureKey`] to the live texture holding it.
///
/// The map only keeps weak handles: slots own the textures, so the number of
/// entries is always the number of distinct keys held by at least one slot.
pub struct TextureCache {
    backend: Rc<dyn TextureBackend>,
    entries: RefCell<HashMap<TextureKey, Entry>>,
    stats: Cell<CacheStats>,
    destroyed: Cell<bool>,
    this: Weak<TextureCache>,
}

impl std::fmt::Debug for TextureCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextureCache")
            .field("live_textures", &self.live_textures())
            .field("stats", &self.stats.get())
            .field("destroyed", &self.destroyed.get())
            .finish()
    }
}

impl TextureCache {
    pub fn new(backend: Rc<dyn TextureBackend>) -> Rc<Self> {
        log::debug!("texture cache created");
        Rc::new_cyclic(|this| Self {
            backend,
            entries: RefCell::new(HashMap::new()),
            stats: Cell::new(CacheStats::default()),
            destroyed: Cell::new(false),
            this: this.clone(),
        })
    }

    #[inline]
    pub fn stats(&self) -> CacheStats {
        self.stats.get()
    }

    /// Number of resident textures.
    pub fn live_textures(&self) -> usize {
        self.entries.borrow().len()
    }

    /// Number of handles currently sharing the texture of `key`.
    pub fn ref_count(&self, key: TextureKey) -> usize {
        self.entries.borrow().get(&key).map_or(0, |e| e.texture.strong_count())
    }

    pub fn texture_id(&self, key: TextureKey) -> Option<TextureId> {
        self.entries.borrow().get(&key).map(|e| e.id)
    }

    #[inline]
    pub fn is_destroyed(&self) -> bool {
        self.destroyed.get()
    }

    pub fn backend(&self) -> &Rc<dyn TextureBackend> {
        &self.backend
    }

    fn bump(&self, f: impl FnOnce(&mut CacheStats)) {
        let mut stats = self.stats.get();
        f(&mut stats);
        self.stats.set(stats);
    }

    fn lookup(&self, key: TextureKey) -> Option<Rc<ShapeTexture>> {
        self.entries.borrow().get(&key).and_then(|e| e.texture.upgrade())
    }

    /// Moves `slot` from whatever it holds to `key`.
    ///
    /// The old reference is released before a new texture is allocated, and
    /// a texture only this slot holds is re-keyed in place. On failure the
    /// slot is left empty.
    pub fn acquire(
        &self,
        slot: &mut Option<Rc<ShapeTexture>>,
        key: TextureKey,
    ) -> Result<TextureId, ShapeError> {
        if self.destroyed.get() {
            *slot = None;
            return Err(ShapeError::ContextDestroyed);
        }

        if let Some(tex) = slot.as_ref() {
            if tex.key() == key {
                return Ok(tex.id());
            }
        }

        if let Some(shared) = self.lookup(key) {
            let id = shared.id();
            log::trace!("texture {key:?}: shared {id:?}");
            // The previous texture drops here, outside any borrow.
            *slot = Some(shared);
            return Ok(id);
        }

        if let Some(tex) = slot.as_ref().filter(|t| Rc::strong_count(t) == 1) {
            let id = tex.id();
            self.rekey(tex, key);
            if let Err(e) = self.refill(tex, key) {
                log::warn!("texture {key:?}: update of {id:?} failed: {e}");
                *slot = None;
                return Err(e);
            }
            return Ok(id);
        }

        *slot = None;
        let tex = self.create(key)?;
        let id = tex.id();
        *slot = Some(tex);
        Ok(id)
    }

    fn rekey(&self, tex: &ShapeTexture, key: TextureKey) {
        let old = tex.key();
        let mut entries = self.entries.borrow_mut();
        let entry = match entries.remove(&old) {
            Some(entry) if entry.id == tex.id() => entry,
            other => panic!(
                "texture cache inconsistency: re-keying {:?} from {old:?} found {:?}",
                tex.id(),
                other.map(|e| e.id)
            ),
        };
        let previous = entries.insert(key, entry);
        assert!(previous.is_none(), "texture cache inconsistency: {key:?} already resident");
        tex.key.set(key);
        log::trace!("texture {:?}: re-keyed {old:?} -> {key:?}", tex.id());
    }

    fn refill(&self, tex: &ShapeTexture, key: TextureKey) -> Result<(), ShapeError> {
        let size = key.texture_size();
        let old_format = tex.key().format();
        if size != tex.size() || old_format != key.format() {
            self.backend.resize_texture(tex.id(), key.format(), size)?;
            tex.size.set(size);
        }
        self.fill(tex.id(), key)
    }

    fn create(&self, key: TextureKey) -> Result<Rc<ShapeTexture>, ShapeError> {
        let size = key.texture_size();
        let id = self.backend.create_texture(key.format(), size).inspect_err(|e| {
            log::warn!("texture {key:?}: allocation of {size}x{size} failed: {e}");
        })?;
        self.bump(|s| s.allocations += 1);
        log::debug!("texture {key:?}: created {id:?} ({size}x{size})");

        let tex = Rc::new(ShapeTexture {
            id,
            key: Cell::new(key),
            size: Cell::new(size),
            cache: self.this.clone(),
        });
        let previous = self
            .entries
            .borrow_mut()
            .insert(key, Entry { id, texture: Rc::downgrade(&tex) });
        assert!(previous.is_none(), "texture cache inconsistency: {key:?} already resident");

        // On failure `tex` drops and deletes the texture again.
        self.fill(id, key)?;
        Ok(tex)
    }

    fn rasterize(&self, key: TextureKey) -> Result<TextureImage, ShapeError> {
        let image = match key.kind() {
            TextureKind::Mask => render_mask_texture(key.shape(), key.radius())?,
            TextureKind::Shadow => {
                render_shadow_texture(key.shape(), key.radius(), key.shadow_size())?
            }
        };
        self.bump(|s| s.rasterizations += 1);
        Ok(image)
    }

    fn fill(&self, id: TextureId, key: TextureKey) -> Result<(), ShapeError> {
        let image = self.rasterize(key)?;
        self.backend.upload(id, &image)?;
        self.bump(|s| s.uploads += 1);
        Ok(())
    }

    /// Drop action of [`ShapeTexture`]: the last handle of `key` went away.
    fn release(&self, key: TextureKey, id: TextureId) {
        if self.destroyed.get() {
            return;
        }
        {
            let mut entries = self.entries.borrow_mut();
            match entries.get(&key) {
                Some(entry) if entry.id == id => {
                    assert_eq!(
                        entry.texture.strong_count(),
                        0,
                        "texture cache inconsistency: releasing {key:?} while still referenced"
                    );
                    entries.remove(&key);
                }
                Some(entry) => panic!(
                    "texture cache inconsistency: {key:?} maps to {:?}, released {id:?}",
                    entry.id
                ),
                None => panic!("texture cache inconsistency: released unknown {key:?} ({id:?})"),
            }
        }
        self.backend.delete_textures(&[id]);
        self.bump(|s| s.deletions += 1);
        log::debug!("texture {key:?}: deleted {id:?}");
    }

    fn delete_all(&self) {
        let ids: Vec<TextureId> = self.entries.borrow_mut().drain().map(|(_, e)| e.id).collect();
        if !ids.is_empty() {
            self.backend.delete_textures(&ids);
            self.bump(|s| s.deletions += ids.len() as u64);
        }
        log::debug!("texture cache: deleted {} resident textures", ids.len());
    }

    /// Context teardown: deletes every resident texture now. Handles still
    /// alive become inert and later acquisitions fail.
    pub(crate) fn destroy(&self) {
        if self.destroyed.replace(true) {
            return;
        }
        self.delete_all();
    }

    /// Cache that refuses every acquisition, handed out after the context
    /// went away.
    pub(crate) fn new_destroyed(backend: Rc<dyn TextureBackend>) -> Rc<Self> {
        let cache = Self::new(backend);
        cache.destroyed.set(true);
        cache
    }
}

impl Drop for TextureCache {
    fn drop(&mut self) {
        if !self.destroyed.get() {
            self.delete_all();
        }
        log::debug!("texture cache dropped");
    }
}
