use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use super::backend::TextureBackend;
use super::cache::TextureCache;

/// Texture cache scope of one GPU context.
///
/// The host creates one registry per context and calls
/// [`context_destroyed`](Self::context_destroyed) from its teardown hook. The
/// cache itself is created by the first factory asking for it and freed when
/// the last factory using it goes away.
pub struct ContextRegistry {
    backend: Rc<dyn TextureBackend>,
    cache: RefCell<Weak<TextureCache>>,
    destroyed: Cell<bool>,
}

impl ContextRegistry {
    pub fn new(backend: Rc<dyn TextureBackend>) -> Self {
        Self { backend, cache: RefCell::new(Weak::new()), destroyed: Cell::new(false) }
    }

    pub fn backend(&self) -> &Rc<dyn TextureBackend> {
        &self.backend
    }

    /// Shared cache of this context, created on first use.
    ///
    /// After the context was destroyed this returns an inert cache on which
    /// every acquisition fails with `ContextDestroyed`.
    pub fn cache(&self) -> Rc<TextureCache> {
        if self.destroyed.get() {
            return TextureCache::new_destroyed(self.backend.clone());
        }
        if let Some(cache) = self.cache.borrow().upgrade() {
            return cache;
        }
        let cache = TextureCache::new(self.backend.clone());
        *self.cache.borrow_mut() = Rc::downgrade(&cache);
        cache
    }

    /// The cache, if some factory currently keeps it alive.
    pub fn live_cache(&self) -> Option<Rc<TextureCache>> {
        self.cache.borrow().upgrade()
    }

    #[inline]
    pub fn is_destroyed(&self) -> bool {
        self.destroyed.get()
    }

    /// Deletes every resident texture of the context synchronously.
    pub fn context_destroyed(&self) {
        if self.destroyed.replace(true) {
            return;
        }
        if let Some(cache) = self.cache.replace(Weak::new()).upgrade() {
            cache.destroy();
        }
        log::debug!("render context destroyed");
    }
}

impl Drop for ContextRegistry {
    fn drop(&mut self) {
        self.context_destroyed();
    }
}
