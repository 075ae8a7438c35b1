use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use crate::error::ShapeError;
use crate::raster::{TextureFormat, TextureImage};

/// Backend-assigned texture handle. Ordering follows allocation order, which
/// the materials use to sort draws sharing a texture next to each other.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(u32);

impl TextureId {
    #[inline]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

/// GPU-facing seam of the texture cache.
///
/// Every call happens on the thread that owns the context, so `&self` methods
/// with interior mutability are enough.
pub trait TextureBackend {
    /// Largest square side the backend can allocate.
    fn max_texture_size(&self) -> u32;

    /// Allocates an uninitialised `size × size` texture.
    fn create_texture(&self, format: TextureFormat, size: u32) -> Result<TextureId, ShapeError>;

    /// Reallocates storage of an existing texture, keeping its id.
    fn resize_texture(
        &self,
        id: TextureId,
        format: TextureFormat,
        size: u32,
    ) -> Result<(), ShapeError>;

    /// Replaces the whole content of `id`; the image matches its allocation.
    fn upload(&self, id: TextureId, image: &TextureImage) -> Result<(), ShapeError>;

    fn delete_textures(&self, ids: &[TextureId]);
}

#[derive(Debug)]
struct MemoryTexture {
    format: TextureFormat,
    size: u32,
    image: Option<TextureImage>,
}

/// CPU-resident backend: keeps the uploaded images so they can be inspected
/// or written out.
#[derive(Debug)]
pub struct MemoryBackend {
    textures: RefCell<HashMap<TextureId, MemoryTexture>>,
    next_id: Cell<u32>,
    max_size: u32,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBackend {
    pub const DEFAULT_MAX_TEXTURE_SIZE: u32 = 8192;

    pub fn new() -> Self {
        Self::with_max_texture_size(Self::DEFAULT_MAX_TEXTURE_SIZE)
    }

    pub fn with_max_texture_size(max_size: u32) -> Self {
        Self { textures: RefCell::new(HashMap::new()), next_id: Cell::new(1), max_size }
    }

    /// Number of allocated, not yet deleted textures.
    pub fn live_textures(&self) -> usize {
        self.textures.borrow().len()
    }

    pub fn contains(&self, id: TextureId) -> bool {
        self.textures.borrow().contains_key(&id)
    }

    pub fn texture_size(&self, id: TextureId) -> Option<u32> {
        self.textures.borrow().get(&id).map(|t| t.size)
    }

    /// Last image uploaded to `id`.
    pub fn image(&self, id: TextureId) -> Option<TextureImage> {
        self.textures.borrow().get(&id).and_then(|t| t.image.clone())
    }

    fn check_size(&self, size: u32) -> Result<(), ShapeError> {
        if size > self.max_size {
            return Err(ShapeError::TextureCreationFailed { size, max: self.max_size });
        }
        Ok(())
    }
}

impl TextureBackend for MemoryBackend {
    fn max_texture_size(&self) -> u32 {
        self.max_size
    }

    fn create_texture(&self, format: TextureFormat, size: u32) -> Result<TextureId, ShapeError> {
        self.check_size(size)?;
        let id = TextureId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.textures.borrow_mut().insert(id, MemoryTexture { format, size, image: None });
        Ok(id)
    }

    fn resize_texture(
        &self,
        id: TextureId,
        format: TextureFormat,
        size: u32,
    ) -> Result<(), ShapeError> {
        self.check_size(size)?;
        let mut textures = self.textures.borrow_mut();
        let Some(tex) = textures.get_mut(&id) else {
            panic!("unknown texture {id:?}");
        };
        tex.format = format;
        tex.size = size;
        tex.image = None;
        Ok(())
    }

    fn upload(&self, id: TextureId, image: &TextureImage) -> Result<(), ShapeError> {
        let mut textures = self.textures.borrow_mut();
        let Some(tex) = textures.get_mut(&id) else {
            panic!("unknown texture {id:?}");
        };
        assert!(
            tex.format == image.format() && tex.size == image.size(),
            "upload of {:?} {}x{} into {:?} {}x{} texture {id:?}",
            image.format(),
            image.size(),
            image.size(),
            tex.format,
            tex.size,
            tex.size
        );
        tex.image = Some(image.clone());
        Ok(())
    }

    fn delete_textures(&self, ids: &[TextureId]) {
        let mut textures = self.textures.borrow_mut();
        for id in ids {
            textures.remove(id);
        }
    }
}
