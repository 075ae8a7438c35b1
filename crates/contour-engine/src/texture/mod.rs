//! Shared shape textures.
//!
//! A [`ContextRegistry`] scopes one [`TextureCache`] per GPU context. Each
//! material owns a [`TextureFactory`] with a fixed number of slots; a slot
//! holds one [`ShapeTexture`] handle and textures with equal
//! [`TextureKey`]s are shared between all slots of the context.
//!
//! GPU work goes through the [`TextureBackend`] seam: [`WgpuTextureBackend`]
//! on a real device, [`MemoryBackend`] for tests and offline dumps.

mod backend;
mod cache;
mod factory;
mod key;
mod registry;
mod wgpu_backend;

pub use backend::{MemoryBackend, TextureBackend, TextureId};
pub use cache::{CacheStats, ShapeTexture, TextureCache};
pub use factory::TextureFactory;
pub use key::{TextureKey, TextureKind};
pub use registry::ContextRegistry;
pub use wgpu_backend::WgpuTextureBackend;

pub use crate::util::MAX_KEY_VALUE;
