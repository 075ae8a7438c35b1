//! CPU rasterization of shape textures.
//!
//! - [`render_shape`]: antialiased corner quadrant coverage (tiny-skia)
//! - [`render_mask_texture`]: single-channel corner mask with clamping borders
//! - [`render_shadow_texture`]: blurred dual-channel shadow with knockouts
//!
//! Every texture is square, its side rounded up to
//! [`TEXTURE_ROUNDING`](crate::util::TEXTURE_ROUNDING), with the content
//! pushed against the bottom-right corner. Geometry nodes rely on that layout
//! to derive texture coordinates before the texture exists.

mod blur;
mod image;
mod mask;
mod shadow;
mod shape;

pub use blur::{box_radii, shadow_sigma, BLUR_PASSES};
pub use image::{TextureFormat, TextureImage, INNER_CHANNEL, OUTER_CHANNEL};
pub use mask::{mask_texture_size, render_mask_texture};
pub use shadow::{render_shadow_texture, shadow_content_size, shadow_texture_size};
pub use shape::{render_shape, ShapeType};
