//! Color model shared between the items, the nodes and the renderer.
//!
//! - [`Rgba`]: straight-alpha 8-bit color, the property-level representation
//! - [`PackedColor`]: premultiplied ABGR32, packed once per change and stored per vertex
//! - [`Color`]: premultiplied `f32`, the shader-side representation

mod color;
mod rgba;

pub use color::Color;
pub use rgba::{PackedColor, Rgba};
