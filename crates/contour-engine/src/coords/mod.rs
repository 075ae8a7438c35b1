//! Coordinate types shared by the geometry nodes, the renderer and the items.
//!
//! Canonical CPU space:
//! - Logical pixels (DPI-aware)
//! - Origin top-left of the item
//! - +X right, +Y down
//!
//! Texture keys are derived in device pixels (`logical * device_pixel_ratio`).

mod size;
mod vec2;
mod viewport;

pub use size::Size;
pub use vec2::Vec2;
pub use viewport::Viewport;
