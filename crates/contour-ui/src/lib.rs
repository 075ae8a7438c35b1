//! Contour UI: shape items on top of `contour-engine`.
//!
//! # Quick start
//!
//! ```rust,ignore
//! use contour_ui::prelude::*;
//!
//! let registry = ContextRegistry::new(backend);
//! let mut shape = Shape::new();
//! shape.set_size(Size::new(160.0, 48.0));
//! shape.set_radius(12.0);
//! shape.set_color(Rgba::new(30, 144, 255, 255));
//!
//! // Once per frame, on the render thread:
//! let mut paint = shape.update_paint_node(&registry, paint.take());
//! let mut nodes = Vec::new();
//! if let Some(paint) = paint.as_mut() {
//!     paint.push_nodes(Vec2::new(20.0, 20.0), &mut nodes);
//! }
//! let batches = frame_pass.run(&mut nodes);
//! // Hand the frame pass to a NodeRenderer.
//! ```

mod paint_node;
mod shape;

pub use paint_node::ShapePaintNode;
pub use shape::{PropertyChange, Shape, Visibility};

/// Everything an embedder needs to drive shape items.
pub mod prelude {
    pub use crate::{PropertyChange, Shape, ShapePaintNode, Visibility};

    pub use contour_engine::coords::{Size, Vec2, Viewport};
    pub use contour_engine::paint::Rgba;
    pub use contour_engine::raster::ShapeType;
    pub use contour_engine::scene::{FramePass, NodeRef};
    pub use contour_engine::texture::ContextRegistry;
}
