//! Contour engine crate.
//!
//! Rounded-shape rendering for scene-graph UIs: CPU rasterization of corner
//! masks and blurred shadows, a per-context texture cache shared by every
//! item, the geometry nodes that draw with those textures, and a wgpu
//! renderer for the resulting frame passes.

pub mod util;
pub mod error;

pub mod coords;
pub mod paint;
pub mod raster;
pub mod texture;

pub mod node;
pub mod scene;
pub mod render;
pub mod device;

pub mod logging;

pub use error::ShapeError;
