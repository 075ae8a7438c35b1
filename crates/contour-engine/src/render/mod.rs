//! GPU rendering of frame passes.
//!
//! The node renderer consumes the batches of a `scene::FramePass` and issues
//! GPU commands via wgpu. It owns its pipelines and buffers; shape textures
//! are owned by the texture backend and bound per frame.
//!
//! Convention:
//! - CPU geometry is in logical pixels (top-left origin, +Y down).
//! - Vertex shaders convert to NDC using a viewport uniform.
//! - Vertex colors are premultiplied.

mod ctx;
mod node_renderer;

pub use ctx::{RenderCtx, RenderTarget};
pub use node_renderer::{NodeRenderer, NodeRendererConfig};
