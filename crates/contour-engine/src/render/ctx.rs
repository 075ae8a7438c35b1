use crate::coords::Viewport;
use crate::device::{HeadlessGpu, HEADLESS_FORMAT};

/// What a renderer needs from the GPU context for one frame.
pub struct RenderCtx<'a> {
    pub device: &'a wgpu::Device,
    pub queue: &'a wgpu::Queue,
    /// Format of the color attachment; pipelines are built for it.
    pub surface_format: wgpu::TextureFormat,
    /// Logical size the frame pass geometry is laid out in.
    pub viewport: Viewport,
}

impl<'a> RenderCtx<'a> {
    #[inline]
    pub fn new(
        device: &'a wgpu::Device,
        queue: &'a wgpu::Queue,
        surface_format: wgpu::TextureFormat,
        viewport: Viewport,
    ) -> Self {
        Self { device, queue, surface_format, viewport }
    }

    /// Context for offscreen targets of a [`HeadlessGpu`].
    #[inline]
    pub fn headless(gpu: &'a HeadlessGpu, viewport: Viewport) -> Self {
        Self::new(gpu.device(), gpu.queue(), HEADLESS_FORMAT, viewport)
    }
}

/// Encoder and color attachment of the frame being recorded.
pub struct RenderTarget<'a> {
    pub encoder: &'a mut wgpu::CommandEncoder,
    pub color_view: &'a wgpu::TextureView,
}

impl<'a> RenderTarget<'a> {
    #[inline]
    pub fn new(encoder: &'a mut wgpu::CommandEncoder, color_view: &'a wgpu::TextureView) -> Self {
        Self { encoder, color_view }
    }
}
