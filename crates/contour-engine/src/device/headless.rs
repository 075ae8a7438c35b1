use std::sync::mpsc;

use anyhow::{Context, Result};

/// Format of the offscreen targets created by [`HeadlessGpu::render_to_rgba`].
pub const HEADLESS_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

/// Initialization parameters for a surfaceless GPU context.
#[derive(Debug, Clone)]
pub struct HeadlessInit {
    pub power_preference: wgpu::PowerPreference,

    /// Required wgpu features.
    ///
    /// Shape rendering needs none; keep the set empty for portability.
    pub required_features: wgpu::Features,

    pub required_limits: wgpu::Limits,

    /// Allow a software adapter when no hardware adapter is found.
    pub force_fallback_adapter: bool,

    pub label: &'static str,
}

impl Default for HeadlessInit {
    fn default() -> Self {
        Self {
            power_preference: wgpu::PowerPreference::LowPower,
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::downlevel_defaults(),
            force_fallback_adapter: false,
            label: "contour headless device",
        }
    }
}

/// wgpu device and queue without a surface.
///
/// Used by tools and GPU tests: frames are rendered into an offscreen
/// texture and read back as tightly packed RGBA8 rows.
pub struct HeadlessGpu {
    adapter: wgpu::Adapter,
    device: wgpu::Device,
    queue: wgpu::Queue,
}

impl HeadlessGpu {
    pub async fn new(init: HeadlessInit) -> Result<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: init.power_preference,
                compatible_surface: None,
                force_fallback_adapter: init.force_fallback_adapter,
            })
            .await
            .context("failed to find a GPU adapter")?;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some(init.label),
                required_features: init.required_features,
                required_limits: init.required_limits,
                experimental_features: wgpu::ExperimentalFeatures::disabled(),
                memory_hints: wgpu::MemoryHints::MemoryUsage,
                trace: wgpu::Trace::Off,
            })
            .await
            .context("failed to create wgpu device/queue")?;

        let info = adapter.get_info();
        log::info!("headless adapter: {} ({:?})", info.name, info.backend);

        Ok(Self { adapter, device, queue })
    }

    /// Blocking variant of [`HeadlessGpu::new`].
    pub fn blocking(init: HeadlessInit) -> Result<Self> {
        pollster::block_on(Self::new(init))
    }

    #[inline]
    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    #[inline]
    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    pub fn adapter_info(&self) -> wgpu::AdapterInfo {
        self.adapter.get_info()
    }

    /// Largest texture side the device accepts.
    pub fn max_texture_size(&self) -> u32 {
        self.device.limits().max_texture_dimension_2d
    }

    /// Renders one frame into a fresh `width × height` target and reads it
    /// back. `draw` records into the encoder against the target view.
    pub fn render_to_rgba<F>(&self, width: u32, height: u32, draw: F) -> Result<Vec<u8>>
    where
        F: FnOnce(&mut wgpu::CommandEncoder, &wgpu::TextureView),
    {
        anyhow::ensure!(width > 0 && height > 0, "empty render target {width}x{height}");

        let size = wgpu::Extent3d { width, height, depth_or_array_layers: 1 };
        let target = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("contour headless target"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: HEADLESS_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let view = target.create_view(&wgpu::TextureViewDescriptor::default());

        let row_bytes = width * 4;
        let padded_row_bytes = row_bytes.next_multiple_of(wgpu::COPY_BYTES_PER_ROW_ALIGNMENT);
        let buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("contour headless readback"),
            size: padded_row_bytes as u64 * height as u64,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("contour headless encoder"),
        });
        draw(&mut encoder, &view);
        encoder.copy_texture_to_buffer(
            target.as_image_copy(),
            wgpu::TexelCopyBufferInfo {
                buffer: &buffer,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(padded_row_bytes),
                    rows_per_image: None,
                },
            },
            size,
        );
        self.queue.submit([encoder.finish()]);

        let slice = buffer.slice(..);
        let (tx, rx) = mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        let mapped = loop {
            self.device.poll(wgpu::PollType::Poll).context("device poll failed")?;
            match rx.try_recv() {
                Ok(result) => break result,
                Err(mpsc::TryRecvError::Empty) => std::thread::yield_now(),
                Err(mpsc::TryRecvError::Disconnected) => {
                    anyhow::bail!("readback callback dropped")
                }
            }
        };
        mapped.context("failed to map readback buffer")?;

        let data = slice.get_mapped_range();
        let mut pixels = Vec::with_capacity((row_bytes * height) as usize);
        for row in 0..height {
            let start = (row * padded_row_bytes) as usize;
            pixels.extend_from_slice(&data[start..start + row_bytes as usize]);
        }
        drop(data);
        buffer.unmap();

        Ok(pixels)
    }
}
