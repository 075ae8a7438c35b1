use std::collections::HashMap;

use bytemuck::{Pod, Zeroable};

use crate::node::VertexLayout;
use crate::paint::Color;
use crate::render::{RenderCtx, RenderTarget};
use crate::scene::{DrawBatch, FramePass};
use crate::texture::{TextureId, WgpuTextureBackend};

/// Options of a [`NodeRenderer`].
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct NodeRendererConfig {
    /// Premultiplied clear color; `None` loads the existing content.
    pub clear_color: Option<Color>,
}

/// Renderer for the batches of a [`FramePass`].
///
/// Texture bindings of a batch: the outer texture and, for frames, the
/// inner one.
type TextureBinding = (TextureId, Option<TextureId>);

struct CachedBindGroup {
    generations: [Option<u64>; 2],
    bind_group: wgpu::BindGroup,
}

impl CachedBindGroup {
    fn is_current(&self, binding: &TextureBinding, textures: &WgpuTextureBackend) -> bool {
        let (outer, inner) = *binding;
        let current = [textures.generation(outer), inner.and_then(|id| textures.generation(id))];
        self.generations == current
    }
}

/// Renderer for the batches of a [`FramePass`].
///
/// Pipelines are built lazily, one per vertex layout and blending mode, and
/// rebuilt when the target format changes. Texture bind groups are cached per
/// texture binding and evicted once one of their textures is released or
/// reallocated, so a resized texture is never sampled through a stale view.
pub struct NodeRenderer {
    config: NodeRendererConfig,
    pipeline_format: Option<wgpu::TextureFormat>,
    pipelines: HashMap<(VertexLayout, bool), wgpu::RenderPipeline>,
    shaders: HashMap<VertexLayout, wgpu::ShaderModule>,

    viewport_layout: Option<wgpu::BindGroupLayout>,
    single_texture_layout: Option<wgpu::BindGroupLayout>,
    dual_texture_layout: Option<wgpu::BindGroupLayout>,
    viewport_ubo: Option<wgpu::Buffer>,
    viewport_bind_group: Option<wgpu::BindGroup>,
    texture_bind_groups: HashMap<TextureBinding, CachedBindGroup>,

    vbo: Option<wgpu::Buffer>,
    vbo_capacity: u64,
    ibo: Option<wgpu::Buffer>,
    ibo_capacity: u64,
    index_scratch: Vec<u16>,
}

impl Default for NodeRenderer {
    fn default() -> Self {
        Self::new(NodeRendererConfig::default())
    }
}

impl NodeRenderer {
    pub fn new(config: NodeRendererConfig) -> Self {
        Self {
            config,
            pipeline_format: None,
            pipelines: HashMap::new(),
            shaders: HashMap::new(),
            viewport_layout: None,
            single_texture_layout: None,
            dual_texture_layout: None,
            viewport_ubo: None,
            viewport_bind_group: None,
            texture_bind_groups: HashMap::new(),
            vbo: None,
            vbo_capacity: 0,
            ibo: None,
            ibo_capacity: 0,
            index_scratch: Vec::new(),
        }
    }

    #[inline]
    pub fn config(&self) -> &NodeRendererConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: NodeRendererConfig) {
        self.config = config;
    }

    pub fn render(
        &mut self,
        ctx: &RenderCtx<'_>,
        target: &mut RenderTarget<'_>,
        textures: &WgpuTextureBackend,
        frame: &FramePass,
    ) {
        let batches = frame.batches();
        if batches.is_empty() && self.config.clear_color.is_none() {
            return;
        }
        if !ctx.viewport.is_valid() {
            log::warn!("node pass skipped: invalid viewport {:?}", ctx.viewport);
            return;
        }

        self.ensure_layouts(ctx);
        self.ensure_bindings(ctx);
        for batch in batches {
            self.ensure_pipeline(ctx, batch.layout, batch.material.blending);
        }
        self.write_viewport_uniform(ctx);
        self.upload_geometry(ctx, frame);
        self.texture_bind_groups.retain(|binding, cached| cached.is_current(binding, textures));

        let mut draws = Vec::with_capacity(batches.len());
        for batch in batches {
            match self.texture_bind_group(ctx, textures, batch) {
                Ok(bind_group) => draws.push((batch, bind_group)),
                Err(id) => log::warn!("{:?} batch skipped: texture {id:?} is gone", batch.layout),
            }
        }

        let load = match self.config.clear_color {
            Some(color) => wgpu::LoadOp::Clear(color.into()),
            None => wgpu::LoadOp::Load,
        };
        let mut rpass = target.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("contour node pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target.color_view,
                resolve_target: None,
                ops: wgpu::Operations { load, store: wgpu::StoreOp::Store },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        if draws.is_empty() {
            return;
        }
        let Some(viewport_bind_group) = self.viewport_bind_group.as_ref() else { return; };
        let Some(vbo) = self.vbo.as_ref() else { return; };
        let Some(ibo) = self.ibo.as_ref() else { return; };

        rpass.set_bind_group(0, viewport_bind_group, &[]);
        rpass.set_index_buffer(ibo.slice(..), wgpu::IndexFormat::Uint16);
        for (batch, bind_group) in &draws {
            let Some(pipeline) = self.pipelines.get(&(batch.layout, batch.material.blending))
            else {
                continue;
            };
            rpass.set_pipeline(pipeline);
            if let Some(bind_group) = bind_group {
                rpass.set_bind_group(1, bind_group, &[]);
            }
            let bytes = batch.vertex_bytes.start as u64..batch.vertex_bytes.end as u64;
            rpass.set_vertex_buffer(0, vbo.slice(bytes));
            rpass.draw_indexed(batch.indices.clone(), 0, 0..1);
        }
    }

    // ── private helpers ────────────────────────────────────────────────────

    fn ensure_layouts(&mut self, ctx: &RenderCtx<'_>) {
        if self.pipeline_format != Some(ctx.surface_format) {
            self.pipelines.clear();
            self.pipeline_format = Some(ctx.surface_format);
        }
        if self.viewport_layout.is_some() {
            return;
        }

        let viewport_layout =
            ctx.device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("contour viewport bgl"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: wgpu::BufferSize::new(
                            std::mem::size_of::<ViewportUniform>() as u64,
                        ),
                    },
                    count: None,
                }],
            });

        let texture_entry = |binding: u32| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Texture {
                sample_type: wgpu::TextureSampleType::Float { filterable: true },
                view_dimension: wgpu::TextureViewDimension::D2,
                multisampled: false,
            },
            count: None,
        };
        let sampler_entry = |binding: u32| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
            count: None,
        };

        let single = ctx.device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("contour single texture bgl"),
            entries: &[texture_entry(0), sampler_entry(1)],
        });
        let dual = ctx.device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("contour dual texture bgl"),
            entries: &[texture_entry(0), texture_entry(1), sampler_entry(2)],
        });

        self.viewport_layout = Some(viewport_layout);
        self.single_texture_layout = Some(single);
        self.dual_texture_layout = Some(dual);
        self.viewport_ubo = None;
        self.viewport_bind_group = None;
    }

    fn texture_layout(&self, layout: VertexLayout) -> Option<&wgpu::BindGroupLayout> {
        match layout {
            VertexLayout::Color => None,
            VertexLayout::ColorMask | VertexLayout::ShadowColor => {
                self.single_texture_layout.as_ref()
            }
            VertexLayout::Frame => self.dual_texture_layout.as_ref(),
        }
    }

    fn shader(&mut self, ctx: &RenderCtx<'_>, layout: VertexLayout) -> wgpu::ShaderModule {
        self.shaders
            .entry(layout)
            .or_insert_with(|| {
                let (label, source) = match layout {
                    VertexLayout::Color => {
                        ("contour color shader", include_str!("shaders/color.wgsl"))
                    }
                    VertexLayout::ColorMask => {
                        ("contour colormask shader", include_str!("shaders/colormask.wgsl"))
                    }
                    VertexLayout::ShadowColor => {
                        ("contour inner shadow shader", include_str!("shaders/inner_shadow.wgsl"))
                    }
                    VertexLayout::Frame => {
                        ("contour frame shader", include_str!("shaders/frame.wgsl"))
                    }
                };
                ctx.device.create_shader_module(wgpu::ShaderModuleDescriptor {
                    label: Some(label),
                    source: wgpu::ShaderSource::Wgsl(source.into()),
                })
            })
            .clone()
    }

    fn ensure_pipeline(&mut self, ctx: &RenderCtx<'_>, layout: VertexLayout, blending: bool) {
        if self.pipelines.contains_key(&(layout, blending)) {
            return;
        }
        let shader = self.shader(ctx, layout);
        let Some(viewport_layout) = self.viewport_layout.as_ref() else { return; };

        let mut bind_group_layouts = vec![viewport_layout];
        if let Some(textures) = self.texture_layout(layout) {
            bind_group_layouts.push(textures);
        }
        let pipeline_layout =
            ctx.device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("contour node pipeline layout"),
                bind_group_layouts: &bind_group_layouts,
                immediate_size: 0,
            });

        let pipeline = ctx.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("contour node pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[layout.buffer_layout()],
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: ctx.surface_format,
                    blend: blending.then(premul_alpha_blend),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleStrip,
                strip_index_format: Some(wgpu::IndexFormat::Uint16),
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });
        log::debug!("node pipeline built: {layout:?}, blending {blending}");
        self.pipelines.insert((layout, blending), pipeline);
    }

    fn ensure_bindings(&mut self, ctx: &RenderCtx<'_>) {
        if self.viewport_bind_group.is_some() && self.viewport_ubo.is_some() {
            return;
        }
        let Some(bgl) = self.viewport_layout.as_ref() else { return; };

        let viewport_ubo = ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("contour viewport ubo"),
            size: std::mem::size_of::<ViewportUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("contour viewport bind group"),
            layout: bgl,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: viewport_ubo.as_entire_binding(),
            }],
        });
        self.viewport_ubo = Some(viewport_ubo);
        self.viewport_bind_group = Some(bind_group);
    }

    fn write_viewport_uniform(&self, ctx: &RenderCtx<'_>) {
        let Some(ubo) = self.viewport_ubo.as_ref() else { return; };
        let uniform =
            ViewportUniform { viewport: [ctx.viewport.width, ctx.viewport.height], _pad: [0.0; 2] };
        ctx.queue.write_buffer(ubo, 0, bytemuck::bytes_of(&uniform));
    }

    fn upload_geometry(&mut self, ctx: &RenderCtx<'_>, frame: &FramePass) {
        let vertices = frame.vertices();
        if vertices.is_empty() {
            return;
        }

        // Buffer writes must be a multiple of four bytes.
        self.index_scratch.clear();
        self.index_scratch.extend_from_slice(frame.indices());
        if self.index_scratch.len() % 2 == 1 {
            self.index_scratch.push(0);
        }

        ensure_capacity(
            ctx,
            &mut self.vbo,
            &mut self.vbo_capacity,
            vertices.len() as u64,
            wgpu::BufferUsages::VERTEX,
            "contour node vbo",
        );
        let index_bytes: &[u8] = bytemuck::cast_slice(&self.index_scratch);
        ensure_capacity(
            ctx,
            &mut self.ibo,
            &mut self.ibo_capacity,
            index_bytes.len() as u64,
            wgpu::BufferUsages::INDEX,
            "contour node ibo",
        );

        if let Some(vbo) = self.vbo.as_ref() {
            ctx.queue.write_buffer(vbo, 0, vertices);
        }
        if let Some(ibo) = self.ibo.as_ref() {
            ctx.queue.write_buffer(ibo, 0, index_bytes);
        }
    }

    /// Texture bind group of `batch`, `Ok(None)` for untextured batches and
    /// `Err(id)` when a texture has no live view.
    fn texture_bind_group(
        &mut self,
        ctx: &RenderCtx<'_>,
        textures: &WgpuTextureBackend,
        batch: &DrawBatch,
    ) -> Result<Option<wgpu::BindGroup>, TextureId> {
        if self.texture_layout(batch.layout).is_none() {
            return Ok(None);
        }
        let count = if batch.layout == VertexLayout::Frame { 2 } else { 1 };

        let mut ids = [None; 2];
        for (id, slot) in ids.iter_mut().zip(batch.material.textures.iter().take(count)) {
            *id = Some(slot.ok_or(TextureId::new(0))?);
        }
        let Some(outer) = ids[0] else {
            return Err(TextureId::new(0));
        };
        let binding = (outer, ids[1]);
        if let Some(cached) = self.texture_bind_groups.get(&binding) {
            return Ok(Some(cached.bind_group.clone()));
        }

        let mut views = Vec::with_capacity(count);
        let mut generations = [None; 2];
        for (i, id) in ids.iter().take(count).flatten().enumerate() {
            views.push(textures.view(*id).ok_or(*id)?);
            generations[i] = textures.generation(*id);
        }
        let Some(layout) = self.texture_layout(batch.layout) else {
            return Ok(None);
        };

        let mut entries: Vec<wgpu::BindGroupEntry<'_>> = views
            .iter()
            .enumerate()
            .map(|(i, view)| wgpu::BindGroupEntry {
                binding: i as u32,
                resource: wgpu::BindingResource::TextureView(view),
            })
            .collect();
        entries.push(wgpu::BindGroupEntry {
            binding: count as u32,
            resource: wgpu::BindingResource::Sampler(textures.sampler()),
        });

        let bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("contour texture bind group"),
            layout,
            entries: &entries,
        });
        log::trace!("texture bind group built for {binding:?}");
        self.texture_bind_groups
            .insert(binding, CachedBindGroup { generations, bind_group: bind_group.clone() });
        Ok(Some(bind_group))
    }
}

fn ensure_capacity(
    ctx: &RenderCtx<'_>,
    buffer: &mut Option<wgpu::Buffer>,
    capacity: &mut u64,
    required: u64,
    usage: wgpu::BufferUsages,
    label: &'static str,
) {
    if required <= *capacity && buffer.is_some() {
        return;
    }
    let new_cap = required.next_power_of_two().max(4096);
    *buffer = Some(ctx.device.create_buffer(&wgpu::BufferDescriptor {
        label: Some(label),
        size: new_cap,
        usage: usage | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    }));
    *capacity = new_cap;
}

// ── blend state ───────────────────────────────────────────────────────────

fn premul_alpha_blend() -> wgpu::BlendState {
    wgpu::BlendState {
        color: wgpu::BlendComponent {
            src_factor: wgpu::BlendFactor::One,
            dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
            operation: wgpu::BlendOperation::Add,
        },
        alpha: wgpu::BlendComponent {
            src_factor: wgpu::BlendFactor::One,
            dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
            operation: wgpu::BlendOperation::Add,
        },
    }
}

// ── GPU types ─────────────────────────────────────────────────────────────

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct ViewportUniform {
    viewport: [f32; 2],
    _pad: [f32; 2], // 16-byte alignment
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::coords::{Size, Viewport};
    use crate::device::{HeadlessGpu, HeadlessInit};
    use crate::logging::{init_logging, LoggingConfig};
    use crate::node::{FillCenterNode, FillCornersNode, NodeParams, ShadowParams};
    use crate::paint::Rgba;
    use crate::raster::ShapeType;
    use crate::scene::NodeRef;
    use crate::texture::ContextRegistry;

    fn gpu() -> Option<HeadlessGpu> {
        init_logging(LoggingConfig::for_tests());
        match HeadlessGpu::blocking(HeadlessInit::default()) {
            Ok(gpu) => Some(gpu),
            Err(e) => {
                eprintln!("skipping GPU test: {e:#}");
                None
            }
        }
    }

    fn pixel(rgba: &[u8], width: u32, x: u32, y: u32) -> [u8; 4] {
        let i = ((y * width + x) * 4) as usize;
        [rgba[i], rgba[i + 1], rgba[i + 2], rgba[i + 3]]
    }

    // ── rendering ─────────────────────────────────────────────────────────

    #[test]
    fn filled_shape_covers_center_and_leaves_corners_clear() {
        let Some(gpu) = gpu() else { return };
        let backend = Rc::new(WgpuTextureBackend::new(gpu.device(), gpu.queue()));
        let registry = ContextRegistry::new(backend.clone());

        let size = Size::new(64.0, 64.0);
        let mut corners = FillCornersNode::new(&registry, NodeParams::default());
        corners.update(size, ShapeType::Circle, 16.0, Rgba::WHITE);
        let mut center = FillCenterNode::new(&registry, NodeParams::default());
        center.update(size, ShapeType::Circle, 16.0, Rgba::WHITE, &ShadowParams::NONE);

        let mut pass = FramePass::new();
        pass.run(&mut [NodeRef::new(&mut corners), NodeRef::new(&mut center)]);
        assert_eq!(pass.batches().len(), 2);

        let mut renderer = NodeRenderer::new(NodeRendererConfig {
            clear_color: Some(Color::transparent()),
        });
        let viewport = Viewport::new(64.0, 64.0);
        let ctx = RenderCtx::headless(&gpu, viewport);
        let rgba = gpu
            .render_to_rgba(64, 64, |encoder, view| {
                let mut target = RenderTarget::new(encoder, view);
                renderer.render(&ctx, &mut target, &backend, &pass);
            })
            .unwrap();

        assert_eq!(pixel(&rgba, 64, 32, 32), [255, 255, 255, 255]);
        assert_eq!(pixel(&rgba, 64, 32, 2)[3], 255);
        assert!(pixel(&rgba, 64, 0, 0)[3] < 32);
    }

    #[test]
    fn texture_bind_groups_are_reused_until_the_texture_changes() {
        use crate::raster::TextureFormat;
        use crate::texture::TextureBackend;

        let Some(gpu) = gpu() else { return };
        let backend = Rc::new(WgpuTextureBackend::new(gpu.device(), gpu.queue()));
        let registry = ContextRegistry::new(backend.clone());
        let mut corners = FillCornersNode::new(&registry, NodeParams::default());
        corners.update(Size::new(64.0, 64.0), ShapeType::Squircle, 12.0, Rgba::WHITE);

        let mut pass = FramePass::new();
        pass.run(&mut [NodeRef::new(&mut corners)]);
        let Some(id) = pass.batches()[0].material.textures[0] else {
            panic!("corner batch without a texture");
        };

        let mut renderer = NodeRenderer::new(NodeRendererConfig {
            clear_color: Some(Color::transparent()),
        });
        let ctx = RenderCtx::headless(&gpu, Viewport::new(64.0, 64.0));
        let frame = |renderer: &mut NodeRenderer, pass: &FramePass| {
            gpu.render_to_rgba(64, 64, |encoder, view| {
                let mut target = RenderTarget::new(encoder, view);
                renderer.render(&ctx, &mut target, &backend, pass);
            })
            .unwrap();
        };

        frame(&mut renderer, &pass);
        let first = backend.generation(id);
        assert_eq!(renderer.texture_bind_groups.len(), 1);
        frame(&mut renderer, &pass);
        assert_eq!(renderer.texture_bind_groups.len(), 1);
        assert_eq!(renderer.texture_bind_groups[&(id, None)].generations[0], first);

        backend.resize_texture(id, TextureFormat::R8, 64).unwrap();
        assert_ne!(backend.generation(id), first);
        frame(&mut renderer, &pass);
        assert_eq!(
            renderer.texture_bind_groups[&(id, None)].generations[0],
            backend.generation(id)
        );

        drop(corners);
        frame(&mut renderer, &FramePass::new());
        assert!(renderer.texture_bind_groups.is_empty());
    }

    #[test]
    fn empty_pass_only_clears() {
        let Some(gpu) = gpu() else { return };
        let backend = WgpuTextureBackend::new(gpu.device(), gpu.queue());
        let pass = FramePass::new();
        let mut renderer = NodeRenderer::new(NodeRendererConfig {
            clear_color: Some(Color::from_straight(1.0, 0.0, 0.0, 1.0)),
        });
        let viewport = Viewport::new(8.0, 8.0);
        let ctx = RenderCtx::headless(&gpu, viewport);
        let rgba = gpu
            .render_to_rgba(8, 8, |encoder, view| {
                let mut target = RenderTarget::new(encoder, view);
                renderer.render(&ctx, &mut target, &backend, &pass);
            })
            .unwrap();
        assert_eq!(pixel(&rgba, 8, 4, 4), [255, 0, 0, 255]);
        assert!(renderer.pipelines.is_empty());
    }
}
