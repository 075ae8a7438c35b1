//! `contour-texdump`: inspect shape textures and render test scenes offscreen.

use std::path::{Path, PathBuf};
use std::rc::Rc;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use contour_engine::coords::{Size, Vec2, Viewport};
use contour_engine::device::{HeadlessGpu, HeadlessInit};
use contour_engine::logging::{init_logging, LoggingConfig};
use contour_engine::paint::Rgba;
use contour_engine::raster::{
    render_mask_texture, render_shadow_texture, ShapeType, TextureImage, INNER_CHANNEL,
    OUTER_CHANNEL,
};
use contour_engine::render::{NodeRenderer, NodeRendererConfig, RenderCtx, RenderTarget};
use contour_engine::scene::FramePass;
use contour_engine::texture::{ContextRegistry, WgpuTextureBackend};
use contour_ui::{Shape, ShapePaintNode};

#[derive(Parser, Debug)]
#[command(name = "contour-texdump")]
#[command(about = "Inspect shape textures and render test scenes offscreen")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write a corner mask texture as a grayscale PNG
    Mask {
        #[command(flatten)]
        texture: MaskArgs,
        out: PathBuf,
    },

    /// Write one channel of a shadow texture as a grayscale PNG
    Shadow {
        #[command(flatten)]
        texture: ShadowArgs,
        out: PathBuf,
    },

    /// Print a texture channel as hex rows
    Hex {
        #[command(subcommand)]
        texture: HexTexture,
    },

    /// Render a few shapes offscreen and write the result as a PNG
    Scene {
        out: PathBuf,

        /// Device pixel ratio
        #[arg(long, default_value_t = 1.0, value_parser = parse_scale)]
        scale: f32,
    },
}

#[derive(Subcommand, Debug)]
enum HexTexture {
    Mask(MaskArgs),
    Shadow(ShadowArgs),
}

#[derive(Args, Debug)]
struct MaskArgs {
    /// squircle or circle
    #[arg(value_parser = parse_shape)]
    shape: ShapeType,
    radius: u32,
}

#[derive(Args, Debug)]
struct ShadowArgs {
    /// squircle or circle
    #[arg(value_parser = parse_shape)]
    shape: ShapeType,
    radius: u32,
    shadow: u32,

    #[arg(long, value_enum, default_value_t = Channel::Outer)]
    channel: Channel,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Channel {
    Outer,
    Inner,
}

impl Channel {
    fn index(self) -> usize {
        match self {
            Channel::Outer => OUTER_CHANNEL,
            Channel::Inner => INNER_CHANNEL,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Texture {
    Mask { shape: ShapeType, radius: u32 },
    Shadow { shape: ShapeType, radius: u32, shadow: u32, channel: usize },
}

impl From<&MaskArgs> for Texture {
    fn from(args: &MaskArgs) -> Self {
        Texture::Mask { shape: args.shape, radius: args.radius }
    }
}

impl From<&ShadowArgs> for Texture {
    fn from(args: &ShadowArgs) -> Self {
        Texture::Shadow {
            shape: args.shape,
            radius: args.radius,
            shadow: args.shadow,
            channel: args.channel.index(),
        }
    }
}

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    match Cli::parse().command {
        Commands::Mask { texture, out } => write_png(&Texture::from(&texture), &out),
        Commands::Shadow { texture, out } => write_png(&Texture::from(&texture), &out),
        Commands::Hex { texture: HexTexture::Mask(texture) } => {
            print_hex(&Texture::from(&texture))
        }
        Commands::Hex { texture: HexTexture::Shadow(texture) } => {
            print_hex(&Texture::from(&texture))
        }
        Commands::Scene { out, scale } => render_scene(&out, scale),
    }
}

fn parse_shape(name: &str) -> Result<ShapeType, String> {
    ShapeType::parse(name)
        .ok_or_else(|| format!("unknown shape `{name}` (expected squircle or circle)"))
}

fn parse_scale(value: &str) -> Result<f32, String> {
    let scale: f32 = value.parse().map_err(|_| format!("invalid scale `{value}`"))?;
    if !(scale.is_finite() && scale > 0.0) {
        return Err(format!("scale must be positive, got {scale}"));
    }
    Ok(scale)
}

// ── textures ──────────────────────────────────────────────────────────────

/// Rasterizes `texture` and returns its side plus one 8-bit plane.
fn rasterize(texture: &Texture) -> Result<(u32, Vec<u8>)> {
    let (image, channel): (TextureImage, usize) = match *texture {
        Texture::Mask { shape, radius } => {
            (render_mask_texture(shape, radius).context("mask rasterization failed")?, 0)
        }
        Texture::Shadow { shape, radius, shadow, channel } => (
            render_shadow_texture(shape, radius, shadow).context("shadow rasterization failed")?,
            channel,
        ),
    };
    log::info!("{texture:?}: {0}x{0} {1:?}", image.size(), image.format());
    Ok((image.size(), image.channel(channel)))
}

fn write_png(texture: &Texture, out: &Path) -> Result<()> {
    let (size, plane) = rasterize(texture)?;
    let image = image::GrayImage::from_raw(size, size, plane)
        .context("texture plane does not match its size")?;
    image.save(out).with_context(|| format!("failed to write {}", out.display()))?;
    println!("{}: {size}x{size}", out.display());
    Ok(())
}

fn print_hex(texture: &Texture) -> Result<()> {
    let (size, plane) = rasterize(texture)?;
    for row in plane.chunks_exact(size as usize) {
        let line: Vec<String> = row.iter().map(|v| format!("{v:02x}")).collect();
        println!("{}", line.join(" "));
    }
    Ok(())
}

// ── scene ─────────────────────────────────────────────────────────────────

const SCENE_WIDTH: u32 = 400;
const SCENE_HEIGHT: u32 = 320;

fn scene_items(scale: f32) -> Vec<(Vec2, Shape)> {
    let mut card = Shape::new();
    card.set_size(Size::new(160.0, 96.0));
    card.set_radius(24.0);
    card.set_color(Rgba::new(52, 120, 246, 255));
    card.set_drop_shadow_size(12.0);
    card.set_drop_shadow_angle(90.0);
    card.set_drop_shadow_distance(4.0);
    card.set_drop_shadow_color(Rgba::new(0, 0, 0, 110));

    let mut badge = Shape::new();
    badge.set_shape(ShapeType::Circle);
    badge.set_size(Size::new(96.0, 96.0));
    badge.set_radius(48.0);
    badge.set_color(Rgba::WHITE);
    badge.set_frame_thickness(4.0);
    badge.set_frame_color(Rgba::new(255, 140, 0, 255));

    let mut well = Shape::new();
    well.set_size(Size::new(336.0, 96.0));
    well.set_radius(16.0);
    well.set_color(Rgba::new(228, 228, 232, 255));
    well.set_inner_shadow_size(10.0);
    well.set_inner_shadow_angle(90.0);
    well.set_inner_shadow_distance(3.0);
    well.set_inner_shadow_color(Rgba::new(0, 0, 0, 140));

    let mut items = vec![
        (Vec2::new(32.0, 32.0), card),
        (Vec2::new(256.0, 32.0), badge),
        (Vec2::new(32.0, 192.0), well),
    ];
    for (_, shape) in &mut items {
        shape.set_device_pixel_ratio(scale);
    }
    items
}

fn render_scene(out: &Path, scale: f32) -> Result<()> {
    let gpu = HeadlessGpu::blocking(HeadlessInit::default())
        .context("the scene command needs a GPU adapter")?;
    let backend = Rc::new(WgpuTextureBackend::new(gpu.device(), gpu.queue()));
    let registry = ContextRegistry::new(backend.clone());

    let mut items = scene_items(scale);
    let mut paints: Vec<Option<ShapePaintNode>> = items
        .iter_mut()
        .map(|(_, shape)| shape.update_paint_node(&registry, None))
        .collect();

    let mut pass = FramePass::new();
    let mut nodes = Vec::new();
    for ((origin, _), paint) in items.iter().zip(paints.iter_mut()) {
        if let Some(paint) = paint {
            paint.push_nodes(*origin, &mut nodes);
        }
    }
    pass.run(&mut nodes);
    drop(nodes);
    let stats = pass.stats();
    log::info!("scene: {} nodes, {} drawn in {} batches", stats.nodes, stats.drawn, stats.batches);
    if stats.failed > 0 {
        bail!("{} nodes failed to acquire their textures", stats.failed);
    }

    let mut renderer = NodeRenderer::new(NodeRendererConfig {
        clear_color: Some(Rgba::new(245, 245, 247, 255).pack_premul().unpack()),
    });
    let viewport = Viewport::new(SCENE_WIDTH as f32, SCENE_HEIGHT as f32).with_scale(scale);
    let (width, height) = viewport.physical_size();
    let ctx = RenderCtx::headless(&gpu, viewport);
    let pixels = gpu.render_to_rgba(width, height, |encoder, view| {
        let mut target = RenderTarget::new(encoder, view);
        renderer.render(&ctx, &mut target, &backend, &pass);
    })?;

    let image = image::RgbaImage::from_raw(width, height, pixels)
        .context("readback does not match the target size")?;
    image.save(out).with_context(|| format!("failed to write {}", out.display()))?;
    println!("{}: {width}x{height}, {} batches", out.display(), stats.batches);
    Ok(())
}
