use std::fmt;

/// Errors raised by the rasterizers, the texture cache and the nodes.
///
/// Parameter errors are programmer errors: items clamp every property before
/// it reaches a node, so an `InvalidParameter` means a caller bypassed that
/// layer. Resource errors make the affected node skip its draw.
#[derive(Debug, Clone, PartialEq)]
pub enum ShapeError {
    /// A radius, shadow size or thickness outside the representable range.
    InvalidParameter {
        what: &'static str,
        value: u32,
        max: u32,
    },
    /// The backend refused to allocate a texture of this side length.
    TextureCreationFailed { size: u32, max: u32 },
    /// The backend ran out of memory while allocating or uploading.
    OutOfGpuMemory,
    /// The owning context was destroyed; no texture can be acquired anymore.
    ContextDestroyed,
}

impl ShapeError {
    #[inline]
    pub(crate) fn invalid(what: &'static str, value: u32, max: u32) -> Self {
        Self::InvalidParameter { what, value, max }
    }

    /// `true` for failures caused by GPU resources rather than by arguments.
    #[inline]
    pub fn is_resource_error(&self) -> bool {
        matches!(
            self,
            Self::TextureCreationFailed { .. } | Self::OutOfGpuMemory | Self::ContextDestroyed
        )
    }
}

impl fmt::Display for ShapeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidParameter { what, value, max } => {
                write!(f, "invalid {what}: {value} (max {max})")
            }
            Self::TextureCreationFailed { size, max } => {
                write!(f, "texture creation failed: {size}x{size} exceeds {max}x{max}")
            }
            Self::OutOfGpuMemory => write!(f, "out of GPU memory"),
            Self::ContextDestroyed => write!(f, "render context destroyed"),
        }
    }
}

impl std::error::Error for ShapeError {}
