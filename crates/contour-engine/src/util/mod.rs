//! Small numeric helpers shared by the rasterizers, the texture cache and the
//! shape items: alignment rounding, buffer strides and fixed-point
//! quantization of item properties.

mod math;
mod quantize;

pub use math::{
    cache_aligned_stride, is_power_of_two, round_up, stride, CACHE_LINE_SIZE, MAX_KEY_VALUE,
    TEXTURE_ROUNDING,
};
pub use quantize::{quantize_u16, quantize_u16_clamped, unquantize_u16, QUANTIZED_U16_MAX};
