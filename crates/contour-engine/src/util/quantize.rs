/// Upper bound of the range mapped onto the full `u16` range.
pub const QUANTIZED_U16_MAX: f64 = 4096.0;

const U16_MAX: f64 = u16::MAX as f64;

/// Quantizes a value already known to be in `[0, QUANTIZED_U16_MAX]`.
///
/// # Panics
/// Panics if `value` is outside the range (or NaN).
#[inline]
pub fn quantize_u16_clamped(value: f64) -> u16 {
    assert!(
        (0.0..=QUANTIZED_U16_MAX).contains(&value),
        "value {value} outside the quantization range [0, {QUANTIZED_U16_MAX}]"
    );
    (value * (U16_MAX / QUANTIZED_U16_MAX) + 0.5) as u16
}

/// Clamps `value` into `[0, QUANTIZED_U16_MAX]` and quantizes it.
///
/// NaN maps to 0.
#[inline]
pub fn quantize_u16(value: f64) -> u16 {
    let value = if value.is_nan() { 0.0 } else { value.clamp(0.0, QUANTIZED_U16_MAX) };
    quantize_u16_clamped(value)
}

#[inline]
pub fn unquantize_u16(value: u16) -> f64 {
    value as f64 * (QUANTIZED_U16_MAX / U16_MAX)
}
