/// Side lengths of shape textures are rounded up to this many texels.
pub const TEXTURE_ROUNDING: u32 = 32;

/// Largest radius or shadow size a texture key can encode (12 bits).
pub const MAX_KEY_VALUE: u32 = 4095;

/// L1 data cache line size assumed when laying out working buffers.
pub const CACHE_LINE_SIZE: usize = 64;

#[inline]
pub const fn is_power_of_two(n: usize) -> bool {
    n != 0 && (n & (n - 1)) == 0
}

/// Rounds `value` up to the next multiple of `alignment`.
///
/// # Panics
/// Panics if `alignment` is not a power of two.
#[inline]
pub fn round_up(value: u32, alignment: u32) -> u32 {
    assert!(is_power_of_two(alignment as usize), "alignment {alignment} is not a power of two");
    (value + alignment - 1) & !(alignment - 1)
}

/// Stride, in elements, of a row of `width` elements of `elem_size` bytes so
/// that every row starts on an `alignment`-byte boundary relative to the
/// start of the buffer.
///
/// # Panics
/// Panics if `elem_size` or `alignment` is not a power of two.
#[inline]
pub fn stride(width: usize, elem_size: usize, alignment: usize) -> usize {
    assert!(is_power_of_two(elem_size), "element size {elem_size} is not a power of two");
    assert!(is_power_of_two(alignment), "alignment {alignment} is not a power of two");
    let bytes = (width * elem_size + alignment - 1) & !(alignment - 1);
    bytes.div_ceil(elem_size)
}

/// Row stride for float working buffers: each row covers whole cache lines.
#[inline]
pub fn cache_aligned_stride(width: usize, elem_size: usize) -> usize {
    stride(width, elem_size, CACHE_LINE_SIZE)
}
