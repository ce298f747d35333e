//! bit-field helpers shared by the branch decoders.
//!
//! field positions follow the manual's numbering: bit 0 is the least significant bit of the
//! instruction word, and a field is named by its lowest bit and width.

/// the `width`-bit unsigned field starting at bit `low` of `word`.
///
/// `low + width` must not exceed 32; the field never reads past bit 31.
#[inline]
pub fn extract(word: u32, low: u8, width: u8) -> u32 {
    debug_assert!(low as u32 + width as u32 <= 32);
    if width == 0 {
        return 0;
    }
    (word >> low) & (u32::MAX >> (32 - width))
}

#[inline]
pub fn test_bit(word: u32, n: u8) -> bool {
    debug_assert!(n < 32);
    (word >> n) & 1 == 1
}

/// sign-extend the low `width` bits of `value` to 64 bits, then scale by `1 << shift`.
///
/// both [`sign_extend`] and [`corrected_sign`] bottom out here, so pc-relative offsets decode the
/// same no matter which of the two call patterns a decoder uses.
#[inline]
pub fn sign_extend_scaled(value: u64, width: u8, shift: u8) -> i64 {
    debug_assert!(width > 0 && width <= 64);
    debug_assert!(shift < 64);
    let unused = 64 - width as u32;
    let extended = ((value << unused) as i64) >> unused;
    extended.wrapping_shl(shift as u32)
}

/// treat bit `from - 1` of `value` as a sign bit and replicate it up to `to` bits.
///
/// the result is an `i64` holding a value representable in `to` bits. callers pass fields that
/// have already been scaled by the instruction alignment, e.g. `imm19 << 2` with `from = 21`.
#[inline]
pub fn sign_extend(value: u64, from: u8, to: u8) -> i64 {
    debug_assert!(from <= to && to <= 64);
    sign_extend_scaled(value, from, 0)
}

/// sign-extend a raw `width`-bit immediate field to 64 bits. the caller applies the `* 4`
/// instruction-size scaling afterward.
#[inline]
pub fn corrected_sign(value: u64, width: u8) -> i64 {
    sign_extend_scaled(value, width, 0)
}
