//! Byte-order inversion for fixed-width sample words

use num_traits::PrimInt;

/// Reverse the byte order of a fixed-width integer
///
/// Bytes are exchanged pairwise from both ends towards the middle, so
/// applying the function twice returns the original value.
#[inline]
pub fn flip_endianness<T: PrimInt>(word: T) -> T {
    word.swap_bytes()
}

/// Convert a host-order word to the requested order
#[inline]
pub fn to_device_order<T: PrimInt>(word: T, swap: bool) -> T {
    if swap {
        flip_endianness(word)
    } else {
        word
    }
}
