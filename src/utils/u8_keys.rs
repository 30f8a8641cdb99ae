//! Searches over the sorted key-byte arrays backing the keyed node
//! encodings. The 16-wide variant gets an SSE2 path on x86_64; everything
//! else binary-searches, which for these widths is already branch-cheap.

#[cfg(all(target_arch = "x86_64", target_feature = "sse2"))]
#[inline]
fn x86_64_sse_find_key_16(key: u8, keys: &[u8; 16], num_children: usize) -> Option<usize> {
    use std::arch::x86_64::{
        __m128i, _mm_cmpeq_epi8, _mm_loadu_si128, _mm_movemask_epi8, _mm_set1_epi8,
    };

    let bitfield = unsafe {
        let key_vec = _mm_set1_epi8(key as i8);
        let results = _mm_cmpeq_epi8(key_vec, _mm_loadu_si128(keys.as_ptr() as *const __m128i));
        let mask = (1i32 << num_children) - 1;
        _mm_movemask_epi8(results) & mask
    };
    if bitfield != 0 {
        return Some(bitfield.trailing_zeros() as usize);
    }
    None
}

/// Position of `key` in the first `num_children` entries of a sorted key
/// array, if present.
#[inline]
pub(crate) fn find_key_position_sorted<const WIDTH: usize>(
    key: u8,
    keys: &[u8; WIDTH],
    num_children: usize,
) -> Option<usize> {
    #[cfg(all(target_arch = "x86_64", target_feature = "sse2"))]
    if WIDTH == 16 {
        let keys16: &[u8; 16] = keys[..16].try_into().unwrap();
        return x86_64_sse_find_key_16(key, keys16, num_children);
    }

    keys[..num_children].binary_search(&key).ok()
}

/// Position at which `key` keeps the first `num_children` entries sorted.
#[inline]
pub(crate) fn find_insert_position_sorted<const WIDTH: usize>(
    key: u8,
    keys: &[u8; WIDTH],
    num_children: usize,
) -> usize {
    keys[..num_children].partition_point(|&k| k < key)
}

/// Position of the first entry `>= key`, if any. Drives restartable
/// ascending child iteration.
#[inline]
pub(crate) fn find_position_at_or_after<const WIDTH: usize>(
    key: u8,
    keys: &[u8; WIDTH],
    num_children: usize,
) -> Option<usize> {
    let pos = keys[..num_children].partition_point(|&k| k < key);
    (pos < num_children).then_some(pos)
}
