//! Word-aligned bit scanning over byte slices.
//!
//! Both primitives treat the slice as a bit string where bit 0 is the most
//! significant bit of byte 0. They handle the unaligned head byte by byte,
//! the bulk of the data in machine words and the leftover tail byte by byte
//! again. Words are assembled from bounds-checked byte chunks, so the
//! alignment only affects speed, never correctness.

/// Number of set bits for every possible byte value.
pub(crate) static BITS_IN_BYTE: [u8; 256] = bits_in_byte_table();

const fn bits_in_byte_table() -> [u8; 256] {
    let mut table = [0u8; 256];
    let mut i = 1;
    while i < 256 {
        table[i] = (i & 1) as u8 + table[i >> 1];
        i += 1;
    }
    table
}

/// Words reduced per SWAR step in [`popcount`].
const SWAR_WORDS: usize = 3;
const SWAR_CHUNK: usize = SWAR_WORDS * size_of::<u64>();

// Per-byte partial sums of one chunk are folded with a single multiply, so
// they must fit in a byte.
const _: () = assert!(SWAR_CHUNK * 8 < 256);

const WORD: usize = size_of::<usize>();

/// Counts the set bits in `bytes`.
///
/// Leading bytes are counted through a lookup table until the cursor sits on
/// a `u64` boundary, then the data is consumed in chunks of three words using
/// a SWAR reduction, and the remainder goes through the table again.
///
/// # Examples
/// ```
/// use bitmap_string::popcount;
///
/// assert_eq!(popcount(&[]), 0);
/// assert_eq!(popcount(&[0xFF, 0x01, 0x80]), 10);
/// ```
pub fn popcount(bytes: &[u8]) -> u64 {
    let head_len = bytes
        .as_ptr()
        .align_offset(align_of::<u64>())
        .min(bytes.len());
    let (head, body) = bytes.split_at(head_len);

    let mut bits = count_bytes(head);
    let mut chunks = body.chunks_exact(SWAR_CHUNK);
    for chunk in &mut chunks {
        let mut lanes = 0u64;
        for word in chunk.chunks_exact(size_of::<u64>()) {
            lanes += byte_sums(u64::from_ne_bytes(load(word)));
        }
        bits += lanes.wrapping_mul(0x0101_0101_0101_0101) >> 56;
    }
    bits + count_bytes(chunks.remainder())
}

#[inline]
fn count_bytes(bytes: &[u8]) -> u64 {
    bytes
        .iter()
        .map(|&b| u64::from(BITS_IN_BYTE[b as usize]))
        .sum()
}

/// Leaves the population count of every byte of `w` in that byte.
#[inline]
const fn byte_sums(mut w: u64) -> u64 {
    w -= (w >> 1) & 0x5555_5555_5555_5555;
    w = (w & 0x3333_3333_3333_3333) + ((w >> 2) & 0x3333_3333_3333_3333);
    (w + (w >> 4)) & 0x0F0F_0F0F_0F0F_0F0F
}

#[inline]
fn load<const N: usize>(chunk: &[u8]) -> [u8; N] {
    let mut buf = [0u8; N];
    buf.copy_from_slice(chunk);
    buf
}

/// Returns the position of the first bit equal to `bit` in `bytes`.
///
/// The slice is considered zero padded on the right: a search for a clear bit
/// over data that is all ones returns `bytes.len() * 8`, the first padding
/// bit. A search for a set bit returns `None` when there is none.
///
/// # Examples
/// ```
/// use bitmap_string::bitpos;
///
/// assert_eq!(bitpos(&[0x00, 0x10], true), Some(11));
/// assert_eq!(bitpos(&[0x00, 0x00], true), None);
/// assert_eq!(bitpos(&[0xFF, 0xFF], false), Some(16));
/// ```
pub fn bitpos(bytes: &[u8], bit: bool) -> Option<u64> {
    let skip_byte = if bit { 0 } else { u8::MAX };
    let head_len = bytes
        .as_ptr()
        .align_offset(align_of::<usize>())
        .min(bytes.len());

    let (mut pos, mut rest) = match bytes[..head_len].iter().position(|&b| b != skip_byte) {
        Some(idx) => (idx as u64 * 8, &bytes[idx..]),
        None => (head_len as u64 * 8, &bytes[head_len..]),
    };

    if pos == head_len as u64 * 8 {
        let skip_word = if bit { 0 } else { usize::MAX };
        while rest.len() >= WORD {
            let (word, tail) = rest.split_at(WORD);
            if usize::from_ne_bytes(load(word)) != skip_word {
                break;
            }
            rest = tail;
            pos += usize::BITS as u64;
        }
    }

    // Big endian so that the first byte lands in the most significant bits.
    let take = rest.len().min(WORD);
    let mut scratch = [0u8; WORD];
    scratch[..take].copy_from_slice(&rest[..take]);
    let word = usize::from_be_bytes(scratch);

    if bit && word == 0 {
        return None;
    }

    let candidates = if bit { word } else { !word };
    if candidates == 0 {
        tracing::error!(
            pos,
            bit,
            "bit scan exhausted its scratch word without a match"
        );
        debug_assert!(false, "bit scan exhausted its scratch word without a match");
        return None;
    }
    Some(pos + u64::from(candidates.leading_zeros()))
}
