use core::ops::RangeInclusive;

use crate::error::{Error, Result};
use crate::scan::{bitpos, popcount};

/// Byte index and in-byte shift of a bit offset. Bit 0 is the most
/// significant bit of byte 0.
#[inline]
const fn idxs(offset: u32) -> (usize, u32) {
    ((offset >> 3) as usize, 7 - (offset & 7))
}

/// Returns the bit at `offset`, reading bits past the payload as zero.
///
/// # Examples
/// ```
/// use bitmap_string::get_bit;
///
/// assert!(get_bit(&[0x40], 1));
/// assert!(!get_bit(&[0x40], 0));
/// assert!(!get_bit(&[0xFF], 8));
/// ```
#[inline]
pub fn get_bit(payload: &[u8], offset: u32) -> bool {
    let (byte, shift) = idxs(offset);
    payload.get(byte).is_some_and(|b| b & (1 << shift) != 0)
}

/// Sets the bit at `offset` to `bit` and returns its previous value.
///
/// Exactly one byte of `payload` changes. The payload is never grown.
///
/// # Errors
/// Returns [`Error::OffsetOutOfRange`] if `offset` addresses a byte past the
/// end of `payload`, leaving it untouched.
///
/// # Examples
/// ```
/// use bitmap_string::write_bit;
///
/// let mut payload = [0x00];
/// assert_eq!(write_bit(&mut payload, 7, true).unwrap(), false);
/// assert_eq!(payload, [0x01]);
/// assert!(write_bit(&mut payload, 8, true).is_err());
/// ```
pub fn write_bit(payload: &mut [u8], offset: u32, bit: bool) -> Result<bool> {
    let (byte, shift) = idxs(offset);
    let payload_len = payload.len();
    let Some(slot) = payload.get_mut(byte) else {
        return Err(Error::OffsetOutOfRange {
            offset,
            payload_len,
        });
    };
    let old = *slot & (1 << shift) != 0;
    *slot &= !(1 << shift);
    *slot |= u8::from(bit) << shift;
    Ok(old)
}

/// Resolves a Redis style inclusive byte range against a payload of `len`
/// bytes.
///
/// Negative bounds count from the end. Afterwards `start` is clamped to zero
/// and `stop` to the last byte. Returns `None` if the range is empty.
///
/// # Examples
/// ```
/// use bitmap_string::normalize_range;
///
/// assert_eq!(normalize_range(10, 0, -1), Some(0..=9));
/// assert_eq!(normalize_range(10, -3, 100), Some(7..=9));
/// assert_eq!(normalize_range(10, 5, 2), None);
/// assert_eq!(normalize_range(0, 0, -1), None);
/// ```
pub fn normalize_range(len: usize, start: i64, stop: i64) -> Option<RangeInclusive<usize>> {
    let len = i64::try_from(len).unwrap_or(i64::MAX);
    let resolve = |bound: i64| {
        if bound < 0 {
            len.saturating_add(bound)
        } else {
            bound
        }
    };
    let start = resolve(start).max(0);
    let mut stop = resolve(stop).max(0);
    if stop >= len {
        stop = len - 1;
    }
    (start <= stop).then_some(start as usize..=stop as usize)
}

/// Counts the set bits in the inclusive byte range `start..=stop`.
///
/// A range whose bounds are both negative with `start > stop` counts zero
/// before any normalization takes place. Otherwise the range is normalized
/// with [`normalize_range`] and an empty range counts zero.
///
/// # Examples
/// ```
/// use bitmap_string::bit_count;
///
/// let payload = [0xFF, 0xF0, 0x00];
/// assert_eq!(bit_count(&payload, 0, -1), 12);
/// assert_eq!(bit_count(&payload, 1, 1), 4);
/// assert_eq!(bit_count(&payload, -1, -5), 0);
/// ```
pub fn bit_count(payload: &[u8], start: i64, stop: i64) -> u64 {
    if start < 0 && stop < 0 && start > stop {
        return 0;
    }
    match normalize_range(payload.len(), start, stop) {
        Some(range) => popcount(&payload[range]),
        None => 0,
    }
}

/// Returns the position of the first bit equal to `bit` inside the inclusive
/// byte range `start..=stop`, or `-1`.
///
/// Positions are bit offsets from the start of the payload. A search for a
/// clear bit without an explicit `stop` (`stop_given == false`) treats the
/// payload as zero padded and may return the first bit past the range. With
/// an explicit `stop` that padding bit does not count and `-1` is returned.
///
/// # Examples
/// ```
/// use bitmap_string::bit_pos;
///
/// let payload = [0xFF, 0xFF];
/// assert_eq!(bit_pos(&payload, false, 0, -1, false), 16);
/// assert_eq!(bit_pos(&payload, false, 0, -1, true), -1);
/// assert_eq!(bit_pos(&[0x00, 0x01], true, 1, -1, false), 15);
/// ```
pub fn bit_pos(payload: &[u8], bit: bool, start: i64, stop: i64, stop_given: bool) -> i64 {
    let Some(range) = normalize_range(payload.len(), start, stop) else {
        return -1;
    };
    let first = *range.start() as u64;
    let scanned = &payload[range];
    match bitpos(scanned, bit) {
        None => -1,
        Some(pos) if !bit && stop_given && pos == scanned.len() as u64 * 8 => -1,
        Some(pos) => (pos + first * 8) as i64,
    }
}
