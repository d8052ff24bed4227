//! Layout of string values as they are stored under a key.
//!
//! A raw value is a fixed [`HEADER_SIZE`] byte header followed by the payload:
//!
//! ```text
//! [flags: u8][expire: u32 LE][payload ...]
//! ```
//!
//! The low nibble of `flags` holds the [`RedisType`]. Bitmap operations only
//! ever look at the payload and carry the header over unchanged.

use crate::error::{Error, Result};

/// Size of the metadata header in front of every string payload.
pub const HEADER_SIZE: usize = 5;

const TYPE_MASK: u8 = 0x0F;

/// Logical type of a stored value, as recorded in the header flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum RedisType {
    /// No value.
    None = 0,
    /// Plain string, the type bitmap commands operate on.
    String = 1,
    /// Hash.
    Hash = 2,
    /// List.
    List = 3,
    /// Set.
    Set = 4,
    /// Sorted set.
    ZSet = 5,
    /// Sparse bitmap.
    Bitmap = 6,
    /// Sorted integer set.
    SortedInt = 7,
}

impl RedisType {
    /// Decodes a type nibble, returning `None` for unknown values.
    pub const fn from_u8(value: u8) -> Option<Self> {
        Some(match value {
            0 => Self::None,
            1 => Self::String,
            2 => Self::Hash,
            3 => Self::List,
            4 => Self::Set,
            5 => Self::ZSet,
            6 => Self::Bitmap,
            7 => Self::SortedInt,
            _ => return None,
        })
    }
}

/// Decoded view of the header of a raw value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StringHeader {
    /// Type nibble plus reserved flag bits.
    pub flags: u8,
    /// Expiration as unix seconds, `0` meaning the value never expires.
    pub expire: u32,
}

impl StringHeader {
    /// Header of a fresh string value without expiration.
    pub const fn new() -> Self {
        Self {
            flags: RedisType::String as u8,
            expire: 0,
        }
    }

    /// Parses the header in front of `raw_value`.
    ///
    /// # Errors
    /// Returns [`Error::MalformedValue`] if `raw_value` is shorter than
    /// [`HEADER_SIZE`].
    pub fn decode(raw_value: &[u8]) -> Result<Self> {
        let Some(header) = raw_value.get(..HEADER_SIZE) else {
            return Err(Error::MalformedValue {
                len: raw_value.len(),
            });
        };
        Ok(Self {
            flags: header[0],
            expire: u32::from_le_bytes([header[1], header[2], header[3], header[4]]),
        })
    }

    /// Serializes the header.
    pub fn encode(&self) -> [u8; HEADER_SIZE] {
        let [a, b, c, d] = self.expire.to_le_bytes();
        [self.flags, a, b, c, d]
    }

    /// Raw type nibble of the flags.
    pub const fn type_nibble(&self) -> u8 {
        self.flags & TYPE_MASK
    }

    /// The type recorded in the flags, if known.
    pub fn redis_type(&self) -> Option<RedisType> {
        RedisType::from_u8(self.type_nibble())
    }

    /// Whether the value is past its expiration at `now` (unix seconds).
    pub fn is_expired(&self, now: u64) -> bool {
        self.expire > 0 && u64::from(self.expire) < now
    }
}

impl Default for StringHeader {
    fn default() -> Self {
        Self::new()
    }
}

/// Returns the payload part of `raw_value`.
///
/// Callers guarantee that `raw_value` holds at least a full header; a shorter
/// value yields an empty payload.
///
/// # Examples
/// ```
/// use bitmap_string::codec::payload_of;
///
/// assert_eq!(payload_of(&[1, 0, 0, 0, 0, 0xAB, 0xCD]), &[0xAB, 0xCD]);
/// ```
#[inline]
pub fn payload_of(raw_value: &[u8]) -> &[u8] {
    raw_value.get(HEADER_SIZE..).unwrap_or_default()
}

/// Splits `raw_value` into header and payload.
///
/// # Errors
/// Returns [`Error::MalformedValue`] if `raw_value` is shorter than
/// [`HEADER_SIZE`].
pub fn split_value(raw_value: &[u8]) -> Result<(&[u8], &[u8])> {
    if raw_value.len() < HEADER_SIZE {
        return Err(Error::MalformedValue {
            len: raw_value.len(),
        });
    }
    Ok(raw_value.split_at(HEADER_SIZE))
}

/// Builds a new raw value from the header of `raw_value` and `new_payload`.
///
/// # Panics
/// Panics if `raw_value` is shorter than [`HEADER_SIZE`]; validate it with
/// [`split_value`] first.
///
/// # Examples
/// ```
/// use bitmap_string::codec::rebuild;
///
/// let raw = [1, 9, 9, 9, 9, 0x00];
/// assert_eq!(rebuild(&raw, &[0x01, 0x02]), vec![1, 9, 9, 9, 9, 0x01, 0x02]);
/// ```
pub fn rebuild(raw_value: &[u8], new_payload: &[u8]) -> Vec<u8> {
    let mut value = Vec::with_capacity(HEADER_SIZE + new_payload.len());
    value.extend_from_slice(&raw_value[..HEADER_SIZE]);
    value.extend_from_slice(new_payload);
    value
}

/// Creates the raw value of a new string key holding `payload`.
pub fn new_string_value(payload: &[u8]) -> Vec<u8> {
    let mut value = Vec::with_capacity(HEADER_SIZE + payload.len());
    value.extend_from_slice(&StringHeader::new().encode());
    value.extend_from_slice(payload);
    value
}

/// Prefixes `user_key` with its namespace: `[ns_len: u8][ns][user_key]`.
///
/// # Panics
/// Panics if the namespace is longer than 255 bytes.
pub fn compose_ns_key(namespace: &str, user_key: &[u8]) -> Vec<u8> {
    let Ok(ns_len) = u8::try_from(namespace.len()) else {
        panic!("Namespace length {} exceeds 255 bytes", namespace.len());
    };
    let mut key = Vec::with_capacity(1 + namespace.len() + user_key.len());
    key.push(ns_len);
    key.extend_from_slice(namespace.as_bytes());
    key.extend_from_slice(user_key);
    key
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_round_trip() {
        let header = StringHeader {
            flags: 0x31,
            expire: 1_700_000_000,
        };
        let mut raw = header.encode().to_vec();
        raw.push(0xEE);
        assert_eq!(StringHeader::decode(&raw).unwrap(), header);
        assert_eq!(header.redis_type(), Some(RedisType::String));
    }

    #[test]
    fn test_header_too_short() {
        assert!(matches!(
            StringHeader::decode(&[1, 0, 0]),
            Err(Error::MalformedValue { len: 3 })
        ));
        assert!(split_value(&[0; 4]).is_err());
        assert_eq!(payload_of(&[0; 4]), &[] as &[u8]);
    }

    #[test]
    fn test_unknown_type() {
        let header = StringHeader {
            flags: 0x0C,
            expire: 0,
        };
        assert_eq!(header.redis_type(), None);
        assert_eq!(header.type_nibble(), 0x0C);

        let hash = StringHeader {
            flags: 0xF2,
            expire: 0,
        };
        assert_eq!(hash.type_nibble(), RedisType::Hash as u8);
        assert_eq!(hash.redis_type(), Some(RedisType::Hash));
    }

    #[test]
    fn test_expiry() {
        let header = StringHeader {
            flags: RedisType::String as u8,
            expire: 100,
        };
        assert!(!header.is_expired(50));
        assert!(!header.is_expired(100));
        assert!(header.is_expired(101));
        assert!(!StringHeader::new().is_expired(u64::MAX));
    }

    #[test]
    fn test_new_string_value() {
        let raw = new_string_value(&[0xAA]);
        assert_eq!(raw, vec![1, 0, 0, 0, 0, 0xAA]);
        assert_eq!(split_value(&raw).unwrap(), (&raw[..5], &[0xAA][..]));
    }

    #[test]
    fn test_rebuild_keeps_header() {
        let raw = [0x41, 1, 2, 3, 4, 0xFF, 0xFF];
        let rebuilt = rebuild(&raw, &[0x00]);
        assert_eq!(rebuilt, vec![0x41, 1, 2, 3, 4, 0x00]);
        let payload = payload_of(&raw);
        assert_eq!(payload_of(&rebuild(&raw, payload)), payload);
    }

    #[test]
    #[should_panic]
    fn test_rebuild_short_value() {
        rebuild(&[0x01, 0x00], &[0xFF]);
    }

    #[test]
    fn test_compose_ns_key() {
        assert_eq!(compose_ns_key("ns", b"key"), b"\x02nskey".to_vec());
        assert_eq!(compose_ns_key("", b"k"), b"\x00k".to_vec());
    }

    #[test]
    #[should_panic(expected = "Namespace length 256 exceeds 255 bytes")]
    fn test_compose_ns_key_too_long() {
        compose_ns_key(&"n".repeat(256), b"k");
    }
}
