use std::time::{SystemTime, UNIX_EPOCH};

use crate::codec::{self, HEADER_SIZE, RedisType, StringHeader};
use crate::config::{GrowthPolicy, Options};
use crate::error::{Error, Result};
use crate::ops;
use crate::store::{ColumnFamily, LogData, Storage, WriteBatch};

/// Outcome of a committed set-bit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitUpdate {
    /// The raw value as it was written to the store.
    pub raw_value: Vec<u8>,
    /// Value of the bit before the update.
    pub old_bit: bool,
}

/// Bitmap operations over string values of one namespace.
///
/// Read operations work on payloads the caller already fetched. Set-bit
/// rewrites the whole raw value through a single atomic batch. The keyed
/// `*_by_key` methods fetch the value themselves.
///
/// Callers serialize concurrent set-bits on the same key; the handle itself
/// holds no locks.
///
/// # Examples
/// ```
/// use bitmap_string::{BitmapString, MemoryStorage, codec};
///
/// let store = MemoryStorage::new();
/// let bitmap = BitmapString::new(&store, "ns");
///
/// let raw = codec::new_string_value(&[0x00]);
/// let update = bitmap.set_bit(&bitmap.ns_key(b"key"), &raw, 7, true).unwrap();
/// assert!(!update.old_bit);
/// assert_eq!(codec::payload_of(&update.raw_value), &[0x01]);
/// assert!(bitmap.get_bit_by_key(b"key", 7).unwrap());
/// ```
#[derive(Debug)]
pub struct BitmapString<'s, S: ?Sized> {
    storage: &'s S,
    namespace: String,
    options: Options,
}

impl<'s, S: Storage + ?Sized> BitmapString<'s, S> {
    /// Creates a handle with default [`Options`].
    ///
    /// # Panics
    /// Panics if the namespace is longer than 255 bytes.
    pub fn new(storage: &'s S, namespace: impl Into<String>) -> Self {
        Self::with_options(storage, namespace, Options::default())
    }

    /// Creates a handle with the given options.
    ///
    /// # Panics
    /// Panics if the namespace is longer than 255 bytes.
    pub fn with_options(storage: &'s S, namespace: impl Into<String>, options: Options) -> Self {
        let namespace = namespace.into();
        assert!(
            namespace.len() <= u8::MAX as usize,
            "Namespace length {} exceeds 255 bytes",
            namespace.len()
        );
        Self {
            storage,
            namespace,
            options,
        }
    }

    /// Namespace of this handle.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Options of this handle.
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Store key of `user_key` within this namespace.
    pub fn ns_key(&self, user_key: &[u8]) -> Vec<u8> {
        codec::compose_ns_key(&self.namespace, user_key)
    }

    /// See [`get_bit`](crate::get_bit).
    #[inline]
    pub fn get_bit(&self, payload: &[u8], offset: u32) -> bool {
        ops::get_bit(payload, offset)
    }

    /// Sets the bit at `offset` of the payload in `raw_value` and persists the
    /// result under `ns_key`.
    ///
    /// The header of `raw_value` is kept. The write is one batch holding a
    /// string log-data marker and the put of the new raw value, and this
    /// returns only after the store acknowledged it.
    ///
    /// # Errors
    /// * [`Error::MalformedValue`] if `raw_value` has no complete header.
    /// * [`Error::OffsetOutOfRange`] if `offset` lies past the payload.
    ///   Nothing is written.
    /// * [`Error::Store`] if the batch was rejected. The stored value is
    ///   unchanged.
    pub fn set_bit(
        &self,
        ns_key: &[u8],
        raw_value: &[u8],
        offset: u32,
        new_bit: bool,
    ) -> Result<BitUpdate> {
        let (_, payload) = codec::split_value(raw_value)?;
        let mut payload = payload.to_vec();
        let old_bit = match ops::write_bit(&mut payload, offset, new_bit) {
            Ok(old_bit) => old_bit,
            Err(err) => {
                tracing::warn!(
                    offset,
                    payload_len = payload.len(),
                    "set-bit offset past payload"
                );
                return Err(err);
            }
        };
        let raw_value = codec::rebuild(raw_value, &payload);

        let mut batch = WriteBatch::new();
        batch.put_log_data(&LogData::new(RedisType::String));
        batch.put(ColumnFamily::Metadata, ns_key, &raw_value);
        if let Err(err) = self.storage.write(&self.options.write, batch) {
            tracing::error!(%err, offset, "failed to persist set-bit");
            return Err(err.into());
        }

        tracing::debug!(offset, new_bit, old_bit, "set-bit committed");
        Ok(BitUpdate { raw_value, old_bit })
    }

    /// See [`bit_count`](crate::bit_count).
    #[inline]
    pub fn bit_count(&self, payload: &[u8], start: i64, stop: i64) -> u64 {
        ops::bit_count(payload, start, stop)
    }

    /// See [`bit_pos`](crate::bit_pos).
    #[inline]
    pub fn bit_pos(
        &self,
        payload: &[u8],
        bit: bool,
        start: i64,
        stop: i64,
        stop_given: bool,
    ) -> i64 {
        ops::bit_pos(payload, bit, start, stop, stop_given)
    }

    /// Fetches the raw string value of `user_key`.
    ///
    /// Expired values read as missing, whatever their type.
    ///
    /// # Errors
    /// * [`Error::MalformedValue`] if the stored value has no complete header.
    /// * [`Error::WrongType`] if the value is not a string.
    /// * [`Error::Store`] if the read failed.
    pub fn get_raw_value(&self, user_key: &[u8]) -> Result<Option<Vec<u8>>> {
        let ns_key = self.ns_key(user_key);
        let Some(raw_value) = self.storage.get(ColumnFamily::Metadata, &ns_key)? else {
            return Ok(None);
        };
        let header = StringHeader::decode(&raw_value)?;
        if header.is_expired(unix_now()) {
            return Ok(None);
        }
        if header.redis_type() != Some(RedisType::String) {
            return Err(Error::WrongType {
                found: header.type_nibble(),
            });
        }
        Ok(Some(raw_value))
    }

    /// Returns the bit at `offset` of `user_key`, `false` for a missing key.
    pub fn get_bit_by_key(&self, user_key: &[u8], offset: u32) -> Result<bool> {
        Ok(self
            .get_raw_value(user_key)?
            .is_some_and(|raw| ops::get_bit(codec::payload_of(&raw), offset)))
    }

    /// Sets the bit at `offset` of `user_key` and returns its previous value.
    ///
    /// Offsets past the payload and missing keys are handled according to
    /// [`Options::growth`].
    ///
    /// # Errors
    /// * [`Error::NotFound`] or [`Error::OffsetOutOfRange`] under
    ///   [`GrowthPolicy::Reject`].
    /// * [`Error::PayloadTooLarge`] if growing would pass
    ///   [`Options::max_payload_bytes`].
    /// * Everything [`get_raw_value`](Self::get_raw_value) and
    ///   [`set_bit`](Self::set_bit) return.
    pub fn set_bit_by_key(&self, user_key: &[u8], offset: u32, bit: bool) -> Result<bool> {
        let growth = self.options.growth;
        let mut raw_value = match self.get_raw_value(user_key)? {
            Some(raw_value) => raw_value,
            None if growth == GrowthPolicy::ZeroFill => codec::new_string_value(&[]),
            None => return Err(Error::NotFound),
        };

        let needed = (offset >> 3) as usize + 1;
        let payload_len = raw_value.len() - HEADER_SIZE;
        if growth == GrowthPolicy::ZeroFill && payload_len < needed {
            let limit = self.options.max_payload_bytes;
            if needed > limit {
                return Err(Error::PayloadTooLarge {
                    requested: needed,
                    limit,
                });
            }
            tracing::debug!(from = payload_len, to = needed, "growing bitmap payload");
            raw_value.resize(HEADER_SIZE + needed, 0);
        }

        let ns_key = self.ns_key(user_key);
        Ok(self.set_bit(&ns_key, &raw_value, offset, bit)?.old_bit)
    }

    /// Counts set bits of `user_key` in the byte range, zero for a missing
    /// key. Bounds default to the whole value.
    pub fn bit_count_by_key(
        &self,
        user_key: &[u8],
        start: Option<i64>,
        stop: Option<i64>,
    ) -> Result<u64> {
        let Some(raw) = self.get_raw_value(user_key)? else {
            return Ok(0);
        };
        let payload = codec::payload_of(&raw);
        Ok(ops::bit_count(payload, start.unwrap_or(0), stop.unwrap_or(-1)))
    }

    /// Position of the first bit equal to `bit` in `user_key`.
    ///
    /// A missing key behaves like an endless run of zeros: `0` when looking
    /// for a clear bit and `-1` when looking for a set bit. Passing `stop`
    /// disables the zero padding past the range.
    pub fn bit_pos_by_key(
        &self,
        user_key: &[u8],
        bit: bool,
        start: Option<i64>,
        stop: Option<i64>,
    ) -> Result<i64> {
        let Some(raw) = self.get_raw_value(user_key)? else {
            return Ok(if bit { -1 } else { 0 });
        };
        Ok(ops::bit_pos(
            codec::payload_of(&raw),
            bit,
            start.unwrap_or(0),
            stop.unwrap_or(-1),
            stop.is_some(),
        ))
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| elapsed.as_secs())
}
