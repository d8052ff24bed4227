use crate::store::WriteOptions;

/// Largest payload a bitmap may grow to, matching the Redis string limit.
pub const DEFAULT_MAX_PAYLOAD_BYTES: usize = 512 * 1024 * 1024;

/// What a keyed set-bit does with offsets past the end of the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GrowthPolicy {
    /// Fail with [`Error::OffsetOutOfRange`](crate::Error::OffsetOutOfRange),
    /// or [`Error::NotFound`](crate::Error::NotFound) for a missing key.
    #[default]
    Reject,
    /// Extend the payload with zero bytes up to the addressed byte, creating
    /// the key if needed.
    ZeroFill,
}

/// Settings of a [`BitmapString`](crate::BitmapString).
///
/// # Examples
/// ```
/// use bitmap_string::{GrowthPolicy, Options};
///
/// let options = Options::default()
///     .with_growth(GrowthPolicy::ZeroFill)
///     .with_max_payload_bytes(1024)
///     .with_sync(true);
/// assert_eq!(options.growth, GrowthPolicy::ZeroFill);
/// assert!(options.write.sync);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Options {
    /// Growth behavior of keyed set-bit.
    pub growth: GrowthPolicy,
    /// Upper bound for payload growth in bytes.
    pub max_payload_bytes: usize,
    /// Options forwarded to every batched write.
    pub write: WriteOptions,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            growth: GrowthPolicy::default(),
            max_payload_bytes: DEFAULT_MAX_PAYLOAD_BYTES,
            write: WriteOptions::default(),
        }
    }
}

impl Options {
    /// Sets the growth policy.
    pub fn with_growth(mut self, growth: GrowthPolicy) -> Self {
        self.growth = growth;
        self
    }

    /// Sets the payload growth limit.
    pub fn with_max_payload_bytes(mut self, limit: usize) -> Self {
        self.max_payload_bytes = limit;
        self
    }

    /// Requests synchronous writes.
    pub fn with_sync(mut self, sync: bool) -> Self {
        self.write.sync = sync;
        self
    }
}
