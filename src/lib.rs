//! Redis-compatible bitmap operations over string values kept in a
//! key-value store.
//!
//! A string value is stored as a small fixed header followed by its payload.
//! The payload doubles as a bitmap: bit `i` lives in byte `i / 8`, counting
//! from the most significant bit, and every bit past the end reads as zero.
//!
//! # Examples
//! ```
//! use bitmap_string::{bit_count, bit_pos, get_bit};
//!
//! let payload = [0x00, 0xFF];
//! assert!(!get_bit(&payload, 0));
//! assert!(get_bit(&payload, 8));
//! assert_eq!(bit_count(&payload, 0, -1), 8);
//! assert_eq!(bit_pos(&payload, true, 0, -1, false), 8);
//! ```
//!
//! Writes go through a [`Storage`] as one atomic batch:
//! ```
//! use bitmap_string::{BitmapString, GrowthPolicy, MemoryStorage, Options};
//!
//! let store = MemoryStorage::new();
//! let options = Options::default().with_growth(GrowthPolicy::ZeroFill);
//! let bitmap = BitmapString::with_options(&store, "default", options);
//!
//! assert_eq!(bitmap.set_bit_by_key(b"visits", 100, true).unwrap(), false);
//! assert_eq!(bitmap.bit_count_by_key(b"visits", None, None).unwrap(), 1);
//! assert_eq!(bitmap.bit_pos_by_key(b"visits", true, None, None).unwrap(), 100);
//! ```
//!
//! # Features
//!
//! - `GETBIT`, `SETBIT`, `BITCOUNT` and `BITPOS` semantics including negative
//!   byte ranges
//! - Word-aligned scanning: [`popcount`] uses a SWAR reduction and [`bitpos`]
//!   skips whole words of uniform bits
//! - Atomic persistence through the [`Storage`] trait, with an in-memory
//!   [`MemoryStorage`]
//! - No `unsafe`

#![deny(missing_docs)]
#![forbid(unsafe_code)]

mod bitmap;
pub mod codec;
mod config;
mod error;
mod ops;
mod scan;
mod store;

pub use bitmap::{BitUpdate, BitmapString};
pub use codec::{HEADER_SIZE, RedisType, StringHeader};
pub use config::{DEFAULT_MAX_PAYLOAD_BYTES, GrowthPolicy, Options};
pub use error::{Error, Result};
pub use ops::{bit_count, bit_pos, get_bit, normalize_range, write_bit};
pub use scan::{bitpos, popcount};
pub use store::{
    BatchEntry, ColumnFamily, LogData, MemoryStorage, Storage, StoreError, WriteBatch, WriteOptions,
};
