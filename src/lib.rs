//! Chainbuf: a segmented, mutable byte buffer built from pooled
//! fixed-capacity units.
//!
//! # Overview
//!
//! A [`Buffer`] stores its content in a chain of fixed-capacity
//! [`Unit`]s instead of one contiguous allocation. Appending never
//! reallocates or copies existing bytes: a fresh unit from a
//! [`UnitPool`] is linked onto the tail. Splicing operations —
//! [`split`](Buffer::split), [`drain_to`](Buffer::drain_to),
//! [`compact`](Buffer::compact) — relink whole units in O(1) per unit
//! rather than copying payloads.
//!
//! # Core Guarantees
//!
//! - **No payload copies on growth or splice**: units move between
//!   chains by pointer surgery; only a unit straddling a split is cut
//! - **Stale handles are detected**: chain nodes are addressed through
//!   generation-checked [`NodeId`]s, so a handle that outlives its node
//!   panics instead of aliasing a recycled slot
//! - **Failed reads leave the cursor in place**: every codec validates
//!   before consuming, so a partial decode never loses bytes
//! - **Recycled units are inert**: a unit given back to a pool is
//!   cleared before reuse
//!
//! # Module Structure
//!
//! - [`unit`]: One fixed-capacity storage segment and its local cursor
//! - [`pool`]: The [`UnitPool`] capability and thread-local free lists
//! - [`chain`]: The circular doubly-linked ring of units
//! - [`buffer`]: The [`Buffer`] façade over a chain
//! - [`codec`]: Fixed-width, varint, raw-byte and text codecs
//! - [`search`]: KMP matchers for bytes and chars
//! - [`error`]: Error types
//!
//! # Examples
//!
//! ```
//! use chainbuf::{Buffer, codec::{U16Be, VarU64}};
//!
//! let mut buf = Buffer::with_unit_capacity(16);
//! buf.write_value(VarU64, 1_000_000);
//! buf.write_str("payload").unwrap();
//! buf.prepend_value(U16Be, buf.size() as u16).unwrap();
//!
//! let framed_len = buf.read_value(U16Be).unwrap();
//! assert_eq!(framed_len as usize, buf.remaining());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::cast_possible_truncation)]

pub mod buffer;
pub mod chain;
pub mod codec;
pub mod error;
pub mod pool;
pub mod search;
pub mod unit;

// Re-exports for convenient access to core types
pub use buffer::{Buffer, ByteSink};
pub use chain::{NodeId, UnitChain};
pub use codec::{Bytes, Charset, Text, Utf8, ValueCodec, VarU32, VarU64};
pub use error::{BufferError, Result};
pub use pool::{LocalPool, UnitPool, DEFAULT_UNIT_CAPACITY};
pub use search::{ByteKmp, CharKmp};
pub use unit::Unit;
