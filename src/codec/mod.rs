//! Typed codecs over a unit chain.
//!
//! A codec is a stateless strategy implementing the five-operation
//! contract of [`ValueCodec`]: cursor [`write`](ValueCodec::write) /
//! [`read`](ValueCodec::read), random-access [`get`](ValueCodec::get) /
//! [`set`](ValueCodec::set), and [`prepend`](ValueCodec::prepend).
//! Every concrete codec funnels through the byte-loop helpers in this
//! module, so unit-boundary crossing, overflow growth, and underflow
//! detection are handled exactly one way.
//!
//! Protocol layers add new wire representations by implementing
//! [`ValueCodec`] on their own strategy types; nothing in the core needs
//! to change.

pub mod fixed;
pub mod raw;
pub mod text;
pub mod varint;

pub use fixed::{
    F32Be, F32Le, F64Be, F64Le, I16Be, I16Le, I32Be, I32Le, I64Be, I64Le, U16Be, U16Le, U32Be,
    U32Le, U64Be, U64Le,
};
pub use raw::Bytes;
pub use text::{Charset, Text, Utf8};
pub use varint::{VarU32, VarU64};

use crate::chain::UnitChain;
use crate::error::{BufferError, Result};
use crate::pool::UnitPool;

/// The five-operation codec contract.
///
/// `write`/`read` operate at the chain cursor; `get`/`set` locate the
/// target unit by offset subtraction and never disturb the shared
/// cursor; `prepend` writes in front of the head, splicing fresh units
/// when headroom runs out. All five cross unit boundaries transparently.
pub trait ValueCodec {
    /// The value type this codec encodes and decodes.
    type Value;

    /// Append the encoded value at the tail of the chain, allocating
    /// units on overflow.
    fn write<P: UnitPool>(&self, chain: &mut UnitChain<P>, value: Self::Value);

    /// Decode a value at the cursor, advancing it.
    ///
    /// # Errors
    ///
    /// [`BufferError::Underflow`] if the chain ends before the full
    /// encoding was read.
    fn read<P: UnitPool>(&self, chain: &mut UnitChain<P>) -> Result<Self::Value>;

    /// Decode the value found at absolute offset `index`, without
    /// moving the cursor.
    ///
    /// # Errors
    ///
    /// [`BufferError::OutOfBounds`] if the encoding does not lie within
    /// `[0, size())`.
    fn get<P: UnitPool>(&self, chain: &UnitChain<P>, index: usize) -> Result<Self::Value>;

    /// Overwrite the encoding at absolute offset `index`, without moving
    /// the cursor.
    ///
    /// # Errors
    ///
    /// [`BufferError::OutOfBounds`] if the encoding does not fit within
    /// `[0, size())`.
    fn set<P: UnitPool>(&self, chain: &mut UnitChain<P>, index: usize, value: Self::Value)
        -> Result<()>;

    /// Write the encoded value in front of the chain's first byte.
    fn prepend<P: UnitPool>(&self, chain: &mut UnitChain<P>, value: Self::Value);
}

// === Shared byte loops ===
//
// Each loop makes progress every iteration: `writable_tail` and
// `prependable_head` always return a unit with at least one free byte.

/// Append raw bytes at the tail, growing the chain on overflow.
pub(crate) fn write_bytes<P: UnitPool>(chain: &mut UnitChain<P>, mut src: &[u8]) {
    while !src.is_empty() {
        let id = chain.writable_tail();
        let n = chain.unit_mut(id).push_slice(src);
        src = &src[n..];
    }
}

/// Consume exactly `dst.len()` bytes at the cursor.
///
/// Validates the full width up front so a failed read leaves the cursor
/// untouched.
pub(crate) fn read_exact<P: UnitPool>(chain: &mut UnitChain<P>, dst: &mut [u8]) -> Result<()> {
    let available = chain.remaining();
    if available < dst.len() {
        return Err(BufferError::Underflow {
            needed: dst.len() - available,
            available,
        });
    }
    let mut off = 0;
    while off < dst.len() {
        let n = chain.current_unit_mut().read_slice(&mut dst[off..]);
        off += n;
        if off < dst.len() {
            let advanced = chain.advance_position();
            debug_assert!(advanced, "remaining() promised more data");
        }
    }
    Ok(())
}

/// Consume one byte at the cursor.
pub(crate) fn read_byte<P: UnitPool>(chain: &mut UnitChain<P>) -> Result<u8> {
    loop {
        if let Some(b) = chain.current_unit_mut().read_byte() {
            return Ok(b);
        }
        if !chain.advance_position() {
            return Err(BufferError::Underflow {
                needed: 1,
                available: 0,
            });
        }
    }
}

/// Copy `[index, index + dst.len())` into `dst`, cursor untouched.
pub(crate) fn get_bytes<P: UnitPool>(
    chain: &UnitChain<P>,
    index: usize,
    dst: &mut [u8],
) -> Result<()> {
    let size = chain.total_size();
    if index.checked_add(dst.len()).map_or(true, |end| end > size) {
        return Err(BufferError::OutOfBounds { index, size });
    }
    let mut skip = index;
    let mut off = 0;
    for id in chain.ids() {
        if off == dst.len() {
            break;
        }
        let contents = chain.unit(id).contents();
        if skip >= contents.len() {
            skip -= contents.len();
            continue;
        }
        let window = &contents[skip..];
        skip = 0;
        let n = window.len().min(dst.len() - off);
        dst[off..off + n].copy_from_slice(&window[..n]);
        off += n;
    }
    Ok(())
}

/// Overwrite `[index, index + src.len())` from `src`, cursor untouched.
pub(crate) fn set_bytes<P: UnitPool>(
    chain: &mut UnitChain<P>,
    index: usize,
    src: &[u8],
) -> Result<()> {
    let size = chain.total_size();
    if index.checked_add(src.len()).map_or(true, |end| end > size) {
        return Err(BufferError::OutOfBounds { index, size });
    }
    let mut skip = index;
    let mut off = 0;
    let ids: Vec<_> = chain.ids().collect();
    for id in ids {
        if off == src.len() {
            break;
        }
        let unit_size = chain.unit(id).size();
        if skip >= unit_size {
            skip -= unit_size;
            continue;
        }
        let n = (unit_size - skip).min(src.len() - off);
        chain.unit_mut(id).copy_from_slice(skip, &src[off..off + n]);
        skip = 0;
        off += n;
    }
    Ok(())
}

/// Write raw bytes in front of the chain's first byte, consuming head
/// headroom right to left and splicing fresh units when it runs out.
pub(crate) fn prepend_bytes<P: UnitPool>(chain: &mut UnitChain<P>, src: &[u8]) {
    let mut rest = src;
    while !rest.is_empty() {
        let id = chain.prependable_head();
        let take = rest.len().min(chain.unit(id).head_room());
        let (left, right) = rest.split_at(rest.len() - take);
        chain.unit_mut(id).prepend_slice(right);
        rest = left;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::LocalPool;

    fn tiny_chain() -> UnitChain<LocalPool> {
        UnitChain::new(LocalPool, 2)
    }

    fn flatten<P: UnitPool>(chain: &UnitChain<P>) -> Vec<u8> {
        chain
            .ids()
            .flat_map(|id| chain.unit(id).contents().to_vec())
            .collect()
    }

    #[test]
    fn test_write_bytes_spans_units() {
        let mut chain = tiny_chain();
        write_bytes(&mut chain, b"abcdef");
        assert_eq!(chain.node_count(), 3);
        assert_eq!(flatten(&chain), b"abcdef");
    }

    #[test]
    fn test_read_exact_spans_units() {
        let mut chain = tiny_chain();
        write_bytes(&mut chain, b"abcdef");
        let mut dst = [0u8; 5];
        read_exact(&mut chain, &mut dst).unwrap();
        assert_eq!(&dst, b"abcde");
        assert_eq!(chain.remaining(), 1);
    }

    #[test]
    fn test_read_exact_underflow_leaves_cursor() {
        let mut chain = tiny_chain();
        write_bytes(&mut chain, b"abc");
        let mut dst = [0u8; 8];
        let err = read_exact(&mut chain, &mut dst).unwrap_err();
        assert_eq!(
            err,
            BufferError::Underflow {
                needed: 5,
                available: 3
            }
        );
        assert_eq!(chain.remaining(), 3);
    }

    #[test]
    fn test_get_set_bytes_cross_units() {
        let mut chain = tiny_chain();
        write_bytes(&mut chain, b"abcdef");
        let position_before = chain.position_offset();

        set_bytes(&mut chain, 1, b"XYZ").unwrap();
        assert_eq!(flatten(&chain), b"aXYZef");

        let mut dst = [0u8; 4];
        get_bytes(&chain, 2, &mut dst).unwrap();
        assert_eq!(&dst, b"YZef");

        assert_eq!(chain.position_offset(), position_before);
        assert!(get_bytes(&chain, 5, &mut dst).is_err());
        assert!(set_bytes(&mut chain, 4, b"abc").is_err());
    }

    #[test]
    fn test_prepend_bytes_splices_in_front() {
        let mut chain = tiny_chain();
        write_bytes(&mut chain, b"ef");
        prepend_bytes(&mut chain, b"abcd");
        assert_eq!(flatten(&chain), b"abcdef");
        // Reading starts at the prepended bytes.
        let mut dst = [0u8; 6];
        read_exact(&mut chain, &mut dst).unwrap();
        assert_eq!(&dst, b"abcdef");
    }
}
