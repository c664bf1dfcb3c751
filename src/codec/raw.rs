//! Raw byte-sequence codec.
//!
//! The identity member of the codec family: no transformation, just the
//! shared cross-unit byte loops behind the five-operation contract.
//! Byte sequences are not self-delimiting, so the codec carries the
//! decode length the same way [`Text`](super::Text) reads take one;
//! encoding operations use the value's own length.

use crate::chain::UnitChain;
use crate::error::Result;
use crate::pool::UnitPool;

use super::{get_bytes, prepend_bytes, read_exact, set_bytes, write_bytes, ValueCodec};

/// Raw byte-sequence codec.
///
/// `write`/`set`/`prepend` emit the value's bytes unchanged; `read`/
/// `get` decode exactly [`len`](Self::len) bytes. Protocol layers that
/// frame a field with a length prefix read the prefix first and build
/// the codec from it.
///
/// # Examples
///
/// ```
/// use chainbuf::{Buffer, codec::Bytes};
///
/// let mut buf = Buffer::with_unit_capacity(4);
/// buf.write_slice(b"payload");
/// assert_eq!(buf.read_value(Bytes::with_len(7)).unwrap(), b"payload");
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Bytes {
    len: usize,
}

impl Bytes {
    /// A codec decoding exactly `len` bytes.
    #[must_use]
    pub const fn with_len(len: usize) -> Self {
        Self { len }
    }

    /// The decode length.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Whether the decode length is zero.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl ValueCodec for Bytes {
    type Value = Vec<u8>;

    fn write<P: UnitPool>(&self, chain: &mut UnitChain<P>, value: Vec<u8>) {
        write_bytes(chain, &value);
    }

    fn read<P: UnitPool>(&self, chain: &mut UnitChain<P>) -> Result<Vec<u8>> {
        let mut out = vec![0u8; self.len];
        read_exact(chain, &mut out)?;
        Ok(out)
    }

    fn get<P: UnitPool>(&self, chain: &UnitChain<P>, index: usize) -> Result<Vec<u8>> {
        let mut out = vec![0u8; self.len];
        get_bytes(chain, index, &mut out)?;
        Ok(out)
    }

    fn set<P: UnitPool>(&self, chain: &mut UnitChain<P>, index: usize, value: Vec<u8>) -> Result<()> {
        set_bytes(chain, index, &value)
    }

    fn prepend<P: UnitPool>(&self, chain: &mut UnitChain<P>, value: Vec<u8>) {
        prepend_bytes(chain, &value);
    }
}
