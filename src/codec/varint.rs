//! LEB128 variable-length integer codecs.
//!
//! Seven data bits per byte, least-significant group first, with the
//! continuation flag in bit 7 (`0x80`). Encodings are always minimal:
//! `max(1, ceil(bitlength(v) / 7))` bytes. `prepend` determines the
//! minimal length first and lays the bytes down backward from the head;
//! decoding cannot tell the two producers apart.

use crate::chain::UnitChain;
use crate::error::{BufferError, Result};
use crate::pool::UnitPool;

use super::{get_bytes, prepend_bytes, write_bytes, ValueCodec};

/// Longest legal `u64` varint: ceil(64 / 7) bytes.
const MAX_LEN_64: usize = 10;
/// Longest legal `u32` varint: ceil(32 / 7) bytes.
const MAX_LEN_32: usize = 5;

/// Encode into `out`, returning the encoded length.
fn encode64(mut value: u64, out: &mut [u8; MAX_LEN_64]) -> usize {
    let mut n = 0;
    loop {
        let group = (value & 0x7F) as u8;
        value >>= 7;
        if value == 0 {
            out[n] = group;
            return n + 1;
        }
        out[n] = group | 0x80;
        n += 1;
    }
}

/// Decode up to `max_len` groups from `next_byte`.
///
/// `max_len` and the final-byte check bound the result to the target
/// width, so an encoding that overflows it is rejected rather than
/// silently wrapped. Non-minimal encodings that stay within the width
/// (redundant continuation groups, e.g. `80 00` for zero) decode like
/// any other producer's output.
fn decode64<E>(mut next_byte: E, max_len: usize) -> Result<u64>
where
    E: FnMut() -> Result<u8>,
{
    let mut value: u64 = 0;
    for i in 0..max_len {
        let byte = next_byte()?;
        let group = u64::from(byte & 0x7F);
        let spare_bits = 64 - 7 * i;
        if spare_bits < 7 && group >> spare_bits != 0 {
            return Err(BufferError::InvalidArgument("varint overflows target width"));
        }
        value |= group << (7 * i);
        if byte & 0x80 == 0 {
            return Ok(value);
        }
    }
    Err(BufferError::InvalidArgument("varint exceeds maximum length"))
}

/// Peek one byte at an absolute offset, reporting exhaustion as
/// underflow so sequential reads keep read semantics.
fn peek_byte<P: UnitPool>(chain: &UnitChain<P>, at: usize) -> Result<u8> {
    let mut raw = [0u8; 1];
    get_bytes(chain, at, &mut raw).map_err(|_| BufferError::Underflow {
        needed: 1,
        available: 0,
    })?;
    Ok(raw[0])
}

/// LEB128 codec for `u64`.
///
/// # Examples
///
/// ```
/// use chainbuf::chain::UnitChain;
/// use chainbuf::codec::{ValueCodec, VarU64};
/// use chainbuf::pool::LocalPool;
///
/// let mut chain = UnitChain::new(LocalPool, 4);
/// VarU64.write(&mut chain, 300);
/// assert_eq!(chain.total_size(), 2); // minimal encoding
/// assert_eq!(VarU64.read(&mut chain).unwrap(), 300);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VarU64;

/// LEB128 codec for `u32`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VarU32;

impl VarU64 {
    /// The minimal encoded length of `value`.
    #[must_use]
    pub fn encoded_len(value: u64) -> usize {
        let mut scratch = [0u8; MAX_LEN_64];
        encode64(value, &mut scratch)
    }
}

impl VarU32 {
    /// The minimal encoded length of `value`.
    #[must_use]
    pub fn encoded_len(value: u32) -> usize {
        VarU64::encoded_len(u64::from(value))
    }
}

impl ValueCodec for VarU64 {
    type Value = u64;

    fn write<P: UnitPool>(&self, chain: &mut UnitChain<P>, value: u64) {
        let mut scratch = [0u8; MAX_LEN_64];
        let len = encode64(value, &mut scratch);
        write_bytes(chain, &scratch[..len]);
    }

    fn read<P: UnitPool>(&self, chain: &mut UnitChain<P>) -> Result<u64> {
        // Decoded by peeking so a malformed or truncated encoding
        // leaves the cursor exactly where it was.
        let start = chain.position_offset();
        let mut at = start;
        let value = decode64(
            || {
                let byte = peek_byte(chain, at)?;
                at += 1;
                Ok(byte)
            },
            MAX_LEN_64,
        )?;
        chain.consume(at - start);
        Ok(value)
    }

    fn get<P: UnitPool>(&self, chain: &UnitChain<P>, index: usize) -> Result<u64> {
        let mut at = index;
        decode64(
            || {
                let mut raw = [0u8; 1];
                get_bytes(chain, at, &mut raw)?;
                at += 1;
                Ok(raw[0])
            },
            MAX_LEN_64,
        )
    }

    fn set<P: UnitPool>(&self, chain: &mut UnitChain<P>, index: usize, value: u64) -> Result<()> {
        let mut scratch = [0u8; MAX_LEN_64];
        let len = encode64(value, &mut scratch);
        super::set_bytes(chain, index, &scratch[..len])
    }

    fn prepend<P: UnitPool>(&self, chain: &mut UnitChain<P>, value: u64) {
        // Minimal length first, then the bytes go down backward from
        // the head; the wire image is identical to write().
        let mut scratch = [0u8; MAX_LEN_64];
        let len = encode64(value, &mut scratch);
        prepend_bytes(chain, &scratch[..len]);
    }
}

impl ValueCodec for VarU32 {
    type Value = u32;

    fn write<P: UnitPool>(&self, chain: &mut UnitChain<P>, value: u32) {
        VarU64.write(chain, u64::from(value));
    }

    fn read<P: UnitPool>(&self, chain: &mut UnitChain<P>) -> Result<u32> {
        let start = chain.position_offset();
        let mut at = start;
        let value = decode64(
            || {
                let byte = peek_byte(chain, at)?;
                at += 1;
                Ok(byte)
            },
            MAX_LEN_32,
        )?;
        let value = u32::try_from(value)
            .map_err(|_| BufferError::InvalidArgument("varint overflows target width"))?;
        chain.consume(at - start);
        Ok(value)
    }

    fn get<P: UnitPool>(&self, chain: &UnitChain<P>, index: usize) -> Result<u32> {
        let mut at = index;
        let value = decode64(
            || {
                let mut raw = [0u8; 1];
                get_bytes(chain, at, &mut raw)?;
                at += 1;
                Ok(raw[0])
            },
            MAX_LEN_32,
        )?;
        u32::try_from(value)
            .map_err(|_| BufferError::InvalidArgument("varint overflows target width"))
    }

    fn set<P: UnitPool>(&self, chain: &mut UnitChain<P>, index: usize, value: u32) -> Result<()> {
        VarU64.set(chain, index, u64::from(value))
    }

    fn prepend<P: UnitPool>(&self, chain: &mut UnitChain<P>, value: u32) {
        VarU64.prepend(chain, u64::from(value));
    }
}
