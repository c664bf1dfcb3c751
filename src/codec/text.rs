//! Character-sequence codecs over an external charset capability.
//!
//! The chain core never transcodes bytes itself: a [`Charset`] receives
//! the text (for encoding into a byte sink) or a flattened view of
//! read-only per-unit windows (for decoding) and does the conversion.
//! Nothing here assumes one byte per character.

use crate::buffer::ByteSink;
use crate::chain::UnitChain;
use crate::error::{BufferError, Result};
use crate::pool::UnitPool;

use super::{prepend_bytes, write_bytes};

/// Byte/character transcoding capability consumed by sequence codecs.
pub trait Charset {
    /// Encode `text` into `out`.
    ///
    /// # Errors
    ///
    /// [`BufferError::InvalidArgument`] if `text` cannot be represented
    /// in this charset.
    fn encode(&self, text: &str, out: &mut dyn ByteSink) -> Result<()>;

    /// Decode the concatenation of `windows` into `out`.
    ///
    /// A character may be split across adjacent windows; implementations
    /// must stitch it back together.
    ///
    /// # Errors
    ///
    /// [`BufferError::InvalidArgument`] on malformed input, including a
    /// sequence truncated at the very end.
    fn decode(&self, windows: &mut dyn Iterator<Item = &[u8]>, out: &mut String) -> Result<()>;
}

/// Validating UTF-8 charset.
#[derive(Debug, Clone, Copy, Default)]
pub struct Utf8;

fn utf8_sequence_len(first: u8) -> Result<usize> {
    match first {
        0x00..=0x7F => Ok(1),
        0xC0..=0xDF => Ok(2),
        0xE0..=0xEF => Ok(3),
        0xF0..=0xF7 => Ok(4),
        _ => Err(BufferError::InvalidArgument("invalid utf-8 leading byte")),
    }
}

impl Charset for Utf8 {
    fn encode(&self, text: &str, out: &mut dyn ByteSink) -> Result<()> {
        out.put_slice(text.as_bytes());
        Ok(())
    }

    fn decode(&self, windows: &mut dyn Iterator<Item = &[u8]>, out: &mut String) -> Result<()> {
        // Carry holds a character split across window boundaries.
        let mut carry = [0u8; 4];
        let mut carry_len = 0usize;
        for mut window in windows {
            if carry_len > 0 {
                let need = utf8_sequence_len(carry[0])? - carry_len;
                let take = need.min(window.len());
                carry[carry_len..carry_len + take].copy_from_slice(&window[..take]);
                carry_len += take;
                window = &window[take..];
                if take < need {
                    continue; // window exhausted mid-character
                }
                let piece = std::str::from_utf8(&carry[..carry_len])
                    .map_err(|_| BufferError::InvalidArgument("invalid utf-8 sequence"))?;
                out.push_str(piece);
                carry_len = 0;
            }
            match std::str::from_utf8(window) {
                Ok(piece) => out.push_str(piece),
                Err(e) => {
                    if e.error_len().is_some() {
                        return Err(BufferError::InvalidArgument("invalid utf-8 sequence"));
                    }
                    // Incomplete trailing character: stash it for the
                    // next window.
                    let valid = e.valid_up_to();
                    let piece = std::str::from_utf8(&window[..valid])
                        .map_err(|_| BufferError::InvalidArgument("invalid utf-8 sequence"))?;
                    out.push_str(piece);
                    let rest = &window[valid..];
                    carry[..rest.len()].copy_from_slice(rest);
                    carry_len = rest.len();
                }
            }
        }
        if carry_len > 0 {
            return Err(BufferError::InvalidArgument(
                "invalid utf-8: truncated sequence",
            ));
        }
        Ok(())
    }
}

struct ChainSink<'a, P: UnitPool>(&'a mut UnitChain<P>);

impl<P: UnitPool> ByteSink for ChainSink<'_, P> {
    fn put_slice(&mut self, bytes: &[u8]) {
        write_bytes(self.0, bytes);
    }
}

/// Sequence codec for strings and char slices in a chosen charset.
///
/// Text is not self-delimiting on the wire, so reads take an explicit
/// byte length; protocol layers typically prepend one with a varint.
///
/// # Examples
///
/// ```
/// use chainbuf::chain::UnitChain;
/// use chainbuf::codec::Text;
/// use chainbuf::pool::LocalPool;
///
/// let text = Text::utf8();
/// let mut chain = UnitChain::new(LocalPool, 4);
/// text.write_str(&mut chain, "héllo").unwrap();
/// let n = chain.total_size();
/// assert_eq!(text.read_str(&mut chain, n).unwrap(), "héllo");
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct Text<C: Charset> {
    charset: C,
}

impl Text<Utf8> {
    /// The UTF-8 text codec.
    #[must_use]
    pub const fn utf8() -> Self {
        Self { charset: Utf8 }
    }
}

impl<C: Charset> Text<C> {
    /// A text codec over a caller-supplied charset.
    pub const fn new(charset: C) -> Self {
        Self { charset }
    }

    /// Encode `text` at the tail of the chain.
    ///
    /// # Errors
    ///
    /// Propagates charset encoding failures.
    pub fn write_str<P: UnitPool>(&self, chain: &mut UnitChain<P>, text: &str) -> Result<()> {
        self.charset.encode(text, &mut ChainSink(chain))
    }

    /// Encode a char slice at the tail of the chain.
    ///
    /// # Errors
    ///
    /// Propagates charset encoding failures.
    pub fn write_chars<P: UnitPool>(&self, chain: &mut UnitChain<P>, chars: &[char]) -> Result<()> {
        let text: String = chars.iter().collect();
        self.write_str(chain, &text)
    }

    /// Decode `byte_len` bytes at the cursor, advancing it on success.
    ///
    /// # Errors
    ///
    /// [`BufferError::Underflow`] if fewer than `byte_len` unread bytes
    /// remain; charset errors leave the cursor untouched.
    pub fn read_str<P: UnitPool>(&self, chain: &mut UnitChain<P>, byte_len: usize) -> Result<String> {
        let available = chain.remaining();
        if available < byte_len {
            return Err(BufferError::Underflow {
                needed: byte_len - available,
                available,
            });
        }
        let out = {
            let windows = chain.window_slices(chain.position_offset(), byte_len)?;
            let mut out = String::new();
            self.charset.decode(&mut windows.into_iter(), &mut out)?;
            out
        };
        chain.consume(byte_len);
        Ok(out)
    }

    /// Decode `byte_len` bytes at the cursor into chars.
    ///
    /// # Errors
    ///
    /// Same as [`read_str`](Self::read_str).
    pub fn read_chars<P: UnitPool>(
        &self,
        chain: &mut UnitChain<P>,
        byte_len: usize,
    ) -> Result<Vec<char>> {
        Ok(self.read_str(chain, byte_len)?.chars().collect())
    }

    /// Decode `byte_len` bytes at absolute offset `index`, cursor
    /// untouched.
    ///
    /// # Errors
    ///
    /// [`BufferError::OutOfBounds`] if the range does not fit; charset
    /// errors propagate.
    pub fn get_str<P: UnitPool>(
        &self,
        chain: &UnitChain<P>,
        index: usize,
        byte_len: usize,
    ) -> Result<String> {
        let windows = chain.window_slices(index, byte_len)?;
        let mut out = String::new();
        self.charset.decode(&mut windows.into_iter(), &mut out)?;
        Ok(out)
    }

    /// Encode `text` in front of the chain's first byte.
    ///
    /// # Errors
    ///
    /// Propagates charset encoding failures; nothing is prepended on
    /// error.
    pub fn prepend_str<P: UnitPool>(&self, chain: &mut UnitChain<P>, text: &str) -> Result<()> {
        let mut encoded = Vec::new();
        self.charset.encode(text, &mut encoded)?;
        prepend_bytes(chain, &encoded);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::LocalPool;

    fn chain(unit_capacity: usize) -> UnitChain<LocalPool> {
        UnitChain::new(LocalPool, unit_capacity)
    }

    #[test]
    fn test_text_roundtrip_ascii() {
        let text = Text::utf8();
        let mut c = chain(4);
        text.write_str(&mut c, "hello world").unwrap();
        assert_eq!(text.read_str(&mut c, 11).unwrap(), "hello world");
        assert_eq!(c.remaining(), 0);
    }

    #[test]
    fn test_text_multibyte_split_across_units() {
        let text = Text::utf8();
        // Capacity-1 units guarantee every multibyte character spans
        // window boundaries.
        let mut c = chain(1);
        let sample = "héllo — προσ 示例 🦀";
        text.write_str(&mut c, sample).unwrap();
        assert_eq!(
            text.read_str(&mut c, sample.len()).unwrap(),
            sample
        );
    }

    #[test]
    fn test_text_get_str_leaves_cursor() {
        let text = Text::utf8();
        let mut c = chain(3);
        text.write_str(&mut c, "aβc").unwrap();
        assert_eq!(text.get_str(&c, 1, 2).unwrap(), "β");
        assert_eq!(c.position_offset(), 0);
    }

    #[test]
    fn test_text_prepend_str() {
        let text = Text::utf8();
        let mut c = chain(2);
        text.write_str(&mut c, "world").unwrap();
        text.prepend_str(&mut c, "héllo ").unwrap();
        assert_eq!(text.read_str(&mut c, "héllo world".len()).unwrap(), "héllo world");
    }

    #[test]
    fn test_text_read_underflow() {
        let text = Text::utf8();
        let mut c = chain(4);
        text.write_str(&mut c, "ab").unwrap();
        assert!(matches!(
            text.read_str(&mut c, 3).unwrap_err(),
            BufferError::Underflow { .. }
        ));
        assert_eq!(text.read_str(&mut c, 2).unwrap(), "ab");
    }

    #[test]
    fn test_text_rejects_split_invalid_sequence() {
        let text = Text::utf8();
        let mut c = chain(1);
        super::super::write_bytes(&mut c, &[0xE2, 0x28, 0xA1]); // malformed
        assert!(text.read_str(&mut c, 3).is_err());
    }

    #[test]
    fn test_text_rejects_truncated_tail() {
        let text = Text::utf8();
        let mut c = chain(4);
        super::super::write_bytes(&mut c, &[0xF0, 0x9F, 0xA6]); // 3 of 4 bytes
        assert!(text.read_str(&mut c, 3).is_err());
        // Failed decode leaves the cursor untouched.
        assert_eq!(c.position_offset(), 0);
    }

    #[test]
    fn test_text_write_chars() {
        let text = Text::utf8();
        let mut c = chain(2);
        text.write_chars(&mut c, &['a', 'β', '🦀']).unwrap();
        let n = c.total_size();
        assert_eq!(text.read_chars(&mut c, n).unwrap(), vec!['a', 'β', '🦀']);
    }
}
