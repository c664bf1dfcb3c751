//! The buffer façade: one value type over a unit chain.
//!
//! [`Buffer`] is the surface the rest of a program talks to. It owns a
//! [`UnitChain`], keeps the chain's structural invariant away from
//! callers, and exposes the cursor, random access, codecs, splicing and
//! search as plain methods. Indices are absolute offsets into the
//! buffer's content, `[0, size)`; the cursor walks `[position, size)`.

use std::cmp::Ordering;
use std::fmt;

use crate::chain::{NodeId, UnitChain};
use crate::codec::{self, Charset, Text, ValueCodec};
use crate::error::{BufferError, Result};
use crate::pool::{LocalPool, UnitPool, DEFAULT_UNIT_CAPACITY};
use crate::search::ByteKmp;
use crate::unit::Unit;

/// Destination for raw bytes.
///
/// Implemented by `Vec<u8>` and by [`Buffer`] itself, so drains and
/// charset encoders write through one seam.
pub trait ByteSink {
    /// Append `bytes` to the sink.
    fn put_slice(&mut self, bytes: &[u8]);
}

impl ByteSink for Vec<u8> {
    fn put_slice(&mut self, bytes: &[u8]) {
        self.extend_from_slice(bytes);
    }
}

impl<P: UnitPool> ByteSink for Buffer<P> {
    fn put_slice(&mut self, bytes: &[u8]) {
        self.write_slice(bytes);
    }
}

/// A segmented, growable byte buffer with a read cursor.
///
/// Content lives in fixed-capacity [`Unit`]s linked into a chain;
/// writes fill the tail, reads advance a cursor from the front, and
/// splicing operations (`split`, `drain_to`, `compact`) move whole
/// units instead of copying payload bytes.
///
/// # Examples
///
/// ```
/// use chainbuf::{Buffer, codec::U32Be};
///
/// let mut buf = Buffer::new();
/// buf.write_value(U32Be, 0xDEAD_BEEF);
/// buf.write_slice(b"tail");
/// assert_eq!(buf.read_value(U32Be).unwrap(), 0xDEAD_BEEF);
/// assert_eq!(buf.index_of(b't'), Some(4));
/// ```
pub struct Buffer<P: UnitPool = LocalPool> {
    chain: UnitChain<P>,
}

impl Buffer<LocalPool> {
    /// An empty buffer growing in units of
    /// [`DEFAULT_UNIT_CAPACITY`] bytes.
    #[must_use]
    pub fn new() -> Self {
        Self::with_unit_capacity(DEFAULT_UNIT_CAPACITY)
    }

    /// An empty buffer growing in units of `unit_capacity` bytes.
    #[must_use]
    pub fn with_unit_capacity(unit_capacity: usize) -> Self {
        Self::with_pool(LocalPool, unit_capacity)
    }
}

impl Default for Buffer<LocalPool> {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&[u8]> for Buffer<LocalPool> {
    fn from(bytes: &[u8]) -> Self {
        let mut buf = Self::new();
        buf.write_slice(bytes);
        buf
    }
}

impl From<Vec<u8>> for Buffer<LocalPool> {
    fn from(bytes: Vec<u8>) -> Self {
        Self::from(bytes.as_slice())
    }
}

impl<P: UnitPool> Extend<u8> for Buffer<P> {
    fn extend<T: IntoIterator<Item = u8>>(&mut self, iter: T) {
        for byte in iter {
            codec::write_bytes(&mut self.chain, &[byte]);
        }
    }
}

impl<P: UnitPool> Buffer<P> {
    /// An empty buffer drawing `unit_capacity`-byte units from `pool`.
    pub fn with_pool(pool: P, unit_capacity: usize) -> Self {
        Self {
            chain: UnitChain::new(pool, unit_capacity),
        }
    }

    /// The underlying chain, for structural inspection.
    #[must_use]
    pub fn chain(&self) -> &UnitChain<P> {
        &self.chain
    }

    // === Extents ===

    /// Total content bytes, consumed and unread.
    #[must_use]
    pub fn size(&self) -> usize {
        self.chain.total_size()
    }

    /// Absolute offset of the read cursor.
    #[must_use]
    pub fn position(&self) -> usize {
        self.chain.position_offset()
    }

    /// Unread bytes, `size() - position()`.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.chain.remaining()
    }

    /// True when no unread bytes remain.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Number of units in the chain.
    #[must_use]
    pub fn unit_count(&self) -> usize {
        self.chain.node_count()
    }

    // === Cursor reads and tail writes ===

    /// Read one byte at the cursor.
    ///
    /// # Errors
    ///
    /// [`BufferError::Underflow`] when no unread bytes remain.
    pub fn read(&mut self) -> Result<u8> {
        codec::read_byte(&mut self.chain)
    }

    /// Append one byte at the tail.
    pub fn write(&mut self, byte: u8) {
        codec::write_bytes(&mut self.chain, &[byte]);
    }

    /// Read exactly `dst.len()` bytes at the cursor.
    ///
    /// # Errors
    ///
    /// [`BufferError::Underflow`] when fewer bytes remain; the cursor is
    /// left untouched.
    pub fn read_slice(&mut self, dst: &mut [u8]) -> Result<()> {
        codec::read_exact(&mut self.chain, dst)
    }

    /// Append `src` at the tail, growing the chain as needed.
    pub fn write_slice(&mut self, src: &[u8]) {
        codec::write_bytes(&mut self.chain, src);
    }

    /// Advance the cursor by up to `n` bytes, returning how many were
    /// actually skipped.
    pub fn skip(&mut self, n: usize) -> usize {
        let count = n.min(self.remaining());
        self.chain.consume(count);
        count
    }

    // === Mark and reset ===

    /// Remember the current cursor position for a later
    /// [`reset`](Self::reset).
    pub fn mark(&mut self) {
        let id = self.chain.position_id();
        self.chain.unit_mut(id).mark_here();
        self.chain.set_mark_id(id);
    }

    /// Move the cursor back to the last [`mark`](Self::mark), or to the
    /// front if none was set since the last structural change.
    pub fn reset(&mut self) {
        let mark = self.chain.mark_id();
        let old_position = self.chain.position_id();
        if mark != old_position {
            // Units between the mark and the cursor were fully
            // consumed; their bytes become unread again.
            let mut id = self.chain.next_id(mark);
            while let Some(n) = id {
                self.chain.unit_mut(n).set_position(0);
                if n == old_position {
                    break;
                }
                id = self.chain.next_id(n);
            }
        }
        self.chain.unit_mut(mark).reset_to_mark();
        self.chain.set_position_id(mark);
    }

    /// Move the cursor back to the first byte and clear the mark.
    pub fn rewind(&mut self) {
        let ids: Vec<NodeId> = self.chain.ids().collect();
        for id in ids {
            let unit = self.chain.unit_mut(id);
            unit.set_position(0);
            unit.mark_here();
        }
        let head = self.chain.head_id();
        self.chain.set_position_id(head);
        self.chain.set_mark_id(head);
    }

    // === Random access ===

    /// The byte at absolute offset `index`, cursor untouched.
    ///
    /// # Errors
    ///
    /// [`BufferError::OutOfBounds`] when `index >= size()`.
    pub fn get(&self, index: usize) -> Result<u8> {
        let mut raw = [0u8; 1];
        codec::get_bytes(&self.chain, index, &mut raw)?;
        Ok(raw[0])
    }

    /// Overwrite the byte at absolute offset `index`, cursor untouched.
    ///
    /// # Errors
    ///
    /// [`BufferError::OutOfBounds`] when `index >= size()`.
    pub fn set(&mut self, index: usize, value: u8) -> Result<()> {
        codec::set_bytes(&mut self.chain, index, &[value])
    }

    /// Copy `[index, index + dst.len())` into `dst`, cursor untouched.
    ///
    /// # Errors
    ///
    /// [`BufferError::OutOfBounds`] when the range does not lie within
    /// `[0, size())`; `dst` is then left unmodified.
    pub fn get_slice(&self, index: usize, dst: &mut [u8]) -> Result<()> {
        codec::get_bytes(&self.chain, index, dst)
    }

    /// Overwrite `[index, index + src.len())` from `src`, cursor
    /// untouched.
    ///
    /// # Errors
    ///
    /// [`BufferError::OutOfBounds`] when the range does not lie within
    /// `[0, size())`; the buffer is then left unmodified.
    pub fn set_slice(&mut self, index: usize, src: &[u8]) -> Result<()> {
        codec::set_bytes(&mut self.chain, index, src)
    }

    /// Write `src` in front of the first byte, consuming head headroom
    /// right to left and splicing fresh units when it runs out.
    ///
    /// # Errors
    ///
    /// [`BufferError::Unsupported`] once the cursor has advanced:
    /// prepending below consumed bytes would resurrect them.
    pub fn prepend_slice(&mut self, src: &[u8]) -> Result<()> {
        self.check_prependable()?;
        codec::prepend_bytes(&mut self.chain, src);
        Ok(())
    }

    // === Typed values ===

    /// Decode a value at the cursor, advancing it on success.
    ///
    /// # Errors
    ///
    /// Whatever the codec reports; on error the cursor is untouched.
    pub fn read_value<C: ValueCodec>(&mut self, codec: C) -> Result<C::Value> {
        codec.read(&mut self.chain)
    }

    /// Encode a value at the tail.
    pub fn write_value<C: ValueCodec>(&mut self, codec: C, value: C::Value) {
        codec.write(&mut self.chain, value);
    }

    /// Decode a value at absolute offset `index`, cursor untouched.
    ///
    /// # Errors
    ///
    /// [`BufferError::OutOfBounds`] when the encoding does not fit in
    /// `[index, size)`, plus any codec error.
    pub fn get_value<C: ValueCodec>(&self, codec: C, index: usize) -> Result<C::Value> {
        codec.get(&self.chain, index)
    }

    /// Re-encode a value over the bytes at absolute offset `index`,
    /// cursor untouched.
    ///
    /// # Errors
    ///
    /// [`BufferError::OutOfBounds`] when the encoding does not fit in
    /// `[index, size)`.
    pub fn set_value<C: ValueCodec>(&mut self, codec: C, index: usize, value: C::Value) -> Result<()> {
        codec.set(&mut self.chain, index, value)
    }

    /// Encode a value in front of the first byte.
    ///
    /// # Errors
    ///
    /// [`BufferError::Unsupported`] once the cursor has advanced:
    /// prepending below consumed bytes would resurrect them.
    pub fn prepend_value<C: ValueCodec>(&mut self, codec: C, value: C::Value) -> Result<()> {
        self.check_prependable()?;
        codec.prepend(&mut self.chain, value);
        Ok(())
    }

    // === Text ===

    /// Append `text` as UTF-8 at the tail.
    ///
    /// # Errors
    ///
    /// Propagates charset failures (none for UTF-8).
    pub fn write_str(&mut self, text: &str) -> Result<()> {
        Text::utf8().write_str(&mut self.chain, text)
    }

    /// Decode `byte_len` UTF-8 bytes at the cursor, advancing it on
    /// success.
    ///
    /// # Errors
    ///
    /// [`BufferError::Underflow`] when fewer bytes remain,
    /// [`BufferError::InvalidArgument`] on malformed UTF-8; either way
    /// the cursor is untouched.
    pub fn read_str(&mut self, byte_len: usize) -> Result<String> {
        Text::utf8().read_str(&mut self.chain, byte_len)
    }

    /// Decode `byte_len` UTF-8 bytes at absolute offset `index`, cursor
    /// untouched.
    ///
    /// # Errors
    ///
    /// Same as [`read_str`](Self::read_str), with
    /// [`BufferError::OutOfBounds`] for a range past the content.
    pub fn get_str(&self, index: usize, byte_len: usize) -> Result<String> {
        Text::utf8().get_str(&self.chain, index, byte_len)
    }

    /// Encode `text` as UTF-8 in front of the first byte.
    ///
    /// # Errors
    ///
    /// [`BufferError::Unsupported`] once the cursor has advanced.
    pub fn prepend_str(&mut self, text: &str) -> Result<()> {
        self.check_prependable()?;
        Text::utf8().prepend_str(&mut self.chain, text)
    }

    /// Append `text` through a caller-supplied charset codec.
    ///
    /// # Errors
    ///
    /// Propagates the charset's encoding failures.
    pub fn write_text<C: Charset>(&mut self, codec: &Text<C>, text: &str) -> Result<()> {
        codec.write_str(&mut self.chain, text)
    }

    /// Decode `byte_len` bytes at the cursor through `codec`, advancing
    /// the cursor on success.
    ///
    /// # Errors
    ///
    /// [`BufferError::Underflow`] when fewer bytes remain, plus the
    /// charset's decoding failures; the cursor is untouched on error.
    pub fn read_text<C: Charset>(&mut self, codec: &Text<C>, byte_len: usize) -> Result<String> {
        codec.read_str(&mut self.chain, byte_len)
    }

    /// Decode `byte_len` bytes at absolute offset `index` through
    /// `codec`, cursor untouched.
    ///
    /// # Errors
    ///
    /// [`BufferError::OutOfBounds`] for a range past the content, plus
    /// the charset's decoding failures.
    pub fn get_text<C: Charset>(&self, codec: &Text<C>, index: usize, byte_len: usize) -> Result<String> {
        codec.get_str(&self.chain, index, byte_len)
    }

    /// Encode `text` through `codec` in front of the first byte.
    ///
    /// # Errors
    ///
    /// [`BufferError::Unsupported`] once the cursor has advanced, plus
    /// the charset's encoding failures.
    pub fn prepend_text<C: Charset>(&mut self, codec: &Text<C>, text: &str) -> Result<()> {
        self.check_prependable()?;
        codec.prepend_str(&mut self.chain, text)
    }

    // === Unit splicing ===

    /// Splice a unit onto the tail without copying its bytes.
    pub fn append_unit(&mut self, unit: Unit) {
        self.chain.append_unit(unit);
    }

    /// Splice a unit in front of the first byte without copying.
    ///
    /// # Errors
    ///
    /// [`BufferError::Unsupported`] once the cursor has advanced.
    pub fn prepend_unit(&mut self, unit: Unit) -> Result<()> {
        self.check_prependable()?;
        self.chain.prepend_unit(unit);
        Ok(())
    }

    fn check_prependable(&self) -> Result<()> {
        if self.position() == 0 {
            Ok(())
        } else {
            Err(BufferError::Unsupported("prepend after the cursor advanced"))
        }
    }

    /// Discard consumed bytes: fully-consumed leading units return to
    /// the pool and the boundary unit compacts in place, its reclaimed
    /// room becoming prepend headroom. Indices shift down by the old
    /// [`position`](Self::position); the mark is dropped.
    pub fn compact(&mut self) {
        loop {
            if self.chain.node_count() == 1 {
                break;
            }
            let head = self.chain.head_id();
            if self.chain.unit(head).remaining() > 0 {
                break;
            }
            let unit = self.chain.remove_head();
            self.chain.recycle(unit);
        }
        let head = self.chain.head_id();
        self.chain.unit_mut(head).compact();
        self.chain.normalize_cursor();
        tracing::trace!(size = self.size(), units = self.unit_count(), "buffer compacted");
    }

    /// Cut the buffer at absolute offset `at`: `self` keeps `[0, at)`,
    /// the returned buffer takes `[at, size)`. Whole trailing units are
    /// relinked, not copied; only a unit straddling the cut is split.
    /// Both cursors are re-pointed at the first unread byte of their
    /// side and marks are dropped.
    ///
    /// # Errors
    ///
    /// [`BufferError::InvalidArgument`] when `at > size()`.
    pub fn split(&mut self, at: usize) -> Result<Self>
    where
        P: Clone,
    {
        let total = self.size();
        if at > total {
            return Err(BufferError::InvalidArgument("split offset past buffer size"));
        }
        let mut moved: Vec<Unit> = Vec::new();
        if at < total {
            // First node in which `at` falls strictly inside or at the
            // front.
            let mut skip = at;
            let mut node = self.chain.head_id();
            loop {
                let unit_size = self.chain.unit(node).size();
                if skip < unit_size {
                    break;
                }
                skip -= unit_size;
                node = self.chain.next_id(node).expect("cut offset within content");
            }
            if skip > 0 {
                // The straddling unit is the only allocation a split can
                // need, and it comes from the pool like every other unit.
                let spare = self.chain.pool().take(self.chain.unit(node).capacity());
                let tail = self.chain.unit_mut(node).split_off(skip, spare);
                moved.push(tail);
                if let Some(next) = self.chain.next_id(node) {
                    moved.extend(self.chain.detach_from(next));
                }
            } else {
                moved.extend(self.chain.detach_from(node));
            }
        }
        self.chain.normalize_cursor();
        let pool = self.chain.pool().clone();
        let sibling = UnitChain::from_units(pool, self.chain.unit_capacity(), moved);
        tracing::trace!(at, kept = self.size(), split = sibling.total_size(), "buffer split");
        Ok(Self { chain: sibling })
    }

    /// Drop all content and recycle every unit, leaving one fresh empty
    /// unit.
    pub fn drain(&mut self) {
        for unit in self.chain.detach_all() {
            self.chain.recycle(unit);
        }
    }

    /// Move all unread content to the tail of `other` by relinking
    /// units; consumed bytes are discarded first and emptied units go
    /// back to the pool. `other`'s cursor and mark stay where they are.
    pub fn drain_to(&mut self, other: &mut Self) {
        self.compact();
        let moved = self.chain.detach_all();
        tracing::trace!(units = moved.len(), "buffer drained into sibling");
        for unit in moved {
            if unit.is_empty() {
                self.chain.recycle(unit);
            } else {
                other.chain.append_unit(unit);
            }
        }
    }

    /// Copy all unread content into `sink`, then drop it and recycle
    /// the units.
    pub fn drain_into<S: ByteSink + ?Sized>(&mut self, sink: &mut S) {
        for window in self.chain.windows() {
            sink.put_slice(window);
        }
        self.drain();
    }

    /// Iterate the unread content as one read-only window per unit.
    pub fn chunks(&self) -> impl Iterator<Item = &[u8]> + '_ {
        self.chain.windows()
    }

    /// Copy the unread content into a fresh vector.
    #[must_use]
    pub fn to_vec(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.remaining());
        for window in self.chain.windows() {
            out.extend_from_slice(window);
        }
        out
    }

    // === Single-byte search ===

    /// Offset of the first `byte` at or after the cursor.
    #[must_use]
    pub fn index_of(&self, byte: u8) -> Option<usize> {
        self.index_of_from(byte, self.position())
    }

    /// Offset of the first `byte` at or after absolute offset `from`.
    #[must_use]
    pub fn index_of_from(&self, byte: u8, from: usize) -> Option<usize> {
        let mut begin_abs = 0usize;
        for id in self.chain.ids() {
            let contents = self.chain.unit(id).contents();
            let end_abs = begin_abs + contents.len();
            if end_abs > from {
                let begin = from.saturating_sub(begin_abs);
                if let Some(i) = memchr::memchr(byte, &contents[begin..]) {
                    return Some(begin_abs + begin + i);
                }
            }
            begin_abs = end_abs;
        }
        None
    }

    /// Offset of the last `byte` in the whole content.
    #[must_use]
    pub fn last_index_of(&self, byte: u8) -> Option<usize> {
        self.last_index_of_from(byte, self.size())
    }

    /// Offset of the last `byte` strictly before absolute offset `from`.
    #[must_use]
    pub fn last_index_of_from(&self, byte: u8, from: usize) -> Option<usize> {
        let from = from.min(self.size());
        let mut end_abs = self.size();
        let mut id = Some(self.chain.last_id());
        while let Some(n) = id {
            let contents = self.chain.unit(n).contents();
            let begin_abs = end_abs - contents.len();
            if !contents.is_empty() && begin_abs < from {
                let window_end = from.min(end_abs) - begin_abs;
                if let Some(i) = memchr::memrchr(byte, &contents[..window_end]) {
                    return Some(begin_abs + i);
                }
            }
            end_abs = begin_abs;
            id = self.chain.prev_id(n);
        }
        None
    }

    // === Literal sequence search ===

    /// Offset of the first occurrence of `needle` at or after the
    /// cursor. The empty needle matches at the cursor.
    #[must_use]
    pub fn find(&self, needle: &[u8]) -> Option<usize> {
        self.find_from(needle, self.position())
    }

    /// Offset of the first occurrence of `needle` at or after absolute
    /// offset `from`.
    #[must_use]
    pub fn find_from(&self, needle: &[u8], from: usize) -> Option<usize> {
        let size = self.size();
        if needle.is_empty() {
            return Some(from.min(size));
        }
        if needle.len() > size {
            return None;
        }
        let last_start = size - needle.len();
        let mut begin_abs = 0usize;
        for id in self.chain.ids() {
            let contents = self.chain.unit(id).contents();
            let mut offset = from.saturating_sub(begin_abs);
            while offset < contents.len() {
                let Some(delta) = memchr::memchr(needle[0], &contents[offset..]) else {
                    break;
                };
                let candidate = offset + delta;
                if begin_abs + candidate > last_start {
                    return None;
                }
                if self.match_at(id, candidate, needle) {
                    return Some(begin_abs + candidate);
                }
                offset = candidate + 1;
            }
            begin_abs += contents.len();
        }
        None
    }

    /// Offset of the last occurrence of `needle` in the whole content.
    #[must_use]
    pub fn rfind(&self, needle: &[u8]) -> Option<usize> {
        self.rfind_from(needle, self.size())
    }

    /// Offset of the last occurrence of `needle` starting at or before
    /// absolute offset `from`.
    #[must_use]
    pub fn rfind_from(&self, needle: &[u8], from: usize) -> Option<usize> {
        let size = self.size();
        if needle.is_empty() {
            return Some(from.min(size));
        }
        if needle.len() > size {
            return None;
        }
        let candidate_max = from.min(size - needle.len());
        let mut end_abs = size;
        let mut id = Some(self.chain.last_id());
        while let Some(n) = id {
            let contents = self.chain.unit(n).contents();
            let begin_abs = end_abs - contents.len();
            if !contents.is_empty() && begin_abs <= candidate_max {
                let hi = (candidate_max - begin_abs).min(contents.len() - 1);
                let mut window_end = hi + 1;
                while window_end > 0 {
                    let Some(i) = memchr::memrchr(needle[0], &contents[..window_end]) else {
                        break;
                    };
                    if self.match_at(n, i, needle) {
                        return Some(begin_abs + i);
                    }
                    window_end = i;
                }
            }
            end_abs = begin_abs;
            id = self.chain.prev_id(n);
        }
        None
    }

    /// Whether `needle` occurs starting at `start_off` within the unit
    /// at `start_id`, continuing across unit boundaries.
    fn match_at(&self, start_id: NodeId, start_off: usize, needle: &[u8]) -> bool {
        let mut id = start_id;
        let mut offset = start_off;
        let mut matched = 0usize;
        loop {
            let unit = self.chain.unit(id);
            let n = unit.matches_prefix(offset, &needle[matched..]);
            matched += n;
            if matched == needle.len() {
                return true;
            }
            if n < unit.size() - offset {
                return false; // mismatch inside this window
            }
            match self.chain.next_id(id) {
                Some(next) => {
                    id = next;
                    offset = 0;
                }
                None => return false,
            }
        }
    }

    // === KMP search ===

    /// Offset of the first match of `pattern` at or after the cursor.
    #[must_use]
    pub fn search(&self, pattern: &ByteKmp) -> Option<usize> {
        self.search_from(pattern, self.position())
    }

    /// Offset of the first match of `pattern` at or after absolute
    /// offset `from`.
    #[must_use]
    pub fn search_from(&self, pattern: &ByteKmp, from: usize) -> Option<usize> {
        let from = from.min(self.size());
        if pattern.is_empty() {
            return Some(from);
        }
        pattern
            .find_in_windows(self.windows_from(from))
            .map(|i| from + i)
    }

    /// Offset of the last match of `pattern` in the whole content.
    #[must_use]
    pub fn rsearch(&self, pattern: &ByteKmp) -> Option<usize> {
        self.rsearch_from(pattern, self.size())
    }

    /// Offset of the last match of `pattern` starting at or before
    /// absolute offset `from`.
    #[must_use]
    pub fn rsearch_from(&self, pattern: &ByteKmp, from: usize) -> Option<usize> {
        let size = self.size();
        if pattern.is_empty() {
            return Some(from.min(size));
        }
        if pattern.len() > size {
            return None;
        }
        let end = from.min(size - pattern.len()) + pattern.len();
        pattern.rfind_in_windows(self.windows_rev(end), end)
    }

    /// Per-unit windows of `[from, size)`, skipping empties.
    fn windows_from(&self, from: usize) -> impl Iterator<Item = &[u8]> + '_ {
        let mut begin_abs = 0usize;
        self.chain.ids().filter_map(move |id| {
            let contents = self.chain.unit(id).contents();
            let begin = from.saturating_sub(begin_abs);
            begin_abs += contents.len();
            if begin >= contents.len() {
                return None;
            }
            Some(&contents[begin..])
        })
    }

    /// Per-unit windows of `[0, end)` in reverse chain order, skipping
    /// empties.
    fn windows_rev(&self, end: usize) -> impl Iterator<Item = &[u8]> + '_ {
        let mut cursor = Some(self.chain.last_id());
        let mut end_abs = self.size();
        std::iter::from_fn(move || loop {
            let id = cursor?;
            cursor = self.chain.prev_id(id);
            let contents = self.chain.unit(id).contents();
            let begin_abs = end_abs - contents.len();
            end_abs = begin_abs;
            if begin_abs >= end {
                continue;
            }
            let clip = end.min(begin_abs + contents.len()) - begin_abs;
            if clip == 0 {
                continue;
            }
            return Some(&contents[..clip]);
        })
    }

    fn cmp_content(&self, other: &Self) -> Ordering {
        let mut left = self.chunks();
        let mut right = other.chunks();
        let mut left_window: &[u8] = &[];
        let mut right_window: &[u8] = &[];
        loop {
            if left_window.is_empty() {
                left_window = left.next().unwrap_or(&[]);
            }
            if right_window.is_empty() {
                right_window = right.next().unwrap_or(&[]);
            }
            match (left_window.is_empty(), right_window.is_empty()) {
                (true, true) => return Ordering::Equal,
                (true, false) => return Ordering::Less,
                (false, true) => return Ordering::Greater,
                (false, false) => {}
            }
            let n = left_window.len().min(right_window.len());
            match left_window[..n].cmp(&right_window[..n]) {
                Ordering::Equal => {
                    left_window = &left_window[n..];
                    right_window = &right_window[n..];
                }
                unequal => return unequal,
            }
        }
    }
}

impl<P: UnitPool> PartialEq for Buffer<P> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp_content(other) == Ordering::Equal
    }
}

impl<P: UnitPool> Eq for Buffer<P> {}

impl<P: UnitPool> PartialOrd for Buffer<P> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<P: UnitPool> Ord for Buffer<P> {
    /// Lexicographic order over the unread content.
    fn cmp(&self, other: &Self) -> Ordering {
        self.cmp_content(other)
    }
}

impl<P: UnitPool> fmt::Debug for Buffer<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Buffer")
            .field("size", &self.size())
            .field("position", &self.position())
            .field("units", &self.unit_count())
            .finish()
    }
}
