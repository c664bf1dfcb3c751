//! Fixed-capacity storage segment.
//!
//! A [`Unit`] is one contiguous segment of a chained buffer: a
//! fixed-capacity byte array with a valid-data window `[start,
//! start + size)` and a read cursor `position` measured relative to
//! `start`. Units are created by a [`UnitPool`](crate::pool::UnitPool)
//! and recycled when a chain shrinks or a buffer drains.
//!
//! Index arguments on `Unit` are relative to `start` unless stated
//! otherwise. Unit-level bounds violations panic: the [`Buffer`]
//! façade validates first and surfaces [`BufferError`] instead, so a
//! panic here indicates a bug inside the crate, not caller misuse.
//!
//! [`Buffer`]: crate::buffer::Buffer
//! [`BufferError`]: crate::error::BufferError

/// A fixed-capacity contiguous byte segment.
///
/// Invariants: `start + size <= capacity` and `0 <= position <= size`.
/// A unit is *appendable* while it has tail headroom and *prependable*
/// while it has head headroom.
///
/// # Examples
///
/// ```
/// use chainbuf::unit::Unit;
///
/// let mut unit = Unit::new(8);
/// assert_eq!(unit.push_slice(b"hello"), 5);
/// assert_eq!(unit.byte_at(0), b'h');
/// assert_eq!(unit.size(), 5);
/// assert!(unit.is_appendable());
/// ```
#[derive(Clone)]
pub struct Unit {
    data: Box<[u8]>,
    start: usize,
    size: usize,
    position: usize,
    mark: usize,
}

impl Unit {
    /// Create an empty unit with the given fixed capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            data: vec![0u8; capacity].into_boxed_slice(),
            start: 0,
            size: 0,
            position: 0,
            mark: 0,
        }
    }

    /// The fixed capacity chosen at creation.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Offset of the first valid byte.
    #[inline]
    #[must_use]
    pub fn start(&self) -> usize {
        self.start
    }

    /// Count of valid bytes from `start`.
    #[inline]
    #[must_use]
    pub fn size(&self) -> usize {
        self.size
    }

    /// The read cursor, relative to `start` (`0..=size`).
    #[inline]
    #[must_use]
    pub fn position(&self) -> usize {
        self.position
    }

    /// Unread bytes left in this unit.
    #[inline]
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.size - self.position
    }

    /// Returns true if the unit holds no valid bytes.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Returns true if the unit has tail headroom for appends.
    #[inline]
    #[must_use]
    pub fn is_appendable(&self) -> bool {
        self.start + self.size < self.capacity()
    }

    /// Returns true if the unit has head headroom for prepends.
    #[inline]
    #[must_use]
    pub fn is_prependable(&self) -> bool {
        self.start > 0
    }

    /// Free bytes past the end of the valid window.
    #[inline]
    #[must_use]
    pub fn tail_room(&self) -> usize {
        self.capacity() - self.start - self.size
    }

    /// Free bytes before the start of the valid window.
    #[inline]
    #[must_use]
    pub fn head_room(&self) -> usize {
        self.start
    }

    // === Indexed access (relative to `start`) ===

    /// Byte at offset `i`.
    ///
    /// # Panics
    ///
    /// Panics if `i >= size`.
    #[inline]
    #[must_use]
    pub fn byte_at(&self, i: usize) -> u8 {
        assert!(i < self.size, "byte_at out of range: i={i}, size={}", self.size);
        self.data[self.start + i]
    }

    /// Overwrite the byte at offset `i`.
    ///
    /// # Panics
    ///
    /// Panics if `i >= size`.
    #[inline]
    pub fn set_byte(&mut self, i: usize, value: u8) {
        assert!(i < self.size, "set_byte out of range: i={i}, size={}", self.size);
        self.data[self.start + i] = value;
    }

    /// Fill `count` bytes starting at offset `i` with `value`.
    ///
    /// # Panics
    ///
    /// Panics if `i + count > size`.
    pub fn fill(&mut self, i: usize, value: u8, count: usize) {
        assert!(
            i + count <= self.size,
            "fill out of range: i={i}, count={count}, size={}",
            self.size
        );
        self.data[self.start + i..self.start + i + count].fill(value);
    }

    /// Copy `dst.len()` bytes starting at offset `i` into `dst`.
    ///
    /// # Panics
    ///
    /// Panics if `i + dst.len() > size`.
    pub fn copy_to_slice(&self, i: usize, dst: &mut [u8]) {
        assert!(
            i + dst.len() <= self.size,
            "copy_to_slice out of range: i={i}, len={}, size={}",
            dst.len(),
            self.size
        );
        dst.copy_from_slice(&self.data[self.start + i..self.start + i + dst.len()]);
    }

    /// Overwrite `src.len()` bytes starting at offset `i` from `src`.
    ///
    /// # Panics
    ///
    /// Panics if `i + src.len() > size`.
    pub fn copy_from_slice(&mut self, i: usize, src: &[u8]) {
        assert!(
            i + src.len() <= self.size,
            "copy_from_slice out of range: i={i}, len={}, size={}",
            src.len(),
            self.size
        );
        self.data[self.start + i..self.start + i + src.len()].copy_from_slice(src);
    }

    // === Typed native-order access ===

    /// Read a native-endian `u16` at offset `i`.
    #[must_use]
    pub fn get_u16_ne(&self, i: usize) -> u16 {
        let mut raw = [0u8; 2];
        self.copy_to_slice(i, &mut raw);
        u16::from_ne_bytes(raw)
    }

    /// Write a native-endian `u16` at offset `i`.
    pub fn set_u16_ne(&mut self, i: usize, value: u16) {
        self.copy_from_slice(i, &value.to_ne_bytes());
    }

    /// Read a native-endian `u32` at offset `i`.
    #[must_use]
    pub fn get_u32_ne(&self, i: usize) -> u32 {
        let mut raw = [0u8; 4];
        self.copy_to_slice(i, &mut raw);
        u32::from_ne_bytes(raw)
    }

    /// Write a native-endian `u32` at offset `i`.
    pub fn set_u32_ne(&mut self, i: usize, value: u32) {
        self.copy_from_slice(i, &value.to_ne_bytes());
    }

    /// Read a native-endian `u64` at offset `i`.
    #[must_use]
    pub fn get_u64_ne(&self, i: usize) -> u64 {
        let mut raw = [0u8; 8];
        self.copy_to_slice(i, &mut raw);
        u64::from_ne_bytes(raw)
    }

    /// Write a native-endian `u64` at offset `i`.
    pub fn set_u64_ne(&mut self, i: usize, value: u64) {
        self.copy_from_slice(i, &value.to_ne_bytes());
    }

    /// Read a native-endian `f32` at offset `i`.
    #[must_use]
    pub fn get_f32_ne(&self, i: usize) -> f32 {
        f32::from_bits(self.get_u32_ne(i))
    }

    /// Write a native-endian `f32` at offset `i`.
    pub fn set_f32_ne(&mut self, i: usize, value: f32) {
        self.set_u32_ne(i, value.to_bits());
    }

    /// Read a native-endian `f64` at offset `i`.
    #[must_use]
    pub fn get_f64_ne(&self, i: usize) -> f64 {
        f64::from_bits(self.get_u64_ne(i))
    }

    /// Write a native-endian `f64` at offset `i`.
    pub fn set_f64_ne(&mut self, i: usize, value: f64) {
        self.set_u64_ne(i, value.to_bits());
    }

    // === Append / prepend ===

    /// Append as much of `src` as fits in the tail headroom.
    ///
    /// Returns the number of bytes written, which may be zero.
    pub fn push_slice(&mut self, src: &[u8]) -> usize {
        let n = src.len().min(self.tail_room());
        let at = self.start + self.size;
        self.data[at..at + n].copy_from_slice(&src[..n]);
        self.size += n;
        n
    }

    /// Append one byte if tail headroom allows.
    pub fn push_byte(&mut self, value: u8) -> bool {
        if self.tail_room() == 0 {
            return false;
        }
        self.data[self.start + self.size] = value;
        self.size += 1;
        true
    }

    /// Prepend `src` immediately before the valid window.
    ///
    /// # Panics
    ///
    /// Panics if `src.len() > head_room()`.
    pub fn prepend_slice(&mut self, src: &[u8]) {
        assert!(
            src.len() <= self.start,
            "prepend_slice out of room: len={}, head_room={}",
            src.len(),
            self.start
        );
        let at = self.start - src.len();
        self.data[at..self.start].copy_from_slice(src);
        self.start = at;
        self.size += src.len();
    }

    /// Move the valid window to the very end of the segment so the
    /// entire capacity becomes head headroom. Only legal while empty;
    /// used when splicing a fresh unit in front of a chain.
    pub(crate) fn open_head_room(&mut self) {
        assert!(self.size == 0, "open_head_room on non-empty unit");
        self.start = self.capacity();
        self.position = 0;
        self.mark = 0;
    }

    // === Cursor ===

    /// Copy up to `dst.len()` unread bytes into `dst`, advancing the
    /// cursor. Returns the number of bytes copied.
    pub fn read_slice(&mut self, dst: &mut [u8]) -> usize {
        let n = dst.len().min(self.remaining());
        let at = self.start + self.position;
        dst[..n].copy_from_slice(&self.data[at..at + n]);
        self.position += n;
        n
    }

    /// Consume and return the next unread byte, if any.
    pub fn read_byte(&mut self) -> Option<u8> {
        if self.position == self.size {
            return None;
        }
        let b = self.data[self.start + self.position];
        self.position += 1;
        Some(b)
    }

    /// Advance the cursor by `n` bytes.
    ///
    /// # Panics
    ///
    /// Panics if `position + n > size`.
    pub fn advance(&mut self, n: usize) {
        assert!(
            self.position + n <= self.size,
            "advance past readable window: n={n}, remaining={}",
            self.remaining()
        );
        self.position += n;
    }

    /// Reposition the cursor.
    ///
    /// # Panics
    ///
    /// Panics if `position > size`.
    pub fn set_position(&mut self, position: usize) {
        assert!(
            position <= self.size,
            "set_position out of range: position={position}, size={}",
            self.size
        );
        self.position = position;
    }

    /// Save the current cursor as the mark.
    pub fn mark_here(&mut self) {
        self.mark = self.position;
    }

    /// Rewind the cursor to the saved mark.
    pub fn reset_to_mark(&mut self) {
        self.position = self.mark;
    }

    // === Windows ===

    /// The unread window `[position, size)`.
    #[must_use]
    pub fn readable(&self) -> &[u8] {
        &self.data[self.start + self.position..self.start + self.size]
    }

    /// The full valid window `[0, size)`.
    #[must_use]
    pub fn contents(&self) -> &[u8] {
        &self.data[self.start..self.start + self.size]
    }

    // === Structural ===

    /// Discard already-consumed leading bytes: `start` moves forward by
    /// `position`, the cursor and mark reset to zero. O(1); the bytes
    /// themselves stay where they are and the reclaimed room becomes
    /// head headroom.
    pub fn compact(&mut self) {
        self.start += self.position;
        self.size -= self.position;
        self.position = 0;
        self.mark = 0;
    }

    /// Reset every field to the empty state.
    pub fn clear(&mut self) {
        self.start = 0;
        self.size = 0;
        self.position = 0;
        self.mark = 0;
    }

    /// Cut the valid window at offset `at`, moving the tail `[at, size)`
    /// into `tail` and returning it. The caller supplies `tail` as a
    /// fresh unit, taken from whatever pool owns this one; the unit
    /// itself never allocates. The tail bytes are copied (bounded by one
    /// unit); bytes before the cut are untouched. Cursor and mark are
    /// distributed so that each side keeps its own share.
    ///
    /// # Panics
    ///
    /// Panics if `at > size`, if `tail` is not fresh, or if the moved
    /// bytes do not fit in it.
    #[must_use]
    pub fn split_off(&mut self, at: usize, mut tail: Unit) -> Unit {
        assert!(at <= self.size, "split_off out of range: at={at}, size={}", self.size);
        let moved = self.size - at;
        assert!(
            tail.is_empty() && tail.start == 0,
            "split_off tail must be a fresh unit"
        );
        assert!(
            moved <= tail.capacity(),
            "split_off tail too small for {moved} bytes"
        );
        tail.data[..moved].copy_from_slice(&self.data[self.start + at..self.start + self.size]);
        tail.size = moved;
        tail.position = self.position.saturating_sub(at);
        tail.mark = self.mark.saturating_sub(at);
        self.size = at;
        self.position = self.position.min(at);
        self.mark = self.mark.min(at);
        tail
    }

    // === Cross-unit match helpers ===

    /// Count how many leading bytes of `needle` match the valid window
    /// starting at offset `at`. Stops at the window end, so a partial
    /// count means the match may continue in the next unit.
    #[must_use]
    pub fn matches_prefix(&self, at: usize, needle: &[u8]) -> usize {
        let window = &self.contents()[at..];
        let limit = needle.len().min(window.len());
        let mut n = 0;
        while n < limit && window[n] == needle[n] {
            n += 1;
        }
        n
    }

    /// Count how many trailing bytes of `needle` match the valid window
    /// ending at offset `end` (exclusive). Stops at the window start, so
    /// a partial count means the match may continue in the previous
    /// unit.
    #[must_use]
    pub fn matches_suffix(&self, end: usize, needle: &[u8]) -> usize {
        let window = &self.contents()[..end];
        let limit = needle.len().min(window.len());
        let mut n = 0;
        while n < limit && window[window.len() - 1 - n] == needle[needle.len() - 1 - n] {
            n += 1;
        }
        n
    }
}

impl std::fmt::Debug for Unit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Unit")
            .field("capacity", &self.capacity())
            .field("start", &self.start)
            .field("size", &self.size)
            .field("position", &self.position)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_new_is_empty() {
        let unit = Unit::new(16);
        assert_eq!(unit.capacity(), 16);
        assert_eq!(unit.size(), 0);
        assert_eq!(unit.start(), 0);
        assert!(unit.is_empty());
        assert!(unit.is_appendable());
        assert!(!unit.is_prependable());
    }

    #[test]
    fn test_unit_push_and_read() {
        let mut unit = Unit::new(8);
        assert_eq!(unit.push_slice(b"abcdef"), 6);
        assert_eq!(unit.remaining(), 6);
        assert_eq!(unit.read_byte(), Some(b'a'));

        let mut dst = [0u8; 3];
        assert_eq!(unit.read_slice(&mut dst), 3);
        assert_eq!(&dst, b"bcd");
        assert_eq!(unit.remaining(), 2);
    }

    #[test]
    fn test_unit_push_slice_truncates_at_capacity() {
        let mut unit = Unit::new(4);
        assert_eq!(unit.push_slice(b"abcdef"), 4);
        assert_eq!(unit.contents(), b"abcd");
        assert!(!unit.is_appendable());
        assert_eq!(unit.push_slice(b"x"), 0);
    }

    #[test]
    fn test_unit_prepend_after_compact() {
        let mut unit = Unit::new(8);
        unit.push_slice(b"abcdef");
        unit.advance(2);
        unit.compact();
        assert_eq!(unit.start(), 2);
        assert_eq!(unit.contents(), b"cdef");
        assert!(unit.is_prependable());
        unit.prepend_slice(b"xy");
        assert_eq!(unit.contents(), b"xycdef");
        assert_eq!(unit.start(), 0);
    }

    #[test]
    fn test_unit_open_head_room() {
        let mut unit = Unit::new(8);
        unit.open_head_room();
        assert_eq!(unit.head_room(), 8);
        assert_eq!(unit.tail_room(), 0);
        unit.prepend_slice(b"tail");
        assert_eq!(unit.contents(), b"tail");
    }

    #[test]
    fn test_unit_typed_native_order_roundtrip() {
        let mut unit = Unit::new(16);
        unit.push_slice(&[0u8; 16]);
        unit.set_u16_ne(0, 0xBEEF);
        unit.set_u32_ne(2, 0xDEAD_BEEF);
        unit.set_u64_ne(6, 0x0123_4567_89AB_CDEF);
        assert_eq!(unit.get_u16_ne(0), 0xBEEF);
        assert_eq!(unit.get_u32_ne(2), 0xDEAD_BEEF);
        assert_eq!(unit.get_u64_ne(6), 0x0123_4567_89AB_CDEF);

        unit.set_f64_ne(0, std::f64::consts::PI);
        assert!((unit.get_f64_ne(0) - std::f64::consts::PI).abs() < 1e-15);
        unit.set_f32_ne(8, 2.5);
        assert!((unit.get_f32_ne(8) - 2.5).abs() < f32::EPSILON);
    }

    #[test]
    fn test_unit_fill_and_indexed_access() {
        let mut unit = Unit::new(8);
        unit.push_slice(&[0u8; 6]);
        unit.fill(1, 0xAA, 4);
        assert_eq!(unit.contents(), &[0x00, 0xAA, 0xAA, 0xAA, 0xAA, 0x00]);
        unit.set_byte(0, 0x11);
        assert_eq!(unit.byte_at(0), 0x11);
    }

    #[test]
    fn test_unit_mark_reset() {
        let mut unit = Unit::new(8);
        unit.push_slice(b"abcdef");
        unit.advance(2);
        unit.mark_here();
        unit.advance(3);
        assert_eq!(unit.position(), 5);
        unit.reset_to_mark();
        assert_eq!(unit.position(), 2);
    }

    #[test]
    fn test_unit_split_off_distributes_cursor() {
        let mut unit = Unit::new(8);
        unit.push_slice(b"abcdef");
        unit.set_position(5);
        let tail = unit.split_off(4, Unit::new(8));
        assert_eq!(unit.contents(), b"abcd");
        assert_eq!(unit.position(), 4);
        assert_eq!(tail.contents(), b"ef");
        assert_eq!(tail.position(), 1);
    }

    #[test]
    fn test_unit_split_off_at_ends() {
        let mut unit = Unit::new(8);
        unit.push_slice(b"abc");
        let tail = unit.split_off(3, Unit::new(8));
        assert_eq!(unit.size(), 3);
        assert!(tail.is_empty());

        let mut unit = Unit::new(8);
        unit.push_slice(b"abc");
        let tail = unit.split_off(0, Unit::new(8));
        assert!(unit.is_empty());
        assert_eq!(tail.contents(), b"abc");
    }

    #[test]
    fn test_unit_match_helpers() {
        let mut unit = Unit::new(8);
        unit.push_slice(b"abcdef");
        assert_eq!(unit.matches_prefix(2, b"cdef"), 4);
        assert_eq!(unit.matches_prefix(4, b"efgh"), 2);
        assert_eq!(unit.matches_prefix(0, b"x"), 0);
        assert_eq!(unit.matches_suffix(6, b"def"), 3);
        assert_eq!(unit.matches_suffix(2, b"zab"), 2);
        assert_eq!(unit.matches_suffix(3, b"x"), 0);
    }

    #[test]
    #[should_panic(expected = "byte_at out of range")]
    fn test_unit_byte_at_out_of_range() {
        let unit = Unit::new(4);
        let _ = unit.byte_at(0);
    }

    #[test]
    #[should_panic(expected = "advance past readable window")]
    fn test_unit_advance_past_end() {
        let mut unit = Unit::new(4);
        unit.push_slice(b"ab");
        unit.advance(3);
    }

    #[test]
    fn test_unit_clear_resets_fields() {
        let mut unit = Unit::new(8);
        unit.push_slice(b"abcdef");
        unit.advance(2);
        unit.compact();
        unit.clear();
        assert_eq!(unit.start(), 0);
        assert_eq!(unit.size(), 0);
        assert_eq!(unit.position(), 0);
    }
}
