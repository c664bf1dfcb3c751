//! Knuth-Morris-Pratt pattern matchers.
//!
//! A matcher owns an immutable copy of its pattern and memoizes two
//! failure tables: the classic forward table and a mirrored table built
//! from the reversed pattern for backward search. Tables are pure
//! functions of the pattern, built on first use and reused across
//! searches.
//!
//! Both matchers also search a *window stream*: the logical
//! concatenation of discontiguous windows, such as a chain's unit
//! contents for [`ByteKmp`] or decoded text fragments for [`CharKmp`].
//! Forward KMP never moves the text cursor backward, so crossing window
//! boundaries needs no flattening; the mirrored automaton gives the
//! same property going backward.

use std::sync::OnceLock;

/// Classic KMP failure table: `table[i]` is the length of the longest
/// proper border of `pattern[..=i]`.
fn failure_table<T: PartialEq>(pattern: &[T]) -> Box<[usize]> {
    let mut table = vec![0usize; pattern.len()];
    let mut k = 0;
    for i in 1..pattern.len() {
        while k > 0 && pattern[i] != pattern[k] {
            k = table[k - 1];
        }
        if pattern[i] == pattern[k] {
            k += 1;
        }
        table[i] = k;
    }
    table.into_boxed_slice()
}

/// Failure table of the reversed pattern, indexed by matched suffix
/// length.
fn backward_table<T: PartialEq + Clone>(pattern: &[T]) -> Box<[usize]> {
    let reversed: Vec<T> = pattern.iter().rev().cloned().collect();
    failure_table(&reversed)
}

macro_rules! kmp_matcher {
    ($(#[$meta:meta])* $name:ident, $elem:ty) => {
        $(#[$meta])*
        #[derive(Debug)]
        pub struct $name {
            pattern: Box<[$elem]>,
            forward: OnceLock<Box<[usize]>>,
            backward: OnceLock<Box<[usize]>>,
        }

        impl $name {
            /// Build a matcher over a copy of `pattern`.
            #[must_use]
            pub fn new(pattern: &[$elem]) -> Self {
                Self {
                    pattern: pattern.into(),
                    forward: OnceLock::new(),
                    backward: OnceLock::new(),
                }
            }

            /// The pattern this matcher was built from.
            #[must_use]
            pub fn pattern(&self) -> &[$elem] {
                &self.pattern
            }

            /// Pattern length.
            #[must_use]
            pub fn len(&self) -> usize {
                self.pattern.len()
            }

            /// Returns true for the empty pattern, which matches at any
            /// position.
            #[must_use]
            pub fn is_empty(&self) -> bool {
                self.pattern.is_empty()
            }

            fn forward_table(&self) -> &[usize] {
                self.forward.get_or_init(|| failure_table(&self.pattern))
            }

            fn backward_table(&self) -> &[usize] {
                self.backward.get_or_init(|| backward_table(&self.pattern))
            }

            /// Index of the first occurrence in `text`, or `None`.
            #[must_use]
            pub fn find_in(&self, text: &[$elem]) -> Option<usize> {
                self.find_in_windows(std::iter::once(text))
            }

            /// Index of the last occurrence in `text`, or `None`.
            #[must_use]
            pub fn rfind_in(&self, text: &[$elem]) -> Option<usize> {
                self.rfind_in_windows(std::iter::once(text), text.len())
            }

            /// Forward automaton over a window stream: the logical text
            /// is the concatenation of `windows` in iteration order.
            /// Returns the stream offset of the first match; matches
            /// spanning window boundaries are found. The empty pattern
            /// matches at offset 0.
            #[must_use]
            pub fn find_in_windows<'a, I>(&self, windows: I) -> Option<usize>
            where
                I: IntoIterator<Item = &'a [$elem]>,
            {
                if self.pattern.is_empty() {
                    return Some(0);
                }
                let table = self.forward_table();
                let mut state = 0usize;
                let mut idx = 0usize;
                for window in windows {
                    for item in window {
                        while state > 0 && *item != self.pattern[state] {
                            state = table[state - 1];
                        }
                        if *item == self.pattern[state] {
                            state += 1;
                        }
                        idx += 1;
                        if state == self.pattern.len() {
                            return Some(idx - self.pattern.len());
                        }
                    }
                }
                None
            }

            /// Backward automaton over the same stream delivered in
            /// reverse window order, where `end` is the logical text
            /// length. Returns the offset of the last match start; the
            /// empty pattern matches at `end`.
            #[must_use]
            pub fn rfind_in_windows<'a, I>(&self, windows_rev: I, end: usize) -> Option<usize>
            where
                I: IntoIterator<Item = &'a [$elem]>,
            {
                if self.pattern.is_empty() {
                    return Some(end);
                }
                let table = self.backward_table();
                let last = self.pattern.len() - 1;
                let mut state = 0usize;
                let mut idx = end;
                for window in windows_rev {
                    for item in window.iter().rev() {
                        idx -= 1;
                        while state > 0 && *item != self.pattern[last - state] {
                            state = table[state - 1];
                        }
                        if *item == self.pattern[last - state] {
                            state += 1;
                        }
                        if state == self.pattern.len() {
                            return Some(idx);
                        }
                    }
                }
                None
            }
        }
    };
}

kmp_matcher!(
    /// KMP matcher over byte patterns. Searches flat slices and, through
    /// the buffer façade, unit chains without flattening them.
    ///
    /// # Examples
    ///
    /// ```
    /// use chainbuf::search::ByteKmp;
    ///
    /// let kmp = ByteKmp::new(b"abcab");
    /// assert_eq!(kmp.find_in(b"ababcabcab"), Some(2));
    /// assert_eq!(kmp.rfind_in(b"ababcabcab"), Some(5));
    /// assert_eq!(kmp.find_in(b"xyz"), None);
    /// ```
    ByteKmp, u8
);

kmp_matcher!(
    /// KMP matcher over character patterns, for searching decoded text.
    ///
    /// # Examples
    ///
    /// ```
    /// use chainbuf::search::CharKmp;
    ///
    /// let text: Vec<char> = "søster".chars().collect();
    /// let kmp = CharKmp::new(&['s', 't', 'e', 'r']);
    /// assert_eq!(kmp.find_in(&text), Some(2));
    /// ```
    CharKmp, char
);
