//! Append-only [arena](https://en.wikipedia.org/wiki/Region-based_memory_management)
//! holding the scalar text (keys, values, tags, anchors) of a tree.
//!
//! All text is addressed by [`Span`]s, byte offsets into the arena buffer.
//! Offsets stay valid when the buffer grows, so a span taken before a
//! [`Arena::reserve`] still denotes the same bytes afterwards.

use crate::errors::{Result, TreeError};

/// A byte range into an [`Arena`]. The default span is empty.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Span {
    pub start: usize,
    pub len: usize,
}

impl Span {
    pub fn new(start: usize, len: usize) -> Self {
        Span { start, len }
    }

    /// One past the last byte of the range.
    pub fn end(&self) -> usize {
        self.start + self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// The buffer backing all interned scalar text.
///
/// Allocation is bump-only: [`Arena::alloc_str`] appends at the write cursor
/// and fails once the explicit reservation is exhausted. Growing is a
/// separate, deliberate step ([`Arena::reserve`]); individual spans are never
/// freed, only [`Arena::clear`] resets the cursor.
#[derive(Debug, Default, Clone)]
pub struct Arena {
    /// Interned text; the write cursor is the buffer length
    buf: String,
    /// Reserved size in bytes; `alloc_str` never writes past this
    cap: usize,
}

impl Arena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(cap: usize) -> Self {
        let mut arena = Self::default();
        arena.reserve(cap);
        arena
    }

    /// Reserved size in bytes.
    pub fn capacity(&self) -> usize {
        self.cap
    }

    /// The write cursor: number of bytes interned so far.
    pub fn pos(&self) -> usize {
        self.buf.len()
    }

    /// Bytes left before the reservation is exhausted.
    pub fn remaining(&self) -> usize {
        self.cap - self.buf.len()
    }

    /// Grow the reservation to at least `cap` bytes. Shrinking is a no-op.
    /// Interned text is preserved and every existing [`Span`] keeps pointing
    /// at the same bytes.
    pub fn reserve(&mut self, cap: usize) {
        if cap > self.cap {
            self.buf.reserve(cap - self.buf.len());
            self.cap = cap;
        }
    }

    /// Intern `text` at the write cursor and return its range.
    ///
    /// Fails with [`TreeError::ArenaTooSmall`] when the reservation cannot
    /// hold the text; callers that want automatic growth reserve first.
    pub fn alloc_str(&mut self, text: &str) -> Result<Span> {
        if self.buf.len() + text.len() > self.cap {
            return Err(TreeError::ArenaTooSmall {
                needed: text.len(),
                available: self.remaining(),
            });
        }
        let span = Span::new(self.buf.len(), text.len());
        self.buf.push_str(text);
        Ok(span)
    }

    /// Whether `span` lies entirely within the interned region.
    pub fn contains(&self, span: Span) -> bool {
        span.end() <= self.buf.len()
    }

    /// The text denoted by `span`.
    pub fn get(&self, span: Span) -> &str {
        &self.buf[span.start..span.end()]
    }

    /// Reset the write cursor. The reservation is kept.
    pub fn clear(&mut self) {
        self.buf.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alloc_respects_reservation() {
        let mut arena = Arena::with_capacity(8);
        let hello = arena.alloc_str("hello").unwrap();
        assert_eq!(arena.get(hello), "hello");
        assert!(matches!(
            arena.alloc_str("world"),
            Err(TreeError::ArenaTooSmall { needed: 5, available: 3 })
        ));
    }

    #[test]
    fn spans_survive_growth() {
        let mut arena = Arena::with_capacity(4);
        let abc = arena.alloc_str("abc").unwrap();
        arena.reserve(1024);
        arena.alloc_str("defgh").unwrap();
        assert_eq!(arena.get(abc), "abc");
        assert!(arena.contains(abc));
        assert!(!arena.contains(Span::new(arena.pos(), 1)));
    }
}
