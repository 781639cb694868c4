//! Byte ranges into the source document.

use std::ops::Range;

/// A half-open byte range `start..end` into the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    start: usize,
    end: usize,
}

impl Span {
    /// Creates a span from a byte range.
    ///
    /// # Examples
    ///
    /// ```
    /// # use trustmap_parser::Span;
    /// let span = Span::new(4..10);
    /// assert_eq!(span.start(), 4);
    /// assert_eq!(span.len(), 6);
    /// ```
    pub fn new(range: Range<usize>) -> Self {
        Self {
            start: range.start,
            end: range.end.max(range.start),
        }
    }

    /// A zero-length span at `offset`.
    pub fn point(offset: usize) -> Self {
        Self::new(offset..offset)
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn end(&self) -> usize {
        self.end
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Moves the span right by `offset` bytes.
    pub fn shift(self, offset: usize) -> Self {
        Self::new(self.start + offset..self.end + offset)
    }

    pub fn to_range(self) -> Range<usize> {
        self.start..self.end
    }
}

impl From<Range<usize>> for Span {
    fn from(range: Range<usize>) -> Self {
        Self::new(range)
    }
}
