//! Styled regions of a single block.

use crate::format::TextFormat;

/// A styled region of one block: `length` bytes starting at byte `start`, drawn with the
/// format of rule `format_index`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Span {
    /// Start offset in bytes, relative to the block start.
    pub start: usize,
    /// Length in bytes (never zero in highlighter output).
    pub length: usize,
    /// Index of the rule (and of its format in the format cache).
    pub format_index: usize,
}

impl Span {
    /// Create a span.
    pub fn new(start: usize, length: usize, format_index: usize) -> Self {
        Self {
            start,
            length,
            format_index,
        }
    }

    /// Exclusive end offset.
    pub fn end(&self) -> usize {
        self.start + self.length
    }
}

/// A span with its format resolved, as handed to a [`SpanSink`](crate::SpanSink).
#[derive(Debug, Clone, PartialEq)]
pub struct StyledSpan {
    /// Start offset in bytes, relative to the block start.
    pub start: usize,
    /// Length in bytes.
    pub length: usize,
    /// Resolved format.
    pub format: TextFormat,
}

impl StyledSpan {
    /// Create a styled span.
    pub fn new(start: usize, length: usize, format: TextFormat) -> Self {
        Self {
            start,
            length,
            format,
        }
    }
}

/// Flatten possibly overlapping spans into sorted, non-overlapping segments.
///
/// Spans are applied in order and a later span overwrites an earlier one where they overlap,
/// which is what a renderer applying them one by one ends up showing. Adjacent segments with
/// the same format index are merged.
pub fn resolve_overlaps(spans: &[Span]) -> Vec<Span> {
    let Some(extent) = spans.iter().map(Span::end).max() else {
        return Vec::new();
    };

    let mut owner: Vec<Option<usize>> = vec![None; extent];
    for span in spans {
        for slot in &mut owner[span.start..span.end()] {
            *slot = Some(span.format_index);
        }
    }

    let mut out: Vec<Span> = Vec::new();
    for (offset, slot) in owner.into_iter().enumerate() {
        let Some(format_index) = slot else {
            continue;
        };

        if let Some(last) = out.last_mut()
            && last.format_index == format_index
            && last.end() == offset
        {
            last.length += 1;
            continue;
        }

        out.push(Span::new(offset, 1, format_index));
    }
    out
}
