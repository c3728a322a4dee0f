//! Interfaces to the document being highlighted and to whatever renders the result.
//!
//! The highlighter never owns text. It reads blocks through a [`LineSource`], stores the
//! carried state and identity slot back through it, and hands styled spans to a
//! [`SpanSink`]. [`BlockDocument`] and [`SpanRecorder`] are in-memory implementations.

use crate::highlighter::BlockState;
use crate::identity::{BlockRef, MatchIdentity};
use crate::span::StyledSpan;
use std::collections::HashMap;

/// Block-addressed access to a document, plus per-block highlighter storage.
///
/// Blocks are addressed by position (`0..block_count()`); [`LineSource::block_ref`] maps a
/// position to a reference that stays the same while the block exists.
pub trait LineSource {
    /// Number of blocks.
    fn block_count(&self) -> usize;

    /// Stable reference of the block at `index`.
    fn block_ref(&self, index: usize) -> Option<BlockRef>;

    /// Text of the block at `index`, without its line terminator.
    fn block_text(&self, index: usize) -> Option<&str>;

    /// Carried state stored for the block at `index` ([`BlockState::NONE`] if never set).
    fn block_state(&self, index: usize) -> BlockState;

    /// Store the carried state of the block at `index`.
    fn set_block_state(&mut self, index: usize, state: BlockState);

    /// Remove and return the identity slot of the block at `index`.
    fn take_block_identity(&mut self, index: usize) -> Option<MatchIdentity>;

    /// Store the identity slot of the block at `index`.
    fn set_block_identity(&mut self, index: usize, identity: Option<MatchIdentity>);
}

/// Receives the styled spans for a block.
pub trait SpanSink {
    /// Replace the styling of `block` with `spans`, applied in order (later spans win).
    fn apply_spans(&mut self, block: BlockRef, spans: &[StyledSpan]);
}

#[derive(Debug, Clone)]
struct BlockEntry {
    block: BlockRef,
    text: String,
    state: BlockState,
    identity: Option<MatchIdentity>,
}

/// An in-memory document of blocks.
#[derive(Debug, Clone)]
pub struct BlockDocument {
    blocks: Vec<BlockEntry>,
    next_block: u64,
}

impl Default for BlockDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl BlockDocument {
    /// A document with a single empty block.
    pub fn new() -> Self {
        Self::from_text("")
    }

    /// Split `text` into blocks on `\n` (a trailing `\r` is dropped from each block).
    ///
    /// Like an editor buffer, the result always has at least one block, and a trailing
    /// newline yields a final empty block.
    pub fn from_text(text: &str) -> Self {
        let mut doc = Self {
            blocks: Vec::new(),
            next_block: 0,
        };
        for line in text.split('\n') {
            let line = line.strip_suffix('\r').unwrap_or(line);
            let entry = doc.new_entry(line);
            doc.blocks.push(entry);
        }
        doc
    }

    fn new_entry(&mut self, text: &str) -> BlockEntry {
        let block = BlockRef(self.next_block);
        self.next_block += 1;
        BlockEntry {
            block,
            text: text.to_string(),
            state: BlockState::NONE,
            identity: None,
        }
    }

    /// Number of lines (blocks).
    pub fn line_count(&self) -> usize {
        self.blocks.len()
    }

    /// Text of line `index`.
    pub fn line(&self, index: usize) -> Option<&str> {
        self.blocks.get(index).map(|entry| entry.text.as_str())
    }

    /// Identity slot of line `index`, without taking it.
    pub fn identity(&self, index: usize) -> Option<&MatchIdentity> {
        self.blocks.get(index).and_then(|entry| entry.identity.as_ref())
    }

    /// Position of `block`, if it is still part of the document.
    pub fn position_of(&self, block: BlockRef) -> Option<usize> {
        self.blocks.iter().position(|entry| entry.block == block)
    }

    /// Replace the text of line `index`. Returns `false` if there is no such line.
    pub fn set_line(&mut self, index: usize, text: &str) -> bool {
        let Some(entry) = self.blocks.get_mut(index) else {
            return false;
        };
        entry.text = text.to_string();
        true
    }

    /// Insert a new line before position `index` (or at the end if `index` is past it) and
    /// return its reference.
    pub fn insert_line(&mut self, index: usize, text: &str) -> BlockRef {
        let entry = self.new_entry(text);
        let block = entry.block;
        let index = index.min(self.blocks.len());
        self.blocks.insert(index, entry);
        block
    }

    /// Remove line `index`, returning its identity slot so the caller can retire it.
    ///
    /// The last remaining line is never removed; it is cleared instead.
    pub fn remove_line(&mut self, index: usize) -> Option<MatchIdentity> {
        if index >= self.blocks.len() {
            return None;
        }
        if self.blocks.len() == 1 {
            let entry = &mut self.blocks[0];
            entry.text.clear();
            entry.state = BlockState::NONE;
            return entry.identity.take();
        }
        self.blocks.remove(index).identity
    }

    /// The document text, blocks joined with `\n`.
    pub fn text(&self) -> String {
        self.blocks
            .iter()
            .map(|entry| entry.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl LineSource for BlockDocument {
    fn block_count(&self) -> usize {
        self.blocks.len()
    }

    fn block_ref(&self, index: usize) -> Option<BlockRef> {
        self.blocks.get(index).map(|entry| entry.block)
    }

    fn block_text(&self, index: usize) -> Option<&str> {
        self.line(index)
    }

    fn block_state(&self, index: usize) -> BlockState {
        self.blocks
            .get(index)
            .map_or(BlockState::NONE, |entry| entry.state)
    }

    fn set_block_state(&mut self, index: usize, state: BlockState) {
        if let Some(entry) = self.blocks.get_mut(index) {
            entry.state = state;
        }
    }

    fn take_block_identity(&mut self, index: usize) -> Option<MatchIdentity> {
        self.blocks
            .get_mut(index)
            .and_then(|entry| entry.identity.take())
    }

    fn set_block_identity(&mut self, index: usize, identity: Option<MatchIdentity>) {
        if let Some(entry) = self.blocks.get_mut(index) {
            entry.identity = identity;
        }
    }
}

/// A [`SpanSink`] that remembers the latest spans applied to each block.
#[derive(Debug, Default)]
pub struct SpanRecorder {
    spans: HashMap<BlockRef, Vec<StyledSpan>>,
    applied: usize,
}

impl SpanRecorder {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Spans last applied to `block` (empty if never highlighted).
    pub fn spans_for(&self, block: BlockRef) -> &[StyledSpan] {
        self.spans.get(&block).map_or(&[], Vec::as_slice)
    }

    /// Total number of `apply_spans` calls received.
    pub fn applied_count(&self) -> usize {
        self.applied
    }

    /// Forget the spans of a block (e.g. after it was removed).
    pub fn forget(&mut self, block: BlockRef) {
        self.spans.remove(&block);
    }
}

impl SpanSink for SpanRecorder {
    fn apply_spans(&mut self, block: BlockRef, spans: &[StyledSpan]) {
        self.applied += 1;
        self.spans.insert(block, spans.to_vec());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_from_text_splits_lines() {
        let doc = BlockDocument::from_text("a\r\nb\n\nc\n");
        assert_eq!(doc.line_count(), 5);
        assert_eq!(doc.line(0), Some("a"));
        assert_eq!(doc.line(1), Some("b"));
        assert_eq!(doc.line(2), Some(""));
        assert_eq!(doc.line(4), Some(""));
        assert_eq!(BlockDocument::new().line_count(), 1);
    }

    #[test]
    fn test_block_refs_are_stable_across_edits() {
        let mut doc = BlockDocument::from_text("a\nb\nc");
        let b = doc.block_ref(1).unwrap();

        let inserted = doc.insert_line(0, "z");
        assert_eq!(doc.position_of(b), Some(2));
        assert_eq!(doc.position_of(inserted), Some(0));
        assert_ne!(inserted, b);

        doc.remove_line(0);
        assert_eq!(doc.position_of(b), Some(1));
        assert_eq!(doc.text(), "a\nb\nc");
    }

    #[test]
    fn test_last_line_is_cleared_not_removed() {
        let mut doc = BlockDocument::from_text("only");
        doc.set_block_state(0, BlockState::open(2));
        doc.remove_line(0);
        assert_eq!(doc.line_count(), 1);
        assert_eq!(doc.line(0), Some(""));
        assert_eq!(doc.block_state(0), BlockState::NONE);
    }

    #[test]
    fn test_state_defaults_to_none() {
        let mut doc = BlockDocument::from_text("a\nb");
        assert_eq!(doc.block_state(1), BlockState::NONE);
        assert_eq!(doc.block_state(9), BlockState::NONE);
        doc.set_block_state(1, BlockState::open(0));
        assert_eq!(doc.block_state(1), BlockState::open(0));
        assert!(!doc.set_line(5, "x"));
    }
}
