//! Session driver: one highlighter instance bound to one editor.
//!
//! [`Highlighter`] owns everything that outlives a single block pass (the rule set, the
//! derived format cache, compiled patterns, the identity registry and the subscriber lists)
//! and walks a [`LineSource`] in document order, threading the carried state from block to
//! block.
//!
//! # Example
//!
//! ```
//! use codeedit_highlight::{BlockDocument, FallbackStyle, Highlighter, Rule, RuleSet, SpanRecorder};
//!
//! let rules = RuleSet::load_ordered(vec![Rule::multi_line(r"/\*", r"\*/")]).unwrap();
//! let mut highlighter = Highlighter::new(rules, FallbackStyle::default());
//! let mut doc = BlockDocument::from_text("int a;\nint b;");
//! let mut sink = SpanRecorder::new();
//!
//! highlighter.rehighlight(&mut doc, &mut sink);
//! let touched = highlighter.edit_line(&mut doc, &mut sink, 0, "/* int a;");
//! assert_eq!(touched, 0..2);
//! ```

use crate::document::{BlockDocument, LineSource, SpanSink};
use crate::events::{HighlightEvents, HighlightHookContext, IdentityEvent};
use crate::format::FormatCache;
use crate::highlighter::{BlockHighlighter, BlockState};
use crate::identity::{BlockRef, MatchIdentityRegistry};
use crate::rule::RuleSet;
use crate::span::resolve_overlaps;
use crate::style::FallbackStyle;
use std::ops::Range;
use std::sync::Arc;

/// Incremental highlighter for one document view.
#[derive(Debug)]
pub struct Highlighter {
    rules: Arc<RuleSet>,
    fallback: FallbackStyle,
    formats: FormatCache,
    block_highlighter: BlockHighlighter,
    registry: MatchIdentityRegistry,
    events: HighlightEvents,
}

impl Highlighter {
    /// Create a highlighter for `rules`, resolving unset attributes from `fallback`.
    pub fn new(rules: impl Into<Arc<RuleSet>>, fallback: FallbackStyle) -> Self {
        let rules = rules.into();
        let formats = FormatCache::rebuild(&rules, &fallback.font, fallback.text_color);
        Self {
            rules,
            fallback,
            formats,
            block_highlighter: BlockHighlighter::new(),
            registry: MatchIdentityRegistry::new(),
            events: HighlightEvents::new(),
        }
    }

    /// The active rule set.
    pub fn rules(&self) -> &Arc<RuleSet> {
        &self.rules
    }

    /// The fallback style.
    pub fn fallback_style(&self) -> &FallbackStyle {
        &self.fallback
    }

    /// The format cache derived from the rules and fallback style.
    pub fn formats(&self) -> &FormatCache {
        &self.formats
    }

    /// The identity registry.
    pub fn registry(&self) -> &MatchIdentityRegistry {
        &self.registry
    }

    /// Replace the rule set.
    ///
    /// Every live identity is retired and announced as disappeared. Stored block states
    /// refer to the old rules, so the caller should [`Highlighter::rehighlight`] afterwards.
    pub fn set_rules(&mut self, rules: impl Into<Arc<RuleSet>>) {
        self.rules = rules.into();
        self.rebuild_formats();
        self.block_highlighter.clear_cache();

        let retired = self.registry.retire_all();
        tracing::debug!(
            rules = self.rules.len(),
            retired = retired.len(),
            "rule set replaced"
        );
        for identity in retired {
            self.events.publish(&IdentityEvent::Disappeared { identity });
        }
    }

    /// Replace the fallback style. Spans keep their positions; only formats change.
    pub fn set_fallback_style(&mut self, fallback: FallbackStyle) {
        self.fallback = fallback;
        self.rebuild_formats();
    }

    fn rebuild_formats(&mut self) {
        self.formats =
            FormatCache::rebuild(&self.rules, &self.fallback.font, self.fallback.text_color);
    }

    /// Subscribe to identity events.
    pub fn subscribe<F>(&mut self, callback: F)
    where
        F: FnMut(&IdentityEvent) + Send + 'static,
    {
        self.events.subscribe(callback);
    }

    /// Register a hook that runs after each block is highlighted and may add formatting.
    pub fn subscribe_highlight<F>(&mut self, hook: F)
    where
        F: FnMut(&mut HighlightHookContext<'_>) + Send + 'static,
    {
        self.events.subscribe_highlight(hook);
    }

    /// Highlight the block at `index`, reading the state stored for its predecessor.
    ///
    /// Stores the new state and identity back into `doc`, applies the styled spans to `sink`
    /// and publishes identity events. Returns whether the block's stored state changed, i.e.
    /// whether the next block needs highlighting too.
    pub fn highlight_block<D, S>(&mut self, doc: &mut D, sink: &mut S, index: usize) -> bool
    where
        D: LineSource + ?Sized,
        S: SpanSink + ?Sized,
    {
        let Some(block) = doc.block_ref(index) else {
            return false;
        };
        let previous_state = match index.checked_sub(1) {
            Some(prev) => doc.block_state(prev),
            None => BlockState::NONE,
        };
        let old_state = doc.block_state(index);
        let previous_identity = doc.take_block_identity(index);

        let text = doc.block_text(index).unwrap_or_default();
        let result = self.block_highlighter.highlight_block(
            block,
            text,
            previous_state,
            &self.rules,
            &self.formats,
            previous_identity,
            &mut self.registry,
        );

        let mut styled = self.formats.resolve(&resolve_overlaps(&result.spans));
        let mut ctx = HighlightHookContext::new(block, index, text);
        self.events.run_highlight_hooks(&mut ctx);
        styled.extend(ctx.into_extra_spans());
        sink.apply_spans(block, &styled);

        doc.set_block_state(index, result.state);
        doc.set_block_identity(index, result.identity);

        for event in &result.events {
            self.events.publish(event);
        }
        for err in &result.diagnostics {
            tracing::debug!(block = block.0, "rule skipped: {}", err);
        }

        result.state != old_state
    }

    /// Highlight the blocks in `range`, then keep going while the carried state changes.
    ///
    /// Returns the range of blocks actually highlighted.
    pub fn rehighlight_range<D, S>(
        &mut self,
        doc: &mut D,
        sink: &mut S,
        range: Range<usize>,
    ) -> Range<usize>
    where
        D: LineSource + ?Sized,
        S: SpanSink + ?Sized,
    {
        let count = doc.block_count();
        let start = range.start.min(count);
        let end = range.end.min(count);
        if start >= end {
            return start..start;
        }

        let mut index = start;
        while index < count {
            let changed = self.highlight_block(doc, sink, index);
            index += 1;
            if index >= end && !changed {
                break;
            }
        }

        tracing::trace!(start, end = index, "rehighlighted range");
        start..index
    }

    /// Forget the identities of the blocks in `range`, then rehighlight it.
    ///
    /// Every identity owned by those blocks is announced as disappeared before any new one
    /// appears.
    pub fn reparse_range<D, S>(
        &mut self,
        doc: &mut D,
        sink: &mut S,
        range: Range<usize>,
    ) -> Range<usize>
    where
        D: LineSource + ?Sized,
        S: SpanSink + ?Sized,
    {
        let count = doc.block_count();
        let range = range.start.min(count)..range.end.min(count);

        let blocks = range
            .clone()
            .filter_map(|index| doc.block_ref(index))
            .collect::<Vec<BlockRef>>();
        for index in range.clone() {
            doc.take_block_identity(index);
        }
        for identity in self.registry.retire_blocks(&blocks) {
            self.events.publish(&IdentityEvent::Disappeared { identity });
        }

        self.rehighlight_range(doc, sink, range)
    }

    /// Reparse the whole document.
    pub fn rehighlight<D, S>(&mut self, doc: &mut D, sink: &mut S) -> Range<usize>
    where
        D: LineSource + ?Sized,
        S: SpanSink + ?Sized,
    {
        let count = doc.block_count();
        self.reparse_range(doc, sink, 0..count)
    }

    /// Replace the text of line `index` and rehighlight from there.
    pub fn edit_line<S>(
        &mut self,
        doc: &mut BlockDocument,
        sink: &mut S,
        index: usize,
        text: &str,
    ) -> Range<usize>
    where
        S: SpanSink + ?Sized,
    {
        if !doc.set_line(index, text) {
            return index..index;
        }
        self.rehighlight_range(doc, sink, index..index + 1)
    }

    /// Insert a line before `index` and rehighlight from there.
    ///
    /// The line after the inserted one always gets rehighlighted too, since its predecessor
    /// changed even when the new line's own state did not.
    pub fn insert_line<S>(
        &mut self,
        doc: &mut BlockDocument,
        sink: &mut S,
        index: usize,
        text: &str,
    ) -> Range<usize>
    where
        S: SpanSink + ?Sized,
    {
        let block = doc.insert_line(index, text);
        let index = doc.position_of(block).unwrap_or(index);
        self.rehighlight_range(doc, sink, index..index + 2)
    }

    /// Remove line `index`, retire its identity and rehighlight the line that moved into its
    /// place.
    pub fn remove_line<S>(
        &mut self,
        doc: &mut BlockDocument,
        sink: &mut S,
        index: usize,
    ) -> Range<usize>
    where
        S: SpanSink + ?Sized,
    {
        let Some(block) = doc.block_ref(index) else {
            return index..index;
        };
        doc.remove_line(index);
        for identity in self.registry.retire_blocks(&[block]) {
            self.events.publish(&IdentityEvent::Disappeared { identity });
        }

        let start = index.min(doc.line_count().saturating_sub(1));
        self.rehighlight_range(doc, sink, start..start + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::SpanRecorder;
    use crate::rule::Rule;
    use crate::span::StyledSpan;
    use crate::style::Color;
    use pretty_assertions::assert_eq;
    use std::collections::BTreeSet;
    use std::sync::Mutex;

    fn c_rules() -> RuleSet {
        let keywords = ["int", "return"].into_iter().collect::<BTreeSet<_>>();
        RuleSet::load_ordered(vec![
            Rule::from_keywords(&keywords, false).with_fore_color(Color::rgb(0, 0, 255)),
            Rule::multi_line(r"/\*", r"\*/").with_fore_color(Color::rgb(0, 128, 0)),
        ])
        .unwrap()
    }

    fn todo_rules() -> RuleSet {
        RuleSet::load_ordered(vec![Rule::new("TODO").with_id("todo")]).unwrap()
    }

    fn record_events(highlighter: &mut Highlighter) -> Arc<Mutex<Vec<&'static str>>> {
        let log = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&log);
        highlighter.subscribe(move |event| {
            sink.lock().unwrap().push(match event {
                IdentityEvent::Appeared { .. } => "appeared",
                IdentityEvent::Disappeared { .. } => "disappeared",
            });
        });
        log
    }

    #[test]
    fn test_opening_comment_propagates_until_state_settles() {
        let mut highlighter = Highlighter::new(c_rules(), FallbackStyle::default());
        let mut doc = BlockDocument::from_text("int a;\nint b;\nint c;");
        let mut sink = SpanRecorder::new();
        assert_eq!(highlighter.rehighlight(&mut doc, &mut sink), 0..3);

        assert_eq!(highlighter.edit_line(&mut doc, &mut sink, 0, "/* int a;"), 0..3);
        assert_eq!(doc.block_state(2), BlockState::open(1));

        assert_eq!(highlighter.edit_line(&mut doc, &mut sink, 1, "*/ int b;"), 1..3);
        assert_eq!(doc.block_state(1), BlockState::NONE);
        assert_eq!(doc.block_state(2), BlockState::NONE);

        assert_eq!(highlighter.edit_line(&mut doc, &mut sink, 2, "int d;"), 2..3);
    }

    #[test]
    fn test_closing_line_is_painted_up_to_the_close_only() {
        let mut highlighter = Highlighter::new(c_rules(), FallbackStyle::default());
        let mut doc = BlockDocument::from_text("/* start\n*/ int b;");
        let mut sink = SpanRecorder::new();
        highlighter.rehighlight(&mut doc, &mut sink);

        let comment = highlighter.formats().get(1).cloned().unwrap();
        let second = doc.block_ref(1).unwrap();
        assert_eq!(sink.spans_for(second), &[StyledSpan::new(0, 2, comment)]);
    }

    #[test]
    fn test_unchanged_state_stops_after_the_range() {
        let mut highlighter = Highlighter::new(c_rules(), FallbackStyle::default());
        let mut doc = BlockDocument::from_text("a\nb\nc\nd");
        let mut sink = SpanRecorder::new();
        highlighter.rehighlight(&mut doc, &mut sink);
        let before = sink.applied_count();

        assert_eq!(highlighter.rehighlight_range(&mut doc, &mut sink, 1..2), 1..2);
        assert_eq!(sink.applied_count(), before + 1);
        assert_eq!(highlighter.rehighlight_range(&mut doc, &mut sink, 9..12), 4..4);
    }

    #[test]
    fn test_identity_follows_line_edits() {
        let mut highlighter = Highlighter::new(todo_rules(), FallbackStyle::default());
        let log = record_events(&mut highlighter);
        let mut doc = BlockDocument::from_text("TODO\nx");
        let mut sink = SpanRecorder::new();

        highlighter.rehighlight(&mut doc, &mut sink);
        assert_eq!(*log.lock().unwrap(), vec!["appeared"]);
        assert!(doc.identity(0).is_some());

        highlighter.edit_line(&mut doc, &mut sink, 0, "nothing");
        assert_eq!(*log.lock().unwrap(), vec!["appeared", "disappeared"]);
        assert!(doc.identity(0).is_none());
        assert_eq!(highlighter.registry().live_count(), 0);
    }

    #[test]
    fn test_reparse_retires_before_reissuing() {
        let mut highlighter = Highlighter::new(todo_rules(), FallbackStyle::default());
        let mut doc = BlockDocument::from_text("TODO");
        let mut sink = SpanRecorder::new();
        highlighter.rehighlight(&mut doc, &mut sink);

        let log = record_events(&mut highlighter);
        highlighter.reparse_range(&mut doc, &mut sink, 0..1);
        assert_eq!(*log.lock().unwrap(), vec!["disappeared", "appeared"]);
        assert_eq!(highlighter.registry().live_count(), 1);
    }

    #[test]
    fn test_set_rules_retires_every_identity() {
        let mut highlighter = Highlighter::new(todo_rules(), FallbackStyle::default());
        let mut doc = BlockDocument::from_text("TODO\nTODO");
        let mut sink = SpanRecorder::new();
        highlighter.rehighlight(&mut doc, &mut sink);
        assert_eq!(highlighter.registry().live_count(), 2);

        let log = record_events(&mut highlighter);
        highlighter.set_rules(c_rules());
        assert_eq!(*log.lock().unwrap(), vec!["disappeared", "disappeared"]);
        assert_eq!(highlighter.registry().live_count(), 0);
        assert_eq!(highlighter.formats().len(), 2);

        // Stale slots are dropped silently on the next pass.
        highlighter.rehighlight(&mut doc, &mut sink);
        assert_eq!(log.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_remove_line_retires_its_identity() {
        let mut highlighter = Highlighter::new(todo_rules(), FallbackStyle::default());
        let mut doc = BlockDocument::from_text("a\nTODO\nb");
        let mut sink = SpanRecorder::new();
        highlighter.rehighlight(&mut doc, &mut sink);

        let log = record_events(&mut highlighter);
        assert_eq!(highlighter.remove_line(&mut doc, &mut sink, 1), 1..2);
        assert_eq!(*log.lock().unwrap(), vec!["disappeared"]);
        assert_eq!(highlighter.registry().live_count(), 0);
        assert_eq!(doc.text(), "a\nb");
    }

    #[test]
    fn test_insert_line_inside_comment() {
        let mut highlighter = Highlighter::new(c_rules(), FallbackStyle::default());
        let mut doc = BlockDocument::from_text("/*\n*/\nint x;");
        let mut sink = SpanRecorder::new();
        highlighter.rehighlight(&mut doc, &mut sink);

        // The closing line keeps its state, so propagation stops there.
        assert_eq!(highlighter.insert_line(&mut doc, &mut sink, 1, "int y;"), 1..3);
        assert_eq!(doc.block_state(1), BlockState::open(1));
        assert_eq!(doc.block_state(2), BlockState::NONE);
    }

    fn states(doc: &BlockDocument) -> Vec<BlockState> {
        (0..doc.line_count()).map(|i| doc.block_state(i)).collect()
    }

    #[test]
    fn test_inserted_closing_line_ends_comment_below() {
        let mut highlighter = Highlighter::new(c_rules(), FallbackStyle::default());
        let mut doc = BlockDocument::from_text("/*\nfoo\nbar");
        let mut sink = SpanRecorder::new();
        highlighter.rehighlight(&mut doc, &mut sink);

        assert_eq!(highlighter.insert_line(&mut doc, &mut sink, 1, "*/"), 1..4);

        let mut fresh_doc = BlockDocument::from_text(&doc.text());
        let mut fresh_sink = SpanRecorder::new();
        Highlighter::new(c_rules(), FallbackStyle::default())
            .rehighlight(&mut fresh_doc, &mut fresh_sink);
        assert_eq!(states(&doc), states(&fresh_doc));
        assert_eq!(
            states(&doc),
            vec![BlockState::open(1), BlockState::NONE, BlockState::NONE, BlockState::NONE]
        );

        let foo = doc.block_ref(2).unwrap();
        assert!(sink.spans_for(foo).is_empty());
    }

    #[test]
    fn test_insert_at_end_of_document() {
        let mut highlighter = Highlighter::new(c_rules(), FallbackStyle::default());
        let mut doc = BlockDocument::from_text("int a;");
        let mut sink = SpanRecorder::new();
        highlighter.rehighlight(&mut doc, &mut sink);

        assert_eq!(highlighter.insert_line(&mut doc, &mut sink, 5, "int b;"), 1..2);
        assert_eq!(doc.text(), "int a;\nint b;");
    }

    #[test]
    fn test_highlight_hook_spans_come_last() {
        let mut highlighter = Highlighter::new(c_rules(), FallbackStyle::default());
        let marker = highlighter.formats().get(1).cloned().unwrap();
        let hook_format = marker.clone();
        highlighter.subscribe_highlight(move |ctx| {
            if ctx.text.starts_with("int") {
                ctx.highlight(0, 1, hook_format.clone());
            }
        });

        let mut doc = BlockDocument::from_text("int a;");
        let mut sink = SpanRecorder::new();
        highlighter.rehighlight(&mut doc, &mut sink);

        let keyword = highlighter.formats().get(0).cloned().unwrap();
        let block = doc.block_ref(0).unwrap();
        assert_eq!(
            sink.spans_for(block),
            &[StyledSpan::new(0, 3, keyword), StyledSpan::new(0, 1, marker)]
        );
    }

    #[test]
    fn test_fallback_change_recolors_without_moving_spans() {
        let rules = RuleSet::load_ordered(vec![Rule::new(r"\d+")]).unwrap();
        let mut highlighter = Highlighter::new(rules, FallbackStyle::default());
        let mut doc = BlockDocument::from_text("x 42");
        let mut sink = SpanRecorder::new();
        highlighter.rehighlight(&mut doc, &mut sink);

        let mut fallback = FallbackStyle::default();
        fallback.text_color = Color::rgb(200, 0, 0);
        highlighter.set_fallback_style(fallback);
        highlighter.rehighlight(&mut doc, &mut sink);

        let block = doc.block_ref(0).unwrap();
        let spans = sink.spans_for(block);
        assert_eq!(spans.len(), 1);
        assert_eq!((spans[0].start, spans[0].length), (2, 2));
        assert_eq!(spans[0].format.foreground, Color::rgb(200, 0, 0));
    }
}
