//! The per-block highlighting state machine.
//!
//! A block is highlighted from its own text plus the state carried over from the previous
//! block. The carried state names the multi-line rule (if any) still open at the end of the
//! previous block:
//!
//! 1. If a rule is open, its closing pattern is searched first. A close paints the block up
//!    to the end of the closing match; no close paints the whole block and keeps the rule
//!    open. Either way ordinary rules are not evaluated for this block.
//! 2. Otherwise every rule is evaluated in order. A multi-line rule whose closing pattern is
//!    not found after its opening match leaves the rule open for the next block.
//! 3. Matches of named rules drive the block's identity slot (see [`MatchIdentity`]).

use crate::error::RegexCompileError;
use crate::events::IdentityEvent;
use crate::format::FormatCache;
use crate::identity::{BlockRef, MatchIdentity, MatchIdentityRegistry};
use crate::pattern::{PatternCache, find_non_empty};
use crate::rule::RuleSet;
use crate::span::Span;

/// State carried from one block to the next.
///
/// Either [`BlockState::NONE`] (`-1`, nothing open) or the index of the multi-line rule left
/// open at the end of the block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockState(i32);

impl BlockState {
    /// No multi-line rule open.
    pub const NONE: Self = Self(-1);

    /// The rule at `rule_index` is open.
    pub fn open(rule_index: usize) -> Self {
        i32::try_from(rule_index).map_or(Self::NONE, BlockState)
    }

    /// From the raw integer tag; any negative value means [`BlockState::NONE`].
    pub fn from_raw(raw: i32) -> Self {
        if raw < 0 { Self::NONE } else { Self(raw) }
    }

    /// The raw integer tag (`-1` for none).
    pub fn raw(self) -> i32 {
        self.0
    }

    /// Index of the open rule, if any.
    pub fn open_rule(self) -> Option<usize> {
        usize::try_from(self.0).ok()
    }

    /// Whether no rule is open.
    pub fn is_none(self) -> bool {
        self.0 < 0
    }
}

impl Default for BlockState {
    fn default() -> Self {
        Self::NONE
    }
}

/// Output of [`BlockHighlighter::highlight_block`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HighlightResult {
    /// Spans in emission order. Where spans overlap, later ones win.
    pub spans: Vec<Span>,
    /// State to carry into the next block.
    pub state: BlockState,
    /// The block's identity slot after this pass.
    pub identity: Option<MatchIdentity>,
    /// Identity lifecycle events, in the order they happened.
    pub events: Vec<IdentityEvent>,
    /// Patterns that could not be compiled; their rules were skipped.
    pub diagnostics: Vec<RegexCompileError>,
}

/// Highlights one block at a time.
///
/// Holds nothing but compiled patterns, so the same instance can serve any sequence of
/// blocks as long as the caller threads the carried state through in document order.
#[derive(Debug, Default)]
pub struct BlockHighlighter {
    patterns: PatternCache,
}

impl BlockHighlighter {
    /// Create a highlighter with an empty pattern cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop all compiled patterns (e.g. after the rule set changed).
    pub fn clear_cache(&mut self) {
        self.patterns.clear();
    }

    /// Highlight `text`, the content of `block`.
    ///
    /// `previous_state` is the state returned for the preceding block (or
    /// [`BlockState::NONE`] for the first block). A state that does not name a multi-line rule
    /// of `rules` is treated as none. `previous_identity` is the block's identity slot from the
    /// last pass; it is revalidated against `registry` and the new text.
    pub fn highlight_block(
        &mut self,
        block: BlockRef,
        text: &str,
        previous_state: BlockState,
        rules: &RuleSet,
        formats: &FormatCache,
        previous_identity: Option<MatchIdentity>,
        registry: &mut MatchIdentityRegistry,
    ) -> HighlightResult {
        let mut pass = BlockPass {
            block,
            text,
            rules,
            formats,
            registry,
            result: HighlightResult::default(),
        };

        self.revalidate_identity(&mut pass, previous_identity);

        let carried = previous_state.open_rule().filter(|&idx| {
            let usable = rules.get(idx).is_some_and(|rule| rule.is_multi_line())
                && formats.get(idx).is_some();
            if !usable {
                tracing::debug!(
                    block = block.0,
                    state = previous_state.raw(),
                    "discarding stale carry-over state"
                );
            }
            usable
        });

        let closed = match carried {
            Some(rule_index) => self.continue_open_rule(&mut pass, rule_index),
            None => false,
        };
        if !closed {
            self.sweep_rules(&mut pass);
        }

        tracing::trace!(
            block = block.0,
            spans = pass.result.spans.len(),
            state = pass.result.state.raw(),
            "highlighted block"
        );
        pass.result
    }

    fn revalidate_identity(&mut self, pass: &mut BlockPass<'_>, previous: Option<MatchIdentity>) {
        let Some(identity) = previous else {
            return;
        };

        if !pass.registry.belongs_to_block(&identity, pass.block) {
            // Retired elsewhere (rule set change, reparse); nothing left to announce.
            return;
        }

        let still_matches = self
            .patterns
            .get(&identity.pattern)
            .is_ok_and(|regex| find_non_empty(&regex, pass.text, 0).is_some());

        if still_matches {
            pass.result.identity = Some(identity);
        } else {
            pass.registry.retire(&identity);
            pass.result
                .events
                .push(IdentityEvent::Disappeared { identity });
        }
    }

    /// Search the closing pattern of the open rule. Returns `false` if the block still needs
    /// the ordinary rule sweep (only when the closing pattern does not compile).
    fn continue_open_rule(&mut self, pass: &mut BlockPass<'_>, rule_index: usize) -> bool {
        let rules = pass.rules;
        let rule = &rules[rule_index];
        let closing = match self.patterns.get(rule.closing_pattern()) {
            Ok(regex) => regex,
            Err(err) => {
                pass.result.diagnostics.push(err);
                return false;
            }
        };

        match find_non_empty(&closing, pass.text, 0) {
            Some((_, end)) => {
                pass.emit(0, end, rule_index);
                pass.result.state = BlockState::NONE;
                if rule.is_named() {
                    pass.track_identity(rule_index, rule.closing_pattern(), 0, end);
                }
            }
            None => {
                pass.emit(0, pass.text.len(), rule_index);
                pass.result.state = BlockState::open(rule_index);
            }
        }
        true
    }

    fn sweep_rules(&mut self, pass: &mut BlockPass<'_>) {
        let text = pass.text;
        let rules = pass.rules;

        for (index, rule) in rules.iter().enumerate() {
            if pass.formats.get(index).is_none() {
                tracing::warn!(rule = index, "format cache is out of date, skipping rule");
                continue;
            }

            let opening = match self.patterns.get(rule.pattern()) {
                Ok(regex) => regex,
                Err(err) => {
                    pass.result.diagnostics.push(err);
                    continue;
                }
            };
            let closing = if rule.is_multi_line() {
                match self.patterns.get(rule.closing_pattern()) {
                    Ok(regex) => Some(regex),
                    Err(err) => {
                        pass.result.diagnostics.push(err);
                        continue;
                    }
                }
            } else {
                None
            };

            let mut pos = 0;
            while let Some((start, open_end)) = find_non_empty(&opening, text, pos) {
                let end = match &closing {
                    None => open_end,
                    Some(closing) => match find_non_empty(closing, text, open_end) {
                        Some((_, close_end)) => close_end,
                        None => {
                            if pass.result.state.is_none() {
                                pass.result.state = BlockState::open(index);
                            }
                            text.len()
                        }
                    },
                };

                pass.emit(start, end, index);
                if rule.is_named() {
                    pass.track_identity(index, rule.pattern(), start, end);
                }

                if !rule.is_global() || end >= text.len() {
                    break;
                }
                pos = end;
            }
        }
    }
}

struct BlockPass<'a> {
    block: BlockRef,
    text: &'a str,
    rules: &'a RuleSet,
    formats: &'a FormatCache,
    registry: &'a mut MatchIdentityRegistry,
    result: HighlightResult,
}

impl BlockPass<'_> {
    fn emit(&mut self, start: usize, end: usize, format_index: usize) {
        if end > start {
            self.result
                .spans
                .push(Span::new(start, end - start, format_index));
        }
    }

    /// Apply the identity policy for a match of `signature` over `start..end`.
    ///
    /// An empty slot gets a new identity. A slot holding an identity of the same pattern is
    /// retired and replaced. A slot owned by another pattern is left alone.
    fn track_identity(&mut self, rule_index: usize, signature: &str, start: usize, end: usize) {
        if let Some(current) = &self.result.identity {
            if current.pattern != signature {
                return;
            }
            self.registry.retire(current);
            if let Some(identity) = self.result.identity.take() {
                self.result
                    .events
                    .push(IdentityEvent::Disappeared { identity });
            }
        }

        let identity = self.registry.create(self.block, signature);
        self.result.events.push(IdentityEvent::Appeared {
            identity: identity.clone(),
            rule_index,
            rule_id: self.rules[rule_index].id().to_string(),
            matched_text: self.text[start..end].to_string(),
            block: self.block,
        });
        self.result.identity = Some(identity);
    }
}
