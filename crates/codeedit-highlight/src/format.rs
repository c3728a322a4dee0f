//! Resolved display formats, one per rule.

use crate::rule::RuleSet;
use crate::span::{Span, StyledSpan};
use crate::style::{Color, FontSpec};

/// The resolved display attributes applied to a span.
#[derive(Debug, Clone, PartialEq)]
pub struct TextFormat {
    /// Font to draw the span with.
    pub font: FontSpec,
    /// Text color.
    pub foreground: Color,
    /// Fill color; transparent means no fill.
    pub background: Color,
}

/// Formats aligned 1:1 by index with a [`RuleSet`].
///
/// The cache is derived data: whenever the rules or the fallback style change, build a new
/// one with [`FormatCache::rebuild`]. It is never patched in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormatCache {
    formats: Vec<TextFormat>,
}

impl FormatCache {
    /// Resolve one format per rule.
    ///
    /// - font: the rule's font if it defines one, otherwise `fallback_font`
    /// - foreground: `fallback_text_color` if the rule's color is transparent
    /// - background: the rule's back color as-is
    pub fn rebuild(rules: &RuleSet, fallback_font: &FontSpec, fallback_text_color: Color) -> Self {
        let formats = rules
            .iter()
            .map(|rule| TextFormat {
                font: rule.font().unwrap_or(fallback_font).clone(),
                foreground: if rule.fore_color().is_transparent() {
                    fallback_text_color
                } else {
                    rule.fore_color()
                },
                background: rule.back_color(),
            })
            .collect();
        Self { formats }
    }

    /// Number of formats (equals the rule count it was built from).
    pub fn len(&self) -> usize {
        self.formats.len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.formats.is_empty()
    }

    /// Format for the rule at `index`.
    pub fn get(&self, index: usize) -> Option<&TextFormat> {
        self.formats.get(index)
    }

    /// Attach formats to spans, dropping spans whose index has no format.
    pub fn resolve(&self, spans: &[Span]) -> Vec<StyledSpan> {
        spans
            .iter()
            .filter_map(|span| {
                self.get(span.format_index)
                    .map(|format| StyledSpan::new(span.start, span.length, format.clone()))
            })
            .collect()
    }
}
