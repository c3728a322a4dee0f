#![warn(missing_docs)]
//! `codeedit-highlight` - incremental, block-based syntax highlighting.
//!
//! A document is a sequence of blocks (lines). Each block is highlighted from its own text
//! plus the state carried over from the previous block, so an edit only re-highlights the
//! edited block and whatever follows it until the carried state settles.
//!
//! - [`RuleSet`] / [`Rule`]: ordered regex rules, single-line or multi-line
//! - [`FormatCache`]: one resolved [`TextFormat`] per rule
//! - [`BlockHighlighter`]: the per-block state machine
//! - [`MatchIdentityRegistry`]: identity tokens for matches of named rules
//! - [`Highlighter`]: drives the above over a [`LineSource`] and feeds a [`SpanSink`]

mod definition;
mod document;
mod error;
mod events;
mod format;
mod highlighter;
mod identity;
mod pattern;
mod rule;
mod session;
mod span;
mod style;

pub use definition::{
    DesignDefinition, FontDefinition, KeywordsDefinition, RuleDefinition, RuleSetDefinition,
};
pub use document::{BlockDocument, LineSource, SpanRecorder, SpanSink};
pub use error::{DefinitionError, InvalidRuleError, RegexCompileError};
pub use events::{
    HighlightEvents, HighlightHook, HighlightHookContext, IdentityCallback, IdentityEvent,
};
pub use format::{FormatCache, TextFormat};
pub use highlighter::{BlockHighlighter, BlockState, HighlightResult};
pub use identity::{BlockRef, IdentityToken, MatchIdentity, MatchIdentityRegistry};
pub use rule::{Rule, RuleSet, validate};
pub use session::Highlighter;
pub use span::{Span, StyledSpan, resolve_overlaps};
pub use style::{Color, FallbackStyle, FontSpec};
