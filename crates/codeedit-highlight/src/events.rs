//! Observer lists for identity lifecycle events and the post-highlight hook.

use crate::format::TextFormat;
use crate::identity::{BlockRef, MatchIdentity};
use crate::span::StyledSpan;
use std::fmt;

/// Identity lifecycle event produced while highlighting a block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityEvent {
    /// A named rule matched and a new identity was issued for the block.
    Appeared {
        /// The new identity.
        identity: MatchIdentity,
        /// Index of the matching rule.
        rule_index: usize,
        /// Id of the matching rule.
        rule_id: String,
        /// The matched text.
        matched_text: String,
        /// The block the match lives in.
        block: BlockRef,
    },
    /// An identity was retired; subscribers should drop anything keyed by its token.
    Disappeared {
        /// The retired identity.
        identity: MatchIdentity,
    },
}

impl IdentityEvent {
    /// The identity this event is about.
    pub fn identity(&self) -> &MatchIdentity {
        match self {
            Self::Appeared { identity, .. } | Self::Disappeared { identity } => identity,
        }
    }
}

/// Callback type for identity events.
pub type IdentityCallback = Box<dyn FnMut(&IdentityEvent) + Send>;

/// Callback type for the post-highlight hook.
pub type HighlightHook = Box<dyn FnMut(&mut HighlightHookContext<'_>) + Send>;

/// What a post-highlight hook sees: the block just highlighted and a place to add extra
/// formatting on top of the rule spans.
#[derive(Debug)]
pub struct HighlightHookContext<'a> {
    /// The block just highlighted.
    pub block: BlockRef,
    /// Position of the block in the document.
    pub index: usize,
    /// The block text.
    pub text: &'a str,
    extra_spans: Vec<StyledSpan>,
}

impl<'a> HighlightHookContext<'a> {
    pub(crate) fn new(block: BlockRef, index: usize, text: &'a str) -> Self {
        Self {
            block,
            index,
            text,
            extra_spans: Vec::new(),
        }
    }

    /// Apply `format` to `length` bytes at `start`, after all rule spans.
    ///
    /// Empty ranges and ranges past the end of the block are ignored.
    pub fn highlight(&mut self, start: usize, length: usize, format: TextFormat) {
        if length == 0 || start.saturating_add(length) > self.text.len() {
            return;
        }
        self.extra_spans.push(StyledSpan::new(start, length, format));
    }

    /// Extra spans added so far.
    pub fn extra_spans(&self) -> &[StyledSpan] {
        &self.extra_spans
    }

    pub(crate) fn into_extra_spans(self) -> Vec<StyledSpan> {
        self.extra_spans
    }
}

/// Subscribers for one highlighter.
///
/// With no subscribers, publishing and running hooks are no-ops.
#[derive(Default)]
pub struct HighlightEvents {
    identity_callbacks: Vec<IdentityCallback>,
    highlight_hooks: Vec<HighlightHook>,
}

impl fmt::Debug for HighlightEvents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HighlightEvents")
            .field("identity_callbacks", &self.identity_callbacks.len())
            .field("highlight_hooks", &self.highlight_hooks.len())
            .finish()
    }
}

impl HighlightEvents {
    /// Create an empty subscriber list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to identity events.
    pub fn subscribe<F>(&mut self, callback: F)
    where
        F: FnMut(&IdentityEvent) + Send + 'static,
    {
        self.identity_callbacks.push(Box::new(callback));
    }

    /// Register a post-highlight hook.
    pub fn subscribe_highlight<F>(&mut self, hook: F)
    where
        F: FnMut(&mut HighlightHookContext<'_>) + Send + 'static,
    {
        self.highlight_hooks.push(Box::new(hook));
    }

    /// Deliver an identity event to every subscriber, in subscription order.
    pub fn publish(&mut self, event: &IdentityEvent) {
        for callback in &mut self.identity_callbacks {
            callback(event);
        }
    }

    /// Run every post-highlight hook on `ctx`, in registration order.
    pub fn run_highlight_hooks(&mut self, ctx: &mut HighlightHookContext<'_>) {
        for hook in &mut self.highlight_hooks {
            hook(ctx);
        }
    }
}
