//! Identity tokens for matches of named rules.
//!
//! When a rule with a non-empty id matches in a block, the block gets a [`MatchIdentity`].
//! Subscribers use the token as a stable key for "this logical match" and are told when it
//! appears and disappears. A block holds at most one identity at a time.

use std::collections::HashMap;
use std::fmt;

/// Stable reference to a block.
///
/// Unlike a block's position, a `BlockRef` does not change when blocks are inserted or
/// removed before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BlockRef(pub u64);

/// Unique identity token. Tokens are never reused by the registry that issued them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IdentityToken(u64);

impl IdentityToken {
    /// Raw token value.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for IdentityToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// The identity of one named match living in one block.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MatchIdentity {
    /// Unique token.
    pub token: IdentityToken,
    /// The pattern that produced the match (a rule's pattern, or its closing pattern).
    pub pattern: String,
    /// The block owning the identity.
    pub block: BlockRef,
}

/// Issues and tracks live [`MatchIdentity`] values for one editor instance.
#[derive(Debug, Default)]
pub struct MatchIdentityRegistry {
    next_token: u64,
    live: HashMap<IdentityToken, MatchIdentity>,
}

impl MatchIdentityRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a fresh identity for a match of `pattern` in `block`.
    pub fn create(&mut self, block: BlockRef, pattern: &str) -> MatchIdentity {
        self.next_token += 1;
        let identity = MatchIdentity {
            token: IdentityToken(self.next_token),
            pattern: pattern.to_string(),
            block,
        };
        self.live.insert(identity.token, identity.clone());
        identity
    }

    /// Retire a live identity.
    ///
    /// Retiring an identity that is not live is a caller bug: it panics in debug builds and
    /// is ignored otherwise.
    pub fn retire(&mut self, identity: &MatchIdentity) {
        let removed = self.live.remove(&identity.token);
        debug_assert!(
            removed.is_some(),
            "retiring identity {} which is not live",
            identity.token
        );
    }

    /// Whether `identity` is live and owned by `block`.
    pub fn belongs_to_block(&self, identity: &MatchIdentity, block: BlockRef) -> bool {
        self.live
            .get(&identity.token)
            .is_some_and(|live| live.block == block)
    }

    /// Whether `identity` is live.
    pub fn is_live(&self, identity: &MatchIdentity) -> bool {
        self.live.contains_key(&identity.token)
    }

    /// Number of live identities.
    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    /// Retire every live identity, returning them ordered by token.
    ///
    /// Token numbering continues afterwards, so old tokens never come back.
    pub fn retire_all(&mut self) -> Vec<MatchIdentity> {
        let mut retired = self.live.drain().map(|(_, v)| v).collect::<Vec<_>>();
        retired.sort_by_key(|identity| identity.token);
        retired
    }

    /// Retire every live identity owned by one of `blocks`, returning them ordered by token.
    pub fn retire_blocks(&mut self, blocks: &[BlockRef]) -> Vec<MatchIdentity> {
        let tokens = self
            .live
            .values()
            .filter(|identity| blocks.contains(&identity.block))
            .map(|identity| identity.token)
            .collect::<Vec<_>>();

        let mut retired = tokens
            .into_iter()
            .filter_map(|token| self.live.remove(&token))
            .collect::<Vec<_>>();
        retired.sort_by_key(|identity| identity.token);
        retired
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokens_are_unique_and_never_reused() {
        let mut registry = MatchIdentityRegistry::new();
        let a = registry.create(BlockRef(0), "x");
        let b = registry.create(BlockRef(1), "x");
        assert_ne!(a.token, b.token);

        registry.retire(&a);
        let retired = registry.retire_all();
        assert_eq!(retired, vec![b.clone()]);

        let c = registry.create(BlockRef(0), "x");
        assert!(c.token > b.token);
        assert_eq!(registry.live_count(), 1);
    }

    #[test]
    fn test_belongs_to_block() {
        let mut registry = MatchIdentityRegistry::new();
        let a = registry.create(BlockRef(3), "x");
        assert!(registry.belongs_to_block(&a, BlockRef(3)));
        assert!(!registry.belongs_to_block(&a, BlockRef(4)));

        registry.retire(&a);
        assert!(!registry.belongs_to_block(&a, BlockRef(3)));
        assert!(!registry.is_live(&a));
    }

    #[test]
    fn test_retire_blocks_only_touches_given_blocks() {
        let mut registry = MatchIdentityRegistry::new();
        let a = registry.create(BlockRef(0), "x");
        let b = registry.create(BlockRef(1), "y");
        let c = registry.create(BlockRef(2), "z");

        let retired = registry.retire_blocks(&[BlockRef(2), BlockRef(0)]);
        assert_eq!(retired, vec![a, c]);
        assert!(registry.is_live(&b));
        assert_eq!(registry.live_count(), 1);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "not live")]
    fn test_retiring_unknown_identity_panics_in_debug() {
        let mut registry = MatchIdentityRegistry::new();
        let a = registry.create(BlockRef(0), "x");
        registry.retire(&a);
        registry.retire(&a);
    }
}
