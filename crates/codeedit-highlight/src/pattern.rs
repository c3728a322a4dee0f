use crate::error::RegexCompileError;
use onig::{Regex, Region, SearchOptions};
use std::collections::HashMap;
use std::sync::Arc;

/// Compiled regexes keyed by pattern source.
///
/// Each distinct pattern is compiled once; failures are cached too, so a broken pattern is
/// reported to the log once and then only surfaces through highlight diagnostics.
#[derive(Debug, Default)]
pub(crate) struct PatternCache {
    compiled: HashMap<String, Result<Arc<Regex>, RegexCompileError>>,
}

impl PatternCache {
    pub(crate) fn get(&mut self, pattern: &str) -> Result<Arc<Regex>, RegexCompileError> {
        if let Some(entry) = self.compiled.get(pattern) {
            return entry.clone();
        }

        let entry = Regex::new(pattern)
            .map(Arc::new)
            .map_err(|err| RegexCompileError {
                pattern: pattern.to_string(),
                message: err.to_string(),
            });
        if let Err(err) = &entry {
            tracing::warn!("skipping highlighting rule: {}", err);
        }

        self.compiled.insert(pattern.to_string(), entry.clone());
        entry
    }

    pub(crate) fn clear(&mut self) {
        self.compiled.clear();
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.compiled.len()
    }
}

/// Leftmost match starting at or after byte `from`, as `(start, end)`.
fn search_first(regex: &Regex, text: &str, from: usize) -> Option<(usize, usize)> {
    let mut region = Region::new();
    regex.search_with_options(
        text,
        from,
        text.len(),
        SearchOptions::SEARCH_OPTION_NONE,
        Some(&mut region),
    )?;
    region.pos(0)
}

/// Leftmost non-empty match at or after byte `from`.
///
/// Zero-width matches are stepped over one char at a time, so callers never see an empty
/// range and can always make progress.
pub(crate) fn find_non_empty(regex: &Regex, text: &str, from: usize) -> Option<(usize, usize)> {
    let mut pos = from;
    while pos <= text.len() {
        let (start, end) = search_first(regex, text, pos)?;
        if end > start {
            return Some((start, end));
        }
        let step = text[start..].chars().next()?.len_utf8();
        pos = start + step;
    }
    None
}
