//! Highlighting rules and ordered rule sets.

use crate::error::InvalidRuleError;
use crate::style::{Color, FontSpec};
use std::collections::BTreeSet;
use std::ops::Index;
use std::slice;

/// A single highlighting rule: a pattern plus display attributes.
///
/// A rule with both an opening and a closing pattern describes a construct that may span
/// several blocks (block comments, multi-line strings). Its `pattern` is the opening pattern.
#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    pattern: String,
    opening_pattern: String,
    closing_pattern: String,
    id: String,
    is_global: bool,
    font: Option<FontSpec>,
    fore_color: Color,
    back_color: Color,
}

impl Default for Rule {
    fn default() -> Self {
        Self {
            pattern: String::new(),
            opening_pattern: String::new(),
            closing_pattern: String::new(),
            id: String::new(),
            is_global: true,
            font: None,
            fore_color: Color::TRANSPARENT,
            back_color: Color::TRANSPARENT,
        }
    }
}

impl Rule {
    /// A single-line rule matching `pattern`.
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            ..Self::default()
        }
    }

    /// A multi-line rule opened by `opening` and closed by `closing`.
    pub fn multi_line(opening: impl Into<String>, closing: impl Into<String>) -> Self {
        Self::default()
            .with_opening_pattern(opening)
            .with_closing_pattern(closing)
    }

    /// A rule matching any of `keywords` as a whole word.
    ///
    /// With `at_line_start` the pattern is `(^|\s)(kw1|kw2|...)\b`, otherwise
    /// `\b(kw1|kw2|...)\b`. Keywords are joined in sorted order.
    ///
    /// Keywords are inserted verbatim: regex metacharacters are *not* escaped. Use
    /// [`Rule::from_literal_keywords`] for plain words that may contain them.
    pub fn from_keywords<S: AsRef<str>>(keywords: &BTreeSet<S>, at_line_start: bool) -> Self
    where
        S: Ord,
    {
        let alternatives = keywords
            .iter()
            .map(|k| k.as_ref())
            .collect::<Vec<_>>()
            .join("|");
        let pattern = if at_line_start {
            format!(r"(^|\s)({alternatives})\b")
        } else {
            format!(r"\b({alternatives})\b")
        };
        Self::new(pattern)
    }

    /// Like [`Rule::from_keywords`], escaping every keyword first.
    pub fn from_literal_keywords<S: AsRef<str>>(keywords: &BTreeSet<S>, at_line_start: bool) -> Self
    where
        S: Ord,
    {
        let escaped = keywords
            .iter()
            .map(|k| regex::escape(k.as_ref()))
            .collect::<BTreeSet<_>>();
        Self::from_keywords(&escaped, at_line_start)
    }

    /// Replace the match pattern. If an opening pattern is set, it is replaced as well.
    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = pattern.into();
        if !self.opening_pattern.is_empty() {
            self.opening_pattern = self.pattern.clone();
        }
        self
    }

    /// Set the opening pattern. This also becomes the rule's `pattern`.
    pub fn with_opening_pattern(mut self, pattern: impl Into<String>) -> Self {
        let pattern = pattern.into();
        self.pattern = pattern.clone();
        self.opening_pattern = pattern;
        self
    }

    /// Set the closing pattern, turning this into a multi-line rule.
    pub fn with_closing_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.closing_pattern = pattern.into();
        self
    }

    /// Name the rule. Matches of named rules are tracked with identities.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Find all matches per block (`true`, the default) or only the first one.
    pub fn with_global(mut self, global: bool) -> Self {
        self.is_global = global;
        self
    }

    /// Use a custom font instead of the fallback font.
    pub fn with_font(mut self, font: FontSpec) -> Self {
        self.font = Some(font);
        self
    }

    /// Set the foreground color. Transparent means "use the fallback text color".
    pub fn with_fore_color(mut self, color: Color) -> Self {
        self.fore_color = color;
        self
    }

    /// Set the background color. Transparent means "no fill".
    pub fn with_back_color(mut self, color: Color) -> Self {
        self.back_color = color;
        self
    }

    /// The match pattern (the opening pattern for multi-line rules).
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// The opening pattern, empty unless set explicitly.
    pub fn opening_pattern(&self) -> &str {
        &self.opening_pattern
    }

    /// The closing pattern, empty for single-line rules.
    pub fn closing_pattern(&self) -> &str {
        &self.closing_pattern
    }

    /// Rule identity name; empty for anonymous rules.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Whether matches of this rule take part in identity tracking.
    pub fn is_named(&self) -> bool {
        !self.id.is_empty()
    }

    /// Whether all matches (rather than only the first) are highlighted.
    pub fn is_global(&self) -> bool {
        self.is_global
    }

    /// Whether this rule can leave a construct open at the end of a block.
    pub fn is_multi_line(&self) -> bool {
        !self.closing_pattern.is_empty()
    }

    /// The custom font, if any.
    pub fn font(&self) -> Option<&FontSpec> {
        self.font.as_ref()
    }

    /// Foreground color.
    pub fn fore_color(&self) -> Color {
        self.fore_color
    }

    /// Background color.
    pub fn back_color(&self) -> Color {
        self.back_color
    }

    /// Whether the rule has something to match.
    pub fn validate(&self) -> bool {
        validate(self)
    }
}

/// A rule is valid if it has a pattern, or both an opening and a closing pattern.
pub fn validate(rule: &Rule) -> bool {
    !rule.pattern.is_empty()
        || (!rule.opening_pattern.is_empty() && !rule.closing_pattern.is_empty())
}

/// An ordered, immutable collection of validated rules.
///
/// Order is significant: rules are evaluated first to last, and when spans overlap the later
/// rule's format is the one that shows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    /// An empty rule set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and store `rules` in the given order.
    ///
    /// Fails if any rule is invalid; the error lists every offending index.
    pub fn load_ordered(rules: Vec<Rule>) -> Result<Self, InvalidRuleError> {
        let indices = rules
            .iter()
            .enumerate()
            .filter(|(_, rule)| !validate(rule))
            .map(|(idx, _)| idx)
            .collect::<Vec<_>>();

        if !indices.is_empty() {
            return Err(InvalidRuleError { indices });
        }

        Ok(Self { rules })
    }

    /// Number of rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether the set has no rules.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Get a rule by index.
    pub fn get(&self, index: usize) -> Option<&Rule> {
        self.rules.get(index)
    }

    /// Iterate rules in evaluation order.
    pub fn iter(&self) -> slice::Iter<'_, Rule> {
        self.rules.iter()
    }

    /// All rules, in evaluation order.
    pub fn as_slice(&self) -> &[Rule] {
        &self.rules
    }
}

impl Index<usize> for RuleSet {
    type Output = Rule;

    fn index(&self, index: usize) -> &Self::Output {
        &self.rules[index]
    }
}

impl<'a> IntoIterator for &'a RuleSet {
    type Item = &'a Rule;
    type IntoIter = slice::Iter<'a, Rule>;

    fn into_iter(self) -> Self::IntoIter {
        self.rules.iter()
    }
}
