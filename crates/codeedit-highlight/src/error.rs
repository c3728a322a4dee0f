use thiserror::Error;

/// A rule set was rejected because one or more rules have no usable pattern.
///
/// A rule needs either a non-empty `pattern`, or both an opening and a closing pattern.
/// The whole set is rejected rather than silently dropping the offending rules.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid rule(s) at index {}: a rule needs a pattern or an opening/closing pair", join_indices(.indices))]
pub struct InvalidRuleError {
    /// Indices (in load order) of every rule that failed validation.
    pub indices: Vec<usize>,
}

fn join_indices(indices: &[usize]) -> String {
    indices
        .iter()
        .map(|i| i.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// A rule pattern failed to compile.
///
/// Produced at highlight time. The affected rule is skipped for the pass; the rest of the
/// block is still highlighted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("regex compile error for pattern '{pattern}': {message}")]
pub struct RegexCompileError {
    /// The regex pattern string.
    pub pattern: String,
    /// The compiler error message.
    pub message: String,
}

#[derive(Debug, Error)]
/// Errors produced while loading rule sets and designs from YAML definitions.
pub enum DefinitionError {
    #[error("YAML parse error: {0}")]
    /// YAML parsing failed.
    Yaml(#[from] serde_yaml::Error),

    #[error("I/O error: {0}")]
    /// Filesystem I/O failed.
    Io(#[from] std::io::Error),

    #[error("invalid color '{0}'")]
    /// A color string is not `#RRGGBB`, `#AARRGGBB`, `rgba(r, g, b, a)` or `transparent`.
    InvalidColor(String),

    #[error("rule {index}: only one of 'regex', 'keywords' or 'start_regex' may be set")]
    /// A rule definition names more than one pattern source.
    ConflictingPatterns {
        /// Index of the rule definition.
        index: usize,
    },

    #[error(transparent)]
    /// The resulting rule set failed validation.
    InvalidRules(#[from] InvalidRuleError),
}
