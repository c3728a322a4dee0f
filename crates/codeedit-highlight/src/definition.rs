//! YAML rule set and design definitions.
//!
//! A rule set file looks like:
//!
//! ```yaml
//! rules:
//!   - keywords:
//!       words: [int, return, while]
//!     fore_color: "#0000ff"
//!     font: { bold: true }
//!   - id: block-comment
//!     start_regex: '/\*'
//!     close_regex: '\*/'
//!     fore_color: "#008000"
//! ```
//!
//! and a design file like:
//!
//! ```yaml
//! editor_font: { family: Monospace, point_size: 10 }
//! editor_text_color: "#333333"
//! ```

use crate::error::DefinitionError;
use crate::rule::{Rule, RuleSet};
use crate::style::{Color, FallbackStyle, FontSpec};
use serde::Deserialize;
use std::collections::BTreeSet;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
/// Raw YAML rule set definition.
pub struct RuleSetDefinition {
    #[serde(default)]
    /// Rules in evaluation order.
    pub rules: Vec<RuleDefinition>,
}

#[derive(Debug, Clone, Deserialize)]
/// A single rule entry.
pub struct RuleDefinition {
    #[serde(default)]
    /// Identity name; empty or absent for anonymous rules.
    pub id: Option<String>,

    #[serde(default = "default_global")]
    /// Highlight every match (default) or only the first one per block.
    pub global: bool,

    #[serde(default)]
    /// Single-line match pattern.
    pub regex: Option<String>,

    #[serde(default)]
    /// Keyword list, turned into a whole-word pattern.
    pub keywords: Option<KeywordsDefinition>,

    #[serde(default)]
    /// Opening pattern of a multi-line rule.
    pub start_regex: Option<String>,

    #[serde(default)]
    /// Closing pattern of a multi-line rule.
    pub close_regex: Option<String>,

    #[serde(default)]
    /// Text color; absent or transparent means the editor text color.
    pub fore_color: Option<Color>,

    #[serde(default)]
    /// Fill color; absent or transparent means no fill.
    pub back_color: Option<Color>,

    #[serde(default)]
    /// Font overrides, applied on top of the editor font.
    pub font: Option<FontDefinition>,
}

fn default_global() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
/// `keywords:` entry of a rule.
pub struct KeywordsDefinition {
    /// The words.
    pub words: Vec<String>,

    #[serde(default)]
    /// Only match keywords at the start of a line (after optional whitespace).
    pub start: bool,

    #[serde(default)]
    /// Escape regex metacharacters in the words.
    pub literal: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
/// A partial font; unset fields are taken from a base font.
pub struct FontDefinition {
    #[serde(default)]
    /// Font family.
    pub family: Option<String>,
    #[serde(default)]
    /// Size in points.
    pub point_size: Option<f32>,
    #[serde(default)]
    /// Bold weight.
    pub bold: Option<bool>,
    #[serde(default)]
    /// Italic style.
    pub italic: Option<bool>,
    #[serde(default)]
    /// Underline decoration.
    pub underline: Option<bool>,
    #[serde(default)]
    /// Strike-through decoration.
    pub strikethrough: Option<bool>,
}

impl FontDefinition {
    /// Apply the set fields on top of `base`.
    pub fn merge_over(&self, base: &FontSpec) -> FontSpec {
        FontSpec {
            family: self.family.clone().unwrap_or_else(|| base.family.clone()),
            point_size: self.point_size.unwrap_or(base.point_size),
            bold: self.bold.unwrap_or(base.bold),
            italic: self.italic.unwrap_or(base.italic),
            underline: self.underline.unwrap_or(base.underline),
            strikethrough: self.strikethrough.unwrap_or(base.strikethrough),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
/// The design settings the highlighter uses.
pub struct DesignDefinition {
    #[serde(default)]
    /// Editor font.
    pub editor_font: Option<FontDefinition>,
    #[serde(default)]
    /// Editor text color.
    pub editor_text_color: Option<Color>,
}

impl DesignDefinition {
    /// Resolve against the built-in defaults.
    pub fn into_fallback_style(self) -> FallbackStyle {
        let defaults = FallbackStyle::default();
        FallbackStyle {
            font: self
                .editor_font
                .map_or_else(|| defaults.font.clone(), |font| font.merge_over(&defaults.font)),
            text_color: self.editor_text_color.unwrap_or(defaults.text_color),
        }
    }
}

impl RuleDefinition {
    /// Build the rule. `index` is only used for error reporting.
    pub fn to_rule(&self, index: usize, design_font: &FontSpec) -> Result<Rule, DefinitionError> {
        let sources = [
            self.regex.is_some(),
            self.keywords.is_some(),
            self.start_regex.is_some(),
        ];
        if sources.iter().filter(|&&set| set).count() > 1 {
            return Err(DefinitionError::ConflictingPatterns { index });
        }

        let mut rule = if let Some(keywords) = &self.keywords {
            let words = keywords.words.iter().collect::<BTreeSet<_>>();
            if keywords.literal {
                Rule::from_literal_keywords(&words, keywords.start)
            } else {
                Rule::from_keywords(&words, keywords.start)
            }
        } else if let Some(start) = &self.start_regex {
            Rule::default().with_opening_pattern(start.as_str())
        } else {
            Rule::new(self.regex.clone().unwrap_or_default())
        };

        if let Some(close) = &self.close_regex {
            rule = rule.with_closing_pattern(close.as_str());
        }
        if let Some(id) = &self.id {
            rule = rule.with_id(id.as_str());
        }
        if let Some(color) = self.fore_color {
            rule = rule.with_fore_color(color);
        }
        if let Some(color) = self.back_color {
            rule = rule.with_back_color(color);
        }
        if let Some(font) = &self.font {
            rule = rule.with_font(font.merge_over(design_font));
        }

        Ok(rule.with_global(self.global))
    }
}

impl RuleSetDefinition {
    /// Build and validate the rule set.
    pub fn into_rule_set(self, design_font: &FontSpec) -> Result<RuleSet, DefinitionError> {
        let rules = self
            .rules
            .iter()
            .enumerate()
            .map(|(index, def)| def.to_rule(index, design_font))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(RuleSet::load_ordered(rules)?)
    }
}

impl RuleSet {
    /// Parse a YAML rule set. Partial rule fonts are completed from `design_font`.
    pub fn from_yaml_str(yaml: &str, design_font: &FontSpec) -> Result<Self, DefinitionError> {
        let definition: RuleSetDefinition = serde_yaml::from_str(yaml)?;
        definition.into_rule_set(design_font)
    }

    /// Load a YAML rule set from a file.
    pub fn load_from_path(
        path: impl AsRef<Path>,
        design_font: &FontSpec,
    ) -> Result<Self, DefinitionError> {
        let yaml = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&yaml, design_font)
    }
}

impl FallbackStyle {
    /// Parse a YAML design. Missing settings keep their defaults.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, DefinitionError> {
        let definition: DesignDefinition = serde_yaml::from_str(yaml)?;
        Ok(definition.into_fallback_style())
    }

    /// Load a YAML design from a file.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, DefinitionError> {
        let yaml = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&yaml)
    }
}
