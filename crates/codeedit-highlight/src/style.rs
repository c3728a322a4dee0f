//! Display attributes shared by rules and resolved formats.
//!
//! These are plain data; mapping them to an actual toolkit font/brush is the renderer's job.

use crate::error::DefinitionError;
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

/// An RGBA color.
///
/// A fully transparent color (`a == 0`) is meaningful: as a rule foreground it means "use the
/// fallback text color", as a background it means "no fill".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(try_from = "String")]
pub struct Color {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
    /// Alpha channel (0 = fully transparent).
    pub a: u8,
}

impl Color {
    /// Fully transparent black.
    pub const TRANSPARENT: Self = Self::rgba(0, 0, 0, 0);

    /// Opaque color from RGB channels.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 0xff }
    }

    /// Color from RGBA channels.
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Whether this color is the transparent sentinel.
    pub fn is_transparent(&self) -> bool {
        self.a == 0
    }
}

impl FromStr for Color {
    type Err = DefinitionError;

    /// Accepts `#RRGGBB` (opaque), `#AARRGGBB`, `rgba(r, g, b, a)`, `transparent`, or an
    /// empty string (transparent).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || DefinitionError::InvalidColor(s.to_string());
        let trimmed = s.trim();

        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("transparent") {
            return Ok(Self::TRANSPARENT);
        }

        if let Some(hex) = trimmed.strip_prefix('#') {
            let value = u32::from_str_radix(hex, 16).map_err(|_| invalid())?;
            return match hex.len() {
                6 => Ok(Self::rgb((value >> 16) as u8, (value >> 8) as u8, value as u8)),
                8 => Ok(Self::rgba(
                    (value >> 16) as u8,
                    (value >> 8) as u8,
                    value as u8,
                    (value >> 24) as u8,
                )),
                _ => Err(invalid()),
            };
        }

        if let Some(body) = trimmed
            .strip_prefix("rgba(")
            .and_then(|rest| rest.strip_suffix(')'))
        {
            let channels = body
                .split(',')
                .map(|part| part.trim().parse::<u8>())
                .collect::<Result<Vec<_>, _>>()
                .map_err(|_| invalid())?;
            let [r, g, b, a] = channels[..] else {
                return Err(invalid());
            };
            return Ok(Self::rgba(r, g, b, a));
        }

        Err(invalid())
    }
}

impl TryFrom<String> for Color {
    type Error = DefinitionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}{:02x}", self.a, self.r, self.g, self.b)
    }
}

/// A toolkit-independent font description.
#[derive(Debug, Clone, PartialEq)]
pub struct FontSpec {
    /// Font family name.
    pub family: String,
    /// Size in points.
    pub point_size: f32,
    /// Bold weight.
    pub bold: bool,
    /// Italic style.
    pub italic: bool,
    /// Underline decoration.
    pub underline: bool,
    /// Strike-through decoration.
    pub strikethrough: bool,
}

impl FontSpec {
    /// A regular-weight font of the given family and size.
    pub fn new(family: impl Into<String>, point_size: f32) -> Self {
        Self {
            family: family.into(),
            point_size,
            bold: false,
            italic: false,
            underline: false,
            strikethrough: false,
        }
    }

    /// Same font, bold.
    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    /// Same font, italic.
    pub fn italic(mut self) -> Self {
        self.italic = true;
        self
    }
}

impl Default for FontSpec {
    fn default() -> Self {
        Self::new("Monospace", 9.0)
    }
}

/// The part of the editor design the highlighter reads: the text font and text color used
/// whenever a rule does not define its own.
#[derive(Debug, Clone, PartialEq)]
pub struct FallbackStyle {
    /// Editor font.
    pub font: FontSpec,
    /// Editor text color.
    pub text_color: Color,
}

impl FallbackStyle {
    /// Create a fallback style.
    pub fn new(font: FontSpec, text_color: Color) -> Self {
        Self { font, text_color }
    }
}

impl Default for FallbackStyle {
    fn default() -> Self {
        Self {
            font: FontSpec::default(),
            text_color: Color::rgb(0x33, 0x33, 0x33),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_parse_forms() {
        assert_eq!("#ff0000".parse::<Color>().unwrap(), Color::rgb(0xff, 0, 0));
        assert_eq!(
            "#80102030".parse::<Color>().unwrap(),
            Color::rgba(0x10, 0x20, 0x30, 0x80)
        );
        assert_eq!(
            "rgba(1, 2, 3, 4)".parse::<Color>().unwrap(),
            Color::rgba(1, 2, 3, 4)
        );
        assert!("transparent".parse::<Color>().unwrap().is_transparent());
        assert!("".parse::<Color>().unwrap().is_transparent());
    }

    #[test]
    fn test_color_parse_rejects_garbage() {
        assert!(matches!(
            "#12345".parse::<Color>(),
            Err(DefinitionError::InvalidColor(_))
        ));
        assert!(matches!(
            "rgba(1,2,3)".parse::<Color>(),
            Err(DefinitionError::InvalidColor(_))
        ));
        assert!(matches!(
            "blue-ish".parse::<Color>(),
            Err(DefinitionError::InvalidColor(_))
        ));
    }

    #[test]
    fn test_color_display_is_argb_hex() {
        assert_eq!(Color::rgb(0x33, 0x33, 0x33).to_string(), "#ff333333");
    }
}
