//! Theme registry: each [`Theme`] resolves to a fixed palette and its greeting strings.

use crate::config::ConfigError;
use crate::Color;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Theme {
    #[default]
    NewYear,
    Lunar,
}

/// Decorative shape scattered over the inside-left page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Motif {
    Star,
    Lantern,
}

/// The resolved palette and text bundle for a theme.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThemeProfile {
    pub primary_color: Color,
    pub secondary_color: Color,
    pub background_color: Color,
    pub page_color: Color,
    pub greeting_title: &'static str,
    pub default_sub_message: &'static str,
    pub decorative_motif: Motif,
    pub display_name: &'static str,
    pub branding_caption: &'static str,
}

const BRANDING_CAPTION: &str = "Before Partners";

impl Theme {
    pub const ALL: [Theme; 2] = [Theme::NewYear, Theme::Lunar];

    /// Identifier used at the configuration boundary.
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::NewYear => "newYear",
            Theme::Lunar => "lunar",
        }
    }

    pub fn profile(&self) -> ThemeProfile {
        match self {
            Theme::NewYear => ThemeProfile {
                primary_color: Color::from_hex(0x1e3a8a),
                secondary_color: Color::from_hex(0xffd700),
                background_color: Color::from_hex(0x0a1628),
                page_color: Color::from_hex(0xfdf8ec),
                greeting_title: "Bonne Année 2026",
                default_sub_message: "Que cette nouvelle année vous apporte joie, succès et sérénité.",
                decorative_motif: Motif::Star,
                display_name: "New Year 2026",
                branding_caption: BRANDING_CAPTION,
            },
            Theme::Lunar => ThemeProfile {
                primary_color: Color::from_hex(0xb91c1c),
                secondary_color: Color::from_hex(0xffd700),
                background_color: Color::from_hex(0x1a0a0a),
                page_color: Color::from_hex(0xfff4e6),
                greeting_title: "Joyeux Nouvel An Lunaire",
                default_sub_message:
                    "Que l'année du Cheval vous apporte prospérité, santé et bonheur.",
                decorative_motif: Motif::Lantern,
                display_name: "Lunar New Year",
                branding_caption: BRANDING_CAPTION,
            },
        }
    }
}

/// Total lookup from a theme to its profile.
pub fn resolve(theme: Theme) -> ThemeProfile {
    theme.profile()
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Theme {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Theme::ALL
            .into_iter()
            .find(|theme| theme.as_str() == value)
            .ok_or_else(|| ConfigError::UnknownTheme(value.to_owned()))
    }
}
