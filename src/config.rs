//! The configuration handed to a preview session at mount time.

use crate::theme::Theme;
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("unknown theme identifier: {0:?}")]
    UnknownTheme(String),
    #[error("unknown card format identifier: {0:?}")]
    UnknownFormat(String),
    #[error("unknown card style identifier: {0:?}")]
    UnknownStyle(String),
    #[error("card configuration has an empty image reference")]
    MissingImage,
    #[error("malformed card configuration: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CardFormat {
    #[default]
    Single,
    Bifold,
    Quadfold,
}

impl CardFormat {
    pub const ALL: [CardFormat; 3] = [CardFormat::Single, CardFormat::Bifold, CardFormat::Quadfold];

    pub fn as_str(&self) -> &'static str {
        match self {
            CardFormat::Single => "single",
            CardFormat::Bifold => "bifold",
            CardFormat::Quadfold => "quadfold",
        }
    }

    /// Panel count advertised for the format in the picker.
    pub fn panel_count(&self) -> usize {
        match self {
            CardFormat::Single => 1,
            CardFormat::Bifold => 2,
            CardFormat::Quadfold => 4,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            CardFormat::Single => "1 Panneau",
            CardFormat::Bifold => "2 Panneaux",
            CardFormat::Quadfold => "4 Panneaux",
        }
    }

    pub fn is_foldable(&self) -> bool {
        !matches!(self, CardFormat::Single)
    }
}

impl fmt::Display for CardFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CardFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        CardFormat::ALL
            .into_iter()
            .find(|format| format.as_str() == value)
            .ok_or_else(|| ConfigError::UnknownFormat(value.to_owned()))
    }
}

/// How the enclosing UI presents the card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CardStyle {
    #[default]
    Flat,
    Foldable,
}

impl FromStr for CardStyle {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "flat" => Ok(CardStyle::Flat),
            "foldable" => Ok(CardStyle::Foldable),
            other => Err(ConfigError::UnknownStyle(other.to_owned())),
        }
    }
}

/// The interactive fold preview is only offered for foldable multi-panel cards.
pub fn offers_fold_preview(format: CardFormat, style: CardStyle) -> bool {
    format.is_foldable() && style == CardStyle::Foldable
}

/// Opaque reference to the already-produced card image.
#[derive(Clone, PartialEq)]
pub enum ImageSource {
    /// `data:image/<subtype>;base64,<payload>`
    DataUri(Arc<str>),
    /// Encoded bytes in any format the `image` crate can sniff.
    Encoded(Arc<[u8]>),
    /// Tightly packed RGBA8 pixels.
    Rgba {
        width: u32,
        height: u32,
        pixels: Arc<[u8]>,
    },
}

impl ImageSource {
    pub fn data_uri(uri: impl Into<Arc<str>>) -> Self {
        ImageSource::DataUri(uri.into())
    }
}

impl fmt::Debug for ImageSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Payloads are large; only their size is interesting.
        match self {
            ImageSource::DataUri(uri) => write!(f, "DataUri({} bytes)", uri.len()),
            ImageSource::Encoded(bytes) => write!(f, "Encoded({} bytes)", bytes.len()),
            ImageSource::Rgba { width, height, .. } => write!(f, "Rgba({width}x{height})"),
        }
    }
}

/// Everything a preview session needs. Immutable for the lifetime of the session.
#[derive(Debug, Clone, PartialEq)]
pub struct CardConfiguration {
    pub image: ImageSource,
    pub theme: Theme,
    pub format: CardFormat,
    pub custom_message: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawConfiguration {
    image: String,
    theme: String,
    format: String,
    #[serde(default)]
    custom_message: Option<String>,
}

impl CardConfiguration {
    pub fn new(image: ImageSource, theme: Theme, format: CardFormat) -> Self {
        Self {
            image,
            theme,
            format,
            custom_message: None,
        }
    }

    pub fn with_custom_message(mut self, message: impl Into<String>) -> Self {
        self.custom_message = Some(message.into());
        self
    }

    /// Parses the boundary object produced by the form UI:
    /// `{"image": "data:...", "theme": "newYear", "format": "bifold", "customMessage": "..."}`.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let raw: RawConfiguration = serde_json::from_str(json)?;
        Self::try_from(raw)
    }

    /// The custom message if it has visible content.
    pub fn effective_custom_message(&self) -> Option<&str> {
        self.custom_message
            .as_deref()
            .filter(|message| !message.trim().is_empty())
    }
}

impl TryFrom<RawConfiguration> for CardConfiguration {
    type Error = ConfigError;

    fn try_from(raw: RawConfiguration) -> Result<Self, Self::Error> {
        if raw.image.trim().is_empty() {
            return Err(ConfigError::MissingImage);
        }
        Ok(Self {
            image: ImageSource::data_uri(raw.image),
            theme: raw.theme.parse()?,
            format: raw.format.parse()?,
            custom_message: raw.custom_message,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PIXEL: &str = "data:image/png;base64,AAAA";

    #[test]
    fn parses_boundary_object() {
        let json = format!(
            r#"{{"image": "{PIXEL}", "theme": "lunar", "format": "quadfold", "customMessage": "Salut"}}"#
        );
        let config = CardConfiguration::from_json(&json).unwrap();
        assert_eq!(config.theme, Theme::Lunar);
        assert_eq!(config.format, CardFormat::Quadfold);
        assert_eq!(config.custom_message.as_deref(), Some("Salut"));
        assert_eq!(config.image, ImageSource::data_uri(PIXEL));
    }

    #[test]
    fn custom_message_is_optional() {
        let json = format!(r#"{{"image": "{PIXEL}", "theme": "newYear", "format": "bifold"}}"#);
        let config = CardConfiguration::from_json(&json).unwrap();
        assert_eq!(config.custom_message, None);
        assert_eq!(config.effective_custom_message(), None);
    }

    #[test]
    fn unknown_identifiers_fail_at_the_boundary() {
        let json = format!(r#"{{"image": "{PIXEL}", "theme": "halloween", "format": "bifold"}}"#);
        assert!(matches!(
            CardConfiguration::from_json(&json),
            Err(ConfigError::UnknownTheme(_))
        ));

        let json = format!(r#"{{"image": "{PIXEL}", "theme": "lunar", "format": "trifold"}}"#);
        assert!(matches!(
            CardConfiguration::from_json(&json),
            Err(ConfigError::UnknownFormat(_))
        ));
    }

    #[test]
    fn malformed_json_and_missing_image_are_errors() {
        assert!(matches!(
            CardConfiguration::from_json("{"),
            Err(ConfigError::Json(_))
        ));
        assert!(matches!(
            CardConfiguration::from_json(r#"{"image": " ", "theme": "lunar", "format": "single"}"#),
            Err(ConfigError::MissingImage)
        ));
    }

    #[test]
    fn blank_custom_message_is_ignored() {
        let config = CardConfiguration::new(
            ImageSource::data_uri(PIXEL),
            Theme::NewYear,
            CardFormat::Bifold,
        )
        .with_custom_message("   ");
        assert_eq!(config.effective_custom_message(), None);
    }

    #[test]
    fn fold_preview_requires_foldable_multi_panel_card() {
        assert!(!offers_fold_preview(CardFormat::Single, CardStyle::Foldable));
        assert!(!offers_fold_preview(CardFormat::Bifold, CardStyle::Flat));
        assert!(offers_fold_preview(CardFormat::Bifold, CardStyle::Foldable));
        assert!(offers_fold_preview(CardFormat::Quadfold, CardStyle::Foldable));
        assert_eq!("foldable".parse::<CardStyle>().unwrap(), CardStyle::Foldable);
    }

    #[test]
    fn panel_counts() {
        let counts: Vec<usize> = CardFormat::ALL.iter().map(CardFormat::panel_count).collect();
        assert_eq!(counts, vec![1, 2, 4]);
    }
}
