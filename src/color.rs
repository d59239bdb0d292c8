use crate::util::{normalize_rgba_color, srgb_to_linear};

/// Represents a color in RGBA format.
///
/// Each channel is an 8-bit unsigned integer. Theme palettes, materials and particle tints
/// are all expressed with this type; the renderer normalizes them to `[f32; 4]` when
/// filling uniforms.
///
/// # Examples
///
/// ```
/// use foldcard::Color;
///
/// let gold = Color::from_hex(0xffd700);
/// assert_eq!(gold, Color::rgb(255, 215, 0));
///
/// let normalized = Color::rgb(255, 0, 0).normalize();
/// assert_eq!(normalized, [1.0, 0.0, 0.0, 1.0]);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Color(pub [u8; 4]);

impl Color {
    /// A transparent color.
    pub const TRANSPARENT: Self = Self([0, 0, 0, 0]);
    /// A black color.
    pub const BLACK: Self = Self([0, 0, 0, 255]);
    /// A white color.
    pub const WHITE: Self = Self([255, 255, 255, 255]);

    /// Creates a new color with the specified RGB values and full opacity.
    ///
    /// ```
    /// use foldcard::Color;
    ///
    /// let green = Color::rgb(0, 255, 0);
    /// assert_eq!(green, Color([0, 255, 0, 255]));
    /// ```
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self([r, g, b, 255])
    }

    /// Creates a new color with the specified RGBA values.
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self([r, g, b, a])
    }

    /// Creates an opaque color from a `0xRRGGBB` literal, the way palettes are written in
    /// design files.
    pub const fn from_hex(hex: u32) -> Self {
        Self([
            ((hex >> 16) & 0xff) as u8,
            ((hex >> 8) & 0xff) as u8,
            (hex & 0xff) as u8,
            255,
        ])
    }

    /// Normalizes the color values to the range [0.0, 1.0].
    pub fn normalize(&self) -> [f32; 4] {
        normalize_rgba_color(&self.0)
    }

    /// RGB decoded from sRGB to linear light, alpha unchanged. This is what shaders writing
    /// to an sRGB target expect.
    pub fn linear_rgba(&self) -> [f32; 4] {
        let [r, g, b, a] = self.normalize();
        [srgb_to_linear(r), srgb_to_linear(g), srgb_to_linear(b), a]
    }

    /// Returns the color as an array of 4 `u8` values.
    pub fn to_array(&self) -> [u8; 4] {
        self.0
    }

    /// Multiplies the RGB channels by `factor`, keeping alpha. The result saturates at 255.
    pub fn scaled(&self, factor: f32) -> Self {
        let [r, g, b, a] = self.0;
        let scale = |channel: u8| (channel as f32 * factor).round().clamp(0.0, 255.0) as u8;
        Self([scale(r), scale(g), scale(b), a])
    }

    /// Linear blend between `self` and `other` in sRGB byte space. `t` is clamped to [0, 1].
    pub fn mix(&self, other: Color, t: f32) -> Self {
        let t = t.clamp(0.0, 1.0);
        let mut out = [0u8; 4];
        for (channel, (a, b)) in out.iter_mut().zip(self.0.iter().zip(other.0.iter())) {
            *channel = (*a as f32 + (*b as f32 - *a as f32) * t).round() as u8;
        }
        Self(out)
    }

    /// Returns the same color with a different alpha channel.
    pub fn with_alpha(&self, alpha: u8) -> Self {
        let [r, g, b, _] = self.0;
        Self([r, g, b, alpha])
    }
}
