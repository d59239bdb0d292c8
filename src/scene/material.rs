use crate::Color;

/// Textures a material can reference. Only the supplied card image exists today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureSlot {
    CardImage,
}

/// Surface description of a mesh node. Fixed once the builder creates it; time-varying
/// effects such as shimmer are applied when the frame snapshot is extracted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    pub base_color: Color,
    pub texture: Option<TextureSlot>,
    pub emissive: Color,
    pub emissive_intensity: f32,
    pub metalness: f32,
    pub roughness: f32,
    pub opacity: f32,
    /// Whether the emissive intensity follows the shared shimmer factor.
    pub shimmer: bool,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            base_color: Color::WHITE,
            texture: None,
            emissive: Color::BLACK,
            emissive_intensity: 0.0,
            metalness: 0.0,
            roughness: 0.8,
            opacity: 1.0,
            shimmer: false,
        }
    }
}

impl Material {
    pub fn color(base_color: Color) -> Self {
        Self {
            base_color,
            ..Default::default()
        }
    }

    pub fn textured(slot: TextureSlot) -> Self {
        Self {
            texture: Some(slot),
            roughness: 0.5,
            ..Default::default()
        }
    }

    pub fn metallic(base_color: Color) -> Self {
        Self {
            base_color,
            metalness: 0.8,
            roughness: 0.2,
            ..Default::default()
        }
    }

    pub fn with_emissive(mut self, emissive: Color, intensity: f32) -> Self {
        self.emissive = emissive;
        self.emissive_intensity = intensity;
        self
    }

    pub fn with_shimmer(mut self) -> Self {
        self.shimmer = true;
        self
    }

    pub fn requires_card_image(&self) -> bool {
        self.texture == Some(TextureSlot::CardImage)
    }

    /// Emissive intensity for a frame with the given shimmer factor.
    pub fn effective_emissive_intensity(&self, shimmer_factor: f32) -> f32 {
        if self.shimmer {
            self.emissive_intensity * shimmer_factor
        } else {
            self.emissive_intensity
        }
    }
}
