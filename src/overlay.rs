//! Theme-conditioned decoration: motif outlines, the greeting ring, shimmer and the text
//! layout of the greeting and branding panels.
//!
//! Outlines are tessellated at unit scale and cached by shape, so rebuilding the card after a
//! format change reuses them.

use crate::cache::{Cache, ShapeKey};
use crate::geometry::BuildError;
use crate::scene::{Material, Mesh};
use crate::text::{TextAlignment, TextBlock, TextLayout};
use crate::theme::{Motif, ThemeProfile};
use crate::Color;
use lyon::math::{point, vector, Angle, Box2D};
use lyon::path::{Path, Winding};
use lyon::tessellation::{
    BuffersBuilder, FillOptions, FillTessellator, FillVertex, VertexBuffers,
};
use smallvec::SmallVec;
use std::f32::consts::{FRAC_PI_2, PI};

/// Lift above the page surface so decorations do not z-fight with it.
pub const DECORATION_LIFT: f32 = 0.002;

const TESSELLATION_TOLERANCE: f32 = 0.005;

/// Where a motif sits on the inside-left page, in panel-local units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotifSlot {
    pub x: f32,
    pub y: f32,
    pub scale: f32,
}

pub const MOTIF_SLOTS: [MotifSlot; 5] = [
    MotifSlot { x: -0.55, y: 0.85, scale: 0.45 },
    MotifSlot { x: 0.6, y: 0.95, scale: 0.35 },
    MotifSlot { x: 0.0, y: 0.1, scale: 0.7 },
    MotifSlot { x: -0.6, y: -0.8, scale: 0.35 },
    MotifSlot { x: 0.55, y: -0.9, scale: 0.45 },
];

/// Shared sinusoidal modulation of emissive intensity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Shimmer {
    pub base: f32,
    pub amplitude: f32,
    /// Angular speed in radians per second.
    pub speed: f32,
}

impl Default for Shimmer {
    fn default() -> Self {
        Self {
            base: 1.0,
            amplitude: 0.3,
            speed: 2.0,
        }
    }
}

impl Shimmer {
    pub fn factor(&self, elapsed: f32) -> f32 {
        self.base + self.amplitude * (elapsed * self.speed).sin()
    }
}

/// One tessellated piece of a motif with its surface.
#[derive(Debug, Clone)]
pub(crate) struct MotifPart {
    pub(crate) mesh: Mesh,
    pub(crate) material: Material,
}

/// Vertices of a five-point star at unit scale, starting at the top point and going
/// counter-clockwise.
pub fn star_outline(outer_radius: f32, inner_radius: f32) -> [[f32; 2]; 10] {
    let mut outline = [[0.0; 2]; 10];
    for (index, vertex) in outline.iter_mut().enumerate() {
        let radius = if index % 2 == 0 { outer_radius } else { inner_radius };
        let angle = FRAC_PI_2 + index as f32 * PI / 5.0;
        *vertex = [radius * angle.cos(), radius * angle.sin()];
    }
    outline
}

fn shape_path(key: ShapeKey) -> Path {
    let mut builder = Path::builder();
    match key {
        ShapeKey::Star => {
            let outline = star_outline(0.5, 0.2);
            builder.begin(point(outline[0][0], outline[0][1]));
            for [x, y] in &outline[1..] {
                builder.line_to(point(*x, *y));
            }
            builder.end(true);
        }
        ShapeKey::LanternBody => {
            builder.add_ellipse(
                point(0.0, 0.0),
                vector(0.35, 0.42),
                Angle::radians(0.0),
                Winding::Positive,
            );
        }
        ShapeKey::LanternCap => {
            builder.add_rectangle(
                &Box2D::new(point(-0.2, 0.38), point(0.2, 0.52)),
                Winding::Positive,
            );
        }
        ShapeKey::LanternTassel => {
            builder.add_rectangle(
                &Box2D::new(point(-0.03, -0.75), point(0.03, -0.38)),
                Winding::Positive,
            );
        }
        ShapeKey::Ring => {
            builder.add_circle(point(0.0, 0.0), 1.0, Winding::Positive);
            builder.add_circle(point(0.0, 0.0), 0.82, Winding::Positive);
        }
    }
    builder.build()
}

fn fill_options(key: ShapeKey) -> FillOptions {
    let options = FillOptions::tolerance(TESSELLATION_TOLERANCE);
    match key {
        // The inner circle punches the hole.
        ShapeKey::Ring => options.with_fill_rule(lyon::tessellation::FillRule::EvenOdd),
        _ => options,
    }
}

/// Tessellates a decorative outline, going through the cache first.
pub(crate) fn tessellate_shape(
    key: ShapeKey,
    tessellator: &mut FillTessellator,
    cache: &mut Cache,
) -> Result<VertexBuffers<[f32; 2], u16>, BuildError> {
    if let Some(buffers) = cache.get_vertex_buffers(&key) {
        return Ok(buffers);
    }

    let path = shape_path(key);
    let mut buffers: VertexBuffers<[f32; 2], u16> = VertexBuffers::new();
    tessellator
        .tessellate_path(
            &path,
            &fill_options(key),
            &mut BuffersBuilder::new(&mut buffers, |vertex: FillVertex| {
                vertex.position().to_array()
            }),
        )
        .map_err(|err| BuildError::Tessellation {
            shape: key.name(),
            message: format!("{err:?}"),
        })?;

    if buffers.indices.is_empty() {
        return Err(BuildError::Tessellation {
            shape: key.name(),
            message: "outline produced no triangles".to_owned(),
        });
    }

    cache.insert_vertex_buffers(key, buffers.clone());
    Ok(buffers)
}

/// Meshes and materials making up one motif, at unit scale.
pub(crate) fn motif_parts(
    motif: Motif,
    profile: &ThemeProfile,
    tessellator: &mut FillTessellator,
    cache: &mut Cache,
) -> Result<SmallVec<[MotifPart; 3]>, BuildError> {
    let gold = profile.secondary_color;
    let glow = Material::metallic(gold).with_emissive(gold, 0.6).with_shimmer();

    let pieces: SmallVec<[(ShapeKey, Material); 3]> = match motif {
        Motif::Star => smallvec::smallvec![(ShapeKey::Star, glow)],
        Motif::Lantern => {
            let body = Material::color(profile.primary_color)
                .with_emissive(Color::from_hex(0xff8c00), 0.5)
                .with_shimmer();
            smallvec::smallvec![
                (ShapeKey::LanternBody, body),
                (ShapeKey::LanternCap, glow),
                (ShapeKey::LanternTassel, glow),
            ]
        }
    };

    let mut parts = SmallVec::new();
    for (key, material) in pieces {
        let buffers = tessellate_shape(key, tessellator, cache)?;
        parts.push(MotifPart {
            mesh: Mesh::from_tessellation(&buffers, 0.0),
            material,
        });
    }
    Ok(parts)
}

/// Ring placed between the greeting title and body, at unit radius.
pub(crate) fn ring_part(
    profile: &ThemeProfile,
    tessellator: &mut FillTessellator,
    cache: &mut Cache,
) -> Result<MotifPart, BuildError> {
    let buffers = tessellate_shape(ShapeKey::Ring, tessellator, cache)?;
    let gold = profile.secondary_color;
    Ok(MotifPart {
        mesh: Mesh::from_tessellation(&buffers, 0.0),
        material: Material::metallic(gold).with_emissive(gold, 0.4).with_shimmer(),
    })
}

/// Text and ornament placement on the greeting (inside-right) page, in panel-local units.
#[derive(Debug, Clone, PartialEq)]
pub struct GreetingLayout {
    pub title: TextBlock,
    pub title_origin: [f32; 2],
    pub ring_center: [f32; 2],
    pub ring_radius: f32,
    pub body: TextBlock,
    pub body_origin: [f32; 2],
}

pub const TITLE_LAYOUT: TextLayout = TextLayout {
    font_size: 0.16,
    line_height: 0.2,
    max_width: 1.7,
    max_lines: 2,
    alignment: TextAlignment::Center,
};

pub const BODY_LAYOUT: TextLayout = TextLayout {
    font_size: 0.09,
    line_height: 0.13,
    max_width: 1.6,
    max_lines: 8,
    alignment: TextAlignment::Center,
};

pub const BRANDING_LAYOUT: TextLayout = TextLayout {
    font_size: 0.07,
    line_height: 0.1,
    max_width: 1.6,
    max_lines: 2,
    alignment: TextAlignment::Center,
};

/// Lays out the greeting page. A non-blank custom message replaces the theme's default.
pub fn greeting_layout(profile: &ThemeProfile, custom_message: Option<&str>) -> GreetingLayout {
    let body_text = custom_message
        .filter(|message| !message.trim().is_empty())
        .unwrap_or(profile.default_sub_message);
    let ink = profile.primary_color.mix(Color::BLACK, 0.35);

    GreetingLayout {
        title: TITLE_LAYOUT.layout(profile.greeting_title, profile.primary_color),
        title_origin: [0.0, 0.75],
        ring_center: [0.0, 0.38],
        ring_radius: 0.12,
        body: BODY_LAYOUT.layout(body_text, ink),
        body_origin: [0.0, 0.1],
    }
}

/// Back-cover block: theme display name above the branding caption.
pub fn branding_layout(profile: &ThemeProfile) -> (TextBlock, [f32; 2]) {
    let text = format!("{}\n{}", profile.display_name, profile.branding_caption);
    (
        BRANDING_LAYOUT.layout(&text, profile.secondary_color),
        [0.0, -0.95],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theme::Theme;

    #[test]
    fn star_outline_alternates_radii() {
        let outline = star_outline(0.5, 0.2);
        assert!((outline[0][0]).abs() < 1e-6);
        assert!((outline[0][1] - 0.5).abs() < 1e-6);
        for (index, [x, y]) in outline.iter().enumerate() {
            let radius = (x * x + y * y).sqrt();
            let expected = if index % 2 == 0 { 0.5 } else { 0.2 };
            assert!((radius - expected).abs() < 1e-5);
        }
    }

    #[test]
    fn shimmer_oscillates_around_base() {
        let shimmer = Shimmer::default();
        assert_eq!(shimmer.factor(0.0), 1.0);
        let peak = shimmer.factor(FRAC_PI_2 / shimmer.speed);
        assert!((peak - 1.3).abs() < 1e-5);
    }

    #[test]
    fn tessellations_are_cached_by_shape() {
        let mut tessellator = FillTessellator::new();
        let mut cache = Cache::default();

        let first = tessellate_shape(ShapeKey::Star, &mut tessellator, &mut cache).unwrap();
        assert_eq!(cache.len(), 1);
        let second = tessellate_shape(ShapeKey::Star, &mut tessellator, &mut cache).unwrap();
        assert_eq!(cache.len(), 1);
        assert_eq!(first.indices, second.indices);
    }

    #[test]
    fn ring_has_a_hole() {
        let mut tessellator = FillTessellator::new();
        let mut cache = Cache::default();
        let ring = tessellate_shape(ShapeKey::Ring, &mut tessellator, &mut cache).unwrap();
        // No vertex lies strictly inside the inner circle.
        assert!(ring
            .vertices
            .iter()
            .all(|[x, y]| (x * x + y * y).sqrt() > 0.8));
    }

    #[test]
    fn lantern_has_three_parts() {
        let mut tessellator = FillTessellator::new();
        let mut cache = Cache::default();
        let profile = Theme::Lunar.profile();
        let parts = motif_parts(Motif::Lantern, &profile, &mut tessellator, &mut cache).unwrap();
        assert_eq!(parts.len(), 3);
        assert!(parts.iter().all(|part| part.material.shimmer));
    }

    #[test]
    fn custom_message_takes_precedence() {
        let profile = Theme::NewYear.profile();
        let layout = greeting_layout(&profile, Some("Merci"));
        assert_eq!(layout.body.text(), "Merci");
        assert_eq!(layout.title.text(), profile.greeting_title);
    }

    #[test]
    fn blank_or_absent_message_uses_default() {
        let profile = Theme::Lunar.profile();
        let expected = BODY_LAYOUT.layout(profile.default_sub_message, Color::BLACK).text();
        assert_eq!(greeting_layout(&profile, None).body.text(), expected);
        assert_eq!(greeting_layout(&profile, Some("")).body.text(), expected);
    }

    #[test]
    fn branding_lists_name_then_caption() {
        let profile = Theme::NewYear.profile();
        let (block, _) = branding_layout(&profile);
        assert_eq!(block.lines.as_slice(), ["New Year 2026", "Before Partners"]);
    }
}
