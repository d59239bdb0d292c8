//! The fixed four-light rig: ambient, directional, warm point and spot.

use crate::scene::{Point3, Vec3};
use crate::Color;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AmbientLight {
    pub color: Color,
    pub intensity: f32,
}

/// Parallel light arriving from `direction` toward the origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectionalLight {
    pub color: Color,
    pub intensity: f32,
    /// Points from the scene toward the light.
    pub direction: Vec3,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointLight {
    pub color: Color,
    pub intensity: f32,
    pub position: Point3,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpotLight {
    pub color: Color,
    pub intensity: f32,
    pub position: Point3,
    pub target: Point3,
    /// Half-angle of the cone, radians.
    pub angle: f32,
    /// Fraction of the cone that fades out at the rim.
    pub penumbra: f32,
}

/// The fixed four-light rig. Intensities do not depend on the theme.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightingRig {
    pub ambient: AmbientLight,
    pub directional: DirectionalLight,
    pub point: PointLight,
    pub spot: SpotLight,
}

impl Default for LightingRig {
    fn default() -> Self {
        Self {
            ambient: AmbientLight {
                color: Color::WHITE,
                intensity: 0.5,
            },
            directional: DirectionalLight {
                color: Color::WHITE,
                intensity: 1.0,
                direction: Vec3::new(5.0, 5.0, 5.0).normalize(),
            },
            point: PointLight {
                color: Color::from_hex(0xffd700),
                intensity: 0.5,
                position: Point3::new(-10.0, -10.0, -10.0),
            },
            spot: SpotLight {
                color: Color::WHITE,
                intensity: 0.6,
                position: Point3::new(0.0, 5.0, 5.0),
                target: Point3::origin(),
                angle: 0.3,
                penumbra: 1.0,
            },
        }
    }
}

impl LightingRig {
    pub fn with_ambient_intensity(mut self, intensity: f32) -> Self {
        self.ambient.intensity = intensity;
        self
    }

    /// Number of light sources, ambient included.
    pub const fn light_count(&self) -> usize {
        4
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_rig() {
        let rig = LightingRig::default();
        assert_eq!(rig.ambient.intensity, 0.5);
        assert_eq!(rig.point.color, Color::from_hex(0xffd700));
        assert!((rig.directional.direction.length() - 1.0).abs() < 1e-6);
        assert_eq!(rig.light_count(), 4);
    }
}
