use euclid::Angle;

pub type Vec3 = euclid::default::Vector3D<f32>;
pub type Point3 = euclid::default::Point3D<f32>;
pub type Mat4 = euclid::default::Transform3D<f32>;

/// Local transform of a scene node: translation, Euler rotation (radians, applied Z, then Y,
/// then X) and uniform scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Vec3,
    pub scale: f32,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Self = Self {
        position: Vec3::new(0.0, 0.0, 0.0),
        rotation: Vec3::new(0.0, 0.0, 0.0),
        scale: 1.0,
    };

    pub fn from_position(x: f32, y: f32, z: f32) -> Self {
        Self {
            position: Vec3::new(x, y, z),
            ..Self::IDENTITY
        }
    }

    pub fn with_rotation(mut self, x: f32, y: f32, z: f32) -> Self {
        self.rotation = Vec3::new(x, y, z);
        self
    }

    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = scale;
        self
    }

    /// Matrix mapping local coordinates into the parent's space.
    ///
    /// Matrices follow euclid's row-vector convention: `a.then(&b)` applies `a` first.
    pub fn to_matrix(&self) -> Mat4 {
        let scale = Mat4::scale(self.scale, self.scale, self.scale);
        let rot_x = Mat4::rotation(1.0, 0.0, 0.0, Angle::radians(self.rotation.x));
        let rot_y = Mat4::rotation(0.0, 1.0, 0.0, Angle::radians(self.rotation.y));
        let rot_z = Mat4::rotation(0.0, 0.0, 1.0, Angle::radians(self.rotation.z));
        let translation = Mat4::translation(self.position.x, self.position.y, self.position.z);

        scale
            .then(&rot_z)
            .then(&rot_y)
            .then(&rot_x)
            .then(&translation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    fn assert_point_eq(actual: Point3, expected: Point3) {
        assert!(
            (actual - expected).length() < 1e-5,
            "expected {expected:?}, got {actual:?}"
        );
    }

    #[test]
    fn identity_maps_points_to_themselves() {
        let point = Point3::new(1.0, 2.0, 3.0);
        let mapped = Transform::IDENTITY
            .to_matrix()
            .transform_point3d(point)
            .unwrap();
        assert_point_eq(mapped, point);
    }

    #[test]
    fn rotation_applies_before_translation() {
        let transform = Transform::from_position(1.0, 0.0, 0.0).with_rotation(0.0, FRAC_PI_2, 0.0);
        let mapped = transform
            .to_matrix()
            .transform_point3d(Point3::new(1.0, 0.0, 0.0))
            .unwrap();
        // +x rotated a quarter turn about +y points to -z.
        assert_point_eq(mapped, Point3::new(1.0, 0.0, -1.0));
    }

    #[test]
    fn scale_is_uniform() {
        let transform = Transform::IDENTITY.with_scale(2.0);
        let mapped = transform
            .to_matrix()
            .transform_point3d(Point3::new(1.0, -1.0, 0.5))
            .unwrap();
        assert_point_eq(mapped, Point3::new(2.0, -2.0, 1.0));
    }
}
