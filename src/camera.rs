//! Perspective camera and orbit controls.

use crate::scene::{Mat4, Point3, Vec3};
use std::f32::consts::{PI, TAU};

pub const DEFAULT_FOV_DEGREES: f32 = 50.0;
pub const DEFAULT_DISTANCE: f32 = 4.0;

/// Keeps the camera off the poles, where the up vector degenerates.
const POLAR_EPSILON: f32 = 1e-3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub position: Point3,
    pub target: Point3,
    pub up: Vec3,
    /// Vertical field of view, radians.
    pub fov_y: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            position: Point3::new(0.0, 0.0, DEFAULT_DISTANCE),
            target: Point3::origin(),
            up: Vec3::new(0.0, 1.0, 0.0),
            fov_y: DEFAULT_FOV_DEGREES.to_radians(),
            near: 0.1,
            far: 100.0,
        }
    }
}

impl Camera {
    /// World to view space. Right-handed, looking down -Z.
    pub fn view(&self) -> Mat4 {
        let eye = self.position.to_vector();
        let forward = (self.target - self.position).normalize();
        let side = forward.cross(self.up).normalize();
        let up = side.cross(forward);

        Mat4::new(
            side.x, up.x, -forward.x, 0.0,
            side.y, up.y, -forward.y, 0.0,
            side.z, up.z, -forward.z, 0.0,
            -side.dot(eye), -up.dot(eye), forward.dot(eye), 1.0,
        )
    }

    /// View to clip space with a [0, 1] depth range.
    pub fn projection(&self, aspect: f32) -> Mat4 {
        let f = 1.0 / (self.fov_y * 0.5).tan();
        let aspect = if aspect > 0.0 { aspect } else { 1.0 };
        let (near, far) = (self.near, self.far);

        Mat4::new(
            f / aspect, 0.0, 0.0, 0.0,
            0.0, f, 0.0, 0.0,
            0.0, 0.0, far / (near - far), -1.0,
            0.0, 0.0, near * far / (near - far), 0.0,
        )
    }

    pub fn view_projection(&self, aspect: f32) -> Mat4 {
        self.view().then(&self.projection(aspect))
    }

    pub fn distance(&self) -> f32 {
        (self.position - self.target).length()
    }
}

/// Orbit around a target: drag rotates, scroll zooms, no panning.
///
/// Rotation input accumulates into a pending delta that is released over several frames
/// (damping). Auto-rotation adds a constant azimuth drift when allowed.
#[derive(Debug, Clone, PartialEq)]
pub struct OrbitControls {
    pub target: Point3,
    pub min_distance: f32,
    pub max_distance: f32,
    /// Fraction of the pending rotation applied per frame.
    pub damping: f32,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub auto_rotate: bool,
    /// 1.0 is one full turn per minute.
    pub auto_rotate_speed: f32,
    radius: f32,
    /// Azimuth about +Y, zero on +Z.
    theta: f32,
    /// Polar angle from +Y.
    phi: f32,
    pending_theta: f32,
    pending_phi: f32,
    pending_scale: f32,
    viewport_height: f32,
}

impl Default for OrbitControls {
    fn default() -> Self {
        Self {
            target: Point3::origin(),
            min_distance: 2.0,
            max_distance: 8.0,
            damping: 0.05,
            rotate_speed: 1.0,
            zoom_speed: 1.0,
            auto_rotate: true,
            auto_rotate_speed: 0.5,
            radius: DEFAULT_DISTANCE,
            theta: 0.0,
            phi: PI * 0.5,
            pending_theta: 0.0,
            pending_phi: 0.0,
            pending_scale: 1.0,
            viewport_height: 600.0,
        }
    }
}

impl OrbitControls {
    pub fn with_distance_limits(mut self, min_distance: f32, max_distance: f32) -> Self {
        self.min_distance = min_distance;
        self.max_distance = max_distance.max(min_distance);
        self.radius = self.radius.clamp(self.min_distance, self.max_distance);
        self
    }

    pub fn with_auto_rotate(mut self, auto_rotate: bool, speed: f32) -> Self {
        self.auto_rotate = auto_rotate;
        self.auto_rotate_speed = speed;
        self
    }

    pub fn with_damping(mut self, damping: f32) -> Self {
        self.damping = damping.clamp(0.0, 1.0);
        self
    }

    /// Drag deltas are normalized by the viewport height.
    pub fn set_viewport_height(&mut self, height: f32) {
        if height > 0.0 {
            self.viewport_height = height;
        }
    }

    /// Pointer drag in pixels.
    pub fn drag(&mut self, dx: f32, dy: f32) {
        self.pending_theta -= TAU * dx / self.viewport_height * self.rotate_speed;
        self.pending_phi -= TAU * dy / self.viewport_height * self.rotate_speed;
    }

    /// Wheel notches; positive zooms out.
    pub fn scroll(&mut self, delta: f32) {
        self.pending_scale *= 0.95f32.powf(-delta * self.zoom_speed);
    }

    pub fn distance(&self) -> f32 {
        self.radius
    }

    pub fn azimuth(&self) -> f32 {
        self.theta
    }

    pub fn polar(&self) -> f32 {
        self.phi
    }

    /// Advances by `dt` seconds and returns the new eye position. Auto-rotation only runs
    /// while `allow_auto_rotate` is set.
    pub fn update(&mut self, dt: f32, allow_auto_rotate: bool) -> Point3 {
        if self.auto_rotate && allow_auto_rotate {
            self.pending_theta -= TAU / 60.0 * self.auto_rotate_speed * dt;
        }

        if self.damping > 0.0 {
            self.theta += self.pending_theta * self.damping;
            self.phi += self.pending_phi * self.damping;
            self.pending_theta *= 1.0 - self.damping;
            self.pending_phi *= 1.0 - self.damping;
        } else {
            self.theta += self.pending_theta;
            self.phi += self.pending_phi;
            self.pending_theta = 0.0;
            self.pending_phi = 0.0;
        }

        self.theta %= TAU;
        self.phi = self.phi.clamp(POLAR_EPSILON, PI - POLAR_EPSILON);
        self.radius = (self.radius * self.pending_scale).clamp(self.min_distance, self.max_distance);
        self.pending_scale = 1.0;

        self.eye()
    }

    pub fn eye(&self) -> Point3 {
        let sin_phi = self.phi.sin();
        self.target
            + Vec3::new(
                self.radius * sin_phi * self.theta.sin(),
                self.radius * self.phi.cos(),
                self.radius * sin_phi * self.theta.cos(),
            )
    }

    /// Writes the orbit position into `camera`.
    pub fn apply(&self, camera: &mut Camera) {
        camera.position = self.eye();
        camera.target = self.target;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f32, expected: f32) {
        assert!((actual - expected).abs() < 1e-4, "expected {expected}, got {actual}");
    }

    #[test]
    fn default_camera_looks_at_origin_from_z() {
        let camera = Camera::default();
        assert_eq!(camera.position, Point3::new(0.0, 0.0, 4.0));
        assert_close(camera.fov_y, 50f32.to_radians());
        let in_view = camera.view().transform_point3d(Point3::origin()).unwrap();
        assert_close(in_view.z, -4.0);
    }

    #[test]
    fn projection_maps_near_and_far_to_unit_depth() {
        let camera = Camera::default();
        let projection = camera.projection(1.0);
        let near = projection
            .transform_point3d(Point3::new(0.0, 0.0, -camera.near))
            .unwrap();
        let far = projection
            .transform_point3d(Point3::new(0.0, 0.0, -camera.far))
            .unwrap();
        assert_close(near.z, 0.0);
        assert_close(far.z, 1.0);
    }

    #[test]
    fn target_projects_to_screen_center() {
        let camera = Camera::default();
        let clip = camera
            .view_projection(16.0 / 9.0)
            .transform_point3d(Point3::origin())
            .unwrap();
        assert_close(clip.x, 0.0);
        assert_close(clip.y, 0.0);
    }

    #[test]
    fn default_orbit_matches_default_camera() {
        let controls = OrbitControls::default();
        let eye = controls.eye();
        assert_close(eye.x, 0.0);
        assert_close(eye.y, 0.0);
        assert_close(eye.z, 4.0);
    }

    #[test]
    fn zoom_is_clamped() {
        let mut controls = OrbitControls::default();
        controls.scroll(-100.0);
        controls.update(0.0, false);
        assert_close(controls.distance(), 2.0);

        controls.scroll(100.0);
        controls.update(0.0, false);
        assert_close(controls.distance(), 8.0);
    }

    #[test]
    fn drag_is_damped_over_frames() {
        let mut controls = OrbitControls::default();
        controls.drag(-300.0, 0.0);
        controls.update(0.0, false);
        let first = controls.azimuth();
        // 2π * 300 / 600 = π total, 5% released on the first frame.
        assert_close(first, PI * 0.05);
        controls.update(0.0, false);
        assert!(controls.azimuth() > first);
    }

    #[test]
    fn polar_angle_stays_off_the_poles() {
        let mut controls = OrbitControls::default().with_damping(0.0);
        controls.drag(0.0, 10_000.0);
        controls.update(0.0, false);
        assert!(controls.polar() >= POLAR_EPSILON);
        assert!(controls.polar() < PI);
    }

    #[test]
    fn auto_rotate_only_when_allowed() {
        let mut controls = OrbitControls::default().with_damping(0.0);
        controls.update(1.0, false);
        assert_eq!(controls.azimuth(), 0.0);

        controls.update(1.0, true);
        assert_close(controls.azimuth(), -TAU / 60.0 * 0.5);
    }
}
