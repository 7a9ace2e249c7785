//! Orbit camera with damping.

use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

const MIN_DISTANCE: f32 = 0.5;
const MAX_DISTANCE: f32 = 50.0;
const PITCH_LIMIT: f32 = 1.55;

/// Projection and control settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Vertical field of view in degrees.
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
    /// Initial eye position. The camera orbits the origin.
    pub position: [f32; 3],
    /// Fraction of the pending motion applied per update, in `(0, 1]`.
    /// 1 disables damping.
    pub damping: f32,
    /// Radians per dragged pixel.
    pub rotate_speed: f32,
    /// Relative zoom per wheel line.
    pub zoom_speed: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_degrees: 25.0,
            near: 0.1,
            far: 100.0,
            position: [1.5, 0.0, 6.0],
            damping: 0.05,
            rotate_speed: 0.005,
            zoom_speed: 0.1,
        }
    }
}

/// Orbit camera around a target point.
///
/// Input accumulates into pending deltas; each [`update`](Self::update)
/// applies a `damping` fraction of them and keeps the rest, so motion eases
/// out after the mouse stops.
#[derive(Debug, Clone)]
pub struct OrbitCamera {
    /// Horizontal rotation angle in radians.
    pub yaw: f32,
    /// Vertical rotation angle in radians.
    pub pitch: f32,
    /// Distance from the target point.
    pub distance: f32,
    /// Point the camera orbits around.
    pub target: Vec3,
    config: CameraConfig,
    pending_yaw: f32,
    pending_pitch: f32,
    pending_zoom: f32,
}

impl OrbitCamera {
    pub fn new(config: CameraConfig) -> Self {
        let mut camera = Self::from_position(Vec3::from_array(config.position), Vec3::ZERO);
        camera.config = config;
        camera
    }

    /// Place the camera at `position`, looking at `target`.
    pub fn from_position(position: Vec3, target: Vec3) -> Self {
        let offset = position - target;
        let distance = offset.length().max(MIN_DISTANCE);
        Self {
            yaw: offset.x.atan2(offset.z),
            pitch: (offset.y / distance).clamp(-1.0, 1.0).asin(),
            distance,
            target,
            config: CameraConfig::default(),
            pending_yaw: 0.0,
            pending_pitch: 0.0,
            pending_zoom: 0.0,
        }
    }

    #[inline]
    pub fn config(&self) -> &CameraConfig {
        &self.config
    }

    /// World-space eye position.
    pub fn position(&self) -> Vec3 {
        let x = self.distance * self.pitch.cos() * self.yaw.sin();
        let y = self.distance * self.pitch.sin();
        let z = self.distance * self.pitch.cos() * self.yaw.cos();
        self.target + Vec3::new(x, y, z)
    }

    /// Queue a rotation from a mouse drag in pixels.
    pub fn rotate(&mut self, dx: f32, dy: f32) {
        self.pending_yaw -= dx * self.config.rotate_speed;
        self.pending_pitch += dy * self.config.rotate_speed;
    }

    /// Queue a zoom. Positive `lines` move closer.
    pub fn zoom(&mut self, lines: f32) {
        self.pending_zoom += lines * self.config.zoom_speed;
    }

    /// Apply part of the pending motion. Call once per frame.
    pub fn update(&mut self) {
        let k = self.config.damping.clamp(f32::EPSILON, 1.0);

        self.yaw += self.pending_yaw * k;
        self.pitch = (self.pitch + self.pending_pitch * k).clamp(-PITCH_LIMIT, PITCH_LIMIT);
        self.distance =
            (self.distance * (1.0 - self.pending_zoom * k)).clamp(MIN_DISTANCE, MAX_DISTANCE);

        self.pending_yaw *= 1.0 - k;
        self.pending_pitch *= 1.0 - k;
        self.pending_zoom *= 1.0 - k;
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position(), self.target, Vec3::Y)
    }

    pub fn projection_matrix(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(
            self.config.fov_degrees.to_radians(),
            aspect,
            self.config.near,
            self.config.far,
        )
    }
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self::new(CameraConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_position_round_trips() {
        let camera = OrbitCamera::default();
        let p = camera.position();
        assert!((p - Vec3::new(1.5, 0.0, 6.0)).length() < 1e-4, "{p:?}");
    }

    #[test]
    fn test_damped_rotation_eases_out() {
        let mut camera = OrbitCamera::default();
        let start = camera.yaw;
        camera.rotate(-100.0, 0.0);

        camera.update();
        let first = camera.yaw - start;
        camera.update();
        let second = camera.yaw - start - first;

        assert!(first > 0.0);
        assert!(second > 0.0 && second < first);
    }

    #[test]
    fn test_undamped_applies_immediately() {
        let mut camera = OrbitCamera::new(CameraConfig {
            damping: 1.0,
            ..CameraConfig::default()
        });
        let start = camera.yaw;
        camera.rotate(-100.0, 0.0);
        camera.update();
        assert!((camera.yaw - start - 0.5).abs() < 1e-5);
        camera.update();
        assert!((camera.yaw - start - 0.5).abs() < 1e-5);
    }

    #[test]
    fn test_pitch_and_distance_clamped() {
        let mut camera = OrbitCamera::new(CameraConfig {
            damping: 1.0,
            ..CameraConfig::default()
        });
        camera.rotate(0.0, 10_000.0);
        camera.zoom(100.0);
        camera.update();
        assert_eq!(camera.pitch, PITCH_LIMIT);
        assert_eq!(camera.distance, MIN_DISTANCE);
    }

    #[test]
    fn test_view_looks_at_target() {
        let camera = OrbitCamera::default();
        let target = camera.view_matrix().transform_point3(Vec3::ZERO);
        assert!(target.x.abs() < 1e-4 && target.y.abs() < 1e-4);
        assert!(target.z < 0.0);
    }
}
