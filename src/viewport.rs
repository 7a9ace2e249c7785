//! Viewport size, pixel ratio, and input coordinate mapping.

use glam::{Vec2, Vec3};

/// Device pixel ratios above this are clamped.
pub const MAX_PIXEL_RATIO: f32 = 2.0;

/// Logical viewport dimensions and device pixel ratio.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// Width in logical pixels.
    pub width: f32,
    /// Height in logical pixels.
    pub height: f32,
    /// Device pixel ratio, already clamped to [`MAX_PIXEL_RATIO`].
    pub pixel_ratio: f32,
}

impl Viewport {
    /// Create a viewport, clamping the pixel ratio to `(0, MAX_PIXEL_RATIO]`.
    pub fn new(width: f32, height: f32, pixel_ratio: f32) -> Self {
        let pixel_ratio = if pixel_ratio.is_finite() && pixel_ratio > 0.0 {
            pixel_ratio.min(MAX_PIXEL_RATIO)
        } else {
            1.0
        };
        Self {
            width: width.max(1.0),
            height: height.max(1.0),
            pixel_ratio,
        }
    }

    /// Build from a physical window size and the window's scale factor.
    pub fn from_physical(width: u32, height: u32, scale_factor: f64) -> Self {
        let scale = scale_factor.max(f64::EPSILON);
        Self::new(
            (width as f64 / scale) as f32,
            (height as f64 / scale) as f32,
            scale as f32,
        )
    }

    /// Render resolution: `(width * pixel_ratio, height * pixel_ratio)`.
    ///
    /// Bursts bake this at construction; later resizes only affect bursts
    /// spawned afterwards.
    #[inline]
    pub fn resolution(&self) -> Vec2 {
        Vec2::new(self.width * self.pixel_ratio, self.height * self.pixel_ratio)
    }

    #[inline]
    pub fn aspect(&self) -> f32 {
        self.width / self.height
    }

    /// Map a logical pixel position to normalized device coordinates.
    ///
    /// `x` and `y` land in `[-1, 1]` with `y` pointing up; `z` is 0.
    pub fn to_ndc(&self, position: Vec2) -> Vec3 {
        Vec3::new(
            position.x / self.width * 2.0 - 1.0,
            -(position.y / self.height) * 2.0 + 1.0,
            0.0,
        )
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(1280.0, 720.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ndc_corners() {
        let vp = Viewport::new(800.0, 600.0, 1.0);
        assert_eq!(vp.to_ndc(Vec2::new(0.0, 0.0)), Vec3::new(-1.0, 1.0, 0.0));
        assert_eq!(vp.to_ndc(Vec2::new(800.0, 600.0)), Vec3::new(1.0, -1.0, 0.0));
        assert_eq!(vp.to_ndc(Vec2::new(400.0, 300.0)), Vec3::ZERO);
    }

    #[test]
    fn test_pixel_ratio_clamped() {
        let vp = Viewport::new(100.0, 50.0, 3.0);
        assert_eq!(vp.pixel_ratio, 2.0);
        assert_eq!(vp.resolution(), Vec2::new(200.0, 100.0));
    }

    #[test]
    fn test_invalid_pixel_ratio_falls_back() {
        assert_eq!(Viewport::new(10.0, 10.0, 0.0).pixel_ratio, 1.0);
        assert_eq!(Viewport::new(10.0, 10.0, f32::NAN).pixel_ratio, 1.0);
    }

    #[test]
    fn test_from_physical() {
        let vp = Viewport::from_physical(2560, 1440, 2.0);
        assert_eq!(vp.width, 1280.0);
        assert_eq!(vp.height, 720.0);
        assert_eq!(vp.resolution(), Vec2::new(2560.0, 1440.0));
    }

    #[test]
    fn test_zero_size_is_clamped() {
        let vp = Viewport::new(0.0, 0.0, 1.0);
        assert!(vp.aspect().is_finite());
    }
}
