//! Preetham sky parameters.
//!
//! The sky is a fullscreen pass drawn behind the bursts. Everything here is
//! CPU side: the tweakable parameters, the sun direction they imply, and the
//! uniform block consumed by `sky.wgsl`.

use std::ops::RangeInclusive;

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

/// Atmospheric scattering parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SkyParameters {
    pub turbidity: f32,
    pub rayleigh: f32,
    pub mie_coefficient: f32,
    pub mie_directional_g: f32,
    /// Sun elevation above the horizon in degrees.
    pub elevation: f32,
    /// Sun azimuth in degrees.
    pub azimuth: f32,
    /// Output multiplier.
    pub exposure: f32,
}

impl SkyParameters {
    pub const TURBIDITY_RANGE: RangeInclusive<f32> = 0.0..=20.0;
    pub const RAYLEIGH_RANGE: RangeInclusive<f32> = 0.0..=4.0;
    pub const MIE_COEFFICIENT_RANGE: RangeInclusive<f32> = 0.0..=0.1;
    pub const MIE_DIRECTIONAL_G_RANGE: RangeInclusive<f32> = 0.0..=1.0;
    pub const ELEVATION_RANGE: RangeInclusive<f32> = -3.0..=10.0;
    pub const AZIMUTH_RANGE: RangeInclusive<f32> = -180.0..=180.0;
    pub const EXPOSURE_RANGE: RangeInclusive<f32> = 0.0..=1.0;

    /// Unit vector towards the sun.
    ///
    /// Polar angle is `90 - elevation`, azimuth is measured around +Y from +Z.
    pub fn sun_position(&self) -> Vec3 {
        let phi = (90.0 - self.elevation).to_radians();
        let theta = self.azimuth.to_radians();
        Vec3::new(phi.sin() * theta.sin(), phi.cos(), phi.sin() * theta.cos())
    }

    /// Copy with every field clamped to its slider range.
    pub fn clamped(&self) -> Self {
        let clamp = |v: f32, r: &RangeInclusive<f32>| v.clamp(*r.start(), *r.end());
        Self {
            turbidity: clamp(self.turbidity, &Self::TURBIDITY_RANGE),
            rayleigh: clamp(self.rayleigh, &Self::RAYLEIGH_RANGE),
            mie_coefficient: clamp(self.mie_coefficient, &Self::MIE_COEFFICIENT_RANGE),
            mie_directional_g: clamp(self.mie_directional_g, &Self::MIE_DIRECTIONAL_G_RANGE),
            elevation: clamp(self.elevation, &Self::ELEVATION_RANGE),
            azimuth: clamp(self.azimuth, &Self::AZIMUTH_RANGE),
            exposure: clamp(self.exposure, &Self::EXPOSURE_RANGE),
        }
    }

    pub fn with_turbidity(mut self, turbidity: f32) -> Self {
        self.turbidity = turbidity;
        self
    }

    pub fn with_rayleigh(mut self, rayleigh: f32) -> Self {
        self.rayleigh = rayleigh;
        self
    }

    pub fn with_sun(mut self, elevation: f32, azimuth: f32) -> Self {
        self.elevation = elevation;
        self.azimuth = azimuth;
        self
    }

    pub fn with_exposure(mut self, exposure: f32) -> Self {
        self.exposure = exposure;
        self
    }
}

impl Default for SkyParameters {
    fn default() -> Self {
        Self {
            turbidity: 10.0,
            rayleigh: 3.0,
            mie_coefficient: 0.005,
            mie_directional_g: 0.95,
            elevation: -2.2,
            azimuth: 180.0,
            exposure: 1.0,
        }
    }
}

/// Uniform block for `sky.wgsl`.
#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub struct SkyUniforms {
    pub inv_view_proj: [[f32; 4]; 4],
    pub camera_position: [f32; 3],
    pub turbidity: f32,
    pub sun_position: [f32; 3],
    pub rayleigh: f32,
    pub up: [f32; 3],
    pub mie_coefficient: f32,
    pub mie_directional_g: f32,
    pub exposure: f32,
    pub _padding: [f32; 2],
}

impl SkyUniforms {
    pub fn new(params: &SkyParameters, view_proj: Mat4, camera_position: Vec3) -> Self {
        Self {
            inv_view_proj: view_proj.inverse().to_cols_array_2d(),
            camera_position: camera_position.to_array(),
            turbidity: params.turbidity,
            sun_position: params.sun_position().to_array(),
            rayleigh: params.rayleigh,
            up: Vec3::Y.to_array(),
            mie_coefficient: params.mie_coefficient,
            mie_directional_g: params.mie_directional_g,
            exposure: params.exposure,
            _padding: [0.0; 2],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-5
    }

    #[test]
    fn test_uniform_size() {
        assert_eq!(std::mem::size_of::<SkyUniforms>(), 128);
    }

    #[test]
    fn test_sun_at_zenith() {
        let sky = SkyParameters::default().with_sun(90.0, 0.0);
        assert!(approx(sky.sun_position(), Vec3::Y));
    }

    #[test]
    fn test_sun_on_horizon() {
        let sky = SkyParameters::default().with_sun(0.0, 0.0);
        assert!(approx(sky.sun_position(), Vec3::Z));

        let sky = SkyParameters::default().with_sun(0.0, 90.0);
        assert!(approx(sky.sun_position(), Vec3::X));
    }

    #[test]
    fn test_default_sun_just_below_horizon() {
        let sun = SkyParameters::default().sun_position();
        assert!(sun.y < 0.0 && sun.y > -0.05);
        assert!(sun.z < -0.99);
        assert!((sun.length() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_clamped() {
        let sky = SkyParameters {
            turbidity: 50.0,
            exposure: -1.0,
            azimuth: 270.0,
            ..SkyParameters::default()
        }
        .clamped();
        assert_eq!(sky.turbidity, 20.0);
        assert_eq!(sky.exposure, 0.0);
        assert_eq!(sky.azimuth, 180.0);
        assert_eq!(sky.rayleigh, 3.0);
    }
}
