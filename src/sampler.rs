//! Random burst sampling.
//!
//! Produces the per-particle arrays of one burst: local positions on a thick
//! spherical shell, point sizes, and time randomizers. Every particle is drawn
//! independently.
//!
//! The radius is drawn from `[0.75, 1.0] * radius`, which pushes most of the
//! mass toward the outer shell. The polar angle only spans `[0, PI)` and the
//! azimuth `[0, TAU)`, both uniform in angle rather than in area, so particles
//! bunch up near the poles.
//!
//! ```ignore
//! let mut rng = SmallRng::seed_from_u64(7);
//! let particles = sampler::sample(&mut rng, 500, 1.0)?;
//! assert_eq!(particles.len(), 500);
//! ```

use std::f32::consts::{PI, TAU};

use glam::Vec3;
use rand::Rng;

use crate::error::BurstError;

/// Innermost shell, as a fraction of the burst radius.
pub const INNER_SHELL: f32 = 0.75;

/// Per-particle arrays of one burst.
///
/// Constructed only by [`sample`]; the arrays can't be resized or mutated
/// afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct BurstParticles {
    positions: Vec<Vec3>,
    sizes: Vec<f32>,
    time_randomizers: Vec<f32>,
}

impl BurstParticles {
    /// Number of particles. Always at least 1.
    #[inline]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Whether there are no particles.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Positions relative to the burst origin.
    #[inline]
    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    /// Per-particle size factors in `[0, 1)`.
    #[inline]
    pub fn sizes(&self) -> &[f32] {
        &self.sizes
    }

    /// Per-particle progress multipliers in `[1, 2)`.
    #[inline]
    pub fn time_randomizers(&self) -> &[f32] {
        &self.time_randomizers
    }
}

/// Convert spherical coordinates to Cartesian, Y up.
///
/// `phi` is the polar angle measured from +Y, `theta` the azimuth around Y
/// measured from +Z toward +X.
#[inline]
pub fn spherical_to_cartesian(radius: f32, phi: f32, theta: f32) -> Vec3 {
    let sin_phi_radius = phi.sin() * radius;
    Vec3::new(
        sin_phi_radius * theta.sin(),
        phi.cos() * radius,
        sin_phi_radius * theta.cos(),
    )
}

/// Sample `count` particles spread over `radius`.
///
/// # Errors
///
/// [`BurstError::InvalidParticleCount`] if `count` is 0 and
/// [`BurstError::InvalidRadius`] if `radius` is not finite and positive.
pub fn sample<R: Rng>(
    rng: &mut R,
    count: u32,
    radius: f32,
) -> Result<BurstParticles, BurstError> {
    if count == 0 {
        return Err(BurstError::InvalidParticleCount(count));
    }
    if !radius.is_finite() || radius <= 0.0 {
        return Err(BurstError::InvalidRadius(radius));
    }

    let count = count as usize;
    let mut positions = Vec::with_capacity(count);
    let mut sizes = Vec::with_capacity(count);
    let mut time_randomizers = Vec::with_capacity(count);

    for _ in 0..count {
        let r = radius * (INNER_SHELL + rng.gen::<f32>() * (1.0 - INNER_SHELL));
        let phi = rng.gen::<f32>() * PI;
        let theta = rng.gen::<f32>() * TAU;
        positions.push(spherical_to_cartesian(r, phi, theta));

        sizes.push(rng.gen::<f32>());
        // `1.0 + gen()` can round up to exactly 2.0 in f32.
        time_randomizers.push(rng.gen_range(1.0..2.0));
    }

    Ok(BurstParticles {
        positions,
        sizes,
        time_randomizers,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn rng() -> SmallRng {
        SmallRng::seed_from_u64(0x5eed)
    }

    #[test]
    fn test_lengths_match_count() {
        for count in [1, 2, 17, 400, 1400] {
            let p = sample(&mut rng(), count, 1.0).unwrap();
            assert_eq!(p.len(), count as usize);
            assert_eq!(p.positions().len(), count as usize);
            assert_eq!(p.sizes().len(), count as usize);
            assert_eq!(p.time_randomizers().len(), count as usize);
            assert!(!p.is_empty());
        }
    }

    #[test]
    fn test_radius_within_shell() {
        for radius in [0.01, 0.5, 1.0, 1.49, 40.0] {
            let p = sample(&mut rng(), 2000, radius).unwrap();
            for pos in p.positions() {
                let r = pos.length();
                // Allow for f32 rounding in the trig round trip.
                let eps = radius * 1e-5;
                assert!(r >= INNER_SHELL * radius - eps, "r = {r}, radius = {radius}");
                assert!(r <= radius + eps, "r = {r}, radius = {radius}");
            }
        }
    }

    #[test]
    fn test_sizes_and_randomizers_in_range() {
        let p = sample(&mut rng(), 5000, 1.0).unwrap();
        assert!(p.sizes().iter().all(|s| (0.0..1.0).contains(s)));
        assert!(p.time_randomizers().iter().all(|t| (1.0..2.0).contains(t)));
    }

    #[test]
    fn test_zero_count_is_rejected() {
        let err = sample(&mut rng(), 0, 1.0).unwrap_err();
        assert_eq!(err, BurstError::InvalidParticleCount(0));
    }

    #[test]
    fn test_bad_radius_is_rejected() {
        for radius in [0.0, -1.0, f32::NAN, f32::INFINITY] {
            let err = sample(&mut rng(), 10, radius).unwrap_err();
            assert!(matches!(err, BurstError::InvalidRadius(_)));
        }
    }

    #[test]
    fn test_same_seed_same_burst() {
        let a = sample(&mut rng(), 64, 1.0).unwrap();
        let b = sample(&mut rng(), 64, 1.0).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_spherical_convention() {
        let up = spherical_to_cartesian(2.0, 0.0, 1.234);
        assert!((up - Vec3::new(0.0, 2.0, 0.0)).length() < 1e-6);

        let front = spherical_to_cartesian(1.0, PI / 2.0, 0.0);
        assert!((front - Vec3::Z).length() < 1e-6);

        let right = spherical_to_cartesian(1.0, PI / 2.0, PI / 2.0);
        assert!((right - Vec3::X).length() < 1e-6);
    }

    #[test]
    fn test_polar_angle_spans_both_hemispheres() {
        let p = sample(&mut rng(), 2000, 1.0).unwrap();
        assert!(p.positions().iter().any(|v| v.y > 0.5));
        assert!(p.positions().iter().any(|v| v.y < -0.5));
    }
}
