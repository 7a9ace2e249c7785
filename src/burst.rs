//! The burst entity.

use glam::{Vec2, Vec3};

use crate::sampler::BurstParticles;

/// Parameters of one burst, as chosen by the spawner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BurstParams {
    /// World-space center of the burst.
    pub origin: Vec3,
    /// Number of particles.
    pub count: u32,
    /// Base point size, scaled per particle by its size factor.
    pub base_size: f32,
    /// Index into the shared texture pool.
    pub texture: usize,
    /// Spread radius.
    pub radius: f32,
    /// RGB color in `[0, 1]`.
    pub color: Vec3,
}

/// One live firework burst.
///
/// Everything except `progress` is fixed at construction. The backend handle
/// is owned exclusively; the only way to get it back out is
/// [`Burst::into_handle`], which consumes the burst, so a burst can't be
/// released twice.
#[derive(Debug)]
pub struct Burst<H> {
    particles: BurstParticles,
    origin: Vec3,
    color: Vec3,
    texture: usize,
    base_size: f32,
    radius: f32,
    resolution: Vec2,
    progress: f32,
    handle: H,
}

impl<H> Burst<H> {
    pub(crate) fn new(
        particles: BurstParticles,
        params: &BurstParams,
        resolution: Vec2,
        handle: H,
    ) -> Self {
        Self {
            particles,
            origin: params.origin,
            color: params.color,
            texture: params.texture,
            base_size: params.base_size,
            radius: params.radius,
            resolution,
            progress: 0.0,
            handle,
        }
    }

    #[inline]
    pub fn particle_count(&self) -> u32 {
        self.particles.len() as u32
    }

    #[inline]
    pub fn particles(&self) -> &BurstParticles {
        &self.particles
    }

    #[inline]
    pub fn origin(&self) -> Vec3 {
        self.origin
    }

    #[inline]
    pub fn color(&self) -> Vec3 {
        self.color
    }

    /// Index of the shared texture this burst samples.
    #[inline]
    pub fn texture(&self) -> usize {
        self.texture
    }

    #[inline]
    pub fn base_size(&self) -> f32 {
        self.base_size
    }

    #[inline]
    pub fn radius(&self) -> f32 {
        self.radius
    }

    /// Render resolution baked in when the burst was built.
    #[inline]
    pub fn resolution(&self) -> Vec2 {
        self.resolution
    }

    /// Animation progress in `[0, 1]`.
    #[inline]
    pub fn progress(&self) -> f32 {
        self.progress
    }

    #[inline]
    pub fn handle(&self) -> &H {
        &self.handle
    }

    /// Move progress forward. Values below the current progress are ignored
    /// and values above 1 are clamped. Returns the resulting progress.
    pub(crate) fn advance(&mut self, progress: f32) -> f32 {
        if progress > self.progress {
            self.progress = progress.min(1.0);
        }
        self.progress
    }

    /// Consume the burst, handing back its backend handle for release.
    pub(crate) fn into_handle(self) -> H {
        self.handle
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sampler;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn burst() -> Burst<()> {
        let particles = sampler::sample(&mut SmallRng::seed_from_u64(1), 8, 1.0).unwrap();
        let params = BurstParams {
            origin: Vec3::new(0.5, -0.25, 0.0),
            count: 8,
            base_size: 0.15,
            texture: 3,
            radius: 1.0,
            color: Vec3::ONE,
        };
        Burst::new(particles, &params, Vec2::new(800.0, 600.0), ())
    }

    #[test]
    fn test_new_burst_starts_at_zero() {
        let b = burst();
        assert_eq!(b.progress(), 0.0);
        assert_eq!(b.particle_count(), 8);
        assert_eq!(b.texture(), 3);
        assert_eq!(b.origin(), Vec3::new(0.5, -0.25, 0.0));
    }

    #[test]
    fn test_progress_never_decreases() {
        let mut b = burst();
        assert_eq!(b.advance(0.4), 0.4);
        assert_eq!(b.advance(0.2), 0.4);
        assert_eq!(b.advance(0.9), 0.9);
    }

    #[test]
    fn test_progress_clamped_to_one() {
        let mut b = burst();
        assert_eq!(b.advance(3.0), 1.0);
    }
}
