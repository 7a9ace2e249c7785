//! Burst resource building.
//!
//! Turns sampled particle arrays into a renderable through a
//! [`BurstBackend`]. The backend owns the GPU side; the core only sees an
//! opaque handle and talks to it through three calls:
//!
//! | Call | When |
//! |------|------|
//! | [`BurstBackend::allocate`] | once, when the burst is built |
//! | [`BurstBackend::write_animation`] | every scheduler tick while animating |
//! | [`BurstBackend::release`] | once, when the burst is destroyed |
//!
//! # Material contract
//!
//! Backends render each particle as a textured point sprite with additive
//! blending and depth writes disabled, so overlapping sparks brighten instead
//! of occluding each other. The texture's red channel is the sprite alpha.
//! Point size in pixels is
//! `size * resolution.y * particle_size * (1 / -view_z)`, which keeps bursts
//! consistent across pixel ratios.

use std::collections::BTreeMap;
use std::mem::offset_of;

use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec3};

use crate::burst::{Burst, BurstParams};
use crate::error::BurstError;
use crate::sampler::BurstParticles;

/// Per-burst uniform block.
///
/// `origin`, `size`, `color`, and `resolution` never change after
/// construction; `time` and `progress` start at 0 and are rewritten on every
/// tick. The layout matches `BurstUniforms` in `burst.wgsl`.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct BurstUniforms {
    pub origin: [f32; 3],
    pub size: f32,
    pub color: [f32; 3],
    pub time: f32,
    pub resolution: [f32; 2],
    pub progress: f32,
    pub _padding: f32,
}

impl BurstUniforms {
    /// Byte offset of `time`.
    pub const TIME_OFFSET: u64 = offset_of!(BurstUniforms, time) as u64;
    /// Byte offset of `progress`.
    pub const PROGRESS_OFFSET: u64 = offset_of!(BurstUniforms, progress) as u64;

    pub fn new(origin: Vec3, size: f32, color: Vec3, resolution: Vec2) -> Self {
        Self {
            origin: origin.to_array(),
            size,
            color: color.to_array(),
            time: 0.0,
            resolution: resolution.to_array(),
            progress: 0.0,
            _padding: 0.0,
        }
    }
}

/// Everything a backend needs to allocate one burst.
#[derive(Debug, Clone, Copy)]
pub struct BurstDescriptor<'a> {
    /// Per-particle vertex streams.
    pub particles: &'a BurstParticles,
    /// Initial uniform values.
    pub uniforms: BurstUniforms,
    /// Shared texture index. Backends must not take ownership of it.
    pub texture: usize,
}

impl BurstDescriptor<'_> {
    #[inline]
    pub fn particle_count(&self) -> u32 {
        self.particles.len() as u32
    }

    /// Total size of the three vertex streams in bytes.
    pub fn vertex_bytes(&self) -> u64 {
        let per_particle = std::mem::size_of::<Vec3>() + 2 * std::mem::size_of::<f32>();
        (self.particles.len() * per_particle) as u64
    }
}

/// Renderer capability consumed by the burst engine.
pub trait BurstBackend {
    /// Exclusively owned renderable handle.
    type Handle;

    /// Number of textures in the shared pool.
    fn texture_count(&self) -> usize;

    /// Allocate GPU resources for a burst.
    ///
    /// # Errors
    ///
    /// [`BurstError::Allocation`] when the resources can't be created. The
    /// caller drops the spawn; nothing is left allocated.
    fn allocate(&mut self, descriptor: &BurstDescriptor<'_>) -> Result<Self::Handle, BurstError>;

    /// Write the time-varying uniforms.
    fn write_animation(&mut self, handle: &Self::Handle, time: f32, progress: f32);

    /// Release every resource the handle owns except the shared texture.
    fn release(&mut self, handle: Self::Handle);
}

/// Build a renderable burst from sampled particles.
///
/// # Errors
///
/// - [`BurstError::InvalidSize`] for a negative or non-finite base size.
/// - [`BurstError::TextureOutOfRange`] if `params.texture` is not in the pool.
/// - [`BurstError::Allocation`] from the backend.
pub fn build<B: BurstBackend>(
    backend: &mut B,
    particles: BurstParticles,
    params: &BurstParams,
    resolution: Vec2,
) -> Result<Burst<B::Handle>, BurstError> {
    if !params.base_size.is_finite() || params.base_size < 0.0 {
        return Err(BurstError::InvalidSize(params.base_size));
    }
    let len = backend.texture_count();
    if params.texture >= len {
        return Err(BurstError::TextureOutOfRange {
            index: params.texture,
            len,
        });
    }

    let descriptor = BurstDescriptor {
        particles: &particles,
        uniforms: BurstUniforms::new(params.origin, params.base_size, params.color, resolution),
        texture: params.texture,
    };
    let handle = backend.allocate(&descriptor)?;

    Ok(Burst::new(particles, params, resolution, handle))
}

/// Handle issued by [`HeadlessBackend`].
///
/// Deliberately not `Clone`: holding it is owning the allocation.
#[derive(Debug, PartialEq, Eq)]
pub struct HeadlessHandle {
    serial: u64,
}

impl HeadlessHandle {
    #[inline]
    pub fn serial(&self) -> u64 {
        self.serial
    }
}

#[derive(Debug, Clone, Copy)]
struct HeadlessAllocation {
    particle_count: u32,
    texture: usize,
    uniforms: BurstUniforms,
}

/// GPU-less backend that keeps allocations in memory.
///
/// Used for headless runs, benchmarks, and tests. It tracks every allocation
/// and release so callers can check that nothing leaks and nothing is freed
/// twice.
#[derive(Debug, Default)]
pub struct HeadlessBackend {
    texture_count: usize,
    next_serial: u64,
    live: BTreeMap<u64, HeadlessAllocation>,
    allocations: u64,
    releases: u64,
    animation_writes: u64,
    failures_pending: u32,
}

impl HeadlessBackend {
    /// Create a backend with a pool of `texture_count` textures.
    pub fn new(texture_count: usize) -> Self {
        Self {
            texture_count,
            ..Self::default()
        }
    }

    /// Make the next `n` allocations fail with [`BurstError::Allocation`].
    pub fn fail_next_allocations(&mut self, n: u32) {
        self.failures_pending = n;
    }

    /// Successful allocations so far.
    #[inline]
    pub fn allocations(&self) -> u64 {
        self.allocations
    }

    /// Releases so far.
    #[inline]
    pub fn releases(&self) -> u64 {
        self.releases
    }

    /// Number of `write_animation` calls so far.
    #[inline]
    pub fn animation_writes(&self) -> u64 {
        self.animation_writes
    }

    /// Allocations not yet released.
    #[inline]
    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    /// Whether the allocation with this serial is still live.
    pub fn is_live(&self, serial: u64) -> bool {
        self.live.contains_key(&serial)
    }

    /// Last uniform values written for a live allocation.
    pub fn uniforms(&self, serial: u64) -> Option<BurstUniforms> {
        self.live.get(&serial).map(|a| a.uniforms)
    }

    /// Particle count and texture index of a live allocation.
    pub fn allocation(&self, serial: u64) -> Option<(u32, usize)> {
        self.live.get(&serial).map(|a| (a.particle_count, a.texture))
    }
}

impl BurstBackend for HeadlessBackend {
    type Handle = HeadlessHandle;

    fn texture_count(&self) -> usize {
        self.texture_count
    }

    fn allocate(&mut self, descriptor: &BurstDescriptor<'_>) -> Result<HeadlessHandle, BurstError> {
        if self.failures_pending > 0 {
            self.failures_pending -= 1;
            return Err(BurstError::Allocation(format!(
                "out of memory allocating {} bytes",
                descriptor.vertex_bytes()
            )));
        }

        let serial = self.next_serial;
        self.next_serial += 1;
        self.allocations += 1;
        self.live.insert(
            serial,
            HeadlessAllocation {
                particle_count: descriptor.particle_count(),
                texture: descriptor.texture,
                uniforms: descriptor.uniforms,
            },
        );
        Ok(HeadlessHandle { serial })
    }

    fn write_animation(&mut self, handle: &HeadlessHandle, time: f32, progress: f32) {
        self.animation_writes += 1;
        if let Some(allocation) = self.live.get_mut(&handle.serial) {
            allocation.uniforms.time = time;
            allocation.uniforms.progress = progress;
        }
    }

    fn release(&mut self, handle: HeadlessHandle) {
        let removed = self.live.remove(&handle.serial);
        debug_assert!(removed.is_some(), "released serial {} twice", handle.serial);
        self.releases += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sampler;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn params() -> BurstParams {
        BurstParams {
            origin: Vec3::new(0.2, 0.4, 0.0),
            count: 32,
            base_size: 0.12,
            texture: 1,
            radius: 0.8,
            color: Vec3::new(1.0, 0.4, 0.4),
        }
    }

    fn particles(count: u32) -> BurstParticles {
        sampler::sample(&mut SmallRng::seed_from_u64(9), count, 0.8).unwrap()
    }

    #[test]
    fn test_uniform_layout_matches_wgsl() {
        assert_eq!(std::mem::size_of::<BurstUniforms>(), 48);
        assert_eq!(BurstUniforms::TIME_OFFSET, 28);
        assert_eq!(BurstUniforms::PROGRESS_OFFSET, 40);
    }

    #[test]
    fn test_build_binds_initial_uniforms() {
        let mut backend = HeadlessBackend::new(4);
        let resolution = Vec2::new(1600.0, 900.0);
        let burst = build(&mut backend, particles(32), &params(), resolution).unwrap();

        let uniforms = backend.uniforms(burst.handle().serial()).unwrap();
        assert_eq!(uniforms.time, 0.0);
        assert_eq!(uniforms.progress, 0.0);
        assert_eq!(uniforms.size, 0.12);
        assert_eq!(uniforms.resolution, [1600.0, 900.0]);
        assert_eq!(uniforms.origin, [0.2, 0.4, 0.0]);
        assert_eq!(uniforms.color, [1.0, 0.4, 0.4]);
        assert_eq!(backend.allocation(burst.handle().serial()), Some((32, 1)));
        assert_eq!(burst.resolution(), resolution);
    }

    #[test]
    fn test_build_rejects_unknown_texture() {
        let mut backend = HeadlessBackend::new(1);
        let err = build(&mut backend, particles(4), &params(), Vec2::ONE).unwrap_err();
        assert_eq!(err, BurstError::TextureOutOfRange { index: 1, len: 1 });
        assert_eq!(backend.allocations(), 0);
    }

    #[test]
    fn test_build_rejects_bad_size() {
        let mut backend = HeadlessBackend::new(4);
        let mut p = params();
        p.base_size = -0.1;
        let err = build(&mut backend, particles(4), &p, Vec2::ONE).unwrap_err();
        assert!(matches!(err, BurstError::InvalidSize(_)));
    }

    #[test]
    fn test_allocation_failure_is_recoverable() {
        let mut backend = HeadlessBackend::new(4);
        backend.fail_next_allocations(1);
        let err = build(&mut backend, particles(4), &params(), Vec2::ONE).unwrap_err();
        assert!(matches!(err, BurstError::Allocation(_)));
        assert_eq!(backend.live_count(), 0);

        // The next attempt goes through.
        assert!(build(&mut backend, particles(4), &params(), Vec2::ONE).is_ok());
        assert_eq!(backend.live_count(), 1);
    }

    #[test]
    fn test_release_frees_allocation() {
        let mut backend = HeadlessBackend::new(4);
        let burst = build(&mut backend, particles(4), &params(), Vec2::ONE).unwrap();
        let serial = burst.handle().serial();
        backend.release(burst.into_handle());
        assert!(!backend.is_live(serial));
        assert_eq!(backend.releases(), 1);
    }

    #[test]
    fn test_vertex_bytes() {
        let p = particles(10);
        let d = BurstDescriptor {
            particles: &p,
            uniforms: BurstUniforms::new(Vec3::ZERO, 0.1, Vec3::ONE, Vec2::ONE),
            texture: 0,
        };
        assert_eq!(d.vertex_bytes(), 10 * 20);
    }
}
