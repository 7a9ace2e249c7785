//! The firework engine: scene, lifecycle controller, and spawner in one place.
//!
//! ```ignore
//! let mut fireworks = Fireworks::new()
//!     .with_duration(3.0)
//!     .with_admission(AdmissionPolicy::EvictOldest { max: 64 });
//!
//! // On click:
//! match fireworks.spawn_from_input(&mut backend, &InputEvent::click(x, y)) {
//!     Ok(spawned) => log::debug!("spawned {}", spawned.id),
//!     Err(e) => log::warn!("dropped spawn: {e}"),
//! }
//!
//! // Every frame:
//! fireworks.tick(&mut backend);
//! ```

use glam::Vec3;
use rand::rngs::SmallRng;
use rand::SeedableRng;

use crate::burst::{Burst, BurstParams};
use crate::config::FireworksConfig;
use crate::error::SpawnError;
use crate::lifecycle::{
    check_duration, BurstCompletion, BurstOutcome, BurstState, LifecycleController, TickReport,
    DEFAULT_DURATION,
};
use crate::resources::{self, BurstBackend};
use crate::sampler;
use crate::scene::{BurstId, Scene};
use crate::spawner::{AdmissionPolicy, BurstSpawner, InputEvent, SpawnConfig};
use crate::time::{Clock, SystemClock};
use crate::tween::Easing;
use crate::viewport::Viewport;

/// A burst that was spawned and launched.
#[derive(Debug)]
pub struct SpawnedBurst {
    pub id: BurstId,
    pub params: BurstParams,
    /// Resolves when the burst is destroyed.
    pub completion: BurstCompletion,
}

/// Owns every live burst and drives them.
///
/// `H` is the backend's handle type; `C` the scheduler clock.
#[derive(Debug)]
pub struct Fireworks<H, C = SystemClock> {
    scene: Scene<Burst<H>>,
    lifecycle: LifecycleController<C>,
    spawner: BurstSpawner,
    admission: AdmissionPolicy,
    duration: f32,
    viewport: Viewport,
    rng: SmallRng,
}

impl<H> Fireworks<H, SystemClock> {
    /// Create an engine on the wall clock with default settings.
    pub fn new() -> Self {
        Self::with_clock(SystemClock::new())
    }
}

impl<H> Default for Fireworks<H, SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H, C: Clock> Fireworks<H, C> {
    /// Create an engine driven by `clock`.
    pub fn with_clock(clock: C) -> Self {
        Self {
            scene: Scene::new(),
            lifecycle: LifecycleController::new(clock),
            spawner: BurstSpawner::default(),
            admission: AdmissionPolicy::default(),
            duration: DEFAULT_DURATION,
            viewport: Viewport::default(),
            rng: SmallRng::from_entropy(),
        }
    }

    /// Create an engine from the burst and spawn sections of a config.
    pub fn from_config(config: &FireworksConfig, clock: C) -> Self {
        Self::with_clock(clock)
            .with_duration(config.burst.duration)
            .with_easing(config.burst.easing)
            .with_admission(config.burst.admission)
            .with_spawn_config(config.spawn)
    }

    /// Burst lifetime in seconds. Invalid values make every spawn fail.
    pub fn with_duration(mut self, seconds: f32) -> Self {
        self.duration = seconds;
        self
    }

    pub fn with_easing(mut self, easing: Easing) -> Self {
        self.lifecycle.set_easing(easing);
        self
    }

    pub fn with_admission(mut self, admission: AdmissionPolicy) -> Self {
        self.admission = admission;
        self
    }

    pub fn with_spawn_config(mut self, config: SpawnConfig) -> Self {
        self.spawner = BurstSpawner::new(config);
        self
    }

    pub fn with_viewport(mut self, viewport: Viewport) -> Self {
        self.viewport = viewport;
        self
    }

    /// Seed the random source for reproducible bursts.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = SmallRng::seed_from_u64(seed);
        self
    }

    /// Update the viewport. Only bursts spawned afterwards see the new
    /// resolution.
    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    #[inline]
    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    #[inline]
    pub fn duration(&self) -> f32 {
        self.duration
    }

    #[inline]
    pub fn admission(&self) -> AdmissionPolicy {
        self.admission
    }

    /// Live bursts, for rendering.
    #[inline]
    pub fn scene(&self) -> &Scene<Burst<H>> {
        &self.scene
    }

    #[inline]
    pub fn lifecycle(&self) -> &LifecycleController<C> {
        &self.lifecycle
    }

    /// Number of animating bursts.
    #[inline]
    pub fn active_count(&self) -> usize {
        self.lifecycle.active_count()
    }

    pub fn state(&self, id: BurstId) -> BurstState {
        self.lifecycle.state(&self.scene, id)
    }

    /// Spawn a burst at a clicked position.
    ///
    /// # Errors
    ///
    /// Returns [`SpawnError`] when the spawn is dropped; no resources are
    /// left allocated in that case.
    pub fn spawn_from_input<B>(
        &mut self,
        backend: &mut B,
        event: &InputEvent,
    ) -> Result<SpawnedBurst, SpawnError>
    where
        B: BurstBackend<Handle = H>,
    {
        let params = self.spawner.params_from_input(
            &mut self.rng,
            event,
            &self.viewport,
            backend.texture_count(),
        )?;
        self.spawn(backend, params)
    }

    /// Spawn a burst with random parameters centered at `origin`.
    pub fn spawn_at<B>(&mut self, backend: &mut B, origin: Vec3) -> Result<SpawnedBurst, SpawnError>
    where
        B: BurstBackend<Handle = H>,
    {
        let params = self
            .spawner
            .params_at(&mut self.rng, origin, backend.texture_count())?;
        self.spawn(backend, params)
    }

    /// Sample, build, register, and launch a burst.
    ///
    /// Live bursts are only evicted once the new one is built, so a failed
    /// spawn leaves the scene untouched.
    pub fn spawn<B>(&mut self, backend: &mut B, params: BurstParams) -> Result<SpawnedBurst, SpawnError>
    where
        B: BurstBackend<Handle = H>,
    {
        self.check_admission()?;
        check_duration(self.duration)?;

        let particles = sampler::sample(&mut self.rng, params.count, params.radius)?;
        let burst = resources::build(backend, particles, &params, self.viewport.resolution())?;

        self.evict_for_new(backend);
        let id = self.scene.add(burst);

        match self.lifecycle.launch(&self.scene, id, self.duration) {
            Ok(completion) => {
                log::debug!(
                    "spawned {id}: {} particles at ({:.2}, {:.2}), radius {:.2}",
                    params.count,
                    params.origin.x,
                    params.origin.y,
                    params.radius
                );
                Ok(SpawnedBurst {
                    id,
                    params,
                    completion,
                })
            }
            Err(e) => {
                if let Some(burst) = self.scene.remove(id) {
                    backend.release(burst.into_handle());
                }
                Err(e.into())
            }
        }
    }

    /// Advance all bursts to the current clock reading.
    pub fn tick<B>(&mut self, backend: &mut B) -> TickReport
    where
        B: BurstBackend<Handle = H>,
    {
        self.lifecycle.tick(&mut self.scene, backend)
    }

    /// Cancel a burst and destroy it right away.
    ///
    /// Returns `false` if the burst is not animating.
    pub fn cancel<B>(&mut self, backend: &mut B, id: BurstId) -> bool
    where
        B: BurstBackend<Handle = H>,
    {
        self.lifecycle
            .terminate(id, BurstOutcome::Cancelled, &mut self.scene, backend)
    }

    /// Destroy every burst. Call before tearing down the backend.
    pub fn cancel_all<B>(&mut self, backend: &mut B) -> usize
    where
        B: BurstBackend<Handle = H>,
    {
        let cancelled = self.lifecycle.cancel_all(&mut self.scene, backend);
        // Anything still registered was never launched.
        let pending: Vec<_> = self.scene.ids().collect();
        for id in pending {
            if let Some(burst) = self.scene.remove(id) {
                backend.release(burst.into_handle());
            }
        }
        cancelled
    }

    fn check_admission(&self) -> Result<(), SpawnError> {
        let active = self.lifecycle.active_count();
        match self.admission {
            AdmissionPolicy::Unbounded => Ok(()),
            AdmissionPolicy::Reject { max } if active >= max => {
                Err(SpawnError::Rejected { active, max })
            }
            AdmissionPolicy::EvictOldest { max: 0 } => Err(SpawnError::Rejected { active, max: 0 }),
            AdmissionPolicy::Reject { .. } | AdmissionPolicy::EvictOldest { .. } => Ok(()),
        }
    }

    /// Make room for one more burst under [`AdmissionPolicy::EvictOldest`].
    fn evict_for_new<B>(&mut self, backend: &mut B)
    where
        B: BurstBackend<Handle = H>,
    {
        let AdmissionPolicy::EvictOldest { max } = self.admission else {
            return;
        };
        while self.lifecycle.active_count() >= max {
            let Some(oldest) = self.lifecycle.oldest_active() else {
                break;
            };
            self.lifecycle
                .terminate(oldest, BurstOutcome::Evicted, &mut self.scene, backend);
            log::debug!("evicted {oldest} to admit a new burst");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BurstError;
    use crate::resources::{HeadlessBackend, HeadlessHandle};
    use crate::time::ManualClock;

    fn engine() -> (ManualClock, Fireworks<HeadlessHandle, ManualClock>) {
        let clock = ManualClock::new();
        let fireworks = Fireworks::with_clock(clock.clone())
            .with_seed(11)
            .with_viewport(Viewport::new(800.0, 600.0, 1.0));
        (clock, fireworks)
    }

    #[test]
    fn test_spawn_registers_and_animates() {
        let (_clock, mut fw) = engine();
        let mut backend = HeadlessBackend::new(8);
        let spawned = fw
            .spawn_from_input(&mut backend, &InputEvent::click(400.0, 300.0))
            .unwrap();
        assert!(fw.scene().contains(spawned.id));
        assert_eq!(fw.state(spawned.id), BurstState::Animating);
        assert_eq!(spawned.params.origin, Vec3::ZERO);

        let burst = fw.scene().get(spawned.id).unwrap();
        assert_eq!(burst.particle_count(), spawned.params.count);
        assert_eq!(backend.live_count(), 1);
    }

    #[test]
    fn test_spawn_bakes_current_resolution() {
        let (_clock, mut fw) = engine();
        let mut backend = HeadlessBackend::new(1);
        let first = fw.spawn_at(&mut backend, Vec3::ZERO).unwrap();

        fw.set_viewport(Viewport::new(1000.0, 1000.0, 2.0));
        let second = fw.spawn_at(&mut backend, Vec3::ZERO).unwrap();

        let a = fw.scene().get(first.id).unwrap();
        let b = fw.scene().get(second.id).unwrap();
        assert_eq!(a.resolution(), glam::Vec2::new(800.0, 600.0));
        assert_eq!(b.resolution(), glam::Vec2::new(2000.0, 2000.0));
    }

    #[test]
    fn test_failed_allocation_drops_spawn() {
        let (_clock, mut fw) = engine();
        let mut backend = HeadlessBackend::new(8);
        backend.fail_next_allocations(1);
        let err = fw.spawn_at(&mut backend, Vec3::ZERO).unwrap_err();
        assert!(matches!(err, SpawnError::Burst(BurstError::Allocation(_))));
        assert!(fw.scene().is_empty());
        assert_eq!(fw.active_count(), 0);

        assert!(fw.spawn_at(&mut backend, Vec3::ZERO).is_ok());
    }

    #[test]
    fn test_invalid_duration_drops_spawn() {
        let (_clock, fw) = engine();
        let mut fw = fw.with_duration(0.0);
        let mut backend = HeadlessBackend::new(8);
        let err = fw.spawn_at(&mut backend, Vec3::ZERO).unwrap_err();
        assert_eq!(err, SpawnError::Burst(BurstError::InvalidDuration(0.0)));
        assert!(fw.scene().is_empty());
        assert_eq!(backend.live_count(), 0);
        assert_eq!(backend.allocations(), 0);
    }

    #[test]
    fn test_huge_duration_is_rejected() {
        let (_clock, fw) = engine();
        let mut fw = fw.with_duration(1e30);
        let mut backend = HeadlessBackend::new(8);
        let err = fw.spawn_at(&mut backend, Vec3::ZERO).unwrap_err();
        assert_eq!(err, SpawnError::Burst(BurstError::InvalidDuration(1e30)));
        assert!(fw.scene().is_empty());
        assert_eq!(backend.allocations(), 0);
    }

    #[test]
    fn test_overflowing_spawn_range_drops_spawn() {
        let (_clock, fw) = engine();
        let mut fw = fw.with_spawn_config(SpawnConfig {
            min_radius: -3e38,
            max_radius: 3e38,
            ..SpawnConfig::default()
        });
        let mut backend = HeadlessBackend::new(8);
        let err = fw
            .spawn_from_input(&mut backend, &InputEvent::click(10.0, 10.0))
            .unwrap_err();
        assert!(matches!(err, SpawnError::Burst(BurstError::InvalidRadius(_))));
        assert!(fw.scene().is_empty());
        assert_eq!(backend.allocations(), 0);
    }

    #[test]
    fn test_failed_spawn_does_not_evict() {
        let (_clock, fw) = engine();
        let mut fw = fw.with_admission(AdmissionPolicy::EvictOldest { max: 1 });
        let mut backend = HeadlessBackend::new(8);
        let mut first = fw.spawn_at(&mut backend, Vec3::ZERO).unwrap();

        backend.fail_next_allocations(1);
        let err = fw.spawn_at(&mut backend, Vec3::ZERO).unwrap_err();
        assert!(matches!(err, SpawnError::Burst(BurstError::Allocation(_))));

        let mut bad = BurstParams {
            radius: -1.0,
            ..first.params
        };
        assert!(fw.spawn(&mut backend, bad).is_err());
        bad.radius = 1.0;
        bad.count = 0;
        assert!(fw.spawn(&mut backend, bad).is_err());

        assert_eq!(fw.state(first.id), BurstState::Animating);
        assert_eq!(fw.active_count(), 1);
        assert_eq!(first.completion.try_outcome(), None);
        assert_eq!(backend.live_count(), 1);
    }

    #[test]
    fn test_reject_policy() {
        let (_clock, fw) = engine();
        let mut fw = fw.with_admission(AdmissionPolicy::Reject { max: 2 });
        let mut backend = HeadlessBackend::new(8);
        fw.spawn_at(&mut backend, Vec3::ZERO).unwrap();
        fw.spawn_at(&mut backend, Vec3::ZERO).unwrap();
        let err = fw.spawn_at(&mut backend, Vec3::ZERO).unwrap_err();
        assert_eq!(err, SpawnError::Rejected { active: 2, max: 2 });
        assert_eq!(backend.allocations(), 2);
    }

    #[test]
    fn test_evict_oldest_policy() {
        let (_clock, fw) = engine();
        let mut fw = fw.with_admission(AdmissionPolicy::EvictOldest { max: 2 });
        let mut backend = HeadlessBackend::new(8);
        let mut first = fw.spawn_at(&mut backend, Vec3::ZERO).unwrap();
        let second = fw.spawn_at(&mut backend, Vec3::ZERO).unwrap();
        let third = fw.spawn_at(&mut backend, Vec3::ZERO).unwrap();

        assert_eq!(fw.active_count(), 2);
        assert!(!fw.scene().contains(first.id));
        assert!(fw.scene().contains(second.id));
        assert!(fw.scene().contains(third.id));
        assert_eq!(first.completion.try_outcome(), Some(BurstOutcome::Evicted));
        assert_eq!(backend.live_count(), 2);
    }

    #[test]
    fn test_evict_with_zero_max_rejects() {
        let (_clock, fw) = engine();
        let mut fw = fw.with_admission(AdmissionPolicy::EvictOldest { max: 0 });
        let mut backend = HeadlessBackend::new(8);
        assert!(matches!(
            fw.spawn_at(&mut backend, Vec3::ZERO),
            Err(SpawnError::Rejected { .. })
        ));
    }

    #[test]
    fn test_cancel_all_releases_everything() {
        let (_clock, mut fw) = engine();
        let mut backend = HeadlessBackend::new(8);
        for _ in 0..5 {
            fw.spawn_at(&mut backend, Vec3::ZERO).unwrap();
        }
        assert_eq!(fw.cancel_all(&mut backend), 5);
        assert!(fw.scene().is_empty());
        assert_eq!(backend.live_count(), 0);
    }

    #[test]
    fn test_cancel_single_burst() {
        let (_clock, mut fw) = engine();
        let mut backend = HeadlessBackend::new(8);
        let mut spawned = fw.spawn_at(&mut backend, Vec3::ZERO).unwrap();
        assert!(fw.cancel(&mut backend, spawned.id));
        assert!(!fw.cancel(&mut backend, spawned.id));
        assert_eq!(spawned.completion.try_outcome(), Some(BurstOutcome::Cancelled));
    }

    #[test]
    fn test_from_config() {
        let mut config = FireworksConfig::default();
        config.burst.duration = 1.25;
        config.burst.admission = AdmissionPolicy::Reject { max: 3 };
        let fw: Fireworks<HeadlessHandle, ManualClock> =
            Fireworks::from_config(&config, ManualClock::new());
        assert_eq!(fw.duration(), 1.25);
        assert_eq!(fw.admission(), AdmissionPolicy::Reject { max: 3 });
    }
}
