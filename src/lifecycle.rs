//! Burst lifecycle control.
//!
//! Every burst moves through three states:
//!
//! ```text
//!  Pending ──launch──▶ Animating ──tween done / cancelled──▶ Destroyed
//! ```
//!
//! - **Pending**: registered in the scene, not yet launched.
//! - **Animating**: a linear (by default) [`Tween`] drives `progress` from 0
//!   to 1 over the burst duration, timed by a wall [`Clock`].
//! - **Destroyed**: removed from the scene, backend resources released.
//!
//! Destruction happens exactly once. The controller removes the burst's
//! [`ActiveBurst`] entry before destroying it and `destroy` takes that entry
//! by value, so there is no path that reaches `destroy` twice for one id.
//!
//! Completion is observable as a future ([`BurstCompletion`]) and bursts can
//! be cancelled through a [`CancellationToken`] checked on every tick.
//!
//! # Example
//!
//! ```ignore
//! let mut controller = LifecycleController::new(SystemClock::new());
//! let completion = controller.launch(&scene, id, 3.0)?;
//!
//! // Each frame:
//! controller.tick(&mut scene, &mut backend);
//! ```

use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use futures::channel::oneshot;

use crate::burst::Burst;
use crate::error::BurstError;
use crate::resources::BurstBackend;
use crate::scene::{BurstId, Scene};
use crate::time::Clock;
use crate::tween::{Easing, Tween};

/// Default burst duration in seconds.
pub const DEFAULT_DURATION: f32 = 3.0;

/// Lifecycle state of a burst.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BurstState {
    /// Registered but not launched.
    Pending,
    /// Progress is being animated.
    Animating,
    /// Removed from the scene and released.
    Destroyed,
}

/// How a burst's lifetime ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BurstOutcome {
    /// Progress reached 1.
    Completed,
    /// Cancelled through its token or by scene teardown.
    Cancelled,
    /// Destroyed early by the admission policy to make room.
    Evicted,
}

/// Shared cancellation flag.
///
/// Clones observe the same flag. Cancelling is sticky.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Takes effect on the next tick.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

/// Future resolving when a burst is destroyed.
///
/// Resolves to [`BurstOutcome::Cancelled`] if the controller is dropped while
/// the burst is still animating.
#[derive(Debug)]
pub struct BurstCompletion {
    id: BurstId,
    token: CancellationToken,
    receiver: oneshot::Receiver<BurstOutcome>,
}

impl BurstCompletion {
    /// Id of the burst this completion belongs to.
    #[inline]
    pub fn id(&self) -> BurstId {
        self.id
    }

    /// Token that cancels the burst.
    #[inline]
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Non-blocking check. `None` while the burst is still alive.
    pub fn try_outcome(&mut self) -> Option<BurstOutcome> {
        match self.receiver.try_recv() {
            Ok(outcome) => outcome,
            Err(oneshot::Canceled) => Some(BurstOutcome::Cancelled),
        }
    }
}

impl Future for BurstCompletion {
    type Output = BurstOutcome;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<BurstOutcome> {
        match Pin::new(&mut self.receiver).poll(cx) {
            Poll::Ready(Ok(outcome)) => Poll::Ready(outcome),
            Poll::Ready(Err(oneshot::Canceled)) => Poll::Ready(BurstOutcome::Cancelled),
            Poll::Pending => Poll::Pending,
        }
    }
}

/// Bookkeeping for one animating burst.
#[derive(Debug)]
struct ActiveBurst {
    tween: Tween,
    token: CancellationToken,
    completion: oneshot::Sender<BurstOutcome>,
}

/// What happened during one [`LifecycleController::tick`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    /// Bursts whose progress was written.
    pub animated: usize,
    /// Bursts destroyed because their tween finished.
    pub completed: Vec<BurstId>,
    /// Bursts destroyed because their token was cancelled.
    pub cancelled: Vec<BurstId>,
}

/// Drives burst progress and owns destruction.
#[derive(Debug)]
pub struct LifecycleController<C> {
    clock: C,
    easing: Easing,
    active: BTreeMap<BurstId, ActiveBurst>,
}

impl<C: Clock> LifecycleController<C> {
    /// Create a controller with linear easing.
    pub fn new(clock: C) -> Self {
        Self {
            clock,
            easing: Easing::Linear,
            active: BTreeMap::new(),
        }
    }

    /// Set the easing used by bursts launched from now on.
    pub fn with_easing(mut self, easing: Easing) -> Self {
        self.set_easing(easing);
        self
    }

    /// Change the easing for future launches. Animating bursts keep theirs.
    pub fn set_easing(&mut self, easing: Easing) {
        self.easing = easing;
    }

    #[inline]
    pub fn clock(&self) -> &C {
        &self.clock
    }

    #[inline]
    pub fn easing(&self) -> Easing {
        self.easing
    }

    /// Number of animating bursts.
    #[inline]
    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    /// Oldest animating burst, if any.
    pub fn oldest_active(&self) -> Option<BurstId> {
        self.active.keys().next().copied()
    }

    /// Current state of a burst.
    ///
    /// Ids the scene never issued report `Destroyed`, same as released ones.
    pub fn state<H>(&self, scene: &Scene<Burst<H>>, id: BurstId) -> BurstState {
        if self.active.contains_key(&id) {
            BurstState::Animating
        } else if scene.contains(id) {
            BurstState::Pending
        } else {
            BurstState::Destroyed
        }
    }

    /// Start animating a pending burst over `duration` seconds.
    ///
    /// # Errors
    ///
    /// - [`BurstError::InvalidDuration`] for non-finite, non-positive, or
    ///   unrepresentably long durations.
    /// - [`BurstError::UnknownBurst`] if the id is not in the scene.
    /// - [`BurstError::AlreadyLaunched`] if the burst is already animating.
    pub fn launch<H>(
        &mut self,
        scene: &Scene<Burst<H>>,
        id: BurstId,
        duration: f32,
    ) -> Result<BurstCompletion, BurstError> {
        self.launch_with_token(scene, id, duration, CancellationToken::new())
    }

    /// Like [`launch`](Self::launch), observing an existing token.
    pub fn launch_with_token<H>(
        &mut self,
        scene: &Scene<Burst<H>>,
        id: BurstId,
        duration: f32,
        token: CancellationToken,
    ) -> Result<BurstCompletion, BurstError> {
        check_duration(duration)?;
        if self.active.contains_key(&id) {
            return Err(BurstError::AlreadyLaunched(id));
        }
        if !scene.contains(id) {
            return Err(BurstError::UnknownBurst(id));
        }

        let (sender, receiver) = oneshot::channel();
        let tween = Tween::new(0.0, 1.0, duration, self.easing, self.clock.now());
        self.active.insert(
            id,
            ActiveBurst {
                tween,
                token: token.clone(),
                completion: sender,
            },
        );
        log::debug!("launched {id} for {duration:.2}s");

        Ok(BurstCompletion {
            id,
            token,
            receiver,
        })
    }

    /// Advance every animating burst to the current clock reading.
    ///
    /// Reads the clock once, writes eased progress for each burst, then
    /// destroys the bursts that finished or were cancelled.
    pub fn tick<B: BurstBackend>(
        &mut self,
        scene: &mut Scene<Burst<B::Handle>>,
        backend: &mut B,
    ) -> TickReport {
        let now = self.clock.now();
        let mut report = TickReport::default();
        let mut finished = Vec::new();

        for (&id, active) in &self.active {
            if active.token.is_cancelled() {
                finished.push((id, BurstOutcome::Cancelled));
                continue;
            }

            let sample = active.tween.sample(now);
            if let Some(burst) = scene.get_mut(id) {
                let progress = burst.advance(sample.value);
                backend.write_animation(burst.handle(), sample.elapsed, progress);
                report.animated += 1;
            }
            if sample.finished {
                finished.push((id, BurstOutcome::Completed));
            }
        }

        for (id, outcome) in finished {
            if let Some(active) = self.active.remove(&id) {
                destroy(id, active, outcome, scene, backend);
                match outcome {
                    BurstOutcome::Completed => report.completed.push(id),
                    _ => report.cancelled.push(id),
                }
            }
        }

        report
    }

    /// Destroy an animating burst right away.
    ///
    /// Returns `false` if the burst is not animating.
    pub fn terminate<B: BurstBackend>(
        &mut self,
        id: BurstId,
        outcome: BurstOutcome,
        scene: &mut Scene<Burst<B::Handle>>,
        backend: &mut B,
    ) -> bool {
        match self.active.remove(&id) {
            Some(active) => {
                destroy(id, active, outcome, scene, backend);
                true
            }
            None => false,
        }
    }

    /// Destroy every animating burst as cancelled. Used on scene teardown.
    ///
    /// Returns the number of bursts destroyed.
    pub fn cancel_all<B: BurstBackend>(
        &mut self,
        scene: &mut Scene<Burst<B::Handle>>,
        backend: &mut B,
    ) -> usize {
        let active = std::mem::take(&mut self.active);
        let count = active.len();
        for (id, entry) in active {
            destroy(id, entry, BurstOutcome::Cancelled, scene, backend);
        }
        count
    }
}

/// Reject durations that are not finite, not positive, or too long for a
/// [`Duration`].
pub(crate) fn check_duration(duration: f32) -> Result<(), BurstError> {
    if duration <= 0.0 || Duration::try_from_secs_f32(duration).is_err() {
        return Err(BurstError::InvalidDuration(duration));
    }
    Ok(())
}

/// Remove a burst from the scene, release its resources, and resolve its
/// completion. Consumes the bookkeeping entry.
fn destroy<B: BurstBackend>(
    id: BurstId,
    active: ActiveBurst,
    outcome: BurstOutcome,
    scene: &mut Scene<Burst<B::Handle>>,
    backend: &mut B,
) {
    if let Some(burst) = scene.remove(id) {
        backend.release(burst.into_handle());
    }
    log::debug!("destroyed {id} ({outcome:?})");
    // The receiver may already be gone; nobody is waiting then.
    let _ = active.completion.send(outcome);
}
