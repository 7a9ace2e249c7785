//! # skyburst
//!
//! Click-spawned GPU firework bursts over a physically based sky.
//!
//! Every click becomes a burst of point sprites that explodes, falls, and
//! fades over a few seconds, then frees its GPU buffers. The engine works
//! against a [`BurstBackend`] trait, so everything except drawing runs and
//! tests without a GPU.
//!
//! ## Quick Start
//!
//! ```ignore
//! use skyburst::prelude::*;
//!
//! fn main() -> Result<(), skyburst::AppError> {
//!     skyburst::run(FireworksConfig::new().with_duration(2.5))
//! }
//! ```
//!
//! ## Headless
//!
//! ```ignore
//! use skyburst::prelude::*;
//!
//! let clock = ManualClock::new();
//! let mut backend = HeadlessBackend::new(8);
//! let mut fireworks = Fireworks::with_clock(clock.clone());
//!
//! let spawned = fireworks.spawn_from_input(&mut backend, &InputEvent::click(640.0, 360.0))?;
//! clock.advance(3.0);
//! fireworks.tick(&mut backend);
//! assert_eq!(fireworks.state(spawned.id), BurstState::Destroyed);
//! ```
//!
//! ## Burst lifetime
//!
//! | Step | Module |
//! |------|--------|
//! | Input to parameters | [`spawner`] |
//! | Per-particle arrays | [`sampler`] |
//! | GPU resources | [`resources`] |
//! | Registration | [`scene`] |
//! | Progress 0 to 1, then destroy | [`lifecycle`] |

mod app;
pub mod burst;
pub mod camera;
pub mod color;
pub mod config;
pub mod error;
pub mod fireworks;
pub mod gpu;
pub mod lifecycle;
pub mod resources;
pub mod sampler;
pub mod scene;
pub mod shaders;
pub mod sky;
pub mod spawner;
pub mod textures;
pub mod time;
pub mod tween;
pub mod viewport;

pub use app::{run, App};
pub use burst::{Burst, BurstParams};
pub use config::FireworksConfig;
pub use error::{AppError, BurstError, ConfigError, GpuError, SpawnError, TextureError};
pub use fireworks::{Fireworks, SpawnedBurst};
pub use glam::{Vec2, Vec3};
pub use lifecycle::{BurstCompletion, BurstOutcome, BurstState, CancellationToken, LifecycleController};
pub use resources::{BurstBackend, HeadlessBackend};
pub use scene::{BurstId, Scene};

/// Convenient re-exports for common usage.
///
/// ```ignore
/// use skyburst::prelude::*;
/// ```
pub mod prelude {
    pub use crate::burst::{Burst, BurstParams};
    pub use crate::camera::{CameraConfig, OrbitCamera};
    pub use crate::config::FireworksConfig;
    pub use crate::fireworks::{Fireworks, SpawnedBurst};
    pub use crate::lifecycle::{BurstOutcome, BurstState, CancellationToken};
    pub use crate::resources::{BurstBackend, HeadlessBackend};
    pub use crate::scene::BurstId;
    pub use crate::sky::SkyParameters;
    pub use crate::spawner::{AdmissionPolicy, InputEvent, SpawnConfig};
    pub use crate::textures::TexturePool;
    pub use crate::time::{Clock, ManualClock, SystemClock};
    pub use crate::tween::Easing;
    pub use crate::viewport::Viewport;
    pub use crate::{Vec2, Vec3};
}
