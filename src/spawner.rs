//! Burst spawning from user input.
//!
//! A click becomes a [`BurstParams`]: the click position mapped to normalized
//! device coordinates is the origin, and everything else is drawn at random
//! from the ranges in [`SpawnConfig`].
//!
//! | Parameter | Default range |
//! |-----------|---------------|
//! | particle count | `[400, 1400]`, rounded |
//! | base size | `[0.1, 0.2)` |
//! | texture | uniform over the pool |
//! | radius | `[0.5, 1.5)` |
//! | color | random hue, saturation 1, lightness 0.7 |

use glam::{Vec2, Vec3};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::burst::BurstParams;
use crate::color::hsl_to_rgb;
use crate::error::{BurstError, SpawnError};
use crate::viewport::Viewport;

/// Random ranges for spawned bursts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnConfig {
    pub min_count: u32,
    pub max_count: u32,
    pub min_size: f32,
    pub max_size: f32,
    pub min_radius: f32,
    pub max_radius: f32,
    pub saturation: f32,
    pub lightness: f32,
}

impl Default for SpawnConfig {
    fn default() -> Self {
        Self {
            min_count: 400,
            max_count: 1400,
            min_size: 0.1,
            max_size: 0.2,
            min_radius: 0.5,
            max_radius: 1.5,
            saturation: 1.0,
            lightness: 0.7,
        }
    }
}

/// How many bursts may animate at once.
///
/// The default places no limit on concurrent bursts, so rapid input can pile
/// up an unbounded number of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum AdmissionPolicy {
    /// Accept every spawn.
    #[default]
    Unbounded,
    /// Drop new spawns while `max` bursts are animating.
    Reject { max: usize },
    /// Destroy the oldest bursts to keep at most `max` animating.
    EvictOldest { max: usize },
}

/// A click or tap in logical viewport pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InputEvent {
    pub position: Vec2,
}

impl InputEvent {
    pub fn click(x: f32, y: f32) -> Self {
        Self {
            position: Vec2::new(x, y),
        }
    }
}

/// Maps input events to burst parameters.
#[derive(Debug, Clone, Default)]
pub struct BurstSpawner {
    config: SpawnConfig,
}

impl BurstSpawner {
    pub fn new(config: SpawnConfig) -> Self {
        Self { config }
    }

    #[inline]
    pub fn config(&self) -> &SpawnConfig {
        &self.config
    }

    /// Parameters for a burst at the clicked position.
    ///
    /// # Errors
    ///
    /// [`SpawnError::EmptyTexturePool`] if there is no texture to pick.
    pub fn params_from_input<R: Rng>(
        &self,
        rng: &mut R,
        event: &InputEvent,
        viewport: &Viewport,
        texture_count: usize,
    ) -> Result<BurstParams, SpawnError> {
        self.params_at(rng, viewport.to_ndc(event.position), texture_count)
    }

    /// Parameters for a burst centered at `origin`.
    ///
    /// # Errors
    ///
    /// [`SpawnError::EmptyTexturePool`] for an empty pool, and
    /// [`BurstError::InvalidSize`] or [`BurstError::InvalidRadius`] when a
    /// configured range can't be sampled.
    pub fn params_at<R: Rng>(
        &self,
        rng: &mut R,
        origin: Vec3,
        texture_count: usize,
    ) -> Result<BurstParams, SpawnError> {
        if texture_count == 0 {
            return Err(SpawnError::EmptyTexturePool);
        }
        let c = &self.config;

        let count_spread = c.max_count.saturating_sub(c.min_count) as f32;
        let count = (c.min_count as f32 + rng.gen::<f32>() * count_spread).round() as u32;
        let base_size = draw(rng, c.min_size, c.max_size).map_err(BurstError::InvalidSize)?;
        let texture = rng.gen_range(0..texture_count);
        let radius = draw(rng, c.min_radius, c.max_radius).map_err(BurstError::InvalidRadius)?;
        let color = hsl_to_rgb(rng.gen::<f32>(), c.saturation, c.lightness);

        Ok(BurstParams {
            origin,
            count,
            base_size,
            texture,
            radius,
            color,
        })
    }
}

/// Uniform draw from `[min, max)`, or `min` for an empty range.
///
/// Fails with the offending value when a bound or the span is not finite.
fn draw<R: Rng>(rng: &mut R, min: f32, max: f32) -> Result<f32, f32> {
    if !min.is_finite() {
        return Err(min);
    }
    if !max.is_finite() {
        return Err(max);
    }
    if max <= min {
        return Ok(min);
    }
    let span = max - min;
    if !span.is_finite() {
        return Err(span);
    }
    Ok(rng.gen_range(min..max))
}
