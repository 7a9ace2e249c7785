//! WGSL sources.

/// Burst point sprites: vertex streams at locations 0..=2, camera at group 0,
/// sprite texture at group 1, [`BurstUniforms`](crate::resources::BurstUniforms)
/// at group 2.
pub const BURST_SHADER: &str = include_str!("shaders/burst.wgsl");

/// Fullscreen Preetham sky reading [`SkyUniforms`](crate::sky::SkyUniforms)
/// at group 0.
pub const SKY_SHADER: &str = include_str!("shaders/sky.wgsl");
