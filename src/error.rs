//! Error types for skyburst.
//!
//! Burst-level errors are recoverable: a failed spawn is a dropped input
//! event, never a crashed render loop. Setup errors (window, GPU, config)
//! surface from [`crate::run`] and end the program.

use thiserror::Error;

use crate::scene::BurstId;

/// Errors raised while sampling, building, or launching a burst.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BurstError {
    /// A burst needs at least one particle.
    #[error("particle count must be at least 1, got {0}")]
    InvalidParticleCount(u32),
    /// The spread radius must be finite and strictly positive.
    #[error("burst radius must be finite and positive, got {0}")]
    InvalidRadius(f32),
    /// The animation duration must be finite and strictly positive.
    #[error("burst duration must be finite and positive, got {0}s")]
    InvalidDuration(f32),
    /// The base point size must be finite and non-negative.
    #[error("burst size must be finite and non-negative, got {0}")]
    InvalidSize(f32),
    /// The texture index does not address the texture pool.
    #[error("texture index {index} is out of range for a pool of {len}")]
    TextureOutOfRange { index: usize, len: usize },
    /// GPU buffer allocation failed.
    #[error("failed to allocate burst resources: {0}")]
    Allocation(String),
    /// The id is not registered in the scene.
    #[error("{0} is not registered in the scene")]
    UnknownBurst(BurstId),
    /// The id has already been launched.
    #[error("{0} has already been launched")]
    AlreadyLaunched(BurstId),
}

/// Reasons a spawn attempt is dropped.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SpawnError {
    /// Building or launching the burst failed.
    #[error(transparent)]
    Burst(#[from] BurstError),
    /// The admission policy refused a new burst.
    #[error("admission refused: {active} bursts active, limit is {max}")]
    Rejected { active: usize, max: usize },
    /// There is no texture to pick from.
    #[error("the texture pool is empty")]
    EmptyTexturePool,
}

/// Errors that can occur during texture loading.
#[derive(Debug, Error)]
pub enum TextureError {
    /// Failed to decode or open an image file.
    #[error("failed to load texture '{path}': {source}")]
    ImageLoad {
        path: String,
        #[source]
        source: image::ImageError,
    },
    /// RGBA payload does not match the declared dimensions.
    #[error("RGBA data is {actual} bytes, expected {expected} for {width}x{height}")]
    SizeMismatch {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },
}

/// Errors that can occur during GPU initialization.
#[derive(Debug, Error)]
pub enum GpuError {
    /// Failed to create a surface for rendering.
    #[error("failed to create GPU surface: {0}")]
    SurfaceCreation(#[from] wgpu::CreateSurfaceError),
    /// No compatible GPU adapter found.
    #[error("no compatible GPU adapter found; a GPU with WebGPU/Vulkan/Metal/DX12 support is required")]
    NoAdapter,
    /// Failed to create GPU device.
    #[error("failed to create GPU device: {0}")]
    DeviceCreation(#[from] wgpu::RequestDeviceError),
}

/// Errors raised while reading a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config '{path}': {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

/// Errors that end the application.
#[derive(Debug, Error)]
pub enum AppError {
    /// Failed to create or run the event loop.
    #[error("event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),
    /// Failed to create the window.
    #[error("failed to create window: {0}")]
    Window(#[from] winit::error::OsError),
    /// GPU initialization failed.
    #[error("GPU error: {0}")]
    Gpu(#[from] GpuError),
    /// A particle texture could not be loaded.
    #[error(transparent)]
    Texture(#[from] TextureError),
    /// The configuration file is unreadable.
    #[error(transparent)]
    Config(#[from] ConfigError),
}
