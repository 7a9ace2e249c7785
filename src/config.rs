//! Application configuration.
//!
//! Every field has a default, so a config file only needs the values it
//! changes:
//!
//! ```toml
//! [window]
//! title = "Fireworks"
//!
//! [burst]
//! duration = 2.5
//! easing = "quad_out"
//! admission = { mode = "evict_oldest", max = 40 }
//!
//! [spawn]
//! max_count = 2000
//!
//! [sky]
//! elevation = 2.0
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::camera::CameraConfig;
use crate::error::ConfigError;
use crate::lifecycle::DEFAULT_DURATION;
use crate::sky::SkyParameters;
use crate::spawner::{AdmissionPolicy, SpawnConfig};
use crate::tween::Easing;

/// Environment variable naming a config file.
pub const CONFIG_ENV: &str = "SKYBURST_CONFIG";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    /// Logical width.
    pub width: u32,
    /// Logical height.
    pub height: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "skyburst".to_string(),
            width: 1280,
            height: 720,
        }
    }
}

/// Burst lifetime settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BurstConfig {
    /// Seconds from launch to destruction.
    pub duration: f32,
    pub easing: Easing,
    pub admission: AdmissionPolicy,
}

impl Default for BurstConfig {
    fn default() -> Self {
        Self {
            duration: DEFAULT_DURATION,
            easing: Easing::Linear,
            admission: AdmissionPolicy::Unbounded,
        }
    }
}

/// Where particle textures come from.
///
/// Listed files are loaded in order; with no files, `procedural_count`
/// built-in sprites are generated instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextureSourceConfig {
    pub paths: Vec<PathBuf>,
    pub procedural_count: usize,
    pub procedural_size: u32,
}

impl Default for TextureSourceConfig {
    fn default() -> Self {
        Self {
            paths: Vec::new(),
            procedural_count: 8,
            procedural_size: 64,
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FireworksConfig {
    pub window: WindowConfig,
    pub burst: BurstConfig,
    pub spawn: SpawnConfig,
    pub textures: TextureSourceConfig,
    pub sky: SkyParameters,
    pub camera: CameraConfig,
}

impl FireworksConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a TOML config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&text, &path.display().to_string())
    }

    /// Parse TOML text. `origin` names the source in error messages.
    pub fn parse(text: &str, origin: &str) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: origin.to_string(),
            source,
        })
    }

    /// Load from `path`, falling back to [`CONFIG_ENV`], then to defaults.
    pub fn resolve(path: Option<PathBuf>) -> Result<Self, ConfigError> {
        match path.or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from)) {
            Some(path) => {
                log::info!("loading config from {}", path.display());
                Self::load(path)
            }
            None => Ok(Self::default()),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.window.title = title.into();
        self
    }

    pub fn with_window_size(mut self, width: u32, height: u32) -> Self {
        self.window.width = width;
        self.window.height = height;
        self
    }

    pub fn with_duration(mut self, seconds: f32) -> Self {
        self.burst.duration = seconds;
        self
    }

    pub fn with_easing(mut self, easing: Easing) -> Self {
        self.burst.easing = easing;
        self
    }

    pub fn with_admission(mut self, admission: AdmissionPolicy) -> Self {
        self.burst.admission = admission;
        self
    }

    pub fn with_spawn(mut self, spawn: SpawnConfig) -> Self {
        self.spawn = spawn;
        self
    }

    /// Add a particle texture file. Files replace the procedural sprites.
    pub fn with_texture(mut self, path: impl Into<PathBuf>) -> Self {
        self.textures.paths.push(path.into());
        self
    }

    pub fn with_sky(mut self, sky: SkyParameters) -> Self {
        self.sky = sky;
        self
    }

    pub fn with_camera(mut self, camera: CameraConfig) -> Self {
        self.camera = camera;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_is_default() {
        let config = FireworksConfig::parse("", "inline").unwrap();
        assert_eq!(config, FireworksConfig::default());
        assert_eq!(config.burst.duration, 3.0);
        assert_eq!(config.textures.procedural_count, 8);
        assert_eq!(config.camera.fov_degrees, 25.0);
    }

    #[test]
    fn test_partial_sections() {
        let config = FireworksConfig::parse(
            r#"
            [burst]
            duration = 2.5
            easing = "quad_out"
            admission = { mode = "reject", max = 16 }

            [spawn]
            max_count = 2000

            [sky]
            elevation = 4.0
            "#,
            "inline",
        )
        .unwrap();

        assert_eq!(config.burst.duration, 2.5);
        assert_eq!(config.burst.easing, Easing::QuadOut);
        assert_eq!(config.burst.admission, AdmissionPolicy::Reject { max: 16 });
        assert_eq!(config.spawn.max_count, 2000);
        assert_eq!(config.spawn.min_count, 400);
        assert_eq!(config.sky.elevation, 4.0);
        assert_eq!(config.sky.turbidity, 10.0);
    }

    #[test]
    fn test_parse_error_names_source() {
        let err = FireworksConfig::parse("[burst]\nduration = \"long\"", "fireworks.toml")
            .unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("fireworks.toml"));
    }

    #[test]
    fn test_missing_file() {
        let err = FireworksConfig::load("/nonexistent/skyburst.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_builders() {
        let config = FireworksConfig::new()
            .with_title("show")
            .with_window_size(800, 600)
            .with_duration(1.0)
            .with_texture("a.png")
            .with_texture("b.png");
        assert_eq!(config.window.title, "show");
        assert_eq!(config.window.width, 800);
        assert_eq!(config.burst.duration, 1.0);
        assert_eq!(config.textures.paths.len(), 2);
    }

    #[test]
    fn test_round_trips_through_toml() {
        let config = FireworksConfig::new()
            .with_admission(AdmissionPolicy::EvictOldest { max: 5 })
            .with_easing(Easing::CubicOut);
        let text = toml::to_string(&config).unwrap();
        assert_eq!(FireworksConfig::parse(&text, "inline").unwrap(), config);
    }
}
