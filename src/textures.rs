//! Particle sprite textures.
//!
//! Bursts sample a shared, read-only [`TexturePool`]. Only the red channel
//! matters: the burst shader uses it as sprite alpha and takes color from the
//! burst. Textures load from image files or are generated procedurally.
//!
//! ```ignore
//! let pool = TexturePool::from_files(&["particles/1.png", "particles/2.png"])?;
//! // or
//! let pool = TexturePool::procedural(8, 64);
//! ```

use std::ops::Index;
use std::path::Path;
use std::sync::Arc;

use crate::error::TextureError;

/// One RGBA8 sprite.
#[derive(Debug, Clone)]
pub struct SpriteTexture {
    /// Raw RGBA pixel data (width * height * 4 bytes).
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl SpriteTexture {
    /// Create a texture from raw RGBA data.
    ///
    /// # Errors
    ///
    /// [`TextureError::SizeMismatch`] if `data` is not `width * height * 4`
    /// bytes.
    pub fn from_rgba(data: Vec<u8>, width: u32, height: u32) -> Result<Self, TextureError> {
        let expected = rgba_len(width, height);
        if data.len() != expected {
            return Err(TextureError::SizeMismatch {
                width,
                height,
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
        })
    }

    /// Load a texture from a PNG or JPEG file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, TextureError> {
        let path = path.as_ref();
        let img = image::open(path)
            .map_err(|source| TextureError::ImageLoad {
                path: path.display().to_string(),
                source,
            })?
            .into_rgba8();
        let (width, height) = img.dimensions();
        Self::from_rgba(img.into_raw(), width, height)
    }

    /// Build a square grayscale sprite from an intensity function.
    ///
    /// `f` receives coordinates in `[-1, 1]` with the center at the origin
    /// and returns an intensity in `[0, 1]`.
    pub fn from_fn(size: u32, f: impl Fn(f32, f32) -> f32) -> Self {
        let size = size.max(1);
        let mut data = Vec::with_capacity(rgba_len(size, size));
        for y in 0..size {
            for x in 0..size {
                let u = (x as f32 + 0.5) / size as f32 * 2.0 - 1.0;
                let v = (y as f32 + 0.5) / size as f32 * 2.0 - 1.0;
                let i = (f(u, v).clamp(0.0, 1.0) * 255.0).round() as u8;
                data.extend_from_slice(&[i, i, i, 255]);
            }
        }
        Self {
            data,
            width: size,
            height: size,
        }
    }

    /// One of eight built-in sprite shapes, selected by `variant % 8`.
    pub fn procedural(variant: usize, size: u32) -> Self {
        match variant % 8 {
            0 => Self::from_fn(size, |u, v| soft_disc(u, v, 4.0)),
            1 => Self::from_fn(size, |u, v| smoothstep(0.55, 0.45, radius(u, v))),
            2 => Self::from_fn(size, |u, v| ring(radius(u, v), 0.6, 0.12)),
            3 => Self::from_fn(size, |u, v| star(u, v, 4)),
            4 => Self::from_fn(size, |u, v| star(u, v, 6)),
            5 => Self::from_fn(size, |u, v| {
                let core = soft_disc(u, v, 12.0);
                let bar = |a: f32, b: f32| (1.0 - a.abs() * 12.0).max(0.0) * (1.0 - b.abs());
                core.max(bar(u, v)).max(bar(v, u))
            }),
            6 => Self::from_fn(size, |u, v| {
                let r = radius(u, v);
                ring(r, 0.75, 0.08).max(ring(r, 0.35, 0.08))
            }),
            _ => {
                let seed = size;
                let s = size.max(1) as f32;
                Self::from_fn(size, move |u, v| {
                    let x = ((u + 1.0) * 0.5 * s) as u32;
                    let y = ((v + 1.0) * 0.5 * s) as u32;
                    let n = hash_noise(x, y, seed) as f32 / 255.0;
                    soft_disc(u, v, 3.0) * (0.4 + 0.6 * n)
                })
            }
        }
    }
}

/// Ordered, index-addressable set of sprites shared by every burst.
///
/// Cloning is cheap; clones share the same textures.
#[derive(Debug, Clone)]
pub struct TexturePool {
    textures: Arc<[SpriteTexture]>,
}

impl TexturePool {
    pub fn new(textures: Vec<SpriteTexture>) -> Self {
        Self {
            textures: textures.into(),
        }
    }

    /// Load one texture per path, in order.
    pub fn from_files<P: AsRef<Path>>(paths: &[P]) -> Result<Self, TextureError> {
        let textures = paths
            .iter()
            .map(SpriteTexture::from_file)
            .collect::<Result<Vec<_>, _>>()?;
        log::info!("loaded {} particle textures", textures.len());
        Ok(Self::new(textures))
    }

    /// `count` built-in sprites of `size` x `size` pixels.
    pub fn procedural(count: usize, size: u32) -> Self {
        Self::new(
            (0..count)
                .map(|i| SpriteTexture::procedural(i, size))
                .collect(),
        )
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.textures.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&SpriteTexture> {
        self.textures.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SpriteTexture> {
        self.textures.iter()
    }
}

impl Index<usize> for TexturePool {
    type Output = SpriteTexture;

    fn index(&self, index: usize) -> &SpriteTexture {
        &self.textures[index]
    }
}

fn radius(u: f32, v: f32) -> f32 {
    (u * u + v * v).sqrt()
}

fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Gaussian falloff, zero at the sprite edge.
fn soft_disc(u: f32, v: f32, sharpness: f32) -> f32 {
    let r = radius(u, v);
    (-(r * r) * sharpness).exp() * smoothstep(1.0, 0.9, r)
}

fn ring(r: f32, center: f32, width: f32) -> f32 {
    (1.0 - ((r - center) / width).abs()).max(0.0)
}

fn star(u: f32, v: f32, points: u32) -> f32 {
    let r = radius(u, v);
    let angle = v.atan2(u);
    let spikes = (angle * points as f32 * 0.5).cos().abs().powf(8.0);
    let reach = 0.25 + 0.75 * spikes;
    soft_disc(u, v, 10.0).max(smoothstep(reach, reach * 0.5, r) * (1.0 - r))
}

/// Simple hash-based noise function.
fn hash_noise(x: u32, y: u32, seed: u32) -> u8 {
    let mut n = x
        .wrapping_mul(374761393)
        .wrapping_add(y.wrapping_mul(668265263))
        .wrapping_add(seed.wrapping_mul(1013904223));
    n = (n ^ (n >> 13)).wrapping_mul(1274126177);
    n ^= n >> 16;
    (n & 255) as u8
}

/// Byte length of an RGBA8 image.
fn rgba_len(width: u32, height: u32) -> usize {
    width as usize * height as usize * 4
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_rgba_checks_size() {
        assert!(SpriteTexture::from_rgba(vec![0; 16], 2, 2).is_ok());
        let err = SpriteTexture::from_rgba(vec![0; 15], 2, 2).unwrap_err();
        assert!(matches!(
            err,
            TextureError::SizeMismatch {
                expected: 16,
                actual: 15,
                ..
            }
        ));
    }

    #[test]
    #[cfg(target_pointer_width = "64")]
    fn test_rgba_len_does_not_wrap() {
        assert_eq!(rgba_len(32768, 32768), 4_294_967_296usize);
        assert_eq!(rgba_len(u32::MAX, 1), u32::MAX as usize * 4);
    }

    #[test]
    fn test_missing_file() {
        let err = SpriteTexture::from_file("does/not/exist.png").unwrap_err();
        assert!(matches!(err, TextureError::ImageLoad { .. }));
    }

    #[test]
    fn test_procedural_sprites_fade_to_edges() {
        for variant in 0..8 {
            let tex = SpriteTexture::procedural(variant, 32);
            assert_eq!(tex.data.len(), 32 * 32 * 4);
            // Corner pixel is outside every shape.
            assert!(tex.data[0] < 16, "variant {variant} corner {}", tex.data[0]);
            assert!(tex.data.iter().step_by(4).any(|&r| r > 128), "variant {variant}");
        }
    }

    #[test]
    fn test_pool_is_shared() {
        let pool = TexturePool::procedural(8, 8);
        let clone = pool.clone();
        assert_eq!(pool.len(), 8);
        assert!(std::ptr::eq(&pool[3], &clone[3]));
        assert!(pool.get(8).is_none());
    }
}
