use crate::overlay::cache::LruCache;
use crate::overlay::error::DecodeError;
use image::imageops::FilterType;
use image::RgbaImage;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// How a source image is mapped onto the overlay rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScalingMode {
    /// Scale to the target box preserving aspect ratio.
    Fit,
    /// Scale to the target box ignoring aspect ratio.
    Stretch,
    /// No scaling; the bitmap is centred by the window.
    Center,
    /// Repeat a scaled base unit across the target area.
    Tile,
}

impl Default for ScalingMode {
    fn default() -> Self {
        ScalingMode::Fit
    }
}

impl std::fmt::Display for ScalingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScalingMode::Fit => write!(f, "Fit to Screen"),
            ScalingMode::Stretch => write!(f, "Stretch to Fill"),
            ScalingMode::Center => write!(f, "Center"),
            ScalingMode::Tile => write!(f, "Tile"),
        }
    }
}

impl ScalingMode {
    pub const ALL: [ScalingMode; 4] = [
        ScalingMode::Fit,
        ScalingMode::Stretch,
        ScalingMode::Center,
        ScalingMode::Tile,
    ];
}

/// Cache key for a scaled still image. The scale factor is keyed by its
/// bit pattern so equal floats always hit the same entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct ImageKey {
    path: PathBuf,
    target: (u32, u32),
    mode: ScalingMode,
    scale_bits: u32,
}

pub(crate) fn scaled_dim(dim: u32, scale: f32) -> u32 {
    ((dim as f32 * scale) as u32).max(1)
}

pub(crate) fn resample_filter(antialias: bool) -> FilterType {
    if antialias {
        FilterType::Lanczos3
    } else {
        FilterType::Nearest
    }
}

/// Loads still images, applies the scaling policy and memoizes the result
/// keyed by (path, target size, mode, scale factor) with LRU eviction.
pub struct CachedImageRenderer {
    cache: LruCache<ImageKey, Arc<RgbaImage>>,
    decodes: u64,
}

impl CachedImageRenderer {
    pub fn new(cache_size: usize) -> Self {
        Self {
            cache: LruCache::new(cache_size),
            decodes: 0,
        }
    }

    /// Number of entries currently cached.
    pub fn cached_entries(&self) -> usize {
        self.cache.len()
    }

    /// How many times a source was actually decoded. Cache hits do not
    /// increment this.
    pub fn decode_count(&self) -> u64 {
        self.decodes
    }

    /// Drop all cached bitmaps.
    pub fn clear(&mut self) {
        self.cache.clear();
    }

    /// Replace the cache with an empty one of the given capacity. Used
    /// when the cache-size setting changes.
    pub fn set_capacity(&mut self, cache_size: usize) {
        self.cache = LruCache::new(cache_size);
    }

    /// Load and scale an image, returning the cached bitmap when one
    /// exists for the same key.
    ///
    /// `Fit` and `Stretch` scale into `target * scale_factor`; `Center`
    /// returns the unscaled decode; `Tile` produces the base tile unit,
    /// the source dimensions multiplied by `scale_factor`. Output
    /// dimensions are clamped to at least 1px in both axes.
    pub fn load(
        &mut self,
        path: &Path,
        target: (u32, u32),
        mode: ScalingMode,
        scale_factor: f32,
        antialias: bool,
    ) -> Result<Arc<RgbaImage>, DecodeError> {
        let key = ImageKey {
            path: path.to_path_buf(),
            target,
            mode,
            scale_bits: scale_factor.to_bits(),
        };
        if let Some(bitmap) = self.cache.get(&key) {
            return Ok(bitmap);
        }

        let decoded = image::open(path).map_err(|source| DecodeError::Unreadable {
            path: path.to_path_buf(),
            source,
        })?;
        self.decodes += 1;
        if decoded.width() == 0 || decoded.height() == 0 {
            return Err(DecodeError::Empty {
                path: path.to_path_buf(),
            });
        }

        let filter = resample_filter(antialias);
        let scaled = match mode {
            ScalingMode::Fit => {
                let w = scaled_dim(target.0, scale_factor);
                let h = scaled_dim(target.1, scale_factor);
                decoded.resize(w, h, filter)
            }
            ScalingMode::Stretch => {
                let w = scaled_dim(target.0, scale_factor);
                let h = scaled_dim(target.1, scale_factor);
                decoded.resize_exact(w, h, filter)
            }
            ScalingMode::Center => decoded,
            ScalingMode::Tile => {
                let w = scaled_dim(decoded.width(), scale_factor);
                let h = scaled_dim(decoded.height(), scale_factor);
                decoded.resize(w, h, filter)
            }
        };

        let bitmap = Arc::new(scaled.into_rgba8());
        self.cache.put(key, bitmap.clone());
        Ok(bitmap)
    }
}

#[cfg(test)]
mod tests {
    use super::{scaled_dim, CachedImageRenderer, ScalingMode};
    use image::RgbaImage;
    use std::path::Path;

    fn write_png(path: &Path, width: u32, height: u32) {
        let img = RgbaImage::from_pixel(width, height, image::Rgba([10, 20, 30, 255]));
        img.save(path).expect("write test png");
    }

    #[test]
    fn degenerate_scale_factors_clamp_to_one_pixel() {
        assert_eq!(scaled_dim(100, 0.001), 1);
        assert_eq!(scaled_dim(1, 0.5), 1);
        assert_eq!(scaled_dim(100, 2.0), 200);
    }

    #[test]
    fn cache_hit_skips_second_decode() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("plain.png");
        write_png(&path, 40, 30);

        let mut renderer = CachedImageRenderer::new(8);
        let first = renderer
            .load(&path, (80, 60), ScalingMode::Fit, 1.0, true)
            .expect("first load");
        assert_eq!(renderer.decode_count(), 1);

        let second = renderer
            .load(&path, (80, 60), ScalingMode::Fit, 1.0, true)
            .expect("second load");
        assert_eq!(renderer.decode_count(), 1);
        assert!(std::sync::Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn fit_with_matching_aspect_fills_the_target_exactly() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("four_three.png");
        write_png(&path, 400, 300);

        let mut renderer = CachedImageRenderer::new(8);
        let bitmap = renderer
            .load(&path, (800, 600), ScalingMode::Fit, 1.0, true)
            .expect("load");
        assert_eq!((bitmap.width(), bitmap.height()), (800, 600));
    }

    #[test]
    fn stretch_ignores_aspect_ratio() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("square.png");
        write_png(&path, 50, 50);

        let mut renderer = CachedImageRenderer::new(8);
        let bitmap = renderer
            .load(&path, (200, 100), ScalingMode::Stretch, 1.0, false)
            .expect("load");
        assert_eq!((bitmap.width(), bitmap.height()), (200, 100));
    }

    #[test]
    fn center_returns_the_unscaled_decode() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("small.png");
        write_png(&path, 33, 21);

        let mut renderer = CachedImageRenderer::new(8);
        let bitmap = renderer
            .load(&path, (800, 600), ScalingMode::Center, 1.0, true)
            .expect("load");
        assert_eq!((bitmap.width(), bitmap.height()), (33, 21));
    }

    #[test]
    fn tile_scales_the_source_not_the_target() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("unit.png");
        write_png(&path, 100, 40);

        let mut renderer = CachedImageRenderer::new(8);
        let bitmap = renderer
            .load(&path, (1920, 1080), ScalingMode::Tile, 0.5, true)
            .expect("load");
        assert_eq!((bitmap.width(), bitmap.height()), (50, 20));
    }

    #[test]
    fn missing_file_is_a_decode_error_not_a_panic() {
        let mut renderer = CachedImageRenderer::new(8);
        let result = renderer.load(
            Path::new("/nonexistent/overlay.png"),
            (100, 100),
            ScalingMode::Fit,
            1.0,
            true,
        );
        assert!(result.is_err());
        assert_eq!(renderer.decode_count(), 0);
    }

    #[test]
    fn eviction_keeps_cache_bounded_across_many_scales() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("many.png");
        write_png(&path, 20, 20);

        let mut renderer = CachedImageRenderer::new(4);
        for i in 1..=10 {
            renderer
                .load(&path, (100, 100), ScalingMode::Fit, i as f32 * 0.1, false)
                .expect("load");
            assert!(renderer.cached_entries() <= 4);
        }
        assert_eq!(renderer.decode_count(), 10);
    }
}
