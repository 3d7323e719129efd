use crate::overlay::cache::LruCache;
use crate::overlay::error::DecodeError;
use crate::overlay::renderer::{resample_filter, scaled_dim};
use image::codecs::gif::GifDecoder;
use image::{imageops, AnimationDecoder, RgbaImage};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Lower bound on the playback tick, matching the historical behaviour of
/// clamping pathological zero/near-zero GIF frame delays.
pub const MIN_FRAME_DELAY: Duration = Duration::from_millis(20);

#[derive(Debug)]
pub struct AnimationFrame {
    pub bitmap: Arc<RgbaImage>,
    /// Native delay adjusted by the playback speed percentage.
    pub delay: Duration,
}

/// A fully decoded animated source. Frames are decoded once up front;
/// per-scale bitmaps come out of the [`FrameCache`].
#[derive(Debug)]
pub struct Animation {
    frames: Vec<AnimationFrame>,
}

impl Animation {
    /// Decode all frames of a GIF, rescaling delays by `speed_percent`
    /// (100 = native speed, 200 = twice as fast).
    pub fn load(path: &Path, speed_percent: u32) -> Result<Self, DecodeError> {
        let file = File::open(path).map_err(|err| DecodeError::Unreadable {
            path: path.to_path_buf(),
            source: image::ImageError::IoError(err),
        })?;
        let decoder =
            GifDecoder::new(BufReader::new(file)).map_err(|source| DecodeError::Unreadable {
                path: path.to_path_buf(),
                source,
            })?;
        let frames = decoder
            .into_frames()
            .collect_frames()
            .map_err(|source| DecodeError::Unreadable {
                path: path.to_path_buf(),
                source,
            })?;
        if frames.is_empty() {
            return Err(DecodeError::NoFrames {
                path: path.to_path_buf(),
            });
        }

        let speed = speed_percent.max(1);
        let frames = frames
            .into_iter()
            .map(|frame| {
                let (numer, denom) = frame.delay().numer_denom_ms();
                let native_ms = numer as u64 / denom.max(1) as u64;
                let adjusted_ms = native_ms * 100 / speed as u64;
                AnimationFrame {
                    bitmap: Arc::new(frame.into_buffer()),
                    delay: Duration::from_millis(adjusted_ms),
                }
            })
            .collect();
        Ok(Self { frames })
    }

    #[cfg(test)]
    pub(crate) fn from_frames(frames: Vec<AnimationFrame>) -> Self {
        Self { frames }
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn frame(&self, index: usize) -> &AnimationFrame {
        &self.frames[index % self.frames.len()]
    }

    /// Dimensions of the first frame.
    pub fn frame_size(&self) -> (u32, u32) {
        let first = &self.frames[0].bitmap;
        (first.width(), first.height())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct FrameKey {
    index: usize,
    scale_bits: u32,
}

/// Per-frame, per-scale bitmap cache with the same LRU discipline as the
/// still-image renderer. Frame scaling always preserves aspect ratio.
#[derive(Debug)]
pub struct FrameCache {
    cache: LruCache<FrameKey, Arc<RgbaImage>>,
    scale_ops: u64,
}

impl FrameCache {
    pub fn new(cache_size: usize) -> Self {
        Self {
            cache: LruCache::new(cache_size),
            scale_ops: 0,
        }
    }

    /// How many times a frame was actually rescaled. After one full loop
    /// at a fixed scale this stops growing.
    pub fn scale_count(&self) -> u64 {
        self.scale_ops
    }

    pub fn cached_entries(&self) -> usize {
        self.cache.len()
    }

    pub fn clear(&mut self) {
        self.cache.clear();
    }

    /// Return the frame scaled by `scale`, from cache when possible. A
    /// scale of 1.0 shares the raw bitmap without copying.
    pub fn get(
        &mut self,
        index: usize,
        scale: f32,
        raw: &Arc<RgbaImage>,
        antialias: bool,
    ) -> Arc<RgbaImage> {
        let key = FrameKey {
            index,
            scale_bits: scale.to_bits(),
        };
        if let Some(bitmap) = self.cache.get(&key) {
            return bitmap;
        }

        let bitmap = if scale == 1.0 {
            raw.clone()
        } else {
            let w = scaled_dim(raw.width(), scale);
            let h = scaled_dim(raw.height(), scale);
            Arc::new(imageops::resize(
                raw.as_ref(),
                w,
                h,
                resample_filter(antialias),
            ))
        };
        self.scale_ops += 1;
        self.cache.put(key, bitmap.clone());
        bitmap
    }
}

/// Drives frame advancement. Ticks fire at `max(native delay, 20ms)` and
/// only while the overlay is visible; while suspended no decode or scale
/// work happens and resuming continues from the frame that was showing.
#[derive(Debug)]
pub struct FramePlayer {
    current: usize,
    frame_count: usize,
    next_due: Option<Instant>,
}

impl FramePlayer {
    pub fn new(frame_count: usize) -> Self {
        Self {
            current: 0,
            frame_count: frame_count.max(1),
            next_due: None,
        }
    }

    pub fn current_frame(&self) -> usize {
        self.current
    }

    pub fn is_running(&self) -> bool {
        self.next_due.is_some()
    }

    /// Interval until the next advance for the frame currently showing.
    pub fn interval(&self, animation: &Animation) -> Duration {
        animation.frame(self.current).delay.max(MIN_FRAME_DELAY)
    }

    /// Start or resume playback without skipping the current frame.
    pub fn resume(&mut self, now: Instant, animation: &Animation) {
        if self.next_due.is_none() {
            self.next_due = Some(now + self.interval(animation));
        }
    }

    /// Stop ticking entirely; called when the overlay is hidden.
    pub fn suspend(&mut self) {
        self.next_due = None;
    }

    /// Advance if the current frame's interval elapsed. Returns true when
    /// the displayed frame changed. Does nothing while suspended.
    pub fn tick(&mut self, now: Instant, animation: &Animation) -> bool {
        let Some(due) = self.next_due else {
            return false;
        };
        if now < due {
            return false;
        }
        self.current = (self.current + 1) % self.frame_count;
        self.next_due = Some(now + self.interval(animation));
        true
    }
}

#[cfg(test)]
mod tests {
    use super::{Animation, AnimationFrame, FrameCache, FramePlayer, MIN_FRAME_DELAY};
    use image::RgbaImage;
    use std::sync::Arc;
    use std::time::{Duration, Instant};

    fn test_animation(frame_count: usize, delay_ms: u64) -> Animation {
        let frames = (0..frame_count)
            .map(|i| AnimationFrame {
                bitmap: Arc::new(RgbaImage::from_pixel(
                    8,
                    4,
                    image::Rgba([i as u8, 0, 0, 255]),
                )),
                delay: Duration::from_millis(delay_ms),
            })
            .collect();
        Animation::from_frames(frames)
    }

    #[test]
    fn frame_cache_hits_saturate_after_one_loop() {
        let animation = test_animation(4, 50);
        let mut cache = FrameCache::new(16);

        for loop_pass in 0..3 {
            for i in 0..animation.frame_count() {
                cache.get(i, 0.5, &animation.frame(i).bitmap, true);
            }
            if loop_pass == 0 {
                assert_eq!(cache.scale_count(), 4);
            }
        }
        // every later loop is a pure cache hit
        assert_eq!(cache.scale_count(), 4);
    }

    #[test]
    fn frame_scaling_preserves_aspect_ratio() {
        let animation = test_animation(1, 50);
        let mut cache = FrameCache::new(4);
        let scaled = cache.get(0, 0.5, &animation.frame(0).bitmap, false);
        assert_eq!((scaled.width(), scaled.height()), (4, 2));
    }

    #[test]
    fn unit_scale_shares_the_raw_bitmap() {
        let animation = test_animation(1, 50);
        let mut cache = FrameCache::new(4);
        let scaled = cache.get(0, 1.0, &animation.frame(0).bitmap, true);
        assert!(Arc::ptr_eq(&scaled, &animation.frame(0).bitmap));
    }

    #[test]
    fn player_does_not_advance_while_suspended() {
        let animation = test_animation(3, 30);
        let mut player = FramePlayer::new(animation.frame_count());
        let start = Instant::now();

        player.resume(start, &animation);
        assert!(player.tick(start + Duration::from_millis(31), &animation));
        assert_eq!(player.current_frame(), 1);

        player.suspend();
        assert!(!player.tick(start + Duration::from_secs(10), &animation));
        assert_eq!(player.current_frame(), 1);
    }

    #[test]
    fn resume_continues_from_the_current_frame() {
        let animation = test_animation(3, 30);
        let mut player = FramePlayer::new(animation.frame_count());
        let start = Instant::now();

        player.resume(start, &animation);
        player.tick(start + Duration::from_millis(31), &animation);
        player.suspend();

        let later = start + Duration::from_secs(5);
        player.resume(later, &animation);
        assert_eq!(player.current_frame(), 1);
        // the freshly re-armed interval has not elapsed yet
        assert!(!player.tick(later + Duration::from_millis(10), &animation));
        assert!(player.tick(later + Duration::from_millis(31), &animation));
        assert_eq!(player.current_frame(), 2);
    }

    #[test]
    fn tick_interval_is_clamped_to_the_minimum() {
        let animation = test_animation(2, 1);
        let player = FramePlayer::new(animation.frame_count());
        assert_eq!(player.interval(&animation), MIN_FRAME_DELAY);
    }

    #[test]
    fn playback_wraps_around_the_frame_list() {
        let animation = test_animation(2, 30);
        let mut player = FramePlayer::new(animation.frame_count());
        let mut now = Instant::now();
        player.resume(now, &animation);

        for expected in [1usize, 0, 1, 0] {
            now += Duration::from_millis(31);
            assert!(player.tick(now, &animation));
            assert_eq!(player.current_frame(), expected);
        }
    }
}
