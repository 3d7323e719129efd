use crate::hotkey::{parse_hotkey, Hotkey, Key};
use crate::overlay::error::InputValidationError;
use crate::overlay::renderer::ScalingMode;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const SCALE_STEP: f32 = 0.1;
pub const MIN_SCALE: f32 = 0.1;
pub const MAX_SCALE: f32 = 10.0;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Settings {
    /// Absolute path of the image or GIF currently shown. `None` until the
    /// user picks one.
    pub image_path: Option<PathBuf>,
    #[serde(default)]
    pub scaling_mode: ScalingMode,
    /// Index into the display list. Out-of-range values fall back to the
    /// primary display at show time.
    #[serde(default)]
    pub display_index: usize,
    /// Last overlay position, restored on the next show.
    #[serde(default)]
    pub window_pos: Option<(i32, i32)>,
    /// Last overlay size when resized in edit mode.
    #[serde(default)]
    pub window_size: Option<(u32, u32)>,
    #[serde(rename = "global_hotkey", default = "default_overlay_hotkey")]
    pub hotkey: Option<String>,
    /// Whole-window paint opacity, 0.0 (invisible) to 1.0 (opaque).
    #[serde(default = "default_opacity")]
    pub opacity: f32,
    /// GIF playback speed in percent of native, 100 = as authored.
    #[serde(default = "default_gif_speed")]
    pub gif_speed: u32,
    /// When enabled the application initialises the logger at debug level.
    #[serde(default)]
    pub debug_logging: bool,
    #[serde(rename = "advanced_settings", default)]
    pub advanced: AdvancedSettings,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct AdvancedSettings {
    #[serde(rename = "enable_hardware_acceleration", default = "default_true")]
    pub hardware_acceleration: bool,
    /// Extra repaint interval in milliseconds. `0` repaints on demand only.
    #[serde(default)]
    pub update_interval: u32,
    #[serde(default = "default_unit_scale")]
    pub tile_scale: f32,
    #[serde(default = "default_cache_size")]
    pub cache_size: usize,
    /// Soft memory ceiling in MiB. Persisted for the settings dialog; the
    /// entry-count bound is what the caches actually enforce.
    #[serde(default = "default_max_memory")]
    pub max_memory_usage: usize,
    #[serde(rename = "enable_antialiasing", default = "default_true")]
    pub antialiasing: bool,
    /// Alpha of the background fill behind the image, 0 (clear) to 255.
    #[serde(default)]
    pub transparency: u8,
    #[serde(default = "default_background_color")]
    pub background_color: String,
    #[serde(default = "default_true")]
    pub enable_scale_limits: bool,
    #[serde(default = "default_unit_scale")]
    pub scale_factor: f32,
}

fn default_true() -> bool {
    true
}

fn default_unit_scale() -> f32 {
    1.0
}

fn default_cache_size() -> usize {
    100
}

fn default_max_memory() -> usize {
    512
}

fn default_background_color() -> String {
    "#000000".to_string()
}

fn default_gif_speed() -> u32 {
    100
}

fn default_opacity() -> f32 {
    1.0
}

fn default_overlay_hotkey() -> Option<String> {
    Some("ctrl+alt+o".into())
}

impl Default for AdvancedSettings {
    fn default() -> Self {
        Self {
            hardware_acceleration: true,
            update_interval: 0,
            tile_scale: 1.0,
            cache_size: default_cache_size(),
            max_memory_usage: default_max_memory(),
            antialiasing: true,
            transparency: 0,
            background_color: default_background_color(),
            enable_scale_limits: true,
            scale_factor: 1.0,
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            image_path: None,
            scaling_mode: ScalingMode::default(),
            display_index: 0,
            window_pos: None,
            window_size: None,
            hotkey: default_overlay_hotkey(),
            opacity: default_opacity(),
            gif_speed: default_gif_speed(),
            debug_logging: false,
            advanced: AdvancedSettings::default(),
        }
    }
}

impl Settings {
    /// Read the settings file. A missing or unparseable file yields the
    /// defaults; startup is never blocked on persistence.
    pub fn load(path: &str) -> Self {
        let content = std::fs::read_to_string(path).unwrap_or_default();
        if content.is_empty() {
            return Self::default();
        }
        match serde_json::from_str(&content) {
            Ok(settings) => settings,
            Err(err) => {
                tracing::warn!("settings file {path} is unreadable, using defaults: {err}");
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &str) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn hotkey(&self) -> Hotkey {
        if let Some(hotkey) = &self.hotkey {
            match parse_hotkey(hotkey) {
                Some(k) => return k,
                None => {
                    tracing::warn!(
                        "provided hotkey string '{}' is invalid; using default ctrl+alt+o",
                        hotkey
                    );
                }
            }
        }
        Hotkey {
            key: Key::KeyO,
            ctrl: true,
            shift: false,
            alt: true,
            win: false,
        }
    }
}

/// Immutable snapshot of every setting that affects rendering. Components
/// compare `version` against the one they last rendered with instead of
/// reaching into mutable shared state.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderConfig {
    pub version: u64,
    pub scaling_mode: ScalingMode,
    pub scale_factor: f32,
    pub tile_scale: f32,
    pub antialiasing: bool,
    /// Whole-window paint opacity, 0.0 to 1.0.
    pub opacity: f32,
    /// Alpha of the background fill behind the image.
    pub transparency: u8,
    pub background_color: [u8; 3],
    pub enable_scale_limits: bool,
    pub gif_speed: u32,
    pub cache_size: usize,
    pub update_interval: u32,
}

impl RenderConfig {
    pub fn from_settings(settings: &Settings, version: u64) -> Self {
        Self {
            version,
            scaling_mode: settings.scaling_mode,
            scale_factor: settings.advanced.scale_factor,
            tile_scale: settings.advanced.tile_scale,
            antialiasing: settings.advanced.antialiasing,
            opacity: settings.opacity.clamp(0.0, 1.0),
            transparency: settings.advanced.transparency,
            background_color: parse_color(&settings.advanced.background_color)
                .unwrap_or([0, 0, 0]),
            enable_scale_limits: settings.advanced.enable_scale_limits,
            gif_speed: settings.gif_speed,
            cache_size: settings.advanced.cache_size,
            update_interval: settings.advanced.update_interval,
        }
    }
}

/// A single edit coming out of the settings dialog.
#[derive(Debug, Clone, PartialEq)]
pub enum SettingChange {
    ImagePath(Option<PathBuf>),
    ScalingMode(ScalingMode),
    DisplayIndex(usize),
    HardwareAcceleration(bool),
    UpdateInterval(u32),
    TileScale(f32),
    CacheSize(usize),
    MaxMemoryUsage(usize),
    Antialiasing(bool),
    Opacity(f32),
    Transparency(i64),
    BackgroundColor(String),
    EnableScaleLimits(bool),
    ScaleFactor(f32),
    GifSpeed(u32),
}

/// What the host must do after a setting change was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RenderInstruction {
    /// The change only persists; nothing on screen moves.
    Nothing,
    /// Repaint with the same cached bitmaps.
    Repaint,
    /// Rebuild the visual from the current source.
    RebuildVisual,
    /// Drop every cached bitmap, then rebuild.
    ResetCaches,
}

/// Validate and apply one change to `settings`, returning how much work the
/// renderer has to redo.
pub fn apply_setting(
    settings: &mut Settings,
    change: SettingChange,
) -> Result<RenderInstruction, InputValidationError> {
    let adv = &mut settings.advanced;
    let instruction = match change {
        SettingChange::ImagePath(path) => {
            settings.image_path = path;
            RenderInstruction::RebuildVisual
        }
        SettingChange::ScalingMode(mode) => {
            settings.scaling_mode = mode;
            RenderInstruction::RebuildVisual
        }
        SettingChange::DisplayIndex(index) => {
            settings.display_index = index;
            RenderInstruction::RebuildVisual
        }
        SettingChange::HardwareAcceleration(enabled) => {
            adv.hardware_acceleration = enabled;
            RenderInstruction::Nothing
        }
        SettingChange::UpdateInterval(ms) => {
            adv.update_interval = ms;
            RenderInstruction::Nothing
        }
        SettingChange::TileScale(scale) => {
            if !(scale > 0.0) {
                return Err(InputValidationError::NonPositive {
                    name: "tile_scale",
                    value: scale,
                });
            }
            adv.tile_scale = scale;
            RenderInstruction::RebuildVisual
        }
        SettingChange::CacheSize(size) => {
            if size == 0 {
                return Err(InputValidationError::ZeroCacheSize);
            }
            adv.cache_size = size;
            RenderInstruction::ResetCaches
        }
        SettingChange::MaxMemoryUsage(mib) => {
            adv.max_memory_usage = mib;
            RenderInstruction::Nothing
        }
        SettingChange::Antialiasing(enabled) => {
            if adv.antialiasing == enabled {
                return Ok(RenderInstruction::Nothing);
            }
            adv.antialiasing = enabled;
            RenderInstruction::ResetCaches
        }
        SettingChange::Opacity(value) => {
            if !(0.0..=1.0).contains(&value) {
                return Err(InputValidationError::OpacityOutOfRange(value));
            }
            settings.opacity = value;
            RenderInstruction::Repaint
        }
        SettingChange::Transparency(alpha) => {
            if !(0..=255).contains(&alpha) {
                return Err(InputValidationError::TransparencyOutOfRange(alpha));
            }
            adv.transparency = alpha as u8;
            RenderInstruction::Repaint
        }
        SettingChange::BackgroundColor(color) => {
            parse_color(&color)?;
            adv.background_color = color;
            RenderInstruction::Repaint
        }
        SettingChange::EnableScaleLimits(enabled) => {
            adv.enable_scale_limits = enabled;
            if enabled {
                let clamped = adv.scale_factor.clamp(MIN_SCALE, MAX_SCALE);
                if clamped != adv.scale_factor {
                    adv.scale_factor = clamped;
                    return Ok(RenderInstruction::RebuildVisual);
                }
            }
            RenderInstruction::Nothing
        }
        SettingChange::ScaleFactor(scale) => {
            if !(scale > 0.0) {
                return Err(InputValidationError::NonPositive {
                    name: "scale_factor",
                    value: scale,
                });
            }
            adv.scale_factor = if adv.enable_scale_limits {
                scale.clamp(MIN_SCALE, MAX_SCALE)
            } else {
                scale
            };
            RenderInstruction::RebuildVisual
        }
        SettingChange::GifSpeed(percent) => {
            if percent == 0 {
                return Err(InputValidationError::ZeroGifSpeed);
            }
            settings.gif_speed = percent;
            RenderInstruction::RebuildVisual
        }
    };
    Ok(instruction)
}

/// Step the scale factor by whole increments of [`SCALE_STEP`]. Used by the
/// mouse wheel and the settings dialog alike so both honour the same bounds.
pub fn adjust_scale(current: f32, steps: i32, enable_scale_limits: bool) -> f32 {
    let next = current + steps as f32 * SCALE_STEP;
    if enable_scale_limits {
        next.clamp(MIN_SCALE, MAX_SCALE)
    } else {
        next.max(0.01)
    }
}

/// Build the setting edit for one wheel or keyboard scale step. Tile mode
/// adjusts the tile unit, every other mode the overall scale factor.
pub fn scale_step_change(settings: &Settings, steps: i32) -> SettingChange {
    let adv = &settings.advanced;
    if settings.scaling_mode == ScalingMode::Tile {
        SettingChange::TileScale(adjust_scale(adv.tile_scale, steps, adv.enable_scale_limits))
    } else {
        SettingChange::ScaleFactor(adjust_scale(
            adv.scale_factor,
            steps,
            adv.enable_scale_limits,
        ))
    }
}

/// Parse a `#RRGGBB` colour string.
pub fn parse_color(text: &str) -> Result<[u8; 3], InputValidationError> {
    let hex = text
        .strip_prefix('#')
        .ok_or_else(|| InputValidationError::BadColor(text.to_string()))?;
    if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(InputValidationError::BadColor(text.to_string()));
    }
    let channel = |range: std::ops::Range<usize>| {
        u8::from_str_radix(&hex[range], 16)
            .map_err(|_| InputValidationError::BadColor(text.to_string()))
    };
    Ok([channel(0..2)?, channel(2..4)?, channel(4..6)?])
}
