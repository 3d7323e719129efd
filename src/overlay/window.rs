use crate::overlay::animation::{Animation, FrameCache, FramePlayer};
use crate::overlay::error::DecodeError;
use crate::overlay::monitor::DisplayRect;
use crate::overlay::renderer::{CachedImageRenderer, ScalingMode};
use crate::overlay::tiles::TileCompositor;
use crate::settings::RenderConfig;
use image::RgbaImage;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

/// Edit-mode resizing never goes below this, so the overlay stays grabbable.
pub const MIN_OVERLAY_SIZE: u32 = 50;

/// What is currently painted inside the overlay. Rebuilt whenever the source
/// path, scaling mode or render config changes.
#[derive(Debug)]
pub enum Visual {
    Still {
        bitmap: Arc<RgbaImage>,
    },
    Tiled {
        tile: Arc<RgbaImage>,
        compositor: TileCompositor,
    },
    Animated {
        animation: Animation,
        frames: FrameCache,
        player: FramePlayer,
        current: Arc<RgbaImage>,
    },
    TiledAnimated {
        animation: Animation,
        frames: FrameCache,
        player: FramePlayer,
        compositor: TileCompositor,
    },
}

fn is_gif(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case("gif"))
        .unwrap_or(false)
}

impl Visual {
    /// Build the right variant for `path` under the current config. The
    /// target size is the overlay's client area in pixels.
    pub fn build(
        path: &Path,
        config: &RenderConfig,
        target: (u32, u32),
        renderer: &mut CachedImageRenderer,
    ) -> Result<Self, DecodeError> {
        let tiled = config.scaling_mode == ScalingMode::Tile;
        if is_gif(path) {
            let animation = Animation::load(path, config.gif_speed)?;
            let mut player = FramePlayer::new(animation.frame_count());
            player.resume(Instant::now(), &animation);
            let frames = FrameCache::new(config.cache_size);
            if tiled {
                Ok(Visual::TiledAnimated {
                    animation,
                    frames,
                    player,
                    compositor: TileCompositor::new(),
                })
            } else {
                let current = animation.frame(0).bitmap.clone();
                Ok(Visual::Animated {
                    animation,
                    frames,
                    player,
                    current,
                })
            }
        } else if tiled {
            let tile = renderer.load(
                path,
                target,
                ScalingMode::Tile,
                config.tile_scale,
                config.antialiasing,
            )?;
            Ok(Visual::Tiled {
                tile,
                compositor: TileCompositor::new(),
            })
        } else {
            let bitmap = renderer.load(
                path,
                target,
                config.scaling_mode,
                config.scale_factor,
                config.antialiasing,
            )?;
            Ok(Visual::Still { bitmap })
        }
    }

    pub fn is_animated(&self) -> bool {
        matches!(self, Visual::Animated { .. } | Visual::TiledAnimated { .. })
    }

    /// Advance animation playback. Returns true when the shown frame changed
    /// and the overlay needs a repaint.
    pub fn tick(&mut self, now: Instant) -> bool {
        match self {
            Visual::Animated {
                animation, player, ..
            }
            | Visual::TiledAnimated {
                animation, player, ..
            } => player.tick(now, animation),
            _ => false,
        }
    }

    /// Time until the next frame is due, for repaint scheduling. `None` for
    /// still visuals and suspended players.
    pub fn tick_interval(&self) -> Option<std::time::Duration> {
        match self {
            Visual::Animated {
                animation, player, ..
            }
            | Visual::TiledAnimated {
                animation, player, ..
            } if player.is_running() => Some(player.interval(animation)),
            _ => None,
        }
    }

    /// Stop all frame work while the overlay is hidden.
    pub fn suspend(&mut self) {
        match self {
            Visual::Animated { player, .. } | Visual::TiledAnimated { player, .. } => {
                player.suspend();
            }
            _ => {}
        }
    }

    /// Resume playback from the frame that was showing when suspended.
    pub fn resume(&mut self, now: Instant) {
        match self {
            Visual::Animated {
                animation, player, ..
            }
            | Visual::TiledAnimated {
                animation, player, ..
            } => player.resume(now, animation),
            _ => {}
        }
    }

    /// The bitmap to paint for the current state, composited or scaled
    /// through the caches as needed.
    pub fn render(&mut self, target: (u32, u32), config: &RenderConfig) -> &RgbaImage {
        match self {
            Visual::Still { bitmap } => bitmap,
            Visual::Tiled { tile, compositor } => compositor.composite(tile, target),
            Visual::Animated {
                animation,
                frames,
                player,
                current,
            } => {
                let index = player.current_frame();
                *current = frames.get(
                    index,
                    config.scale_factor,
                    &animation.frame(index).bitmap,
                    config.antialiasing,
                );
                current
            }
            Visual::TiledAnimated {
                animation,
                frames,
                player,
                compositor,
            } => {
                let index = player.current_frame();
                let tile = frames.get(
                    index,
                    config.tile_scale,
                    &animation.frame(index).bitmap,
                    config.antialiasing,
                );
                compositor.composite(&tile, target)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverlayGeometry {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl OverlayGeometry {
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Fill `display` edge to edge.
    pub fn covering(display: DisplayRect) -> Self {
        Self {
            x: display.x,
            y: display.y,
            width: display.width.max(1) as u32,
            height: display.height.max(1) as u32,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum DragState {
    Idle,
    /// Left button held: the overlay follows the pointer.
    Moving {
        pointer_start: (i32, i32),
        origin_start: (i32, i32),
    },
    /// Right button held: the bottom-right corner follows the pointer.
    Resizing {
        pointer_start: (i32, i32),
        size_start: (u32, u32),
    },
}

/// What the host should do after a key press inside the overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    None,
    ExitEditMode,
    Hide,
}

/// Keys the overlay reacts to while in edit mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayKey {
    Escape,
    Delete,
}

/// The overlay's interaction state machine. Pointer coordinates are in
/// virtual-screen pixels, matching [`OverlayGeometry`].
pub struct OverlayWindow {
    pub geometry: OverlayGeometry,
    visible: bool,
    edit_mode: bool,
    drag: DragState,
}

impl OverlayWindow {
    pub fn new(geometry: OverlayGeometry) -> Self {
        Self {
            geometry,
            visible: false,
            edit_mode: false,
            drag: DragState::Idle,
        }
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn edit_mode(&self) -> bool {
        self.edit_mode
    }

    /// Clicks pass through to whatever is underneath unless the user is
    /// editing the overlay.
    pub fn click_through(&self) -> bool {
        !self.edit_mode
    }

    pub fn show(&mut self) {
        self.visible = true;
    }

    pub fn hide(&mut self) {
        self.visible = false;
        self.set_edit_mode(false);
    }

    /// Flip visibility, returning the new state.
    pub fn toggle(&mut self) -> bool {
        if self.visible {
            self.hide();
        } else {
            self.show();
        }
        self.visible
    }

    pub fn set_edit_mode(&mut self, enabled: bool) {
        self.edit_mode = enabled;
        if !enabled {
            self.drag = DragState::Idle;
        }
    }

    pub fn begin_move(&mut self, pointer: (i32, i32)) {
        if !self.edit_mode {
            return;
        }
        self.drag = DragState::Moving {
            pointer_start: pointer,
            origin_start: (self.geometry.x, self.geometry.y),
        };
    }

    pub fn begin_resize(&mut self, pointer: (i32, i32)) {
        if !self.edit_mode {
            return;
        }
        self.drag = DragState::Resizing {
            pointer_start: pointer,
            size_start: self.geometry.size(),
        };
    }

    /// Track the pointer during a drag. Returns true when the geometry
    /// changed.
    pub fn drag_to(&mut self, pointer: (i32, i32)) -> bool {
        match self.drag {
            DragState::Idle => false,
            DragState::Moving {
                pointer_start,
                origin_start,
            } => {
                let next_x = origin_start.0 + pointer.0 - pointer_start.0;
                let next_y = origin_start.1 + pointer.1 - pointer_start.1;
                let changed = (next_x, next_y) != (self.geometry.x, self.geometry.y);
                self.geometry.x = next_x;
                self.geometry.y = next_y;
                changed
            }
            DragState::Resizing {
                pointer_start,
                size_start,
            } => {
                let next_w = size_start.0 as i64 + (pointer.0 - pointer_start.0) as i64;
                let next_h = size_start.1 as i64 + (pointer.1 - pointer_start.1) as i64;
                let next_w = next_w.max(MIN_OVERLAY_SIZE as i64) as u32;
                let next_h = next_h.max(MIN_OVERLAY_SIZE as i64) as u32;
                let changed = (next_w, next_h) != self.geometry.size();
                self.geometry.width = next_w;
                self.geometry.height = next_h;
                changed
            }
        }
    }

    pub fn end_drag(&mut self) {
        self.drag = DragState::Idle;
    }

    pub fn is_dragging(&self) -> bool {
        self.drag != DragState::Idle
    }

    /// Keyboard input only reaches the overlay in edit mode; everywhere else
    /// the window is click-through and unfocused.
    pub fn handle_key(&mut self, key: OverlayKey) -> KeyAction {
        if !self.edit_mode {
            return KeyAction::None;
        }
        match key {
            OverlayKey::Escape => {
                self.set_edit_mode(false);
                KeyAction::ExitEditMode
            }
            OverlayKey::Delete => {
                self.hide();
                KeyAction::Hide
            }
        }
    }
}
