use crate::gallery::{MediaGallery, SUPPORTED_EXTENSIONS};
use crate::hotkey::HotkeyTrigger;
use crate::overlay::error::ConfigurationError;
use crate::overlay::monitor::{self, DisplayRect};
use crate::overlay::platform;
use crate::overlay::renderer::{CachedImageRenderer, ScalingMode};
use crate::overlay::window::{
    KeyAction, OverlayGeometry, OverlayKey, OverlayWindow, Visual,
};
use crate::settings::{
    apply_setting, scale_step_change, RenderConfig, RenderInstruction, SettingChange, Settings,
};
use eframe::egui;
use std::path::PathBuf;
use std::time::{Duration, Instant};

const OVERLAY_TITLE: &str = "AnyOverlay";
/// Hotkey presses inside this window are treated as key repeat.
const TOGGLE_DEBOUNCE: Duration = Duration::from_millis(200);
const ERROR_DISPLAY_SECS: f32 = 4.0;

pub struct OverlayApp {
    settings: Settings,
    settings_path: String,
    config: RenderConfig,
    config_version: u64,
    window: OverlayWindow,
    visual: Option<Visual>,
    renderer: CachedImageRenderer,
    gallery: MediaGallery,
    gallery_entries: Vec<PathBuf>,
    trigger: HotkeyTrigger,

    texture: Option<egui::TextureHandle>,
    texture_dirty: bool,
    last_click_through: Option<bool>,
    last_toggle: Option<Instant>,
    /// Accumulated pointer delta during an edit-mode drag, in screen pixels.
    drag_cursor: (i32, i32),
    resizing: bool,
    pending_changes: Vec<SettingChange>,

    show_gallery: bool,
    hotkey_draft: String,
    color_draft: String,
    error: Option<String>,
    error_time: Option<Instant>,
}

impl OverlayApp {
    pub fn new(settings: Settings, settings_path: String, trigger: HotkeyTrigger) -> Self {
        let config = RenderConfig::from_settings(&settings, 0);
        let renderer = CachedImageRenderer::new(settings.advanced.cache_size);
        let gallery = match MediaGallery::default_location() {
            Ok(gallery) => gallery,
            Err(err) => {
                tracing::warn!("falling back to a temporary media library: {err}");
                MediaGallery::new(std::env::temp_dir().join("any_overlay_overlays"))
            }
        };
        let gallery_entries = gallery.list().unwrap_or_default();
        let geometry = match (settings.window_pos, settings.window_size) {
            (Some((x, y)), Some((w, h))) => OverlayGeometry {
                x,
                y,
                width: w.max(1),
                height: h.max(1),
            },
            _ => OverlayGeometry {
                x: 0,
                y: 0,
                width: 1,
                height: 1,
            },
        };
        let hotkey_draft = settings.hotkey.clone().unwrap_or_default();
        let color_draft = settings.advanced.background_color.clone();

        Self {
            settings,
            settings_path,
            config,
            config_version: 0,
            window: OverlayWindow::new(geometry),
            visual: None,
            renderer,
            gallery,
            gallery_entries,
            trigger,
            texture: None,
            texture_dirty: true,
            last_click_through: None,
            last_toggle: None,
            drag_cursor: (0, 0),
            resizing: false,
            pending_changes: Vec::new(),
            show_gallery: false,
            hotkey_draft,
            color_draft,
            error: None,
            error_time: None,
        }
    }

    fn overlay_viewport_id(&self) -> egui::ViewportId {
        egui::ViewportId::from_hash_of("any_overlay_overlay")
    }

    fn report_error(&mut self, message: String) {
        tracing::error!("{message}");
        self.error = Some(message);
        self.error_time = Some(Instant::now());
    }

    fn refresh_config(&mut self) {
        self.config_version += 1;
        self.config = RenderConfig::from_settings(&self.settings, self.config_version);
    }

    fn save_settings(&mut self) {
        if let Err(err) = self.settings.save(&self.settings_path) {
            self.report_error(format!("could not save settings: {err}"));
        }
    }

    /// Attached displays, or a single one derived from the window system
    /// when native enumeration is unavailable.
    fn displays(&self, ctx: &egui::Context) -> Vec<DisplayRect> {
        let displays = monitor::available_displays();
        if !displays.is_empty() {
            return displays;
        }
        let size = ctx
            .input(|i| i.viewport().monitor_size)
            .unwrap_or(egui::vec2(1920.0, 1080.0));
        vec![DisplayRect {
            x: 0,
            y: 0,
            width: size.x as i32,
            height: size.y as i32,
            primary: true,
        }]
    }

    /// Place the overlay on the configured display unless the user moved or
    /// resized it in edit mode.
    fn position_on_display(&mut self, ctx: &egui::Context) {
        if self.settings.window_pos.is_some() && self.settings.window_size.is_some() {
            return;
        }
        let displays = self.displays(ctx);
        match monitor::select_display(&displays, self.settings.display_index) {
            Ok(display) => self.window.geometry = OverlayGeometry::covering(display),
            Err(err) => self.report_error(err.to_string()),
        }
    }

    fn rebuild_visual(&mut self) {
        self.visual = None;
        self.texture = None;
        self.texture_dirty = true;

        let Some(path) = self.settings.image_path.clone() else {
            if self.window.is_visible() {
                self.report_error(ConfigurationError::NoImageSelected.to_string());
                self.window.hide();
            }
            return;
        };
        if !path.exists() {
            self.report_error(ConfigurationError::ImageMissing(path).to_string());
            self.window.hide();
            return;
        }

        let target = self.window.geometry.size();
        match Visual::build(&path, &self.config, target, &mut self.renderer) {
            Ok(mut visual) => {
                if !self.window.is_visible() {
                    visual.suspend();
                }
                tracing::debug!(
                    path = %path.display(),
                    animated = visual.is_animated(),
                    "visual rebuilt"
                );
                self.visual = Some(visual);
            }
            Err(err) => {
                self.report_error(err.to_string());
                self.window.hide();
            }
        }
    }

    fn toggle_overlay(&mut self, ctx: &egui::Context) {
        if self.window.toggle() {
            self.position_on_display(ctx);
            if self.visual.is_none() {
                self.rebuild_visual();
            }
            if let Some(visual) = &mut self.visual {
                visual.resume(Instant::now());
            } else {
                // rebuild failed and already reported
                self.window.hide();
            }
            self.last_click_through = None;
        } else if let Some(visual) = &mut self.visual {
            visual.suspend();
        }
        tracing::info!(visible = self.window.is_visible(), "overlay toggled");
    }

    fn apply_pending_changes(&mut self) {
        if self.pending_changes.is_empty() {
            return;
        }
        let mut applied = false;
        let mut work = RenderInstruction::Nothing;
        for change in std::mem::take(&mut self.pending_changes) {
            match apply_setting(&mut self.settings, change) {
                Ok(instruction) => {
                    applied = true;
                    work = work.max(instruction);
                }
                Err(err) => self.report_error(err.to_string()),
            }
        }
        if !applied {
            return;
        }
        self.refresh_config();
        match work {
            RenderInstruction::Nothing => {}
            RenderInstruction::Repaint => self.texture_dirty = true,
            RenderInstruction::RebuildVisual => self.rebuild_visual(),
            RenderInstruction::ResetCaches => {
                self.renderer.set_capacity(self.settings.advanced.cache_size);
                self.renderer.clear();
                self.rebuild_visual();
            }
        }
        self.save_settings();
    }

    fn upload_texture(&mut self, ctx: &egui::Context) {
        if !self.texture_dirty && self.texture.is_some() {
            return;
        }
        let Some(visual) = &mut self.visual else {
            return;
        };
        let bitmap = visual.render(self.window.geometry.size(), &self.config);
        let size = [bitmap.width() as usize, bitmap.height() as usize];
        let pixels = egui::ColorImage::from_rgba_unmultiplied(size, bitmap.as_raw());
        let options = if self.config.antialiasing {
            egui::TextureOptions::LINEAR
        } else {
            egui::TextureOptions::NEAREST
        };
        match &mut self.texture {
            Some(texture) => texture.set(pixels, options),
            None => self.texture = Some(ctx.load_texture("overlay", pixels, options)),
        }
        self.texture_dirty = false;
    }

    fn persist_geometry(&mut self) {
        let g = self.window.geometry;
        self.settings.window_pos = Some((g.x, g.y));
        self.settings.window_size = Some((g.width, g.height));
        self.save_settings();
    }

    fn send_geometry(&self, ctx: &egui::Context) {
        let id = self.overlay_viewport_id();
        let g = self.window.geometry;
        ctx.send_viewport_cmd_to(
            id,
            egui::ViewportCommand::OuterPosition(egui::pos2(g.x as f32, g.y as f32)),
        );
        ctx.send_viewport_cmd_to(
            id,
            egui::ViewportCommand::InnerSize(egui::vec2(g.width as f32, g.height as f32)),
        );
    }

    fn show_overlay_viewport(&mut self, ctx: &egui::Context) {
        let g = self.window.geometry;
        let click_through = self.window.click_through();
        let builder = egui::ViewportBuilder::default()
            .with_title(OVERLAY_TITLE)
            .with_decorations(false)
            .with_transparent(true)
            .with_always_on_top()
            .with_taskbar(false)
            .with_mouse_passthrough(click_through)
            .with_position(egui::pos2(g.x as f32, g.y as f32))
            .with_inner_size(egui::vec2(g.width as f32, g.height as f32));

        let id = self.overlay_viewport_id();
        ctx.show_viewport_immediate(id, builder, |ctx, _class| {
            if self.last_click_through != Some(click_through) {
                ctx.send_viewport_cmd_to(
                    id,
                    egui::ViewportCommand::MousePassthrough(click_through),
                );
                if let Some(hwnd) = platform::find_window(OVERLAY_TITLE) {
                    platform::apply_overlay_styles(hwnd, click_through);
                }
                self.last_click_through = Some(click_through);
            }

            self.upload_texture(ctx);

            let panel_frame = egui::Frame::none();
            egui::CentralPanel::default()
                .frame(panel_frame)
                .show(ctx, |ui| {
                    let opacity = self.config.opacity;
                    let [r, g, b] = self.config.background_color;
                    let backdrop =
                        egui::Color32::from_rgba_unmultiplied(r, g, b, self.config.transparency)
                            .gamma_multiply(opacity);
                    let panel_rect = ui.max_rect();
                    ui.painter().rect_filled(panel_rect, 0.0, backdrop);

                    if let Some(texture) = &self.texture {
                        let tex_size = texture.size_vec2();
                        let rect = egui::Rect::from_center_size(panel_rect.center(), tex_size);
                        ui.painter().image(
                            texture.id(),
                            rect,
                            egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                            egui::Color32::WHITE.gamma_multiply(opacity),
                        );
                    }

                    if self.window.edit_mode() {
                        ui.painter().rect_stroke(
                            panel_rect,
                            0.0,
                            egui::Stroke::new(2.0, egui::Color32::LIGHT_BLUE),
                        );
                        self.edit_interactions(ui, ctx, panel_rect);
                    }
                });
        });
    }

    fn edit_interactions(&mut self, ui: &mut egui::Ui, ctx: &egui::Context, rect: egui::Rect) {
        let response = ui.interact(
            rect,
            egui::Id::new("overlay_drag"),
            egui::Sense::click_and_drag(),
        );

        if response.drag_started_by(egui::PointerButton::Primary) {
            self.drag_cursor = (0, 0);
            self.resizing = false;
            self.window.begin_move((0, 0));
        }
        if response.drag_started_by(egui::PointerButton::Secondary) {
            self.drag_cursor = (0, 0);
            self.resizing = true;
            self.window.begin_resize((0, 0));
        }
        if response.dragged() {
            let delta = response.drag_delta();
            self.drag_cursor.0 += delta.x as i32;
            self.drag_cursor.1 += delta.y as i32;
            if self.window.drag_to(self.drag_cursor) {
                self.send_geometry(ctx);
                // moving keeps the same bitmap, only resizing repaints
                if self.resizing {
                    self.texture_dirty = true;
                }
            }
        }
        if response.drag_stopped() {
            self.window.end_drag();
            if self.resizing {
                self.resizing = false;
                self.rebuild_visual();
            }
            self.persist_geometry();
        }

        if ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
            let action = self.window.handle_key(OverlayKey::Escape);
            self.handle_key_action(action);
        }
        if ctx.input(|i| i.key_pressed(egui::Key::Delete)) {
            let action = self.window.handle_key(OverlayKey::Delete);
            self.handle_key_action(action);
        }

        let scroll = ctx.input(|i| i.raw_scroll_delta.y);
        if scroll != 0.0 {
            let steps = if scroll > 0.0 { 1 } else { -1 };
            self.pending_changes
                .push(scale_step_change(&self.settings, steps));
        }
        let plus = ctx.input(|i| i.key_pressed(egui::Key::Plus) || i.key_pressed(egui::Key::Equals));
        if plus {
            self.pending_changes
                .push(scale_step_change(&self.settings, 1));
        }
        if ctx.input(|i| i.key_pressed(egui::Key::Minus)) {
            self.pending_changes
                .push(scale_step_change(&self.settings, -1));
        }
    }

    fn handle_key_action(&mut self, action: KeyAction) {
        match action {
            KeyAction::None => {}
            KeyAction::ExitEditMode => {
                self.last_click_through = None;
            }
            KeyAction::Hide => {
                if let Some(visual) = &mut self.visual {
                    visual.suspend();
                }
            }
        }
    }

    fn pick_image_file(&mut self) {
        let dialog = rfd::FileDialog::new().add_filter("Images", &SUPPORTED_EXTENSIONS);
        if let Some(path) = dialog.pick_file() {
            self.pending_changes
                .push(SettingChange::ImagePath(Some(path)));
        }
    }

    fn import_into_gallery(&mut self) {
        let dialog = rfd::FileDialog::new().add_filter("Images", &SUPPORTED_EXTENSIONS);
        if let Some(path) = dialog.pick_file() {
            match self.gallery.import(&path) {
                Ok(imported) => {
                    self.gallery_entries = self.gallery.list().unwrap_or_default();
                    self.pending_changes
                        .push(SettingChange::ImagePath(Some(imported)));
                }
                Err(err) => self.report_error(err.to_string()),
            }
        }
    }

    fn gallery_window(&mut self, ctx: &egui::Context) {
        if !self.show_gallery {
            return;
        }
        let mut open = self.show_gallery;
        let mut select: Option<PathBuf> = None;
        let mut remove: Option<PathBuf> = None;
        egui::Window::new("Media Gallery")
            .open(&mut open)
            .resizable(true)
            .show(ctx, |ui| {
                if ui.button("Import…").clicked() {
                    self.import_into_gallery();
                }
                ui.separator();
                if self.gallery_entries.is_empty() {
                    ui.label("No media imported yet.");
                }
                egui::ScrollArea::vertical().show(ui, |ui| {
                    for entry in &self.gallery_entries {
                        let name = entry
                            .file_name()
                            .map(|n| n.to_string_lossy().into_owned())
                            .unwrap_or_default();
                        let selected = self.settings.image_path.as_deref() == Some(entry.as_path());
                        ui.horizontal(|ui| {
                            if ui.selectable_label(selected, &name).clicked() {
                                select = Some(entry.clone());
                            }
                            if ui.small_button("🗑").clicked() {
                                remove = Some(entry.clone());
                            }
                        });
                    }
                });
            });
        self.show_gallery = open;

        if let Some(path) = select {
            self.pending_changes
                .push(SettingChange::ImagePath(Some(path)));
        }
        if let Some(path) = remove {
            match self.gallery.delete(&path) {
                Ok(()) => {
                    if self.settings.image_path.as_deref() == Some(path.as_path()) {
                        self.pending_changes.push(SettingChange::ImagePath(None));
                    }
                    self.gallery_entries = self.gallery.list().unwrap_or_default();
                }
                Err(err) => self.report_error(err.to_string()),
            }
        }
    }

    fn control_panel(&mut self, ctx: &egui::Context) {
        let displays = self.displays(ctx);
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.horizontal(|ui| {
                let label = if self.window.is_visible() {
                    "Hide Overlay"
                } else {
                    "Show Overlay"
                };
                if ui.button(label).clicked() {
                    self.toggle_overlay(ctx);
                }
                let mut edit = self.window.edit_mode();
                if ui.checkbox(&mut edit, "Edit mode").changed() {
                    self.window.set_edit_mode(edit);
                    self.last_click_through = None;
                }
                if ui.button("Media Gallery").clicked() {
                    self.show_gallery = !self.show_gallery;
                }
            });
            ui.separator();

            ui.horizontal(|ui| {
                ui.label("Image:");
                let current = self
                    .settings
                    .image_path
                    .as_ref()
                    .and_then(|p| p.file_name())
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| "none selected".into());
                ui.monospace(current);
                if ui.button("Choose…").clicked() {
                    self.pick_image_file();
                }
            });

            ui.horizontal(|ui| {
                ui.label("Opacity:");
                let mut opacity = (self.settings.opacity * 100.0).round() as i32;
                if ui.add(egui::Slider::new(&mut opacity, 1..=100)).changed() {
                    self.pending_changes
                        .push(SettingChange::Opacity(opacity as f32 / 100.0));
                }
            });

            ui.horizontal(|ui| {
                ui.label("Scaling:");
                let mut mode = self.settings.scaling_mode;
                egui::ComboBox::from_id_source("scaling_mode")
                    .selected_text(mode.to_string())
                    .show_ui(ui, |ui| {
                        for candidate in ScalingMode::ALL {
                            ui.selectable_value(&mut mode, candidate, candidate.to_string());
                        }
                    });
                if mode != self.settings.scaling_mode {
                    self.pending_changes.push(SettingChange::ScalingMode(mode));
                }
            });

            ui.horizontal(|ui| {
                ui.label("GIF speed %:");
                let mut gif_speed = self.settings.gif_speed;
                if ui
                    .add(egui::DragValue::new(&mut gif_speed).clamp_range(10..=1000))
                    .changed()
                {
                    self.pending_changes.push(SettingChange::GifSpeed(gif_speed));
                }
            });

            ui.horizontal(|ui| {
                ui.label("Display:");
                let mut index = self.settings.display_index;
                egui::ComboBox::from_id_source("display_index")
                    .selected_text(display_label(&displays, index))
                    .show_ui(ui, |ui| {
                        for i in 0..displays.len() {
                            ui.selectable_value(&mut index, i, display_label(&displays, i));
                        }
                    });
                if index != self.settings.display_index {
                    self.pending_changes
                        .push(SettingChange::DisplayIndex(index));
                    // a display change discards any manual placement
                    self.settings.window_pos = None;
                    self.settings.window_size = None;
                }
            });

            ui.horizontal(|ui| {
                ui.label("Hotkey:");
                ui.text_edit_singleline(&mut self.hotkey_draft);
                if ui.button("Apply").clicked() {
                    match crate::hotkey::parse_hotkey(&self.hotkey_draft) {
                        Some(parsed) => {
                            self.trigger.rebind(parsed);
                            self.settings.hotkey = Some(self.hotkey_draft.clone());
                            self.save_settings();
                        }
                        None => {
                            self.report_error(format!("invalid hotkey: {}", self.hotkey_draft))
                        }
                    }
                }
            });

            ui.collapsing("Advanced", |ui| self.advanced_section(ui));

            if let (Some(message), Some(at)) = (&self.error, self.error_time) {
                if at.elapsed().as_secs_f32() < ERROR_DISPLAY_SECS {
                    ui.colored_label(egui::Color32::LIGHT_RED, message);
                } else {
                    self.error = None;
                    self.error_time = None;
                }
            }
        });
    }

    fn advanced_section(&mut self, ui: &mut egui::Ui) {
        let adv = self.settings.advanced.clone();

        let mut scale = adv.scale_factor;
        ui.horizontal(|ui| {
            ui.label("Scale:");
            if ui
                .add(egui::Slider::new(&mut scale, 0.1..=10.0).logarithmic(true))
                .changed()
            {
                self.pending_changes.push(SettingChange::ScaleFactor(scale));
            }
        });

        let mut limits = adv.enable_scale_limits;
        if ui.checkbox(&mut limits, "Clamp scale to 0.1 - 10.0").changed() {
            self.pending_changes
                .push(SettingChange::EnableScaleLimits(limits));
        }

        let mut tile_scale = adv.tile_scale;
        ui.horizontal(|ui| {
            ui.label("Tile scale:");
            if ui
                .add(egui::Slider::new(&mut tile_scale, 0.1..=5.0))
                .changed()
            {
                self.pending_changes
                    .push(SettingChange::TileScale(tile_scale));
            }
        });

        let mut transparency = adv.transparency as i64;
        ui.horizontal(|ui| {
            ui.label("Background alpha:");
            if ui
                .add(egui::Slider::new(&mut transparency, 0..=255))
                .changed()
            {
                self.pending_changes
                    .push(SettingChange::Transparency(transparency));
            }
        });

        ui.horizontal(|ui| {
            ui.label("Background:");
            if ui.text_edit_singleline(&mut self.color_draft).lost_focus() {
                self.pending_changes
                    .push(SettingChange::BackgroundColor(self.color_draft.clone()));
            }
        });

        let mut antialiasing = adv.antialiasing;
        if ui.checkbox(&mut antialiasing, "Antialiasing").changed() {
            self.pending_changes
                .push(SettingChange::Antialiasing(antialiasing));
        }

        let mut cache_size = adv.cache_size;
        ui.horizontal(|ui| {
            ui.label("Cache entries:");
            if ui
                .add(egui::DragValue::new(&mut cache_size).clamp_range(1..=10_000))
                .changed()
            {
                self.pending_changes
                    .push(SettingChange::CacheSize(cache_size));
            }
        });

        let mut max_memory = adv.max_memory_usage;
        ui.horizontal(|ui| {
            ui.label("Max memory (MiB):");
            if ui
                .add(egui::DragValue::new(&mut max_memory).clamp_range(64..=16_384))
                .changed()
            {
                self.pending_changes
                    .push(SettingChange::MaxMemoryUsage(max_memory));
            }
        });

        let mut update_interval = adv.update_interval;
        ui.horizontal(|ui| {
            ui.label("Update interval (ms):");
            if ui
                .add(egui::DragValue::new(&mut update_interval).clamp_range(0..=1000))
                .changed()
            {
                self.pending_changes
                    .push(SettingChange::UpdateInterval(update_interval));
            }
        });

        let mut hw = adv.hardware_acceleration;
        if ui
            .checkbox(&mut hw, "Hardware acceleration (on next start)")
            .changed()
        {
            self.pending_changes
                .push(SettingChange::HardwareAcceleration(hw));
        }
    }
}

fn display_label(displays: &[DisplayRect], index: usize) -> String {
    match displays.get(index) {
        Some(d) => {
            let primary = if d.primary { " (primary)" } else { "" };
            format!("Display {}: {}x{}{}", index + 1, d.width, d.height, primary)
        }
        None => format!("Display {}", index + 1),
    }
}

impl eframe::App for OverlayApp {
    fn clear_color(&self, _visuals: &egui::Visuals) -> [f32; 4] {
        // the overlay viewport must stay transparent
        [0.0, 0.0, 0.0, 0.0]
    }

    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if self.trigger.take() {
            let debounced = self
                .last_toggle
                .map(|at| at.elapsed() < TOGGLE_DEBOUNCE)
                .unwrap_or(false);
            if !debounced {
                self.last_toggle = Some(Instant::now());
                self.toggle_overlay(ctx);
            }
        }

        if let Some(visual) = &mut self.visual {
            if self.window.is_visible() && visual.tick(Instant::now()) {
                self.texture_dirty = true;
            }
        }

        self.control_panel(ctx);
        self.gallery_window(ctx);

        if self.window.is_visible() {
            self.show_overlay_viewport(ctx);
        }

        self.apply_pending_changes();

        // keep ticking while animated or on a fixed cadence
        if self.window.is_visible() {
            if let Some(interval) = self.visual.as_ref().and_then(|v| v.tick_interval()) {
                ctx.request_repaint_after(interval);
            }
        }
        if self.config.update_interval > 0 {
            ctx.request_repaint_after(Duration::from_millis(self.config.update_interval as u64));
        }
        // the hotkey thread cannot wake the UI, so poll at a coarse rate
        ctx.request_repaint_after(Duration::from_millis(100));
    }
}
