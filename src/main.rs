use any_overlay::gui::OverlayApp;
use any_overlay::hotkey::HotkeyTrigger;
use any_overlay::logging;
use any_overlay::settings::Settings;

use eframe::egui;

const SETTINGS_FILE: &str = "overlay_settings.json";

fn main() -> anyhow::Result<()> {
    let settings = Settings::load(SETTINGS_FILE);
    logging::init(settings.debug_logging);

    let trigger = HotkeyTrigger::new(settings.hotkey());
    trigger.start_listener();

    let hardware_acceleration = if settings.advanced.hardware_acceleration {
        eframe::HardwareAcceleration::Preferred
    } else {
        eframe::HardwareAcceleration::Off
    };

    let native_options = eframe::NativeOptions {
        hardware_acceleration,
        viewport: egui::ViewportBuilder::default()
            .with_title("AnyOverlay Settings")
            .with_inner_size([420.0, 480.0])
            .with_min_inner_size([360.0, 320.0]),
        ..Default::default()
    };

    eframe::run_native(
        "AnyOverlay",
        native_options,
        Box::new(move |_cc| {
            Box::new(OverlayApp::new(settings, SETTINGS_FILE.to_string(), trigger))
        }),
    )
    .map_err(|e| anyhow::anyhow!("failed to start UI: {e}"))
}
