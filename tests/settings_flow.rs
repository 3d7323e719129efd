use any_overlay::overlay::renderer::ScalingMode;
use any_overlay::settings::{
    adjust_scale, apply_setting, RenderConfig, RenderInstruction, SettingChange, Settings,
    MAX_SCALE, MIN_SCALE,
};
use std::path::PathBuf;

#[test]
fn config_snapshots_are_immutable_and_versioned() {
    let mut settings = Settings::default();
    let before = RenderConfig::from_settings(&settings, 1);

    apply_setting(&mut settings, SettingChange::Transparency(40)).unwrap();
    apply_setting(&mut settings, SettingChange::ScalingMode(ScalingMode::Tile)).unwrap();

    // the old snapshot is untouched by later edits
    assert_eq!(before.transparency, 0);
    assert_eq!(before.scaling_mode, ScalingMode::Fit);

    let after = RenderConfig::from_settings(&settings, 2);
    assert_eq!(after.transparency, 40);
    assert_eq!(after.scaling_mode, ScalingMode::Tile);
    assert!(after.version > before.version);
}

#[test]
fn rejected_changes_leave_settings_untouched() {
    let mut settings = Settings::default();
    let snapshot = settings.advanced.clone();

    assert!(apply_setting(&mut settings, SettingChange::Transparency(-1)).is_err());
    assert!(apply_setting(&mut settings, SettingChange::CacheSize(0)).is_err());
    assert!(apply_setting(&mut settings, SettingChange::GifSpeed(0)).is_err());
    assert!(apply_setting(&mut settings, SettingChange::TileScale(0.0)).is_err());
    assert!(apply_setting(
        &mut settings,
        SettingChange::BackgroundColor("red".into())
    )
    .is_err());

    assert_eq!(settings.advanced, snapshot);
}

#[test]
fn wheel_steps_stay_inside_the_limits() {
    let mut scale = 1.0;
    for _ in 0..200 {
        scale = adjust_scale(scale, 1, true);
    }
    assert_eq!(scale, MAX_SCALE);
    for _ in 0..200 {
        scale = adjust_scale(scale, -1, true);
    }
    assert_eq!(scale, MIN_SCALE);
}

#[test]
fn scale_edits_request_a_visual_rebuild() {
    let mut settings = Settings::default();
    let next = adjust_scale(settings.advanced.scale_factor, 1, true);
    let instruction = apply_setting(&mut settings, SettingChange::ScaleFactor(next)).unwrap();
    assert_eq!(instruction, RenderInstruction::RebuildVisual);
    assert!((settings.advanced.scale_factor - 1.1).abs() < 1e-6);
}

#[test]
fn persisted_settings_survive_unknown_and_missing_fields() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("overlay_settings.json");

    // a file written by a newer build with an extra field still loads
    std::fs::write(
        &path,
        r#"{
            "image_path": "/tmp/cat.gif",
            "scaling_mode": "tile",
            "future_field": true,
            "opacity": 0.8,
            "advanced_settings": { "transparency": 15 }
        }"#,
    )
    .unwrap();

    let loaded = Settings::load(path.to_str().unwrap());
    assert_eq!(loaded.image_path, Some(PathBuf::from("/tmp/cat.gif")));
    assert_eq!(loaded.scaling_mode, ScalingMode::Tile);
    assert_eq!(loaded.opacity, 0.8);
    assert_eq!(loaded.advanced.transparency, 15);
    // everything unspecified falls back to its default
    assert_eq!(loaded.advanced.cache_size, 100);
    assert!(loaded.advanced.antialiasing);
}

#[test]
fn save_then_load_preserves_every_field() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("overlay_settings.json");
    let path = path.to_str().unwrap();

    let mut settings = Settings::default();
    settings.image_path = Some(PathBuf::from("/tmp/banner.png"));
    settings.display_index = 2;
    settings.window_pos = Some((120, -30));
    settings.window_size = Some((640, 360));
    apply_setting(&mut settings, SettingChange::Transparency(60)).unwrap();
    apply_setting(&mut settings, SettingChange::GifSpeed(250)).unwrap();
    apply_setting(&mut settings, SettingChange::Opacity(0.4)).unwrap();
    settings.save(path).unwrap();

    let loaded = Settings::load(path);
    assert_eq!(loaded.image_path, settings.image_path);
    assert_eq!(loaded.display_index, 2);
    assert_eq!(loaded.window_pos, Some((120, -30)));
    assert_eq!(loaded.window_size, Some((640, 360)));
    assert_eq!(loaded.gif_speed, 250);
    assert_eq!(loaded.opacity, 0.4);
    assert_eq!(loaded.advanced, settings.advanced);
}
