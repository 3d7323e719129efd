use any_overlay::hotkey::{Hotkey, HotkeyTrigger, Key};
use any_overlay::overlay::monitor::{select_display, DisplayRect};
use any_overlay::overlay::window::{
    KeyAction, OverlayGeometry, OverlayKey, OverlayWindow, MIN_OVERLAY_SIZE,
};

fn display() -> DisplayRect {
    DisplayRect {
        x: 0,
        y: 0,
        width: 1920,
        height: 1080,
        primary: true,
    }
}

#[test]
fn trigger_drives_the_visibility_toggle() {
    let trigger = HotkeyTrigger::new(Hotkey {
        key: Key::KeyO,
        ctrl: true,
        shift: false,
        alt: true,
        win: false,
    });
    let mut window = OverlayWindow::new(OverlayGeometry::covering(display()));

    // nothing pending: visibility unchanged
    assert!(!trigger.take());
    assert!(!window.is_visible());

    *trigger.toggle.lock().unwrap() = true;
    if trigger.take() {
        window.toggle();
    }
    assert!(window.is_visible());

    // the flag was drained, a second poll does not toggle again
    if trigger.take() {
        window.toggle();
    }
    assert!(window.is_visible());

    *trigger.toggle.lock().unwrap() = true;
    if trigger.take() {
        window.toggle();
    }
    assert!(!window.is_visible());
}

#[test]
fn overlay_covers_the_selected_display() {
    let displays = [
        display(),
        DisplayRect {
            x: 1920,
            y: 0,
            width: 2560,
            height: 1440,
            primary: false,
        },
    ];
    let chosen = select_display(&displays, 1).unwrap();
    let geometry = OverlayGeometry::covering(chosen);
    assert_eq!((geometry.x, geometry.y), (1920, 0));
    assert_eq!(geometry.size(), (2560, 1440));
}

#[test]
fn edit_session_moves_resizes_and_exits_cleanly() {
    let mut window = OverlayWindow::new(OverlayGeometry {
        x: 10,
        y: 20,
        width: 300,
        height: 200,
    });
    window.show();
    window.set_edit_mode(true);
    assert!(!window.click_through());

    window.begin_move((0, 0));
    window.drag_to((40, -5));
    window.end_drag();
    assert_eq!((window.geometry.x, window.geometry.y), (50, 15));

    window.begin_resize((0, 0));
    window.drag_to((-500, -500));
    window.end_drag();
    assert_eq!(window.geometry.size(), (MIN_OVERLAY_SIZE, MIN_OVERLAY_SIZE));

    assert_eq!(window.handle_key(OverlayKey::Escape), KeyAction::ExitEditMode);
    assert!(window.click_through());
    assert!(window.is_visible());
}

#[test]
fn delete_in_edit_mode_dismisses_the_overlay() {
    let mut window = OverlayWindow::new(OverlayGeometry::covering(display()));
    window.show();
    window.set_edit_mode(true);
    assert_eq!(window.handle_key(OverlayKey::Delete), KeyAction::Hide);
    assert!(!window.is_visible());
    // key handling outside edit mode is inert
    window.show();
    assert_eq!(window.handle_key(OverlayKey::Delete), KeyAction::None);
    assert!(window.is_visible());
}
