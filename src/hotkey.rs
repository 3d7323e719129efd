pub use rdev::Key;
use rdev::{listen, EventType};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hotkey {
    pub key: Key,
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
    pub win: bool,
}

impl Default for Hotkey {
    fn default() -> Self {
        Self {
            key: Key::KeyO,
            ctrl: true,
            shift: false,
            alt: true,
            win: false,
        }
    }
}

/// Parse a hotkey string like "ctrl+alt+o" into a [`Hotkey`].
pub fn parse_hotkey(s: &str) -> Option<Hotkey> {
    let mut ctrl = false;
    let mut shift = false;
    let mut alt = false;
    let mut win = false;
    let mut key: Option<Key> = None;

    for part in s.split('+') {
        let upper = part.trim().to_ascii_uppercase();
        match upper.as_str() {
            "CTRL" | "CONTROL" => ctrl = true,
            "SHIFT" => shift = true,
            "ALT" => alt = true,
            "WIN" | "SUPER" | "META" => win = true,
            "" => {}
            _ => {
                if let Some(k) = parse_key(&upper) {
                    key = Some(k);
                } else {
                    return None;
                }
            }
        }
    }

    key.map(|k| Hotkey {
        key: k,
        ctrl,
        shift,
        alt,
        win,
    })
}

fn parse_key(upper: &str) -> Option<Key> {
    match upper {
        "SPACE" => Some(Key::Space),
        "TAB" => Some(Key::Tab),
        "ENTER" | "RETURN" => Some(Key::Return),
        "ESC" | "ESCAPE" => Some(Key::Escape),
        "DELETE" => Some(Key::Delete),
        "BACKSPACE" => Some(Key::Backspace),
        "HOME" => Some(Key::Home),
        "END" => Some(Key::End),
        "PAGEUP" => Some(Key::PageUp),
        "PAGEDOWN" => Some(Key::PageDown),
        "LEFT" | "LEFTARROW" => Some(Key::LeftArrow),
        "RIGHT" | "RIGHTARROW" => Some(Key::RightArrow),
        "UP" | "UPARROW" => Some(Key::UpArrow),
        "DOWN" | "DOWNARROW" => Some(Key::DownArrow),
        _ if upper.starts_with('F') => match upper[1..].parse::<u8>().ok() {
            Some(1) => Some(Key::F1),
            Some(2) => Some(Key::F2),
            Some(3) => Some(Key::F3),
            Some(4) => Some(Key::F4),
            Some(5) => Some(Key::F5),
            Some(6) => Some(Key::F6),
            Some(7) => Some(Key::F7),
            Some(8) => Some(Key::F8),
            Some(9) => Some(Key::F9),
            Some(10) => Some(Key::F10),
            Some(11) => Some(Key::F11),
            Some(12) => Some(Key::F12),
            _ => None,
        },
        _ if upper.len() == 1 => {
            let c = upper.chars().next()?;
            if c.is_ascii_digit() {
                Some(match c {
                    '0' => Key::Num0,
                    '1' => Key::Num1,
                    '2' => Key::Num2,
                    '3' => Key::Num3,
                    '4' => Key::Num4,
                    '5' => Key::Num5,
                    '6' => Key::Num6,
                    '7' => Key::Num7,
                    '8' => Key::Num8,
                    '9' => Key::Num9,
                    _ => return None,
                })
            } else if c.is_ascii_alphabetic() {
                Some(match c {
                    'A' => Key::KeyA,
                    'B' => Key::KeyB,
                    'C' => Key::KeyC,
                    'D' => Key::KeyD,
                    'E' => Key::KeyE,
                    'F' => Key::KeyF,
                    'G' => Key::KeyG,
                    'H' => Key::KeyH,
                    'I' => Key::KeyI,
                    'J' => Key::KeyJ,
                    'K' => Key::KeyK,
                    'L' => Key::KeyL,
                    'M' => Key::KeyM,
                    'N' => Key::KeyN,
                    'O' => Key::KeyO,
                    'P' => Key::KeyP,
                    'Q' => Key::KeyQ,
                    'R' => Key::KeyR,
                    'S' => Key::KeyS,
                    'T' => Key::KeyT,
                    'U' => Key::KeyU,
                    'V' => Key::KeyV,
                    'W' => Key::KeyW,
                    'X' => Key::KeyX,
                    'Y' => Key::KeyY,
                    'Z' => Key::KeyZ,
                    _ => return None,
                })
            } else {
                None
            }
        }
        _ => None,
    }
}

/// Shared signal set by the listener thread when the toggle combo fires.
/// The UI thread drains it once per frame with [`HotkeyTrigger::take`].
pub struct HotkeyTrigger {
    pub toggle: Arc<Mutex<bool>>,
    hotkey: Arc<Mutex<Hotkey>>,
}

impl HotkeyTrigger {
    pub fn new(hotkey: Hotkey) -> Self {
        Self {
            toggle: Arc::new(Mutex::new(false)),
            hotkey: Arc::new(Mutex::new(hotkey)),
        }
    }

    /// The combo the listener currently watches.
    pub fn current(&self) -> Hotkey {
        match self.hotkey.lock() {
            Ok(guard) => *guard,
            Err(_) => Hotkey::default(),
        }
    }

    /// Swap the watched combo. The running listener picks the new one up
    /// on its next key event, no restart needed.
    pub fn rebind(&self, hotkey: Hotkey) {
        if let Ok(mut watched) = self.hotkey.lock() {
            tracing::info!("hotkey rebound to {:?}", hotkey.key);
            *watched = hotkey;
        }
    }

    pub fn start_listener(&self) {
        let toggle = self.toggle.clone();
        let watched = self.hotkey.clone();
        tracing::debug!("starting hotkey listener for {:?}", self.current().key);
        thread::spawn(move || loop {
            let toggle_listener = toggle.clone();
            let watched_listener = watched.clone();
            let mut ctrl_pressed = false;
            let mut shift_pressed = false;
            let mut alt_pressed = false;
            let mut win_pressed = false;
            let mut watch_pressed = false;
            let mut triggered = false;

            let result = listen(move |event| {
                let hotkey = match watched_listener.lock() {
                    Ok(guard) => *guard,
                    Err(_) => return,
                };
                match event.event_type {
                    EventType::KeyPress(k) => {
                        match k {
                            Key::ControlLeft | Key::ControlRight => ctrl_pressed = true,
                            Key::ShiftLeft | Key::ShiftRight => shift_pressed = true,
                            Key::Alt | Key::AltGr => alt_pressed = true,
                            Key::MetaLeft | Key::MetaRight => win_pressed = true,
                            _ => {}
                        }
                        if k == hotkey.key {
                            watch_pressed = true;
                        }
                    }
                    EventType::KeyRelease(k) => {
                        match k {
                            Key::ControlLeft | Key::ControlRight => ctrl_pressed = false,
                            Key::ShiftLeft | Key::ShiftRight => shift_pressed = false,
                            Key::Alt | Key::AltGr => alt_pressed = false,
                            Key::MetaLeft | Key::MetaRight => win_pressed = false,
                            _ => {}
                        }
                        if k == hotkey.key {
                            watch_pressed = false;
                        }
                    }
                    _ => {}
                }

                let combo = watch_pressed
                    && (!hotkey.ctrl || ctrl_pressed)
                    && (!hotkey.shift || shift_pressed)
                    && (!hotkey.alt || alt_pressed)
                    && (!hotkey.win || win_pressed);
                if combo {
                    // fire once per press, not per key repeat
                    if !triggered {
                        triggered = true;
                        tracing::debug!("hotkey match -> toggle=true");
                        if let Ok(mut flag) = toggle_listener.lock() {
                            *flag = true;
                        }
                    }
                } else {
                    triggered = false;
                }
            });

            match result {
                Ok(()) => tracing::warn!("hotkey listener exited unexpectedly, restarting shortly"),
                Err(e) => tracing::warn!("hotkey listener failed: {:?}, retrying shortly", e),
            }

            thread::sleep(Duration::from_millis(500));
        });
    }

    /// Consume a pending toggle request, if any.
    pub fn take(&self) -> bool {
        let mut toggle = match self.toggle.lock() {
            Ok(guard) => guard,
            Err(_) => return false,
        };
        if *toggle {
            *toggle = false;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_the_default_combo() {
        let hotkey = parse_hotkey("ctrl+alt+o").unwrap();
        assert_eq!(
            hotkey,
            Hotkey {
                key: Key::KeyO,
                ctrl: true,
                shift: false,
                alt: true,
                win: false,
            }
        );
    }

    #[test]
    fn parses_function_and_special_keys() {
        assert_eq!(parse_hotkey("F5").unwrap().key, Key::F5);
        assert_eq!(parse_hotkey("shift+space").unwrap().key, Key::Space);
        assert!(parse_hotkey("shift+space").unwrap().shift);
        assert_eq!(parse_hotkey("win+9").unwrap().key, Key::Num9);
    }

    #[test]
    fn rejects_unknown_keys_and_bare_modifiers() {
        assert!(parse_hotkey("ctrl+foo").is_none());
        assert!(parse_hotkey("ctrl+alt").is_none());
        assert!(parse_hotkey("").is_none());
    }

    #[test]
    fn rebind_swaps_the_watched_combo_at_runtime() {
        let trigger = HotkeyTrigger::new(Hotkey::default());
        assert_eq!(trigger.current().key, Key::KeyO);
        let next = parse_hotkey("shift+F5").unwrap();
        trigger.rebind(next);
        assert_eq!(trigger.current(), next);
    }

    #[test]
    fn take_drains_the_flag_once() {
        let trigger = HotkeyTrigger::new(Hotkey::default());
        assert!(!trigger.take());
        *trigger.toggle.lock().unwrap() = true;
        assert!(trigger.take());
        assert!(!trigger.take());
    }
}
