#[cfg(target_os = "windows")]
use windows::Win32::Foundation::HWND;

/// Find a top-level window by its title. The overlay viewport is created by
/// the windowing backend, so its handle has to be looked up after the fact.
#[cfg(target_os = "windows")]
pub fn find_window(title: &str) -> Option<HWND> {
    use windows::core::PCWSTR;
    use windows::Win32::UI::WindowsAndMessaging::FindWindowW;

    let wide: Vec<u16> = title.encode_utf16().chain(std::iter::once(0)).collect();
    unsafe { FindWindowW(PCWSTR::null(), PCWSTR::from_raw(wide.as_ptr())) }
        .ok()
        .filter(|hwnd| !hwnd.is_invalid())
}

#[cfg(not(target_os = "windows"))]
pub fn find_window(_title: &str) -> Option<()> {
    None
}

/// Apply the layered tool-window styles that keep the overlay out of the
/// taskbar and alt-tab, and flip `WS_EX_TRANSPARENT` so clicks fall through
/// to whatever is underneath except while editing.
#[cfg(target_os = "windows")]
pub fn apply_overlay_styles(hwnd: HWND, click_through: bool) {
    use windows::Win32::UI::WindowsAndMessaging::{
        GetWindowLongPtrW, SetWindowLongPtrW, GWL_EXSTYLE, WS_EX_LAYERED, WS_EX_NOACTIVATE,
        WS_EX_TOOLWINDOW, WS_EX_TRANSPARENT,
    };

    unsafe {
        let mut style = GetWindowLongPtrW(hwnd, GWL_EXSTYLE);
        style |= (WS_EX_LAYERED | WS_EX_TOOLWINDOW | WS_EX_NOACTIVATE).0 as isize;
        if click_through {
            style |= WS_EX_TRANSPARENT.0 as isize;
        } else {
            style &= !(WS_EX_TRANSPARENT.0 as isize);
        }
        SetWindowLongPtrW(hwnd, GWL_EXSTYLE, style);
    }
}

#[cfg(not(target_os = "windows"))]
pub fn apply_overlay_styles<T>(_hwnd: T, _click_through: bool) {}
