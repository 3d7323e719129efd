use crate::overlay::error::ConfigurationError;

/// One attached display in virtual-screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayRect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    pub primary: bool,
}

impl DisplayRect {
    pub fn contains_point(&self, point: (i32, i32)) -> bool {
        point.0 >= self.x
            && point.0 < self.x + self.width
            && point.1 >= self.y
            && point.1 < self.y + self.height
    }
}

/// Pick the configured display, falling back to the primary one when the
/// saved index no longer exists (displays unplug between sessions).
pub fn select_display(
    displays: &[DisplayRect],
    index: usize,
) -> Result<DisplayRect, ConfigurationError> {
    if displays.is_empty() {
        return Err(ConfigurationError::NoDisplays);
    }
    if let Some(rect) = displays.get(index) {
        return Ok(*rect);
    }
    tracing::warn!(
        "display index {} out of range ({} attached), using primary",
        index,
        displays.len()
    );
    Ok(*displays
        .iter()
        .find(|rect| rect.primary)
        .unwrap_or(&displays[0]))
}

/// Enumerate attached displays. On non-Windows platforms the list is empty
/// and the UI derives a single display from the window system instead.
pub fn available_displays() -> Vec<DisplayRect> {
    #[cfg(windows)]
    {
        enumerate_displays()
    }

    #[cfg(not(windows))]
    {
        Vec::new()
    }
}

#[cfg(windows)]
fn enumerate_displays() -> Vec<DisplayRect> {
    use std::mem;
    use windows::Win32::Foundation::{BOOL, LPARAM, RECT};
    use windows::Win32::Graphics::Gdi::{
        EnumDisplayMonitors, GetMonitorInfoW, HDC, HMONITOR, MONITORINFOEXW, MONITORINFOF_PRIMARY,
    };

    extern "system" fn monitor_enum_proc(
        monitor: HMONITOR,
        _hdc: HDC,
        _rc_clip: *mut RECT,
        data: LPARAM,
    ) -> BOOL {
        let displays = unsafe { &mut *(data.0 as *mut Vec<DisplayRect>) };
        let mut info = MONITORINFOEXW::default();
        info.monitorInfo.cbSize = mem::size_of::<MONITORINFOEXW>() as u32;
        if unsafe { GetMonitorInfoW(monitor, &mut info.monitorInfo as *mut _ as *mut _) }.as_bool()
        {
            let rc = info.monitorInfo.rcMonitor;
            displays.push(DisplayRect {
                x: rc.left,
                y: rc.top,
                width: rc.right - rc.left,
                height: rc.bottom - rc.top,
                primary: info.monitorInfo.dwFlags & MONITORINFOF_PRIMARY != 0,
            });
        }
        BOOL(1)
    }

    let mut displays = Vec::new();
    unsafe {
        let _ = EnumDisplayMonitors(
            HDC::default(),
            None,
            Some(monitor_enum_proc),
            LPARAM(&mut displays as *mut Vec<DisplayRect> as isize),
        );
    }
    displays
}

#[cfg(test)]
mod tests {
    use super::{select_display, DisplayRect};
    use crate::overlay::error::ConfigurationError;

    fn two_displays() -> [DisplayRect; 2] {
        [
            DisplayRect {
                x: 0,
                y: 0,
                width: 2560,
                height: 1440,
                primary: true,
            },
            DisplayRect {
                x: 2560,
                y: 0,
                width: 1920,
                height: 1080,
                primary: false,
            },
        ]
    }

    #[test]
    fn in_range_index_selects_that_display() {
        let displays = two_displays();
        assert_eq!(select_display(&displays, 1).unwrap(), displays[1]);
    }

    #[test]
    fn stale_index_falls_back_to_the_primary_display() {
        let displays = two_displays();
        assert_eq!(select_display(&displays, 7).unwrap(), displays[0]);

        // primary flag wins even when it is not the first entry
        let mut reversed = displays;
        reversed.swap(0, 1);
        assert_eq!(select_display(&reversed, 7).unwrap(), displays[0]);
    }

    #[test]
    fn an_empty_display_list_is_an_error() {
        assert!(matches!(
            select_display(&[], 0),
            Err(ConfigurationError::NoDisplays)
        ));
    }

    #[test]
    fn contains_point_uses_half_open_bounds() {
        let display = two_displays()[0];
        assert!(display.contains_point((0, 0)));
        assert!(display.contains_point((2559, 1439)));
        assert!(!display.contains_point((2560, 10)));
    }
}
