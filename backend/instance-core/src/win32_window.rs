//! [`HostWindow`] for a native Win32 top-level window.

use crate::handler::HostWindow;

use std::ffi::c_void;

use log::debug;
use windows::Win32::Foundation::HWND;
use windows::Win32::UI::Input::KeyboardAndMouse::{SetActiveWindow, SetFocus};
use windows::Win32::UI::WindowsAndMessaging::{
    IsIconic, SW_RESTORE, SetForegroundWindow, ShowWindow,
};

/// Raw `HWND` of the application's main window.
///
/// Stored as an integer so the type is `Send + Sync`; window handles are
/// process-global values and may be used from any thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Win32Window {
    hwnd: isize,
}

impl Win32Window {
    pub fn from_raw(hwnd: isize) -> Self {
        Self { hwnd }
    }

    fn handle(&self) -> HWND {
        HWND(self.hwnd as *mut c_void)
    }
}

impl HostWindow for Win32Window {
    fn restore_if_minimized(&self) {
        let hwnd = self.handle();
        // SAFETY: both calls validate the handle and fail harmlessly on a stale one.
        unsafe {
            if IsIconic(hwnd).as_bool() {
                debug!("Restoring minimized main window");
                let _ = ShowWindow(hwnd, SW_RESTORE);
            }
        }
    }

    fn bring_to_foreground(&self) {
        // SAFETY: see above.
        unsafe {
            if !SetForegroundWindow(self.handle()).as_bool() {
                debug!("SetForegroundWindow was refused");
            }
        }
    }

    fn set_input_focus(&self) {
        let hwnd = self.handle();
        // SAFETY: see above.
        unsafe {
            let _ = SetFocus(Some(hwnd));
            let _ = SetActiveWindow(hwnd);
        }
    }
}
