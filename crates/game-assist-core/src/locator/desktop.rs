//! Native [`WindowSystem`] backed by Win32 and `sysinfo`.
//!
//! # Platform Support
//!
//! - **Windows**: Foreground window, owner process and rectangle via Win32
//! - **Linux/macOS**: No windows are reported; process lookup still works

use sysinfo::{ProcessRefreshKind, RefreshKind, System};

use super::{matches_process_name, Rect, WindowHandle, WindowSystem};

/// The real desktop.
#[derive(Debug, Clone, Copy, Default)]
pub struct DesktopWindows;

impl DesktopWindows {
    pub fn new() -> Self {
        Self
    }
}

/// Get a fresh System instance with process information
fn fresh_process_list() -> System {
    let mut sys =
        System::new_with_specifics(RefreshKind::new().with_processes(ProcessRefreshKind::new()));
    sys.refresh_processes();
    sys
}

impl WindowSystem for DesktopWindows {
    fn foreground_window(&self) -> Option<WindowHandle> {
        imp::foreground_window()
    }

    fn process_name(&self, window: WindowHandle) -> Option<String> {
        let pid = imp::owning_pid(window)?;
        let mut sys = System::new();
        let pid = sysinfo::Pid::from_u32(pid);
        if !sys.refresh_process(pid) {
            return None;
        }
        sys.process(pid).map(|p| p.name().to_string())
    }

    fn window_rect(&self, window: WindowHandle) -> Option<Rect> {
        imp::window_rect(window)
    }

    fn is_process_running(&self, name: &str) -> bool {
        fresh_process_list()
            .processes()
            .values()
            .any(|process| matches_process_name(process.name(), name))
    }
}

// ============================================================================
// Windows Implementation
// ============================================================================

#[cfg(windows)]
mod windows_impl {
    use super::*;
    use windows::Win32::Foundation::{HWND, RECT};
    use windows::Win32::UI::WindowsAndMessaging::{
        GetForegroundWindow, GetWindowRect, GetWindowThreadProcessId,
    };

    pub fn hwnd(window: WindowHandle) -> HWND {
        HWND(window.0 as *mut _)
    }

    pub fn foreground_window() -> Option<WindowHandle> {
        let hwnd = unsafe { GetForegroundWindow() };
        if hwnd.is_invalid() {
            None
        } else {
            Some(WindowHandle(hwnd.0 as isize))
        }
    }

    pub fn owning_pid(window: WindowHandle) -> Option<u32> {
        let mut pid = 0u32;
        unsafe { GetWindowThreadProcessId(hwnd(window), Some(&mut pid)) };
        (pid != 0).then_some(pid)
    }

    pub fn window_rect(window: WindowHandle) -> Option<Rect> {
        let mut rect = RECT::default();
        unsafe { GetWindowRect(hwnd(window), &mut rect) }.ok()?;
        Some(Rect::new(rect.left, rect.top, rect.right, rect.bottom))
    }
}

// ============================================================================
// Non-Windows Stubs
// ============================================================================

#[cfg(not(windows))]
mod stub_impl {
    use super::*;

    pub fn foreground_window() -> Option<WindowHandle> {
        None
    }

    pub fn owning_pid(_window: WindowHandle) -> Option<u32> {
        None
    }

    pub fn window_rect(_window: WindowHandle) -> Option<Rect> {
        None
    }
}

#[cfg(windows)]
use windows_impl as imp;

#[cfg(not(windows))]
use stub_impl as imp;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_process_query_doesnt_crash() {
        let desktop = DesktopWindows::new();
        assert!(!desktop.is_process_running("definitely-not-a-real-process-name"));
        let _ = desktop.foreground_window();
    }
}
