//! Foreground window and tracked-process detection.
//!
//! [`WindowSystem`] is the thin OS seam; [`TargetLocator`] applies the
//! process-scoping rules on top of it. Any failed OS query is treated as
//! "not the target", never as an error.

mod desktop;

pub use desktop::DesktopWindows;

use serde::{Deserialize, Serialize};

/// Opaque native window handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WindowHandle(pub isize);

/// Window rectangle in screen coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Rect {
    pub fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub fn width(&self) -> i32 {
        self.right - self.left
    }

    pub fn height(&self) -> i32 {
        self.bottom - self.top
    }
}

/// OS queries needed to find the capture target.
pub trait WindowSystem: Send + Sync {
    fn foreground_window(&self) -> Option<WindowHandle>;

    /// Executable name of the process that owns `window`.
    fn process_name(&self, window: WindowHandle) -> Option<String>;

    fn window_rect(&self, window: WindowHandle) -> Option<Rect>;

    /// Whether any process with this name is running.
    fn is_process_running(&self, name: &str) -> bool;
}

/// Case-insensitive process name comparison ignoring a trailing `.exe`.
pub fn matches_process_name(actual: &str, tracked: &str) -> bool {
    fn normalize(name: &str) -> String {
        let lower = name.trim().to_lowercase();
        match lower.strip_suffix(".exe") {
            Some(stem) => stem.to_string(),
            None => lower,
        }
    }

    let tracked = normalize(tracked);
    !tracked.is_empty() && normalize(actual) == tracked
}

/// Resolves which window to capture.
pub struct TargetLocator<W> {
    system: W,
    process_name: String,
    scoped: bool,
}

impl<W: WindowSystem> TargetLocator<W> {
    /// Creates a locator for `process_name`, scoped when `scoped` is true.
    pub fn new(system: W, process_name: impl Into<String>, scoped: bool) -> Self {
        Self {
            system,
            process_name: process_name.into(),
            scoped,
        }
    }

    pub fn system(&self) -> &W {
        &self.system
    }

    pub fn process_name(&self) -> &str {
        &self.process_name
    }

    pub fn is_scoped(&self) -> bool {
        self.scoped
    }

    pub fn set_scope(&mut self, process_name: impl Into<String>, scoped: bool) {
        self.process_name = process_name.into();
        self.scoped = scoped;
    }

    /// The window to capture.
    ///
    /// Scoped: the foreground window only if it belongs to the tracked
    /// process. Unscoped: the foreground window.
    pub fn locate_target(&self) -> Option<WindowHandle> {
        let window = self.system.foreground_window()?;
        if !self.scoped || self.owned_by_target(window) {
            Some(window)
        } else {
            None
        }
    }

    /// Returns `true` if the foreground window belongs to the tracked process.
    pub fn is_target_active(&self) -> bool {
        self.system
            .foreground_window()
            .map(|w| self.owned_by_target(w))
            .unwrap_or(false)
    }

    /// Returns `true` if the tracked process is running at all.
    pub fn is_target_running(&self) -> bool {
        self.system.is_process_running(&self.process_name)
    }

    /// Rectangle to place the overlay over: the target if located, else the
    /// foreground window.
    pub fn overlay_anchor(&self) -> Option<Rect> {
        let window = self
            .locate_target()
            .or_else(|| self.system.foreground_window())?;
        self.system.window_rect(window)
    }

    fn owned_by_target(&self, window: WindowHandle) -> bool {
        self.system
            .process_name(window)
            .map(|name| matches_process_name(&name, &self.process_name))
            .unwrap_or(false)
    }
}
