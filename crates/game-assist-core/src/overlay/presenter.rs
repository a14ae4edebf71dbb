//! Overlay state and behaviour, independent of the windowing backend.

use std::time::Instant;

use super::drag::DragController;
use super::fade::Fade;
use crate::config::{OverlaySettings, PromptType};
use crate::locator::Rect;

/// Margin between the surface edge and the panel.
pub const PANEL_MARGIN: i32 = 20;
/// Width of the prompt selector at the left of the header.
pub const PROMPT_LABEL_WIDTH: i32 = 150;
/// Side of the square close button at the right of the header.
pub const CLOSE_BUTTON_SIZE: i32 = 28;

/// Backend that actually draws the overlay.
///
/// Every coordinate handed to a surface is an integer pixel.
pub trait OverlaySurface {
    fn set_bounds(&mut self, x: i32, y: i32, width: i32, height: i32);
    fn set_position(&mut self, x: i32, y: i32);
    /// 0.0 transparent, 1.0 opaque
    fn set_opacity(&mut self, opacity: f64);
    fn set_content(&mut self, content: &OverlayContent);
    /// Height in pixels that `text` needs when wrapped to `width`.
    fn measure_body(&mut self, text: &str, width: i32, font_size: i32) -> i32;
    fn set_visible(&mut self, visible: bool);
    fn capture_pointer(&mut self);
    fn release_pointer(&mut self);
    fn destroy(&mut self);
}

/// What the surface should render.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayContent {
    pub text: String,
    pub prompt: PromptType,
    pub layout: PanelLayout,
    pub font_size: i32,
}

/// Observable overlay state.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OverlayState {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    pub visible: bool,
    pub text: String,
    pub opacity: f64,
    pub hide_deadline: Option<Instant>,
}

/// Region of the surface under a pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitZone {
    PromptLabel,
    DragHandle,
    CloseButton,
    Body,
    Outside,
}

/// Panel geometry relative to the surface origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PanelLayout {
    pub width: i32,
    pub header_height: i32,
    pub body_height: i32,
}

impl PanelLayout {
    pub fn new(settings: &OverlaySettings, surface_width: i32) -> Self {
        let available = (surface_width - 2 * PANEL_MARGIN).max(CLOSE_BUTTON_SIZE * 2);
        Self {
            width: settings.width.max(PROMPT_LABEL_WIDTH + CLOSE_BUTTON_SIZE * 2).min(available),
            header_height: settings.font_size.max(8) + 14,
            body_height: 0,
        }
    }

    pub fn panel(&self) -> Rect {
        Rect::new(
            PANEL_MARGIN,
            PANEL_MARGIN,
            PANEL_MARGIN + self.width,
            PANEL_MARGIN + self.header_height + self.body_height,
        )
    }

    pub fn header(&self) -> Rect {
        Rect::new(
            PANEL_MARGIN,
            PANEL_MARGIN,
            PANEL_MARGIN + self.width,
            PANEL_MARGIN + self.header_height,
        )
    }

    pub fn prompt_label(&self) -> Rect {
        let header = self.header();
        Rect::new(
            header.left,
            header.top,
            (header.left + PROMPT_LABEL_WIDTH).min(header.right - CLOSE_BUTTON_SIZE),
            header.bottom,
        )
    }

    pub fn close_button(&self) -> Rect {
        let header = self.header();
        Rect::new(header.right - CLOSE_BUTTON_SIZE, header.top, header.right, header.bottom)
    }

    pub fn body(&self) -> Rect {
        let header = self.header();
        Rect::new(header.left, header.bottom, header.right, header.bottom + self.body_height)
    }

    pub fn hit_test(&self, x: i32, y: i32) -> HitZone {
        let inside = |r: Rect| x >= r.left && x < r.right && y >= r.top && y < r.bottom;
        if inside(self.close_button()) {
            HitZone::CloseButton
        } else if inside(self.prompt_label()) {
            HitZone::PromptLabel
        } else if inside(self.header()) {
            HitZone::DragHandle
        } else if inside(self.body()) {
            HitZone::Body
        } else {
            HitZone::Outside
        }
    }
}

/// Result of a primary-button press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PressOutcome {
    DragStarted,
    /// The prompt selector advanced; the owner should apply the new prompt.
    PromptChanged(PromptType),
    Hidden,
    Ignored,
}

/// Drives an [`OverlaySurface`].
pub struct OverlayPresenter<S: OverlaySurface> {
    surface: S,
    settings: OverlaySettings,
    state: OverlayState,
    layout: PanelLayout,
    prompt: PromptType,
    fade: Option<Fade>,
    drag: DragController,
    closed: bool,
}

impl<S: OverlaySurface> OverlayPresenter<S> {
    pub fn new(surface: S, settings: OverlaySettings, prompt: PromptType) -> Self {
        let layout = PanelLayout::new(&settings, 0);
        Self {
            surface,
            settings,
            state: OverlayState::default(),
            layout,
            prompt,
            fade: None,
            drag: DragController::new(),
            closed: false,
        }
    }

    pub fn state(&self) -> &OverlayState {
        &self.state
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn layout(&self) -> PanelLayout {
        self.layout
    }

    pub fn prompt(&self) -> PromptType {
        self.prompt
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn is_animating(&self) -> bool {
        self.fade.is_some()
    }

    /// Earliest instant `tick` has work to do.
    pub fn next_deadline(&self) -> Option<Instant> {
        match (self.fade, self.state.hide_deadline) {
            (Some(fade), Some(deadline)) => Some(fade.ends_at().min(deadline)),
            (Some(fade), None) => Some(fade.ends_at()),
            (None, deadline) => deadline,
        }
    }

    /// Apply new overlay settings. Turning auto-hide off cancels the countdown.
    pub fn configure(&mut self, settings: OverlaySettings) {
        self.settings = settings;
        if self.settings.auto_hide_after().is_none() {
            self.state.hide_deadline = None;
        }
        self.relayout();
    }

    /// Cover `rect` exactly.
    pub fn position_over(&mut self, rect: Rect) {
        if self.closed {
            return;
        }
        self.state.x = rect.left;
        self.state.y = rect.top;
        self.state.width = rect.width();
        self.state.height = rect.height();
        self.surface.set_bounds(
            self.state.x,
            self.state.y,
            self.state.width,
            self.state.height,
        );
        self.relayout();
    }

    /// Display `text`, fading in and (re)arming auto-hide.
    pub fn show(&mut self, text: &str, now: Instant) {
        if self.closed {
            return;
        }
        self.state.text = text.to_string();
        self.remeasure();
        self.push_content();

        if !self.state.visible {
            self.state.visible = true;
            self.surface.set_visible(true);
        }

        self.fade = Some(Fade::fade_in(now));
        self.set_opacity(0.0);
        self.state.hide_deadline = self.settings.auto_hide_after().map(|d| now + d);
    }

    /// Hide immediately, cancelling any fade and countdown.
    pub fn hide(&mut self) {
        self.fade = None;
        self.state.hide_deadline = None;
        if self.state.visible {
            self.state.visible = false;
            self.surface.set_visible(false);
        }
    }

    /// Advance the fade and auto-hide countdown.
    pub fn tick(&mut self, now: Instant) {
        if self.closed {
            return;
        }

        if let Some(deadline) = self.state.hide_deadline {
            if now >= deadline {
                self.state.hide_deadline = None;
                if self.state.visible {
                    self.fade = Some(Fade::fade_out(self.state.opacity, now));
                }
            }
        }

        if let Some(fade) = self.fade {
            self.set_opacity(fade.opacity_at(now));
            if fade.is_finished(now) {
                self.fade = None;
                if fade.is_fade_out() {
                    self.state.visible = false;
                    self.surface.set_visible(false);
                }
            }
        }
    }

    /// Sync the selector with an externally chosen prompt without notifying.
    pub fn set_prompt(&mut self, prompt: PromptType) {
        if self.prompt != prompt {
            self.prompt = prompt;
            self.push_content();
        }
    }

    /// Advance the selector and return the new prompt.
    pub fn cycle_prompt(&mut self) -> PromptType {
        self.prompt = self.prompt.next();
        self.push_content();
        self.prompt
    }

    /// Primary button pressed at surface-local `local`, screen `pointer`.
    pub fn pointer_down(&mut self, local: (i32, i32), pointer: (f64, f64)) -> PressOutcome {
        if self.closed || !self.state.visible {
            return PressOutcome::Ignored;
        }
        match self.layout.hit_test(local.0, local.1) {
            HitZone::CloseButton => {
                self.hide();
                PressOutcome::Hidden
            }
            HitZone::PromptLabel => PressOutcome::PromptChanged(self.cycle_prompt()),
            HitZone::DragHandle => {
                let position = (f64::from(self.state.x), f64::from(self.state.y));
                if self.drag.press(pointer, true, position) {
                    self.surface.capture_pointer();
                    PressOutcome::DragStarted
                } else {
                    PressOutcome::Ignored
                }
            }
            HitZone::Body | HitZone::Outside => PressOutcome::Ignored,
        }
    }

    /// Pointer moved to screen `pointer`.
    pub fn pointer_move(&mut self, pointer: (f64, f64)) -> Option<(i32, i32)> {
        let (x, y) = self.drag.moved(pointer)?;
        if (x, y) != (self.state.x, self.state.y) {
            self.state.x = x;
            self.state.y = y;
            self.surface.set_position(x, y);
        }
        Some((x, y))
    }

    pub fn pointer_up(&mut self) {
        if self.drag.release() {
            self.surface.release_pointer();
        }
    }

    pub fn capture_lost(&mut self) {
        self.drag.capture_lost();
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_dragging()
    }

    /// Cancel timers and destroy the surface. Further calls are no-ops.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        if self.drag.release() {
            self.surface.release_pointer();
        }
        self.fade = None;
        self.state.hide_deadline = None;
        self.state.visible = false;
        self.closed = true;
        self.surface.destroy();
    }

    fn set_opacity(&mut self, opacity: f64) {
        self.state.opacity = opacity;
        self.surface.set_opacity(opacity);
    }

    fn relayout(&mut self) {
        self.layout = PanelLayout::new(&self.settings, self.state.width);
        self.remeasure();
        self.push_content();
    }

    fn remeasure(&mut self) {
        self.layout.body_height = if self.state.text.is_empty() {
            0
        } else {
            self.surface
                .measure_body(&self.state.text, self.layout.width, self.settings.font_size)
                .max(0)
        };
    }

    fn push_content(&mut self) {
        let content = OverlayContent {
            text: self.state.text.clone(),
            prompt: self.prompt,
            layout: self.layout,
            font_size: self.settings.font_size,
        };
        self.surface.set_content(&content);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[derive(Default)]
    struct RecordingSurface {
        bounds: Option<(i32, i32, i32, i32)>,
        positions: Vec<(i32, i32)>,
        opacity: f64,
        visible: bool,
        content: Option<OverlayContent>,
        captured: bool,
        destroyed: bool,
    }

    impl OverlaySurface for RecordingSurface {
        fn set_bounds(&mut self, x: i32, y: i32, width: i32, height: i32) {
            self.bounds = Some((x, y, width, height));
        }
        fn set_position(&mut self, x: i32, y: i32) {
            self.positions.push((x, y));
        }
        fn set_opacity(&mut self, opacity: f64) {
            self.opacity = opacity;
        }
        fn set_content(&mut self, content: &OverlayContent) {
            self.content = Some(content.clone());
        }
        fn measure_body(&mut self, text: &str, _width: i32, font_size: i32) -> i32 {
            // one line per 40 chars
            (text.chars().count() as i32 / 40 + 1) * (font_size + 4)
        }
        fn set_visible(&mut self, visible: bool) {
            self.visible = visible;
        }
        fn capture_pointer(&mut self) {
            self.captured = true;
        }
        fn release_pointer(&mut self) {
            self.captured = false;
        }
        fn destroy(&mut self) {
            self.destroyed = true;
        }
    }

    fn presenter() -> OverlayPresenter<RecordingSurface> {
        let mut p = OverlayPresenter::new(
            RecordingSurface::default(),
            OverlaySettings::default(),
            PromptType::Default,
        );
        p.position_over(Rect::new(100, 100, 1380, 820));
        p
    }

    fn header_point(p: &OverlayPresenter<RecordingSurface>) -> (i32, i32) {
        let header = p.layout().header();
        (header.left + PROMPT_LABEL_WIDTH + 10, header.top + 5)
    }

    #[test]
    fn test_position_over_copies_rect() {
        let p = presenter();
        assert_eq!(p.surface().bounds, Some((100, 100, 1280, 720)));
        assert_eq!((p.state().width, p.state().height), (1280, 720));
    }

    #[test]
    fn test_show_fades_in_and_auto_hides() {
        let mut p = presenter();
        let t0 = Instant::now();
        p.show("Take Roshan", t0);

        assert!(p.state().visible);
        assert_eq!(p.state().opacity, 0.0);
        assert_eq!(p.state().hide_deadline, Some(t0 + Duration::from_secs(30)));

        p.tick(t0 + Duration::from_millis(300));
        assert_eq!(p.state().opacity, 1.0);
        assert!(!p.is_animating());

        p.tick(t0 + Duration::from_secs(30));
        assert!(p.is_animating());
        assert!(p.state().visible);

        p.tick(t0 + Duration::from_millis(30_300));
        assert!(!p.state().visible);
        assert!(!p.surface().visible);
        assert_eq!(p.state().opacity, 0.0);
    }

    #[test]
    fn test_new_show_cancels_fade_out() {
        let mut p = presenter();
        let t0 = Instant::now();
        p.show("first", t0);
        p.tick(t0 + Duration::from_secs(30));
        assert!(p.is_animating());

        let t1 = t0 + Duration::from_millis(30_100);
        p.show("second", t1);
        p.tick(t0 + Duration::from_secs(31));
        assert!(p.state().visible);
        assert_eq!(p.state().text, "second");
        assert_eq!(p.state().hide_deadline, Some(t1 + Duration::from_secs(30)));
    }

    #[test]
    fn test_auto_hide_disabled() {
        let mut p = presenter();
        p.configure(OverlaySettings {
            auto_hide_enabled: false,
            ..OverlaySettings::default()
        });
        let t0 = Instant::now();
        p.show("stay", t0);
        assert_eq!(p.state().hide_deadline, None);
        p.tick(t0 + Duration::from_secs(3600));
        assert!(p.state().visible);
    }

    #[test]
    fn test_drag_sends_integer_positions() {
        let mut p = presenter();
        p.show("x", Instant::now());
        let local = header_point(&p);

        assert_eq!(p.pointer_down(local, (500.0, 300.0)), PressOutcome::DragStarted);
        assert!(p.surface().captured);

        assert_eq!(p.pointer_move((537.6, 287.8)), Some((138, 88)));
        assert_eq!(p.surface().positions, vec![(138, 88)]);

        p.pointer_up();
        assert!(!p.surface().captured);
        assert_eq!(p.pointer_move((600.0, 600.0)), None);
    }

    #[test]
    fn test_prompt_label_cycles() {
        let mut p = presenter();
        p.show("x", Instant::now());
        let label = p.layout().prompt_label();
        let outcome = p.pointer_down((label.left + 1, label.top + 1), (0.0, 0.0));
        assert_eq!(outcome, PressOutcome::PromptChanged(PromptType::LaningPhase));
        assert_eq!(p.surface().content.as_ref().unwrap().prompt, PromptType::LaningPhase);
    }

    #[test]
    fn test_close_button_hides() {
        let mut p = presenter();
        p.show("x", Instant::now());
        let close = p.layout().close_button();
        let outcome = p.pointer_down((close.left + 1, close.top + 1), (0.0, 0.0));
        assert_eq!(outcome, PressOutcome::Hidden);
        assert!(!p.state().visible);
        assert_eq!(p.state().hide_deadline, None);
    }

    #[test]
    fn test_close_destroys_and_ignores_later_calls() {
        let mut p = presenter();
        p.show("x", Instant::now());
        p.close();
        assert!(p.surface().destroyed);
        p.show("late", Instant::now());
        assert!(!p.state().visible);
    }

    #[test]
    fn test_body_height_follows_text() {
        let mut p = presenter();
        assert_eq!(p.layout().body_height, 0);

        p.show("short", Instant::now());
        assert_eq!(p.layout().body_height, 20);

        p.show(&"x".repeat(85), Instant::now());
        assert_eq!(p.layout().body_height, 60);
        let panel = p.surface().content.as_ref().unwrap().layout.panel();
        assert_eq!(panel.height(), p.layout().header_height + 60);
    }

    #[test]
    fn test_hit_test_zones() {
        let layout = PanelLayout::new(&OverlaySettings::default(), 1280);
        assert_eq!(layout.width, 600);
        assert_eq!(layout.hit_test(0, 0), HitZone::Outside);
        assert_eq!(layout.hit_test(PANEL_MARGIN + 1, PANEL_MARGIN + 1), HitZone::PromptLabel);
        assert_eq!(
            layout.hit_test(PANEL_MARGIN + 600 - 1, PANEL_MARGIN + 1),
            HitZone::CloseButton
        );
        assert_eq!(layout.hit_test(PANEL_MARGIN + 300, PANEL_MARGIN + 1), HitZone::DragHandle);
    }
}
