//! Overlay presenter
//!
//! Platform-independent overlay behaviour: positioning over the target
//! window, fade animation, auto-hide countdown, drag-to-move and the prompt
//! selector. A windowing backend implements [`OverlaySurface`].

mod drag;
mod fade;
mod presenter;

pub use drag::{DragController, DragState};
pub use fade::{ease_in_out_sine, Fade, FADE_DURATION};
pub use presenter::{
    HitZone, OverlayContent, OverlayPresenter, OverlayState, OverlaySurface, PanelLayout,
    PressOutcome, CLOSE_BUTTON_SIZE, PANEL_MARGIN, PROMPT_LABEL_WIDTH,
};
