//! Messages from the orchestrator to the UI thread.

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;

use chrono::{DateTime, Local};

use crate::config::PromptType;
use crate::locator::Rect;

/// Whether automatic capture is running.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RunState {
    #[default]
    Stopped,
    Running,
}

impl RunState {
    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running)
    }
}

impl std::fmt::Display for RunState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Stopped => write!(f, "Stopped"),
            Self::Running => write!(f, "Running"),
        }
    }
}

/// What started an analysis cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleTrigger {
    /// Periodic tick, including the immediate cycle on start
    Timer,
    /// "Capture now"
    Manual,
    /// A screenshot file
    Upload,
    /// The held upload re-sent with a new prompt
    Reanalysis,
}

impl CycleTrigger {
    /// Timer and manual cycles capture the screen and only run while started.
    pub fn captures_screen(&self) -> bool {
        matches!(self, Self::Timer | Self::Manual)
    }

    /// Whether a result is shown even if the game is not in the foreground.
    pub fn displays_unconditionally(&self) -> bool {
        !matches!(self, Self::Timer)
    }
}

/// Running capture counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CaptureStats {
    pub capture_count: u64,
    pub last_capture: Option<DateTime<Local>>,
}

/// Summary of the image most recently sent for analysis.
#[derive(Debug, Clone, PartialEq)]
pub struct PreviewInfo {
    pub width: u32,
    pub height: u32,
    pub encoded_bytes: usize,
    pub stats: CaptureStats,
}

/// A suggestion to present.
#[derive(Debug, Clone, PartialEq)]
pub struct SuggestionEvent {
    pub text: String,
    /// Whether the overlay should display it
    pub show_overlay: bool,
    /// Rectangle to position the overlay over
    pub anchor: Option<Rect>,
    pub prompt: PromptType,
}

/// Events for the UI thread.
#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent {
    Status(String),
    TargetActive(bool),
    RunStateChanged(RunState),
    /// Needs user attention, e.g. a missing API key
    Warning {
        title: String,
        message: String,
    },
    Preview(PreviewInfo),
    Suggestion(SuggestionEvent),
    PromptChanged(PromptType),
    /// The orchestrator has stopped for good; close the overlay
    Shutdown,
}

/// Sending half of the UI event channel.
///
/// The optional waker is called after every send so a UI thread blocked in
/// its message loop can drain the channel.
#[derive(Clone)]
pub struct UiSender {
    tx: Sender<UiEvent>,
    waker: Option<Arc<dyn Fn() + Send + Sync>>,
}

impl UiSender {
    /// Create a channel with no waker.
    pub fn channel() -> (Self, Receiver<UiEvent>) {
        let (tx, rx) = mpsc::channel();
        (Self { tx, waker: None }, rx)
    }

    /// Create a channel whose sends also call `waker`.
    pub fn with_waker(waker: impl Fn() + Send + Sync + 'static) -> (Self, Receiver<UiEvent>) {
        let (tx, rx) = mpsc::channel();
        (
            Self {
                tx,
                waker: Some(Arc::new(waker)),
            },
            rx,
        )
    }

    /// Send an event. A closed receiver is ignored.
    pub fn send(&self, event: UiEvent) {
        if self.tx.send(event).is_ok() {
            if let Some(waker) = &self.waker {
                waker();
            }
        }
    }

    pub fn status(&self, message: impl Into<String>) {
        self.send(UiEvent::Status(message.into()));
    }
}

impl std::fmt::Debug for UiSender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UiSender")
            .field("has_waker", &self.waker.is_some())
            .finish()
    }
}
