//! UI-thread state: routes orchestrator events to the overlay and user input
//! back to the orchestrator.

use std::path::PathBuf;
use std::time::Instant;

use game_assist_core::overlay::PressOutcome;
use game_assist_core::{
    AppConfig, Command, OverlayPresenter, OverlaySurface, RunState, UiEvent,
};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, warn};

use crate::hotkeys::Hotkey;

/// Something the platform layer must do after an event is handled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Show a blocking message box
    Warn { title: String, message: String },
    /// Leave the message loop
    Quit,
}

pub struct App<S: OverlaySurface> {
    commands: UnboundedSender<Command>,
    overlay: OverlayPresenter<S>,
    config_path: Option<PathBuf>,
    status: String,
    run_state: RunState,
    target_active: bool,
}

impl<S: OverlaySurface> App<S> {
    pub fn new(
        commands: UnboundedSender<Command>,
        overlay: OverlayPresenter<S>,
        config_path: Option<PathBuf>,
    ) -> Self {
        Self {
            commands,
            overlay,
            config_path,
            status: String::new(),
            run_state: RunState::Stopped,
            target_active: false,
        }
    }

    pub fn overlay(&self) -> &OverlayPresenter<S> {
        &self.overlay
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn run_state(&self) -> RunState {
        self.run_state
    }

    pub fn is_target_active(&self) -> bool {
        self.target_active
    }

    /// Send a command. A finished orchestrator means the app should quit.
    pub fn send(&self, command: Command) -> Option<Effect> {
        if self.commands.send(command).is_err() {
            warn!("Orchestrator is gone, quitting");
            return Some(Effect::Quit);
        }
        None
    }

    pub fn handle_event(&mut self, event: UiEvent, now: Instant) -> Option<Effect> {
        match event {
            UiEvent::Status(status) => {
                info!("{}", status);
                self.status = status;
            }
            UiEvent::TargetActive(active) => {
                debug!("Target active: {}", active);
                self.target_active = active;
            }
            UiEvent::RunStateChanged(state) => {
                info!("Run state: {}", state);
                self.run_state = state;
            }
            UiEvent::Warning { title, message } => {
                warn!("{}: {}", title, message);
                return Some(Effect::Warn { title, message });
            }
            UiEvent::Preview(preview) => {
                debug!(
                    "Capture #{}: {}x{}, {} bytes",
                    preview.stats.capture_count,
                    preview.width,
                    preview.height,
                    preview.encoded_bytes
                );
            }
            UiEvent::Suggestion(suggestion) => {
                self.overlay.set_prompt(suggestion.prompt);
                if suggestion.show_overlay {
                    match suggestion.anchor {
                        Some(_) if self.overlay.is_dragging() => {
                            debug!("Suggestion arrived mid-drag; keeping panel position");
                        }
                        Some(anchor) => self.overlay.position_over(anchor),
                        None => {}
                    }
                    self.overlay.show(&suggestion.text, now);
                } else {
                    debug!("Suggestion kept off screen");
                }
            }
            UiEvent::PromptChanged(prompt) => self.overlay.set_prompt(prompt),
            UiEvent::Shutdown => {
                self.overlay.close();
                return Some(Effect::Quit);
            }
        }
        None
    }

    pub fn handle_hotkey(&mut self, hotkey: Hotkey) -> Option<Effect> {
        debug!("Hotkey {}", hotkey.chord());
        match hotkey {
            Hotkey::ToggleRun => self.send(Command::Toggle),
            Hotkey::CaptureNow => self.send(Command::CaptureNow),
            Hotkey::ShowOverlay => self.send(Command::ShowOverlay),
            Hotkey::CyclePrompt => self.send(Command::CyclePrompt),
            Hotkey::ReloadConfig => {
                let config = match &self.config_path {
                    Some(path) => AppConfig::load_from(path),
                    None => AppConfig::load(),
                };
                self.overlay.configure(config.overlay.clone());
                self.send(Command::Reconfigure(Box::new(config)))
            }
            Hotkey::Quit => self.send(Command::Shutdown),
        }
    }

    /// Primary button pressed on the overlay.
    pub fn pointer_down(&mut self, local: (i32, i32), screen: (f64, f64)) -> Option<Effect> {
        match self.overlay.pointer_down(local, screen) {
            PressOutcome::PromptChanged(prompt) => self.send(Command::SelectPrompt(prompt)),
            PressOutcome::Hidden => {
                debug!("Overlay closed by user");
                None
            }
            PressOutcome::DragStarted | PressOutcome::Ignored => None,
        }
    }

    pub fn pointer_move(&mut self, screen: (f64, f64)) {
        self.overlay.pointer_move(screen);
    }

    pub fn pointer_up(&mut self) {
        self.overlay.pointer_up();
    }

    pub fn capture_lost(&mut self) {
        self.overlay.capture_lost();
    }

    pub fn is_dragging(&self) -> bool {
        self.overlay.is_dragging()
    }

    pub fn tick(&mut self, now: Instant) {
        self.overlay.tick(now);
    }

    /// When the overlay next needs a tick, if ever.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.overlay.next_deadline()
    }

    pub fn is_animating(&self) -> bool {
        self.overlay.is_animating()
    }

    pub fn close(&mut self) {
        self.overlay.close();
    }
}
