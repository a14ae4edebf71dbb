//! Capture orchestration
//!
//! [`Orchestrator`] owns the run state, the active provider, the suggestion
//! slot and the held upload. Each cycle is split in two halves so the network
//! call can run without holding the orchestrator:
//!
//! 1. `begin` locates, captures and encodes, returning a [`PendingAnalysis`]
//! 2. `complete` presents and persists the result
//!
//! [`runner::run`] drives both halves from a single tokio task.

mod events;
mod runner;

pub use events::{
    CaptureStats, CycleTrigger, PreviewInfo, RunState, SuggestionEvent, UiEvent, UiSender,
};
pub use runner::{run, Command, OrchestratorHandle};

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Local;
use image::RgbaImage;
use tracing::{debug, info, warn};

use crate::capture::ScreenCapturer;
use crate::codec::{self, EncodedImage};
use crate::config::{AppConfig, PromptType};
use crate::error::Result;
use crate::locator::{TargetLocator, WindowSystem};
use crate::session::SessionStore;
use crate::vision::{ProviderConfig, VisionAnalyzer};

/// Text shown when the overlay is requested before any suggestion exists.
pub const OVERLAY_TEST_TEXT: &str = "悬浮窗测试：分析建议会显示在这里。";

/// A unit of work the runner can start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleRequest {
    Capture(CycleTrigger),
    Reanalyze,
    Upload(PathBuf),
}

/// Identifies the cycle a result belongs to.
#[derive(Debug, Clone)]
pub struct CycleTicket {
    pub trigger: CycleTrigger,
    pub generation: u64,
    bitmap: Arc<RgbaImage>,
}

/// Everything the vision call needs, detached from the orchestrator.
#[derive(Debug)]
pub struct PendingAnalysis {
    pub ticket: CycleTicket,
    pub provider: ProviderConfig,
    pub prompt: String,
    pub image: EncodedImage,
}

impl PendingAnalysis {
    /// Run the vision call.
    pub async fn execute<A>(self, analyzer: Arc<A>) -> (CycleTicket, Result<Option<String>>)
    where
        A: VisionAnalyzer + ?Sized,
    {
        let result = analyzer
            .analyze(&self.provider, &self.image, &self.prompt)
            .await;
        (self.ticket, result)
    }
}

struct HeldImage {
    bitmap: Arc<RgbaImage>,
    encoded: EncodedImage,
}

/// Ties locating, capturing, encoding, analysis and presentation together.
pub struct Orchestrator<W, C, A> {
    config: AppConfig,
    config_path: Option<PathBuf>,
    provider: ProviderConfig,
    locator: TargetLocator<W>,
    capturer: C,
    analyzer: Arc<A>,
    store: SessionStore,
    events: UiSender,
    run_state: RunState,
    generation: u64,
    in_flight: bool,
    target_active: Option<bool>,
    suggestion: Option<String>,
    held_upload: Option<HeldImage>,
    stats: CaptureStats,
    disposed: bool,
}

impl<W, C, A> Orchestrator<W, C, A>
where
    W: WindowSystem,
    C: ScreenCapturer,
    A: VisionAnalyzer,
{
    pub fn new(
        config: AppConfig,
        windows: W,
        capturer: C,
        analyzer: A,
        store: SessionStore,
        events: UiSender,
    ) -> Self {
        let locator = TargetLocator::new(windows, config.target_process.clone(), config.dota2_only);
        let provider = config.active_provider();
        Self {
            config,
            config_path: None,
            provider,
            locator,
            capturer,
            analyzer: Arc::new(analyzer),
            store,
            events,
            run_state: RunState::Stopped,
            generation: 0,
            in_flight: false,
            target_active: None,
            suggestion: None,
            held_upload: None,
            stats: CaptureStats::default(),
            disposed: false,
        }
    }

    /// Persist prompt changes to `path`.
    pub fn with_config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_path = Some(path.into());
        self
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn provider(&self) -> &ProviderConfig {
        &self.provider
    }

    pub fn analyzer(&self) -> Arc<A> {
        Arc::clone(&self.analyzer)
    }

    pub fn run_state(&self) -> RunState {
        self.run_state
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight
    }

    pub fn suggestion(&self) -> Option<&str> {
        self.suggestion.as_deref()
    }

    pub fn stats(&self) -> CaptureStats {
        self.stats
    }

    pub fn has_held_upload(&self) -> bool {
        self.held_upload.is_some()
    }

    // ==================== Run state ====================

    /// Enter the running state. Refused without a credential.
    pub fn start(&mut self) -> bool {
        if self.disposed || self.run_state.is_running() {
            return false;
        }
        if !self.require_credential() {
            return false;
        }

        self.generation += 1;
        self.run_state = RunState::Running;
        self.store.begin_session(Local::now());
        info!(
            "Started: {} every {}s, scoped to {}: {}",
            self.provider.kind,
            self.config.interval_seconds,
            self.locator.process_name(),
            self.locator.is_scoped()
        );
        self.events.send(UiEvent::RunStateChanged(RunState::Running));
        self.events.status("Running...");
        true
    }

    /// Leave the running state. Outstanding capture results will be dropped.
    pub fn stop(&mut self) {
        if !self.run_state.is_running() {
            return;
        }
        self.generation += 1;
        self.run_state = RunState::Stopped;
        info!("Stopped");
        self.events.send(UiEvent::RunStateChanged(RunState::Stopped));
        self.events.status("Stopped.");
    }

    /// Stop and tell the UI to close the overlay. Idempotent.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.stop();
        self.disposed = true;
        self.events.send(UiEvent::Shutdown);
    }

    // ==================== Cycles ====================

    /// Start the first half of a cycle.
    pub fn begin(&mut self, request: CycleRequest) -> Option<PendingAnalysis> {
        if self.disposed {
            return None;
        }
        if self.in_flight {
            debug!("Skipping {:?}: analysis in flight", request);
            return None;
        }
        match request {
            CycleRequest::Capture(trigger) => self.begin_capture(trigger),
            CycleRequest::Reanalyze => self.begin_reanalysis(),
            CycleRequest::Upload(path) => self.begin_upload(&path),
        }
    }

    fn begin_capture(&mut self, trigger: CycleTrigger) -> Option<PendingAnalysis> {
        if !self.run_state.is_running() {
            if trigger == CycleTrigger::Manual {
                self.events.status("Not running. Start the assistant first.");
            }
            return None;
        }

        let active = self.locator.is_target_active();
        self.set_target_active(active);
        if self.locator.is_scoped() && !active {
            debug!("Target not in foreground, skipping {:?} cycle", trigger);
            return None;
        }

        let frame = self
            .locator
            .locate_target()
            .and_then(|window| self.capturer.capture(window));
        let Some(frame) = frame else {
            self.events.status("Failed to capture window.");
            return None;
        };

        self.stats.capture_count += 1;
        self.stats.last_capture = Some(frame.timestamp);

        let bitmap = Arc::new(frame.image);
        let encoded = match codec::encode_with(&bitmap, &self.config.compression) {
            Ok(encoded) => encoded,
            Err(e) => {
                warn!("Encoding failed: {}", e);
                self.events.status(format!("Error: {}", e));
                return None;
            }
        };

        Some(self.launch(trigger, bitmap, encoded, "Analyzing..."))
    }

    fn begin_reanalysis(&mut self) -> Option<PendingAnalysis> {
        let (bitmap, encoded) = match &self.held_upload {
            Some(held) => (Arc::clone(&held.bitmap), held.encoded.clone()),
            None => return None,
        };
        if !self.require_credential() {
            return None;
        }
        Some(self.launch(
            CycleTrigger::Reanalysis,
            bitmap,
            encoded,
            "Reanalyzing with new prompt...",
        ))
    }

    fn begin_upload(&mut self, path: &Path) -> Option<PendingAnalysis> {
        if !self.require_credential() {
            return None;
        }

        let bitmap = match codec::decode_file(path) {
            Ok(bitmap) => Arc::new(bitmap),
            Err(e) => {
                warn!("Could not load {}: {}", path.display(), e);
                self.events.status(format!("Error: {}", e));
                return None;
            }
        };
        let encoded = match codec::encode_with(&bitmap, &self.config.compression) {
            Ok(encoded) => encoded,
            Err(e) => {
                self.events.status(format!("Error: {}", e));
                return None;
            }
        };

        info!("Analyzing uploaded image {}", path.display());
        self.held_upload = Some(HeldImage {
            bitmap: Arc::clone(&bitmap),
            encoded: encoded.clone(),
        });
        Some(self.launch(CycleTrigger::Upload, bitmap, encoded, "Analyzing..."))
    }

    fn launch(
        &mut self,
        trigger: CycleTrigger,
        bitmap: Arc<RgbaImage>,
        image: EncodedImage,
        status: &str,
    ) -> PendingAnalysis {
        if self.config.show_preview {
            self.events.send(UiEvent::Preview(PreviewInfo {
                width: image.width,
                height: image.height,
                encoded_bytes: image.len(),
                stats: self.stats,
            }));
        }

        self.in_flight = true;
        self.events.status(status);

        PendingAnalysis {
            ticket: CycleTicket {
                trigger,
                generation: self.generation,
                bitmap,
            },
            provider: self.provider.clone(),
            prompt: self.config.prompt_selection().resolve().to_string(),
            image,
        }
    }

    /// Finish a cycle with the vision call's result.
    pub fn complete(&mut self, ticket: CycleTicket, result: Result<Option<String>>) {
        self.in_flight = false;

        if ticket.trigger.captures_screen()
            && (!self.run_state.is_running() || ticket.generation != self.generation)
        {
            debug!(
                "Discarding result from generation {} (now {})",
                ticket.generation, self.generation
            );
            return;
        }

        match result {
            Ok(Some(text)) => self.present(ticket, text),
            Ok(None) => self.events.status("No suggestion returned."),
            Err(e) => {
                warn!("Analysis failed: {}", e);
                self.events.status(format!("Error: {}", e));
            }
        }
    }

    /// Run both halves of a cycle inline.
    pub async fn run_cycle(&mut self, request: CycleRequest) -> bool {
        let Some(pending) = self.begin(request) else {
            return false;
        };
        let (ticket, result) = pending.execute(self.analyzer()).await;
        self.complete(ticket, result);
        true
    }

    fn present(&mut self, ticket: CycleTicket, text: String) {
        let now = Local::now();
        self.suggestion = Some(text.clone());

        let active = self.locator.is_target_active();
        self.set_target_active(active);
        let show_overlay = self.config.overlay.enabled
            && (ticket.trigger.displays_unconditionally() || active);

        self.events.send(UiEvent::Suggestion(SuggestionEvent {
            text: text.clone(),
            show_overlay,
            anchor: self.locator.overlay_anchor(),
            prompt: self.config.selected_prompt,
        }));
        self.events
            .status(format!("Suggestion generated at {}", now.format("%H:%M:%S")));

        if let Err(e) = self.store.save(&ticket.bitmap, &text, now) {
            warn!("{}", e);
            self.events.status(format!("Suggestion shown; {}", e));
        }
    }

    // ==================== Commands ====================

    /// Change the prompt. Returns the cycle that should follow, if any.
    pub fn select_prompt(&mut self, prompt: PromptType) -> Option<CycleRequest> {
        if prompt == self.config.selected_prompt {
            return None;
        }
        self.config.selected_prompt = prompt;
        self.persist_config();
        self.events.send(UiEvent::PromptChanged(prompt));
        info!("Prompt changed to {}", prompt);

        if self.held_upload.is_some() {
            Some(CycleRequest::Reanalyze)
        } else if self.run_state.is_running() {
            Some(CycleRequest::Capture(CycleTrigger::Manual))
        } else {
            None
        }
    }

    /// Show the last suggestion, or a test text, regardless of focus.
    pub fn show_overlay(&mut self) {
        let text = self
            .suggestion
            .clone()
            .unwrap_or_else(|| OVERLAY_TEST_TEXT.to_string());
        self.events.send(UiEvent::Suggestion(SuggestionEvent {
            text,
            show_overlay: true,
            anchor: self.locator.overlay_anchor(),
            prompt: self.config.selected_prompt,
        }));
    }

    /// Apply a new configuration snapshot.
    pub fn reconfigure(&mut self, config: AppConfig) {
        self.locator
            .set_scope(config.target_process.clone(), config.dota2_only);
        self.provider = config.active_provider();
        let prompt_changed = config.selected_prompt != self.config.selected_prompt;
        self.config = config;
        if prompt_changed {
            self.events
                .send(UiEvent::PromptChanged(self.config.selected_prompt));
        }
        info!(
            "Configuration applied: {} ({})",
            self.provider.kind, self.provider.model
        );
        self.events.status("Settings applied.");
    }

    fn require_credential(&self) -> bool {
        if self.provider.is_configured() {
            return true;
        }
        warn!("{} API key is not configured", self.provider.kind);
        self.events.send(UiEvent::Warning {
            title: "API Key Required".to_string(),
            message: format!(
                "Please configure your {} API key in Settings first.",
                self.provider.kind
            ),
        });
        self.events.status("API key required.");
        false
    }

    fn set_target_active(&mut self, active: bool) {
        if self.target_active != Some(active) {
            self.target_active = Some(active);
            self.events.send(UiEvent::TargetActive(active));
        }
    }

    fn persist_config(&self) {
        if let Some(path) = &self.config_path {
            if let Err(e) = self.config.save_to(path) {
                warn!("Could not save config: {}", e);
            }
        }
    }
}
