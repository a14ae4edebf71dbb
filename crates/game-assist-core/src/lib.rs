//! # game-assist-core
//!
//! Core library for a Dota 2 overlay assistant that periodically captures the
//! game window, asks a vision-capable language model for advice and shows the
//! answer in a floating overlay.
//!
//! ## Modules
//!
//! - [`capture`] - Screen-space capture of a window rectangle
//! - [`codec`] - PNG/JPEG encoding with size-budgeted JPEG compression
//! - [`config`] - Persisted settings and prompt presets
//! - [`error`] - Error types and Result alias
//! - [`locator`] - Foreground window and tracked-process detection
//! - [`orchestrator`] - The capture/analyze loop and its command runner
//! - [`overlay`] - Overlay presenter: positioning, fades, auto-hide, dragging
//! - [`session`] - Saving screenshots and suggestions per run
//! - [`vision`] - Vision API client for OpenAI, Zhipu AI and Doubao
//!
//! ## Example
//!
//! ```no_run
//! use game_assist_core::{AppConfig, VisionClient};
//!
//! let config = AppConfig::load();
//! let provider = config.active_provider();
//! if !provider.is_configured() {
//!     println!("Configure an API key for {} first", provider.kind);
//! }
//! let client = VisionClient::new(config.request_timeout()).expect("http client");
//! # let _ = client;
//! ```

pub mod capture;
pub mod codec;
pub mod config;
pub mod error;
pub mod locator;
pub mod orchestrator;
pub mod overlay;
pub mod session;
pub mod vision;

// Error types
pub use error::{Error, Result};

// Configuration
pub use config::{AppConfig, OverlaySettings, PromptSelection, PromptType};

// Locating and capturing
pub use capture::{CapturedFrame, ScreenBlitCapturer, ScreenCapturer};
pub use locator::{DesktopWindows, Rect, TargetLocator, WindowHandle, WindowSystem};

// Encoding
pub use codec::{encode, CompressionSettings, EncodedImage, ImageFormat};

// Vision API
pub use vision::{
    generate_signed_token, AuthMode, ProviderConfig, ProviderKind, VisionAnalyzer, VisionClient,
};

// Orchestration
pub use orchestrator::{
    Command, CycleTrigger, Orchestrator, OrchestratorHandle, RunState, UiEvent, UiSender,
};

// Overlay
pub use overlay::{DragController, OverlayPresenter, OverlayState, OverlaySurface};

// Persistence
pub use session::{SavedCapture, SessionStore};
