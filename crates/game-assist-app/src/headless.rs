//! One-shot analysis of a screenshot file, printed to stdout.

use std::path::Path;

use anyhow::Context;
use game_assist_core::orchestrator::CycleRequest;
use game_assist_core::{
    AppConfig, DesktopWindows, Orchestrator, PromptType, ScreenBlitCapturer, SessionStore,
    UiEvent, UiSender, VisionClient,
};
use tokio::runtime::Runtime;

pub fn run(runtime: &Runtime, path: &Path, prompt: Option<PromptType>) -> anyhow::Result<()> {
    if !path.is_file() {
        anyhow::bail!("{} is not a file", path.display());
    }

    let mut config = AppConfig::load();
    if let Some(prompt) = prompt {
        config.selected_prompt = prompt;
    }

    let client =
        VisionClient::new(config.request_timeout()).context("Failed to build HTTP client")?;
    let (events, rx) = UiSender::channel();
    let mut orchestrator = Orchestrator::new(
        config,
        DesktopWindows,
        ScreenBlitCapturer::new(DesktopWindows),
        client,
        SessionStore::new(SessionStore::default_base_dir()),
        events,
    );

    eprintln!(
        "Analyzing {} with {} ({})...",
        path.display(),
        orchestrator.provider().kind,
        orchestrator.provider().model
    );
    runtime.block_on(orchestrator.run_cycle(CycleRequest::Upload(path.to_path_buf())));

    let mut suggestion = None;
    let mut last_status = None;
    for event in rx.try_iter() {
        match event {
            UiEvent::Warning { title, message } => anyhow::bail!("{}: {}", title, message),
            UiEvent::Suggestion(event) => suggestion = Some(event.text),
            UiEvent::Status(status) => last_status = Some(status),
            _ => {}
        }
    }

    match suggestion {
        Some(text) => {
            println!("{}", text);
            Ok(())
        }
        None => anyhow::bail!(last_status.unwrap_or_else(|| "No suggestion returned.".into())),
    }
}
