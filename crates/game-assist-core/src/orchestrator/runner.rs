//! The orchestrator's task: one `select!` loop over commands, the capture
//! timer and the in-flight analysis.

use std::collections::VecDeque;
use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};
use tracing::{debug, info};

use super::{CycleRequest, CycleTicket, CycleTrigger, Orchestrator};
use crate::capture::ScreenCapturer;
use crate::config::{AppConfig, PromptType};
use crate::error::Result;
use crate::locator::WindowSystem;
use crate::vision::VisionAnalyzer;

/// Requests from the UI to the orchestrator.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Start,
    Stop,
    /// Start if stopped, stop if running
    Toggle,
    CaptureNow,
    SelectPrompt(PromptType),
    CyclePrompt,
    Upload(PathBuf),
    ShowOverlay,
    Reconfigure(Box<AppConfig>),
    Shutdown,
}

type AnalysisFuture = Pin<Box<dyn Future<Output = (CycleTicket, Result<Option<String>>)> + Send>>;

/// Handle to a spawned orchestrator task.
pub struct OrchestratorHandle {
    tx: UnboundedSender<Command>,
    task: Option<JoinHandle<()>>,
}

impl OrchestratorHandle {
    /// Spawn `orchestrator` on `runtime`.
    pub fn spawn<W, C, A>(orchestrator: Orchestrator<W, C, A>, runtime: &Handle) -> Self
    where
        W: WindowSystem + 'static,
        C: ScreenCapturer + 'static,
        A: VisionAnalyzer + 'static,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        let task = runtime.spawn(run(orchestrator, rx));
        Self {
            tx,
            task: Some(task),
        }
    }

    /// Queue a command. Returns `false` if the task has exited.
    pub fn send(&self, command: Command) -> bool {
        self.tx.send(command).is_ok()
    }

    pub fn sender(&self) -> UnboundedSender<Command> {
        self.tx.clone()
    }

    /// Shut the task down and wait for it from async code.
    pub async fn shutdown(mut self) {
        let _ = self.tx.send(Command::Shutdown);
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }

    /// Shut the task down and block until it exits. Call from outside the runtime.
    pub fn shutdown_blocking(mut self, runtime: &Handle) {
        let _ = self.tx.send(Command::Shutdown);
        if let Some(task) = self.task.take() {
            let _ = runtime.block_on(task);
        }
    }
}

fn arm_timer(period: Duration) -> Interval {
    let mut timer = interval_at(Instant::now() + period, period);
    timer.set_missed_tick_behavior(MissedTickBehavior::Skip);
    timer
}

async fn next_tick(timer: &mut Option<Interval>) {
    match timer {
        Some(timer) => {
            timer.tick().await;
        }
        None => std::future::pending().await,
    }
}

/// Requests waiting for the in-flight analysis to finish.
///
/// Uploads queue in arrival order. Any other request replaces the previous
/// non-upload request, so only the latest capture or reanalysis runs.
#[derive(Debug, Default)]
struct PendingRequests {
    requests: VecDeque<CycleRequest>,
}

impl PendingRequests {
    fn push(&mut self, request: CycleRequest) {
        if !matches!(request, CycleRequest::Upload(_)) {
            self.requests
                .retain(|queued| matches!(queued, CycleRequest::Upload(_)));
        }
        self.requests.push_back(request);
    }

    fn pop(&mut self) -> Option<CycleRequest> {
        self.requests.pop_front()
    }

    fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    fn drop_captures(&mut self) {
        self.requests
            .retain(|queued| !matches!(queued, CycleRequest::Capture(_)));
    }
}

async fn next_result(in_flight: &mut Option<AnalysisFuture>) -> (CycleTicket, Result<Option<String>>) {
    match in_flight {
        Some(analysis) => analysis.await,
        None => std::future::pending().await,
    }
}

/// Drive `orchestrator` until shutdown or until every sender is dropped.
///
/// At most one analysis is outstanding. Timer ticks that arrive meanwhile are
/// dropped. Uploads wait their turn; other user requests coalesce to the latest.
pub async fn run<W, C, A>(mut orchestrator: Orchestrator<W, C, A>, mut rx: UnboundedReceiver<Command>)
where
    W: WindowSystem + 'static,
    C: ScreenCapturer + 'static,
    A: VisionAnalyzer + 'static,
{
    let mut timer: Option<Interval> = None;
    let mut in_flight: Option<AnalysisFuture> = None;
    let mut queued = PendingRequests::default();

    loop {
        if in_flight.is_none() {
            if let Some(request) = queued.pop() {
                in_flight = orchestrator
                    .begin(request)
                    .map(|pending| Box::pin(pending.execute(orchestrator.analyzer())) as AnalysisFuture);
            }
        }

        tokio::select! {
            command = rx.recv() => {
                let Some(command) = command else {
                    orchestrator.dispose();
                    break;
                };
                if command == Command::Shutdown {
                    orchestrator.dispose();
                    break;
                }
                handle_command(&mut orchestrator, command, &mut timer, &mut queued);
            }
            _ = next_tick(&mut timer) => {
                if in_flight.is_some() || !queued.is_empty() {
                    debug!("Tick skipped: analysis in flight");
                } else {
                    queued.push(CycleRequest::Capture(CycleTrigger::Timer));
                }
            }
            (ticket, result) = next_result(&mut in_flight), if in_flight.is_some() => {
                in_flight = None;
                orchestrator.complete(ticket, result);
            }
        }
    }

    info!("Orchestrator task exited");
}

fn handle_command<W, C, A>(
    orchestrator: &mut Orchestrator<W, C, A>,
    command: Command,
    timer: &mut Option<Interval>,
    queued: &mut PendingRequests,
) where
    W: WindowSystem,
    C: ScreenCapturer,
    A: VisionAnalyzer,
{
    match command {
        Command::Start => start(orchestrator, timer, queued),
        Command::Stop => stop(orchestrator, timer, queued),
        Command::Toggle => {
            if orchestrator.run_state().is_running() {
                stop(orchestrator, timer, queued);
            } else {
                start(orchestrator, timer, queued);
            }
        }
        Command::CaptureNow => queued.push(CycleRequest::Capture(CycleTrigger::Manual)),
        Command::SelectPrompt(prompt) => {
            if let Some(request) = orchestrator.select_prompt(prompt) {
                queued.push(request);
            }
        }
        Command::CyclePrompt => {
            let next = orchestrator.config().selected_prompt.next();
            if let Some(request) = orchestrator.select_prompt(next) {
                queued.push(request);
            }
        }
        Command::Upload(path) => queued.push(CycleRequest::Upload(path)),
        Command::ShowOverlay => orchestrator.show_overlay(),
        Command::Reconfigure(config) => {
            orchestrator.reconfigure(*config);
            if orchestrator.run_state().is_running() {
                *timer = Some(arm_timer(orchestrator.config().capture_interval()));
            }
        }
        Command::Shutdown => orchestrator.dispose(),
    }
}

fn start<W, C, A>(
    orchestrator: &mut Orchestrator<W, C, A>,
    timer: &mut Option<Interval>,
    queued: &mut PendingRequests,
) where
    W: WindowSystem,
    C: ScreenCapturer,
    A: VisionAnalyzer,
{
    if orchestrator.start() {
        *timer = Some(arm_timer(orchestrator.config().capture_interval()));
        queued.push(CycleRequest::Capture(CycleTrigger::Timer));
    }
}

fn stop<W, C, A>(
    orchestrator: &mut Orchestrator<W, C, A>,
    timer: &mut Option<Interval>,
    queued: &mut PendingRequests,
) where
    W: WindowSystem,
    C: ScreenCapturer,
    A: VisionAnalyzer,
{
    orchestrator.stop();
    *timer = None;
    queued.drop_captures();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_captures_coalesce_but_uploads_wait() {
        let mut queued = PendingRequests::default();
        queued.push(CycleRequest::Upload(PathBuf::from("a.png")));
        queued.push(CycleRequest::Capture(CycleTrigger::Timer));
        queued.push(CycleRequest::Upload(PathBuf::from("b.png")));
        queued.push(CycleRequest::Capture(CycleTrigger::Manual));

        assert_eq!(queued.pop(), Some(CycleRequest::Upload(PathBuf::from("a.png"))));
        assert_eq!(queued.pop(), Some(CycleRequest::Upload(PathBuf::from("b.png"))));
        assert_eq!(queued.pop(), Some(CycleRequest::Capture(CycleTrigger::Manual)));
        assert_eq!(queued.pop(), None);
    }

    #[test]
    fn test_stop_keeps_queued_uploads() {
        let mut queued = PendingRequests::default();
        queued.push(CycleRequest::Capture(CycleTrigger::Manual));
        queued.push(CycleRequest::Upload(PathBuf::from("a.png")));

        queued.drop_captures();

        assert_eq!(queued.pop(), Some(CycleRequest::Upload(PathBuf::from("a.png"))));
        assert!(queued.is_empty());
    }
}
