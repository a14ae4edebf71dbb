//! Win32 front end: a message-only control window for hotkeys and
//! orchestrator wake-ups, plus the overlay window.

mod overlay_window;

use std::cell::RefCell;
use std::sync::mpsc::Receiver;
use std::time::Instant;

use anyhow::Context;
use game_assist_core::{
    AppConfig, Command, DesktopWindows, Orchestrator, OrchestratorHandle, OverlayPresenter,
    ScreenBlitCapturer, SessionStore, UiEvent, UiSender, VisionClient,
};
use tokio::runtime::Runtime;
use tracing::{debug, info, warn};
use windows::core::{w, HSTRING, PCWSTR};
use windows::Win32::Foundation::{HINSTANCE, HWND, LPARAM, LRESULT, POINT, RECT, WPARAM};
use windows::Win32::Graphics::Gdi::{BeginPaint, EndPaint, PAINTSTRUCT};
use windows::Win32::System::LibraryLoader::GetModuleHandleW;
use windows::Win32::UI::Input::KeyboardAndMouse::{
    RegisterHotKey, UnregisterHotKey, MOD_ALT, MOD_CONTROL, MOD_NOREPEAT,
};
use windows::Win32::UI::WindowsAndMessaging::{
    CreateWindowExW, DefWindowProcW, DestroyWindow, DispatchMessageW, GetClientRect, GetCursorPos,
    GetMessageW, KillTimer, LoadCursorW, MessageBoxW, PostMessageW, PostQuitMessage,
    RegisterClassW, SetTimer, TranslateMessage, HWND_MESSAGE, IDC_ARROW, MA_NOACTIVATE,
    MB_ICONWARNING, MB_OK, MB_SETFOREGROUND, MB_TOPMOST, MSG, WINDOW_EX_STYLE, WINDOW_STYLE,
    WM_APP, WM_CAPTURECHANGED, WM_HOTKEY, WM_LBUTTONDOWN, WM_LBUTTONUP, WM_MOUSEACTIVATE,
    WM_MOUSEMOVE, WM_PAINT, WM_TIMER, WNDCLASSW,
};

use crate::app::{App, Effect};
use crate::args::Options;
use crate::hotkeys::Hotkey;
use overlay_window::Win32Overlay;

const CONTROL_CLASS: PCWSTR = w!("GameAssistControl");
const OVERLAY_CLASS: PCWSTR = w!("GameAssistOverlay");

/// Posted to the control window whenever a UI event is queued
const WM_APP_EVENTS: u32 = WM_APP + 1;
/// Fade and auto-hide timer on the overlay window
const TICK_TIMER: usize = 1;
/// Frame interval while a fade is running
const FRAME_MS: u32 = 16;

struct UiState {
    app: App<Win32Overlay>,
    events: Receiver<UiEvent>,
    overlay: HWND,
}

thread_local! {
    static STATE: RefCell<Option<UiState>> = const { RefCell::new(None) };
}

/// Run `f` on the UI state unless it is already borrowed further up the stack.
fn with_state<R>(f: impl FnOnce(&mut UiState) -> R) -> Option<R> {
    STATE.with(|cell| {
        let mut state = cell.try_borrow_mut().ok()?;
        state.as_mut().map(f)
    })
}

pub fn run(runtime: Runtime, options: Options) -> anyhow::Result<()> {
    let config_path = AppConfig::config_path();
    let mut config = AppConfig::load();
    if let Some(prompt) = options.prompt {
        config.selected_prompt = prompt;
    }

    let instance: HINSTANCE = unsafe { GetModuleHandleW(None)? }.into();
    register_classes(instance)?;

    let control = unsafe {
        CreateWindowExW(
            WINDOW_EX_STYLE::default(),
            CONTROL_CLASS,
            w!("Game Assist"),
            WINDOW_STYLE::default(),
            0,
            0,
            0,
            0,
            Some(HWND_MESSAGE),
            None,
            Some(instance),
            None,
        )
    }
    .context("Failed to create control window")?;
    let surface = Win32Overlay::create(instance).context("Failed to create overlay window")?;
    let overlay = surface.hwnd();

    // HWND is not Send; the waker rebuilds it from the raw value
    let control_raw = control.0 as isize;
    let (events, rx) = UiSender::with_waker(move || unsafe {
        let _ = PostMessageW(
            Some(HWND(control_raw as *mut _)),
            WM_APP_EVENTS,
            WPARAM(0),
            LPARAM(0),
        );
    });

    let client = VisionClient::new(config.request_timeout())?;
    let mut orchestrator = Orchestrator::new(
        config.clone(),
        DesktopWindows,
        ScreenBlitCapturer::new(DesktopWindows),
        client,
        SessionStore::new(SessionStore::default_base_dir()),
        events,
    );
    if let Some(path) = &config_path {
        orchestrator = orchestrator.with_config_path(path.clone());
    }
    let handle = OrchestratorHandle::spawn(orchestrator, runtime.handle());

    let presenter = OverlayPresenter::new(surface, config.overlay.clone(), config.selected_prompt);
    let app = App::new(handle.sender(), presenter, config_path);
    STATE.with(|cell| {
        *cell.borrow_mut() = Some(UiState {
            app,
            events: rx,
            overlay,
        })
    });

    register_hotkeys(control);
    info!("Ready: {} hotkeys registered", Hotkey::all().len());

    if options.start || config.auto_start {
        handle.send(Command::Start);
    }
    if let Some(path) = options.upload {
        handle.send(Command::Upload(path));
    }

    unsafe {
        let mut msg = MSG::default();
        while GetMessageW(&mut msg, None, 0, 0).as_bool() {
            let _ = TranslateMessage(&msg);
            DispatchMessageW(&msg);
        }
    }

    for hotkey in Hotkey::all() {
        unsafe {
            let _ = UnregisterHotKey(Some(control), hotkey.id());
        }
    }
    if let Some(mut state) = STATE.with(|cell| cell.borrow_mut().take()) {
        state.app.close();
    }
    handle.shutdown_blocking(runtime.handle());
    unsafe {
        let _ = DestroyWindow(control);
    }
    info!("Exited");
    Ok(())
}

fn register_classes(instance: HINSTANCE) -> anyhow::Result<()> {
    unsafe {
        let control = WNDCLASSW {
            lpfnWndProc: Some(control_wnd_proc),
            hInstance: instance,
            lpszClassName: CONTROL_CLASS,
            ..Default::default()
        };
        if RegisterClassW(&control) == 0 {
            anyhow::bail!("Failed to register control window class");
        }

        let overlay = WNDCLASSW {
            lpfnWndProc: Some(overlay_wnd_proc),
            hInstance: instance,
            hCursor: LoadCursorW(None, IDC_ARROW).unwrap_or_default(),
            lpszClassName: OVERLAY_CLASS,
            ..Default::default()
        };
        if RegisterClassW(&overlay) == 0 {
            anyhow::bail!("Failed to register overlay window class");
        }
    }
    Ok(())
}

fn register_hotkeys(control: HWND) {
    for hotkey in Hotkey::all() {
        let result = unsafe {
            RegisterHotKey(
                Some(control),
                hotkey.id(),
                MOD_CONTROL | MOD_ALT | MOD_NOREPEAT,
                hotkey.key() as u32,
            )
        };
        if let Err(e) = result {
            warn!("Could not register {}: {}", hotkey.chord(), e);
        }
    }
}

/// Re-arm the overlay timer for the presenter's next deadline.
fn schedule(state: &UiState) {
    if state.app.overlay().is_closed() {
        return;
    }
    let delay_ms = if state.app.is_animating() {
        Some(FRAME_MS)
    } else {
        state.app.next_deadline().map(|deadline| {
            let wait = deadline.saturating_duration_since(Instant::now());
            wait.as_millis().clamp(1, u128::from(u32::MAX)) as u32
        })
    };

    unsafe {
        match delay_ms {
            Some(ms) => {
                SetTimer(Some(state.overlay), TICK_TIMER, ms, None);
            }
            None => {
                let _ = KillTimer(Some(state.overlay), TICK_TIMER);
            }
        }
    }
}

/// Carry out effects once the UI state is no longer borrowed.
fn apply(effects: Vec<Effect>) {
    for effect in effects {
        match effect {
            Effect::Warn { title, message } => unsafe {
                let _ = MessageBoxW(
                    None,
                    &HSTRING::from(message),
                    &HSTRING::from(title),
                    MB_OK | MB_ICONWARNING | MB_TOPMOST | MB_SETFOREGROUND,
                );
            },
            Effect::Quit => unsafe { PostQuitMessage(0) },
        }
    }
}

fn drain_events() {
    let effects = with_state(|state| {
        let now = Instant::now();
        let effects: Vec<Effect> = state
            .events
            .try_iter()
            .filter_map(|event| state.app.handle_event(event, now))
            .collect();
        schedule(state);
        effects
    });
    apply(effects.unwrap_or_default());
}

fn cursor_position() -> (f64, f64) {
    let mut pt = POINT::default();
    unsafe {
        let _ = GetCursorPos(&mut pt);
    }
    (f64::from(pt.x), f64::from(pt.y))
}

fn client_point(lparam: LPARAM) -> (i32, i32) {
    let x = (lparam.0 & 0xFFFF) as i16 as i32;
    let y = ((lparam.0 >> 16) & 0xFFFF) as i16 as i32;
    (x, y)
}

unsafe extern "system" fn control_wnd_proc(
    hwnd: HWND,
    msg: u32,
    wparam: WPARAM,
    lparam: LPARAM,
) -> LRESULT {
    match msg {
        WM_APP_EVENTS => {
            drain_events();
            LRESULT(0)
        }
        WM_HOTKEY => {
            if let Some(hotkey) = Hotkey::from_id(wparam.0 as i32) {
                let effect = with_state(|state| state.app.handle_hotkey(hotkey)).flatten();
                apply(effect.into_iter().collect());
            }
            LRESULT(0)
        }
        _ => DefWindowProcW(hwnd, msg, wparam, lparam),
    }
}

unsafe extern "system" fn overlay_wnd_proc(
    hwnd: HWND,
    msg: u32,
    wparam: WPARAM,
    lparam: LPARAM,
) -> LRESULT {
    match msg {
        WM_MOUSEACTIVATE => LRESULT(MA_NOACTIVATE as isize),
        WM_LBUTTONDOWN => {
            let local = client_point(lparam);
            let screen = cursor_position();
            let effect = with_state(|state| {
                let effect = state.app.pointer_down(local, screen);
                schedule(state);
                effect
            })
            .flatten();
            apply(effect.into_iter().collect());
            LRESULT(0)
        }
        WM_MOUSEMOVE => {
            let screen = cursor_position();
            with_state(|state| {
                if state.app.is_dragging() {
                    state.app.pointer_move(screen);
                }
            });
            LRESULT(0)
        }
        WM_LBUTTONUP => {
            with_state(|state| state.app.pointer_up());
            LRESULT(0)
        }
        WM_CAPTURECHANGED => {
            // Re-entrant when our own release triggers it; the borrow fails then
            if with_state(|state| state.app.capture_lost()).is_none() {
                debug!("Capture change during overlay update");
            }
            LRESULT(0)
        }
        WM_TIMER if wparam.0 == TICK_TIMER => {
            with_state(|state| {
                state.app.tick(Instant::now());
                schedule(state);
            });
            LRESULT(0)
        }
        WM_PAINT => {
            let mut ps = PAINTSTRUCT::default();
            let hdc = BeginPaint(hwnd, &mut ps);
            let mut client = RECT::default();
            let _ = GetClientRect(hwnd, &mut client);
            overlay_window::paint(hdc, &client);
            let _ = EndPaint(hwnd, &ps);
            LRESULT(0)
        }
        _ => DefWindowProcW(hwnd, msg, wparam, lparam),
    }
}
