//! Layered, always-on-top overlay window drawn with GDI.
//!
//! The client area is filled with a color key so everything outside the
//! panel is transparent and click-through.

use std::cell::RefCell;

use game_assist_core::overlay::OverlayContent;
use game_assist_core::{OverlaySurface, Rect};
use windows::core::{w, PCWSTR};
use windows::Win32::Foundation::{COLORREF, HINSTANCE, HWND, RECT};
use windows::Win32::Graphics::Gdi::{
    CreateFontW, CreateSolidBrush, DeleteObject, DrawTextW, FillRect, GetDC, InvalidateRect,
    ReleaseDC, SelectObject, SetBkMode, SetTextColor, CLEARTYPE_QUALITY, CLIP_DEFAULT_PRECIS,
    DEFAULT_CHARSET, DRAW_TEXT_FORMAT, DT_CALCRECT, DT_CENTER, DT_END_ELLIPSIS, DT_LEFT,
    DT_NOPREFIX, DT_SINGLELINE, DT_VCENTER, DT_WORDBREAK, FF_SWISS, FW_NORMAL, FW_SEMIBOLD, HDC,
    HFONT, OUT_DEFAULT_PRECIS, TRANSPARENT, VARIABLE_PITCH,
};
use windows::Win32::UI::Input::KeyboardAndMouse::{ReleaseCapture, SetCapture};
use windows::Win32::UI::WindowsAndMessaging::{
    CreateWindowExW, DestroyWindow, KillTimer, SetLayeredWindowAttributes, SetWindowPos,
    ShowWindow, HWND_TOPMOST, LWA_ALPHA, LWA_COLORKEY, SWP_NOACTIVATE, SWP_NOSIZE, SWP_NOZORDER,
    SW_HIDE, SW_SHOWNOACTIVATE, WS_EX_LAYERED, WS_EX_NOACTIVATE, WS_EX_TOOLWINDOW, WS_EX_TOPMOST,
    WS_POPUP,
};

use super::{OVERLAY_CLASS, TICK_TIMER};

/// Transparent, click-through color (magenta)
pub const COLOR_KEY: COLORREF = COLORREF(0x00FF00FF);
const PANEL_BG: COLORREF = COLORREF(0x00201A1A);
const HEADER_BG: COLORREF = COLORREF(0x00362C2C);
const TEXT_COLOR: COLORREF = COLORREF(0x00F0F0F0);
const PROMPT_COLOR: COLORREF = COLORREF(0x0040B8FF);
const MUTED_COLOR: COLORREF = COLORREF(0x00A0A0A0);

/// Inner padding of the body text
const BODY_PADDING: i32 = 10;
const FONT_FACE: PCWSTR = w!("Microsoft YaHei UI");

thread_local! {
    // Read by WM_PAINT, written by `set_content`
    static PAINT: RefCell<Option<OverlayContent>> = const { RefCell::new(None) };
}

pub struct Win32Overlay {
    hwnd: HWND,
    destroyed: bool,
}

impl Win32Overlay {
    /// Create the hidden overlay window. The class must already be registered.
    pub fn create(instance: HINSTANCE) -> windows::core::Result<Self> {
        unsafe {
            let hwnd = CreateWindowExW(
                WS_EX_TOPMOST | WS_EX_TOOLWINDOW | WS_EX_LAYERED | WS_EX_NOACTIVATE,
                OVERLAY_CLASS,
                w!("Game Assist"),
                WS_POPUP,
                0,
                0,
                1,
                1,
                None,
                None,
                Some(instance),
                None,
            )?;
            SetLayeredWindowAttributes(hwnd, COLOR_KEY, 0, LWA_COLORKEY | LWA_ALPHA)?;
            Ok(Self {
                hwnd,
                destroyed: false,
            })
        }
    }

    pub fn hwnd(&self) -> HWND {
        self.hwnd
    }
}

impl OverlaySurface for Win32Overlay {
    fn set_bounds(&mut self, x: i32, y: i32, width: i32, height: i32) {
        if self.destroyed {
            return;
        }
        unsafe {
            let _ = SetWindowPos(
                self.hwnd,
                Some(HWND_TOPMOST),
                x,
                y,
                width.max(1),
                height.max(1),
                SWP_NOACTIVATE,
            );
        }
    }

    fn set_position(&mut self, x: i32, y: i32) {
        if self.destroyed {
            return;
        }
        unsafe {
            let _ = SetWindowPos(
                self.hwnd,
                None,
                x,
                y,
                0,
                0,
                SWP_NOSIZE | SWP_NOZORDER | SWP_NOACTIVATE,
            );
        }
    }

    fn set_opacity(&mut self, opacity: f64) {
        if self.destroyed {
            return;
        }
        let alpha = (opacity.clamp(0.0, 1.0) * 255.0).round() as u8;
        unsafe {
            let _ = SetLayeredWindowAttributes(self.hwnd, COLOR_KEY, alpha, LWA_COLORKEY | LWA_ALPHA);
        }
    }

    fn set_content(&mut self, content: &OverlayContent) {
        PAINT.with(|paint| *paint.borrow_mut() = Some(content.clone()));
        if !self.destroyed {
            unsafe {
                let _ = InvalidateRect(Some(self.hwnd), None, true);
            }
        }
    }

    fn measure_body(&mut self, text: &str, width: i32, font_size: i32) -> i32 {
        if self.destroyed {
            return 0;
        }
        unsafe {
            let hdc = GetDC(Some(self.hwnd));
            let font = create_font(font_size, false);
            let old = SelectObject(hdc, font.into());

            let mut wide: Vec<u16> = text.encode_utf16().collect();
            let mut rect = RECT {
                left: 0,
                top: 0,
                right: (width - 2 * BODY_PADDING).max(1),
                bottom: 0,
            };
            DrawTextW(hdc, &mut wide, &mut rect, DT_CALCRECT | DT_WORDBREAK | DT_NOPREFIX);

            SelectObject(hdc, old);
            let _ = DeleteObject(font.into());
            ReleaseDC(Some(self.hwnd), hdc);

            rect.bottom - rect.top + 2 * BODY_PADDING
        }
    }

    fn set_visible(&mut self, visible: bool) {
        if self.destroyed {
            return;
        }
        unsafe {
            let _ = ShowWindow(self.hwnd, if visible { SW_SHOWNOACTIVATE } else { SW_HIDE });
        }
    }

    fn capture_pointer(&mut self) {
        if !self.destroyed {
            unsafe {
                SetCapture(self.hwnd);
            }
        }
    }

    fn release_pointer(&mut self) {
        unsafe {
            let _ = ReleaseCapture();
        }
    }

    fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.destroyed = true;
        PAINT.with(|paint| paint.borrow_mut().take());
        unsafe {
            let _ = KillTimer(Some(self.hwnd), TICK_TIMER);
            let _ = DestroyWindow(self.hwnd);
        }
    }
}

unsafe fn create_font(size: i32, bold: bool) -> HFONT {
    let weight = if bold { FW_SEMIBOLD } else { FW_NORMAL };
    CreateFontW(
        -size.max(8),
        0,
        0,
        0,
        weight.0 as i32,
        0,
        0,
        0,
        DEFAULT_CHARSET,
        OUT_DEFAULT_PRECIS,
        CLIP_DEFAULT_PRECIS,
        CLEARTYPE_QUALITY,
        (VARIABLE_PITCH.0 | FF_SWISS.0) as u32,
        FONT_FACE,
    )
}

fn to_rect(r: Rect) -> RECT {
    RECT {
        left: r.left,
        top: r.top,
        right: r.right,
        bottom: r.bottom,
    }
}

unsafe fn fill(hdc: HDC, rect: &RECT, color: COLORREF) {
    let brush = CreateSolidBrush(color);
    FillRect(hdc, rect, brush);
    let _ = DeleteObject(brush.into());
}

unsafe fn draw_text(hdc: HDC, text: &str, mut rect: RECT, format: DRAW_TEXT_FORMAT) {
    let mut wide: Vec<u16> = text.encode_utf16().collect();
    DrawTextW(hdc, &mut wide, &mut rect, format | DT_NOPREFIX);
}

/// Paint the whole client area. Called from WM_PAINT.
pub(super) unsafe fn paint(hdc: HDC, client: &RECT) {
    fill(hdc, client, COLOR_KEY);

    PAINT.with(|paint| {
        let paint = paint.borrow();
        let Some(content) = paint.as_ref() else {
            return;
        };
        let layout = content.layout;

        fill(hdc, &to_rect(layout.panel()), PANEL_BG);
        fill(hdc, &to_rect(layout.header()), HEADER_BG);
        SetBkMode(hdc, TRANSPARENT);

        let header_font = create_font(content.font_size, true);
        let old = SelectObject(hdc, header_font.into());

        let mut label = to_rect(layout.prompt_label());
        label.left += BODY_PADDING;
        SetTextColor(hdc, PROMPT_COLOR);
        draw_text(
            hdc,
            &format!("{} ▾", content.prompt.display_name()),
            label,
            DT_LEFT | DT_VCENTER | DT_SINGLELINE | DT_END_ELLIPSIS,
        );

        SetTextColor(hdc, MUTED_COLOR);
        draw_text(
            hdc,
            "×",
            to_rect(layout.close_button()),
            DT_CENTER | DT_VCENTER | DT_SINGLELINE,
        );

        let body_font = create_font(content.font_size, false);
        SelectObject(hdc, body_font.into());
        let mut body = to_rect(layout.body());
        body.left += BODY_PADDING;
        body.right -= BODY_PADDING;
        body.top += BODY_PADDING;
        SetTextColor(hdc, TEXT_COLOR);
        draw_text(hdc, &content.text, body, DT_LEFT | DT_WORDBREAK);

        SelectObject(hdc, old);
        let _ = DeleteObject(header_font.into());
        let _ = DeleteObject(body_font.into());
    });
}
