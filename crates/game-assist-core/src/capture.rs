//! Screen-space window capture.
//!
//! Copies the window's screen rectangle from the desktop DC, so anything
//! drawn over the window is captured as well.
//!
//! # Platform Support
//!
//! - **Windows**: GDI `BitBlt` from the screen DC into a 32-bit DIB
//! - **Linux/macOS**: Not supported (returns nothing)

use chrono::{DateTime, Local};
use image::RgbaImage;

use crate::locator::{Rect, WindowHandle, WindowSystem};

/// One captured bitmap.
#[derive(Debug, Clone)]
pub struct CapturedFrame {
    pub image: RgbaImage,
    pub window: WindowHandle,
    /// Screen rectangle the pixels were copied from
    pub rect: Rect,
    pub timestamp: DateTime<Local>,
}

impl CapturedFrame {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

/// Grabs pixels for a window.
pub trait ScreenCapturer: Send + Sync {
    /// Returns `None` if the window rectangle cannot be resolved or the copy fails.
    fn capture(&self, window: WindowHandle) -> Option<CapturedFrame>;
}

/// Source origin and size for a blit of `rect`, at least 1x1.
pub fn blit_region(rect: &Rect) -> (i32, i32, u32, u32) {
    let width = rect.width().max(1) as u32;
    let height = rect.height().max(1) as u32;
    (rect.left, rect.top, width, height)
}

/// Bytes needed for a 32-bit bitmap of `width` x `height`.
pub fn pixel_buffer_len(width: u32, height: u32) -> usize {
    width as usize * height as usize * 4
}

/// [`ScreenCapturer`] that blits from the screen.
#[derive(Debug, Clone, Default)]
pub struct ScreenBlitCapturer<W> {
    system: W,
}

impl<W: WindowSystem> ScreenBlitCapturer<W> {
    pub fn new(system: W) -> Self {
        Self { system }
    }
}

impl<W: WindowSystem> ScreenCapturer for ScreenBlitCapturer<W> {
    fn capture(&self, window: WindowHandle) -> Option<CapturedFrame> {
        let rect = self.system.window_rect(window)?;
        let (x, y, width, height) = blit_region(&rect);

        match imp::blit_screen(x, y, width, height) {
            Ok(image) => Some(CapturedFrame {
                image,
                window,
                rect,
                timestamp: Local::now(),
            }),
            Err(e) => {
                tracing::warn!("Screen capture failed: {}", e);
                None
            }
        }
    }
}

// ============================================================================
// Windows Implementation
// ============================================================================

#[cfg(windows)]
mod windows_impl {
    use crate::error::{Error, Result};
    use image::RgbaImage;
    use windows::Win32::Graphics::Gdi::{
        BitBlt, CreateCompatibleBitmap, CreateCompatibleDC, DeleteDC, DeleteObject, GetDC,
        GetDIBits, ReleaseDC, SelectObject, BITMAPINFO, BITMAPINFOHEADER, BI_RGB,
        DIB_RGB_COLORS, SRCCOPY,
    };

    /// Copy a screen region into an RGBA bitmap.
    pub fn blit_screen(x: i32, y: i32, width: u32, height: u32) -> Result<RgbaImage> {
        let w = width as i32;
        let h = height as i32;

        unsafe {
            let hdc_screen = GetDC(None);
            if hdc_screen.is_invalid() {
                return Err(Error::Capture("GetDC failed".into()));
            }

            let hdc_mem = CreateCompatibleDC(Some(hdc_screen));
            let hbm = CreateCompatibleBitmap(hdc_screen, w, h);
            let old = SelectObject(hdc_mem, hbm.into());

            let blit = BitBlt(hdc_mem, 0, 0, w, h, Some(hdc_screen), x, y, SRCCOPY);

            let mut bmi = BITMAPINFO {
                bmiHeader: BITMAPINFOHEADER {
                    biSize: std::mem::size_of::<BITMAPINFOHEADER>() as u32,
                    biWidth: w,
                    // Negative height for a top-down DIB
                    biHeight: -h,
                    biPlanes: 1,
                    biBitCount: 32,
                    biCompression: BI_RGB.0,
                    ..Default::default()
                },
                ..Default::default()
            };

            let mut pixels = vec![0u8; super::pixel_buffer_len(width, height)];
            SelectObject(hdc_mem, old);
            let lines = GetDIBits(
                hdc_mem,
                hbm,
                0,
                height,
                Some(pixels.as_mut_ptr().cast()),
                &mut bmi,
                DIB_RGB_COLORS,
            );

            let _ = DeleteObject(hbm.into());
            let _ = DeleteDC(hdc_mem);
            let _ = ReleaseDC(None, hdc_screen);

            blit.map_err(|e| Error::Capture(format!("BitBlt failed: {}", e)))?;
            if lines == 0 {
                return Err(Error::Capture("GetDIBits returned no lines".into()));
            }

            // BGRA -> RGBA, opaque
            for px in pixels.chunks_exact_mut(4) {
                px.swap(0, 2);
                px[3] = 255;
            }

            RgbaImage::from_raw(width, height, pixels)
                .ok_or_else(|| Error::Capture("pixel buffer size mismatch".into()))
        }
    }
}

// ============================================================================
// Non-Windows Stubs
// ============================================================================

#[cfg(not(windows))]
mod stub_impl {
    use crate::error::{Error, Result};
    use image::RgbaImage;

    /// Capture is not supported on non-Windows platforms
    pub fn blit_screen(_x: i32, _y: i32, _width: u32, _height: u32) -> Result<RgbaImage> {
        Err(Error::Capture(
            "Screen capture is only supported on Windows".into(),
        ))
    }
}

#[cfg(windows)]
use windows_impl as imp;

#[cfg(not(windows))]
use stub_impl as imp;

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedRect(Option<Rect>);

    impl WindowSystem for FixedRect {
        fn foreground_window(&self) -> Option<WindowHandle> {
            Some(WindowHandle(1))
        }

        fn process_name(&self, _window: WindowHandle) -> Option<String> {
            None
        }

        fn window_rect(&self, _window: WindowHandle) -> Option<Rect> {
            self.0
        }

        fn is_process_running(&self, _name: &str) -> bool {
            false
        }
    }

    #[test]
    fn test_blit_region_clamps_to_one() {
        assert_eq!(blit_region(&Rect::new(5, 5, 5, 3)), (5, 5, 1, 1));
        assert_eq!(blit_region(&Rect::new(-8, -8, 1912, 1072)), (-8, -8, 1920, 1080));
    }

    #[test]
    fn test_pixel_buffer_len_does_not_wrap() {
        assert_eq!(pixel_buffer_len(1920, 1080), 8_294_400);
        // 40000 * 30000 * 4 exceeds u32::MAX
        assert_eq!(pixel_buffer_len(40_000, 30_000), 4_800_000_000);
    }

    #[test]
    fn test_unresolvable_rect_returns_none() {
        let capturer = ScreenBlitCapturer::new(FixedRect(None));
        assert!(capturer.capture(WindowHandle(1)).is_none());
    }

    #[test]
    #[cfg(not(windows))]
    fn test_stub_returns_none() {
        let capturer = ScreenBlitCapturer::new(FixedRect(Some(Rect::new(0, 0, 10, 10))));
        assert!(capturer.capture(WindowHandle(1)).is_none());
    }

    #[test]
    #[cfg(windows)]
    #[ignore] // Requires an interactive desktop
    fn test_capture_desktop_region() {
        let capturer = ScreenBlitCapturer::new(FixedRect(Some(Rect::new(0, 0, 64, 48))));
        let frame = capturer.capture(WindowHandle(1)).unwrap();
        assert_eq!(frame.image.dimensions(), (64, 48));
    }
}
