use std::fmt;
use std::sync::Arc;

use raw_window_handle::{
    DisplayHandle, HandleError, HasDisplayHandle, HasWindowHandle, WindowHandle,
};

use super::WglApi;
use crate::api::win32::Win32Window;
use crate::error::{Error, ErrorKind, Result};
use crate::handle::NativeHandle;
use crate::window::{disposed_window, NativeWindow, SwappableWindow};

/// A Win32 window with a pixel format already set on its device context.
pub struct WglWindow {
    window: Win32Window,
    wgl: Arc<dyn WglApi>,
    pixel_format: i32,
    swap_interval: u32,
}

impl WglWindow {
    pub fn new(wgl: Arc<dyn WglApi>, window: Win32Window, pixel_format: i32) -> Self {
        Self { window, wgl, pixel_format, swap_interval: 1 }
    }

    /// The pixel format index set on the device context.
    #[inline]
    pub fn pixel_format(&self) -> i32 {
        self.pixel_format
    }

    /// The underlying Win32 window.
    pub fn win32_window(&self) -> &Win32Window {
        &self.window
    }
}

impl NativeWindow for WglWindow {
    fn native_display(&self) -> NativeHandle {
        self.window.native_display()
    }

    fn native_window(&self) -> NativeHandle {
        self.window.native_window()
    }

    fn show(&mut self) -> Result<()> {
        self.window.show()
    }

    fn hide(&mut self) -> Result<()> {
        self.window.hide()
    }

    fn is_disposed(&self) -> bool {
        self.window.is_disposed()
    }

    fn dispose(&mut self) -> Result<()> {
        self.window.dispose()
    }
}

impl SwappableWindow for WglWindow {
    fn swap_buffers(&self) -> Result<()> {
        if self.is_disposed() {
            return Err(disposed_window());
        }

        if !self.wgl.swap_buffers(self.window.device_context()) {
            return Err(Error::new(
                Some(self.wgl.last_error() as i64),
                Some("SwapBuffers() failed".into()),
                ErrorKind::SwapFailed,
            ));
        }

        Ok(())
    }

    fn swap_interval(&self) -> u32 {
        self.swap_interval
    }

    /// Applies to the context current on the calling thread, as
    /// `wglSwapIntervalEXT` does.
    fn set_swap_interval(&mut self, interval: u32) -> Result<()> {
        if self.is_disposed() {
            return Err(disposed_window());
        }

        self.wgl.swap_interval(interval as i32)?;
        self.swap_interval = interval;
        Ok(())
    }
}

impl HasWindowHandle for WglWindow {
    fn window_handle(&self) -> std::result::Result<WindowHandle<'_>, HandleError> {
        self.window.window_handle()
    }
}

impl HasDisplayHandle for WglWindow {
    fn display_handle(&self) -> std::result::Result<DisplayHandle<'_>, HandleError> {
        self.window.display_handle()
    }
}

impl fmt::Debug for WglWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WglWindow")
            .field("window", &self.window)
            .field("pixel_format", &self.pixel_format)
            .field("swap_interval", &self.swap_interval)
            .finish_non_exhaustive()
    }
}
