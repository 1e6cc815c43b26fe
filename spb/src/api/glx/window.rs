use std::fmt;
use std::sync::Arc;

use raw_window_handle::{
    DisplayHandle, HandleError, HasDisplayHandle, HasWindowHandle, WindowHandle,
};

use super::GlxApi;
use crate::api::x11::X11Window;
use crate::error::Result;
use crate::handle::NativeHandle;
use crate::window::{disposed_window, NativeWindow, SwappableWindow};

/// An X11 window created against the visual of a GLX configuration.
pub struct GlxWindow {
    window: X11Window,
    glx: Arc<dyn GlxApi>,
    swap_interval: u32,
}

impl GlxWindow {
    pub fn new(glx: Arc<dyn GlxApi>, window: X11Window) -> Self {
        Self { window, glx, swap_interval: 1 }
    }

    /// The underlying X11 window.
    pub fn x11_window(&self) -> &X11Window {
        &self.window
    }
}

impl NativeWindow for GlxWindow {
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

    fn x11_display(&self) -> NativeHandle {
        self.window.native_display()
    }
}

impl SwappableWindow for GlxWindow {
    fn swap_buffers(&self) -> Result<()> {
        if self.is_disposed() {
            return Err(disposed_window());
        }

        self.glx.swap_buffers(self.native_display(), self.native_window());
        Ok(())
    }

    fn swap_interval(&self) -> u32 {
        self.swap_interval
    }

    fn set_swap_interval(&mut self, interval: u32) -> Result<()> {
        if self.is_disposed() {
            return Err(disposed_window());
        }

        self.glx.swap_interval(self.native_display(), self.native_window(), interval as i32)?;
        self.swap_interval = interval;
        Ok(())
    }
}

impl HasWindowHandle for GlxWindow {
    fn window_handle(&self) -> std::result::Result<WindowHandle<'_>, HandleError> {
        self.window.window_handle()
    }
}

impl HasDisplayHandle for GlxWindow {
    fn display_handle(&self) -> std::result::Result<DisplayHandle<'_>, HandleError> {
        self.window.display_handle()
    }
}

impl fmt::Debug for GlxWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GlxWindow")
            .field("window", &self.window)
            .field("swap_interval", &self.swap_interval)
            .finish_non_exhaustive()
    }
}
