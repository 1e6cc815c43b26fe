use std::fmt;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use raw_window_handle::{
    DisplayHandle, HandleError, HasDisplayHandle, HasWindowHandle, WindowHandle,
};

use super::{surface_attributes, EglApi};
use crate::api::x11::X11Window;
use crate::error::{Error, ErrorKind, Result};
use crate::handle::NativeHandle;
use crate::window::{disposed_window, NativeWindow, SwappableWindow};

/// An X11 window presenting through an EGL window surface.
///
/// The surface is created the first time a context is made current on the
/// window or its buffers are swapped, then reused.
pub struct EglWindow {
    window: X11Window,
    egl: Arc<dyn EglApi>,
    display: NativeHandle,
    config: NativeHandle,
    surface: OnceCell<NativeHandle>,
    swap_interval: u32,
    disposed: bool,
}

impl EglWindow {
    pub fn new(
        egl: Arc<dyn EglApi>,
        display: NativeHandle,
        config: NativeHandle,
        window: X11Window,
    ) -> Self {
        Self {
            window,
            egl,
            display,
            config,
            surface: OnceCell::new(),
            swap_interval: 1,
            disposed: false,
        }
    }

    /// The configuration the window was created against.
    #[inline]
    pub fn config(&self) -> NativeHandle {
        self.config
    }

    /// The X11 window behind the surface.
    pub fn x11_window(&self) -> &X11Window {
        &self.window
    }

    /// The `EGLSurface`, created on first use.
    pub fn surface(&self) -> Result<NativeHandle> {
        if self.disposed {
            return Err(disposed_window());
        }

        self.surface
            .get_or_try_init(|| {
                let attrs = surface_attributes().to_raw();
                let surface = self.egl.create_window_surface(
                    self.display,
                    self.config,
                    self.window.native_window(),
                    &attrs,
                );

                if surface.is_null() {
                    Err(Error::new(
                        Some(self.egl.get_error() as i64),
                        Some("eglCreateWindowSurface() failed".into()),
                        ErrorKind::WindowCreationFailed,
                    ))
                } else {
                    Ok(surface)
                }
            })
            .copied()
    }
}

impl NativeWindow for EglWindow {
    fn native_display(&self) -> NativeHandle {
        self.display
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
        self.disposed
    }

    fn dispose(&mut self) -> Result<()> {
        if self.disposed {
            return Ok(());
        }

        // The surface must go before the window it renders to.
        if let Some(surface) = self.surface.take() {
            self.egl.destroy_surface(self.display, surface);
        }

        self.disposed = true;
        self.window.dispose()
    }

    fn x11_display(&self) -> NativeHandle {
        self.window.native_display()
    }
}

impl SwappableWindow for EglWindow {
    fn swap_buffers(&self) -> Result<()> {
        let surface = self.surface()?;

        if self.egl.swap_buffers(self.display, surface) {
            Ok(())
        } else {
            Err(Error::new(
                Some(self.egl.get_error() as i64),
                Some("eglSwapBuffers() failed".into()),
                ErrorKind::SwapFailed,
            ))
        }
    }

    fn swap_interval(&self) -> u32 {
        self.swap_interval
    }

    fn set_swap_interval(&mut self, interval: u32) -> Result<()> {
        if self.disposed {
            return Err(disposed_window());
        }

        // `eglSwapInterval` acts on whatever surface is current.
        let current = self.egl.current_draw_surface();
        if current.is_null() || self.surface.get() != Some(&current) {
            return Err(Error::with_message(
                ErrorKind::UsageContractViolation,
                "set_swap_interval() needs a context current on this window",
            ));
        }

        if !self.egl.swap_interval(self.display, interval as i32) {
            return Err(Error::with_code(ErrorKind::SwapFailed, self.egl.get_error() as i64));
        }

        self.swap_interval = interval;
        Ok(())
    }
}

impl HasWindowHandle for EglWindow {
    fn window_handle(&self) -> std::result::Result<WindowHandle<'_>, HandleError> {
        self.window.window_handle()
    }
}

impl HasDisplayHandle for EglWindow {
    fn display_handle(&self) -> std::result::Result<DisplayHandle<'_>, HandleError> {
        self.window.display_handle()
    }
}

impl Drop for EglWindow {
    fn drop(&mut self) {
        if let Err(err) = self.dispose() {
            log::error!("failed to dispose the EGL window: {err}");
        }
    }
}

impl fmt::Debug for EglWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EglWindow")
            .field("window", &self.window)
            .field("display", &self.display)
            .field("config", &self.config)
            .field("surface", &self.surface.get())
            .field("swap_interval", &self.swap_interval)
            .field("disposed", &self.disposed)
            .finish_non_exhaustive()
    }
}
