//! Plain X11 windows and the X11 window helper.
//!
//! GLX and EGL windows on X11 are both built on an [`X11Window`] created
//! against the visual of the chosen configuration.

use std::fmt;
use std::os::raw::c_ulong;
use std::sync::Arc;

use raw_window_handle::{
    DisplayHandle, HandleError, HasDisplayHandle, HasWindowHandle, RawDisplayHandle,
    RawWindowHandle, WindowHandle, XlibDisplayHandle, XlibWindowHandle,
};

use crate::api::egl::{self, EglApi, EglWindow};
use crate::api::glx::{self, GlxApi, GlxWindow};
use crate::error::{Error, ErrorKind, Result};
use crate::format::FramebufferFormat;
use crate::handle::NativeHandle;
use crate::window::{disposed_window, NativeWindow};

#[cfg(x11_platform)]
mod native;

#[cfg(x11_platform)]
pub use native::NativeXlib;
#[cfg(x11_platform)]
pub(crate) use native::{
    default_display as native_default_display, take_visual_info, xcb_connection, XLIB,
};

/// A visual resolved from a native configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct X11Visual {
    /// The `Visual *`, owned by the display.
    pub visual: NativeHandle,
    pub visual_id: u64,
    pub depth: i32,
    pub screen: i32,
}

/// Parameters of an `XCreateWindow` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct X11WindowRequest {
    pub parent: NativeHandle,
    pub visual: X11Visual,
    pub colormap: NativeHandle,
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

/// The Xlib calls used to create and manage windows.
///
/// Display, window and colormap values are passed around as
/// [`NativeHandle`]s. Implementations must accept the handles they returned
/// themselves.
pub trait XlibApi: Send + Sync {
    /// The process wide display connection.
    ///
    /// It's opened on first use and never closed.
    fn default_display(&self) -> Result<NativeHandle>;

    fn default_screen(&self, display: NativeHandle) -> i32;

    fn root_window(&self, display: NativeHandle, screen: i32) -> NativeHandle;

    /// Look a visual up by id, `None` when the display doesn't have it.
    fn visual_from_id(&self, display: NativeHandle, visual_id: u64) -> Option<X11Visual>;

    /// The default visual of `screen`.
    fn default_visual(&self, display: NativeHandle, screen: i32) -> Option<X11Visual>;

    fn create_colormap(
        &self,
        display: NativeHandle,
        window: NativeHandle,
        visual: &X11Visual,
    ) -> NativeHandle;

    fn free_colormap(&self, display: NativeHandle, colormap: NativeHandle);

    /// Create an input/output window, null on failure.
    fn create_window(&self, display: NativeHandle, request: &X11WindowRequest) -> NativeHandle;

    fn map_window(&self, display: NativeHandle, window: NativeHandle);

    fn unmap_window(&self, display: NativeHandle, window: NativeHandle);

    fn destroy_window(&self, display: NativeHandle, window: NativeHandle);

    fn flush(&self, display: NativeHandle);
}

/// An X11 window created by this crate.
///
/// The window owns its native handle and colormap, not the display.
pub struct X11Window {
    xlib: Arc<dyn XlibApi>,
    display: NativeHandle,
    window: NativeHandle,
    colormap: NativeHandle,
    screen: i32,
    disposed: bool,
}

impl X11Window {
    /// Create a window on `display` with a fresh colormap for `visual`.
    pub fn new(
        xlib: Arc<dyn XlibApi>,
        display: NativeHandle,
        visual: X11Visual,
        x: i32,
        y: i32,
        width: u32,
        height: u32,
    ) -> Result<Self> {
        let parent = xlib.root_window(display, visual.screen);
        let colormap = xlib.create_colormap(display, parent, &visual);
        if colormap.is_null() {
            return Err(Error::with_message(
                ErrorKind::WindowCreationFailed,
                "XCreateColormap() failed",
            ));
        }

        let request = X11WindowRequest { parent, visual, colormap, x, y, width, height };
        let window = xlib.create_window(display, &request);

        if window.is_null() {
            xlib.free_colormap(display, colormap);
            return Err(Error::with_message(
                ErrorKind::WindowCreationFailed,
                "XCreateWindow() failed",
            ));
        }

        Ok(Self { xlib, display, window, colormap, screen: visual.screen, disposed: false })
    }

    #[inline]
    pub fn screen(&self) -> i32 {
        self.screen
    }

    #[inline]
    pub fn colormap(&self) -> NativeHandle {
        self.colormap
    }
}

impl NativeWindow for X11Window {
    fn native_display(&self) -> NativeHandle {
        self.display
    }

    fn native_window(&self) -> NativeHandle {
        self.window
    }

    fn show(&mut self) -> Result<()> {
        if self.disposed {
            return Err(disposed_window());
        }

        self.xlib.map_window(self.display, self.window);
        self.xlib.flush(self.display);
        Ok(())
    }

    fn hide(&mut self) -> Result<()> {
        if self.disposed {
            return Err(disposed_window());
        }

        self.xlib.unmap_window(self.display, self.window);
        self.xlib.flush(self.display);
        Ok(())
    }

    fn is_disposed(&self) -> bool {
        self.disposed
    }

    fn dispose(&mut self) -> Result<()> {
        if self.disposed {
            return Ok(());
        }

        self.xlib.unmap_window(self.display, self.window);
        self.xlib.destroy_window(self.display, self.window);
        self.xlib.free_colormap(self.display, self.colormap);
        self.disposed = true;
        Ok(())
    }

    fn x11_display(&self) -> NativeHandle {
        self.display
    }
}

impl HasWindowHandle for X11Window {
    fn window_handle(&self) -> std::result::Result<WindowHandle<'_>, HandleError> {
        if self.disposed {
            return Err(HandleError::Unavailable);
        }

        let raw = RawWindowHandle::from(XlibWindowHandle::new(self.window.raw() as c_ulong));
        // SAFETY: the window stays alive until `dispose`, which needs `&mut self`.
        Ok(unsafe { WindowHandle::borrow_raw(raw) })
    }
}

impl HasDisplayHandle for X11Window {
    fn display_handle(&self) -> std::result::Result<DisplayHandle<'_>, HandleError> {
        let raw = RawDisplayHandle::from(XlibDisplayHandle::new(
            std::ptr::NonNull::new(self.display.as_ptr()),
            self.screen,
        ));
        // SAFETY: the display connection is never closed.
        Ok(unsafe { DisplayHandle::borrow_raw(raw) })
    }
}

impl Drop for X11Window {
    fn drop(&mut self) {
        if let Err(err) = self.dispose() {
            log::error!("failed to dispose the X11 window: {err}");
        }
    }
}

impl fmt::Debug for X11Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("X11Window")
            .field("display", &self.display)
            .field("window", &self.window)
            .field("colormap", &self.colormap)
            .field("disposed", &self.disposed)
            .finish_non_exhaustive()
    }
}

/// Creates plain, GLX and EGL windows on X11.
#[derive(Clone)]
pub struct X11Helper {
    xlib: Arc<dyn XlibApi>,
    glx: Option<Arc<dyn GlxApi>>,
    egl: Option<Arc<dyn EglApi>>,
}

impl X11Helper {
    pub fn new(xlib: Arc<dyn XlibApi>) -> Self {
        Self { xlib, glx: None, egl: None }
    }

    pub fn with_glx(mut self, glx: Arc<dyn GlxApi>) -> Self {
        self.glx = Some(glx);
        self
    }

    pub fn with_egl(mut self, egl: Arc<dyn EglApi>) -> Self {
        self.egl = Some(egl);
        self
    }

    pub fn xlib(&self) -> &Arc<dyn XlibApi> {
        &self.xlib
    }

    pub fn glx(&self) -> Result<&Arc<dyn GlxApi>> {
        self.glx.as_ref().ok_or_else(|| {
            Error::with_message(ErrorKind::UnsupportedPlatform, "GLX is not available")
        })
    }

    pub fn egl(&self) -> Result<&Arc<dyn EglApi>> {
        self.egl.as_ref().ok_or_else(|| {
            Error::with_message(ErrorKind::UnsupportedPlatform, "EGL is not available")
        })
    }

    /// The process wide display connection.
    pub fn default_display(&self) -> Result<NativeHandle> {
        self.xlib.default_display()
    }

    /// Resolve `display`, falling back to the default one when it's null.
    fn resolve_display(&self, display: NativeHandle) -> Result<NativeHandle> {
        match display.non_null() {
            Some(display) => Ok(display),
            None => self.xlib.default_display(),
        }
    }

    /// Create a window with the default visual and no OpenGL configuration.
    ///
    /// Such windows present through Vulkan. A null `display` selects the
    /// default display.
    pub fn create_window(
        &self,
        display: NativeHandle,
        x: i32,
        y: i32,
        width: u32,
        height: u32,
    ) -> Result<X11Window> {
        let display = self.resolve_display(display)?;
        let screen = self.xlib.default_screen(display);
        let visual = self.xlib.default_visual(display, screen).ok_or_else(|| {
            Error::with_message(ErrorKind::WindowCreationFailed, "the screen has no default visual")
        })?;

        X11Window::new(self.xlib.clone(), display, visual, x, y, width, height)
    }

    /// Create a window usable with a [`GlxContext`] of the same `format`.
    ///
    /// A null `display` selects the default display.
    ///
    /// [`GlxContext`]: crate::api::glx::GlxContext
    pub fn create_glx_window(
        &self,
        display: NativeHandle,
        format: &FramebufferFormat,
        x: i32,
        y: i32,
        width: u32,
        height: u32,
    ) -> Result<GlxWindow> {
        let glx = self.glx()?;
        let display = self.resolve_display(display)?;

        let config = glx::select_fb_config(glx.as_ref(), display, format)?;
        let visual = glx.visual_from_fb_config(display, config).ok_or_else(|| {
            Error::with_message(
                ErrorKind::WindowCreationFailed,
                "glXGetVisualFromFBConfig() returned no visual",
            )
        })?;

        let window = X11Window::new(self.xlib.clone(), display, visual, x, y, width, height)?;
        Ok(GlxWindow::new(glx.clone(), window))
    }

    /// Create a window usable with an [`EglContext`] of the same `format`.
    ///
    /// The EGL surface is created the first time it's needed.
    ///
    /// [`EglContext`]: crate::api::egl::EglContext
    pub fn create_egl_window(
        &self,
        display: NativeHandle,
        format: &FramebufferFormat,
        x: i32,
        y: i32,
        width: u32,
        height: u32,
    ) -> Result<EglWindow> {
        let egl = self.egl()?;
        let display = self.resolve_display(display)?;

        let egl_display = egl::initialize_display(egl.as_ref(), display)?;
        if !egl.bind_opengl_api() {
            return Err(Error::with_code(
                ErrorKind::WindowCreationFailed,
                egl.get_error() as i64,
            ));
        }

        let config = egl::select_config(egl.as_ref(), egl_display, format)?;
        let visual_id = egl
            .get_config_attrib(egl_display, config, egl::NATIVE_VISUAL_ID)
            .filter(|&id| id > 0)
            .ok_or_else(|| {
                Error::with_message(
                    ErrorKind::WindowCreationFailed,
                    "the EGL config has no native visual",
                )
            })?;
        let visual = self.xlib.visual_from_id(display, visual_id as u64).ok_or_else(|| {
            Error::with_message(ErrorKind::WindowCreationFailed, "XGetVisualInfo() failed")
        })?;

        let window = X11Window::new(self.xlib.clone(), display, visual, x, y, width, height)?;
        Ok(EglWindow::new(egl.clone(), egl_display, config, window))
    }
}

impl fmt::Debug for X11Helper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("X11Helper")
            .field("glx", &self.glx.is_some())
            .field("egl", &self.egl.is_some())
            .finish_non_exhaustive()
    }
}
