//! Native window objects.
//!
//! Windows are passive handles: there is no event loop. They are created by
//! the backend factories, shown and hidden any number of times and disposed
//! once. Disposing again does nothing.

use raw_window_handle::{
    DisplayHandle, HandleError, HasDisplayHandle, HasWindowHandle, WindowHandle,
};

use crate::api::cocoa::{CocoaWindow, MetalWindow};
use crate::api::egl::EglWindow;
use crate::api::glx::GlxWindow;
use crate::api::wgl::WglWindow;
use crate::api::win32::Win32Window;
use crate::api::x11::X11Window;
use crate::context::GlBackend;
use crate::error::{Error, ErrorKind, Result};
use crate::handle::NativeHandle;

/// Operations every native window provides.
pub trait NativeWindow {
    /// The display connection, device context or view the window lives on.
    fn native_display(&self) -> NativeHandle;

    /// The native window handle.
    fn native_window(&self) -> NativeHandle;

    fn show(&mut self) -> Result<()>;

    fn hide(&mut self) -> Result<()>;

    fn is_disposed(&self) -> bool;

    /// Release the native resources owned by the window.
    fn dispose(&mut self) -> Result<()>;

    /// The Xlib display of an X11 window, null for the other window systems.
    ///
    /// It differs from [`NativeWindow::native_display`] on EGL windows,
    /// whose native display is the `EGLDisplay`.
    fn x11_display(&self) -> NativeHandle {
        NativeHandle::NULL
    }

    /// The `CAMetalLayer` presenting the window.
    ///
    /// Only the macOS windows have one.
    fn metal_layer(&self) -> Result<NativeHandle> {
        Err(ErrorKind::NotSupported("the window has no Metal layer").into())
    }
}

/// A window that can present OpenGL rendering.
pub trait SwappableWindow: NativeWindow {
    /// Present the back buffer.
    fn swap_buffers(&self) -> Result<()>;

    /// The last swap interval set, `1` by default.
    fn swap_interval(&self) -> u32;

    fn set_swap_interval(&mut self, interval: u32) -> Result<()>;
}

/// An OpenGL window of any backend.
#[derive(Debug)]
pub enum Window {
    Glx(GlxWindow),
    Egl(EglWindow),
    Wgl(WglWindow),
}

macro_rules! window_dispatch {
    ($what:expr => $win:ident => $body:expr) => {
        match $what {
            Window::Glx($win) => $body,
            Window::Egl($win) => $body,
            Window::Wgl($win) => $body,
        }
    };
}

impl Window {
    pub fn backend(&self) -> GlBackend {
        match self {
            Window::Glx(_) => GlBackend::Glx,
            Window::Egl(_) => GlBackend::Egl,
            Window::Wgl(_) => GlBackend::Wgl,
        }
    }
}

impl NativeWindow for Window {
    fn native_display(&self) -> NativeHandle {
        window_dispatch!(self => win => win.native_display())
    }

    fn native_window(&self) -> NativeHandle {
        window_dispatch!(self => win => win.native_window())
    }

    fn show(&mut self) -> Result<()> {
        window_dispatch!(self => win => win.show())
    }

    fn hide(&mut self) -> Result<()> {
        window_dispatch!(self => win => win.hide())
    }

    fn is_disposed(&self) -> bool {
        window_dispatch!(self => win => win.is_disposed())
    }

    fn dispose(&mut self) -> Result<()> {
        window_dispatch!(self => win => win.dispose())
    }

    fn x11_display(&self) -> NativeHandle {
        window_dispatch!(self => win => win.x11_display())
    }
}

impl SwappableWindow for Window {
    fn swap_buffers(&self) -> Result<()> {
        window_dispatch!(self => win => win.swap_buffers())
    }

    fn swap_interval(&self) -> u32 {
        window_dispatch!(self => win => win.swap_interval())
    }

    fn set_swap_interval(&mut self, interval: u32) -> Result<()> {
        window_dispatch!(self => win => win.set_swap_interval(interval))
    }
}

impl HasWindowHandle for Window {
    fn window_handle(&self) -> std::result::Result<WindowHandle<'_>, HandleError> {
        window_dispatch!(self => win => win.window_handle())
    }
}

impl HasDisplayHandle for Window {
    fn display_handle(&self) -> std::result::Result<DisplayHandle<'_>, HandleError> {
        window_dispatch!(self => win => win.display_handle())
    }
}

impl From<GlxWindow> for Window {
    fn from(window: GlxWindow) -> Self {
        Self::Glx(window)
    }
}

impl From<EglWindow> for Window {
    fn from(window: EglWindow) -> Self {
        Self::Egl(window)
    }
}

impl From<WglWindow> for Window {
    fn from(window: WglWindow) -> Self {
        Self::Wgl(window)
    }
}

/// A window without an OpenGL configuration, for Vulkan presentation.
#[derive(Debug)]
pub enum PlainWindow {
    X11(X11Window),
    Win32(Win32Window),
    Cocoa(CocoaWindow),
    Metal(MetalWindow),
}

macro_rules! plain_dispatch {
    ($what:expr => $win:ident => $body:expr) => {
        match $what {
            PlainWindow::X11($win) => $body,
            PlainWindow::Win32($win) => $body,
            PlainWindow::Cocoa($win) => $body,
            PlainWindow::Metal($win) => $body,
        }
    };
}

impl NativeWindow for PlainWindow {
    fn native_display(&self) -> NativeHandle {
        plain_dispatch!(self => win => win.native_display())
    }

    fn native_window(&self) -> NativeHandle {
        plain_dispatch!(self => win => win.native_window())
    }

    fn show(&mut self) -> Result<()> {
        plain_dispatch!(self => win => win.show())
    }

    fn hide(&mut self) -> Result<()> {
        plain_dispatch!(self => win => win.hide())
    }

    fn is_disposed(&self) -> bool {
        plain_dispatch!(self => win => win.is_disposed())
    }

    fn dispose(&mut self) -> Result<()> {
        plain_dispatch!(self => win => win.dispose())
    }

    fn x11_display(&self) -> NativeHandle {
        plain_dispatch!(self => win => win.x11_display())
    }

    fn metal_layer(&self) -> Result<NativeHandle> {
        plain_dispatch!(self => win => win.metal_layer())
    }
}

impl HasWindowHandle for PlainWindow {
    fn window_handle(&self) -> std::result::Result<WindowHandle<'_>, HandleError> {
        plain_dispatch!(self => win => win.window_handle())
    }
}

impl HasDisplayHandle for PlainWindow {
    fn display_handle(&self) -> std::result::Result<DisplayHandle<'_>, HandleError> {
        plain_dispatch!(self => win => win.display_handle())
    }
}

impl From<X11Window> for PlainWindow {
    fn from(window: X11Window) -> Self {
        Self::X11(window)
    }
}

impl From<Win32Window> for PlainWindow {
    fn from(window: Win32Window) -> Self {
        Self::Win32(window)
    }
}

impl From<CocoaWindow> for PlainWindow {
    fn from(window: CocoaWindow) -> Self {
        Self::Cocoa(window)
    }
}

impl From<MetalWindow> for PlainWindow {
    fn from(window: MetalWindow) -> Self {
        Self::Metal(window)
    }
}

/// The error for an operation on a disposed window.
pub(crate) fn disposed_window() -> Error {
    Error::with_message(ErrorKind::UsageContractViolation, "the window was disposed")
}
