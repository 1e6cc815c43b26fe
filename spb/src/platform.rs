//! Backend selection per operating system.
//!
//! [`PlatformHelper`] picks the window system and OpenGL API for the running
//! platform and creates matching windows and contexts. Windows meant for
//! Vulkan come from the same helper as [`PlainWindow`]s.

use std::fmt;
use std::sync::Arc;

use crate::api::cocoa::{CocoaApi, CocoaWindow, MetalWindow};
use crate::api::egl::EglContext;
use crate::api::glx::GlxContext;
use crate::api::wgl::{WglApi, WglContext};
use crate::api::win32::Win32Helper;
use crate::api::x11::X11Helper;
use crate::context::{Context, ContextAttributes, ContextFlags, GlBackend, GlContext};
use crate::error::{Error, ErrorKind, Result};
use crate::format::FramebufferFormat;
use crate::handle::NativeHandle;
use crate::window::{PlainWindow, Window};

/// The operating system families with a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Os {
    /// Linux and the BSDs, through X11.
    Linux,
    Windows,
    MacOs,
    Other,
}

/// The operating system this crate was built for.
pub fn current_platform() -> Os {
    if cfg!(windows) {
        Os::Windows
    } else if cfg!(macos_platform) {
        Os::MacOs
    } else if cfg!(free_unix) {
        Os::Linux
    } else {
        Os::Other
    }
}

#[derive(Clone)]
enum WindowSystem {
    X11(X11Helper),
    Win32 { helper: Win32Helper, wgl: Arc<dyn WglApi> },
    Cocoa(Arc<dyn CocoaApi>),
}

/// Creates OpenGL windows and contexts with the preferred backend.
///
/// On X11 GLX is preferred over EGL, Win32 always uses WGL. macOS has no
/// OpenGL backend and only hands out windows for Vulkan.
#[derive(Clone)]
pub struct PlatformHelper {
    system: WindowSystem,
    backend: Option<GlBackend>,
}

impl PlatformHelper {
    /// Load the native libraries of the running platform.
    #[cfg(any(x11_platform, wgl_backend, macos_platform))]
    pub fn new() -> Result<Self> {
        #[cfg(x11_platform)]
        {
            use crate::api::x11::NativeXlib;

            let mut helper = X11Helper::new(Arc::new(NativeXlib::new()?));
            let mut backend = None;

            #[cfg(egl_backend)]
            match crate::api::egl::NativeEgl::new() {
                Ok(egl) => {
                    helper = helper.with_egl(Arc::new(egl));
                    backend = Some(GlBackend::Egl);
                },
                Err(err) => log::debug!("EGL is unavailable: {err}"),
            }

            #[cfg(glx_backend)]
            match crate::api::glx::NativeGlx::new() {
                Ok(glx) => {
                    helper = helper.with_glx(Arc::new(glx));
                    backend = Some(GlBackend::Glx);
                },
                Err(err) => log::debug!("GLX is unavailable: {err}"),
            }

            let backend = backend.ok_or_else(|| {
                Error::with_message(ErrorKind::UnsupportedPlatform, "neither GLX nor EGL is available")
            })?;

            Ok(Self::from_x11(helper, backend))
        }

        #[cfg(wgl_backend)]
        {
            let wgl = crate::api::wgl::NativeWgl::new()?;
            Ok(Self::from_win32(Win32Helper::global().clone(), Arc::new(wgl)))
        }

        #[cfg(macos_platform)]
        {
            Ok(Self::from_cocoa(Arc::new(crate::api::cocoa::NativeCocoa)))
        }
    }

    /// Use an X11 helper with `backend`, which must be GLX or EGL.
    pub fn from_x11(helper: X11Helper, backend: GlBackend) -> Self {
        Self { system: WindowSystem::X11(helper), backend: Some(backend) }
    }

    pub fn from_win32(helper: Win32Helper, wgl: Arc<dyn WglApi>) -> Self {
        Self { system: WindowSystem::Win32 { helper, wgl }, backend: Some(GlBackend::Wgl) }
    }

    /// Wrap AppKit objects through `api`. There is no OpenGL backend.
    pub fn from_cocoa(api: Arc<dyn CocoaApi>) -> Self {
        Self { system: WindowSystem::Cocoa(api), backend: None }
    }

    /// Prefer `backend` for the windows and contexts created afterwards.
    pub fn with_backend(mut self, backend: GlBackend) -> Self {
        self.backend = Some(backend);
        self
    }

    /// The OpenGL backend, `None` on macOS.
    #[inline]
    pub fn backend(&self) -> Option<GlBackend> {
        self.backend
    }

    fn unsupported(&self) -> Error {
        let message = match self.backend {
            Some(backend) => format!("{backend} is not available on this window system"),
            None => "OpenGL is not available on this window system".to_owned(),
        };

        Error::with_message(ErrorKind::UnsupportedPlatform, message)
    }

    fn cocoa(&self) -> Result<&Arc<dyn CocoaApi>> {
        match &self.system {
            WindowSystem::Cocoa(api) => Ok(api),
            _ => Err(Error::with_message(
                ErrorKind::UnsupportedPlatform,
                "AppKit windows only exist on macOS",
            )),
        }
    }

    /// Create a window without an OpenGL configuration on the default
    /// display, for Vulkan surfaces.
    ///
    /// AppKit windows belong to the application, wrap them with
    /// [`PlatformHelper::wrap_ns_window`] or [`PlatformHelper::wrap_metal_view`]
    /// instead.
    pub fn create_window(&self, x: i32, y: i32, width: u32, height: u32) -> Result<PlainWindow> {
        match &self.system {
            WindowSystem::X11(helper) => {
                Ok(helper.create_window(NativeHandle::NULL, x, y, width, height)?.into())
            },
            WindowSystem::Win32 { helper, .. } => {
                Ok(helper.create_window(x, y, width, height)?.into())
            },
            WindowSystem::Cocoa(_) => Err(Error::with_message(
                ErrorKind::UnsupportedPlatform,
                "AppKit windows are created by the application",
            )),
        }
    }

    /// Wrap an `NSWindow` owned by the application.
    pub fn wrap_ns_window(&self, window: NativeHandle) -> Result<PlainWindow> {
        Ok(CocoaWindow::new(self.cocoa()?.clone(), window)?.into())
    }

    /// Wrap an `NSView` and the `CAMetalLayer` already set on it.
    pub fn wrap_metal_view(&self, view: NativeHandle, layer: NativeHandle) -> Result<PlainWindow> {
        Ok(MetalWindow::new(self.cocoa()?.clone(), view, layer).into())
    }

    /// Create a window on the default display matching `format`.
    pub fn create_opengl_window(
        &self,
        format: &FramebufferFormat,
        x: i32,
        y: i32,
        width: u32,
        height: u32,
    ) -> Result<Window> {
        let window = match (&self.system, self.backend) {
            (WindowSystem::X11(helper), Some(GlBackend::Glx)) => helper
                .create_glx_window(NativeHandle::NULL, format, x, y, width, height)?
                .into(),
            (WindowSystem::X11(helper), Some(GlBackend::Egl)) => helper
                .create_egl_window(NativeHandle::NULL, format, x, y, width, height)?
                .into(),
            (WindowSystem::Win32 { helper, wgl }, Some(GlBackend::Wgl)) => helper
                .create_window_for_wgl(wgl.clone(), format, x, y, width, height)?
                .into(),
            _ => return Err(self.unsupported()),
        };

        Ok(window)
    }

    /// Create an uninitialized context.
    ///
    /// `share` must be an initialized context of the same backend, which is
    /// checked before anything native happens.
    pub fn create_opengl_context(
        &self,
        format: FramebufferFormat,
        major: u8,
        minor: u8,
        flags: ContextFlags,
        direct_rendering: bool,
        share: Option<&Context>,
    ) -> Result<Context> {
        let attributes = ContextAttributes::new(format, major, minor)
            .with_flags(flags)
            .with_direct_rendering(direct_rendering);
        let share = share.map(|share| share as &dyn GlContext);

        let context = match (&self.system, self.backend) {
            (WindowSystem::X11(helper), Some(GlBackend::Glx)) => {
                GlxContext::new(helper.glx()?.clone(), attributes, share)?.into()
            },
            (WindowSystem::X11(helper), Some(GlBackend::Egl)) => {
                EglContext::new(helper.egl()?.clone(), attributes, share)?.into()
            },
            (WindowSystem::Win32 { helper, wgl }, Some(GlBackend::Wgl)) => {
                WglContext::new(helper.clone(), wgl.clone(), attributes, share)?.into()
            },
            _ => return Err(self.unsupported()),
        };

        Ok(context)
    }
}

impl fmt::Debug for PlatformHelper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let system = match &self.system {
            WindowSystem::X11(_) => "X11",
            WindowSystem::Win32 { .. } => "Win32",
            WindowSystem::Cocoa(_) => "Cocoa",
        };

        f.debug_struct("PlatformHelper")
            .field("system", &system)
            .field("backend", &self.backend)
            .finish()
    }
}
