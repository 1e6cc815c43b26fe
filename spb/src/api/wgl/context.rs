//! WGL context.

use std::ffi::{c_void, CStr};
use std::fmt;
use std::ptr;
use std::sync::Arc;

use super::{apply_pixel_format, context_attributes, select_pixel_format, WglApi};
use crate::api::win32::{Win32Helper, Win32Window};
use crate::context::{
    wrong_window, ContextAttributes, ContextCore, ContextState, GlBackend, GlContext, Liveness,
};
use crate::error::{Error, ErrorKind, Result};
use crate::handle::NativeHandle;
use crate::window::{NativeWindow, Window};

/// An OpenGL context created with `wglCreateContextAttribsARB`.
///
/// The display handle of a WGL context is the device context it was created
/// on. Contexts can be made current on any window with the same pixel format.
pub struct WglContext {
    wgl: Arc<dyn WglApi>,
    helper: Win32Helper,
    core: ContextCore,
    pixel_format: i32,
    /// Created when initializing without a window.
    hidden: Option<Win32Window>,
}

impl WglContext {
    /// Record the context parameters. Nothing native happens until
    /// [`GlContext::initialize`].
    pub fn new(
        helper: Win32Helper,
        wgl: Arc<dyn WglApi>,
        attributes: ContextAttributes,
        share: Option<&dyn GlContext>,
    ) -> Result<Self> {
        let core = ContextCore::new(GlBackend::Wgl, attributes, share)?;
        Ok(Self { wgl, helper, core, pixel_format: 0, hidden: None })
    }

    /// The pixel format the context was created with, `0` before
    /// initialization.
    #[inline]
    pub fn pixel_format(&self) -> i32 {
        self.pixel_format
    }

    fn wgl_error(&self, kind: ErrorKind, message: &str) -> Error {
        Error::new(Some(self.wgl.last_error() as i64), Some(message.into()), kind)
    }
}

impl GlContext for WglContext {
    fn backend(&self) -> GlBackend {
        self.core.backend()
    }

    fn attributes(&self) -> &ContextAttributes {
        &self.core.attributes
    }

    fn state(&self) -> ContextState {
        self.core.state()
    }

    fn raw_handle(&self) -> NativeHandle {
        self.core.raw()
    }

    fn display_handle(&self) -> NativeHandle {
        self.core.display()
    }

    fn liveness(&self) -> Liveness {
        self.core.liveness()
    }

    fn initialize(&mut self, window: Option<&Window>) -> Result<()> {
        self.core.ensure_uninitialized()?;
        self.core.ensure_share_alive()?;

        let (hdc, pixel_format, hidden) = match window {
            Some(Window::Wgl(window)) => {
                (window.native_display(), window.pixel_format(), None)
            },
            Some(_) => return Err(wrong_window(self.core.backend())),
            None => {
                let hidden = self.helper.create_window(0, 0, 1, 1)?;
                let hdc = hidden.device_context();
                let pixel_format =
                    select_pixel_format(self.wgl.as_ref(), hdc, &self.core.attributes.format)?;
                let pixel_format = apply_pixel_format(
                    self.wgl.as_ref(),
                    hdc,
                    pixel_format,
                    ErrorKind::ContextCreationFailed,
                )?;
                (hdc, pixel_format, Some(hidden))
            },
        };

        if !self.wgl.supports_create_context_attribs() {
            return Err(Error::with_message(
                ErrorKind::ContextCreationFailed,
                "wglCreateContextAttribsARB is not available",
            ));
        }

        let attrs = context_attributes(&self.core.attributes).to_raw();
        let context = self.wgl.create_context_attribs(hdc, self.core.share_raw(), &attrs);
        if context.is_null() {
            // The hidden window goes away with `hidden`.
            return Err(
                self.wgl_error(ErrorKind::ContextCreationFailed, "wglCreateContextAttribsARB() failed")
            );
        }

        self.pixel_format = pixel_format;
        self.hidden = hidden;
        self.core.set_initialized(hdc, context);
        Ok(())
    }

    fn make_current(&mut self, window: Option<&Window>) -> Result<()> {
        self.core.ensure_live()?;

        let target = match window {
            Some(Window::Wgl(window)) => {
                let hdc = window.native_display();
                let pixel_format = apply_pixel_format(
                    self.wgl.as_ref(),
                    hdc,
                    self.pixel_format,
                    ErrorKind::MakeCurrentFailed,
                )?;
                if pixel_format != self.pixel_format {
                    return Err(Error::with_message(
                        ErrorKind::UsageContractViolation,
                        format!(
                            "the window uses pixel format {pixel_format}, the context needs {}",
                            self.pixel_format
                        ),
                    ));
                }
                Some((window.native_window(), hdc))
            },
            Some(_) => return Err(wrong_window(self.core.backend())),
            None => None,
        };

        if let Some((hwnd, _)) = target {
            if self.core.is_bound_to(hwnd) && self.is_current() {
                return Ok(());
            }
        }

        let bound = match target {
            Some((_, hdc)) => self.wgl.make_current(hdc, self.core.raw()),
            None => self.wgl.make_current(NativeHandle::NULL, NativeHandle::NULL),
        };

        if !bound {
            return Err(self.wgl_error(ErrorKind::MakeCurrentFailed, "wglMakeCurrent() failed"));
        }

        self.core.set_bound(target.map(|(hwnd, _)| hwnd));
        Ok(())
    }

    fn is_current(&self) -> bool {
        self.core.is_live() && self.wgl.current_context() == self.core.raw()
    }

    fn get_proc_address(&self, name: &CStr) -> *const c_void {
        if !self.core.is_live() {
            return ptr::null();
        }

        self.wgl.get_proc_address(name)
    }

    fn dispose(&mut self) -> Result<()> {
        if self.core.is_live() {
            if self.is_current() && !self.wgl.make_current(NativeHandle::NULL, NativeHandle::NULL)
            {
                log::warn!("wglMakeCurrent() failed to release the context before deleting it");
            }

            self.wgl.delete_context(self.core.raw());
        }

        self.core.set_disposed();

        match self.hidden.take() {
            Some(mut hidden) => hidden.dispose(),
            None => Ok(()),
        }
    }
}

impl Drop for WglContext {
    fn drop(&mut self) {
        if let Err(err) = self.dispose() {
            log::error!("failed to dispose the WGL context: {err}");
        }
    }
}

impl fmt::Debug for WglContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WglContext")
            .field("core", &self.core)
            .field("pixel_format", &self.pixel_format)
            .field("hidden", &self.hidden)
            .finish_non_exhaustive()
    }
}
