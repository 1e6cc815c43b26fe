//! EGL context.

use std::ffi::{c_void, CStr};
use std::fmt;
use std::ptr;
use std::sync::Arc;

use super::{context_attributes, select_config, EglApi};
use crate::context::{
    ensure_same_display, wrong_window, ContextAttributes, ContextCore, ContextState, GlBackend,
    GlContext, Liveness,
};
use crate::error::{Error, ErrorKind, Result};
use crate::handle::NativeHandle;
use crate::window::{NativeWindow, Window};

/// An OpenGL context created with `eglCreateContext`.
///
/// `eglBindAPI` is per thread, so it's called again before every bind.
pub struct EglContext {
    egl: Arc<dyn EglApi>,
    core: ContextCore,
}

impl EglContext {
    /// Record the context parameters. Nothing native happens until
    /// [`GlContext::initialize`].
    pub fn new(
        egl: Arc<dyn EglApi>,
        attributes: ContextAttributes,
        share: Option<&dyn GlContext>,
    ) -> Result<Self> {
        let core = ContextCore::new(GlBackend::Egl, attributes, share)?;
        Ok(Self { egl, core })
    }

    fn egl_error(&self, kind: ErrorKind, message: &str) -> Error {
        Error::new(Some(self.egl.get_error() as i64), Some(message.into()), kind)
    }
}

impl GlContext for EglContext {
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

        let display = match window {
            Some(Window::Egl(window)) => window.native_display(),
            Some(_) => return Err(wrong_window(self.core.backend())),
            None => self.egl.default_display()?,
        };

        let config = select_config(self.egl.as_ref(), display, &self.core.attributes.format)?;
        let share = self.core.share_for(display)?;

        if !self.egl.bind_opengl_api() {
            return Err(self.egl_error(ErrorKind::ContextCreationFailed, "eglBindAPI() failed"));
        }

        let attrs = context_attributes(&self.core.attributes).to_raw();
        let context = self.egl.create_context(display, config, share, &attrs);
        if context.is_null() {
            return Err(
                self.egl_error(ErrorKind::ContextCreationFailed, "eglCreateContext() failed")
            );
        }

        self.core.set_initialized(display, context);
        Ok(())
    }

    fn make_current(&mut self, window: Option<&Window>) -> Result<()> {
        self.core.ensure_live()?;

        let display = self.core.display();
        let target = match window {
            Some(Window::Egl(window)) => {
                ensure_same_display(display, window.native_display())?;
                Some((window.native_window(), window.surface()?))
            },
            Some(_) => return Err(wrong_window(self.core.backend())),
            None => None,
        };

        if let Some((window, _)) = target {
            if self.core.is_bound_to(window) && self.is_current() {
                return Ok(());
            }
        }

        if !self.egl.bind_opengl_api() {
            return Err(self.egl_error(ErrorKind::MakeCurrentFailed, "eglBindAPI() failed"));
        }

        let bound = match target {
            Some((_, surface)) => self.egl.make_current(display, surface, surface, self.core.raw()),
            None => self.egl.make_current(
                display,
                NativeHandle::NULL,
                NativeHandle::NULL,
                NativeHandle::NULL,
            ),
        };

        if !bound {
            return Err(self.egl_error(ErrorKind::MakeCurrentFailed, "eglMakeCurrent() failed"));
        }

        self.core.set_bound(target.map(|(window, _)| window));
        Ok(())
    }

    fn is_current(&self) -> bool {
        self.core.is_live() && self.egl.current_context() == self.core.raw()
    }

    fn get_proc_address(&self, name: &CStr) -> *const c_void {
        if !self.core.is_live() {
            return ptr::null();
        }

        self.egl.get_proc_address(name)
    }

    fn dispose(&mut self) -> Result<()> {
        if !self.core.is_live() {
            self.core.set_disposed();
            return Ok(());
        }

        let display = self.core.display();

        if self.is_current()
            && !self.egl.make_current(
                display,
                NativeHandle::NULL,
                NativeHandle::NULL,
                NativeHandle::NULL,
            )
        {
            log::warn!("eglMakeCurrent() failed to release the context before destroying it");
        }

        self.egl.destroy_context(display, self.core.raw());
        self.core.set_disposed();
        Ok(())
    }
}

impl Drop for EglContext {
    fn drop(&mut self) {
        if let Err(err) = self.dispose() {
            log::error!("failed to dispose the EGL context: {err}");
        }
    }
}

impl fmt::Debug for EglContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EglContext").field("core", &self.core).finish_non_exhaustive()
    }
}
