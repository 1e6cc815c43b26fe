//! GLX context.

use std::ffi::{c_void, CStr};
use std::fmt;
use std::ptr;
use std::sync::Arc;

use super::{context_attributes, select_fb_config, GlxApi};
use crate::context::{
    ensure_same_display, wrong_window, ContextAttributes, ContextCore, ContextState, GlBackend,
    GlContext, Liveness,
};
use crate::error::{Error, ErrorKind, Result};
use crate::handle::NativeHandle;
use crate::window::{NativeWindow, Window};

/// An OpenGL context created with `glXCreateContextAttribsARB`.
pub struct GlxContext {
    glx: Arc<dyn GlxApi>,
    core: ContextCore,
}

impl GlxContext {
    /// Record the context parameters. Nothing native happens until
    /// [`GlContext::initialize`].
    ///
    /// `share` must be an initialized GLX context.
    pub fn new(
        glx: Arc<dyn GlxApi>,
        attributes: ContextAttributes,
        share: Option<&dyn GlContext>,
    ) -> Result<Self> {
        let core = ContextCore::new(GlBackend::Glx, attributes, share)?;
        Ok(Self { glx, core })
    }

    fn create_context(
        &self,
        display: NativeHandle,
        config: NativeHandle,
        share: NativeHandle,
        direct: bool,
        attrs: &[i32],
    ) -> NativeHandle {
        self.glx.create_context_attribs(display, config, share, direct, attrs)
    }
}

impl GlContext for GlxContext {
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
            Some(Window::Glx(window)) => window.native_display(),
            Some(_) => return Err(wrong_window(self.core.backend())),
            None => NativeHandle::NULL,
        };
        let display = match display.non_null() {
            Some(display) => display,
            None => self.glx.default_display()?,
        };

        let config = select_fb_config(self.glx.as_ref(), display, &self.core.attributes.format)?;
        let share = self.core.share_for(display)?;

        if !self.glx.supports_create_context_attribs() {
            return Err(Error::with_message(
                ErrorKind::ContextCreationFailed,
                "glXCreateContextAttribsARB is not available",
            ));
        }

        let attrs = context_attributes(&self.core.attributes).to_raw();
        let direct = self.core.attributes.direct_rendering;

        let mut context = self.create_context(display, config, share, direct, &attrs);
        if context.is_null() {
            log::debug!(
                "glXCreateContextAttribsARB() failed with direct rendering {}, retrying with {}",
                direct,
                !direct
            );
            context = self.create_context(display, config, share, !direct, &attrs);
            if !context.is_null() {
                self.core.attributes.direct_rendering = !direct;
            }
        }

        if context.is_null() {
            return Err(Error::with_message(
                ErrorKind::ContextCreationFailed,
                "glXCreateContextAttribsARB() failed",
            ));
        }

        self.core.set_initialized(display, context);
        Ok(())
    }

    fn make_current(&mut self, window: Option<&Window>) -> Result<()> {
        self.core.ensure_live()?;

        let display = self.core.display();
        let drawable = match window {
            Some(Window::Glx(window)) => {
                ensure_same_display(display, window.native_display())?;
                Some(window.native_window())
            },
            Some(_) => return Err(wrong_window(self.core.backend())),
            None => None,
        };

        if let Some(drawable) = drawable {
            if self.core.is_bound_to(drawable) && self.is_current() {
                return Ok(());
            }
        }

        let bound = match drawable {
            Some(drawable) => self.glx.make_current(display, drawable, self.core.raw()),
            None => self.glx.make_current(display, NativeHandle::NULL, NativeHandle::NULL),
        };

        if !bound {
            return Err(Error::with_message(ErrorKind::MakeCurrentFailed, "glXMakeCurrent() failed"));
        }

        self.core.set_bound(drawable);
        Ok(())
    }

    fn is_current(&self) -> bool {
        self.core.is_live() && self.glx.current_context() == self.core.raw()
    }

    fn get_proc_address(&self, name: &CStr) -> *const c_void {
        if !self.core.is_live() {
            return ptr::null();
        }

        self.glx.get_proc_address(name)
    }

    fn dispose(&mut self) -> Result<()> {
        if !self.core.is_live() {
            self.core.set_disposed();
            return Ok(());
        }

        let display = self.core.display();
        let context = self.core.raw();

        if self.is_current()
            && !self.glx.make_current(display, NativeHandle::NULL, NativeHandle::NULL)
        {
            log::warn!("glXMakeCurrent() failed to release the context before destroying it");
        }

        self.glx.destroy_context(display, context);
        self.core.set_disposed();
        Ok(())
    }
}

impl Drop for GlxContext {
    fn drop(&mut self) {
        if let Err(err) = self.dispose() {
            log::error!("failed to dispose the GLX context: {err}");
        }
    }
}

impl fmt::Debug for GlxContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GlxContext").field("core", &self.core).finish_non_exhaustive()
    }
}
