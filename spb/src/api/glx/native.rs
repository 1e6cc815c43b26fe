//! GLX through the system libGL.

use std::ffi::{c_void, CStr};
use std::fmt;
use std::ops::Deref;
use std::os::raw::c_int;
use std::ptr;

use libloading::Library;
use once_cell::sync::Lazy;
use spb_glx_sys::{glx, glx_extra};

use super::GlxApi;
use crate::api::x11::{self, X11Visual};
use crate::error::{Error, ErrorKind, Result};
use crate::handle::NativeHandle;
use crate::lib_loading::{self, SymLoading, SymWrapper};

/// The GLX handle.
pub(crate) static GLX: Lazy<Option<Glx>> = Lazy::new(|| {
    let paths = ["libGL.so.1", "libGL.so"];

    unsafe { SymWrapper::new(&paths).map(Glx).ok() }
});

/// Extension functions resolved with `glXGetProcAddress`.
static GLX_EXTRA: Lazy<Option<GlxExtra>> = Lazy::new(|| GLX.as_ref().map(GlxExtra::new));

pub(crate) struct Glx(SymWrapper<glx::Glx>);

unsafe impl Sync for Glx {}
unsafe impl Send for Glx {}

impl SymLoading for glx::Glx {
    unsafe fn load_with(lib: &Library) -> Self {
        Self::load_with(|sym| unsafe { lib_loading::lookup(lib, sym) })
    }
}

impl Deref for Glx {
    type Target = glx::Glx;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

pub(crate) struct GlxExtra(glx_extra::Glx);

unsafe impl Sync for GlxExtra {}
unsafe impl Send for GlxExtra {}

impl GlxExtra {
    fn new(glx: &Glx) -> Self {
        GlxExtra(glx_extra::Glx::load_with(|proc_name| {
            let Ok(name) = std::ffi::CString::new(proc_name) else {
                return ptr::null();
            };
            unsafe { glx.GetProcAddress(name.as_ptr() as *const u8) as *const _ }
        }))
    }
}

impl Deref for GlxExtra {
    type Target = glx_extra::Glx;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

fn glx_unavailable() -> Error {
    Error::with_message(ErrorKind::UnsupportedPlatform, "libGL couldn't be loaded")
}

/// [`GlxApi`] backed by the system libGL.
#[derive(Clone, Copy)]
pub struct NativeGlx {
    glx: &'static Glx,
    extra: &'static GlxExtra,
}

impl NativeGlx {
    pub fn new() -> Result<Self> {
        match (GLX.as_ref(), GLX_EXTRA.as_ref()) {
            (Some(glx), Some(extra)) => Ok(Self { glx, extra }),
            _ => Err(glx_unavailable()),
        }
    }
}

impl GlxApi for NativeGlx {
    fn default_display(&self) -> Result<NativeHandle> {
        x11::native_default_display()
    }

    fn default_screen(&self, display: NativeHandle) -> i32 {
        match x11::XLIB.as_ref() {
            Some(xlib) => unsafe { (xlib.XDefaultScreen)(display.as_ptr().cast()) },
            None => 0,
        }
    }

    fn choose_fb_config(
        &self,
        display: NativeHandle,
        screen: i32,
        attributes: &[i32],
    ) -> NativeHandle {
        unsafe {
            let mut count: c_int = 0;
            let configs = self.glx.ChooseFBConfig(
                display.as_ptr() as _,
                screen as _,
                attributes.as_ptr(),
                &mut count,
            );

            if configs.is_null() {
                return NativeHandle::NULL;
            }

            let config = if count > 0 { NativeHandle::from(*configs) } else { NativeHandle::NULL };
            if let Some(xlib) = x11::XLIB.as_ref() {
                (xlib.XFree)(configs.cast());
            }

            config
        }
    }

    fn visual_from_fb_config(
        &self,
        display: NativeHandle,
        config: NativeHandle,
    ) -> Option<X11Visual> {
        let xlib = x11::XLIB.as_ref()?;

        unsafe {
            let info = self.glx.GetVisualFromFBConfig(display.as_ptr() as _, config.as_ptr() as _);
            x11::take_visual_info(xlib, info.cast())
        }
    }

    fn supports_create_context_attribs(&self) -> bool {
        self.extra.CreateContextAttribsARB.is_loaded()
    }

    fn create_context_attribs(
        &self,
        display: NativeHandle,
        config: NativeHandle,
        share: NativeHandle,
        direct: bool,
        attributes: &[i32],
    ) -> NativeHandle {
        let context = unsafe {
            self.extra.CreateContextAttribsARB(
                display.as_ptr() as _,
                config.as_ptr() as _,
                share.as_ptr() as _,
                direct as _,
                attributes.as_ptr(),
            )
        };

        NativeHandle::from(context)
    }

    fn make_current(
        &self,
        display: NativeHandle,
        drawable: NativeHandle,
        context: NativeHandle,
    ) -> bool {
        unsafe {
            self.glx.MakeCurrent(
                display.as_ptr() as _,
                drawable.raw() as glx::types::GLXDrawable,
                context.as_ptr() as _,
            ) != 0
        }
    }

    fn current_context(&self) -> NativeHandle {
        unsafe { NativeHandle::from(self.glx.GetCurrentContext()) }
    }

    fn destroy_context(&self, display: NativeHandle, context: NativeHandle) {
        unsafe {
            self.glx.DestroyContext(display.as_ptr() as _, context.as_ptr() as _);
        }
    }

    fn get_proc_address(&self, name: &CStr) -> *const c_void {
        unsafe { self.glx.GetProcAddress(name.as_ptr() as *const _) as *const _ }
    }

    fn swap_buffers(&self, display: NativeHandle, drawable: NativeHandle) {
        unsafe {
            self.glx.SwapBuffers(display.as_ptr() as _, drawable.raw() as glx::types::GLXDrawable);
        }
    }

    fn swap_interval(
        &self,
        display: NativeHandle,
        drawable: NativeHandle,
        interval: i32,
    ) -> Result<()> {
        let extra = self.extra;

        // `EXT` is per drawable, the others act on the current one.
        unsafe {
            if extra.SwapIntervalEXT.is_loaded() {
                extra.SwapIntervalEXT(
                    display.as_ptr() as _,
                    drawable.raw() as glx::types::GLXDrawable,
                    interval as _,
                );
                return Ok(());
            }

            if extra.SwapIntervalMESA.is_loaded() {
                return match extra.SwapIntervalMESA(interval as _) {
                    0 => Ok(()),
                    code => Err(Error::with_code(ErrorKind::SwapFailed, code as i64)),
                };
            }

            if extra.SwapIntervalSGI.is_loaded() {
                return match extra.SwapIntervalSGI(interval as _) {
                    0 => Ok(()),
                    code => Err(Error::with_code(ErrorKind::SwapFailed, code as i64)),
                };
            }
        }

        Err(ErrorKind::NotSupported("no GLX swap control extension is available").into())
    }
}

impl fmt::Debug for NativeGlx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeGlx").finish_non_exhaustive()
    }
}
