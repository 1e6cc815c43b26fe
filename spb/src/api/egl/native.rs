//! EGL through the system libEGL.

use std::ffi::{c_void, CStr, CString};
use std::fmt;
use std::ops::Deref;
use std::ptr;

use libloading::os::unix as libloading_os;
use libloading::Library;
use once_cell::sync::{Lazy, OnceCell};
use spb_egl_sys::egl;

use super::{initialize_display, EglApi, OPENGL_API};
use crate::api::x11;
use crate::error::{Error, ErrorKind, Result};
use crate::handle::NativeHandle;
use crate::lib_loading::{SymLoading, SymWrapper};

/// The EGL handle.
pub(crate) static EGL: Lazy<Option<Egl>> = Lazy::new(|| {
    let paths = ["libEGL.so.1", "libEGL.so"];

    unsafe { SymWrapper::new(&paths).map(Egl).ok() }
});

/// The `EGLDisplay` of the default X display, initialized once.
static DEFAULT_DISPLAY: OnceCell<Result<NativeHandle>> = OnceCell::new();

type EglGetProcAddress = unsafe extern "C" fn(*const c_void) -> *const c_void;
static EGL_GET_PROC_ADDRESS: OnceCell<Option<libloading_os::Symbol<EglGetProcAddress>>> =
    OnceCell::new();

pub(crate) struct Egl(SymWrapper<egl::Egl>);

unsafe impl Sync for Egl {}
unsafe impl Send for Egl {}

impl SymLoading for egl::Egl {
    unsafe fn load_with(lib: &Library) -> Self {
        let loader = move |sym_name: &'static str| -> *const c_void {
            let Ok(sym_name) = CString::new(sym_name) else {
                return ptr::null();
            };

            unsafe {
                if let Ok(sym) = lib.get::<*const c_void>(sym_name.as_bytes_with_nul()) {
                    return *sym;
                }

                // Before EGL 1.5 `eglGetProcAddress` only knows extensions,
                // so the library is asked first.
                let get_proc_address = EGL_GET_PROC_ADDRESS.get_or_init(|| {
                    lib.get::<EglGetProcAddress>(b"eglGetProcAddress\0")
                        .ok()
                        .map(|sym| sym.into_raw())
                });

                match get_proc_address {
                    Some(get_proc_address) => {
                        (get_proc_address)(sym_name.as_bytes_with_nul().as_ptr() as *const c_void)
                    },
                    None => ptr::null(),
                }
            }
        };

        Self::load_with(loader)
    }
}

impl Deref for Egl {
    type Target = egl::Egl;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// [`EglApi`] backed by the system libEGL.
#[derive(Clone, Copy)]
pub struct NativeEgl {
    egl: &'static Egl,
}

impl NativeEgl {
    pub fn new() -> Result<Self> {
        EGL.as_ref().map(|egl| Self { egl }).ok_or_else(|| {
            Error::with_message(ErrorKind::UnsupportedPlatform, "libEGL couldn't be loaded")
        })
    }
}

impl EglApi for NativeEgl {
    fn default_display(&self) -> Result<NativeHandle> {
        DEFAULT_DISPLAY
            .get_or_init(|| {
                let x_display = x11::native_default_display()?;
                initialize_display(self, x_display)
            })
            .clone()
    }

    fn get_display(&self, native_display: NativeHandle) -> NativeHandle {
        unsafe { NativeHandle::from(self.egl.GetDisplay(native_display.as_ptr() as _)) }
    }

    fn initialize(&self, display: NativeHandle) -> bool {
        let (mut major, mut minor) = (0, 0);
        unsafe { self.egl.Initialize(display.as_ptr() as _, &mut major, &mut minor) != egl::FALSE }
    }

    fn bind_opengl_api(&self) -> bool {
        unsafe { self.egl.BindAPI(OPENGL_API) != egl::FALSE }
    }

    fn choose_config(&self, display: NativeHandle, attributes: &[i32]) -> NativeHandle {
        let mut config: egl::types::EGLConfig = ptr::null();
        let mut count = 0;

        let found = unsafe {
            self.egl.ChooseConfig(
                display.as_ptr() as _,
                attributes.as_ptr(),
                &mut config,
                1,
                &mut count,
            )
        };

        if found == egl::FALSE || count < 1 {
            return NativeHandle::NULL;
        }

        NativeHandle::from(config)
    }

    fn get_config_attrib(
        &self,
        display: NativeHandle,
        config: NativeHandle,
        attribute: i32,
    ) -> Option<i32> {
        let mut value = 0;
        let found = unsafe {
            self.egl.GetConfigAttrib(
                display.as_ptr() as _,
                config.as_ptr() as _,
                attribute,
                &mut value,
            )
        };

        (found != egl::FALSE).then_some(value)
    }

    fn create_window_surface(
        &self,
        display: NativeHandle,
        config: NativeHandle,
        native_window: NativeHandle,
        attributes: &[i32],
    ) -> NativeHandle {
        let surface = unsafe {
            self.egl.CreateWindowSurface(
                display.as_ptr() as _,
                config.as_ptr() as _,
                native_window.raw() as egl::NativeWindowType,
                attributes.as_ptr(),
            )
        };

        NativeHandle::from(surface)
    }

    fn destroy_surface(&self, display: NativeHandle, surface: NativeHandle) {
        unsafe {
            self.egl.DestroySurface(display.as_ptr() as _, surface.as_ptr() as _);
        }
    }

    fn create_context(
        &self,
        display: NativeHandle,
        config: NativeHandle,
        share: NativeHandle,
        attributes: &[i32],
    ) -> NativeHandle {
        let context = unsafe {
            self.egl.CreateContext(
                display.as_ptr() as _,
                config.as_ptr() as _,
                share.as_ptr() as _,
                attributes.as_ptr(),
            )
        };

        NativeHandle::from(context)
    }

    fn destroy_context(&self, display: NativeHandle, context: NativeHandle) {
        unsafe {
            self.egl.DestroyContext(display.as_ptr() as _, context.as_ptr() as _);
        }
    }

    fn make_current(
        &self,
        display: NativeHandle,
        draw: NativeHandle,
        read: NativeHandle,
        context: NativeHandle,
    ) -> bool {
        unsafe {
            self.egl.MakeCurrent(
                display.as_ptr() as _,
                draw.as_ptr() as _,
                read.as_ptr() as _,
                context.as_ptr() as _,
            ) != egl::FALSE
        }
    }

    fn current_context(&self) -> NativeHandle {
        unsafe { NativeHandle::from(self.egl.GetCurrentContext()) }
    }

    fn current_draw_surface(&self) -> NativeHandle {
        unsafe { NativeHandle::from(self.egl.GetCurrentSurface(egl::DRAW as _)) }
    }

    fn get_error(&self) -> i32 {
        unsafe { self.egl.GetError() }
    }

    fn get_proc_address(&self, name: &CStr) -> *const c_void {
        unsafe { self.egl.GetProcAddress(name.as_ptr()) as *const _ }
    }

    fn swap_buffers(&self, display: NativeHandle, surface: NativeHandle) -> bool {
        unsafe { self.egl.SwapBuffers(display.as_ptr() as _, surface.as_ptr() as _) != egl::FALSE }
    }

    fn swap_interval(&self, display: NativeHandle, interval: i32) -> bool {
        unsafe { self.egl.SwapInterval(display.as_ptr() as _, interval) != egl::FALSE }
    }
}

impl fmt::Debug for NativeEgl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeEgl").finish_non_exhaustive()
    }
}
