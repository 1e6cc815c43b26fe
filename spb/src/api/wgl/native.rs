//! WGL through opengl32 and the `WGL_ARB`/`WGL_EXT` extensions.

use std::ffi::{c_void, CStr, CString, OsStr};
use std::fmt;
use std::mem;
use std::ops::Deref;
use std::os::windows::ffi::OsStrExt;
use std::ptr;

use once_cell::sync::Lazy;
use spb_wgl_sys::wgl_extra;
use windows_sys::Win32::Foundation::{GetLastError, HMODULE};
use windows_sys::Win32::Graphics::Gdi::HDC;
use windows_sys::Win32::Graphics::OpenGL::{self as gl, HGLRC, PIXELFORMATDESCRIPTOR};
use windows_sys::Win32::System::LibraryLoader::{GetProcAddress, LoadLibraryW};

use super::WglApi;
use crate::api::win32::Win32Helper;
use crate::error::{Error, ErrorKind, Result};
use crate::handle::NativeHandle;
use crate::window::NativeWindow;

/// `opengl32.dll`, which exports the GL 1.1 entry points `wglGetProcAddress`
/// doesn't resolve.
static OPENGL32: Lazy<HMODULE> = Lazy::new(|| {
    let name = OsStr::new("opengl32.dll").encode_wide().chain(Some(0)).collect::<Vec<_>>();
    unsafe { LoadLibraryW(name.as_ptr()) }
});

/// Extension functions, resolved once through a hidden window.
static WGL_EXTRA: Lazy<Result<WglExtra>> = Lazy::new(|| unsafe { load_extra_functions() });

pub(crate) struct WglExtra(wgl_extra::Wgl);

unsafe impl Send for WglExtra {}
unsafe impl Sync for WglExtra {}

impl Deref for WglExtra {
    type Target = wgl_extra::Wgl;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

fn as_hdc(hdc: NativeHandle) -> HDC {
    hdc.raw() as HDC
}

fn as_hglrc(context: NativeHandle) -> HGLRC {
    context.raw() as HGLRC
}

/// Makes a context current and restores the previous one when dropped.
struct CurrentContextGuard {
    previous_hdc: HDC,
    previous_hglrc: HGLRC,
}

impl CurrentContextGuard {
    unsafe fn make_current(hdc: HDC, context: HGLRC) -> Result<Self> {
        let previous_hdc = unsafe { gl::wglGetCurrentDC() };
        let previous_hglrc = unsafe { gl::wglGetCurrentContext() };

        if unsafe { gl::wglMakeCurrent(hdc, context) } == 0 {
            return Err(last_error(ErrorKind::InitializationFailed, "wglMakeCurrent() failed"));
        }

        Ok(Self { previous_hdc, previous_hglrc })
    }
}

impl Drop for CurrentContextGuard {
    fn drop(&mut self) {
        unsafe {
            gl::wglMakeCurrent(self.previous_hdc, self.previous_hglrc);
        }
    }
}

fn last_error(kind: ErrorKind, message: &str) -> Error {
    Error::new(Some(unsafe { GetLastError() } as i64), Some(message.into()), kind)
}

fn legacy_descriptor() -> PIXELFORMATDESCRIPTOR {
    let mut descriptor: PIXELFORMATDESCRIPTOR = unsafe { mem::zeroed() };
    descriptor.nSize = mem::size_of::<PIXELFORMATDESCRIPTOR>() as u16;
    descriptor.nVersion = 1;
    descriptor.dwFlags = gl::PFD_DRAW_TO_WINDOW | gl::PFD_SUPPORT_OPENGL | gl::PFD_DOUBLEBUFFER;
    descriptor.iPixelType = gl::PFD_TYPE_RGBA;
    descriptor.cColorBits = 24;
    descriptor.cAlphaBits = 8;
    descriptor.cDepthBits = 24;
    descriptor.cStencilBits = 8;
    descriptor
}

/// The extension entry points only resolve while a context is current, so a
/// legacy context is made current on a hidden window for the duration.
unsafe fn load_extra_functions() -> Result<WglExtra> {
    let mut window = Win32Helper::global().create_window(0, 0, 1, 1)?;
    let hdc = as_hdc(window.device_context());

    let extra = unsafe {
        let descriptor = legacy_descriptor();
        let pixel_format = gl::ChoosePixelFormat(hdc, &descriptor);
        if pixel_format == 0 {
            return Err(last_error(ErrorKind::InitializationFailed, "ChoosePixelFormat() failed"));
        }
        if gl::SetPixelFormat(hdc, pixel_format, &descriptor) == 0 {
            return Err(last_error(ErrorKind::InitializationFailed, "SetPixelFormat() failed"));
        }

        let context = gl::wglCreateContext(hdc);
        if context == 0 {
            return Err(last_error(ErrorKind::InitializationFailed, "wglCreateContext() failed"));
        }

        let extra = CurrentContextGuard::make_current(hdc, context).map(|_guard| {
            wgl_extra::Wgl::load_with(|name| {
                let Ok(name) = CString::new(name) else {
                    return ptr::null();
                };
                match gl::wglGetProcAddress(name.as_ptr().cast()) {
                    Some(proc) => proc as *const c_void,
                    None => ptr::null(),
                }
            })
        });

        gl::wglDeleteContext(context);
        extra?
    };

    window.dispose()?;
    log::debug!("loaded the WGL extension functions");

    Ok(WglExtra(extra))
}

/// [`WglApi`] backed by opengl32 and the driver's extensions.
#[derive(Clone, Copy)]
pub struct NativeWgl {
    extra: &'static WglExtra,
}

impl NativeWgl {
    pub fn new() -> Result<Self> {
        if *OPENGL32 == 0 {
            return Err(Error::with_message(
                ErrorKind::UnsupportedPlatform,
                "opengl32.dll couldn't be loaded",
            ));
        }

        match &*WGL_EXTRA {
            Ok(extra) => Ok(Self { extra }),
            Err(err) => Err(err.clone()),
        }
    }
}

impl WglApi for NativeWgl {
    fn choose_pixel_format(&self, hdc: NativeHandle, attributes: &[i32]) -> Option<i32> {
        if !self.extra.ChoosePixelFormatARB.is_loaded() {
            log::debug!("WGL_ARB_pixel_format is not available");
            return None;
        }

        let mut pixel_format = 0;
        let mut count = 0;
        let found = unsafe {
            self.extra.ChoosePixelFormatARB(
                hdc.as_ptr() as *const _,
                attributes.as_ptr(),
                ptr::null(),
                1,
                &mut pixel_format,
                &mut count,
            )
        };

        (found != 0 && count > 0).then_some(pixel_format)
    }

    fn pixel_format(&self, hdc: NativeHandle) -> i32 {
        unsafe { gl::GetPixelFormat(as_hdc(hdc)) }
    }

    fn set_pixel_format(&self, hdc: NativeHandle, pixel_format: i32) -> bool {
        unsafe {
            let mut descriptor: PIXELFORMATDESCRIPTOR = mem::zeroed();
            if gl::DescribePixelFormat(
                as_hdc(hdc),
                pixel_format as _,
                mem::size_of::<PIXELFORMATDESCRIPTOR>() as _,
                &mut descriptor,
            ) == 0
            {
                return false;
            }

            gl::SetPixelFormat(as_hdc(hdc), pixel_format, &descriptor) != 0
        }
    }

    fn supports_create_context_attribs(&self) -> bool {
        self.extra.CreateContextAttribsARB.is_loaded()
    }

    fn create_context_attribs(
        &self,
        hdc: NativeHandle,
        share: NativeHandle,
        attributes: &[i32],
    ) -> NativeHandle {
        let context = unsafe {
            self.extra.CreateContextAttribsARB(
                hdc.as_ptr() as *const _,
                share.as_ptr() as *const _,
                attributes.as_ptr(),
            )
        };

        NativeHandle::from(context)
    }

    fn make_current(&self, hdc: NativeHandle, context: NativeHandle) -> bool {
        unsafe { gl::wglMakeCurrent(as_hdc(hdc), as_hglrc(context)) != 0 }
    }

    fn current_context(&self) -> NativeHandle {
        NativeHandle::new(unsafe { gl::wglGetCurrentContext() } as usize)
    }

    fn delete_context(&self, context: NativeHandle) {
        unsafe {
            gl::wglDeleteContext(as_hglrc(context));
        }
    }

    fn get_proc_address(&self, name: &CStr) -> *const c_void {
        unsafe {
            match gl::wglGetProcAddress(name.as_ptr().cast()) {
                Some(proc) => proc as *const c_void,
                None => match GetProcAddress(*OPENGL32, name.as_ptr().cast()) {
                    Some(proc) => proc as *const c_void,
                    None => ptr::null(),
                },
            }
        }
    }

    fn swap_buffers(&self, hdc: NativeHandle) -> bool {
        unsafe { gl::SwapBuffers(as_hdc(hdc)) != 0 }
    }

    fn swap_interval(&self, interval: i32) -> Result<()> {
        if !self.extra.SwapIntervalEXT.is_loaded() {
            return Err(ErrorKind::NotSupported("WGL_EXT_swap_control is not available").into());
        }

        if unsafe { self.extra.SwapIntervalEXT(interval) } == 0 {
            return Err(last_error(ErrorKind::SwapFailed, "wglSwapIntervalEXT() failed"));
        }

        Ok(())
    }

    fn last_error(&self) -> u32 {
        unsafe { GetLastError() }
    }
}

impl fmt::Debug for NativeWgl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeWgl").finish_non_exhaustive()
    }
}
