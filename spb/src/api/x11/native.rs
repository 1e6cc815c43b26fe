//! Xlib through `x11-dl`.

use std::fmt;
use std::mem;
use std::os::raw::{c_int, c_uint, c_ulong};
use std::ptr;

use once_cell::sync::Lazy;
use x11_dl::xlib::{self, Xlib};
use x11_dl::xlib_xcb::Xlib_xcb;

use super::{X11Visual, X11WindowRequest, XlibApi};
use crate::error::{Error, ErrorKind, Result};
use crate::handle::NativeHandle;

/// The XLIB handle.
pub(crate) static XLIB: Lazy<Option<Xlib>> = Lazy::new(|| Xlib::open().ok());

/// The XLIB-XCB handle, used to get the XCB connection of a display.
pub(crate) static XLIB_XCB: Lazy<Option<Xlib_xcb>> = Lazy::new(|| Xlib_xcb::open().ok());

/// The display every window and context uses unless told otherwise.
static DEFAULT_DISPLAY: Lazy<Result<NativeHandle>> = Lazy::new(open_default_display);

fn open_default_display() -> Result<NativeHandle> {
    let xlib = XLIB.as_ref().ok_or_else(|| {
        Error::with_message(ErrorKind::UnsupportedPlatform, "libX11 couldn't be loaded")
    })?;

    unsafe {
        (xlib.XInitThreads)();
        // Installed once for the whole process, protocol errors are only
        // reported, never turned into results.
        (xlib.XSetErrorHandler)(Some(x_error_handler));

        let display = (xlib.XOpenDisplay)(ptr::null());
        if display.is_null() {
            return Err(Error::with_message(
                ErrorKind::InitializationFailed,
                "XOpenDisplay() failed, is DISPLAY set?",
            ));
        }

        Ok(NativeHandle::from(display))
    }
}

unsafe extern "C" fn x_error_handler(
    _display: *mut xlib::Display,
    event: *mut xlib::XErrorEvent,
) -> c_int {
    if let Some(event) = unsafe { event.as_ref() } {
        log::error!(
            "XError: request {} failed with {} (minor {})",
            event.request_code,
            event.error_code,
            event.minor_code
        );
    }

    0
}

/// The XCB connection behind `display`, null when Xlib-XCB is missing.
pub(crate) fn xcb_connection(display: NativeHandle) -> NativeHandle {
    match XLIB_XCB.as_ref() {
        Some(xlib_xcb) if !display.is_null() => unsafe {
            NativeHandle::from((xlib_xcb.XGetXCBConnection)(display.as_ptr().cast()))
        },
        _ => NativeHandle::NULL,
    }
}

/// The default display if it could be opened.
pub(crate) fn default_display() -> Result<NativeHandle> {
    DEFAULT_DISPLAY.clone()
}

/// Copy the interesting bits out of an `XVisualInfo` and free it.
///
/// # Safety
///
/// `info` must be null or returned by Xlib.
pub(crate) unsafe fn take_visual_info(
    xlib: &Xlib,
    info: *mut xlib::XVisualInfo,
) -> Option<X11Visual> {
    if info.is_null() {
        return None;
    }

    let visual = unsafe {
        let raw = &*info;
        let visual = X11Visual {
            visual: NativeHandle::from(raw.visual),
            visual_id: raw.visualid as u64,
            depth: raw.depth,
            screen: raw.screen,
        };
        (xlib.XFree)(info.cast());
        visual
    };

    Some(visual)
}

/// [`XlibApi`] backed by the system libX11.
#[derive(Clone, Copy)]
pub struct NativeXlib {
    xlib: &'static Xlib,
}

impl NativeXlib {
    pub fn new() -> Result<Self> {
        XLIB.as_ref().map(|xlib| Self { xlib }).ok_or_else(|| {
            Error::with_message(ErrorKind::UnsupportedPlatform, "libX11 couldn't be loaded")
        })
    }

    fn display(display: NativeHandle) -> *mut xlib::Display {
        display.as_ptr().cast()
    }
}

impl XlibApi for NativeXlib {
    fn default_display(&self) -> Result<NativeHandle> {
        default_display()
    }

    fn default_screen(&self, display: NativeHandle) -> i32 {
        unsafe { (self.xlib.XDefaultScreen)(Self::display(display)) }
    }

    fn root_window(&self, display: NativeHandle, screen: i32) -> NativeHandle {
        let root = unsafe { (self.xlib.XRootWindow)(Self::display(display), screen) };
        NativeHandle::new(root as usize)
    }

    fn visual_from_id(&self, display: NativeHandle, visual_id: u64) -> Option<X11Visual> {
        if visual_id == 0 {
            return None;
        }

        unsafe {
            let mut template: xlib::XVisualInfo = mem::zeroed();
            template.visualid = visual_id as xlib::VisualID;

            let mut count = 0;
            let info = (self.xlib.XGetVisualInfo)(
                Self::display(display),
                xlib::VisualIDMask,
                &mut template,
                &mut count,
            );

            take_visual_info(self.xlib, info)
        }
    }

    fn default_visual(&self, display: NativeHandle, screen: i32) -> Option<X11Visual> {
        let display = Self::display(display);

        unsafe {
            let visual = (self.xlib.XDefaultVisual)(display, screen);
            if visual.is_null() {
                return None;
            }

            Some(X11Visual {
                visual: NativeHandle::from(visual),
                visual_id: (self.xlib.XVisualIDFromVisual)(visual) as u64,
                depth: (self.xlib.XDefaultDepth)(display, screen),
                screen,
            })
        }
    }

    fn create_colormap(
        &self,
        display: NativeHandle,
        window: NativeHandle,
        visual: &X11Visual,
    ) -> NativeHandle {
        let colormap = unsafe {
            (self.xlib.XCreateColormap)(
                Self::display(display),
                window.raw() as xlib::Window,
                visual.visual.as_ptr().cast(),
                xlib::AllocNone,
            )
        };
        NativeHandle::new(colormap as usize)
    }

    fn free_colormap(&self, display: NativeHandle, colormap: NativeHandle) {
        if colormap.is_null() {
            return;
        }

        unsafe {
            (self.xlib.XFreeColormap)(Self::display(display), colormap.raw() as xlib::Colormap);
        }
    }

    fn create_window(&self, display: NativeHandle, request: &X11WindowRequest) -> NativeHandle {
        let window = unsafe {
            let mut attributes: xlib::XSetWindowAttributes = mem::zeroed();
            attributes.background_pixel = 0;
            attributes.border_pixel = 0;
            attributes.colormap = request.colormap.raw() as xlib::Colormap;
            attributes.event_mask = xlib::ExposureMask | xlib::StructureNotifyMask;

            let mask: c_ulong =
                xlib::CWColormap | xlib::CWEventMask | xlib::CWBackPixel | xlib::CWBorderPixel;

            (self.xlib.XCreateWindow)(
                Self::display(display),
                request.parent.raw() as xlib::Window,
                request.x,
                request.y,
                request.width as c_uint,
                request.height as c_uint,
                0,
                request.visual.depth,
                xlib::InputOutput as c_uint,
                request.visual.visual.as_ptr().cast(),
                mask,
                &mut attributes,
            )
        };

        NativeHandle::new(window as usize)
    }

    fn map_window(&self, display: NativeHandle, window: NativeHandle) {
        unsafe {
            (self.xlib.XMapWindow)(Self::display(display), window.raw() as xlib::Window);
        }
    }

    fn unmap_window(&self, display: NativeHandle, window: NativeHandle) {
        unsafe {
            (self.xlib.XUnmapWindow)(Self::display(display), window.raw() as xlib::Window);
        }
    }

    fn destroy_window(&self, display: NativeHandle, window: NativeHandle) {
        unsafe {
            (self.xlib.XDestroyWindow)(Self::display(display), window.raw() as xlib::Window);
        }
    }

    fn flush(&self, display: NativeHandle) {
        unsafe {
            (self.xlib.XFlush)(Self::display(display));
        }
    }
}

impl fmt::Debug for NativeXlib {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeXlib").finish_non_exhaustive()
    }
}
