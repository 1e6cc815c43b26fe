//! Plain Win32 windows and the window class they share.

use std::fmt;
use std::num::NonZeroIsize;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use raw_window_handle::{
    DisplayHandle, HandleError, HasDisplayHandle, HasWindowHandle, RawDisplayHandle,
    RawWindowHandle, Win32WindowHandle, WindowHandle, WindowsDisplayHandle,
};

use crate::api::wgl::{self, WglApi, WglWindow};
use crate::error::{Error, ErrorKind, Result};
use crate::format::FramebufferFormat;
use crate::handle::NativeHandle;
use crate::window::{disposed_window, NativeWindow};

#[cfg(windows)]
mod native;

#[cfg(windows)]
pub use native::NativeWin32;

/// The window class every window of this crate uses.
pub const CLASS_NAME: &str = "SPB.Win32";

/// The title given to new windows.
pub const DEFAULT_TITLE: &str = "SPB no name";

/// The user32/gdi32 calls used to create and manage windows.
///
/// Window and device context handles are passed as [`NativeHandle`]s.
pub trait Win32Api: Send + Sync {
    /// Register `class_name` with `CS_OWNDC` and the default window procedure.
    fn register_class(&self, class_name: &str) -> Result<()>;

    /// `CreateWindowExW` with the app window styles, null on failure.
    fn create_window(
        &self,
        class_name: &str,
        title: &str,
        x: i32,
        y: i32,
        width: u32,
        height: u32,
    ) -> NativeHandle;

    /// `GetLastError` of the calling thread.
    fn last_error(&self) -> u32;

    fn get_dc(&self, hwnd: NativeHandle) -> NativeHandle;

    fn release_dc(&self, hwnd: NativeHandle, hdc: NativeHandle);

    fn destroy_window(&self, hwnd: NativeHandle);

    /// `SW_SHOWNOACTIVATE` when `visible`, `SW_HIDE` otherwise.
    fn show_window(&self, hwnd: NativeHandle, visible: bool);

    /// The `HINSTANCE` the window was created with.
    fn window_instance(&self, hwnd: NativeHandle) -> NativeHandle;
}

/// A Win32 window and its device context.
///
/// The class is registered with `CS_OWNDC`, so the device context is fetched
/// once and stays valid for the window's lifetime.
pub struct Win32Window {
    api: Arc<dyn Win32Api>,
    hwnd: NativeHandle,
    hdc: NativeHandle,
    disposed: bool,
}

impl Win32Window {
    /// Take ownership of `hwnd` and fetch its device context.
    ///
    /// The window is destroyed when the device context can't be fetched.
    pub fn new(api: Arc<dyn Win32Api>, hwnd: NativeHandle) -> Result<Self> {
        let hdc = api.get_dc(hwnd);
        if hdc.is_null() {
            let code = api.last_error();
            api.destroy_window(hwnd);
            return Err(Error::new(
                Some(code as i64),
                Some("GetDC() failed".into()),
                ErrorKind::WindowCreationFailed,
            ));
        }

        Ok(Self { api, hwnd, hdc, disposed: false })
    }

    /// The `HDC` of the window.
    #[inline]
    pub fn device_context(&self) -> NativeHandle {
        self.hdc
    }

    /// The `HINSTANCE` the window belongs to.
    pub fn instance(&self) -> NativeHandle {
        self.api.window_instance(self.hwnd)
    }
}

impl NativeWindow for Win32Window {
    fn native_display(&self) -> NativeHandle {
        self.hdc
    }

    fn native_window(&self) -> NativeHandle {
        self.hwnd
    }

    fn show(&mut self) -> Result<()> {
        if self.disposed {
            return Err(disposed_window());
        }

        self.api.show_window(self.hwnd, true);
        Ok(())
    }

    fn hide(&mut self) -> Result<()> {
        if self.disposed {
            return Err(disposed_window());
        }

        self.api.show_window(self.hwnd, false);
        Ok(())
    }

    fn is_disposed(&self) -> bool {
        self.disposed
    }

    fn dispose(&mut self) -> Result<()> {
        if self.disposed {
            return Ok(());
        }

        self.api.release_dc(self.hwnd, self.hdc);
        self.api.destroy_window(self.hwnd);
        self.disposed = true;
        Ok(())
    }
}

impl HasWindowHandle for Win32Window {
    fn window_handle(&self) -> std::result::Result<WindowHandle<'_>, HandleError> {
        if self.disposed {
            return Err(HandleError::Unavailable);
        }

        let hwnd = NonZeroIsize::new(self.hwnd.raw() as isize).ok_or(HandleError::Unavailable)?;
        let mut handle = Win32WindowHandle::new(hwnd);
        handle.hinstance = NonZeroIsize::new(self.instance().raw() as isize);

        // SAFETY: the window stays alive until `dispose`, which needs `&mut self`.
        Ok(unsafe { WindowHandle::borrow_raw(RawWindowHandle::Win32(handle)) })
    }
}

impl HasDisplayHandle for Win32Window {
    fn display_handle(&self) -> std::result::Result<DisplayHandle<'_>, HandleError> {
        let raw = RawDisplayHandle::Windows(WindowsDisplayHandle::new());
        Ok(unsafe { DisplayHandle::borrow_raw(raw) })
    }
}

impl Drop for Win32Window {
    fn drop(&mut self) {
        if let Err(err) = self.dispose() {
            log::error!("failed to dispose the Win32 window: {err}");
        }
    }
}

impl fmt::Debug for Win32Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Win32Window")
            .field("hwnd", &self.hwnd)
            .field("hdc", &self.hdc)
            .field("disposed", &self.disposed)
            .finish_non_exhaustive()
    }
}

/// Creates Win32 and WGL windows.
///
/// Clones share the class registration latch. A failed registration is
/// handed to every later caller instead of being retried.
#[derive(Clone)]
pub struct Win32Helper {
    api: Arc<dyn Win32Api>,
    class: Arc<OnceCell<Result<()>>>,
}

impl Win32Helper {
    pub fn new(api: Arc<dyn Win32Api>) -> Self {
        Self { api, class: Arc::new(OnceCell::new()) }
    }

    /// The helper backed by the system user32, shared by the whole process.
    #[cfg(windows)]
    pub fn global() -> &'static Win32Helper {
        native::global_helper()
    }

    pub fn api(&self) -> &Arc<dyn Win32Api> {
        &self.api
    }

    /// Register [`CLASS_NAME`] unless it already was.
    pub fn ensure_class(&self) -> Result<()> {
        self.class.get_or_init(|| self.api.register_class(CLASS_NAME)).clone()
    }

    /// Create a plain window of [`CLASS_NAME`].
    pub fn create_window(&self, x: i32, y: i32, width: u32, height: u32) -> Result<Win32Window> {
        self.ensure_class()?;

        let hwnd = self.api.create_window(CLASS_NAME, DEFAULT_TITLE, x, y, width, height);
        if hwnd.is_null() {
            return Err(Error::new(
                Some(self.api.last_error() as i64),
                Some("CreateWindowExW() failed".into()),
                ErrorKind::WindowCreationFailed,
            ));
        }

        Win32Window::new(self.api.clone(), hwnd)
    }

    /// Create a window with the pixel format matching `format` already set.
    pub fn create_window_for_wgl(
        &self,
        wgl: Arc<dyn WglApi>,
        format: &FramebufferFormat,
        x: i32,
        y: i32,
        width: u32,
        height: u32,
    ) -> Result<WglWindow> {
        let window = self.create_window(x, y, width, height)?;

        let hdc = window.device_context();
        let pixel_format = wgl::select_pixel_format(wgl.as_ref(), hdc, format)?;
        let pixel_format = wgl::apply_pixel_format(
            wgl.as_ref(),
            hdc,
            pixel_format,
            ErrorKind::WindowCreationFailed,
        )?;

        Ok(WglWindow::new(wgl, window, pixel_format))
    }
}

impl fmt::Debug for Win32Helper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Win32Helper").field("class", &self.class.get()).finish_non_exhaustive()
    }
}
