//! user32 and gdi32 through `windows-sys`.

use std::ffi::OsStr;
use std::mem;
use std::os::windows::ffi::OsStrExt;
use std::ptr;
use std::sync::Arc;

use once_cell::sync::Lazy;
use windows_sys::Win32::Foundation::{GetLastError, ERROR_CLASS_ALREADY_EXISTS, HWND};
use windows_sys::Win32::Graphics::Gdi::{self as gdi, HDC};
use windows_sys::Win32::System::LibraryLoader::GetModuleHandleW;
use windows_sys::Win32::UI::WindowsAndMessaging as wm;

use super::{Win32Api, Win32Helper};
use crate::error::{Error, ErrorKind, Result};
use crate::handle::NativeHandle;

static HELPER: Lazy<Win32Helper> = Lazy::new(|| Win32Helper::new(Arc::new(NativeWin32)));

pub(super) fn global_helper() -> &'static Win32Helper {
    &HELPER
}

fn wide(text: &str) -> Vec<u16> {
    OsStr::new(text).encode_wide().chain(Some(0)).collect()
}

fn as_hwnd(handle: NativeHandle) -> HWND {
    handle.raw() as HWND
}

/// [`Win32Api`] backed by the system user32.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeWin32;

impl Win32Api for NativeWin32 {
    fn register_class(&self, class_name: &str) -> Result<()> {
        let class_name = wide(class_name);

        unsafe {
            let mut class: wm::WNDCLASSEXW = mem::zeroed();
            class.cbSize = mem::size_of::<wm::WNDCLASSEXW>() as u32;
            class.style = wm::CS_OWNDC;
            class.lpfnWndProc = Some(wm::DefWindowProcW);
            class.hInstance = GetModuleHandleW(ptr::null());
            class.lpszClassName = class_name.as_ptr();

            if wm::RegisterClassExW(&class) == 0 {
                let code = GetLastError();
                // Another copy of the library may have registered it first.
                if code != ERROR_CLASS_ALREADY_EXISTS {
                    return Err(Error::new(
                        Some(code as i64),
                        Some("RegisterClassExW() failed".into()),
                        ErrorKind::InitializationFailed,
                    ));
                }
            }
        }

        Ok(())
    }

    fn create_window(
        &self,
        class_name: &str,
        title: &str,
        x: i32,
        y: i32,
        width: u32,
        height: u32,
    ) -> NativeHandle {
        let class_name = wide(class_name);
        let title = wide(title);

        let hwnd = unsafe {
            wm::CreateWindowExW(
                wm::WS_EX_APPWINDOW | wm::WS_EX_TOPMOST,
                class_name.as_ptr(),
                title.as_ptr(),
                wm::WS_CLIPSIBLINGS | wm::WS_CLIPCHILDREN,
                x,
                y,
                width as i32,
                height as i32,
                0,
                0,
                GetModuleHandleW(ptr::null()),
                ptr::null(),
            )
        };

        NativeHandle::new(hwnd as usize)
    }

    fn last_error(&self) -> u32 {
        unsafe { GetLastError() }
    }

    fn get_dc(&self, hwnd: NativeHandle) -> NativeHandle {
        let hdc = unsafe { gdi::GetDC(as_hwnd(hwnd)) };
        NativeHandle::new(hdc as usize)
    }

    fn release_dc(&self, hwnd: NativeHandle, hdc: NativeHandle) {
        unsafe {
            gdi::ReleaseDC(as_hwnd(hwnd), hdc.raw() as HDC);
        }
    }

    fn destroy_window(&self, hwnd: NativeHandle) {
        unsafe {
            wm::DestroyWindow(as_hwnd(hwnd));
        }
    }

    fn show_window(&self, hwnd: NativeHandle, visible: bool) {
        let command = if visible { wm::SW_SHOWNOACTIVATE } else { wm::SW_HIDE };
        unsafe {
            wm::ShowWindow(as_hwnd(hwnd), command);
        }
    }

    fn window_instance(&self, hwnd: NativeHandle) -> NativeHandle {
        #[cfg(target_pointer_width = "64")]
        let instance = unsafe { wm::GetWindowLongPtrW(as_hwnd(hwnd), wm::GWLP_HINSTANCE) };
        #[cfg(target_pointer_width = "32")]
        let instance = unsafe { wm::GetWindowLongW(as_hwnd(hwnd), wm::GWLP_HINSTANCE) };

        NativeHandle::new(instance as usize)
    }
}
