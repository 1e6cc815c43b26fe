//! The Vulkan loader of the running platform.

use std::sync::Arc;

use once_cell::sync::Lazy;

use super::{VulkanHelper, VulkanLoader, VulkanPlatform};
use crate::error::{Error, ErrorKind, Result};
use crate::handle::NativeHandle;
use crate::platform::{current_platform, Os};

static HELPER: Lazy<VulkanHelper> = Lazy::new(|| VulkanHelper::new(Arc::new(NativeVulkan)));

pub(super) fn global_helper() -> &'static VulkanHelper {
    &HELPER
}

/// The loader libraries tried on `os`, in order.
///
/// MoltenVK is preferred on macOS, a generic loader is the last resort.
pub fn library_names(os: Os) -> &'static [&'static str] {
    match os {
        Os::Windows => &["vulkan-1.dll"],
        Os::Linux => &["libvulkan.so.1", "libvulkan.so"],
        Os::MacOs => &["libMoltenVK.dylib", "libvulkan.dylib", "libvulkan.1.dylib"],
        Os::Other => &[],
    }
}

/// [`VulkanPlatform`] of the operating system the crate was built for.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeVulkan;

impl VulkanPlatform for NativeVulkan {
    fn os(&self) -> Os {
        current_platform()
    }

    fn load(&self) -> Result<VulkanLoader> {
        for name in library_names(self.os()) {
            match unsafe { ash::Entry::load_from(name) } {
                Ok(entry) => {
                    log::debug!("loaded the Vulkan loader from {name}");
                    return Ok(VulkanLoader::from_entry(entry));
                },
                Err(err) => log::debug!("couldn't load {name}: {err}"),
            }
        }

        Err(Error::with_message(ErrorKind::UnsupportedPlatform, "Unsupported platform for Vulkan!"))
    }

    fn is_xcb_available(&self) -> bool {
        #[cfg(x11_platform)]
        {
            crate::api::x11::native_default_display()
                .map(|display| !crate::api::x11::xcb_connection(display).is_null())
                .unwrap_or(false)
        }

        #[cfg(not(x11_platform))]
        {
            false
        }
    }

    fn xcb_connection(&self, display: NativeHandle) -> NativeHandle {
        #[cfg(x11_platform)]
        {
            crate::api::x11::xcb_connection(display)
        }

        #[cfg(not(x11_platform))]
        {
            let _ = display;
            NativeHandle::NULL
        }
    }

    fn win32_instance(&self, hwnd: NativeHandle) -> NativeHandle {
        #[cfg(windows)]
        {
            crate::api::win32::Win32Helper::global().api().window_instance(hwnd)
        }

        #[cfg(not(windows))]
        {
            let _ = hwnd;
            NativeHandle::NULL
        }
    }
}
