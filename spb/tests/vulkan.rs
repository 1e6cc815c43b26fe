#![cfg(feature = "vulkan")]

mod common;

use std::cell::{Cell, RefCell};
use std::ffi::{c_char, CStr};
use std::mem;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use common::{CallLog, StubEgl, StubXlib, EGL_DISPLAY, X_DISPLAY};
use spb::api::x11::X11Helper;
use spb::error::{ErrorKind, Result};
use spb::vulkan::ash;
use spb::vulkan::ash::vk::{self, Handle};
use spb::vulkan::{SurfaceKind, VulkanHelper, VulkanLoader, VulkanPlatform};
use spb::window::NativeWindow;
use spb::{NativeHandle, Os};

const XCB_CONNECTION: NativeHandle = NativeHandle::new(0xc0ffee);
const HINSTANCE: NativeHandle = NativeHandle::new(0x40_0000);
const SURFACE: u64 = 0xabc;

thread_local! {
    static EXTENSIONS: RefCell<Vec<&'static CStr>> = const { RefCell::new(Vec::new()) };
    static CREATE_RESULT: Cell<vk::Result> = const { Cell::new(vk::Result::SUCCESS) };
    static CREATED: RefCell<Vec<String>> = const { RefCell::new(Vec::new()) };
}

fn created() -> Vec<String> {
    CREATED.with(|created| created.borrow().clone())
}

unsafe extern "system" fn get_instance_proc_addr(
    _instance: vk::Instance,
    name: *const c_char,
) -> vk::PFN_vkVoidFunction {
    let name = unsafe { CStr::from_ptr(name) };

    let function: unsafe extern "system" fn() = unsafe {
        match name.to_bytes() {
            b"vkEnumerateInstanceExtensionProperties" => mem::transmute::<
                vk::PFN_vkEnumerateInstanceExtensionProperties,
                _,
            >(enumerate_instance_extension_properties),
            b"vkCreateXcbSurfaceKHR" => {
                mem::transmute::<vk::PFN_vkCreateXcbSurfaceKHR, _>(create_xcb_surface)
            },
            b"vkCreateXlibSurfaceKHR" => {
                mem::transmute::<vk::PFN_vkCreateXlibSurfaceKHR, _>(create_xlib_surface)
            },
            b"vkCreateWin32SurfaceKHR" => {
                mem::transmute::<vk::PFN_vkCreateWin32SurfaceKHR, _>(create_win32_surface)
            },
            b"vkCreateMetalSurfaceEXT" => {
                mem::transmute::<vk::PFN_vkCreateMetalSurfaceEXT, _>(create_metal_surface)
            },
            _ => return None,
        }
    };

    Some(function)
}

unsafe extern "system" fn enumerate_instance_extension_properties(
    _layer_name: *const c_char,
    count: *mut u32,
    properties: *mut vk::ExtensionProperties,
) -> vk::Result {
    EXTENSIONS.with(|extensions| {
        let extensions = extensions.borrow();
        let count = unsafe { &mut *count };

        if properties.is_null() {
            *count = extensions.len() as u32;
            return vk::Result::SUCCESS;
        }

        let written = (*count as usize).min(extensions.len());
        for (i, name) in extensions.iter().take(written).enumerate() {
            let mut property = vk::ExtensionProperties::default();
            for (dst, src) in property.extension_name.iter_mut().zip(name.to_bytes()) {
                *dst = *src as c_char;
            }
            unsafe { properties.add(i).write(property) };
        }
        *count = written as u32;

        if written < extensions.len() {
            vk::Result::INCOMPLETE
        } else {
            vk::Result::SUCCESS
        }
    })
}

unsafe fn finish(call: String, surface: *mut vk::SurfaceKHR) -> vk::Result {
    CREATED.with(|created| created.borrow_mut().push(call));

    let res = CREATE_RESULT.with(Cell::get);
    if res == vk::Result::SUCCESS {
        unsafe { surface.write(vk::SurfaceKHR::from_raw(SURFACE)) };
    }
    res
}

unsafe extern "system" fn create_xcb_surface(
    _instance: vk::Instance,
    info: *const vk::XcbSurfaceCreateInfoKHR<'_>,
    _allocator: *const vk::AllocationCallbacks<'_>,
    surface: *mut vk::SurfaceKHR,
) -> vk::Result {
    let info = unsafe { &*info };
    unsafe { finish(format!("xcb {:x} {:x}", info.connection as usize, info.window), surface) }
}

unsafe extern "system" fn create_xlib_surface(
    _instance: vk::Instance,
    info: *const vk::XlibSurfaceCreateInfoKHR<'_>,
    _allocator: *const vk::AllocationCallbacks<'_>,
    surface: *mut vk::SurfaceKHR,
) -> vk::Result {
    let info = unsafe { &*info };
    unsafe { finish(format!("xlib {:x} {:x}", info.dpy as usize, info.window), surface) }
}

unsafe extern "system" fn create_win32_surface(
    _instance: vk::Instance,
    info: *const vk::Win32SurfaceCreateInfoKHR<'_>,
    _allocator: *const vk::AllocationCallbacks<'_>,
    surface: *mut vk::SurfaceKHR,
) -> vk::Result {
    let info = unsafe { &*info };
    unsafe { finish(format!("win32 {:x} {:x}", info.hinstance, info.hwnd), surface) }
}

unsafe extern "system" fn create_metal_surface(
    _instance: vk::Instance,
    info: *const vk::MetalSurfaceCreateInfoEXT<'_>,
    _allocator: *const vk::AllocationCallbacks<'_>,
    surface: *mut vk::SurfaceKHR,
) -> vk::Result {
    let info = unsafe { &*info };
    unsafe { finish(format!("metal {:x}", info.p_layer as usize), surface) }
}

struct StubPlatform {
    os: Os,
    xcb: bool,
    loads: AtomicUsize,
}

impl VulkanPlatform for StubPlatform {
    fn os(&self) -> Os {
        self.os
    }

    fn load(&self) -> Result<VulkanLoader> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        Ok(unsafe { VulkanLoader::from_proc_addr(get_instance_proc_addr) })
    }

    fn is_xcb_available(&self) -> bool {
        self.xcb
    }

    fn xcb_connection(&self, _display: NativeHandle) -> NativeHandle {
        XCB_CONNECTION
    }

    fn win32_instance(&self, _hwnd: NativeHandle) -> NativeHandle {
        HINSTANCE
    }
}

fn setup(os: Os, xcb: bool, extensions: &[&'static CStr]) -> (Arc<StubPlatform>, VulkanHelper) {
    EXTENSIONS.with(|list| *list.borrow_mut() = extensions.to_vec());
    CREATED.with(|created| created.borrow_mut().clear());
    CREATE_RESULT.with(|res| res.set(vk::Result::SUCCESS));

    let platform = Arc::new(StubPlatform { os, xcb, loads: AtomicUsize::new(0) });
    let helper = VulkanHelper::new(platform.clone());
    (platform, helper)
}

struct FakeWindow {
    display: NativeHandle,
    window: NativeHandle,
    layer: Option<NativeHandle>,
    disposed: bool,
}

impl FakeWindow {
    fn new() -> Self {
        Self {
            display: NativeHandle::new(0x1000),
            window: NativeHandle::new(0x42),
            layer: None,
            disposed: false,
        }
    }
}

impl NativeWindow for FakeWindow {
    fn native_display(&self) -> NativeHandle {
        self.display
    }

    fn native_window(&self) -> NativeHandle {
        self.window
    }

    fn show(&mut self) -> Result<()> {
        Ok(())
    }

    fn hide(&mut self) -> Result<()> {
        Ok(())
    }

    fn is_disposed(&self) -> bool {
        self.disposed
    }

    fn dispose(&mut self) -> Result<()> {
        self.disposed = true;
        Ok(())
    }

    fn x11_display(&self) -> NativeHandle {
        self.display
    }

    fn metal_layer(&self) -> Result<NativeHandle> {
        self.layer.ok_or_else(|| ErrorKind::NotSupported("no layer").into())
    }
}

const SURFACE_EXT: &CStr = ash::khr::surface::NAME;
const XCB_EXT: &CStr = ash::khr::xcb_surface::NAME;
const XLIB_EXT: &CStr = ash::khr::xlib_surface::NAME;
const WIN32_EXT: &CStr = ash::khr::win32_surface::NAME;
const METAL_EXT: &CStr = ash::ext::metal_surface::NAME;
const MVK_EXT: &CStr = ash::mvk::macos_surface::NAME;

#[test]
fn xcb_is_preferred_when_available() {
    let (_platform, helper) = setup(Os::Linux, true, &[SURFACE_EXT, XLIB_EXT, XCB_EXT]);

    assert_eq!(helper.surface_kind().unwrap(), SurfaceKind::Xcb);
    assert_eq!(helper.required_instance_extensions().unwrap(), vec![SURFACE_EXT, XCB_EXT]);
    assert_eq!(helper.required_instance_extension_ptrs().unwrap().len(), 2);
}

#[test]
fn xlib_when_xcb_is_unavailable() {
    let (_platform, helper) = setup(Os::Linux, false, &[SURFACE_EXT, XLIB_EXT, XCB_EXT]);

    assert_eq!(helper.surface_kind().unwrap(), SurfaceKind::Xlib);
}

#[test]
fn xlib_when_xcb_extension_is_missing() {
    let (_platform, helper) = setup(Os::Linux, true, &[SURFACE_EXT, XLIB_EXT]);

    assert_eq!(helper.surface_kind().unwrap(), SurfaceKind::Xlib);
    assert!(helper.is_extension_present(XLIB_EXT).unwrap());
    assert!(!helper.is_extension_present(XCB_EXT).unwrap());
}

#[test]
fn platform_extensions_per_os() {
    let (_platform, helper) = setup(Os::Windows, false, &[SURFACE_EXT, WIN32_EXT, XLIB_EXT]);
    assert_eq!(helper.surface_kind().unwrap(), SurfaceKind::Win32);

    let (_platform, helper) = setup(Os::MacOs, false, &[SURFACE_EXT, MVK_EXT, METAL_EXT]);
    assert_eq!(helper.surface_kind().unwrap(), SurfaceKind::Metal);

    let (_platform, helper) = setup(Os::MacOs, false, &[SURFACE_EXT, MVK_EXT]);
    assert_eq!(helper.surface_kind().unwrap(), SurfaceKind::MacOs);
}

#[test]
fn missing_surface_extension_fails_for_good() {
    let (platform, helper) = setup(Os::Linux, true, &[XCB_EXT, XLIB_EXT]);

    let err = helper.surface_kind().unwrap_err();
    assert_eq!(err.error_kind(), ErrorKind::UnsupportedPlatform);
    assert_eq!(err.raw_os_message(), Some("No supported Vulkan surface found!"));

    let err = helper.required_instance_extensions().unwrap_err();
    assert_eq!(err.error_kind(), ErrorKind::UnsupportedPlatform);
    assert_eq!(platform.loads.load(Ordering::SeqCst), 1);
}

#[test]
fn unknown_os_is_unsupported() {
    let (_platform, helper) = setup(Os::Other, true, &[SURFACE_EXT, XCB_EXT, WIN32_EXT]);

    assert_eq!(helper.surface_kind().unwrap_err().error_kind(), ErrorKind::UnsupportedPlatform);
}

#[test]
fn every_enumerated_extension_is_visible() {
    let many: Vec<&'static CStr> = vec![SURFACE_EXT, XCB_EXT, XLIB_EXT, WIN32_EXT, METAL_EXT];
    let (_platform, helper) = setup(Os::Linux, true, &many);

    assert!(helper.is_extension_present(METAL_EXT).unwrap());
}

#[test]
fn xcb_surface() {
    let (_platform, helper) = setup(Os::Linux, true, &[SURFACE_EXT, XCB_EXT]);

    let surface = helper.create_window_surface(vk::Instance::null(), &FakeWindow::new()).unwrap();

    assert_eq!(surface.as_raw(), SURFACE);
    assert_eq!(created(), vec!["xcb c0ffee 42".to_owned()]);
}

#[test]
fn xlib_surface() {
    let (_platform, helper) = setup(Os::Linux, false, &[SURFACE_EXT, XLIB_EXT]);

    helper.create_window_surface(vk::Instance::null(), &FakeWindow::new()).unwrap();

    assert_eq!(created(), vec!["xlib 1000 42".to_owned()]);
}

#[test]
fn egl_window_surface_uses_the_x_display() {
    let (_platform, helper) = setup(Os::Linux, false, &[SURFACE_EXT, XLIB_EXT]);
    let log = CallLog::new();
    let window = X11Helper::new(Arc::new(StubXlib::new(&log)))
        .with_egl(Arc::new(StubEgl::new(&log)))
        .create_egl_window(NativeHandle::NULL, &spb::FramebufferFormat::DEFAULT, 0, 0, 64, 64)
        .unwrap();
    assert_eq!(window.native_display(), EGL_DISPLAY);

    helper.create_window_surface(vk::Instance::null(), &window).unwrap();

    assert_eq!(
        created(),
        vec![format!("xlib {:x} {:x}", X_DISPLAY.raw(), window.native_window().raw())]
    );
}

#[test]
fn x11_surface_needs_an_x11_window() {
    let (_platform, helper) = setup(Os::Linux, true, &[SURFACE_EXT, XCB_EXT]);
    let mut window = FakeWindow::new();
    window.display = NativeHandle::NULL;

    let err = helper.create_window_surface(vk::Instance::null(), &window).unwrap_err();

    assert_eq!(err.error_kind(), ErrorKind::UsageContractViolation);
    assert!(created().is_empty());
}

#[test]
fn win32_surface() {
    let (_platform, helper) = setup(Os::Windows, false, &[SURFACE_EXT, WIN32_EXT]);

    helper.create_window_surface(vk::Instance::null(), &FakeWindow::new()).unwrap();

    assert_eq!(created(), vec!["win32 400000 42".to_owned()]);
}

#[test]
fn metal_surface_uses_the_window_layer() {
    let (_platform, helper) = setup(Os::MacOs, false, &[SURFACE_EXT, METAL_EXT]);
    let mut window = FakeWindow::new();

    let err = helper.create_window_surface(vk::Instance::null(), &window).unwrap_err();
    assert!(err.not_supported());

    window.layer = Some(NativeHandle::new(0xb000));
    helper.create_window_surface(vk::Instance::null(), &window).unwrap();
    assert_eq!(created(), vec!["metal b000".to_owned()]);
}

#[test]
fn missing_entry_point_fails_surface_creation() {
    let (_platform, helper) = setup(Os::MacOs, false, &[SURFACE_EXT, MVK_EXT]);
    let mut window = FakeWindow::new();
    window.layer = Some(NativeHandle::new(0xb000));

    let err = helper.create_window_surface(vk::Instance::null(), &window).unwrap_err();

    assert_eq!(err.error_kind(), ErrorKind::SurfaceCreationFailed);
    assert!(created().is_empty());
}

#[test]
fn failed_creation_carries_the_vulkan_result() {
    let (_platform, helper) = setup(Os::Linux, true, &[SURFACE_EXT, XCB_EXT]);
    CREATE_RESULT.with(|res| res.set(vk::Result::ERROR_OUT_OF_HOST_MEMORY));

    let err = helper.create_window_surface(vk::Instance::null(), &FakeWindow::new()).unwrap_err();

    assert_eq!(err.error_kind(), ErrorKind::SurfaceCreationFailed);
    assert_eq!(err.raw_code(), Some(vk::Result::ERROR_OUT_OF_HOST_MEMORY.as_raw() as i64));
}

#[test]
fn disposed_window_is_rejected() {
    let (_platform, helper) = setup(Os::Linux, true, &[SURFACE_EXT, XCB_EXT]);
    let mut window = FakeWindow::new();
    window.dispose().unwrap();

    let err = helper.create_window_surface(vk::Instance::null(), &window).unwrap_err();

    assert_eq!(err.error_kind(), ErrorKind::UsageContractViolation);
    assert!(created().is_empty());
}

#[test]
fn instance_functions_resolve_through_the_loader() {
    let (_platform, helper) = setup(Os::Linux, true, &[SURFACE_EXT, XCB_EXT]);

    let function = helper
        .get_instance_proc_addr(vk::Instance::null(), c"vkCreateXcbSurfaceKHR")
        .unwrap();
    assert!(function.is_some());

    let function = helper.get_instance_proc_addr(vk::Instance::null(), c"vkNotAFunction").unwrap();
    assert!(function.is_none());
}
