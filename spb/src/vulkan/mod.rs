//! Vulkan surface creation for the windows of this crate.
//!
//! The Vulkan loader is opened once per [`VulkanHelper`]. The first call
//! enumerates the instance extensions and settles on one platform surface
//! extension, and every later call reuses that choice. A failed
//! initialization is returned to every caller.

use std::ffi::{c_char, CStr, CString};
use std::fmt;
use std::mem;
use std::ptr;
use std::sync::Arc;

use ash::vk;
use once_cell::sync::OnceCell;

use crate::error::{Error, ErrorKind, Result};
use crate::handle::NativeHandle;
use crate::platform::Os;
use crate::window::{disposed_window, NativeWindow};

mod native;

pub use ash;
pub use native::{library_names, NativeVulkan};

/// What the helper needs from the running platform.
pub trait VulkanPlatform: Send + Sync {
    fn os(&self) -> Os;

    /// Open the Vulkan loader.
    fn load(&self) -> Result<VulkanLoader>;

    /// Whether Xlib-XCB can hand out the XCB connection of the display.
    fn is_xcb_available(&self) -> bool;

    /// The XCB connection behind an Xlib display.
    fn xcb_connection(&self, display: NativeHandle) -> NativeHandle;

    /// The `HINSTANCE` a Win32 window was created with.
    fn win32_instance(&self, hwnd: NativeHandle) -> NativeHandle;
}

/// The entry point of a Vulkan loader.
pub struct VulkanLoader {
    get_instance_proc_addr: vk::PFN_vkGetInstanceProcAddr,
    _entry: Option<ash::Entry>,
}

impl VulkanLoader {
    /// Wrap a bare `vkGetInstanceProcAddr`.
    ///
    /// # Safety
    ///
    /// The function must stay callable for the lifetime of the loader.
    pub unsafe fn from_proc_addr(get_instance_proc_addr: vk::PFN_vkGetInstanceProcAddr) -> Self {
        Self { get_instance_proc_addr, _entry: None }
    }

    /// Wrap a loaded entry, keeping its library open.
    pub fn from_entry(entry: ash::Entry) -> Self {
        let get_instance_proc_addr = entry.static_fn().get_instance_proc_addr;
        Self { get_instance_proc_addr, _entry: Some(entry) }
    }

    pub fn get_instance_proc_addr(
        &self,
        instance: vk::Instance,
        name: &CStr,
    ) -> vk::PFN_vkVoidFunction {
        unsafe { (self.get_instance_proc_addr)(instance, name.as_ptr()) }
    }

    /// Resolve `name` as a function of type `F`.
    ///
    /// # Safety
    ///
    /// `F` must be the function pointer type of `name`.
    unsafe fn resolve<F: Copy>(&self, instance: vk::Instance, name: &CStr) -> Option<F> {
        debug_assert_eq!(mem::size_of::<F>(), mem::size_of::<unsafe extern "system" fn()>());

        self.get_instance_proc_addr(instance, name)
            .map(|function| unsafe { mem::transmute_copy::<unsafe extern "system" fn(), F>(&function) })
    }

    fn enumerate_instance_extensions(&self) -> Result<Vec<CString>> {
        let enumerate = unsafe {
            self.resolve::<vk::PFN_vkEnumerateInstanceExtensionProperties>(
                vk::Instance::null(),
                c"vkEnumerateInstanceExtensionProperties",
            )
        }
        .ok_or_else(|| {
            Error::with_message(
                ErrorKind::InitializationFailed,
                "vkEnumerateInstanceExtensionProperties is missing",
            )
        })?;

        let failed = |res: vk::Result| {
            Error::new(
                Some(res.as_raw() as i64),
                Some(format!("vkEnumerateInstanceExtensionProperties failed: {res}")),
                ErrorKind::InitializationFailed,
            )
        };

        let mut count = 0;
        let res = unsafe { enumerate(ptr::null(), &mut count, ptr::null_mut()) };
        if res != vk::Result::SUCCESS {
            return Err(failed(res));
        }

        let mut properties = vec![vk::ExtensionProperties::default(); count as usize];
        let res = unsafe { enumerate(ptr::null(), &mut count, properties.as_mut_ptr()) };
        if res != vk::Result::SUCCESS && res != vk::Result::INCOMPLETE {
            return Err(failed(res));
        }
        properties.truncate(count as usize);

        Ok(properties
            .iter()
            .filter_map(|property| property.extension_name_as_c_str().ok())
            .map(CStr::to_owned)
            .collect())
    }
}

impl fmt::Debug for VulkanLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VulkanLoader").field("entry", &self._entry.is_some()).finish()
    }
}

/// The platform surface extension in use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SurfaceKind {
    Xcb,
    Xlib,
    Win32,
    Metal,
    /// The deprecated MoltenVK extension.
    MacOs,
}

impl SurfaceKind {
    pub fn extension_name(self) -> &'static CStr {
        match self {
            SurfaceKind::Xcb => ash::khr::xcb_surface::NAME,
            SurfaceKind::Xlib => ash::khr::xlib_surface::NAME,
            SurfaceKind::Win32 => ash::khr::win32_surface::NAME,
            SurfaceKind::Metal => ash::ext::metal_surface::NAME,
            SurfaceKind::MacOs => ash::mvk::macos_surface::NAME,
        }
    }
}

struct VulkanState {
    loader: VulkanLoader,
    extensions: Vec<CString>,
    surface_kind: SurfaceKind,
}

impl VulkanState {
    fn init(platform: &dyn VulkanPlatform) -> Result<Self> {
        let loader = platform.load()?;
        let extensions = loader.enumerate_instance_extensions()?;

        let has = |name: &CStr| extensions.iter().any(|extension| extension.as_c_str() == name);

        let surface_kind = if !has(ash::khr::surface::NAME) {
            None
        } else {
            match platform.os() {
                Os::Windows if has(SurfaceKind::Win32.extension_name()) => Some(SurfaceKind::Win32),
                // Xlib surfaces are known to have ICD issues.
                Os::Linux
                    if has(SurfaceKind::Xcb.extension_name()) && platform.is_xcb_available() =>
                {
                    Some(SurfaceKind::Xcb)
                },
                Os::Linux if has(SurfaceKind::Xlib.extension_name()) => Some(SurfaceKind::Xlib),
                Os::MacOs if has(SurfaceKind::Metal.extension_name()) => Some(SurfaceKind::Metal),
                Os::MacOs if has(SurfaceKind::MacOs.extension_name()) => Some(SurfaceKind::MacOs),
                _ => None,
            }
        };

        let surface_kind = surface_kind.ok_or_else(|| {
            Error::with_message(ErrorKind::UnsupportedPlatform, "No supported Vulkan surface found!")
        })?;

        log::debug!("using {:?} for Vulkan surfaces", surface_kind.extension_name());

        Ok(Self { loader, extensions, surface_kind })
    }
}

/// Negotiates Vulkan surfaces for native windows.
pub struct VulkanHelper {
    platform: Arc<dyn VulkanPlatform>,
    state: OnceCell<Result<VulkanState>>,
}

impl VulkanHelper {
    pub fn new(platform: Arc<dyn VulkanPlatform>) -> Self {
        Self { platform, state: OnceCell::new() }
    }

    /// The helper of the running platform, shared by the whole process.
    pub fn global() -> &'static VulkanHelper {
        native::global_helper()
    }

    fn state(&self) -> Result<&VulkanState> {
        self.state.get_or_init(|| VulkanState::init(self.platform.as_ref())).as_ref().map_err(
            Clone::clone,
        )
    }

    /// The surface extension windows get on this platform.
    pub fn surface_kind(&self) -> Result<SurfaceKind> {
        Ok(self.state()?.surface_kind)
    }

    /// Whether the loader reported the instance extension `name`.
    pub fn is_extension_present(&self, name: &CStr) -> Result<bool> {
        Ok(self.state()?.extensions.iter().any(|extension| extension.as_c_str() == name))
    }

    /// The extensions an instance needs to create surfaces with
    /// [`VulkanHelper::create_window_surface`]: `VK_KHR_surface` and one
    /// platform extension.
    pub fn required_instance_extensions(&self) -> Result<Vec<&'static CStr>> {
        let state = self.state()?;
        Ok(vec![ash::khr::surface::NAME, state.surface_kind.extension_name()])
    }

    /// Raw pointers of [`VulkanHelper::required_instance_extensions`], for
    /// `VkInstanceCreateInfo`.
    pub fn required_instance_extension_ptrs(&self) -> Result<Vec<*const c_char>> {
        Ok(self.required_instance_extensions()?.iter().map(|name| name.as_ptr()).collect())
    }

    /// `vkGetInstanceProcAddr` of the loader.
    pub fn get_instance_proc_addr(
        &self,
        instance: vk::Instance,
        name: &CStr,
    ) -> Result<vk::PFN_vkVoidFunction> {
        Ok(self.state()?.loader.get_instance_proc_addr(instance, name))
    }

    /// Create a surface for `window`.
    ///
    /// The surface belongs to the caller, who must destroy it before the
    /// instance and the window.
    pub fn create_window_surface(
        &self,
        instance: vk::Instance,
        window: &dyn NativeWindow,
    ) -> Result<vk::SurfaceKHR> {
        let state = self.state()?;
        if window.is_disposed() {
            return Err(disposed_window());
        }

        let loader = &state.loader;
        let mut surface = vk::SurfaceKHR::null();

        let (name, res) = unsafe {
            match state.surface_kind {
                SurfaceKind::Xcb => {
                    let name = c"vkCreateXcbSurfaceKHR";
                    let create = resolve::<vk::PFN_vkCreateXcbSurfaceKHR>(loader, instance, name)?;
                    let connection = self.platform.xcb_connection(x11_display(window)?);
                    let info = vk::XcbSurfaceCreateInfoKHR::default()
                        .connection(connection.as_ptr().cast())
                        .window(window.native_window().raw() as vk::xcb_window_t);
                    (name, create(instance, &info, ptr::null(), &mut surface))
                },
                SurfaceKind::Xlib => {
                    let name = c"vkCreateXlibSurfaceKHR";
                    let create = resolve::<vk::PFN_vkCreateXlibSurfaceKHR>(loader, instance, name)?;
                    let info = vk::XlibSurfaceCreateInfoKHR::default()
                        .dpy(x11_display(window)?.as_ptr().cast())
                        .window(window.native_window().raw() as vk::Window);
                    (name, create(instance, &info, ptr::null(), &mut surface))
                },
                SurfaceKind::Win32 => {
                    let name = c"vkCreateWin32SurfaceKHR";
                    let create = resolve::<vk::PFN_vkCreateWin32SurfaceKHR>(loader, instance, name)?;
                    let hwnd = window.native_window();
                    let info = vk::Win32SurfaceCreateInfoKHR::default()
                        .hinstance(self.platform.win32_instance(hwnd).raw() as vk::HINSTANCE)
                        .hwnd(hwnd.raw() as vk::HWND);
                    (name, create(instance, &info, ptr::null(), &mut surface))
                },
                SurfaceKind::Metal => {
                    let name = c"vkCreateMetalSurfaceEXT";
                    let create = resolve::<vk::PFN_vkCreateMetalSurfaceEXT>(loader, instance, name)?;
                    let layer = window.metal_layer()?;
                    let info = vk::MetalSurfaceCreateInfoEXT::default()
                        .layer(layer.as_ptr() as *const vk::CAMetalLayer);
                    (name, create(instance, &info, ptr::null(), &mut surface))
                },
                SurfaceKind::MacOs => {
                    let name = c"vkCreateMacOSSurfaceMVK";
                    let create = resolve::<vk::PFN_vkCreateMacOSSurfaceMVK>(loader, instance, name)?;
                    let layer = window.metal_layer()?;
                    let info = vk::MacOSSurfaceCreateInfoMVK::default().view(layer.as_ptr());
                    (name, create(instance, &info, ptr::null(), &mut surface))
                },
            }
        };

        if res != vk::Result::SUCCESS {
            return Err(Error::new(
                Some(res.as_raw() as i64),
                Some(format!("{} failed: {res}", name.to_string_lossy())),
                ErrorKind::SurfaceCreationFailed,
            ));
        }

        Ok(surface)
    }
}

/// The Xlib display of `window`, which must be an X11 window.
fn x11_display(window: &dyn NativeWindow) -> Result<NativeHandle> {
    window.x11_display().non_null().ok_or_else(|| {
        Error::with_message(
            ErrorKind::UsageContractViolation,
            "Xlib and XCB surfaces need an X11 window",
        )
    })
}

/// # Safety
///
/// `F` must be the function pointer type of `name`.
unsafe fn resolve<F: Copy>(loader: &VulkanLoader, instance: vk::Instance, name: &CStr) -> Result<F> {
    unsafe { loader.resolve(instance, name) }.ok_or_else(|| {
        Error::with_message(
            ErrorKind::SurfaceCreationFailed,
            format!("{} is not available", name.to_string_lossy()),
        )
    })
}

impl fmt::Debug for VulkanHelper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.get().map(|state| state.as_ref().map(|state| state.surface_kind));
        f.debug_struct("VulkanHelper").field("surface_kind", &state).finish_non_exhaustive()
    }
}
