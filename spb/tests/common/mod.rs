//! Recording implementations of the native call traits.
//!
//! Every stub writes the calls it receives to a shared [`CallLog`], so tests
//! can check the order across APIs, e.g. an EGL surface being destroyed
//! before its X11 window.

#![allow(dead_code)]

use std::collections::HashMap;
use std::ffi::{c_void, CStr};
use std::ptr;
use std::sync::atomic::{AtomicI32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use spb::api::cocoa::CocoaApi;
use spb::api::egl::{self, EglApi};
use spb::api::glx::GlxApi;
use spb::api::wgl::WglApi;
use spb::api::win32::Win32Api;
use spb::api::x11::{X11Visual, X11WindowRequest, XlibApi};
use spb::error::Result;
use spb::NativeHandle;

pub const X_DISPLAY: NativeHandle = NativeHandle::new(0x1000);
pub const EGL_DISPLAY: NativeHandle = NativeHandle::new(0x5000);
pub const EGL_BAD_ALLOC: i32 = 0x3003;
pub const WIN32_ERROR: u32 = 0x57;
pub const HINSTANCE: NativeHandle = NativeHandle::new(0x40_0000);

pub const NS_WINDOW: NativeHandle = NativeHandle::new(0xa000);
pub const CONTENT_VIEW: NativeHandle = NativeHandle::new(0xa100);
pub const PLAIN_LAYER: NativeHandle = NativeHandle::new(0xa200);

/// The address every stub hands out for `glClear`.
pub const GL_CLEAR: usize = 0xdead;

/// Calls made through the stubs, in order, as `"name arg arg"`.
#[derive(Debug)]
pub struct CallLog {
    calls: Mutex<Vec<String>>,
    next: AtomicUsize,
}

impl CallLog {
    pub fn new() -> Arc<Self> {
        Arc::new(Self { calls: Mutex::new(Vec::new()), next: AtomicUsize::new(0x100) })
    }

    pub fn record(&self, call: impl Into<String>) {
        self.calls.lock().unwrap().push(call.into());
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// How many calls were made to `name`.
    pub fn count(&self, name: &str) -> usize {
        self.calls().iter().filter(|call| call.split(' ').next() == Some(name)).count()
    }

    pub fn contains(&self, call: &str) -> bool {
        self.calls().iter().any(|recorded| recorded == call)
    }

    pub fn position(&self, call: &str) -> Option<usize> {
        self.calls().iter().position(|recorded| recorded == call)
    }

    pub fn clear(&self) {
        self.calls.lock().unwrap().clear();
    }

    /// A fresh non-null handle.
    pub fn handle(&self) -> NativeHandle {
        NativeHandle::new(self.next.fetch_add(0x10, Ordering::SeqCst))
    }
}

fn proc_address(name: &CStr) -> *const c_void {
    if name.to_bytes() == b"glClear" {
        GL_CLEAR as *const c_void
    } else {
        ptr::null()
    }
}

pub fn visual(visual_id: u64) -> X11Visual {
    X11Visual { visual: NativeHandle::new(0x20), visual_id, depth: 24, screen: 0 }
}

pub struct StubXlib {
    log: Arc<CallLog>,
    pub fail_create_window: bool,
    pub fail_create_colormap: bool,
}

impl StubXlib {
    pub fn new(log: &Arc<CallLog>) -> Self {
        Self { log: log.clone(), fail_create_window: false, fail_create_colormap: false }
    }
}

impl XlibApi for StubXlib {
    fn default_display(&self) -> Result<NativeHandle> {
        Ok(X_DISPLAY)
    }

    fn default_screen(&self, _display: NativeHandle) -> i32 {
        0
    }

    fn root_window(&self, _display: NativeHandle, _screen: i32) -> NativeHandle {
        NativeHandle::new(0x10)
    }

    fn visual_from_id(&self, _display: NativeHandle, visual_id: u64) -> Option<X11Visual> {
        Some(visual(visual_id))
    }

    fn default_visual(&self, _display: NativeHandle, screen: i32) -> Option<X11Visual> {
        Some(X11Visual { screen, ..visual(0x21) })
    }

    fn create_colormap(
        &self,
        _display: NativeHandle,
        _window: NativeHandle,
        _visual: &X11Visual,
    ) -> NativeHandle {
        self.log.record("create_colormap");

        if self.fail_create_colormap {
            NativeHandle::NULL
        } else {
            NativeHandle::new(0x30)
        }
    }

    fn free_colormap(&self, _display: NativeHandle, colormap: NativeHandle) {
        self.log.record(format!("free_colormap {colormap:x}"));
    }

    fn create_window(&self, display: NativeHandle, request: &X11WindowRequest) -> NativeHandle {
        if self.fail_create_window {
            return NativeHandle::NULL;
        }

        let window = self.log.handle();
        self.log.record(format!(
            "create_window {display:x} {window:x} {}x{}",
            request.width, request.height
        ));
        window
    }

    fn map_window(&self, _display: NativeHandle, window: NativeHandle) {
        self.log.record(format!("map_window {window:x}"));
    }

    fn unmap_window(&self, _display: NativeHandle, window: NativeHandle) {
        self.log.record(format!("unmap_window {window:x}"));
    }

    fn destroy_window(&self, _display: NativeHandle, window: NativeHandle) {
        self.log.record(format!("destroy_window {window:x}"));
    }

    fn flush(&self, _display: NativeHandle) {}
}

pub struct StubGlx {
    log: Arc<CallLog>,
    current: Mutex<NativeHandle>,
    pub no_config: bool,
    /// Fail context creation for this direct rendering value.
    pub fail_direct: Option<bool>,
    pub fb_attributes: Mutex<Vec<i32>>,
    pub context_attributes: Mutex<Vec<i32>>,
}

impl StubGlx {
    pub fn new(log: &Arc<CallLog>) -> Self {
        Self {
            log: log.clone(),
            current: Mutex::new(NativeHandle::NULL),
            no_config: false,
            fail_direct: None,
            fb_attributes: Mutex::default(),
            context_attributes: Mutex::default(),
        }
    }
}

impl GlxApi for StubGlx {
    fn default_display(&self) -> Result<NativeHandle> {
        Ok(X_DISPLAY)
    }

    fn default_screen(&self, _display: NativeHandle) -> i32 {
        0
    }

    fn choose_fb_config(
        &self,
        _display: NativeHandle,
        _screen: i32,
        attributes: &[i32],
    ) -> NativeHandle {
        self.log.record("choose_fb_config");
        *self.fb_attributes.lock().unwrap() = attributes.to_vec();

        if self.no_config {
            NativeHandle::NULL
        } else {
            NativeHandle::new(0x40)
        }
    }

    fn visual_from_fb_config(
        &self,
        _display: NativeHandle,
        _config: NativeHandle,
    ) -> Option<X11Visual> {
        Some(visual(0x21))
    }

    fn supports_create_context_attribs(&self) -> bool {
        true
    }

    fn create_context_attribs(
        &self,
        _display: NativeHandle,
        _config: NativeHandle,
        share: NativeHandle,
        direct: bool,
        attributes: &[i32],
    ) -> NativeHandle {
        self.log.record(format!("create_context {share:x} {direct}"));
        *self.context_attributes.lock().unwrap() = attributes.to_vec();

        if self.fail_direct == Some(direct) {
            NativeHandle::NULL
        } else {
            self.log.handle()
        }
    }

    fn make_current(
        &self,
        _display: NativeHandle,
        drawable: NativeHandle,
        context: NativeHandle,
    ) -> bool {
        self.log.record(format!("make_current {drawable:x} {context:x}"));
        *self.current.lock().unwrap() = context;
        true
    }

    fn current_context(&self) -> NativeHandle {
        *self.current.lock().unwrap()
    }

    fn destroy_context(&self, _display: NativeHandle, context: NativeHandle) {
        self.log.record(format!("destroy_context {context:x}"));
    }

    fn get_proc_address(&self, name: &CStr) -> *const c_void {
        proc_address(name)
    }

    fn swap_buffers(&self, _display: NativeHandle, drawable: NativeHandle) {
        self.log.record(format!("swap_buffers {drawable:x}"));
    }

    fn swap_interval(
        &self,
        _display: NativeHandle,
        _drawable: NativeHandle,
        interval: i32,
    ) -> Result<()> {
        self.log.record(format!("swap_interval {interval}"));
        Ok(())
    }
}

pub struct StubEgl {
    log: Arc<CallLog>,
    current: Mutex<NativeHandle>,
    current_surface: Mutex<NativeHandle>,
    pub no_config: bool,
    pub fail_context: bool,
    pub config_attributes: Mutex<Vec<i32>>,
}

impl StubEgl {
    pub fn new(log: &Arc<CallLog>) -> Self {
        Self {
            log: log.clone(),
            current: Mutex::new(NativeHandle::NULL),
            current_surface: Mutex::new(NativeHandle::NULL),
            no_config: false,
            fail_context: false,
            config_attributes: Mutex::default(),
        }
    }
}

impl EglApi for StubEgl {
    fn default_display(&self) -> Result<NativeHandle> {
        Ok(EGL_DISPLAY)
    }

    fn get_display(&self, native_display: NativeHandle) -> NativeHandle {
        self.log.record(format!("get_display {native_display:x}"));
        EGL_DISPLAY
    }

    fn initialize(&self, _display: NativeHandle) -> bool {
        true
    }

    fn bind_opengl_api(&self) -> bool {
        true
    }

    fn choose_config(&self, _display: NativeHandle, attributes: &[i32]) -> NativeHandle {
        self.log.record("choose_config");
        *self.config_attributes.lock().unwrap() = attributes.to_vec();

        if self.no_config {
            NativeHandle::NULL
        } else {
            NativeHandle::new(0x60)
        }
    }

    fn get_config_attrib(
        &self,
        _display: NativeHandle,
        _config: NativeHandle,
        attribute: i32,
    ) -> Option<i32> {
        (attribute == egl::NATIVE_VISUAL_ID).then_some(0x21)
    }

    fn create_window_surface(
        &self,
        _display: NativeHandle,
        _config: NativeHandle,
        native_window: NativeHandle,
        _attributes: &[i32],
    ) -> NativeHandle {
        let surface = self.log.handle();
        self.log.record(format!("create_window_surface {native_window:x} {surface:x}"));
        surface
    }

    fn destroy_surface(&self, _display: NativeHandle, surface: NativeHandle) {
        self.log.record(format!("destroy_surface {surface:x}"));
    }

    fn create_context(
        &self,
        _display: NativeHandle,
        _config: NativeHandle,
        share: NativeHandle,
        _attributes: &[i32],
    ) -> NativeHandle {
        self.log.record(format!("create_context {share:x}"));

        if self.fail_context {
            NativeHandle::NULL
        } else {
            self.log.handle()
        }
    }

    fn destroy_context(&self, _display: NativeHandle, context: NativeHandle) {
        self.log.record(format!("destroy_context {context:x}"));
    }

    fn make_current(
        &self,
        _display: NativeHandle,
        draw: NativeHandle,
        _read: NativeHandle,
        context: NativeHandle,
    ) -> bool {
        self.log.record(format!("make_current {draw:x} {context:x}"));
        *self.current.lock().unwrap() = context;
        *self.current_surface.lock().unwrap() = draw;
        true
    }

    fn current_context(&self) -> NativeHandle {
        *self.current.lock().unwrap()
    }

    fn current_draw_surface(&self) -> NativeHandle {
        *self.current_surface.lock().unwrap()
    }

    fn get_error(&self) -> i32 {
        EGL_BAD_ALLOC
    }

    fn get_proc_address(&self, name: &CStr) -> *const c_void {
        proc_address(name)
    }

    fn swap_buffers(&self, _display: NativeHandle, surface: NativeHandle) -> bool {
        self.log.record(format!("swap_buffers {surface:x}"));
        true
    }

    fn swap_interval(&self, _display: NativeHandle, interval: i32) -> bool {
        self.log.record(format!("swap_interval {interval}"));
        true
    }
}

pub struct StubWin32 {
    log: Arc<CallLog>,
}

impl StubWin32 {
    pub fn new(log: &Arc<CallLog>) -> Self {
        Self { log: log.clone() }
    }

    /// The device context the stub hands out for `hwnd`.
    pub fn dc_of(hwnd: NativeHandle) -> NativeHandle {
        NativeHandle::new(hwnd.raw() + 1)
    }
}

impl Win32Api for StubWin32 {
    fn register_class(&self, class_name: &str) -> Result<()> {
        self.log.record(format!("register_class {class_name}"));
        Ok(())
    }

    fn create_window(
        &self,
        _class_name: &str,
        _title: &str,
        _x: i32,
        _y: i32,
        width: u32,
        height: u32,
    ) -> NativeHandle {
        let hwnd = self.log.handle();
        self.log.record(format!("create_window {hwnd:x} {width}x{height}"));
        hwnd
    }

    fn last_error(&self) -> u32 {
        WIN32_ERROR
    }

    fn get_dc(&self, hwnd: NativeHandle) -> NativeHandle {
        Self::dc_of(hwnd)
    }

    fn release_dc(&self, _hwnd: NativeHandle, hdc: NativeHandle) {
        self.log.record(format!("release_dc {hdc:x}"));
    }

    fn destroy_window(&self, hwnd: NativeHandle) {
        self.log.record(format!("destroy_window {hwnd:x}"));
    }

    fn show_window(&self, hwnd: NativeHandle, visible: bool) {
        self.log.record(format!("show_window {hwnd:x} {visible}"));
    }

    fn window_instance(&self, _hwnd: NativeHandle) -> NativeHandle {
        HINSTANCE
    }
}

pub struct StubWgl {
    log: Arc<CallLog>,
    current: Mutex<NativeHandle>,
    formats: Mutex<HashMap<NativeHandle, i32>>,
    next_format: AtomicI32,
    pub fail_context: bool,
}

impl StubWgl {
    pub fn new(log: &Arc<CallLog>) -> Self {
        Self {
            log: log.clone(),
            current: Mutex::new(NativeHandle::NULL),
            formats: Mutex::default(),
            next_format: AtomicI32::new(7),
            fail_context: false,
        }
    }

    /// The pixel format the next choose call picks, `0` for none.
    pub fn set_next_format(&self, pixel_format: i32) {
        self.next_format.store(pixel_format, Ordering::SeqCst);
    }
}

impl WglApi for StubWgl {
    fn choose_pixel_format(&self, _hdc: NativeHandle, _attributes: &[i32]) -> Option<i32> {
        match self.next_format.load(Ordering::SeqCst) {
            0 => None,
            pixel_format => Some(pixel_format),
        }
    }

    fn pixel_format(&self, hdc: NativeHandle) -> i32 {
        self.formats.lock().unwrap().get(&hdc).copied().unwrap_or(0)
    }

    fn set_pixel_format(&self, hdc: NativeHandle, pixel_format: i32) -> bool {
        self.log.record(format!("set_pixel_format {hdc:x} {pixel_format}"));
        self.formats.lock().unwrap().insert(hdc, pixel_format);
        true
    }

    fn supports_create_context_attribs(&self) -> bool {
        true
    }

    fn create_context_attribs(
        &self,
        hdc: NativeHandle,
        share: NativeHandle,
        _attributes: &[i32],
    ) -> NativeHandle {
        self.log.record(format!("create_context {hdc:x} {share:x}"));

        if self.fail_context {
            NativeHandle::NULL
        } else {
            self.log.handle()
        }
    }

    fn make_current(&self, hdc: NativeHandle, context: NativeHandle) -> bool {
        self.log.record(format!("make_current {hdc:x} {context:x}"));
        *self.current.lock().unwrap() = context;
        true
    }

    fn current_context(&self) -> NativeHandle {
        *self.current.lock().unwrap()
    }

    fn delete_context(&self, context: NativeHandle) {
        self.log.record(format!("delete_context {context:x}"));
    }

    fn get_proc_address(&self, name: &CStr) -> *const c_void {
        proc_address(name)
    }

    fn swap_buffers(&self, hdc: NativeHandle) -> bool {
        self.log.record(format!("swap_buffers {hdc:x}"));
        true
    }

    fn swap_interval(&self, interval: i32) -> Result<()> {
        self.log.record(format!("swap_interval {interval}"));
        Ok(())
    }

    fn last_error(&self) -> u32 {
        WIN32_ERROR
    }
}

pub struct StubCocoa {
    log: Arc<CallLog>,
    layer: Mutex<NativeHandle>,
    metal_layers: Mutex<Vec<NativeHandle>>,
    pub metal_supported: bool,
}

impl StubCocoa {
    /// A window whose content view has a plain layer.
    pub fn new(log: &Arc<CallLog>) -> Self {
        Self {
            log: log.clone(),
            layer: Mutex::new(PLAIN_LAYER),
            metal_layers: Mutex::default(),
            metal_supported: true,
        }
    }

    /// Give the content view a Metal layer already, returning it.
    pub fn install_metal_layer(&self) -> NativeHandle {
        let layer = self.log.handle();
        self.metal_layers.lock().unwrap().push(layer);
        *self.layer.lock().unwrap() = layer;
        layer
    }
}

impl CocoaApi for StubCocoa {
    fn is_window(&self, object: NativeHandle) -> bool {
        object == NS_WINDOW
    }

    fn is_view(&self, object: NativeHandle) -> bool {
        object == CONTENT_VIEW
    }

    fn is_metal_layer(&self, object: NativeHandle) -> bool {
        self.metal_layers.lock().unwrap().contains(&object)
    }

    fn content_view(&self, _window: NativeHandle) -> NativeHandle {
        CONTENT_VIEW
    }

    fn layer(&self, _view: NativeHandle) -> NativeHandle {
        *self.layer.lock().unwrap()
    }

    fn new_metal_layer(&self) -> NativeHandle {
        self.log.record("new_metal_layer");

        if !self.metal_supported {
            return NativeHandle::NULL;
        }

        let layer = self.log.handle();
        self.metal_layers.lock().unwrap().push(layer);
        layer
    }

    fn set_layer(&self, view: NativeHandle, layer: NativeHandle) {
        self.log.record(format!("set_layer {view:x} {layer:x}"));
        *self.layer.lock().unwrap() = layer;
    }

    fn make_key_and_order_front(&self, window: NativeHandle) {
        self.log.record(format!("make_key_and_order_front {window:x}"));
    }

    fn order_out(&self, window: NativeHandle) {
        self.log.record(format!("order_out {window:x}"));
    }

    fn set_hidden(&self, view: NativeHandle, hidden: bool) {
        self.log.record(format!("set_hidden {view:x} {hidden}"));
    }
}
