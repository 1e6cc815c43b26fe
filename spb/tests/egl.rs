mod common;

use std::sync::Arc;

use common::{CallLog, StubEgl, StubXlib, EGL_BAD_ALLOC, EGL_DISPLAY, GL_CLEAR, X_DISPLAY};
use spb::api::egl::{self, EglContext, EglWindow};
use spb::api::x11::X11Helper;
use spb::attributes::AttributeList;
use spb::context::GlContext;
use spb::error::ErrorKind;
use spb::prelude::*;
use spb::{ContextAttributes, ContextFlags, ContextState, FramebufferFormat, NativeHandle, Window};

fn setup(configure: impl FnOnce(&mut StubEgl)) -> (Arc<CallLog>, X11Helper, Arc<StubEgl>) {
    let log = CallLog::new();
    let mut egl = StubEgl::new(&log);
    configure(&mut egl);

    let egl = Arc::new(egl);
    let helper = X11Helper::new(Arc::new(StubXlib::new(&log))).with_egl(egl.clone());
    (log, helper, egl)
}

fn egl_window(helper: &X11Helper, format: &FramebufferFormat) -> EglWindow {
    helper.create_egl_window(NativeHandle::NULL, format, 0, 0, 640, 480).unwrap()
}

fn context(egl: &Arc<StubEgl>, flags: ContextFlags) -> EglContext {
    let attributes = ContextAttributes::new(FramebufferFormat::DEFAULT, 3, 3).with_flags(flags);
    EglContext::new(egl.clone(), attributes, None).unwrap()
}

#[test]
fn window_display_is_the_egl_display() {
    let (log, helper, _egl) = setup(|_| {});
    let window = egl_window(&helper, &FramebufferFormat::DEFAULT);

    assert_eq!(window.native_display(), EGL_DISPLAY);
    assert!(log.contains(&format!("get_display {X_DISPLAY:x}")));
    assert!(log.contains(&format!("create_window {X_DISPLAY:x} {:x} 640x480", window.native_window())));
}

#[test]
fn surface_is_created_lazily_once() {
    let (log, helper, egl) = setup(|_| {});
    let window: Window = egl_window(&helper, &FramebufferFormat::DEFAULT).into();
    assert_eq!(log.count("create_window_surface"), 0);

    let mut context = context(&egl, ContextFlags::empty());
    context.initialize(Some(&window)).unwrap();
    assert_eq!(log.count("create_window_surface"), 0);

    context.make_current(Some(&window)).unwrap();
    window.swap_buffers().unwrap();
    window.swap_buffers().unwrap();

    assert_eq!(log.count("create_window_surface"), 1);
    assert_eq!(log.count("swap_buffers"), 2);
}

#[test]
fn context_end_to_end() {
    let (log, helper, egl) = setup(|_| {});
    let window: Window = egl_window(&helper, &FramebufferFormat::DEFAULT).into();

    let mut context = context(&egl, ContextFlags::DEBUG);
    context.initialize(Some(&window)).unwrap();
    assert_eq!(context.state(), ContextState::Initialized);
    assert_eq!(context.display_handle(), EGL_DISPLAY);

    context.make_current(Some(&window)).unwrap();
    assert_eq!(context.state(), ContextState::Current(window.native_window()));
    assert!(context.is_current());
    assert_eq!(context.get_proc_address(c"glClear") as usize, GL_CLEAR);

    context.make_current(Some(&window)).unwrap();
    assert_eq!(log.count("make_current"), 1);

    let raw = context.raw_handle();
    context.dispose().unwrap();
    context.dispose().unwrap();
    assert!(log.contains("make_current 0 0"));
    assert_eq!(log.count("destroy_context"), 1);
    assert!(log.contains(&format!("destroy_context {raw:x}")));
    assert!(!context.is_current());
}

#[test]
fn context_without_window_uses_default_display() {
    let (_log, _helper, egl) = setup(|_| {});
    let mut context = context(&egl, ContextFlags::empty());

    context.initialize(None).unwrap();

    assert_eq!(context.display_handle(), EGL_DISPLAY);
}

#[test]
fn failed_context_creation_reports_egl_error() {
    let (_log, _helper, egl) = setup(|egl| egl.fail_context = true);
    let mut context = context(&egl, ContextFlags::empty());

    let err = context.initialize(None).unwrap_err();

    assert_eq!(err.error_kind(), ErrorKind::ContextCreationFailed);
    assert_eq!(err.raw_code(), Some(EGL_BAD_ALLOC as i64));
    assert_eq!(context.state(), ContextState::Uninitialized);
    assert!(context.raw_handle().is_null());
}

#[test]
fn no_matching_config() {
    let (_log, helper, _egl) = setup(|egl| egl.no_config = true);

    let err = helper
        .create_egl_window(NativeHandle::NULL, &FramebufferFormat::DEFAULT, 0, 0, 64, 64)
        .unwrap_err();

    assert_eq!(err.error_kind(), ErrorKind::ConfigurationSelectionFailed);
}

#[test]
fn single_buffered_and_multisampled_config() {
    let (_log, helper, egl) = setup(|_| {});
    let format = FramebufferFormat::builder().with_buffers(1).with_samples(4).build();
    let _window = egl_window(&helper, &format);

    let raw = egl.config_attributes.lock().unwrap().clone();
    let attrs = AttributeList::from_raw(raw.as_slice(), egl::NONE);
    assert_eq!(attrs.get(egl::RENDER_BUFFER), Some(egl::SINGLE_BUFFER));
    assert_eq!(attrs.get(egl::SAMPLE_BUFFERS), Some(1));
    assert_eq!(attrs.get(egl::SAMPLES), Some(4));
    assert_eq!(raw.last(), Some(&egl::NONE));
}

#[test]
fn surface_is_destroyed_before_the_window() {
    let (log, helper, _egl) = setup(|_| {});
    let mut window = egl_window(&helper, &FramebufferFormat::DEFAULT);
    let surface = window.surface().unwrap();
    let native = window.native_window();

    window.dispose().unwrap();
    window.dispose().unwrap();

    let destroy_surface = log.position(&format!("destroy_surface {surface:x}")).unwrap();
    let destroy_window = log.position(&format!("destroy_window {native:x}")).unwrap();
    assert!(destroy_surface < destroy_window);
    assert_eq!(log.count("destroy_surface"), 1);
    assert_eq!(window.surface().unwrap_err().error_kind(), ErrorKind::UsageContractViolation);
}

#[test]
fn window_without_surface_destroys_only_the_window() {
    let (log, helper, _egl) = setup(|_| {});
    let window = egl_window(&helper, &FramebufferFormat::DEFAULT);

    drop(window);

    assert_eq!(log.count("destroy_surface"), 0);
    assert_eq!(log.count("destroy_window"), 1);
}

#[test]
fn swap_interval_is_recorded() {
    let (log, helper, egl) = setup(|_| {});
    let mut window: Window = egl_window(&helper, &FramebufferFormat::DEFAULT).into();
    let mut context = context(&egl, ContextFlags::empty());
    context.initialize(Some(&window)).unwrap();
    context.make_current(Some(&window)).unwrap();

    assert_eq!(window.swap_interval(), 1);
    window.set_swap_interval(0).unwrap();

    assert_eq!(window.swap_interval(), 0);
    assert!(log.contains("swap_interval 0"));
}

#[test]
fn swap_interval_needs_the_window_to_be_current() {
    let (log, helper, egl) = setup(|_| {});
    let mut window = egl_window(&helper, &FramebufferFormat::DEFAULT);

    let err = window.set_swap_interval(0).unwrap_err();
    assert_eq!(err.error_kind(), ErrorKind::UsageContractViolation);

    let other: Window = egl_window(&helper, &FramebufferFormat::DEFAULT).into();
    let mut context = context(&egl, ContextFlags::empty());
    context.initialize(Some(&other)).unwrap();
    context.make_current(Some(&other)).unwrap();

    let err = window.set_swap_interval(0).unwrap_err();
    assert_eq!(err.error_kind(), ErrorKind::UsageContractViolation);
    assert_eq!(window.swap_interval(), 1);
    assert_eq!(log.count("swap_interval"), 0);
}

#[test]
fn disposed_share_is_never_handed_to_the_driver() {
    let (log, _helper, egl) = setup(|_| {});
    let mut first = context(&egl, ContextFlags::empty());
    first.initialize(None).unwrap();
    let shared = first.raw_handle();

    let attributes = ContextAttributes::new(FramebufferFormat::DEFAULT, 3, 3);
    let mut second =
        EglContext::new(egl.clone(), attributes, Some(&first as &dyn GlContext)).unwrap();
    first.dispose().unwrap();

    let err = second.initialize(None).unwrap_err();

    assert_eq!(err.error_kind(), ErrorKind::UsageContractViolation);
    assert!(!log.contains(&format!("create_context {shared:x}")));
}
