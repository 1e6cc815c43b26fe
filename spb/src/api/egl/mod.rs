//! EGL backend on X11.
//!
//! The EGL display wraps the X display a window was created on, so the
//! display handle of an [`EglWindow`] is the `EGLDisplay`, not the X one.

use std::ffi::{c_void, CStr};

use crate::attributes::AttributeList;
use crate::context::{ContextAttributes, ContextFlags};
use crate::error::{Error, ErrorKind, Result};
use crate::format::FramebufferFormat;
use crate::handle::NativeHandle;

mod context;
mod window;

#[cfg(egl_backend)]
mod native;

pub use context::EglContext;
#[cfg(egl_backend)]
pub use native::NativeEgl;
pub use window::EglWindow;

/// Closes EGL attribute lists.
pub const NONE: i32 = 0x3038;
pub const SUCCESS: i32 = 0x3000;

pub const ALPHA_SIZE: i32 = 0x3021;
pub const BLUE_SIZE: i32 = 0x3022;
pub const GREEN_SIZE: i32 = 0x3023;
pub const RED_SIZE: i32 = 0x3024;
pub const DEPTH_SIZE: i32 = 0x3025;
pub const STENCIL_SIZE: i32 = 0x3026;
pub const CONFIG_CAVEAT: i32 = 0x3027;
pub const NATIVE_VISUAL_ID: i32 = 0x302E;
pub const SAMPLES: i32 = 0x3031;
pub const SAMPLE_BUFFERS: i32 = 0x3032;
pub const SURFACE_TYPE: i32 = 0x3033;
pub const COLOR_BUFFER_TYPE: i32 = 0x303F;
pub const RENDERABLE_TYPE: i32 = 0x3040;
pub const WINDOW_BIT: i32 = 0x0004;
pub const OPENGL_BIT: i32 = 0x0008;
pub const SINGLE_BUFFER: i32 = 0x3085;
pub const RENDER_BUFFER: i32 = 0x3086;
pub const RGB_BUFFER: i32 = 0x308E;

pub const GL_COLORSPACE: i32 = 0x309D;
pub const GL_COLORSPACE_LINEAR: i32 = 0x308A;

pub const CONTEXT_MAJOR_VERSION: i32 = 0x3098;
pub const CONTEXT_MINOR_VERSION: i32 = 0x30FB;
pub const CONTEXT_FLAGS_KHR: i32 = 0x30FC;
pub const CONTEXT_OPENGL_PROFILE_MASK: i32 = 0x30FD;
pub const CONTEXT_OPENGL_DEBUG_BIT_KHR: i32 = 0x0001;
pub const CONTEXT_OPENGL_FORWARD_COMPATIBLE_BIT_KHR: i32 = 0x0002;
pub const CONTEXT_OPENGL_CORE_PROFILE_BIT: i32 = 0x0001;
pub const CONTEXT_OPENGL_COMPATIBILITY_PROFILE_BIT: i32 = 0x0002;

pub const OPENGL_API: u32 = 0x30A2;

/// The EGL calls used by windows and contexts.
pub trait EglApi: Send + Sync {
    /// The initialized `EGLDisplay` of the default X display.
    fn default_display(&self) -> Result<NativeHandle>;

    /// `eglGetDisplay` for an X display, null on failure.
    fn get_display(&self, native_display: NativeHandle) -> NativeHandle;

    /// `eglInitialize`.
    fn initialize(&self, display: NativeHandle) -> bool;

    /// `eglBindAPI(EGL_OPENGL_API)` for the calling thread.
    fn bind_opengl_api(&self) -> bool;

    /// The first configuration matching the terminated `attributes`, null
    /// when nothing matches.
    fn choose_config(&self, display: NativeHandle, attributes: &[i32]) -> NativeHandle;

    fn get_config_attrib(
        &self,
        display: NativeHandle,
        config: NativeHandle,
        attribute: i32,
    ) -> Option<i32>;

    /// `eglCreateWindowSurface`, null on failure.
    fn create_window_surface(
        &self,
        display: NativeHandle,
        config: NativeHandle,
        native_window: NativeHandle,
        attributes: &[i32],
    ) -> NativeHandle;

    fn destroy_surface(&self, display: NativeHandle, surface: NativeHandle);

    /// `eglCreateContext`, null on failure.
    fn create_context(
        &self,
        display: NativeHandle,
        config: NativeHandle,
        share: NativeHandle,
        attributes: &[i32],
    ) -> NativeHandle;

    fn destroy_context(&self, display: NativeHandle, context: NativeHandle);

    fn make_current(
        &self,
        display: NativeHandle,
        draw: NativeHandle,
        read: NativeHandle,
        context: NativeHandle,
    ) -> bool;

    fn current_context(&self) -> NativeHandle;

    /// `eglGetCurrentSurface(EGL_DRAW)` for the calling thread.
    fn current_draw_surface(&self) -> NativeHandle;

    /// `eglGetError` for the calling thread.
    fn get_error(&self) -> i32;

    fn get_proc_address(&self, name: &CStr) -> *const c_void;

    fn swap_buffers(&self, display: NativeHandle, surface: NativeHandle) -> bool;

    /// `eglSwapInterval`, applies to the surface current on the calling thread.
    fn swap_interval(&self, display: NativeHandle, interval: i32) -> bool;
}

/// Translate `format` into an `eglChooseConfig` attribute list.
pub fn config_attributes(format: &FramebufferFormat) -> AttributeList<i32> {
    let mut attrs = AttributeList::new(NONE);

    // Slow configs are software rendering.
    attrs.push(CONFIG_CAVEAT, NONE);
    attrs.push(SURFACE_TYPE, WINDOW_BIT);
    attrs.push(RENDERABLE_TYPE, OPENGL_BIT);

    let color = format.color();
    if color.bits_per_pixel() > 0 {
        attrs.push(COLOR_BUFFER_TYPE, RGB_BUFFER);
        attrs.push(RED_SIZE, color.red as i32);
        attrs.push(GREEN_SIZE, color.green as i32);
        attrs.push(BLUE_SIZE, color.blue as i32);
        attrs.push(ALPHA_SIZE, color.alpha as i32);
    }

    attrs.push_if(format.depth_bits() > 0, DEPTH_SIZE, format.depth_bits() as i32);
    attrs.push_if(format.buffers() <= 1, RENDER_BUFFER, SINGLE_BUFFER);
    attrs.push_if(format.stencil_bits() > 0, STENCIL_SIZE, format.stencil_bits() as i32);

    if format.samples() > 0 {
        attrs.push(SAMPLE_BUFFERS, 1);
        attrs.push(SAMPLES, format.samples() as i32);
    }

    attrs
}

/// Translate the version and flags into an `eglCreateContext` attribute list.
pub fn context_attributes(attributes: &ContextAttributes) -> AttributeList<i32> {
    let mut attrs = AttributeList::new(NONE);
    let (major, minor) = attributes.version();

    attrs.push(CONTEXT_MAJOR_VERSION, major as i32);
    attrs.push(CONTEXT_MINOR_VERSION, minor as i32);

    let flags = attributes.flags();
    if !flags.is_empty() {
        let mut context_flags = 0;
        if flags.contains(ContextFlags::DEBUG) {
            context_flags |= CONTEXT_OPENGL_DEBUG_BIT_KHR;
        }
        if flags.contains(ContextFlags::FORWARD_COMPATIBLE) {
            context_flags |= CONTEXT_OPENGL_FORWARD_COMPATIBLE_BIT_KHR;
        }
        attrs.push_if(context_flags != 0, CONTEXT_FLAGS_KHR, context_flags);

        let profile = if flags.contains(ContextFlags::COMPAT) {
            CONTEXT_OPENGL_COMPATIBILITY_PROFILE_BIT
        } else {
            CONTEXT_OPENGL_CORE_PROFILE_BIT
        };
        attrs.push(CONTEXT_OPENGL_PROFILE_MASK, profile);
    }

    attrs
}

/// Attributes of every window surface.
pub fn surface_attributes() -> AttributeList<i32> {
    let mut attrs = AttributeList::new(NONE);
    attrs.push(GL_COLORSPACE, GL_COLORSPACE_LINEAR);
    attrs
}

/// Get and initialize the `EGLDisplay` of an X display.
pub fn initialize_display(egl: &dyn EglApi, x_display: NativeHandle) -> Result<NativeHandle> {
    let display = egl.get_display(x_display);
    if display.is_null() {
        return Err(Error::new(
            Some(egl.get_error() as i64),
            Some("eglGetDisplay() failed".into()),
            ErrorKind::InitializationFailed,
        ));
    }

    if !egl.initialize(display) {
        return Err(Error::new(
            Some(egl.get_error() as i64),
            Some("eglInitialize() failed".into()),
            ErrorKind::InitializationFailed,
        ));
    }

    Ok(display)
}

/// Pick the configuration for `format` on an initialized `display`.
pub fn select_config(
    egl: &dyn EglApi,
    display: NativeHandle,
    format: &FramebufferFormat,
) -> Result<NativeHandle> {
    let attrs = config_attributes(format).to_raw();

    let config = egl.choose_config(display, &attrs);
    if config.is_null() {
        return Err(Error::with_message(
            ErrorKind::ConfigurationSelectionFailed,
            "eglChooseConfig() found no matching configuration",
        ));
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::ColorFormat;

    #[test]
    fn default_format() {
        let attrs = config_attributes(&FramebufferFormat::DEFAULT);

        assert_eq!(attrs.get(CONFIG_CAVEAT), Some(NONE));
        assert_eq!(attrs.get(SURFACE_TYPE), Some(WINDOW_BIT));
        assert_eq!(attrs.get(RENDERABLE_TYPE), Some(OPENGL_BIT));
        assert_eq!(attrs.get(COLOR_BUFFER_TYPE), Some(RGB_BUFFER));
        assert_eq!(attrs.get(DEPTH_SIZE), Some(24));
        assert!(!attrs.contains(RENDER_BUFFER));
        assert!(!attrs.contains(SAMPLES));
        assert!(!attrs.contains(SAMPLE_BUFFERS));
        assert_eq!(attrs.to_raw().last(), Some(&NONE));
    }

    #[test]
    fn single_buffer_request() {
        let format = FramebufferFormat::builder().with_buffers(1).build();
        let attrs = config_attributes(&format);

        assert_eq!(attrs.get(RENDER_BUFFER), Some(SINGLE_BUFFER));
    }

    #[test]
    fn zero_color_skips_buffer_type() {
        let format = FramebufferFormat::builder().with_color(ColorFormat::ZERO).build();
        let attrs = config_attributes(&format);

        assert!(!attrs.contains(COLOR_BUFFER_TYPE));
        assert!(!attrs.contains(RED_SIZE));
    }

    #[test]
    fn samples() {
        let format = FramebufferFormat::builder().with_samples(8).with_stencil_bits(8).build();
        let attrs = config_attributes(&format);

        assert_eq!(attrs.get(SAMPLE_BUFFERS), Some(1));
        assert_eq!(attrs.get(SAMPLES), Some(8));
        assert_eq!(attrs.get(STENCIL_SIZE), Some(8));
    }

    #[test]
    fn core_debug_context() {
        let attributes = ContextAttributes::new(FramebufferFormat::DEFAULT, 4, 6)
            .with_flags(ContextFlags::DEBUG);
        let attrs = context_attributes(&attributes);

        assert_eq!(attrs.get(CONTEXT_MAJOR_VERSION), Some(4));
        assert_eq!(attrs.get(CONTEXT_MINOR_VERSION), Some(6));
        assert_eq!(attrs.get(CONTEXT_FLAGS_KHR), Some(CONTEXT_OPENGL_DEBUG_BIT_KHR));
        assert_eq!(attrs.get(CONTEXT_OPENGL_PROFILE_MASK), Some(CONTEXT_OPENGL_CORE_PROFILE_BIT));
    }

    #[test]
    fn surface_is_linear() {
        assert_eq!(surface_attributes().to_raw(), vec![GL_COLORSPACE, GL_COLORSPACE_LINEAR, NONE]);
    }
}
