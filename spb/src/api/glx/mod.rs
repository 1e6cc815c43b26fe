//! GLX backend.

use std::ffi::{c_void, CStr};

use crate::api::x11::X11Visual;
use crate::attributes::AttributeList;
use crate::context::{ContextAttributes, ContextFlags};
use crate::error::{Error, ErrorKind, Result};
use crate::format::FramebufferFormat;
use crate::handle::NativeHandle;

mod context;
mod window;

#[cfg(glx_backend)]
mod native;

pub use context::GlxContext;
#[cfg(glx_backend)]
pub use native::NativeGlx;
pub use window::GlxWindow;

/// Closes GLX attribute lists.
pub const NONE: i32 = 0;

pub const DOUBLEBUFFER: i32 = 5;
pub const STEREO: i32 = 6;
pub const RED_SIZE: i32 = 8;
pub const GREEN_SIZE: i32 = 9;
pub const BLUE_SIZE: i32 = 10;
pub const ALPHA_SIZE: i32 = 11;
pub const DEPTH_SIZE: i32 = 12;
pub const STENCIL_SIZE: i32 = 13;
pub const ACCUM_RED_SIZE: i32 = 14;
pub const ACCUM_GREEN_SIZE: i32 = 15;
pub const ACCUM_BLUE_SIZE: i32 = 16;
pub const ACCUM_ALPHA_SIZE: i32 = 17;
pub const DRAWABLE_TYPE: i32 = 0x8010;
pub const RENDER_TYPE: i32 = 0x8011;
pub const X_RENDERABLE: i32 = 0x8012;
pub const WINDOW_BIT: i32 = 0x0001;
pub const RGBA_BIT: i32 = 0x0001;
pub const SAMPLE_BUFFERS: i32 = 100_000;
pub const SAMPLES: i32 = 100_001;

pub const CONTEXT_MAJOR_VERSION_ARB: i32 = 0x2091;
pub const CONTEXT_MINOR_VERSION_ARB: i32 = 0x2092;
pub const CONTEXT_FLAGS_ARB: i32 = 0x2094;
pub const CONTEXT_PROFILE_MASK_ARB: i32 = 0x9126;
pub const CONTEXT_DEBUG_BIT_ARB: i32 = 0x0001;
pub const CONTEXT_FORWARD_COMPATIBLE_BIT_ARB: i32 = 0x0002;
pub const CONTEXT_CORE_PROFILE_BIT_ARB: i32 = 0x0001;
pub const CONTEXT_COMPATIBILITY_PROFILE_BIT_ARB: i32 = 0x0002;

/// The GLX calls used by windows and contexts.
///
/// Handles are displays, `GLXFBConfig`s, drawables and `GLXContext`s as
/// returned by the implementation itself.
pub trait GlxApi: Send + Sync {
    /// The X display used when the caller doesn't pass one.
    fn default_display(&self) -> Result<NativeHandle>;

    fn default_screen(&self, display: NativeHandle) -> i32;

    /// The first configuration matching the terminated `attributes`, null
    /// when nothing matches.
    fn choose_fb_config(&self, display: NativeHandle, screen: i32, attributes: &[i32])
        -> NativeHandle;

    fn visual_from_fb_config(&self, display: NativeHandle, config: NativeHandle)
        -> Option<X11Visual>;

    /// Whether `glXCreateContextAttribsARB` is available.
    fn supports_create_context_attribs(&self) -> bool;

    /// `glXCreateContextAttribsARB`, null on failure.
    fn create_context_attribs(
        &self,
        display: NativeHandle,
        config: NativeHandle,
        share: NativeHandle,
        direct: bool,
        attributes: &[i32],
    ) -> NativeHandle;

    /// `glXMakeCurrent`, a null drawable and context unbind.
    fn make_current(&self, display: NativeHandle, drawable: NativeHandle, context: NativeHandle)
        -> bool;

    /// The context current on the calling thread.
    fn current_context(&self) -> NativeHandle;

    fn destroy_context(&self, display: NativeHandle, context: NativeHandle);

    fn get_proc_address(&self, name: &CStr) -> *const c_void;

    fn swap_buffers(&self, display: NativeHandle, drawable: NativeHandle);

    fn swap_interval(&self, display: NativeHandle, drawable: NativeHandle, interval: i32)
        -> Result<()>;
}

/// Translate `format` into a `glXChooseFBConfig` attribute list.
pub fn fb_config_attributes(format: &FramebufferFormat) -> AttributeList<i32> {
    let mut attrs = AttributeList::new(NONE);

    attrs.push(X_RENDERABLE, 1);
    attrs.push(DRAWABLE_TYPE, WINDOW_BIT);
    attrs.push(RENDER_TYPE, RGBA_BIT);

    let color = format.color();
    if color.bits_per_pixel() > 0 {
        attrs.push(RED_SIZE, color.red as i32);
        attrs.push(GREEN_SIZE, color.green as i32);
        attrs.push(BLUE_SIZE, color.blue as i32);
        attrs.push(ALPHA_SIZE, color.alpha as i32);
    }

    attrs.push_if(format.depth_bits() > 0, DEPTH_SIZE, format.depth_bits() as i32);
    attrs.push_if(format.buffers() > 1, DOUBLEBUFFER, 1);
    attrs.push_if(format.stencil_bits() > 0, STENCIL_SIZE, format.stencil_bits() as i32);

    let accum = format.accumulator();
    if accum.bits_per_pixel() > 0 {
        attrs.push(ACCUM_ALPHA_SIZE, accum.alpha as i32);
        attrs.push(ACCUM_BLUE_SIZE, accum.blue as i32);
        attrs.push(ACCUM_GREEN_SIZE, accum.green as i32);
        attrs.push(ACCUM_RED_SIZE, accum.red as i32);
    }

    if format.samples() > 0 {
        attrs.push(SAMPLE_BUFFERS, 1);
        attrs.push(SAMPLES, format.samples() as i32);
    }

    attrs.push_if(format.stereo(), STEREO, 1);

    attrs
}

/// Translate the version and flags into a `glXCreateContextAttribsARB`
/// attribute list.
///
/// The profile is only requested when some flag is set, so the default keeps
/// the driver's choice.
pub fn context_attributes(attributes: &ContextAttributes) -> AttributeList<i32> {
    let mut attrs = AttributeList::new(NONE);
    let (major, minor) = attributes.version();

    attrs.push(CONTEXT_MAJOR_VERSION_ARB, major as i32);
    attrs.push(CONTEXT_MINOR_VERSION_ARB, minor as i32);

    let flags = attributes.flags();
    if !flags.is_empty() {
        let mut context_flags = 0;
        if flags.contains(ContextFlags::DEBUG) {
            context_flags |= CONTEXT_DEBUG_BIT_ARB;
        }
        if flags.contains(ContextFlags::FORWARD_COMPATIBLE) {
            context_flags |= CONTEXT_FORWARD_COMPATIBLE_BIT_ARB;
        }
        attrs.push_if(context_flags != 0, CONTEXT_FLAGS_ARB, context_flags);

        let profile = if flags.contains(ContextFlags::COMPAT) {
            CONTEXT_COMPATIBILITY_PROFILE_BIT_ARB
        } else {
            CONTEXT_CORE_PROFILE_BIT_ARB
        };
        attrs.push(CONTEXT_PROFILE_MASK_ARB, profile);
    }

    attrs
}

/// Pick the configuration for `format` on the default screen of `display`.
pub fn select_fb_config(
    glx: &dyn GlxApi,
    display: NativeHandle,
    format: &FramebufferFormat,
) -> Result<NativeHandle> {
    let screen = glx.default_screen(display);
    let attrs = fb_config_attributes(format).to_raw();

    let config = glx.choose_fb_config(display, screen, &attrs);
    if config.is_null() {
        return Err(Error::with_message(
            ErrorKind::ConfigurationSelectionFailed,
            "glXChooseFBConfig() found no matching configuration",
        ));
    }

    Ok(config)
}
