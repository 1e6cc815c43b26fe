//! WGL backend.
//!
//! A window's pixel format can be set only once, so WGL windows get theirs at
//! creation and contexts check that they match instead of comparing displays.

use std::ffi::{c_void, CStr};

use crate::attributes::AttributeList;
use crate::context::{ContextAttributes, ContextFlags};
use crate::error::{Error, ErrorKind, Result};
use crate::format::FramebufferFormat;
use crate::handle::NativeHandle;

mod context;
mod window;

#[cfg(wgl_backend)]
mod native;

pub use context::WglContext;
#[cfg(wgl_backend)]
pub use native::NativeWgl;
pub use window::WglWindow;

/// Closes WGL attribute lists.
pub const NONE: i32 = 0;

pub const DRAW_TO_WINDOW_ARB: i32 = 0x2001;
pub const ACCELERATION_ARB: i32 = 0x2003;
pub const SUPPORT_OPENGL_ARB: i32 = 0x2010;
pub const DOUBLE_BUFFER_ARB: i32 = 0x2011;
pub const STEREO_ARB: i32 = 0x2012;
pub const PIXEL_TYPE_ARB: i32 = 0x2013;
pub const COLOR_BITS_ARB: i32 = 0x2014;
pub const RED_BITS_ARB: i32 = 0x2015;
pub const GREEN_BITS_ARB: i32 = 0x2017;
pub const BLUE_BITS_ARB: i32 = 0x2019;
pub const ALPHA_BITS_ARB: i32 = 0x201B;
pub const ACCUM_BITS_ARB: i32 = 0x201D;
pub const ACCUM_RED_BITS_ARB: i32 = 0x201E;
pub const ACCUM_GREEN_BITS_ARB: i32 = 0x201F;
pub const ACCUM_BLUE_BITS_ARB: i32 = 0x2020;
pub const ACCUM_ALPHA_BITS_ARB: i32 = 0x2021;
pub const DEPTH_BITS_ARB: i32 = 0x2022;
pub const STENCIL_BITS_ARB: i32 = 0x2023;
pub const FULL_ACCELERATION_ARB: i32 = 0x2027;
pub const TYPE_RGBA_ARB: i32 = 0x202B;
pub const SAMPLE_BUFFERS_ARB: i32 = 0x2041;
pub const SAMPLES_ARB: i32 = 0x2042;

pub const CONTEXT_MAJOR_VERSION_ARB: i32 = 0x2091;
pub const CONTEXT_MINOR_VERSION_ARB: i32 = 0x2092;
pub const CONTEXT_FLAGS_ARB: i32 = 0x2094;
pub const CONTEXT_PROFILE_MASK_ARB: i32 = 0x9126;
pub const CONTEXT_DEBUG_BIT_ARB: i32 = 0x0001;
pub const CONTEXT_FORWARD_COMPATIBLE_BIT_ARB: i32 = 0x0002;
pub const CONTEXT_CORE_PROFILE_BIT_ARB: i32 = 0x0001;
pub const CONTEXT_COMPATIBILITY_PROFILE_BIT_ARB: i32 = 0x0002;

/// The WGL and GDI calls used by windows and contexts.
///
/// Device contexts and `HGLRC`s are passed as [`NativeHandle`]s.
pub trait WglApi: Send + Sync {
    /// `wglChoosePixelFormatARB`, `None` when nothing matches.
    fn choose_pixel_format(&self, hdc: NativeHandle, attributes: &[i32]) -> Option<i32>;

    /// `GetPixelFormat`, `0` while none is set.
    fn pixel_format(&self, hdc: NativeHandle) -> i32;

    /// `DescribePixelFormat` and `SetPixelFormat`.
    fn set_pixel_format(&self, hdc: NativeHandle, pixel_format: i32) -> bool;

    /// Whether `wglCreateContextAttribsARB` is available.
    fn supports_create_context_attribs(&self) -> bool;

    /// `wglCreateContextAttribsARB`, null on failure.
    fn create_context_attribs(
        &self,
        hdc: NativeHandle,
        share: NativeHandle,
        attributes: &[i32],
    ) -> NativeHandle;

    /// `wglMakeCurrent`, a null device context and context unbind.
    fn make_current(&self, hdc: NativeHandle, context: NativeHandle) -> bool;

    fn current_context(&self) -> NativeHandle;

    fn delete_context(&self, context: NativeHandle);

    /// `wglGetProcAddress`, falling back to the `opengl32.dll` exports.
    fn get_proc_address(&self, name: &CStr) -> *const c_void;

    fn swap_buffers(&self, hdc: NativeHandle) -> bool;

    /// `wglSwapIntervalEXT` for the current context.
    fn swap_interval(&self, interval: i32) -> Result<()>;

    /// `GetLastError` of the calling thread.
    fn last_error(&self) -> u32;
}

/// Translate `format` into a `wglChoosePixelFormatARB` attribute list.
pub fn pixel_format_attributes(format: &FramebufferFormat) -> AttributeList<i32> {
    let mut attrs = AttributeList::new(NONE);

    attrs.push(DRAW_TO_WINDOW_ARB, 1);
    attrs.push(SUPPORT_OPENGL_ARB, 1);
    attrs.push(ACCELERATION_ARB, FULL_ACCELERATION_ARB);
    attrs.push(PIXEL_TYPE_ARB, TYPE_RGBA_ARB);

    let color = format.color();
    if color.bits_per_pixel() > 0 {
        attrs.push(COLOR_BITS_ARB, color.bits_per_pixel() as i32);
        attrs.push(RED_BITS_ARB, color.red as i32);
        attrs.push(GREEN_BITS_ARB, color.green as i32);
        attrs.push(BLUE_BITS_ARB, color.blue as i32);
        attrs.push(ALPHA_BITS_ARB, color.alpha as i32);
    }

    attrs.push_if(format.depth_bits() > 0, DEPTH_BITS_ARB, format.depth_bits() as i32);
    attrs.push_if(format.stencil_bits() > 0, STENCIL_BITS_ARB, format.stencil_bits() as i32);
    attrs.push_if(format.buffers() > 1, DOUBLE_BUFFER_ARB, 1);

    let accum = format.accumulator();
    if accum.bits_per_pixel() > 0 {
        attrs.push(ACCUM_BITS_ARB, accum.bits_per_pixel() as i32);
        attrs.push(ACCUM_RED_BITS_ARB, accum.red as i32);
        attrs.push(ACCUM_GREEN_BITS_ARB, accum.green as i32);
        attrs.push(ACCUM_BLUE_BITS_ARB, accum.blue as i32);
        attrs.push(ACCUM_ALPHA_BITS_ARB, accum.alpha as i32);
    }

    if format.samples() > 0 {
        attrs.push(SAMPLE_BUFFERS_ARB, 1);
        attrs.push(SAMPLES_ARB, format.samples() as i32);
    }

    attrs.push_if(format.stereo(), STEREO_ARB, 1);

    attrs
}

/// Translate the version and flags into a `wglCreateContextAttribsARB`
/// attribute list.
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

/// Pick the pixel format for `format` on `hdc`.
pub fn select_pixel_format(
    wgl: &dyn WglApi,
    hdc: NativeHandle,
    format: &FramebufferFormat,
) -> Result<i32> {
    let attrs = pixel_format_attributes(format).to_raw();

    wgl.choose_pixel_format(hdc, &attrs).ok_or_else(|| {
        Error::with_message(
            ErrorKind::ConfigurationSelectionFailed,
            "wglChoosePixelFormatARB() found no matching pixel format",
        )
    })
}

/// Set `pixel_format` on `hdc` unless it already has one, returning the
/// format in effect.
///
/// Failures are reported with `kind`.
pub fn apply_pixel_format(
    wgl: &dyn WglApi,
    hdc: NativeHandle,
    pixel_format: i32,
    kind: ErrorKind,
) -> Result<i32> {
    match wgl.pixel_format(hdc) {
        0 => {
            if !wgl.set_pixel_format(hdc, pixel_format) {
                return Err(Error::new(
                    Some(wgl.last_error() as i64),
                    Some("SetPixelFormat() failed".into()),
                    kind,
                ));
            }

            Ok(pixel_format)
        },
        current if current != pixel_format => {
            log::warn!(
                "the window already uses pixel format {current}, keeping it instead of \
                 {pixel_format}"
            );
            Ok(current)
        },
        current => Ok(current),
    }
}
