//! Native windows with OpenGL contexts and Vulkan surfaces.
//!
//! The crate creates bare native windows (X11, Win32, AppKit) against a
//! [`FramebufferFormat`], OpenGL contexts for them through GLX, EGL or WGL,
//! and Vulkan surfaces through the platform surface extension. There is no
//! event loop: windows are passive handles meant to be rendered into.
//!
//! [`PlatformHelper`] picks the backend of the running platform:
//!
//! ```no_run
//! # fn main() -> spb::error::Result<()> {
//! use spb::prelude::*;
//! use spb::{ContextFlags, FramebufferFormat, PlatformHelper};
//!
//! let platform = PlatformHelper::new()?;
//! let format = FramebufferFormat::DEFAULT;
//!
//! let window = platform.create_opengl_window(&format, 0, 0, 800, 600)?;
//! let mut context =
//!     platform.create_opengl_context(format, 3, 3, ContextFlags::COMPAT, true, None)?;
//!
//! context.initialize(Some(&window))?;
//! context.make_current(Some(&window))?;
//! window.swap_buffers()?;
//! # Ok(())
//! # }
//! ```
//!
//! Every backend is reached through a trait of native calls (`GlxApi`,
//! `EglApi`, `WglApi`, ...), so the context and window logic can be driven
//! by other implementations than the system libraries.

#![deny(rust_2018_idioms)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(clippy::all)]
#![deny(missing_debug_implementations)]
#![cfg_attr(clippy, deny(warnings))]

pub mod api;
pub mod attributes;
pub mod context;
pub mod error;
pub mod format;
pub mod handle;
pub mod platform;
#[cfg(vulkan_backend)]
pub mod vulkan;
pub mod window;

#[cfg(any(egl_backend, glx_backend))]
mod lib_loading;

pub use context::{Context, ContextAttributes, ContextFlags, ContextState, GlBackend};
pub use format::{ColorFormat, FramebufferFormat};
pub use handle::NativeHandle;
pub use platform::{current_platform, Os, PlatformHelper};
pub use window::{PlainWindow, Window};

/// The traits needed to use windows and contexts.
pub mod prelude {
    pub use crate::context::GlContext as _;
    pub use crate::window::{NativeWindow as _, SwappableWindow as _};
}
