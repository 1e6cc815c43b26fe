//! OpenGL context creation and lifecycle.
//!
//! Every backend walks the same state machine:
//!
//! ```text
//! Uninitialized -> Initialized -> Current(window) <-> NotCurrent -> Disposed
//! ```
//!
//! The current binding itself lives in the driver and is per thread, so
//! [`GlContext::is_current`] always asks the native API instead of trusting
//! [`GlContext::state`].

use std::ffi::{c_void, CStr};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use bitflags::bitflags;

use crate::api::egl::EglContext;
use crate::api::glx::GlxContext;
use crate::api::wgl::WglContext;
use crate::error::{Error, ErrorKind, Result};
use crate::format::FramebufferFormat;
use crate::handle::NativeHandle;
use crate::window::Window;

bitflags! {
    /// Options for the requested context.
    ///
    /// The empty set requests the driver defaults.
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ContextFlags: u32 {
        /// Request a debug context.
        const DEBUG = 0b0000_0001;
        /// Request the compatibility profile instead of the core one.
        const COMPAT = 0b0000_0010;
        /// Request a forward compatible context.
        const FORWARD_COMPATIBLE = 0b0000_0100;
    }
}

/// The native API a context or window belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GlBackend {
    Glx,
    Egl,
    Wgl,
}

impl fmt::Display for GlBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GlBackend::Glx => "GLX",
            GlBackend::Egl => "EGL",
            GlBackend::Wgl => "WGL",
        };
        f.write_str(name)
    }
}

/// Attributes fixed when a context is constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextAttributes {
    pub(crate) format: FramebufferFormat,
    pub(crate) major: u8,
    pub(crate) minor: u8,
    pub(crate) flags: ContextFlags,
    pub(crate) direct_rendering: bool,
}

impl ContextAttributes {
    /// Request an OpenGL `major.minor` context with default flags and direct
    /// rendering.
    pub fn new(format: FramebufferFormat, major: u8, minor: u8) -> Self {
        Self { format, major, minor, flags: ContextFlags::empty(), direct_rendering: true }
    }

    #[inline]
    pub fn with_flags(mut self, flags: ContextFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Prefer direct rendering. Only GLX honors it.
    #[inline]
    pub fn with_direct_rendering(mut self, direct_rendering: bool) -> Self {
        self.direct_rendering = direct_rendering;
        self
    }

    #[inline]
    pub fn format(&self) -> &FramebufferFormat {
        &self.format
    }

    #[inline]
    pub fn version(&self) -> (u8, u8) {
        (self.major, self.minor)
    }

    #[inline]
    pub fn flags(&self) -> ContextFlags {
        self.flags
    }

    #[inline]
    pub fn direct_rendering(&self) -> bool {
        self.direct_rendering
    }
}

/// Where a context is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContextState {
    Uninitialized,
    Initialized,
    /// Bound to the window with the given native handle.
    Current(NativeHandle),
    NotCurrent,
    Disposed,
}

/// Operations every OpenGL context provides.
///
/// Contexts aren't synchronized. Mutating one from several threads needs
/// external locking, like the native APIs it wraps.
pub trait GlContext {
    /// The backend this context was created with.
    fn backend(&self) -> GlBackend;

    fn attributes(&self) -> &ContextAttributes;

    /// The lifecycle state as recorded by this object.
    fn state(&self) -> ContextState;

    /// The native context handle, null before initialization.
    fn raw_handle(&self) -> NativeHandle;

    /// The display the context was initialized against, null before
    /// initialization.
    fn display_handle(&self) -> NativeHandle;

    /// A flag that drops to dead once this context is disposed.
    ///
    /// Contexts sharing objects with this one hold on to it.
    fn liveness(&self) -> Liveness;

    /// Select a configuration and create the native context.
    ///
    /// When `window` is given, its display is used, otherwise the platform
    /// default display.
    fn initialize(&mut self, window: Option<&Window>) -> Result<()>;

    /// Bind the context to `window` on the calling thread, or unbind it when
    /// `window` is `None`.
    fn make_current(&mut self, window: Option<&Window>) -> Result<()>;

    /// Whether the context is current on the calling thread.
    fn is_current(&self) -> bool;

    /// Resolve an OpenGL function.
    ///
    /// Returns null before initialization, after disposal, or when the
    /// driver doesn't know `name`.
    fn get_proc_address(&self, name: &CStr) -> *const c_void;

    /// Unbind and destroy the native context.
    ///
    /// Calling it again is a no-op.
    fn dispose(&mut self) -> Result<()>;
}

/// A context of any backend.
#[derive(Debug)]
pub enum Context {
    Glx(GlxContext),
    Egl(EglContext),
    Wgl(WglContext),
}

macro_rules! context_dispatch {
    ($what:expr => $ctx:ident => $body:expr) => {
        match $what {
            Context::Glx($ctx) => $body,
            Context::Egl($ctx) => $body,
            Context::Wgl($ctx) => $body,
        }
    };
}

impl GlContext for Context {
    fn backend(&self) -> GlBackend {
        context_dispatch!(self => ctx => ctx.backend())
    }

    fn attributes(&self) -> &ContextAttributes {
        context_dispatch!(self => ctx => ctx.attributes())
    }

    fn state(&self) -> ContextState {
        context_dispatch!(self => ctx => ctx.state())
    }

    fn raw_handle(&self) -> NativeHandle {
        context_dispatch!(self => ctx => ctx.raw_handle())
    }

    fn display_handle(&self) -> NativeHandle {
        context_dispatch!(self => ctx => ctx.display_handle())
    }

    fn liveness(&self) -> Liveness {
        context_dispatch!(self => ctx => ctx.liveness())
    }

    fn initialize(&mut self, window: Option<&Window>) -> Result<()> {
        context_dispatch!(self => ctx => ctx.initialize(window))
    }

    fn make_current(&mut self, window: Option<&Window>) -> Result<()> {
        context_dispatch!(self => ctx => ctx.make_current(window))
    }

    fn is_current(&self) -> bool {
        context_dispatch!(self => ctx => ctx.is_current())
    }

    fn get_proc_address(&self, name: &CStr) -> *const c_void {
        context_dispatch!(self => ctx => ctx.get_proc_address(name))
    }

    fn dispose(&mut self) -> Result<()> {
        context_dispatch!(self => ctx => ctx.dispose())
    }
}

impl From<GlxContext> for Context {
    fn from(context: GlxContext) -> Self {
        Self::Glx(context)
    }
}

impl From<EglContext> for Context {
    fn from(context: EglContext) -> Self {
        Self::Egl(context)
    }
}

impl From<WglContext> for Context {
    fn from(context: WglContext) -> Self {
        Self::Wgl(context)
    }
}

/// Whether the context that handed it out still exists.
#[derive(Debug, Clone)]
pub struct Liveness(Arc<AtomicBool>);

impl Liveness {
    fn new() -> Self {
        Self(Arc::new(AtomicBool::new(true)))
    }

    #[inline]
    pub fn is_alive(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    fn kill(&self) {
        self.0.store(false, Ordering::Release);
    }
}

/// The parts of a share context a new context keeps.
#[derive(Debug, Clone)]
pub(crate) struct SharedContext {
    display: NativeHandle,
    context: NativeHandle,
    liveness: Liveness,
}

/// Lifecycle bookkeeping shared by the backend contexts.
#[derive(Debug)]
pub(crate) struct ContextCore {
    backend: GlBackend,
    pub(crate) attributes: ContextAttributes,
    share: Option<SharedContext>,
    liveness: Liveness,
    state: ContextState,
    display: NativeHandle,
    raw: NativeHandle,
    window: Option<NativeHandle>,
}

impl ContextCore {
    /// Validate the share context before anything native happens.
    pub(crate) fn new(
        backend: GlBackend,
        attributes: ContextAttributes,
        share: Option<&dyn GlContext>,
    ) -> Result<Self> {
        let share = match share {
            Some(share) if share.backend() != backend => {
                return Err(Error::with_message(
                    ErrorKind::UsageContractViolation,
                    format!("shared context must be a {backend} context, got {}", share.backend()),
                ));
            },
            Some(share) if !matches!(
                share.state(),
                ContextState::Initialized | ContextState::Current(_) | ContextState::NotCurrent
            ) =>
            {
                return Err(Error::with_message(
                    ErrorKind::UsageContractViolation,
                    "shared context must be initialized and not disposed",
                ));
            },
            Some(share) => Some(SharedContext {
                display: share.display_handle(),
                context: share.raw_handle(),
                liveness: share.liveness(),
            }),
            None => None,
        };

        Ok(Self {
            backend,
            attributes,
            share,
            liveness: Liveness::new(),
            state: ContextState::Uninitialized,
            display: NativeHandle::NULL,
            raw: NativeHandle::NULL,
            window: None,
        })
    }

    #[inline]
    pub(crate) fn backend(&self) -> GlBackend {
        self.backend
    }

    #[inline]
    pub(crate) fn liveness(&self) -> Liveness {
        self.liveness.clone()
    }

    #[inline]
    pub(crate) fn state(&self) -> ContextState {
        self.state
    }

    #[inline]
    pub(crate) fn raw(&self) -> NativeHandle {
        self.raw
    }

    #[inline]
    pub(crate) fn display(&self) -> NativeHandle {
        self.display
    }

    /// Initialized and not yet disposed.
    pub(crate) fn is_live(&self) -> bool {
        matches!(
            self.state,
            ContextState::Initialized | ContextState::Current(_) | ContextState::NotCurrent
        )
    }

    pub(crate) fn ensure_uninitialized(&self) -> Result<()> {
        match self.state {
            ContextState::Uninitialized => Ok(()),
            ContextState::Disposed => Err(Error::with_message(
                ErrorKind::UsageContractViolation,
                "the context was disposed",
            )),
            _ => Err(Error::with_message(
                ErrorKind::UsageContractViolation,
                "the context is already initialized",
            )),
        }
    }

    pub(crate) fn ensure_live(&self) -> Result<()> {
        if self.is_live() {
            Ok(())
        } else {
            Err(Error::with_message(
                ErrorKind::UsageContractViolation,
                "the context is not initialized or was disposed",
            ))
        }
    }

    /// Fail when the share context was disposed after this one was built.
    pub(crate) fn ensure_share_alive(&self) -> Result<()> {
        match &self.share {
            Some(share) if !share.liveness.is_alive() => Err(Error::with_message(
                ErrorKind::UsageContractViolation,
                "shared context was disposed before this context was initialized",
            )),
            _ => Ok(()),
        }
    }

    /// The native handle of the share context, checked against `display`.
    pub(crate) fn share_for(&self, display: NativeHandle) -> Result<NativeHandle> {
        match &self.share {
            Some(share) if share.display != display => Err(Error::with_message(
                ErrorKind::UsageContractViolation,
                "shared context was created on another display",
            )),
            Some(share) => Ok(share.context),
            None => Ok(NativeHandle::NULL),
        }
    }

    /// The native handle of the share context, null without one.
    ///
    /// For backends whose contexts aren't tied to a display.
    pub(crate) fn share_raw(&self) -> NativeHandle {
        self.share.as_ref().map_or(NativeHandle::NULL, |share| share.context)
    }

    /// Whether the bound-window record already names `window`.
    pub(crate) fn is_bound_to(&self, window: NativeHandle) -> bool {
        self.window == Some(window)
    }

    pub(crate) fn set_initialized(&mut self, display: NativeHandle, raw: NativeHandle) {
        self.display = display;
        self.raw = raw;
        self.state = ContextState::Initialized;
    }

    pub(crate) fn set_bound(&mut self, window: Option<NativeHandle>) {
        self.window = window;
        self.state = match window {
            Some(window) => ContextState::Current(window),
            None => ContextState::NotCurrent,
        };
    }

    pub(crate) fn set_disposed(&mut self) {
        self.window = None;
        self.raw = NativeHandle::NULL;
        self.state = ContextState::Disposed;
        self.liveness.kill();
    }
}

/// Check that `window` belongs to `display`.
pub(crate) fn ensure_same_display(display: NativeHandle, window_display: NativeHandle) -> Result<()> {
    if display == window_display {
        Ok(())
    } else {
        Err(Error::with_message(
            ErrorKind::UsageContractViolation,
            "make_current() must be used with a window from the same display",
        ))
    }
}

/// The error for a window of another backend.
pub(crate) fn wrong_window(expected: GlBackend) -> Error {
    Error::with_message(
        ErrorKind::UsageContractViolation,
        format!("make_current() must be used with a {expected} window"),
    )
}
