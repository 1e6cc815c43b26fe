//! Opaque native handles.

use std::ffi::c_void;
use std::fmt;

/// A pointer-sized native value: a display connection, window, context,
/// surface or configuration.
///
/// The handle carries no ownership. Whoever holds it decides whether it must
/// be released.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NativeHandle(usize);

impl NativeHandle {
    /// The null handle.
    pub const NULL: Self = Self(0);

    /// Wrap a raw value.
    #[inline]
    pub const fn new(raw: usize) -> Self {
        Self(raw)
    }

    /// Wrap a raw pointer.
    #[inline]
    pub fn from_ptr<T>(ptr: *const T) -> Self {
        Self(ptr as usize)
    }

    /// The raw value.
    #[inline]
    pub const fn raw(self) -> usize {
        self.0
    }

    /// The raw value as a pointer.
    #[inline]
    pub fn as_ptr(self) -> *mut c_void {
        self.0 as *mut c_void
    }

    #[inline]
    pub const fn is_null(self) -> bool {
        self.0 == 0
    }

    /// `None` for the null handle.
    #[inline]
    pub fn non_null(self) -> Option<Self> {
        if self.is_null() {
            None
        } else {
            Some(self)
        }
    }
}

impl From<usize> for NativeHandle {
    fn from(raw: usize) -> Self {
        Self(raw)
    }
}

impl<T> From<*mut T> for NativeHandle {
    fn from(ptr: *mut T) -> Self {
        Self(ptr as usize)
    }
}

impl<T> From<*const T> for NativeHandle {
    fn from(ptr: *const T) -> Self {
        Self(ptr as usize)
    }
}

impl fmt::Debug for NativeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NativeHandle({:#x})", self.0)
    }
}

impl fmt::LowerHex for NativeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::LowerHex::fmt(&self.0, f)
    }
}
