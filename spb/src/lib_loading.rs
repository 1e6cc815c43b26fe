//! Loading of the system GL libraries.

use std::ffi::{c_void, CString};
use std::ops::Deref;
use std::ptr;
use std::sync::Arc;

use libloading::Library;

use crate::error::{Error, ErrorKind, Result};

/// A symbol table that can be filled from an opened library.
pub trait SymLoading {
    /// # Safety
    /// The library must outlive the returned table.
    unsafe fn load_with(lib: &Library) -> Self;
}

/// A symbol table kept together with the library it points into.
#[derive(Clone)]
pub struct SymWrapper<T> {
    sym: T,
    _lib: Arc<Library>,
}

impl<T: SymLoading> SymWrapper<T> {
    /// Open the first loadable library of `lib_paths`.
    ///
    /// # Safety
    /// Loading a library runs its initializers.
    pub unsafe fn new(lib_paths: &[&str]) -> Result<Self> {
        for path in lib_paths {
            if let Ok(lib) = unsafe { Library::new(path) } {
                let sym = unsafe { T::load_with(&lib) };
                return Ok(SymWrapper { sym, _lib: Arc::new(lib) });
            }
        }

        Err(Error::with_message(
            ErrorKind::InitializationFailed,
            format!("none of {lib_paths:?} could be loaded"),
        ))
    }
}

impl<T> Deref for SymWrapper<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.sym
    }
}

/// Look `name` up in `lib`, null when it's missing.
///
/// # Safety
/// The returned pointer is only valid while `lib` is loaded.
pub unsafe fn lookup(lib: &Library, name: &str) -> *const c_void {
    let Ok(name) = CString::new(name) else {
        return ptr::null();
    };

    unsafe { lib.get::<*const c_void>(name.as_bytes_with_nul()) }
        .map(|sym| *sym)
        .unwrap_or(ptr::null())
}
