//! Windows wrapping AppKit objects owned by the caller.
//!
//! Neither window type owns anything native: disposing only marks the object
//! unusable.

use std::fmt;
use std::ptr::NonNull;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use raw_window_handle::{
    AppKitDisplayHandle, AppKitWindowHandle, DisplayHandle, HandleError, HasDisplayHandle,
    HasWindowHandle, RawDisplayHandle, RawWindowHandle, WindowHandle,
};

use crate::error::{Error, ErrorKind, Result};
use crate::handle::NativeHandle;
use crate::window::{disposed_window, NativeWindow};

#[cfg(macos_platform)]
mod native;

#[cfg(macos_platform)]
pub use native::NativeCocoa;

/// The Objective-C messages sent to windows, views and layers.
pub trait CocoaApi: Send + Sync {
    /// `[object isKindOfClass:[NSWindow class]]`.
    fn is_window(&self, object: NativeHandle) -> bool;

    /// `[object isKindOfClass:[NSView class]]`.
    fn is_view(&self, object: NativeHandle) -> bool;

    /// `[object isKindOfClass:[CAMetalLayer class]]`.
    fn is_metal_layer(&self, object: NativeHandle) -> bool;

    /// `[window contentView]`.
    fn content_view(&self, window: NativeHandle) -> NativeHandle;

    /// `[view layer]`, null when the view isn't layer backed.
    fn layer(&self, view: NativeHandle) -> NativeHandle;

    /// `[CAMetalLayer layer]`, null when QuartzCore has no Metal support.
    fn new_metal_layer(&self) -> NativeHandle;

    /// `[view setWantsLayer:YES]` then `[view setLayer:layer]`.
    fn set_layer(&self, view: NativeHandle, layer: NativeHandle);

    fn make_key_and_order_front(&self, window: NativeHandle);

    fn order_out(&self, window: NativeHandle);

    /// `[view setHidden:hidden]`.
    fn set_hidden(&self, view: NativeHandle, hidden: bool);
}

/// An `NSWindow` presenting through a `CAMetalLayer`.
///
/// The layer of the content view is replaced by a Metal layer the first time
/// [`NativeWindow::metal_layer`] is called, unless it already is one.
pub struct CocoaWindow {
    api: Arc<dyn CocoaApi>,
    window: NativeHandle,
    metal_layer: OnceCell<NativeHandle>,
    disposed: bool,
}

impl CocoaWindow {
    /// Wrap `window`, which must be an `NSWindow`.
    pub fn new(api: Arc<dyn CocoaApi>, window: NativeHandle) -> Result<Self> {
        if !api.is_window(window) {
            return Err(Error::with_message(
                ErrorKind::UsageContractViolation,
                "the handle is not an NSWindow",
            ));
        }

        Ok(Self { api, window, metal_layer: OnceCell::new(), disposed: false })
    }

    fn content_view(&self) -> Result<NativeHandle> {
        let view = self.api.content_view(self.window);
        if !self.api.is_view(view) {
            return Err(Error::with_message(
                ErrorKind::WindowCreationFailed,
                "the window's content view is not an NSView",
            ));
        }

        Ok(view)
    }

    fn install_metal_layer(&self) -> Result<NativeHandle> {
        let view = self.content_view()?;

        let layer = self.api.layer(view);
        if self.api.is_metal_layer(layer) {
            return Ok(layer);
        }

        log::info!("Replacing original NSView layer with CAMetalLayer");

        let layer = self.api.new_metal_layer();
        if layer.is_null() {
            return Err(Error::with_message(
                ErrorKind::WindowCreationFailed,
                "[CAMetalLayer layer] returned nil",
            ));
        }

        self.api.set_layer(view, layer);
        Ok(layer)
    }
}

impl NativeWindow for CocoaWindow {
    /// AppKit has no display connection, so this is null.
    fn native_display(&self) -> NativeHandle {
        NativeHandle::NULL
    }

    fn native_window(&self) -> NativeHandle {
        self.window
    }

    fn show(&mut self) -> Result<()> {
        if self.disposed {
            return Err(disposed_window());
        }

        self.api.make_key_and_order_front(self.window);
        Ok(())
    }

    fn hide(&mut self) -> Result<()> {
        if self.disposed {
            return Err(disposed_window());
        }

        self.api.order_out(self.window);
        Ok(())
    }

    fn is_disposed(&self) -> bool {
        self.disposed
    }

    fn dispose(&mut self) -> Result<()> {
        self.disposed = true;
        Ok(())
    }

    fn metal_layer(&self) -> Result<NativeHandle> {
        if self.disposed {
            return Err(disposed_window());
        }

        self.metal_layer.get_or_try_init(|| self.install_metal_layer()).copied()
    }
}

impl HasWindowHandle for CocoaWindow {
    fn window_handle(&self) -> std::result::Result<WindowHandle<'_>, HandleError> {
        if self.disposed {
            return Err(HandleError::Unavailable);
        }

        let view = self.content_view().map_err(|_| HandleError::Unavailable)?;
        let view = NonNull::new(view.as_ptr()).ok_or(HandleError::Unavailable)?;
        let raw = RawWindowHandle::AppKit(AppKitWindowHandle::new(view));

        // SAFETY: the caller keeps the NSWindow alive for the lifetime of this
        // object.
        Ok(unsafe { WindowHandle::borrow_raw(raw) })
    }
}

impl HasDisplayHandle for CocoaWindow {
    fn display_handle(&self) -> std::result::Result<DisplayHandle<'_>, HandleError> {
        let raw = RawDisplayHandle::AppKit(AppKitDisplayHandle::new());
        Ok(unsafe { DisplayHandle::borrow_raw(raw) })
    }
}

impl fmt::Debug for CocoaWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CocoaWindow")
            .field("window", &self.window)
            .field("metal_layer", &self.metal_layer.get())
            .field("disposed", &self.disposed)
            .finish_non_exhaustive()
    }
}

/// An `NSView` with a `CAMetalLayer` the caller already set up.
///
/// The display handle is the view and the window handle the layer.
pub struct MetalWindow {
    api: Arc<dyn CocoaApi>,
    view: NativeHandle,
    layer: NativeHandle,
    disposed: bool,
}

impl MetalWindow {
    pub fn new(api: Arc<dyn CocoaApi>, view: NativeHandle, layer: NativeHandle) -> Self {
        Self { api, view, layer, disposed: false }
    }
}

impl NativeWindow for MetalWindow {
    fn native_display(&self) -> NativeHandle {
        self.view
    }

    fn native_window(&self) -> NativeHandle {
        self.layer
    }

    fn show(&mut self) -> Result<()> {
        if self.disposed {
            return Err(disposed_window());
        }

        self.api.set_hidden(self.view, false);
        Ok(())
    }

    fn hide(&mut self) -> Result<()> {
        if self.disposed {
            return Err(disposed_window());
        }

        self.api.set_hidden(self.view, true);
        Ok(())
    }

    fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// The layer belongs to the caller and is left alone.
    fn dispose(&mut self) -> Result<()> {
        self.disposed = true;
        Ok(())
    }

    fn metal_layer(&self) -> Result<NativeHandle> {
        if self.disposed {
            return Err(disposed_window());
        }

        Ok(self.layer)
    }
}

impl HasWindowHandle for MetalWindow {
    fn window_handle(&self) -> std::result::Result<WindowHandle<'_>, HandleError> {
        if self.disposed {
            return Err(HandleError::Unavailable);
        }

        let view = NonNull::new(self.view.as_ptr()).ok_or(HandleError::Unavailable)?;
        let raw = RawWindowHandle::AppKit(AppKitWindowHandle::new(view));
        Ok(unsafe { WindowHandle::borrow_raw(raw) })
    }
}

impl HasDisplayHandle for MetalWindow {
    fn display_handle(&self) -> std::result::Result<DisplayHandle<'_>, HandleError> {
        let raw = RawDisplayHandle::AppKit(AppKitDisplayHandle::new());
        Ok(unsafe { DisplayHandle::borrow_raw(raw) })
    }
}

impl fmt::Debug for MetalWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetalWindow")
            .field("view", &self.view)
            .field("layer", &self.layer)
            .field("disposed", &self.disposed)
            .finish_non_exhaustive()
    }
}
