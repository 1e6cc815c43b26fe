//! AppKit and QuartzCore through the Objective-C runtime.

use std::ffi::CStr;

use objc2::msg_send;
use objc2::runtime::{AnyClass, AnyObject};

use super::CocoaApi;
use crate::handle::NativeHandle;

fn as_object(handle: NativeHandle) -> *mut AnyObject {
    handle.as_ptr().cast()
}

/// [`CocoaApi`] sending real Objective-C messages.
///
/// AppKit objects must only be touched from the main thread, which is left to
/// the caller.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeCocoa;

impl NativeCocoa {
    fn is_kind_of(object: NativeHandle, class_name: &CStr) -> bool {
        let Some(class) = AnyClass::get(class_name) else {
            return false;
        };

        if object.is_null() {
            return false;
        }

        unsafe { msg_send![as_object(object), isKindOfClass: class] }
    }
}

impl CocoaApi for NativeCocoa {
    fn is_window(&self, object: NativeHandle) -> bool {
        Self::is_kind_of(object, c"NSWindow")
    }

    fn is_view(&self, object: NativeHandle) -> bool {
        Self::is_kind_of(object, c"NSView")
    }

    fn is_metal_layer(&self, object: NativeHandle) -> bool {
        Self::is_kind_of(object, c"CAMetalLayer")
    }

    fn content_view(&self, window: NativeHandle) -> NativeHandle {
        let view: *mut AnyObject = unsafe { msg_send![as_object(window), contentView] };
        NativeHandle::from(view)
    }

    fn layer(&self, view: NativeHandle) -> NativeHandle {
        let layer: *mut AnyObject = unsafe { msg_send![as_object(view), layer] };
        NativeHandle::from(layer)
    }

    fn new_metal_layer(&self) -> NativeHandle {
        let Some(class) = AnyClass::get(c"CAMetalLayer") else {
            return NativeHandle::NULL;
        };

        let layer: *mut AnyObject = unsafe { msg_send![class, layer] };
        NativeHandle::from(layer)
    }

    fn set_layer(&self, view: NativeHandle, layer: NativeHandle) {
        unsafe {
            let _: () = msg_send![as_object(view), setWantsLayer: true];
            let _: () = msg_send![as_object(view), setLayer: as_object(layer)];
        }
    }

    fn make_key_and_order_front(&self, window: NativeHandle) {
        unsafe {
            let _: () = msg_send![as_object(window), makeKeyAndOrderFront: as_object(window)];
        }
    }

    fn order_out(&self, window: NativeHandle) {
        unsafe {
            let _: () = msg_send![as_object(window), orderOut: as_object(window)];
        }
    }

    fn set_hidden(&self, view: NativeHandle, hidden: bool) {
        unsafe {
            let _: () = msg_send![as_object(view), setHidden: hidden];
        }
    }
}
