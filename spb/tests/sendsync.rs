use spb::api::cocoa::{CocoaWindow, MetalWindow};
use spb::api::win32::Win32Helper;
use spb::api::x11::X11Helper;
use spb::error::Error;
use spb::*;

trait FailToCompileIfNotSendSync
where
    Self: Send + Sync,
{
}

impl FailToCompileIfNotSendSync for NativeHandle {}
impl FailToCompileIfNotSendSync for FramebufferFormat {}
impl FailToCompileIfNotSendSync for Error {}
impl FailToCompileIfNotSendSync for Context {}
impl FailToCompileIfNotSendSync for Window {}
impl FailToCompileIfNotSendSync for PlainWindow {}
impl FailToCompileIfNotSendSync for spb::context::Liveness {}
impl FailToCompileIfNotSendSync for CocoaWindow {}
impl FailToCompileIfNotSendSync for MetalWindow {}
impl FailToCompileIfNotSendSync for X11Helper {}
impl FailToCompileIfNotSendSync for Win32Helper {}
impl FailToCompileIfNotSendSync for PlatformHelper {}

#[cfg(feature = "vulkan")]
impl FailToCompileIfNotSendSync for spb::vulkan::VulkanHelper {}
