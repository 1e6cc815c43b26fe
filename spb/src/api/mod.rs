//! The native window systems and OpenGL APIs.
//!
//! Each backend talks to the system through a trait taking
//! [`NativeHandle`](crate::handle::NativeHandle)s, implemented for real only
//! where the backend exists. The protocol code on top builds everywhere.

pub mod cocoa;
pub mod egl;
pub mod glx;
pub mod wgl;
pub mod win32;
pub mod x11;
