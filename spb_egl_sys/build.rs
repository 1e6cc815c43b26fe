use std::env;
use std::fs::File;
use std::path::PathBuf;

use gl_generator::{Api, Fallbacks, Profile, Registry};

fn main() {
    let target = env::var("TARGET").unwrap();
    let dest = PathBuf::from(&env::var("OUT_DIR").unwrap());

    println!("cargo:rerun-if-changed=build.rs");

    if target.contains("linux")
        || target.contains("dragonfly")
        || target.contains("freebsd")
        || target.contains("netbsd")
        || target.contains("openbsd")
        || target.contains("windows")
    {
        let mut file = File::create(dest.join("egl_bindings.rs")).unwrap();
        Registry::new(Api::Egl, (1, 5), Profile::Core, Fallbacks::All, [
            "EGL_KHR_create_context",
            "EGL_KHR_gl_colorspace",
            "EGL_KHR_platform_x11",
            "EGL_EXT_platform_base",
            "EGL_EXT_platform_x11",
        ])
        .write_bindings(gl_generator::StructGenerator, &mut file)
        .unwrap();
    }
}
