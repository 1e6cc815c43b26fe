use cfg_aliases::cfg_aliases;

fn main() {
    // Setup alias to reduce `cfg` boilerplate.
    cfg_aliases! {
        // Systems.
        macos_platform: { target_os = "macos" },
        free_unix: { all(unix, not(macos_platform), not(target_os = "ios"), not(target_os = "android")) },

        // Native displays.
        x11_platform: { all(feature = "x11", free_unix) },

        // Backends.
        egl_backend: { all(feature = "egl", x11_platform) },
        glx_backend: { all(feature = "glx", x11_platform) },
        wgl_backend: { all(feature = "wgl", windows) },
        vulkan_backend: { feature = "vulkan" },
    }
}
