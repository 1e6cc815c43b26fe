//! Framebuffer format requests.

/// Per channel bit sizes of a color buffer.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ColorFormat {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
    pub alpha: u8,
}

impl ColorFormat {
    /// A color buffer that isn't requested at all.
    pub const ZERO: Self = Self::new(0, 0, 0, 0);

    /// The common 8 bits per channel RGBA layout.
    pub const RGBA8: Self = Self::new(8, 8, 8, 8);

    #[inline]
    pub const fn new(red: u8, green: u8, blue: u8, alpha: u8) -> Self {
        Self { red, green, blue, alpha }
    }

    /// Total bits of one pixel.
    #[inline]
    pub const fn bits_per_pixel(&self) -> u32 {
        self.red as u32 + self.green as u32 + self.blue as u32 + self.alpha as u32
    }
}

/// The requested pixel format of a rendering surface.
///
/// Zero for a count means "not requested" rather than "request zero", so the
/// attribute is left out of the native request entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FramebufferFormat {
    pub(crate) color: ColorFormat,
    pub(crate) depth_bits: u8,
    pub(crate) stencil_bits: u8,
    pub(crate) samples: u8,
    pub(crate) buffers: u8,
    pub(crate) stereo: bool,
    pub(crate) accumulator: ColorFormat,
}

impl FramebufferFormat {
    /// RGBA8 color, 24 bit depth, no stencil, no multisampling, double
    /// buffered, mono.
    pub const DEFAULT: Self = Self {
        color: ColorFormat::RGBA8,
        depth_bits: 24,
        stencil_bits: 0,
        samples: 0,
        buffers: 2,
        stereo: false,
        accumulator: ColorFormat::ZERO,
    };

    pub const fn new(
        color: ColorFormat,
        depth_bits: u8,
        stencil_bits: u8,
        samples: u8,
        buffers: u8,
        stereo: bool,
        accumulator: ColorFormat,
    ) -> Self {
        Self { color, depth_bits, stencil_bits, samples, buffers, stereo, accumulator }
    }

    /// Start from [`FramebufferFormat::DEFAULT`].
    #[inline]
    pub fn builder() -> FramebufferFormatBuilder {
        FramebufferFormatBuilder::default()
    }

    #[inline]
    pub fn color(&self) -> ColorFormat {
        self.color
    }

    #[inline]
    pub fn depth_bits(&self) -> u8 {
        self.depth_bits
    }

    #[inline]
    pub fn stencil_bits(&self) -> u8 {
        self.stencil_bits
    }

    /// Number of multisampling samples, `0` when multisampling is off.
    #[inline]
    pub fn samples(&self) -> u8 {
        self.samples
    }

    /// Number of color buffers, `2` and up means double buffering.
    #[inline]
    pub fn buffers(&self) -> u8 {
        self.buffers
    }

    #[inline]
    pub fn stereo(&self) -> bool {
        self.stereo
    }

    #[inline]
    pub fn accumulator(&self) -> ColorFormat {
        self.accumulator
    }

    #[inline]
    pub fn is_double_buffered(&self) -> bool {
        self.buffers > 1
    }
}

impl Default for FramebufferFormat {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Builder for a [`FramebufferFormat`].
#[derive(Debug, Default, Clone)]
pub struct FramebufferFormatBuilder {
    format: FramebufferFormat,
}

impl FramebufferFormatBuilder {
    #[inline]
    pub fn new() -> Self {
        Default::default()
    }

    /// Bits of each color channel.
    ///
    /// By default RGBA8 is requested. Passing [`ColorFormat::ZERO`] leaves
    /// the color size to the platform.
    #[inline]
    pub fn with_color(mut self, color: ColorFormat) -> Self {
        self.format.color = color;
        self
    }

    /// By default `24` is requested.
    #[inline]
    pub fn with_depth_bits(mut self, depth_bits: u8) -> Self {
        self.format.depth_bits = depth_bits;
        self
    }

    /// By default `0`, no stencil buffer, is requested.
    #[inline]
    pub fn with_stencil_bits(mut self, stencil_bits: u8) -> Self {
        self.format.stencil_bits = stencil_bits;
        self
    }

    /// Number of samples for multisampling, `0` disables it.
    #[inline]
    pub fn with_samples(mut self, samples: u8) -> Self {
        self.format.samples = samples;
        self
    }

    /// By default `2`, double buffering, is requested.
    #[inline]
    pub fn with_buffers(mut self, buffers: u8) -> Self {
        self.format.buffers = buffers;
        self
    }

    #[inline]
    pub fn with_stereo(mut self, stereo: bool) -> Self {
        self.format.stereo = stereo;
        self
    }

    /// Bits of the accumulator buffer channels, none by default.
    #[inline]
    pub fn with_accumulator(mut self, accumulator: ColorFormat) -> Self {
        self.format.accumulator = accumulator;
        self
    }

    #[must_use]
    pub fn build(self) -> FramebufferFormat {
        self.format
    }
}
