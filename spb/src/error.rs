//! SPB error handling.

use std::fmt;

/// A specialized [`Result`] type for windowing and context operations.
pub type Result<T> = std::result::Result<T, Error>;

/// The error type for all the native platform operations.
#[derive(Debug, Clone)]
pub struct Error {
    /// The raw code of the underlying error.
    raw_code: Option<i64>,

    /// The raw message from the os in case it could be obtained.
    raw_os_message: Option<String>,

    /// The simplified error kind to handle matching.
    kind: ErrorKind,
}

impl Error {
    pub(crate) fn new(
        raw_code: Option<i64>,
        raw_os_message: Option<String>,
        kind: ErrorKind,
    ) -> Self {
        Self { raw_code, raw_os_message, kind }
    }

    /// Build an error carrying a native error code.
    pub(crate) fn with_code(kind: ErrorKind, raw_code: i64) -> Self {
        Self { raw_code: Some(raw_code), raw_os_message: None, kind }
    }

    /// Build an error carrying a descriptive message.
    pub(crate) fn with_message(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self { raw_code: None, raw_os_message: Some(message.into()), kind }
    }

    /// Helper to check that error is [`ErrorKind::NotSupported`].
    #[inline]
    pub fn not_supported(&self) -> bool {
        matches!(&self.kind, ErrorKind::NotSupported(_))
    }

    /// The underlying error kind.
    #[inline]
    pub fn error_kind(&self) -> ErrorKind {
        self.kind
    }

    /// The underlying raw code in case it's present.
    #[inline]
    pub fn raw_code(&self) -> Option<i64> {
        self.raw_code
    }

    /// The message reported by the platform in case it's present.
    #[inline]
    pub fn raw_os_message(&self) -> Option<&str> {
        self.raw_os_message.as_deref()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(raw_code) = self.raw_code {
            write!(f, "[{raw_code:x}] ")?;
        }

        let msg = if let Some(raw_os_message) = self.raw_os_message.as_ref() {
            raw_os_message
        } else {
            self.kind.as_str()
        };

        write!(f, "{msg}")
    }
}

impl std::error::Error for Error {}

/// Build an error with just a kind.
impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Error { raw_code: None, raw_os_message: None, kind }
    }
}

/// A list specifying general categories of windowing and context errors.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum ErrorKind {
    /// The running platform has no backend, or a required native library
    /// couldn't be loaded.
    UnsupportedPlatform,

    /// Failed to perform one-time resource initialization.
    InitializationFailed,

    /// No native configuration matched the requested framebuffer format.
    ConfigurationSelectionFailed,

    /// The native context creation call failed.
    ContextCreationFailed,

    /// Binding a context to a window failed.
    MakeCurrentFailed,

    /// The native window, or its rendering surface, couldn't be created.
    WindowCreationFailed,

    /// Vulkan surface creation failed.
    SurfaceCreationFailed,

    /// Presenting the back buffer or changing the swap interval failed.
    SwapFailed,

    /// The caller mixed objects that can't be used together, for example a
    /// window of another backend or from another display.
    UsageContractViolation,

    /// The operation is not supported by the platform.
    NotSupported(&'static str),
}

impl ErrorKind {
    pub(crate) fn as_str(&self) -> &'static str {
        use ErrorKind::*;
        match *self {
            UnsupportedPlatform => "the platform is not supported",
            InitializationFailed => "initialization failed",
            ConfigurationSelectionFailed => "no matching native configuration was found",
            ContextCreationFailed => "context creation failed",
            MakeCurrentFailed => "making the context current failed",
            WindowCreationFailed => "window creation failed",
            SurfaceCreationFailed => "surface creation failed",
            SwapFailed => "swapping buffers failed",
            UsageContractViolation => "objects passed are not compatible with each other",
            NotSupported(reason) => reason,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
