use thiserror::Error;

#[derive(Debug, Error)]
pub enum UpscaleError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid input: {0}")]
    PreconditionError(String),

    #[error("Unable to create temporary surface: {0}")]
    ConversionError(String),

    #[error("Sink write error: {0}")]
    SinkWriteError(String),

    #[error("JPEG saving error, giving up: {0}")]
    JpegEncodeError(String),

    #[error("PNG saving error, giving up: {0}")]
    PngEncodeError(String),

    #[error("Image load error: {0}")]
    LoadError(String),

    #[error("Scale error: {0}")]
    ScaleError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Generates factory methods for [`UpscaleError`] variants that wrap a `String`.
macro_rules! error_constructors {
    ($(
        $(#[doc = $doc:expr])*
        $method:ident => $variant:ident
    ),* $(,)?) => {
        impl UpscaleError {
            $(
                $(#[doc = $doc])*
                pub fn $method(msg: impl Into<String>) -> Self {
                    Self::$variant(msg.into())
                }
            )*
        }
    };
}

error_constructors! {
    /// Create a configuration error.
    config => ConfigError,
    /// Create a precondition error (invalid surface or arguments).
    precondition => PreconditionError,
    /// Create a surface conversion error.
    conversion => ConversionError,
    /// Create a sink write error.
    sink_write => SinkWriteError,
    /// Create a JPEG encode error.
    jpeg_encode => JpegEncodeError,
    /// Create a PNG encode error.
    png_encode => PngEncodeError,
    /// Create an image load error.
    load => LoadError,
    /// Create a scale error.
    scale => ScaleError,
}

impl From<serde_yml::Error> for UpscaleError {
    fn from(e: serde_yml::Error) -> Self {
        Self::ConfigError(e.to_string())
    }
}

impl From<image::ImageError> for UpscaleError {
    fn from(e: image::ImageError) -> Self {
        Self::LoadError(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, UpscaleError>;
