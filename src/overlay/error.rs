use std::path::PathBuf;

/// A source image could not be turned into a bitmap. Callers skip the
/// paint instead of tearing the overlay down.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("failed to read image {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("image {path} has no pixels")]
    Empty { path: PathBuf },
    #[error("{path} contains no animation frames")]
    NoFrames { path: PathBuf },
}

/// The overlay cannot become visible with the current configuration.
/// The transition is blocked and the message shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigurationError {
    #[error("no overlay image selected")]
    NoImageSelected,
    #[error("overlay image {0} does not exist")]
    ImageMissing(PathBuf),
    #[error("no displays available")]
    NoDisplays,
}

/// A settings edit carried a malformed value. The edit is rejected and
/// the previous value kept.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InputValidationError {
    #[error("opacity must be between 0.0 and 1.0, got {0}")]
    OpacityOutOfRange(f32),
    #[error("transparency must be between 0 and 255, got {0}")]
    TransparencyOutOfRange(i64),
    #[error("background color must be in #RRGGBB format, got '{0}'")]
    BadColor(String),
    #[error("{name} must be a positive number, got {value}")]
    NonPositive { name: &'static str, value: f32 },
    #[error("cache size must be at least 1")]
    ZeroCacheSize,
    #[error("gif speed must be greater than zero")]
    ZeroGifSpeed,
}
