use crate::{AboveMaxLen, MAX_COLORS};
use thiserror::Error;

/// The errors that can be returned when building a palette.
///
/// A failed call never returns a partial palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum QuantizeError {
    /// No pixel was left to analyze after alpha filtering and sampling,
    /// i.e., the image has no sufficiently opaque pixels.
    #[error("image has no sufficiently opaque pixels to analyze")]
    EmptyInput,

    /// The requested number of palette colors was `0` or above [`MAX_COLORS`].
    #[error("color count must be between 1 and {MAX_COLORS}, got {0}")]
    InvalidColorCount(u32),

    /// The quality (sampling stride) was `0`.
    #[error("quality must be at least 1, got {0}")]
    InvalidQuality(u32),

    /// The input had more pixels than [`MAX_PIXELS`](crate::MAX_PIXELS).
    #[error("too many pixels: {0}")]
    TooManyPixels(#[from] AboveMaxLen<u32>),
}
