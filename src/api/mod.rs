//! Contains the types and functions for the high level API.

mod palette_pipeline;

pub use palette_pipeline::PalettePipeline;

use crate::{ColorComponents, ColorSlice, PaletteSize, Quality, QuantizeError};
use palette::Srgb;

/// Builds a color palette of at most `color_count` colors from the given RGBA pixels,
/// ordered from most to least common.
///
/// Only every `quality`-th pixel is examined (`1` examines every pixel),
/// and pixels with an alpha below [`ALPHA_THRESHOLD`](crate::ALPHA_THRESHOLD) are skipped.
///
/// # Errors
/// Arguments are checked before any work is done:
/// - [`QuantizeError::InvalidColorCount`] if `color_count` is `0` or above [`MAX_COLORS`](crate::MAX_COLORS).
/// - [`QuantizeError::InvalidQuality`] if `quality` is `0`.
/// - [`QuantizeError::TooManyPixels`] if there are more than [`MAX_PIXELS`](crate::MAX_PIXELS) pixels.
///
/// Afterwards, [`QuantizeError::EmptyInput`] is returned if no pixel survived filtering and sampling.
///
/// # Examples
/// ```
/// # use medcut::build_palette;
/// # use palette::{Srgb, Srgba};
/// # fn main() -> Result<(), medcut::QuantizeError> {
/// let pixels = vec![Srgba::new(255, 0, 0, 255); 100];
/// let palette = build_palette(&pixels, 5, 1)?;
/// assert_eq!(palette, vec![Srgb::new(252, 4, 4)]);
/// # Ok(())
/// # }
/// ```
pub fn build_palette<Color>(
    pixels: &[Color],
    color_count: u32,
    quality: u32,
) -> Result<Vec<Srgb<u8>>, QuantizeError>
where
    Color: ColorComponents<u8, 4>,
{
    pipeline(pixels, color_count, quality)?.palette()
}

/// Returns the dominant color of the given RGBA pixels,
/// i.e., the first color of [`build_palette`] with a color count of [`DOMINANT_PALETTE_SIZE`](crate::DOMINANT_PALETTE_SIZE).
///
/// # Errors
/// See [`build_palette`].
pub fn dominant_color<Color>(pixels: &[Color], quality: u32) -> Result<Srgb<u8>, QuantizeError>
where
    Color: ColorComponents<u8, 4>,
{
    pipeline(pixels, u32::from(crate::DOMINANT_PALETTE_SIZE.into_inner()), quality)?
        .dominant_color()
}

/// Validates the arguments and creates a [`PalettePipeline`].
fn pipeline<Color>(
    pixels: &[Color],
    color_count: u32,
    quality: u32,
) -> Result<PalettePipeline<'_, Color>, QuantizeError>
where
    Color: ColorComponents<u8, 4>,
{
    let k = PaletteSize::try_from(color_count)?;
    let quality = Quality::try_from(quality)?;
    let pixels = ColorSlice::try_from(pixels)?;

    Ok(PalettePipeline::new(pixels).palette_size(k).quality(quality))
}
