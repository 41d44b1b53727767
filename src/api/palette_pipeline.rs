use crate::{
    mmcq::{self, ColorMap, FRACTION_BY_POPULATION},
    ColorComponents, ColorSlice, Histogram, PaletteSize, PixelFilter, Quality, QuantizeError,
    QuantizeOutput, DOMINANT_PALETTE_SIZE,
};

use palette::Srgb;

#[cfg(feature = "image")]
use crate::AboveMaxLen;
#[cfg(feature = "image")]
use image::RgbaImage;
#[cfg(feature = "image")]
use palette::Srgba;

/// A builder struct to specify options to create a color palette for an image or slice of pixels.
///
/// # Examples
/// ```no_run
/// # use medcut::{PalettePipeline, PaletteSize, Quality};
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let img = image::open("some image")?.into_rgba8();
///
/// let palette = PalettePipeline::try_from(&img)?
///     .palette_size(PaletteSize::try_from(8u16)?)
///     .quality(Quality::EXHAUSTIVE)
///     .ignore_white(true)
///     .palette()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct PalettePipeline<'a, Color>
where
    Color: ColorComponents<u8, 4>,
{
    /// The input pixels.
    pub(crate) pixels: ColorSlice<'a, Color>,
    /// The maximum number of palette colors.
    pub(crate) k: PaletteSize,
    /// The histogram sampling stride.
    pub(crate) quality: Quality,
    /// The pixels to count in the histogram.
    pub(crate) filter: PixelFilter,
    /// The fraction of the palette filled by splitting by population.
    pub(crate) population_fraction: f64,
}

impl<'a, Color> PalettePipeline<'a, Color>
where
    Color: ColorComponents<u8, 4>,
{
    /// Creates a new [`PalettePipeline`] with default options.
    ///
    /// The defaults are a palette size of `10`, a quality of `10`,
    /// an alpha threshold of [`ALPHA_THRESHOLD`](crate::ALPHA_THRESHOLD),
    /// white pixels kept, and a population fraction of [`FRACTION_BY_POPULATION`].
    #[must_use]
    pub fn new(pixels: ColorSlice<'a, Color>) -> Self {
        Self {
            pixels,
            k: PaletteSize::default(),
            quality: Quality::default(),
            filter: PixelFilter::new(),
            population_fraction: FRACTION_BY_POPULATION,
        }
    }

    /// Sets the maximum number of colors in the palette.
    #[must_use]
    pub fn palette_size(mut self, size: PaletteSize) -> Self {
        self.k = size;
        self
    }

    /// Sets the sampling stride. A quality of `1` examines every pixel.
    #[must_use]
    pub fn quality(mut self, quality: Quality) -> Self {
        self.quality = quality;
        self
    }

    /// Sets the minimum alpha value for a pixel to be counted.
    #[must_use]
    pub fn alpha_threshold(mut self, alpha_threshold: u8) -> Self {
        self.filter = self.filter.alpha_threshold(alpha_threshold);
        self
    }

    /// Sets whether near-white pixels are skipped (see [`PixelFilter::ignore_white`]).
    #[must_use]
    pub fn ignore_white(mut self, ignore_white: bool) -> Self {
        self.filter = self.filter.ignore_white(ignore_white);
        self
    }

    /// Sets the fraction of the palette that is filled by splitting the most populated boxes
    /// before switching to population times volume. The value is clamped to `0.0..=1.0`.
    #[must_use]
    pub fn population_fraction(mut self, fraction: f64) -> Self {
        self.population_fraction = fraction;
        self
    }

    /// Builds the color histogram of the pixels.
    ///
    /// # Errors
    /// Returns [`QuantizeError::EmptyInput`] if no pixel survives filtering and sampling.
    pub fn histogram(&self) -> Result<Histogram, QuantizeError> {
        Histogram::new(self.pixels, self.quality, self.filter)
    }

    /// Computes the final median cut boxes and their colors.
    ///
    /// # Errors
    /// Returns [`QuantizeError::EmptyInput`] if no pixel survives filtering and sampling.
    pub fn color_map(&self) -> Result<ColorMap, QuantizeError> {
        let histogram = self.histogram()?;
        Ok(mmcq::color_map(&histogram, self.k, self.population_fraction))
    }

    /// Computes the palette along with the number of pixels assigned to each color.
    ///
    /// # Errors
    /// Returns [`QuantizeError::EmptyInput`] if no pixel survives filtering and sampling.
    pub fn quantize(&self) -> Result<QuantizeOutput<Srgb<u8>>, QuantizeError> {
        self.color_map().map(Into::into)
    }

    /// Computes the palette, ordered from most to least common color.
    ///
    /// # Errors
    /// Returns [`QuantizeError::EmptyInput`] if no pixel survives filtering and sampling.
    pub fn palette(&self) -> Result<Vec<Srgb<u8>>, QuantizeError> {
        self.quantize().map(|output| output.palette)
    }

    /// Returns the most common color, the first color of a palette of [`DOMINANT_PALETTE_SIZE`].
    ///
    /// The palette size of this pipeline is ignored.
    ///
    /// # Errors
    /// Returns [`QuantizeError::EmptyInput`] if no pixel survives filtering and sampling.
    pub fn dominant_color(&self) -> Result<Srgb<u8>, QuantizeError> {
        self.clone()
            .palette_size(DOMINANT_PALETTE_SIZE)
            .palette()
            .and_then(first_color)
    }
}

#[cfg(feature = "threads")]
impl<'a, Color> PalettePipeline<'a, Color>
where
    Color: ColorComponents<u8, 4> + Sync,
{
    /// Builds the color histogram of the pixels in parallel.
    ///
    /// # Errors
    /// Returns [`QuantizeError::EmptyInput`] if no pixel survives filtering and sampling.
    pub fn histogram_par(&self) -> Result<Histogram, QuantizeError> {
        Histogram::new_par(self.pixels, self.quality, self.filter)
    }

    /// Computes the final median cut boxes and their colors, building the histogram in parallel.
    ///
    /// # Errors
    /// Returns [`QuantizeError::EmptyInput`] if no pixel survives filtering and sampling.
    pub fn color_map_par(&self) -> Result<ColorMap, QuantizeError> {
        let histogram = self.histogram_par()?;
        Ok(mmcq::color_map(&histogram, self.k, self.population_fraction))
    }

    /// Computes the palette along with the number of pixels assigned to each color in parallel.
    ///
    /// # Errors
    /// Returns [`QuantizeError::EmptyInput`] if no pixel survives filtering and sampling.
    pub fn quantize_par(&self) -> Result<QuantizeOutput<Srgb<u8>>, QuantizeError> {
        self.color_map_par().map(Into::into)
    }

    /// Computes the palette in parallel.
    ///
    /// # Errors
    /// Returns [`QuantizeError::EmptyInput`] if no pixel survives filtering and sampling.
    pub fn palette_par(&self) -> Result<Vec<Srgb<u8>>, QuantizeError> {
        self.quantize_par().map(|output| output.palette)
    }

    /// Returns the most common color, building the histogram in parallel.
    ///
    /// # Errors
    /// Returns [`QuantizeError::EmptyInput`] if no pixel survives filtering and sampling.
    pub fn dominant_color_par(&self) -> Result<Srgb<u8>, QuantizeError> {
        self.clone()
            .palette_size(DOMINANT_PALETTE_SIZE)
            .palette_par()
            .and_then(first_color)
    }
}

/// Returns the first color of a palette.
fn first_color(palette: Vec<Srgb<u8>>) -> Result<Srgb<u8>, QuantizeError> {
    palette.into_iter().next().ok_or(QuantizeError::EmptyInput)
}

#[cfg(feature = "image")]
impl<'a> TryFrom<&'a RgbaImage> for PalettePipeline<'a, Srgba<u8>> {
    type Error = AboveMaxLen<u32>;

    fn try_from(image: &'a RgbaImage) -> Result<Self, Self::Error> {
        Ok(Self::new(image.try_into()?))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::tests::*;
    use palette::Srgba;

    #[test]
    fn defaults() {
        let pixels = test_data_1024();
        let pipeline = PalettePipeline::new(ColorSlice::try_from(pixels.as_slice()).unwrap());

        assert_eq!(pipeline.k.into_inner(), 10);
        assert_eq!(pipeline.quality.into_inner(), 10);
        assert_eq!(pipeline.filter, PixelFilter::new());
        assert!(pipeline.palette().unwrap().len() <= 10);
    }

    #[test]
    fn dominant_color_ignores_palette_size() {
        let pixels = test_data_1024();
        let pipeline = PalettePipeline::new(ColorSlice::try_from(pixels.as_slice()).unwrap())
            .quality(Quality::EXHAUSTIVE)
            .palette_size(PaletteSize::MAX);

        let expected = pipeline
            .clone()
            .palette_size(DOMINANT_PALETTE_SIZE)
            .palette()
            .unwrap()[0];
        assert_eq!(pipeline.dominant_color().unwrap(), expected);
    }

    #[test]
    fn ignore_white_and_alpha_threshold() {
        let mut pixels = solid(Srgba::new(255, 255, 255, 255), 90);
        pixels.extend(solid(Srgba::new(0, 128, 0, 150), 10));
        let slice = ColorSlice::try_from(pixels.as_slice()).unwrap();

        let pipeline = PalettePipeline::new(slice).quality(Quality::EXHAUSTIVE);
        assert_eq!(pipeline.dominant_color().unwrap(), Srgb::new(252, 252, 252));

        let pipeline = pipeline.ignore_white(true);
        assert_eq!(pipeline.dominant_color().unwrap(), Srgb::new(4, 132, 4));

        let pipeline = pipeline.alpha_threshold(200);
        assert_eq!(pipeline.dominant_color(), Err(QuantizeError::EmptyInput));
    }

    #[test]
    #[cfg(feature = "threads")]
    fn single_and_multi_threaded_match() {
        let pixels = test_data_1024();
        let pipeline = PalettePipeline::new(ColorSlice::try_from(pixels.as_slice()).unwrap())
            .palette_size(PaletteSize::try_from(32u16).unwrap())
            .quality(Quality::try_from(3).unwrap());

        assert_eq!(pipeline.quantize().unwrap(), pipeline.quantize_par().unwrap());
        assert_eq!(pipeline.dominant_color().unwrap(), pipeline.dominant_color_par().unwrap());
    }
}
