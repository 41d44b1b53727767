//! The dense color histogram over quantized RGB keys.
//!
//! Every examined pixel that passes the [`PixelFilter`] has its red, green, and blue components
//! truncated to [`SIGNIFICANT_BITS`] bits, and the resulting key is counted.
//! The histogram is immutable once built and is shared by reference with the median cut splitter.

use crate::{ColorComponents, ColorSlice, Quality, QuantizeError};
use bitvec::vec::BitVec;
use palette::cast;
#[cfg(feature = "threads")]
use rayon::prelude::*;

/// The number of significant bits kept from each 8-bit color component.
pub const SIGNIFICANT_BITS: u32 = 5;

/// The number of low bits discarded from each 8-bit color component.
pub(crate) const SHIFT: u32 = u8::BITS - SIGNIFICANT_BITS;

/// The number of bins along each axis of the histogram.
pub(crate) const BINS: usize = 1 << SIGNIFICANT_BITS;

/// The total number of bins in the histogram.
const LEN: usize = BINS * BINS * BINS;

/// Pixels with an alpha value below this are considered transparent and skipped by default.
pub const ALPHA_THRESHOLD: u8 = 125;

/// Pixels whose red, green, and blue components are all above this are considered white
/// (only used if [`PixelFilter::ignore_white`] is enabled).
pub const WHITE_THRESHOLD: u8 = 250;

/// A color reduced to [`SIGNIFICANT_BITS`] per component.
///
/// Each component is less than `2^SIGNIFICANT_BITS`.
pub type Key = [u8; 3];

/// Returns the quantized key for the given 8-bit red, green, and blue components.
#[inline]
#[must_use]
pub fn quantize(rgb: [u8; 3]) -> Key {
    rgb.map(|c| c >> SHIFT)
}

/// Returns the linear index of a key into the histogram.
#[inline]
pub(crate) fn key_index([r, g, b]: Key) -> usize {
    (usize::from(r) << (2 * SIGNIFICANT_BITS)) | (usize::from(g) << SIGNIFICANT_BITS) | usize::from(b)
}

/// Returns the key for a linear histogram index.
#[inline]
#[allow(clippy::cast_possible_truncation)]
fn index_key(index: usize) -> Key {
    let mask = BINS - 1;
    [
        (index >> (2 * SIGNIFICANT_BITS)) as u8,
        ((index >> SIGNIFICANT_BITS) & mask) as u8,
        (index & mask) as u8,
    ]
}

/// Decides which pixels are counted in the histogram.
///
/// By default, only pixels with an alpha of at least [`ALPHA_THRESHOLD`] are counted.
///
/// # Examples
/// ```
/// # use medcut::PixelFilter;
/// let filter = PixelFilter::new().alpha_threshold(200).ignore_white(true);
/// assert!(filter.keep([10, 20, 30, 255]));
/// assert!(!filter.keep([10, 20, 30, 199]));
/// assert!(!filter.keep([255, 252, 251, 255]));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelFilter {
    /// The minimum alpha value for a pixel to be counted.
    alpha_threshold: u8,
    /// Whether to skip near-white pixels.
    ignore_white: bool,
}

impl Default for PixelFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl PixelFilter {
    /// Creates a new [`PixelFilter`] with default values.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            alpha_threshold: ALPHA_THRESHOLD,
            ignore_white: false,
        }
    }

    /// Sets the minimum alpha value for a pixel to be counted.
    ///
    /// The default is [`ALPHA_THRESHOLD`].
    #[must_use]
    pub const fn alpha_threshold(mut self, alpha_threshold: u8) -> Self {
        self.alpha_threshold = alpha_threshold;
        self
    }

    /// Sets whether pixels with all of red, green, and blue above [`WHITE_THRESHOLD`] are skipped.
    ///
    /// This is useful for images on a white background. The default is `false`.
    #[must_use]
    pub const fn ignore_white(mut self, ignore_white: bool) -> Self {
        self.ignore_white = ignore_white;
        self
    }

    /// Returns whether the given RGBA pixel should be counted.
    #[inline]
    #[must_use]
    pub fn keep(&self, [r, g, b, a]: [u8; 4]) -> bool {
        a >= self.alpha_threshold
            && !(self.ignore_white && r > WHITE_THRESHOLD && g > WHITE_THRESHOLD && b > WHITE_THRESHOLD)
    }
}

/// The population counts of each quantized color [`Key`].
///
/// Use [`Histogram::new`] (or [`Histogram::new_par`]) to build one from a [`ColorSlice`].
/// A successfully built histogram always has a nonzero [`total_count`](Histogram::total_count).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Histogram {
    /// The count for each key, indexed by [`key_index`].
    counts: Vec<u32>,
    /// Which keys have a nonzero count.
    occupied: BitVec,
    /// The sum of `counts`.
    total: u32,
    /// The number of pixels examined (before filtering).
    examined: u32,
}

impl Histogram {
    /// Creates a new [`Histogram`] with all counts set to zero.
    fn new_zero() -> Self {
        Self {
            counts: vec![0; LEN],
            occupied: BitVec::new(),
            total: 0,
            examined: 0,
        }
    }

    /// Counts every `stride`-th pixel of the given chunk, starting at the first.
    fn add_pixels(&mut self, pixels: &[[u8; 4]], stride: usize, filter: PixelFilter) {
        for &pixel in pixels.iter().step_by(stride) {
            self.examined += 1;
            if filter.keep(pixel) {
                let [r, g, b, _] = pixel;
                self.counts[key_index(quantize([r, g, b]))] += 1;
                self.total += 1;
            }
        }
    }

    /// Computes the occupied keys and checks that at least one pixel was counted.
    fn finish(mut self) -> Result<Self, QuantizeError> {
        self.occupied = self.counts.iter().map(|&count| count > 0).collect();

        log::debug!(
            "histogram: examined {} pixels, counted {}, {} distinct keys",
            self.examined,
            self.total,
            self.num_keys()
        );

        if self.total == 0 {
            Err(QuantizeError::EmptyInput)
        } else {
            Ok(self)
        }
    }

    /// Builds a new [`Histogram`] from the given pixels.
    ///
    /// Only every `quality`-th pixel (in scan order, starting with the first) is examined,
    /// and only the examined pixels accepted by `filter` are counted.
    ///
    /// # Errors
    /// Returns [`QuantizeError::EmptyInput`] if no pixel was counted.
    pub fn new<Color>(
        pixels: ColorSlice<Color>,
        quality: Quality,
        filter: PixelFilter,
    ) -> Result<Self, QuantizeError>
    where
        Color: ColorComponents<u8, 4>,
    {
        let mut hist = Self::new_zero();
        hist.add_pixels(cast::into_array_slice(pixels.as_ref()), quality.stride(), filter);
        hist.finish()
    }

    /// Merges two partial histograms by element-wise summing their counts.
    #[cfg(feature = "threads")]
    #[allow(clippy::needless_pass_by_value)]
    fn merge_partial(mut self, other: Self) -> Self {
        for (a, b) in self.counts.iter_mut().zip(&other.counts) {
            *a += b;
        }
        self.total += other.total;
        self.examined += other.examined;
        self
    }

    /// Builds a new [`Histogram`] in parallel from the given pixels.
    ///
    /// The result is identical to [`Histogram::new`].
    ///
    /// # Errors
    /// Returns [`QuantizeError::EmptyInput`] if no pixel was counted.
    #[cfg(feature = "threads")]
    pub fn new_par<Color>(
        pixels: ColorSlice<Color>,
        quality: Quality,
        filter: PixelFilter,
    ) -> Result<Self, QuantizeError>
    where
        Color: ColorComponents<u8, 4> + Sync,
    {
        let pixels = cast::into_array_slice(pixels.as_ref());
        let stride = quality.stride();

        // chunks start on a multiple of the stride, so each chunk samples the same pixels as `new`
        let chunk_size = pixels
            .len()
            .div_ceil(rayon::current_num_threads())
            .next_multiple_of(stride)
            .max(stride);

        pixels
            .par_chunks(chunk_size)
            .map(|chunk| {
                let mut hist = Self::new_zero();
                hist.add_pixels(chunk, stride, filter);
                hist
            })
            .reduce_with(Self::merge_partial)
            .unwrap_or_else(Self::new_zero)
            .finish()
    }

    /// Returns the count for the given key.
    ///
    /// # Panics
    /// Panics if any component of the key is not less than `2^SIGNIFICANT_BITS`.
    #[inline]
    #[must_use]
    pub fn count(&self, key: Key) -> u32 {
        self.counts[key_index(key)]
    }

    /// Returns the total number of pixels that were counted.
    #[must_use]
    pub fn total_count(&self) -> u32 {
        self.total
    }

    /// Returns the number of pixels that were examined, including those rejected by the filter.
    #[must_use]
    pub fn examined(&self) -> u32 {
        self.examined
    }

    /// Returns the number of distinct keys with a nonzero count.
    #[must_use]
    pub fn num_keys(&self) -> usize {
        self.occupied.count_ones()
    }

    /// Returns the keys with a nonzero count in ascending index order.
    pub fn keys(&self) -> impl Iterator<Item = Key> + '_ {
        self.occupied.iter_ones().map(index_key)
    }
}
