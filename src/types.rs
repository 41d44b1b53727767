//! Contains various types needed across the crate.

use crate::{QuantizeError, MAX_COLORS, MAX_PIXELS};
use std::{
    error::Error,
    fmt::{Debug, Display},
    num::NonZeroU32,
    ops::Deref,
};
#[cfg(feature = "image")]
use {
    image::RgbaImage,
    palette::{cast::ComponentsAs, Srgba},
};

/// An error type for when the length of an input (e.g., `Vec` or slice)
/// is above the maximum supported value.
///
/// The inner value is the maximum supported value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct AboveMaxLen<T>(pub T);

impl<T: Display> Display for AboveMaxLen<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "above the maximum length of {}", self.0)
    }
}

impl<T: Debug + Display> Error for AboveMaxLen<T> {}

/// A simple new type wrapper around `&'a [Color]` with the invariant that the length of the
/// inner slice must not be greater than [`MAX_PIXELS`].
///
/// The slice is only ever read, never modified.
///
/// # Examples
/// Use `try_into` or [`ColorSlice::from_truncated`] to create [`ColorSlice`]s.
///
/// From a raw color slice:
/// ```
/// # use medcut::{ColorSlice, AboveMaxLen};
/// # use palette::Srgba;
/// # fn main() -> Result<(), AboveMaxLen<u32>> {
/// let srgba = vec![Srgba::new(0, 0, 0, 255)];
/// let pixels: ColorSlice<_> = srgba.as_slice().try_into()?;
/// # Ok(())
/// # }
/// ```
///
/// From an image (needs the `image` feature to be enabled):
/// ```no_run
/// # use medcut::ColorSlice;
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let img = image::open("some image")?.into_rgba8();
/// let pixels = ColorSlice::try_from(&img)?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, PartialEq, Eq)]
#[repr(transparent)]
pub struct ColorSlice<'a, Color>(&'a [Color]);

impl<'a, Color> Clone for ColorSlice<'a, Color> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<'a, Color> Copy for ColorSlice<'a, Color> {}

impl<'a, Color> ColorSlice<'a, Color> {
    /// Creates a new [`ColorSlice`] by truncating the input slice to a max length of [`MAX_PIXELS`].
    pub fn from_truncated(colors: &'a [Color]) -> Self {
        Self(&colors[..colors.len().min(MAX_PIXELS as usize)])
    }

    /// Returns the length of the slice as a `u32`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn num_colors(&self) -> u32 {
        self.0.len() as u32
    }
}

impl<'a, Color> AsRef<[Color]> for ColorSlice<'a, Color> {
    fn as_ref(&self) -> &[Color] {
        self
    }
}

impl<'a, Color> Deref for ColorSlice<'a, Color> {
    type Target = [Color];

    fn deref(&self) -> &Self::Target {
        self.0
    }
}

impl<'a, Color> From<ColorSlice<'a, Color>> for &'a [Color] {
    fn from(val: ColorSlice<'a, Color>) -> Self {
        val.0
    }
}

impl<'a, Color> TryFrom<&'a [Color]> for ColorSlice<'a, Color> {
    type Error = AboveMaxLen<u32>;

    fn try_from(slice: &'a [Color]) -> Result<Self, Self::Error> {
        if slice.len() <= MAX_PIXELS as usize {
            Ok(Self(slice))
        } else {
            Err(AboveMaxLen(MAX_PIXELS))
        }
    }
}

#[cfg(feature = "image")]
impl<'a> TryFrom<&'a RgbaImage> for ColorSlice<'a, Srgba<u8>> {
    type Error = AboveMaxLen<u32>;

    fn try_from(image: &'a RgbaImage) -> Result<Self, Self::Error> {
        let pixels = image.pixels().len();
        if pixels <= MAX_PIXELS as usize {
            let buf = &image.as_raw()[..(pixels * 4)];
            Ok(Self(buf.components_as()))
        } else {
            Err(AboveMaxLen(MAX_PIXELS))
        }
    }
}

/// This type is used to specify the (maximum) number of colors to include in a palette.
///
/// This is a simple new type wrapper around `u16` with the invariant that it must be
/// in the range `1..=MAX_COLORS`.
///
/// # Examples
/// Use `try_into` or [`PaletteSize::from_clamped`] to create [`PaletteSize`]s.
///
/// ```
/// # use medcut::{PaletteSize, QuantizeError};
/// # fn main() -> Result<(), QuantizeError> {
/// let size = PaletteSize::try_from(16u16)?;
/// let size: PaletteSize = 128u32.try_into()?;
/// let size = PaletteSize::from_clamped(1024);
/// assert_eq!(size, PaletteSize::MAX);
/// assert!(PaletteSize::try_from(0u16).is_err());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct PaletteSize(u16);

impl PaletteSize {
    /// The maximum supported palette size (given by [`MAX_COLORS`]).
    pub const MAX: Self = Self(MAX_COLORS);

    /// The smallest possible palette size, a single color.
    pub const MIN: Self = Self(1);

    /// Gets the inner `u16` value.
    #[must_use]
    pub const fn into_inner(self) -> u16 {
        self.0
    }

    /// Creates a [`PaletteSize`] directly from the given `u16`
    /// without ensuring that it is in the range `1..=MAX_COLORS`.
    pub(crate) const fn new_unchecked(value: u16) -> Self {
        Self(value)
    }

    /// Creates a [`PaletteSize`] by clamping the given `u16` to the range `1..=MAX_COLORS`.
    #[must_use]
    pub const fn from_clamped(value: u16) -> Self {
        if value == 0 {
            Self::MIN
        } else if value <= MAX_COLORS {
            Self(value)
        } else {
            Self::MAX
        }
    }
}

impl Default for PaletteSize {
    fn default() -> Self {
        Self(10)
    }
}

impl From<PaletteSize> for u16 {
    fn from(val: PaletteSize) -> Self {
        val.into_inner()
    }
}

impl From<PaletteSize> for usize {
    fn from(val: PaletteSize) -> Self {
        val.into_inner().into()
    }
}

impl TryFrom<u32> for PaletteSize {
    type Error = QuantizeError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        if (1..=u32::from(MAX_COLORS)).contains(&value) {
            #[allow(clippy::cast_possible_truncation)]
            Ok(PaletteSize(value as u16))
        } else {
            Err(QuantizeError::InvalidColorCount(value))
        }
    }
}

impl TryFrom<u16> for PaletteSize {
    type Error = QuantizeError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        u32::from(value).try_into()
    }
}

impl TryFrom<u8> for PaletteSize {
    type Error = QuantizeError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        u32::from(value).try_into()
    }
}

impl Display for PaletteSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.into_inner())
    }
}

/// The sampling stride used when building the color histogram.
///
/// A quality of `1` examines every pixel. A quality of `q > 1` examines only every `q`-th pixel,
/// which is faster but may miss colors. This is a new type wrapper around a nonzero `u32`.
///
/// # Examples
/// ```
/// # use medcut::{Quality, QuantizeError};
/// # fn main() -> Result<(), QuantizeError> {
/// let quality = Quality::try_from(10)?;
/// assert_eq!(quality.into_inner(), 10);
/// assert_eq!(Quality::EXHAUSTIVE.into_inner(), 1);
/// assert!(Quality::try_from(0).is_err());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Quality(NonZeroU32);

impl Quality {
    /// Examine every pixel.
    pub const EXHAUSTIVE: Self = Self(NonZeroU32::MIN);

    /// Gets the inner `u32` value.
    #[must_use]
    pub const fn into_inner(self) -> u32 {
        self.0.get()
    }

    /// The sampling stride as a `usize` for use with `step_by`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub(crate) const fn stride(self) -> usize {
        self.0.get() as usize
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(NonZeroU32::MIN.saturating_add(9))
    }
}

impl From<NonZeroU32> for Quality {
    fn from(value: NonZeroU32) -> Self {
        Self(value)
    }
}

impl TryFrom<u32> for Quality {
    type Error = QuantizeError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        NonZeroU32::new(value)
            .map(Self)
            .ok_or(QuantizeError::InvalidQuality(value))
    }
}

impl Display for Quality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.into_inner())
    }
}

/// The output struct returned by quantization functions.
///
/// It contains the color `palette` for the image, alongside `counts` which has
/// the number of sampled pixels that fell into the box of each palette color.
/// Both are ordered by descending count, so the first color is the dominant one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuantizeOutput<Color> {
    /// The computed color palette that is representative of the colors in the image.
    ///
    /// The colors in the palette are not guaranteed to be unique.
    pub palette: Vec<Color>,
    /// The number of sampled pixels that were assigned to each color in `palette`.
    ///
    /// The sum of the counts is the number of pixels that survived filtering and sampling.
    pub counts: Vec<u32>,
}
