//! Boxes over the quantized color space and their statistics.

use crate::histogram::{Histogram, Key, SHIFT};
use palette::{cast, Srgb};
use std::array;

/// The width of a histogram bin in 8-bit component units (`8` for 5 significant bits).
pub const BIN_WIDTH: u32 = 1 << SHIFT;

/// The offset (in bins) added to the mean key of a box before scaling it back to 8 bits.
///
/// A key stands for the whole bin of colors `key * BIN_WIDTH..(key + 1) * BIN_WIDTH`,
/// so an offset of `0.5` reports the bin center instead of its darkest edge.
/// This biases every average color half a bin (4 units) toward the brighter end;
/// e.g., pure red `(255, 0, 0)` comes back as `(252, 4, 4)`.
/// The value was chosen empirically and can be tuned.
pub const BIN_CENTER_OFFSET: f64 = 0.5;

/// An axis-aligned box in the quantized color space.
///
/// Both `min` and `max` are inclusive. The population and weighted sums
/// of the histogram keys inside the box are computed once on creation.
/// Boxes are never modified; splitting a box creates two new ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VBox {
    /// The lower key bounds (inclusive).
    min: Key,
    /// The upper key bounds (inclusive).
    max: Key,
    /// The number of counted pixels inside the box.
    population: u32,
    /// The per-component sum of the keys inside the box, weighted by their counts.
    sums: [u64; 3],
}

impl VBox {
    /// Returns the smallest box containing every key of the histogram,
    /// or `None` if the histogram has no keys.
    #[must_use]
    pub fn bounding(histogram: &Histogram) -> Option<Self> {
        let mut keys = histogram.keys();
        let first = keys.next()?;
        let (min, max) = keys.fold((first, first), |(min, max), key| {
            (
                array::from_fn(|c| min[c].min(key[c])),
                array::from_fn(|c| max[c].max(key[c])),
            )
        });

        Some(Self::new(min, max, histogram))
    }

    /// Creates a new box with the given bounds, computing its statistics from the histogram.
    pub(crate) fn new(min: Key, max: Key, histogram: &Histogram) -> Self {
        let mut population = 0;
        let mut sums = [0u64; 3];
        for_each_key(min, max, |key| {
            let n = histogram.count(key);
            population += n;
            for (sum, k) in sums.iter_mut().zip(key) {
                *sum += u64::from(n) * u64::from(k);
            }
        });

        Self { min, max, population, sums }
    }

    /// Creates the smallest box that contains all populated keys within the given bounds.
    ///
    /// If there are no populated keys, the bounds are kept as is.
    pub(crate) fn shrunk(min: Key, max: Key, histogram: &Histogram) -> Self {
        let mut lower = max;
        let mut upper = min;
        let mut populated = false;
        for_each_key(min, max, |key| {
            if histogram.count(key) > 0 {
                populated = true;
                for c in 0..3 {
                    lower[c] = lower[c].min(key[c]);
                    upper[c] = upper[c].max(key[c]);
                }
            }
        });

        if populated {
            Self::new(lower, upper, histogram)
        } else {
            Self::new(min, max, histogram)
        }
    }

    /// The lower key bounds (inclusive).
    #[must_use]
    pub fn min(&self) -> Key {
        self.min
    }

    /// The upper key bounds (inclusive).
    #[must_use]
    pub fn max(&self) -> Key {
        self.max
    }

    /// The number of counted pixels inside the box.
    #[must_use]
    pub fn population(&self) -> u32 {
        self.population
    }

    /// The number of keys spanned by the box.
    #[must_use]
    pub fn volume(&self) -> u32 {
        self.extents().iter().product()
    }

    /// The number of keys spanned along each axis.
    fn extents(&self) -> [u32; 3] {
        array::from_fn(|c| u32::from(self.max[c] - self.min[c]) + 1)
    }

    /// Returns the axis with the greatest extent. Ties go to red, then green, then blue.
    #[must_use]
    pub fn widest_axis(&self) -> usize {
        let extents = self.extents();
        let mut axis = 0;
        for c in 1..3 {
            if extents[c] > extents[axis] {
                axis = c;
            }
        }
        axis
    }

    /// Whether or not the key lies within the box.
    #[must_use]
    pub fn contains(&self, key: Key) -> bool {
        (0..3).all(|c| self.min[c] <= key[c] && key[c] <= self.max[c])
    }

    /// Whether or not the box spans a single key, in which case it cannot be split.
    #[must_use]
    pub fn is_single_key(&self) -> bool {
        self.min == self.max
    }

    /// Returns the population of the plane of the box where `axis` is fixed to `value`.
    pub(crate) fn slice_population(&self, histogram: &Histogram, axis: usize, value: u8) -> u64 {
        let mut min = self.min;
        let mut max = self.max;
        min[axis] = value;
        max[axis] = value;

        let mut population = 0;
        for_each_key(min, max, |key| population += u64::from(histogram.count(key)));
        population
    }

    /// Returns the population-weighted average color of the box.
    ///
    /// See [`BIN_CENTER_OFFSET`] for how keys are mapped back to 8-bit components.
    /// An empty box returns the color at its center.
    #[must_use]
    pub fn average_color(&self) -> Srgb<u8> {
        let width = f64::from(BIN_WIDTH);
        let components = array::from_fn(|c| {
            let value = if self.population > 0 {
                #[allow(clippy::cast_precision_loss)]
                let mean = self.sums[c] as f64 / f64::from(self.population);
                (mean + BIN_CENTER_OFFSET) * width
            } else {
                f64::from(u32::from(self.min[c]) + u32::from(self.max[c]) + 1) / 2.0 * width
            };

            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            {
                value.min(f64::from(u8::MAX)) as u8
            }
        });

        cast::from_array(components)
    }
}

/// Calls `f` for every key within the inclusive bounds.
#[inline]
fn for_each_key(min: Key, max: Key, mut f: impl FnMut(Key)) {
    for r in min[0]..=max[0] {
        for g in min[1]..=max[1] {
            for b in min[2]..=max[2] {
                f([r, g, b]);
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::{tests::*, ColorSlice, PixelFilter, Quality};
    use palette::Srgba;

    fn histogram(pixels: &[Srgba<u8>]) -> Histogram {
        Histogram::new(
            ColorSlice::try_from(pixels).unwrap(),
            Quality::EXHAUSTIVE,
            PixelFilter::new(),
        )
        .unwrap()
    }

    #[test]
    fn bounding_box_is_minimal() {
        let hist = histogram(&[
            Srgba::new(16, 200, 40, 255),
            Srgba::new(80, 8, 41, 255),
            Srgba::new(255, 255, 255, 0),
        ]);
        let vbox = VBox::bounding(&hist).unwrap();

        assert_eq!(vbox.min(), [2, 1, 5]);
        assert_eq!(vbox.max(), [10, 25, 5]);
        assert_eq!(vbox.population(), 2);
        assert_eq!(vbox.volume(), 9 * 25);
        assert_eq!(vbox.widest_axis(), 1);
    }

    #[test]
    fn population_matches_histogram() {
        let pixels = test_data_1024();
        let hist = histogram(&pixels);
        let vbox = VBox::bounding(&hist).unwrap();
        assert_eq!(vbox.population(), hist.total_count());

        let sub = VBox::new([0; 3], [15; 3], &hist);
        let expected = hist
            .keys()
            .filter(|&key| sub.contains(key))
            .map(|key| hist.count(key))
            .sum::<u32>();
        assert_eq!(sub.population(), expected);
    }

    #[test]
    fn shrunk_keeps_every_key() {
        let pixels = test_data_1024();
        let hist = histogram(&pixels);
        let vbox = VBox::shrunk([4, 4, 4], [20, 20, 20], &hist);
        let loose = VBox::new([4, 4, 4], [20, 20, 20], &hist);

        assert_eq!(vbox.population(), loose.population());
        assert!(vbox.volume() <= loose.volume());
        for c in 0..3 {
            assert!(vbox.min()[c] >= 4 && vbox.max()[c] <= 20);
        }
    }

    #[test]
    fn average_color_of_single_key() {
        let hist = histogram(&vec![Srgba::new(255, 0, 0, 255); 10]);
        let vbox = VBox::bounding(&hist).unwrap();

        assert!(vbox.is_single_key());
        assert_eq!(vbox.average_color(), Srgb::new(252, 4, 4));
    }

    #[test]
    fn average_color_is_population_weighted() {
        let mut pixels = vec![Srgba::new(0, 0, 0, 255); 3];
        pixels.push(Srgba::new(64, 0, 0, 255));
        let hist = histogram(&pixels);
        let vbox = VBox::bounding(&hist).unwrap();

        // mean red key is (0 * 3 + 8) / 4 = 2
        assert_eq!(vbox.average_color(), Srgb::new(20, 4, 4));
    }

    #[test]
    fn average_color_of_empty_box() {
        let hist = histogram(&[Srgba::new(255, 255, 255, 255)]);
        let vbox = VBox::new([0; 3], [1; 3], &hist);

        assert_eq!(vbox.population(), 0);
        assert_eq!(vbox.average_color(), Srgb::new(8, 8, 8));
    }

    #[test]
    fn slice_populations_sum_to_population() {
        let pixels = test_data_1024();
        let hist = histogram(&pixels);
        let vbox = VBox::bounding(&hist).unwrap();

        for axis in 0..3 {
            let total = (vbox.min()[axis]..=vbox.max()[axis])
                .map(|v| vbox.slice_population(&hist, axis, v))
                .sum::<u64>();
            assert_eq!(total, u64::from(vbox.population()));
        }
    }
}
