//! Modified median cut quantization (MMCQ).
//!
//! Starting from the bounding box of all populated histogram keys, this method repeatedly splits
//! a box along its widest axis near the median of its population.
//! Splitting happens in two phases:
//! 1. The most populated box is split until the number of boxes reaches
//!    [`FRACTION_BY_POPULATION`] of the palette size.
//! 2. The box with the greatest product of population and volume is split
//!    until the palette size is reached. This gives palette entries to colors
//!    that are rare but far away from the rest.
//!
//! The final boxes are ordered by descending population,
//! and the average color of each box becomes a palette color.
//!
//! Unlike Color Thief, both halves of a split are shrunk to the keys they actually contain.
//! This keeps every box nonempty, but it also changes box volumes and cut positions,
//! so palettes can differ slightly from Color Thief's for the same image.

// Based on the modified median cut quantization used by Color Thief
// (Lokesh Dhakar, https://github.com/lokesh/color-thief) which in turn is
// adapted from Nick Rabinowitz's quantize.js (https://gist.github.com/nrabinowitz/1104622).

use crate::{
    histogram::{quantize, Histogram},
    ColorComponents, ColorSlice, PaletteSize, QuantizeOutput, VBox,
};
use palette::{cast, Srgb};
use std::cmp::Reverse;

/// The fraction of the palette that is filled by splitting boxes by population alone.
///
/// The remaining boxes are split by population times volume.
/// The value was chosen empirically and can be tuned through
/// [`PalettePipeline::population_fraction`](crate::PalettePipeline::population_fraction).
pub const FRACTION_BY_POPULATION: f64 = 0.75;

/// The maximum number of splits attempted in each phase before giving up.
///
/// This is only a safeguard: every splittable box does split, and a phase never needs
/// more than [`MAX_COLORS`](crate::MAX_COLORS) splits.
pub const MAX_ITERATIONS: u32 = 1000;

/// The ordering used to pick the next box to split.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Priority {
    /// Split the most populated box first.
    Population,
    /// Split the box with the greatest population times volume first.
    PopulationVolume,
}

impl Priority {
    /// Returns the sort key of a box under this priority.
    fn key(self, vbox: &VBox) -> u64 {
        let population = u64::from(vbox.population());
        match self {
            Priority::Population => population,
            Priority::PopulationVolume => population * u64::from(vbox.volume()),
        }
    }
}

/// A box in the working list of the splitter.
#[derive(Debug, Clone, Copy)]
struct Entry {
    /// The box itself.
    vbox: VBox,
    /// The order in which the box was created, used to break ties.
    seq: u32,
    /// Whether the box failed to split and should not be tried again.
    retired: bool,
}

impl Entry {
    /// Whether or not the box can still be split.
    fn splittable(&self) -> bool {
        !self.retired && !self.vbox.is_single_key()
    }
}

/// The state of the median cut splitter.
struct MedianCut<'a> {
    /// The histogram the boxes refer to.
    histogram: &'a Histogram,
    /// The current boxes, in creation order.
    boxes: Vec<Entry>,
    /// The sequence number for the next created box.
    next_seq: u32,
}

impl<'a> MedianCut<'a> {
    /// Creates a new splitter with the bounding box of the histogram as the only box.
    fn new(histogram: &'a Histogram, capacity: usize) -> Self {
        let mut boxes = Vec::with_capacity(capacity);
        boxes.extend(VBox::bounding(histogram).map(|vbox| Entry { vbox, seq: 0, retired: false }));
        Self { histogram, boxes, next_seq: 1 }
    }

    /// Returns the index of the box to split next, if any box can be split.
    ///
    /// Ties are broken in favor of the box created first.
    fn next_to_split(&self, priority: Priority) -> Option<usize> {
        self.boxes
            .iter()
            .enumerate()
            .filter(|(_, entry)| entry.splittable())
            .max_by_key(|(_, entry)| (priority.key(&entry.vbox), Reverse(entry.seq)))
            .map(|(i, _)| i)
    }

    /// Adds a new box to the end of the working list.
    fn push(&mut self, vbox: VBox) {
        self.boxes.push(Entry { vbox, seq: self.next_seq, retired: false });
        self.next_seq += 1;
    }

    /// Splits boxes in the given priority order until there are `target` boxes,
    /// no box can be split further, or [`MAX_ITERATIONS`] is reached.
    #[allow(clippy::use_debug)]
    fn split_until(&mut self, target: usize, priority: Priority) {
        let mut iterations = 0;
        while self.boxes.len() < target {
            if iterations == MAX_ITERATIONS {
                log::debug!("{priority:?}: gave up after {MAX_ITERATIONS} iterations");
                break;
            }
            iterations += 1;

            let Some(i) = self.next_to_split(priority) else {
                log::debug!("{priority:?}: no box left to split at {} boxes", self.boxes.len());
                break;
            };

            if let Some((lower, upper)) = median_cut(self.histogram, &self.boxes[i].vbox) {
                log::trace!(
                    "split {:?}..={:?} ({} px) at {:?}/{:?}",
                    self.boxes[i].vbox.min(),
                    self.boxes[i].vbox.max(),
                    self.boxes[i].vbox.population(),
                    lower.max(),
                    upper.min(),
                );
                self.boxes.remove(i);
                self.push(lower);
                self.push(upper);
            } else {
                self.boxes[i].retired = true;
            }
        }
    }

    /// Returns the boxes ordered by descending population,
    /// then descending volume, then creation order.
    fn into_sorted_boxes(self) -> Vec<VBox> {
        let mut boxes = self.boxes;
        boxes.sort_by_key(|entry| {
            (
                Reverse(entry.vbox.population()),
                Reverse(entry.vbox.volume()),
                entry.seq,
            )
        });
        boxes.into_iter().map(|entry| entry.vbox).collect()
    }
}

/// Splits the box along its widest axis near the median of its population.
///
/// The cut is placed on the far side of the median slice, halfway into the longer part of the box.
/// Both returned boxes are nonempty and shrunk to their populated keys.
/// Returns `None` if the box spans a single key.
fn median_cut(histogram: &Histogram, vbox: &VBox) -> Option<(VBox, VBox)> {
    if vbox.is_single_key() {
        return None;
    }

    let axis = vbox.widest_axis();
    let lo = vbox.min()[axis];
    let hi = vbox.max()[axis];

    let mut total = 0;
    let partial_sums = (lo..=hi)
        .map(|value| {
            total += vbox.slice_population(histogram, axis, value);
            total
        })
        .collect::<Vec<_>>();

    let median = partial_sums.iter().position(|&sum| sum > total / 2)?;

    let (lo, hi) = (i32::from(lo), i32::from(hi));
    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    let i = lo + median as i32;
    let left = i - lo;
    let right = hi - i;

    let cut = if left <= right {
        (i + right / 2).min(hi - 1)
    } else {
        (i - 1 - (left + 1) / 2).max(lo)
    };

    // boxes are shrunk, so the `lo` and `hi` slices are populated and both sides are nonempty
    let cut = u8::try_from(cut.clamp(lo, hi - 1)).ok()?;

    let mut lower_max = vbox.max();
    lower_max[axis] = cut;
    let mut upper_min = vbox.min();
    upper_min[axis] = cut + 1;

    Some((
        VBox::shrunk(vbox.min(), lower_max, histogram),
        VBox::shrunk(upper_min, vbox.max(), histogram),
    ))
}

/// The final boxes of the median cut along with their palette colors.
///
/// Boxes, colors, and counts are all in palette order, i.e., by descending population.
/// A [`ColorMap`] always has at least one color.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorMap {
    /// The final boxes.
    boxes: Vec<VBox>,
    /// The average color of each box.
    palette: Vec<Srgb<u8>>,
}

impl ColorMap {
    /// Returns the palette colors.
    #[must_use]
    pub fn palette(&self) -> &[Srgb<u8>] {
        &self.palette
    }

    /// Returns the final boxes.
    #[must_use]
    pub fn boxes(&self) -> &[VBox] {
        &self.boxes
    }

    /// Returns the population of each box.
    pub fn counts(&self) -> impl Iterator<Item = u32> + '_ {
        self.boxes.iter().map(VBox::population)
    }

    /// Returns the number of palette colors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.palette.len()
    }

    /// Whether or not the palette is empty. This is never the case for a [`ColorMap`] built from a [`Histogram`].
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.palette.is_empty()
    }

    /// Returns the palette color closest to the given color by squared euclidean distance.
    ///
    /// Ties go to the color that comes first in the palette.
    #[must_use]
    pub fn nearest(&self, color: Srgb<u8>) -> Srgb<u8> {
        let [r, g, b] = cast::into_array(color).map(i32::from);

        // there is always at least one color, since the histogram has at least one key
        #[allow(clippy::expect_used)]
        self.palette
            .iter()
            .copied()
            .min_by_key(|&candidate| {
                let [cr, cg, cb] = cast::into_array(candidate).map(i32::from);
                (r - cr).pow(2) + (g - cg).pow(2) + (b - cb).pow(2)
            })
            .expect("at least one palette color")
    }

    /// Maps the given color onto the palette.
    ///
    /// If the quantized color falls into one of the boxes, that box's color is returned.
    /// Otherwise, the [nearest](ColorMap::nearest) palette color is returned.
    #[must_use]
    pub fn map(&self, color: Srgb<u8>) -> Srgb<u8> {
        let key = quantize(cast::into_array(color));
        self.boxes
            .iter()
            .position(|vbox| vbox.contains(key))
            .map_or_else(|| self.nearest(color), |i| self.palette[i])
    }

    /// Maps every pixel onto the palette, ignoring alpha.
    pub fn remap<Color>(&self, pixels: ColorSlice<Color>) -> Vec<Srgb<u8>>
    where
        Color: ColorComponents<u8, 4>,
    {
        cast::into_array_slice(pixels.as_ref())
            .iter()
            .map(|&[r, g, b, _]| self.map(Srgb::new(r, g, b)))
            .collect()
    }
}

impl From<ColorMap> for QuantizeOutput<Srgb<u8>> {
    fn from(map: ColorMap) -> Self {
        let counts = map.counts().collect();
        QuantizeOutput { palette: map.palette, counts }
    }
}

/// Returns the number of boxes to create in the population phase.
fn population_target(palette_size: PaletteSize, population_fraction: f64) -> usize {
    let k = usize::from(palette_size);
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
    let target = (population_fraction.clamp(0.0, 1.0) * k as f64).ceil() as usize;
    target.clamp(1, k)
}

/// Computes a [`ColorMap`] with at most `palette_size` colors from the given `histogram`.
///
/// `population_fraction` is the fraction of the palette filled by splitting by population alone
/// (see [`FRACTION_BY_POPULATION`]). It is clamped to `0.0..=1.0`.
#[must_use]
pub fn color_map(
    histogram: &Histogram,
    palette_size: PaletteSize,
    population_fraction: f64,
) -> ColorMap {
    let k = usize::from(palette_size);
    let mut splitter = MedianCut::new(histogram, k);

    splitter.split_until(population_target(palette_size, population_fraction), Priority::Population);
    log::debug!("population phase: {} boxes", splitter.boxes.len());

    splitter.split_until(k, Priority::PopulationVolume);
    log::debug!("population-volume phase: {} boxes", splitter.boxes.len());

    let mut boxes = splitter.into_sorted_boxes();
    boxes.truncate(k);
    let palette = boxes.iter().map(VBox::average_color).collect();

    ColorMap { boxes, palette }
}

/// Computes a color palette with at most `palette_size` entries from the given `histogram`,
/// using the default [`FRACTION_BY_POPULATION`].
///
/// The palette is ordered by descending count.
#[must_use]
pub fn palette(histogram: &Histogram, palette_size: PaletteSize) -> QuantizeOutput<Srgb<u8>> {
    color_map(histogram, palette_size, FRACTION_BY_POPULATION).into()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::{tests::*, PixelFilter, Quality};
    use palette::Srgba;

    fn histogram(pixels: &[Srgba<u8>]) -> Histogram {
        Histogram::new(
            ColorSlice::try_from(pixels).unwrap(),
            Quality::EXHAUSTIVE,
            PixelFilter::new(),
        )
        .unwrap()
    }

    fn size(k: u16) -> PaletteSize {
        PaletteSize::try_from(k).unwrap()
    }

    /// Asserts that the boxes are disjoint and together hold every key of the histogram.
    fn assert_partition(map: &ColorMap, hist: &Histogram) {
        for key in hist.keys() {
            assert_eq!(map.boxes().iter().filter(|vbox| vbox.contains(key)).count(), 1);
        }
        assert_eq!(map.counts().sum::<u32>(), hist.total_count());
    }

    #[test]
    fn single_color() {
        let hist = histogram(&solid(Srgba::new(255, 0, 0, 255), 100 * 100));
        let output = palette(&hist, size(5));

        assert_eq!(output.palette, vec![Srgb::new(252, 4, 4)]);
        assert_eq!(output.counts, vec![10000]);
    }

    #[test]
    fn checkerboard_two_colors() {
        let red = Srgba::new(255, 0, 0, 255);
        let blue = Srgba::new(0, 0, 255, 255);
        let hist = histogram(&checkerboard(red, blue, 100, 100));
        let output = palette(&hist, size(2));

        assert_eq!(output.palette.len(), 2);
        assert_eq!(output.counts, vec![5000, 5000]);
        // equal population and volume, so the box created first (lower red values) comes first
        assert_eq!(output.palette, vec![Srgb::new(4, 4, 252), Srgb::new(252, 4, 4)]);
    }

    #[test]
    fn median_cut_splits_on_far_side_of_median() {
        // red keys 0 (x1), 1 (x1), 2 (x5), 10 (x1)
        let mut pixels = vec![Srgba::new(0, 0, 0, 255), Srgba::new(8, 0, 0, 255)];
        pixels.extend(solid(Srgba::new(16, 0, 0, 255), 5));
        pixels.push(Srgba::new(80, 0, 0, 255));
        let hist = histogram(&pixels);
        let vbox = VBox::bounding(&hist).unwrap();

        let (lower, upper) = median_cut(&hist, &vbox).unwrap();
        // median slice is 2, the right side is longer, so the cut is at 2 + 8 / 2 = 6
        // and the upper box shrinks to key 10
        assert_eq!(lower.min(), [0, 0, 0]);
        assert_eq!(lower.max(), [2, 0, 0]);
        assert_eq!(upper.min(), [10, 0, 0]);
        assert_eq!(upper.max(), [10, 0, 0]);
        assert_eq!(lower.population() + upper.population(), vbox.population());
    }

    #[test]
    fn median_cut_never_creates_empty_boxes() {
        let pixels = test_data_1024();
        let hist = histogram(&pixels);
        let mut queue = vec![VBox::bounding(&hist).unwrap()];

        while let Some(vbox) = queue.pop() {
            if let Some((lower, upper)) = median_cut(&hist, &vbox) {
                assert!(lower.population() > 0);
                assert!(upper.population() > 0);
                assert_eq!(lower.population() + upper.population(), vbox.population());
                queue.push(lower);
                queue.push(upper);
            } else {
                assert!(vbox.is_single_key());
            }
        }
    }

    #[test]
    fn not_enough_colors() {
        let colors = [
            Srgba::new(0, 0, 0, 255),
            Srgba::new(255, 255, 255, 255),
            Srgba::new(128, 64, 32, 255),
        ];
        let hist = histogram(&colors);
        let map = color_map(&hist, PaletteSize::MAX, FRACTION_BY_POPULATION);

        assert_eq!(map.len(), 3);
        assert!(map.boxes().iter().all(VBox::is_single_key));
        assert_partition(&map, &hist);
    }

    #[test]
    fn palette_size_reached() {
        let pixels = test_data_1024();
        let hist = histogram(&pixels);
        assert!(hist.num_keys() >= 256);

        for k in [1, 2, 5, 10, 16, 64, 256] {
            let map = color_map(&hist, size(k), FRACTION_BY_POPULATION);
            assert_eq!(map.len(), usize::from(k));
            assert_partition(&map, &hist);
        }
    }

    #[test]
    fn ordered_by_descending_count() {
        let pixels = test_data_1024();
        let hist = histogram(&pixels);
        let output = palette(&hist, size(16));

        for i in 1..output.counts.len() {
            assert!(output.counts[i - 1] >= output.counts[i]);
        }
    }

    #[test]
    fn deterministic() {
        let pixels = test_data_1024();
        let hist = histogram(&pixels);
        let a = color_map(&hist, size(12), FRACTION_BY_POPULATION);
        let b = color_map(&hist.clone(), size(12), FRACTION_BY_POPULATION);
        assert_eq!(a, b);
    }

    #[test]
    fn population_fraction_extremes() {
        let pixels = test_data_1024();
        let hist = histogram(&pixels);

        for fraction in [-1.0, 0.0, 0.5, 1.0, 2.0] {
            let map = color_map(&hist, size(8), fraction);
            assert_eq!(map.len(), 8);
            assert_partition(&map, &hist);
        }

        assert_eq!(population_target(size(10), FRACTION_BY_POPULATION), 8);
        assert_eq!(population_target(size(1), 0.0), 1);
        assert_eq!(population_target(size(4), 2.0), 4);
    }

    #[test]
    fn volume_phase_splits_sparse_colors() {
        // a large cluster over four neighboring keys
        let mut pixels = Vec::new();
        for color in [[80, 80, 80], [80, 80, 88], [80, 88, 80], [88, 80, 80]] {
            let [r, g, b] = color;
            pixels.extend(solid(Srgba::new(r, g, b, 255), 250));
        }
        // a few pixels spread over a large, bright region
        for color in [[192, 192, 192], [248, 248, 248], [192, 248, 192], [248, 192, 248]] {
            let [r, g, b] = color;
            pixels.extend(solid(Srgba::new(r, g, b, 255), 2));
        }
        let hist = histogram(&pixels);

        let bright = |map: &ColorMap| map.palette().iter().filter(|c| c.red >= 128).count();

        // population alone keeps refining the large cluster
        let map = color_map(&hist, size(5), 1.0);
        assert_eq!(map.len(), 5);
        assert_eq!(bright(&map), 1);
        assert_eq!(map.counts().collect::<Vec<_>>(), vec![250, 250, 250, 250, 8]);

        // the last split goes to the sparse region instead
        let map = color_map(&hist, size(5), FRACTION_BY_POPULATION);
        assert_eq!(map.len(), 5);
        assert_eq!(bright(&map), 2);
        assert_eq!(map.counts().collect::<Vec<_>>(), vec![500, 250, 250, 4, 4]);
        assert_partition(&map, &hist);
    }

    #[test]
    fn map_onto_palette() {
        let red = Srgba::new(255, 0, 0, 255);
        let blue = Srgba::new(0, 0, 255, 255);
        let hist = histogram(&checkerboard(red, blue, 4, 4));
        let map = color_map(&hist, size(2), FRACTION_BY_POPULATION);

        // inside the red box
        assert_eq!(map.map(Srgb::new(250, 1, 2)), Srgb::new(252, 4, 4));
        // outside of every box
        assert_eq!(map.map(Srgb::new(200, 10, 60)), Srgb::new(252, 4, 4));
        assert_eq!(map.map(Srgb::new(10, 10, 200)), Srgb::new(4, 4, 252));
        assert_eq!(map.nearest(Srgb::new(0, 0, 0)), Srgb::new(4, 4, 252));

        let pixels = [red, blue, Srgba::new(0, 0, 250, 0)];
        let remapped = map.remap(ColorSlice::try_from(pixels.as_slice()).unwrap());
        assert_eq!(
            remapped,
            vec![Srgb::new(252, 4, 4), Srgb::new(4, 4, 252), Srgb::new(4, 4, 252)]
        );
    }
}
