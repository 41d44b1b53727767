//! A library for extracting a color palette or the dominant color from an image.
//!
//! `medcut` uses modified median cut quantization: the opaque pixels of an image are counted in a
//! histogram of colors reduced to 5 bits per component, and the populated color space is then
//! recursively split into boxes. The average color of each box becomes a palette color,
//! and the palette is ordered from the most to the least populated box.
//!
//! # Features
//! To reduce dependencies and compile times, `medcut` has several `cargo` features
//! that can be turned off or on:
//! - `pipelines`: exposes the [`PalettePipeline`] builder struct and the
//!   [`build_palette`] and [`dominant_color`] functions (more details below).
//! - `threads`: exposes parallel versions of the histogram builder via [`rayon`].
//! - `image`: enables integration with the [`image`] crate.
//!
//! # High-Level API
//! The simplest way to get a palette is [`build_palette`], which takes a slice of RGBA pixels,
//! the maximum number of colors, and the quality (sampling stride):
//! ```
//! # use medcut::{build_palette, dominant_color};
//! # use palette::{Srgb, Srgba};
//! # fn main() -> Result<(), medcut::QuantizeError> {
//! let mut pixels = vec![Srgba::new(200, 30, 30, 255); 300];
//! pixels.extend(vec![Srgba::new(30, 30, 200, 255); 100]);
//! pixels.extend(vec![Srgba::new(0, 0, 0, 0); 1000]); // transparent, will be skipped
//!
//! let palette = build_palette(&pixels, 5, 1)?;
//! assert_eq!(palette, vec![Srgb::new(204, 28, 28), Srgb::new(28, 28, 204)]);
//! assert_eq!(dominant_color(&pixels, 1)?, palette[0]);
//! # Ok(())
//! # }
//! ```
//!
//! For more options, see [`PalettePipeline`]:
//! ```no_run
//! # use medcut::{PalettePipeline, PaletteSize, Quality};
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let img = image::open("some image")?.into_rgba8();
//!
//! let output = PalettePipeline::try_from(&img)?
//!     .palette_size(PaletteSize::try_from(16u16)?) // set the max number of colors in the palette
//!     .quality(Quality::EXHAUSTIVE) // look at every pixel
//!     .ignore_white(true) // skip a white background
//!     .quantize_par()?; // build the histogram in parallel
//!
//! for (color, count) in output.palette.iter().zip(&output.counts) {
//!     println!("{color:?}: {count} pixels");
//! }
//! # Ok(())
//! # }
//! ```
//!
//! The lower level building blocks are [`Histogram`], [`VBox`], and the [`mmcq`](crate::mmcq) module.
//!
//! Note that some of the options and functions above require certain features to be enabled.

#![deny(unsafe_code, unsafe_op_in_unsafe_fn)]
#![warn(
    clippy::pedantic,
    clippy::cargo,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::todo,
    clippy::unimplemented,
    clippy::unwrap_used,
    clippy::unwrap_in_result,
    clippy::expect_used,
    clippy::unneeded_field_pattern,
    clippy::rest_pat_in_fully_bound_structs,
    clippy::unnecessary_self_imports,
    clippy::str_to_string,
    clippy::string_to_string,
    clippy::string_slice,
    missing_docs,
    clippy::missing_docs_in_private_items,
    rustdoc::all,
    clippy::float_cmp_const,
    clippy::lossy_float_literal
)]
#![allow(
    clippy::doc_markdown,
    clippy::module_name_repetitions,
    clippy::many_single_char_names,
    clippy::missing_panics_doc,
    clippy::unreadable_literal,
    clippy::wildcard_imports
)]

mod error;
mod histogram;
mod traits;
mod types;
mod vbox;

#[cfg(feature = "pipelines")]
mod api;

pub mod mmcq;

pub use error::QuantizeError;
pub use histogram::{
    quantize, Histogram, Key, PixelFilter, ALPHA_THRESHOLD, SIGNIFICANT_BITS, WHITE_THRESHOLD,
};
pub use traits::*;
pub use types::*;
pub use vbox::{VBox, BIN_CENTER_OFFSET, BIN_WIDTH};

#[cfg(feature = "pipelines")]
pub use api::*;

/// The maximum supported image size in number of pixels is `u32::MAX`.
pub const MAX_PIXELS: u32 = u32::MAX;

/// The maximum supported number of palette colors is `256`.
pub const MAX_COLORS: u16 = u8::MAX as u16 + 1;

/// The palette size used to find the dominant color.
pub const DOMINANT_PALETTE_SIZE: PaletteSize = PaletteSize::new_unchecked(5);

#[cfg(test)]
pub(crate) mod tests {
    use crate::ALPHA_THRESHOLD;
    use palette::Srgba;
    use rand::{Rng, SeedableRng};
    use rand_xoshiro::Xoroshiro128PlusPlus;

    /// Random pixels where about a quarter are transparent.
    pub fn test_data_1024() -> Vec<Srgba<u8>> {
        let mut rng = Xoroshiro128PlusPlus::seed_from_u64(0);
        (0..1024)
            .map(|_| {
                let [r, g, b]: [u8; 3] = rng.gen();
                let alpha = if rng.gen_bool(0.25) {
                    rng.gen_range(0..ALPHA_THRESHOLD)
                } else {
                    u8::MAX
                };
                Srgba::new(r, g, b, alpha)
            })
            .collect()
    }

    /// `len` pixels of the same color.
    pub fn solid(color: Srgba<u8>, len: usize) -> Vec<Srgba<u8>> {
        vec![color; len]
    }

    /// A `width` by `height` image alternating between two colors.
    pub fn checkerboard(a: Srgba<u8>, b: Srgba<u8>, width: usize, height: usize) -> Vec<Srgba<u8>> {
        (0..height)
            .flat_map(|y| (0..width).map(move |x| if (x + y) % 2 == 0 { a } else { b }))
            .collect()
    }
}
