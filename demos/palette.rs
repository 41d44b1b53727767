#![deny(unsafe_code, unsafe_op_in_unsafe_fn)]
#![warn(
    clippy::dbg_macro,
    clippy::todo,
    clippy::unimplemented,
    clippy::unneeded_field_pattern,
    clippy::rest_pat_in_fully_bound_structs,
    clippy::unnecessary_self_imports,
    clippy::str_to_string,
    clippy::string_to_string,
    clippy::string_slice
)]

use std::{error::Error, path::PathBuf};

use clap::Parser;
use medcut::{PalettePipeline, PaletteSize, Quality, QuantizeOutput, ALPHA_THRESHOLD};
use palette::Srgb;

#[derive(Parser)]
pub struct Options {
    /// The maximum number of palette colors.
    #[arg(short, long, default_value_t = PaletteSize::default(), value_parser = parse_palette_size)]
    k: PaletteSize,

    /// Examine only every n-th pixel.
    #[arg(short, long, default_value_t = Quality::default(), value_parser = parse_quality)]
    quality: Quality,

    /// Pixels with an alpha below this are skipped.
    #[arg(long, default_value_t = ALPHA_THRESHOLD)]
    alpha_threshold: u8,

    /// Skip near-white pixels.
    #[arg(long)]
    ignore_white: bool,

    /// Only print the dominant color.
    #[arg(long)]
    dominant: bool,

    /// The number of threads to build the histogram with, or 0 for the rayon default.
    #[arg(short, long, default_value_t = 1)]
    threads: u8,

    /// Print how long each step took.
    #[arg(long)]
    verbose: bool,

    input: PathBuf,
}

fn parse_palette_size(s: &str) -> Result<PaletteSize, String> {
    let value: u16 = s.parse().map_err(|e| format!("{e}"))?;
    value.try_into().map_err(|e| format!("{e}"))
}

fn parse_quality(s: &str) -> Result<Quality, String> {
    let value: u32 = s.parse().map_err(|e| format!("{e}"))?;
    value.try_into().map_err(|e| format!("{e}"))
}

fn hex(color: Srgb<u8>) -> String {
    format!("#{:02x}{:02x}{:02x}", color.red, color.green, color.blue)
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let Options {
        k,
        quality,
        alpha_threshold,
        ignore_white,
        dominant,
        threads,
        verbose,
        input,
    } = Options::parse();

    macro_rules! log {
        ($name: literal, $val: expr) => {
            if verbose {
                let time = std::time::Instant::now();
                let value = $val;
                println!("{} took {}ms", $name, time.elapsed().as_millis());
                value
            } else {
                $val
            }
        };
    }

    let image = log!("read image", image::open(input)?.into_rgba8());

    let pipeline = PalettePipeline::try_from(&image)?
        .palette_size(k)
        .quality(quality)
        .alpha_threshold(alpha_threshold)
        .ignore_white(ignore_white);

    let QuantizeOutput { palette, counts } = if dominant {
        let color = log!(
            "dominant color",
            match threads {
                1 => pipeline.dominant_color(),
                0 => pipeline.dominant_color_par(),
                t => rayon::ThreadPoolBuilder::new()
                    .num_threads(t.into())
                    .build()?
                    .install(|| pipeline.dominant_color_par()),
            }
        )?;
        QuantizeOutput { palette: vec![color], counts: Vec::new() }
    } else {
        log!(
            "palette",
            match threads {
                1 => pipeline.quantize(),
                0 => pipeline.quantize_par(),
                t => rayon::ThreadPoolBuilder::new()
                    .num_threads(t.into())
                    .build()?
                    .install(|| pipeline.quantize_par()),
            }
        )?
    };

    for (i, &color) in palette.iter().enumerate() {
        match counts.get(i) {
            Some(count) => println!("{} {count}", hex(color)),
            None => println!("{}", hex(color)),
        }
    }

    Ok(())
}
