#![allow(dead_code)]

use std::{
    path::{Path, PathBuf},
    sync::OnceLock,
};

use image::RgbaImage;
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoroshiro128PlusPlus;

pub fn load_images(images: &[PathBuf]) -> Vec<(String, RgbaImage)> {
    images
        .iter()
        .map(|path| {
            image::open(path).map(|image| {
                (
                    path.file_name().unwrap().to_owned().into_string().unwrap(),
                    image.into_rgba8(),
                )
            })
        })
        .collect::<Result<_, _>>()
        .expect("loaded each image")
}

pub fn load_image_dir(dir: impl AsRef<Path>) -> Vec<(String, RgbaImage)> {
    let mut paths = std::fs::read_dir(dir)
        .expect("read img directory")
        .collect::<Result<Vec<_>, _>>()
        .expect("read each file")
        .iter()
        .map(std::fs::DirEntry::path)
        .collect::<Vec<_>>();

    paths.sort();

    load_images(&paths)
}

/// A smooth gradient over red and green with a fixed blue, the worst case for few colors.
pub fn gradient(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_fn(width, height, |x, y| {
        let r = (x * 255 / width.max(1)) as u8;
        let g = (y * 255 / height.max(1)) as u8;
        image::Rgba([r, g, 96, 255])
    })
}

/// Uniform random colors where about a quarter of the pixels are transparent.
pub fn noise(width: u32, height: u32, seed: u64) -> RgbaImage {
    let mut rng = Xoroshiro128PlusPlus::seed_from_u64(seed);
    RgbaImage::from_fn(width, height, |_, _| {
        let [r, g, b]: [u8; 3] = rng.gen();
        let a = if rng.gen_bool(0.25) { 0 } else { u8::MAX };
        image::Rgba([r, g, b, a])
    })
}

/// A few large flat regions with a little noise, like a photo of a simple scene.
pub fn blobs(width: u32, height: u32, seed: u64) -> RgbaImage {
    let mut rng = Xoroshiro128PlusPlus::seed_from_u64(seed);
    let centers: Vec<([u8; 3], u32, u32)> = (0..6)
        .map(|_| (rng.gen(), rng.gen_range(0..width), rng.gen_range(0..height)))
        .collect();

    RgbaImage::from_fn(width, height, |x, y| {
        let &(color, _, _) = centers
            .iter()
            .min_by_key(|&&(_, cx, cy)| x.abs_diff(cx).pow(2) + y.abs_diff(cy).pow(2))
            .unwrap();

        let jitter = rng.gen_range(0..8);
        let [r, g, b] = color.map(|c| c.saturating_add(jitter));
        image::Rgba([r, g, b, 255])
    })
}

pub const CQ100_DIR: &str = "img/CQ100/img";

pub fn load_image_dir_relative_to_root(dir: impl AsRef<Path>) -> Vec<(String, RgbaImage)> {
    // assume current exe path is something like: target/build/deps/current_exe
    let exe = std::env::current_exe().unwrap();
    let root = exe
        .parent()
        .and_then(Path::parent)
        .and_then(Path::parent)
        .and_then(Path::parent)
        .unwrap();

    load_image_dir(root.join(dir.as_ref()))
}

static BENCH_IMAGES: OnceLock<Vec<(String, RgbaImage)>> = OnceLock::new();

/// The synthetic images, plus the CQ100 images if they have been downloaded.
pub fn load_bench_images() -> Vec<(String, RgbaImage)> {
    let mut images = vec![
        ("gradient_1024".to_owned(), gradient(1024, 1024)),
        ("noise_1024".to_owned(), noise(1024, 1024, 0)),
        ("blobs_2048".to_owned(), blobs(2048, 2048, 0)),
    ];

    let exe = std::env::current_exe().unwrap();
    let cq100 = exe.ancestors().nth(4).map(|root| root.join(CQ100_DIR));
    if cq100.is_some_and(|dir| dir.is_dir()) {
        images.extend(load_image_dir_relative_to_root(CQ100_DIR));
    }

    images
}

pub fn bench_images() -> &'static [(String, RgbaImage)] {
    BENCH_IMAGES.get_or_init(load_bench_images)
}
