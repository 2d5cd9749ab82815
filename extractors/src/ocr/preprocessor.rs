use image::imageops::{self, FilterType};
use image::{DynamicImage, GrayImage, Luma};
use shared_types::Binarization;

pub const DEFAULT_TARGET_HEIGHT: u32 = 1600;

/// Neighbourhood used by adaptive thresholding, in pixels.
pub const ADAPTIVE_BLOCK_SIZE: u32 = 15;
/// Subtracted from the local mean before comparing.
pub const ADAPTIVE_OFFSET: i16 = 8;

/// Receipt image cleanup ahead of text recognition.
#[derive(Debug, Clone)]
pub struct Preprocessor {
    target_height: u32,
}

impl Default for Preprocessor {
    fn default() -> Self {
        Self::new(DEFAULT_TARGET_HEIGHT)
    }
}

impl Preprocessor {
    pub fn new(target_height: u32) -> Self {
        Self {
            target_height: target_height.max(1),
        }
    }

    pub fn target_height(&self) -> u32 {
        self.target_height
    }

    /// Grayscale, resize to the target height, median denoise, then binarize.
    pub fn run(&self, image: &DynamicImage, binarization: Binarization) -> GrayImage {
        let gray = image.to_luma8();
        let resized = self.resize(gray);
        let denoised = median_filter_3x3(&resized);

        match binarization {
            Binarization::Otsu => {
                let threshold = otsu_threshold(&denoised);
                threshold_image(&denoised, threshold)
            }
            Binarization::Adaptive => {
                adaptive_threshold(&denoised, ADAPTIVE_BLOCK_SIZE, ADAPTIVE_OFFSET)
            }
        }
    }

    fn resize(&self, image: GrayImage) -> GrayImage {
        let (width, height) = image.dimensions();
        if height == self.target_height || width == 0 || height == 0 {
            return image;
        }

        let scale = self.target_height as f64 / height as f64;
        let new_width = ((width as f64 * scale).round() as u32).max(1);
        imageops::resize(&image, new_width, self.target_height, FilterType::CatmullRom)
    }
}

fn median_filter_3x3(image: &GrayImage) -> GrayImage {
    let (width, height) = image.dimensions();
    let mut output = GrayImage::new(width, height);
    let max_x = width as i64 - 1;
    let max_y = height as i64 - 1;
    let mut window = [0u8; 9];

    for y in 0..height {
        for x in 0..width {
            let mut n = 0;
            for dy in -1i64..=1 {
                for dx in -1i64..=1 {
                    let sx = (x as i64 + dx).clamp(0, max_x) as u32;
                    let sy = (y as i64 + dy).clamp(0, max_y) as u32;
                    window[n] = image.get_pixel(sx, sy)[0];
                    n += 1;
                }
            }
            window.sort_unstable();
            output.put_pixel(x, y, Luma([window[4]]));
        }
    }

    output
}

/// Global threshold maximizing between-class variance of the histogram.
pub fn otsu_threshold(image: &GrayImage) -> u8 {
    let mut histogram = [0u64; 256];
    for pixel in image.pixels() {
        histogram[pixel[0] as usize] += 1;
    }

    let total = (image.width() as u64 * image.height() as u64) as f64;
    let weighted_total: f64 = histogram
        .iter()
        .enumerate()
        .map(|(level, &count)| level as f64 * count as f64)
        .sum();

    let mut background_weight = 0.0;
    let mut background_sum = 0.0;
    let mut best_threshold = 0u8;
    let mut best_variance = 0.0;

    for (level, &count) in histogram.iter().enumerate() {
        background_weight += count as f64;
        if background_weight == 0.0 {
            continue;
        }
        let foreground_weight = total - background_weight;
        if foreground_weight == 0.0 {
            break;
        }

        background_sum += level as f64 * count as f64;
        let background_mean = background_sum / background_weight;
        let foreground_mean = (weighted_total - background_sum) / foreground_weight;
        let variance =
            background_weight * foreground_weight * (background_mean - foreground_mean).powi(2);

        if variance > best_variance {
            best_variance = variance;
            best_threshold = level as u8;
        }
    }

    best_threshold
}

fn threshold_image(image: &GrayImage, threshold: u8) -> GrayImage {
    let mut output = image.clone();
    for pixel in output.pixels_mut() {
        pixel[0] = if pixel[0] > threshold { 255 } else { 0 };
    }
    output
}

/// Gaussian-weighted local thresholding.
fn adaptive_threshold(image: &GrayImage, block_size: u32, offset: i16) -> GrayImage {
    let sigma = 0.3 * ((block_size as f32 - 1.0) * 0.5 - 1.0) + 0.8;
    let local_mean = imageops::blur(image, sigma);

    let mut output = GrayImage::new(image.width(), image.height());
    for (x, y, pixel) in image.enumerate_pixels() {
        let limit = local_mean.get_pixel(x, y)[0] as i16 - offset;
        let value = if pixel[0] as i16 > limit { 255 } else { 0 };
        output.put_pixel(x, y, Luma([value]));
    }
    output
}
