//! Scalar quality metrics for captured frames.
//!
//! Motion is estimated as the perceptual-hash distance between consecutive
//! frames, sharpness as the variance of the Laplacian response, and the
//! foreground level as the grayscale standard deviation. All three feed the
//! `FrameQuality` fields the gates evaluate.

use image::DynamicImage;
use image_hasher::{HashAlg, HasherConfig, ImageHash};

use crate::gate::FrameQuality;

pub fn compute_phash(image: &DynamicImage) -> String {
    let hasher = HasherConfig::new()
        .hash_alg(HashAlg::DoubleGradient)
        .hash_size(8, 8)
        .to_hasher();

    hasher.hash_image(image).to_base64()
}

/// Distance between two base64 hashes; undecodable input pins the distance to
/// the maximum so it reads as "everything changed".
pub fn hamming_distance(lhs: &str, rhs: &str) -> u32 {
    let Ok(h1) = ImageHash::<Vec<u8>>::from_base64(lhs) else {
        return u32::MAX;
    };
    let Ok(h2) = ImageHash::<Vec<u8>>::from_base64(rhs) else {
        return u32::MAX;
    };
    h1.dist(&h2)
}

/// Variance of the 4-neighbour Laplacian over the grayscale frame. Blurry
/// frames have weak edges and score near zero.
pub fn sharpness(image: &DynamicImage) -> f64 {
    let gray = image.to_luma8();
    let (width, height) = gray.dimensions();
    if width < 3 || height < 3 {
        return 0.0;
    }

    let mut sum = 0.0;
    let mut sum_sq = 0.0;
    let count = ((width - 2) * (height - 2)) as f64;

    for y in 1..height - 1 {
        for x in 1..width - 1 {
            let center = gray.get_pixel(x, y)[0] as f64;
            let response = gray.get_pixel(x, y - 1)[0] as f64
                + gray.get_pixel(x, y + 1)[0] as f64
                + gray.get_pixel(x - 1, y)[0] as f64
                + gray.get_pixel(x + 1, y)[0] as f64
                - 4.0 * center;
            sum += response;
            sum_sq += response * response;
        }
    }

    let mean = sum / count;
    (sum_sq / count) - mean * mean
}

/// Grayscale standard deviation; a bare shelf or lens cap scores near zero.
pub fn foreground_level(image: &DynamicImage) -> f64 {
    let gray = image.to_luma8();
    let pixels = gray.as_raw();
    if pixels.is_empty() {
        return 0.0;
    }

    let count = pixels.len() as f64;
    let mut sum = 0.0;
    let mut sum_sq = 0.0;
    for &p in pixels {
        let value = p as f64;
        sum += value;
        sum_sq += value * value;
    }

    let mean = sum / count;
    ((sum_sq / count) - mean * mean).max(0.0).sqrt()
}

/// Measure one frame against the previous frame's hash. Returns the quality
/// triple plus this frame's hash for the next call.
pub fn measure(image: &DynamicImage, previous_phash: Option<&str>) -> (FrameQuality, String) {
    let phash = compute_phash(image);
    let motion = match previous_phash {
        Some(previous) => hamming_distance(previous, &phash) as f64,
        // First frame has nothing to differ from.
        None => 0.0,
    };

    let quality = FrameQuality {
        sharpness: sharpness(image),
        motion,
        foreground: foreground_level(image),
    };

    (quality, phash)
}
