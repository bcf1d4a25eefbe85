//! DCT-based perceptual hash.
//!
//! The image is reduced to 32x32 greyscale, transformed with a 2D DCT-II and
//! the top-left 8x8 block of coefficients is compared against its median.
//! Bit 63 is the DC coefficient; bits follow in row-major order.

use std::f64::consts::PI;

use fluentfs_core::PhashString;
use image::imageops::FilterType;
use image::DynamicImage;

const SIZE: usize = 32;
const LOW: usize = 8;

/// Computes the 64-bit perceptual hash of `image`.
pub fn perceptual_hash(image: &DynamicImage) -> PhashString {
    let small = image
        .grayscale()
        .resize_exact(SIZE as u32, SIZE as u32, FilterType::Triangle)
        .to_luma8();

    let mut pixels = [[0f64; SIZE]; SIZE];
    for (x, y, pixel) in small.enumerate_pixels() {
        pixels[y as usize][x as usize] = f64::from(pixel.0[0]);
    }

    let coefficients = dct_2d(&pixels);
    let mut low = Vec::with_capacity(LOW * LOW);
    for row in coefficients.iter().take(LOW) {
        low.extend_from_slice(&row[..LOW]);
    }

    let median = median(&low);
    let bits = low
        .iter()
        .fold(0u64, |bits, &c| (bits << 1) | u64::from(c > median));
    PhashString::from_bits(bits)
}

fn cos_table() -> [[f64; SIZE]; SIZE] {
    let mut table = [[0f64; SIZE]; SIZE];
    let n = SIZE as f64;
    for (k, row) in table.iter_mut().enumerate() {
        for (i, cell) in row.iter_mut().enumerate() {
            *cell = (PI / n * (i as f64 + 0.5) * k as f64).cos();
        }
    }
    table
}

fn dct_1d(input: &[f64; SIZE], table: &[[f64; SIZE]; SIZE]) -> [f64; SIZE] {
    let mut output = [0f64; SIZE];
    for (k, out) in output.iter_mut().enumerate() {
        *out = input.iter().zip(table[k].iter()).map(|(x, c)| x * c).sum();
    }
    output
}

fn dct_2d(pixels: &[[f64; SIZE]; SIZE]) -> [[f64; SIZE]; SIZE] {
    let table = cos_table();
    let mut rows = [[0f64; SIZE]; SIZE];
    for (y, row) in pixels.iter().enumerate() {
        rows[y] = dct_1d(row, &table);
    }

    let mut result = [[0f64; SIZE]; SIZE];
    for x in 0..SIZE {
        let mut column = [0f64; SIZE];
        for (y, row) in rows.iter().enumerate() {
            column[y] = row[x];
        }
        for (y, value) in dct_1d(&column, &table).into_iter().enumerate() {
            result[y][x] = value;
        }
    }
    result
}

fn median(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma};

    #[test]
    fn uniform_images_ignore_size() {
        let small = DynamicImage::ImageLuma8(GrayImage::from_pixel(40, 40, Luma([200])));
        let large = DynamicImage::ImageLuma8(GrayImage::from_pixel(96, 64, Luma([200])));
        let hash = perceptual_hash(&small);
        assert_eq!(hash, perceptual_hash(&large));
        assert_eq!(hash.bits() >> 63, 1);
    }

    #[test]
    fn identical_images_hash_equally() {
        let image = GrayImage::from_fn(50, 30, |x, y| Luma([((x * 7 + y * 13) % 256) as u8]));
        let a = perceptual_hash(&DynamicImage::ImageLuma8(image.clone()));
        let b = perceptual_hash(&DynamicImage::ImageLuma8(image));
        assert_eq!(a, b);
    }

    #[test]
    fn median_of_even_length_averages_middle_pair() {
        assert_eq!(median(&[4.0, 1.0, 3.0, 2.0]), 2.5);
        assert_eq!(median(&[5.0, 1.0, 3.0]), 3.0);
    }

    #[test]
    fn dct_of_constant_row_has_only_dc() {
        let table = cos_table();
        let out = dct_1d(&[1.0; SIZE], &table);
        assert!((out[0] - SIZE as f64).abs() < 1e-9);
        assert!(out[1..].iter().all(|c| c.abs() < 1e-9));
    }
}
