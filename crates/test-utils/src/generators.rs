//! Synthetic image generators.
//!
//! Every generator is deterministic: the same arguments always produce the
//! same bytes, so tests can compare outputs across runs.

use equalize_common::{Image, PixelLayout};

/// Creates an image where every pixel is `rgb`.
///
/// # Example
///
/// ```
/// use test_utils::flat_image;
///
/// let img = flat_image(4, 2, [9, 9, 9]);
/// assert_eq!(img.as_bytes().len(), 4 * 2 * 3);
/// ```
pub fn flat_image(width: u32, height: u32, rgb: [u8; 3]) -> Image {
    Image::filled(width, height, PixelLayout::Rgb8, rgb).expect("non-zero test dimensions")
}

/// Creates an RGB gradient.
///
/// - Red rises left to right across the full `[0, 255]` range
/// - Green rises top to bottom
/// - Blue is the average of the two
pub fn gradient_image(width: u32, height: u32) -> Image {
    let mut data = Vec::with_capacity(width as usize * height as usize * 3);
    for y in 0..height {
        for x in 0..width {
            let r = (x * 255 / width.saturating_sub(1).max(1)) as u8;
            let g = (y * 255 / height.saturating_sub(1).max(1)) as u8;
            let b = ((r as u16 + g as u16) / 2) as u8;
            data.extend_from_slice(&[r, g, b]);
        }
    }
    Image::from_raw(width, height, PixelLayout::Rgb8, data).expect("non-zero test dimensions")
}

/// Creates a washed-out image whose channels only use `[low, high]`.
///
/// This is the classic input for equalization: after remapping, each channel
/// should span the full range.
pub fn low_contrast_image(width: u32, height: u32, low: u8, high: u8) -> Image {
    assert!(low <= high, "low must not exceed high");
    let span = (high - low) as u32 + 1;
    let mut data = Vec::with_capacity(width as usize * height as usize * 3);
    for y in 0..height {
        for x in 0..width {
            let r = low + ((x + y) % span) as u8;
            let g = low + ((x * 3 + y) % span) as u8;
            let b = low + ((x + y * 5) % span) as u8;
            data.extend_from_slice(&[r, g, b]);
        }
    }
    Image::from_raw(width, height, PixelLayout::Rgb8, data).expect("non-zero test dimensions")
}

/// Creates pseudo-random RGB noise from a seed.
pub fn noise_image(width: u32, height: u32, seed: u64) -> Image {
    let data = noise_bytes(width as usize * height as usize * 3, seed);
    Image::from_raw(width, height, PixelLayout::Rgb8, data).expect("non-zero test dimensions")
}

/// Creates pseudo-random RGBA noise from a seed. Alpha is noisy too.
pub fn noise_rgba_image(width: u32, height: u32, seed: u64) -> Image {
    let data = noise_bytes(width as usize * height as usize * 4, seed);
    Image::from_raw(width, height, PixelLayout::Rgba8, data).expect("non-zero test dimensions")
}

/// xorshift64* byte stream; good enough for test data, not for anything else.
fn noise_bytes(len: usize, seed: u64) -> Vec<u8> {
    let mut state = seed.max(1);
    (0..len)
        .map(|_| {
            state ^= state >> 12;
            state ^= state << 25;
            state ^= state >> 27;
            (state.wrapping_mul(0x2545_F491_4F6C_DD1D) >> 56) as u8
        })
        .collect()
}
