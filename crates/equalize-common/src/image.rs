//! Interleaved 8-bit image buffers.
//!
//! Two shapes are provided:
//! - [`ImageView`]: a borrowed, unvalidated host buffer handed to the pipeline.
//!   Validation happens when a frame starts, so a malformed buffer is reported
//!   as a typed error instead of being rejected at construction.
//! - [`Image`]: an owned buffer whose layout has already been validated. The
//!   pipeline publishes its results as `Image`.
//!
//! Both store pixels row-major with channels interleaved (`RGBRGB...` or
//! `RGBARGBA...`).

use serde::{Deserialize, Serialize};

use crate::channel::{Channel, CHANNEL_COUNT};
use crate::error::{EqualizeError, EqualizeResult};

/// Byte layout of a single pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PixelLayout {
    /// Three channel bytes per pixel.
    #[default]
    Rgb8,
    /// Three channel bytes followed by an alpha byte that is carried through
    /// untouched.
    Rgba8,
}

impl PixelLayout {
    #[inline(always)]
    pub const fn bytes_per_pixel(self) -> usize {
        match self {
            PixelLayout::Rgb8 => 3,
            PixelLayout::Rgba8 => 4,
        }
    }

    pub const fn has_alpha(self) -> bool {
        matches!(self, PixelLayout::Rgba8)
    }
}

/// Expected byte length for the given dimensions, or `None` on overflow.
fn expected_len(width: u32, height: u32, layout: PixelLayout) -> Option<usize> {
    (width as usize)
        .checked_mul(height as usize)?
        .checked_mul(layout.bytes_per_pixel())
}

fn validate_layout(width: u32, height: u32, layout: PixelLayout, len: usize) -> EqualizeResult<()> {
    if width == 0 || height == 0 {
        return Err(EqualizeError::InvalidInput(format!(
            "image dimensions must be non-zero, got {}x{}",
            width, height
        )));
    }
    let expected = expected_len(width, height, layout).ok_or_else(|| {
        EqualizeError::InvalidInput(format!("image {}x{} is too large", width, height))
    })?;
    if len != expected {
        return Err(EqualizeError::InvalidInput(format!(
            "{:?} buffer for {}x{} must hold {} bytes, got {}",
            layout, width, height, expected, len
        )));
    }
    Ok(())
}

/// Borrowed input image. Read-only for the duration of a frame.
#[derive(Debug, Clone, Copy)]
pub struct ImageView<'a> {
    width: u32,
    height: u32,
    layout: PixelLayout,
    data: &'a [u8],
}

impl<'a> ImageView<'a> {
    /// Wrap a host buffer. The buffer is not checked until [`validate`] runs.
    ///
    /// [`validate`]: ImageView::validate
    pub fn new(width: u32, height: u32, layout: PixelLayout, data: &'a [u8]) -> Self {
        Self {
            width,
            height,
            layout,
            data,
        }
    }

    pub fn rgb(width: u32, height: u32, data: &'a [u8]) -> Self {
        Self::new(width, height, PixelLayout::Rgb8, data)
    }

    pub fn rgba(width: u32, height: u32, data: &'a [u8]) -> Self {
        Self::new(width, height, PixelLayout::Rgba8, data)
    }

    /// Check dimensions and buffer length against the pixel layout.
    pub fn validate(&self) -> EqualizeResult<()> {
        validate_layout(self.width, self.height, self.layout, self.data.len())
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn layout(&self) -> PixelLayout {
        self.layout
    }

    pub fn as_bytes(&self) -> &'a [u8] {
        self.data
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Bytes in one row of pixels.
    pub fn row_bytes(&self) -> usize {
        self.width as usize * self.layout.bytes_per_pixel()
    }
}

/// Owned image with a validated layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    width: u32,
    height: u32,
    layout: PixelLayout,
    data: Vec<u8>,
}

impl Image {
    /// Take ownership of a raw buffer after checking it against the layout.
    pub fn from_raw(
        width: u32,
        height: u32,
        layout: PixelLayout,
        data: Vec<u8>,
    ) -> EqualizeResult<Self> {
        validate_layout(width, height, layout, data.len())?;
        Ok(Self {
            width,
            height,
            layout,
            data,
        })
    }

    /// Build an RGB image from a row-major list of pixels.
    pub fn from_rgb_pixels(width: u32, height: u32, pixels: &[[u8; 3]]) -> EqualizeResult<Self> {
        let data = pixels.iter().flatten().copied().collect();
        Self::from_raw(width, height, PixelLayout::Rgb8, data)
    }

    /// Image filled with a single pixel value. Alpha, if present, is opaque.
    pub fn filled(width: u32, height: u32, layout: PixelLayout, rgb: [u8; 3]) -> EqualizeResult<Self> {
        let pixel: Vec<u8> = match layout {
            PixelLayout::Rgb8 => rgb.to_vec(),
            PixelLayout::Rgba8 => vec![rgb[0], rgb[1], rgb[2], u8::MAX],
        };
        let count = width as usize * height as usize;
        let data = pixel.iter().copied().cycle().take(count * pixel.len()).collect();
        Self::from_raw(width, height, layout, data)
    }

    pub fn view(&self) -> ImageView<'_> {
        ImageView::new(self.width, self.height, self.layout, &self.data)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn layout(&self) -> PixelLayout {
        self.layout
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn into_raw(self) -> Vec<u8> {
        self.data
    }

    /// Channel bytes (and alpha, if any) of the pixel at `(x, y)`.
    pub fn pixel(&self, x: u32, y: u32) -> Option<&[u8]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let bpp = self.layout.bytes_per_pixel();
        let offset = (y as usize * self.width as usize + x as usize) * bpp;
        Some(&self.data[offset..offset + bpp])
    }

    /// All intensities of one channel in row-major pixel order.
    pub fn channel_values(&self, channel: Channel) -> Vec<u8> {
        self.data
            .chunks_exact(self.layout.bytes_per_pixel())
            .map(|px| px[channel.index()])
            .collect()
    }

    /// Alpha bytes in row-major order, empty for RGB images.
    pub fn alpha_values(&self) -> Vec<u8> {
        if !self.layout.has_alpha() {
            return Vec::new();
        }
        self.data
            .chunks_exact(self.layout.bytes_per_pixel())
            .map(|px| px[CHANNEL_COUNT])
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_view_validation_rejects_zero_dimensions() {
        let err = ImageView::rgb(0, 4, &[]).validate().unwrap_err();
        assert!(matches!(err, EqualizeError::InvalidInput(_)));

        let err = ImageView::rgb(4, 0, &[]).validate().unwrap_err();
        assert!(matches!(err, EqualizeError::InvalidInput(_)));
    }

    #[test]
    fn test_view_validation_rejects_bad_length() {
        let data = vec![0u8; 11];
        let err = ImageView::rgb(2, 2, &data).validate().unwrap_err();
        assert!(err.to_string().contains("must hold 12 bytes"));

        // RGB-sized buffer presented as RGBA
        let data = vec![0u8; 12];
        assert!(ImageView::rgba(2, 2, &data).validate().is_err());
        assert!(ImageView::rgb(2, 2, &data).validate().is_ok());
    }

    #[test]
    fn test_from_rgb_pixels() {
        let img = Image::from_rgb_pixels(2, 1, &[[1, 2, 3], [4, 5, 6]]).unwrap();
        assert_eq!(img.as_bytes(), &[1, 2, 3, 4, 5, 6]);
        assert_eq!(img.pixel(1, 0), Some(&[4u8, 5, 6][..]));
        assert_eq!(img.pixel(2, 0), None);
        assert_eq!(img.channel_values(Channel::Green), vec![2, 5]);
        assert!(img.alpha_values().is_empty());
    }

    #[test]
    fn test_filled_rgba_is_opaque() {
        let img = Image::filled(3, 2, PixelLayout::Rgba8, [10, 20, 30]).unwrap();
        assert_eq!(img.as_bytes().len(), 3 * 2 * 4);
        assert_eq!(img.alpha_values(), vec![255; 6]);
        assert_eq!(img.channel_values(Channel::Blue), vec![30; 6]);
    }

    #[test]
    fn test_view_geometry() {
        let img = Image::filled(5, 3, PixelLayout::Rgba8, [0, 0, 0]).unwrap();
        let view = img.view();
        assert_eq!(view.pixel_count(), 15);
        assert_eq!(view.row_bytes(), 20);
        assert!(view.validate().is_ok());
    }
}
