use crate::error::{NfcError, Result};
use crate::models::Rect;
use image::{DynamicImage, ImageReader, RgbaImage};
use std::path::Path;
use std::sync::Arc;

/// Immutable RGBA8 pixels, optionally restricted to a window of the backing
/// image.
///
/// Cropping never copies: a crop shares the storage of its parent and only
/// narrows the window.
#[derive(Debug, Clone)]
pub struct PixelBuffer {
    storage: Arc<RgbaImage>,
    offset_x: u32,
    offset_y: u32,
    width: u32,
    height: u32,
}

impl PixelBuffer {
    pub fn from_rgba(image: RgbaImage) -> Self {
        let (width, height) = image.dimensions();
        Self {
            storage: Arc::new(image),
            offset_x: 0,
            offset_y: 0,
            width,
            height,
        }
    }

    pub fn from_dynamic(image: &DynamicImage) -> Self {
        Self::from_rgba(image.to_rgba8())
    }

    /// Decode an image file. Any failure to read or decode maps to
    /// `NfcError::Decode`.
    pub fn open(path: &Path) -> Result<Self> {
        let decode_err = |message: String| NfcError::Decode {
            path: path.to_path_buf(),
            message,
        };
        let image = ImageReader::open(path)
            .map_err(|e| decode_err(e.to_string()))?
            .with_guessed_format()
            .map_err(|e| decode_err(e.to_string()))?
            .decode()
            .map_err(|e| decode_err(e.to_string()))?;
        let buffer = Self::from_dynamic(&image);
        if buffer.is_empty() {
            return Err(decode_err("image has zero dimensions".into()));
        }
        Ok(buffer)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Rectangle of this view inside the backing image.
    pub fn frame(&self) -> Rect {
        Rect::new(
            self.offset_x as i32,
            self.offset_y as i32,
            self.width as i32,
            self.height as i32,
        )
    }

    /// RGBA sample at `(x, y)` relative to this view.
    #[inline]
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        self.storage.get_pixel(self.offset_x + x, self.offset_y + y).0
    }

    /// Row-major iteration over `(x, y, rgba)` of this view.
    pub fn enumerate_pixels(&self) -> impl Iterator<Item = (u32, u32, [u8; 4])> + '_ {
        (0..self.height)
            .flat_map(move |y| (0..self.width).map(move |x| (x, y, self.pixel(x, y))))
    }

    /// Narrow the view to `rect` (relative to this view), clamped to the
    /// view's extent.
    pub fn crop(&self, rect: &Rect) -> PixelBuffer {
        let x = rect.x.clamp(0, self.width as i32) as u32;
        let y = rect.y.clamp(0, self.height as i32) as u32;
        let width = (rect.width.max(0) as u32).min(self.width - x);
        let height = (rect.height.max(0) as u32).min(self.height - y);
        PixelBuffer {
            storage: Arc::clone(&self.storage),
            offset_x: self.offset_x + x,
            offset_y: self.offset_y + y,
            width,
            height,
        }
    }

    /// Copy the view out into an owned image.
    pub fn to_image(&self) -> RgbaImage {
        image::imageops::crop_imm(
            self.storage.as_ref(),
            self.offset_x,
            self.offset_y,
            self.width,
            self.height,
        )
        .to_image()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn gradient(width: u32, height: u32) -> PixelBuffer {
        PixelBuffer::from_rgba(RgbaImage::from_fn(width, height, |x, y| {
            Rgba([x as u8, y as u8, 0, 255])
        }))
    }

    #[test]
    fn crop_shares_storage_and_offsets_coordinates() {
        let buffer = gradient(20, 10);
        let crop = buffer.crop(&Rect::new(5, 2, 4, 3));
        assert_eq!(crop.dimensions(), (4, 3));
        assert_eq!(crop.pixel(0, 0), [5, 2, 0, 255]);
        assert_eq!(crop.pixel(3, 2), [8, 4, 0, 255]);
        assert_eq!(crop.frame(), Rect::new(5, 2, 4, 3));
    }

    #[test]
    fn nested_crop_accumulates_offsets() {
        let buffer = gradient(20, 10);
        let crop = buffer.crop(&Rect::new(5, 2, 10, 6)).crop(&Rect::new(1, 1, 2, 2));
        assert_eq!(crop.pixel(0, 0), [6, 3, 0, 255]);
        assert_eq!(crop.to_image().dimensions(), (2, 2));
    }

    #[test]
    fn crop_is_clamped_to_view() {
        let buffer = gradient(20, 10);
        let crop = buffer.crop(&Rect::new(15, 8, 10, 10));
        assert_eq!(crop.dimensions(), (5, 2));
    }

    #[test]
    fn enumerate_is_row_major() {
        let buffer = gradient(3, 2);
        let coords: Vec<(u32, u32)> = buffer.enumerate_pixels().map(|(x, y, _)| (x, y)).collect();
        assert_eq!(coords, vec![(0, 0), (1, 0), (2, 0), (0, 1), (1, 1), (2, 1)]);
    }
}
