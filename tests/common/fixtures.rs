use image::{ImageBuffer, Rgba, RgbaImage};
use std::path::Path;

pub const WHITE: [u8; 4] = [255, 255, 255, 255];
pub const MID_GRAY: [u8; 4] = [128, 128, 128, 255];
pub const DARK_GRAY: [u8; 4] = [70, 70, 75, 255];
pub const RED: [u8; 4] = [230, 20, 20, 255];
pub const BLACK: [u8; 4] = [0, 0, 0, 255];
pub const CLEAR: [u8; 4] = [0, 0, 0, 0];

/// Solid `width` x `height` image.
pub fn solid(width: u32, height: u32, color: [u8; 4]) -> RgbaImage {
    ImageBuffer::from_pixel(width, height, Rgba(color))
}

/// Fill the `w` x `h` block at `(x, y)`.
pub fn fill(img: &mut RgbaImage, x: u32, y: u32, w: u32, h: u32, color: [u8; 4]) {
    for yy in y..y + h {
        for xx in x..x + w {
            img.put_pixel(xx, yy, Rgba(color));
        }
    }
}

/// Outline of the `w` x `h` block at `(x, y)`, `stroke` pixels wide.
pub fn outline(img: &mut RgbaImage, x: u32, y: u32, w: u32, h: u32, stroke: u32, color: [u8; 4]) {
    fill(img, x, y, w, stroke, color);
    fill(img, x, y + h - stroke, w, stroke, color);
    fill(img, x, y, stroke, h, color);
    fill(img, x + w - stroke, y, stroke, h, color);
}

/// A phone-shaped device on white padding with a red marker inside.
///
/// Frame 600x1000, device at (100, 150) sized 300x600, marker at
/// (120, 200) sized 60x50 relative to the frame.
pub fn device_photo() -> RgbaImage {
    let mut img = solid(600, 1000, WHITE);
    fill(&mut img, 100, 150, 300, 600, DARK_GRAY);
    fill(&mut img, 120, 200, 60, 50, RED);
    img
}

/// Save `img` as PNG at `path`, creating parent directories.
pub fn save_png(img: &RgbaImage, path: &Path) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("Failed to create fixture directory");
    }
    img.save_with_format(path, image::ImageFormat::Png)
        .expect("Failed to save fixture image");
}
