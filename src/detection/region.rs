use crate::buffer::PixelBuffer;
use crate::config::MarkerConfig;
use crate::detection::classify::matches_marker;
use crate::models::{ColorRegion, DetectionOutcome, MarkerColor};

/// Colors tried in order; the first one with any matching pixel wins.
pub const SEARCH_ORDER: [MarkerColor; 2] = [MarkerColor::Red, MarkerColor::Black];

/// A marker color family that matched at least one pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkerMatch {
    pub color: MarkerColor,
    pub region: ColorRegion,
}

impl MarkerMatch {
    /// Inset rectangle tagged as found, or invalid when it collapsed.
    pub fn outcome(&self) -> DetectionOutcome {
        let rect = self.region.inset_rect();
        if rect.is_degenerate() {
            DetectionOutcome::Invalid(rect)
        } else {
            DetectionOutcome::Found(rect)
        }
    }
}

/// Extent of every pixel in `buffer` satisfying `predicate`.
pub fn scan_color_region<F>(buffer: &PixelBuffer, predicate: F) -> Option<ColorRegion>
where
    F: Fn([u8; 4]) -> bool,
{
    let mut region: Option<ColorRegion> = None;
    for (x, y, rgba) in buffer.enumerate_pixels() {
        if predicate(rgba) {
            match region.as_mut() {
                Some(r) => r.include(x, y),
                None => region = Some(ColorRegion::seed(x, y)),
            }
        }
    }
    region
}

/// Run the red scan, then the black fallback.
pub fn find_marker(buffer: &PixelBuffer, config: &MarkerConfig) -> Option<MarkerMatch> {
    SEARCH_ORDER.iter().find_map(|&color| {
        let region = scan_color_region(buffer, |rgba| matches_marker(color, rgba, config))?;
        log::debug!(
            "{} marker: {} pixels in ({}, {})..=({}, {})",
            color.as_str(),
            region.pixel_count,
            region.min_x,
            region.min_y,
            region.max_x,
            region.max_y
        );
        Some(MarkerMatch { color, region })
    })
}

/// Marker rectangle relative to `buffer`, inset by the stroke width.
pub fn find_marker_region(buffer: &PixelBuffer, config: &MarkerConfig) -> DetectionOutcome {
    find_marker(buffer, config)
        .map(|m| m.outcome())
        .unwrap_or(DetectionOutcome::NotFound)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Rect;
    use image::{Rgba, RgbaImage};

    fn canvas() -> RgbaImage {
        RgbaImage::from_pixel(120, 200, Rgba([128, 128, 128, 255]))
    }

    fn fill(img: &mut RgbaImage, x: u32, y: u32, w: u32, h: u32, color: [u8; 4]) {
        for yy in y..y + h {
            for xx in x..x + w {
                img.put_pixel(xx, yy, Rgba(color));
            }
        }
    }

    #[test]
    fn red_rectangle_is_inset_by_one_pixel() {
        let mut img = canvas();
        fill(&mut img, 20, 30, 40, 25, [230, 10, 10, 255]);
        let outcome = find_marker_region(&PixelBuffer::from_rgba(img), &MarkerConfig::default());
        assert_eq!(outcome, DetectionOutcome::Found(Rect::new(21, 31, 38, 23)));
    }

    #[test]
    fn red_wins_over_black() {
        let mut img = canvas();
        fill(&mut img, 5, 5, 10, 10, [0, 0, 0, 255]);
        fill(&mut img, 50, 60, 20, 20, [255, 0, 0, 255]);
        let found = find_marker(&PixelBuffer::from_rgba(img), &MarkerConfig::default()).unwrap();
        assert_eq!(found.color, MarkerColor::Red);
        assert_eq!(found.region.pixel_count, 400);
    }

    #[test]
    fn black_outline_is_the_fallback() {
        let mut img = canvas();
        // Outline only: the extent still covers the enclosed interior.
        fill(&mut img, 30, 40, 50, 2, [0, 0, 0, 255]);
        fill(&mut img, 30, 78, 50, 2, [0, 0, 0, 255]);
        fill(&mut img, 30, 40, 2, 40, [0, 0, 0, 255]);
        fill(&mut img, 78, 40, 2, 40, [0, 0, 0, 255]);
        let found = find_marker(&PixelBuffer::from_rgba(img), &MarkerConfig::default()).unwrap();
        assert_eq!(found.color, MarkerColor::Black);
        assert_eq!(found.outcome(), DetectionOutcome::Found(Rect::new(31, 41, 48, 38)));
    }

    #[test]
    fn nothing_matches() {
        let outcome = find_marker_region(&PixelBuffer::from_rgba(canvas()), &MarkerConfig::default());
        assert_eq!(outcome, DetectionOutcome::NotFound);
    }

    #[test]
    fn hairline_marker_is_invalid_not_clamped() {
        let mut img = canvas();
        fill(&mut img, 10, 50, 60, 1, [255, 0, 0, 255]);
        let outcome = find_marker_region(&PixelBuffer::from_rgba(img), &MarkerConfig::default());
        assert_eq!(outcome, DetectionOutcome::Invalid(Rect::new(11, 51, 58, -1)));
    }

    #[test]
    fn search_runs_inside_a_crop() {
        let mut img = canvas();
        fill(&mut img, 60, 100, 10, 10, [255, 0, 0, 255]);
        let buffer = PixelBuffer::from_rgba(img);
        let crop = buffer.crop(&Rect::new(50, 80, 60, 100));
        let outcome = find_marker_region(&crop, &MarkerConfig::default());
        assert_eq!(outcome, DetectionOutcome::Found(Rect::new(11, 21, 8, 8)));
    }
}
