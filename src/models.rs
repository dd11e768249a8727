use serde::{Deserialize, Serialize};
use std::fmt;

/// Axis-aligned rectangle in pixel space.
///
/// Device rectangles always have non-negative extents. Marker rectangles
/// coming out of the stroke-inset step may carry zero or negative extents,
/// which is why the fields are signed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self { x, y, width, height }
    }

    /// Rectangle covering a whole `width` x `height` frame.
    pub fn full_frame(width: u32, height: u32) -> Self {
        Self::new(0, 0, width as i32, height as i32)
    }

    pub fn right(&self) -> i32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.height
    }

    pub fn area(&self) -> i64 {
        self.width as i64 * self.height as i64
    }

    /// True when either extent is zero or negative.
    pub fn is_degenerate(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    /// Width over height, `None` when the height is not positive.
    pub fn aspect_ratio(&self) -> Option<f64> {
        if self.height <= 0 {
            return None;
        }
        Some(self.width as f64 / self.height as f64)
    }

    /// Translate a rectangle expressed relative to `origin` back to the
    /// frame `origin` lives in.
    pub fn offset_by(&self, origin: &Rect) -> Rect {
        Rect::new(self.x + origin.x, self.y + origin.y, self.width, self.height)
    }
}

impl fmt::Display for Rect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}) {}x{}", self.x, self.y, self.width, self.height)
    }
}

/// Rectangle expressed as fractions of a reference frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizedRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl NormalizedRect {
    pub fn is_within_unit(&self) -> bool {
        [self.x, self.y, self.width, self.height]
            .iter()
            .all(|v| (0.0..=1.0).contains(v))
    }

    /// Scale back into pixel space of `frame`.
    pub fn denormalize(&self, frame: &Rect) -> (f64, f64, f64, f64) {
        let w = frame.width as f64;
        let h = frame.height as f64;
        (self.x * w, self.y * h, self.width * w, self.height * h)
    }
}

/// Marker color family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkerColor {
    Red,
    Black,
}

impl MarkerColor {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Red => "red",
            Self::Black => "black",
        }
    }
}

/// Why a found marker was rejected from the dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AnomalyReason {
    IncompleteData,
    AbnormalDeviceAspectRatio,
    MarkerAreaTooLarge,
    MarkerOutOfBounds,
}

impl AnomalyReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::IncompleteData => "IncompleteData",
            Self::AbnormalDeviceAspectRatio => "AbnormalDeviceAspectRatio",
            Self::MarkerAreaTooLarge => "MarkerAreaTooLarge",
            Self::MarkerOutOfBounds => "MarkerOutOfBounds",
        }
    }
}

impl fmt::Display for AnomalyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a marker search, optionally refined by geometry validation.
///
/// `Invalid` holds a marker whose inset rectangle collapsed to a zero or
/// negative extent; it is kept untouched so the dataset semantics match what
/// was actually scanned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectionOutcome {
    Found(Rect),
    NotFound,
    Invalid(Rect),
    Anomalous(Rect, AnomalyReason),
}

impl DetectionOutcome {
    pub fn rect(&self) -> Option<Rect> {
        match self {
            Self::Found(r) | Self::Invalid(r) | Self::Anomalous(r, _) => Some(*r),
            Self::NotFound => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }
}

/// Device silhouette as returned by the bounds scanner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceBounds {
    pub rect: Rect,
    /// The silhouette heuristic was rejected and `rect` is the whole frame.
    pub degraded: bool,
}

/// Inclusive pixel extent of every pixel that matched a color predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorRegion {
    pub min_x: u32,
    pub min_y: u32,
    pub max_x: u32,
    pub max_y: u32,
    pub pixel_count: u64,
}

impl ColorRegion {
    pub fn seed(x: u32, y: u32) -> Self {
        Self {
            min_x: x,
            min_y: y,
            max_x: x,
            max_y: y,
            pixel_count: 1,
        }
    }

    pub fn include(&mut self, x: u32, y: u32) {
        self.min_x = self.min_x.min(x);
        self.min_y = self.min_y.min(y);
        self.max_x = self.max_x.max(x);
        self.max_y = self.max_y.max(y);
        self.pixel_count += 1;
    }

    /// Strip one pixel of stroke from every side and return the enclosed
    /// interior. The extent may come out zero or negative for thin strokes.
    pub fn inset_rect(&self) -> Rect {
        let min_x = self.min_x as i32 + 1;
        let min_y = self.min_y as i32 + 1;
        let max_x = self.max_x as i32 - 1;
        let max_y = self.max_y as i32 - 1;
        Rect::new(min_x, min_y, max_x - min_x + 1, max_y - min_y + 1)
    }
}
