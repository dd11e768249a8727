//! Folder-level detection.
//!
//! Every image is handled in isolation: a decode failure or an anomaly is
//! recorded as an unmatched entry and the batch moves on. Cancellation is
//! only observed between images.

use crate::buffer::PixelBuffer;
use crate::dataset::{device_identity, AnnotationSet, NfcRecord, RawGeometry};
use crate::detection::normalize::normalize_with_precision;
use crate::detection::Detector;
use crate::error::Result;
use crate::models::{AnomalyReason, DetectionOutcome, NormalizedRect};
use rayon::prelude::*;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use walkdir::WalkDir;

pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp", "bmp", "gif", "tif", "tiff"];

/// Why an image did not make it into the dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ReviewReason {
    NotFound,
    InvalidMarker,
    Anomaly(AnomalyReason),
    DecodeFailure,
    ProcessingFailure,
}

impl ReviewReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotFound => "NotFound",
            Self::InvalidMarker => "InvalidMarker",
            Self::Anomaly(reason) => reason.as_str(),
            Self::DecodeFailure => "DecodeFailure",
            Self::ProcessingFailure => "ProcessingFailure",
        }
    }
}

impl fmt::Display for ReviewReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ReviewReason {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// An image kept aside for manual review.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnmatchedImage {
    pub name: String,
    pub path: String,
    pub reason: ReviewReason,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<RawGeometry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Result of processing one image.
#[derive(Debug, Clone, PartialEq)]
pub enum ImageOutcome {
    Accepted {
        /// Relative path of the image, used as the annotation key.
        file_name: String,
        record: NfcRecord,
        canvas_box: Option<NormalizedRect>,
    },
    Unmatched(UnmatchedImage),
}

/// Accumulated results of a batch, owned by the driver.
#[derive(Debug, Clone, Default)]
pub struct BatchContext {
    pub total: usize,
    pub processed: usize,
    pub results: Vec<NfcRecord>,
    pub annotations: AnnotationSet,
    pub unmatched: Vec<UnmatchedImage>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchSummary {
    pub total: usize,
    pub processed: usize,
    pub matched: usize,
    pub unmatched: usize,
    pub by_reason: BTreeMap<ReviewReason, usize>,
}

impl fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Total images: {}", self.total)?;
        writeln!(f, "Processed: {}", self.processed)?;
        writeln!(f, "Matched: {}", self.matched)?;
        write!(f, "Unmatched: {}", self.unmatched)?;
        for (reason, count) in &self.by_reason {
            write!(f, "\n  {}: {}", reason, count)?;
        }
        Ok(())
    }
}

impl BatchContext {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            ..Self::default()
        }
    }

    pub fn record(&mut self, outcome: ImageOutcome) {
        self.processed += 1;
        match outcome {
            ImageOutcome::Accepted {
                file_name,
                record,
                canvas_box,
            } => {
                self.results.push(record);
                if let Some(b) = canvas_box {
                    self.annotations.push(file_name, b);
                }
            }
            ImageOutcome::Unmatched(entry) => self.unmatched.push(entry),
        }
    }

    pub fn summary(&self) -> BatchSummary {
        let mut by_reason = BTreeMap::new();
        for entry in &self.unmatched {
            *by_reason.entry(entry.reason).or_insert(0) += 1;
        }
        BatchSummary {
            total: self.total,
            processed: self.processed,
            matched: self.results.len(),
            unmatched: self.unmatched.len(),
            by_reason,
        }
    }
}

/// All image files below `root` (or `root` itself when it is a file),
/// sorted by path. Symbolic links are not followed.
pub fn collect_images(root: &Path) -> Result<Vec<PathBuf>> {
    if root.is_file() {
        return Ok(vec![root.to_path_buf()]);
    }
    let mut files = Vec::new();
    for entry in WalkDir::new(root).follow_links(false) {
        let entry = entry?;
        if entry.file_type().is_file() && is_image_file(entry.path()) {
            files.push(entry.into_path());
        }
    }
    files.sort();
    Ok(files)
}

fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Drives a [`Detector`] over many images.
pub struct BatchProcessor<'a> {
    detector: &'a Detector,
    /// Images are identified relative to this directory: the parent of the
    /// selected folder, or the directory above brand and model for a single
    /// selected image.
    base: PathBuf,
    cancel: Arc<AtomicBool>,
}

impl<'a> BatchProcessor<'a> {
    pub fn new(detector: &'a Detector, root: &Path) -> Result<Self> {
        let root = root.canonicalize()?;
        // A single image keeps its brand and model directories in the label.
        let depth = if root.is_file() { 3 } else { 1 };
        let base = root
            .ancestors()
            .nth(depth)
            .or_else(|| root.ancestors().last())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| root.clone());
        Ok(Self {
            detector,
            base,
            cancel: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Share a flag that stops the batch before the next image.
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = flag;
        self
    }

    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::Relaxed)
    }

    fn relative(&self, path: &Path) -> PathBuf {
        let absolute = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        if let Ok(rel) = absolute.strip_prefix(&self.base) {
            return rel.to_path_buf();
        }
        absolute
    }

    /// Detect, validate and normalize a single image. Never fails: every
    /// problem becomes an unmatched entry.
    pub fn process_image(&self, path: &Path) -> ImageOutcome {
        let relative = self.relative(path);
        let label = relative.to_string_lossy().into_owned();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| label.clone());
        let unmatched = |reason: ReviewReason, data: Option<RawGeometry>, detail: Option<String>| {
            ImageOutcome::Unmatched(UnmatchedImage {
                name: name.clone(),
                path: label.clone(),
                reason,
                data,
                detail,
            })
        };

        let buffer = match PixelBuffer::open(path) {
            Ok(buffer) => buffer,
            Err(e) => {
                log::warn!("{}: {}", label, e);
                return unmatched(ReviewReason::DecodeFailure, None, Some(e.to_string()));
            }
        };

        let detection = match self.detector.detect_labeled(&buffer, &label) {
            Ok(detection) => detection,
            Err(e) => {
                log::warn!("{}: {}", label, e);
                return unmatched(ReviewReason::ProcessingFailure, None, Some(e.to_string()));
            }
        };

        if detection.device.degraded {
            log::info!("{}: device silhouette not trusted, using full frame", label);
        }

        let precision = self.detector.config().precision;
        let geometry = detection.raw_geometry();
        match detection.outcome {
            DetectionOutcome::Found(marker) => {
                let (brand, model) = device_identity(&relative);
                let location = normalize_with_precision(&marker, &detection.device.rect, precision);
                log::info!("{}: marker {} accepted", label, marker);
                ImageOutcome::Accepted {
                    file_name: label.clone(),
                    record: NfcRecord::new(&brand, &model, &detection.device.rect, location, precision),
                    canvas_box: detection.canvas_box(buffer.width(), buffer.height(), precision),
                }
            }
            DetectionOutcome::NotFound => {
                log::info!("{}: no marker found", label);
                unmatched(ReviewReason::NotFound, None, None)
            }
            DetectionOutcome::Invalid(marker) => {
                log::warn!("{}: marker {} has no interior", label, marker);
                unmatched(ReviewReason::InvalidMarker, geometry, None)
            }
            DetectionOutcome::Anomalous(marker, reason) => {
                log::warn!("{}: marker {} flagged: {}", label, marker, reason);
                unmatched(ReviewReason::Anomaly(reason), geometry, None)
            }
        }
    }

    /// Process `files` one after another. Returns `false` when the batch
    /// was cancelled before every file was handled.
    pub fn run(&self, files: &[PathBuf], ctx: &mut BatchContext) -> bool {
        for path in files {
            if self.is_cancelled() {
                log::warn!("batch cancelled after {} of {} images", ctx.processed, ctx.total);
                return false;
            }
            ctx.record(self.process_image(path));
        }
        true
    }

    /// Process `files` across threads. Results are recorded in input order.
    pub fn run_parallel(&self, files: &[PathBuf], ctx: &mut BatchContext) -> bool {
        let outcomes: Vec<Option<ImageOutcome>> = files
            .par_iter()
            .map(|path| {
                if self.is_cancelled() {
                    None
                } else {
                    Some(self.process_image(path))
                }
            })
            .collect();

        let mut complete = true;
        for outcome in outcomes {
            match outcome {
                Some(outcome) => ctx.record(outcome),
                None => complete = false,
            }
        }
        if !complete {
            log::warn!("batch cancelled after {} of {} images", ctx.processed, ctx.total);
        }
        complete
    }
}
