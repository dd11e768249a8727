use crate::buffer::PixelBuffer;
use crate::error::{NfcError, Result};
use crate::models::{DetectionOutcome, DeviceBounds, MarkerColor};
use image::RgbaImage;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Data that flows through the pipeline for a single image
#[derive(Debug, Clone)]
pub struct PipelineData {
    /// The full decoded frame
    pub original: PixelBuffer,

    /// Region later steps work on (the whole frame until it gets cropped)
    pub view: PixelBuffer,

    /// Device silhouette, once located
    pub device: Option<DeviceBounds>,

    /// Color family of the marker, once one matched
    pub marker_color: Option<MarkerColor>,

    /// Marker search result, refined by validation
    pub outcome: Option<DetectionOutcome>,
}

impl PipelineData {
    /// Create PipelineData for a full image
    pub fn from_buffer(buffer: PixelBuffer) -> Self {
        Self {
            view: buffer.clone(),
            original: buffer,
            device: None,
            marker_color: None,
            outcome: None,
        }
    }
}

/// Debug configuration for pipeline execution
#[derive(Clone, Debug)]
pub struct DebugConfig {
    /// Root directory for debug outputs
    pub output_dir: PathBuf,
}

/// Context available to all pipeline steps
#[derive(Clone, Debug, Default)]
pub struct PipelineContext {
    pub debug: Option<DebugConfig>,
}

impl PipelineContext {
    fn debug_dir(&self) -> Option<&Path> {
        self.debug.as_ref().map(|d| d.output_dir.as_path())
    }
}

/// Trait that all pipeline steps must implement
pub trait PipelineStep: Send + Sync {
    /// Process one image's data and return it updated
    fn process(&self, data: PipelineData, context: &PipelineContext) -> Result<PipelineData>;

    /// Human-readable name for this step (used in logs and debug file names)
    fn name(&self) -> &str;

    /// Image saved to the debug directory after this step ran
    fn debug_image(&self, data: &PipelineData) -> RgbaImage {
        data.view.to_image()
    }
}

/// Composable pipeline builder
pub struct Pipeline {
    steps: Vec<Arc<dyn PipelineStep>>,
    context: PipelineContext,
    /// Numbers debug sub-directories so two labels never share one.
    runs: AtomicUsize,
}

impl Pipeline {
    /// Create a new empty pipeline
    pub fn new() -> Self {
        Self {
            steps: Vec::new(),
            context: PipelineContext::default(),
            runs: AtomicUsize::new(0),
        }
    }

    /// Enable debug mode with output directory
    /// The directory must be empty or non-existent
    pub fn with_debug(mut self, output_dir: PathBuf) -> Result<Self> {
        if output_dir.exists() {
            let entries = std::fs::read_dir(&output_dir)?;
            if entries.count() > 0 {
                return Err(NfcError::DebugOutput(format!(
                    "debug directory is not empty: {}",
                    output_dir.display()
                )));
            }
        } else {
            std::fs::create_dir_all(&output_dir)?;
        }

        self.context.debug = Some(DebugConfig { output_dir });

        Ok(self)
    }

    /// Add a processing step to the pipeline
    pub fn add_step(mut self, step: Arc<dyn PipelineStep>) -> Self {
        self.steps.push(step);
        self
    }

    /// Helper method to add a step from a Box (for convenience)
    pub fn add_step_boxed(mut self, step: Box<dyn PipelineStep>) -> Self {
        self.steps.push(Arc::from(step));
        self
    }

    /// Run every step on `input`. `label` names the debug sub-directory,
    /// prefixed with a per-pipeline run number.
    pub fn run(&self, input: PixelBuffer, label: &str) -> Result<PipelineData> {
        self.run_partial(input, label, self.steps.len())
    }

    /// Run only the first `num_steps` steps (useful for debugging)
    pub fn run_partial(&self, input: PixelBuffer, label: &str, num_steps: usize) -> Result<PipelineData> {
        let debug_dir = match self.context.debug_dir() {
            Some(root) => {
                let run = self.runs.fetch_add(1, Ordering::Relaxed);
                let dir = root.join(format!("{:04}_{}", run, sanitize_label(label)));
                std::fs::create_dir_all(&dir)?;
                save_debug_image(&input.to_image(), &dir.join("00_input.png"))?;
                Some(dir)
            }
            None => None,
        };

        let mut data = PipelineData::from_buffer(input);

        for (step_idx, step) in self.steps.iter().take(num_steps).enumerate() {
            log::debug!("[{}] running step: {}", label, step.name());
            data = step.process(data, &self.context)?;

            if let Some(dir) = &debug_dir {
                let file_name = format!(
                    "{:02}_{}.png",
                    step_idx + 1,
                    step.name().to_lowercase().replace(' ', "_")
                );
                save_debug_image(&step.debug_image(&data), &dir.join(&file_name))?;
                log::debug!("[{}] debug: saved {}", label, file_name);
            }
        }

        Ok(data)
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

fn save_debug_image(image: &RgbaImage, path: &Path) -> Result<()> {
    image
        .save(path)
        .map_err(|e| NfcError::DebugOutput(format!("failed to save {}: {}", path.display(), e)))
}

/// Turn an image path label into a single directory name.
fn sanitize_label(label: &str) -> String {
    let cleaned: String = label
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '-' || c == '.' { c } else { '_' })
        .collect();
    if cleaned.is_empty() {
        "image".to_string()
    } else {
        cleaned
    }
}
