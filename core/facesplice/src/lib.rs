//! Face extraction and recombination with an exactly invertible geometry.
//!
//! Faces are cut out of a source image as squares, resized to a fixed
//! canonical resolution for some external process, and later pasted back at
//! their original size and position. A JSON metadata document written next to
//! the canonical images carries everything the recombination step needs.
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use facesplice::{recombine_panel, Extractor, Region};
//!
//! let regions = vec![Region::from_corners((120, 80), (260, 240))];
//! let records = Extractor::new()
//!     .canonical_resolution(512)
//!     .output_root("prepared_faces")
//!     .extract(Path::new("panel.png"), &regions)
//!     .unwrap();
//! println!("extracted {} faces", records.len());
//!
//! // ... replacements are written to reenacted/face_<id>.png ...
//!
//! recombine_panel(
//!     Path::new("panel.png"),
//!     Path::new("prepared_faces/panel/metadata.json"),
//!     Path::new("reenacted"),
//!     Path::new("output/panel.png"),
//! )
//! .unwrap();
//! ```

mod config;
mod crop;
mod error;
mod extract;
/// Face regions and the detector seam.
pub mod face_detector;
/// On-disk naming shared by both pipeline stages.
pub mod layout;
mod recombine;
mod record;
#[cfg(feature = "rustface")]
/// Built-in SeetaFace-based region detector.
pub mod rustface_backend;
/// Interactive box selection state machine.
pub mod session;

use std::path::{Path, PathBuf};

use image::DynamicImage;
use tracing::info;

/// Extraction settings and mode parsing.
pub use config::{CanonicalFormat, ExtractConfig, ExtractionMode, DEFAULT_CANONICAL_RESOLUTION};
/// Box normalization.
pub use crop::{
    crop_square, padded_landmark_rect, to_square, Rect, SquareBox, DEFAULT_PADDING_FACTOR,
    MAX_CROP_SIDE,
};
/// Error type returned by facesplice operations.
pub use error::FaceSpliceError;
/// In-memory extraction.
pub use extract::{extract_faces, ExtractedFace};
/// Region model and detector trait.
pub use face_detector::{load_regions, Landmark, Region, RegionDetector};
/// Recombination.
pub use recombine::{
    paste_with_alpha_mask, recombine_panel, Recombination, RecombineOutcome, Recombiner,
    ReplacementDir, ReplacementSource,
};
/// Metadata schema.
pub use record::{FaceRecord, FaceRecordSet, Point, Size};
#[cfg(feature = "rustface")]
/// Built-in detector backed by a SeetaFace model file.
pub use rustface_backend::RustfaceDetector;

/// Builder for extracting faces from source images.
///
/// Settings start from [`ExtractConfig::default`] and can be replaced
/// wholesale with [`Extractor::with_config`] or tuned one at a time.
#[derive(Debug, Clone, Default)]
pub struct Extractor {
    config: ExtractConfig,
}

impl Extractor {
    /// Create an extractor with default settings (512px PNG, padding 1.0).
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an extractor from a full configuration.
    pub fn with_config(config: ExtractConfig) -> Self {
        Self { config }
    }

    /// Side length of canonical face images in pixels (default: 512).
    pub fn canonical_resolution(mut self, resolution: u32) -> Self {
        self.config.canonical_resolution = resolution;
        self
    }

    /// Landmark padding factor (default: 1.0). Raw boxes are never padded.
    pub fn padding_factor(mut self, factor: f64) -> Self {
        self.config.padding_factor = factor;
        self
    }

    /// Canonical image encoding (default: PNG).
    pub fn format(mut self, format: CanonicalFormat) -> Self {
        self.config.format = format;
        self
    }

    /// Root directory for per-image output directories.
    pub fn output_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.config.output_root = root.into();
        self
    }

    /// Current settings.
    pub fn config(&self) -> &ExtractConfig {
        &self.config
    }

    /// Extract `regions` from the image at `source` and persist the canonical
    /// images and metadata under `<output_root>/<source stem>/`.
    ///
    /// With no regions nothing is written and an empty set is returned.
    pub fn extract(
        &self,
        source: &Path,
        regions: &[Region],
    ) -> Result<FaceRecordSet, FaceSpliceError> {
        self.config.validate()?;
        let image = extract::open_image(source)?;
        self.extract_image(&image, source, regions)
    }

    /// Detect regions with `detector`, then extract them.
    pub fn detect_and_extract(
        &self,
        source: &Path,
        detector: &dyn RegionDetector,
    ) -> Result<FaceRecordSet, FaceSpliceError> {
        self.config.validate()?;
        let image = extract::open_image(source)?;
        let regions = detector.detect(&image);
        info!(detected = regions.len(), source = %source.display(), "detection finished");
        self.extract_image(&image, source, &regions)
    }

    /// Extract from an already decoded image; `source` names the output
    /// directory and is recorded in every face record.
    pub fn extract_image(
        &self,
        image: &DynamicImage,
        source: &Path,
        regions: &[Region],
    ) -> Result<FaceRecordSet, FaceSpliceError> {
        info!(
            source = %source.display(),
            regions = regions.len(),
            "processing source image"
        );
        let faces = extract_faces(image, regions, &self.config)?;
        if faces.is_empty() {
            info!("no faces to process for this image");
            return Ok(FaceRecordSet::default());
        }

        let records = extract::write_faces(&faces, source, &self.config)?;
        info!(processed = records.len(), "extraction finished");
        Ok(records)
    }
}
