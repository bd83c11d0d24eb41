use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use image::DynamicImage;

use crate::error::FaceSpliceError;
use crate::face_detector::{Region, RegionDetector};

/// Region detector backed by the `rustface` crate (SeetaFace engine).
///
/// Emits raw boxes in the detector's output order; the extractor squares
/// them without landmark padding.
pub struct RustfaceDetector {
    model: rustface::Model,
    min_face_size: u32,
}

impl RustfaceDetector {
    /// Load a SeetaFace frontal model (e.g. `seeta_fd_frontal_v1.0.bin`).
    pub fn from_file(path: &Path) -> Result<Self, FaceSpliceError> {
        let file = File::open(path).map_err(|e| FaceSpliceError::io(path, e))?;
        let model = rustface::read_model(BufReader::new(file))
            .map_err(|e| FaceSpliceError::DetectorLoad(format!("{}: {e}", path.display())))?;
        Ok(Self {
            model,
            min_face_size: 20,
        })
    }

    /// Smallest face side, in pixels, the detector will report (default: 20).
    pub fn min_face_size(mut self, size: u32) -> Self {
        self.min_face_size = size;
        self
    }
}

impl RegionDetector for RustfaceDetector {
    fn detect(&self, image: &DynamicImage) -> Vec<Region> {
        let gray = image.to_luma8();
        let (width, height) = gray.dimensions();

        let mut detector = rustface::create_detector_with_model(self.model.clone());
        detector.set_min_face_size(self.min_face_size);
        detector.set_score_thresh(2.0);
        detector.set_pyramid_scale_factor(0.8);
        detector.set_slide_window_step(4, 4);

        let faces = detector.detect(&rustface::ImageData::new(gray.as_raw(), width, height));

        faces
            .iter()
            .map(|face| {
                let bbox = face.bbox();
                Region::Box {
                    x1: bbox.x(),
                    y1: bbox.y(),
                    x2: bbox.x() + bbox.width() as i32,
                    y2: bbox.y() + bbox.height() as i32,
                }
            })
            .collect()
    }
}
