use std::path::{Path, PathBuf};

use image::codecs::png::PngEncoder;
use image::codecs::webp::WebPEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageEncoder, RgbaImage};
use tracing::{debug, info};

use crate::config::{CanonicalFormat, ExtractConfig};
use crate::crop::{crop_square, SquareBox};
use crate::error::FaceSpliceError;
use crate::face_detector::Region;
use crate::layout::{face_filename, image_dir, METADATA_FILE};
use crate::record::{FaceRecord, FaceRecordSet, Point, Size};

/// One face cropped and resized in memory, not yet written.
#[derive(Debug, Clone)]
pub struct ExtractedFace {
    /// Position of the region in the input order, starting at 0.
    pub face_id: u32,
    /// Square crop box in source coordinates.
    pub square: SquareBox,
    /// Crop size before resizing.
    pub original_size: Size,
    /// The crop resized to the canonical resolution.
    pub canonical: RgbaImage,
}

/// Read and decode an image file, mapping a missing file to
/// [`FaceSpliceError::SourceNotFound`].
pub(crate) fn open_image(path: &Path) -> Result<DynamicImage, FaceSpliceError> {
    let bytes = std::fs::read(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => FaceSpliceError::SourceNotFound(path.to_path_buf()),
        _ => FaceSpliceError::io(path, e),
    })?;
    decode_image(&bytes, path)
}

/// Decode input bytes into a `DynamicImage`.
pub(crate) fn decode_image(bytes: &[u8], path: &Path) -> Result<DynamicImage, FaceSpliceError> {
    image::load_from_memory(bytes).map_err(|e| FaceSpliceError::DecodeError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Resize to exactly `width × height` with Lanczos3.
pub(crate) fn resize_exact(image: &RgbaImage, width: u32, height: u32) -> RgbaImage {
    image::imageops::resize(image, width, height, FilterType::Lanczos3)
}

/// Encode an RGBA image in the canonical format.
pub(crate) fn encode_image(
    image: &RgbaImage,
    format: CanonicalFormat,
) -> Result<Vec<u8>, FaceSpliceError> {
    let mut buffer = Vec::new();
    let (width, height) = image.dimensions();
    let color_type = image::ExtendedColorType::Rgba8;

    match format {
        CanonicalFormat::Png => PngEncoder::new(&mut buffer)
            .write_image(image.as_raw(), width, height, color_type)
            .map_err(|e| FaceSpliceError::EncodeError(e.to_string()))?,
        // The pure-Rust WebP encoder is lossless only, which is what we want here.
        CanonicalFormat::Webp => WebPEncoder::new_lossless(&mut buffer)
            .write_image(image.as_raw(), width, height, color_type)
            .map_err(|e| FaceSpliceError::EncodeError(e.to_string()))?,
    }

    Ok(buffer)
}

/// Normalize every region to a square box.
///
/// Fails with every offending face id if any region has zero area or
/// exceeds [`MAX_CROP_SIDE`](crate::MAX_CROP_SIDE).
pub(crate) fn square_boxes(
    regions: &[Region],
    padding_factor: f64,
) -> Result<Vec<SquareBox>, FaceSpliceError> {
    let mut boxes = Vec::with_capacity(regions.len());
    let mut degenerate = Vec::new();

    for (face_id, region) in regions.iter().enumerate() {
        match region.square_box(padding_factor) {
            Some(square) if square.side() > 0 => boxes.push(square),
            _ => degenerate.push(face_id as u32),
        }
    }

    if !degenerate.is_empty() {
        return Err(FaceSpliceError::DegenerateRegions { ids: degenerate });
    }
    Ok(boxes)
}

/// Crop and resize every region, in input order. No I/O.
pub fn extract_faces(
    image: &DynamicImage,
    regions: &[Region],
    config: &ExtractConfig,
) -> Result<Vec<ExtractedFace>, FaceSpliceError> {
    config.validate()?;
    let boxes = square_boxes(regions, config.padding_factor)?;
    if boxes.is_empty() {
        return Ok(Vec::new());
    }

    let source = image.to_rgba8();
    let resolution = config.canonical_resolution;

    let faces = boxes
        .into_iter()
        .enumerate()
        .map(|(index, square)| {
            let crop = crop_square(&source, &square);
            let original_size = Size {
                width: crop.width(),
                height: crop.height(),
            };
            debug!(
                face_id = index,
                ?square,
                side = original_size.width,
                "cropped face"
            );
            ExtractedFace {
                face_id: index as u32,
                square,
                original_size,
                canonical: resize_exact(&crop, resolution, resolution),
            }
        })
        .collect();

    Ok(faces)
}

/// Encode and write every face, then the metadata document, into
/// `<output_root>/<source stem>/`.
///
/// Writes nothing for an empty face list. Any existing metadata document is
/// removed before the first image write, and the new one is written only
/// after every face image is on disk.
pub(crate) fn write_faces(
    faces: &[ExtractedFace],
    source: &Path,
    config: &ExtractConfig,
) -> Result<FaceRecordSet, FaceSpliceError> {
    if faces.is_empty() {
        return Ok(FaceRecordSet::default());
    }

    let extension = config.format.extension();
    let mut encoded = Vec::with_capacity(faces.len());
    let mut encode_failures = Vec::new();
    let mut last_error = String::new();
    for face in faces {
        match encode_image(&face.canonical, config.format) {
            Ok(bytes) => encoded.push(bytes),
            Err(e) => {
                encode_failures.push(face.face_id);
                last_error = e.to_string();
            }
        }
    }
    if !encode_failures.is_empty() {
        return Err(FaceSpliceError::FaceWriteFailed {
            ids: encode_failures,
            message: last_error,
        });
    }

    let dir = image_dir(&config.output_root, source);
    std::fs::create_dir_all(&dir).map_err(|e| FaceSpliceError::io(&dir, e))?;

    // A previous run's document must not outlive a partial rewrite of its images.
    let metadata = dir.join(METADATA_FILE);
    match std::fs::remove_file(&metadata) {
        Ok(()) => debug!(path = %metadata.display(), "removed previous metadata"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(FaceSpliceError::io(&metadata, e)),
    }

    let mut records = Vec::with_capacity(faces.len());
    let mut write_failures = Vec::new();
    for (face, bytes) in faces.iter().zip(&encoded) {
        let path: PathBuf = dir.join(face_filename(face.face_id, extension));
        if let Err(e) = std::fs::write(&path, bytes) {
            write_failures.push(face.face_id);
            last_error = format!("{}: {e}", path.display());
            continue;
        }
        info!(face_id = face.face_id, path = %path.display(), "saved face");
        records.push(FaceRecord {
            face_id: face.face_id,
            canonical_image_path: path,
            original_size: face.original_size,
            paste_coordinates: Point {
                x: face.square.x1,
                y: face.square.y1,
            },
            original_bbox_square: face.square,
            source_image: source.to_path_buf(),
        });
    }
    if !write_failures.is_empty() {
        return Err(FaceSpliceError::FaceWriteFailed {
            ids: write_failures,
            message: last_error,
        });
    }

    let set = FaceRecordSet::new(records);
    set.save(&metadata)?;
    info!(path = %metadata.display(), faces = set.len(), "saved metadata");

    Ok(set)
}
