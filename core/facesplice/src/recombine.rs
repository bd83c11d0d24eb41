use std::path::{Path, PathBuf};

use image::{DynamicImage, ImageFormat, RgbaImage};
use tracing::{info, warn};

use crate::error::FaceSpliceError;
use crate::extract::{decode_image, open_image, resize_exact};
use crate::record::{FaceRecord, FaceRecordSet};

/// Where replacement faces come from, keyed by record.
pub trait ReplacementSource {
    /// Load the replacement for `record`, or `Ok(None)` if there is none.
    fn load(&self, record: &FaceRecord) -> Result<Option<RgbaImage>, FaceSpliceError>;
}

/// Replacements stored as `face_<id>.<ext>` in one directory.
#[derive(Debug, Clone)]
pub struct ReplacementDir {
    dir: PathBuf,
}

impl ReplacementDir {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Expected path of the replacement for `record`.
    pub fn path_for(&self, record: &FaceRecord) -> PathBuf {
        self.dir.join(record.replacement_filename())
    }
}

impl ReplacementSource for ReplacementDir {
    fn load(&self, record: &FaceRecord) -> Result<Option<RgbaImage>, FaceSpliceError> {
        let path = self.path_for(record);
        let bytes = match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(FaceSpliceError::io(&path, e)),
        };
        Ok(Some(decode_image(&bytes, &path)?.to_rgba8()))
    }
}

/// Result of compositing replacements onto one image.
#[derive(Debug, Clone)]
pub struct Recombination {
    /// The original image with every available replacement pasted in.
    pub image: RgbaImage,
    /// Number of faces pasted.
    pub recombined: usize,
    /// Face ids with no replacement.
    pub skipped: Vec<u32>,
}

/// Paste `top` onto `bottom` at `(x, y)` using `top`'s alpha as the mask.
///
/// Every channel, alpha included, becomes `top·a + bottom·(1 − a)`. Pixels
/// falling outside `bottom` are dropped.
pub fn paste_with_alpha_mask(bottom: &mut RgbaImage, top: &RgbaImage, x: i64, y: i64) {
    let (bottom_w, bottom_h) = (bottom.width() as i64, bottom.height() as i64);

    for (tx, ty, src) in top.enumerate_pixels() {
        let bx = x + tx as i64;
        let by = y + ty as i64;
        if bx < 0 || by < 0 || bx >= bottom_w || by >= bottom_h {
            continue;
        }
        let mask = src.0[3] as u32;
        if mask == 0 {
            continue;
        }
        let dst = bottom.get_pixel_mut(bx as u32, by as u32);
        if mask == 255 {
            *dst = *src;
            continue;
        }
        let inv = 255 - mask;
        for c in 0..4 {
            let blended = (src.0[c] as u32 * mask + dst.0[c] as u32 * inv + 127) / 255;
            dst.0[c] = blended as u8;
        }
    }
}

/// Composites replacement faces back onto their source image.
pub struct Recombiner<'a> {
    records: &'a FaceRecordSet,
}

impl<'a> Recombiner<'a> {
    pub fn new(records: &'a FaceRecordSet) -> Self {
        Self { records }
    }

    /// Paste every available replacement in stored record order.
    ///
    /// A missing replacement is skipped with a warning. Overlapping boxes
    /// resolve in favour of the later record.
    pub fn recombine(
        &self,
        original: &DynamicImage,
        replacements: &dyn ReplacementSource,
    ) -> Result<Recombination, FaceSpliceError> {
        let mut image = original.to_rgba8();
        let mut recombined = 0;
        let mut skipped = Vec::new();

        for record in self.records {
            let Some(replacement) = replacements.load(record)? else {
                warn!(
                    face_id = record.face_id,
                    file = %record.replacement_filename(),
                    "replacement face not found, skipping"
                );
                skipped.push(record.face_id);
                continue;
            };

            let size = record.original_size;
            let paste = record.paste_coordinates;
            info!(
                face_id = record.face_id,
                from = %format!("{}x{}", replacement.width(), replacement.height()),
                to = %format!("{}x{}", size.width, size.height),
                at = %format!("({}, {})", paste.x, paste.y),
                "pasting face"
            );

            let resized = resize_exact(&replacement, size.width, size.height);
            paste_with_alpha_mask(&mut image, &resized, paste.x as i64, paste.y as i64);
            recombined += 1;
        }

        Ok(Recombination {
            image,
            recombined,
            skipped,
        })
    }
}

/// What [`recombine_panel`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecombineOutcome {
    /// At least one face was pasted and the image was saved.
    Written {
        path: PathBuf,
        recombined: usize,
        skipped: Vec<u32>,
    },

    /// No replacement was found; nothing was written.
    NothingRecombined { skipped: Vec<u32> },
}

/// Load the original image and metadata, paste replacements from
/// `replacements_dir`, and save to `output` if anything was pasted.
///
/// Parent directories of `output` are created as needed. The output format
/// follows the extension of `output`, defaulting to PNG.
pub fn recombine_panel(
    original: &Path,
    metadata: &Path,
    replacements_dir: &Path,
    output: &Path,
) -> Result<RecombineOutcome, FaceSpliceError> {
    let image = open_image(original)?;
    info!(path = %original.display(), "loaded original image");

    let records = FaceRecordSet::load(metadata)?;
    info!(faces = records.len(), path = %metadata.display(), "loaded metadata");

    let result = Recombiner::new(&records).recombine(&image, &ReplacementDir::new(replacements_dir))?;
    info!(
        recombined = result.recombined,
        skipped = result.skipped.len(),
        "recombination finished"
    );

    if result.recombined == 0 {
        warn!("no replacement faces were found to process");
        return Ok(RecombineOutcome::NothingRecombined {
            skipped: result.skipped,
        });
    }

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| FaceSpliceError::io(parent, e))?;
    }
    let format = ImageFormat::from_path(output).unwrap_or(ImageFormat::Png);
    result
        .image
        .save_with_format(output, format)
        .map_err(|e| FaceSpliceError::EncodeError(format!("{}: {e}", output.display())))?;
    info!(path = %output.display(), "saved recombined image");

    Ok(RecombineOutcome::Written {
        path: output.to_path_buf(),
        recombined: result.recombined,
        skipped: result.skipped,
    })
}
