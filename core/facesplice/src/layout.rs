//! On-disk naming shared by the extractor and the recombiner.
//!
//! ```text
//! <output_root>/
//!   <source stem>/
//!     face_0.png
//!     face_1.png
//!     metadata.json
//! ```
//!
//! The source stem is the join key between an extraction run and a later
//! recombination; canonical images are named only from their face id so an
//! external process can produce replacements without reading the metadata.

use std::path::{Path, PathBuf};

/// File name of the metadata document inside a per-image directory.
pub const METADATA_FILE: &str = "metadata.json";

/// Extension used when a record's canonical path carries none.
pub const DEFAULT_EXTENSION: &str = "png";

/// Canonical image file name for `face_id`, e.g. `face_3.png`.
pub fn face_filename(face_id: u32, extension: &str) -> String {
    format!("face_{face_id}.{extension}")
}

/// Base file name of `source` without its extension.
pub fn source_stem(source: &Path) -> String {
    source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Per-image output directory under `output_root`.
pub fn image_dir(output_root: &Path, source: &Path) -> PathBuf {
    output_root.join(source_stem(source))
}

/// Metadata document path for `source` under `output_root`.
pub fn metadata_path(output_root: &Path, source: &Path) -> PathBuf {
    image_dir(output_root, source).join(METADATA_FILE)
}

/// Extension of a canonical image path, falling back to [`DEFAULT_EXTENSION`].
pub fn extension_of(path: &Path) -> &str {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or(DEFAULT_EXTENSION)
}
