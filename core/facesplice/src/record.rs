use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::crop::SquareBox;
use crate::error::FaceSpliceError;
use crate::layout::{extension_of, face_filename};

/// Pixel dimensions, serialized as `[width, height]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "[u32; 2]", into = "[u32; 2]")]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl From<[u32; 2]> for Size {
    fn from([width, height]: [u32; 2]) -> Self {
        Size { width, height }
    }
}

impl From<Size> for [u32; 2] {
    fn from(s: Size) -> Self {
        [s.width, s.height]
    }
}

/// Source-image coordinate, serialized as `[x, y]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "[i32; 2]", into = "[i32; 2]")]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl From<[i32; 2]> for Point {
    fn from([x, y]: [i32; 2]) -> Self {
        Point { x, y }
    }
}

impl From<Point> for [i32; 2] {
    fn from(p: Point) -> Self {
        [p.x, p.y]
    }
}

/// Geometry needed to put one extracted face back.
///
/// `original_size` is the inverse-resize target and `paste_coordinates` the
/// inverse-paste target; together they fully determine recombination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaceRecord {
    pub face_id: u32,
    #[serde(alias = "face_image_512px_path")]
    pub canonical_image_path: PathBuf,
    pub original_size: Size,
    pub paste_coordinates: Point,
    pub original_bbox_square: SquareBox,
    pub source_image: PathBuf,
}

impl FaceRecord {
    /// File name a replacement for this face is expected under.
    pub fn replacement_filename(&self) -> String {
        face_filename(self.face_id, extension_of(&self.canonical_image_path))
    }
}

/// Ordered records for one source image, persisted as a JSON array.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FaceRecordSet {
    records: Vec<FaceRecord>,
}

impl FaceRecordSet {
    pub fn new(records: Vec<FaceRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[FaceRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Check ids run 0..n in order and every size is non-empty.
    ///
    /// Documents from the earlier tooling can carry a size one pixel off
    /// square; those are accepted with a warning and pasted as recorded.
    pub fn validate(&self) -> Result<(), FaceSpliceError> {
        for (index, record) in self.records.iter().enumerate() {
            if record.face_id as usize != index {
                return Err(FaceSpliceError::InvalidMetadata(format!(
                    "record {index} has face_id {}, expected {index}",
                    record.face_id
                )));
            }
            let Size { width, height } = record.original_size;
            if width == 0 || height == 0 {
                return Err(FaceSpliceError::InvalidMetadata(format!(
                    "face {} has empty original_size {width}x{height}",
                    record.face_id
                )));
            }
            if width != height {
                warn!(
                    face_id = record.face_id,
                    width, height, "original_size is not square, pasting as recorded"
                );
            }
        }
        Ok(())
    }

    /// Read and validate a metadata document.
    pub fn load(path: &Path) -> Result<Self, FaceSpliceError> {
        let text = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => FaceSpliceError::MetadataNotFound(path.to_path_buf()),
            _ => FaceSpliceError::io(path, e),
        })?;
        let set: FaceRecordSet =
            serde_json::from_str(&text).map_err(|e| FaceSpliceError::ParseError {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
        set.validate()?;
        Ok(set)
    }

    /// Write the whole document at once.
    pub fn save(&self, path: &Path) -> Result<(), FaceSpliceError> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| FaceSpliceError::InvalidMetadata(e.to_string()))?;
        std::fs::write(path, json).map_err(|e| FaceSpliceError::io(path, e))
    }
}

impl<'a> IntoIterator for &'a FaceRecordSet {
    type Item = &'a FaceRecord;
    type IntoIter = std::slice::Iter<'a, FaceRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(face_id: u32, side: u32) -> FaceRecord {
        FaceRecord {
            face_id,
            canonical_image_path: PathBuf::from(format!("out/panel/face_{face_id}.png")),
            original_size: Size {
                width: side,
                height: side,
            },
            paste_coordinates: Point { x: 0, y: 25 },
            original_bbox_square: SquareBox {
                x1: 0,
                y1: 25,
                x2: side as i32,
                y2: 25 + side as i32,
            },
            source_image: PathBuf::from("panel.png"),
        }
    }

    #[test]
    fn record_serializes_with_contract_field_names() {
        let value = serde_json::to_value(record(0, 300)).unwrap();
        assert_eq!(value["face_id"], 0);
        assert_eq!(value["canonical_image_path"], "out/panel/face_0.png");
        assert_eq!(value["original_size"], serde_json::json!([300, 300]));
        assert_eq!(value["paste_coordinates"], serde_json::json!([0, 25]));
        assert_eq!(
            value["original_bbox_square"],
            serde_json::json!([0, 25, 300, 325])
        );
        assert_eq!(value["source_image"], "panel.png");
    }

    #[test]
    fn legacy_path_field_is_accepted() {
        let json = r#"[{
            "face_id": 0,
            "face_image_512px_path": "prepared/x/face_0.png",
            "original_size": [64, 64],
            "paste_coordinates": [-4, 10],
            "original_bbox_square": [-4, 10, 60, 74],
            "source_image": "x.png"
        }]"#;
        let set: FaceRecordSet = serde_json::from_str(json).unwrap();
        assert_eq!(set.len(), 1);
        let r = &set.records()[0];
        assert_eq!(r.canonical_image_path, PathBuf::from("prepared/x/face_0.png"));
        assert_eq!(r.paste_coordinates, Point { x: -4, y: 10 });
        assert!(set.validate().is_ok());
    }

    #[test]
    fn set_serializes_as_plain_array() {
        let set = FaceRecordSet::new(vec![record(0, 10), record(1, 20)]);
        let value = serde_json::to_value(&set).unwrap();
        assert!(value.is_array());
        assert_eq!(value.as_array().unwrap().len(), 2);
    }

    #[test]
    fn validate_rejects_gap_in_ids() {
        let set = FaceRecordSet::new(vec![record(0, 10), record(2, 10)]);
        assert!(matches!(
            set.validate(),
            Err(FaceSpliceError::InvalidMetadata(_))
        ));
    }

    #[test]
    fn validate_rejects_zero_size() {
        let set = FaceRecordSet::new(vec![record(0, 0)]);
        assert!(set.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_height() {
        let mut r = record(0, 10);
        r.original_size.height = 0;
        assert!(FaceRecordSet::new(vec![r]).validate().is_err());
    }

    #[test]
    fn validate_accepts_legacy_non_square_size() {
        let json = r#"[{
            "face_id": 0,
            "face_image_512px_path": "prepared/x/face_0.png",
            "original_size": [3, 4],
            "paste_coordinates": [0, 0],
            "original_bbox_square": [0, 0, 3, 4],
            "source_image": "x.png"
        }]"#;
        let set: FaceRecordSet = serde_json::from_str(json).unwrap();
        assert!(set.validate().is_ok());
        assert_eq!(set.records()[0].original_size, Size { width: 3, height: 4 });
    }

    #[test]
    fn empty_set_is_valid() {
        assert!(FaceRecordSet::default().validate().is_ok());
    }

    #[test]
    fn replacement_filename_follows_canonical_extension() {
        let mut r = record(4, 10);
        assert_eq!(r.replacement_filename(), "face_4.png");
        r.canonical_image_path = PathBuf::from("face_4.webp");
        assert_eq!(r.replacement_filename(), "face_4.webp");
    }

    #[test]
    fn load_missing_document_reports_metadata_not_found() {
        let err = FaceRecordSet::load(Path::new("/nonexistent/facesplice/metadata.json"))
            .unwrap_err();
        assert!(matches!(err, FaceSpliceError::MetadataNotFound(_)));
    }
}
