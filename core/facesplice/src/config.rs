use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::crop::DEFAULT_PADDING_FACTOR;
use crate::error::FaceSpliceError;

/// Default side length of extracted faces.
pub const DEFAULT_CANONICAL_RESOLUTION: u32 = 512;

/// Encoding of canonical face images. Both keep the alpha channel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CanonicalFormat {
    /// PNG.
    #[default]
    Png,

    /// Lossless WebP.
    Webp,
}

impl CanonicalFormat {
    pub fn extension(self) -> &'static str {
        match self {
            CanonicalFormat::Png => "png",
            CanonicalFormat::Webp => "webp",
        }
    }
}

/// Extraction settings, loadable from TOML.
///
/// ```toml
/// canonical_resolution = 512
/// padding_factor = 1.0
/// format = "png"
/// output_root = "prepared_faces"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractConfig {
    pub canonical_resolution: u32,
    pub padding_factor: f64,
    pub format: CanonicalFormat,
    pub output_root: PathBuf,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            canonical_resolution: DEFAULT_CANONICAL_RESOLUTION,
            padding_factor: DEFAULT_PADDING_FACTOR,
            format: CanonicalFormat::default(),
            output_root: PathBuf::from("prepared_faces"),
        }
    }
}

impl ExtractConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, FaceSpliceError> {
        toml::from_str(text).map_err(|e| FaceSpliceError::InvalidConfig(e.to_string()))
    }

    pub fn from_toml_file(path: &Path) -> Result<Self, FaceSpliceError> {
        let text = std::fs::read_to_string(path).map_err(|e| FaceSpliceError::io(path, e))?;
        toml::from_str(&text).map_err(|e| FaceSpliceError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    pub fn validate(&self) -> Result<(), FaceSpliceError> {
        if self.canonical_resolution == 0 {
            return Err(FaceSpliceError::InvalidConfig(
                "canonical_resolution must be > 0".into(),
            ));
        }
        if !self.padding_factor.is_finite() || self.padding_factor < 0.0 {
            return Err(FaceSpliceError::InvalidConfig(format!(
                "padding_factor must be a finite value >= 0, got {}",
                self.padding_factor
            )));
        }
        Ok(())
    }
}

/// Where face regions come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionMode {
    /// A [`crate::RegionDetector`] finds the faces.
    Auto,

    /// An operator supplies boxes (drawn interactively or listed in a file).
    Manual,
}

impl FromStr for ExtractionMode {
    type Err = FaceSpliceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "auto" => Ok(ExtractionMode::Auto),
            "manual" => Ok(ExtractionMode::Manual),
            _ => Err(FaceSpliceError::InvalidMode(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_canonical_constants() {
        let config = ExtractConfig::default();
        assert_eq!(config.canonical_resolution, 512);
        assert_eq!(config.padding_factor, 1.0);
        assert_eq!(config.format, CanonicalFormat::Png);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = ExtractConfig::from_toml_str("canonical_resolution = 256\nformat = \"webp\"")
            .unwrap();
        assert_eq!(config.canonical_resolution, 256);
        assert_eq!(config.format, CanonicalFormat::Webp);
        assert_eq!(config.padding_factor, 1.0);
        assert_eq!(config.output_root, PathBuf::from("prepared_faces"));
    }

    #[test]
    fn unknown_format_is_rejected() {
        assert!(ExtractConfig::from_toml_str("format = \"gif\"").is_err());
    }

    #[test]
    fn zero_resolution_is_invalid() {
        let config = ExtractConfig {
            canonical_resolution: 0,
            ..ExtractConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(FaceSpliceError::InvalidConfig(_))
        ));
    }

    #[test]
    fn negative_padding_is_invalid() {
        let config = ExtractConfig {
            padding_factor: -0.5,
            ..ExtractConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn nan_padding_is_invalid() {
        let config = ExtractConfig {
            padding_factor: f64::NAN,
            ..ExtractConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn mode_parses_known_values() {
        assert_eq!("auto".parse::<ExtractionMode>().unwrap(), ExtractionMode::Auto);
        assert_eq!(
            "manual".parse::<ExtractionMode>().unwrap(),
            ExtractionMode::Manual
        );
    }

    #[test]
    fn unknown_mode_is_rejected() {
        let err = "automatic".parse::<ExtractionMode>().unwrap_err();
        assert!(matches!(err, FaceSpliceError::InvalidMode(ref m) if m == "automatic"));
    }

    #[test]
    fn format_extensions() {
        assert_eq!(CanonicalFormat::Png.extension(), "png");
        assert_eq!(CanonicalFormat::Webp.extension(), "webp");
    }
}
