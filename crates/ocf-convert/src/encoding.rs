//! Serialization encodings and how callers name them.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConversionError;

/// A document serialization encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Encoding {
    Json,
    Yaml,
    Xml,
}

impl Encoding {
    pub const ALL: [Encoding; 3] = [Encoding::Json, Encoding::Yaml, Encoding::Xml];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Yaml => "yaml",
            Self::Xml => "xml",
        }
    }

    /// Preferred file extension.
    pub fn extension(&self) -> &'static str {
        self.as_str()
    }

    pub fn media_type(&self) -> &'static str {
        match self {
            Self::Json => "application/json",
            Self::Yaml => "application/yaml",
            Self::Xml => "application/xml",
        }
    }

    /// Encoding for a file, chosen by its extension.
    pub fn from_path(path: &Path) -> Result<Self, ConversionError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| ConversionError::UnsupportedEncoding(path.display().to_string()))?;
        ext.parse()
    }

    /// Encoding for a media type such as `application/oscal+json; charset=utf-8`.
    pub fn from_media_type(media_type: &str) -> Result<Self, ConversionError> {
        let essence = media_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        let subtype = essence.rsplit_once('/').map(|(_, s)| s).unwrap_or_default();
        let suffix = subtype.rsplit_once('+').map(|(_, s)| s).unwrap_or(subtype);
        match suffix {
            "json" => Ok(Self::Json),
            "xml" => Ok(Self::Xml),
            "yaml" | "x-yaml" => Ok(Self::Yaml),
            _ => Err(ConversionError::UnsupportedEncoding(media_type.to_string())),
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Encoding {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().trim_start_matches('.').to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "yaml" | "yml" => Ok(Self::Yaml),
            "xml" => Ok(Self::Xml),
            _ => Err(ConversionError::UnsupportedEncoding(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_names() {
        assert_eq!("JSON".parse::<Encoding>().unwrap(), Encoding::Json);
        assert_eq!("yml".parse::<Encoding>().unwrap(), Encoding::Yaml);
        assert_eq!(".xml".parse::<Encoding>().unwrap(), Encoding::Xml);
        assert!(matches!(
            "docx".parse::<Encoding>(),
            Err(ConversionError::UnsupportedEncoding(_))
        ));
    }

    #[test]
    fn from_path_uses_extension() {
        assert_eq!(Encoding::from_path(Path::new("ssp.yaml")).unwrap(), Encoding::Yaml);
        assert_eq!(Encoding::from_path(Path::new("dir/ssp.JSON")).unwrap(), Encoding::Json);
        assert!(Encoding::from_path(Path::new("README")).is_err());
        assert!(Encoding::from_path(Path::new("ssp.pdf")).is_err());
    }

    #[test]
    fn media_types() {
        assert_eq!(Encoding::from_media_type("application/json").unwrap(), Encoding::Json);
        assert_eq!(
            Encoding::from_media_type("application/oscal+xml; charset=utf-8").unwrap(),
            Encoding::Xml
        );
        assert_eq!(Encoding::from_media_type("text/xml").unwrap(), Encoding::Xml);
        assert_eq!(Encoding::from_media_type("application/x-yaml").unwrap(), Encoding::Yaml);
        assert!(Encoding::from_media_type("application/pdf").is_err());
        assert!(Encoding::from_media_type("garbage").is_err());
    }

    #[test]
    fn serde_lowercase() {
        assert_eq!(serde_json::to_string(&Encoding::Yaml).unwrap(), "\"yaml\"");
    }
}
