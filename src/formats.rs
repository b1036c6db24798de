use std::path::Path;

use crate::error::ValidationError;

/// File types the extraction endpoints accept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SupportedFormat {
    Jpeg,
    Png,
    Pdf,
    Tiff,
}

impl SupportedFormat {
    pub const ALL: [SupportedFormat; 4] = [Self::Jpeg, Self::Png, Self::Pdf, Self::Tiff];

    pub fn mime(self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::Pdf => "application/pdf",
            Self::Tiff => "image/tiff",
        }
    }

    /// Exact match against the supported MIME set. Parameters such as
    /// `; charset=..` are not accepted.
    pub fn from_mime(mime: &str) -> Result<Self, ValidationError> {
        Self::ALL
            .into_iter()
            .find(|f| f.mime() == mime)
            .ok_or_else(|| ValidationError::UnsupportedFormat(mime.to_string()))
    }

    /// Infers the format from the file extension, case-insensitively.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ValidationError> {
        let path = path.as_ref();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        match ext.as_str() {
            "jpeg" | "jpg" => Ok(Self::Jpeg),
            "png" => Ok(Self::Png),
            "pdf" => Ok(Self::Pdf),
            "tiff" | "tif" => Ok(Self::Tiff),
            _ => Err(ValidationError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

impl std::fmt::Display for SupportedFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.mime())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_exactly_the_supported_mime_types() {
        for format in SupportedFormat::ALL {
            assert_eq!(SupportedFormat::from_mime(format.mime()), Ok(format));
        }
        for mime in ["image/gif", "text/plain", "application/pdf; x=1", "", "IMAGE/PNG"] {
            assert_eq!(
                SupportedFormat::from_mime(mime),
                Err(ValidationError::UnsupportedFormat(mime.to_string()))
            );
        }
    }

    #[test]
    fn infers_format_from_extension() {
        assert_eq!(SupportedFormat::from_path("scan.JPG"), Ok(SupportedFormat::Jpeg));
        assert_eq!(SupportedFormat::from_path("a/b/report.pdf"), Ok(SupportedFormat::Pdf));
        assert_eq!(SupportedFormat::from_path("fax.tif"), Ok(SupportedFormat::Tiff));
        assert!(SupportedFormat::from_path("notes.txt").is_err());
        assert!(SupportedFormat::from_path("no_extension").is_err());
    }
}
