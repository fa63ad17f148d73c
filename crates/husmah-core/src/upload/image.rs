use std::fs;
use std::path::Path;

use base64::Engine;

use super::UploadError;

/// Largest accepted image, in bytes (10 MiB).
pub const MAX_IMAGE_BYTES: u64 = 10 * 1024 * 1024;

/// Map a file name's extension to one of the accepted image types.
pub fn content_type_for(file_name: &str) -> Option<&'static str> {
    let ext = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())?
        .to_ascii_lowercase();
    match ext.as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        _ => None,
    }
}

/// An image picked from disk, held in memory until it is uploaded.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageFile {
    pub file_name: String,
    pub content_type: Option<&'static str>,
    pub bytes: Vec<u8>,
}

impl ImageFile {
    pub fn new(file_name: &str, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.to_string(),
            content_type: content_type_for(file_name),
            bytes,
        }
    }

    /// Read an image from disk. Oversized files are rejected from their
    /// metadata without being read.
    pub fn from_path(path: &Path) -> Result<Self, UploadError> {
        let read_error = |source| UploadError::Read {
            path: path.display().to_string(),
            source,
        };

        let size = fs::metadata(path).map_err(read_error)?.len();
        if size > MAX_IMAGE_BYTES {
            return Err(UploadError::TooLarge {
                size_mb: megabytes(size),
            });
        }

        let bytes = fs::read(path).map_err(read_error)?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string());
        Ok(Self::new(&file_name, bytes))
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn size_mb(&self) -> f64 {
        megabytes(self.size())
    }

    pub fn validate(&self) -> Result<(), UploadError> {
        if self.content_type.is_none() {
            let kind = Path::new(&self.file_name)
                .extension()
                .map(|e| format!(".{}", e.to_string_lossy()))
                .unwrap_or_else(|| "unknown".to_string());
            return Err(UploadError::UnsupportedType(kind));
        }
        if self.size() > MAX_IMAGE_BYTES {
            return Err(UploadError::TooLarge {
                size_mb: self.size_mb(),
            });
        }
        Ok(())
    }

    /// Inline `data:` URL, used when the image host will not take the file.
    pub fn to_data_url(&self) -> String {
        let mime = self.content_type.unwrap_or("application/octet-stream");
        let encoded = base64::engine::general_purpose::STANDARD.encode(&self.bytes);
        format!("data:{};base64,{}", mime, encoded)
    }
}

fn megabytes(bytes: u64) -> f64 {
    bytes as f64 / (1024.0 * 1024.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_content_type_by_extension() {
        assert_eq!(content_type_for("front.JPG"), Some("image/jpeg"));
        assert_eq!(content_type_for("plan.jpeg"), Some("image/jpeg"));
        assert_eq!(content_type_for("site.webp"), Some("image/webp"));
        assert_eq!(content_type_for("scan.bmp"), None);
        assert_eq!(content_type_for("README"), None);
    }

    #[test]
    fn test_validate_rejects_unsupported_type() {
        let err = ImageFile::new("scan.bmp", vec![0; 10]).validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "File type .bmp is not supported. Please use JPEG, PNG, GIF, or WebP."
        );
    }

    #[test]
    fn test_validate_rejects_oversized_image() {
        let bytes = vec![0; (MAX_IMAGE_BYTES + 1024 * 1024) as usize];
        let err = ImageFile::new("big.png", bytes).validate().unwrap_err();
        assert_eq!(err.to_string(), "File size 11.00MB exceeds the 10MB limit.");
    }

    #[test]
    fn test_validate_accepts_limit_exactly() {
        let bytes = vec![0; MAX_IMAGE_BYTES as usize];
        assert!(ImageFile::new("ok.gif", bytes).validate().is_ok());
    }

    #[test]
    fn test_data_url() {
        let image = ImageFile::new("dot.png", b"abc".to_vec());
        assert_eq!(image.to_data_url(), "data:image/png;base64,YWJj");
    }

    #[test]
    fn test_from_path_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("front.jpeg");
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(b"jpegdata").unwrap();

        let image = ImageFile::from_path(&path).unwrap();
        assert_eq!(image.file_name, "front.jpeg");
        assert_eq!(image.content_type, Some("image/jpeg"));
        assert_eq!(image.bytes, b"jpegdata");
    }

    #[test]
    fn test_from_path_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = ImageFile::from_path(&dir.path().join("nope.png")).unwrap_err();
        assert!(matches!(err, UploadError::Read { .. }));
    }
}
