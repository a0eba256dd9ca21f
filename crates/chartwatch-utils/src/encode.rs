//! Image encoding helpers
//!
//! Screenshots are shipped to the LLM providers as base64 data URIs. The
//! media type is derived from the file extension, defaulting to PNG.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur while encoding an image
#[derive(Debug, Error)]
pub enum EncodeError {
    /// Image file does not exist
    #[error("image file not found: {0}")]
    NotFound(String),

    /// Image file could not be read
    #[error("failed to read image {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Map a file extension to an image media type
fn media_type_for(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        // PNG is what the capture session writes; default to it
        _ => "image/png",
    }
}

/// Encode an image file as a base64 data URI
pub fn encode_image_to_base64(path: impl AsRef<Path>) -> Result<String, EncodeError> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(EncodeError::NotFound(path.display().to_string()));
    }

    let bytes = std::fs::read(path).map_err(|source| EncodeError::Io {
        path: path.display().to_string(),
        source,
    })?;

    let encoded = STANDARD.encode(bytes);
    Ok(format!("data:{};base64,{encoded}", media_type_for(path)))
}

/// Split a data URI into its media type and base64 payload
///
/// Returns `None` when the input is not a `data:` URI.
pub fn split_data_uri(uri: &str) -> Option<(&str, &str)> {
    let rest = uri.strip_prefix("data:")?;
    let (header, data) = rest.split_once(',')?;
    let media_type = header.strip_suffix(";base64").unwrap_or(header);
    Some((media_type, data))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_encode_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chart.png");
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(&[0x89, 0x50, 0x4e, 0x47]).unwrap();

        let uri = encode_image_to_base64(&path).unwrap();
        assert!(uri.starts_with("data:image/png;base64,"));
    }

    #[test]
    fn test_encode_jpeg_media_type() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chart.JPG");
        std::fs::write(&path, b"xx").unwrap();

        let uri = encode_image_to_base64(&path).unwrap();
        assert!(uri.starts_with("data:image/jpeg;base64,"));
    }

    #[test]
    fn test_missing_file() {
        let result = encode_image_to_base64("/nonexistent/chart.png");
        assert!(matches!(result, Err(EncodeError::NotFound(_))));
    }

    #[test]
    fn test_split_data_uri() {
        let (media, data) = split_data_uri("data:image/png;base64,abc123").unwrap();
        assert_eq!(media, "image/png");
        assert_eq!(data, "abc123");
    }

    #[test]
    fn test_split_rejects_plain_url() {
        assert!(split_data_uri("https://example.com/chart.png").is_none());
    }
}
