//! Photo capture from an image file.

use crate::error::CaptureError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::path::Path;

/// An encoded photo, ready for the mood detector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageData {
    pub mime_type: String,
    /// Standard base64, no data-URL prefix
    pub base64: String,
}

impl ImageData {
    pub fn from_bytes(mime_type: &str, bytes: &[u8]) -> Self {
        Self {
            mime_type: mime_type.to_string(),
            base64: STANDARD.encode(bytes),
        }
    }
}

/// Read and encode the image at `path`.
pub fn capture_from_file(path: &Path) -> Result<ImageData, CaptureError> {
    let display = path.display().to_string();
    let mime_type = mime_type_for(path).ok_or_else(|| CaptureError::UnsupportedType(display.clone()))?;

    let bytes = std::fs::read(path).map_err(|source| CaptureError::Read {
        path: display.clone(),
        source,
    })?;
    if bytes.is_empty() {
        return Err(CaptureError::Empty(display));
    }

    log::debug!("Captured {} bytes of {mime_type} from {display}", bytes.len());
    Ok(ImageData::from_bytes(mime_type, &bytes))
}

fn mime_type_for(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "webp" => Some("image/webp"),
        "gif" => Some("image/gif"),
        _ => None,
    }
}
